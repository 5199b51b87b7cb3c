use thiserror::Error;

/// Errors produced while retrieving the source document
#[derive(Debug, Error)]
pub enum FetchError {
    /// Local file could not be read (missing, unreadable, invalid UTF-8)
    #[error("failed to read {path}: {source}")]
    LocalRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Connection, timeout, or non-2xx response
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Retrieved content is not valid JSON
    #[error("invalid JSON document: {0}")]
    Parse(#[from] serde_json::Error),

    /// URI scheme is not file/http/https; no I/O is attempted
    #[error("unsupported URI scheme: {0}")]
    UnsupportedScheme(String),
}

/// Errors produced while evaluating one metric's query against a document
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Query result cannot be coerced to a number. Holds the JSON type name.
    #[error("query produced a non-numeric {0} value")]
    NotNumeric(&'static str),

    /// Runtime error raised by the jq filter itself
    #[error("query evaluation failed: {0}")]
    Query(String),
}

/// Errors produced while compiling a jq filter at startup
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid jq filter {filter:?}: {detail}")]
    Parse { filter: String, detail: String },

    #[error("jq filter {filter:?} references undefined names")]
    Undefined { filter: String },
}
