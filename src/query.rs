use jaq_interpret::{Ctx, FilterT, ParseCtx, RcIter, Val};
use serde_json::Value;

use crate::error::{CompileError, ExtractError};

/// A jq filter compiled once at startup and reused every cycle.
#[derive(Debug)]
pub struct CompiledQuery {
    filter: jaq_interpret::Filter,
    source: String,
}

impl CompiledQuery {
    /// Parse and compile `filter` against the jq core and standard library.
    pub fn compile(filter: &str) -> Result<Self, CompileError> {
        let (main, errs) = jaq_parse::parse(filter, jaq_parse::main());
        if !errs.is_empty() {
            return Err(CompileError::Parse {
                filter: filter.to_string(),
                detail: format!("{errs:?}"),
            });
        }
        let Some(main) = main else {
            return Err(CompileError::Parse {
                filter: filter.to_string(),
                detail: "empty filter".to_string(),
            });
        };

        let mut defs = ParseCtx::new(Vec::new());
        defs.insert_natives(jaq_core::core());
        defs.insert_defs(jaq_std::std());

        let compiled = defs.compile(main);
        if !defs.errs.is_empty() {
            return Err(CompileError::Undefined {
                filter: filter.to_string(),
            });
        }

        Ok(Self {
            filter: compiled,
            source: filter.to_string(),
        })
    }

    /// Run the filter over `document` and return its first output, if any.
    /// The filter may produce many outputs; only the first matters here.
    pub fn first(&self, document: &Value) -> Result<Option<Value>, ExtractError> {
        let inputs = RcIter::new(core::iter::empty());
        let mut outputs = self
            .filter
            .run((Ctx::new([], &inputs), Val::from(document.clone())));

        match outputs.next() {
            None => Ok(None),
            Some(Ok(val)) => Ok(Some(Value::from(val))),
            Some(Err(e)) => Err(ExtractError::Query(e.to_string())),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}
