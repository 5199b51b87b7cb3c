use metrics::Gauge;
use serde_json::Value;
use tracing::debug;

use crate::config::MetricConfig;
use crate::error::{CompileError, ExtractError};
use crate::query::CompiledQuery;

/// One configured metric: a compiled query, a scale factor, and the gauge it
/// writes into. The gauge is a plain handle owned by composition; the scrape
/// endpoint reads it concurrently without coordination.
pub struct MetricExtractor {
    name: String,
    query: CompiledQuery,
    factor: f64,
    gauge: Gauge,
}

impl MetricExtractor {
    pub fn new(namespace: &str, cfg: &MetricConfig) -> Result<Self, CompileError> {
        let name = crate::metrics::gauge_name(namespace, &cfg.subsystem, &cfg.name, &cfg.unit);
        let query = CompiledQuery::compile(&cfg.query)?;
        let gauge = crate::metrics::register_gauge(&name, &cfg.description);

        Ok(Self {
            name,
            query,
            factor: cfg.factor,
            gauge,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn query_source(&self) -> &str {
        self.query.source()
    }

    /// Evaluate the query against `document`, scale the result, and write it
    /// into the gauge. A missing or null result degrades to 0; a non-numeric
    /// result is an error and leaves the gauge untouched.
    pub fn update(&self, document: &Value) -> Result<f64, ExtractError> {
        let value = match self.query.first(document)? {
            None => 0.0,
            Some(result) => coerce_to_f64(&result)?,
        };

        let scaled = value * self.factor;
        debug!(metric = %self.name, value = scaled, "Setting gauge");
        self.gauge.set(scaled);
        Ok(scaled)
    }
}

/// Numeric coercion rule, total over the JSON value union: numbers convert,
/// null degrades to 0, everything else is a NotNumeric error.
pub fn coerce_to_f64(value: &Value) -> Result<f64, ExtractError> {
    match value {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or(ExtractError::NotNumeric("number")),
        Value::Bool(_) => Err(ExtractError::NotNumeric("boolean")),
        Value::String(_) => Err(ExtractError::NotNumeric("string")),
        Value::Array(_) => Err(ExtractError::NotNumeric("array")),
        Value::Object(_) => Err(ExtractError::NotNumeric("object")),
    }
}
