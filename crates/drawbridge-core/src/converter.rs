//! Diagram-language converter contract.
//!
//! Converting diagram text (e.g. Mermaid) into elements happens outside this
//! crate. The dispatcher only sees the [`DiagramConverter`] trait: diagram
//! text in, element-shaped records and diagnostic log lines out.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Boxed future returned by converters.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Converter failures.
#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("conversion timed out after {0:?}")]
    Timeout(Duration),
    #[error("converter unavailable: {0}")]
    Unavailable(String),
    /// The converter answered with something that is not a conversion result.
    #[error("malformed converter output: {0}")]
    Malformed(String),
    /// The converter rejected the diagram.
    #[error("{0}")]
    Failed(String),
}

/// Result type for converter operations.
pub type ConverterResult<T> = Result<T, ConverterError>;

/// Output of a successful conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvertedDiagram {
    /// Element-shaped records; `id` is optional.
    pub elements: Vec<Value>,
    /// Diagnostic lines produced during conversion.
    #[serde(default)]
    pub logs: Vec<String>,
}

/// Something that turns diagram text into elements.
///
/// Implementations must fail rather than hang when their backing engine is
/// unavailable or the input is malformed.
pub trait DiagramConverter: Send + Sync {
    fn convert<'a>(&'a self, diagram: &'a str) -> BoxFuture<'a, ConverterResult<ConvertedDiagram>>;
}

/// Plain functions and closures work as synchronous converters.
impl<F> DiagramConverter for F
where
    F: Fn(&str) -> ConverterResult<ConvertedDiagram> + Send + Sync,
{
    fn convert<'a>(&'a self, diagram: &'a str) -> BoxFuture<'a, ConverterResult<ConvertedDiagram>> {
        let result = self(diagram);
        Box::pin(std::future::ready(result))
    }
}

/// Converter used when no conversion engine is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableConverter;

impl DiagramConverter for UnavailableConverter {
    fn convert<'a>(&'a self, _diagram: &'a str) -> BoxFuture<'a, ConverterResult<ConvertedDiagram>> {
        Box::pin(std::future::ready(Err(ConverterError::Unavailable(
            "no diagram converter configured".to_string(),
        ))))
    }
}
