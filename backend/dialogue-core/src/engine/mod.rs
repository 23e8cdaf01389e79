//! The backend the server serializes requests into.
//!
//! An [`Engine`] is stateful and not reentrant. The dispatcher owns the only
//! instance behind a mutex and runs each call on the blocking thread pool.

use crate::error::engine::EngineError;

/// Blocking request/response backend.
pub trait Engine: Send + 'static {
    /// Produce a response for `text`, optionally continuing `context`.
    ///
    /// May block for an unbounded amount of time.
    fn invoke(&mut self, text: &str, context: Option<&str>) -> Result<String, EngineError>;
}

impl<F> Engine for F
where
    F: FnMut(&str, Option<&str>) -> Result<String, EngineError> + Send + 'static,
{
    fn invoke(&mut self, text: &str, context: Option<&str>) -> Result<String, EngineError> {
        self(text, context)
    }
}

/// Engine that echoes its input. Stands in for an inference backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoEngine;

impl Engine for EchoEngine {
    fn invoke(&mut self, text: &str, context: Option<&str>) -> Result<String, EngineError> {
        Ok(match context {
            Some(context) => format!("Echo with context [{context}]: {text}"),
            None => format!("Echo: {text}"),
        })
    }
}
