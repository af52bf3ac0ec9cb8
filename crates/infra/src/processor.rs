//! The processing-function boundary.
//!
//! The engine treats business logic as an opaque function with a
//! success/failure outcome. What actually runs behind this trait is out of
//! scope; the shipped implementation echoes the payload back.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use thiserror::Error;

/// Business processing failed. The message is recorded on the job.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("processing failed: {0}")]
pub struct ProcessingError(pub String);

/// Opaque processing step invoked once per delivery attempt.
#[async_trait]
pub trait PayloadProcessor: Send + Sync {
    async fn process(&self, payload: &JsonValue) -> Result<JsonValue, ProcessingError>;
}

/// Default processor: echoes the decoded text and reports its length.
#[derive(Debug, Default)]
pub struct EchoProcessor;

#[async_trait]
impl PayloadProcessor for EchoProcessor {
    async fn process(&self, payload: &JsonValue) -> Result<JsonValue, ProcessingError> {
        let text = payload.get("text").and_then(|v| v.as_str()).unwrap_or("");
        Ok(json!({
            "payload_length": text.chars().count(),
            "echo": text,
        }))
    }
}

/// Processor that always fails. Drives the failure/dead-letter paths in tests.
#[derive(Debug)]
pub struct FailingProcessor(pub String);

#[async_trait]
impl PayloadProcessor for FailingProcessor {
    async fn process(&self, _payload: &JsonValue) -> Result<JsonValue, ProcessingError> {
        Err(ProcessingError(self.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_reports_payload_length() {
        let result = EchoProcessor
            .process(&json!({"text": "hello"}))
            .await
            .unwrap();
        assert_eq!(result["payload_length"], 5);
        assert_eq!(result["echo"], "hello");
    }

    #[tokio::test]
    async fn echo_handles_missing_text() {
        let result = EchoProcessor.process(&json!({})).await.unwrap();
        assert_eq!(result["payload_length"], 0);
    }

    #[tokio::test]
    async fn failing_processor_reports_its_message() {
        let err = FailingProcessor("downstream timeout".into())
            .process(&json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.0, "downstream timeout");
    }
}
