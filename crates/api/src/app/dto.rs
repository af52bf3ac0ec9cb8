use std::collections::HashMap;

use serde::Deserialize;

// -------------------------
// Request DTOs
// -------------------------

/// Inner `message` object of a Pub/Sub push delivery envelope.
#[derive(Debug, Deserialize)]
pub struct PushMessage {
    #[serde(default, alias = "messageId")]
    pub message_id: Option<String>,
    /// Base64-encoded payload body.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub attributes: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
