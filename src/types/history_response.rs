use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Body of `GET /chat/history/{session_id}`.
///
/// The service reports its own failures as `{"messages": [], "error": "..."}`
/// with a 200 status; the `error` field is kept for logging only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Prior messages in server order.
    pub messages: Vec<Message>,

    /// Error reported by the service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
