use serde::{Deserialize, Serialize};

/// A single chat message as carried on the session surface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
}

/// Body of a `POST /chat/new-session` request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSessionRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub flow: String,
    #[serde(default)]
    pub agent: String,
}

/// Successful bootstrap result returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct SessionBootstrap {
    /// Identifier of the newly allocated session record
    pub session_id: String,
    /// Address of the proxy assigned to the session
    pub proxy: String,
    /// Identifier of the warmed automation context
    pub context_id: String,
}
