/// Query events: the unit of conversation history and of streamed output

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// A tool invocation requested by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

/// Outcome of a tool invocation; failures carry the error text in `output`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub name: String,
    pub output: Value,
    pub is_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryEvent {
    pub id: String,
    /// Shared by every event produced for one query.
    pub invocation_id: String,
    pub author: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResult>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub state_delta: Map<String, Value>,
    #[serde(default)]
    pub is_final: bool,
    /// Position in the session history, stamped when the event is appended.
    #[serde(default)]
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
}

impl QueryEvent {
    fn new(invocation_id: &str, author: &str, role: Role) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            invocation_id: invocation_id.to_string(),
            author: author.to_string(),
            role,
            text: None,
            tool_call: None,
            tool_result: None,
            state_delta: Map::new(),
            is_final: false,
            sequence: 0,
            timestamp: Utc::now(),
        }
    }

    /// The user's query, opening a new invocation.
    pub fn user(text: &str) -> Self {
        let invocation_id = format!("inv_{}", uuid::Uuid::new_v4().simple());
        let mut event = Self::new(&invocation_id, "user", Role::User);
        event.text = Some(text.to_string());
        event
    }

    /// Intermediate agent text (routing notes, progress).
    pub fn agent_text(invocation_id: &str, author: &str, text: impl Into<String>) -> Self {
        let mut event = Self::new(invocation_id, author, Role::Agent);
        event.text = Some(text.into());
        event
    }

    /// The answer for the invocation.
    pub fn final_answer(invocation_id: &str, author: &str, text: impl Into<String>) -> Self {
        let mut event = Self::agent_text(invocation_id, author, text);
        event.is_final = true;
        event
    }

    pub fn tool_call(invocation_id: &str, author: &str, call: ToolCall) -> Self {
        let mut event = Self::new(invocation_id, author, Role::Agent);
        event.tool_call = Some(call);
        event
    }

    pub fn tool_result(invocation_id: &str, author: &str, result: ToolResult) -> Self {
        let mut event = Self::new(invocation_id, author, Role::Agent);
        event.tool_result = Some(result);
        event
    }

    pub fn with_state(mut self, key: &str, value: Value) -> Self {
        self.state_delta.insert(key.to_string(), value);
        self
    }

    /// Text of a final event; events without text never count as an answer.
    pub fn answer_text(&self) -> Option<&str> {
        if self.is_final {
            self.text.as_deref()
        } else {
            None
        }
    }
}
