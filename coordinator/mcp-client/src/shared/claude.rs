/// Claude API integration module
/// Handles communication with the hosted model and parsing of its JSON replies

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ModelConfig;
use crate::error::{CoordinatorError, Result};
use crate::event::ToolCall;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClaudeMessage {
    pub role: String,
    pub content: String,
}

impl ClaudeMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Claude API request
#[derive(Debug, Serialize)]
pub struct ClaudeRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub system: &'a str,
    pub messages: &'a [ClaudeMessage],
}

/// Claude API response
#[derive(Debug, Deserialize)]
pub struct ClaudeResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub text: String,
}

pub struct ClaudeClient {
    http: reqwest::Client,
    config: ModelConfig,
}

impl ClaudeClient {
    pub fn new(http: reqwest::Client, config: ModelConfig) -> Self {
        Self { http, config }
    }

    pub fn max_tool_rounds(&self) -> usize {
        self.config.max_tool_rounds
    }

    /// Sends one Messages API call and returns the first text block.
    pub async fn complete(&self, system: &str, messages: &[ClaudeMessage]) -> Result<String> {
        let messages = normalize_messages(messages);
        let request = ClaudeRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages: &messages,
        };

        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| CoordinatorError::Policy(format!("Claude request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CoordinatorError::Policy(format!(
                "Claude API error ({}): {}",
                status, error_text
            )));
        }

        let claude_response: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| CoordinatorError::Policy(format!("Invalid Claude response: {}", e)))?;

        claude_response
            .content
            .into_iter()
            .map(|block| block.text)
            .find(|text| !text.is_empty())
            .ok_or_else(|| CoordinatorError::Policy("No response from Claude".to_string()))
    }
}

/// The Messages API wants alternating roles starting with `user`.
/// Consecutive messages of one role are merged and a leading assistant turn is dropped.
pub fn normalize_messages(messages: &[ClaudeMessage]) -> Vec<ClaudeMessage> {
    let mut out: Vec<ClaudeMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        if message.content.trim().is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.role == message.role => {
                last.content.push_str("\n\n");
                last.content.push_str(&message.content);
            }
            None if message.role != "user" => {}
            _ => out.push(message.clone()),
        }
    }
    out
}

/// Coordinator decision: hand the query to `agent`, or answer directly with `reply`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub agent: Option<String>,
    pub reply: String,
}

/// Domain agent step: tools to run now and the message for the user
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub reasoning: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub user_message: String,
}

/// Extracts the outermost JSON object embedded in a model reply.
pub fn extract_json(reply: &str) -> Option<Value> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str::<Value>(&reply[start..=end]) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("[PARSER] JSON parse error: {}", e);
            None
        }
    }
}

/// A reply without a readable JSON object is taken as a direct answer.
pub fn parse_routing_reply(reply: &str) -> RoutingDecision {
    let Some(parsed) = extract_json(reply) else {
        return RoutingDecision { agent: None, reply: reply.trim().to_string() };
    };

    let agent = parsed
        .get("agent")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("none"))
        .map(str::to_string);
    let reply_text = parsed
        .get("reply")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    RoutingDecision { agent, reply: reply_text }
}

/// A reply without a readable JSON object is taken as the user message with no tool calls.
pub fn parse_agent_reply(reply: &str) -> AgentReply {
    let Some(parsed) = extract_json(reply) else {
        return AgentReply {
            reasoning: None,
            tool_calls: Vec::new(),
            user_message: reply.trim().to_string(),
        };
    };

    let tool_calls = parsed
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| {
            calls
                .iter()
                .filter_map(|call| {
                    let name = call.get("name").and_then(Value::as_str)?;
                    let arguments = call
                        .get("arguments")
                        .cloned()
                        .unwrap_or_else(|| Value::Object(Default::default()));
                    Some(ToolCall { name: name.to_string(), arguments })
                })
                .collect()
        })
        .unwrap_or_default();

    AgentReply {
        reasoning: parsed.get("reasoning").and_then(Value::as_str).map(str::to_string),
        tool_calls,
        user_message: parsed
            .get("user_message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}
