/// Hosted-model policy: a routing call picks a domain agent, which then runs a
/// tool loop until it has an answer for the user

use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::Stream;
use serde_json::{json, Value};

use crate::agents::{find_agent, DomainAgent, ROSTER};
use crate::config::AppConfig;
use crate::error::{CoordinatorError, Result};
use crate::event::{QueryEvent, Role, ToolResult};
use crate::prompts::{agent_system_prompt, routing_system_prompt};
use crate::shared::{
    parse_agent_reply, parse_routing_reply, ClaudeClient, ClaudeMessage, ToolDefinition,
    ToolboxClient,
};

use super::{AgentPolicy, EventStream, SessionSnapshot};

pub const COORDINATOR_AUTHOR: &str = "coordinator";

/// Session state key naming the agent that handled the last routed turn.
pub const ACTIVE_AGENT_KEY: &str = "active_agent";

const GREETING_FALLBACK: &str = "I can help with hotels, flights, restaurants, car rentals \
     and managing your bookings. What would you like to do?";

struct Inner {
    claude: ClaudeClient,
    toolbox: Arc<ToolboxClient>,
}

#[derive(Clone)]
pub struct CoordinatorPolicy {
    inner: Arc<Inner>,
}

impl CoordinatorPolicy {
    pub fn new(claude: ClaudeClient, toolbox: Arc<ToolboxClient>) -> Self {
        Self {
            inner: Arc::new(Inner { claude, toolbox }),
        }
    }

    pub fn from_config(config: &AppConfig, http: reqwest::Client) -> Result<Self> {
        let model = config.model.clone().ok_or_else(|| {
            CoordinatorError::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;
        let toolbox = Arc::new(ToolboxClient::new(http.clone(), &config.toolbox_url));
        Ok(Self::new(ClaudeClient::new(http, model), toolbox))
    }
}

#[async_trait]
impl AgentPolicy for CoordinatorPolicy {
    async fn invoke(&self, session: SessionSnapshot, query: QueryEvent) -> Result<EventStream> {
        Ok(Box::pin(run_turn(self.inner.clone(), session, query)))
    }
}

fn run_turn(
    inner: Arc<Inner>,
    session: SessionSnapshot,
    query: QueryEvent,
) -> impl Stream<Item = Result<QueryEvent>> + Send + 'static {
    try_stream! {
        let invocation = query.invocation_id.clone();
        let mut messages = conversation_messages(&session.history);
        let active_agent = session
            .state
            .get(ACTIVE_AGENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);

        let routing_prompt = routing_system_prompt(&ROSTER, active_agent.as_deref());
        let routing_reply = inner.claude.complete(&routing_prompt, &messages).await?;
        let decision = parse_routing_reply(&routing_reply);

        match decision.agent.as_deref().and_then(find_agent) {
            None => {
                if let Some(unknown) = decision.agent.as_deref() {
                    tracing::warn!("[ROUTING] Model picked unknown agent '{}'", unknown);
                }
                let reply = if decision.reply.is_empty() {
                    GREETING_FALLBACK.to_string()
                } else {
                    decision.reply
                };
                yield QueryEvent::final_answer(&invocation, COORDINATOR_AUTHOR, reply);
            }
            Some(agent) => {
                tracing::info!("[ROUTING] Session {} -> {}", session.key.session_id, agent.name);
                yield QueryEvent::agent_text(
                    &invocation,
                    COORDINATOR_AUTHOR,
                    format!("Transferring to {}", agent.name),
                )
                .with_state(ACTIVE_AGENT_KEY, json!(agent.name));

                let manifest = match inner.toolbox.load_toolset(agent.toolset).await {
                    Ok(tools) => Some(tools),
                    Err(e) => {
                        tracing::warn!("[TOOLBOX] {} unavailable: {}", agent.toolset, e);
                        None
                    }
                };
                let system = agent_system_prompt(agent, manifest.as_deref().unwrap_or(&[]));

                let mut answer = None;
                for round in 0..inner.claude.max_tool_rounds() {
                    let raw = inner.claude.complete(&system, &messages).await?;
                    let reply = parse_agent_reply(&raw);

                    if reply.tool_calls.is_empty() {
                        answer = Some(if reply.user_message.is_empty() {
                            raw.trim().to_string()
                        } else {
                            reply.user_message
                        });
                        break;
                    }

                    tracing::info!(
                        "[AGENT] {} round {}: {} tool calls",
                        agent.name,
                        round + 1,
                        reply.tool_calls.len()
                    );
                    messages.push(ClaudeMessage::assistant(raw.clone()));
                    if !reply.user_message.is_empty() {
                        yield QueryEvent::agent_text(&invocation, agent.name, reply.user_message.clone());
                    }

                    let mut results = Vec::with_capacity(reply.tool_calls.len());
                    for call in reply.tool_calls {
                        yield QueryEvent::tool_call(&invocation, agent.name, call.clone());
                        let result = run_tool(&inner.toolbox, agent, manifest.as_deref(), &call.name, &call.arguments).await;
                        results.push(json!({
                            "tool": result.name,
                            "is_error": result.is_error,
                            "output": result.output,
                        }));
                        yield QueryEvent::tool_result(&invocation, agent.name, result);
                    }

                    let results_text = serde_json::to_string_pretty(&results)
                        .unwrap_or_else(|_| Value::Array(results).to_string());
                    messages.push(ClaudeMessage::user(format!("TOOL RESULTS:\n{}", results_text)));
                }

                let text = answer.unwrap_or_else(|| {
                    tracing::warn!("[AGENT] {} ran out of tool rounds", agent.name);
                    "I wasn't able to complete this request right now. Could you rephrase it or \
                     give me a bit more detail?"
                        .to_string()
                });
                yield QueryEvent::final_answer(&invocation, agent.name, text);
            }
        }
    }
}

/// Whether `agent` may call `name`: it must be one of the agent's own tools
/// and, once the toolset manifest is loaded, also be listed there.
fn tool_allowed(agent: &DomainAgent, manifest: Option<&[ToolDefinition]>, name: &str) -> bool {
    agent.tools.iter().any(|tool| *tool == name)
        && manifest.map_or(true, |tools| tools.iter().any(|tool| tool.name == name))
}

/// Runs one tool; failures become an error result the model can explain.
async fn run_tool(
    toolbox: &ToolboxClient,
    agent: &DomainAgent,
    manifest: Option<&[ToolDefinition]>,
    name: &str,
    arguments: &Value,
) -> ToolResult {
    if !tool_allowed(agent, manifest, name) {
        tracing::warn!("[TOOL] {} refused {}", agent.name, name);
        return ToolResult {
            name: name.to_string(),
            output: json!(format!("{} has no tool named {}", agent.name, name)),
            is_error: true,
        };
    }

    match toolbox.invoke(name, arguments).await {
        Ok(output) => ToolResult { name: name.to_string(), output, is_error: false },
        Err(e) => {
            tracing::warn!("[TOOL] {} failed: {}", name, e);
            ToolResult { name: name.to_string(), output: json!(e.to_string()), is_error: true }
        }
    }
}

/// User queries and final answers from the history, as model messages.
fn conversation_messages(history: &[QueryEvent]) -> Vec<ClaudeMessage> {
    history
        .iter()
        .filter_map(|event| match (event.role, event.text.as_deref()) {
            (Role::User, Some(text)) => Some(ClaudeMessage::user(text)),
            (Role::Agent, Some(text)) if event.is_final => Some(ClaudeMessage::assistant(text)),
            _ => None,
        })
        .collect()
}
