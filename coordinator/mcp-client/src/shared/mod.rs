/// Clients for the external collaborators: the hosted model and the tool backend

pub mod claude;
pub mod toolbox;

pub use claude::{
    parse_agent_reply, parse_routing_reply, AgentReply, ClaudeClient, ClaudeMessage,
    RoutingDecision,
};
pub use toolbox::{ToolDefinition, ToolParameter, ToolboxClient};
