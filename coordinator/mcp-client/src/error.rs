/// Error taxonomy shared by the session, identity and dispatch layers

use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum CoordinatorError {
    /// No principal is registered for the phone number.
    #[error("no account registered for phone number {0}")]
    NotFound(String),

    #[error("identity provider: {0}")]
    IdentityProvider(String),

    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    #[error("session: {0}")]
    Session(String),

    #[error("agent policy did not finish within {0:?}")]
    DispatchTimeout(Duration),

    #[error("agent policy: {0}")]
    Policy(String),

    /// Raised by tool backends. The policy reports these as event text.
    #[error("tool {tool}: {message}")]
    ToolInvocation { tool: String, message: String },

    #[error("config: {0}")]
    Config(String),
}

impl CoordinatorError {
    /// Stable snake_case name used in error bodies and frames.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::IdentityProvider(_) => "identity_provider",
            Self::InvalidPhoneNumber(_) => "invalid_phone_number",
            Self::Session(_) => "session",
            Self::DispatchTimeout(_) => "dispatch_timeout",
            Self::Policy(_) => "policy",
            Self::ToolInvocation { .. } => "tool_invocation",
            Self::Config(_) => "config",
        }
    }

    pub(crate) fn tool(tool: &str, message: impl Into<String>) -> Self {
        Self::ToolInvocation {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;
