/// Travel coordinator library
/// Session bookkeeping, identity resolution and query dispatch behind the
/// HTTP/WebSocket server and the terminal client

pub mod agents;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod identity;
pub mod policy;
pub mod prompts;
pub mod server;
pub mod session;
pub mod shared;

pub use config::{AppConfig, AuthMode};
pub use dispatch::{Dispatcher, TurnResult};
pub use error::{CoordinatorError, Result};
pub use event::{QueryEvent, Role, ToolCall, ToolResult};
pub use identity::{IdentityProvider, IdentityResolver, Principal, RestIdentityProvider};
pub use policy::{AgentPolicy, CoordinatorPolicy, EventStream, SessionSnapshot};
pub use session::{Session, SessionKey, SessionStore};

/// Installs the fmt subscriber; `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
