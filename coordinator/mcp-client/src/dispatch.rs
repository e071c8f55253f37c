/// Query dispatch: runs one turn of a session through the agent policy

use std::sync::Arc;
use std::time::Duration;

use async_stream::try_stream;
use futures_util::{Stream, StreamExt};
use tokio::time::Instant;

use crate::error::{CoordinatorError, Result};
use crate::event::QueryEvent;
use crate::policy::{AgentPolicy, EventStream, SessionSnapshot};
use crate::session::{SessionKey, SessionStore};

/// Final answer of one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnResult {
    Answer(String),
    /// The policy finished without flagging any event with text as final.
    NoAnswer,
}

impl TurnResult {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Answer(text) => Some(text),
            Self::NoAnswer => None,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answer(_))
    }
}

pub struct Dispatcher {
    policy: Arc<dyn AgentPolicy>,
    sessions: Arc<SessionStore>,
    app_name: String,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        policy: Arc<dyn AgentPolicy>,
        sessions: Arc<SessionStore>,
        app_name: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            policy,
            sessions,
            app_name: app_name.to_string(),
            timeout,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn session_key(&self, user_id: &str, session_id: &str) -> SessionKey {
        SessionKey::new(&self.app_name, user_id, session_id)
    }

    /// Runs a turn and yields each policy event once it is in the session history.
    ///
    /// The session stays locked until the stream ends or is dropped. The whole
    /// turn, policy start included, shares one deadline.
    pub fn stream(&self, user_id: &str, session_id: &str, query: &str) -> EventStream {
        Box::pin(run_turn(
            self.policy.clone(),
            self.sessions.clone(),
            self.session_key(user_id, session_id),
            QueryEvent::user(query),
            self.timeout,
        ))
    }

    /// Runs a turn to completion; the last final event with text is the answer.
    pub async fn dispatch(&self, user_id: &str, session_id: &str, query: &str) -> Result<TurnResult> {
        tracing::info!(
            "[DISPATCH] Session {} - query: '{}'",
            session_id,
            &query[..floor_char_boundary(query, 100)]
        );

        let mut events = self.stream(user_id, session_id, query);
        let mut answer = TurnResult::NoAnswer;
        let mut consumed = 0usize;
        while let Some(event) = events.next().await {
            let event = event?;
            consumed += 1;
            if let Some(text) = event.answer_text() {
                answer = TurnResult::Answer(text.to_string());
            }
        }

        if !answer.is_answered() {
            tracing::warn!(
                "[DISPATCH] Session {} - {} events, none final",
                session_id,
                consumed
            );
        }
        Ok(answer)
    }
}

fn run_turn(
    policy: Arc<dyn AgentPolicy>,
    sessions: Arc<SessionStore>,
    key: SessionKey,
    query: QueryEvent,
    timeout: Duration,
) -> impl Stream<Item = Result<QueryEvent>> + Send + 'static {
    try_stream! {
        let handle = sessions.handle_or_create(&key)?;
        let mut session = handle.lock_owned().await;
        let deadline = Instant::now() + timeout;

        let query = session.append(query);
        let snapshot = SessionSnapshot {
            key: key.clone(),
            history: session.events.clone(),
            state: session.state.clone(),
        };

        let mut events = tokio::time::timeout_at(deadline, policy.invoke(snapshot, query))
            .await
            .map_err(|_| CoordinatorError::DispatchTimeout(timeout))??;

        loop {
            let next = tokio::time::timeout_at(deadline, events.next())
                .await
                .map_err(|_| CoordinatorError::DispatchTimeout(timeout))?;
            match next {
                Some(event) => {
                    let event = session.append(event?);
                    yield event;
                }
                None => break,
            }
        }
    }
}

/// Largest char boundary at or below `max`, for log truncation.
pub(crate) fn floor_char_boundary(text: &str, max: usize) -> usize {
    if text.len() <= max {
        return text.len();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    end
}
