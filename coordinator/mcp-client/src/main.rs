/// Terminal client: each line typed on stdin is one query in a single session

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use travel_coordinator::{
    init_tracing, AgentPolicy, AppConfig, CoordinatorPolicy, Dispatcher, SessionStore, TurnResult,
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    init_tracing();

    let config = AppConfig::from_env().context("configuration failed")?;
    let policy: Arc<dyn AgentPolicy> =
        Arc::new(CoordinatorPolicy::from_config(&config, reqwest::Client::new())?);
    let dispatcher = Dispatcher::new(
        policy,
        Arc::new(SessionStore::new()),
        &config.app_name,
        config.dispatch_timeout,
    );

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let user_id = format!("cli_user_{}", &suffix[..8]);
    let session_id = format!("session_{}", &suffix[8..16]);

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Travel coordinator - ask about hotels, flights, restaurants, car rentals or bookings.\nType 'exit' to quit.\n")
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else { break };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }

        let reply = match dispatcher.dispatch(&user_id, &session_id, query).await {
            Ok(TurnResult::Answer(text)) => text,
            Ok(TurnResult::NoAnswer) => "(no answer produced)".to_string(),
            Err(e) => format!("error: {}", e),
        };
        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
    }

    Ok(())
}
