/// Tool backend client
/// Loads toolset definitions (cached per toolset) and invokes tools over HTTP

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::error::{CoordinatorError, Result};

const MANIFEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

/// Manifest returned by `GET /api/toolset/{name}`
#[derive(Debug, Deserialize)]
struct ToolsetManifest {
    #[serde(rename = "serverVersion", default)]
    server_version: Option<String>,
    #[serde(default)]
    tools: HashMap<String, ToolSchema>,
}

#[derive(Debug, Deserialize)]
struct ToolSchema {
    #[serde(default)]
    description: String,
    #[serde(default)]
    parameters: Vec<ToolParameter>,
}

pub struct ToolboxClient {
    http: reqwest::Client,
    base_url: String,
    toolsets: RwLock<HashMap<String, Vec<ToolDefinition>>>,
}

impl ToolboxClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            toolsets: RwLock::new(HashMap::new()),
        }
    }

    /// Tool definitions of a toolset; fetched once, then served from the cache.
    pub async fn load_toolset(&self, toolset: &str) -> Result<Vec<ToolDefinition>> {
        if let Some(cached) = self.toolsets.read().await.get(toolset) {
            tracing::debug!("[TOOLBOX] Using cached toolset {}", toolset);
            return Ok(cached.clone());
        }

        let url = format!("{}/api/toolset/{}", self.base_url, urlencoding::encode(toolset));
        let response = match tokio::time::timeout(MANIFEST_TIMEOUT, self.http.get(&url).send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(CoordinatorError::tool(toolset, format!("Network error: {}", e))),
            Err(_) => return Err(CoordinatorError::tool(toolset, "Request timeout")),
        };

        if !response.status().is_success() {
            return Err(CoordinatorError::tool(
                toolset,
                format!("Toolbox returned {}", response.status()),
            ));
        }

        let manifest: ToolsetManifest = response
            .json()
            .await
            .map_err(|e| CoordinatorError::tool(toolset, format!("Failed to parse manifest: {}", e)))?;

        let mut tools: Vec<ToolDefinition> = manifest
            .tools
            .into_iter()
            .map(|(name, schema)| ToolDefinition {
                name,
                description: schema.description,
                parameters: schema.parameters,
            })
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::info!(
            "[TOOLBOX] Loaded {} tools from {} (server {})",
            tools.len(),
            toolset,
            manifest.server_version.as_deref().unwrap_or("unknown")
        );

        self.toolsets
            .write()
            .await
            .insert(toolset.to_string(), tools.clone());
        Ok(tools)
    }

    /// Invokes a tool and returns its result payload.
    pub async fn invoke(&self, tool: &str, arguments: &Value) -> Result<Value> {
        let url = format!("{}/api/tool/{}/invoke", self.base_url, urlencoding::encode(tool));
        let body = if arguments.is_object() { arguments.clone() } else { json!({}) };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoordinatorError::tool(tool, format!("Network error: {}", e)))?;

        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = payload
                .get("error")
                .map(error_text)
                .unwrap_or_else(|| format!("Toolbox returned {}", status));
            return Err(CoordinatorError::tool(tool, message));
        }

        if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
            return Err(CoordinatorError::tool(tool, error_text(error)));
        }

        match payload.get("result") {
            // The toolbox serializes rows into a string; unpack it when it is JSON.
            Some(Value::String(raw)) => Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))),
            Some(result) => Ok(result.clone()),
            None => Err(CoordinatorError::tool(tool, "Invalid toolbox response")),
        }
    }
}

fn error_text(error: &Value) -> String {
    match error {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
