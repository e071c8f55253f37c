/// Process configuration loaded from the environment (and an optional `.env`)

use std::time::Duration;

use crate::error::{CoordinatorError, Result};

/// How the HTTP front end establishes a user identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Missing ids are synthesized; a phone number is resolved when present.
    Anonymous,
    /// Every `/query` request must carry a resolvable phone number.
    Phone,
}

/// Settings for the hosted model endpoint
#[derive(Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub max_tool_rounds: usize,
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish()
    }
}

/// Settings for the phone-number identity provider
#[derive(Clone)]
pub struct IdentityConfig {
    pub web_api_key: String,
    pub service_account_email: String,
    pub access_token: String,
    pub toolkit_url: String,
    pub iam_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("web_api_key", &"<redacted>")
            .field("service_account_email", &self.service_account_email)
            .field("access_token", &"<redacted>")
            .field("toolkit_url", &self.toolkit_url)
            .field("iam_url", &self.iam_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub app_name: String,
    /// `None` when no model key is configured.
    pub model: Option<ModelConfig>,
    pub toolbox_url: String,
    pub dispatch_timeout: Duration,
    pub session_idle_ttl: Option<Duration>,
    pub auth_mode: AuthMode,
    pub identity: Option<IdentityConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(&get, "COORDINATOR_HTTP_PORT", 8000u16)?;
        let app_name = get("COORDINATOR_APP_NAME").unwrap_or_else(|| "coordinator".to_string());

        let model = match get("ANTHROPIC_API_KEY") {
            Some(api_key) => Some(ModelConfig {
                api_key,
                base_url: get("ANTHROPIC_BASE_URL")
                    .unwrap_or_else(|| "https://api.anthropic.com".to_string()),
                model: get("COORDINATOR_MODEL")
                    .unwrap_or_else(|| "claude-3-haiku-20240307".to_string()),
                max_tokens: parse_or(&get, "COORDINATOR_MAX_TOKENS", 1024u32)?,
                max_tool_rounds: parse_or(&get, "COORDINATOR_MAX_TOOL_ROUNDS", 5usize)?,
            }),
            None => None,
        };

        let toolbox_url = get("TOOLBOX_URL").unwrap_or_else(|| "http://127.0.0.1:5000".to_string());
        let dispatch_timeout =
            Duration::from_secs(parse_or(&get, "DISPATCH_TIMEOUT_SECS", 120u64)?);
        let session_idle_ttl = match get("SESSION_IDLE_TTL_SECS") {
            Some(raw) => Some(Duration::from_secs(parse_value("SESSION_IDLE_TTL_SECS", &raw)?)),
            None => None,
        };

        let auth_mode = match get("AUTH_MODE").map(|m| m.to_lowercase()).as_deref() {
            None | Some("anonymous") => AuthMode::Anonymous,
            Some("phone") => AuthMode::Phone,
            Some(other) => {
                return Err(CoordinatorError::Config(format!(
                    "AUTH_MODE must be 'anonymous' or 'phone', got '{}'",
                    other
                )))
            }
        };

        let identity = match get("FIREBASE_WEB_API_KEY") {
            Some(web_api_key) => {
                let service_account_email = get("FIREBASE_SERVICE_ACCOUNT_EMAIL").ok_or_else(|| {
                    CoordinatorError::Config("FIREBASE_SERVICE_ACCOUNT_EMAIL is not set".to_string())
                })?;
                let access_token = get("GOOGLE_OAUTH_ACCESS_TOKEN").ok_or_else(|| {
                    CoordinatorError::Config("GOOGLE_OAUTH_ACCESS_TOKEN is not set".to_string())
                })?;
                Some(IdentityConfig {
                    web_api_key,
                    service_account_email,
                    access_token,
                    toolkit_url: get("IDENTITY_TOOLKIT_URL")
                        .unwrap_or_else(|| "https://identitytoolkit.googleapis.com".to_string()),
                    iam_url: get("IAM_CREDENTIALS_URL")
                        .unwrap_or_else(|| "https://iamcredentials.googleapis.com".to_string()),
                    timeout: Duration::from_secs(parse_or(&get, "IDENTITY_TIMEOUT_SECS", 10u64)?),
                })
            }
            None => None,
        };

        if auth_mode == AuthMode::Phone && identity.is_none() {
            return Err(CoordinatorError::Config(
                "AUTH_MODE=phone requires FIREBASE_WEB_API_KEY".to_string(),
            ));
        }

        Ok(Self {
            port,
            app_name,
            model,
            toolbox_url,
            dispatch_timeout,
            session_idle_ttl,
            auth_mode,
            identity,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| CoordinatorError::Config(format!("{} has an invalid value '{}'", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.app_name, "coordinator");
        assert!(config.model.is_none());
        assert_eq!(config.toolbox_url, "http://127.0.0.1:5000");
        assert_eq!(config.dispatch_timeout, Duration::from_secs(120));
        assert!(config.session_idle_ttl.is_none());
        assert_eq!(config.auth_mode, AuthMode::Anonymous);
        assert!(config.identity.is_none());
    }

    #[test]
    fn test_model_settings_follow_api_key() {
        let config = config_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("COORDINATOR_MAX_TOOL_ROUNDS", "3"),
        ])
        .unwrap();
        let model = config.model.unwrap();
        assert_eq!(model.model, "claude-3-haiku-20240307");
        assert_eq!(model.max_tool_rounds, 3);
        assert!(!format!("{:?}", model).contains("sk-test"));
    }

    #[test]
    fn test_invalid_port_names_the_key() {
        let err = config_from(&[("COORDINATOR_HTTP_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("COORDINATOR_HTTP_PORT"));
    }

    #[test]
    fn test_phone_mode_requires_identity_settings() {
        let err = config_from(&[("AUTH_MODE", "phone")]).unwrap_err();
        assert!(matches!(err, CoordinatorError::Config(_)));

        let config = config_from(&[
            ("AUTH_MODE", "phone"),
            ("FIREBASE_WEB_API_KEY", "web-key"),
            ("FIREBASE_SERVICE_ACCOUNT_EMAIL", "svc@example.iam.gserviceaccount.com"),
            ("GOOGLE_OAUTH_ACCESS_TOKEN", "ya29.token"),
        ])
        .unwrap();
        assert_eq!(config.auth_mode, AuthMode::Phone);
        assert!(config.identity.is_some());
    }
}
