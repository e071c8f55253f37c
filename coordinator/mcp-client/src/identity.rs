/// Phone-number identity resolution
///
/// Resolution runs four steps against the identity provider: look the
/// principal up by phone number, mint a custom token for it, exchange that
/// token for an ID token, then verify the ID token. Any failure aborts the
/// request; there is no anonymous fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::IdentityConfig;
use crate::error::{CoordinatorError, Result};

lazy_static::lazy_static! {
    static ref E164: regex::Regex = regex::Regex::new(r"^\+[1-9][0-9]{6,14}$").unwrap();
    static ref PHONE_SEPARATORS: regex::Regex = regex::Regex::new(r"[\s\-().]").unwrap();
}

const CUSTOM_TOKEN_AUDIENCE: &str =
    "https://identitytoolkit.googleapis.com/google.identity.identitytoolkit.v1.IdentityToolkit";

/// A registered account on the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub uid: String,
    pub phone_number: String,
}

/// Strips separators and checks E.164 format.
pub fn normalize_phone_number(raw: &str) -> Result<String> {
    let compact = PHONE_SEPARATORS.replace_all(raw.trim(), "");
    if E164.is_match(&compact) {
        Ok(compact.into_owned())
    } else {
        Err(CoordinatorError::InvalidPhoneNumber(raw.to_string()))
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fails with `NotFound` when no account has this phone number.
    async fn lookup_by_phone(&self, phone_number: &str) -> Result<Principal>;

    async fn mint_custom_token(&self, principal: &Principal) -> Result<String>;

    /// Returns the ID token issued for a custom token.
    async fn exchange_custom_token(&self, custom_token: &str) -> Result<String>;

    /// Returns the uid the ID token asserts.
    async fn verify_id_token(&self, id_token: &str) -> Result<String>;
}

pub struct IdentityResolver {
    provider: Arc<dyn IdentityProvider>,
    timeout: Duration,
}

impl IdentityResolver {
    pub fn new(provider: Arc<dyn IdentityProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Resolves a phone number to the provider's stable user id.
    pub async fn resolve(&self, phone_number: &str) -> Result<String> {
        let phone_number = normalize_phone_number(phone_number)?;

        let principal = self.bounded("lookup", self.provider.lookup_by_phone(&phone_number)).await?;
        let custom_token = self.bounded("mint", self.provider.mint_custom_token(&principal)).await?;
        let id_token = self
            .bounded("exchange", self.provider.exchange_custom_token(&custom_token))
            .await?;
        let uid = self.bounded("verify", self.provider.verify_id_token(&id_token)).await?;

        if uid != principal.uid {
            tracing::warn!("[IDENTITY] Verified uid does not match looked-up principal");
            return Err(CoordinatorError::IdentityProvider(
                "verified identity does not match the registered account".to_string(),
            ));
        }

        tracing::info!("[IDENTITY] Resolved phone number to user {}", uid);
        Ok(uid)
    }

    async fn bounded<T, F>(&self, step: &str, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CoordinatorError::IdentityProvider(format!(
                "{} step timed out after {:?}",
                step, self.timeout
            ))),
        }
    }
}

/// Identity provider reached over its REST endpoints
pub struct RestIdentityProvider {
    http: reqwest::Client,
    config: IdentityConfig,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
struct LookupUser {
    #[serde(rename = "localId")]
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct SignJwtResponse {
    #[serde(rename = "signedJwt")]
    signed_jwt: String,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    #[serde(rename = "idToken")]
    id_token: String,
}

impl RestIdentityProvider {
    pub fn new(http: reqwest::Client, config: IdentityConfig) -> Self {
        Self { http, config }
    }

    fn toolkit(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.toolkit_url.trim_end_matches('/'), path)
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        step: &str,
        request: reqwest::RequestBuilder,
        body: &Value,
    ) -> Result<T> {
        let response = request
            .timeout(self.config.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| CoordinatorError::IdentityProvider(format!("{} request failed: {}", step, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("[IDENTITY] {} returned {}: {}", step, status, error_text);
            return Err(CoordinatorError::IdentityProvider(format!(
                "{} returned {}",
                step, status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CoordinatorError::IdentityProvider(format!("{} response invalid: {}", step, e)))
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn lookup_by_phone(&self, phone_number: &str) -> Result<Principal> {
        let request = self
            .http
            .post(self.toolkit("accounts:lookup"))
            .bearer_auth(&self.config.access_token);
        let lookup: LookupResponse = self
            .post("lookup", request, &json!({ "phoneNumber": [phone_number] }))
            .await?;

        lookup
            .users
            .into_iter()
            .next()
            .map(|user| Principal {
                uid: user.local_id,
                phone_number: phone_number.to_string(),
            })
            .ok_or_else(|| CoordinatorError::NotFound(phone_number.to_string()))
    }

    async fn mint_custom_token(&self, principal: &Principal) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = json!({
            "iss": self.config.service_account_email,
            "sub": self.config.service_account_email,
            "aud": CUSTOM_TOKEN_AUDIENCE,
            "iat": now,
            "exp": now + 3600,
            "uid": principal.uid,
        });

        let url = format!(
            "{}/v1/projects/-/serviceAccounts/{}:signJwt",
            self.config.iam_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.service_account_email)
        );
        let request = self.http.post(url).bearer_auth(&self.config.access_token);
        let signed: SignJwtResponse = self
            .post("mint", request, &json!({ "payload": claims.to_string() }))
            .await?;
        Ok(signed.signed_jwt)
    }

    async fn exchange_custom_token(&self, custom_token: &str) -> Result<String> {
        let request = self
            .http
            .post(self.toolkit("accounts:signInWithCustomToken"))
            .query(&[("key", self.config.web_api_key.as_str())]);
        let signed_in: SignInResponse = self
            .post(
                "exchange",
                request,
                &json!({ "token": custom_token, "returnSecureToken": true }),
            )
            .await?;
        Ok(signed_in.id_token)
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<String> {
        let request = self
            .http
            .post(self.toolkit("accounts:lookup"))
            .query(&[("key", self.config.web_api_key.as_str())]);
        let lookup: LookupResponse = self
            .post("verify", request, &json!({ "idToken": id_token }))
            .await?;

        lookup
            .users
            .into_iter()
            .next()
            .map(|user| user.local_id)
            .ok_or_else(|| CoordinatorError::IdentityProvider("ID token was not accepted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One registered account; `verified_uid` overrides what verification returns.
    struct SingleAccount {
        phone: &'static str,
        uid: &'static str,
        verified_uid: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IdentityProvider for SingleAccount {
        async fn lookup_by_phone(&self, phone_number: &str) -> Result<Principal> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if phone_number == self.phone {
                Ok(Principal { uid: self.uid.to_string(), phone_number: phone_number.to_string() })
            } else {
                Err(CoordinatorError::NotFound(phone_number.to_string()))
            }
        }

        async fn mint_custom_token(&self, principal: &Principal) -> Result<String> {
            Ok(format!("custom-{}", principal.uid))
        }

        async fn exchange_custom_token(&self, custom_token: &str) -> Result<String> {
            Ok(format!("id-{}", custom_token))
        }

        async fn verify_id_token(&self, _id_token: &str) -> Result<String> {
            Ok(self.verified_uid.unwrap_or(self.uid).to_string())
        }
    }

    fn resolver(verified_uid: Option<&'static str>) -> (IdentityResolver, Arc<SingleAccount>) {
        let provider = Arc::new(SingleAccount {
            phone: "+14155550123",
            uid: "uid-123",
            verified_uid,
            calls: AtomicUsize::new(0),
        });
        (IdentityResolver::new(provider.clone(), Duration::from_secs(1)), provider)
    }

    #[test]
    fn test_normalize_phone_number() {
        assert_eq!(normalize_phone_number("+1 (415) 555-0123").unwrap(), "+14155550123");
        assert!(matches!(
            normalize_phone_number("4155550123"),
            Err(CoordinatorError::InvalidPhoneNumber(_))
        ));
        assert!(normalize_phone_number("+0123456789").is_err());
        assert!(normalize_phone_number("").is_err());
    }

    #[tokio::test]
    async fn test_resolve_registered_number() {
        let (resolver, _) = resolver(None);
        assert_eq!(resolver.resolve("+1 415 555 0123").await.unwrap(), "uid-123");
    }

    #[tokio::test]
    async fn test_unregistered_number_is_not_found() {
        let (resolver, _) = resolver(None);
        let err = resolver.resolve("+442071234567").await.unwrap_err();
        assert!(matches!(err, CoordinatorError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_number_never_reaches_provider() {
        let (resolver, provider) = resolver(None);
        assert!(resolver.resolve("not a phone").await.is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mismatched_verification_is_rejected() {
        let (resolver, _) = resolver(Some("someone-else"));
        let err = resolver.resolve("+14155550123").await.unwrap_err();
        assert!(matches!(err, CoordinatorError::IdentityProvider(_)));
    }
}
