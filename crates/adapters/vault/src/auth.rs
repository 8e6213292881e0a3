//! Token and AppRole authentication

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;
use vsync_errors::{VaultError, VaultResult};

use crate::cache::CredentialCache;
use crate::transport::{HttpClient, HttpRequest, api_url};

const APPROLE_LOGIN_PATH: &str = "auth/approle/login";

/// Bearer token for one reconciliation pass. Never persisted.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// How to obtain a credential
#[derive(Debug, Clone)]
pub enum AuthDescriptor {
    /// Use the token as-is
    Token { token: SecretString },

    /// Exchange role_id/secret_id for a client token
    AppRole {
        role_id: String,
        secret_id: SecretString,
    },
}

impl AuthDescriptor {
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token {
            token: SecretString::new(token.into()),
        }
    }

    pub fn approle(role_id: impl Into<String>, secret_id: impl Into<String>) -> Self {
        Self::AppRole {
            role_id: role_id.into(),
            secret_id: SecretString::new(secret_id.into()),
        }
    }

    /// Validate an `auth` mapping such as
    /// `{"type": "approle", "role_id": "...", "secret_id": "..."}`.
    pub fn from_value(value: &serde_json::Value) -> VaultResult<Self> {
        let map = value.as_object().ok_or_else(|| {
            VaultError::invalid_parameter("auth parameter requires a mapping")
        })?;

        let kind = map
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| VaultError::unsupported_auth_type("<missing>"))?;

        let field = |name: &str| -> VaultResult<String> {
            map.get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    VaultError::invalid_parameter(format!(
                        "{} auth requires a string '{}' field",
                        kind, name
                    ))
                })
        };

        match kind {
            "token" => Ok(Self::token(field("token")?)),
            "approle" => Ok(Self::approle(field("role_id")?, field("secret_id")?)),
            other => Err(VaultError::unsupported_auth_type(other)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Token { .. } => "token",
            Self::AppRole { .. } => "approle",
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Debug, Deserialize)]
struct LoginAuth {
    client_token: Option<String>,
    #[serde(default)]
    lease_duration: u64,
}

/// Resolves an AuthDescriptor into a Credential.
///
/// Without a cache every call re-authenticates.
#[derive(Debug, Default)]
pub struct Authenticator {
    cache: Option<CredentialCache>,
}

impl Authenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse AppRole tokens for up to `ttl` (capped by the lease duration)
    pub fn with_cache(ttl: Duration) -> Self {
        Self {
            cache: Some(CredentialCache::new(ttl)),
        }
    }

    pub async fn authenticate(
        &self,
        http: &dyn HttpClient,
        base_url: &Url,
        descriptor: &AuthDescriptor,
    ) -> VaultResult<Credential> {
        match descriptor {
            AuthDescriptor::Token { token } => Ok(Credential::new(token.expose_secret().clone())),
            AuthDescriptor::AppRole { role_id, secret_id } => {
                if let Some(ref cache) = self.cache {
                    if let Some(credential) = cache.get(base_url, descriptor).await {
                        debug!(role_id = %role_id, "using cached AppRole token");
                        return Ok(credential);
                    }
                }

                let (credential, lease) =
                    login_approle(http, base_url, role_id, secret_id.expose_secret()).await?;

                if let Some(ref cache) = self.cache {
                    cache.insert(base_url, descriptor, credential.clone(), lease).await;
                }
                Ok(credential)
            }
        }
    }
}

/// POST the AppRole pair and return the client token with its lease
async fn login_approle(
    http: &dyn HttpClient,
    base_url: &Url,
    role_id: &str,
    secret_id: &str,
) -> VaultResult<(Credential, Option<Duration>)> {
    let body = serde_json::json!({
        "role_id": role_id,
        "secret_id": secret_id,
    });
    let request = HttpRequest::post(api_url(base_url, APPROLE_LOGIN_PATH)).with_json(&body)?;

    let response = http
        .send(request)
        .await
        .map_err(|e| VaultError::auth_failed(format!("login request failed: {}", e)))?;

    if !response.is_success() {
        return Err(VaultError::auth_failed(format!(
            "login returned {}: {}",
            response.status, response.body
        )));
    }

    let parsed: LoginResponse = response
        .json()
        .map_err(|e| VaultError::auth_failed(format!("failed to parse login response: {}", e)))?;

    let auth = parsed
        .auth
        .ok_or_else(|| VaultError::auth_failed("login response carries no auth block"))?;
    let token = auth
        .client_token
        .ok_or_else(|| VaultError::auth_failed("login response carries no auth.client_token"))?;

    info!(role_id = %role_id, lease_duration_secs = auth.lease_duration, "authenticated with AppRole");

    let lease = (auth.lease_duration > 0).then(|| Duration::from_secs(auth.lease_duration));
    Ok((Credential::new(token), lease))
}
