//! Seal-status precondition

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;
use vsync_errors::{VaultError, VaultResult};

use crate::error::{check_status, map_decode_error, map_transport_error};
use crate::transport::{HttpClient, HttpRequest, api_url};

const SEAL_STATUS_PATH: &str = "sys/seal-status";

/// Body of `GET /v1/sys/seal-status`
#[derive(Debug, Clone, Deserialize)]
pub struct SealStatus {
    pub sealed: bool,
    #[serde(default)]
    pub initialized: Option<bool>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Fetch the store's seal status (unauthenticated)
pub async fn seal_status(http: &dyn HttpClient, base_url: &Url) -> VaultResult<SealStatus> {
    let response = http
        .send(HttpRequest::get(api_url(base_url, SEAL_STATUS_PATH)))
        .await
        .map_err(|e| map_transport_error(e, "Failed to query seal status"))?;
    let response = check_status(response)?;

    response
        .json()
        .map_err(|e| map_decode_error(e, "Failed to parse seal status"))
}

/// Fail with `VaultError::Sealed` unless the store is unsealed.
///
/// Runs before every authenticated operation and is never retried.
pub async fn check_unsealed(http: &dyn HttpClient, base_url: &Url) -> VaultResult<()> {
    let status = seal_status(http, base_url).await?;
    if status.sealed {
        warn!(url = %base_url, "secret store is sealed");
        return Err(VaultError::Sealed);
    }

    debug!(url = %base_url, version = ?status.version, "secret store is unsealed");
    Ok(())
}
