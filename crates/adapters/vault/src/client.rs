//! Secret store client

use std::collections::BTreeSet;

use http::StatusCode;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use vsync_errors::{VaultError, VaultResult};

use crate::address::SecretAddress;
use crate::auth::Credential;
use crate::error::{check_status, map_decode_error, map_transport_error};
use crate::transport::{HttpClient, HttpRequest, api_url};

/// Secret payload: flat mapping of key to scalar JSON value
pub type SecretValue = serde_json::Map<String, serde_json::Value>;

/// Validate a `secret` parameter: a mapping whose values are strings,
/// numbers or booleans.
pub fn parse_secret_value(value: &serde_json::Value) -> VaultResult<SecretValue> {
    let map = value
        .as_object()
        .ok_or_else(|| VaultError::invalid_parameter("secret parameter requires a mapping"))?;

    if let Some((key, _)) = map
        .iter()
        .find(|(_, v)| v.is_object() || v.is_array() || v.is_null())
    {
        return Err(VaultError::invalid_parameter(format!(
            "secret key '{}' must hold a scalar value",
            key
        )));
    }

    Ok(map.clone())
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: Option<ListData>,
}

#[derive(Debug, Deserialize)]
struct ListData {
    #[serde(default)]
    keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    data: Option<SecretValue>,
}

/// List, read, write and delete against one store.
///
/// Every call carries the supplied credential in `X-Vault-Token`.
pub struct SecretStoreClient<'a> {
    http: &'a dyn HttpClient,
    base_url: &'a Url,
}

impl<'a> SecretStoreClient<'a> {
    pub fn new(http: &'a dyn HttpClient, base_url: &'a Url) -> Self {
        Self { http, base_url }
    }

    /// Leaf names under `mount_path`.
    ///
    /// A 404 means the mount path has no entries yet and yields an empty set.
    pub async fn list(
        &self,
        credential: &Credential,
        mount_path: &str,
    ) -> VaultResult<BTreeSet<String>> {
        debug!(mount_path, "Listing secrets");

        let url = api_url(self.base_url, &format!("{}/?list=true", mount_path));
        let response = self
            .http
            .send(HttpRequest::get(url).with_token(credential))
            .await
            .map_err(|e| map_transport_error(e, &format!("Failed to list {}", mount_path)))?;

        if response.status == StatusCode::NOT_FOUND {
            debug!(mount_path, "Mount path has no entries");
            return Ok(BTreeSet::new());
        }

        let response = check_status(response)?;
        let parsed: ListResponse = response
            .json()
            .map_err(|e| map_decode_error(e, &format!("Failed to parse listing of {}", mount_path)))?;

        Ok(parsed
            .data
            .map(|data| data.keys.into_iter().collect())
            .unwrap_or_default())
    }

    /// Stored value at `address`
    pub async fn read(
        &self,
        credential: &Credential,
        address: &SecretAddress,
    ) -> VaultResult<SecretValue> {
        debug!(path = %address, "Reading secret");

        let url = api_url(self.base_url, address.secret_path());
        let response = self
            .http
            .send(HttpRequest::get(url).with_token(credential))
            .await
            .map_err(|e| map_transport_error(e, &format!("Failed to read {}", address)))?;
        let response = check_status(response)?;

        let parsed: ReadResponse = response
            .json()
            .map_err(|e| map_decode_error(e, &format!("Failed to parse secret {}", address)))?;

        parsed.data.ok_or_else(|| {
            VaultError::malformed_response(format!("secret {} has no data field", address))
        })
    }

    /// Replace the value at `address`
    pub async fn write(
        &self,
        credential: &Credential,
        address: &SecretAddress,
        value: &SecretValue,
    ) -> VaultResult<()> {
        debug!(path = %address, keys = value.len(), "Writing secret");

        let url = api_url(self.base_url, address.secret_path());
        let request = HttpRequest::post(url).with_token(credential).with_json(value)?;
        let response = self
            .http
            .send(request)
            .await
            .map_err(|e| map_transport_error(e, &format!("Failed to write {}", address)))?;
        check_status(response)?;

        Ok(())
    }

    pub async fn delete(&self, credential: &Credential, address: &SecretAddress) -> VaultResult<()> {
        debug!(path = %address, "Deleting secret");

        let url = api_url(self.base_url, address.secret_path());
        let response = self
            .http
            .send(HttpRequest::delete(url).with_token(credential))
            .await
            .map_err(|e| map_transport_error(e, &format!("Failed to delete {}", address)))?;
        check_status(response)?;

        Ok(())
    }
}
