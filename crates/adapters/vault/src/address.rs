//! Secret address resolution

use std::fmt;

use url::Url;
use vsync_errors::{VaultError, VaultResult};

/// Store coordinates of a fully-qualified secret name.
///
/// The name is split once, on the first `/`: `secret/foo/bar` lives in mount
/// `secret` under leaf `foo/bar`. A name without `/` uses the whole input for
/// both parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretAddress {
    fqdn: String,
    mount_path: String,
    leaf_name: String,
}

impl SecretAddress {
    pub fn resolve(fqdn: impl Into<String>) -> Self {
        let fqdn = fqdn.into();
        let (mount_path, leaf_name) = match fqdn.split_once('/') {
            Some((mount, leaf)) => (mount.to_string(), leaf.to_string()),
            None => (fqdn.clone(), fqdn.clone()),
        };

        Self {
            fqdn,
            mount_path,
            leaf_name,
        }
    }

    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    pub fn leaf_name(&self) -> &str {
        &self.leaf_name
    }

    /// Path below `/v1/` used for read, write and delete.
    ///
    /// This is the fqdn as given, which equals `{mount}/{leaf}` whenever the
    /// name contains a `/`.
    pub fn secret_path(&self) -> &str {
        &self.fqdn
    }

    /// `{mount}/{leaf}`, the entry a listing of the mount path refers to
    pub fn listed_path(&self) -> String {
        format!("{}/{}", self.mount_path, self.leaf_name)
    }
}

impl fmt::Display for SecretAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fqdn)
    }
}

/// Resolve a fully-qualified secret name into its store address
pub fn resolve(fqdn: &str) -> SecretAddress {
    SecretAddress::resolve(fqdn)
}

/// Parse the store base URL, accepting only `http` and `https`.
pub fn parse_base_url(raw: &str) -> VaultResult<Url> {
    let url = Url::parse(raw)
        .map_err(|e| VaultError::invalid_parameter(format!("url '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(VaultError::invalid_parameter(format!(
            "url '{}': unsupported scheme '{}', check url format",
            raw, scheme
        ))),
    }
}
