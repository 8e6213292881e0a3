//! Desired state of one managed secret

use std::fmt;
use std::str::FromStr;

use url::Url;
use vsync_adapter_vault::{AuthDescriptor, SecretAddress, SecretValue, parse_base_url, parse_secret_value};
use vsync_config::ResourceParams;
use vsync_errors::{VaultError, VaultResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl FromStr for Ensure {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(VaultError::invalid_parameter(format!(
                "ensure must be 'present' or 'absent', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Absent => f.write_str("absent"),
        }
    }
}

/// Validated, immutable descriptor handed to the Reconciler.
///
/// `update_guard = false` means an existing secret is reported as holding
/// the desired value, so a differing stored value is never overwritten by
/// `apply`.
#[derive(Clone)]
pub struct SecretResource {
    pub address: SecretAddress,
    pub url: Url,
    pub ensure: Ensure,
    pub auth: AuthDescriptor,
    pub value: Option<SecretValue>,
    pub update_guard: bool,
}

impl SecretResource {
    pub fn new(fqdn: &str, url: Url, auth: AuthDescriptor) -> Self {
        Self {
            address: SecretAddress::resolve(fqdn),
            url,
            ensure: Ensure::Present,
            auth,
            value: None,
            update_guard: true,
        }
    }

    pub fn with_ensure(mut self, ensure: Ensure) -> Self {
        self.ensure = ensure;
        self
    }

    pub fn with_value(mut self, value: SecretValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_update_guard(mut self, update_guard: bool) -> Self {
        self.update_guard = update_guard;
        self
    }

    /// Validate operator-supplied parameters. No network access.
    pub fn from_params(params: &ResourceParams) -> VaultResult<Self> {
        let url = parse_base_url(&params.url)?;
        let ensure: Ensure = params.ensure.parse()?;
        let auth = AuthDescriptor::from_value(&params.auth)?;
        let value = params.secret.as_ref().map(parse_secret_value).transpose()?;

        Ok(Self {
            address: SecretAddress::resolve(params.secret_fqdn.as_str()),
            url,
            ensure,
            auth,
            value,
            update_guard: params.update,
        })
    }

    pub fn fqdn(&self) -> &str {
        self.address.fqdn()
    }
}

impl fmt::Debug for SecretResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretResource")
            .field("address", &self.address)
            .field("url", &self.url.as_str())
            .field("ensure", &self.ensure)
            .field("auth", &self.auth.kind())
            .field("value", &self.value.as_ref().map(|v| format!("<{} keys>", v.len())))
            .field("update_guard", &self.update_guard)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(auth: serde_json::Value, secret: Option<serde_json::Value>) -> ResourceParams {
        ResourceParams {
            secret_fqdn: "secret/foo".to_string(),
            ensure: "present".to_string(),
            url: "http://127.0.0.1:8200".to_string(),
            auth,
            secret,
            update: true,
        }
    }

    #[test]
    fn test_from_params() {
        let resource = SecretResource::from_params(&params(
            json!({"type": "token", "token": "c38e2dca"}),
            Some(json!({"value1": "bar1", "value2": "bar2"})),
        ))
        .unwrap();

        assert_eq!(resource.address.mount_path(), "secret");
        assert_eq!(resource.address.leaf_name(), "foo");
        assert_eq!(resource.ensure, Ensure::Present);
        assert!(resource.update_guard);
        assert_eq!(resource.value.as_ref().unwrap()["value2"], "bar2");
    }

    #[test]
    fn test_from_params_rejects_bad_url() {
        let mut p = params(json!({"type": "token", "token": "t"}), None);
        p.url = "vault.example.local:8200".to_string();
        let err = SecretResource::from_params(&p).unwrap_err();
        assert!(matches!(err, VaultError::InvalidParameter(_)));
    }

    #[test]
    fn test_from_params_rejects_bad_ensure() {
        let mut p = params(json!({"type": "token", "token": "t"}), None);
        p.ensure = "latest".to_string();
        let err = SecretResource::from_params(&p).unwrap_err();
        assert!(matches!(err, VaultError::InvalidParameter(ref m) if m.contains("latest")));
    }

    #[test]
    fn test_from_params_rejects_non_mapping_auth_and_secret() {
        let err = SecretResource::from_params(&params(json!("token"), None)).unwrap_err();
        assert!(matches!(err, VaultError::InvalidParameter(_)));

        let err = SecretResource::from_params(&params(
            json!({"type": "token", "token": "t"}),
            Some(json!("bar1")),
        ))
        .unwrap_err();
        assert!(matches!(err, VaultError::InvalidParameter(_)));
    }

    #[test]
    fn test_from_params_rejects_unknown_auth_type() {
        let err = SecretResource::from_params(&params(json!({"type": "userpass"}), None))
            .unwrap_err();
        assert!(matches!(err, VaultError::UnsupportedAuthType(_)));
    }

    #[test]
    fn test_debug_hides_value_and_auth() {
        let resource = SecretResource::from_params(&params(
            json!({"type": "token", "token": "c38e2dca"}),
            Some(json!({"password": "hunter2"})),
        ))
        .unwrap();
        let debug_output = format!("{:?}", resource);
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains("c38e2dca"));
        assert!(debug_output.contains("<1 keys>"));
    }
}
