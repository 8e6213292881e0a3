//! Reconciliation of desired secret state against the store

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};
use url::Url;
use vsync_adapter_vault::{
    AuthDescriptor, Authenticator, Credential, HttpClient, SecretAddress, SecretStoreClient,
    SecretValue, check_unsealed,
};
use vsync_errors::{VaultError, VaultResult};

use crate::resource::{Ensure, SecretResource};

/// What `apply` did to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Deleted,
    Unchanged,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Unchanged => "unchanged",
        };
        f.write_str(label)
    }
}

/// Drives exists/create/read/update/destroy for one resource at a time.
///
/// Holds no per-resource state. Every operation checks the seal status and
/// obtains a fresh credential (unless the authenticator caches) before
/// touching the store, one request at a time.
pub struct Reconciler {
    http: Arc<dyn HttpClient>,
    authenticator: Authenticator,
}

impl Reconciler {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            authenticator: Authenticator::new(),
        }
    }

    pub fn with_authenticator(mut self, authenticator: Authenticator) -> Self {
        self.authenticator = authenticator;
        self
    }

    fn store<'a>(&'a self, base_url: &'a Url) -> SecretStoreClient<'a> {
        SecretStoreClient::new(self.http.as_ref(), base_url)
    }

    /// Seal check, then authentication
    async fn credential(&self, base_url: &Url, auth: &AuthDescriptor) -> VaultResult<Credential> {
        check_unsealed(self.http.as_ref(), base_url).await?;
        self.authenticator
            .authenticate(self.http.as_ref(), base_url, auth)
            .await
    }

    async fn is_listed(
        &self,
        base_url: &Url,
        credential: &Credential,
        address: &SecretAddress,
    ) -> VaultResult<bool> {
        let keys = self
            .store(base_url)
            .list(credential, address.mount_path())
            .await?;
        Ok(keys.contains(address.leaf_name()))
    }

    /// Whether the leaf name is listed under the mount path.
    /// A mount path the store does not know yields `false`.
    pub async fn exists(&self, resource: &SecretResource) -> VaultResult<bool> {
        let credential = self.credential(&resource.url, &resource.auth).await?;
        let exists = self
            .is_listed(&resource.url, &credential, &resource.address)
            .await?;

        debug!(secret = %resource.address, exists, "Checked secret existence");
        Ok(exists)
    }

    pub async fn create(&self, resource: &SecretResource) -> VaultResult<()> {
        let value = resource
            .value
            .as_ref()
            .ok_or_else(|| VaultError::missing_value(resource.fqdn()))?;

        let credential = self.credential(&resource.url, &resource.auth).await?;
        self.store(&resource.url)
            .write(&credential, &resource.address, value)
            .await?;

        info!(secret = %resource.address, "Created secret");
        Ok(())
    }

    /// Value to compare against the desired one.
    ///
    /// With the update guard off this is the desired value itself, so a
    /// stored value that differs is never reported as drift.
    pub async fn read(&self, resource: &SecretResource) -> VaultResult<SecretValue> {
        let credential = self.credential(&resource.url, &resource.auth).await?;

        if !resource.update_guard {
            debug!(secret = %resource.address, "Update guard off, reporting desired value");
            return resource
                .value
                .clone()
                .ok_or_else(|| VaultError::missing_value(resource.fqdn()));
        }

        self.store(&resource.url)
            .read(&credential, &resource.address)
            .await
    }

    /// Overwrite the stored value.
    ///
    /// Does not consult the update guard; only `read` (and therefore `apply`)
    /// does.
    pub async fn update(&self, resource: &SecretResource, value: &SecretValue) -> VaultResult<()> {
        let credential = self.credential(&resource.url, &resource.auth).await?;
        self.store(&resource.url)
            .write(&credential, &resource.address, value)
            .await?;

        info!(secret = %resource.address, "Updated secret");
        Ok(())
    }

    pub async fn destroy(&self, resource: &SecretResource) -> VaultResult<()> {
        let credential = self.credential(&resource.url, &resource.auth).await?;
        self.store(&resource.url)
            .delete(&credential, &resource.address)
            .await?;

        info!(secret = %resource.address, "Deleted secret");
        Ok(())
    }

    /// Bring the store in line with `resource.ensure`.
    ///
    /// | ensure  | exists | action                                   |
    /// |---------|--------|------------------------------------------|
    /// | present | no     | create                                   |
    /// | present | yes    | update if guard on and read-back differs |
    /// | absent  | yes    | destroy                                  |
    /// | absent  | no     | nothing                                  |
    pub async fn apply(&self, resource: &SecretResource) -> VaultResult<Outcome> {
        let exists = self.exists(resource).await?;

        let outcome = match (resource.ensure, exists) {
            (Ensure::Present, false) => {
                self.create(resource).await?;
                Outcome::Created
            }
            (Ensure::Present, true) => match resource.value {
                Some(ref desired) if resource.update_guard => {
                    let current = self.read(resource).await?;
                    if current == *desired {
                        Outcome::Unchanged
                    } else {
                        self.update(resource, desired).await?;
                        Outcome::Updated
                    }
                }
                _ => Outcome::Unchanged,
            },
            (Ensure::Absent, true) => {
                self.destroy(resource).await?;
                Outcome::Deleted
            }
            (Ensure::Absent, false) => Outcome::Unchanged,
        };

        Ok(outcome)
    }

    /// Read a secret by name.
    ///
    /// Fails with `SecretNotFound` when the name is not listed under its
    /// mount path, so callers can tell "does not exist" from "unreachable".
    pub async fn lookup(
        &self,
        base_url: &Url,
        auth: &AuthDescriptor,
        fqdn: &str,
    ) -> VaultResult<SecretValue> {
        let address = SecretAddress::resolve(fqdn);
        let listed = address.listed_path();
        let credential = self.credential(base_url, auth).await?;

        if !self.is_listed(base_url, &credential, &address).await? {
            return Err(VaultError::secret_not_found(listed));
        }

        // Read the entry that was just found in the listing.
        self.store(base_url)
            .read(&credential, &SecretAddress::resolve(listed))
            .await
    }
}
