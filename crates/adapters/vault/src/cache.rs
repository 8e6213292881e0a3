//! TTL-bounded credential cache

use std::collections::HashMap;
use std::time::{Duration, Instant};

use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use url::Url;

use crate::auth::{AuthDescriptor, Credential};

/// Tokens expiring sooner than this are treated as already expired
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

struct CachedCredential {
    credential: Credential,
    expires_at: Instant,
}

impl CachedCredential {
    fn is_valid(&self, now: Instant) -> bool {
        self.expires_at > now + EXPIRY_MARGIN
    }
}

/// Login tokens keyed by a fingerprint of (store URL, auth descriptor).
///
/// Raw secret material never becomes a map key; only its SHA-256 digest does.
pub struct CredentialCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedCredential>>,
}

impl std::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CredentialCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, base_url: &Url, descriptor: &AuthDescriptor) -> Option<Credential> {
        let key = fingerprint(base_url, descriptor);
        let entries = self.entries.read().await;
        entries
            .get(&key)
            .filter(|entry| entry.is_valid(Instant::now()))
            .map(|entry| entry.credential.clone())
    }

    /// Store a credential for `min(ttl, lease)`
    pub async fn insert(
        &self,
        base_url: &Url,
        descriptor: &AuthDescriptor,
        credential: Credential,
        lease: Option<Duration>,
    ) {
        let lifetime = lease.map_or(self.ttl, |lease| lease.min(self.ttl));
        let key = fingerprint(base_url, descriptor);
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.is_valid(now));
        entries.insert(
            key,
            CachedCredential {
                credential,
                expires_at: now + lifetime,
            },
        );
    }
}

fn fingerprint(base_url: &Url, descriptor: &AuthDescriptor) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base_url.as_str().trim_end_matches('/').as_bytes());
    hasher.update([0u8]);
    match descriptor {
        AuthDescriptor::Token { token } => {
            hasher.update(b"token\0");
            hasher.update(token.expose_secret().as_bytes());
        }
        AuthDescriptor::AppRole { role_id, secret_id } => {
            hasher.update(b"approle\0");
            hasher.update(role_id.as_bytes());
            hasher.update([0u8]);
            hasher.update(secret_id.expose_secret().as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://127.0.0.1:8200").unwrap()
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = CredentialCache::new(Duration::from_secs(300));
        let descriptor = AuthDescriptor::approle("r1", "s1");
        cache
            .insert(&base(), &descriptor, Credential::new("tok-1"), None)
            .await;

        let hit = cache.get(&base(), &descriptor).await.unwrap();
        assert_eq!(hit.expose(), "tok-1");
    }

    #[tokio::test]
    async fn test_miss_for_other_descriptor_or_url() {
        let cache = CredentialCache::new(Duration::from_secs(300));
        cache
            .insert(&base(), &AuthDescriptor::approle("r1", "s1"), Credential::new("tok-1"), None)
            .await;

        assert!(cache.get(&base(), &AuthDescriptor::approle("r1", "s2")).await.is_none());
        let other = Url::parse("http://10.0.0.10:8200").unwrap();
        assert!(cache.get(&other, &AuthDescriptor::approle("r1", "s1")).await.is_none());
    }

    #[tokio::test]
    async fn test_short_lease_is_not_reused() {
        let cache = CredentialCache::new(Duration::from_secs(300));
        let descriptor = AuthDescriptor::approle("r1", "s1");
        // A 20s lease falls inside the expiry margin.
        cache
            .insert(
                &base(),
                &descriptor,
                Credential::new("tok-1"),
                Some(Duration::from_secs(20)),
            )
            .await;

        assert!(cache.get(&base(), &descriptor).await.is_none());
    }

    #[test]
    fn test_fingerprint_ignores_trailing_slash() {
        let descriptor = AuthDescriptor::token("t");
        let with_slash = Url::parse("http://127.0.0.1:8200/").unwrap();
        assert_eq!(fingerprint(&base(), &descriptor), fingerprint(&with_slash, &descriptor));
        assert_eq!(fingerprint(&base(), &descriptor).len(), 64);
    }
}
