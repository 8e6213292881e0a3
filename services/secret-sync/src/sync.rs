//! One pass over every configured resource

use tracing::{info, warn};
use vsync_config::ResourceParams;
use vsync_errors::VaultError;

use crate::reconciler::{Outcome, Reconciler};
use crate::resource::SecretResource;

/// Result of applying one resource
#[derive(Debug)]
pub struct ResourceReport {
    pub secret_fqdn: String,
    pub result: Result<Outcome, VaultError>,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub resources: Vec<ResourceReport>,
}

impl SyncReport {
    pub fn failed(&self) -> usize {
        self.resources.iter().filter(|r| r.result.is_err()).count()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.resources
            .iter()
            .filter(|r| matches!(r.result, Ok(o) if o == outcome))
            .count()
    }
}

/// Validate and apply each resource in order.
///
/// A failing resource is recorded and the pass moves on to the next one.
pub async fn apply_all(reconciler: &Reconciler, params: &[ResourceParams]) -> SyncReport {
    let mut report = SyncReport::default();

    for p in params {
        let result = match SecretResource::from_params(p) {
            Ok(resource) => reconciler.apply(&resource).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => info!(secret = %p.secret_fqdn, %outcome, "Secret reconciled"),
            Err(ref e) => warn!(
                secret = %p.secret_fqdn,
                error.kind = e.kind(),
                error = %e,
                "Secret reconciliation failed"
            ),
        }

        report.resources.push(ResourceReport {
            secret_fqdn: p.secret_fqdn.clone(),
            result,
        });
    }

    report
}
