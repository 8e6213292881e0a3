//! secret-sync - declarative secret management against a Vault-compatible store
//!
//! A `SecretResource` describes whether a secret should be present and with
//! what value; the `Reconciler` checks the seal status, authenticates and
//! brings the store in line.

pub mod reconciler;
pub mod resource;
pub mod sync;

pub use reconciler::{Outcome, Reconciler};
pub use resource::{Ensure, SecretResource};
pub use sync::{ResourceReport, SyncReport, apply_all};
