//! vsync-adapter-vault - HashiCorp Vault adapter
//!
//! Client-side building blocks for managing secrets over the Vault HTTP API:
//! - Secret address resolution (`mount/leaf`)
//! - Seal-status precondition check
//! - Token and AppRole authentication, with an optional TTL credential cache
//! - List / read / write / delete against a mount path
//! - A pluggable `HttpClient` capability with a `reqwest` implementation

pub mod address;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod transport;

pub use address::{SecretAddress, parse_base_url, resolve};
pub use auth::{AuthDescriptor, Authenticator, Credential};
pub use cache::CredentialCache;
pub use client::{SecretStoreClient, SecretValue, parse_secret_value};
pub use config::{ClientSettings, ClientSettingsBuilder};
pub use health::{SealStatus, check_unsealed, seal_status};
pub use transport::{HttpClient, HttpRequest, HttpResponse, ReqwestClient, TransportError};
