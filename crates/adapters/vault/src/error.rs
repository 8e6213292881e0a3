//! Mapping of transport outcomes to VaultError

use vsync_errors::VaultError;

use crate::transport::{HttpResponse, TransportError};

/// Convert a failed request to VaultError
pub fn map_transport_error(err: TransportError, context: &str) -> VaultError {
    VaultError::unreachable(format!("{}: {}", context, err))
}

/// Pass 2xx responses through, surface everything else as a store error
pub fn check_status(response: HttpResponse) -> Result<HttpResponse, VaultError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(VaultError::store(response.status.as_u16(), response.body))
    }
}

/// Convert a body that does not match the expected shape to VaultError
pub fn map_decode_error(err: impl std::fmt::Display, context: &str) -> VaultError {
    VaultError::malformed_response(format!("{}: {}", context, err))
}
