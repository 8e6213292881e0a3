//! vsync-errors - 统一错误处理
//!
//! Secret store 协调过程中所有失败的分类

use thiserror::Error;

/// 协调错误类型
///
/// Every variant is fatal for the operation that produced it; the caller
/// decides whether to continue with other resources.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Secret store is sealed")]
    Sealed,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported auth type: {0}")]
    UnsupportedAuthType(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Store request failed with status {status}: {body}")]
    Store { status: u16, body: String },

    #[error("Secret value is required to create {0}")]
    MissingValue(String),

    #[error("Secret {0} does not exist")]
    SecretNotFound(String),

    #[error("Secret store unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed store response: {0}")]
    MalformedResponse(String),
}

impl VaultError {
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn unsupported_auth_type(kind: impl Into<String>) -> Self {
        Self::UnsupportedAuthType(kind.into())
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthFailed(msg.into())
    }

    pub fn store(status: u16, body: impl Into<String>) -> Self {
        Self::Store {
            status,
            body: body.into(),
        }
    }

    pub fn missing_value(fqdn: impl Into<String>) -> Self {
        Self::MissingValue(fqdn.into())
    }

    pub fn secret_not_found(fqdn: impl Into<String>) -> Self {
        Self::SecretNotFound(fqdn.into())
    }

    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }

    pub fn malformed_response(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// 稳定的错误标签，用于结构化日志
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sealed => "sealed",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::UnsupportedAuthType(_) => "unsupported_auth_type",
            Self::AuthFailed(_) => "auth_failed",
            Self::Store { .. } => "store",
            Self::MissingValue(_) => "missing_value",
            Self::SecretNotFound(_) => "secret_not_found",
            Self::Unreachable(_) => "unreachable",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }

    /// HTTP status carried by a store failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Store { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result 类型别名
pub type VaultResult<T> = Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_carries_status_and_body() {
        let err = VaultError::store(403, "permission denied");
        assert_eq!(err.status(), Some(403));
        assert_eq!(
            err.to_string(),
            "Store request failed with status 403: permission denied"
        );
        assert_eq!(err.kind(), "store");
    }

    #[test]
    fn test_not_found_is_distinct_from_store() {
        let err = VaultError::secret_not_found("secret/foo");
        assert!(matches!(err, VaultError::SecretNotFound(_)));
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Secret secret/foo does not exist");
    }
}
