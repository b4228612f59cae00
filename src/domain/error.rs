//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid rule input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid CIDR block: {0:?}")]
    InvalidCidr(String),

    #[error("invalid protocol: {0:?}")]
    InvalidProtocol(String),
}

/// Outcome of a failed provider call, classified by error code.
///
/// Only the two idempotency codes get their own variant; everything else is
/// carried as text and treated as fatal by the callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("the specified rule already exists")]
    DuplicatePermission,

    #[error("the specified rule does not exist")]
    PermissionNotFound,

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Provider code for authorizing a rule that is already present.
    pub const DUPLICATE_CODE: &'static str = "InvalidPermission.Duplicate";

    /// Provider code for revoking a rule that is absent.
    pub const NOT_FOUND_CODE: &'static str = "InvalidPermission.NotFound";

    /// Classify a raw provider error code.
    pub fn from_code(code: Option<&str>, detail: impl Into<String>) -> Self {
        match code {
            Some(Self::DUPLICATE_CODE) => Self::DuplicatePermission,
            Some(Self::NOT_FOUND_CODE) => Self::PermissionNotFound,
            _ => Self::Other(detail.into()),
        }
    }
}
