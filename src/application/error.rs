//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, ProviderError};

/// Application errors wrap domain errors and add the context of the failed step.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("cannot resolve public IP from {url}: {source}")]
    Resolution {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot look up security groups by {filter}: {source}")]
    Lookup {
        filter: String,
        #[source]
        source: ProviderError,
    },

    #[error("{action} failed for {group}: {source}")]
    Provider {
        action: &'static str,
        group: String,
        #[source]
        source: ProviderError,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
