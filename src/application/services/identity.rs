//! Public address resolution
//!
//! Decides which CIDR block to open: the caller's explicit choice, or the
//! address an external echo service sees, as a single-host block.

use std::sync::Arc;

use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::traits::IpEcho;

const HOST_SUFFIX: &str = "/32";

/// Service resolving the CIDR block to authorize.
pub struct IdentityService {
    echo: Arc<dyn IpEcho>,
}

impl IdentityService {
    pub fn new(echo: Arc<dyn IpEcho>) -> Self {
        Self { echo }
    }

    /// Resolve the CIDR for this run.
    ///
    /// A non-empty `explicit_cidr` is returned unchanged and the echo service is
    /// never contacted. Otherwise the echo response body, trimmed of surrounding
    /// whitespace, gets a `/32` suffix.
    pub fn resolve(&self, explicit_cidr: Option<&str>, ident_url: &str) -> ApplicationResult<String> {
        if let Some(cidr) = explicit_cidr.filter(|c| !c.is_empty()) {
            debug!("resolve: explicit cidr={}", cidr);
            return Ok(cidr.to_string());
        }

        let body = self
            .echo
            .fetch(ident_url)
            .map_err(|e| ApplicationError::Resolution {
                url: ident_url.to_string(),
                source: e,
            })?;

        let cidr = format!("{}{}", body.trim(), HOST_SUFFIX);
        debug!("resolve: ident_url={} cidr={}", ident_url, cidr);
        Ok(cidr)
    }
}
