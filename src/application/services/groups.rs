//! Security group lookup
//!
//! Turns user-supplied identifiers into group records with one filtered
//! describe call.

use std::sync::Arc;

use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::TargetSet;
use crate::infrastructure::traits::SecurityGroupProvider;

/// Service resolving identifiers to a [`TargetSet`].
pub struct GroupLookupService {
    provider: Arc<dyn SecurityGroupProvider>,
}

impl GroupLookupService {
    pub fn new(provider: Arc<dyn SecurityGroupProvider>) -> Self {
        Self { provider }
    }

    /// Describe every group whose `filter_key` matches any identifier.
    ///
    /// Groups come back in provider order. Identifiers that match nothing are
    /// dropped without error, so the result may be shorter than the input.
    pub fn resolve(&self, identifiers: &[String], filter_key: &str) -> ApplicationResult<TargetSet> {
        debug!("resolve: filter={} identifiers={:?}", filter_key, identifiers);
        if identifiers.is_empty() {
            return Ok(TargetSet::new());
        }

        let groups = self
            .provider
            .describe_groups(filter_key, identifiers)
            .map_err(|e| ApplicationError::Lookup {
                filter: filter_key.to_string(),
                source: e,
            })?;

        debug!(
            "resolve: {} group(s) matched {} identifier(s)",
            groups.len(),
            identifiers.len()
        );
        Ok(groups)
    }
}
