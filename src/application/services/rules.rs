//! Ingress rule mutation
//!
//! Idempotent add and remove of one rule per group, plus a bulk revoke of
//! everything a group currently allows.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{IngressRule, ProviderError, SecurityGroup};
use crate::infrastructure::traits::SecurityGroupProvider;

/// What a single authorize or revoke did to the remote group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleChange {
    /// The provider accepted the change.
    Applied,
    /// The group was already in the requested state.
    Unchanged,
}

/// Service issuing authorize/revoke calls against groups.
#[derive(Clone)]
pub struct RuleService {
    provider: Arc<dyn SecurityGroupProvider>,
}

impl RuleService {
    pub fn new(provider: Arc<dyn SecurityGroupProvider>) -> Self {
        Self { provider }
    }

    /// Add `rule` to `group`. An already-present rule counts as success.
    pub fn authorize(&self, group: &SecurityGroup, rule: &IngressRule) -> ApplicationResult<RuleChange> {
        match self.provider.authorize_ingress(&group.id, rule) {
            Ok(()) => {
                info!("authorized {} on {}", rule, group);
                Ok(RuleChange::Applied)
            }
            Err(ProviderError::DuplicatePermission) => {
                debug!("authorize: {} already present on {}", rule, group);
                Ok(RuleChange::Unchanged)
            }
            Err(e) => Err(ApplicationError::Provider {
                action: "authorize",
                group: group.to_string(),
                source: e,
            }),
        }
    }

    /// Remove `rule` from `group`. An absent rule counts as success.
    pub fn revoke(&self, group: &SecurityGroup, rule: &IngressRule) -> ApplicationResult<RuleChange> {
        match self.provider.revoke_ingress(&group.id, rule) {
            Ok(()) => {
                info!("revoked {} on {}", rule, group);
                Ok(RuleChange::Applied)
            }
            Err(ProviderError::PermissionNotFound) => {
                debug!("revoke: {} not present on {}", rule, group);
                Ok(RuleChange::Unchanged)
            }
            Err(e) => Err(ApplicationError::Provider {
                action: "revoke",
                group: group.to_string(),
                source: e,
            }),
        }
    }

    /// Revoke every (permission, cidr) pair the fetched group record lists.
    ///
    /// Returns the number of revoke calls issued.
    pub fn clean(&self, group: &SecurityGroup) -> ApplicationResult<usize> {
        let mut issued = 0;
        for rule in group.ingress_rules() {
            self.revoke(group, &rule)?;
            issued += 1;
        }
        debug!("clean: issued {} revoke(s) on {}", issued, group);
        Ok(issued)
    }

    /// Authorize on each group in order; the first failure stops the loop.
    pub fn authorize_all(&self, groups: &[SecurityGroup], rule: &IngressRule) -> ApplicationResult<()> {
        for group in groups {
            self.authorize(group, rule)?;
        }
        Ok(())
    }

    /// Revoke on each group in order; the first failure stops the loop.
    pub fn revoke_all(&self, groups: &[SecurityGroup], rule: &IngressRule) -> ApplicationResult<()> {
        for group in groups {
            self.revoke(group, rule)?;
        }
        Ok(())
    }

    /// Clean each group in order and return the total revoke count.
    pub fn clean_all(&self, groups: &[SecurityGroup]) -> ApplicationResult<usize> {
        let mut total = 0;
        for group in groups {
            total += self.clean(group)?;
        }
        Ok(total)
    }
}
