//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{
    CommandBracket, GroupLookupService, IdentityService, RuleService,
};
use crate::config::Settings;
use crate::infrastructure::ec2::Ec2Provider;
use crate::infrastructure::traits::{
    CommandRunner, HttpIpEcho, IpEcho, RealCommandRunner, SecurityGroupProvider,
};
use crate::infrastructure::InfraResult;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Remote security group API
    pub provider: Arc<dyn SecurityGroupProvider>,

    /// Public IP lookup
    pub echo: Arc<dyn IpEcho>,

    /// Command runner abstraction
    pub cmd: Arc<dyn CommandRunner>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        Ok(Self::with_deps(
            settings,
            Arc::new(Ec2Provider::from_env()?),
            Arc::new(HttpIpEcho::new()?),
            Arc::new(RealCommandRunner),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        provider: Arc<dyn SecurityGroupProvider>,
        echo: Arc<dyn IpEcho>,
        cmd: Arc<dyn CommandRunner>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            provider,
            echo,
            cmd,
        }
    }

    pub fn identity_service(&self) -> IdentityService {
        IdentityService::new(self.echo.clone())
    }

    pub fn group_lookup_service(&self) -> GroupLookupService {
        GroupLookupService::new(self.provider.clone())
    }

    pub fn rule_service(&self) -> RuleService {
        RuleService::new(self.provider.clone())
    }

    pub fn command_bracket(&self) -> CommandBracket {
        CommandBracket::new(self.rule_service(), self.cmd.clone())
    }
}
