//! Command bracketing
//!
//! Opens the rule, runs the wrapped command to completion, then closes the
//! rule whatever the command did.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::services::RuleService;
use crate::application::ApplicationResult;
use crate::domain::{IngressRule, SecurityGroup};
use crate::infrastructure::traits::CommandRunner;

/// How the wrapped command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildStatus {
    Succeeded,
    Failed(i32),
    Signalled,
    SpawnFailed(String),
}

impl ChildStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ChildStatus::Succeeded)
    }
}

impl fmt::Display for ChildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildStatus::Succeeded => write!(f, "exit status 0"),
            ChildStatus::Failed(code) => write!(f, "exit status {}", code),
            ChildStatus::Signalled => write!(f, "terminated by signal"),
            ChildStatus::SpawnFailed(msg) => write!(f, "{}", msg),
        }
    }
}

/// Result of [`CommandBracket::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BracketOutcome {
    /// No command was given; nothing was authorized or revoked.
    Skipped,
    /// The command ran (or failed to start) between authorize and revoke.
    Completed { program: String, status: ChildStatus },
}

/// Runs a command while an ingress rule is open.
pub struct CommandBracket {
    rules: RuleService,
    cmd: Arc<dyn CommandRunner>,
}

impl CommandBracket {
    pub fn new(rules: RuleService, cmd: Arc<dyn CommandRunner>) -> Self {
        Self { rules, cmd }
    }

    /// Authorize on every group, run `argv`, then revoke on every group.
    ///
    /// Once authorize has succeeded the revoke always runs: a command that
    /// fails or cannot be spawned is reported in the outcome, not as an error.
    /// A failed authorize is revoked on every group before the error is
    /// returned, and the command is not run.
    pub fn run(
        &self,
        groups: &[SecurityGroup],
        rule: &IngressRule,
        argv: &[String],
    ) -> ApplicationResult<BracketOutcome> {
        let Some((program, args)) = argv.split_first() else {
            debug!("run: no command, skipping");
            return Ok(BracketOutcome::Skipped);
        };

        if let Err(e) = self.rules.authorize_all(groups, rule) {
            // groups before the failing one may already be open
            for group in groups {
                if let Err(revoke_err) = self.rules.revoke(group, rule) {
                    warn!("run: revoke after failed authorize: {}", revoke_err);
                }
            }
            return Err(e);
        }

        debug!("run: program={} args={:?}", program, args);
        let status = match self.cmd.run_inherited(program, args) {
            Ok(Some(0)) => ChildStatus::Succeeded,
            Ok(Some(code)) => ChildStatus::Failed(code),
            Ok(None) => ChildStatus::Signalled,
            Err(e) => ChildStatus::SpawnFailed(e.to_string()),
        };
        if !status.is_success() {
            warn!("{}: {}", program, status);
        }

        self.rules.revoke_all(groups, rule)?;

        Ok(BracketOutcome::Completed {
            program: program.clone(),
            status,
        })
    }
}
