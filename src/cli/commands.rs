//! Command dispatch: turns parsed flags into one run against the services

use tracing::{debug, instrument};

use crate::application::services::{BracketOutcome, Reporter};
use crate::application::ApplicationError;
use crate::cli::args::Cli;
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{Mode, RunConfig, Settings};
use crate::domain::{IngressRule, RuleSpec, TargetSet};
use crate::infrastructure::di::ServiceContainer;

/// Load settings, wire real services and run.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    if cli.show_config {
        output::info(&settings.to_toml()?);
        return Ok(());
    }

    let run = build_run_config(cli, &settings)?;
    let container = ServiceContainer::new(settings)?;
    execute(&run, &container)
}

/// Merge flags over settings into the immutable run description.
pub fn build_run_config(cli: &Cli, settings: &Settings) -> CliResult<RunConfig> {
    if cli.groups.is_empty() {
        return Err(CliError::Usage(
            "at least one security group is required".into(),
        ));
    }

    let mode = if cli.list {
        Mode::List
    } else if cli.clean {
        Mode::Clean
    } else if cli.revoke {
        Mode::Revoke
    } else {
        Mode::Authorize
    };

    Ok(RunConfig {
        mode,
        protocol: cli
            .protocol
            .clone()
            .unwrap_or_else(|| settings.protocol.clone()),
        port: cli.port.unwrap_or(settings.port),
        cidr: cli.cidr.clone(),
        filter: cli.filter.clone().unwrap_or_else(|| settings.filter.clone()),
        ident_url: settings.ident_url.clone(),
        groups: cli.groups.clone(),
        command: cli.command.clone(),
    })
}

/// Run one invocation against the services in `container`.
///
/// Modes that touch a single rule resolve and validate it before the group
/// lookup, so bad input never reaches the describe call.
#[instrument(skip(container))]
pub fn execute(run: &RunConfig, container: &ServiceContainer) -> CliResult<()> {
    debug!("execute: settings {:?}", container.settings);
    match run.mode {
        Mode::List => _list(&lookup(run, container)?),
        Mode::Clean => _clean(container, &lookup(run, container)?),
        Mode::Revoke => {
            let rule = rule_for(run, container)?;
            _revoke(run, container, &lookup(run, container)?, &rule)
        }
        Mode::Authorize => {
            let rule = rule_for(run, container)?;
            _authorize(run, container, &lookup(run, container)?, &rule)
        }
    }
}

fn lookup(run: &RunConfig, container: &ServiceContainer) -> CliResult<TargetSet> {
    let groups = container
        .group_lookup_service()
        .resolve(&run.groups, &run.filter)?;
    if groups.is_empty() {
        output::warning(&format!(
            "no security groups matched {} {}",
            run.filter,
            run.groups.join(", ")
        ));
    }
    Ok(groups)
}

/// Resolve the CIDR and validate the rule.
fn rule_for(run: &RunConfig, container: &ServiceContainer) -> CliResult<IngressRule> {
    let cidr = container
        .identity_service()
        .resolve(run.cidr.as_deref(), &run.ident_url)?;
    let rule = RuleSpec::new(run.protocol.clone(), run.port, cidr).map_err(ApplicationError::from)?;
    debug!("rule_for: {:?}", rule);
    Ok(rule.to_ingress())
}

fn _list(groups: &TargetSet) -> CliResult<()> {
    let table = Reporter::render(groups);
    if !table.is_empty() {
        output::info(&table);
    }
    Ok(())
}

fn _clean(container: &ServiceContainer, groups: &TargetSet) -> CliResult<()> {
    let revoked = container.rule_service().clean_all(groups)?;
    output::action(
        "Cleaned",
        &format!("{} rule(s) from {} group(s)", revoked, groups.len()),
    );
    Ok(())
}

fn _revoke(
    run: &RunConfig,
    container: &ServiceContainer,
    groups: &TargetSet,
    rule: &IngressRule,
) -> CliResult<()> {
    if !run.command.is_empty() {
        output::warning("ignoring command: nothing is run in revoke mode");
    }
    container.rule_service().revoke_all(groups, rule)?;
    output::action("Revoked", &format!("{} on {} group(s)", rule, groups.len()));
    Ok(())
}

fn _authorize(
    run: &RunConfig,
    container: &ServiceContainer,
    groups: &TargetSet,
    rule: &IngressRule,
) -> CliResult<()> {
    if run.command.is_empty() {
        container.rule_service().authorize_all(groups, rule)?;
        output::action("Authorized", &format!("{} on {} group(s)", rule, groups.len()));
        return Ok(());
    }

    // The wrapped command owns stdout/stderr from here; only report failures.
    match container.command_bracket().run(groups, rule, &run.command)? {
        BracketOutcome::Completed { program, status } if !status.is_success() => {
            output::warning(&format!("{}: {}", program, status));
        }
        BracketOutcome::Completed { program, .. } => {
            debug!("_authorize: {} finished, rule revoked", program);
        }
        BracketOutcome::Skipped => {}
    }
    Ok(())
}
