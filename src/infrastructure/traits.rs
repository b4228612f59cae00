//! I/O boundary traits for testability
//!
//! These traits abstract the remote provider, the public IP lookup and child
//! processes, allowing services to be tested with mock implementations.

use std::io;
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::{IngressRule, ProviderError, SecurityGroup};
use crate::infrastructure::{InfraError, InfraResult};

/// Remote security group API.
pub trait SecurityGroupProvider: Send + Sync {
    /// Describe every group whose `filter_key` attribute matches any of `values`.
    fn describe_groups(
        &self,
        filter_key: &str,
        values: &[String],
    ) -> Result<Vec<SecurityGroup>, ProviderError>;

    /// Add an ingress rule to a group.
    fn authorize_ingress(&self, group_id: &str, rule: &IngressRule) -> Result<(), ProviderError>;

    /// Remove an ingress rule from a group.
    fn revoke_ingress(&self, group_id: &str, rule: &IngressRule) -> Result<(), ProviderError>;
}

/// "What is my IP" lookup.
pub trait IpEcho: Send + Sync {
    /// GET `url` and return the response body as text.
    fn fetch(&self, url: &str) -> io::Result<String>;
}

/// External command runner abstraction.
pub trait CommandRunner: Send + Sync {
    /// Run a command with the parent's stdin, stdout and stderr, blocking until it exits.
    ///
    /// Returns the exit code, or `None` if the child was terminated by a signal.
    fn run_inherited(&self, cmd: &str, args: &[String]) -> io::Result<Option<i32>>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

const IDENT_TIMEOUT_SECS: u64 = 30;

/// Real IP echo client over blocking HTTP.
#[derive(Debug)]
pub struct HttpIpEcho {
    client: reqwest::blocking::Client,
}

impl HttpIpEcho {
    pub fn new() -> InfraResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(IDENT_TIMEOUT_SECS))
            .user_agent(format!("let-me-in/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InfraError::Http {
                context: "create HTTP client".into(),
                source: e,
            })?;
        Ok(Self { client })
    }
}

impl IpEcho for HttpIpEcho {
    fn fetch(&self, url: &str) -> io::Result<String> {
        debug!("fetch: url={}", url);
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(io::Error::other)?;
        response.text().map_err(io::Error::other)
    }
}

/// Real command runner implementation.
///
/// While the child runs, SIGINT is left to the child (the terminal sends it to
/// the whole foreground group) and SIGTERM kills the child, so the caller
/// always gets control back to revoke.
#[derive(Debug, Default)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run_inherited(&self, cmd: &str, args: &[String]) -> io::Result<Option<i32>> {
        use std::process::Stdio;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        runtime.block_on(async {
            let mut child = tokio::process::Command::new(cmd)
                .args(args)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .spawn()?;
            debug!("run_inherited: spawned {} pid={:?}", cmd, child.id());

            let status = wait_shielded(&mut child).await?;
            Ok(status.code())
        })
    }
}

#[cfg(unix)]
async fn wait_shielded(child: &mut tokio::process::Child) -> io::Result<std::process::ExitStatus> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            status = child.wait() => return status,
            _ = sigint.recv() => {
                info!("Received SIGINT, waiting for child to exit");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, stopping child");
                if let Err(e) = child.start_kill() {
                    debug!("start_kill: {}", e);
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_shielded(child: &mut tokio::process::Child) -> io::Result<std::process::ExitStatus> {
    child.wait().await
}
