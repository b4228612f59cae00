//! In-memory fakes of the I/O boundary traits, shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use let_me_in::config::Settings;
use let_me_in::domain::{IngressRule, IpPermission, ProviderError, SecurityGroup};
use let_me_in::infrastructure::di::ServiceContainer;
use let_me_in::infrastructure::traits::{CommandRunner, IpEcho, SecurityGroupProvider};

/// Ordered record of every boundary call, shared between fakes.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

pub fn permission(protocol: &str, port: i32, cidrs: &[&str]) -> IpPermission {
    IpPermission {
        protocol: protocol.into(),
        from_port: Some(port),
        to_port: Some(port),
        cidrs: cidrs.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn group(id: &str, name: &str, permissions: Vec<IpPermission>) -> SecurityGroup {
    SecurityGroup {
        id: id.into(),
        name: name.into(),
        permissions,
    }
}

/// Security groups held in memory, with EC2's idempotency error codes.
#[derive(Default)]
pub struct FakeProvider {
    groups: Mutex<Vec<SecurityGroup>>,
    tags: HashMap<String, HashMap<String, String>>,
    journal: Journal,
    describe_error: Option<ProviderError>,
    fail_group: Option<String>,
}

impl FakeProvider {
    pub fn new(groups: Vec<SecurityGroup>, journal: Journal) -> Self {
        Self {
            groups: Mutex::new(groups),
            journal,
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, group_id: &str, key: &str, value: &str) -> Self {
        self.tags
            .entry(group_id.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn failing_describe(mut self, err: ProviderError) -> Self {
        self.describe_error = Some(err);
        self
    }

    /// Every authorize/revoke on this group id fails with a non-idempotency error.
    pub fn failing_on(mut self, group_id: &str) -> Self {
        self.fail_group = Some(group_id.to_string());
        self
    }

    pub fn snapshot(&self, group_id: &str) -> Option<SecurityGroup> {
        self.groups
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
    }

    fn matches(&self, group: &SecurityGroup, filter_key: &str, value: &str) -> bool {
        match filter_key {
            "group-name" => group.name == value,
            "group-id" => group.id == value,
            key => match key.strip_prefix("tag:") {
                Some(tag) => self
                    .tags
                    .get(&group.id)
                    .and_then(|t| t.get(tag))
                    .is_some_and(|v| v == value),
                None => false,
            },
        }
    }

    fn check_failure(&self, group_id: &str) -> Result<(), ProviderError> {
        match &self.fail_group {
            Some(id) if id == group_id => Err(ProviderError::Other(
                "UnauthorizedOperation: not allowed".into(),
            )),
            _ => Ok(()),
        }
    }
}

fn rule_key(rule: &IngressRule) -> String {
    format!(
        "{} {:?} {:?} {}",
        rule.protocol, rule.from_port, rule.to_port, rule.cidr
    )
}

impl SecurityGroupProvider for FakeProvider {
    fn describe_groups(
        &self,
        filter_key: &str,
        values: &[String],
    ) -> Result<Vec<SecurityGroup>, ProviderError> {
        self.journal
            .push(format!("describe {} {}", filter_key, values.join(",")));
        if let Some(err) = &self.describe_error {
            return Err(err.clone());
        }
        Ok(self
            .groups
            .lock()
            .unwrap()
            .iter()
            .filter(|g| values.iter().any(|v| self.matches(g, filter_key, v)))
            .cloned()
            .collect())
    }

    fn authorize_ingress(&self, group_id: &str, rule: &IngressRule) -> Result<(), ProviderError> {
        self.journal
            .push(format!("authorize {} {}", group_id, rule_key(rule)));
        self.check_failure(group_id)?;

        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| ProviderError::Other(format!("InvalidGroup.NotFound: {}", group_id)))?;

        let existing = group.permissions.iter_mut().find(|p| {
            p.protocol == rule.protocol && p.from_port == rule.from_port && p.to_port == rule.to_port
        });
        match existing {
            Some(perm) if perm.cidrs.contains(&rule.cidr) => {
                Err(ProviderError::DuplicatePermission)
            }
            Some(perm) => {
                perm.cidrs.push(rule.cidr.clone());
                Ok(())
            }
            None => {
                group.permissions.push(IpPermission {
                    protocol: rule.protocol.clone(),
                    from_port: rule.from_port,
                    to_port: rule.to_port,
                    cidrs: vec![rule.cidr.clone()],
                });
                Ok(())
            }
        }
    }

    fn revoke_ingress(&self, group_id: &str, rule: &IngressRule) -> Result<(), ProviderError> {
        self.journal
            .push(format!("revoke {} {}", group_id, rule_key(rule)));
        self.check_failure(group_id)?;

        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| ProviderError::Other(format!("InvalidGroup.NotFound: {}", group_id)))?;

        let perm = group
            .permissions
            .iter_mut()
            .find(|p| {
                p.protocol == rule.protocol
                    && p.from_port == rule.from_port
                    && p.to_port == rule.to_port
                    && p.cidrs.contains(&rule.cidr)
            })
            .ok_or(ProviderError::PermissionNotFound)?;
        perm.cidrs.retain(|c| c != &rule.cidr);
        group.permissions.retain(|p| !p.cidrs.is_empty());
        Ok(())
    }
}

/// IP echo returning a fixed body, or failing.
pub struct FakeEcho {
    body: Result<String, String>,
    journal: Journal,
}

impl FakeEcho {
    pub fn returning(body: &str, journal: Journal) -> Self {
        Self {
            body: Ok(body.to_string()),
            journal,
        }
    }

    pub fn failing(message: &str, journal: Journal) -> Self {
        Self {
            body: Err(message.to_string()),
            journal,
        }
    }
}

impl IpEcho for FakeEcho {
    fn fetch(&self, url: &str) -> io::Result<String> {
        self.journal.push(format!("fetch {}", url));
        self.body
            .clone()
            .map_err(|m| io::Error::new(io::ErrorKind::ConnectionRefused, m))
    }
}

/// Command runner returning a scripted result.
pub struct FakeRunner {
    result: Result<Option<i32>, io::ErrorKind>,
    journal: Journal,
}

impl FakeRunner {
    pub fn exiting(code: i32, journal: Journal) -> Self {
        Self {
            result: Ok(Some(code)),
            journal,
        }
    }

    pub fn signalled(journal: Journal) -> Self {
        Self {
            result: Ok(None),
            journal,
        }
    }

    pub fn unspawnable(journal: Journal) -> Self {
        Self {
            result: Err(io::ErrorKind::NotFound),
            journal,
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run_inherited(&self, cmd: &str, args: &[String]) -> io::Result<Option<i32>> {
        self.journal.push(format!("run {} {}", cmd, args.join(" ")).trim_end().to_string());
        self.result
            .map_err(|kind| io::Error::new(kind, format!("{}: command not found", cmd)))
    }
}

/// Container wired to the given fakes.
pub fn container(
    provider: Arc<FakeProvider>,
    echo: FakeEcho,
    runner: FakeRunner,
) -> ServiceContainer {
    ServiceContainer::with_deps(Settings::default(), provider, Arc::new(echo), Arc::new(runner))
}
