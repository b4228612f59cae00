//! EC2 implementation of [`SecurityGroupProvider`]
//!
//! The AWS SDK is async; the provider owns a current-thread runtime and blocks
//! on each request so callers stay synchronous and strictly sequential.

use std::error::Error as StdError;
use std::fmt::Debug;

use aws_config::BehaviorVersion;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types::{Filter, IpRange, Ipv6Range};
use ipnet::IpNet;
use aws_sdk_ec2::Client;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::domain::{IngressRule, IpPermission, ProviderError, SecurityGroup};
use crate::infrastructure::traits::SecurityGroupProvider;
use crate::infrastructure::{InfraError, InfraResult};

/// Security groups backed by the EC2 API.
///
/// Credentials and region come from the standard AWS config chain
/// (`AWS_*` env vars, shared config files, instance metadata).
pub struct Ec2Provider {
    runtime: Runtime,
    client: Client,
}

impl Ec2Provider {
    /// Load AWS config from the environment and build a client.
    pub fn from_env() -> InfraResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| InfraError::io("create async runtime", e))?;

        let sdk_config = runtime.block_on(aws_config::defaults(BehaviorVersion::latest()).load());
        debug!("from_env: region={:?}", sdk_config.region());
        let client = Client::new(&sdk_config);

        Ok(Self { runtime, client })
    }
}

impl SecurityGroupProvider for Ec2Provider {
    fn describe_groups(
        &self,
        filter_key: &str,
        values: &[String],
    ) -> Result<Vec<SecurityGroup>, ProviderError> {
        let filter = Filter::builder()
            .name(filter_key)
            .set_values(Some(values.to_vec()))
            .build();

        let output = self
            .runtime
            .block_on(
                self.client
                    .describe_security_groups()
                    .filters(filter)
                    .send(),
            )
            .map_err(classify)?;

        Ok(output.security_groups().iter().map(convert_group).collect())
    }

    fn authorize_ingress(&self, group_id: &str, rule: &IngressRule) -> Result<(), ProviderError> {
        self.runtime
            .block_on(
                self.client
                    .authorize_security_group_ingress()
                    .group_id(group_id)
                    .ip_permissions(to_permission(rule))
                    .send(),
            )
            .map(|_| ())
            .map_err(classify)
    }

    fn revoke_ingress(&self, group_id: &str, rule: &IngressRule) -> Result<(), ProviderError> {
        self.runtime
            .block_on(
                self.client
                    .revoke_security_group_ingress()
                    .group_id(group_id)
                    .ip_permissions(to_permission(rule))
                    .send(),
            )
            .map(|_| ())
            .map_err(classify)
    }
}

/// Map an SDK failure onto the provider error taxonomy by its error code.
fn classify<E, R>(err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + StdError + 'static,
    R: Debug,
{
    let code = err.code().map(str::to_owned);
    let detail = DisplayErrorContext(&err).to_string();
    debug!("classify: code={:?}", code);
    ProviderError::from_code(code.as_deref(), detail)
}

fn convert_group(group: &aws_sdk_ec2::types::SecurityGroup) -> SecurityGroup {
    SecurityGroup {
        id: group.group_id().unwrap_or_default().to_string(),
        name: group.group_name().unwrap_or_default().to_string(),
        permissions: group
            .ip_permissions()
            .iter()
            .map(convert_permission)
            .collect(),
    }
}

fn convert_permission(perm: &aws_sdk_ec2::types::IpPermission) -> IpPermission {
    IpPermission {
        protocol: perm.ip_protocol().unwrap_or_default().to_string(),
        from_port: perm.from_port(),
        to_port: perm.to_port(),
        cidrs: perm
            .ip_ranges()
            .iter()
            .filter_map(|range| range.cidr_ip())
            .chain(perm.ipv6_ranges().iter().filter_map(|range| range.cidr_ipv6()))
            .map(str::to_string)
            .collect(),
    }
}

/// Request permission for one rule; IPv6 sources go in `ipv6_ranges`.
fn to_permission(rule: &IngressRule) -> aws_sdk_ec2::types::IpPermission {
    let builder = aws_sdk_ec2::types::IpPermission::builder()
        .ip_protocol(&rule.protocol)
        .set_from_port(rule.from_port)
        .set_to_port(rule.to_port);

    match rule.cidr.parse::<IpNet>() {
        Ok(IpNet::V6(_)) => builder
            .ipv6_ranges(Ipv6Range::builder().cidr_ipv6(&rule.cidr).build())
            .build(),
        _ => builder
            .ip_ranges(IpRange::builder().cidr_ip(&rule.cidr).build())
            .build(),
    }
}
