//! Domain entities: core data structures

use std::fmt;

use ipnet::IpNet;

use crate::domain::DomainError;

/// The single ingress rule a run opens or closes.
///
/// Built once per invocation and shared by reference across every target group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    protocol: String,
    port: u16,
    cidr: String,
}

impl RuleSpec {
    /// Validate and build a rule.
    ///
    /// The CIDR must parse as an IPv4 or IPv6 network but is kept verbatim,
    /// so `0.0.0.0/0` or a team subnet reaches the provider exactly as typed.
    pub fn new(
        protocol: impl Into<String>,
        port: u16,
        cidr: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let protocol = protocol.into();
        let cidr = cidr.into();

        if protocol.trim().is_empty() {
            return Err(DomainError::InvalidProtocol(protocol));
        }
        if cidr.parse::<IpNet>().is_err() {
            return Err(DomainError::InvalidCidr(cidr));
        }

        Ok(Self {
            protocol,
            port,
            cidr,
        })
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn cidr(&self) -> &str {
        &self.cidr
    }

    /// The provider tuple for this rule: a single-port range.
    pub fn to_ingress(&self) -> IngressRule {
        IngressRule {
            protocol: self.protocol.clone(),
            from_port: Some(i32::from(self.port)),
            to_port: Some(i32::from(self.port)),
            cidr: self.cidr.clone(),
        }
    }
}

/// Exact tuple sent with an authorize or revoke request.
///
/// Ports are optional because rules read back from a group may cover all
/// traffic (protocol `-1`), in which case the provider reports no ports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IngressRule {
    pub protocol: String,
    pub from_port: Option<i32>,
    pub to_port: Option<i32>,
    pub cidr: String,
}

impl fmt::Display for IngressRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.from_port, self.to_port) {
            (Some(from), Some(to)) if from == to => {
                write!(f, "{}/{} from {}", self.protocol, from, self.cidr)
            }
            (Some(from), Some(to)) => {
                write!(f, "{}/{}-{} from {}", self.protocol, from, to, self.cidr)
            }
            _ => write!(f, "{} from {}", self.protocol, self.cidr),
        }
    }
}

/// One ingress permission as stored on a group: a port range and its sources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IpPermission {
    pub protocol: String,
    pub from_port: Option<i32>,
    pub to_port: Option<i32>,
    pub cidrs: Vec<String>,
}

/// A remote security group as returned by the describe call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    /// Existing ingress permissions, in provider order
    pub permissions: Vec<IpPermission>,
}

impl SecurityGroup {
    /// Flatten permissions into one rule per (permission, cidr) pair.
    pub fn ingress_rules(&self) -> impl Iterator<Item = IngressRule> + '_ {
        self.permissions.iter().flat_map(|perm| {
            perm.cidrs.iter().map(move |cidr| IngressRule {
                protocol: perm.protocol.clone(),
                from_port: perm.from_port,
                to_port: perm.to_port,
                cidr: cidr.clone(),
            })
        })
    }
}

impl fmt::Display for SecurityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Groups resolved for one run, in provider order.
pub type TargetSet = Vec<SecurityGroup>;

#[cfg(test)]
mod tests {
    use super::*;

    fn group_with(perms: Vec<IpPermission>) -> SecurityGroup {
        SecurityGroup {
            id: "sg-1".into(),
            name: "web-sg".into(),
            permissions: perms,
        }
    }

    #[test]
    fn given_valid_inputs_when_building_rule_then_keeps_cidr_verbatim() {
        let rule = RuleSpec::new("tcp", 22, "203.0.113.5/32").unwrap();
        assert_eq!(rule.protocol(), "tcp");
        assert_eq!(rule.port(), 22);
        assert_eq!(rule.cidr(), "203.0.113.5/32");
    }

    #[test]
    fn given_bare_address_when_building_rule_then_rejects_cidr() {
        let err = RuleSpec::new("tcp", 22, "203.0.113.5").unwrap_err();
        assert!(matches!(err, DomainError::InvalidCidr(c) if c == "203.0.113.5"));
    }

    #[test]
    fn given_ipv6_network_when_building_rule_then_accepts_it() {
        let rule = RuleSpec::new("tcp", 22, "2001:db8::/64").unwrap();
        assert_eq!(rule.to_ingress().cidr, "2001:db8::/64");
    }

    #[test]
    fn given_blank_protocol_when_building_rule_then_rejects_protocol() {
        let err = RuleSpec::new("  ", 22, "10.0.0.0/8").unwrap_err();
        assert!(matches!(err, DomainError::InvalidProtocol(_)));
    }

    #[test]
    fn given_rule_spec_when_converting_then_uses_single_port_range() {
        let ingress = RuleSpec::new("udp", 1194, "0.0.0.0/0")
            .unwrap()
            .to_ingress();
        assert_eq!(
            ingress,
            IngressRule {
                protocol: "udp".into(),
                from_port: Some(1194),
                to_port: Some(1194),
                cidr: "0.0.0.0/0".into(),
            }
        );
        assert_eq!(ingress.to_string(), "udp/1194 from 0.0.0.0/0");
    }

    #[test]
    fn given_permissions_with_many_cidrs_when_flattening_then_yields_one_rule_per_cidr() {
        let group = group_with(vec![
            IpPermission {
                protocol: "tcp".into(),
                from_port: Some(22),
                to_port: Some(22),
                cidrs: vec!["10.0.0.1/32".into(), "10.0.0.2/32".into()],
            },
            IpPermission {
                protocol: "-1".into(),
                from_port: None,
                to_port: None,
                cidrs: vec!["192.168.0.0/16".into()],
            },
        ]);

        let rules: Vec<_> = group.ingress_rules().collect();

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[1].cidr, "10.0.0.2/32");
        assert_eq!(rules[2].from_port, None);
        assert_eq!(rules[2].to_string(), "-1 from 192.168.0.0/16");
    }

    #[test]
    fn given_permission_without_cidrs_when_flattening_then_yields_nothing() {
        let group = group_with(vec![IpPermission {
            protocol: "tcp".into(),
            from_port: Some(443),
            to_port: Some(443),
            cidrs: vec![],
        }]);
        assert_eq!(group.ingress_rules().count(), 0);
    }
}
