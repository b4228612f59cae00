//! Rule listing

use tabled::builder::Builder;
use tabled::settings::{Padding, Style};

use crate::domain::SecurityGroup;

/// One listed rule: a single source CIDR of one permission of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRow {
    pub group: String,
    pub protocol: String,
    pub cidr: String,
    /// Empty when the permission carries no port (all traffic)
    pub from_port: String,
}

/// Renders the current ingress rules of groups.
pub struct Reporter;

impl Reporter {
    /// Flatten groups into rows, keeping provider order.
    pub fn rows(groups: &[SecurityGroup]) -> Vec<RuleRow> {
        groups
            .iter()
            .flat_map(|group| {
                group.ingress_rules().map(move |rule| RuleRow {
                    group: group.name.clone(),
                    protocol: rule.protocol,
                    cidr: rule.cidr,
                    from_port: rule.from_port.map(|p| p.to_string()).unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Column-aligned table without a header; empty when there are no rules.
    pub fn render(groups: &[SecurityGroup]) -> String {
        let rows = Self::rows(groups);
        if rows.is_empty() {
            return String::new();
        }

        let mut builder = Builder::default();
        for row in rows {
            builder.push_record([row.group, row.protocol, row.cidr, row.from_port]);
        }

        builder
            .build()
            .with(Style::empty())
            .with(Padding::new(0, 1, 0, 0))
            .to_string()
    }
}
