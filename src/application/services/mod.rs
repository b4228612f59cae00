//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (SecurityGroupProvider, IpEcho, CommandRunner)
//! but are themselves concrete structs, not traits.

mod bracket;
mod groups;
mod identity;
mod report;
mod rules;

pub use bracket::{BracketOutcome, ChildStatus, CommandBracket};
pub use groups::GroupLookupService;
pub use identity::IdentityService;
pub use report::{Reporter, RuleRow};
pub use rules::{RuleChange, RuleService};
