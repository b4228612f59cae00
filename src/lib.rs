//! let-me-in: temporarily allow your public IP through AWS security groups
//!
//! Resolves groups by a filter key, adds a single ingress rule for the
//! caller's address, optionally runs a command while it is open, and removes
//! the rule again.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
