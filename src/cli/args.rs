//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};

/// Open an AWS security group ingress rule for your public IP while a command runs
#[derive(Parser, Debug)]
#[command(name = "let-me-in")]
#[command(author, version, about, long_about = None)]
#[command(disable_version_flag = true)]
#[command(override_usage = "let-me-in [OPTIONS] <GROUPS>... [-- <COMMAND>...]")]
pub struct Cli {
    /// Print version and exit
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,

    /// CIDR block to allow (default: current public IP as /32)
    #[arg(short = 'c', long)]
    pub cidr: Option<String>,

    /// Protocol to allow [default: tcp]
    #[arg(short = 'P', long)]
    pub protocol: Option<String>,

    /// Port to allow [default: 22]
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Revoke the rule instead of adding it
    #[arg(short = 'r', long, conflicts_with_all = ["list", "clean"])]
    pub revoke: bool,

    /// List current ingress rules for the groups
    #[arg(short = 'l', long, conflicts_with_all = ["revoke", "clean"])]
    pub list: bool,

    /// Revoke every ingress rule on the groups
    #[arg(short = 'x', long, conflicts_with_all = ["revoke", "list"])]
    pub clean: bool,

    /// Filter key used to match groups: group-name, group-id, tag:<Key>, ... [default: group-name]
    #[arg(short = 'f', long)]
    pub filter: Option<String>,

    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count)]
    pub debug: u8,

    /// Config file (default: $XDG_CONFIG_HOME/let-me-in/config.toml)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Print the effective settings as TOML and exit
    #[arg(long)]
    pub show_config: bool,

    /// Generate shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<clap_complete::Shell>,

    /// Security group identifiers
    #[arg(required_unless_present_any = ["completions", "show_config"])]
    pub groups: Vec<String>,

    /// Command to run while the rule is open
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}
