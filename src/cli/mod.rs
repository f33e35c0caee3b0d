//! CLI module - Command-line interface for Lethe
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

pub use commands::{cmd_anonymize, cmd_audit, cmd_search, cmd_users};

/// Lethe - Privacy operations service
/// Admin backend for GDPR data-deletion requests
#[derive(Parser)]
#[command(name = "lethe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    #[command(alias = "-d", alias = "--daemon", alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Look up a member account by email
    #[command(alias = "s")]
    Search {
        /// Email address, exact match
        email: String,
    },

    /// Irreversibly anonymize a member account (GDPR Art. 17)
    Anonymize {
        /// User ID to anonymize
        user_id: i32,
        /// Skip the interactive confirmation
        #[arg(long)]
        yes: bool,
    },

    /// List accounts
    #[command(alias = "ls")]
    Users,

    /// Show recent privacy audit events
    Audit {
        /// Number of entries to show
        #[arg(default_value = "20")]
        limit: u64,
    },
}
