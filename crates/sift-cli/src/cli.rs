//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sift - Rule automation for your transactions
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Apply user-defined rules to personal finance transactions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "sift.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SIFT_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Executor config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Run rules over a user's transactions and apply the results
    Run {
        /// User whose rules and transactions are processed
        #[arg(short, long)]
        user: i64,

        /// Only run these rules (repeatable; default: every rule in effect)
        #[arg(long = "rule")]
        rules: Vec<i64>,

        /// Only process these transactions (repeatable; default: full scan)
        #[arg(long = "transaction")]
        transactions: Vec<i64>,

        /// Page size for full scans
        #[arg(long)]
        page_size: Option<i64>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List a user's rules with their conditions and actions
    Rules {
        #[arg(short, long)]
        user: i64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what the rules would change on one transaction, without writing
    Preview {
        #[arg(short, long)]
        user: i64,

        /// Transaction to evaluate
        #[arg(short, long)]
        transaction: i64,

        /// Print the changeset as JSON
        #[arg(long)]
        json: bool,
    },
}
