//! Sift CLI - Rule automation for personal finance transactions
//!
//! Usage:
//!   sift init                              Initialize database
//!   sift run --user 1                      Run every rule in effect
//!   sift run --user 1 --transaction 42     Run rules on one transaction
//!   sift rules --user 1                    List rules
//!   sift preview --user 1 --transaction 42 Dry-run one transaction

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Run {
            user,
            rules,
            transactions,
            page_size,
            json,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            let args = commands::RunArgs {
                user_id: user,
                rule_ids: rules,
                transaction_ids: transactions,
                page_size,
            };
            commands::cmd_run(db, config, args, json).await
        }
        Commands::Rules { user, json } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_rules_list(&db, user, json)
        }
        Commands::Preview {
            user,
            transaction,
            json,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            commands::cmd_preview(db, config, user, transaction, json)
        }
    }
}
