//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_config` - Executor config from `--config` or the default locations
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use sift_core::{Database, ExecutorConfig};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Load executor config from an explicit path, or the default override location
pub fn load_config(config_path: Option<&Path>) -> Result<ExecutorConfig> {
    match config_path {
        Some(path) => ExecutorConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => ExecutorConfig::load().context("Failed to load config"),
    }
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. List rules: sift rules --user <id>");
    println!("  2. Apply them: sift run --user <id>");

    Ok(())
}
