//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init and shared utilities (open_db, load_config)
//! - `run` - Execute rules and print the run summary
//! - `rules` - Rule listing
//! - `preview` - Dry-run of one transaction

pub mod core;
pub mod preview;
pub mod rules;
pub mod run;

// Re-export command functions for main.rs
pub use self::core::*;
pub use preview::*;
pub use rules::*;
pub use run::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
