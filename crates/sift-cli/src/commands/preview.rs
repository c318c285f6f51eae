//! Preview command - dry-run rules against one transaction

use std::sync::Arc;

use anyhow::{Context, Result};
use sift_core::{Database, ExecutorConfig, RuleExecutor};

pub fn cmd_preview(
    db: Database,
    config: ExecutorConfig,
    user_id: i64,
    transaction_id: i64,
    json: bool,
) -> Result<()> {
    let executor = RuleExecutor::new(Arc::new(db), config);
    let changeset = executor
        .preview_transaction(user_id, transaction_id)
        .with_context(|| format!("Failed to preview transaction {}", transaction_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&changeset)?);
        return Ok(());
    }

    let Some(changeset) = changeset else {
        println!("No rule would change transaction {}.", transaction_id);
        return Ok(());
    };

    println!();
    println!("🔎 Transaction {} (dry run)", transaction_id);
    println!("   ─────────────────────────────");
    if let Some(name) = changeset.name_update() {
        println!("   Name:        {}", name);
    }
    if let Some(description) = changeset.desc_update() {
        println!("   Description: {}", description);
    }
    if !changeset.category_adds().is_empty() {
        let ids: Vec<String> = changeset
            .category_adds()
            .iter()
            .map(|id| id.to_string())
            .collect();
        println!("   Categories:  + {}", ids.join(", "));
    }
    if let Some(transfer) = changeset.transfer() {
        println!(
            "   Transfer:    {:.2} to account {}",
            transfer.amount, transfer.account_id
        );
    }

    let rules: Vec<String> = changeset
        .applied_rule_ids()
        .iter()
        .map(|id| format!("#{}", id))
        .collect();
    println!("   Rules:       {}", rules.join(", "));

    Ok(())
}
