//! Run command - apply rules to a user's transactions
//!
//! The run itself is blocking store work, so it goes to the blocking pool
//! while Ctrl-C is watched; an interrupt stops the scan at the next page.

use std::sync::Arc;

use anyhow::{Context, Result};
use sift_core::{
    CancelFlag, Database, ExecuteRequest, ExecutionSummary, ExecutorConfig, RuleExecutor,
};
use tracing::warn;

/// What `sift run` was asked to do
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub user_id: i64,
    /// Empty means every rule in effect
    pub rule_ids: Vec<i64>,
    /// Empty means a full scan
    pub transaction_ids: Vec<i64>,
    pub page_size: Option<i64>,
}

impl RunArgs {
    pub fn to_request(&self, cancel: CancelFlag) -> ExecuteRequest {
        ExecuteRequest {
            rule_ids: (!self.rule_ids.is_empty()).then(|| self.rule_ids.clone()),
            transaction_ids: (!self.transaction_ids.is_empty())
                .then(|| self.transaction_ids.clone()),
            page_size: self.page_size,
            cancel: Some(cancel),
        }
    }
}

pub async fn cmd_run(db: Database, config: ExecutorConfig, args: RunArgs, json: bool) -> Result<()> {
    let executor = RuleExecutor::new(Arc::new(db), config);
    let cancel = CancelFlag::new();
    let request = args.to_request(cancel.clone());
    let user_id = args.user_id;

    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current page");
            cancel.cancel();
        }
    });

    let result = tokio::task::spawn_blocking(move || executor.execute_rules(user_id, &request))
        .await
        .context("Rule run task failed")?;
    watcher.abort();

    let summary = result.context("Rule run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

pub fn print_summary(summary: &ExecutionSummary) {
    println!();
    println!("📊 Rule Run");
    println!("   ─────────────────────────────");
    println!("   Rules evaluated:        {}", summary.total_rules);
    println!("   Transactions processed: {}", summary.processed_txns);
    println!("   Transactions modified:  {}", summary.modified.len());

    if summary.cancelled {
        println!();
        println!("⚠️  Run was cancelled before finishing; results are partial.");
    }

    if summary.total_rules == 0 {
        println!();
        println!("No rules in effect. Nothing to do.");
        return;
    }

    if summary.modified.is_empty() {
        println!();
        println!("✅ Nothing to change.");
        return;
    }

    println!();
    println!("   {:>8} │ {:20} │ {}", "Txn", "Rules", "Fields");
    println!("   ─────────┼──────────────────────┼─────────────────────────");
    for result in &summary.modified {
        let rules: Vec<String> = result
            .applied_rule_ids
            .iter()
            .map(|id| format!("#{}", id))
            .collect();
        let fields: Vec<&str> = result
            .updated_field_kinds
            .iter()
            .map(|kind| kind.as_str())
            .collect();
        println!(
            "   {:>8} │ {:20} │ {}",
            result.transaction_id,
            super::truncate(&rules.join(", "), 20),
            fields.join(", ")
        );
    }
}
