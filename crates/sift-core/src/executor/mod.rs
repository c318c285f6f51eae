//! Rule execution orchestrator
//!
//! [`RuleExecutor`] resolves a user's rule working-set, builds one
//! [`RuleEngine`] for the run, streams the user's transactions through it and
//! writes every resulting [`Changeset`] back to the store.
//!
//! - Setup failures (rules, categories, accounts) abort the run before any write.
//! - A failed page read stops scanning; the partial summary is still returned.
//! - A failed apply only drops that transaction.
//! - Ids the user does not own are logged and skipped.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::ExecutorConfig;
use crate::error::{Error, Result};
use crate::models::{BaseFieldUpdate, RuleWithDetails, Transaction, TransactionOrder};
use crate::rules::{Changeset, FieldKind, RuleEngine};
use crate::store::{LedgerStore, TransactionChanges};

mod background;
mod locks;

pub use locks::ApplyLocks;

/// Shared flag a caller flips to stop a run between pages
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a run should cover
///
/// `None` for rules means every rule already in effect; `None` for
/// transactions means a full paginated scan.
#[derive(Debug, Clone, Default)]
pub struct ExecuteRequest {
    pub rule_ids: Option<Vec<i64>>,
    pub transaction_ids: Option<Vec<i64>>,
    /// Page size for full scans, clamped to the configured bounds
    pub page_size: Option<i64>,
    pub cancel: Option<CancelFlag>,
}

impl ExecuteRequest {
    /// Every effective rule over every transaction
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_rules(mut self, rule_ids: Vec<i64>) -> Self {
        self.rule_ids = Some(rule_ids);
        self
    }

    pub fn with_transactions(mut self, transaction_ids: Vec<i64>) -> Self {
        self.transaction_ids = Some(transaction_ids);
        self
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

/// One transaction a run actually changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedResult {
    pub transaction_id: i64,
    pub applied_rule_ids: Vec<i64>,
    pub updated_field_kinds: Vec<FieldKind>,
}

/// A transaction a run deliberately left alone (reserved, never populated)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedResult {
    pub transaction_id: i64,
    pub reason: String,
}

/// Outcome of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub modified: Vec<ModifiedResult>,
    pub skipped: Vec<SkippedResult>,
    /// Size of the rule working-set
    pub total_rules: usize,
    /// Every transaction handed to the engine, changed or not
    pub processed_txns: usize,
    pub cancelled: bool,
}

/// Drives rule runs against a [`LedgerStore`]
pub struct RuleExecutor<S> {
    store: Arc<S>,
    config: ExecutorConfig,
    locks: Arc<ApplyLocks>,
}

impl<S> Clone for RuleExecutor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<S: LedgerStore> RuleExecutor<S> {
    pub fn new(store: Arc<S>, config: ExecutorConfig) -> Self {
        Self {
            store,
            config,
            locks: Arc::new(ApplyLocks::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run rules over the user's transactions and apply what they stage
    pub fn execute_rules(&self, user_id: i64, request: &ExecuteRequest) -> Result<ExecutionSummary> {
        let rules = self.resolve_rules(user_id, request.rule_ids.as_deref(), Utc::now())?;
        if rules.is_empty() {
            info!("No eligible rules for user {}, nothing to do", user_id);
            return Ok(ExecutionSummary::default());
        }

        let engine = self.build_engine(user_id, rules)?;
        let mut summary = ExecutionSummary {
            total_rules: engine.rule_count(),
            ..Default::default()
        };

        match &request.transaction_ids {
            Some(ids) => self.run_explicit(user_id, ids, &engine, request, &mut summary),
            None => self.run_paged(user_id, &engine, request, &mut summary),
        }

        info!(
            "Rule run for user {}: {} rules, {} transactions processed, {} modified{}",
            user_id,
            summary.total_rules,
            summary.processed_txns,
            summary.modified.len(),
            if summary.cancelled { " (cancelled)" } else { "" }
        );

        Ok(summary)
    }

    /// Evaluate every effective rule against one transaction without writing
    ///
    /// Returns `Ok(None)` when no rule stages anything.
    pub fn preview_transaction(&self, user_id: i64, transaction_id: i64) -> Result<Option<Changeset>> {
        let transaction = self
            .store
            .get_transaction(transaction_id, user_id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", transaction_id)))?;

        let rules = self.resolve_rules(user_id, None, Utc::now())?;
        if rules.is_empty() {
            return Ok(None);
        }

        let engine = self.build_engine(user_id, rules)?;
        Ok(engine.process_transaction(&transaction))
    }

    /// The hydrated rule working-set, in evaluation order
    ///
    /// Explicitly requested rules are taken as-is; otherwise only rules whose
    /// `effective_from` is not in the future.
    fn resolve_rules(
        &self,
        user_id: i64,
        rule_ids: Option<&[i64]>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RuleWithDetails>> {
        let rules = match rule_ids {
            Some(ids) => {
                let mut rules = Vec::with_capacity(ids.len());
                for id in dedup_ids(ids) {
                    match self.store.get_rule(id, user_id)? {
                        Some(rule) => rules.push(rule),
                        None => warn!("Rule {} not found for user {}, skipping", id, user_id),
                    }
                }
                rules
            }
            None => self
                .store
                .list_rules(user_id)?
                .into_iter()
                .filter(|rule| rule.effective_from <= now)
                .collect(),
        };

        rules
            .into_iter()
            .map(|rule| -> Result<RuleWithDetails> {
                let conditions = self.store.list_conditions(rule.id)?;
                let actions = self.store.list_actions(rule.id)?;
                Ok(RuleWithDetails {
                    rule,
                    conditions,
                    actions,
                })
            })
            .collect()
    }

    fn build_engine(&self, user_id: i64, rules: Vec<RuleWithDetails>) -> Result<RuleEngine> {
        let categories = self.store.list_categories(user_id)?;
        let accounts = if rules.iter().any(RuleWithDetails::references_transfers) {
            self.store.list_accounts(user_id)?
        } else {
            Vec::new()
        };

        debug!(
            "Engine snapshot for user {}: {} rules, {} categories, {} accounts",
            user_id,
            rules.len(),
            categories.len(),
            accounts.len()
        );

        Ok(RuleEngine::new(categories, accounts, rules))
    }

    fn run_explicit(
        &self,
        user_id: i64,
        transaction_ids: &[i64],
        engine: &RuleEngine,
        request: &ExecuteRequest,
        summary: &mut ExecutionSummary,
    ) {
        if request.is_cancelled() {
            summary.cancelled = true;
            return;
        }

        for id in dedup_ids(transaction_ids) {
            let transaction = match self.store.get_transaction(id, user_id) {
                Ok(Some(tx)) => tx,
                Ok(None) => {
                    warn!("Transaction {} not found for user {}, skipping", id, user_id);
                    continue;
                }
                Err(e) => {
                    error!("Failed to load transaction {}: {}", id, e);
                    break;
                }
            };

            self.process(user_id, engine, &transaction, summary);
        }
    }

    fn run_paged(
        &self,
        user_id: i64,
        engine: &RuleEngine,
        request: &ExecuteRequest,
        summary: &mut ExecutionSummary,
    ) {
        let page_size = self.config.page_size(request.page_size);
        let mut page = 0;

        loop {
            if request.is_cancelled() {
                info!("Rule run for user {} cancelled before page {}", user_id, page);
                summary.cancelled = true;
                return;
            }

            let batch = match self.store.list_transactions_page(
                user_id,
                page,
                page_size,
                TransactionOrder::DateDesc,
            ) {
                Ok(batch) => batch,
                Err(e) => {
                    error!("Failed to load page {} for user {}: {}", page, user_id, e);
                    return;
                }
            };

            for transaction in &batch {
                self.process(user_id, engine, transaction, summary);
            }

            if batch.len() < page_size {
                return;
            }
            page += 1;
        }
    }

    fn process(
        &self,
        user_id: i64,
        engine: &RuleEngine,
        transaction: &Transaction,
        summary: &mut ExecutionSummary,
    ) {
        summary.processed_txns += 1;

        let Some(changeset) = engine.process_transaction(transaction) else {
            return;
        };

        match self.apply(user_id, &changeset) {
            Ok(Some(result)) => summary.modified.push(result),
            Ok(None) => debug!(
                "Changeset for transaction {} already reflected, nothing written",
                changeset.transaction_id()
            ),
            Err(e) => error!(
                "Failed to apply rules to transaction {}: {}",
                changeset.transaction_id(),
                e
            ),
        }
    }

    fn apply(&self, user_id: i64, changeset: &Changeset) -> Result<Option<ModifiedResult>> {
        self.locks
            .with_lock(changeset.transaction_id(), || self.apply_locked(user_id, changeset))
    }

    /// Write the part of `changeset` that differs from the live row
    fn apply_locked(&self, user_id: i64, changeset: &Changeset) -> Result<Option<ModifiedResult>> {
        let id = changeset.transaction_id();
        let live = self
            .store
            .get_transaction(id, user_id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;

        let mut kinds = Vec::new();

        let update = BaseFieldUpdate {
            name: changeset
                .name_update()
                .filter(|name| *name != live.name)
                .map(str::to_string),
            description: changeset
                .desc_update()
                .filter(|desc| live.description.as_deref() != Some(*desc))
                .map(str::to_string),
        };
        if update.name.is_some() {
            kinds.push(FieldKind::Name);
        }
        if update.description.is_some() {
            kinds.push(FieldKind::Description);
        }

        let new_categories: Vec<i64> = changeset
            .category_adds()
            .iter()
            .copied()
            .filter(|c| !live.category_ids.contains(c))
            .collect();
        let category_ids = if new_categories.is_empty() {
            None
        } else {
            let mut category_ids = live.category_ids.clone();
            category_ids.extend(new_categories);
            kinds.push(FieldKind::Category);
            Some(category_ids)
        };

        let transfer = match changeset.transfer() {
            Some(staged) if self.config.link_transfers => {
                let linked = self.store.get_transfer_link(id, user_id)?;
                if linked.as_ref() == Some(staged) {
                    None
                } else {
                    kinds.push(FieldKind::Transfer);
                    Some(*staged)
                }
            }
            _ => None,
        };

        if kinds.is_empty() {
            return Ok(None);
        }

        let changes = TransactionChanges {
            base: update,
            category_ids,
            transfer,
        };
        self.store.apply_changes(id, user_id, &changes)?;

        Ok(Some(ModifiedResult {
            transaction_id: id,
            applied_rule_ids: changeset.applied_rule_ids().to_vec(),
            updated_field_kinds: kinds,
        }))
    }
}

/// Drop repeated ids, keeping first occurrence order
fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
