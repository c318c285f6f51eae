//! Changeset - the staged, unapplied result of evaluating rules against one transaction

use serde::{Deserialize, Serialize};

use crate::models::BaseFieldUpdate;

/// A transfer mirror staged for a counter-account
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferInfo {
    /// Counter-account receiving the mirrored amount
    pub account_id: i64,
    /// Sign-negated amount of the source transaction
    pub amount: f64,
}

/// Kind of transaction field a rule run touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Name,
    Description,
    Category,
    Transfer,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Category => "category",
            Self::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accumulated mutations for one transaction in one evaluation pass
///
/// Built by the [`RuleEngine`](super::RuleEngine) and handed to the executor
/// read-only. Singular fields keep the first value staged; later stagings are
/// refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    transaction_id: i64,
    name_update: Option<String>,
    desc_update: Option<String>,
    category_adds: Vec<i64>,
    transfer: Option<TransferInfo>,
    applied_rule_ids: Vec<i64>,
}

impl Changeset {
    pub(crate) fn new(transaction_id: i64) -> Self {
        Self {
            transaction_id,
            name_update: None,
            desc_update: None,
            category_adds: Vec::new(),
            transfer: None,
            applied_rule_ids: Vec::new(),
        }
    }

    pub fn transaction_id(&self) -> i64 {
        self.transaction_id
    }

    pub fn name_update(&self) -> Option<&str> {
        self.name_update.as_deref()
    }

    pub fn desc_update(&self) -> Option<&str> {
        self.desc_update.as_deref()
    }

    pub fn category_adds(&self) -> &[i64] {
        &self.category_adds
    }

    pub fn transfer(&self) -> Option<&TransferInfo> {
        self.transfer.as_ref()
    }

    pub fn applied_rule_ids(&self) -> &[i64] {
        &self.applied_rule_ids
    }

    /// True when no rule staged anything
    pub fn is_empty(&self) -> bool {
        self.name_update.is_none()
            && self.desc_update.is_none()
            && self.category_adds.is_empty()
            && self.transfer.is_none()
    }

    /// Field kinds this changeset would write, in a stable order
    pub fn staged_kinds(&self) -> Vec<FieldKind> {
        let mut kinds = Vec::new();
        if self.name_update.is_some() {
            kinds.push(FieldKind::Name);
        }
        if self.desc_update.is_some() {
            kinds.push(FieldKind::Description);
        }
        if !self.category_adds.is_empty() {
            kinds.push(FieldKind::Category);
        }
        if self.transfer.is_some() {
            kinds.push(FieldKind::Transfer);
        }
        kinds
    }

    /// The name/description part as a partial update
    pub fn base_update(&self) -> BaseFieldUpdate {
        BaseFieldUpdate {
            name: self.name_update.clone(),
            description: self.desc_update.clone(),
        }
    }

    pub(crate) fn stage_name(&mut self, value: &str) -> bool {
        if self.name_update.is_some() {
            return false;
        }
        self.name_update = Some(value.to_string());
        true
    }

    pub(crate) fn stage_description(&mut self, value: &str) -> bool {
        if self.desc_update.is_some() {
            return false;
        }
        self.desc_update = Some(value.to_string());
        true
    }

    pub(crate) fn stage_category(&mut self, category_id: i64) -> bool {
        if self.category_adds.contains(&category_id) {
            return false;
        }
        self.category_adds.push(category_id);
        true
    }

    pub(crate) fn has_transfer(&self) -> bool {
        self.transfer.is_some()
    }

    pub(crate) fn stage_transfer(&mut self, transfer: TransferInfo) -> bool {
        if self.transfer.is_some() {
            return false;
        }
        self.transfer = Some(transfer);
        true
    }

    pub(crate) fn record_rule(&mut self, rule_id: i64) {
        if !self.applied_rule_ids.contains(&rule_id) {
            self.applied_rule_ids.push(rule_id);
        }
    }
}
