//! Store traits the executor reads from and writes to
//!
//! Every lookup is scoped by the acting user. A lookup for an id the user
//! does not own returns `Ok(None)`, never an error; errors are reserved for
//! storage failures.
//!
//! [`Database`](crate::db::Database) implements all four traits.

use crate::error::Result;
use crate::models::{
    Account, BaseFieldUpdate, Category, Rule, RuleAction, RuleCondition, Transaction,
    TransactionOrder,
};
use crate::rules::TransferInfo;

/// Read access to rules and their conditions/actions
pub trait RuleStore: Send + Sync {
    /// Fetch one rule owned by `user_id`
    fn get_rule(&self, id: i64, user_id: i64) -> Result<Option<Rule>>;

    /// All rules owned by `user_id`, in evaluation order
    fn list_rules(&self, user_id: i64) -> Result<Vec<Rule>>;

    /// Actions of a rule, in application order
    fn list_actions(&self, rule_id: i64) -> Result<Vec<RuleAction>>;

    fn list_conditions(&self, rule_id: i64) -> Result<Vec<RuleCondition>>;
}

pub trait CategoryStore: Send + Sync {
    fn list_categories(&self, user_id: i64) -> Result<Vec<Category>>;
}

pub trait AccountStore: Send + Sync {
    fn get_account(&self, id: i64, user_id: i64) -> Result<Option<Account>>;

    fn list_accounts(&self, user_id: i64) -> Result<Vec<Account>>;
}

/// Read/write access to transactions
pub trait TransactionStore: Send + Sync {
    fn get_transaction(&self, id: i64, user_id: i64) -> Result<Option<Transaction>>;

    /// One page of the user's transactions; `page` is zero-based
    fn list_transactions_page(
        &self,
        user_id: i64,
        page: usize,
        page_size: usize,
        order: TransactionOrder,
    ) -> Result<Vec<Transaction>>;

    /// Partial update of name/description; `None` fields are left untouched
    fn update_base_fields(&self, id: i64, user_id: i64, update: &BaseFieldUpdate) -> Result<()>;

    /// Replace the transaction's category set with `category_ids`
    fn update_category_ids(&self, id: i64, user_id: i64, category_ids: &[i64]) -> Result<()>;

    /// Record (or replace) the transfer mirror of a transaction
    fn link_transfer(&self, id: i64, user_id: i64, transfer: &TransferInfo) -> Result<()>;

    /// The transfer mirror currently recorded for a transaction
    fn get_transfer_link(&self, id: i64, user_id: i64) -> Result<Option<TransferInfo>>;

    /// Write every part of `changes` in one unit; on error nothing is written
    fn apply_changes(&self, id: i64, user_id: i64, changes: &TransactionChanges) -> Result<()>;
}

/// Everything one apply writes to a single transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionChanges {
    pub base: BaseFieldUpdate,
    /// Full replacement category set; `None` leaves categories alone
    pub category_ids: Option<Vec<i64>>,
    pub transfer: Option<TransferInfo>,
}

impl TransactionChanges {
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.category_ids.is_none() && self.transfer.is_none()
    }
}

/// Everything the executor needs from storage
pub trait LedgerStore: RuleStore + CategoryStore + AccountStore + TransactionStore {}

impl<T> LedgerStore for T where T: RuleStore + CategoryStore + AccountStore + TransactionStore {}
