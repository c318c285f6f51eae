//! Test utilities for sift-core
//!
//! Fixture builders for rules, conditions, actions and transactions, plus a
//! helper that seeds a [`Database`] with a small ledger for end-to-end tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::db::Database;
use crate::error::Result;
use crate::models::{
    Account, ActionField, Category, ConditionField, ConditionLogic, ConditionOperator,
    NewTransaction, Rule, RuleAction, RuleCondition, RuleWithDetails, Transaction,
};

/// Build a UTC timestamp at midnight of the given day
pub fn utc_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn category(id: i64, user_id: i64, name: &str) -> Category {
    Category {
        id,
        user_id,
        name: name.to_string(),
        created_at: utc_date(2024, 1, 1),
    }
}

pub fn account(id: i64, user_id: i64, name: &str) -> Account {
    Account {
        id,
        user_id,
        name: name.to_string(),
        created_at: utc_date(2024, 1, 1),
    }
}

pub fn condition(field: ConditionField, operator: ConditionOperator, value: &str) -> RuleCondition {
    RuleCondition {
        id: 0,
        rule_id: 0,
        field,
        operator,
        value: value.to_string(),
    }
}

pub fn action(field: ActionField, value: &str) -> RuleAction {
    RuleAction {
        id: 0,
        rule_id: 0,
        field,
        value: value.to_string(),
    }
}

/// Builder for hydrated rules used by engine and executor tests
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    rule: RuleWithDetails,
}

impl RuleBuilder {
    pub fn new(id: i64, user_id: i64) -> Self {
        Self {
            rule: RuleWithDetails {
                rule: Rule {
                    id,
                    user_id,
                    name: format!("rule {}", id),
                    description: None,
                    effective_from: utc_date(2000, 1, 1),
                    condition_logic: ConditionLogic::And,
                    created_at: utc_date(2000, 1, 1),
                },
                conditions: Vec::new(),
                actions: Vec::new(),
            },
        }
    }

    pub fn logic(mut self, logic: ConditionLogic) -> Self {
        self.rule.rule.condition_logic = logic;
        self
    }

    pub fn effective_from(mut self, at: DateTime<Utc>) -> Self {
        self.rule.rule.effective_from = at;
        self
    }

    pub fn when(mut self, field: ConditionField, operator: ConditionOperator, value: &str) -> Self {
        let mut cond = condition(field, operator, value);
        cond.rule_id = self.rule.rule.id;
        cond.id = self.rule.conditions.len() as i64 + 1;
        self.rule.conditions.push(cond);
        self
    }

    pub fn then(mut self, field: ActionField, value: &str) -> Self {
        let mut act = action(field, value);
        act.rule_id = self.rule.rule.id;
        act.id = self.rule.actions.len() as i64 + 1;
        self.rule.actions.push(act);
        self
    }

    pub fn build(self) -> RuleWithDetails {
        self.rule
    }
}

/// Builder for in-memory transactions
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    tx: Transaction,
}

impl TransactionBuilder {
    pub fn new(id: i64, user_id: i64) -> Self {
        Self {
            tx: Transaction {
                id,
                user_id,
                account_id: 1,
                name: String::new(),
                description: None,
                amount: 0.0,
                date: utc_date(2024, 6, 1),
                category_ids: Vec::new(),
                created_at: utc_date(2024, 6, 1),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.tx.name = name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.tx.description = Some(description.to_string());
        self
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.tx.amount = amount;
        self
    }

    pub fn account(mut self, account_id: i64) -> Self {
        self.tx.account_id = account_id;
        self
    }

    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.tx.date = date;
        self
    }

    pub fn categories(mut self, category_ids: &[i64]) -> Self {
        self.tx.category_ids = category_ids.to_vec();
        self
    }

    pub fn build(self) -> Transaction {
        self.tx
    }
}

/// Ids of the rows created by [`seed_ledger`]
#[derive(Debug, Clone)]
pub struct SeededLedger {
    pub user_id: i64,
    pub other_user_id: i64,
    pub checking_id: i64,
    pub savings_id: i64,
    pub other_account_id: i64,
    pub housing_id: i64,
    pub streaming_id: i64,
    pub other_category_id: i64,
    pub transaction_ids: Vec<i64>,
}

/// Seed two users with accounts, categories and a handful of transactions
///
/// User 1 owns checking/savings, "Housing" and "Streaming", and five
/// transactions on checking. User 2 owns one account and one category.
pub fn seed_ledger(db: &Database) -> Result<SeededLedger> {
    let user_id = 1;
    let other_user_id = 2;

    let checking_id = db.create_account(user_id, "Checking")?;
    let savings_id = db.create_account(user_id, "Savings")?;
    let other_account_id = db.create_account(other_user_id, "Other Checking")?;

    let housing_id = db.create_category(user_id, "Housing")?;
    let streaming_id = db.create_category(user_id, "Streaming")?;
    let other_category_id = db.create_category(other_user_id, "Other Housing")?;

    let rows = [
        ("January Rent", Some("apartment"), -1500.0, utc_date(2024, 1, 1)),
        ("Netflix", None, -15.49, utc_date(2024, 1, 15)),
        ("Grocery Outlet", Some("weekly shop"), -82.10, utc_date(2024, 2, 3)),
        ("Payroll", Some("salary"), 4200.0, utc_date(2024, 2, 28)),
        ("Netflix", None, -15.49, utc_date(2024, 3, 15)),
    ];

    let mut transaction_ids = Vec::new();
    for (name, description, amount, date) in rows {
        let id = db.insert_transaction(
            user_id,
            &NewTransaction {
                account_id: checking_id,
                name: name.to_string(),
                description: description.map(str::to_string),
                amount,
                date,
                category_ids: Vec::new(),
            },
        )?;
        transaction_ids.push(id);
    }

    Ok(SeededLedger {
        user_id,
        other_user_id,
        checking_id,
        savings_id,
        other_account_id,
        housing_id,
        streaming_id,
        other_category_id,
        transaction_ids,
    })
}
