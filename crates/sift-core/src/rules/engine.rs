//! Rule engine - evaluates a rule snapshot against one transaction
//!
//! The engine never touches a store. It is built once per run from the
//! user's categories, accounts and hydrated rules, then asked for a
//! [`Changeset`] per transaction.

use std::collections::HashMap;

use tracing::debug;

use super::changeset::{Changeset, TransferInfo};
use crate::models::{
    Account, ActionField, Category, ConditionField, ConditionLogic, ConditionOperator, RuleAction,
    RuleCondition, RuleWithDetails, Transaction,
};

/// Pure evaluator over a read-only snapshot
#[derive(Debug, Clone)]
pub struct RuleEngine {
    categories: HashMap<i64, Category>,
    accounts: HashMap<i64, Account>,
    /// Evaluation order is the order given to `new`
    rules: Vec<RuleWithDetails>,
}

impl RuleEngine {
    pub fn new(
        categories: Vec<Category>,
        accounts: Vec<Account>,
        rules: Vec<RuleWithDetails>,
    ) -> Self {
        Self {
            categories: categories.into_iter().map(|c| (c.id, c)).collect(),
            accounts: accounts.into_iter().map(|a| (a.id, a)).collect(),
            rules,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate every rule against `transaction`
    ///
    /// Returns `None` when nothing was staged.
    pub fn process_transaction(&self, transaction: &Transaction) -> Option<Changeset> {
        let mut changeset = Changeset::new(transaction.id);

        for rule in &self.rules {
            if rule.rule.effective_from > transaction.date {
                continue;
            }

            if !self.rule_matches(rule, transaction) {
                continue;
            }

            let mut staged_any = false;
            for action in &rule.actions {
                if self.apply_action(action, transaction, &mut changeset) {
                    staged_any = true;
                }
            }

            if staged_any {
                debug!(
                    rule_id = rule.rule.id,
                    transaction_id = transaction.id,
                    "Rule staged changes"
                );
                changeset.record_rule(rule.rule.id);
            }
        }

        if changeset.is_empty() {
            None
        } else {
            Some(changeset)
        }
    }

    fn rule_matches(&self, rule: &RuleWithDetails, transaction: &Transaction) -> bool {
        if rule.conditions.is_empty() {
            return false;
        }

        match rule.rule.condition_logic {
            ConditionLogic::And => rule
                .conditions
                .iter()
                .all(|c| self.condition_matches(c, transaction)),
            ConditionLogic::Or => rule
                .conditions
                .iter()
                .any(|c| self.condition_matches(c, transaction)),
        }
    }

    fn condition_matches(&self, condition: &RuleCondition, transaction: &Transaction) -> bool {
        match condition.field {
            ConditionField::Amount => {
                amount_matches(transaction.amount, condition.operator, &condition.value)
            }
            ConditionField::Name => {
                text_matches(&transaction.name, condition.operator, &condition.value)
            }
            ConditionField::Description => text_matches(
                transaction.description_or_empty(),
                condition.operator,
                &condition.value,
            ),
            ConditionField::Category => match condition.operator {
                ConditionOperator::Equals => match parse_id(&condition.value) {
                    Some(id) => {
                        self.owns_category(id, transaction.user_id)
                            && transaction.category_ids.contains(&id)
                    }
                    None => false,
                },
                ConditionOperator::Greater
                | ConditionOperator::Lower
                | ConditionOperator::Contains => false,
            },
            ConditionField::Transfer => match condition.operator {
                ConditionOperator::Equals => match parse_id(&condition.value) {
                    Some(id) => {
                        self.owns_account(id, transaction.user_id) && id == transaction.account_id
                    }
                    None => false,
                },
                ConditionOperator::Greater
                | ConditionOperator::Lower
                | ConditionOperator::Contains => false,
            },
        }
    }

    /// Stage one action; returns whether anything new was staged
    fn apply_action(
        &self,
        action: &RuleAction,
        transaction: &Transaction,
        changeset: &mut Changeset,
    ) -> bool {
        match action.field {
            ActionField::Name => changeset.stage_name(&action.value),
            ActionField::Description => changeset.stage_description(&action.value),
            ActionField::Category => {
                let Some(category_id) = parse_id(&action.value) else {
                    return false;
                };
                if !self.owns_category(category_id, transaction.user_id) {
                    return false;
                }
                if transaction.category_ids.contains(&category_id) {
                    return false;
                }
                changeset.stage_category(category_id)
            }
            ActionField::Transfer => {
                let Some(account_id) = parse_id(&action.value) else {
                    return false;
                };
                if !self.owns_account(account_id, transaction.user_id)
                    || account_id == transaction.account_id
                    || changeset.has_transfer()
                {
                    return false;
                }
                changeset.stage_transfer(TransferInfo {
                    account_id,
                    amount: -transaction.amount,
                })
            }
        }
    }

    fn owns_category(&self, category_id: i64, user_id: i64) -> bool {
        self.categories
            .get(&category_id)
            .is_some_and(|c| c.user_id == user_id)
    }

    fn owns_account(&self, account_id: i64, user_id: i64) -> bool {
        self.accounts
            .get(&account_id)
            .is_some_and(|a| a.user_id == user_id)
    }
}

fn parse_id(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

/// Compare an amount against a literal; a non-numeric literal never matches
fn amount_matches(amount: f64, operator: ConditionOperator, value: &str) -> bool {
    let Ok(expected) = value.trim().parse::<f64>() else {
        return false;
    };

    match operator {
        ConditionOperator::Equals => amount == expected,
        ConditionOperator::Greater => amount > expected,
        ConditionOperator::Lower => amount < expected,
        ConditionOperator::Contains => false,
    }
}

/// Case-insensitive equality or containment
fn text_matches(actual: &str, operator: ConditionOperator, value: &str) -> bool {
    let actual = actual.to_lowercase();
    let value = value.to_lowercase();

    match operator {
        ConditionOperator::Equals => actual == value,
        ConditionOperator::Contains => actual.contains(&value),
        ConditionOperator::Greater | ConditionOperator::Lower => false,
    }
}
