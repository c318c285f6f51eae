//! Rule, condition, and action operations

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{datetime_column, enum_column, format_datetime, parse_datetime, Database};
use crate::error::Result;
use crate::models::{
    ActionField, ConditionField, ConditionLogic, ConditionOperator, Rule, RuleAction,
    RuleCondition,
};
use crate::store::RuleStore;

const RULE_COLUMNS: &str =
    "id, user_id, name, description, effective_from, condition_logic, created_at";

impl Database {
    /// Create a rule (conditions and actions are added separately)
    pub fn create_rule(
        &self,
        user_id: i64,
        name: &str,
        description: Option<&str>,
        effective_from: DateTime<Utc>,
        condition_logic: ConditionLogic,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO rules (user_id, name, description, effective_from, condition_logic)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                name,
                description,
                format_datetime(&effective_from),
                condition_logic.as_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Append a condition to a rule
    pub fn add_rule_condition(
        &self,
        rule_id: i64,
        field: ConditionField,
        operator: ConditionOperator,
        value: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO rule_conditions (rule_id, field, operator, value) VALUES (?, ?, ?, ?)",
            params![rule_id, field.as_str(), operator.as_str(), value],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Append an action to a rule (actions apply in insertion order)
    pub fn add_rule_action(&self, rule_id: i64, field: ActionField, value: &str) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO rule_actions (rule_id, field, value) VALUES (?, ?, ?)",
            params![rule_id, field.as_str(), value],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn row_to_rule(row: &rusqlite::Row) -> rusqlite::Result<Rule> {
        let created_at_str: String = row.get(6)?;
        Ok(Rule {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            effective_from: datetime_column(row, 4)?,
            condition_logic: enum_column(row, 5)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}

impl RuleStore for Database {
    fn get_rule(&self, id: i64, user_id: i64) -> Result<Option<Rule>> {
        let conn = self.conn()?;
        let rule = conn
            .query_row(
                &format!(
                    "SELECT {} FROM rules WHERE id = ? AND user_id = ?",
                    RULE_COLUMNS
                ),
                params![id, user_id],
                Self::row_to_rule,
            )
            .optional()?;

        Ok(rule)
    }

    fn list_rules(&self, user_id: i64) -> Result<Vec<Rule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM rules WHERE user_id = ? ORDER BY id",
            RULE_COLUMNS
        ))?;

        let rules = stmt
            .query_map(params![user_id], Self::row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rules)
    }

    fn list_actions(&self, rule_id: i64) -> Result<Vec<RuleAction>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, rule_id, field, value FROM rule_actions WHERE rule_id = ? ORDER BY id")?;

        let actions = stmt
            .query_map(params![rule_id], |row| {
                Ok(RuleAction {
                    id: row.get(0)?,
                    rule_id: row.get(1)?,
                    field: enum_column(row, 2)?,
                    value: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(actions)
    }

    fn list_conditions(&self, rule_id: i64) -> Result<Vec<RuleCondition>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, rule_id, field, operator, value FROM rule_conditions WHERE rule_id = ? ORDER BY id",
        )?;

        let conditions = stmt
            .query_map(params![rule_id], |row| {
                Ok(RuleCondition {
                    id: row.get(0)?,
                    rule_id: row.get(1)?,
                    field: enum_column(row, 2)?,
                    operator: enum_column(row, 3)?,
                    value: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(conditions)
    }
}
