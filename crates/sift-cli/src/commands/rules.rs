//! Rule listing

use anyhow::Result;
use sift_core::models::RuleWithDetails;
use sift_core::{Database, RuleStore};

use super::truncate;

/// A user's rules hydrated with conditions and actions, in evaluation order
pub fn load_rules(db: &Database, user_id: i64) -> Result<Vec<RuleWithDetails>> {
    let mut hydrated = Vec::new();
    for rule in db.list_rules(user_id)? {
        let conditions = db.list_conditions(rule.id)?;
        let actions = db.list_actions(rule.id)?;
        hydrated.push(RuleWithDetails {
            rule,
            conditions,
            actions,
        });
    }
    Ok(hydrated)
}

pub fn cmd_rules_list(db: &Database, user_id: i64, json: bool) -> Result<()> {
    let rules = load_rules(db, user_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    if rules.is_empty() {
        println!("No rules defined for user {}.", user_id);
        return Ok(());
    }

    println!();
    println!("📋 Rules");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:>4} │ {:24} │ {:5} │ {}",
        "ID", "Name", "Logic", "Effective from"
    );
    println!("   ─────┼──────────────────────────┼───────┼─────────────────");

    for rule in &rules {
        println!(
            "   {:>4} │ {:24} │ {:5} │ {}",
            rule.rule.id,
            truncate(&rule.rule.name, 24),
            rule.rule.condition_logic.as_str(),
            rule.rule.effective_from.format("%Y-%m-%d")
        );
        for condition in &rule.conditions {
            println!(
                "          if   {} {} {:?}",
                condition.field, condition.operator, condition.value
            );
        }
        for action in &rule.actions {
            println!("          then {} = {:?}", action.field, action.value);
        }
    }

    Ok(())
}
