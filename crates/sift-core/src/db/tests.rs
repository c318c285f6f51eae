//! Database tests

use super::*;
use crate::models::*;
use crate::rules::TransferInfo;
use crate::store::{
    AccountStore, CategoryStore, RuleStore, TransactionChanges, TransactionStore,
};
use crate::test_utils::{seed_ledger, utc_date};

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert!(db.list_accounts(1).unwrap().is_empty());
        assert!(db.list_rules(1).unwrap().is_empty());
        assert_eq!(db.count_transactions(1).unwrap(), 0);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = Database::in_memory().unwrap();
        db.create_account(1, "Checking").unwrap();

        let reopened = Database::new_unencrypted(db.path()).unwrap();
        assert_eq!(reopened.list_accounts(1).unwrap().len(), 1);
    }

    #[test]
    fn test_schema_tables_exist() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        for table in [
            "accounts",
            "categories",
            "transactions",
            "transaction_categories",
            "rules",
            "rule_conditions",
            "rule_actions",
            "transaction_transfers",
        ] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                    params![table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }

    #[test]
    fn test_rule_constraints() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        let result = conn.execute(
            "INSERT INTO rules (user_id, name, effective_from, condition_logic) VALUES (1, 'x', '2024-01-01 00:00:00', 'xor')",
            [],
        );
        assert!(result.is_err(), "condition_logic should be constrained");

        conn.execute(
            "INSERT INTO rules (user_id, name, effective_from) VALUES (1, 'x', '2024-01-01 00:00:00')",
            [],
        )
        .unwrap();
        let rule_id = conn.last_insert_rowid();

        let result = conn.execute(
            "INSERT INTO rule_conditions (rule_id, field, operator, value) VALUES (?, 'merchant', 'equals', 'x')",
            params![rule_id],
        );
        assert!(result.is_err(), "condition field should be constrained");

        let result = conn.execute(
            "INSERT INTO rule_actions (rule_id, field, value) VALUES (?, 'amount', '1')",
            params![rule_id],
        );
        assert!(result.is_err(), "amount is not an action field");
    }

    #[test]
    fn test_account_scoping() {
        let db = Database::in_memory().unwrap();
        let mine = db.create_account(1, "Checking").unwrap();
        let theirs = db.create_account(2, "Checking").unwrap();

        assert_eq!(db.get_account(mine, 1).unwrap().unwrap().name, "Checking");
        assert!(db.get_account(theirs, 1).unwrap().is_none());
        assert!(db.get_account(9999, 1).unwrap().is_none());

        let accounts = db.list_accounts(1).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, mine);
    }

    #[test]
    fn test_category_create_is_idempotent_per_user() {
        let db = Database::in_memory().unwrap();
        let id = db.create_category(1, "Housing").unwrap();
        assert_eq!(db.create_category(1, "Housing").unwrap(), id);
        assert_ne!(db.create_category(2, "Housing").unwrap(), id);

        db.create_category(1, "Dining").unwrap();
        let names: Vec<String> = db
            .list_categories(1)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Dining", "Housing"]);
    }

    #[test]
    fn test_rule_roundtrip_with_details() {
        let db = Database::in_memory().unwrap();
        let rule_id = db
            .create_rule(
                1,
                "Streaming",
                Some("tag video services"),
                utc_date(2024, 1, 1),
                ConditionLogic::Or,
            )
            .unwrap();
        db.add_rule_condition(rule_id, ConditionField::Name, ConditionOperator::Contains, "netflix")
            .unwrap();
        db.add_rule_condition(rule_id, ConditionField::Amount, ConditionOperator::Lower, "-10")
            .unwrap();
        db.add_rule_action(rule_id, ActionField::Category, "5").unwrap();
        db.add_rule_action(rule_id, ActionField::Name, "Netflix").unwrap();

        let rule = db.get_rule(rule_id, 1).unwrap().unwrap();
        assert_eq!(rule.name, "Streaming");
        assert_eq!(rule.description.as_deref(), Some("tag video services"));
        assert_eq!(rule.effective_from, utc_date(2024, 1, 1));
        assert_eq!(rule.condition_logic, ConditionLogic::Or);

        let conditions = db.list_conditions(rule_id).unwrap();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].field, ConditionField::Name);
        assert_eq!(conditions[1].operator, ConditionOperator::Lower);

        let actions = db.list_actions(rule_id).unwrap();
        let fields: Vec<ActionField> = actions.iter().map(|a| a.field).collect();
        assert_eq!(fields, vec![ActionField::Category, ActionField::Name]);

        // Another user's lookup sees nothing
        assert!(db.get_rule(rule_id, 2).unwrap().is_none());
    }

    #[test]
    fn test_list_rules_in_id_order() {
        let db = Database::in_memory().unwrap();
        let first = db
            .create_rule(1, "b", None, utc_date(2024, 1, 1), ConditionLogic::And)
            .unwrap();
        db.create_rule(2, "other", None, utc_date(2024, 1, 1), ConditionLogic::And)
            .unwrap();
        let second = db
            .create_rule(1, "a", None, utc_date(2023, 1, 1), ConditionLogic::And)
            .unwrap();

        let ids: Vec<i64> = db.list_rules(1).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_corrupt_rule_row_is_an_error() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        conn.execute(
            "INSERT INTO rules (user_id, name, effective_from) VALUES (1, 'broken', 'not a date')",
            [],
        )
        .unwrap();

        assert!(db.list_rules(1).is_err());
    }

    #[test]
    fn test_insert_transaction_requires_owned_account() {
        let db = Database::in_memory().unwrap();
        let theirs = db.create_account(2, "Checking").unwrap();

        let result = db.insert_transaction(
            1,
            &NewTransaction {
                account_id: theirs,
                name: "Coffee".to_string(),
                description: None,
                amount: -4.5,
                date: utc_date(2024, 5, 1),
                category_ids: Vec::new(),
            },
        );
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_get_transaction_with_categories() {
        let db = Database::in_memory().unwrap();
        let ledger = seed_ledger(&db).unwrap();

        let id = db
            .insert_transaction(
                ledger.user_id,
                &NewTransaction {
                    account_id: ledger.checking_id,
                    name: "Cable".to_string(),
                    description: Some("monthly".to_string()),
                    amount: -60.0,
                    date: utc_date(2024, 4, 1),
                    category_ids: vec![ledger.streaming_id, ledger.housing_id],
                },
            )
            .unwrap();

        let tx = db.get_transaction(id, ledger.user_id).unwrap().unwrap();
        assert_eq!(tx.name, "Cable");
        assert_eq!(tx.description.as_deref(), Some("monthly"));
        assert_eq!(tx.amount, -60.0);
        assert_eq!(tx.date, utc_date(2024, 4, 1));
        assert_eq!(tx.account_id, ledger.checking_id);
        // Assignment order, not id order
        assert_eq!(tx.category_ids, vec![ledger.streaming_id, ledger.housing_id]);

        assert!(db.get_transaction(id, ledger.other_user_id).unwrap().is_none());
    }

    #[test]
    fn test_list_transactions_page_orders_and_paginates() {
        let db = Database::in_memory().unwrap();
        let ledger = seed_ledger(&db).unwrap();
        let ids = &ledger.transaction_ids;

        let first = db
            .list_transactions_page(ledger.user_id, 0, 2, TransactionOrder::DateDesc)
            .unwrap();
        let second = db
            .list_transactions_page(ledger.user_id, 1, 2, TransactionOrder::DateDesc)
            .unwrap();
        let third = db
            .list_transactions_page(ledger.user_id, 2, 2, TransactionOrder::DateDesc)
            .unwrap();
        let past_end = db
            .list_transactions_page(ledger.user_id, 3, 2, TransactionOrder::DateDesc)
            .unwrap();

        let page_ids = |page: &[Transaction]| page.iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(page_ids(&first), vec![ids[4], ids[3]]);
        assert_eq!(page_ids(&second), vec![ids[2], ids[1]]);
        assert_eq!(page_ids(&third), vec![ids[0]]);
        assert!(past_end.is_empty());

        let ascending = db
            .list_transactions_page(ledger.user_id, 0, 10, TransactionOrder::DateAsc)
            .unwrap();
        assert_eq!(page_ids(&ascending), ids.clone());

        assert!(db
            .list_transactions_page(ledger.other_user_id, 0, 10, TransactionOrder::DateDesc)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_same_date_breaks_ties_by_id() {
        let db = Database::in_memory().unwrap();
        let account = db.create_account(1, "Checking").unwrap();
        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            ids.push(
                db.insert_transaction(
                    1,
                    &NewTransaction {
                        account_id: account,
                        name: name.to_string(),
                        description: None,
                        amount: -1.0,
                        date: utc_date(2024, 1, 1),
                        category_ids: Vec::new(),
                    },
                )
                .unwrap(),
            );
        }

        let page: Vec<i64> = db
            .list_transactions_page(1, 0, 10, TransactionOrder::DateDesc)
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        ids.reverse();
        assert_eq!(page, ids);
    }

    #[test]
    fn test_update_base_fields_is_partial() {
        let db = Database::in_memory().unwrap();
        let ledger = seed_ledger(&db).unwrap();
        let rent = ledger.transaction_ids[0];

        db.update_base_fields(
            rent,
            ledger.user_id,
            &BaseFieldUpdate {
                name: Some("Rent".to_string()),
                description: None,
            },
        )
        .unwrap();

        let tx = db.get_transaction(rent, ledger.user_id).unwrap().unwrap();
        assert_eq!(tx.name, "Rent");
        assert_eq!(tx.description.as_deref(), Some("apartment"));

        db.update_base_fields(
            rent,
            ledger.user_id,
            &BaseFieldUpdate {
                name: None,
                description: Some("lease".to_string()),
            },
        )
        .unwrap();
        let tx = db.get_transaction(rent, ledger.user_id).unwrap().unwrap();
        assert_eq!(tx.name, "Rent");
        assert_eq!(tx.description.as_deref(), Some("lease"));
    }

    #[test]
    fn test_update_base_fields_wrong_user_is_not_found() {
        let db = Database::in_memory().unwrap();
        let ledger = seed_ledger(&db).unwrap();

        let result = db.update_base_fields(
            ledger.transaction_ids[0],
            ledger.other_user_id,
            &BaseFieldUpdate {
                name: Some("stolen".to_string()),
                description: None,
            },
        );
        assert!(matches!(result, Err(Error::NotFound(_))));

        let tx = db
            .get_transaction(ledger.transaction_ids[0], ledger.user_id)
            .unwrap()
            .unwrap();
        assert_eq!(tx.name, "January Rent");
    }

    #[test]
    fn test_update_category_ids_replaces_set() {
        let db = Database::in_memory().unwrap();
        let ledger = seed_ledger(&db).unwrap();
        let netflix = ledger.transaction_ids[1];

        db.update_category_ids(netflix, ledger.user_id, &[ledger.housing_id])
            .unwrap();
        db.update_category_ids(
            netflix,
            ledger.user_id,
            &[ledger.streaming_id, ledger.housing_id, ledger.streaming_id],
        )
        .unwrap();

        let tx = db.get_transaction(netflix, ledger.user_id).unwrap().unwrap();
        assert_eq!(tx.category_ids, vec![ledger.streaming_id, ledger.housing_id]);

        let result = db.update_category_ids(netflix, ledger.other_user_id, &[]);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_link_transfer_upserts() {
        let db = Database::in_memory().unwrap();
        let ledger = seed_ledger(&db).unwrap();
        let rent = ledger.transaction_ids[0];

        assert!(db.get_transfer_link(rent, ledger.user_id).unwrap().is_none());

        let transfer = TransferInfo {
            account_id: ledger.savings_id,
            amount: 1500.0,
        };
        db.link_transfer(rent, ledger.user_id, &transfer).unwrap();
        db.link_transfer(rent, ledger.user_id, &transfer).unwrap();
        assert_eq!(db.get_transfer_link(rent, ledger.user_id).unwrap(), Some(transfer));
        assert!(db
            .get_transfer_link(rent, ledger.other_user_id)
            .unwrap()
            .is_none());

        let conn = db.conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM transaction_transfers", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);

        // Linking never creates transactions
        assert_eq!(db.count_transactions(ledger.user_id).unwrap(), 5);

        let result = db.link_transfer(rent, ledger.other_user_id, &transfer);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_apply_changes_writes_every_part() {
        let db = Database::in_memory().unwrap();
        let ledger = seed_ledger(&db).unwrap();
        let rent = ledger.transaction_ids[0];
        let transfer = TransferInfo {
            account_id: ledger.savings_id,
            amount: 1500.0,
        };

        db.apply_changes(
            rent,
            ledger.user_id,
            &TransactionChanges {
                base: BaseFieldUpdate {
                    name: Some("Rent".into()),
                    description: None,
                },
                category_ids: Some(vec![ledger.housing_id]),
                transfer: Some(transfer),
            },
        )
        .unwrap();

        let tx = db.get_transaction(rent, ledger.user_id).unwrap().unwrap();
        assert_eq!(tx.name, "Rent");
        assert_eq!(tx.description.as_deref(), Some("apartment"));
        assert_eq!(tx.category_ids, vec![ledger.housing_id]);
        assert_eq!(db.get_transfer_link(rent, ledger.user_id).unwrap(), Some(transfer));
    }

    #[test]
    fn test_apply_changes_rolls_back_on_failure() {
        let db = Database::in_memory().unwrap();
        let ledger = seed_ledger(&db).unwrap();
        let rent = ledger.transaction_ids[0];

        // No such account, so the transfer row violates its foreign key
        let result = db.apply_changes(
            rent,
            ledger.user_id,
            &TransactionChanges {
                base: BaseFieldUpdate {
                    name: Some("Rent".into()),
                    description: Some("monthly rent".into()),
                },
                category_ids: Some(vec![ledger.housing_id]),
                transfer: Some(TransferInfo {
                    account_id: 9999,
                    amount: 1500.0,
                }),
            },
        );
        assert!(result.is_err());

        let tx = db.get_transaction(rent, ledger.user_id).unwrap().unwrap();
        assert_eq!(tx.name, "January Rent");
        assert_eq!(tx.description.as_deref(), Some("apartment"));
        assert!(tx.category_ids.is_empty());
        assert!(db.get_transfer_link(rent, ledger.user_id).unwrap().is_none());
    }

    #[test]
    fn test_apply_changes_wrong_user_is_not_found() {
        let db = Database::in_memory().unwrap();
        let ledger = seed_ledger(&db).unwrap();
        let rent = ledger.transaction_ids[0];

        let result = db.apply_changes(
            rent,
            ledger.other_user_id,
            &TransactionChanges {
                category_ids: Some(vec![ledger.other_category_id]),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(Error::NotFound(_))));

        let tx = db.get_transaction(rent, ledger.user_id).unwrap().unwrap();
        assert!(tx.category_ids.is_empty());
    }
}
