//! Transaction operations

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};

use super::{datetime_column, format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{BaseFieldUpdate, NewTransaction, Transaction, TransactionOrder};
use crate::rules::TransferInfo;
use crate::store::{TransactionChanges, TransactionStore};

const TRANSACTION_COLUMNS: &str =
    "t.id, t.user_id, t.account_id, t.name, t.description, t.amount, t.date, t.created_at";

impl Database {
    /// Insert a transaction with its initial categories
    pub fn insert_transaction(&self, user_id: i64, tx: &NewTransaction) -> Result<i64> {
        let mut conn = self.conn()?;

        let owns_account = conn
            .query_row(
                "SELECT 1 FROM accounts WHERE id = ? AND user_id = ?",
                params![tx.account_id, user_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !owns_account {
            return Err(Error::InvalidData(format!(
                "account {} does not belong to user {}",
                tx.account_id, user_id
            )));
        }

        let db_tx = conn.transaction()?;
        db_tx.execute(
            r#"
            INSERT INTO transactions (user_id, account_id, name, description, amount, date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                tx.account_id,
                tx.name,
                tx.description,
                tx.amount,
                format_datetime(&tx.date),
            ],
        )?;
        let id = db_tx.last_insert_rowid();

        for category_id in &tx.category_ids {
            db_tx.execute(
                "INSERT OR IGNORE INTO transaction_categories (transaction_id, category_id) VALUES (?, ?)",
                params![id, category_id],
            )?;
        }

        db_tx.commit()?;
        Ok(id)
    }

    /// Count a user's transactions
    pub fn count_transactions(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let created_at_str: String = row.get(7)?;
        Ok(Transaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            account_id: row.get(2)?,
            name: row.get(3)?,
            description: row.get(4)?,
            amount: row.get(5)?,
            date: datetime_column(row, 6)?,
            category_ids: Vec::new(),
            created_at: parse_datetime(&created_at_str),
        })
    }

    /// Fill `category_ids` for a batch of transactions with one query
    fn load_category_ids(conn: &Connection, transactions: &mut [Transaction]) -> Result<()> {
        if transactions.is_empty() {
            return Ok(());
        }

        let placeholders: Vec<&str> = transactions.iter().map(|_| "?").collect();
        let sql = format!(
            "SELECT transaction_id, category_id FROM transaction_categories \
             WHERE transaction_id IN ({}) ORDER BY rowid",
            placeholders.join(", ")
        );
        let ids: Vec<i64> = transactions.iter().map(|t| t.id).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut by_transaction: HashMap<i64, Vec<i64>> = HashMap::new();
        for (transaction_id, category_id) in rows {
            by_transaction
                .entry(transaction_id)
                .or_default()
                .push(category_id);
        }

        for tx in transactions.iter_mut() {
            tx.category_ids = by_transaction.remove(&tx.id).unwrap_or_default();
        }

        Ok(())
    }

    fn ensure_owned(conn: &Connection, id: i64, user_id: i64) -> Result<()> {
        let owned = conn
            .query_row(
                "SELECT 1 FROM transactions WHERE id = ? AND user_id = ?",
                params![id, user_id],
                |_| Ok(()),
            )
            .optional()?;

        owned.ok_or_else(|| Error::NotFound(format!("transaction {}", id)))
    }

    fn write_base_fields(
        conn: &Connection,
        id: i64,
        user_id: i64,
        update: &BaseFieldUpdate,
    ) -> Result<()> {
        let changed = conn.execute(
            r#"
            UPDATE transactions
            SET name = COALESCE(?, name),
                description = COALESCE(?, description)
            WHERE id = ? AND user_id = ?
            "#,
            params![update.name, update.description, id, user_id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }

    /// Replace the category set, keeping the given order (caller owns the transaction boundary)
    fn write_category_ids(conn: &Connection, id: i64, category_ids: &[i64]) -> Result<()> {
        conn.execute(
            "DELETE FROM transaction_categories WHERE transaction_id = ?",
            params![id],
        )?;
        for category_id in category_ids {
            conn.execute(
                "INSERT OR IGNORE INTO transaction_categories (transaction_id, category_id) VALUES (?, ?)",
                params![id, category_id],
            )?;
        }
        Ok(())
    }

    fn write_transfer_link(conn: &Connection, id: i64, transfer: &TransferInfo) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO transaction_transfers (transaction_id, account_id, amount)
            VALUES (?, ?, ?)
            ON CONFLICT(transaction_id) DO UPDATE SET
                account_id = excluded.account_id,
                amount = excluded.amount
            "#,
            params![id, transfer.account_id, transfer.amount],
        )?;
        Ok(())
    }
}

impl TransactionStore for Database {
    fn get_transaction(&self, id: i64, user_id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!(
                    "SELECT {} FROM transactions t WHERE t.id = ? AND t.user_id = ?",
                    TRANSACTION_COLUMNS
                ),
                params![id, user_id],
                Self::row_to_transaction,
            )
            .optional()?;

        match tx {
            Some(tx) => {
                let mut batch = [tx];
                Self::load_category_ids(&conn, &mut batch)?;
                let [tx] = batch;
                Ok(Some(tx))
            }
            None => Ok(None),
        }
    }

    fn list_transactions_page(
        &self,
        user_id: i64,
        page: usize,
        page_size: usize,
        order: TransactionOrder,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM transactions t WHERE t.user_id = ? ORDER BY {} LIMIT ? OFFSET ?",
            TRANSACTION_COLUMNS,
            order.as_sql()
        );

        let limit = page_size as i64;
        let offset = (page as i64).saturating_mul(limit);

        let mut stmt = conn.prepare(&sql)?;
        let mut transactions = stmt
            .query_map(params![user_id, limit, offset], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Self::load_category_ids(&conn, &mut transactions)?;
        Ok(transactions)
    }

    fn update_base_fields(&self, id: i64, user_id: i64, update: &BaseFieldUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let conn = self.conn()?;
        Self::write_base_fields(&conn, id, user_id, update)
    }

    fn update_category_ids(&self, id: i64, user_id: i64, category_ids: &[i64]) -> Result<()> {
        let mut conn = self.conn()?;
        Self::ensure_owned(&conn, id, user_id)?;

        let db_tx = conn.transaction()?;
        Self::write_category_ids(&db_tx, id, category_ids)?;
        db_tx.commit()?;

        Ok(())
    }

    fn link_transfer(&self, id: i64, user_id: i64, transfer: &TransferInfo) -> Result<()> {
        let conn = self.conn()?;
        Self::ensure_owned(&conn, id, user_id)?;
        Self::write_transfer_link(&conn, id, transfer)
    }

    fn get_transfer_link(&self, id: i64, user_id: i64) -> Result<Option<TransferInfo>> {
        let conn = self.conn()?;
        let link = conn
            .query_row(
                r#"
                SELECT tt.account_id, tt.amount
                FROM transaction_transfers tt
                JOIN transactions t ON t.id = tt.transaction_id
                WHERE tt.transaction_id = ? AND t.user_id = ?
                "#,
                params![id, user_id],
                |row| {
                    Ok(TransferInfo {
                        account_id: row.get(0)?,
                        amount: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(link)
    }

    fn apply_changes(&self, id: i64, user_id: i64, changes: &TransactionChanges) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        Self::ensure_owned(&conn, id, user_id)?;

        // Dropped without commit on any error, which rolls every write back
        let db_tx = conn.transaction()?;
        if !changes.base.is_empty() {
            Self::write_base_fields(&db_tx, id, user_id, &changes.base)?;
        }
        if let Some(category_ids) = &changes.category_ids {
            Self::write_category_ids(&db_tx, id, category_ids)?;
        }
        if let Some(transfer) = &changes.transfer {
            Self::write_transfer_link(&db_tx, id, transfer)?;
        }
        db_tx.commit()?;

        Ok(())
    }
}
