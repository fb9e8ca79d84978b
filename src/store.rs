// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Account, Transaction, TxnKind};
use chrono::NaiveDateTime;
use log::info;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use thiserror::Error;

const TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Fatal for the current sync pass; always propagated, never swallowed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ledger storage failure: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error("corrupt ledger value '{value}' in column {column}")]
    Corrupt { column: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    AlreadyPresent,
}

/// Balance treatment for TRANSFER transactions. The directional meaning of a
/// bare transfer notice is ambiguous, so the caller chooses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferPolicy {
    #[default]
    Ignore,
    Subtract,
}

impl TransferPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferPolicy::Ignore => "ignore",
            TransferPolicy::Subtract => "subtract",
        }
    }

    pub fn from_str_lossy(s: &str) -> TransferPolicy {
        match s {
            "subtract" => TransferPolicy::Subtract,
            _ => TransferPolicy::Ignore,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryFilter {
    pub account_id: Option<i64>,
    pub kind: Option<TxnKind>,
    /// Page size; a zero limit returns no rows.
    pub limit: usize,
    pub offset: usize,
}

impl Default for QueryFilter {
    fn default() -> QueryFilter {
        QueryFilter {
            account_id: None,
            kind: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Single source of truth for persisted accounts, transactions and sync
/// checkpoints. All reads and writes go through here.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn new(conn: Connection) -> Store {
        Store { conn }
    }

    pub fn open_in_memory() -> Result<Store, StoreError> {
        let conn = Connection::open_in_memory()?;
        crate::db::init_schema(&conn)?;
        Ok(Store { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get-or-create an account for a previously unseen hint. The hint is
    /// the stable account key; the home currency is fixed at creation.
    pub fn ensure_account(&self, hint: &str, currency: &str) -> Result<i64, StoreError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM accounts WHERE number=?1",
                params![hint],
                |r| r.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        self.conn.execute(
            "INSERT INTO accounts(number, currency) VALUES (?1, ?2)",
            params![hint, currency],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("created account '{}' ({})", hint, currency);
        Ok(id)
    }

    pub fn account(&self, id: i64) -> Result<Option<Account>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, number, currency, current_balance, last_sync_time
                 FROM accounts WHERE id=?1",
                params![id],
                account_columns,
            )
            .optional()?;
        row.map(decode_account).transpose()
    }

    pub fn account_by_number(&self, number: &str) -> Result<Option<Account>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, number, currency, current_balance, last_sync_time
                 FROM accounts WHERE number=?1",
                params![number],
                account_columns,
            )
            .optional()?;
        row.map(decode_account).transpose()
    }

    pub fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, number, currency, current_balance, last_sync_time
             FROM accounts ORDER BY number",
        )?;
        let rows = stmt.query_map([], account_columns)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(decode_account(row?)?);
        }
        Ok(out)
    }

    /// Read-only dedup probe, used by dry runs.
    pub fn contains(&self, id: &str) -> Result<bool, StoreError> {
        let hit: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM transactions WHERE id=?1",
                params![id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    /// Idempotent insert keyed on the stable id. A repeat of the same id is
    /// a no-op reported as `AlreadyPresent`, never a uniqueness error.
    pub fn upsert_transaction(&self, tx: &Transaction) -> Result<UpsertOutcome, StoreError> {
        let changed = self.conn.execute(
            "INSERT INTO transactions(
                 id, account_id, transaction_time, type, amount, currency,
                 counterparty, channel, balance_after, raw_text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO NOTHING",
            params![
                tx.id,
                tx.account_id,
                tx.time.format(TIME_FMT).to_string(),
                tx.kind.as_str(),
                tx.amount.to_string(),
                tx.currency,
                tx.counterparty,
                tx.channel,
                tx.balance_after.map(|b| b.to_string()),
                tx.raw_text,
            ],
        )?;
        Ok(if changed == 0 {
            UpsertOutcome::AlreadyPresent
        } else {
            UpsertOutcome::Inserted
        })
    }

    /// Fold one inserted transaction into the running balance. A stated
    /// balance overwrites authoritatively; otherwise income adds, expense
    /// subtracts, unknown leaves the balance alone and transfers follow
    /// `policy`. Callers invoke this exactly once per `Inserted` outcome.
    pub fn apply_balance_effect(
        &self,
        account_id: i64,
        tx: &Transaction,
        policy: TransferPolicy,
    ) -> Result<(), StoreError> {
        let next = match tx.balance_after {
            Some(stated) => stated,
            None => {
                let current = self.current_balance(account_id)?;
                match tx.kind {
                    TxnKind::Income => current + tx.amount,
                    TxnKind::Expense => current - tx.amount,
                    TxnKind::Transfer => match policy {
                        TransferPolicy::Subtract => current - tx.amount,
                        TransferPolicy::Ignore => return Ok(()),
                    },
                    TxnKind::Unknown => return Ok(()),
                }
            }
        };
        self.conn.execute(
            "UPDATE accounts SET current_balance=?1 WHERE id=?2",
            params![next.to_string(), account_id],
        )?;
        Ok(())
    }

    fn current_balance(&self, account_id: i64) -> Result<Decimal, StoreError> {
        let raw: String = self.conn.query_row(
            "SELECT current_balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )?;
        decode_decimal("current_balance", &raw)
    }

    /// Move the incremental-fetch watermark forward, never backward.
    pub fn advance_checkpoint(
        &self,
        account_id: i64,
        new_time: NaiveDateTime,
    ) -> Result<(), StoreError> {
        let current = self.last_sync_time(account_id)?;
        if current.is_some_and(|c| c >= new_time) {
            return Ok(());
        }
        self.conn.execute(
            "UPDATE accounts SET last_sync_time=?1 WHERE id=?2",
            params![new_time.format(TIME_FMT).to_string(), account_id],
        )?;
        Ok(())
    }

    pub fn last_sync_time(&self, account_id: i64) -> Result<Option<NaiveDateTime>, StoreError> {
        let raw: Option<String> = self.conn.query_row(
            "SELECT last_sync_time FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )?;
        raw.map(|s| decode_time("last_sync_time", &s)).transpose()
    }

    /// Oldest checkpoint across accounts, the safe lower bound for the next
    /// incremental window.
    pub fn earliest_checkpoint(&self) -> Result<Option<NaiveDateTime>, StoreError> {
        let raw: Option<String> = self.conn.query_row(
            "SELECT MIN(last_sync_time) FROM accounts WHERE last_sync_time IS NOT NULL",
            [],
            |r| r.get(0),
        )?;
        raw.map(|s| decode_time("last_sync_time", &s)).transpose()
    }

    /// The only read surface for stored transactions: newest first, ties
    /// broken by id so paging stays stable.
    pub fn query(&self, filter: &QueryFilter) -> Result<Vec<Transaction>, StoreError> {
        let mut sql = String::from(
            "SELECT id, account_id, transaction_time, type, amount, currency,
                    counterparty, channel, balance_after, raw_text
             FROM transactions WHERE 1=1",
        );
        let mut args: Vec<String> = Vec::new();
        if let Some(account_id) = filter.account_id {
            sql.push_str(" AND account_id=?");
            args.push(account_id.to_string());
        }
        if let Some(kind) = filter.kind {
            sql.push_str(" AND type=?");
            args.push(kind.as_str().to_string());
        }
        sql.push_str(" ORDER BY transaction_time DESC, id DESC LIMIT ? OFFSET ?");
        args.push(filter.limit.min(i64::MAX as usize).to_string());
        args.push(filter.offset.to_string());

        let mut stmt = self.conn.prepare(&sql)?;
        let params: Vec<&dyn rusqlite::ToSql> =
            args.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
        let mut rows = stmt.query(rusqlite::params_from_iter(params))?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            let raw = (
                r.get::<_, String>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, Option<String>>(6)?,
                r.get::<_, Option<String>>(7)?,
                r.get::<_, Option<String>>(8)?,
                r.get::<_, String>(9)?,
            );
            out.push(decode_transaction(raw)?);
        }
        Ok(out)
    }
}

type AccountRow = (i64, String, String, String, Option<String>);
type TxnRow = (
    String,
    i64,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
);

fn account_columns(r: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
}

fn decode_account(row: AccountRow) -> Result<Account, StoreError> {
    let (id, number, currency, balance, last_sync) = row;
    Ok(Account {
        id,
        number,
        currency,
        current_balance: decode_decimal("current_balance", &balance)?,
        last_sync_time: last_sync
            .map(|s| decode_time("last_sync_time", &s))
            .transpose()?,
    })
}

fn decode_transaction(row: TxnRow) -> Result<Transaction, StoreError> {
    let (id, account_id, time, kind, amount, currency, counterparty, channel, balance, raw_text) =
        row;
    Ok(Transaction {
        id,
        account_id,
        time: decode_time("transaction_time", &time)?,
        kind: TxnKind::from_str_lossy(&kind),
        amount: decode_decimal("amount", &amount)?,
        currency,
        counterparty,
        channel,
        balance_after: balance
            .map(|b| decode_decimal("balance_after", &b))
            .transpose()?,
        raw_text,
    })
}

fn decode_decimal(column: &'static str, raw: &str) -> Result<Decimal, StoreError> {
    raw.parse::<Decimal>().map_err(|_| StoreError::Corrupt {
        column,
        value: raw.to_string(),
    })
}

fn decode_time(column: &'static str, raw: &str) -> Result<NaiveDateTime, StoreError> {
    NaiveDateTime::parse_from_str(raw, TIME_FMT).map_err(|_| StoreError::Corrupt {
        column,
        value: raw.to_string(),
    })
}
