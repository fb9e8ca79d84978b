// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a transaction. Sign is carried here, never by the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnKind {
    Income,
    Expense,
    Transfer,
    Unknown,
}

impl TxnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnKind::Income => "income",
            TxnKind::Expense => "expense",
            TxnKind::Transfer => "transfer",
            TxnKind::Unknown => "unknown",
        }
    }

    /// Lenient decode for values read back from storage or CLI flags.
    pub fn from_str_lossy(s: &str) -> TxnKind {
        match s {
            "income" => TxnKind::Income,
            "expense" => TxnKind::Expense,
            "transfer" => TxnKind::Transfer,
            _ => TxnKind::Unknown,
        }
    }
}

/// Normalized, format-independent view of one notification message.
/// Produced by the parser, consumed within a single sync pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTransaction {
    /// Masked account fragment exactly as the message states it, e.g. "8551".
    pub account_hint: String,
    pub time: NaiveDateTime,
    pub kind: TxnKind,
    /// Non-negative magnitude.
    pub amount: Decimal,
    /// None when the message does not state a currency; the orchestrator
    /// substitutes the account's home currency.
    pub currency: Option<String>,
    pub counterparty: Option<String>,
    pub channel: Option<String>,
    /// Only set when the message states the resulting balance explicitly.
    pub balance_after: Option<Decimal>,
    /// Full original message body, kept for audit and re-parsing.
    pub raw_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i64,
    /// Stable key derived from the account hint, unique across syncs.
    pub number: String,
    pub currency: String,
    pub current_balance: Decimal,
    pub last_sync_time: Option<NaiveDateTime>,
}

/// Persisted transaction row. `id` is the dedup key and uniqueness constraint.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: i64,
    pub time: NaiveDateTime,
    pub kind: TxnKind,
    pub amount: Decimal,
    pub currency: String,
    pub counterparty: Option<String>,
    pub channel: Option<String>,
    pub balance_after: Option<Decimal>,
    pub raw_text: String,
}

/// Outcome counters for one sync pass, always reported even on partial success.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub fetched: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub parse_failures: Vec<String>,
}
