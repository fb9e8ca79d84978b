// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::identity::stable_id;
use crate::models::{CanonicalTransaction, SyncReport, Transaction};
use crate::parser;
use crate::store::{Store, StoreError, TransferPolicy, UpsertOutcome};
use chrono::NaiveDateTime;
use log::{info, warn};
use std::collections::HashSet;
use thiserror::Error;

/// Fatal fetch failure. No checkpoint advances beyond what was already
/// committed before the failure.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("message source I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("message source failure: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One raw notification body plus the time it arrived at the mailbox.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub raw_text: String,
    pub received_at: NaiveDateTime,
}

/// The transport boundary. Implementations must return every message inside
/// the window; order does not matter and overlap with a previous window is
/// expected.
pub trait MessageSource {
    fn fetch_messages(
        &mut self,
        since: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<RawMessage>, SourceError>;
}

/// Explicit orchestrator configuration; there is no process-wide state, so
/// concurrent test runs cannot interfere.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Identifies the originating source in the stable id projection.
    pub source_tag: String,
    /// Home currency for messages that do not state one.
    pub default_currency: String,
    pub transfer_policy: TransferPolicy,
    /// Parse and probe only; no insert, balance or checkpoint mutation.
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> SyncConfig {
        SyncConfig {
            source_tag: "cmb_email".to_string(),
            default_currency: "CNY".to_string(),
            transfer_policy: TransferPolicy::default(),
            dry_run: false,
        }
    }
}

/// One sync pass over `[since, until]`.
///
/// Each message is parsed, keyed and upserted on its own; a malformed
/// message is recorded in the report and never aborts the batch. The balance
/// effect runs only on a fresh insert, which is what keeps balances exact
/// when windows overlap or passes race. After the batch, every account
/// touched advances its checkpoint to the largest successfully parsed event
/// time, or to `until` when nothing parsed.
pub fn run_sync(
    store: &Store,
    source: &mut dyn MessageSource,
    cfg: &SyncConfig,
    since: NaiveDateTime,
    until: NaiveDateTime,
) -> Result<SyncReport, SyncError> {
    let messages = source.fetch_messages(since, until)?;
    let mut report = SyncReport {
        fetched: messages.len(),
        ..SyncReport::default()
    };
    let mut touched: HashSet<i64> = HashSet::new();
    let mut watermark: Option<NaiveDateTime> = None;
    // Ids already counted as would-insert within this dry-run batch, so a
    // repeated message previews as a duplicate exactly like a real run.
    let mut previewed: HashSet<String> = HashSet::new();

    for msg in &messages {
        let canonical = match parser::parse(&msg.raw_text, msg.received_at) {
            Ok(tx) => tx,
            Err(failure) => {
                warn!("skipping message received {}: {}", msg.received_at, failure);
                report.parse_failures.push(failure.to_string());
                continue;
            }
        };
        watermark = Some(watermark.map_or(canonical.time, |w| w.max(canonical.time)));
        let id = stable_id(&canonical, &cfg.source_tag);

        if cfg.dry_run {
            if store.contains(&id)? || !previewed.insert(id) {
                report.duplicates += 1;
            } else {
                report.inserted += 1;
            }
            continue;
        }

        let currency = canonical
            .currency
            .clone()
            .unwrap_or_else(|| cfg.default_currency.clone());
        let account_id = store.ensure_account(&canonical.account_hint, &currency)?;
        let tx = persisted(id, account_id, currency, canonical);
        match store.upsert_transaction(&tx)? {
            UpsertOutcome::Inserted => {
                store.apply_balance_effect(account_id, &tx, cfg.transfer_policy)?;
                report.inserted += 1;
            }
            UpsertOutcome::AlreadyPresent => report.duplicates += 1,
        }
        touched.insert(account_id);
    }

    if !cfg.dry_run {
        let mark = watermark.unwrap_or(until);
        for account_id in touched {
            store.advance_checkpoint(account_id, mark)?;
        }
    }

    info!(
        "sync{}: fetched {}, inserted {}, duplicates {}, parse failures {}",
        if cfg.dry_run { " (dry run)" } else { "" },
        report.fetched,
        report.inserted,
        report.duplicates,
        report.parse_failures.len()
    );
    Ok(report)
}

fn persisted(
    id: String,
    account_id: i64,
    currency: String,
    canonical: CanonicalTransaction,
) -> Transaction {
    Transaction {
        id,
        account_id,
        time: canonical.time,
        kind: canonical.kind,
        amount: canonical.amount,
        currency,
        counterparty: canonical.counterparty,
        channel: canonical.channel,
        balance_after: canonical.balance_after,
        raw_text: canonical.raw_text,
    }
}
