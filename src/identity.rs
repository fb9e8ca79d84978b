// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::CanonicalTransaction;

/// Deterministic dedup key for one real-world transaction.
///
/// The projection is fixed: source tag, account hint, event time, kind,
/// normalized amount, counterparty. It deliberately excludes `raw_text`,
/// `balance_after`, `channel` and anything else that can differ between two
/// fetches of the same event. Fields are joined with the ASCII unit
/// separator, which cannot survive text normalization into any field value.
pub fn stable_id(tx: &CanonicalTransaction, source_tag: &str) -> String {
    let key = format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
        source_tag,
        tx.account_hint,
        tx.time.format("%Y-%m-%dT%H:%M:%S"),
        tx.kind.as_str(),
        tx.amount.normalize(),
        tx.counterparty.as_deref().unwrap_or("-"),
    );
    sha256::digest(key)
}
