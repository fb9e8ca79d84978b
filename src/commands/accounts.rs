// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::Store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub fn handle(store: &Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(store, sub),
        _ => Ok(()),
    }
}

fn list(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let accounts = store.accounts()?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
        return Ok(());
    }

    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut rows = Vec::new();
    for a in &accounts {
        *totals.entry(a.currency.clone()).or_default() += a.current_balance;
        rows.push(vec![
            a.number.clone(),
            a.currency.clone(),
            a.current_balance.round_dp(2).to_string(),
            a.last_sync_time
                .map(|t| t.to_string())
                .unwrap_or_else(|| "never".to_string()),
        ]);
    }
    for (ccy, total) in totals {
        rows.push(vec![
            "TOTAL".to_string(),
            ccy,
            total.round_dp(2).to_string(),
            String::new(),
        ]);
    }
    println!(
        "{}",
        pretty_table(&["Account", "CCY", "Balance", "Last sync"], rows)
    );
    Ok(())
}
