// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxnKind;
use crate::store::{QueryFilter, Store};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Result, anyhow};
use std::collections::HashMap;

pub fn handle(store: &Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(store, sub),
        _ => Ok(()),
    }
}

fn list(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = match sub.get_one::<String>("account") {
        Some(number) => Some(
            store
                .account_by_number(number)?
                .ok_or_else(|| anyhow!("Account '{}' not found", number))?
                .id,
        ),
        None => None,
    };
    let filter = QueryFilter {
        account_id,
        kind: sub
            .get_one::<String>("type")
            .map(|s| TxnKind::from_str_lossy(s)),
        limit: *sub.get_one::<usize>("limit").unwrap(),
        offset: *sub.get_one::<usize>("offset").unwrap(),
    };
    let data = store.query(&filter)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }

    let numbers: HashMap<i64, String> = store
        .accounts()?
        .into_iter()
        .map(|a| (a.id, a.number))
        .collect();
    let rows: Vec<Vec<String>> = data
        .iter()
        .map(|t| {
            vec![
                t.time.to_string(),
                numbers.get(&t.account_id).cloned().unwrap_or_default(),
                t.kind.as_str().to_string(),
                t.amount.to_string(),
                t.currency.clone(),
                t.counterparty.clone().unwrap_or_default(),
                t.channel.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Time", "Account", "Type", "Amount", "CCY", "Counterparty", "Channel"],
            rows,
        )
    );
    Ok(())
}
