// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxnKind;
use crate::store::{QueryFilter, Store, StoreError};
use crate::utils::{maybe_print_json, parse_month, pretty_table};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

// Reports are pure projections over Store::query; they never touch rows
// through any other path.
const PAGE_SIZE: usize = 500;

#[derive(Debug, Serialize)]
pub struct CounterpartySpend {
    pub name: String,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct MonthReport {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    pub top_counterparties: Vec<CounterpartySpend>,
}

pub fn handle(store: &Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("month", sub)) => month(store, sub),
        _ => Ok(()),
    }
}

/// Totals for one calendar month, walking every stored page so the sums
/// stay exact no matter how large the history grows.
pub fn summarize_month(
    store: &Store,
    month: &str,
    top_n: usize,
) -> Result<MonthReport, StoreError> {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    let mut by_counterparty: HashMap<String, Decimal> = HashMap::new();
    let mut offset = 0;
    loop {
        let page = store.query(&QueryFilter {
            limit: PAGE_SIZE,
            offset,
            ..QueryFilter::default()
        })?;
        let fetched = page.len();
        for t in page
            .iter()
            .filter(|t| t.time.format("%Y-%m").to_string() == month)
        {
            match t.kind {
                TxnKind::Income => income += t.amount,
                TxnKind::Expense => {
                    expense += t.amount;
                    if let Some(name) = &t.counterparty {
                        *by_counterparty.entry(name.clone()).or_default() += t.amount;
                    }
                }
                TxnKind::Transfer | TxnKind::Unknown => {}
            }
        }
        if fetched < PAGE_SIZE {
            break;
        }
        offset += fetched;
    }

    let mut ranked: Vec<CounterpartySpend> = by_counterparty
        .into_iter()
        .map(|(name, total)| CounterpartySpend { name, total })
        .collect();
    ranked.sort_by(|a, b| b.total.cmp(&a.total).then(a.name.cmp(&b.name)));
    ranked.truncate(top_n);

    Ok(MonthReport {
        net: income - expense,
        month: month.to_string(),
        income,
        expense,
        top_counterparties: ranked,
    })
}

fn month(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let top_n = *sub.get_one::<usize>("top").unwrap();
    let report = summarize_month(store, &month, top_n)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }

    let mut rows = vec![
        vec!["Income".to_string(), report.income.round_dp(2).to_string()],
        vec!["Expense".to_string(), report.expense.round_dp(2).to_string()],
        vec!["Net".to_string(), report.net.round_dp(2).to_string()],
    ];
    for c in &report.top_counterparties {
        rows.push(vec![
            format!("  {}", c.name),
            c.total.round_dp(2).to_string(),
        ]);
    }
    let header = format!("Month {}", report.month);
    println!("{}", pretty_table(&[header.as_str(), "Amount"], rows));
    Ok(())
}
