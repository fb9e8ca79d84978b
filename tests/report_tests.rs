// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use passbook::commands::reports::summarize_month;
use passbook::models::{Transaction, TxnKind};
use passbook::store::Store;
use rust_decimal::Decimal;

fn at(month: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, month, d)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn tx(id: &str, account_id: i64, time: NaiveDateTime, kind: TxnKind, amount: &str) -> Transaction {
    Transaction {
        id: id.to_string(),
        account_id,
        time,
        kind,
        amount: dec(amount),
        currency: "CNY".to_string(),
        counterparty: Some("星巴克".to_string()),
        channel: None,
        balance_after: None,
        raw_text: "raw".to_string(),
    }
}

#[test]
fn monthly_totals_cover_every_stored_page() {
    let store = Store::open_in_memory().unwrap();
    let account = store.ensure_account("8551", "CNY").unwrap();
    // Well past one query page, so truncation would show up in the sums.
    for i in 0..1203 {
        let t = tx(
            &format!("exp-{i:04}"),
            account,
            at(12, 1 + (i % 28)),
            TxnKind::Expense,
            "1.00",
        );
        store.upsert_transaction(&t).unwrap();
    }
    store
        .upsert_transaction(&tx("inc-0", account, at(12, 5), TxnKind::Income, "2000.00"))
        .unwrap();
    // A neighboring month must stay out of the totals.
    store
        .upsert_transaction(&tx("other-0", account, at(11, 5), TxnKind::Expense, "999.00"))
        .unwrap();

    let report = summarize_month(&store, "2025-12", 5).unwrap();
    assert_eq!(report.income, dec("2000.00"));
    assert_eq!(report.expense, dec("1203.00"));
    assert_eq!(report.net, dec("797.00"));
    assert_eq!(report.top_counterparties.len(), 1);
    assert_eq!(report.top_counterparties[0].name, "星巴克");
    assert_eq!(report.top_counterparties[0].total, dec("1203.00"));
}

#[test]
fn top_counterparties_rank_by_spend_then_name() {
    let store = Store::open_in_memory().unwrap();
    let account = store.ensure_account("8551", "CNY").unwrap();
    for (id, name, amount) in [
        ("t1", "星巴克", "30.00"),
        ("t2", "美团", "80.00"),
        ("t3", "星巴克", "50.00"),
        ("t4", "滴滴", "15.00"),
    ] {
        let mut t = tx(id, account, at(12, 2), TxnKind::Expense, amount);
        t.counterparty = Some(name.to_string());
        store.upsert_transaction(&t).unwrap();
    }

    // 星巴克 and 美团 tie at 80.00; the tie breaks on the name.
    let report = summarize_month(&store, "2025-12", 2).unwrap();
    let names: Vec<&str> = report
        .top_counterparties
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["星巴克", "美团"]);
    assert_eq!(report.top_counterparties[0].total, dec("80.00"));
}
