// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use passbook::identity::stable_id;
use passbook::models::{CanonicalTransaction, TxnKind};

fn sample() -> CanonicalTransaction {
    CanonicalTransaction {
        account_hint: "8551".to_string(),
        time: NaiveDate::from_ymd_opt(2025, 12, 1)
            .unwrap()
            .and_hms_opt(10, 23, 0)
            .unwrap(),
        kind: TxnKind::Expense,
        amount: "128.50".parse().unwrap(),
        currency: Some("CNY".to_string()),
        counterparty: Some("星巴克".to_string()),
        channel: None,
        balance_after: None,
        raw_text: "您尾号8551的招行卡于12月01日10:23消费人民币128.50元".to_string(),
    }
}

#[test]
fn bit_identical_records_produce_identical_ids() {
    assert_eq!(stable_id(&sample(), "cmb_email"), stable_id(&sample(), "cmb_email"));
}

#[test]
fn fetch_dependent_fields_do_not_affect_the_id() {
    let base = sample();
    let mut refetched = sample();
    refetched.raw_text = "re-fetched body with different framing".to_string();
    refetched.balance_after = Some("99999.99".parse().unwrap());
    refetched.channel = Some("微信支付".to_string());
    assert_eq!(stable_id(&base, "cmb_email"), stable_id(&refetched, "cmb_email"));
}

#[test]
fn identity_fields_each_change_the_id() {
    let base_id = stable_id(&sample(), "cmb_email");

    let mut other = sample();
    other.amount = "128.51".parse().unwrap();
    assert_ne!(base_id, stable_id(&other, "cmb_email"));

    let mut other = sample();
    other.counterparty = Some("肯德基".to_string());
    assert_ne!(base_id, stable_id(&other, "cmb_email"));

    let mut other = sample();
    other.kind = TxnKind::Income;
    assert_ne!(base_id, stable_id(&other, "cmb_email"));

    assert_ne!(base_id, stable_id(&sample(), "other_source"));
}

#[test]
fn trailing_zeros_in_the_amount_do_not_split_identity() {
    let mut other = sample();
    other.amount = "128.5".parse().unwrap();
    assert_eq!(stable_id(&sample(), "cmb_email"), stable_id(&other, "cmb_email"));
}

#[test]
fn missing_counterparty_is_distinct_but_stable() {
    let mut no_cp = sample();
    no_cp.counterparty = None;
    let id = stable_id(&no_cp, "cmb_email");
    assert_ne!(id, stable_id(&sample(), "cmb_email"));
    assert_eq!(id, stable_id(&no_cp, "cmb_email"));
}
