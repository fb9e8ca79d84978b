// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use passbook::models::TxnKind;
use passbook::parser::{ParseFailure, parse};
use rust_decimal::Decimal;

fn received(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn consumption_with_merchant_label() {
    let raw = "您尾号8551的招行卡于12月01日10:23消费人民币128.50元，商户：星巴克";
    let tx = parse(raw, received(2025, 12, 15)).unwrap();
    assert_eq!(tx.account_hint, "8551");
    assert_eq!(tx.time, at(2025, 12, 1, 10, 23));
    assert_eq!(tx.kind, TxnKind::Expense);
    assert_eq!(tx.amount, dec("128.50"));
    assert_eq!(tx.currency.as_deref(), Some("CNY"));
    assert_eq!(tx.counterparty.as_deref(), Some("星巴克"));
    assert_eq!(tx.raw_text, raw);
}

#[test]
fn quick_pay_extracts_merchant_chain_and_balance() {
    let raw = "您账户8551于02月21日19:25在财付通-微信支付-山月荟装扮快捷支付3.00元，余额100638.62";
    let tx = parse(raw, received(2025, 3, 1)).unwrap();
    assert_eq!(tx.kind, TxnKind::Expense);
    assert_eq!(tx.amount, dec("3.00"));
    assert_eq!(tx.counterparty.as_deref(), Some("山月荟装扮"));
    assert_eq!(tx.channel.as_deref(), Some("微信支付"));
    assert_eq!(tx.balance_after, Some(dec("100638.62")));
    assert_eq!(tx.time, at(2025, 2, 21, 19, 25));
}

#[test]
fn year_rolls_back_when_notice_month_is_ahead_of_receive_month() {
    let raw = "您账户1234于12月30日08:00消费99.00元";
    let tx = parse(raw, received(2026, 1, 2)).unwrap();
    assert_eq!(tx.time, at(2025, 12, 30, 8, 0));
}

#[test]
fn receipt_with_balance_and_remark() {
    let raw = "您账户1234于02月21日19:25收款200.00元，余额5200.00，备注：财付通-张子鸣-微信零钱提现";
    let tx = parse(raw, received(2025, 3, 1)).unwrap();
    assert_eq!(tx.kind, TxnKind::Income);
    assert_eq!(tx.amount, dec("200.00"));
    assert_eq!(tx.balance_after, Some(dec("5200.00")));
    assert_eq!(tx.counterparty.as_deref(), Some("张子鸣"));
    assert_eq!(tx.channel.as_deref(), Some("微信零钱提现"));
}

#[test]
fn deposit_with_explicit_currency() {
    let raw = "您账户1234于03月05日09:00入账CNY 1000.00";
    let tx = parse(raw, received(2025, 3, 6)).unwrap();
    assert_eq!(tx.kind, TxnKind::Income);
    assert_eq!(tx.amount, dec("1000.00"));
    assert_eq!(tx.currency.as_deref(), Some("CNY"));
    assert_eq!(tx.balance_after, None);
}

#[test]
fn transfer_with_time_prefix() {
    let raw = "您账户1234于03月05日09:00向李四转账人民币500元";
    let tx = parse(raw, received(2025, 3, 6)).unwrap();
    assert_eq!(tx.kind, TxnKind::Transfer);
    assert_eq!(tx.amount, dec("500"));
    assert_eq!(tx.counterparty.as_deref(), Some("李四"));
}

#[test]
fn transfer_without_time_is_a_time_failure() {
    let err = parse("您向李四转账500.00元", received(2025, 3, 6)).unwrap_err();
    assert_eq!(err, ParseFailure::TimeUnparseable);
}

#[test]
fn bare_activity_notice_maps_to_unknown_kind() {
    let raw = "您账户1234于03月05日09:00发生动账100.00元";
    let tx = parse(raw, received(2025, 3, 6)).unwrap();
    assert_eq!(tx.kind, TxnKind::Unknown);
    assert_eq!(tx.amount, dec("100.00"));
}

#[test]
fn unrelated_text_is_unrecognized() {
    let err = parse("Your OTP code is 123456", received(2025, 3, 6)).unwrap_err();
    assert_eq!(err, ParseFailure::UnrecognizedFormat);
}

#[test]
fn malformed_amount_is_reported_as_amount_failure() {
    let err = parse(
        "您账户1234于03月05日09:00消费128..5.0元",
        received(2025, 3, 6),
    )
    .unwrap_err();
    assert!(matches!(err, ParseFailure::AmountUnparseable(_)));
}

#[test]
fn impossible_calendar_date_is_a_time_failure() {
    let err = parse("您账户1234于02月30日09:00消费100元", received(2025, 6, 1)).unwrap_err();
    assert_eq!(err, ParseFailure::TimeUnparseable);
}

#[test]
fn full_width_digits_and_punctuation_fold_to_ascii() {
    let raw = "您账户１２３４于０３月０５日０９：２５消费１２８．５０元";
    let tx = parse(raw, received(2025, 3, 6)).unwrap();
    assert_eq!(tx.account_hint, "1234");
    assert_eq!(tx.time, at(2025, 3, 5, 9, 25));
    assert_eq!(tx.amount, dec("128.50"));
}

#[test]
fn thousands_separators_are_stripped() {
    let raw = "您账户1234于03月05日09:00入账1,234.56元";
    let tx = parse(raw, received(2025, 3, 6)).unwrap();
    assert_eq!(tx.amount, dec("1234.56"));
}

#[test]
fn balance_stated_outside_the_template_is_still_recovered() {
    let raw = "您账户1234于03月05日09:00在星巴克消费CNY 30.00，余额：2000.00";
    let tx = parse(raw, received(2025, 3, 6)).unwrap();
    assert_eq!(tx.counterparty.as_deref(), Some("星巴克"));
    assert_eq!(tx.balance_after, Some(dec("2000.00")));
}

#[test]
fn multiline_body_is_matched_after_normalization() {
    let raw = "尊敬的客户：\r\n您账户8551于02月21日19:25\n消费CNY 128.50\n【招商银行】";
    let tx = parse(raw, received(2025, 3, 1)).unwrap();
    assert_eq!(tx.kind, TxnKind::Expense);
    assert_eq!(tx.amount, dec("128.50"));
    assert_eq!(tx.raw_text, raw);
}
