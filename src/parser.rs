// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{CanonicalTransaction, TxnKind};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

/// Per-message, recoverable failure. A batch never aborts on one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("unrecognized notification format")]
    UnrecognizedFormat,
    #[error("amount text '{0}' is not a valid decimal")]
    AmountUnparseable(String),
    #[error("transaction time missing or invalid")]
    TimeUnparseable,
}

/// Known notification templates. Classification picks exactly one variant,
/// extraction is an exhaustive match below, so adding a template extends
/// both in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Template {
    QuickPay,
    MerchantSpend,
    Spend,
    ReceiptWithBalance,
    Deposit,
    TransferOut,
    Activity,
}

// Shared pattern fragments. The account/time prefix covers both the
// "您账户*1234于..." and "您尾号8551的招行卡于..." phrasings.
const PREFIX: &str = r"您(?:账户|尾号)\*?(\d{2,6})(?:的[^于]{0,16})?于(\d{1,2})月(\d{1,2})日(\d{1,2}):(\d{2})";
const AMOUNT: &str = r"([0-9](?:[0-9,.]*[0-9])?)";
const CURRENCY: &str = r"(人民币|[A-Z]{3})?\s*";

static QUICK_PAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "{PREFIX}\\s*在(.+?)快捷支付{AMOUNT}元(?:,余额{AMOUNT})?"
    ))
    .expect("quick pay pattern")
});
static MERCHANT_SPEND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("{PREFIX}\\s*在(.+?)消费{CURRENCY}{AMOUNT}元?"))
        .expect("merchant spend pattern")
});
static SPEND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "{PREFIX}\\s*消费{CURRENCY}{AMOUNT}元?(?:,商户:\\s*([^,]+))?"
    ))
    .expect("spend pattern")
});
static DEPOSIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("{PREFIX}\\s*(?:入账|转入|存入){CURRENCY}{AMOUNT}元?"))
        .expect("deposit pattern")
});
static RECEIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("{PREFIX}\\s*收款{AMOUNT}元,余额{AMOUNT}(?:,备注:(.+))?"))
        .expect("receipt pattern")
});
static TRANSFER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("{PREFIX}\\s*向(.+?)转账{CURRENCY}{AMOUNT}元?"))
        .expect("transfer pattern")
});
static TRANSFER_NO_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("您向(.+?)转账{CURRENCY}{AMOUNT}元?")).expect("timeless transfer pattern")
});
static ACTIVITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("{PREFIX}\\s*(?:发生)?动账{CURRENCY}{AMOUNT}元?"))
        .expect("activity pattern")
});
static BALANCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"余额(?:为)?:?\s*([0-9](?:[0-9,.]*[0-9])?)").expect("balance pattern")
});

/// Turn one raw notification body into a canonical transaction.
///
/// Pure function: classification by discriminating token, then
/// variant-specific extraction over the normalized text. `received_at`
/// supplies the year the notice omits.
pub fn parse(
    raw_text: &str,
    received_at: NaiveDateTime,
) -> Result<CanonicalTransaction, ParseFailure> {
    let text = normalize(raw_text);
    let template = classify(&text).ok_or(ParseFailure::UnrecognizedFormat)?;
    let mut tx = match template {
        Template::QuickPay => extract_quick_pay(&text, received_at),
        Template::MerchantSpend => extract_merchant_spend(&text, received_at),
        Template::Spend => extract_spend(&text, received_at),
        Template::ReceiptWithBalance => extract_receipt(&text, received_at),
        Template::Deposit => extract_deposit(&text, received_at),
        Template::TransferOut => extract_transfer_out(&text, received_at),
        Template::Activity => extract_activity(&text, received_at),
    }?;
    if tx.balance_after.is_none() {
        tx.balance_after = sweep_balance(&text);
    }
    if tx.channel.is_none() {
        tx.channel = sweep_channel(&text);
    }
    tx.raw_text = raw_text.to_string();
    Ok(tx)
}

/// Unify newlines, trim each line onto one long line, and fold full-width
/// digits/punctuation to ASCII so a single pattern set matches both widths.
fn normalize(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let joined = unified
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    joined.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        '０'..='９' => char::from_u32(c as u32 - 0xFF10 + '0' as u32).unwrap_or(c),
        '：' => ':',
        '，' => ',',
        '．' => '.',
        '（' => '(',
        '）' => ')',
        '＊' => '*',
        '　' => ' ',
        _ => c,
    }
}

fn classify(text: &str) -> Option<Template> {
    if text.contains("快捷支付") {
        Some(Template::QuickPay)
    } else if text.contains("收款") && text.contains("余额") {
        Some(Template::ReceiptWithBalance)
    } else if text.contains("消费") {
        if MERCHANT_SPEND_RE.is_match(text) {
            Some(Template::MerchantSpend)
        } else {
            Some(Template::Spend)
        }
    } else if text.contains("入账") || text.contains("转入") || text.contains("存入") {
        Some(Template::Deposit)
    } else if text.contains("转账") {
        Some(Template::TransferOut)
    } else if text.contains("动账") {
        Some(Template::Activity)
    } else {
        None
    }
}

fn extract_quick_pay(
    text: &str,
    received_at: NaiveDateTime,
) -> Result<CanonicalTransaction, ParseFailure> {
    let caps = QUICK_PAY_RE
        .captures(text)
        .ok_or(ParseFailure::UnrecognizedFormat)?;
    let time = prefix_time(&caps, received_at)?;
    let amount = parse_amount(cap_str(&caps, 7))?;
    // Merchant chains read "provider-channel-merchant"; the tail names the
    // actual counterparty.
    let merchant_chain = cap_str(&caps, 6);
    let parts: Vec<&str> = merchant_chain.split('-').map(str::trim).collect();
    let counterparty = parts.last().map(|s| s.to_string());
    let channel = parts.get(1).map(|s| s.to_string());
    let balance_after = match caps.get(8) {
        Some(m) => Some(parse_amount(m.as_str())?),
        None => None,
    };
    Ok(CanonicalTransaction {
        account_hint: cap_str(&caps, 1).to_string(),
        time,
        kind: TxnKind::Expense,
        amount,
        currency: None,
        counterparty,
        channel,
        balance_after,
        raw_text: String::new(),
    })
}

fn extract_merchant_spend(
    text: &str,
    received_at: NaiveDateTime,
) -> Result<CanonicalTransaction, ParseFailure> {
    let caps = MERCHANT_SPEND_RE
        .captures(text)
        .ok_or(ParseFailure::UnrecognizedFormat)?;
    let time = prefix_time(&caps, received_at)?;
    let amount = parse_amount(cap_str(&caps, 8))?;
    Ok(CanonicalTransaction {
        account_hint: cap_str(&caps, 1).to_string(),
        time,
        kind: TxnKind::Expense,
        amount,
        currency: currency_code(caps.get(7).map(|m| m.as_str())),
        counterparty: non_empty(cap_str(&caps, 6)),
        channel: None,
        balance_after: None,
        raw_text: String::new(),
    })
}

fn extract_spend(
    text: &str,
    received_at: NaiveDateTime,
) -> Result<CanonicalTransaction, ParseFailure> {
    let caps = SPEND_RE
        .captures(text)
        .ok_or(ParseFailure::UnrecognizedFormat)?;
    let time = prefix_time(&caps, received_at)?;
    let amount = parse_amount(cap_str(&caps, 7))?;
    Ok(CanonicalTransaction {
        account_hint: cap_str(&caps, 1).to_string(),
        time,
        kind: TxnKind::Expense,
        amount,
        currency: currency_code(caps.get(6).map(|m| m.as_str())),
        counterparty: caps.get(8).and_then(|m| non_empty(m.as_str())),
        channel: None,
        balance_after: None,
        raw_text: String::new(),
    })
}

fn extract_receipt(
    text: &str,
    received_at: NaiveDateTime,
) -> Result<CanonicalTransaction, ParseFailure> {
    let caps = RECEIPT_RE
        .captures(text)
        .ok_or(ParseFailure::UnrecognizedFormat)?;
    let time = prefix_time(&caps, received_at)?;
    let amount = parse_amount(cap_str(&caps, 6))?;
    let balance_after = Some(parse_amount(cap_str(&caps, 7))?);
    // Remarks read "provider-payer-method"; the middle token is the payer.
    let (counterparty, channel) = match caps.get(8).map(|m| m.as_str().trim()) {
        Some(remark) => {
            let parts: Vec<&str> = remark.split('-').map(str::trim).collect();
            if parts.len() >= 2 {
                (
                    Some(parts[1].to_string()),
                    parts.get(2).map(|s| s.to_string()),
                )
            } else {
                (non_empty(remark), None)
            }
        }
        None => (None, None),
    };
    Ok(CanonicalTransaction {
        account_hint: cap_str(&caps, 1).to_string(),
        time,
        kind: TxnKind::Income,
        amount,
        currency: None,
        counterparty,
        channel,
        balance_after,
        raw_text: String::new(),
    })
}

fn extract_deposit(
    text: &str,
    received_at: NaiveDateTime,
) -> Result<CanonicalTransaction, ParseFailure> {
    let caps = DEPOSIT_RE
        .captures(text)
        .ok_or(ParseFailure::UnrecognizedFormat)?;
    let time = prefix_time(&caps, received_at)?;
    let amount = parse_amount(cap_str(&caps, 7))?;
    Ok(CanonicalTransaction {
        account_hint: cap_str(&caps, 1).to_string(),
        time,
        kind: TxnKind::Income,
        amount,
        currency: currency_code(caps.get(6).map(|m| m.as_str())),
        counterparty: None,
        channel: None,
        balance_after: None,
        raw_text: String::new(),
    })
}

fn extract_transfer_out(
    text: &str,
    received_at: NaiveDateTime,
) -> Result<CanonicalTransaction, ParseFailure> {
    let caps = match TRANSFER_RE.captures(text) {
        Some(caps) => caps,
        // A transfer notice without the account/time prefix carries no event
        // time at all, which is a time failure rather than an unknown format.
        None if TRANSFER_NO_TIME_RE.is_match(text) => return Err(ParseFailure::TimeUnparseable),
        None => return Err(ParseFailure::UnrecognizedFormat),
    };
    let time = prefix_time(&caps, received_at)?;
    let amount = parse_amount(cap_str(&caps, 8))?;
    Ok(CanonicalTransaction {
        account_hint: cap_str(&caps, 1).to_string(),
        time,
        kind: TxnKind::Transfer,
        amount,
        currency: currency_code(caps.get(7).map(|m| m.as_str())),
        counterparty: non_empty(cap_str(&caps, 6)),
        channel: None,
        balance_after: None,
        raw_text: String::new(),
    })
}

fn extract_activity(
    text: &str,
    received_at: NaiveDateTime,
) -> Result<CanonicalTransaction, ParseFailure> {
    let caps = ACTIVITY_RE
        .captures(text)
        .ok_or(ParseFailure::UnrecognizedFormat)?;
    let time = prefix_time(&caps, received_at)?;
    let amount = parse_amount(cap_str(&caps, 7))?;
    Ok(CanonicalTransaction {
        account_hint: cap_str(&caps, 1).to_string(),
        time,
        // The notice states movement but no direction; downstream must
        // tolerate this rather than the parser guessing.
        kind: TxnKind::Unknown,
        amount,
        currency: currency_code(caps.get(6).map(|m| m.as_str())),
        counterparty: None,
        channel: None,
        balance_after: None,
        raw_text: String::new(),
    })
}

fn cap_str<'t>(caps: &regex::Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map(|m| m.as_str()).unwrap_or("")
}

fn prefix_time(
    caps: &regex::Captures<'_>,
    received_at: NaiveDateTime,
) -> Result<NaiveDateTime, ParseFailure> {
    let month: u32 = cap_str(caps, 2)
        .parse()
        .map_err(|_| ParseFailure::TimeUnparseable)?;
    let day: u32 = cap_str(caps, 3)
        .parse()
        .map_err(|_| ParseFailure::TimeUnparseable)?;
    let hour: u32 = cap_str(caps, 4)
        .parse()
        .map_err(|_| ParseFailure::TimeUnparseable)?;
    let minute: u32 = cap_str(caps, 5)
        .parse()
        .map_err(|_| ParseFailure::TimeUnparseable)?;
    // Notices omit the year. Take it from the receive time; a notice month
    // later than the receive month means the event crossed a year boundary.
    let mut year = received_at.year();
    if month > received_at.month() {
        year -= 1;
    }
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or(ParseFailure::TimeUnparseable)
}

/// Strip thousands separators and parse as an exact decimal. Amounts are
/// magnitudes; the regexes cannot capture a sign.
fn parse_amount(s: &str) -> Result<Decimal, ParseFailure> {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<Decimal>()
        .map_err(|_| ParseFailure::AmountUnparseable(s.to_string()))
}

fn currency_code(m: Option<&str>) -> Option<String> {
    match m {
        Some("人民币") => Some("CNY".to_string()),
        Some(code) if !code.is_empty() => Some(code.to_string()),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

/// Best-effort recovery of a stated balance anywhere in the text.
fn sweep_balance(text: &str) -> Option<Decimal> {
    BALANCE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_amount(m.as_str()).ok())
}

fn sweep_channel(text: &str) -> Option<String> {
    if text.contains("微信支付") || text.contains("财付通") {
        Some("微信支付".to_string())
    } else if text.contains("支付宝") {
        Some("支付宝".to_string())
    } else {
        None
    }
}
