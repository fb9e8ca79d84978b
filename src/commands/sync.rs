// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::Store;
use crate::sync::{MessageSource, RawMessage, SourceError, SyncConfig, run_sync};
use crate::utils::{get_home_currency, get_transfer_policy, maybe_print_json, parse_date};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

// Re-fetch slightly behind the checkpoint to tolerate clock skew and late
// delivery; dedup makes the overlap harmless.
const WINDOW_OVERLAP_HOURS: i64 = 1;

/// Mailbox stand-in: a directory of `*.txt` notification bodies, with file
/// mtime as the received-at timestamp.
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> DirSource {
        DirSource { dir: dir.into() }
    }
}

impl MessageSource for DirSource {
    fn fetch_messages(
        &mut self,
        since: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<RawMessage>, SourceError> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_txt = path
                .extension()
                .and_then(|s| s.to_str())
                .map(|s| s.eq_ignore_ascii_case("txt"))
                .unwrap_or(false);
            if !is_txt {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            let received_at = DateTime::<Local>::from(modified).naive_local();
            if received_at < since || received_at > until {
                continue;
            }
            out.push(RawMessage {
                raw_text: fs::read_to_string(&path)?,
                received_at,
            });
        }
        Ok(out)
    }
}

pub fn handle(store: &Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("run", sub)) => run(store, sub),
        _ => Ok(()),
    }
}

fn run(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let until = match sub.get_one::<String>("until") {
        Some(s) => parse_date(s)?
            .and_hms_opt(23, 59, 59)
            .context("Invalid window end")?,
        None => Local::now().naive_local(),
    };
    let days = *sub.get_one::<i64>("days").unwrap();
    let since = match sub.get_one::<String>("since") {
        Some(s) => parse_date(s)?
            .and_hms_opt(0, 0, 0)
            .context("Invalid window start")?,
        None => match store.earliest_checkpoint()? {
            Some(checkpoint) => checkpoint - Duration::hours(WINDOW_OVERLAP_HOURS),
            None => until - Duration::days(days),
        },
    };

    let conn = store.connection();
    let cfg = SyncConfig {
        source_tag: sub.get_one::<String>("source-tag").unwrap().clone(),
        default_currency: get_home_currency(conn)?,
        transfer_policy: get_transfer_policy(conn)?,
        dry_run: sub.get_flag("dry-run"),
    };
    let mut source = DirSource::new(sub.get_one::<String>("mailbox").unwrap());
    let report = run_sync(store, &mut source, &cfg, since, until)?;

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        println!(
            "{}Fetched {} message(s): {} inserted, {} duplicate(s), {} parse failure(s)",
            if cfg.dry_run { "[dry run] " } else { "" },
            report.fetched,
            report.inserted,
            report.duplicates,
            report.parse_failures.len()
        );
        for reason in &report.parse_failures {
            println!("  ! {}", reason);
        }
    }
    Ok(())
}
