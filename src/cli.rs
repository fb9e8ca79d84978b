// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("passbook")
        .about("Bank-notification sync ledger: ingest, dedup, balances")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("account")
                .about("Accounts discovered from notifications")
                .subcommand(json_flags(
                    Command::new("list").about("List accounts with balances and sync watermarks"),
                )),
        )
        .subcommand(
            Command::new("tx").about("Stored transactions").subcommand(
                json_flags(Command::new("list").about("List transactions, newest first"))
                    .arg(
                        Arg::new("account")
                            .long("account")
                            .help("Filter by account number (card suffix)"),
                    )
                    .arg(
                        Arg::new("type")
                            .long("type")
                            .value_parser(["income", "expense", "transfer", "unknown"])
                            .help("Filter by transaction type"),
                    )
                    .arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize))
                            .default_value("50"),
                    )
                    .arg(
                        Arg::new("offset")
                            .long("offset")
                            .value_parser(value_parser!(usize))
                            .default_value("0"),
                    ),
            ),
        )
        .subcommand(
            Command::new("sync")
                .about("Pull notifications and update the ledger")
                .subcommand(
                    json_flags(Command::new("run").about("Run one sync pass"))
                        .arg(
                            Arg::new("mailbox")
                                .long("mailbox")
                                .required(true)
                                .help("Directory of *.txt notification bodies"),
                        )
                        .arg(
                            Arg::new("since")
                                .long("since")
                                .help("Window start (YYYY-MM-DD); default: last checkpoint"),
                        )
                        .arg(
                            Arg::new("until")
                                .long("until")
                                .help("Window end (YYYY-MM-DD); default: now"),
                        )
                        .arg(
                            Arg::new("days")
                                .long("days")
                                .value_parser(value_parser!(i64))
                                .default_value("7")
                                .help("Window length when no checkpoint exists"),
                        )
                        .arg(
                            Arg::new("source-tag")
                                .long("source-tag")
                                .default_value("cmb_email"),
                        )
                        .arg(
                            Arg::new("dry-run")
                                .long("dry-run")
                                .action(ArgAction::SetTrue)
                                .help("Parse and report only; write nothing"),
                        ),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Read-only projections over stored transactions")
                .subcommand(
                    json_flags(Command::new("month").about("Monthly income/expense summary"))
                        .arg(Arg::new("month").long("month").required(true))
                        .arg(
                            Arg::new("top")
                                .long("top")
                                .value_parser(value_parser!(usize))
                                .default_value("5")
                                .help("How many counterparties to rank"),
                        ),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Ledger settings")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set-currency")
                        .about("Home currency for notices that state none")
                        .arg(Arg::new("currency").required(true)),
                )
                .subcommand(
                    Command::new("set-transfer-policy")
                        .about("Balance treatment for transfer notices")
                        .arg(
                            Arg::new("policy")
                                .required(true)
                                .value_parser(["ignore", "subtract"]),
                        ),
                ),
        )
}
