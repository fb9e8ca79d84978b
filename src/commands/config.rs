// Copyright (c) 2025 Passbook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{Store, TransferPolicy};
use crate::utils::{
    get_home_currency, get_transfer_policy, set_home_currency, set_transfer_policy,
};
use anyhow::Result;

pub fn handle(store: &Store, m: &clap::ArgMatches) -> Result<()> {
    let conn = store.connection();
    match m.subcommand() {
        Some(("show", _)) => {
            println!("home_currency   = {}", get_home_currency(conn)?);
            println!("transfer_policy = {}", get_transfer_policy(conn)?.as_str());
        }
        Some(("set-currency", sub)) => {
            let ccy = sub.get_one::<String>("currency").unwrap().to_uppercase();
            set_home_currency(conn, &ccy)?;
            println!("Home currency set to {}", ccy);
        }
        Some(("set-transfer-policy", sub)) => {
            let policy = TransferPolicy::from_str_lossy(sub.get_one::<String>("policy").unwrap());
            set_transfer_policy(conn, policy)?;
            println!("Transfer policy set to {}", policy.as_str());
        }
        _ => {}
    }
    Ok(())
}
