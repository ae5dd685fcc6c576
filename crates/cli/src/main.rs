// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use dcode::config::Config;
use dcode::run;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    if let Err(e) = run::init_tracing(&config) {
        eprintln!("error: {e:#}");
        std::process::exit(2);
    }

    if config.hook {
        if let Err(e) = run::run_hook(&config).await {
            error!("hook failed: {e:#}");
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
        return;
    }

    match run::run(config).await {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            error!("fatal: {e:#}");
            eprintln!("dcode: {e:#}");
            std::process::exit(1);
        }
    }
}
