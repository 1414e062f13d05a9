// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use simple_logger::SimpleLogger;
use start_pgpool::config::{self, DATABASE_URL_VAR};
use start_pgpool::{Coordinator, LaunchSpec, Settings, ShutdownTrigger, SignalBridge};
use start_pgpool::{passthrough, pgpool_conf};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    SimpleLogger::new()
        .with_level(config::log_level_from_env().to_level_filter())
        .with_utc_timestamps()
        .init()?;
    info!(
        "start-pgpool starting (version {})",
        env!("CARGO_PKG_VERSION")
    );

    let settings = Settings::from_env()?;

    if !settings.enabled {
        return passthrough::exec(&args.command);
    }

    pgpool_conf::write_all(&settings).context("failed to configure pgpool")?;
    let database_url = settings
        .primary()
        .map(|b| b.url.local_database_url())
        .context("no backend configured")?;

    let trigger = ShutdownTrigger::new();
    let bridge = SignalBridge::install()?.spawn(trigger.clone());

    let proxy = LaunchSpec::proxy(&settings.pgpool_command, settings.pgpool_args());
    let app = LaunchSpec::application(
        args.program(),
        args.program_args(),
        DATABASE_URL_VAR,
        database_url,
    );
    let report = Coordinator::launch(&proxy, &app)?.run(trigger).await;
    bridge.abort();

    if !report.all_succeeded() {
        warn!(
            "pgpool: {}, app: {}",
            report.proxy.failure.as_deref().unwrap_or("ok"),
            report.application.failure.as_deref().unwrap_or("ok")
        );
    }
    match report.cause {
        Some(cause) => info!("start-pgpool shutting down ({cause})"),
        None => info!("start-pgpool shutting down"),
    }
    Ok(())
}
