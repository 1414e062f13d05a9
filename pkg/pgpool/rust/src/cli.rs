// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use clap::Parser;

/// Run an application alongside a local pgpool-II, starting and stopping both together.
#[derive(Debug, Parser)]
#[command(name = "start-pgpool", version)]
pub struct Args {
    /// Application command followed by its arguments, passed through verbatim.
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

impl Args {
    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    pub fn program_args(&self) -> Vec<String> {
        self.command.iter().skip(1).cloned().collect()
    }
}
