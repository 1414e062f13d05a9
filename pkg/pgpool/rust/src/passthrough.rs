// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Result, anyhow, bail};
use log::info;
use std::os::unix::process::CommandExt;
use std::process::Command;

/// Replace the current process with `command`, keeping the environment as is.
/// Only returns on failure.
pub fn exec(command: &[String]) -> Result<()> {
    let Some((program, args)) = command.split_first() else {
        bail!("no command to execute");
    };

    let mut cmd = Command::new(program);
    cmd.args(args);

    info!("pgpool disabled, executing {program}");
    let err = cmd.exec();
    Err(anyhow!("failed to exec {program}: {err}"))
}
