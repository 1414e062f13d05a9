// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::process::Role;
use thiserror::Error;

/// Configuration problems. All of them are fatal and are reported before any
/// process is launched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("PGPOOL_URLS is not set")]
    MissingUrls,
    #[error("{name} is not set")]
    MissingUrl { name: String },
    #[error("{name} is invalid")]
    InvalidUrl {
        name: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{name} has no host")]
    MissingHost { name: String },
    #[error("failed to write {path}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("[{role}] failed to spawn {command}")]
    Spawn {
        role: Role,
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("[{role}] {command} exited before its pid was known")]
    NoPid { role: Role, command: String },
}
