// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::backend::BackendUrl;
use crate::errors::ConfigError;
use log::debug;
use std::path::PathBuf;

pub const DEFAULT_PGPOOL_COMMAND: &str = "/app/.apt/usr/sbin/pgpool";
pub const PGPOOL_CONFIG_PATH: &str = "/app/vendor/pgpool/pgpool.conf";
pub const PGPOOL_HBA_PATH: &str = "/app/vendor/pgpool/pool_hba.conf";
pub const PGPOOL_PASSWD_PATH: &str = "/app/vendor/pgpool/pool_passwd";

/// Environment variable the application reads its connection string from.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Pool-wide settings, applied through the first backend's block in pgpool.conf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub statement_load_balance: String,
    pub max_pool: String,
    pub num_init_children: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    pub url: BackendUrl,
    pub weight: String,
    pub flag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    pub config: PathBuf,
    pub hba: PathBuf,
    pub passwd: PathBuf,
}

/// Everything the supervisor needs, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// False when `PGPOOL_ENABLED=0`: run the application without pgpool.
    pub enabled: bool,
    pub debug: bool,
    pub pool: PoolSettings,
    /// Empty when pgpool is disabled.
    pub backends: Vec<Backend>,
    pub targets: Targets,
    pub pgpool_command: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source. Empty values are
    /// treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let enabled = get("PGPOOL_ENABLED").is_none_or(|v| v != "0");
        let debug = get("PGPOOL_DEBUG").is_some();

        let pool = PoolSettings {
            statement_load_balance: or_default("PGPOOL_STATEMENT_LOAD_BALANCE", "off"),
            max_pool: or_default("PGPOOL_MAX_POOL", "4"),
            num_init_children: or_default("PGPOOL_NUM_INIT_CHILDREN", "32"),
        };

        let targets = Targets {
            config: PathBuf::from(or_default("PGPOOL_CONFIG_TARGET", PGPOOL_CONFIG_PATH)),
            hba: PathBuf::from(or_default("PGPOOL_HBA_TARGET", PGPOOL_HBA_PATH)),
            passwd: PathBuf::from(or_default("PGPOOL_PASSWD_TARGET", PGPOOL_PASSWD_PATH)),
        };

        let backends = if enabled {
            parse_backends(&get)?
        } else {
            debug!("PGPOOL_ENABLED=0, not reading backend URLs");
            Vec::new()
        };

        Ok(Self {
            enabled,
            debug,
            pool,
            backends,
            targets,
            pgpool_command: or_default("PGPOOL_COMMAND", DEFAULT_PGPOOL_COMMAND),
        })
    }

    /// The backend whose credentials the application and health checks use.
    pub fn primary(&self) -> Option<&Backend> {
        self.backends.first()
    }

    /// Arguments pgpool is started with. These always point at the fixed
    /// locations; the `*_TARGET` overrides only redirect where files are written.
    pub fn pgpool_args(&self) -> Vec<String> {
        ["-n", "-f", PGPOOL_CONFIG_PATH, "-a", PGPOOL_HBA_PATH]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn log_level(&self) -> log::Level {
        level_for(self.debug)
    }
}

/// Level selected by `PGPOOL_DEBUG` alone, so logging can be set up before the
/// backends are parsed.
pub fn log_level_from_env() -> log::Level {
    log_level_from(|key| std::env::var(key).ok())
}

pub fn log_level_from<F>(lookup: F) -> log::Level
where
    F: Fn(&str) -> Option<String>,
{
    level_for(lookup("PGPOOL_DEBUG").is_some_and(|v| !v.is_empty()))
}

fn level_for(debug: bool) -> log::Level {
    if debug {
        log::Level::Debug
    } else {
        log::Level::Info
    }
}

fn parse_backends<F>(get: &F) -> Result<Vec<Backend>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let names = get("PGPOOL_URLS").ok_or(ConfigError::MissingUrls)?;

    let mut backends = Vec::new();
    for (i, name) in names.split_whitespace().enumerate() {
        let raw = get(name).ok_or_else(|| ConfigError::MissingUrl {
            name: name.to_string(),
        })?;
        let url = BackendUrl::parse(name, &raw)?;
        debug!("backend{i}: {name} -> {}:{}", url.host, url.port);

        backends.push(Backend {
            url,
            weight: get(&format!("PGPOOL_BACKEND_NODE_{i}_WEIGHT")).unwrap_or_else(|| "1".into()),
            flag: get(&format!("PGPOOL_BACKEND_NODE_{i}_FLAG"))
                .unwrap_or_else(|| "ALLOW_TO_FAILOVER".into()),
        });
    }

    if backends.is_empty() {
        return Err(ConfigError::MissingUrls);
    }
    Ok(backends)
}
