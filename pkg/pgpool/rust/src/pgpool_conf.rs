// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Rendering of the files pgpool-II reads at startup: `pgpool.conf`,
//! `pool_hba.conf` and `pool_passwd`.

use crate::config::{Backend, Settings};
use crate::errors::ConfigError;
use log::info;
use md5::{Digest, Md5};
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

const PREAMBLE: &str = "\
socket_dir = '/tmp'
pcp_socket_dir = '/tmp'
ssl = on
pid_file_name = '/tmp/pgpool.pid'
logdir = '/tmp'
";

const DEBUG_LOGGING: &str = "
log_destination        = 'stderr'
log_statement          = 'on'
log_per_node_statement = 'on'
";

const POOL_HBA: &str = "\
local   all             all                                     trust
host    all             all             127.0.0.1/32            trust
";

pub fn render_pgpool_conf(settings: &Settings) -> String {
    let mut conf = String::from(PREAMBLE);

    if let Some(primary) = settings.primary() {
        let user = &primary.url.user;
        let database = &primary.url.database;
        let pool = &settings.pool;
        conf.push_str(&format!(
            "
backend_clustering_mode       = 'streaming_replication'
disable_load_balance_on_write = 'transaction'

load_balance_mode = 'on'
enable_pool_hba = 'on'

max_pool = {max_pool}
num_init_children = {num_children}

failover_on_backend_shutdown = 'off'
failover_on_backend_error = 'off'

sr_check_user     = '{user}'
sr_check_database = '{database}'
sr_check_period   = 30

health_check_user     = '{user}'
health_check_database = '{database}'

health_check_period      = 5
health_check_timeout     = 30
health_check_max_retries = 9999
health_check_retry_delay = 1

statement_level_load_balance = '{load_balance}'
allow_sql_comments = true
",
            max_pool = pool.max_pool,
            num_children = pool.num_init_children,
            load_balance = pool.statement_load_balance,
        ));

        if settings.debug {
            conf.push_str(DEBUG_LOGGING);
        }
    }

    for (i, backend) in settings.backends.iter().enumerate() {
        render_backend(&mut conf, i, backend);
    }

    conf
}

fn render_backend(conf: &mut String, i: usize, backend: &Backend) {
    let host = &backend.url.host;
    conf.push_str(&format!(
        "
backend_hostname{i}         = '{host}'
backend_application_name{i} = 'server{host}'
backend_port{i}             = {port}
backend_weight{i}           = {weight}
backend_flag{i}             = '{flag}'
backend_data_directory{i}   = 'data{i}'
",
        port = backend.url.port,
        weight = backend.weight,
        flag = backend.flag,
    ));
}

pub fn render_pool_hba() -> &'static str {
    POOL_HBA
}

/// One `user:md5<digest>` line per backend, where the digest is
/// `md5(password + user)` as pgpool expects.
pub fn render_pool_passwd(backends: &[Backend]) -> String {
    let mut passwd = String::new();
    for backend in backends {
        let user = &backend.url.user;
        let digest = Md5::digest(format!("{}{user}", backend.url.password));
        passwd.push_str(&format!("{user}:md5{digest:x}\n"));
    }
    passwd
}

/// Write pool_hba.conf, pgpool.conf and pool_passwd to their targets.
pub fn write_all(settings: &Settings) -> Result<(), ConfigError> {
    write_private(&settings.targets.hba, render_pool_hba())?;
    write_private(&settings.targets.config, &render_pgpool_conf(settings))?;
    write_private(
        &settings.targets.passwd,
        &render_pool_passwd(&settings.backends),
    )?;
    Ok(())
}

fn write_private(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let to_err = |source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    };
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(to_err)?;
    file.write_all(contents.as_bytes()).map_err(to_err)?;
    info!("wrote {}", path.display());
    Ok(())
}
