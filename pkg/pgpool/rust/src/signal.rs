// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result};
use log::{debug, info};
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One-shot "begin shutting down" event. Firing more than once has no further
/// effect; every observer sees a single transition.
#[derive(Debug, Clone, Default)]
pub struct ShutdownTrigger {
    token: CancellationToken,
}

impl ShutdownTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true for the call that actually fired the trigger.
    pub fn fire(&self) -> bool {
        let first = !self.token.is_cancelled();
        self.token.cancel();
        first
    }

    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn fired(&self) {
        self.token.cancelled().await
    }
}

/// Turns SIGTERM into a [`ShutdownTrigger`] and swallows SIGINT.
///
/// SIGINT gets a handler rather than `SIG_IGN`: an ignored disposition would be
/// inherited by the application across exec, while a caught one is reset to
/// the default there.
pub struct SignalBridge {
    sigterm: Signal,
    sigint: Signal,
}

impl SignalBridge {
    /// Register the handlers. Must run inside the runtime and before any child
    /// is spawned, so no signal arrives while the default disposition is active.
    pub fn install() -> Result<Self> {
        let sigterm = signal(SignalKind::terminate()).context("failed to setup SIGTERM handler")?;
        let sigint = signal(SignalKind::interrupt()).context("failed to setup SIGINT handler")?;
        Ok(Self { sigterm, sigint })
    }

    pub fn spawn(self, trigger: ShutdownTrigger) -> JoinHandle<()> {
        tokio::spawn(self.run(trigger))
    }

    async fn run(mut self, trigger: ShutdownTrigger) {
        loop {
            tokio::select! {
                received = self.sigterm.recv() => {
                    if received.is_none() {
                        return;
                    }
                    if trigger.fire() {
                        info!("received SIGTERM");
                    } else {
                        debug!("received SIGTERM again, shutdown already in progress");
                    }
                }
                received = self.sigint.recv() => {
                    if received.is_none() {
                        return;
                    }
                    debug!("ignoring SIGINT");
                }
            }
        }
    }
}
