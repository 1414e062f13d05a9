// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::errors::LaunchError;
use async_trait::async_trait;
use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{Id, WaitPidFlag, waitid};
use nix::unistd::Pid;
use std::fmt;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::process::{Child, Command};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Proxy,
    Application,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Proxy => write!(f, "pgpool"),
            Role::Application => write!(f, "app"),
        }
    }
}

/// What to run and how to wire it up.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub role: Role,
    pub command: String,
    pub args: Vec<String>,
    /// Added on top of the inherited environment.
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    pub fn proxy(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            role: Role::Proxy,
            command: command.into(),
            args,
            env: Vec::new(),
        }
    }

    pub fn application(
        command: impl Into<String>,
        args: Vec<String>,
        database_url_var: &str,
        database_url: String,
    ) -> Self {
        Self {
            role: Role::Application,
            command: command.into(),
            args,
            env: vec![(database_url_var.to_string(), database_url)],
        }
    }
}

/// Result of waiting on a supervised process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    pub role: Role,
    /// `None` for a clean exit, otherwise a description of what went wrong.
    pub failure: Option<String>,
}

impl CompletionEvent {
    pub fn success(role: Role) -> Self {
        Self {
            role,
            failure: None,
        }
    }

    pub fn failed(role: Role, failure: impl Into<String>) -> Self {
        Self {
            role,
            failure: Some(failure.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Requests termination of a process. Must be cheap to clone and safe to call
/// any number of times, including after the process is gone.
pub trait Terminate: Clone + Send + Sync + 'static {
    fn terminate(&self);
}

/// A process owned by the coordinator.
#[async_trait]
pub trait Supervised: Send + 'static {
    type Terminator: Terminate;

    fn role(&self) -> Role;

    fn terminator(&self) -> Self::Terminator;

    /// Block until the process exits.
    async fn wait(&mut self) -> CompletionEvent;
}

pub struct ManagedProcess {
    role: Role,
    pid: u32,
    child: Child,
    /// Pid terminators may signal. Cleared before the child is reaped, so a
    /// signal never reaches a pid the kernel has handed out again.
    target: Arc<Mutex<Option<Pid>>>,
}

impl ManagedProcess {
    /// Start the process described by `spec`. stdout and stderr are always
    /// inherited. The application also inherits stdin and stays in our process
    /// group; pgpool gets its own group so terminal signals aimed at ours do not
    /// reach it.
    pub fn spawn(spec: &LaunchSpec) -> Result<Self, LaunchError> {
        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args);

        for (k, v) in &spec.env {
            cmd.env(k, v);
        }

        match spec.role {
            Role::Proxy => {
                cmd.process_group(0);
                cmd.stdin(Stdio::null());
            }
            Role::Application => {
                cmd.stdin(Stdio::inherit());
            }
        }
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            role: spec.role,
            command: spec.command.clone(),
            source,
        })?;

        let Some(pid) = child.id() else {
            return Err(LaunchError::NoPid {
                role: spec.role,
                command: spec.command.clone(),
            });
        };
        info!("[{}] spawned (pid={}, cmd={})", spec.role, pid, spec.command);
        Ok(Self {
            role: spec.role,
            pid,
            child,
            target: Arc::new(Mutex::new(Some(Pid::from_raw(pid as i32)))),
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

#[async_trait]
impl Supervised for ManagedProcess {
    type Terminator = PidTerminator;

    fn role(&self) -> Role {
        self.role
    }

    fn terminator(&self) -> PidTerminator {
        PidTerminator {
            role: self.role,
            target: Arc::clone(&self.target),
        }
    }

    async fn wait(&mut self) -> CompletionEvent {
        let pid = Pid::from_raw(self.pid as i32);
        match tokio::task::spawn_blocking(move || wait_exited(pid)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("[{}] waitid failed: {e}", self.role),
            Err(e) => debug!("[{}] waitid task failed: {e}", self.role),
        }
        lock(&self.target).take();

        match self.child.wait().await {
            Ok(status) if status.success() => {
                info!("[{}] exited with {status}", self.role);
                CompletionEvent::success(self.role)
            }
            Ok(status) => {
                warn!("[{}] exited with {status}", self.role);
                CompletionEvent::failed(self.role, status.to_string())
            }
            Err(e) => {
                warn!("[{}] failed to wait: {e}", self.role);
                CompletionEvent::failed(self.role, e.to_string())
            }
        }
    }
}

/// Block until `pid` has exited, leaving it unreaped.
fn wait_exited(pid: Pid) -> nix::Result<()> {
    loop {
        match waitid(Id::Pid(pid), WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT) {
            Err(Errno::EINTR) => continue,
            other => return other.map(drop),
        }
    }
}

fn lock(target: &Mutex<Option<Pid>>) -> MutexGuard<'_, Option<Pid>> {
    target.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sends SIGTERM to a supervised process. A process that already exited is not
/// an error.
#[derive(Debug, Clone)]
pub struct PidTerminator {
    role: Role,
    target: Arc<Mutex<Option<Pid>>>,
}

impl PidTerminator {
    /// Deliver `sig` unless the process has been reaped. Returns whether
    /// `kill` was called. The lock is held across `kill` so the pid cannot be
    /// reaped in between.
    pub fn send(&self, sig: Signal) -> nix::Result<bool> {
        let target = lock(&self.target);
        match *target {
            Some(pid) => signal::kill(pid, sig).map(|()| true),
            None => Ok(false),
        }
    }
}

impl Terminate for PidTerminator {
    fn terminate(&self) {
        match self.send(Signal::SIGTERM) {
            Ok(true) => info!("[{}] sent SIGTERM", self.role),
            Ok(false) => debug!("[{}] already reaped, SIGTERM not sent", self.role),
            Err(Errno::ESRCH) => debug!("[{}] already gone, SIGTERM not delivered", self.role),
            Err(e) => warn!("[{}] failed to send SIGTERM: {e}", self.role),
        }
    }
}
