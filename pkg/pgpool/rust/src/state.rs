// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::process::Role;
use std::fmt;

/// What moved the unit out of `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// SIGTERM received by the supervisor.
    Requested,
    /// One of the two processes exited first.
    Exited(Role),
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownCause::Requested => write!(f, "shutdown requested"),
            ShutdownCause::Exited(role) => write!(f, "{role} exited"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Launching pgpool, then the application.
    Starting,
    /// Both processes are alive.
    Running,
    /// Waiting for whatever is still alive to exit.
    ShuttingDown(ShutdownCause),
    /// Both processes have been waited on.
    Terminated,
}

impl State {
    pub fn is_shutting_down(self) -> bool {
        matches!(self, State::ShuttingDown(_))
    }

    pub(crate) fn can_transition_to(self, next: State) -> bool {
        use State::*;
        matches!(
            (self, next),
            (Starting, Running) | (Running, ShuttingDown(_)) | (ShuttingDown(_), Terminated)
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Starting => write!(f, "starting"),
            State::Running => write!(f, "running"),
            State::ShuttingDown(cause) => write!(f, "shutting down ({cause})"),
            State::Terminated => write!(f, "terminated"),
        }
    }
}
