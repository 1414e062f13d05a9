// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Joint lifecycle of pgpool and the application.
//!
//! Three watchers run once both processes are up:
//! - SIGTERM to the supervisor is forwarded to the application only;
//! - when the application exits, pgpool is sent SIGTERM;
//! - when pgpool exits, the application is sent SIGTERM.
//!
//! [`Coordinator::run`] returns only after both processes have been waited on.

use crate::errors::LaunchError;
use crate::process::{CompletionEvent, LaunchSpec, ManagedProcess, Role, Supervised, Terminate};
use crate::signal::ShutdownTrigger;
use crate::state::{ShutdownCause, State};
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// How the unit ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub proxy: CompletionEvent,
    pub application: CompletionEvent,
    /// First observation that ended `Running`.
    pub cause: Option<ShutdownCause>,
}

impl Report {
    pub fn all_succeeded(&self) -> bool {
        self.proxy.is_success() && self.application.is_success()
    }
}

pub struct Coordinator<P: Supervised, A: Supervised> {
    proxy: P,
    app: A,
    state: Arc<watch::Sender<State>>,
}

impl Coordinator<ManagedProcess, ManagedProcess> {
    /// Start pgpool, then the application. If the application cannot be
    /// started, pgpool is sent SIGTERM before the error is returned.
    pub fn launch(proxy: &LaunchSpec, app: &LaunchSpec) -> Result<Self, LaunchError> {
        info!("{}", State::Starting);
        let proxy = ManagedProcess::spawn(proxy)?;
        let app = match ManagedProcess::spawn(app) {
            Ok(app) => app,
            Err(e) => {
                proxy.terminator().terminate();
                return Err(e);
            }
        };
        Ok(Self::new(proxy, app))
    }
}

impl<P: Supervised, A: Supervised> Coordinator<P, A> {
    pub fn new(proxy: P, app: A) -> Self {
        let (state, _) = watch::channel(State::Starting);
        let state = Arc::new(state);
        advance(&state, State::Running);
        Self { proxy, app, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    pub async fn run(self, trigger: ShutdownTrigger) -> Report {
        let Coordinator { proxy, app, state } = self;

        let (proxy_done_tx, proxy_done) = watch::channel(None);
        let (app_done_tx, app_done) = watch::channel(None);
        let proxy_term = proxy.terminator();
        let app_term = app.terminator();

        let mut watchers = JoinSet::new();
        watchers.spawn(forward_shutdown(
            trigger,
            app_term.clone(),
            Completion(app_done.clone()),
            Arc::clone(&state),
        ));
        watchers.spawn(watch_exit(
            app,
            app_done_tx,
            proxy_term,
            Completion(proxy_done.clone()),
            Arc::clone(&state),
        ));
        watchers.spawn(watch_exit(
            proxy,
            proxy_done_tx,
            app_term,
            Completion(app_done.clone()),
            Arc::clone(&state),
        ));

        while let Some(joined) = watchers.join_next().await {
            if let Err(e) = joined {
                error!("watcher task failed: {e}");
            }
        }

        let cause = match *state.borrow() {
            State::ShuttingDown(cause) => Some(cause),
            _ => None,
        };
        advance(&state, State::Terminated);

        Report {
            proxy: completion_or_lost(&proxy_done, Role::Proxy),
            application: completion_or_lost(&app_done, Role::Application),
            cause,
        }
    }
}

/// One-shot, multi-observer view of a process having exited.
#[derive(Clone)]
struct Completion(watch::Receiver<Option<CompletionEvent>>);

impl Completion {
    fn is_done(&self) -> bool {
        self.0.borrow().is_some()
    }

    async fn wait(&mut self) {
        // An error means the watcher went away without reporting; nothing more
        // will ever arrive, so treat it as done.
        let _ = self.0.wait_for(Option::is_some).await;
    }
}

fn completion_or_lost(rx: &watch::Receiver<Option<CompletionEvent>>, role: Role) -> CompletionEvent {
    rx.borrow()
        .clone()
        .unwrap_or_else(|| CompletionEvent::failed(role, "watcher exited without a result"))
}

fn advance(state: &watch::Sender<State>, next: State) -> bool {
    state.send_if_modified(|current| {
        if !current.can_transition_to(next) {
            return false;
        }
        info!("{current} -> {next}");
        *current = next;
        true
    })
}

async fn forward_shutdown<T: Terminate>(
    trigger: ShutdownTrigger,
    app: T,
    mut app_done: Completion,
    state: Arc<watch::Sender<State>>,
) {
    tokio::select! {
        _ = trigger.fired() => {
            if app_done.is_done() {
                debug!("shutdown requested after {} exited", Role::Application);
                return;
            }
            advance(&state, State::ShuttingDown(ShutdownCause::Requested));
            app.terminate();
        }
        _ = app_done.wait() => {}
    }
}

async fn watch_exit<S: Supervised, T: Terminate>(
    mut proc: S,
    done: watch::Sender<Option<CompletionEvent>>,
    other: T,
    other_done: Completion,
    state: Arc<watch::Sender<State>>,
) {
    let role = proc.role();
    let event = proc.wait().await;
    done.send_replace(Some(event));
    advance(&state, State::ShuttingDown(ShutdownCause::Exited(role)));

    if other_done.is_done() {
        debug!("[{role}] exited last");
    } else {
        other.terminate();
    }
}
