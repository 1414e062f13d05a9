// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Supervisor that runs an application next to a local pgpool-II and keeps the
//! two alive and dead together.

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod passthrough;
pub mod pgpool_conf;
pub mod process;
pub mod signal;
pub mod state;

pub use config::Settings;
pub use coordinator::{Coordinator, Report};
pub use process::{CompletionEvent, LaunchSpec, ManagedProcess, Role};
pub use signal::{ShutdownTrigger, SignalBridge};
