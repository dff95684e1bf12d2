//! Browser end-to-end tests for YeetFile
//!
//! This crate drives a real Chromium instance against a running YeetFile
//! deployment and asserts on UI state, page titles, downloaded bytes and the
//! folder listing endpoints. It is a regression gate, not a resilient
//! client: every deviation is a hard failure and nothing retries.
//!
//! The harness has three pieces:
//!
//! - [`session::Session`] — the session fixture: one browser process, one
//!   isolated context per simulated actor, torn down at the end of the run.
//! - [`tab::Tab`] — a scenario's view of one tab: navigate, act on
//!   `data-testid` elements, assert visibility/text/titles, capture native
//!   downloads and auto-accept dialogs.
//! - [`runner::Suite`] — strictly sequential scenario execution with a JSON
//!   results file and the process exit code.
//!
//! The scenario scripts themselves live in the `harness = false` binaries
//! under `tests/`: `single_user`, `multi_user`, `pass_vault` and the manual
//! `debug` entry.

pub mod api;
pub mod config;
pub mod error;
pub mod flows;
pub mod runner;
pub mod session;
pub mod tab;

pub use config::Config;
pub use error::{ensure, E2eError, E2eResult};
pub use runner::Suite;
pub use session::{Actor, Session};
pub use tab::Tab;
