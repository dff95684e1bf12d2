//! Sequential scenario runner
//!
//! Scenarios execute strictly in the order the suite binary lists them, one
//! at a time; later scenarios may consume values produced by earlier ones. A
//! failed scenario fails the run but does not stop it, except that scenarios
//! whose inputs are missing because a producer failed are recorded as
//! skipped rather than executed.

use std::future::Future;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::E2eResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
}

/// Outcome of one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a whole suite run, written to the artifacts directory.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteResult {
    pub suite: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

pub struct Suite {
    name: String,
    started: Instant,
    results: Vec<ScenarioResult>,
}

impl Suite {
    pub fn new(name: &str) -> Self {
        info!("running suite: {name}");
        Self {
            name: name.to_string(),
            started: Instant::now(),
            results: Vec::new(),
        }
    }

    /// Run one scenario to completion. Returns the scenario's value on
    /// success so later scenarios can consume it, `None` on failure.
    pub async fn run<T, F>(&mut self, name: &str, scenario: F) -> Option<T>
    where
        F: Future<Output = E2eResult<T>>,
    {
        let start = Instant::now();
        let outcome = scenario.await;
        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(value) => {
                info!("✓ {name} ({duration_ms} ms)");
                self.results.push(ScenarioResult {
                    name: name.to_string(),
                    status: ScenarioStatus::Passed,
                    duration_ms,
                    error: None,
                });
                Some(value)
            }
            Err(err) => {
                error!("✗ {name} - {err}");
                self.results.push(ScenarioResult {
                    name: name.to_string(),
                    status: ScenarioStatus::Failed,
                    duration_ms,
                    error: Some(err.to_string()),
                });
                None
            }
        }
    }

    /// Record a scenario that cannot run because an earlier scenario failed
    /// to produce its input.
    pub fn skip(&mut self, name: &str, reason: &str) {
        warn!("- {name} skipped: {reason}");
        self.results.push(ScenarioResult {
            name: name.to_string(),
            status: ScenarioStatus::Skipped,
            duration_ms: 0,
            error: Some(reason.to_string()),
        });
    }

    pub fn failed(&self) -> bool {
        self.results
            .iter()
            .any(|result| result.status == ScenarioStatus::Failed)
    }

    /// Log the summary, write the results file and return the process exit
    /// code: 0 when every executed scenario passed, 1 otherwise.
    pub fn finish(self, artifacts: &Path) -> i32 {
        let result = self.into_result();
        info!(
            "{}: {} passed, {} failed, {} skipped ({} ms)",
            result.suite, result.passed, result.failed, result.skipped, result.duration_ms
        );

        let path = artifacts.join(format!("{}-results.json", result.suite));
        match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                if let Err(err) = std::fs::write(&path, json) {
                    warn!(path = %path.display(), %err, "could not write results file");
                } else {
                    info!("results written to {}", path.display());
                }
            }
            Err(err) => warn!(%err, "could not serialize results"),
        }

        if result.failed > 0 {
            1
        } else {
            0
        }
    }

    fn into_result(self) -> SuiteResult {
        let passed = self
            .results
            .iter()
            .filter(|r| r.status == ScenarioStatus::Passed)
            .count();
        let failed = self
            .results
            .iter()
            .filter(|r| r.status == ScenarioStatus::Failed)
            .count();
        let skipped = self
            .results
            .iter()
            .filter(|r| r.status == ScenarioStatus::Skipped)
            .count();
        SuiteResult {
            suite: self.name,
            total: self.results.len(),
            passed,
            failed,
            skipped,
            duration_ms: self.started.elapsed().as_millis() as u64,
            results: self.results,
        }
    }
}
