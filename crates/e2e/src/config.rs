//! Run configuration for the scenario binaries
//!
//! Every `harness = false` test entry parses the same set of flags, so the
//! suites can be pointed at any running YeetFile instance:
//!
//! ```text
//! cargo test --test single_user -- --base-url http://localhost:8090
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Password used for every throwaway test account.
pub const USER_PASSWORD: &str = "yeet-test-password-1";

/// Password protecting the file uploaded through Send.
pub const FILE_PASSWORD: &str = "yeet-file-password-1";

/// Name of the scratch file uploaded by the Send and Vault scenarios.
pub const DEMO_FILE: &str = "demo_file.txt";

#[derive(Parser, Debug, Clone)]
#[command(name = "yeetfile-e2e")]
#[command(about = "Browser end-to-end tests for YeetFile")]
pub struct Config {
    /// Base URL of the running YeetFile instance
    #[arg(long, env = "YEETFILE_E2E_BASE_URL", default_value = "http://localhost:8090")]
    pub base_url: String,

    /// Run the browser headless
    #[arg(long, default_value = "true")]
    pub headless: bool,

    /// Path to a Chromium/Chrome executable (auto-detected when omitted)
    #[arg(long, env = "YEETFILE_E2E_BROWSER")]
    pub browser: Option<PathBuf>,

    /// Delay after each browser interaction, in milliseconds
    #[arg(long, default_value = "200")]
    pub slow_mo_ms: u64,

    /// Implicit wait window for elements, titles and downloads, in milliseconds
    #[arg(long, default_value = "10000")]
    pub timeout_ms: u64,

    /// Directory for downloads, scratch files and the results report
    #[arg(long, default_value = "test-results")]
    pub artifacts: PathBuf,
}

impl Config {
    /// Join a path onto the base URL. Absolute URLs pass through untouched,
    /// so scenarios can follow generated Send links directly.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url.trim_end_matches('/'), path)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn slow_mo(&self) -> Duration {
        Duration::from_millis(self.slow_mo_ms)
    }

    /// Where captured downloads are written.
    pub fn download_dir(&self) -> PathBuf {
        self.artifacts.join("downloads")
    }
}
