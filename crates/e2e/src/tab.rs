//! One browser tab
//!
//! `Tab` wraps a CDP page with the small act/assert vocabulary the scenarios
//! are written in. Elements are addressed by their `data-testid` attribute
//! only, never by position or copy. Every act and assert waits for its target
//! within one bounded implicit-wait window and fails the scenario on expiry;
//! there are no retries beyond that window.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, EventDownloadWillBegin,
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::element::Element;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::StreamExt;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{E2eError, E2eResult};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// CSS selector for a `data-testid` attribute.
pub fn tid(test_id: &str) -> String {
    format!(r#"[data-testid="{test_id}"]"#)
}

/// Quote a string for embedding in injected JavaScript.
pub fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

fn visible_expr(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            const style = window.getComputedStyle(el);
            if (style.display === "none" || style.visibility === "hidden") return false;
            return el.getClientRects().length > 0;
        }})()"#,
        sel = js_str(selector),
    )
}

fn hidden_expr(selector: &str) -> String {
    // An element that is not attached counts as hidden.
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return true;
            const style = window.getComputedStyle(el);
            if (style.display === "none" || style.visibility === "hidden") return true;
            return el.getClientRects().length === 0;
        }})()"#,
        sel = js_str(selector),
    )
}

pub struct Tab {
    page: Page,
    config: Config,
}

impl Tab {
    /// Wrap a freshly created page. Console messages from the page are
    /// forwarded into the log at debug level for the tab's lifetime.
    pub(crate) async fn init(page: Page, config: &Config) -> E2eResult<Self> {
        let mut console = page.event_listener::<EventConsoleApiCalled>().await?;
        tokio::spawn(async move {
            while let Some(event) = console.next().await {
                let parts: Vec<String> = event
                    .args
                    .iter()
                    .filter_map(|arg| {
                        arg.value
                            .as_ref()
                            .map(|value| value.to_string())
                            .or_else(|| arg.description.clone())
                    })
                    .collect();
                debug!("console: {}", parts.join(" "));
            }
        });
        Ok(Self { page, config: config.clone() })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Navigate and wait for the load signal before the next step.
    pub async fn goto(&self, path: &str) -> E2eResult<()> {
        let url = self.config.url(path);
        debug!(%url, "navigate");
        self.page.goto(url).await?;
        self.page.wait_for_navigation().await?;
        self.pace().await;
        Ok(())
    }

    /// Click the element with the given test id once it is visible.
    pub async fn click(&self, test_id: &str) -> E2eResult<()> {
        let selector = tid(test_id);
        self.wait_until(&format!("element {selector} visible"), &visible_expr(&selector))
            .await?;
        let element = self.page.find_element(selector.as_str()).await?;
        element.click().await?;
        self.pace().await;
        Ok(())
    }

    /// Replace the value of the input with the given test id.
    pub async fn fill(&self, test_id: &str, value: &str) -> E2eResult<()> {
        let selector = tid(test_id);
        self.wait_until(&format!("element {selector} visible"), &visible_expr(&selector))
            .await?;
        let expr = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                el.focus();
                el.value = {val};
                el.dispatchEvent(new Event("input", {{ bubbles: true }}));
                el.dispatchEvent(new Event("change", {{ bubbles: true }}));
                return true;
            }})()"#,
            sel = js_str(&selector),
            val = js_str(value),
        );
        self.page.evaluate(expr).await?;
        self.pace().await;
        Ok(())
    }

    /// Attach a local file to the file input with the given test id. File
    /// inputs are often kept off-screen, so this only requires attachment,
    /// not visibility.
    pub async fn set_file_input(&self, test_id: &str, file: &Path) -> E2eResult<()> {
        let selector = tid(test_id);
        let element = self.wait_for_selector(&selector).await?;
        let file = std::fs::canonicalize(file)?;
        let params = SetFileInputFilesParams::builder()
            .files(vec![file.to_string_lossy().to_string()])
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(E2eError::Protocol)?;
        self.page.execute(params).await?;
        self.pace().await;
        Ok(())
    }

    /// Text content of the element with the given test id. Waits until the
    /// element holds a non-empty text.
    pub async fn text_content(&self, test_id: &str) -> E2eResult<String> {
        let selector = tid(test_id);
        let expr = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                return el ? el.textContent.trim() : "";
            }})()"#,
            sel = js_str(&selector),
        );
        let deadline = Instant::now() + self.config.timeout();
        loop {
            let text: String = match self.page.evaluate(expr.as_str()).await {
                Ok(result) => result.into_value().unwrap_or_default(),
                Err(_) => String::new(),
            };
            if !text.is_empty() {
                return Ok(text);
            }
            if Instant::now() >= deadline {
                return Err(E2eError::WaitTimeout {
                    what: format!("text of element {selector}"),
                    timeout_ms: self.config.timeout_ms,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn expect_visible(&self, test_id: &str) -> E2eResult<()> {
        let selector = tid(test_id);
        self.wait_until(&format!("element {selector} visible"), &visible_expr(&selector))
            .await
    }

    pub async fn expect_hidden(&self, test_id: &str) -> E2eResult<()> {
        let selector = tid(test_id);
        self.wait_until(&format!("element {selector} hidden"), &hidden_expr(&selector))
            .await
    }

    /// Assert that the element with the given test id has no children and no
    /// text, e.g. an emptied table body.
    pub async fn expect_empty(&self, test_id: &str) -> E2eResult<()> {
        let selector = tid(test_id);
        let expr = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                return el.children.length === 0 && el.textContent.trim() === "";
            }})()"#,
            sel = js_str(&selector),
        );
        self.wait_until(&format!("element {selector} empty"), &expr).await
    }

    /// Wait for an anchor whose text equals `name`, the closest analogue to
    /// finding a link by its accessible name.
    pub async fn expect_link(&self, name: &str) -> E2eResult<()> {
        let expr = format!(
            r#"(() => {{
                const name = {name};
                return Array.from(document.querySelectorAll("a")).some(
                    (a) => a.textContent.trim() === name
                );
            }})()"#,
            name = js_str(name),
        );
        self.wait_until(&format!("link named {name:?}"), &expr).await
    }

    /// Assert the page title, waiting out any in-flight navigation.
    pub async fn expect_title(&self, expected: &str) -> E2eResult<()> {
        let deadline = Instant::now() + self.config.timeout();
        loop {
            let title = self.title().await;
            if title == expected {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(E2eError::AssertionFailed(format!(
                    "expected title {expected:?}, last saw {title:?}"
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn expect_title_matches(&self, pattern: &Regex) -> E2eResult<()> {
        let deadline = Instant::now() + self.config.timeout();
        loop {
            let title = self.title().await;
            if pattern.is_match(&title) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(E2eError::AssertionFailed(format!(
                    "expected title matching {pattern}, last saw {title:?}"
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Evaluate a JS expression and deserialize its settled value.
    pub async fn evaluate_json<T: DeserializeOwned>(&self, expr: &str) -> E2eResult<T> {
        Ok(self.page.evaluate(expr).await?.into_value()?)
    }

    /// Accept every native dialog this tab opens from now on, optionally
    /// supplying prompt text. Must be registered before the triggering click.
    pub async fn auto_accept_dialogs(&self, prompt_text: Option<&str>) -> E2eResult<()> {
        let mut dialogs = self.page.event_listener::<EventJavascriptDialogOpening>().await?;
        let page = self.page.clone();
        let prompt_text = prompt_text.map(str::to_owned);
        tokio::spawn(async move {
            while let Some(dialog) = dialogs.next().await {
                debug!(message = %dialog.message, "accepting dialog");
                let mut builder = HandleJavaScriptDialogParams::builder().accept(true);
                if let Some(text) = &prompt_text {
                    builder = builder.prompt_text(text.clone());
                }
                match builder.build() {
                    Ok(params) => {
                        if page.execute(params).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(%err, "could not build dialog response");
                        break;
                    }
                }
            }
        });
        Ok(())
    }

    /// Route this tab's downloads into the artifacts directory and return a
    /// capture for the next one. Register the capture, then perform the
    /// triggering click.
    pub async fn capture_downloads(&self) -> E2eResult<DownloadCapture> {
        let dir = self.config.download_dir();
        std::fs::create_dir_all(&dir)?;
        let dir = std::fs::canonicalize(&dir)?;
        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::AllowAndName)
            .download_path(dir.to_string_lossy().to_string())
            .events_enabled(true)
            .build()
            .map_err(E2eError::Protocol)?;
        self.page.execute(params).await?;
        Ok(DownloadCapture {
            begin: self.page.event_listener::<EventDownloadWillBegin>().await?,
            progress: self.page.event_listener::<EventDownloadProgress>().await?,
            dir,
            timeout: self.config.timeout(),
        })
    }

    /// Hold the tab open, used by the manual inspection entry.
    pub async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn wait_for_selector(&self, selector: &str) -> E2eResult<Element> {
        let deadline = Instant::now() + self.config.timeout();
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(E2eError::WaitTimeout {
                    what: format!("element {selector}"),
                    timeout_ms: self.config.timeout_ms,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_until(&self, what: &str, expr: &str) -> E2eResult<()> {
        let deadline = Instant::now() + self.config.timeout();
        loop {
            let satisfied = match self.page.evaluate(expr).await {
                Ok(result) => result.into_value::<bool>().unwrap_or(false),
                Err(_) => false,
            };
            if satisfied {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(E2eError::WaitTimeout {
                    what: what.to_string(),
                    timeout_ms: self.config.timeout_ms,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn title(&self) -> String {
        match self.page.get_title().await {
            Ok(title) => title.unwrap_or_default(),
            Err(_) => String::new(),
        }
    }

    async fn pace(&self) {
        if self.config.slow_mo_ms > 0 {
            tokio::time::sleep(self.config.slow_mo()).await;
        }
    }
}

/// In-flight download registered by [`Tab::capture_downloads`].
pub struct DownloadCapture {
    begin: EventStream<EventDownloadWillBegin>,
    progress: EventStream<EventDownloadProgress>,
    dir: PathBuf,
    timeout: Duration,
}

impl DownloadCapture {
    /// Wait for the captured download to finish and return the path it was
    /// saved under. Downloads are stored under their CDP guid, so the caller
    /// compares bytes, not filenames.
    pub async fn wait(mut self) -> E2eResult<PathBuf> {
        let begin = tokio::time::timeout(self.timeout, self.begin.next())
            .await
            .map_err(|_| E2eError::Download("no download started".into()))?
            .ok_or_else(|| E2eError::Download("download event stream closed".into()))?;
        let guid = begin.guid.clone();
        debug!(file = %begin.suggested_filename, "download started");

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(E2eError::Download("download did not complete in time".into()));
            }
            let event = tokio::time::timeout(remaining, self.progress.next())
                .await
                .map_err(|_| E2eError::Download("download did not complete in time".into()))?
                .ok_or_else(|| E2eError::Download("download event stream closed".into()))?;
            if event.guid != guid {
                continue;
            }
            match &event.state {
                DownloadProgressState::Completed => return Ok(self.dir.join(&guid)),
                DownloadProgressState::Canceled => {
                    return Err(E2eError::Download("download canceled".into()));
                }
                DownloadProgressState::InProgress => {}
            }
        }
    }
}
