//! Session fixture
//!
//! One browser process per suite run, with one isolated browsing context per
//! simulated actor. Contexts get independent cookie and storage jars, so two
//! actors never share login state; cross-actor scenarios hand values over as
//! plain parameters instead. Launch failure is fatal for the whole run, with
//! no retry.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::detection::{self, DetectionOptions};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{E2eError, E2eResult};
use crate::tab::Tab;

pub struct Session {
    browser: Browser,
    handler_task: JoinHandle<()>,
    contexts: Vec<BrowserContextId>,
    config: Config,
}

impl Session {
    /// Probe the environment before launching anything. Returns `false` when
    /// the suite should be skipped cleanly: no reachable YeetFile instance,
    /// or no usable browser executable.
    pub async fn preflight(config: &Config) -> E2eResult<bool> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        if let Err(err) = client.get(config.base_url.as_str()).send().await {
            warn!(base_url = %config.base_url, %err, "YeetFile not reachable, skipping suite");
            return Ok(false);
        }
        if config.browser.is_none()
            && detection::default_executable(DetectionOptions::default()).is_err()
        {
            warn!("no Chromium/Chrome executable found, skipping suite");
            return Ok(false);
        }
        Ok(true)
    }

    /// Launch one browser process and open `actors` isolated contexts.
    pub async fn launch(config: &Config, actors: usize) -> E2eResult<Self> {
        std::fs::create_dir_all(&config.artifacts)?;
        std::fs::create_dir_all(config.download_dir())?;

        let mut builder = BrowserConfig::builder().window_size(1280, 720);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.browser {
            builder = builder.chrome_executable(path.clone());
        }
        let browser_config = builder.build().map_err(E2eError::BrowserLaunch)?;

        let (mut browser, mut handler) = Browser::launch(browser_config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let mut contexts = Vec::with_capacity(actors);
        for _ in 0..actors {
            let context = browser
                .create_browser_context(CreateBrowserContextParams::default())
                .await?;
            contexts.push(context);
        }
        info!(actors, "browser session ready");

        Ok(Self {
            browser,
            handler_task,
            contexts,
            config: config.clone(),
        })
    }

    /// Handle for the actor at `index`. Single-actor suites use index 0.
    pub fn actor(&self, index: usize) -> E2eResult<Actor<'_>> {
        let context = self
            .contexts
            .get(index)
            .ok_or(E2eError::UnknownActor(index))?
            .clone();
        Ok(Actor {
            session: self,
            context,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Close the browser process, releasing every context and tab.
    pub async fn close(mut self) -> E2eResult<()> {
        self.browser.close().await?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        debug!("browser session closed");
        Ok(())
    }
}

/// One simulated user, bound to one isolated browsing context.
pub struct Actor<'a> {
    session: &'a Session,
    context: BrowserContextId,
}

impl Actor<'_> {
    /// Open a fresh tab in this actor's context.
    pub async fn new_tab(&self) -> E2eResult<Tab> {
        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(self.context.clone())
            .build()
            .map_err(E2eError::Protocol)?;
        let page = self.session.browser.new_page(params).await?;
        Tab::init(page, self.session.config()).await
    }
}
