//! Chrome DevTools Protocol session backend.
//!
//! Drives a real browser through chromiumoxide. The async CDP client is
//! bridged onto the blocking [`SessionDriver`] contract with a dedicated
//! tokio runtime per session; the scenario runner itself stays synchronous.

use crate::result::{CandadoError, CandadoResult};
use crate::session::{ElementHandle, SessionDriver, SessionFactory};
use crate::wait::DEFAULT_POLL_INTERVAL_MS;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};

fn cdp_err(err: impl std::fmt::Display) -> CandadoError {
    CandadoError::session(err.to_string())
}

/// Launch configuration for Chromium sessions
#[derive(Debug, Clone)]
pub struct ChromiumConfig {
    /// Run without a visible window
    pub headless: bool,
    /// Keep the Chromium sandbox (disable for containers/CI)
    pub sandbox: bool,
    /// Path to the chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
        }
    }
}

impl ChromiumConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Disable the sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set the chromium binary path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }
}

/// One browser session backed by a CDP page
pub struct ChromiumSession {
    runtime: tokio::runtime::Runtime,
    browser: Browser,
    page: Page,
    #[allow(dead_code)]
    handler: tokio::task::JoinHandle<()>,
    label: String,
    url: String,
}

impl std::fmt::Debug for ChromiumSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromiumSession")
            .field("label", &self.label)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl ChromiumSession {
    /// Launch a browser and open a blank page
    pub fn launch(label: &str, config: &ChromiumConfig) -> CandadoResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(cdp_err)?;

        let (browser, page, handler) = runtime.block_on(async {
            let mut builder = BrowserConfig::builder();
            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(path) = &config.chromium_path {
                builder = builder.chrome_executable(path);
            }
            let cdp_config = builder.build().map_err(CandadoError::session)?;

            let (browser, mut events) = Browser::launch(cdp_config).await.map_err(cdp_err)?;
            let handler = tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            let page = browser.new_page("about:blank").await.map_err(cdp_err)?;
            Ok::<_, CandadoError>((browser, page, handler))
        })?;

        tracing::info!(label, "chromium session launched");
        Ok(Self {
            runtime,
            browser,
            page,
            handler,
            label: label.to_string(),
            url: String::from("about:blank"),
        })
    }

    /// Session label given at launch
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    fn elements(&self, selector: &str) -> Vec<Element> {
        self.runtime
            .block_on(self.page.find_elements(selector))
            .unwrap_or_default()
    }

    fn handle_for(selector: &str, index: usize) -> ElementHandle {
        ElementHandle::new(format!("{selector}#{index}"), "element")
    }
}

impl SessionDriver for ChromiumSession {
    fn navigate(&mut self, url: &str) -> CandadoResult<()> {
        self.runtime
            .block_on(self.page.goto(url))
            .map_err(|e| CandadoError::session(format!("navigation to {url} failed: {e}")))?;
        self.url = url.to_string();
        Ok(())
    }

    fn find_all(&self, selector: &str) -> CandadoResult<Vec<ElementHandle>> {
        let found = self.elements(selector);
        Ok((0..found.len())
            .map(|index| Self::handle_for(selector, index))
            .collect())
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> CandadoResult<ElementHandle> {
        let start = Instant::now();
        loop {
            if !self.elements(selector).is_empty() {
                return Ok(Self::handle_for(selector, 0));
            }
            if start.elapsed() >= timeout {
                return Err(CandadoError::timeout(selector, timeout.as_millis() as u64));
            }
            std::thread::sleep(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
        }
    }

    fn click(&mut self, selector: &str) -> CandadoResult<()> {
        self.runtime.block_on(async {
            let element = self.page.find_element(selector).await.map_err(cdp_err)?;
            element.click().await.map_err(cdp_err)?;
            Ok(())
        })
    }

    fn type_into_nth(&mut self, selector: &str, index: usize, text: &str) -> CandadoResult<()> {
        self.runtime.block_on(async {
            let elements = self.page.find_elements(selector).await.map_err(cdp_err)?;
            let element = elements
                .get(index)
                .ok_or_else(|| CandadoError::ElementNotFound {
                    selector: format!("{selector}[{index}]"),
                })?;
            // Focus the box before typing so keystrokes land in it
            element.click().await.map_err(cdp_err)?;
            element.type_str(text).await.map_err(cdp_err)?;
            Ok(())
        })
    }

    fn attribute(&self, selector: &str, name: &str) -> CandadoResult<Option<String>> {
        self.runtime.block_on(async {
            match self.page.find_element(selector).await {
                Ok(element) => element.attribute(name).await.map_err(cdp_err),
                Err(_) => Ok(None),
            }
        })
    }

    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn close(&mut self) -> CandadoResult<()> {
        tracing::info!(label = %self.label, "closing chromium session");
        self.runtime
            .block_on(self.browser.close())
            .map_err(cdp_err)?;
        Ok(())
    }
}

/// Factory producing one Chromium session per participant
#[derive(Debug, Clone, Default)]
pub struct ChromiumFactory {
    config: ChromiumConfig,
}

impl ChromiumFactory {
    /// Create a factory with the given launch configuration
    #[must_use]
    pub fn new(config: ChromiumConfig) -> Self {
        Self { config }
    }
}

impl SessionFactory for ChromiumFactory {
    type Driver = ChromiumSession;

    fn create_session(&self, label: &str) -> CandadoResult<ChromiumSession> {
        ChromiumSession::launch(label, &self.config)
    }
}
