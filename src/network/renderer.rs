//! Page rendering.
//!
//! The headless renderer drives Chromium so client-side rendered markup and
//! lazy-loaded images are present in the snapshot. The static renderer simply
//! downloads the document and is used when rendering is disabled.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::core::{is_plaintext_media_type, CloneOptions};
use crate::network::session::AssetFetcher;
use crate::utils::url::Url;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("network did not become idle within {0:?}")]
    Timeout(Duration),

    #[error("could not read page content: {0}")]
    Content(String),
}

/// Produces the serialized DOM of a page.
pub trait PageRenderer {
    fn render(&self, url: &Url) -> Result<String, RenderError>;
}

/// Browser settings taken from [`CloneOptions`].
#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub timeout: Duration,
    pub settle_delay: Duration,
    pub chrome_path: Option<std::path::PathBuf>,
}

impl From<&CloneOptions> for RenderOptions {
    fn from(options: &CloneOptions) -> Self {
        RenderOptions {
            user_agent: options.user_agent.clone(),
            viewport: options.viewport,
            timeout: options.render_timeout,
            settle_delay: options.settle_delay,
            chrome_path: options.chrome_path.clone(),
        }
    }
}

/// Downloads the document as served, without running any scripts.
pub struct StaticRenderer<'a> {
    fetcher: &'a dyn AssetFetcher,
}

impl<'a> StaticRenderer<'a> {
    pub fn new(fetcher: &'a dyn AssetFetcher) -> Self {
        StaticRenderer { fetcher }
    }
}

impl PageRenderer for StaticRenderer<'_> {
    fn render(&self, url: &Url) -> Result<String, RenderError> {
        let asset = self
            .fetcher
            .retrieve_asset(url)
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        if !is_plaintext_media_type(&asset.media_type) {
            return Err(RenderError::Content(format!(
                "unsupported media type: {}",
                asset.media_type
            )));
        }

        debug!(url = %url, bytes = asset.data.len(), "fetched document without rendering");
        Ok(asset.text())
    }
}

#[cfg(feature = "headless")]
pub use self::headless::HeadlessRenderer;

#[cfg(feature = "headless")]
mod headless {
    use std::ffi::OsStr;
    use std::thread;
    use std::time::{Duration, Instant};

    use headless_chrome::{Browser, LaunchOptions, Tab};
    use tracing::{debug, info};

    use super::{PageRenderer, RenderError, RenderOptions};
    use crate::utils::url::Url;

    const BROWSER_ARGS: &[&str] = &[
        "--disable-setuid-sandbox",
        "--disable-dev-shm-usage",
        "--disable-accelerated-2d-canvas",
        "--no-first-run",
        "--no-zygote",
        "--disable-gpu",
    ];

    /// How long the resource count must stay unchanged to count as idle.
    const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);
    const NETWORK_IDLE_POLL: Duration = Duration::from_millis(100);

    // -1 until the load event fired
    const RESOURCE_COUNT_JS: &str = "document.readyState === 'complete' \
        ? performance.getEntriesByType('resource').length : -1";
    const SCROLL_TO_BOTTOM_JS: &str =
        "window.scrollTo(0, document.body ? document.body.scrollHeight : 0)";

    pub struct HeadlessRenderer {
        options: RenderOptions,
    }

    impl HeadlessRenderer {
        pub fn new(options: RenderOptions) -> Self {
            HeadlessRenderer { options }
        }

        fn launch(&self) -> Result<Browser, RenderError> {
            let (width, height) = self.options.viewport;

            let launch_options = LaunchOptions::default_builder()
                .headless(true)
                .sandbox(false)
                .window_size(Some((width, height)))
                .path(self.options.chrome_path.clone())
                .idle_browser_timeout(
                    self.options.timeout + self.options.settle_delay + Duration::from_secs(30),
                )
                .args(BROWSER_ARGS.iter().map(OsStr::new).collect())
                .build()
                .map_err(|e| RenderError::Launch(e.to_string()))?;

            Browser::new(launch_options).map_err(|e| RenderError::Launch(e.to_string()))
        }

        fn render_in(&self, browser: &Browser, url: &Url) -> Result<String, RenderError> {
            let tab = browser
                .new_tab()
                .map_err(|e| RenderError::Launch(e.to_string()))?;

            tab.set_default_timeout(self.options.timeout);
            tab.set_user_agent(&self.options.user_agent, None, None)
                .map_err(|e| RenderError::Navigation(e.to_string()))?;

            tab.navigate_to(url.as_str())
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            tab.wait_until_navigated()
                .map_err(|e| RenderError::Navigation(e.to_string()))?;

            self.wait_for_network_idle(&tab)?;

            // Lazy loaders key on viewport intersection
            tab.evaluate(SCROLL_TO_BOTTOM_JS, false)
                .map_err(|e| RenderError::Content(e.to_string()))?;
            thread::sleep(self.options.settle_delay);

            let html = tab
                .get_content()
                .map_err(|e| RenderError::Content(e.to_string()))?;

            if let Err(e) = tab.close(true) {
                debug!("closing tab failed: {e}");
            }

            Ok(html)
        }

        fn wait_for_network_idle(&self, tab: &Tab) -> Result<(), RenderError> {
            let deadline = Instant::now() + self.options.timeout;
            let mut last_count: Option<i64> = None;
            let mut stable_since = Instant::now();

            loop {
                let count = tab
                    .evaluate(RESOURCE_COUNT_JS, false)
                    .map_err(|e| RenderError::Navigation(e.to_string()))?
                    .value
                    .and_then(|value| value.as_i64())
                    .unwrap_or(-1);
                let now = Instant::now();

                if count >= 0 && last_count == Some(count) {
                    if now.duration_since(stable_since) >= NETWORK_IDLE_WINDOW {
                        return Ok(());
                    }
                } else {
                    last_count = Some(count);
                    stable_since = now;
                }

                if now >= deadline {
                    return Err(RenderError::Timeout(self.options.timeout));
                }

                thread::sleep(NETWORK_IDLE_POLL);
            }
        }
    }

    impl PageRenderer for HeadlessRenderer {
        fn render(&self, url: &Url) -> Result<String, RenderError> {
            info!(url = %url, "rendering page in headless browser");

            let browser = self.launch()?;
            let result = self.render_in(&browser, url);
            // The browser process is killed on drop, on success and failure alike
            drop(browser);

            result
        }
    }
}
