//! Headless rendering surface and its Chrome DevTools Protocol adapter

use base64::Engine as Base64Engine;
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use std::sync::Arc;

use crate::{Error, RenderConfig, Result};

/// One live page of a headless visual-rendering engine.
///
/// The trait is the seam between the pipeline and the engine: production uses
/// [`CdpSurface`], tests substitute an in-process stub. Implementations are
/// synchronous; the session manager runs them on a dedicated worker thread.
pub trait Surface {
    /// Replace the page content with a self-contained markup document.
    fn load_html(&mut self, html: &str) -> Result<()>;

    /// Evaluate a script against the page and return its JSON value.
    fn eval(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Capture the page as a PNG snapshot.
    fn capture_png(&mut self) -> Result<Vec<u8>>;

    /// Tear down the surface and the process behind it.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// CDP-backed surface: one headless Chrome process with a single tab.
///
/// The process is never shared or reused; dropping the surface kills the
/// child process, so teardown is immediate rather than graceful.
pub struct CdpSurface {
    browser: Browser,
    tab: Arc<Tab>,
}

impl CdpSurface {
    /// Launch a headless browser sized to the render viewport.
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .build()
            .map_err(|e| Error::Infrastructure(format!("Failed to build launch options: {e}")))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::Infrastructure(format!("Failed to launch browser: {e}")))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::Infrastructure(format!("Failed to create tab: {e}")))?;

        Ok(Self { browser, tab })
    }
}

impl Surface for CdpSurface {
    fn load_html(&mut self, html: &str) -> Result<()> {
        // The document is embedded as a base64 data URL so no file or local
        // server has to exist for the lifetime of the page.
        let encoded = base64::engine::general_purpose::STANDARD.encode(html);
        let url = format!("data:text/html;base64,{encoded}");

        self.tab
            .navigate_to(&url)
            .map_err(|e| Error::Infrastructure(format!("Navigation failed: {e}")))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::Infrastructure(format!("Wait for navigation failed: {e}")))?;

        Ok(())
    }

    fn eval(&mut self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| Error::Infrastructure(format!("Evaluation failed: {e}")))?;

        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    fn capture_png(&mut self) -> Result<Vec<u8>> {
        self.tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| Error::Capture(format!("Screenshot failed: {e}")))
    }

    fn close(self) -> Result<()> {
        // Dropping the browser terminates the child process promptly; there is
        // no graceful-shutdown path to wait on.
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}
