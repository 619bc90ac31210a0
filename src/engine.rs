//! Browser engines
//!
//! [`Engine`] is the seam between the render pipeline and the browser.
//! [`CdpEngine`] implements it over the Chrome DevTools Protocol via the
//! `headless_chrome` crate.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn};

use crate::{EngineConfig, Error, Result};

/// Waits until fonts are applied and every image is decoded.
///
/// All assets are inlined as data URIs, so this is the equivalent of waiting
/// for the network to go idle. Layout is forced and every declared face is
/// loaded first, because `document.fonts.ready` can resolve before a freshly
/// written document has requested any font.
const SETTLE_SCRIPT: &str = r#"(async function() {
    if (document.body) {
        document.body.getBoundingClientRect();
    }
    await Promise.all(Array.from(document.fonts).map(function(face) {
        return face.load().catch(function() {});
    }));
    await document.fonts.ready;
    await Promise.all(Array.from(document.images).map(function(img) {
        return img.decode().catch(function() {});
    }));
    return document.readyState;
})()"#;

/// How long the browser may sit idle before `headless_chrome` gives up on it.
fn idle_timeout(timeout_ms: u64) -> Duration {
    Duration::from_millis(timeout_ms.max(1000).saturating_mul(2))
}

/// Core trait for browser engine implementations
///
/// An engine owns one browser with one page. Dropping the engine must release
/// the browser.
pub trait Engine {
    /// Launch the browser and prepare a page according to `config`
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized;

    /// Replace the page's document with `html` and wait until it has settled
    fn load_html(&mut self, html: &str) -> Result<()>;

    /// Capture the viewport as a PNG image
    fn render_png(&self) -> Result<Vec<u8>>;

    /// Close the engine and clean up resources
    fn close(self) -> Result<()>;
}

/// CDP-based engine implementation (uses the `headless_chrome` crate)
///
/// Launches a headless Chrome instance and manages a single tab. The Chrome
/// process is killed when the engine is dropped.
pub struct CdpEngine {
    browser: Browser,
    tab: Arc<Tab>,
    config: EngineConfig,
}

impl Engine for CdpEngine {
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized,
    {
        let viewport = config.viewport;
        let args: Vec<&OsStr> = config.launch.args.iter().map(OsStr::new).collect();

        let launch_options = LaunchOptions::default_builder()
            .headless(config.launch.headless)
            .sandbox(config.launch.sandbox)
            .path(config.launch.executable.clone())
            .args(args)
            .window_size(Some((viewport.width, viewport.height)))
            .idle_browser_timeout(idle_timeout(config.timeout_ms))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(config.timeout_ms));

        tab.set_extra_http_headers(config.request_headers())
            .map_err(|e| Error::InitializationError(format!("Failed to set headers: {}", e)))?;

        debug!("Browser launched with a {}x{} window", viewport.width, viewport.height);

        Ok(Self { browser, tab, config })
    }

    fn load_html(&mut self, html: &str) -> Result<()> {
        self.tab
            .navigate_to("about:blank")
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;

        // The document is passed as a JSON string literal so no escaping is
        // needed on our side.
        let literal = serde_json::to_string(html)
            .map_err(|e| Error::LoadError(format!("Failed to encode document: {}", e)))?;
        let script = format!(
            "(function(html) {{ document.open(); document.write(html); document.close(); }})({})",
            literal
        );
        self.tab
            .evaluate(&script, false)
            .map_err(|e| Error::LoadError(format!("Failed to write document: {}", e)))?;

        let state = self
            .tab
            .evaluate(SETTLE_SCRIPT, true)
            .map_err(|e| Error::LoadError(format!("Waiting for content failed: {}", e)))?;
        match state.value.as_ref().and_then(|v| v.as_str()) {
            Some("complete") => {}
            other => warn!("Document not complete after settling: {:?}", other),
        }

        debug!("Loaded document of {} bytes", html.len());
        Ok(())
    }

    fn render_png(&self) -> Result<Vec<u8>> {
        let viewport = self.config.viewport;
        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: viewport.width as f64,
            height: viewport.height as f64,
            scale: 1.0,
        };

        let screenshot_data = self
            .tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, Some(clip), true)
            .map_err(|e| Error::RenderError(format!("Screenshot failed: {}", e)))?;

        Ok(screenshot_data)
    }

    fn close(self) -> Result<()> {
        // Dropping the browser terminates the child process.
        drop(self.tab);
        drop(self.browser);
        debug!("Browser closed");
        Ok(())
    }
}
