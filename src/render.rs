//! The image generation pipeline
//!
//! Every render gets its own browser: launch, load the composed document,
//! screenshot, close. Nothing is shared between renders except the asset
//! bundle.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::assets::AssetBundle;
use crate::async_api::Browser;
use crate::engine::{CdpEngine, Engine};
use crate::template::{self, OgpInfo};
use crate::{EngineConfig, Error, Result};

/// Author name shown next to the icon unless configured otherwise.
pub const DEFAULT_AUTHOR: &str = "rintaro";

/// Input of one render
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OgpRequest {
    pub title: String,
    pub date: String,
}

impl OgpRequest {
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
        }
    }
}

/// Renderer settings beyond the browser configuration
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Name shown next to the icon
    pub author: String,
    /// Upper bound for one whole render
    pub timeout: Duration,
    /// Maximum number of browsers alive at once; `None` is unbounded
    pub max_concurrent: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            timeout: Duration::from_secs(30),
            max_concurrent: None,
        }
    }
}

/// Turns an [`OgpRequest`] into PNG bytes.
///
/// Generic over the [`Engine`] so the pipeline can run without Chrome.
pub struct OgpRenderer<E = CdpEngine> {
    assets: Arc<AssetBundle>,
    config: EngineConfig,
    options: RenderOptions,
    limiter: Option<Arc<Semaphore>>,
    _engine: PhantomData<fn() -> E>,
}

impl<E> OgpRenderer<E>
where
    E: Engine + 'static,
{
    pub fn new(assets: Arc<AssetBundle>, config: EngineConfig, options: RenderOptions) -> Self {
        let limiter = options
            .max_concurrent
            .map(|n| Arc::new(Semaphore::new(n.max(1))));
        Self {
            assets,
            config,
            options,
            limiter,
            _engine: PhantomData,
        }
    }

    /// Compose the HTML document for `request`.
    pub fn compose(&self, request: &OgpRequest) -> String {
        template::render(&OgpInfo {
            title: &request.title,
            date: &request.date,
            author: &self.options.author,
            icon: self.assets.icon(),
            style: self.assets.style(),
        })
    }

    /// Render `request` to a PNG.
    ///
    /// The browser is released on every exit path, including timeout. A
    /// concurrency permit stays with the browser's worker until the browser
    /// is gone, so a timed-out render keeps its slot until it is cleaned up.
    pub async fn render(&self, request: &OgpRequest) -> Result<Vec<u8>> {
        let permit = match &self.limiter {
            Some(limiter) => Some(
                limiter
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Other(format!("Render limiter closed: {}", e)))?,
            ),
            None => None,
        };

        let timeout = self.options.timeout;
        tokio::time::timeout(timeout, self.render_inner(request, permit))
            .await
            .map_err(|_| Error::Timeout(timeout.as_millis() as u64))?
    }

    async fn render_inner(
        &self,
        request: &OgpRequest,
        permit: Option<OwnedSemaphorePermit>,
    ) -> Result<Vec<u8>> {
        let browser = Browser::launch::<E>(self.config.clone(), permit).await?;
        let page = browser.new_page();

        let html = self.compose(request);
        debug!("Composed document of {} bytes", html.len());
        page.set_content(html).await?;

        let image = page.screenshot().await?;
        drop(page);
        browser.close().await?;
        Ok(image)
    }
}
