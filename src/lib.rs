//! OGP image renderer
//!
//! Renders branded Open Graph preview images: a title and a date are placed
//! into a fixed HTML layout, the page is loaded into a headless Chrome and the
//! viewport is returned as a 1200×630 PNG.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ogpshot::{AssetBundle, DeploymentMode, EngineConfig, LaunchProfile, OgpRenderer, OgpRequest, RenderOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let assets = Arc::new(AssetBundle::load("public")?);
//! let config = EngineConfig {
//!     launch: LaunchProfile::for_mode(DeploymentMode::Development, None),
//!     ..Default::default()
//! };
//! let renderer: OgpRenderer = OgpRenderer::new(assets, config, RenderOptions::default());
//! let png = renderer.render(&OgpRequest::new("Hello World", "2024-01-01")).await?;
//! std::fs::write("ogp.png", png)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod assets;
pub mod async_api;
pub mod config;
pub mod engine;
pub mod render;
pub mod server;
pub mod template;

pub use assets::AssetBundle;
pub use config::{DeploymentMode, EngineConfig, LaunchProfile, Viewport};
pub use engine::{CdpEngine, Engine};
pub use render::{OgpRenderer, OgpRequest, RenderOptions};
pub use server::build_router;
