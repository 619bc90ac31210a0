//! Endpoint tests for `GET /api/ogp`, driven through the router without a network

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use ogpshot::{
    AssetBundle, DeploymentMode, Engine, EngineConfig, LaunchProfile, OgpRenderer, RenderOptions, Viewport,
};
use sha2::{Digest, Sha256};
use tower::ServiceExt;

/// Documents loaded by [`FakeEngine`], in order.
static LOADED: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// Paints the viewport in a colour derived from the loaded document.
struct FakeEngine {
    viewport: Viewport,
    digest: [u8; 32],
}

impl Engine for FakeEngine {
    fn new(config: EngineConfig) -> ogpshot::Result<Self> {
        Ok(Self {
            viewport: config.viewport,
            digest: [0; 32],
        })
    }

    fn load_html(&mut self, html: &str) -> ogpshot::Result<()> {
        self.digest.copy_from_slice(&Sha256::digest(html.as_bytes()));
        LOADED.lock().unwrap().push(html.to_string());
        Ok(())
    }

    fn render_png(&self) -> ogpshot::Result<Vec<u8>> {
        let pixel = image::Rgba([self.digest[0], self.digest[1], self.digest[2], 255]);
        let img = image::RgbaImage::from_pixel(self.viewport.width, self.viewport.height, pixel);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| ogpshot::Error::RenderError(e.to_string()))?;
        Ok(out.into_inner())
    }

    fn close(self) -> ogpshot::Result<()> {
        Ok(())
    }
}

fn assets() -> Arc<AssetBundle> {
    Arc::new(AssetBundle::from_encoded("image/webp", "aWNvbg==", "bW9ubw==", "bm90bw=="))
}

fn fake_app() -> Router {
    let renderer: OgpRenderer<FakeEngine> =
        OgpRenderer::new(assets(), EngineConfig::default(), RenderOptions::default());
    ogpshot::build_router(Arc::new(renderer))
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

fn loaded_containing(needle: &str) -> Vec<String> {
    LOADED
        .lock()
        .unwrap()
        .iter()
        .filter(|doc| doc.contains(needle))
        .cloned()
        .collect()
}

#[tokio::test]
async fn renders_png_with_cache_headers() {
    let (status, headers, body) = get(fake_app(), "/api/ogp?title=Hello%20World&date=2024-01-01").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers[header::CACHE_CONTROL], "s-maxage=5256000, stale-while-revalidate");

    let img = image::load_from_memory_with_format(&body, image::ImageFormat::Png).unwrap();
    assert_eq!((img.width(), img.height()), (1200, 630));

    let docs = loaded_containing("<p>Hello World</p>");
    assert!(!docs.is_empty());
    assert!(docs[0].contains("<p>2024-01-01</p>"));
}

#[tokio::test]
async fn missing_params_match_empty_params() {
    let (status_a, _, body_a) = get(fake_app(), "/api/ogp").await;
    let (status_b, _, body_b) = get(fake_app(), "/api/ogp?title=&date=").await;

    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(status_b, StatusCode::OK);
    assert_eq!(Sha256::digest(&body_a), Sha256::digest(&body_b));
}

#[tokio::test]
async fn same_request_gives_same_image() {
    let uri = "/api/ogp?title=Idempotent&date=2024-02-02";
    let app = fake_app();
    let (_, _, first) = get(app.clone(), uri).await;
    let (_, _, second) = get(app.clone(), uri).await;
    assert_eq!(hex::encode(Sha256::digest(&first)), hex::encode(Sha256::digest(&second)));

    let (_, _, other) = get(app, "/api/ogp?title=Different&date=2024-02-02").await;
    assert_ne!(Sha256::digest(&first), Sha256::digest(&other));
}

#[tokio::test]
async fn markup_in_title_stays_text() {
    let uri = "/api/ogp?title=%3Cscript%3Ealert(1)%3C%2Fscript%3E&date=%3Cb%3Einjected%3C%2Fb%3E";
    let (status, headers, _) = get(fake_app(), uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");

    let docs = loaded_containing("&lt;script&gt;alert(1)&lt;/script&gt;");
    assert_eq!(docs.len(), 1);
    assert!(!docs[0].contains("<script>"));
    assert!(docs[0].contains("&lt;b&gt;injected&lt;/b&gt;"));
}

#[tokio::test]
async fn long_unicode_title_renders() {
    let title = "長いタイトル".repeat(200);
    let encoded: String = title.bytes().map(|b| format!("%{:02X}", b)).collect();
    let uri = format!("/api/ogp?title={}&date=2024", encoded);
    let (status, _, body) = get(fake_app(), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[0..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(loaded_containing(&title).len(), 1);
}

#[tokio::test]
async fn repeated_title_is_comma_joined() {
    let (status, _, _) = get(fake_app(), "/api/ogp?title=first&title=second&date=x").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!loaded_containing("<p>first,second</p>").is_empty());
}

#[tokio::test]
async fn other_methods_and_paths_are_rejected() {
    let response = fake_app()
        .oneshot(Request::builder().method("POST").uri("/api/ogp").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let (status, _, _) = get(fake_app(), "/api/other").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn browser_launch_failure_is_500() {
    let config = EngineConfig {
        launch: LaunchProfile::for_mode(DeploymentMode::Development, Some("/nonexistent/ogpshot/chrome".into())),
        ..Default::default()
    };
    let renderer: OgpRenderer = OgpRenderer::new(assets(), config, RenderOptions::default());
    let app = ogpshot::build_router(Arc::new(renderer));

    let (status, headers, body) = get(app, "/api/ogp?title=Hello&date=2024-01-01").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"Internal Server Error");
    assert_ne!(headers.get(header::CONTENT_TYPE).map(|v| v.as_bytes()), Some(&b"image/png"[..]));
    assert!(headers.get(header::CACHE_CONTROL).is_none());
}

/// Browsers currently held by [`StalledEngine`].
static STALLED: AtomicUsize = AtomicUsize::new(0);

/// Blocks in `load_html` well past the render timeout.
struct StalledEngine;

impl Engine for StalledEngine {
    fn new(_config: EngineConfig) -> ogpshot::Result<Self> {
        STALLED.fetch_add(1, Ordering::SeqCst);
        Ok(StalledEngine)
    }

    fn load_html(&mut self, _html: &str) -> ogpshot::Result<()> {
        std::thread::sleep(Duration::from_millis(300));
        Ok(())
    }

    fn render_png(&self) -> ogpshot::Result<Vec<u8>> {
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    fn close(self) -> ogpshot::Result<()> {
        Ok(())
    }
}

impl Drop for StalledEngine {
    fn drop(&mut self) {
        STALLED.fetch_sub(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn render_timeout_is_500_and_releases_browser() {
    let renderer: OgpRenderer<StalledEngine> = OgpRenderer::new(
        assets(),
        EngineConfig::default(),
        RenderOptions {
            timeout: Duration::from_millis(50),
            max_concurrent: Some(1),
            ..Default::default()
        },
    );
    let app = ogpshot::build_router(Arc::new(renderer));

    let (status, headers, body) = get(app, "/api/ogp?title=Hello&date=2024-01-01").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"Internal Server Error");
    assert!(headers.get(header::CACHE_CONTROL).is_none());

    for _ in 0..100 {
        if STALLED.load(Ordering::SeqCst) == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("browser still alive after the timed-out render");
}
