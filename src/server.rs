//! HTTP surface: `GET /api/ogp`

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::engine::Engine;
use crate::render::{OgpRenderer, OgpRequest};

/// Route serving the images
pub const OGP_PATH: &str = "/api/ogp";

/// Cache policy of a successful response: about 60 days at the edge.
pub const CACHE_CONTROL: &str = "s-maxage=5256000, stale-while-revalidate";

/// Any failure while producing an image.
///
/// All failures look the same to the client.
pub struct RenderFailure(pub crate::Error);

impl IntoResponse for RenderFailure {
    fn into_response(self) -> Response {
        log::error!("[Error]: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

impl From<crate::Error> for RenderFailure {
    fn from(err: crate::Error) -> Self {
        Self(err)
    }
}

/// Build the router serving OGP images with `renderer`.
pub fn build_router<E>(renderer: Arc<OgpRenderer<E>>) -> Router
where
    E: Engine + 'static,
{
    Router::new()
        .route(OGP_PATH, get(get_ogp::<E>))
        .with_state(renderer)
}

/// Collect `title` and `date` from the query pairs.
///
/// Missing parameters are empty, unknown ones are ignored and repeated ones
/// are joined with commas.
pub fn parse_query(pairs: &[(String, String)]) -> OgpRequest {
    let join = |name: &str| {
        pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join(",")
    };
    OgpRequest {
        title: join("title"),
        date: join("date"),
    }
}

async fn get_ogp<E>(
    State(renderer): State<Arc<OgpRenderer<E>>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, RenderFailure>
where
    E: Engine + 'static,
{
    let request = parse_query(&pairs);
    let started = Instant::now();
    let image = renderer.render(&request).await?;
    log::info!(
        "Rendered OGP image (title: {} chars, date: {:?}) in {}ms, {} bytes",
        request.title.chars().count(),
        request.date,
        started.elapsed().as_millis(),
        image.len()
    );
    Ok((
        [
            (header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL)),
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
        ],
        image,
    )
        .into_response())
}
