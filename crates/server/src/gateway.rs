//! Gateway fallback: every request that misses the proxy routes lands here.
//!
//! Incoming paths are resolved to absolute URLs before classification:
//! `/cdn/...` maps onto the image CDN, `/ext/{host}/...` onto an arbitrary
//! external origin over https, and everything else onto the app shell.
//! Served responses carry an `x-cache: hit|miss` header so callers can see
//! whether the partition store or the network answered.

use axum::Json;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use reelgate_client::canonicalize;
use reelgate_core::worker::{Destination, Intercept, RequestInfo, Source};
use reelgate_core::{Classifier, Error, FetchedResponse, Lifecycle, StoredResponse};

use crate::context::AppContext;
use crate::error::ApiError;

static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

pub async fn handle(State(ctx): State<AppContext>, req: Request) -> Response {
    let info = match resolve(ctx.manager.classifier(), req.method().as_str(), req.uri(), req.headers()) {
        Ok(info) => info,
        Err(e) => return e.into_response(),
    };

    match ctx.manager.intercept(&info).await {
        Ok(Intercept::Respond { response, source }) => serve_stored(response, source),
        Ok(Intercept::PassThrough) => pass_through(&ctx, &info).await,
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Map an incoming gateway path onto the absolute URL it stands for.
fn resolve(classifier: &Classifier, method: &str, uri: &Uri, headers: &HeaderMap) -> Result<RequestInfo, ApiError> {
    let path = uri.path();

    let url = if let Some(rest) = path.strip_prefix("/cdn/") {
        let mut target = classifier.image_cdn_origin().clone();
        target.set_path(&format!("/{rest}"));
        target.set_query(uri.query());
        target
    } else if let Some(rest) = path.strip_prefix("/ext/") {
        let (host, remainder) = rest.split_once('/').unwrap_or((rest, ""));
        if host.is_empty() {
            return Err(ApiError::bad_request("Missing external host"));
        }
        let mut target = canonicalize(&format!("{host}/{remainder}"))
            .map_err(|_| ApiError::bad_request("Invalid external host"))?;
        target.set_query(uri.query());
        target
    } else {
        let mut target = classifier.shell_origin().clone();
        target.set_path(path);
        target.set_query(uri.query());
        target
    };

    Ok(RequestInfo {
        method: method.to_string(),
        url,
        navigation: is_navigation(headers),
        destination: destination_of(headers, path),
    })
}

fn is_navigation(headers: &HeaderMap) -> bool {
    if headers.get("sec-fetch-mode").and_then(|v| v.to_str().ok()) == Some("navigate") {
        return true;
    }
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Prefer the browser's `Sec-Fetch-Dest` hint; fall back to the extension.
fn destination_of(headers: &HeaderMap, path: &str) -> Destination {
    if let Some(dest) = headers.get("sec-fetch-dest").and_then(|v| v.to_str().ok()) {
        return match dest {
            "document" => Destination::Document,
            "image" => Destination::Image,
            "font" => Destination::Font,
            "script" => Destination::Script,
            "style" => Destination::Style,
            _ => Destination::Other,
        };
    }

    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("html") => Destination::Document,
        Some("js") => Destination::Script,
        Some("css") => Destination::Style,
        Some("png" | "jpg" | "jpeg" | "webp" | "gif" | "svg" | "ico") => Destination::Image,
        Some("woff" | "woff2" | "ttf" | "otf") => Destination::Font,
        _ => Destination::Other,
    }
}

/// A response served by a caching strategy, tagged with its source.
fn serve_stored(stored: StoredResponse, source: Source) -> Response {
    // Opaque entries carry status 0; serve them as 200 like the platform does.
    let status = StatusCode::from_u16(stored.status).unwrap_or(StatusCode::OK);
    let tag = match source {
        Source::Cache => "hit",
        Source::Network => "miss",
    };
    build(status, stored.content_type.as_deref(), Some(tag), stored.body)
}

/// Proxy a bypassed or non-handled request straight to the network.
async fn pass_through(ctx: &AppContext, info: &RequestInfo) -> Response {
    if info.method != "GET" {
        return (StatusCode::METHOD_NOT_ALLOWED, Json(json!({ "error": "Method not allowed" }))).into_response();
    }

    match ctx.fetcher.fetch(&info.url, false).await {
        Ok(FetchedResponse { status, content_type, body, .. }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            build(status, content_type.as_deref(), None, body.to_vec())
        }
        Err(e @ (Error::Fetch(_) | Error::FetchTimeout(_) | Error::FetchTooLarge(_))) => {
            tracing::warn!(url = %info.url, error = %e, "pass-through fetch failed");
            ApiError::from(e).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

fn build(status: StatusCode, content_type: Option<&str>, cache_tag: Option<&'static str>, body: Vec<u8>) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(ct).ok()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    if let Some(tag) = cache_tag {
        response
            .headers_mut()
            .insert(X_CACHE.clone(), HeaderValue::from_static(tag));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelgate_core::AppConfig;

    fn classifier() -> Classifier {
        Classifier::from_config(&AppConfig::default()).unwrap()
    }

    fn resolve_path(path: &str) -> RequestInfo {
        let uri: Uri = path.parse().unwrap();
        resolve(&classifier(), "GET", &uri, &HeaderMap::new()).unwrap()
    }

    #[test]
    fn test_resolve_cdn_path_maps_to_image_cdn() {
        let info = resolve_path("/cdn/t/p/w500/poster.jpg");
        assert_eq!(info.url.as_str(), "https://image.tmdb.org/t/p/w500/poster.jpg");
    }

    #[test]
    fn test_resolve_ext_path_maps_to_external_origin() {
        let info = resolve_path("/ext/fonts.gstatic.com/s/inter.woff2");
        assert_eq!(info.url.as_str(), "https://fonts.gstatic.com/s/inter.woff2");
    }

    #[test]
    fn test_resolve_ext_keeps_query() {
        let info = resolve_path("/ext/fonts.googleapis.com/css2?family=Inter");
        assert_eq!(info.url.as_str(), "https://fonts.googleapis.com/css2?family=Inter");
    }

    #[test]
    fn test_resolve_plain_path_maps_to_shell() {
        let info = resolve_path("/script.js");
        assert_eq!(info.url.as_str(), "http://localhost:3000/script.js");
        assert_eq!(info.destination, Destination::Script);
    }

    #[test]
    fn test_resolve_rejects_empty_ext_host() {
        let uri: Uri = "/ext/".parse().unwrap();
        let err = resolve(&classifier(), "GET", &uri, &HeaderMap::new()).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_navigation_detected_from_fetch_mode() {
        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        let uri: Uri = "/deep/link".parse().unwrap();
        let info = resolve(&classifier(), "GET", &uri, &headers).unwrap();
        assert!(info.navigation);
    }

    #[test]
    fn test_navigation_detected_from_accept_header() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));
        let uri: Uri = "/".parse().unwrap();
        let info = resolve(&classifier(), "GET", &uri, &headers).unwrap();
        assert!(info.navigation);
    }

    #[test]
    fn test_fetch_dest_hint_beats_extension() {
        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-dest", HeaderValue::from_static("image"));
        let uri: Uri = "/asset.bin".parse().unwrap();
        let info = resolve(&classifier(), "GET", &uri, &headers).unwrap();
        assert_eq!(info.destination, Destination::Image);
    }

    #[test]
    fn test_serve_stored_tags_cache_hit() {
        let stored = StoredResponse::new("p", "http://localhost:3000/a.css", 200, false, Some("text/css".into()), b"x".to_vec());
        let response = serve_stored(stored, Source::Cache);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-cache").unwrap(), "hit");
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/css");
    }

    #[test]
    fn test_serve_stored_tags_network_miss() {
        let stored = StoredResponse::new("p", "http://localhost:3000/a.js", 200, false, None, b"x".to_vec());
        let response = serve_stored(stored, Source::Network);
        assert_eq!(response.headers().get("x-cache").unwrap(), "miss");
    }

    #[test]
    fn test_serve_stored_opaque_status_defaults_to_ok() {
        let stored = StoredResponse::new("p", "https://cdn.example.net/x", 0, true, None, Vec::new());
        let response = serve_stored(stored, Source::Cache);
        assert_eq!(response.status(), StatusCode::OK);
    }
}
