//! Glue between chain stages and tower-http's file services.

use axum::body::Body;
use axum::http::{request::Parts, Method, Request, StatusCode, Uri};
use axum::response::Response;
use std::path::Path;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::routing::conditional::{finish, take_if_none_match};

/// Static stages only answer GET and HEAD.
pub fn is_servable_method(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

/// Rebuild the request for a file service, rooted at `path` and keeping the
/// query, headers and method of the original.
pub fn sub_request(parts: &Parts, path: &str) -> Option<Request<Body>> {
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let uri: Uri = path_and_query.parse().ok()?;

    let mut request = Request::builder()
        .method(parts.method.clone())
        .uri(uri)
        .version(parts.version)
        .body(Body::empty())
        .ok()?;
    *request.headers_mut() = parts.headers.clone();
    Some(request)
}

/// Serve from a directory. A 404 means "not here" and yields `None` so the
/// chain can try the next stage. Found files carry a weak ETag.
pub async fn serve_from_dir(dir: &ServeDir, mut request: Request<Body>) -> Option<Response> {
    let if_none_match = take_if_none_match(&mut request);
    let response = match dir.clone().oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    if response.status() == StatusCode::NOT_FOUND {
        return None;
    }
    Some(finish(response.map(Body::new), if_none_match.as_ref()))
}

/// Serve one file regardless of the request path.
pub async fn serve_file(path: &Path, mut request: Request<Body>) -> Option<Response> {
    let if_none_match = take_if_none_match(&mut request);
    let response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    if response.status() == StatusCode::NOT_FOUND {
        return None;
    }
    Some(finish(response.map(Body::new), if_none_match.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn parts(uri: &str) -> Parts {
        let (parts, _) = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("if-none-match", "\"abc\"")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_sub_request_keeps_query_and_headers() {
        let request = sub_request(&parts("/dataset/uc.geojson?v=3"), "/uc.geojson").unwrap();
        assert_eq!(request.uri(), "/uc.geojson?v=3");
        assert_eq!(request.headers()["if-none-match"], "\"abc\"");
        assert_eq!(request.method(), Method::GET);
    }

    #[test]
    fn test_servable_methods() {
        assert!(is_servable_method(&Method::GET));
        assert!(is_servable_method(&Method::HEAD));
        assert!(!is_servable_method(&Method::POST));
        assert!(!is_servable_method(&Method::DELETE));
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let service = ServeDir::new(dir.path());
        let request = sub_request(&parts("/nope.csv"), "/nope.csv").unwrap();
        assert!(serve_from_dir(&service, request).await.is_none());
    }

    #[tokio::test]
    async fn test_traversal_stays_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();

        let service = ServeDir::new(&root);
        let request = sub_request(&parts("/../secret.txt"), "/../secret.txt").unwrap();
        assert!(serve_from_dir(&service, request).await.is_none());
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_if_none_match_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stops.csv"), "id,name\n1,Centro\n").unwrap();
        let service = ServeDir::new(dir.path());

        let first = serve_from_dir(&service, get("/stops.csv")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let etag = first.headers()[header::ETAG].clone();
        assert!(etag.to_str().unwrap().starts_with("W/\"11-"));

        let mut again = get("/stops.csv");
        again.headers_mut().insert(header::IF_NONE_MATCH, etag.clone());
        let response = serve_from_dir(&service, again).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers()[header::ETAG], etag);

        let mut stale = get("/stops.csv");
        stale
            .headers_mut()
            .insert(header::IF_NONE_MATCH, HeaderValue::from_static("W/\"0-0\""));
        let response = serve_from_dir(&service, stale).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_range_request() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stops.csv"), "id,name\n1,Centro\n").unwrap();
        let service = ServeDir::new(dir.path());

        let mut request = get("/stops.csv");
        request
            .headers_mut()
            .insert(header::RANGE, HeaderValue::from_static("bytes=0-1"));
        let response = serve_from_dir(&service, request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 0-1/17");
        assert!(response.headers().contains_key(header::ETAG));
        let body = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
        assert_eq!(&body[..], b"id");
    }
}
