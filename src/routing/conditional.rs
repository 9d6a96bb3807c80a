//! Weak ETags and `If-None-Match` for served files.
//!
//! The file service answers `Range` and `If-Modified-Since` itself but sends
//! no ETag. Stages add a weak validator built from the file's size and
//! modification time (`W/"<size hex>-<mtime ms hex>"`) and answer a matching
//! `If-None-Match` with 304.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use axum::response::Response;
use std::time::UNIX_EPOCH;

/// Detach `If-None-Match` from a file request. When it is present
/// `If-Modified-Since` is ignored, so that header is dropped too and the file
/// service always answers with the full representation.
pub fn take_if_none_match(request: &mut Request<Body>) -> Option<HeaderValue> {
    let headers = request.headers_mut();
    let if_none_match = headers.remove(header::IF_NONE_MATCH)?;
    headers.remove(header::IF_MODIFIED_SINCE);
    Some(if_none_match)
}

/// Weak ETag for a 200 or 206 file response, from its `Last-Modified` and
/// the full file size.
pub fn weak_etag(status: StatusCode, headers: &HeaderMap) -> Option<HeaderValue> {
    let size = match status {
        StatusCode::OK => header_str(headers, header::CONTENT_LENGTH)?.parse::<u64>().ok()?,
        StatusCode::PARTIAL_CONTENT => header_str(headers, header::CONTENT_RANGE)?
            .rsplit('/')
            .next()?
            .parse::<u64>()
            .ok()?,
        _ => return None,
    };
    let modified = httpdate::parse_http_date(header_str(headers, header::LAST_MODIFIED)?).ok()?;
    let millis = modified.duration_since(UNIX_EPOCH).ok()?.as_millis();

    HeaderValue::from_str(&format!("W/\"{size:x}-{millis:x}\"")).ok()
}

/// Weak comparison of an `If-None-Match` list against `etag`.
pub fn etag_matches(if_none_match: &HeaderValue, etag: &HeaderValue) -> bool {
    let (Ok(list), Ok(etag)) = (if_none_match.to_str(), etag.to_str()) else {
        return false;
    };
    let etag = opaque(etag);
    list.split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || opaque(candidate) == etag)
}

/// Attach the ETag to a file response and turn it into a 304 when the
/// client already holds it.
pub fn finish(mut response: Response, if_none_match: Option<&HeaderValue>) -> Response {
    let Some(etag) = weak_etag(response.status(), response.headers()) else {
        return response;
    };

    if if_none_match.is_some_and(|inm| etag_matches(inm, &etag)) {
        let mut not_modified = Response::new(Body::empty());
        *not_modified.status_mut() = StatusCode::NOT_MODIFIED;
        if let Some(last_modified) = response.headers().get(header::LAST_MODIFIED) {
            not_modified
                .headers_mut()
                .insert(header::LAST_MODIFIED, last_modified.clone());
        }
        not_modified.headers_mut().insert(header::ETAG, etag);
        return not_modified;
    }

    response.headers_mut().insert(header::ETAG, etag);
    response
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name)?.to_str().ok()
}

fn opaque(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}
