//! Rejects state-changing requests a browser sent from another origin.
//!
//! Safe methods always pass. For anything else the browser-provided
//! `Sec-Fetch-Site` header decides when present; otherwise `Origin` must name
//! the same host the request was sent to. Requests carrying neither header
//! (curl, scripts, other services) are not browser cross-origin requests and
//! pass unchanged.

use axum::{
    Json,
    extract::Request,
    http::{HeaderMap, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

const SEC_FETCH_SITE: &str = "sec-fetch-site";

pub async fn cross_origin_protection(request: Request, next: Next) -> Response {
    if is_cross_origin_write(request.method(), request.headers()) {
        tracing::info!(method = %request.method(), "rejected cross-origin request");
        let body = serde_json::json!({ "error": "Cross-origin request rejected" });
        return (StatusCode::FORBIDDEN, Json(body)).into_response();
    }

    next.run(request).await
}

fn is_cross_origin_write(method: &Method, headers: &HeaderMap) -> bool {
    if matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS) {
        return false;
    }

    if let Some(site) = headers.get(SEC_FETCH_SITE) {
        return !matches!(site.as_bytes(), b"same-origin" | b"none");
    }

    let Some(origin) = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    origin_host(origin) != Some(host)
}

/// `https://example.com:8443` → `example.com:8443`. Opaque origins (`null`)
/// have no host.
fn origin_host(origin: &str) -> Option<&str> {
    origin
        .split_once("://")
        .map(|(_, rest)| rest.trim_end_matches('/'))
        .filter(|host| !host.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn safe_methods_always_pass() {
        let h = headers(&[(SEC_FETCH_SITE, "cross-site")]);

        assert!(!is_cross_origin_write(&Method::GET, &h));
        assert!(!is_cross_origin_write(&Method::HEAD, &h));
        assert!(!is_cross_origin_write(&Method::OPTIONS, &h));
    }

    #[test]
    fn non_browser_requests_pass() {
        assert!(!is_cross_origin_write(&Method::POST, &HeaderMap::new()));
        assert!(!is_cross_origin_write(
            &Method::DELETE,
            &headers(&[("host", "cubby.example")])
        ));
    }

    #[test]
    fn sec_fetch_site_decides_when_present() {
        for (site, rejected) in [
            ("same-origin", false),
            ("none", false),
            ("same-site", true),
            ("cross-site", true),
        ] {
            let h = headers(&[(SEC_FETCH_SITE, site), ("origin", "https://cubby.example")]);
            assert_eq!(is_cross_origin_write(&Method::POST, &h), rejected, "{site}");
        }
    }

    #[test]
    fn origin_must_match_host() {
        let same = headers(&[("origin", "https://cubby.example"), ("host", "cubby.example")]);
        let other = headers(&[("origin", "https://evil.example"), ("host", "cubby.example")]);
        let opaque = headers(&[("origin", "null"), ("host", "cubby.example")]);

        assert!(!is_cross_origin_write(&Method::POST, &same));
        assert!(is_cross_origin_write(&Method::POST, &other));
        assert!(is_cross_origin_write(&Method::DELETE, &opaque));
    }

    #[test]
    fn origin_host_keeps_port() {
        assert_eq!(origin_host("http://localhost:8080"), Some("localhost:8080"));
        assert_eq!(origin_host("null"), None);
    }
}
