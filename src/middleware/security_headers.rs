//! Response hardening headers.
//!
//! Responses here can carry bearer tokens, so on top of the usual browser
//! protections they are marked non-cacheable.

use axum::Router;
use axum::http::header::{self, HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

const HEADERS: &[(&str, &str)] = &[
    ("x-frame-options", "DENY"),
    ("content-security-policy", "frame-ancestors 'none'"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "no-referrer"),
];

pub fn apply(router: Router) -> Router {
    let router = HEADERS.iter().fold(router, |router, &(name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    });

    router.layer(SetResponseHeaderLayer::if_not_present(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    ))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn hardening_headers_are_present() {
        let app = apply(Router::new().route("/", get(|| async { "ok" })));
        let res = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        for (name, value) in HEADERS {
            assert_eq!(res.headers()[*name], *value);
        }
        assert_eq!(res.headers()[header::CACHE_CONTROL], "no-store");
    }
}
