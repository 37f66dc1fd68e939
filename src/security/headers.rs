//! Security Response Headers
//!
//! A fixed header set attached to every guarded response.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

const CONTENT_SECURITY_POLICY: [&str; 7] = [
    "default-src 'self'",
    "script-src 'self' 'unsafe-inline' 'unsafe-eval'",
    "style-src 'self' 'unsafe-inline'",
    "img-src 'self' data: https:",
    "font-src 'self'",
    "connect-src 'self' http://localhost:9000 ws://localhost:*",
    "frame-ancestors 'none'",
];

const PERMISSIONS_POLICY: [&str; 5] = [
    "camera=()",
    "microphone=()",
    "geolocation=()",
    "payment=()",
    "usb=()",
];

/// Header name/value pairs in the order they are applied
pub fn security_headers() -> Vec<(HeaderName, HeaderValue)> {
    let csp = CONTENT_SECURITY_POLICY.join("; ");
    let permissions = PERMISSIONS_POLICY.join(", ");

    let mut headers = vec![
        (
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ),
        (
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ),
        (
            HeaderName::from_static("x-xss-protection"),
            HeaderValue::from_static("1; mode=block"),
        ),
        (
            HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_static("max-age=31536000; includeSubDomains; preload"),
        ),
        (
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ),
    ];

    // Both policies are assembled from static ASCII directives.
    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.push((HeaderName::from_static("content-security-policy"), value));
    }
    if let Ok(value) = HeaderValue::from_str(&permissions) {
        headers.push((HeaderName::from_static("permissions-policy"), value));
    }

    headers
}

/// Attach the security header set, replacing existing values
pub fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in security_headers() {
        headers.insert(name, value);
    }
}
