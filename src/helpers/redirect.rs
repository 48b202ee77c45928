use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

pub const LOGIN_URL: &str = "/login";
pub const DEFAULT_REDIRECT: &str = "/";

/// Characters escaped in the `next` query parameter. Path separators stay readable.
const NEXT_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// `302 Found` pointing at `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Whether `target` stays on this site: a single leading `/`, no scheme-relative
/// `//`, no backslashes and no control characters.
pub fn is_safe_next(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(char::is_control)
}

/// The post-login destination: `next` when it is safe, `/` otherwise.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(target) if is_safe_next(target) => target,
        _ => DEFAULT_REDIRECT,
    }
}

pub fn login_url(next: &str) -> String {
    format!("{}?next={}", LOGIN_URL, utf8_percent_encode(next, NEXT_PARAM))
}

/// Send an anonymous visitor to the login page, remembering where they were going.
pub fn login_redirect(path_and_query: &str) -> Response {
    found(&login_url(path_and_query))
}
