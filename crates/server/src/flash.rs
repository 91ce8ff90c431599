//! One-shot flash messages, carried in a cookie.
//!
//! A mutation sets the `flash` cookie on its redirect; the next landing or
//! detail read reports the message in its body and clears the cookie. No
//! server-side state.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};

use mediarank_api::Flash;

pub const FLASH_COOKIE: &str = "flash";

/// Pull one cookie value out of the request headers.
pub(crate) fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get(header::COOKIE)?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some((k, v)) = p.split_once('=') {
            if k == name {
                return Some(v.to_string());
            }
        }
    }
    None
}

/// Read the pending flash from the request, if any.
pub fn take(headers: &HeaderMap) -> Option<Flash> {
    let raw = parse_cookie(headers, FLASH_COOKIE)?;
    let json = urlencoding::decode(&raw).ok()?;
    serde_json::from_str(&json).ok()
}

/// Set-Cookie value carrying a flash across one redirect.
pub fn set_cookie(flash: &Flash) -> Option<(HeaderName, HeaderValue)> {
    let json = serde_json::to_string(flash).ok()?;
    let value = HeaderValue::from_str(&format!(
        "{FLASH_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        urlencoding::encode(&json)
    ))
    .ok()?;
    Some((header::SET_COOKIE, value))
}

/// Set-Cookie value that clears a consumed flash.
pub fn clear_cookie() -> (HeaderName, HeaderValue) {
    (
        header::SET_COOKIE,
        HeaderValue::from_static(
            "flash=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/; HttpOnly; SameSite=Lax",
        ),
    )
}

/// 303 redirect carrying a flash. Every mutation outcome ends here — no
/// outcome is silent.
pub fn redirect_with(to: &str, flash: Flash) -> Response {
    match set_cookie(&flash) {
        Some(cookie) => (AppendHeaders([cookie]), Redirect::to(to)).into_response(),
        None => Redirect::to(to).into_response(),
    }
}
