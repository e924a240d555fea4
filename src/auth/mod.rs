pub mod session;

use axum::http::header;
use axum::http::request::Parts;

/// Where to send a user after login. Only same-site relative paths are
/// honoured; anything naming a scheme or host falls back to `/`.
pub fn safe_redirect(next: Option<&str>) -> String {
    let Some(next) = next.map(str::trim).filter(|n| !n.is_empty()) else {
        return "/".to_string();
    };

    // "//host/path" and "/\host" are treated as network paths by browsers
    if !next.starts_with('/') || next.starts_with("//") || next.starts_with("/\\") {
        return "/".to_string();
    }

    match url::Url::parse(next) {
        Err(url::ParseError::RelativeUrlWithoutBase) => next.to_string(),
        _ => "/".to_string(),
    }
}

pub fn session_cookie(name: &str, token: &str, max_age_hours: Option<u64>) -> String {
    match max_age_hours {
        Some(hours) => format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            name,
            token,
            hours * 3600
        ),
        // No Max-Age: the cookie lasts for the browser session
        None => format!("{}={}; HttpOnly; SameSite=Lax; Path=/", name, token),
    }
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

pub fn get_cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}
