//! Cookie parsing and `Set-Cookie` rendering.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

/// Session credential cookie.
pub const AUTH_COOKIE: &str = "auth";
/// Sign-in-with-wallet nonce cookie.
pub const NONCE_COOKIE: &str = "siwe-nonce";
pub const NONCE_MAX_AGE_SECS: u64 = 5 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    /// Needed for the auth cookie to survive navigation inside app webviews.
    Lax,
    Strict,
}

#[derive(Clone, Debug)]
pub struct SetCookie<'a> {
    pub name: &'a str,
    pub value: &'a str,
    pub max_age_secs: u64,
    pub same_site: SameSite,
    pub secure: bool,
}

impl SetCookie<'_> {
    /// Render as a `Set-Cookie` header value. Always `HttpOnly` and `Path=/`.
    pub fn render(&self) -> String {
        let same_site = match self.same_site {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
        };
        let mut out = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite={}",
            self.name, self.value, self.max_age_secs, same_site
        );
        if self.secure {
            out.push_str("; Secure");
        }
        out
    }
}

/// A `Set-Cookie` value that deletes `name`.
pub fn expire(name: &str, secure: bool) -> String {
    let mut out =
        format!("{name}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly");
    if secure {
        out.push_str("; Secure");
    }
    out
}

/// Value of the first cookie called `name` across all `Cookie` headers.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim_matches('"').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; auth=0xabc"));
        headers.append(COOKIE, HeaderValue::from_static("auth=ignored"));
        assert_eq!(read(&headers, AUTH_COOKIE).as_deref(), Some("0xabc"));
        assert_eq!(read(&headers, "missing"), None);
    }

    #[test]
    fn auth_cookie_attributes() {
        let cookie = SetCookie {
            name: AUTH_COOKIE,
            value: "0xabc",
            max_age_secs: 604_800,
            same_site: SameSite::Lax,
            secure: true,
        }
        .render();
        assert_eq!(
            cookie,
            "auth=0xabc; Path=/; Max-Age=604800; HttpOnly; SameSite=Lax; Secure"
        );
    }

    #[test]
    fn expiry_clears_value() {
        let cookie = expire(AUTH_COOKIE, false);
        assert!(cookie.starts_with("auth=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Secure"));
    }
}
