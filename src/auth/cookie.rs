use axum::http::{header, HeaderMap};

use crate::config::AuthConfig;

pub fn session_cookie(config: &AuthConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        config.cookie_name,
        token,
        config.session_max_age_secs()
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(config: &AuthConfig) -> String {
    let mut cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        config.cookie_name
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn get_cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
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

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_cookie_has_required_attributes() {
        let config = AuthConfig::default();
        let cookie = session_cookie(&config, "tok.sig");
        assert!(cookie.starts_with("parse_session=tok.sig;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn secure_flag_follows_config() {
        let config = AuthConfig {
            secure_cookie: true,
            ..AuthConfig::default()
        };
        assert!(session_cookie(&config, "t").ends_with("; Secure"));
        assert!(clear_session_cookie(&config).ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(&AuthConfig::default());
        assert!(cookie.starts_with("parse_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn finds_named_cookie_among_several() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("a=1; parse_session=abc.def; b=2"),
        );
        assert_eq!(get_cookie_value(&headers, "parse_session"), Some("abc.def"));
        assert_eq!(get_cookie_value(&headers, "theme"), Some("dark"));
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }
}
