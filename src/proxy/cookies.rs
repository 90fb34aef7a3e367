//! `set-cookie` rewriting for relayed responses.
//!
//! Cookies issued by the upstream are re-scoped to whatever host the caller
//! sees by dropping their `Domain` attribute.

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};

/// Remove every `Domain` attribute from a `set-cookie` value.
///
/// The leading `name=value` pair is never treated as an attribute, so a value
/// that happens to contain `domain=` is preserved.
pub fn strip_cookie_domain(cookie: &str) -> String {
    let mut segments = cookie.split(';');
    let mut stripped = String::with_capacity(cookie.len());

    if let Some(pair) = segments.next() {
        stripped.push_str(pair);
    }

    for attribute in segments {
        let name = attribute
            .split_once('=')
            .map_or(attribute, |(name, _)| name)
            .trim();
        if name.eq_ignore_ascii_case("domain") {
            continue;
        }
        stripped.push(';');
        stripped.push_str(attribute);
    }

    stripped
}

/// Apply [`strip_cookie_domain`] to every `set-cookie` header in place.
///
/// Values that are not valid UTF-8 are left untouched.
pub fn rewrite_set_cookie_headers(headers: &mut HeaderMap) {
    let rewritten: Vec<HeaderValue> = headers
        .get_all(SET_COOKIE)
        .iter()
        .map(rewrite_value)
        .collect();

    if rewritten.is_empty() {
        return;
    }

    headers.remove(SET_COOKIE);
    for value in rewritten {
        headers.append(SET_COOKIE, value);
    }
}

fn rewrite_value(value: &HeaderValue) -> HeaderValue {
    match value.to_str() {
        Ok(cookie) => HeaderValue::from_str(&strip_cookie_domain(cookie))
            .unwrap_or_else(|_| value.clone()),
        Err(_) => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_domain_attribute() {
        assert_eq!(
            strip_cookie_domain("sid=abc; Domain=example.com; Path=/; HttpOnly"),
            "sid=abc; Path=/; HttpOnly"
        );
        assert_eq!(
            strip_cookie_domain("sid=abc; Path=/; domain=example.com"),
            "sid=abc; Path=/"
        );
        assert_eq!(
            strip_cookie_domain("sid=abc;DOMAIN=.example.com;Secure"),
            "sid=abc;Secure"
        );
    }

    #[test]
    fn test_preserves_cookie_without_domain() {
        let cookie = "theme=dark; Expires=Wed, 21 Oct 2026 07:28:00 GMT; Secure; SameSite=Lax";
        assert_eq!(strip_cookie_domain(cookie), cookie);
    }

    #[test]
    fn test_value_containing_domain_is_kept() {
        assert_eq!(
            strip_cookie_domain("next=domain=example.com; Domain=example.com; Path=/"),
            "next=domain=example.com; Path=/"
        );
    }

    #[test]
    fn test_rewrite_all_set_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1; Domain=example.com"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2; Path=/"));
        headers.insert("x-other", HeaderValue::from_static("domain=keep"));

        rewrite_set_cookie_headers(&mut headers);

        let cookies: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2; Path=/"]);
        assert_eq!(headers.get("x-other").unwrap(), "domain=keep");
    }
}
