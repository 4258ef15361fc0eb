//! Input checks shared by several slices.

use std::fmt::Write as _;

pub const MAX_EMAIL_LENGTH: usize = 254;

/// Trims and lowercases an e-mail address.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Pragmatic address check: one `@`, a non-empty local part of at most 64 bytes and a
/// dotted domain without empty labels.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LENGTH || email.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

/// `http://` or `https://` URL with a host.
#[must_use]
pub fn is_http_url(url: &str) -> bool {
    url.strip_prefix("https://").or_else(|| url.strip_prefix("http://")).is_some_and(has_host)
}

/// `https://` URL with a host.
#[must_use]
pub fn is_https_url(url: &str) -> bool {
    url.strip_prefix("https://").is_some_and(has_host)
}

/// Percent-encodes everything except RFC 3986 unreserved characters, for query values and
/// path segments.
#[must_use]
pub fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

/// Non-empty host, and nothing that cannot travel in a `Location` header.
fn has_host(rest: &str) -> bool {
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    !host.is_empty() && !rest.chars().any(|ch| ch.is_whitespace() || ch.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_encoding() {
        assert_eq!(percent_encode("a-b_c.d~"), "a-b_c.d~");
        assert_eq!(percent_encode("https://x.io/?q=1&r"), "https%3A%2F%2Fx.io%2F%3Fq%3D1%26r");
        assert_eq!(percent_encode("ü"), "%C3%BC");
    }

    #[test]
    fn emails() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("ada lovelace@example.com"));
        assert!(!is_valid_email("ada@exa..mple.com"));
        assert!(!is_valid_email("ada@-example.com"));
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn urls() {
        assert!(is_http_url("http://example.com"));
        assert!(is_http_url("https://example.com/path?q=1"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("https://exa mple.com"));
        assert!(!is_http_url("https://example.com/\u{1}path"));
        assert!(!is_http_url("https://example.com/?q=\u{7f}"));
        assert!(!is_https_url("https://example.com\u{0}"));
        assert!(is_http_url("https://example.com/caf\u{e9}"));
        assert!(is_https_url("https://example.com"));
        assert!(!is_https_url("http://example.com"));
    }
}
