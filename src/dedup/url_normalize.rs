//! URL canonicalization for duplicate detection.

use url::Url;

/// Query parameters that only carry tracking state and never change the
/// page a URL resolves to.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "msclkid",
    "igshid",
    "mc_cid",
    "mc_eid",
    "ref",
];

/// Key used by the exact-url pass: case-insensitive, scheme-insensitive
/// (http and https collapse), trailing slash stripped. No query rewriting.
#[must_use]
pub fn exact_key(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    without_scheme.trim_end_matches('/').to_string()
}

/// Key used by the normalized-url pass.
///
/// Beyond [`exact_key`], this strips known tracking query parameters,
/// removes default ports and fragments, and sorts the surviving query
/// parameters so equivalent URLs compare equal regardless of parameter
/// order. Unparseable input falls back to [`exact_key`].
#[must_use]
pub fn normalized_key(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw.trim()) else {
        return exact_key(raw);
    };

    parsed.set_fragment(None);

    if matches!(
        (parsed.scheme(), parsed.port()),
        ("http", Some(80)) | ("https", Some(443))
    ) {
        let _ = parsed.set_port(None);
    }

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    let query = if params.is_empty() {
        String::new()
    } else {
        let joined = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("?{joined}")
    };

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    let port = parsed.port().map_or(String::new(), |p| format!(":{p}"));
    let path = parsed.path().trim_end_matches('/').to_string();

    format!("{host}{port}{path}{query}")
}

/// Registrable host of a URL, lowercased, for `ignored_domains` checks.
#[must_use]
pub fn domain_of(raw: &str) -> Option<String> {
    Url::parse(raw.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_key_scheme_and_case_insensitive() {
        assert_eq!(
            exact_key("HTTPS://Example.COM/Page/"),
            exact_key("http://example.com/page")
        );
    }

    #[test]
    fn test_exact_key_keeps_query() {
        assert_ne!(
            exact_key("https://example.com/page?a=1"),
            exact_key("https://example.com/page?a=2")
        );
    }

    #[test]
    fn test_normalized_key_strips_tracking_params() {
        assert_eq!(
            normalized_key("https://example.com/page?q=rust&utm_source=x&gclid=abc"),
            normalized_key("https://example.com/page?q=rust")
        );
    }

    #[test]
    fn test_normalized_key_sorts_params() {
        assert_eq!(
            normalized_key("https://example.com/s?b=2&a=1"),
            normalized_key("https://example.com/s?a=1&b=2")
        );
    }

    #[test]
    fn test_normalized_key_drops_default_port_and_fragment() {
        assert_eq!(
            normalized_key("https://example.com:443/page#section"),
            normalized_key("https://example.com/page")
        );
    }

    #[test]
    fn test_normalized_key_keeps_custom_port() {
        assert_ne!(
            normalized_key("https://example.com:8080/page"),
            normalized_key("https://example.com/page")
        );
    }

    #[test]
    fn test_unparseable_falls_back_to_exact() {
        assert_eq!(normalized_key("not a url"), exact_key("not a url"));
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(
            domain_of("https://www.Example.com/a/b"),
            Some("example.com".to_string())
        );
        assert_eq!(domain_of("::"), None);
    }
}
