//! URL resolution against an injected execution context.

use crate::error::HttpResult;
use crate::search::SearchPair;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Origin and protocol of the executing environment.
///
/// Injected rather than read from ambient state so resolution stays pure and
/// testable outside a browser-like host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlContext {
    /// Scheme + host (+ port), e.g. `https://h.test`.
    pub origin: String,
    /// Scheme with trailing colon, e.g. `https:`.
    pub protocol: String,
}

impl UrlContext {
    pub fn new(origin: impl Into<String>, protocol: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            protocol: protocol.into(),
        }
    }
}

fn absolute_pattern() -> &'static Regex {
    static ABSOLUTE: OnceLock<Regex> = OnceLock::new();
    ABSOLUTE.get_or_init(|| Regex::new(r"(?i)^https?://.+").expect("valid regex"))
}

/// Resolve a base path plus request path into an absolute URL.
///
/// First match wins: absolute `append` verbatim; scheme-relative `append`
/// prefixed with the context protocol; absolute `base` concatenated with
/// `append`; scheme-relative `base` prefixed then concatenated; otherwise
/// `origin + base + append`. Concatenation is verbatim — the caller owns the
/// slashes.
pub fn resolve(base: &str, append: &str, context: &UrlContext) -> HttpResult<Url> {
    let absolute = absolute_pattern();
    let raw = if absolute.is_match(append) {
        append.to_string()
    } else if append.starts_with("//") {
        format!("{}{}", context.protocol, append)
    } else if absolute.is_match(base) {
        format!("{base}{append}")
    } else if base.starts_with("//") {
        format!("{}{}{}", context.protocol, base, append)
    } else {
        format!("{}{}{}", context.origin, base, append)
    };
    Ok(Url::parse(&raw)?)
}

/// Write flattened pairs into the URL query with set semantics: the last
/// write for a key wins, duplicate keys never accumulate.
pub fn apply_search(url: &mut Url, pairs: &[SearchPair]) {
    if pairs.is_empty() {
        return;
    }
    let mut query: Vec<(String, String)> = url
        .query()
        .map(|q| {
            q.split('&')
                .filter(|part| !part.is_empty())
                .map(|part| match part.split_once('=') {
                    Some((key, value)) => (key.to_string(), value.to_string()),
                    None => (part.to_string(), String::new()),
                })
                .collect()
        })
        .unwrap_or_default();

    for pair in pairs {
        let key = urlencoding::encode(&pair.key).into_owned();
        match query.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = pair.value.clone(),
            None => query.push((key, pair.value.clone())),
        }
    }

    let joined = query
        .iter()
        .map(|(key, value)| {
            if value.is_empty() {
                format!("{key}=")
            } else {
                format!("{key}={value}")
            }
        })
        .collect::<Vec<_>>()
        .join("&");
    url.set_query(Some(&joined));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> UrlContext {
        UrlContext::new("https://h.test", "https:")
    }

    #[test]
    fn test_resolve_relative_base_and_path() {
        let url = resolve("/api", "/users", &ctx()).unwrap();
        assert_eq!(url.as_str(), "https://h.test/api/users");
    }

    #[test]
    fn test_resolve_absolute_append_wins() {
        let url = resolve("https://other.test", "https://direct.test/p", &ctx()).unwrap();
        assert_eq!(url.as_str(), "https://direct.test/p");
    }

    #[test]
    fn test_resolve_absolute_base() {
        let url = resolve("https://other.test", "/p", &ctx()).unwrap();
        assert_eq!(url.as_str(), "https://other.test/p");
    }

    #[test]
    fn test_resolve_scheme_relative_base() {
        let url = resolve("//cdn.test", "/p", &ctx()).unwrap();
        assert_eq!(url.as_str(), "https://cdn.test/p");
    }

    #[test]
    fn test_resolve_scheme_relative_append() {
        let url = resolve("/api", "//cdn.test/asset", &ctx()).unwrap();
        assert_eq!(url.as_str(), "https://cdn.test/asset");
    }

    #[test]
    fn test_resolve_pattern_is_case_insensitive() {
        let url = resolve("/api", "HTTPS://other.test/p", &ctx()).unwrap();
        assert_eq!(url.host_str(), Some("other.test"));
    }

    #[test]
    fn test_resolve_concatenates_verbatim() {
        // No separator is inserted between base and append.
        let url = resolve("https://h.test/api", "users", &ctx()).unwrap();
        assert_eq!(url.as_str(), "https://h.test/apiusers");
    }

    #[test]
    fn test_apply_search_sets_pairs() {
        let mut url = Url::parse("https://h.test/api").unwrap();
        apply_search(
            &mut url,
            &[
                SearchPair {
                    key: "a".into(),
                    value: "1".into(),
                },
                SearchPair {
                    key: "b".into(),
                    value: "2".into(),
                },
            ],
        );
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn test_apply_search_last_write_wins() {
        let mut url = Url::parse("https://h.test/api").unwrap();
        apply_search(
            &mut url,
            &[
                SearchPair {
                    key: "k".into(),
                    value: "1".into(),
                },
                SearchPair {
                    key: "k".into(),
                    value: "2".into(),
                },
            ],
        );
        assert_eq!(url.query(), Some("k=2"));
    }

    #[test]
    fn test_apply_search_overrides_existing_query() {
        let mut url = Url::parse("https://h.test/api?k=0&keep=1").unwrap();
        apply_search(
            &mut url,
            &[SearchPair {
                key: "k".into(),
                value: "9".into(),
            }],
        );
        assert_eq!(url.query(), Some("k=9&keep=1"));
    }

    #[test]
    fn test_apply_search_encodes_bracketed_keys() {
        let mut url = Url::parse("https://h.test/api").unwrap();
        apply_search(
            &mut url,
            &[SearchPair {
                key: "a[b]".into(),
                value: "1".into(),
            }],
        );
        assert_eq!(url.query(), Some("a%5Bb%5D=1"));
    }

    #[test]
    fn test_apply_search_empty_is_noop() {
        let mut url = Url::parse("https://h.test/api").unwrap();
        apply_search(&mut url, &[]);
        assert_eq!(url.query(), None);
    }
}
