//! Repair and validation of user-supplied post URLs.
//!
//! Link-sharing systems often collapse `https://` into `https:/` when a URL is
//! pasted after a proxy host, so the scheme is repaired before parsing.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::error::{ResolveError, Result};
use crate::types::normalized::NormalizedUrl;

/// Hostname suffixes that indicate a file path rather than a domain.
pub const BLOCKED_HOST_SUFFIXES: &[&str] =
    &[".ico", ".html", ".php", ".css", ".png", ".jpg", ".jpeg"];

static GARBLED_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^http(s)?:/+").expect("valid scheme regex"));

/// Repair the scheme of `raw` and parse it as an absolute http(s) URL.
///
/// `http:/host` and `https:///host` become `http://host` and `https://host`;
/// input without any scheme gets `http://` prepended.
pub fn normalize(raw: &str) -> Result<NormalizedUrl> {
    let malformed = || ResolveError::MalformedUrl {
        input: raw.to_string(),
    };

    // A bare scheme stays bare so it fails to parse instead of becoming a host.
    let trimmed = raw.trim();
    let candidate = match GARBLED_SCHEME.captures(trimmed) {
        Some(captures) => {
            let scheme = if captures.get(1).is_some() {
                "https://"
            } else {
                "http://"
            };
            GARBLED_SCHEME.replace(trimmed, scheme).into_owned()
        }
        None => format!("http://{}", trimmed),
    };

    let url = Url::parse(&candidate).map_err(|_| malformed())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(malformed());
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(NormalizedUrl::new(url)),
        _ => Err(malformed()),
    }
}

/// Cheap filter against inputs that are clearly file paths, not domains.
///
/// Not a DNS or TLD check: the host only needs a dot and must not end in one
/// of [`BLOCKED_HOST_SUFFIXES`].
pub fn is_plausible_domain(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    host.contains('.')
        && !BLOCKED_HOST_SUFFIXES
            .iter()
            .any(|suffix| host.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_repairs_single_slash() {
        let url = normalize("http:/example.com").unwrap();
        assert_eq!(url.as_str(), "http://example.com/");
    }

    #[test]
    fn test_repairs_triple_slash_keeping_secure_flag() {
        let url = normalize("https:///example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");

        let url = normalize("HTTPS:/example.com/@alice/1").unwrap();
        assert_eq!(url.as_str(), "https://example.com/@alice/1");
    }

    #[test]
    fn test_prepends_scheme() {
        let url = normalize("example.social/@alice/112834090159532831").unwrap();
        assert_eq!(
            url.as_str(),
            "http://example.social/@alice/112834090159532831"
        );
    }

    #[test]
    fn test_keeps_well_formed_url() {
        let url = normalize("https://example.social/notes/abc?x=1").unwrap();
        assert_eq!(url.as_str(), "https://example.social/notes/abc?x=1");
        assert_eq!(url.path_and_query(), "/notes/abc?x=1");
        assert_eq!(url.host(), "example.social");
    }

    #[test]
    fn test_rejects_bare_scheme() {
        for raw in ["http://", "https:/", "https:///", "HTTP:/", " https:// "] {
            assert!(
                matches!(normalize(raw), Err(ResolveError::MalformedUrl { .. })),
                "{raw:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            normalize("exa mple.com/x"),
            Err(ResolveError::MalformedUrl { .. })
        ));
        assert!(matches!(
            normalize(""),
            Err(ResolveError::MalformedUrl { .. })
        ));
    }

    #[test]
    fn test_plausible_domain() {
        let check = |s: &str| is_plausible_domain(&Url::parse(s).unwrap());

        assert!(check("https://example.com/"));
        assert!(check("https://sub.example.social/@alice"));
        assert!(!check("http://example.png/"));
        assert!(!check("http://sub.example.php/"));
        assert!(!check("http://favicon.ico/"));
        assert!(!check("http://localhost/"));
    }

    proptest! {
        #[test]
        fn prop_garbled_scheme_repaired(
            secure in any::<bool>(),
            slashes in 1usize..=3,
            host in "[a-z]{1,12}\\.[a-z]{2,6}",
            path in "(/[a-z0-9]{1,8}){0,3}",
        ) {
            let scheme = if secure { "https" } else { "http" };
            let raw = format!("{}:{}{}{}", scheme, "/".repeat(slashes), host, path);
            let url = normalize(&raw).unwrap();

            prop_assert_eq!(url.scheme(), scheme);
            let expected_prefix = format!("{}://{}", scheme, host);
            prop_assert!(url.as_str().starts_with(&expected_prefix));
            prop_assert!(!url.as_str()[scheme.len() + 3..].starts_with('/'));
        }
    }
}
