//! SSRF protection for outbound fetches.
//!
//! Post URLs come straight from untrusted link shares, so every fetch made on
//! their behalf (robots.txt, instance info, ActivityPub objects) goes through
//! [`UrlValidator`] first. Redirects are followed by hand so each hop is
//! validated too.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::{debug, warn};
use url::{Host, Url};

use crate::error::{SecurityError, SecurityResult};

/// Redirect hops followed before the last 3xx response is returned as-is.
pub const MAX_REDIRECTS: usize = 5;

/// URL validator for SSRF protection.
///
/// Rejects:
/// - Non-HTTP(S) schemes (file://, ftp://)
/// - Internal hostnames (localhost, cloud metadata endpoints)
/// - IPs in private, loopback and link-local ranges, whether literal,
///   IPv4-mapped IPv6, or reached through DNS
#[derive(Debug, Clone)]
pub struct UrlValidator {
    /// Allowed URL schemes
    allowed_schemes: HashSet<String>,

    /// Blocked hostnames
    blocked_hosts: HashSet<String>,

    /// Blocked CIDR ranges
    blocked_cidrs: Vec<ipnet::IpNet>,

    /// Skip host and CIDR checks entirely
    allow_private: bool,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlValidator {
    /// Create a new URL validator with default security rules.
    pub fn new() -> Self {
        let blocked_cidrs = [
            "10.0.0.0/8",
            "172.16.0.0/12",
            "192.168.0.0/16",
            "100.64.0.0/10",  // Carrier-grade NAT
            "169.254.0.0/16", // Link-local / cloud metadata
            "127.0.0.0/8",    // Loopback
            "0.0.0.0/8",
            "::/128",
            "::1/128",   // IPv6 loopback
            "fc00::/7",  // IPv6 private
            "fe80::/10", // IPv6 link-local
        ]
        .into_iter()
        .filter_map(|cidr| cidr.parse().ok())
        .collect();

        Self {
            allowed_schemes: ["http", "https"]
                .into_iter()
                .map(String::from)
                .collect(),
            blocked_hosts: [
                "localhost",
                "metadata.google.internal",
                "metadata.gke.internal",
                "instance-data",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            blocked_cidrs,
            allow_private: false,
        }
    }

    /// A validator that only checks the scheme.
    pub fn permissive() -> Self {
        Self {
            allow_private: true,
            ..Self::new()
        }
    }

    /// Build from the pipeline's `allow_private_address` switch.
    pub fn for_private_access(allow_private: bool) -> Self {
        if allow_private {
            Self::permissive()
        } else {
            Self::new()
        }
    }

    /// Validate a URL for safety without touching the network.
    pub fn validate(&self, url: &Url) -> SecurityResult<()> {
        if !self.allowed_schemes.contains(url.scheme()) {
            return Err(SecurityError::DisallowedScheme(url.scheme().to_string()));
        }

        let host = url.host().ok_or(SecurityError::NoHost)?;
        if self.allow_private {
            return Ok(());
        }

        match host {
            Host::Domain(domain) => {
                // `localhost.` is the same host as `localhost`
                let domain = domain.trim_end_matches('.').to_ascii_lowercase();
                if domain.is_empty() || self.blocked_hosts.contains(&domain) {
                    return Err(SecurityError::BlockedHost(domain));
                }
                Ok(())
            }
            Host::Ipv4(ip) => self.check_ip(IpAddr::V4(ip)),
            Host::Ipv6(ip) => self.check_ip(IpAddr::V6(ip)),
        }
    }

    /// Validate a URL and resolve DNS to check the actual IP.
    ///
    /// This catches hostnames that resolve to internal addresses.
    pub async fn validate_with_dns(&self, url: &Url) -> SecurityResult<()> {
        self.validate(url)?;
        if self.allow_private {
            return Ok(());
        }

        // Literal IPs were checked above
        let Some(Host::Domain(domain)) = url.host() else {
            return Ok(());
        };
        let port = url.port_or_known_default().unwrap_or(80);

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((domain, port))
            .await
            .map_err(|e| SecurityError::DnsResolution(format!("{}: {}", domain, e)))?
            .collect();

        self.check_resolved(domain, &addrs)
    }

    fn check_resolved(&self, host: &str, addrs: &[SocketAddr]) -> SecurityResult<()> {
        for addr in addrs {
            if self.is_blocked_ip(addr.ip()) {
                return Err(SecurityError::BlockedCidr(format!(
                    "DNS for {} resolved to blocked IP {}",
                    host,
                    addr.ip()
                )));
            }
        }
        Ok(())
    }

    fn check_ip(&self, ip: IpAddr) -> SecurityResult<()> {
        if self.is_blocked_ip(ip) {
            return Err(SecurityError::BlockedCidr(ip.to_string()));
        }
        Ok(())
    }

    fn is_blocked_ip(&self, ip: IpAddr) -> bool {
        // ::ffff:127.0.0.1 is checked as 127.0.0.1
        let ip = ip.to_canonical();
        self.blocked_cidrs.iter().any(|cidr| cidr.contains(&ip))
    }
}

/// Failure of a [`send_validated`] request.
#[derive(Debug)]
pub(crate) enum RequestError {
    Security(SecurityError),
    Transport(reqwest::Error),
}

/// Build a client that never follows redirects on its own.
pub(crate) fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// GET `url`, validating it and every redirect target (DNS included) before
/// connecting.
///
/// After [`MAX_REDIRECTS`] hops the last redirect response is returned
/// unfollowed.
pub(crate) async fn send_validated(
    client: &reqwest::Client,
    validator: &UrlValidator,
    url: &Url,
    accept: Option<&str>,
) -> Result<reqwest::Response, RequestError> {
    let mut current = url.clone();
    let mut hops = 0;

    loop {
        validator
            .validate_with_dns(&current)
            .await
            .map_err(RequestError::Security)?;

        let mut request = client.get(current.clone());
        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }
        let response = request.send().await.map_err(RequestError::Transport)?;

        let Some(next) = redirect_target(&current, response.status(), response.headers()) else {
            return Ok(response);
        };
        if hops == MAX_REDIRECTS {
            warn!(url = %url, hops, "Redirect limit reached");
            return Ok(response);
        }

        debug!(from = %current, to = %next, "Following redirect");
        hops += 1;
        current = next;
    }
}

/// The absolute target of a redirect response, if it is one.
fn redirect_target(
    base: &Url,
    status: reqwest::StatusCode,
    headers: &reqwest::header::HeaderMap,
) -> Option<Url> {
    if !status.is_redirection() {
        return None;
    }
    let location = headers.get(reqwest::header::LOCATION)?.to_str().ok()?;
    base.join(location).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, LOCATION};
    use reqwest::StatusCode;

    fn check(validator: &UrlValidator, url: &str) -> SecurityResult<()> {
        validator.validate(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_public_hosts_pass() {
        let validator = UrlValidator::new();
        assert!(check(&validator, "https://example.social/@alice/1").is_ok());
        assert!(check(&validator, "http://93.184.216.34/robots.txt").is_ok());
        assert!(check(&validator, "http://[::ffff:93.184.216.34]/").is_ok());
    }

    #[test]
    fn test_blocks_internal_targets() {
        let validator = UrlValidator::new();
        assert!(matches!(
            check(&validator, "http://localhost/robots.txt"),
            Err(SecurityError::BlockedHost(_))
        ));
        assert!(matches!(
            check(&validator, "http://192.168.1.10/api/v1/instance"),
            Err(SecurityError::BlockedCidr(_))
        ));
        assert!(matches!(
            check(&validator, "http://[::1]/"),
            Err(SecurityError::BlockedCidr(_))
        ));
        assert!(matches!(
            check(&validator, "file:///etc/passwd"),
            Err(SecurityError::DisallowedScheme(_))
        ));
    }

    #[test]
    fn test_blocks_disguised_internal_targets() {
        let validator = UrlValidator::new();
        for url in [
            "http://[::ffff:127.0.0.1]/",
            "http://[::ffff:169.254.169.254]/latest/meta-data",
            "http://[::ffff:10.0.0.1]:8080/api/v1/instance",
        ] {
            assert!(
                matches!(check(&validator, url), Err(SecurityError::BlockedCidr(_))),
                "{url} should be blocked"
            );
        }
        for url in ["http://localhost./", "http://LOCALHOST/", "http://metadata.google.internal./"] {
            assert!(
                matches!(check(&validator, url), Err(SecurityError::BlockedHost(_))),
                "{url} should be blocked"
            );
        }
    }

    #[test]
    fn test_resolved_addresses_are_checked() {
        let validator = UrlValidator::new();
        let public: SocketAddr = "93.184.216.34:443".parse().unwrap();
        let private: SocketAddr = "10.1.2.3:443".parse().unwrap();
        let mapped: SocketAddr = "[::ffff:127.0.0.1]:443".parse().unwrap();

        assert!(validator.check_resolved("example.social", &[public]).is_ok());
        assert!(validator
            .check_resolved("rebind.example", &[public, private])
            .is_err());
        assert!(validator.check_resolved("rebind.example", &[mapped]).is_err());
    }

    #[tokio::test]
    async fn test_validate_with_dns_rejects_literals_without_lookup() {
        let validator = UrlValidator::new();
        let url = Url::parse("http://[::ffff:127.0.0.1]:8080/").unwrap();
        assert!(matches!(
            validator.validate_with_dns(&url).await,
            Err(SecurityError::BlockedCidr(_))
        ));
    }

    #[test]
    fn test_permissive_still_checks_scheme() {
        let validator = UrlValidator::permissive();
        assert!(check(&validator, "http://127.0.0.1:3000/users/alice").is_ok());
        assert!(check(&validator, "ftp://example.com/").is_err());
    }

    #[test]
    fn test_redirect_target() {
        let base = Url::parse("https://example.social/@alice/1").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("/users/alice/statuses/1"));

        assert_eq!(
            redirect_target(&base, StatusCode::MOVED_PERMANENTLY, &headers)
                .unwrap()
                .as_str(),
            "https://example.social/users/alice/statuses/1"
        );
        assert_eq!(redirect_target(&base, StatusCode::OK, &headers), None);
        assert_eq!(
            redirect_target(&base, StatusCode::FOUND, &HeaderMap::new()),
            None
        );
    }

    #[test]
    fn test_redirect_to_internal_host_fails_validation() {
        let validator = UrlValidator::new();
        let base = Url::parse("https://example.social/@alice/1").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            LOCATION,
            HeaderValue::from_static("http://[::ffff:169.254.169.254]/latest/meta-data"),
        );

        let next = redirect_target(&base, StatusCode::FOUND, &headers).unwrap();
        assert!(matches!(
            validator.validate(&next),
            Err(SecurityError::BlockedCidr(_))
        ));
    }
}
