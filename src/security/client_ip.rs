//! Best-effort client address resolution.
//!
//! Sources, in order:
//! 1. `CF-Connecting-IP` (CDN-asserted connecting address)
//! 2. first entry of `X-Forwarded-For`
//! 3. the peer socket address
//! 4. `0.0.0.0`
//!
//! Nothing here validates that the result is a well-formed IP; it is only
//! used as an opaque key. Both headers are client-controlled unless the edge
//! in front of this service strips or overwrites them.

use axum::http::{HeaderMap, Uri};
use std::net::IpAddr;

use crate::security::sanitize::{sanitize_text, sanitize_url, trim_words};

pub const CF_CONNECTING_IP: &str = "cf-connecting-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Address used when no source yields a value.
pub const UNKNOWN_ADDRESS: &str = "0.0.0.0";

/// Words of the user agent kept in the audit log.
const USER_AGENT_WORDS: usize = 20;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
}

/// Pick the most specific client address available.
pub fn resolve_client_address(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    if let Some(ip) = header_str(headers, CF_CONNECTING_IP)
        .map(sanitize_text)
        .filter(|ip| !ip.is_empty())
    {
        return ip;
    }

    if let Some(ip) = header_str(headers, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .map(|first| sanitize_text(first.trim()))
        .filter(|ip| !ip.is_empty())
    {
        return ip;
    }

    peer.map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string())
}

/// What the guard knows about the client behind a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub address: String,
    pub user_agent: Option<String>,
    pub request_uri: Option<String>,
}

impl ClientContext {
    /// Context for a bare address, without request metadata.
    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Build the context from an incoming request.
    pub fn from_request(headers: &HeaderMap, peer: Option<IpAddr>, uri: &Uri) -> Self {
        let user_agent = header_str(headers, axum::http::header::USER_AGENT.as_str())
            .map(|ua| trim_words(ua, USER_AGENT_WORDS));
        let request_uri = uri
            .path_and_query()
            .map(|pq| sanitize_url(pq.as_str()))
            .filter(|u| !u.is_empty());

        Self {
            address: resolve_client_address(headers, peer),
            user_agent,
            request_uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    fn peer() -> Option<IpAddr> {
        Some("10.0.0.9".parse().unwrap())
    }

    #[test]
    fn test_cdn_header_wins() {
        let h = headers(&[
            (CF_CONNECTING_IP, "203.0.113.7"),
            (X_FORWARDED_FOR, "198.51.100.1, 10.0.0.1"),
        ]);
        assert_eq!(resolve_client_address(&h, peer()), "203.0.113.7");
    }

    #[test]
    fn test_first_forwarded_entry() {
        let h = headers(&[(X_FORWARDED_FOR, "  198.51.100.1 , 10.0.0.1")]);
        assert_eq!(resolve_client_address(&h, peer()), "198.51.100.1");
    }

    #[test]
    fn test_empty_headers_fall_through() {
        let h = headers(&[(CF_CONNECTING_IP, " "), (X_FORWARDED_FOR, ", 10.0.0.1")]);
        assert_eq!(resolve_client_address(&h, peer()), "10.0.0.9");
    }

    #[test]
    fn test_sentinel_without_sources() {
        assert_eq!(resolve_client_address(&HeaderMap::new(), None), UNKNOWN_ADDRESS);
    }

    #[test]
    fn test_value_is_not_validated() {
        let h = headers(&[(CF_CONNECTING_IP, "not-an-ip")]);
        assert_eq!(resolve_client_address(&h, None), "not-an-ip");
    }

    #[test]
    fn test_context_from_request() {
        let h = headers(&[
            ("user-agent", "Mozilla/5.0 (X11; Linux x86_64)"),
            (X_FORWARDED_FOR, "198.51.100.1"),
        ]);
        let uri: Uri = "/checkout?step=pay".parse().unwrap();
        let ctx = ClientContext::from_request(&h, peer(), &uri);

        assert_eq!(ctx.address, "198.51.100.1");
        assert_eq!(ctx.user_agent.as_deref(), Some("Mozilla/5.0 (X11; Linux x86_64)"));
        assert_eq!(ctx.request_uri.as_deref(), Some("/checkout?step=pay"));
    }
}
