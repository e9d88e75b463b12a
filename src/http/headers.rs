//! Header manipulation for forwarded requests.
//!
//! # Responsibilities
//! - Append X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//! - Strip hop-by-hop headers
//!
//! # Design Decisions
//! - Existing X-Forwarded-* values are kept and extended, never replaced
//! - Response headers are not touched; upstream responses pass verbatim

use std::net::IpAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Check if a header is a hop-by-hop header that should not be forwarded.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name) || name.as_str() == "trailers"
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let doomed: Vec<HeaderName> = headers
        .keys()
        .filter(|name| is_hop_by_hop(name) || listed.contains(name))
        .cloned()
        .collect();

    for name in doomed {
        headers.remove(name);
    }
}

/// Append the client address, protocol and original host to the
/// `X-Forwarded-*` headers.
pub fn append_forwarded(headers: &mut HeaderMap, client_ip: IpAddr, proto: &str, host: Option<&str>) {
    append_value(headers, X_FORWARDED_FOR, &client_ip.to_string());
    append_value(headers, X_FORWARDED_PROTO, proto);
    if let Some(host) = host {
        append_value(headers, X_FORWARDED_HOST, host);
    }
}

fn append_value(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    let existing: Vec<&str> = headers
        .get_all(&name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();

    let merged = if existing.is_empty() {
        value.to_string()
    } else {
        format!("{}, {}", existing.join(", "), value)
    };

    match HeaderValue::from_str(&merged) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => {
            tracing::debug!(header = %name, "Dropping unrepresentable forwarded header value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_by_hop_headers() {
        assert!(is_hop_by_hop(&header::CONNECTION));
        assert!(is_hop_by_hop(&HeaderName::from_static("keep-alive")));
        assert!(is_hop_by_hop(&header::TRANSFER_ENCODING));
        assert!(is_hop_by_hop(&header::UPGRADE));
        assert!(is_hop_by_hop(&header::PROXY_AUTHORIZATION));

        assert!(!is_hop_by_hop(&header::CONTENT_TYPE));
        assert!(!is_hop_by_hop(&header::AUTHORIZATION));
        assert!(!is_hop_by_hop(&header::HOST));
    }

    #[test]
    fn strips_connection_listed_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, "keep-alive, X-Debug-Token".parse().unwrap());
        headers.insert("keep-alive", "timeout=5".parse().unwrap());
        headers.insert("x-debug-token", "abc".parse().unwrap());
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());

        strip_hop_by_hop(&mut headers);

        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get("keep-alive").is_none());
        assert!(headers.get("x-debug-token").is_none());
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn adds_forwarded_headers() {
        let mut headers = HeaderMap::new();
        append_forwarded(&mut headers, "192.0.2.10".parse().unwrap(), "http", Some("shop.example"));

        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "192.0.2.10");
        assert_eq!(headers.get(X_FORWARDED_PROTO).unwrap(), "http");
        assert_eq!(headers.get(X_FORWARDED_HOST).unwrap(), "shop.example");
    }

    #[test]
    fn merges_with_existing_values() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, "203.0.113.5".parse().unwrap());
        headers.append(X_FORWARDED_FOR, "198.51.100.7".parse().unwrap());
        headers.insert(X_FORWARDED_PROTO, "https".parse().unwrap());
        headers.insert(X_FORWARDED_HOST, "edge.example".parse().unwrap());

        append_forwarded(&mut headers, "10.0.0.1".parse().unwrap(), "http", Some("gateway:8000"));

        assert_eq!(
            headers.get(X_FORWARDED_FOR).unwrap(),
            "203.0.113.5, 198.51.100.7, 10.0.0.1"
        );
        assert_eq!(headers.get_all(X_FORWARDED_FOR).iter().count(), 1);
        assert_eq!(headers.get(X_FORWARDED_PROTO).unwrap(), "https, http");
        assert_eq!(headers.get(X_FORWARDED_HOST).unwrap(), "edge.example, gateway:8000");
    }

    #[test]
    fn ipv6_client() {
        let mut headers = HeaderMap::new();
        append_forwarded(&mut headers, "::1".parse().unwrap(), "http", None);
        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "::1");
        assert!(headers.get(X_FORWARDED_HOST).is_none());
    }
}
