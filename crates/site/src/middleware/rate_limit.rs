//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `unlock_rate_limiter`: gate submissions, on top of the gate's own lockout
//! - `edit_login_rate_limiter`: owner token attempts

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Key extractor that reads the client IP from proxy headers, then from the
/// socket address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        if let Some(ip) = headers
            .get("cf-connecting-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        // First IP in the chain
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for gate submissions: ~20 requests per minute per IP.
///
/// Configuration: 1 request every 3 seconds (replenish), burst of 10. The
/// gate locks itself after 5 failures; this bounds scripted guessing across
/// fresh sessions.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(3)` and `burst_size(10)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn unlock_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(3)
        .burst_size(10)
        .finish()
        .expect("rate limiter config with per_second(3) and burst_size(10) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for edit panel logins: ~10 requests per minute per IP.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn edit_login_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use tower_governor::key_extractor::KeyExtractor;

    fn request(header: (&str, &str)) -> Request<()> {
        Request::builder()
            .header(header.0, header.1)
            .body(())
            .unwrap()
    }

    #[test]
    fn test_forwarded_for_uses_first_hop() {
        let ip = ClientIpKeyExtractor
            .extract(&request(("x-forwarded-for", "203.0.113.7, 10.0.0.1")))
            .unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_connect_info_fallback() {
        let mut req = Request::builder().body(()).unwrap();
        assert!(ClientIpKeyExtractor.extract(&req).is_err());

        let addr: SocketAddr = "192.0.2.1:5000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(ClientIpKeyExtractor.extract(&req).unwrap(), addr.ip());
    }
}
