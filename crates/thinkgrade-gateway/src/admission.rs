//! Admission control: origin allow-list and per-client rate limiting.
//!
//! Both checks run before any body parsing or LLM work.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::AdmissionConfig;

/// Returns the CORS headers for `origin` when it is allowed, `None` otherwise.
pub fn cors_headers(origin: Option<&str>, config: &AdmissionConfig) -> Option<HeaderMap> {
    let origin = origin?;
    if !is_allowed_origin(origin, config) {
        return None;
    }
    let origin = HeaderValue::from_str(origin).ok()?;

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        origin,
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("86400"),
    );
    Some(headers)
}

/// Exact match against the configured origin or the development origin.
pub fn is_allowed_origin(origin: &str, config: &AdmissionConfig) -> bool {
    let matches = |allowed: &str| !allowed.is_empty() && allowed == origin;
    matches(&config.allowed_origin) || matches(&config.dev_origin)
}

/// Identify the caller: `CF-Connecting-IP`, then the first `X-Forwarded-For`
/// hop, then the socket peer.
pub fn client_key(headers: &HeaderMap, peer: Option<std::net::SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(ip) = header("cf-connecting-ip") {
        return ip.to_string();
    }
    if let Some(first) = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    peer.map(|p| p.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Counter store behind the rate limiter.
///
/// The in-process implementation only limits a single gateway instance;
/// horizontally scaled deployments need a shared implementation.
pub trait RateLimitStore: Send + Sync {
    /// Count one request for `key` and return whether it is allowed.
    fn check_and_increment(&self, key: &str) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window counter held in process memory.
///
/// When `now > reset_at` the record is replaced wholesale; bursts across a
/// window boundary are not smoothed. Expired records are swept at most once
/// per window, so the table only holds clients seen in roughly the last two
/// windows.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<Windows>,
}

#[derive(Debug, Default)]
struct Windows {
    records: HashMap<String, WindowRecord>,
    next_sweep: Option<Instant>,
}

impl Windows {
    fn sweep(&mut self, now: Instant, window: Duration) {
        if self.next_sweep.is_some_and(|at| now <= at) {
            return;
        }
        self.records.retain(|_, r| now <= r.reset_at);
        self.next_sweep = Some(now + window);
    }
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Mutex::new(Windows::default()),
        }
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new(config.rate_limit, Duration::from_secs(config.window_secs))
    }

    /// [`RateLimitStore::check_and_increment`] at an explicit instant.
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        windows.sweep(now, self.window);

        let record = windows.records.entry(key.to_string()).or_insert(WindowRecord {
            count: 0,
            reset_at: now + self.window,
        });
        if now > record.reset_at {
            *record = WindowRecord {
                count: 0,
                reset_at: now + self.window,
            };
        }

        if record.count >= self.limit {
            return false;
        }
        record.count += 1;
        true
    }

    /// Current count for `key`, if it has a record.
    pub fn count(&self, key: &str) -> Option<u32> {
        let windows = self.windows.lock().ok()?;
        windows.records.get(key).map(|r| r.count)
    }

    /// Number of clients with a live or not yet swept record.
    pub fn tracked_clients(&self) -> usize {
        match self.windows.lock() {
            Ok(windows) => windows.records.len(),
            Err(poisoned) => poisoned.into_inner().records.len(),
        }
    }
}

impl RateLimitStore for FixedWindowLimiter {
    fn check_and_increment(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AdmissionConfig {
        AdmissionConfig {
            allowed_origin: "https://app.example.com".into(),
            ..AdmissionConfig::default()
        }
    }

    #[test]
    fn allowed_origins() {
        let config = config();
        assert!(is_allowed_origin("https://app.example.com", &config));
        assert!(is_allowed_origin("http://localhost:5173", &config));
        assert!(!is_allowed_origin("https://app.example.com/", &config));
        assert!(!is_allowed_origin("https://evil.example.com", &config));
        assert!(!is_allowed_origin("", &config));
    }

    #[test]
    fn empty_allowed_origin_matches_only_dev() {
        let config = AdmissionConfig::default();
        assert!(!is_allowed_origin("", &config));
        assert!(is_allowed_origin("http://localhost:5173", &config));
    }

    #[test]
    fn cors_headers_echo_origin() {
        let headers = cors_headers(Some("https://app.example.com"), &config()).unwrap();
        assert_eq!(
            headers["access-control-allow-origin"],
            "https://app.example.com"
        );
        assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
        assert_eq!(headers["access-control-max-age"], "86400");
    }

    #[test]
    fn no_cors_headers_for_unknown_or_missing_origin() {
        assert!(cors_headers(Some("https://other.example"), &config()).is_none());
        assert!(cors_headers(None, &config()).is_none());
    }

    #[test]
    fn client_key_precedence() {
        let peer: std::net::SocketAddr = "10.0.0.9:5555".parse().unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers, None), "unknown");
        assert_eq!(client_key(&headers, Some(peer)), "10.0.0.9");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.7");

        headers.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_key(&headers, Some(peer)), "198.51.100.2");
    }

    #[test]
    fn limit_th_request_allowed_next_denied() {
        let limiter = FixedWindowLimiter::new(10, Duration::from_secs(60));
        let start = Instant::now();

        for i in 0..10 {
            assert!(limiter.check_at("client", start), "request {} denied", i + 1);
        }
        assert!(!limiter.check_at("client", start));
        assert_eq!(limiter.count("client"), Some(10));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at("a", now));
        assert!(!limiter.check_at("a", now));
        assert!(limiter.check_at("b", now));
    }

    #[test]
    fn window_resets_only_after_it_elapses() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("c", start));
        assert!(limiter.check_at("c", start + Duration::from_secs(1)));
        // Exactly at the reset instant the window is still closed.
        assert!(!limiter.check_at("c", start + Duration::from_secs(60)));

        assert!(limiter.check_at("c", start + Duration::from_secs(61)));
        assert_eq!(limiter.count("c"), Some(1));
    }

    #[test]
    fn denied_requests_do_not_extend_window() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();

        assert!(limiter.check_at("d", start));
        for s in 1..=10 {
            assert!(!limiter.check_at("d", start + Duration::from_secs(s)));
        }
        assert!(limiter.check_at("d", start + Duration::from_millis(10_001)));
    }

    #[test]
    fn expired_clients_are_swept() {
        let limiter = FixedWindowLimiter::new(10, Duration::from_secs(60));
        let start = Instant::now();

        for i in 0..10_000 {
            assert!(limiter.check_at(&format!("198.51.100.{i}"), start));
        }
        assert_eq!(limiter.tracked_clients(), 10_000);

        assert!(limiter.check_at("203.0.113.1", start + Duration::from_secs(3600)));
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(limiter.count("198.51.100.0"), None);
    }

    #[test]
    fn sweep_keeps_open_windows() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("old", start));
        assert!(limiter.check_at("recent", start + Duration::from_secs(30)));
        assert!(limiter.check_at("recent", start + Duration::from_secs(30)));

        // Past the first sweep deadline: "old" expired, "recent" still closed.
        assert!(!limiter.check_at("recent", start + Duration::from_secs(61)));
        assert_eq!(limiter.count("old"), None);
        assert_eq!(limiter.count("recent"), Some(2));
    }

    #[test]
    fn from_config_uses_limits() {
        let config = AdmissionConfig {
            rate_limit: 1,
            ..AdmissionConfig::default()
        };
        let limiter = FixedWindowLimiter::from_config(&config);
        assert!(limiter.check_and_increment("x"));
        assert!(!limiter.check_and_increment("x"));
    }
}
