//! Per-client request rate limiting
//!
//! Each policy admits at most `max_requests` per client inside a sliding
//! window. The window log lives in process memory, so limits are per
//! instance.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::config::{RateLimitConfig, RateLimitPolicyConfig};
use crate::core::error::AppError;

static RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Every `/api` request
    Api,
    /// Report submission
    Upload,
    /// Business creation
    Create,
}

impl Policy {
    pub fn message(&self) -> &'static str {
        match self {
            Policy::Api => "Too many requests from this IP, please try again later.",
            Policy::Upload => "Too many upload requests from this IP, please try again later.",
            Policy::Create => "Too many creation requests from this IP, please try again later.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::Api => "api",
            Policy::Upload => "upload",
            Policy::Create => "create",
        }
    }
}

/// Outcome of one admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the oldest counted request leaves the window
    pub reset_after: Duration,
}

impl Decision {
    fn reset_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    fn apply_headers(&self, headers: &mut HeaderMap) {
        let values = [
            (&RATELIMIT_LIMIT, self.limit as u64),
            (&RATELIMIT_REMAINING, self.remaining as u64),
            (&RATELIMIT_RESET, self.reset_secs()),
        ];
        // The innermost (most specific) policy wins
        for (name, value) in values {
            headers
                .entry(name.clone())
                .or_insert_with(|| HeaderValue::from(value));
        }
    }
}

type WindowKey = (Policy, String);

pub struct RateLimiter {
    config: RateLimitConfig,
    trust_proxy: bool,
    windows: Mutex<HashMap<WindowKey, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, trust_proxy: bool) -> Self {
        tracing::info!(
            "Rate limiter initialized: api={}/{}s, upload={}/{}s, create={}/{}s",
            config.api.max_requests,
            config.api.window.as_secs(),
            config.upload.max_requests,
            config.upload.window.as_secs(),
            config.create.max_requests,
            config.create.window.as_secs()
        );
        Self {
            config,
            trust_proxy,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn policy_config(&self, policy: Policy) -> RateLimitPolicyConfig {
        match policy {
            Policy::Api => self.config.api,
            Policy::Upload => self.config.upload,
            Policy::Create => self.config.create,
        }
    }

    fn windows(&self) -> MutexGuard<'_, HashMap<WindowKey, VecDeque<Instant>>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn check(&self, policy: Policy, client: &str) -> Decision {
        self.check_at(policy, client, Instant::now())
    }

    /// Admit or reject one request at `now`. Rejected requests are not counted.
    pub fn check_at(&self, policy: Policy, client: &str, now: Instant) -> Decision {
        let cfg = self.policy_config(policy);
        let mut windows = self.windows();
        let log = windows.entry((policy, client.to_string())).or_default();

        while log
            .front()
            .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= cfg.window)
        {
            log.pop_front();
        }

        let allowed = (log.len() as u32) < cfg.max_requests;
        if allowed {
            log.push_back(now);
        }

        let reset_after = log
            .front()
            .map(|oldest| cfg.window.saturating_sub(now.saturating_duration_since(*oldest)))
            .unwrap_or(cfg.window);

        Decision {
            allowed,
            limit: cfg.max_requests,
            remaining: cfg.max_requests.saturating_sub(log.len() as u32),
            reset_after,
        }
    }

    /// Drop every window whose requests have all expired
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut windows = self.windows();
        let before = windows.len();
        let (api, upload, create) = (self.config.api, self.config.upload, self.config.create);

        windows.retain(|(policy, _), log| {
            let window = match policy {
                Policy::Api => api.window,
                Policy::Upload => upload.window,
                Policy::Create => create.window,
            };
            log.back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < window)
        });

        before - windows.len()
    }

    /// Periodically purge expired windows so idle clients do not accumulate
    pub fn spawn_purge_task(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.purge_expired();
                if removed > 0 {
                    debug!("Purged {} expired rate limit windows", removed);
                }
            }
        })
    }

    /// Client identity: first `X-Forwarded-For` hop behind a trusted proxy,
    /// otherwise the peer address
    pub fn client_key(&self, request: &Request) -> String {
        if self.trust_proxy {
            let forwarded = request
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|ip| !ip.is_empty());
            if let Some(ip) = forwarded {
                return ip.to_string();
            }
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Middleware state: the shared limiter plus the policy a route enforces
#[derive(Clone)]
pub struct RateLimitState {
    limiter: Arc<RateLimiter>,
    policy: Policy,
}

impl RateLimitState {
    pub fn new(limiter: Arc<RateLimiter>, policy: Policy) -> Self {
        Self { limiter, policy }
    }
}

pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let client = state.limiter.client_key(&request);
    let decision = state.limiter.check(state.policy, &client);

    if !decision.allowed {
        warn!(
            "Rate limit '{}' exceeded for client {} ({} {})",
            state.policy.as_str(),
            client,
            request.method(),
            request.uri().path()
        );
        let mut response =
            AppError::RateLimitExceeded(state.policy.message().to_string()).into_response();
        let headers = response.headers_mut();
        decision.apply_headers(headers);
        headers.insert(
            axum::http::header::RETRY_AFTER,
            HeaderValue::from(decision.reset_secs()),
        );
        return response;
    }

    let mut response = next.run(request).await;
    decision.apply_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use axum_test::TestServer;

    fn config(max: u32, window_secs: u64) -> RateLimitConfig {
        RateLimitConfig {
            api: RateLimitPolicyConfig::new(max, window_secs),
            upload: RateLimitPolicyConfig::new(max, window_secs),
            create: RateLimitPolicyConfig::new(max, window_secs),
        }
    }

    #[test]
    fn test_admits_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(config(3, 60), false);
        let now = Instant::now();

        for i in 0..3 {
            let decision = limiter.check_at(Policy::Create, "1.2.3.4", now);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, 2 - i);
        }

        let rejected = limiter.check_at(Policy::Create, "1.2.3.4", now);
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.reset_after, Duration::from_secs(60));
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::new(config(2, 10), false);
        let start = Instant::now();

        assert!(limiter.check_at(Policy::Api, "a", start).allowed);
        assert!(limiter
            .check_at(Policy::Api, "a", start + Duration::from_secs(5))
            .allowed);
        assert!(!limiter
            .check_at(Policy::Api, "a", start + Duration::from_secs(9))
            .allowed);

        // The first request has left the window, the second has not
        let later = start + Duration::from_secs(10);
        let decision = limiter.check_at(Policy::Api, "a", later);
        assert!(decision.allowed);
        assert!(!limiter.check_at(Policy::Api, "a", later).allowed);
    }

    #[test]
    fn test_rejected_requests_are_not_counted() {
        let limiter = RateLimiter::new(config(1, 10), false);
        let start = Instant::now();

        assert!(limiter.check_at(Policy::Upload, "a", start).allowed);
        for s in 1..10 {
            assert!(!limiter
                .check_at(Policy::Upload, "a", start + Duration::from_secs(s))
                .allowed);
        }
        assert!(limiter
            .check_at(Policy::Upload, "a", start + Duration::from_secs(10))
            .allowed);
    }

    #[test]
    fn test_policies_and_clients_are_independent() {
        let limiter = RateLimiter::new(config(1, 60), false);
        let now = Instant::now();

        assert!(limiter.check_at(Policy::Create, "a", now).allowed);
        assert!(!limiter.check_at(Policy::Create, "a", now).allowed);
        assert!(limiter.check_at(Policy::Create, "b", now).allowed);
        assert!(limiter.check_at(Policy::Upload, "a", now).allowed);
    }

    #[test]
    fn test_purge_expired() {
        let limiter = RateLimiter::new(config(5, 10), false);
        let start = Instant::now();
        limiter.check_at(Policy::Api, "old", start);
        limiter.check_at(Policy::Api, "fresh", start + Duration::from_secs(8));

        let removed = limiter.purge_expired_at(start + Duration::from_secs(12));
        assert_eq!(removed, 1);
        assert_eq!(limiter.windows().len(), 1);
    }

    #[test]
    fn test_reset_secs_rounds_up() {
        let decision = Decision {
            allowed: true,
            limit: 1,
            remaining: 0,
            reset_after: Duration::from_millis(1500),
        };
        assert_eq!(decision.reset_secs(), 2);
    }

    #[test]
    fn test_client_key() {
        let trusting = RateLimiter::new(config(1, 1), true);
        let direct = RateLimiter::new(config(1, 1), false);

        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(trusting.client_key(&request), "203.0.113.7");
        assert_eq!(direct.client_key(&request), "unknown");

        let mut request = Request::builder().body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 5000))));
        assert_eq!(trusting.client_key(&request), "192.0.2.1");
    }

    #[tokio::test]
    async fn test_middleware_rejects_with_plain_text() {
        let limiter = Arc::new(RateLimiter::new(config(2, 60), true));
        let app = Router::new().route("/", get(|| async { "ok" })).layer(
            middleware::from_fn_with_state(
                RateLimitState::new(limiter, Policy::Create),
                rate_limit_middleware,
            ),
        );
        let server = TestServer::new(app).unwrap();

        let first = server.get("/").add_header("x-forwarded-for", "1.1.1.1").await;
        first.assert_status_ok();
        assert_eq!(first.header("ratelimit-limit"), "2");
        assert_eq!(first.header("ratelimit-remaining"), "1");

        server
            .get("/")
            .add_header("x-forwarded-for", "1.1.1.1")
            .await
            .assert_status_ok();

        let rejected = server.get("/").add_header("x-forwarded-for", "1.1.1.1").await;
        rejected.assert_status(StatusCode::TOO_MANY_REQUESTS);
        rejected.assert_text(Policy::Create.message());
        assert_eq!(rejected.header("retry-after"), "60");

        server
            .get("/")
            .add_header("x-forwarded-for", "2.2.2.2")
            .await
            .assert_status_ok();
    }
}
