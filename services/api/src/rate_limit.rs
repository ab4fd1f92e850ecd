use axum::extract::{ConnectInfo, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scout_ai::config::RateLimitConfig;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::warn;

type ClientKey = (&'static str, IpAddr);

/// Sliding-window request budget per (action, client address).
#[derive(Debug)]
pub(crate) struct RateLimiter {
    max_requests: usize,
    window: Duration,
    state: Mutex<Windows>,
}

#[derive(Debug, Default)]
struct Windows {
    hits: HashMap<ClientKey, VecDeque<Instant>>,
    last_sweep: Option<Instant>,
}

impl Windows {
    /// Drop clients with no hit inside the window, at most once per window.
    fn sweep(&mut self, now: Instant, window: Duration) {
        let due = self
            .last_sweep
            .map_or(true, |last| now.saturating_duration_since(last) >= window);
        if !due {
            return;
        }
        self.last_sweep = Some(now);
        self.hits.retain(|_, recent| {
            prune(recent, now, window);
            !recent.is_empty()
        });
    }
}

fn prune(recent: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while recent
        .front()
        .is_some_and(|seen| now.saturating_duration_since(*seen) >= window)
    {
        recent.pop_front();
    }
}

impl RateLimiter {
    pub(crate) fn new(config: RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests as usize,
            window: config.window,
            state: Mutex::new(Windows::default()),
        }
    }

    /// Record a hit unless the budget is spent. Returns whether the request may proceed.
    pub(crate) fn check(&self, action: &'static str, client: IpAddr) -> bool {
        self.check_at(action, client, Instant::now())
    }

    fn check_at(&self, action: &'static str, client: IpAddr, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.sweep(now, self.window);

        let recent = state.hits.entry((action, client)).or_default();
        prune(recent, now, self.window);
        if recent.len() >= self.max_requests {
            return false;
        }
        recent.push_back(now);
        true
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .hits
            .len()
    }
}

/// Which limited action a request performs, if any.
fn limited_action(method: &Method, path: &str) -> Option<&'static str> {
    if *method != Method::POST {
        return None;
    }
    if path == "/api/v1/jobs" {
        Some("create_job")
    } else if path.starts_with("/api/v1/jobs/") && path.ends_with("/source-more") {
        Some("source_more")
    } else {
        None
    }
}

pub(crate) async fn enforce_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(action) = limited_action(request.method(), request.uri().path()) else {
        return next.run(request).await;
    };

    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.check(action, client) {
        next.run(request).await
    } else {
        warn!(action, %client, "rate limit exceeded");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "rate limit exceeded, try again later" })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        })
    }

    #[test]
    fn budget_is_tracked_per_action_and_client() {
        let limiter = limiter(2);
        let alice = IpAddr::from([10, 0, 0, 1]);
        let bob = IpAddr::from([10, 0, 0, 2]);
        let now = Instant::now();

        assert!(limiter.check_at("create_job", alice, now));
        assert!(limiter.check_at("create_job", alice, now));
        assert!(!limiter.check_at("create_job", alice, now));
        assert!(limiter.check_at("source_more", alice, now));
        assert!(limiter.check_at("create_job", bob, now));
    }

    #[test]
    fn old_hits_leave_the_window() {
        let limiter = limiter(1);
        let client = IpAddr::from([10, 0, 0, 1]);
        let start = Instant::now();

        assert!(limiter.check_at("create_job", client, start));
        assert!(!limiter.check_at("create_job", client, start + Duration::from_secs(59)));
        assert!(limiter.check_at("create_job", client, start + Duration::from_secs(60)));
    }

    #[test]
    fn idle_clients_are_forgotten_once_their_window_passes() {
        let limiter = limiter(10);
        let start = Instant::now();
        for host in 0..10_000u32 {
            assert!(limiter.check_at("create_job", IpAddr::from(host.to_be_bytes()), start));
        }
        assert_eq!(limiter.tracked_clients(), 10_000);

        let later = start + Duration::from_secs(3600);
        assert!(limiter.check_at("create_job", IpAddr::from([192, 168, 0, 1]), later));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn sweeping_keeps_clients_still_inside_the_window() {
        let limiter = limiter(1);
        let busy = IpAddr::from([10, 0, 0, 1]);
        let idle = IpAddr::from([10, 0, 0, 2]);
        let start = Instant::now();

        assert!(limiter.check_at("create_job", idle, start));
        assert!(limiter.check_at("create_job", busy, start + Duration::from_secs(30)));
        assert!(limiter.check_at("source_more", idle, start + Duration::from_secs(61)));

        assert_eq!(limiter.tracked_clients(), 2);
        assert!(!limiter.check_at("create_job", busy, start + Duration::from_secs(62)));
    }

    #[test]
    fn only_mutating_sourcing_routes_are_limited() {
        assert_eq!(
            limited_action(&Method::POST, "/api/v1/jobs"),
            Some("create_job")
        );
        assert_eq!(
            limited_action(&Method::POST, "/api/v1/jobs/job-0001/source-more"),
            Some("source_more")
        );
        assert_eq!(limited_action(&Method::GET, "/api/v1/jobs"), None);
        assert_eq!(
            limited_action(&Method::POST, "/api/v1/jobs/job-0001/advance"),
            None
        );
    }
}
