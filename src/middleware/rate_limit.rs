use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::state::AppState;

/// How often the background sweep runs.
const SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// How long a client entry may sit idle before the sweep evicts it.
const IDLE_EVICTION: Duration = Duration::from_secs(180);

struct ClientBucket {
    tokens: f64,
    /// Last touch: refill reference point and idle-eviction timestamp.
    last_seen: Instant,
}

/// Per-client token-bucket admission control with bounded memory. Entries
/// are created lazily on first sight of a peer address and evicted by a
/// periodic sweep once idle; the per-request touch and the sweep share one
/// mutex so map access stays single-writer.
pub struct RateLimiter {
    clients: Mutex<HashMap<IpAddr, ClientBucket>>,
    requests_per_second: f64,
    burst: f64,
}

impl RateLimiter {
    pub fn new(requests_per_second: f64, burst: u32) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            requests_per_second,
            burst: f64::from(burst),
        }
    }

    /// Consume one token for the client if available. A rejected request is
    /// an admission-control outcome, not an error; the caller maps it to a
    /// 429 response.
    pub fn allow(&self, key: IpAddr) -> bool {
        let mut clients = self.clients.lock().unwrap();
        let now = Instant::now();

        let bucket = clients.entry(key).or_insert(ClientBucket {
            tokens: self.burst,
            last_seen: now,
        });

        let elapsed = now.duration_since(bucket.last_seen).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.requests_per_second).min(self.burst);
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop entries idle for longer than `idle_for`. Subsequent traffic from
    /// an evicted client starts a fresh bucket.
    pub fn sweep(&self, idle_for: Duration) {
        let mut clients = self.clients.lock().unwrap();
        let now = Instant::now();
        clients.retain(|_, bucket| now.duration_since(bucket.last_seen) <= idle_for);
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}

/// Run the eviction sweep on a timer until cancelled at shutdown.
pub fn spawn_sweeper(
    limiter: std::sync::Arc<RateLimiter>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_PERIOD);
        // The first tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => limiter.sweep(IDLE_EVICTION),
            }
        }
    })
}

/// Admission-control middleware keyed by the network peer address. Applied
/// before authentication so a rejected request consumes nothing downstream.
pub async fn rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if state.config.api.enable_rate_limiting && !state.limiter.allow(addr.ip()) {
        return ApiError::RateLimitExceeded.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> IpAddr {
        "203.0.113.7".parse().unwrap()
    }

    #[test]
    fn burst_then_rejection() {
        let limiter = RateLimiter::new(2.0, 4);
        let ip = client();

        for _ in 0..4 {
            assert!(limiter.allow(ip));
        }
        assert!(!limiter.allow(ip));
    }

    #[test]
    fn bucket_refills_over_time() {
        let limiter = RateLimiter::new(100.0, 2);
        let ip = client();

        assert!(limiter.allow(ip));
        assert!(limiter.allow(ip));
        assert!(!limiter.allow(ip));

        // 100 tokens/second refills well within this sleep.
        std::thread::sleep(Duration::from_millis(50));
        assert!(limiter.allow(ip));
    }

    #[test]
    fn refill_caps_at_burst() {
        let limiter = RateLimiter::new(1000.0, 2);
        let ip = client();

        assert!(limiter.allow(ip));
        std::thread::sleep(Duration::from_millis(20));

        // Refill restores at most the burst capacity.
        assert!(limiter.allow(ip));
        assert!(limiter.allow(ip));
        assert!(!limiter.allow(ip));
    }

    #[test]
    fn clients_are_independent() {
        let limiter = RateLimiter::new(2.0, 1);
        let a: IpAddr = "203.0.113.1".parse().unwrap();
        let b: IpAddr = "203.0.113.2".parse().unwrap();

        assert!(limiter.allow(a));
        assert!(!limiter.allow(a));
        assert!(limiter.allow(b));
    }

    #[test]
    fn sweep_evicts_idle_clients() {
        let limiter = RateLimiter::new(2.0, 4);
        limiter.allow(client());
        assert_eq!(limiter.tracked_clients(), 1);

        std::thread::sleep(Duration::from_millis(10));
        limiter.sweep(Duration::from_millis(5));
        assert_eq!(limiter.tracked_clients(), 0);

        // Fresh traffic starts a fresh bucket.
        assert!(limiter.allow(client()));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn sweep_keeps_active_clients() {
        let limiter = RateLimiter::new(2.0, 4);
        limiter.allow(client());
        limiter.sweep(IDLE_EVICTION);
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
