use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::{broadcast, Mutex};

use crate::response::AppError;
use crate::state::AppState;

/// One client's current window.
#[derive(Debug, Clone, Copy)]
struct ClientWindow {
    opened_at: Instant,
    used: u64,
}

impl ClientWindow {
    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.opened_at)
    }
}

/// Fixed-window request counter keyed by client IP.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u64,
    clients: Mutex<HashMap<IpAddr, ClientWindow>>,
}

/// Verdict for one request plus what goes into the `ratelimit-*` headers.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Unix seconds at which the window reopens.
    pub reset_at: u64,
    pub retry_after_secs: u64,
}

impl RateLimiter {
    pub fn new(window_secs: u64, max_requests: u64) -> Self {
        Self {
            window: Duration::from_secs(window_secs),
            max_requests,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;

        let slot = clients.entry(ip).or_insert(ClientWindow {
            opened_at: now,
            used: 0,
        });
        if slot.age(now) >= self.window {
            *slot = ClientWindow {
                opened_at: now,
                used: 0,
            };
        }

        let allowed = slot.used < self.max_requests;
        if allowed {
            slot.used += 1;
        }

        let reset_in = self.window.saturating_sub(slot.age(now)).as_secs();
        let unix_now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        RateLimitResult {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(slot.used),
            reset_at: unix_now + reset_in,
            retry_after_secs: reset_in.max(1),
        }
    }

    /// Forget clients idle for two full windows. Returns how many went.
    pub async fn prune(&self) -> usize {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let before = clients.len();
        clients.retain(|_, slot| slot.age(now) <= self.window * 2);
        before - clients.len()
    }

    pub async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}

/// Route layer for the synthesis endpoint; every upstream call costs money.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let ip = extract_client_ip(req.headers(), peer, state.config().trust_proxy);
    let result = state.rate_limit().check(ip).await;

    if !result.allowed {
        tracing::warn!(%ip, limit = result.limit, "tts rate limit exceeded");
        let mut response =
            AppError::too_many_requests("Too many speech requests, slow down").into_response();
        apply_rate_limit_headers(&mut response, &result);
        response.headers_mut().insert(
            header::RETRY_AFTER,
            HeaderValue::from(result.retry_after_secs),
        );
        return response;
    }

    let mut response = next.run(req).await;
    apply_rate_limit_headers(&mut response, &result);
    response
}

fn apply_rate_limit_headers(response: &mut Response, result: &RateLimitResult) {
    let headers = response.headers_mut();
    headers.insert("ratelimit-limit", HeaderValue::from(result.limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(result.remaining));
    headers.insert("ratelimit-reset", HeaderValue::from(result.reset_at));
}

/// Client address: first `x-forwarded-for` hop when behind a trusted proxy,
/// then `x-real-ip`, then the socket peer, then loopback.
pub fn extract_client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            if let Some(first) = forwarded.split(',').next() {
                if let Ok(ip) = first.trim().parse() {
                    return ip;
                }
            }
        }
        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
        {
            return ip;
        }
    }

    peer.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

pub async fn rate_limit_cleanup_loop(
    limiter: Arc<RateLimiter>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(300));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let removed = limiter.prune().await;
                if removed > 0 {
                    tracing::debug!(removed, "rate limit entries pruned");
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }
}
