//! Per-caller quota on run starts.
//!
//! Counters live in one process-wide map and are all cleared together on a
//! fixed interval. This is not a sliding window: a caller can spend a full
//! quota just before a reset and another one right after it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

pub trait RateLimiter: Send + Sync {
    /// Whether `key` still has quota left.
    fn check(&self, key: &str) -> bool;

    /// Count one request for `key`.
    fn increment(&self, key: &str);

    /// Check and count in one step. Returns false, without counting, when
    /// the quota is spent.
    fn try_acquire(&self, key: &str) -> bool;

    /// Clear every counter.
    fn reset_all(&self);
}

pub struct FixedWindowLimiter {
    max_requests: u32,
    counts: Mutex<HashMap<String, u32>>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32) -> Self {
        Self {
            max_requests,
            counts: Mutex::new(HashMap::new()),
        }
    }

    fn count(&self, key: &str) -> u32 {
        self.counts
            .lock()
            .map(|counts| counts.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn check(&self, key: &str) -> bool {
        self.count(key) < self.max_requests
    }

    fn increment(&self, key: &str) {
        if let Ok(mut counts) = self.counts.lock() {
            *counts.entry(key.to_string()).or_insert(0) += 1;
        }
    }

    fn try_acquire(&self, key: &str) -> bool {
        let Ok(mut counts) = self.counts.lock() else {
            return false;
        };
        let count = counts.entry(key.to_string()).or_insert(0);
        if *count >= self.max_requests {
            return false;
        }
        *count += 1;
        true
    }

    fn reset_all(&self) {
        if let Ok(mut counts) = self.counts.lock() {
            counts.clear();
        }
    }
}

/// Clear `limiter` every `period`, starting one period from now.
///
/// The returned handle must be aborted to stop the ticker.
pub fn spawn_reset_ticker(limiter: Arc<dyn RateLimiter>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            limiter.reset_all();
            info!("Flushed all request quotas");
        }
    })
}

/// Derive the rate-limit key for a connection.
///
/// A forwarded-for header wins over the transport address; when it lists
/// several hops the first (the original client) is used.
pub fn caller_identity(forwarded_for: Option<&str>, peer: Option<SocketAddr>) -> String {
    let forwarded = forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}
