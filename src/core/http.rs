use std::collections::VecDeque;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const APP_USER_AGENT: &str = "packfetch/0.1.0";

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .build()
}

/// Sliding-window rate limiter for outbound API calls.
///
/// At most `quota` acquisitions may leave within any rolling `window`;
/// excess callers sleep until the oldest stamp ages out, they are never
/// rejected. Built on `tokio::time` so tests can drive it with a paused
/// clock. Constructed once and shared as `Arc<RateLimiter>`.
#[derive(Debug)]
pub struct RateLimiter {
    quota: usize,
    window: Duration,
    stamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(quota: usize, window: Duration) -> Self {
        Self {
            quota: quota.max(1),
            window,
            stamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Wait until a request slot is available, then claim it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut stamps = self.stamps.lock().await;
                let now = Instant::now();

                while stamps
                    .front()
                    .is_some_and(|stamp| now.duration_since(*stamp) >= self.window)
                {
                    stamps.pop_front();
                }

                if stamps.len() < self.quota {
                    stamps.push_back(now);
                    return;
                }

                match stamps.front() {
                    Some(oldest) => self.window - now.duration_since(*oldest),
                    None => return,
                }
            };

            tokio::time::sleep(wait).await;
        }
    }
}
