//! Resilient page fetcher.
//!
//! One `fetch` call is up to `max_attempts` GETs against a single URL:
//!   1. attempt 1 fires immediately
//!   2. attempts 2..N wait on the backoff schedule plus random jitter
//!   3. every attempt carries a freshly randomised browser identity
//!   4. 429 adds a long cooldown before the next attempt
//!   5. the first 200 wins; anything else ends in a non-`ok` status
//!
//! Failures never escalate. Callers get a [`FetchResult`] and treat every
//! status other than `ok` as "no data".

pub mod identity;
pub mod limiter;
pub mod mock;
pub mod reqwest_transport;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use gravida_common::Language;

pub use identity::RequestIdentity;
pub use limiter::ConnectionLimiter;
pub use mock::ScriptedTransport;
pub use reqwest_transport::ReqwestTransport;

// ── Transport seam ────────────────────────────────────────────────────────────

/// Raw response from one GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// URL after redirects.
    pub final_url: String,
    pub body: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("host not allowed: {0}")]
    HostNotAllowed(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection error: {0}")]
    Connection(String),
}

/// Issues a single GET. Implemented by the reqwest client and by the
/// scripted test double.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        identity: &RequestIdentity,
    ) -> Result<TransportResponse, TransportError>;
}

// ── Policy ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    pub max_attempts: u32,
    /// Base delay before attempt 2, 3, ...; the last entry repeats.
    pub backoff: Vec<Duration>,
    /// Upper bound of the uniform jitter added to each backoff delay.
    pub jitter: Duration,
    /// Extra wait after a 429.
    pub rate_limit_cooldown: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: vec![
                Duration::from_secs(3),
                Duration::from_secs(8),
                Duration::from_secs(15),
            ],
            jitter: Duration::from_secs(5),
            rate_limit_cooldown: Duration::from_secs(60),
        }
    }
}

impl FetchPolicy {
    /// Base delay before attempt `attempt` (2-based; attempt 1 has none).
    pub fn base_delay(&self, attempt: u32) -> Duration {
        if attempt <= 1 || self.backoff.is_empty() {
            return Duration::ZERO;
        }
        let idx = (attempt as usize - 2).min(self.backoff.len() - 1);
        self.backoff[idx]
    }

    /// Base delay plus a uniform draw from `[0, jitter]`.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.base_delay(attempt) + random_jitter(self.jitter)
    }
}

fn random_jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    let secs = rand::thread_rng().gen_range(0.0..=max.as_secs_f64());
    Duration::from_secs_f64(secs)
}

// ── Result ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStatus {
    Ok,
    Blocked,
    RateLimited,
    NotFound,
    Exhausted,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Ok => "ok",
            FetchStatus::Blocked => "blocked",
            FetchStatus::RateLimited => "rate-limited",
            FetchStatus::NotFound => "not-found",
            FetchStatus::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one `fetch`. `body` is present only when `status` is `Ok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub url: String,
    pub body: Option<String>,
    pub status: FetchStatus,
    pub attempts: u32,
}

impl FetchResult {
    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }

    /// The body on success, `None` otherwise.
    pub fn into_body(self) -> Option<String> {
        match self.status {
            FetchStatus::Ok => self.body,
            _ => None,
        }
    }
}

/// How one attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttemptFailure {
    Http(u16),
    Transport(String),
}

/// Uniform 403/429/404 failures keep their meaning; anything mixed is `Exhausted`.
fn terminal_status(failures: &[AttemptFailure]) -> FetchStatus {
    let uniform = |code: u16| {
        !failures.is_empty() && failures.iter().all(|f| *f == AttemptFailure::Http(code))
    };
    if uniform(403) {
        FetchStatus::Blocked
    } else if uniform(429) {
        FetchStatus::RateLimited
    } else if uniform(404) {
        FetchStatus::NotFound
    } else {
        FetchStatus::Exhausted
    }
}

// ── Fetcher ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn HttpTransport>,
    policy: FetchPolicy,
    limiter: Arc<ConnectionLimiter>,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: FetchPolicy, limiter: ConnectionLimiter) -> Self {
        Self {
            transport,
            policy,
            limiter: Arc::new(limiter),
        }
    }

    /// Fetch with the policy's attempt budget and an English identity.
    pub async fn get(&self, url: &str) -> FetchResult {
        self.fetch_localized(url, self.policy.max_attempts, Language::English).await
    }

    /// Fetch with the policy's attempt budget and a Spanish-first identity.
    pub async fn get_spanish(&self, url: &str) -> FetchResult {
        self.fetch_localized(url, self.policy.max_attempts, Language::Spanish).await
    }

    pub async fn fetch(&self, url: &str, max_attempts: u32) -> FetchResult {
        self.fetch_localized(url, max_attempts, Language::English).await
    }

    pub async fn fetch_localized(&self, url: &str, max_attempts: u32, locale: Language) -> FetchResult {
        let mut failures: Vec<AttemptFailure> = Vec::new();
        let mut final_url = url.to_string();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = self.policy.retry_delay(attempt);
                info!(url, attempt, delay_secs = delay.as_secs_f64(), "Waiting before retry");
                tokio::time::sleep(delay).await;
            }

            let identity = RequestIdentity::random(locale);
            let response = match self.limiter.acquire(url).await {
                Ok(_permit) => self.transport.get(url, &identity).await,
                Err(e) => Err(TransportError::Connection(e.to_string())),
            };

            match response {
                Ok(resp) if resp.status == 200 => {
                    debug!(url, attempt, bytes = resp.body.len(), "Fetched");
                    return FetchResult {
                        url: resp.final_url,
                        body: Some(resp.body),
                        status: FetchStatus::Ok,
                        attempts: attempt,
                    };
                }
                Ok(resp) => {
                    final_url = resp.final_url;
                    match resp.status {
                        429 => warn!(url, attempt, "Rate limited (429)"),
                        403 => warn!(url, attempt, "Blocked (403)"),
                        status => warn!(url, attempt, status, "Unexpected HTTP status"),
                    }
                    failures.push(AttemptFailure::Http(resp.status));
                    if resp.status == 429 && attempt < max_attempts {
                        info!(url, cooldown_secs = self.policy.rate_limit_cooldown.as_secs(), "Cooling down after rate limit");
                        tokio::time::sleep(self.policy.rate_limit_cooldown).await;
                    }
                }
                Err(TransportError::HostNotAllowed(host)) => {
                    warn!(url, host = %host, "Refusing request to host outside allowlist");
                    return FetchResult {
                        url: final_url,
                        body: None,
                        status: FetchStatus::Blocked,
                        attempts: 0,
                    };
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "Request failed");
                    failures.push(AttemptFailure::Transport(e.to_string()));
                }
            }
        }

        let status = terminal_status(&failures);
        warn!(url, attempts = max_attempts, status = %status, "Giving up on URL");
        FetchResult {
            url: final_url,
            body: None,
            status,
            attempts: max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn fetcher(transport: Arc<ScriptedTransport>) -> Fetcher {
        Fetcher::new(transport, FetchPolicy::default(), ConnectionLimiter::new(5, 1))
    }

    const URL: &str = "https://www.drugs.com/mtm/ibuprofen.html";

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_is_immediate() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(URL, 200, "<html>ok</html>");
        let start = Instant::now();

        let result = fetcher(transport.clone()).fetch(URL, 3).await;

        assert_eq!(result.status, FetchStatus::Ok);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.body.as_deref(), Some("<html>ok</html>"));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_then_success_uses_two_attempts() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(URL, 429, "");
        transport.respond(URL, 200, "body-2");
        let start = Instant::now();

        let result = fetcher(transport.clone()).fetch(URL, 3).await;

        assert_eq!(result.status, FetchStatus::Ok);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.body.as_deref(), Some("body-2"));
        assert_eq!(transport.call_count(URL), 2);
        // 60s cooldown + 3s base backoff + up to 5s jitter
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(63), "waited {waited:?}");
        assert!(waited <= Duration::from_secs(68), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_uniform_failures_keep_their_status() {
        for (code, expected) in [
            (403, FetchStatus::Blocked),
            (429, FetchStatus::RateLimited),
            (404, FetchStatus::NotFound),
            (500, FetchStatus::Exhausted),
        ] {
            let transport = Arc::new(ScriptedTransport::new());
            transport.respond(URL, code, "");
            let result = fetcher(transport.clone()).fetch(URL, 3).await;
            assert_eq!(result.status, expected, "status {code}");
            assert_eq!(result.attempts, 3);
            assert_eq!(result.body, None);
            assert_eq!(transport.call_count(URL), 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_failures_are_exhausted() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(URL, 403, "");
        transport.fail(URL, TransportError::Timeout("45s".into()));
        let result = fetcher(transport).fetch(URL, 3).await;
        assert_eq!(result.status, FetchStatus::Exhausted);
        assert!(!result.is_ok());
        assert_eq!(result.into_body(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_cooldown_after_last_attempt() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(URL, 429, "");
        let start = Instant::now();
        let result = fetcher(transport).fetch(URL, 1).await;
        assert_eq!(result.status, FetchStatus::RateLimited);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disallowed_host_is_blocked_without_attempts() {
        let transport = Arc::new(ScriptedTransport::new().with_allowlist(&["drugs.com"]));
        let result = fetcher(transport.clone()).fetch("https://example.org/", 3).await;
        assert_eq!(result.status, FetchStatus::Blocked);
        assert_eq!(result.attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_is_exhausted() {
        let transport = Arc::new(ScriptedTransport::new());
        let result = fetcher(transport.clone()).fetch(URL, 0).await;
        assert_eq!(result.status, FetchStatus::Exhausted);
        assert_eq!(transport.call_count(URL), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_attempt_sends_a_fresh_identity() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(URL, 500, "");
        let result = fetcher(transport.clone())
            .fetch_localized(URL, 3, Language::Spanish)
            .await;
        assert_eq!(result.attempts, 3);
        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c.accept_language.starts_with("es-")));
        assert!(calls.iter().all(|c| RequestIdentity::is_known_user_agent(&c.user_agent)));
    }

    #[test]
    fn test_backoff_schedule_repeats_last_step() {
        let policy = FetchPolicy::default();
        assert_eq!(policy.base_delay(1), Duration::ZERO);
        assert_eq!(policy.base_delay(2), Duration::from_secs(3));
        assert_eq!(policy.base_delay(3), Duration::from_secs(8));
        assert_eq!(policy.base_delay(4), Duration::from_secs(15));
        assert_eq!(policy.base_delay(9), Duration::from_secs(15));
        for _ in 0..50 {
            let d = policy.retry_delay(2);
            assert!(d >= Duration::from_secs(3) && d <= Duration::from_secs(8));
        }
    }
}
