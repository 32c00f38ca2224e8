//! Outbound connection caps: one global semaphore plus one per host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use url::Url;

#[derive(Debug)]
pub struct ConnectionLimiter {
    global: Arc<Semaphore>,
    per_host_limit: usize,
    hosts: Mutex<HashMap<String, Arc<Semaphore>>>,
}

/// Held for the duration of one attempt.
#[derive(Debug)]
pub struct ConnectionPermit {
    _host: OwnedSemaphorePermit,
    _global: OwnedSemaphorePermit,
}

impl ConnectionLimiter {
    pub fn new(max_connections: usize, max_per_host: usize) -> Self {
        Self {
            global: Arc::new(Semaphore::new(max_connections.max(1))),
            per_host_limit: max_per_host.max(1),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for a host slot, then a global slot.
    pub async fn acquire(&self, url: &str) -> Result<ConnectionPermit, AcquireError> {
        let host_sem = self.host_semaphore(&host_key(url));
        let host = host_sem.acquire_owned().await?;
        let global = Arc::clone(&self.global).acquire_owned().await?;
        Ok(ConnectionPermit {
            _host: host,
            _global: global,
        })
    }

    fn host_semaphore(&self, host: &str) -> Arc<Semaphore> {
        let mut hosts = self.hosts.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(
            hosts
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_limit))),
        )
    }

    pub fn available_global(&self) -> usize {
        self.global.available_permits()
    }
}

fn host_key(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_per_host_cap_serialises_same_host() {
        let limiter = Arc::new(ConnectionLimiter::new(5, 1));
        let first = limiter.acquire("https://www.drugs.com/a").await.unwrap();

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            limiter.acquire("https://www.drugs.com/b"),
        )
        .await;
        assert!(blocked.is_err());

        let other_host = limiter.acquire("https://www.e-lactancia.org/x").await;
        assert!(other_host.is_ok());

        drop(first);
        assert!(limiter.acquire("https://www.drugs.com/b").await.is_ok());
    }

    #[tokio::test]
    async fn test_global_cap() {
        let limiter = ConnectionLimiter::new(1, 1);
        let _held = limiter.acquire("https://a.example/").await.unwrap();
        assert_eq!(limiter.available_global(), 0);
    }
}
