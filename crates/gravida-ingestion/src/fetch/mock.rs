//! Scripted in-memory transport for tests and offline runs.
//!
//! Responses are queued per URL and served in order; the last queued
//! response for a URL repeats forever. Unscripted URLs answer with the
//! fallback status (404 unless changed).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use super::{HttpTransport, RequestIdentity, TransportError, TransportResponse};

#[derive(Debug, Clone)]
enum Scripted {
    Response { status: u16, body: String },
    Error(TransportError),
}

/// One request seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub url: String,
    pub user_agent: String,
    pub accept_language: String,
}

#[derive(Debug)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<RecordedCall>>,
    allowlist: Option<Vec<String>>,
    fallback_status: u16,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            allowlist: None,
            fallback_status: 404,
        }
    }

    /// Refuse hosts outside `hosts` (subdomains accepted), like the real client.
    pub fn with_allowlist(mut self, hosts: &[&str]) -> Self {
        self.allowlist = Some(hosts.iter().map(|h| h.to_string()).collect());
        self
    }

    pub fn with_fallback_status(mut self, status: u16) -> Self {
        self.fallback_status = status;
        self
    }

    /// Queue an HTTP response for `url`.
    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.push(
            url,
            Scripted::Response {
                status,
                body: body.to_string(),
            },
        );
    }

    /// Queue a transport-level failure for `url`.
    pub fn fail(&self, url: &str, error: TransportError) {
        self.push(url, Scripted::Error(error));
    }

    fn push(&self, url: &str, item: Scripted) {
        let mut scripts = self.scripts.lock().unwrap_or_else(|p| p.into_inner());
        scripts.entry(url.to_string()).or_default().push_back(item);
    }

    fn next(&self, url: &str) -> Option<Scripted> {
        let mut scripts = self.scripts.lock().unwrap_or_else(|p| p.into_inner());
        let queue = scripts.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .filter(|c| c.url == url)
            .count()
    }

    fn host_allowed(&self, url: &str) -> bool {
        let Some(allowlist) = &self.allowlist else {
            return true;
        };
        let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) else {
            return false;
        };
        allowlist
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{allowed}")))
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        identity: &RequestIdentity,
    ) -> Result<TransportResponse, TransportError> {
        if !self.host_allowed(url) {
            return Err(TransportError::HostNotAllowed(url.to_string()));
        }

        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(RecordedCall {
                url: url.to_string(),
                user_agent: identity.user_agent.to_string(),
                accept_language: identity.accept_language.to_string(),
            });

        match self.next(url) {
            Some(Scripted::Response { status, body }) => Ok(TransportResponse {
                status,
                final_url: url.to_string(),
                body,
            }),
            Some(Scripted::Error(e)) => Err(e),
            None => Ok(TransportResponse {
                status: self.fallback_status,
                final_url: url.to_string(),
                body: String::new(),
            }),
        }
    }
}
