use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::GravidaError;

/// Hosts the scrapers are permitted to contact.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &[
    "drugs.com",                // search, monographs, pregnancy catalog
    "e-lactancia.org",          // bilingual narrative monographs
    "accessdata.fda.gov",       // FDA Orange Book registry
];

/// An HTTP client that only issues requests to allowlisted hosts.
/// Subdomains of an allowed host are accepted (`www.drugs.com`).
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Build a client with the default source allowlist and a total request timeout.
    ///
    /// Redirects are followed; idle connections are limited to
    /// `max_idle_per_host` to keep the footprint per host small.
    pub fn new(timeout: Duration, max_idle_per_host: usize) -> Result<Self, GravidaError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .pool_max_idle_per_host(max_idle_per_host)
            .build()?;

        Ok(Self {
            client,
            allowlist: DEFAULT_ALLOWED_HOSTS.iter().map(|d| d.to_string()).collect(),
        })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{allowed}")))
    }

    /// Exposes the inner `reqwest::Client` builder for GET requests.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, GravidaError> {
        if !self.is_allowed(url) {
            return Err(GravidaError::SecurityError(format!(
                "host not in allowlist for URL {url}"
            )));
        }

        Ok(self.client.get(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SandboxClient {
        SandboxClient::new(Duration::from_secs(5), 1).unwrap()
    }

    #[test]
    fn test_subdomains_of_allowed_hosts_pass() {
        let c = client();
        assert!(c.is_allowed("https://www.drugs.com/search.php?searchterm=aspirin"));
        assert!(c.is_allowed("https://www.accessdata.fda.gov/scripts/cder/ob/default.cfm"));
    }

    #[test]
    fn test_lookalike_hosts_rejected() {
        let c = client();
        assert!(!c.is_allowed("https://notdrugs.com/"));
        assert!(!c.is_allowed("https://drugs.com.evil.example/"));
        assert!(!c.is_allowed("not a url"));
    }

    #[test]
    fn test_get_refuses_disallowed_host() {
        let c = client();
        assert!(matches!(c.get("https://example.org/"), Err(GravidaError::SecurityError(_))));
    }

    #[test]
    fn test_allow_domain_extends_policy() {
        let mut c = client();
        assert!(!c.is_allowed("http://127.0.0.1:8080/x"));
        c.allow_domain("127.0.0.1");
        assert!(c.is_allowed("http://127.0.0.1:8080/x"));
    }
}
