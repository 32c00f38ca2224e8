//! Randomised browser identity, drawn fresh for every attempt.

use rand::seq::SliceRandom;

use gravida_common::Language;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

const ACCEPT_LANGUAGE_EN: &[&str] = &[
    "en-US,en;q=0.5",
    "en-US,en;q=0.9",
    "en-GB,en;q=0.9,en-US;q=0.8",
];

/// Spanish first, English second.
const ACCEPT_LANGUAGE_ES: &[&str] = &[
    "es-ES,es;q=0.9,en-US;q=0.8,en;q=0.7",
    "es-ES,es;q=0.9,en-US,en;q=0.8",
    "es-MX,es;q=0.9,en-US;q=0.8,en;q=0.7",
];

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Header set for one request attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_agent: &'static str,
    pub accept_language: &'static str,
}

impl RequestIdentity {
    pub fn random(locale: Language) -> Self {
        let mut rng = rand::thread_rng();
        let languages = match locale {
            Language::English => ACCEPT_LANGUAGE_EN,
            Language::Spanish => ACCEPT_LANGUAGE_ES,
        };
        Self {
            user_agent: USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0]),
            accept_language: languages.choose(&mut rng).copied().unwrap_or(languages[0]),
        }
    }

    /// Full header list sent with the request.
    pub fn headers(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("User-Agent", self.user_agent),
            ("Accept", ACCEPT),
            ("Accept-Language", self.accept_language),
            ("Connection", "keep-alive"),
            ("Upgrade-Insecure-Requests", "1"),
            ("Cache-Control", "max-age=0"),
            ("DNT", "1"),
        ]
    }

    pub fn is_known_user_agent(user_agent: &str) -> bool {
        USER_AGENTS.contains(&user_agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spanish_identity_prefers_spanish() {
        for _ in 0..20 {
            let id = RequestIdentity::random(Language::Spanish);
            assert!(id.accept_language.starts_with("es-"));
            assert!(RequestIdentity::is_known_user_agent(id.user_agent));
        }
    }

    #[test]
    fn test_english_identity() {
        let id = RequestIdentity::random(Language::English);
        assert!(id.accept_language.starts_with("en-"));
    }

    #[test]
    fn test_headers_include_browser_defaults() {
        let headers = RequestIdentity::random(Language::English).headers();
        let names: Vec<&str> = headers.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["User-Agent", "Accept", "Accept-Language", "Connection", "Upgrade-Insecure-Requests", "Cache-Control", "DNT"]
        );
    }
}
