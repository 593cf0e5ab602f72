//! Environment-driven configuration
//!
//! The harness is configured entirely through environment variables, the same
//! surface the original console suites used. Values that the UI flow can
//! discover at runtime (API key, generated endpoints) are optional here and
//! required only by the entry points that need them.

use std::time::Duration;

use crate::error::{Error, Result};

/// Harness configuration for one run. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Config {
    /// Admin console login page.
    pub login_url: String,
    /// Valid credentials.
    pub email: String,
    pub password: String,
    /// Intentionally-invalid credentials for the rejection scenario.
    pub incorrect_email: String,
    pub incorrect_password: String,
    /// Upper bound for page-level waits.
    pub page_timeout: Duration,
    /// Wallet address queried against the NFT index.
    pub wallet_address: String,
    /// NFT REST API base URL.
    pub api_url: String,
    /// NFT API key; the UI flow can extract one from the console instead.
    pub api_key: Option<String>,
    /// Pre-provisioned RPC endpoints for the load test.
    pub site1_endpoint: Option<String>,
    pub site2_endpoint: Option<String>,
}

const DEFAULT_PAGE_TIMEOUT_MS: u64 = 60_000;

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an injectable lookup (testable without
    /// mutating process-global state).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |name: &'static str| -> Result<String> {
            match lookup(name) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(Error::MissingEnv { name }),
            }
        };

        let page_timeout = match lookup("PAGE_TIMEOUT") {
            Some(raw) => {
                let millis = raw.parse::<u64>().map_err(|e| Error::InvalidEnv {
                    name: "PAGE_TIMEOUT",
                    reason: e.to_string(),
                })?;
                Duration::from_millis(millis)
            }
            None => Duration::from_millis(DEFAULT_PAGE_TIMEOUT_MS),
        };

        Ok(Self {
            login_url: require("LOGIN_URL")?,
            email: require("EMAIL")?,
            password: require("PASSWORD")?,
            incorrect_email: lookup("INCORRECT_EMAIL")
                .unwrap_or_else(|| "incorrectemail@example.com".to_string()),
            incorrect_password: lookup("INCORRECT_PASSWORD")
                .unwrap_or_else(|| "incorrectpassword".to_string()),
            page_timeout,
            wallet_address: require("WALLET_ADDRESS")?,
            api_url: require("API_URL")?,
            api_key: lookup("API_KEY").filter(|v| !v.is_empty()),
            site1_endpoint: lookup("SITE1_ENDPOINT").filter(|v| !v.is_empty()),
            site2_endpoint: lookup("SITE2_ENDPOINT").filter(|v| !v.is_empty()),
        })
    }

    /// The configured API key, or a named error for entry points that
    /// cannot discover one through the UI.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(Error::MissingEnv { name: "API_KEY" })
    }

    /// Both pre-provisioned endpoints, required by the load test.
    pub fn require_site_endpoints(&self) -> Result<(&str, &str)> {
        let site1 = self
            .site1_endpoint
            .as_deref()
            .ok_or(Error::MissingEnv { name: "SITE1_ENDPOINT" })?;
        let site2 = self
            .site2_endpoint
            .as_deref()
            .ok_or(Error::MissingEnv { name: "SITE2_ENDPOINT" })?;
        Ok((site1, site2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("LOGIN_URL", "https://admin.example.com"),
            ("EMAIL", "qa@example.com"),
            ("PASSWORD", "hunter2"),
            ("WALLET_ADDRESS", "0xff3879b8a363aed92a6eaba8f61f1a96a9ec3c1e"),
            ("API_URL", "https://deep-index.example.com/api/v2.2"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config> {
        Config::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn loads_with_defaults() {
        let cfg = load(&base_vars()).unwrap();
        assert_eq!(cfg.login_url, "https://admin.example.com");
        assert_eq!(cfg.page_timeout, Duration::from_millis(60_000));
        assert_eq!(cfg.incorrect_email, "incorrectemail@example.com");
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn missing_required_var_is_named() {
        let mut vars = base_vars();
        vars.remove("PASSWORD");
        match load(&vars) {
            Err(Error::MissingEnv { name }) => assert_eq!(name, "PASSWORD"),
            other => panic!("expected MissingEnv, got {other:?}"),
        }
    }

    #[test]
    fn invalid_page_timeout_is_rejected() {
        let mut vars = base_vars();
        vars.insert("PAGE_TIMEOUT", "not-a-number");
        assert!(matches!(
            load(&vars),
            Err(Error::InvalidEnv { name: "PAGE_TIMEOUT", .. })
        ));
    }

    #[test]
    fn empty_optional_vars_are_none() {
        let mut vars = base_vars();
        vars.insert("API_KEY", "");
        vars.insert("SITE1_ENDPOINT", "https://site1.example/sepolia/abc");
        let cfg = load(&vars).unwrap();
        assert!(cfg.api_key.is_none());
        assert!(cfg.require_site_endpoints().is_err());
        assert_eq!(
            cfg.site1_endpoint.as_deref(),
            Some("https://site1.example/sepolia/abc")
        );
    }
}
