//! Squid target configuration parsing from environment variables.

use super::parse_var;
use anyhow::Result;
use std::time::Duration;

/// Cache manager target and fetch limits
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeEnvConfig {
    pub hostname: String,
    pub port: u16,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ScrapeEnvConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: 3128,
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl ScrapeEnvConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            hostname: lookup("SQUID_HOSTNAME")
                .map(|host| host.trim().to_string())
                .filter(|host| !host.is_empty())
                .unwrap_or(defaults.hostname),
            port: parse_var(lookup, "SQUID_PORT", defaults.port)?,
            timeout: Duration::from_secs(parse_var(
                lookup,
                "SQUID_SCRAPE_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            connect_timeout: Duration::from_secs(parse_var(
                lookup,
                "SQUID_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout.as_secs(),
            )?),
        })
    }
}
