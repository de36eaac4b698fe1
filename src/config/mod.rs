//! Configuration module for the exporter.
//!
//! Settings come from environment variables (optionally seeded from a `.env`
//! file by the binary), organized by concern: the Squid target and the
//! exporter's own output.

mod observability_config;
mod scrape_config;

pub use observability_config::{ObservabilityEnvConfig, OutputFormat};
pub use scrape_config::ScrapeEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Main application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub scrape: ScrapeEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            scrape: ScrapeEnvConfig::from_lookup(&lookup)?,
            observability: ObservabilityEnvConfig::from_lookup(&lookup)?,
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset or blank
fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to parse {}={}", key, raw)),
        _ => Ok(default),
    }
}
