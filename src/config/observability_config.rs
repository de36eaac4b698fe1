//! Exporter output configuration parsing from environment variables.

use super::parse_var;
use anyhow::Result;
use std::str::FromStr;

/// How the reporter writes each cycle to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Prometheus text exposition
    Text,
    /// One `METRICS_JSON:` line per cycle
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => anyhow::bail!("Invalid EXPORTER_OUTPUT: {}. Must be 'text' or 'json'", s),
        }
    }
}

/// Observability environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ObservabilityEnvConfig {
    pub interval_seconds: u64,
    pub output: OutputFormat,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 15,
            output: OutputFormat::Text,
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let interval_seconds = parse_var(lookup, "EXPORTER_INTERVAL_SECS", defaults.interval_seconds)?;
        if interval_seconds == 0 {
            anyhow::bail!("EXPORTER_INTERVAL_SECS must be greater than 0");
        }

        Ok(Self {
            interval_seconds,
            output: parse_var(lookup, "EXPORTER_OUTPUT", defaults.output)?,
        })
    }
}
