use crate::config::{Config, OutputFormat};
use std::collections::HashMap;
use std::time::Duration;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let config = Config::from_lookup(lookup_from(&[])).unwrap();

    assert_eq!(config.scrape.hostname, "localhost");
    assert_eq!(config.scrape.port, 3128);
    assert_eq!(config.observability.interval_seconds, 15);
    assert_eq!(config.observability.output, OutputFormat::Text);
}

#[test]
fn test_config_full_override() {
    let config = Config::from_lookup(lookup_from(&[
        ("SQUID_HOSTNAME", "10.0.0.5"),
        ("SQUID_PORT", "8080"),
        ("SQUID_SCRAPE_TIMEOUT_SECS", "3"),
        ("SQUID_CONNECT_TIMEOUT_SECS", "1"),
        ("EXPORTER_INTERVAL_SECS", "60"),
        ("EXPORTER_OUTPUT", "json"),
    ]))
    .unwrap();

    assert_eq!(config.scrape.hostname, "10.0.0.5");
    assert_eq!(config.scrape.port, 8080);
    assert_eq!(config.scrape.timeout, Duration::from_secs(3));
    assert_eq!(config.scrape.connect_timeout, Duration::from_secs(1));
    assert_eq!(config.observability.interval_seconds, 60);
    assert_eq!(config.observability.output, OutputFormat::Json);
}

#[test]
fn test_invalid_port_names_variable() {
    let err = Config::from_lookup(lookup_from(&[("SQUID_PORT", "not-a-port")])).unwrap_err();
    assert!(format!("{:#}", err).contains("SQUID_PORT"));
}

#[test]
fn test_blank_values_fall_back_to_defaults() {
    let config = Config::from_lookup(lookup_from(&[("SQUID_PORT", "  ")])).unwrap();
    assert_eq!(config.scrape.port, 3128);
}
