//! Environment Configuration
//!
//! The sidecar is configured entirely through environment variables,
//! consumed once at startup:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `SERVERS` | worker pool capacity; values below 1 are coerced to 1 | 1 |
//! | `SERVER_CMD` | whitespace-delimited worker command template | — (required) |
//! | `TIMEOUT` | default per-invocation timeout in ms; negative coerces to 0 | 0 |
//! | `SECRETS` | comma-separated secret names | none |
//! | `PORT` | HTTP listen port of the front-end | 8080 |
//!
//! Unparsable numeric values are fatal.

use funnel_common::protocol::{FunnelError, Result};

pub const SERVERS_VAR: &str = "SERVERS";
pub const SERVER_CMD_VAR: &str = "SERVER_CMD";
pub const TIMEOUT_VAR: &str = "TIMEOUT";
pub const SECRETS_VAR: &str = "SECRETS";
pub const PORT_VAR: &str = "PORT";

const DEFAULT_LISTEN_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Worker pool capacity (`SERVERS`).
    pub workers: usize,
    /// Worker command template (`SERVER_CMD`). Validated by the factory.
    pub command: String,
    /// Default per-invocation timeout in milliseconds (`TIMEOUT`).
    pub timeout_ms: u64,
    /// Secret names resolved at injection time (`SECRETS`).
    pub secrets: Vec<String>,
    /// Listen port of the HTTP front-end (`PORT`).
    pub listen_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let workers = match nonempty(&lookup, SERVERS_VAR) {
            None => 1,
            Some(raw) => parse_int(SERVERS_VAR, &raw)?.max(1) as usize,
        };

        let command = lookup(SERVER_CMD_VAR).unwrap_or_default();

        let timeout_ms = match nonempty(&lookup, TIMEOUT_VAR) {
            None => 0,
            Some(raw) => parse_int(TIMEOUT_VAR, &raw)?.max(0) as u64,
        };

        let secrets = lookup(SECRETS_VAR)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        let listen_port = match nonempty(&lookup, PORT_VAR) {
            None => DEFAULT_LISTEN_PORT,
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                FunnelError::IllegalArgument(format!(
                    "unable to parse {PORT_VAR}={raw:?} as a port"
                ))
            })?,
        };

        Ok(Self {
            workers,
            command,
            timeout_ms,
            secrets,
            listen_port,
        })
    }
}

fn nonempty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.is_empty())
}

fn parse_int(name: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| {
        FunnelError::IllegalArgument(format!(
            "unable to parse {name}={raw:?} as an integer"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("SERVER_CMD", "python3 server.py")]).unwrap();
        assert_eq!(config.workers, 1);
        assert_eq!(config.timeout_ms, 0);
        assert!(config.secrets.is_empty());
        assert_eq!(config.listen_port, 8080);
    }

    #[test]
    fn test_full_configuration() {
        let config = config_from(&[
            ("SERVERS", "4"),
            ("SERVER_CMD", "node server.js"),
            ("TIMEOUT", "2500"),
            ("SECRETS", "db-password,api-key"),
            ("PORT", "9999"),
        ])
        .unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.command, "node server.js");
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(config.secrets, vec!["db-password", "api-key"]);
        assert_eq!(config.listen_port, 9999);
    }

    #[test]
    fn test_servers_below_one_coerced() {
        let config = config_from(&[("SERVERS", "0"), ("SERVER_CMD", "x")]).unwrap();
        assert_eq!(config.workers, 1);
        let config = config_from(&[("SERVERS", "-3"), ("SERVER_CMD", "x")]).unwrap();
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn test_unparsable_servers_is_fatal() {
        let err = config_from(&[("SERVERS", "many"), ("SERVER_CMD", "x")]).unwrap_err();
        assert!(matches!(err, FunnelError::IllegalArgument(_)));
    }

    #[test]
    fn test_negative_timeout_coerced_to_zero() {
        let config = config_from(&[("TIMEOUT", "-100"), ("SERVER_CMD", "x")]).unwrap();
        assert_eq!(config.timeout_ms, 0);
    }

    #[test]
    fn test_unparsable_timeout_is_fatal() {
        let err = config_from(&[("TIMEOUT", "soon"), ("SERVER_CMD", "x")]).unwrap_err();
        assert!(matches!(err, FunnelError::IllegalArgument(_)));
    }

    #[test]
    fn test_blank_secret_entries_dropped() {
        let config =
            config_from(&[("SECRETS", "one,, two ,"), ("SERVER_CMD", "x")]).unwrap();
        assert_eq!(config.secrets, vec!["one", "two"]);
    }

    #[test]
    fn test_unparsable_port_is_fatal() {
        let err = config_from(&[("PORT", "eighty"), ("SERVER_CMD", "x")]).unwrap_err();
        assert!(matches!(err, FunnelError::IllegalArgument(_)));
    }
}
