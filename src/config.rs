use std::collections::HashMap;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_LOG_FILTER: &str = "jamrelay=info,tower_http=debug";
pub const DEFAULT_ICE_SERVERS: &[&str] = &[
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
    "stun:stun2.l.google.com:19302",
    "stun:stun3.l.google.com:19302",
    "stun:stun4.l.google.com:19302",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Host must not be empty")]
    EmptyHost,
}

/// Runtime settings, read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
    /// `*` allows any origin
    pub cors_origins: Vec<String>,
    /// STUN/TURN urls handed to clients
    pub ice_servers: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            cors_origins: vec!["*".to_string()],
            ice_servers: DEFAULT_ICE_SERVERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RelayConfig {
    /// Reads `JAMRELAY_HOST`, `PORT`, `JAMRELAY_LOG`, `JAMRELAY_CORS_ORIGINS`
    /// and `JAMRELAY_ICE_SERVERS`, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = match vars.get("JAMRELAY_HOST") {
            Some(host) if host.trim().is_empty() => return Err(ConfigError::EmptyHost),
            Some(host) => host.trim().to_string(),
            None => defaults.host,
        };

        let port = match vars.get("PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?,
            None => defaults.port,
        };

        let log_filter = vars
            .get("JAMRELAY_LOG")
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .unwrap_or(defaults.log_filter);

        let cors_origins = vars
            .get("JAMRELAY_CORS_ORIGINS")
            .map(|v| split_list(v))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.cors_origins);

        let ice_servers = vars
            .get("JAMRELAY_ICE_SERVERS")
            .map(|v| split_list(v))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.ice_servers);

        Ok(Self {
            host,
            port,
            log_filter,
            cors_origins,
            ice_servers,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = RelayConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert!(config.allows_any_origin());
        assert_eq!(config.ice_servers.len(), 5);
    }

    #[test]
    fn test_overrides() {
        let config = RelayConfig::from_vars(&vars(&[
            ("JAMRELAY_HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("JAMRELAY_CORS_ORIGINS", "https://a.example, https://b.example"),
            ("JAMRELAY_ICE_SERVERS", "stun:stun.example.org:3478"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.allows_any_origin());
        assert_eq!(config.ice_servers, vec!["stun:stun.example.org:3478"]);
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            RelayConfig::from_vars(&vars(&[("PORT", "http")])).unwrap_err(),
            ConfigError::InvalidPort("http".to_string())
        );
        assert_eq!(
            RelayConfig::from_vars(&vars(&[("JAMRELAY_HOST", "  ")])).unwrap_err(),
            ConfigError::EmptyHost
        );
    }
}
