//! # Server Configuration
//!
//! Resolution order: CLI flag, then `CANOPY_*` environment variable, then
//! default.

use std::num::NonZeroU32;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SPECIES: &str = "neem";
pub const DEFAULT_RATE_LIMIT_PER_SEC: u32 = 50;

pub const ENV_HOST: &str = "CANOPY_HOST";
pub const ENV_PORT: &str = "CANOPY_PORT";
pub const ENV_API_KEY: &str = "CANOPY_API_KEY";
pub const ENV_SPECIES: &str = "CANOPY_SPECIES";
pub const ENV_SIMULATE_INTERVAL: &str = "CANOPY_SIMULATE_INTERVAL_SECS";
pub const ENV_RATE_LIMIT: &str = "CANOPY_RATE_LIMIT_PER_SEC";

/// Values given on the command line; `None` falls through to the environment.
#[derive(Debug, Clone, Default)]
pub struct ServerOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub species: Option<String>,
    pub simulate_interval_secs: Option<u64>,
    pub rate_limit_per_sec: Option<u32>,
}

/// Fully resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// When set, device posts must present this key.
    pub api_key: Option<String>,
    /// Species scored by `POST /sensor-data` and by default in `GET /score`.
    pub species: String,
    /// Background simulator period; `None` disables it.
    pub simulate_interval: Option<Duration>,
    pub rate_limit_per_sec: NonZeroU32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            species: DEFAULT_SPECIES.to_string(),
            simulate_interval: None,
            rate_limit_per_sec: NonZeroU32::MIN.saturating_add(DEFAULT_RATE_LIMIT_PER_SEC - 1),
        }
    }
}

impl ServerConfig {
    /// Resolve from overrides and the process environment.
    pub fn resolve(overrides: ServerOverrides) -> Result<Self, String> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve from overrides and an arbitrary variable lookup.
    pub fn resolve_with<F>(overrides: ServerOverrides, lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = overrides.host.or_else(|| env(ENV_HOST)).unwrap_or(defaults.host);

        let port = match overrides.port {
            Some(port) => port,
            None => match env(ENV_PORT) {
                Some(raw) => parse_var(ENV_PORT, &raw)?,
                None => defaults.port,
            },
        };

        let api_key = overrides
            .api_key
            .or_else(|| env(ENV_API_KEY))
            .filter(|k| !k.is_empty());

        let species = overrides
            .species
            .or_else(|| env(ENV_SPECIES))
            .unwrap_or(defaults.species)
            .trim()
            .to_lowercase();

        let interval_secs = match overrides.simulate_interval_secs {
            Some(secs) => Some(secs),
            None => match env(ENV_SIMULATE_INTERVAL) {
                Some(raw) => Some(parse_var::<u64>(ENV_SIMULATE_INTERVAL, &raw)?),
                None => None,
            },
        };
        let simulate_interval = interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let rate = match overrides.rate_limit_per_sec {
            Some(rate) => rate,
            None => match env(ENV_RATE_LIMIT) {
                Some(raw) => parse_var(ENV_RATE_LIMIT, &raw)?,
                None => defaults.rate_limit_per_sec.get(),
            },
        };
        let rate_limit_per_sec =
            NonZeroU32::new(rate).ok_or_else(|| format!("{ENV_RATE_LIMIT} must be at least 1"))?;

        Ok(Self {
            host,
            port,
            api_key,
            species,
            simulate_interval,
            rate_limit_per_sec,
        })
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("invalid value for {name}: '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_input() {
        let config = ServerConfig::resolve_with(ServerOverrides::default(), env(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.rate_limit_per_sec.get(), 50);
        assert!(config.simulate_interval.is_none());
    }

    #[test]
    fn environment_fills_gaps() {
        let config = ServerConfig::resolve_with(
            ServerOverrides::default(),
            env(&[
                (ENV_PORT, "9090"),
                (ENV_API_KEY, "s3cret"),
                (ENV_SPECIES, "Teak"),
                (ENV_SIMULATE_INTERVAL, "5"),
            ]),
        )
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.api_key.as_deref(), Some("s3cret"));
        assert_eq!(config.species, "teak");
        assert_eq!(config.simulate_interval, Some(Duration::from_secs(5)));
    }

    #[test]
    fn flags_beat_environment() {
        let overrides = ServerOverrides {
            port: Some(7000),
            species: Some("oak".into()),
            ..ServerOverrides::default()
        };
        let config =
            ServerConfig::resolve_with(overrides, env(&[(ENV_PORT, "9090"), (ENV_SPECIES, "pine")]))
                .unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.species, "oak");
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(ServerConfig::resolve_with(ServerOverrides::default(), env(&[(ENV_PORT, "http")])).is_err());
        assert!(ServerConfig::resolve_with(ServerOverrides::default(), env(&[(ENV_RATE_LIMIT, "0")])).is_err());
    }

    #[test]
    fn zero_interval_disables_simulator() {
        let overrides = ServerOverrides {
            simulate_interval_secs: Some(0),
            ..ServerOverrides::default()
        };
        let config = ServerConfig::resolve_with(overrides, env(&[])).unwrap();
        assert!(config.simulate_interval.is_none());
    }
}
