//! Server settings read from the environment.

use anyhow::Context;
use spectrangle_core::BagOrder;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// How often the lobby and each match look at their peers
    pub tick: Duration,
    /// Fixed seed for tile bags; fresh entropy per bag when absent
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 4000)),
            tick: Duration::from_millis(50),
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Read `SERVER_ADDR`, `SPECTRANGLE_TICK_MS` and `SPECTRANGLE_SEED`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let addr = match var("SERVER_ADDR") {
            Some(addr) => addr
                .parse()
                .with_context(|| format!("SERVER_ADDR {:?} is not a socket address", addr))?,
            None => defaults.addr,
        };

        let tick = match var("SPECTRANGLE_TICK_MS") {
            Some(ms) => {
                let ms: u64 = ms
                    .trim()
                    .parse()
                    .with_context(|| format!("SPECTRANGLE_TICK_MS {:?} is not a number", ms))?;
                anyhow::ensure!(ms > 0, "SPECTRANGLE_TICK_MS must be positive");
                Duration::from_millis(ms)
            }
            None => defaults.tick,
        };

        let seed = var("SPECTRANGLE_SEED")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u64>()
                    .with_context(|| format!("SPECTRANGLE_SEED {:?} is not a number", s))
            })
            .transpose()?;

        Ok(Self { addr, tick, seed })
    }

    pub fn bag_order(&self) -> BagOrder {
        match self.seed {
            Some(seed) => BagOrder::Seeded(seed),
            None => BagOrder::Random,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr.port(), 4000);
        assert_eq!(config.bag_order(), BagOrder::Random);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("SERVER_ADDR", "127.0.0.1:5555"),
            ("SPECTRANGLE_TICK_MS", "10"),
            ("SPECTRANGLE_SEED", "42"),
        ])
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:5555".parse().unwrap());
        assert_eq!(config.tick, Duration::from_millis(10));
        assert_eq!(config.bag_order(), BagOrder::Seeded(42));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(config(&[("SERVER_ADDR", "nowhere")]).is_err());
        assert!(config(&[("SPECTRANGLE_TICK_MS", "0")]).is_err());
        assert!(config(&[("SPECTRANGLE_SEED", "abc")]).is_err());
        assert!(config(&[("SPECTRANGLE_SEED", "")]).unwrap().seed.is_none());
    }
}
