use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub alpaca: AlpacaConfig,
    pub watch: WatchConfig,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaConfig {
    pub stream_url: String,
    pub trading_base_url: String,
    #[serde(skip)]
    pub api_key: String,
    #[serde(skip)]
    pub api_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    pub symbols: Vec<String>,
    #[serde(default = "default_step_pct")]
    pub step_pct: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub channel_id: String,
    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default)]
    pub retry_once: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatConfig {
    #[serde(default = "default_heartbeat_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_step_pct() -> f64 {
    5.0
}

fn default_dispatch_timeout_secs() -> u64 {
    15
}

fn default_max_in_flight() -> usize {
    8
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_heartbeat_interval_secs() -> u64 {
    60
}

fn default_log_file() -> String {
    "price-sentinel.log".to_string()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_heartbeat_interval_secs(),
        }
    }
}

impl WatchConfig {
    /// Watchlist normalized to uppercase with duplicates removed, order kept.
    pub fn watch_symbols(&self) -> Vec<String> {
        let mut out = Vec::new();
        for sym in &self.symbols {
            let s = sym.trim().to_ascii_uppercase();
            if !s.is_empty() && !out.iter().any(|v| v == &s) {
                out.push(s);
            }
        }
        out
    }
}

impl GatewayConfig {
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }
}

impl StreamConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl HeartbeatConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = Path::new("config/default.toml");
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;

        let mut config: Config =
            toml::from_str(&config_str).context("failed to parse config/default.toml")?;

        config.alpaca.api_key = std::env::var("APCA_API_KEY_ID")
            .context("APCA_API_KEY_ID not set in .env or environment")?;
        config.alpaca.api_secret = std::env::var("APCA_API_SECRET_KEY")
            .context("APCA_API_SECRET_KEY not set in .env or environment")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.watch.watch_symbols().is_empty() {
            bail!("watch.symbols must list at least one symbol");
        }
        if self.watch.step_pct <= 0.0 {
            bail!("watch.step_pct must be > 0 (got {})", self.watch.step_pct);
        }
        if self.gateway.dispatch_timeout_secs == 0 {
            bail!("gateway.dispatch_timeout_secs must be > 0");
        }
        if self.gateway.max_in_flight == 0 {
            bail!("gateway.max_in_flight must be > 0");
        }
        if self.stream.reconnect_delay_secs == 0 {
            bail!("stream.reconnect_delay_secs must be > 0");
        }
        if self.heartbeat.interval_secs == 0 {
            bail!("heartbeat.interval_secs must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[alpaca]
stream_url = "wss://stream.data.alpaca.markets/v2/iex"
trading_base_url = "https://paper-api.alpaca.markets"

[watch]
symbols = ["AMZN", "MSTR"]
step_pct = 5.0

[gateway]
base_url = "http://localhost:18789"
channel_id = "1469273412357718048"

[logging]
level = "info"
"#;

    #[test]
    fn parse_default_toml() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.watch.symbols, vec!["AMZN", "MSTR"]);
        assert!((config.watch.step_pct - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.gateway.dispatch_timeout_secs, 15);
        assert_eq!(config.gateway.max_in_flight, 8);
        assert!(!config.gateway.retry_once);
        assert_eq!(config.stream.reconnect_delay_secs, 5);
        assert_eq!(config.heartbeat.interval_secs, 60);
        assert_eq!(config.logging.file, "price-sentinel.log");
    }

    #[test]
    fn watch_symbols_dedup_and_uppercase() {
        let cfg = WatchConfig {
            symbols: vec![
                "amzn".to_string(),
                "AMZN".to_string(),
                "  ".to_string(),
                "mstr".to_string(),
            ],
            step_pct: 5.0,
        };
        assert_eq!(
            cfg.watch_symbols(),
            vec!["AMZN".to_string(), "MSTR".to_string()]
        );
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.watch.step_pct = 0.0;
        assert!(config.validate().is_err());

        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.watch.symbols.clear();
        assert!(config.validate().is_err());

        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.gateway.max_in_flight = 0;
        assert!(config.validate().is_err());
    }
}
