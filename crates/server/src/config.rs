use std::path::PathBuf;

use clap::Parser;

use proctor_core::shared::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_PORT, DEFAULT_STORE_PATH,
};

/// Face-count proctoring service.
///
/// Every option can also be set through the environment (or a `.env` file).
#[derive(Parser, Debug, Clone)]
#[command(name = "proctor-server", version)]
pub struct ServerConfig {
    /// Bind address.
    #[arg(long, env = "PROCTOR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Bind port.
    #[arg(long, env = "PROCTOR_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite file holding violation records (`:memory:` for a throwaway store).
    #[arg(long, env = "PROCTOR_STORE", default_value = DEFAULT_STORE_PATH)]
    pub store: String,

    /// Face model weights. Resolved from the cache or downloaded when unset.
    #[arg(long, env = "PROCTOR_MODEL")]
    pub model: Option<PathBuf>,

    /// Minimum confidence (exclusive) for a detection to count as a face.
    #[arg(long, env = "PROCTOR_CONFIDENCE", default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    pub confidence: f64,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["proctor-server"]).unwrap();
        assert_eq!(config.port, 5001);
        assert_eq!(config.store, "proctoring.db");
        assert!(config.model.is_none());
        assert_eq!(config.confidence, 0.5);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "proctor-server",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--store",
            ":memory:",
            "--confidence",
            "0.7",
        ])
        .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.store, ":memory:");
        assert_eq!(config.confidence, 0.7);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(ServerConfig::try_parse_from(["proctor-server", "--port", "99999"]).is_err());
    }
}
