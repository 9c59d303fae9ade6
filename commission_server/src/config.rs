use std::env;

use acs_common::parse_boolean_flag;
use log::*;

const DEFAULT_ACS_HOST: &str = "127.0.0.1";
const DEFAULT_ACS_PORT: u16 = 8380;
const DEFAULT_PAYOUT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Size of the payout job dispatch queue. Payout requests block briefly when the queue is full.
    pub payout_buffer_size: usize,
    /// If true, pending database migrations are applied on startup.
    pub auto_migrate: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ACS_HOST.to_string(),
            port: DEFAULT_ACS_PORT,
            database_url: String::default(),
            payout_buffer_size: DEFAULT_PAYOUT_BUFFER_SIZE,
            auto_migrate: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("ACS_HOST").ok().unwrap_or_else(|| DEFAULT_ACS_HOST.into());
        let port = env::var("ACS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for ACS_PORT. {e} Using the default, {DEFAULT_ACS_PORT}, instead."
                    );
                    DEFAULT_ACS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_ACS_PORT);
        let database_url = env::var("ACS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ ACS_DATABASE_URL is not set. Please set it to the URL for the commission database.");
            String::default()
        });
        let payout_buffer_size = env::var("ACS_PAYOUT_BUFFER_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| {
                        warn!(
                            "🪛️ {s} is not a valid value for ACS_PAYOUT_BUFFER_SIZE. {e} Using the default, \
                             {DEFAULT_PAYOUT_BUFFER_SIZE}, instead."
                        );
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_PAYOUT_BUFFER_SIZE);
        let auto_migrate = parse_boolean_flag(env::var("ACS_AUTO_MIGRATE").ok(), false);
        Self { host, port, database_url, payout_buffer_size, auto_migrate }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8380);
        assert_eq!(config.payout_buffer_size, 25);
        assert!(!config.auto_migrate);
    }

    #[test]
    fn explicit_host_and_port() {
        let config = ServerConfig::new("0.0.0.0", 4000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 4000);
        assert_eq!(config.payout_buffer_size, 25);
    }
}
