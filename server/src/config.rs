//! Command line configuration for the server binary.

use clap::Parser;
use shared::CardCatalog;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct ServerConfig {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,
    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,
    /// Players needed to start a match
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u8).range(2..=4))]
    pub players: u8,
    /// Directory holding match snapshots
    #[arg(short, long, default_value = "./sessions")]
    pub snapshot_dir: PathBuf,
    /// Seconds between liveness checks
    #[arg(long, default_value = "20")]
    pub heartbeat_secs: u64,
    /// Seconds of silence before a session is dropped
    #[arg(long, default_value = "20")]
    pub timeout_secs: u64,
    /// Maximum number of connected sessions
    #[arg(long, default_value = "64")]
    pub max_sessions: usize,
    /// Seed for shuffling, for reproducible matches
    #[arg(long)]
    pub seed: Option<u64>,
    /// Card catalog JSON file; the built-in set is used when absent
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            players: 2,
            snapshot_dir: PathBuf::from("./sessions"),
            heartbeat_secs: 20,
            timeout_secs: 20,
            max_sessions: 64,
            seed: None,
            catalog: None,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn players_per_match(&self) -> usize {
        self.players as usize
    }

    /// Loads the configured catalog and checks it can seat a full match.
    pub fn load_catalog(&self) -> Result<CardCatalog, Box<dyn std::error::Error>> {
        let catalog = match &self.catalog {
            Some(path) => CardCatalog::from_json(&fs::read_to_string(path)?)?,
            None => CardCatalog::standard(),
        };
        catalog.ensure_playable(self.players_per_match())?;
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::parse_from(["server"]);
        assert_eq!(config.address(), "127.0.0.1:8080");
        assert_eq!(config.players_per_match(), 2);
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(20));
        assert_eq!(config.session_timeout(), Duration::from_secs(20));
        assert_eq!(config.snapshot_dir, PathBuf::from("./sessions"));
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_player_count_is_bounded() {
        assert!(ServerConfig::try_parse_from(["server", "--players", "4"]).is_ok());
        assert!(ServerConfig::try_parse_from(["server", "--players", "5"]).is_err());
        assert!(ServerConfig::try_parse_from(["server", "--players", "1"]).is_err());
    }

    #[test]
    fn test_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = CardCatalog::standard().to_json().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = ServerConfig {
            catalog: Some(file.path().to_path_buf()),
            ..ServerConfig::default()
        };
        assert_eq!(config.load_catalog().unwrap(), CardCatalog::standard());
    }

    #[test]
    fn test_missing_catalog_file_is_an_error() {
        let config = ServerConfig {
            catalog: Some(PathBuf::from("/definitely/not/here.json")),
            ..ServerConfig::default()
        };
        assert!(config.load_catalog().is_err());
    }
}
