use libwalletconnect::PeerMetadata;
use log::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_RELAY_URL: &str = "wss://relay.walletconnect.com";
pub const DEFAULT_NETWORK_ID: &str = "mainnet";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error. {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not read or write the configuration file. {0}")]
    Yaml(#[from] serde_yml::Error),
}

/// How the wallet presents itself to dApps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
}

impl Default for WalletMetadata {
    fn default() -> Self {
        Self {
            name: "Alephium mobile wallet".to_string(),
            description: "Alephium mobile wallet".to_string(),
            url: "https://github.com/alephium/mobile-wallet".to_string(),
            icons: vec!["https://alephium.org/favicon-32x32.png".to_string()],
        }
    }
}

impl From<WalletMetadata> for PeerMetadata {
    fn from(m: WalletMetadata) -> Self {
        PeerMetadata { name: m.name, description: m.description, url: m.url, icons: m.icons }
    }
}

/// Everything needed to create a relay client and to judge proposals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// The relay project id. The relay refuses connections without one.
    pub project_id: Option<String>,
    pub relay_url: String,
    pub metadata: WalletMetadata,
    /// The network the wallet is currently on. Proposals for other networks are refused.
    pub network_id: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            relay_url: DEFAULT_RELAY_URL.to_string(),
            metadata: WalletMetadata::default(),
            network_id: DEFAULT_NETWORK_ID.to_string(),
        }
    }
}

impl RelayConfig {
    pub fn with_network(mut self, network_id: impl Into<String>) -> Self {
        self.network_id = network_id.into();
        self
    }

    /// Loads the configuration from `path`, or from [`default_config_path`] if no path is given.
    pub fn try_load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        let path = path.map(|p| p.as_ref().to_path_buf()).unwrap_or_else(default_config_path);
        debug!("Loading relay configuration from {}", path.display());
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config = serde_yml::from_reader(reader)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_yml::to_writer(writer, self)?;
        info!("Relay configuration saved to {}", path.display());
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    let mut home = std::env::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.push(".walletconnect");
    home.push("config.yml");
    home
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.relay_url, "wss://relay.walletconnect.com");
        assert_eq!(config.network_id, "mainnet");
        assert_eq!(config.metadata.name, "Alephium mobile wallet");
        assert!(config.project_id.is_none());
        assert!(default_config_path().ends_with(".walletconnect/config.yml"));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yml");
        let config = RelayConfig { project_id: Some("abc123".into()), ..Default::default() }.with_network("testnet");
        config.save(&path).unwrap();
        let loaded = RelayConfig::try_load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "network_id: devnet\n").unwrap();
        let loaded = RelayConfig::try_load(Some(&path)).unwrap();
        assert_eq!(loaded.network_id, "devnet");
        assert_eq!(loaded.relay_url, DEFAULT_RELAY_URL);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = RelayConfig::try_load(Some(dir.path().join("nope.yml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
