use crate::error::CliError;
use libwalletconnect::Address;
use log::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The set of addresses the CLI treats as "held by the wallet".
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WalletFile {
    #[serde(default)]
    pub addresses: Vec<Address>,
}

impl WalletFile {
    pub fn try_load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, CliError> {
        let path = path.map(|p| p.as_ref().to_path_buf()).unwrap_or_else(default_wallet_path);
        debug!("Loading wallet addresses from {}", path.display());
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let wallet = serde_yml::from_reader(reader)?;
        Ok(wallet)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_yml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.addresses.iter().any(|a| a.hash == hash)
    }

    /// Adds `address`, returning the address it replaced, if any.
    pub fn insert(&mut self, address: Address) -> Option<Address> {
        match self.addresses.iter_mut().find(|a| a.hash == address.hash) {
            Some(existing) => Some(std::mem::replace(existing, address)),
            None => {
                self.addresses.push(address);
                None
            }
        }
    }

    pub fn remove<S: AsRef<str>>(&mut self, hash: S) -> Option<Address> {
        let index = self.addresses.iter().position(|a| a.hash == hash.as_ref())?;
        Some(self.addresses.remove(index))
    }
}

pub fn default_wallet_path() -> PathBuf {
    let mut home = std::env::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.push(".walletconnect");
    home.push("addresses.yml");
    home
}

/// Reads a JSON document, e.g. proposal parameters or a session request captured from a relay.
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, CliError> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let value = serde_json::from_reader(reader)?;
    Ok(value)
}
