use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// WalletConnect session tooling for Alephium wallets.
///
/// Inspects pairing URIs, checks session proposals against a wallet's addresses and shows what a session request
/// would ask the wallet to sign. Nothing here connects to a relay.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Config {
    /// Path to the relay configuration file. The default is `$HOME/.walletconnect/config.yml`.
    #[arg(long = "config-file", short = 'c')]
    pub config_file: Option<PathBuf>,
    /// Path to the wallet address file. The default is `$HOME/.walletconnect/addresses.yml`.
    #[arg(long = "wallet-file", short = 'w')]
    pub wallet_file: Option<PathBuf>,
    /// Overrides the network the wallet is on.
    #[arg(long = "network", short = 'n', env = "WC_NETWORK")]
    pub network: Option<String>,
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Parse a `wc:` pairing URI and show its parts.
    #[command(name = "uri")]
    Uri { uri: String },
    /// Add, list or remove wallet addresses.
    #[command(subcommand, name = "address", alias = "addr")]
    Address(AddressCommand),
    /// Check a session proposal (JSON file) against the wallet's addresses.
    #[command(name = "check-proposal", alias = "check")]
    CheckProposal {
        /// The proposal parameters as delivered by the relay.
        file: PathBuf,
        /// Only check this address hash.
        #[arg(long = "address", short = 'a')]
        address: Option<String>,
    },
    /// Translate a session request (JSON file) into the signing intent the wallet would build.
    #[command(name = "translate")]
    Translate { file: PathBuf },
    /// Run a session request (JSON file) through an offline coordinator and print the response the dApp would get.
    #[command(name = "simulate", alias = "sim")]
    Simulate {
        file: PathBuf,
        /// What the user does with the request once it is shown.
        #[arg(long = "decision", short = 'd', value_enum, default_value_t = Decision::Approve)]
        decision: Decision,
    },
    /// Print the effective relay configuration.
    #[command(name = "config")]
    ShowConfig {
        /// Write the effective configuration back to the configuration file.
        #[arg(long = "save", default_value_t = false)]
        save: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum AddressCommand {
    /// Add an address, replacing any address with the same hash.
    #[command(name = "add")]
    Add {
        hash: String,
        public_key: String,
        group: u8,
        #[arg(long = "label", short = 'l')]
        label: Option<String>,
    },
    #[command(name = "list", alias = "ls")]
    List,
    #[command(name = "remove", alias = "rm", alias = "del")]
    Remove { hash: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Decision {
    Approve,
    Reject,
    /// Close the request without answering it. The coordinator rejects it on the user's behalf.
    Dismiss,
}

pub struct GlobalOptions {
    pub config_file: Option<PathBuf>,
    pub wallet_file: Option<PathBuf>,
    pub network: Option<String>,
}

impl Config {
    pub fn to_parts(self) -> (GlobalOptions, CliCommand) {
        let global =
            GlobalOptions { config_file: self.config_file, wallet_file: self.wallet_file, network: self.network };
        (global, self.command)
    }
}
