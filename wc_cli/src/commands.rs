use crate::config::{AddressCommand, Decision, GlobalOptions};
use crate::error::CliError;
use crate::formatting::{format_addresses, format_compatibility, format_intent, format_pairing_uri, format_proposal};
use crate::wallet_file::{default_wallet_path, WalletFile};
use anyhow::anyhow;
use libwalletconnect::{
    signing_intent, validate, Address, PairingUri, ProposalParams, RelayMethod, RpcResponse, SessionProposal,
    SessionRequestEvent,
};
use log::*;
use std::path::{Path, PathBuf};
use wc_relay::config::default_config_path;
use wc_relay::delegates::dummy_delegate::DummyDelegate;
use wc_relay::mock_relay::MockRelay;
use wc_relay::{ConfigError, RelayConfig, RelayEvent, SessionCoordinator};

pub fn describe_uri(uri: &str) -> Result<String, anyhow::Error> {
    let uri: PairingUri = uri.parse()?;
    Ok(format_pairing_uri(&uri))
}

/// Runs every candidate address through the compatibility rules for `params`.
pub fn check_proposal(
    params: &ProposalParams,
    network: &str,
    addresses: &[Address],
    only: Option<&str>,
) -> Result<String, anyhow::Error> {
    let proposal = SessionProposal::from_params(params)
        .map_err(|e| anyhow!("The proposal would be rejected as unsupported. {e}"))?;
    let candidates = addresses.iter().filter(|a| only.map(|hash| a.hash == hash).unwrap_or(true)).collect::<Vec<_>>();
    if candidates.is_empty() {
        return Err(anyhow!("No matching addresses in the wallet file."));
    }
    let results = candidates
        .into_iter()
        .map(|a| (a.clone(), validate(&proposal, network, a).map(|c| c.account())))
        .collect::<Vec<_>>();
    Ok(format!("{}\n{}", format_proposal(&proposal), format_compatibility(&results)))
}

pub fn translate_request(event: &SessionRequestEvent, addresses: &[Address]) -> Result<String, anyhow::Error> {
    match &event.method {
        RelayMethod::RequestNodeApi | RelayMethod::RequestExplorerApi => {
            Ok(format!("{} is passed through to the wallet's API client without user approval.", event.method))
        }
        RelayMethod::Unsupported(method) => Err(anyhow!("{method} is not supported and would be refused.")),
        _ => {
            let intent = signing_intent(event, addresses)?;
            Ok(format_intent(&intent))
        }
    }
}

/// Feeds `event` to an offline coordinator backed by [`MockRelay`] and a [`DummyDelegate`] holding `addresses`,
/// applies `decision` and returns the single response the dApp would have received.
pub async fn simulate(
    event: SessionRequestEvent,
    mut config: RelayConfig,
    addresses: Vec<Address>,
    decision: Decision,
) -> Result<RpcResponse, anyhow::Error> {
    if config.project_id.is_none() {
        config.project_id = Some("offline".to_string());
    }
    let relay = MockRelay::new();
    let coordinator = SessionCoordinator::new(config, relay.clone(), DummyDelegate::new(addresses));
    let (topic, id) = (event.topic.clone(), event.id);
    coordinator.handle_event(RelayEvent::SessionRequest(event)).await;
    if coordinator.pending_request().await.is_some() {
        info!("Request is waiting for a decision. Applying {decision:?}");
        let outcome = match decision {
            Decision::Approve => coordinator.approve_request().await.map(|_| ()),
            Decision::Reject => coordinator.reject_request().await,
            Decision::Dismiss => coordinator.dismiss_request().await.map(|_| ()),
        };
        if let Err(e) = outcome {
            warn!("The decision did not go through cleanly: {e}");
        }
    }
    coordinator.shutdown().await;
    let mut responses = relay.responses_for(&topic, id);
    match responses.len() {
        1 => Ok(responses.remove(0)),
        0 => Err(anyhow!("No response was sent for {topic}#{id}")),
        n => Err(anyhow!("{n} responses were sent for {topic}#{id}")),
    }
}

pub fn exec_address_command(cmd: AddressCommand, options: &GlobalOptions) -> Result<String, anyhow::Error> {
    let path = wallet_path(options);
    let mut wallet = load_or_create_wallet(&path)?;
    let output = match cmd {
        AddressCommand::Add { hash, public_key, group, label } => {
            let mut address = Address::new(hash, public_key, group);
            if let Some(label) = label {
                address = address.with_label(label);
            }
            let line = match wallet.insert(address.clone()) {
                Some(old) => format!("Address replaced: {old} -> {address}"),
                None => format!("Address added: {address}"),
            };
            wallet.save(&path)?;
            line
        }
        AddressCommand::List => {
            format!("{} addresses found.\n{}", wallet.addresses.len(), format_addresses(&wallet.addresses))
        }
        AddressCommand::Remove { hash } => {
            let removed = wallet.remove(&hash).ok_or_else(|| anyhow!("Address {hash} not found."))?;
            wallet.save(&path)?;
            format!("Address removed: {removed}")
        }
    };
    Ok(output)
}

pub fn wallet_path(options: &GlobalOptions) -> PathBuf {
    options.wallet_file.clone().unwrap_or_else(default_wallet_path)
}

pub fn load_or_create_wallet(path: &Path) -> Result<WalletFile, anyhow::Error> {
    match WalletFile::try_load(Some(path)) {
        Ok(wallet) => Ok(wallet),
        Err(CliError::IoError(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("No wallet file at {}. Starting with no addresses", path.display());
            Ok(WalletFile::default())
        }
        Err(err) => Err(anyhow!("Error reading wallet file {}: {err}", path.display())),
    }
}

/// Loads the wallet addresses, failing if there are none to work with.
pub fn load_addresses(options: &GlobalOptions) -> Result<Vec<Address>, anyhow::Error> {
    let wallet = load_or_create_wallet(&wallet_path(options))?;
    if wallet.is_empty() {
        return Err(anyhow!("No addresses found. Use `wc address add` to add one."));
    }
    Ok(wallet.addresses)
}

/// The relay configuration from the configuration file (or the defaults if there is none), with the network
/// override applied.
pub fn load_relay_config(options: &GlobalOptions) -> Result<RelayConfig, anyhow::Error> {
    let path = options.config_file.clone().unwrap_or_else(default_config_path);
    let config = match RelayConfig::try_load(Some(&path)) {
        Ok(config) => config,
        Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("No configuration file at {}. Using the defaults", path.display());
            RelayConfig::default()
        }
        Err(err) => return Err(anyhow!("Error reading configuration file {}: {err}", path.display())),
    };
    Ok(match &options.network {
        Some(network) => config.with_network(network.clone()),
        None => config,
    })
}
