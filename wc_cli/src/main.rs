use clap::Parser;
use libwalletconnect::{ProposalParams, SessionRequestEvent};
use log::*;
use wc_cli::commands::{
    check_proposal, describe_uri, exec_address_command, load_addresses, load_relay_config, simulate,
    translate_request,
};
use wc_cli::config::{CliCommand, Config, GlobalOptions};
use wc_cli::wallet_file::load_json;
use wc_relay::config::default_config_path;

#[tokio::main]
async fn main() {
    env_logger::init();
    let config: Config = Config::parse();
    let (global_options, command) = config.to_parts();

    let result = exec_command(command, global_options).await;

    match result {
        Ok(output) => {
            println!("{output}")
        }
        Err(err) => {
            eprintln!("** Error ** \n {err}");
            std::process::exit(1);
        }
    }
}

async fn exec_command(command: CliCommand, options: GlobalOptions) -> Result<String, anyhow::Error> {
    match command {
        CliCommand::Uri { uri } => describe_uri(&uri),
        CliCommand::Address(cmd) => exec_address_command(cmd, &options),
        CliCommand::CheckProposal { file, address } => {
            let params: ProposalParams = load_json(&file)?;
            let config = load_relay_config(&options)?;
            let addresses = load_addresses(&options)?;
            info!("Checking proposal {} against {} addresses on {}", params.id, addresses.len(), config.network_id);
            check_proposal(&params, &config.network_id, &addresses, address.as_deref())
        }
        CliCommand::Translate { file } => {
            let event: SessionRequestEvent = load_json(&file)?;
            let addresses = load_addresses(&options)?;
            translate_request(&event, &addresses)
        }
        CliCommand::Simulate { file, decision } => {
            let event: SessionRequestEvent = load_json(&file)?;
            let config = load_relay_config(&options)?;
            let addresses = load_addresses(&options)?;
            let response = simulate(event, config, addresses, decision).await?;
            Ok(serde_json::to_string_pretty(&response)?)
        }
        CliCommand::ShowConfig { save } => {
            let config = load_relay_config(&options)?;
            let mut output = serde_yml::to_string(&config)?;
            if save {
                let path = options.config_file.clone().unwrap_or_else(default_config_path);
                config.save(&path)?;
                output.push_str(&format!("Saved to {}", path.display()));
            }
            Ok(output)
        }
    }
}
