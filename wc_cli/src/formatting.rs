use libwalletconnect::intent::SigningIntent;
use libwalletconnect::{Address, AssetAmount, AttoAmount, IncompatibleProposal, PairingUri, SessionProposal};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row, Table,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_table() -> Table {
    let mut table = Table::new();
    table.set_format(markdown_format());
    table
}

/// Formats an atto amount in whole units, e.g. `1.5` for 1.5e18 atto.
pub fn format_units(amount: AttoAmount) -> String {
    let (whole, fraction) = amount.to_units();
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{fraction:018}");
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

fn format_asset(asset: &AssetAmount) -> String {
    if asset.is_native() {
        format!("{} ALPH", format_units(asset.amount))
    } else {
        format!("{} of token {}", asset.amount, asset.id)
    }
}

pub fn format_addresses(addresses: &[Address]) -> String {
    let mut table = markdown_table();
    table.set_titles(row!["Hash", "Group", "Label", "Public key"]);
    for address in addresses {
        table.add_row(row![address.hash, address.group, address.label.as_deref().unwrap_or("-"), address.public_key]);
    }
    table.to_string()
}

pub fn format_pairing_uri(uri: &PairingUri) -> String {
    let mut table = markdown_table();
    table.set_titles(row!["Field", "Value"]);
    table.add_row(row!["Topic", uri.topic]);
    table.add_row(row!["Version", uri.version]);
    table.add_row(row!["Relay protocol", uri.relay_protocol.as_deref().unwrap_or("-")]);
    let sym_key = if uri.sym_key.is_some() { "present" } else { "missing" };
    table.add_row(row!["Symmetric key", sym_key]);
    table.to_string()
}

pub fn format_proposal(proposal: &SessionProposal) -> String {
    let mut chains = proposal.required_chains.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ");
    if chains.is_empty() {
        chains.push('-');
    }
    let mut table = markdown_table();
    table.set_titles(row!["Proposal", proposal.id]);
    table.add_row(row!["dApp", proposal.proposer.name]);
    table.add_row(row!["URL", proposal.proposer.url]);
    table.add_row(row!["Chains", chains]);
    table.add_row(row!["Methods", proposal.required_methods.join(", ")]);
    table.add_row(row!["Events", proposal.required_events.join(", ")]);
    table.to_string()
}

/// One row per candidate address: either the account the approval would grant, or why it cannot be used.
pub fn format_compatibility(results: &[(Address, Result<String, IncompatibleProposal>)]) -> String {
    let mut table = markdown_table();
    table.set_titles(row!["Address", "Group", "Outcome"]);
    for (address, result) in results {
        let outcome = match result {
            Ok(account) => format!("OK: {account}"),
            Err(e) => format!("Refused: {e}"),
        };
        table.add_row(row![address.hash, address.group, outcome]);
    }
    table.to_string()
}

pub fn format_intent(intent: &SigningIntent) -> String {
    let mut table = markdown_table();
    table.set_titles(row!["Intent", intent.kind()]);
    table.add_row(row!["Signer", intent.from_address()]);
    match intent {
        SigningIntent::Transfer(transfer) => {
            table.add_row(row!["To", transfer.to_address]);
            if let Some(lock_time) = transfer.lock_time {
                table.add_row(row!["Lock time", lock_time]);
            }
        }
        SigningIntent::DeployContract(deploy) => {
            table.add_row(row!["Bytecode", deploy.bytecode]);
            if let Some(issued) = deploy.issue_token_amount {
                table.add_row(row!["Tokens issued", issued]);
            }
        }
        SigningIntent::ExecuteScript(script) => {
            table.add_row(row!["Bytecode", script.bytecode]);
        }
    }
    for asset in intent.asset_amounts() {
        table.add_row(row!["Amount", format_asset(&asset)]);
    }
    let gas_amount = intent.gas_amount().map(|g| g.to_string()).unwrap_or_else(|| "estimated".to_string());
    table.add_row(row!["Gas amount", gas_amount]);
    table.add_row(row!["Gas price", intent.gas_price().unwrap_or("default")]);
    table.to_string()
}
