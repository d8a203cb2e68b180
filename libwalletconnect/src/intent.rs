//! Normalisation of signing requests into [`SigningIntent`]s.
//!
//! Each signing method carries its own parameter shape. The translator resolves the signer against the wallet's
//! address set and folds the per-method amounts into a single ordered list of asset amounts, so that the transaction
//! builder and the decision surface only ever deal with one representation.
use crate::address::{resolve_signer, Address};
use crate::amount::{AssetAmount, AttoAmount};
use crate::protocol::ErrorReason;
use crate::request::{
    RelayMethod, SessionRequestEvent, SignDeployContractTxParams, SignExecuteScriptTxParams, SignTransferTxParams,
};
use log::*;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Signer address {0} does not exist in this wallet")]
    SignerNotFound(String),
    #[error("Malformed parameters for {method}: {source}")]
    InvalidParams { method: String, source: serde_json::Error },
    #[error("Transfers to {0} destinations are not supported")]
    MultipleDestinations(usize),
    #[error("Transfer has no destination")]
    NoDestination,
    #[error("Native amount total overflows")]
    AmountOverflow,
    #[error("{0} is not a signing method")]
    NotASigningMethod(String),
}

impl From<&TranslateError> for ErrorReason {
    fn from(err: &TranslateError) -> Self {
        match err {
            TranslateError::SignerNotFound(_) => ErrorReason::signer_address_not_found(),
            _ => ErrorReason::unsupported_method(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentKind {
    Transfer,
    DeployContract,
    ExecuteScript,
}

impl Display for IntentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentKind::Transfer => write!(f, "transfer"),
            IntentKind::DeployContract => write!(f, "deploy-contract"),
            IntentKind::ExecuteScript => write!(f, "execute-script"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferIntent {
    pub from_address: Address,
    pub to_address: String,
    /// The native amount always comes first, followed by the requested tokens in order.
    pub asset_amounts: Vec<AssetAmount>,
    pub lock_time: Option<u64>,
    pub gas_amount: Option<u64>,
    pub gas_price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployContractIntent {
    pub from_address: Address,
    pub bytecode: String,
    pub initial_alph_amount: Option<AssetAmount>,
    pub issue_token_amount: Option<AttoAmount>,
    pub gas_amount: Option<u64>,
    pub gas_price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteScriptIntent {
    pub from_address: Address,
    pub bytecode: String,
    pub asset_amounts: Vec<AssetAmount>,
    pub gas_amount: Option<u64>,
    pub gas_price: Option<String>,
}

/// A normalised signing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SigningIntent {
    Transfer(TransferIntent),
    DeployContract(DeployContractIntent),
    ExecuteScript(ExecuteScriptIntent),
}

impl SigningIntent {
    pub fn kind(&self) -> IntentKind {
        match self {
            SigningIntent::Transfer(_) => IntentKind::Transfer,
            SigningIntent::DeployContract(_) => IntentKind::DeployContract,
            SigningIntent::ExecuteScript(_) => IntentKind::ExecuteScript,
        }
    }

    pub fn from_address(&self) -> &Address {
        match self {
            SigningIntent::Transfer(i) => &i.from_address,
            SigningIntent::DeployContract(i) => &i.from_address,
            SigningIntent::ExecuteScript(i) => &i.from_address,
        }
    }

    pub fn asset_amounts(&self) -> Vec<AssetAmount> {
        match self {
            SigningIntent::Transfer(i) => i.asset_amounts.clone(),
            SigningIntent::DeployContract(i) => i.initial_alph_amount.iter().cloned().collect(),
            SigningIntent::ExecuteScript(i) => i.asset_amounts.clone(),
        }
    }

    pub fn gas_amount(&self) -> Option<u64> {
        match self {
            SigningIntent::Transfer(i) => i.gas_amount,
            SigningIntent::DeployContract(i) => i.gas_amount,
            SigningIntent::ExecuteScript(i) => i.gas_amount,
        }
    }

    pub fn gas_price(&self) -> Option<&str> {
        match self {
            SigningIntent::Transfer(i) => i.gas_price.as_deref(),
            SigningIntent::DeployContract(i) => i.gas_price.as_deref(),
            SigningIntent::ExecuteScript(i) => i.gas_price.as_deref(),
        }
    }
}

/// Translates a signing request into a [`SigningIntent`], resolving the signer against `addresses`.
///
/// Fails with [`TranslateError::SignerNotFound`] when the requested signer is not held by the wallet, and with
/// [`TranslateError::NotASigningMethod`] for passthrough or unsupported methods.
pub fn signing_intent(event: &SessionRequestEvent, addresses: &[Address]) -> Result<SigningIntent, TranslateError> {
    let invalid =
        |source: serde_json::Error| TranslateError::InvalidParams { method: event.method.to_string(), source };
    let intent = match &event.method {
        RelayMethod::SignAndSubmitTransferTx => {
            let params: SignTransferTxParams = event.params().map_err(invalid)?;
            let from = signer(&params.signer_address, addresses)?;
            transfer_intent(params, from).map(SigningIntent::Transfer)
        }
        RelayMethod::SignAndSubmitDeployContractTx => {
            let params: SignDeployContractTxParams = event.params().map_err(invalid)?;
            let from = signer(&params.signer_address, addresses)?;
            Ok(SigningIntent::DeployContract(deploy_contract_intent(params, from)))
        }
        RelayMethod::SignAndSubmitExecuteScriptTx => {
            let params: SignExecuteScriptTxParams = event.params().map_err(invalid)?;
            let from = signer(&params.signer_address, addresses)?;
            execute_script_intent(params, from).map(SigningIntent::ExecuteScript)
        }
        other => Err(TranslateError::NotASigningMethod(other.to_string())),
    }?;
    debug!("Request {} translated into a {} intent from {}", event.key(), intent.kind(), intent.from_address().hash);
    Ok(intent)
}

fn signer(hash: &str, addresses: &[Address]) -> Result<Address, TranslateError> {
    resolve_signer(hash, addresses).cloned().ok_or_else(|| TranslateError::SignerNotFound(hash.to_string()))
}

pub fn transfer_intent(params: SignTransferTxParams, from_address: Address) -> Result<TransferIntent, TranslateError> {
    let count = params.destinations.len();
    let mut destinations = params.destinations.into_iter();
    let destination = match (destinations.next(), count) {
        (Some(d), 1) => d,
        (None, _) => return Err(TranslateError::NoDestination),
        (Some(_), n) => return Err(TranslateError::MultipleDestinations(n)),
    };
    let mut asset_amounts = vec![AssetAmount::native(destination.atto_alph_amount)];
    asset_amounts.extend(destination.tokens.unwrap_or_default());
    Ok(TransferIntent {
        from_address,
        to_address: destination.address,
        asset_amounts,
        lock_time: destination.lock_time,
        gas_amount: params.gas_amount,
        gas_price: params.gas_price,
    })
}

pub fn deploy_contract_intent(params: SignDeployContractTxParams, from_address: Address) -> DeployContractIntent {
    DeployContractIntent {
        from_address,
        bytecode: params.bytecode,
        initial_alph_amount: params.initial_atto_alph_amount.map(AssetAmount::native),
        issue_token_amount: params.issue_token_amount,
        gas_amount: params.gas_amount,
        gas_price: params.gas_price,
    }
}

pub fn execute_script_intent(
    params: SignExecuteScriptTxParams,
    from_address: Address,
) -> Result<ExecuteScriptIntent, TranslateError> {
    let asset_amounts = merge_script_assets(params.atto_alph_amount, params.tokens.unwrap_or_default())?;
    Ok(ExecuteScriptIntent {
        from_address,
        bytecode: params.bytecode,
        asset_amounts,
        gas_amount: params.gas_amount,
        gas_price: params.gas_price,
    })
}

/// Merges the native amount and any native-id token entries into one native total, appended after the other tokens
/// when it is nonzero.
fn merge_script_assets(
    native: Option<AttoAmount>,
    tokens: Vec<AssetAmount>,
) -> Result<Vec<AssetAmount>, TranslateError> {
    let mut total = native.unwrap_or_default();
    let mut assets = Vec::with_capacity(tokens.len() + 1);
    for token in tokens {
        if token.is_native() {
            total = total.checked_add(token.amount).ok_or(TranslateError::AmountOverflow)?;
        } else {
            assets.push(token);
        }
    }
    if !total.is_zero() {
        assets.push(AssetAmount::native(total));
    }
    Ok(assets)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::amount::NATIVE_TOKEN_ID;
    use serde_json::json;

    fn wallet() -> Vec<Address> {
        vec![Address::new("signer", "pk", 1)]
    }

    fn amount(v: u64) -> AttoAmount {
        AttoAmount::from(v)
    }

    #[test]
    fn execute_script_merges_native_entries() {
        let tokens = vec![AssetAmount::new(NATIVE_TOKEN_ID, amount(5)), AssetAmount::new("TKN", amount(10))];
        let merged = merge_script_assets(Some(amount(3)), tokens).unwrap();
        assert_eq!(merged, vec![AssetAmount::new("TKN", amount(10)), AssetAmount::native(amount(8))]);
    }

    #[test]
    fn execute_script_without_amounts_has_no_assets() {
        assert!(merge_script_assets(None, vec![]).unwrap().is_empty());
        // An explicit zero is no different
        assert!(merge_script_assets(Some(AttoAmount::ZERO), vec![]).unwrap().is_empty());
    }

    #[test]
    fn execute_script_overflow() {
        let tokens = vec![AssetAmount::native(AttoAmount::from_atto(u128::MAX))];
        assert!(matches!(merge_script_assets(Some(amount(1)), tokens), Err(TranslateError::AmountOverflow)));
    }

    #[test]
    fn transfer_puts_native_first() {
        let event = SessionRequestEvent::new(
            "t",
            1,
            "alph_signAndSubmitTransferTx",
            json!({
                "signerAddress": "signer",
                "destinations": [{
                    "address": "to",
                    "attoAlphAmount": "0",
                    "tokens": [{"id": "TKN", "amount": "7"}],
                    "lockTime": 1700000000000u64
                }],
                "gasAmount": 20000
            }),
        );
        let intent = signing_intent(&event, &wallet()).unwrap();
        assert_eq!(intent.kind(), IntentKind::Transfer);
        assert_eq!(intent.from_address().hash, "signer");
        let expected = vec![AssetAmount::native(AttoAmount::ZERO), AssetAmount::new("TKN", amount(7))];
        assert_eq!(intent.asset_amounts(), expected);
        assert_eq!(intent.gas_amount(), Some(20000));
        assert!(intent.gas_price().is_none());
        match intent {
            SigningIntent::Transfer(t) => {
                assert_eq!(t.to_address, "to");
                assert_eq!(t.lock_time, Some(1700000000000));
            }
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn transfer_destination_count() {
        let params = |n: usize| SignTransferTxParams {
            signer_address: "signer".into(),
            destinations: (0..n)
                .map(|i| crate::request::Destination {
                    address: format!("to{i}"),
                    atto_alph_amount: amount(1),
                    tokens: None,
                    lock_time: None,
                })
                .collect(),
            gas_amount: None,
            gas_price: None,
        };
        let from = wallet().remove(0);
        assert!(matches!(transfer_intent(params(0), from.clone()), Err(TranslateError::NoDestination)));
        assert!(matches!(transfer_intent(params(2), from.clone()), Err(TranslateError::MultipleDestinations(2))));
        assert!(transfer_intent(params(1), from).is_ok());
    }

    #[test]
    fn deploy_contract_native_amount_is_optional() {
        let event = SessionRequestEvent::new(
            "t",
            2,
            "alph_signAndSubmitDeployContractTx",
            json!({"signerAddress": "signer", "bytecode": "0011", "issueTokenAmount": "100", "gasPrice": "1000"}),
        );
        let intent = signing_intent(&event, &wallet()).unwrap();
        assert_eq!(intent.kind().to_string(), "deploy-contract");
        assert!(intent.asset_amounts().is_empty());
        assert_eq!(intent.gas_price(), Some("1000"));
        let SigningIntent::DeployContract(deploy) = intent else { panic!("wrong kind") };
        assert_eq!(deploy.issue_token_amount, Some(amount(100)));
        assert!(deploy.initial_alph_amount.is_none());
    }

    #[test]
    fn unknown_signer_maps_to_signer_error() {
        let event = SessionRequestEvent::new(
            "t",
            3,
            "alph_signAndSubmitExecuteScriptTx",
            json!({"signerAddress": "stranger", "bytecode": "00"}),
        );
        let err = signing_intent(&event, &wallet()).unwrap_err();
        assert!(matches!(err, TranslateError::SignerNotFound(ref s) if s == "stranger"));
        assert_eq!(ErrorReason::from(&err).code, ErrorReason::SIGNER_ADDRESS_DOESNT_EXIST);
    }

    #[test]
    fn malformed_and_non_signing_requests() {
        let bad = SessionRequestEvent::new("t", 4, "alph_signAndSubmitTransferTx", json!({"destinations": 5}));
        let err = signing_intent(&bad, &wallet()).unwrap_err();
        assert!(matches!(err, TranslateError::InvalidParams { .. }));
        assert_eq!(ErrorReason::from(&err).code, ErrorReason::UNSUPPORTED_METHOD);

        let api = SessionRequestEvent::new("t", 5, "alph_requestNodeApi", json!({}));
        assert!(matches!(signing_intent(&api, &wallet()), Err(TranslateError::NotASigningMethod(_))));
    }
}
