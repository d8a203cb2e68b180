//! Wallet-side building blocks for relay-mediated dApp sessions.
//!
//! This crate holds everything that does not need a network connection:
//! - the wallet's view of its own addresses and the signer lookup ([`address`])
//! - chain references and the proposal compatibility rules ([`chain`], [`compatibility`])
//! - the proposal, session and request data model ([`proposal`], [`session`], [`request`])
//! - normalisation of signing requests into signing intents ([`intent`])
//! - protocol responses and the error codes the wallet answers with ([`protocol`])
//! - the single-flight proposal and request flows ([`state_machine`])
pub mod address;
pub mod amount;
pub mod chain;
pub mod compatibility;
pub mod intent;
pub mod pairing;
pub mod proposal;
pub mod protocol;
pub mod request;
pub mod session;
pub mod state_machine;
pub mod transaction;

pub use address::{resolve_signer, Address};
pub use amount::{AssetAmount, AttoAmount, NATIVE_TOKEN_ID};
pub use chain::{AddressGroup, ChainRef};
pub use compatibility::{validate, CompatibleProposal, IncompatibleProposal};
pub use intent::{signing_intent, SigningIntent, TranslateError};
pub use pairing::{Pairing, PairingUri};
pub use proposal::{Namespace, Namespaces, PeerMetadata, ProposalParams, SessionProposal};
pub use protocol::{ErrorReason, RpcResponse};
pub use request::{RelayMethod, RequestKey, SessionRequestEvent};
pub use session::ActiveSession;
pub use transaction::{SignResult, UnsignedTransaction};
