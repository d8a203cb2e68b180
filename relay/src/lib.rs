//! Wallet-side session coordination over a relay.
//!
//! The [`SessionCoordinator`] sits between a relay client (anything implementing [`adapter::RelayClient`]) and the
//! wallet (anything implementing [`delegates::WalletDelegate`]). It pairs with dApps, puts session proposals and
//! signing requests in front of the user one at a time, and makes sure every request it takes in is answered exactly
//! once.
pub mod adapter;
pub mod config;
pub mod coordinator;
pub mod delegates;
pub mod errors;
#[cfg(feature = "mocks")]
pub mod mock_relay;
pub mod subscription;

#[cfg(all(test, feature = "mocks"))]
mod tests;

pub use adapter::{EventKind, ProposalApproval, RelayClient, RelayConnector, RelayEvent};
pub use config::{ConfigError, RelayConfig, WalletMetadata};
pub use coordinator::SessionCoordinator;
pub use errors::{ApiError, ConnectionError, CoordinatorError, PairingError, RelayError};
