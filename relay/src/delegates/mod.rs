//! The wallet-side collaborators the coordinator delegates to.
#[cfg(feature = "mocks")]
pub mod dummy_delegate;
pub mod error;
pub mod traits;

pub use error::DelegateError;
pub use traits::{
    AddressStore, ApiPassthrough, DecisionSurface, Notification, NotificationLevel, TransactionBuilder,
    TransactionSigner, WalletDelegate,
};
