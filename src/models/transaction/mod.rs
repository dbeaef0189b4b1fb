//! Transaction domain models.

mod status;
#[allow(clippy::module_inception)]
mod transaction;
mod types;

pub use status::{CosignatureSignedTransaction, TransactionStatusError};
pub use transaction::{
	Cosignature, InnerTransaction, Transaction, TransactionInfo, TransactionMeta,
};
pub use types::TransactionType;
