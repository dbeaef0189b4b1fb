//! Domain models and data structures for the ledger SDK.
//!
//! This module contains the core value types used throughout the crate:
//!
//! - `account`: addresses, aliases, and multisig metadata
//! - `blockchain`: block push payloads
//! - `network`: network configuration
//! - `transaction`: transaction, status, and cosignature push payloads

mod account;
mod blockchain;
mod network;
mod transaction;

pub use account::{
	Address, AddressParseError, MultisigAccountGraphInfo, MultisigAccountInfo, NamespaceId,
	UnresolvedAddress, ADDRESS_ENCODED_LEN, NAMESPACE_HEX_LEN,
};
pub use blockchain::{BlockHeader, BlockInfo, BlockMeta, FinalizedBlockInfo};
pub use network::{AggregateNetworkProperties, NetworkProperties, PluginProperties};
pub use transaction::{
	Cosignature, CosignatureSignedTransaction, InnerTransaction, Transaction, TransactionInfo,
	TransactionMeta, TransactionStatusError, TransactionType,
};

pub(crate) use network::parse_property_value;
