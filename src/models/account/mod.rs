//! Account-related domain models.

mod address;
mod multisig;

pub use address::{
	Address, AddressParseError, NamespaceId, UnresolvedAddress, ADDRESS_ENCODED_LEN,
	NAMESPACE_HEX_LEN,
};
pub use multisig::{MultisigAccountGraphInfo, MultisigAccountInfo};
