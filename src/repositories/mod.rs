//! Repository interfaces and gateway-backed implementations.
//!
//! The core services consume the ledger gateway through three narrow async
//! traits: alias resolution, multisig lookups, and network configuration.
//! Concrete REST implementations over the gateway's JSON API live in `rest`;
//! tests substitute their own implementations.

mod error;
mod rest;

use async_trait::async_trait;

use crate::models::{
	Address, MultisigAccountGraphInfo, MultisigAccountInfo, NetworkProperties, UnresolvedAddress,
};

pub use error::RepositoryError;
pub use rest::{
	RestGatewayClient, RestMultisigRepository, RestNamespaceRepository, RestNetworkRepository,
};

/// Resolves address references that may be namespace aliases.
#[async_trait]
pub trait AddressResolver: Send + Sync {
	/// Resolves an address reference to a concrete address.
	///
	/// Concrete addresses resolve to themselves; aliases require a network
	/// lookup and fail with [`RepositoryError::NotFound`] when the namespace
	/// does not exist or carries no address alias.
	async fn resolve(&self, address: &UnresolvedAddress) -> Result<Address, RepositoryError>;
}

/// Supplies multisig membership facts for accounts.
#[async_trait]
pub trait MultisigRepository: Send + Sync {
	/// Returns the immediate multisig facts for an address.
	async fn multisig_account_info(
		&self,
		address: &Address,
	) -> Result<MultisigAccountInfo, RepositoryError>;

	/// Returns the full multisig ownership graph around an address.
	async fn multisig_account_graph(
		&self,
		address: &Address,
	) -> Result<MultisigAccountGraphInfo, RepositoryError>;
}

/// Supplies network-wide configuration.
#[async_trait]
pub trait NetworkRepository: Send + Sync {
	/// Returns the network properties document.
	async fn network_properties(&self) -> Result<NetworkProperties, RepositoryError>;
}
