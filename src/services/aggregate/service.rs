//! Aggregate completion verification.
//!
//! Decides whether a signed aggregate transaction already carries every
//! cosignature it needs to be announced complete, or must instead go through
//! the bonded/partial flow. The decision walks each inner transaction
//! signer's multisig ownership graph bottom-up so that a nested multisig
//! whose own threshold is met counts as a signer toward its parent.

use std::collections::HashSet;

use futures::future::try_join_all;

use crate::{
	models::{
		parse_property_value, Address, InnerTransaction, MultisigAccountGraphInfo, Transaction,
	},
	repositories::{MultisigRepository, NetworkRepository},
	services::aggregate::VerifierError,
};

/// Name of the network property bounding cosignatures per aggregate.
const MAX_COSIGNATURES_PROPERTY: &str = "maxCosignaturesPerAggregate";

/// Verifies cosignature completeness of aggregate transactions.
pub struct AggregateVerifier<M, N> {
	multisig: M,
	network: N,
}

impl<M, N> AggregateVerifier<M, N>
where
	M: MultisigRepository,
	N: NetworkRepository,
{
	pub fn new(multisig: M, network: N) -> Self {
		Self { multisig, network }
	}

	/// True when every inner transaction of the aggregate has collected the
	/// cosignatures its signer requires.
	///
	/// The signer set is the aggregate's own signer plus every attached
	/// cosignature's signer. Inner transactions are verified independently
	/// and concurrently; each one either needs its (ordinary) signer in the
	/// signer set, or needs its signer's multisig graph to validate against
	/// that set.
	///
	/// # Errors
	/// * [`VerifierError::NotAggregate`] - the transaction carries no inner
	///   transactions by construction
	/// * [`VerifierError::Repository`] - a multisig lookup failed; the
	///   failure is surfaced, never retried
	pub async fn is_complete(&self, aggregate: &Transaction) -> Result<bool, VerifierError> {
		if !aggregate.is_aggregate() {
			return Err(VerifierError::NotAggregate(aggregate.transaction_type));
		}

		let mut signers: HashSet<String> = aggregate
			.cosignatures
			.iter()
			.map(|cosignature| cosignature.signer_address.plain().to_string())
			.collect();
		if let Some(signer) = &aggregate.signer_address {
			signers.insert(signer.plain().to_string());
		}

		let checks = aggregate
			.transactions
			.iter()
			.map(|inner| self.inner_transaction_satisfied(inner, &signers));
		let results = try_join_all(checks).await?;
		Ok(results.into_iter().all(|satisfied| satisfied))
	}

	/// The number of distinct cosignatory addresses reachable anywhere in an
	/// address's multisig graph.
	pub async fn max_cosignatures(&self, address: &Address) -> Result<usize, VerifierError> {
		let graph = self.multisig.multisig_account_graph(address).await?;
		let distinct: HashSet<&str> = graph
			.nodes()
			.flat_map(|node| node.cosignatory_addresses.iter())
			.map(Address::plain)
			.collect();
		Ok(distinct.len())
	}

	/// The network-wide bound on cosignatures per aggregate.
	///
	/// # Errors
	/// * [`VerifierError::MissingNetworkProperty`] - the network does not
	///   publish the property; this is a misconfiguration, not a default
	pub async fn network_max_cosignatures_per_aggregate(&self) -> Result<u32, VerifierError> {
		let properties = self.network.network_properties().await?;
		let raw = properties
			.max_cosignatures_per_aggregate()
			.ok_or(VerifierError::MissingNetworkProperty(
				MAX_COSIGNATURES_PROPERTY,
			))?;
		parse_property_value(raw).ok_or_else(|| VerifierError::InvalidNetworkProperty {
			name: MAX_COSIGNATURES_PROPERTY,
			value: raw.to_string(),
		})
	}

	async fn inner_transaction_satisfied(
		&self,
		inner: &InnerTransaction,
		signers: &HashSet<String>,
	) -> Result<bool, VerifierError> {
		let info = self
			.multisig
			.multisig_account_info(&inner.signer_address)
			.await?;
		if !info.is_multisig() {
			return Ok(signers.contains(inner.signer_address.plain()));
		}

		let graph = self
			.multisig
			.multisig_account_graph(&inner.signer_address)
			.await?;
		Ok(validate_cosignatories(
			&graph,
			signers,
			inner.is_cosignatory_removal(),
		))
	}
}

/// Walks a multisig graph bottom-up against the received signer set.
///
/// Levels are visited from the most deeply nested to the root. At each
/// genuine multisig node (both thresholds at least one), the cosignatories
/// already present in the received set are counted against the applicable
/// threshold: `min_removal` when the inner transaction removes cosignatories,
/// `min_approval` otherwise. A node that meets its threshold is added to the
/// received set so it counts as a signer at the next shallower level; a node
/// that misses it flips the running result to false. The result after the
/// last level decides.
fn validate_cosignatories(
	graph: &MultisigAccountGraphInfo,
	signers: &HashSet<String>,
	is_removal: bool,
) -> bool {
	let mut received: HashSet<String> = signers.clone();
	let mut satisfied = false;

	for (_, nodes) in graph.levels_deepest_first() {
		for node in nodes {
			if node.min_approval < 1 || node.min_removal < 1 {
				continue;
			}
			let matched = node
				.cosignatory_addresses
				.iter()
				.filter(|cosignatory| received.contains(cosignatory.plain()))
				.count() as u32;
			let threshold = if is_removal {
				node.min_removal
			} else {
				node.min_approval
			};
			if matched >= threshold {
				received.insert(node.account_address.plain().to_string());
				satisfied = true;
			} else {
				satisfied = false;
			}
		}
	}
	satisfied
}
