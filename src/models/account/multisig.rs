//! Multisig account metadata models.
//!
//! [`MultisigAccountInfo`] describes one account's immediate multisig facts;
//! [`MultisigAccountGraphInfo`] is the full ownership graph around an account,
//! organized as a leveled map so validation can walk it bottom-up.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::account::Address;

/// One account's multisig configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultisigAccountInfo {
	/// The account this entry describes
	pub account_address: Address,
	/// Signatures required to approve a transaction
	pub min_approval: u32,
	/// Signatures required to remove a cosignatory
	pub min_removal: u32,
	/// Accounts authorized to cosign for this account
	#[serde(default)]
	pub cosignatory_addresses: Vec<Address>,
	/// Multisig accounts this account itself cosigns for
	#[serde(default)]
	pub multisig_addresses: Vec<Address>,
}

impl MultisigAccountInfo {
	/// True when the account actually requires cosignatures.
	///
	/// An account with both thresholds at zero is an ordinary account even if
	/// the gateway returns a multisig record for it.
	pub fn is_multisig(&self) -> bool {
		self.min_approval != 0 || self.min_removal != 0
	}
}

/// The multisig ownership graph around one account.
///
/// Levels index distance from the queried account. Validation must visit the
/// numerically greatest (most deeply nested) level first so that a nested
/// multisig whose threshold is met can count as a signer for its parent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigAccountGraphInfo {
	entries: BTreeMap<i32, Vec<MultisigAccountInfo>>,
}

impl MultisigAccountGraphInfo {
	pub fn new(entries: BTreeMap<i32, Vec<MultisigAccountInfo>>) -> Self {
		Self { entries }
	}

	/// The raw leveled entries, ascending by level.
	pub fn entries(&self) -> &BTreeMap<i32, Vec<MultisigAccountInfo>> {
		&self.entries
	}

	/// Iterates levels from the most deeply nested toward the root.
	pub fn levels_deepest_first(
		&self,
	) -> impl Iterator<Item = (i32, &[MultisigAccountInfo])> + '_ {
		self.entries
			.iter()
			.rev()
			.map(|(level, nodes)| (*level, nodes.as_slice()))
	}

	/// Every node in the graph, in deepest-first level order.
	pub fn nodes(&self) -> impl Iterator<Item = &MultisigAccountInfo> + '_ {
		self.levels_deepest_first().flat_map(|(_, nodes)| nodes)
	}
}
