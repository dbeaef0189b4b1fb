//! Verifier error types.

use thiserror::Error;

use crate::{models::TransactionType, repositories::RepositoryError};

/// Errors that can occur while verifying aggregate completeness
#[derive(Debug, Error)]
pub enum VerifierError {
	/// The transaction under verification is not an aggregate
	#[error("expected an aggregate transaction, got {0:?}")]
	NotAggregate(TransactionType),

	/// A multisig or network lookup failed.
	///
	/// Lookups are never retried here; retry policy belongs to the transport
	/// layer.
	#[error(transparent)]
	Repository(#[from] RepositoryError),

	/// The network configuration lacks a property this call depends on
	#[error("network configuration has no `{0}` property")]
	MissingNetworkProperty(&'static str),

	/// A network property value could not be interpreted
	#[error("network property `{name}` has unusable value `{value}`")]
	InvalidNetworkProperty {
		name: &'static str,
		value: String,
	},
}
