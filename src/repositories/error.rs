//! Error types for repository operations.
//!
//! Every repository trait returns [`RepositoryError`] so that callers can
//! react uniformly: a missing record, a transport failure, and a malformed
//! response are the three cases the core services distinguish.

use thiserror::Error;

/// Errors that can occur during repository lookups
#[derive(Debug, Error)]
pub enum RepositoryError {
	/// The requested record does not exist on the gateway
	#[error("{entity} not found: {id}")]
	NotFound {
		/// Kind of record looked up, e.g. `multisig account`
		entity: &'static str,
		/// Identifier that was looked up
		id: String,
	},

	/// The request could not be completed
	#[error("gateway request failed: {0}")]
	Network(String),

	/// The gateway answered with something the DTO layer cannot decode
	#[error("malformed gateway response: {0}")]
	Malformed(String),
}

impl RepositoryError {
	/// Creates a not-found error for the given entity and identifier.
	pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
		Self::NotFound {
			entity,
			id: id.into(),
		}
	}

	/// True when the error is a definitive missing-record answer rather than
	/// a transport or decoding failure.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}
}
