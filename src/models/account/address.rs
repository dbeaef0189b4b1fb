//! Account address types.
//!
//! Addresses on the Meridian network are 25-byte network-tagged identifiers,
//! rendered on the wire as 40-character base32 strings. This module provides
//! the concrete [`Address`] value type, the [`NamespaceId`] alias identifier,
//! and the [`UnresolvedAddress`] union used wherever the wire accepts either.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of the rendered base32 address form.
pub const ADDRESS_ENCODED_LEN: usize = 40;

/// Length of the rendered hexadecimal namespace identifier.
pub const NAMESPACE_HEX_LEN: usize = 16;

/// Errors raised when parsing address or namespace literals
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
	/// The literal does not have the expected rendered length
	#[error("invalid address length {0}, expected {ADDRESS_ENCODED_LEN} characters")]
	InvalidLength(usize),

	/// The literal contains a character outside the base32 alphabet
	#[error("invalid address character `{0}`")]
	InvalidCharacter(char),

	/// The literal is neither an address nor a namespace identifier
	#[error("`{0}` is not an address or namespace identifier")]
	UnrecognizedForm(String),

	/// The namespace literal is not 16 hexadecimal characters
	#[error("invalid namespace identifier `{0}`")]
	InvalidNamespace(String),
}

/// A concrete account address.
///
/// Stored in normalized form: uppercase, no dash separators. Equality and
/// hashing are structural on the normalized rendering, so two addresses parsed
/// from differently-cased or dashed literals compare equal.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
	encoded: String,
}

impl Address {
	/// Parses an address from its rendered form.
	///
	/// Accepts the plain 40-character base32 rendering as well as the pretty
	/// (dash-separated) and lowercase variants; the parsed value is always
	/// normalized.
	pub fn from_encoded(raw: &str) -> Result<Self, AddressParseError> {
		let normalized: String = raw
			.chars()
			.filter(|c| *c != '-')
			.map(|c| c.to_ascii_uppercase())
			.collect();

		if normalized.len() != ADDRESS_ENCODED_LEN {
			return Err(AddressParseError::InvalidLength(normalized.len()));
		}
		if let Some(bad) = normalized
			.chars()
			.find(|c| !matches!(c, 'A'..='Z' | '2'..='7'))
		{
			return Err(AddressParseError::InvalidCharacter(bad));
		}

		Ok(Self {
			encoded: normalized,
		})
	}

	/// Returns the plain normalized rendering.
	pub fn plain(&self) -> &str {
		&self.encoded
	}

	/// Returns the pretty rendering, dash-separated every six characters.
	pub fn pretty(&self) -> String {
		let mut pretty = String::with_capacity(self.encoded.len() + self.encoded.len() / 6);
		for (i, c) in self.encoded.chars().enumerate() {
			if i > 0 && i % 6 == 0 {
				pretty.push('-');
			}
			pretty.push(c);
		}
		pretty
	}

	/// The leading character of the rendering, which encodes the network tag.
	pub fn network_tag(&self) -> char {
		// The constructor guarantees a 40-character ascii rendering
		self.encoded.as_bytes()[0] as char
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.encoded)
	}
}

impl fmt::Debug for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Address({})", self.encoded)
	}
}

impl TryFrom<String> for Address {
	type Error = AddressParseError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::from_encoded(&value)
	}
}

impl From<Address> for String {
	fn from(value: Address) -> Self {
		value.encoded
	}
}

/// A 64-bit namespace identifier used as an address alias.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamespaceId(pub u64);

impl NamespaceId {
	/// Parses a namespace identifier from its 16-character hex rendering.
	pub fn from_hex(raw: &str) -> Result<Self, AddressParseError> {
		if raw.len() != NAMESPACE_HEX_LEN {
			return Err(AddressParseError::InvalidNamespace(raw.to_string()));
		}
		u64::from_str_radix(raw, 16)
			.map(Self)
			.map_err(|_| AddressParseError::InvalidNamespace(raw.to_string()))
	}

	/// Returns the canonical 16-character uppercase hex rendering.
	pub fn to_hex(self) -> String {
		format!("{:016X}", self.0)
	}
}

impl fmt::Display for NamespaceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

impl fmt::Debug for NamespaceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "NamespaceId({})", self.to_hex())
	}
}

impl TryFrom<String> for NamespaceId {
	type Error = AddressParseError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::from_hex(&value)
	}
}

impl From<NamespaceId> for String {
	fn from(value: NamespaceId) -> Self {
		value.to_hex()
	}
}

/// An address reference that may still be an alias.
///
/// The wire accepts either a concrete address or a namespace alias in most
/// address positions; aliases must be resolved through an
/// [`AddressResolver`](crate::repositories::AddressResolver) before they can
/// be used in a subscription topic.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UnresolvedAddress {
	/// A concrete, already-resolved address
	Address(Address),
	/// A namespace alias requiring a network lookup
	Namespace(NamespaceId),
}

impl UnresolvedAddress {
	/// Parses either rendering; the two forms have disjoint lengths.
	pub fn parse(raw: &str) -> Result<Self, AddressParseError> {
		if raw.len() == NAMESPACE_HEX_LEN && raw.chars().all(|c| c.is_ascii_hexdigit()) {
			return NamespaceId::from_hex(raw).map(Self::Namespace);
		}
		if let Ok(address) = Address::from_encoded(raw) {
			return Ok(Self::Address(address));
		}
		Err(AddressParseError::UnrecognizedForm(raw.to_string()))
	}

	/// Returns the concrete address when no resolution is needed.
	pub fn as_address(&self) -> Option<&Address> {
		match self {
			Self::Address(address) => Some(address),
			Self::Namespace(_) => None,
		}
	}

	/// True when this reference equals the given concrete address.
	///
	/// An unresolved alias never matches; callers comparing aliases must
	/// resolve them first.
	pub fn matches(&self, address: &Address) -> bool {
		self.as_address() == Some(address)
	}
}

impl From<Address> for UnresolvedAddress {
	fn from(value: Address) -> Self {
		Self::Address(value)
	}
}

impl From<NamespaceId> for UnresolvedAddress {
	fn from(value: NamespaceId) -> Self {
		Self::Namespace(value)
	}
}

impl fmt::Display for UnresolvedAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Address(address) => address.fmt(f),
			Self::Namespace(id) => id.fmt(f),
		}
	}
}

impl TryFrom<String> for UnresolvedAddress {
	type Error = AddressParseError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}

impl From<UnresolvedAddress> for String {
	fn from(value: UnresolvedAddress) -> Self {
		value.to_string()
	}
}
