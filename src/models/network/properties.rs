//! Network properties DTO.
//!
//! The gateway renders numeric property values as strings, optionally with
//! `'` digit separators (e.g. `"1'000"`). Accessors parse on demand so absent
//! or malformed values surface as errors at the call site instead of at
//! decode time.

use serde::{Deserialize, Serialize};

/// Aggregate-plugin configuration of the network.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateNetworkProperties {
	#[serde(default)]
	pub max_transactions_per_aggregate: Option<String>,
	#[serde(default)]
	pub max_cosignatures_per_aggregate: Option<String>,
}

/// Per-plugin configuration sections.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginProperties {
	#[serde(default)]
	pub aggregate: Option<AggregateNetworkProperties>,
}

/// Network-wide configuration as served by the gateway.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProperties {
	#[serde(default)]
	pub plugins: PluginProperties,
}

impl NetworkProperties {
	/// The raw `maxCosignaturesPerAggregate` setting, when present.
	pub fn max_cosignatures_per_aggregate(&self) -> Option<&str> {
		self.plugins
			.aggregate
			.as_ref()
			.and_then(|aggregate| aggregate.max_cosignatures_per_aggregate.as_deref())
	}
}

/// Parses a gateway property value, stripping `'` digit separators.
pub(crate) fn parse_property_value(raw: &str) -> Option<u32> {
	raw.replace('\'', "").parse().ok()
}
