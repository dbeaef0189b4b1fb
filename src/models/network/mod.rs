//! Network configuration models.

mod properties;

pub use properties::{AggregateNetworkProperties, NetworkProperties, PluginProperties};

pub(crate) use properties::parse_property_value;
