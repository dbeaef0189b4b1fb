//! Namespace-based address resolution over the REST gateway.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
	models::{Address, NamespaceId, UnresolvedAddress},
	repositories::{rest::RestGatewayClient, AddressResolver, RepositoryError},
};

/// Alias kinds the gateway can attach to a namespace.
const ALIAS_TYPE_ADDRESS: u8 = 2;

#[derive(Debug, Deserialize)]
struct NamespaceDto {
	namespace: NamespaceBodyDto,
}

#[derive(Debug, Deserialize)]
struct NamespaceBodyDto {
	#[serde(default)]
	alias: Option<AliasDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AliasDto {
	#[serde(rename = "type")]
	alias_type: u8,
	#[serde(default)]
	address: Option<Address>,
}

/// [`AddressResolver`] backed by `GET /namespaces/{id}`.
///
/// Concrete addresses resolve without a network round trip; only namespace
/// aliases hit the gateway.
#[derive(Clone, Debug)]
pub struct RestNamespaceRepository {
	client: RestGatewayClient,
}

impl RestNamespaceRepository {
	pub fn new(client: RestGatewayClient) -> Self {
		Self { client }
	}

	async fn resolve_namespace(&self, id: NamespaceId) -> Result<Address, RepositoryError> {
		let hex = id.to_hex();
		let dto: NamespaceDto = self
			.client
			.get_json(&format!("namespaces/{}", hex), "namespace", &hex)
			.await?;

		match dto.namespace.alias {
			Some(alias) if alias.alias_type == ALIAS_TYPE_ADDRESS => alias
				.address
				.ok_or_else(|| RepositoryError::Malformed(format!("namespace {} address alias has no address", hex))),
			_ => Err(RepositoryError::not_found("namespace address alias", hex)),
		}
	}
}

#[async_trait]
impl AddressResolver for RestNamespaceRepository {
	async fn resolve(&self, address: &UnresolvedAddress) -> Result<Address, RepositoryError> {
		match address {
			UnresolvedAddress::Address(concrete) => Ok(concrete.clone()),
			UnresolvedAddress::Namespace(id) => self.resolve_namespace(*id).await,
		}
	}
}
