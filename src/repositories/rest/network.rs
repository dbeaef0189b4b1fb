//! Network configuration repository over the REST gateway.

use async_trait::async_trait;

use crate::{
	models::NetworkProperties,
	repositories::{rest::RestGatewayClient, NetworkRepository, RepositoryError},
};

/// [`NetworkRepository`] backed by `GET /network/properties`.
#[derive(Clone, Debug)]
pub struct RestNetworkRepository {
	client: RestGatewayClient,
}

impl RestNetworkRepository {
	pub fn new(client: RestGatewayClient) -> Self {
		Self { client }
	}
}

#[async_trait]
impl NetworkRepository for RestNetworkRepository {
	async fn network_properties(&self) -> Result<NetworkProperties, RepositoryError> {
		self.client
			.get_json("network/properties", "network properties", "network")
			.await
	}
}
