//! Multisig repository over the REST gateway.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
	models::{Address, MultisigAccountGraphInfo, MultisigAccountInfo},
	repositories::{rest::RestGatewayClient, MultisigRepository, RepositoryError},
};

/// Envelope the gateway wraps multisig entries in.
#[derive(Debug, Deserialize)]
struct MultisigDto {
	multisig: MultisigAccountInfo,
}

/// One level of the multisig graph response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MultisigGraphLevelDto {
	level: i32,
	multisig_entries: Vec<MultisigDto>,
}

/// [`MultisigRepository`] backed by `GET /account/{address}/multisig`.
#[derive(Clone, Debug)]
pub struct RestMultisigRepository {
	client: RestGatewayClient,
}

impl RestMultisigRepository {
	pub fn new(client: RestGatewayClient) -> Self {
		Self { client }
	}
}

#[async_trait]
impl MultisigRepository for RestMultisigRepository {
	async fn multisig_account_info(
		&self,
		address: &Address,
	) -> Result<MultisigAccountInfo, RepositoryError> {
		let dto: MultisigDto = self
			.client
			.get_json(
				&format!("account/{}/multisig", address.plain()),
				"multisig account",
				address.plain(),
			)
			.await?;
		Ok(dto.multisig)
	}

	async fn multisig_account_graph(
		&self,
		address: &Address,
	) -> Result<MultisigAccountGraphInfo, RepositoryError> {
		let levels: Vec<MultisigGraphLevelDto> = self
			.client
			.get_json(
				&format!("account/{}/multisig/graph", address.plain()),
				"multisig graph",
				address.plain(),
			)
			.await?;

		let mut entries: BTreeMap<i32, Vec<MultisigAccountInfo>> = BTreeMap::new();
		for level in levels {
			entries
				.entry(level.level)
				.or_default()
				.extend(level.multisig_entries.into_iter().map(|dto| dto.multisig));
		}
		Ok(MultisigAccountGraphInfo::new(entries))
	}
}
