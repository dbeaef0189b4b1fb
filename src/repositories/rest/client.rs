//! Shared JSON client for the REST gateway.

use anyhow::Context;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
	repositories::RepositoryError,
	utils::http::{create_retryable_http_client, HttpRetryConfig},
};

/// Thin JSON GET client over the gateway's REST API.
///
/// Wraps a retrying `reqwest` client with base-URL joining and the status
/// mapping shared by every repository: 404 becomes
/// [`RepositoryError::NotFound`], other non-success statuses become
/// [`RepositoryError::Network`].
#[derive(Clone, Debug)]
pub struct RestGatewayClient {
	base_url: Url,
	http: ClientWithMiddleware,
}

impl RestGatewayClient {
	/// Creates a client from a gateway base URL literal with default retry
	/// settings.
	///
	/// # Arguments
	/// * `base_url` - Gateway root, e.g. `http://localhost:3000/`
	///
	/// # Returns
	/// * `Result<Self, anyhow::Error>` - New client instance or URL parse
	///   error
	pub fn from_base_url(base_url: &str) -> Result<Self, anyhow::Error> {
		let url = Url::parse(base_url)
			.with_context(|| format!("invalid gateway base URL `{}`", base_url))?;
		Ok(Self::new(url))
	}

	/// Creates a client for the given gateway base URL with default retry
	/// settings.
	pub fn new(base_url: Url) -> Self {
		Self::with_http(
			base_url,
			create_retryable_http_client(&HttpRetryConfig::default(), reqwest::Client::new()),
		)
	}

	/// Creates a client with a caller-supplied HTTP stack.
	pub fn with_http(base_url: Url, http: ClientWithMiddleware) -> Self {
		Self { base_url, http }
	}

	/// Fetches `path` and decodes the JSON body into `T`.
	///
	/// # Arguments
	/// * `path` - Path relative to the gateway base URL
	/// * `entity` - Record kind, used in not-found errors
	/// * `id` - Record identifier, used in not-found errors
	pub async fn get_json<T: DeserializeOwned>(
		&self,
		path: &str,
		entity: &'static str,
		id: &str,
	) -> Result<T, RepositoryError> {
		let url = self
			.base_url
			.join(path)
			.map_err(|e| RepositoryError::Malformed(format!("invalid path `{}`: {}", path, e)))?;

		let response = self
			.http
			.get(url)
			.send()
			.await
			.map_err(|e| RepositoryError::Network(e.to_string()))?;

		if response.status() == StatusCode::NOT_FOUND {
			return Err(RepositoryError::not_found(entity, id));
		}
		let response = response
			.error_for_status()
			.map_err(|e| RepositoryError::Network(e.to_string()))?;

		response
			.json()
			.await
			.map_err(|e| RepositoryError::Malformed(e.to_string()))
	}
}
