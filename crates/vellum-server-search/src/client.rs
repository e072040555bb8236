// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client for the search backend's REST API.
//!
//! Backend-specific failures are mapped to [`TrailError`] here; nothing
//! above this module sees transport or status-code details. A missing
//! index on a read path is [`SearchOutcome::Empty`], on a write path a
//! hard error.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use vellum_trail_core::error::{Result, SearchOutcome, TrailError};

use crate::config::SearchBackendConfig;

pub struct SearchClient {
	http: reqwest::Client,
	endpoint: String,
	username: Option<String>,
	password: Option<String>,
}

impl SearchClient {
	pub fn new(config: &SearchBackendConfig) -> Result<Self> {
		let http = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.timeout_secs))
			.build()
			.map_err(|e| TrailError::Backend(format!("failed to build search client: {e}")))?;

		Ok(SearchClient {
			http,
			endpoint: config.endpoint.trim_end_matches('/').to_string(),
			username: config.username.clone(),
			password: config.password.clone(),
		})
	}

	fn request(&self, method: Method, path: &str) -> RequestBuilder {
		let mut request = self.http.request(method, format!("{}/{path}", self.endpoint));
		if let (Some(username), Some(password)) = (&self.username, &self.password) {
			request = request.basic_auth(username, Some(password));
		}
		request
	}

	#[instrument(skip(self))]
	pub async fn index_exists(&self, index: &str) -> Result<bool> {
		let response = self
			.request(Method::HEAD, index)
			.send()
			.await
			.map_err(|e| TrailError::Backend(format!("index existence check failed: {e}")))?;

		match response.status() {
			StatusCode::OK => Ok(true),
			StatusCode::NOT_FOUND => Ok(false),
			status => Err(TrailError::Backend(format!(
				"index existence check returned {status} for {index}"
			))),
		}
	}

	/// Create an index with the given settings body. Creating an index
	/// that already exists is a silent no-op, so concurrent first
	/// requests race benignly.
	#[instrument(skip(self, body))]
	pub async fn create_index(&self, index: &str, body: &Value) -> Result<()> {
		let response = self
			.request(Method::PUT, index)
			.json(body)
			.send()
			.await
			.map_err(|e| TrailError::Backend(format!("index create failed: {e}")))?;

		let status = response.status();
		if status.is_success() {
			debug!(index, "created search index");
			return Ok(());
		}

		let detail = response.text().await.unwrap_or_default();
		if status == StatusCode::BAD_REQUEST && detail.contains("resource_already_exists_exception")
		{
			debug!(index, "index already exists");
			return Ok(());
		}
		Err(TrailError::Backend(format!(
			"index create returned {status} for {index}: {detail}"
		)))
	}

	/// Index one document; returns the backend-assigned document id.
	#[instrument(skip(self, document))]
	pub async fn index_document(&self, index: &str, document: &Value) -> Result<String> {
		let response = self
			.request(Method::POST, &format!("{index}/_doc"))
			.json(document)
			.send()
			.await
			.map_err(|e| TrailError::Backend(format!("document index failed: {e}")))?;

		let status = response.status();
		if !status.is_success() {
			// A missing index during a write is a hard error, never an
			// empty-result signal.
			let detail = response.text().await.unwrap_or_default();
			return Err(TrailError::Backend(format!(
				"document index returned {status}: {detail}"
			)));
		}

		let indexed: IndexedDocument = response.json().await.map_err(|e| {
			TrailError::Backend(format!("failed to parse index response: {e}"))
		})?;
		debug!(index, audit_id = %indexed.id, "indexed audit document");
		Ok(indexed.id)
	}

	#[instrument(skip(self, body))]
	pub async fn search(&self, index: &str, body: &Value) -> Result<SearchOutcome<SearchResponse>> {
		let response = self
			.request(Method::POST, &format!("{index}/_search"))
			.json(body)
			.send()
			.await
			.map_err(|e| TrailError::Backend(format!("search request failed: {e}")))?;

		let status = response.status();
		if status == StatusCode::NOT_FOUND {
			debug!(index, "index not found on search, treating as empty");
			return Ok(SearchOutcome::Empty);
		}
		if !status.is_success() {
			let detail = response.text().await.unwrap_or_default();
			return Err(TrailError::Backend(format!(
				"search returned {status}: {detail}"
			)));
		}

		let parsed: SearchResponse = response.json().await.map_err(|e| {
			TrailError::Backend(format!("failed to parse search response: {e}"))
		})?;
		Ok(SearchOutcome::Found(parsed))
	}

	#[instrument(skip(self, body))]
	pub async fn count(&self, index: &str, body: &Value) -> Result<SearchOutcome<u64>> {
		let response = self
			.request(Method::POST, &format!("{index}/_count"))
			.json(body)
			.send()
			.await
			.map_err(|e| TrailError::Backend(format!("count request failed: {e}")))?;

		let status = response.status();
		if status == StatusCode::NOT_FOUND {
			debug!(index, "index not found on count, treating as empty");
			return Ok(SearchOutcome::Empty);
		}
		if !status.is_success() {
			let detail = response.text().await.unwrap_or_default();
			return Err(TrailError::Backend(format!(
				"count returned {status}: {detail}"
			)));
		}

		let parsed: CountResponse = response.json().await.map_err(|e| {
			TrailError::Backend(format!("failed to parse count response: {e}"))
		})?;
		Ok(SearchOutcome::Found(parsed.count))
	}

	/// Force visibility of just-indexed documents before a count.
	#[instrument(skip(self))]
	pub async fn refresh(&self, index: &str) -> Result<SearchOutcome<()>> {
		let response = self
			.request(Method::POST, &format!("{index}/_refresh"))
			.send()
			.await
			.map_err(|e| TrailError::Backend(format!("refresh request failed: {e}")))?;

		match response.status() {
			status if status.is_success() => Ok(SearchOutcome::Found(())),
			StatusCode::NOT_FOUND => Ok(SearchOutcome::Empty),
			status => Err(TrailError::Backend(format!(
				"refresh returned {status} for {index}"
			))),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
	pub hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct HitsEnvelope {
	pub total: TotalHits,
	pub hits: Vec<Hit>,
}

/// Total-hit count; older backends report a bare integer, newer ones an
/// object with a `value` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
	Bare(u64),
	Object { value: u64 },
}

impl TotalHits {
	pub fn value(&self) -> u64 {
		match self {
			TotalHits::Bare(count) => *count,
			TotalHits::Object { value } => *value,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Hit {
	#[serde(rename = "_index")]
	pub index: String,
	#[serde(rename = "_id")]
	pub id: String,
	#[serde(rename = "_source")]
	pub source: Value,
}

#[derive(Debug, Deserialize)]
struct IndexedDocument {
	#[serde(rename = "_id")]
	id: String,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
	count: u64,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn total_hits_parses_both_shapes() {
		let bare: TotalHits = serde_json::from_value(json!(42)).unwrap();
		assert_eq!(bare.value(), 42);
		let object: TotalHits = serde_json::from_value(json!({"value": 42, "relation": "eq"})).unwrap();
		assert_eq!(object.value(), 42);
	}

	#[test]
	fn search_response_parses_hits() {
		let response: SearchResponse = serde_json::from_value(json!({
			"took": 3,
			"hits": {
				"total": {"value": 1},
				"hits": [{
					"_index": "audit-trail-2026-08",
					"_id": "abc123",
					"_source": {"customer_id": "C1"},
				}],
			},
		}))
		.unwrap();

		assert_eq!(response.hits.total.value(), 1);
		assert_eq!(response.hits.hits[0].index, "audit-trail-2026-08");
		assert_eq!(response.hits.hits[0].id, "abc123");
		assert_eq!(response.hits.hits[0].source["customer_id"], "C1");
	}

	#[test]
	fn indexed_document_parses_assigned_id() {
		let indexed: IndexedDocument =
			serde_json::from_value(json!({"_index": "audit-trail-2026-08", "_id": "xyz", "result": "created"}))
				.unwrap();
		assert_eq!(indexed.id, "xyz");
	}

	#[test]
	fn client_strips_trailing_endpoint_slash() {
		let config = SearchBackendConfig {
			endpoint: "http://localhost:9200/".to_string(),
			..Default::default()
		};
		let client = SearchClient::new(&config).unwrap();
		assert_eq!(client.endpoint, "http://localhost:9200");
	}
}
