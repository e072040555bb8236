// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit-trail data access.
//!
//! [`TrailStore`] is the seam the service layer depends on;
//! [`SearchTrailStore`] drives the search backend. Writes go to today's
//! rolling index, reads to the stable alias.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use vellum_trail_core::error::{Result, SearchOutcome};
use vellum_trail_core::record::{AuditDetails, AuditRecord};
use vellum_trail_core::scope::{RequestScope, TimeWindow};
use vellum_trail_core::time::epoch_millis_now;

use crate::client::SearchClient;
use crate::config::SearchBackendConfig;
use crate::fields::{AUDIT_DETAILS_KEY, CREATED_AT_KEY};
use crate::index::{IndexResolver, AUDIT_TRAIL_ALIAS};
use crate::params::SearchParams;
use crate::query::build_search_query;

/// Ceiling on the reported total count, and the page size file export
/// fetches at.
pub const MAX_DOC_LIMIT: u64 = 2000;

const DEFAULT_SORT: &str = "-created_at";

/// One matched document with its backing index and id.
#[derive(Debug, Clone)]
pub struct RecordHit {
	pub index: String,
	pub audit_id: String,
	pub record: AuditRecord,
}

#[async_trait]
pub trait TrailStore: Send + Sync {
	/// Index one record; returns the backend-assigned document id.
	async fn add_audit_record(&self, record: &AuditRecord) -> Result<String>;

	/// Paginated, sorted search. `Empty` means the index family does not
	/// exist yet, which first-time queries treat as "no data".
	async fn get_audit_records(
		&self,
		params: &SearchParams,
		scope: &RequestScope,
		window: &TimeWindow,
	) -> Result<SearchOutcome<(Vec<RecordHit>, u64)>>;

	/// Point lookup of one document's detail payload. `None` when the
	/// document has neither header nor body.
	async fn get_audit_details(&self, index: &str, audit_id: &str) -> Result<Option<AuditDetails>>;

	/// Refresh-then-count so just-indexed documents are visible.
	async fn get_audit_count(
		&self,
		params: &SearchParams,
		scope: &RequestScope,
		window: &TimeWindow,
	) -> Result<SearchOutcome<u64>>;
}

pub struct SearchTrailStore {
	client: SearchClient,
	resolver: IndexResolver,
}

impl SearchTrailStore {
	pub fn new(client: SearchClient, resolver: IndexResolver) -> Self {
		SearchTrailStore { client, resolver }
	}

	pub fn from_config(config: &SearchBackendConfig) -> Result<Self> {
		Ok(SearchTrailStore::new(
			SearchClient::new(config)?,
			IndexResolver::new(config),
		))
	}

	fn search_body(params: &SearchParams, scope: &RequestScope, window: &TimeWindow) -> Value {
		json!({
			"query": build_search_query(params, scope, window),
			"from": params.offset,
			"size": params.limit,
			"sort": sort_clause(params.sort.as_deref()),
		})
	}
}

#[async_trait]
impl TrailStore for SearchTrailStore {
	#[instrument(skip(self, record), fields(customer_id = %record.customer_id))]
	async fn add_audit_record(&self, record: &AuditRecord) -> Result<String> {
		let index = self.resolver.current_index(&self.client).await?;

		let mut document = serde_json::to_value(record)?;
		// Index time, distinct from the event time under audit_info.
		document[CREATED_AT_KEY] = json!(epoch_millis_now());

		let audit_id = self.client.index_document(&index, &document).await?;
		debug!(%index, %audit_id, "stored audit record");
		Ok(audit_id)
	}

	#[instrument(skip(self, params, scope, window))]
	async fn get_audit_records(
		&self,
		params: &SearchParams,
		scope: &RequestScope,
		window: &TimeWindow,
	) -> Result<SearchOutcome<(Vec<RecordHit>, u64)>> {
		let body = Self::search_body(params, scope, window);

		match self.client.search(AUDIT_TRAIL_ALIAS, &body).await? {
			SearchOutcome::Empty => Ok(SearchOutcome::Empty),
			SearchOutcome::Found(response) => {
				let total = response.hits.total.value();
				let hits = response
					.hits
					.hits
					.into_iter()
					.map(|hit| {
						let record: AuditRecord = serde_json::from_value(hit.source)?;
						Ok(RecordHit {
							index: hit.index,
							audit_id: hit.id,
							record,
						})
					})
					.collect::<Result<Vec<_>>>()?;
				debug!(total, returned = hits.len(), "fetched audit records");
				Ok(SearchOutcome::Found((hits, total)))
			}
		}
	}

	#[instrument(skip(self))]
	async fn get_audit_details(&self, index: &str, audit_id: &str) -> Result<Option<AuditDetails>> {
		let body = json!({
			"query": {"bool": {"must": [{"match": {"_id": audit_id}}]}},
			"_source": [AUDIT_DETAILS_KEY],
		});

		let response = match self.client.search(index, &body).await? {
			SearchOutcome::Empty => return Ok(None),
			SearchOutcome::Found(response) => response,
		};

		let Some(hit) = response.hits.hits.into_iter().next() else {
			return Ok(None);
		};
		let Some(raw) = hit.source.get(AUDIT_DETAILS_KEY).filter(|v| !v.is_null()) else {
			return Ok(None);
		};
		let details: AuditDetails = serde_json::from_value(raw.clone())?;
		if details.is_empty() {
			return Ok(None);
		}
		Ok(Some(details))
	}

	#[instrument(skip(self, params, scope, window))]
	async fn get_audit_count(
		&self,
		params: &SearchParams,
		scope: &RequestScope,
		window: &TimeWindow,
	) -> Result<SearchOutcome<u64>> {
		if self.client.refresh(AUDIT_TRAIL_ALIAS).await?.is_empty() {
			return Ok(SearchOutcome::Empty);
		}

		let body = json!({ "query": build_search_query(params, scope, window) });
		self.client.count(AUDIT_TRAIL_ALIAS, &body).await
	}
}

/// Sort expression for the search body. A leading `+` is stripped, `-`
/// sorts descending, and the default is most-recent-first.
fn sort_clause(sort: Option<&str>) -> Value {
	let sort = sort
		.map(|s| s.trim_start_matches('+'))
		.filter(|s| !s.is_empty())
		.unwrap_or(DEFAULT_SORT);
	let (field, order) = match sort.strip_prefix('-') {
		Some(field) => (field, "desc"),
		None => (sort, "asc"),
	};
	json!([{ field: { "order": order } }])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_sort_is_most_recent_first() {
		assert_eq!(
			sort_clause(None),
			json!([{"created_at": {"order": "desc"}}])
		);
		assert_eq!(sort_clause(Some("")), sort_clause(None));
	}

	#[test]
	fn leading_plus_is_stripped() {
		assert_eq!(
			sort_clause(Some("+username")),
			json!([{"username": {"order": "asc"}}])
		);
	}

	#[test]
	fn minus_prefix_sorts_descending() {
		assert_eq!(
			sort_clause(Some("-audit_info.created_at")),
			json!([{"audit_info.created_at": {"order": "desc"}}])
		);
	}

	#[test]
	fn search_body_carries_pagination_and_sort() {
		let mut params = SearchParams::new("C1", "console");
		params.offset = 20;
		params.limit = 10;
		params.sort = Some("+username".to_string());

		let window = TimeWindow { start: 0, end: 1 };
		let body = SearchTrailStore::search_body(&params, &RequestScope::default(), &window);

		assert_eq!(body["from"], 20);
		assert_eq!(body["size"], 10);
		assert_eq!(body["sort"], json!([{"username": {"order": "asc"}}]));
		assert!(body["query"]["bool"].is_object());
	}
}
