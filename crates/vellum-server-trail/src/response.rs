// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Result normalization.
//!
//! Converts raw search hits into the stable external entry shape:
//! `audit_info` is flattened to the top level, the stored category code
//! becomes its user-facing label, a missing username renders as
//! `"System"`, and the reported total is capped at the document ceiling.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use vellum_server_search::store::{RecordHit, MAX_DOC_LIMIT};
use vellum_trail_core::app::{self, AppSlug};
use vellum_trail_core::error::{Result, TrailError};

/// Substitute rendered for system-initiated actions.
pub const SYSTEM_USERNAME: &str = "System";

/// One normalized audit entry as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
	pub index: String,
	pub audit_id: String,
	pub app_slug: String,
	pub customer_id: String,
	/// User-facing category label.
	pub category: String,
	pub username: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub customer_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Event time, epoch milliseconds.
	pub created_at: i64,
	pub has_details: bool,
	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub additional_info: BTreeMap<String, Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub header: Option<String>,
	/// Detail body joined into one period-separated string.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditTrailResponse {
	pub audits: Vec<AuditEntry>,
	pub total_count: u64,
	pub remaining_records: bool,
}

/// Normalize one page of hits into the response shape.
pub fn build_audit_response(
	app: AppSlug,
	hits: Vec<RecordHit>,
	total: u64,
	offset: u32,
	limit: u32,
	include_details: bool,
) -> Result<AuditTrailResponse> {
	let mut audits = Vec::with_capacity(hits.len());
	for hit in hits {
		let record = hit.record;
		let info = record.audit_info;

		// Stored codes always have a label for well-formed data; a miss
		// means the document predates or escaped the app's registry.
		let category = app::category_label(app, &info.category)
			.ok_or_else(|| {
				TrailError::InvalidRequest(format!("invalid category: {}", info.category))
			})?
			.to_string();

		let (header, body) = match record.audit_details.filter(|_| include_details) {
			Some(details) => (
				Some(details.header.unwrap_or_default()),
				Some(details.body.join(". ")),
			),
			None => (None, None),
		};

		audits.push(AuditEntry {
			index: hit.index,
			audit_id: hit.audit_id,
			app_slug: record.app_slug,
			customer_id: record.customer_id,
			category,
			username: info.username.unwrap_or_else(|| SYSTEM_USERNAME.to_string()),
			customer_name: info.customer_name,
			description: info.description,
			created_at: info.created_at,
			has_details: info.has_details,
			additional_info: info.additional_info,
			header,
			body,
		});
	}

	let mut total_count = total;
	let mut remaining_records = (offset as u64).saturating_add(limit as u64) < total;
	if total > MAX_DOC_LIMIT {
		total_count = MAX_DOC_LIMIT;
		remaining_records = true;
	}

	Ok(AuditTrailResponse {
		audits,
		total_count,
		remaining_records,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use vellum_trail_core::record::{AuditDetails, AuditInfo, AuditRecord};

	fn hit(username: Option<&str>, details: Option<AuditDetails>) -> RecordHit {
		RecordHit {
			index: "audit-trail-2026-08".to_string(),
			audit_id: "doc-1".to_string(),
			record: AuditRecord {
				customer_id: "C1".to_string(),
				app_slug: "console".to_string(),
				app_instance_id: None,
				username: username.map(str::to_string),
				audit_info: AuditInfo {
					category: "login".to_string(),
					username: username.map(str::to_string),
					customer_name: Some("Acme".to_string()),
					description: Some("signed in".to_string()),
					created_at: 1_700_000_000_000,
					has_details: details.is_some(),
					additional_info: BTreeMap::new(),
				},
				audit_details: details,
				created_at: Some(1_700_000_000_500),
			},
		}
	}

	#[test]
	fn flattens_audit_info_and_translates_the_category() {
		let response =
			build_audit_response(AppSlug::Console, vec![hit(Some("alice"), None)], 1, 0, 50, false)
				.unwrap();

		let entry = &response.audits[0];
		assert_eq!(entry.category, "Login");
		assert_eq!(entry.username, "alice");
		assert_eq!(entry.customer_name.as_deref(), Some("Acme"));
		assert_eq!(entry.created_at, 1_700_000_000_000);
		assert_eq!(entry.index, "audit-trail-2026-08");
		assert_eq!(entry.audit_id, "doc-1");
	}

	#[test]
	fn missing_username_renders_as_system() {
		let response =
			build_audit_response(AppSlug::Console, vec![hit(None, None)], 1, 0, 50, false).unwrap();
		assert_eq!(response.audits[0].username, SYSTEM_USERNAME);
	}

	#[test]
	fn unknown_stored_code_is_invalid_category() {
		let mut bad = hit(Some("alice"), None);
		bad.record.audit_info.category = "warp_drive".to_string();
		let err = build_audit_response(AppSlug::Console, vec![bad], 1, 0, 50, false).unwrap_err();
		assert_eq!(err.status_code(), 400);
		assert!(err.to_string().contains("invalid category"));
	}

	#[test]
	fn details_merge_joins_body_with_periods() {
		let details = AuditDetails {
			header: Some("Change".to_string()),
			body: vec!["step one".to_string(), "step two".to_string()],
		};
		let response =
			build_audit_response(AppSlug::Console, vec![hit(None, Some(details))], 1, 0, 50, true)
				.unwrap();

		let entry = &response.audits[0];
		assert_eq!(entry.header.as_deref(), Some("Change"));
		assert_eq!(entry.body.as_deref(), Some("step one. step two"));
	}

	#[test]
	fn details_are_omitted_from_the_list_view() {
		let details = AuditDetails {
			header: Some("Change".to_string()),
			body: vec!["step".to_string()],
		};
		let response =
			build_audit_response(AppSlug::Console, vec![hit(None, Some(details))], 1, 0, 50, false)
				.unwrap();

		assert!(response.audits[0].header.is_none());
		assert!(response.audits[0].body.is_none());
	}

	#[test]
	fn count_past_the_ceiling_is_capped_with_remaining_forced() {
		let response = build_audit_response(AppSlug::Console, vec![], 5000, 0, 50, false).unwrap();
		assert_eq!(response.total_count, MAX_DOC_LIMIT);
		assert!(response.remaining_records);
	}

	#[test]
	fn small_result_fits_in_one_page() {
		let response = build_audit_response(AppSlug::Console, vec![], 10, 0, 50, false).unwrap();
		assert_eq!(response.total_count, 10);
		assert!(!response.remaining_records);
	}

	#[test]
	fn remaining_is_set_when_pages_are_left() {
		let response = build_audit_response(AppSlug::Console, vec![], 120, 50, 50, false).unwrap();
		assert_eq!(response.total_count, 120);
		assert!(response.remaining_records);
	}

	#[test]
	fn entry_serializes_without_empty_optionals() {
		let response =
			build_audit_response(AppSlug::Console, vec![hit(None, None)], 1, 0, 50, false).unwrap();
		let value = serde_json::to_value(&response.audits[0]).unwrap();

		assert_eq!(value["username"], json!("System"));
		assert!(value.get("header").is_none());
		assert!(value.get("body").is_none());
		assert!(value.get("additional_info").is_none());
	}
}
