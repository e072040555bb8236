// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit payload and record shapes.
//!
//! [`AuditPayload`] is the inbound event; [`AuditRecord`] is the document
//! persisted to the search index. Records are created once at ingestion
//! and never mutated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::AppSlug;

/// Inbound audit event from a client application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditPayload {
	pub customer_id: String,
	pub app_slug: AppSlug,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub app_instance_id: Option<String>,
	/// User-facing category label; translated to the backend code at ingest.
	pub category: String,
	/// Absent for system-initiated actions.
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub customer_name: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
	/// Event time, epoch seconds or milliseconds.
	pub created_at: i64,
	#[serde(default)]
	pub additional_info: BTreeMap<String, Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub audit_details: Option<AuditDetails>,
}

/// Extended free-text detail, fetched separately from the list view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditDetails {
	#[serde(default)]
	pub header: Option<String>,
	#[serde(default)]
	pub body: Vec<String>,
}

impl AuditDetails {
	pub fn is_empty(&self) -> bool {
		self.header.is_none() && self.body.is_empty()
	}
}

/// The persisted document. Immutable once indexed; removed only by
/// index-rotation/retention outside this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
	pub customer_id: String,
	pub app_slug: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub app_instance_id: Option<String>,
	/// Top-level copy of the acting user, mirrored from `audit_info`.
	#[serde(default)]
	pub username: Option<String>,
	pub audit_info: AuditInfo,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub audit_details: Option<AuditDetails>,
	/// Stamped by the store at index time, epoch milliseconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<i64>,
}

/// Nested audit facts under `audit_info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditInfo {
	/// Backend-internal category code, never the user-facing label.
	pub category: String,
	/// Absent means the action was taken by the system.
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub customer_name: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
	/// Event time, always epoch milliseconds past ingestion.
	pub created_at: i64,
	#[serde(default)]
	pub has_details: bool,
	/// Arbitrary key/value detail (`msp_id`, `device_type`, ...).
	#[serde(default)]
	pub additional_info: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn payload_deserializes_with_defaults() {
		let payload: AuditPayload = serde_json::from_value(json!({
			"customer_id": "C1",
			"app_slug": "console",
			"category": "Login",
			"created_at": 1700000000,
		}))
		.unwrap();

		assert_eq!(payload.app_slug, AppSlug::Console);
		assert!(payload.username.is_none());
		assert!(payload.additional_info.is_empty());
		assert!(payload.audit_details.is_none());
	}

	#[test]
	fn details_emptiness() {
		assert!(AuditDetails::default().is_empty());
		let details = AuditDetails {
			header: None,
			body: vec!["line".into()],
		};
		assert!(!details.is_empty());
	}

	#[test]
	fn record_round_trips_through_json() {
		let record = AuditRecord {
			customer_id: "C1".into(),
			app_slug: "console".into(),
			app_instance_id: Some("inst-1".into()),
			username: Some("alice".into()),
			audit_info: AuditInfo {
				category: "login".into(),
				username: Some("alice".into()),
				customer_name: Some("Acme".into()),
				description: Some("signed in".into()),
				created_at: 1_700_000_000_000,
				has_details: false,
				additional_info: BTreeMap::from([("device_type".into(), json!("ios"))]),
			},
			audit_details: None,
			created_at: None,
		};

		let value = serde_json::to_value(&record).unwrap();
		let back: AuditRecord = serde_json::from_value(value).unwrap();
		assert_eq!(back.audit_info.category, "login");
		assert_eq!(back.audit_info.created_at, 1_700_000_000_000);
	}

	#[test]
	fn absent_username_stays_absent() {
		let value = json!({
			"customer_id": "C1",
			"app_slug": "console",
			"audit_info": {
				"category": "login",
				"created_at": 1_700_000_000_000i64,
			},
		});
		let record: AuditRecord = serde_json::from_value(value).unwrap();
		assert!(record.audit_info.username.is_none());
	}
}
