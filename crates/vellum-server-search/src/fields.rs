// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Field-mapping registry.
//!
//! Declares where each logical search field lives in the stored document
//! (top level, under `audit_info`, or under
//! `audit_info.additional_info`), which storage paths match strictly
//! (multi-term queries default to AND instead of OR), and which request
//! parameters are execution context rather than search predicates.

use serde::{Deserialize, Serialize};

pub const AUDIT_INFO_KEY: &str = "audit_info";
pub const ADDITIONAL_INFO_KEY: &str = "additional_info";
pub const AUDIT_DETAILS_KEY: &str = "audit_details";

pub const CUSTOMER_ID_KEY: &str = "customer_id";
pub const APP_SLUG_KEY: &str = "app_slug";
pub const APP_ID_KEY: &str = "app_id";
pub const APP_INSTANCE_ID_KEY: &str = "app_instance_id";
pub const CATEGORY_KEY: &str = "category";
pub const CUSTOMER_NAME_KEY: &str = "customer_name";
pub const USERNAME_KEY: &str = "username";
pub const DESCRIPTION_KEY: &str = "description";
pub const CREATED_AT_KEY: &str = "created_at";
pub const MSP_ID_KEY: &str = "msp_id";
pub const TENANT_ID_KEY: &str = "tenant_id";
pub const TENANT_NAME_KEY: &str = "tenant_name";
pub const DEVICE_TYPE_KEY: &str = "device_type";

/// Logical name of the universal search parameter.
pub const ALL_FIELDS_KEY: &str = "all_fields_search";
/// Storage-side name the universal search parameter maps onto.
pub const WILDCARD_FIELD: &str = "*";

/// Storage path of the event timestamp the time window filters on.
pub const CREATED_AT_PATH: &str = "audit_info.created_at";
/// Storage path of the MSP marker.
pub const MSP_ID_PATH: &str = "audit_info.additional_info.msp_id";
/// Storage path of the tenant-name alias target.
pub const CUSTOMER_NAME_PATH: &str = "audit_info.customer_name";
/// Storage path the tenant-name parameter itself would map onto.
pub const TENANT_NAME_PATH: &str = "audit_info.additional_info.tenant_name";
/// Storage path of the category code.
pub const CATEGORY_PATH: &str = "audit_info.category";

/// Storage parent of a mapped logical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldParent {
	/// Top level of the document.
	Root,
	/// Nested under `audit_info`.
	AuditInfo,
}

/// Declared mapping for one logical field: parent plus optional name
/// override. Fields not in the registry default to
/// `audit_info.additional_info.<field>`.
pub fn mapping(field: &str) -> Option<(FieldParent, Option<&'static str>)> {
	match field {
		APP_INSTANCE_ID_KEY | CUSTOMER_ID_KEY | APP_SLUG_KEY | APP_ID_KEY => {
			Some((FieldParent::Root, None))
		}
		ALL_FIELDS_KEY => Some((FieldParent::Root, Some(WILDCARD_FIELD))),
		CREATED_AT_KEY | CATEGORY_KEY | CUSTOMER_NAME_KEY | DESCRIPTION_KEY | USERNAME_KEY
		| ADDITIONAL_INFO_KEY => Some((FieldParent::AuditInfo, None)),
		_ => None,
	}
}

/// Resolve a logical field name to its storage path.
pub fn storage_path(field: &str) -> String {
	match mapping(field) {
		Some((FieldParent::Root, None)) => field.to_string(),
		Some((FieldParent::Root, Some(name))) => name.to_string(),
		Some((FieldParent::AuditInfo, name)) => {
			format!("{AUDIT_INFO_KEY}.{}", name.unwrap_or(field))
		}
		None => format!("{AUDIT_INFO_KEY}.{ADDITIONAL_INFO_KEY}.{field}"),
	}
}

/// Storage paths whose multi-term queries default to conjunctive matching.
pub fn is_strict(path: &str) -> bool {
	matches!(
		path,
		APP_INSTANCE_ID_KEY
			| CUSTOMER_ID_KEY
			| APP_SLUG_KEY
			| APP_ID_KEY
			| CUSTOMER_NAME_PATH
			| CATEGORY_PATH
	)
}

/// Default boolean operator for multi-term queries on a storage path.
///
/// `app_slug` is strict-matching but still joins with OR: its multi-value
/// form is the list of authorized apps, any of which may match.
pub fn default_operator(path: &str) -> &'static str {
	if path == APP_SLUG_KEY {
		return "or";
	}
	if is_strict(path) {
		"and"
	} else {
		"or"
	}
}

/// Request parameters consumed as execution context, never as predicates.
pub fn is_excluded(field: &str) -> bool {
	matches!(
		field,
		"offset" | "limit" | "start_time" | "end_time" | CREATED_AT_KEY | "sort"
	)
}

/// Per-field match criteria supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchCriteria {
	#[default]
	Exact,
	Partial,
	Universal,
	Regex,
	Range,
}

/// Query form dispatched for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
	Match,
	QueryString,
	Regexp,
	Range,
}

pub fn query_kind(criteria: MatchCriteria) -> QueryKind {
	match criteria {
		MatchCriteria::Exact => QueryKind::Match,
		MatchCriteria::Partial | MatchCriteria::Universal => QueryKind::QueryString,
		MatchCriteria::Regex => QueryKind::Regexp,
		MatchCriteria::Range => QueryKind::Range,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use vellum_trail_core::record::{AuditInfo, AuditRecord};

	#[test]
	fn root_fields_keep_their_name() {
		assert_eq!(storage_path("customer_id"), "customer_id");
		assert_eq!(storage_path("app_instance_id"), "app_instance_id");
	}

	#[test]
	fn universal_search_maps_to_wildcard() {
		assert_eq!(storage_path(ALL_FIELDS_KEY), "*");
	}

	#[test]
	fn audit_info_fields_are_prefixed() {
		assert_eq!(storage_path("category"), "audit_info.category");
		assert_eq!(storage_path("customer_name"), CUSTOMER_NAME_PATH);
		assert_eq!(storage_path("created_at"), CREATED_AT_PATH);
	}

	#[test]
	fn unmapped_fields_default_to_additional_info() {
		assert_eq!(storage_path("msp_id"), MSP_ID_PATH);
		assert_eq!(storage_path("tenant_name"), TENANT_NAME_PATH);
		assert_eq!(storage_path("device_type"), "audit_info.additional_info.device_type");
	}

	#[test]
	fn strict_fields_join_with_and() {
		assert_eq!(default_operator("customer_id"), "and");
		assert_eq!(default_operator("audit_info.customer_name"), "and");
		assert_eq!(default_operator("audit_info.category"), "and");
	}

	#[test]
	fn app_slug_is_strict_but_joins_with_or() {
		assert!(is_strict(APP_SLUG_KEY));
		assert_eq!(default_operator(APP_SLUG_KEY), "or");
	}

	#[test]
	fn loose_fields_join_with_or() {
		assert_eq!(default_operator("audit_info.description"), "or");
		assert_eq!(default_operator("*"), "or");
	}

	#[test]
	fn execution_context_params_are_excluded() {
		for field in ["offset", "limit", "start_time", "end_time", "created_at", "sort"] {
			assert!(is_excluded(field), "{field} should be excluded");
		}
		assert!(!is_excluded("customer_id"));
	}

	#[test]
	fn match_criteria_dispatch() {
		assert_eq!(query_kind(MatchCriteria::Exact), QueryKind::Match);
		assert_eq!(query_kind(MatchCriteria::Partial), QueryKind::QueryString);
		assert_eq!(query_kind(MatchCriteria::Universal), QueryKind::QueryString);
		assert_eq!(query_kind(MatchCriteria::Regex), QueryKind::Regexp);
		assert_eq!(query_kind(MatchCriteria::Range), QueryKind::Range);
	}

	#[test]
	fn criteria_deserialize_snake_case() {
		let criteria: MatchCriteria = serde_json::from_str("\"partial\"").unwrap();
		assert_eq!(criteria, MatchCriteria::Partial);
	}

	/// The registry and the serde layout of [`AuditRecord`] must agree:
	/// every mapped field serializes to its declared storage path.
	#[test]
	fn registry_matches_record_layout() {
		let record = AuditRecord {
			customer_id: "C1".into(),
			app_slug: "console".into(),
			app_instance_id: Some("inst".into()),
			username: Some("alice".into()),
			audit_info: AuditInfo {
				category: "login".into(),
				username: Some("alice".into()),
				customer_name: Some("Acme".into()),
				description: Some("d".into()),
				created_at: 1_700_000_000_000,
				has_details: false,
				additional_info: [("msp_id".to_string(), json!("M1"))].into(),
			},
			audit_details: None,
			created_at: None,
		};
		let doc = serde_json::to_value(&record).unwrap();

		for field in ["customer_id", "app_slug", "app_instance_id"] {
			assert!(doc.pointer(&format!("/{field}")).is_some(), "{field} at root");
		}
		for field in ["category", "customer_name", "description", "username", "created_at"] {
			let pointer = format!("/{AUDIT_INFO_KEY}/{field}");
			assert!(doc.pointer(&pointer).is_some(), "{field} under audit_info");
		}
		assert!(doc.pointer("/audit_info/additional_info/msp_id").is_some());
	}
}
