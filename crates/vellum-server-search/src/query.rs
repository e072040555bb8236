// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Boolean query construction.
//!
//! Builds the single query tree for one request from the normalized
//! search parameters and the resolved execution context. The primary
//! (identity) clauses come first and are a disjunction; everything else
//! is ANDed into one conjunction together with the time window:
//!
//! ```text
//! bool
//! ├── should: identity clauses (customer / MSP / admin wildcard / internal)
//! ├── must:   generic field predicates AND time window
//! └── minimum_should_match: 1
//! ```
//!
//! Construction is pure and deterministic: fields iterate in storage-path
//! order, and the set of paths consumed by the primary step is returned
//! explicitly rather than threaded through shared state.

use std::collections::BTreeSet;

use serde_json::Value;

use vellum_trail_core::app::INTERNAL_CUSTOMER_ID;
use vellum_trail_core::scope::{RequestScope, TimeWindow};

use crate::dsl;
use crate::fields::{
	self, QueryKind, CREATED_AT_PATH, CUSTOMER_ID_KEY, CUSTOMER_NAME_KEY, CUSTOMER_NAME_PATH,
	MSP_ID_KEY, MSP_ID_PATH, TENANT_NAME_KEY, TENANT_NAME_PATH, WILDCARD_FIELD,
};
use crate::params::{strip_quotes, FieldQuery, ParamValue, SearchParams};

/// Characters beyond alphanumerics and whitespace that the backend
/// treats as query operators. Their presence forces the
/// `simple_query_string` form.
const CUSTOM_SPECIAL_CHARS: &[char] = &[
	'+', '-', '=', '&', '|', '>', '<', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*',
	'?', ':', '\\', '/',
];

/// Build the search query for one request.
pub fn build_search_query(params: &SearchParams, scope: &RequestScope, window: &TimeWindow) -> Value {
	let (primary, processed) = primary_query(params, scope);

	let mut predicates = field_predicates(params, &processed);
	predicates.push(dsl::range_between(CREATED_AT_PATH, window.start, window.end));
	let conjunction: Vec<Value> = dsl::conjoin(predicates).into_iter().collect();

	if primary.is_empty() {
		dsl::bool_query(vec![], conjunction, None)
	} else {
		dsl::bool_query(primary, conjunction, Some(1))
	}
}

/// The identity clauses that cannot be built generically, plus the set of
/// storage paths they consumed.
fn primary_query(params: &SearchParams, scope: &RequestScope) -> (Vec<Value>, BTreeSet<String>) {
	let mut processed = BTreeSet::new();

	if scope.admin_level {
		// Admin visibility spans every tenant: any document with a
		// customer_id matches.
		processed.insert(CUSTOMER_ID_KEY.to_string());
		return (
			vec![dsl::query_string(CUSTOMER_ID_KEY, WILDCARD_FIELD)],
			processed,
		);
	}

	let mut clauses = Vec::new();
	let msp_id = params.get_single(MSP_ID_KEY);

	if let Some(msp_id) = msp_id {
		// The MSP sees itself plus child tenants that reference it.
		clauses.push(dsl::match_query(MSP_ID_PATH, msp_id));
		if let Some(customer_id) = params.get_single(CUSTOMER_ID_KEY) {
			clauses.push(dsl::match_query(CUSTOMER_ID_KEY, customer_id));
		}
		processed.insert(CUSTOMER_ID_KEY.to_string());
		processed.insert(MSP_ID_PATH.to_string());
	}

	if clauses.is_empty() {
		if let Some(customer_id) = params.get_single(CUSTOMER_ID_KEY) {
			clauses.push(dsl::match_query(CUSTOMER_ID_KEY, customer_id));
			processed.insert(CUSTOMER_ID_KEY.to_string());
		}
	}

	if scope.internal_logs {
		clauses.push(dsl::match_query(CUSTOMER_ID_KEY, INTERNAL_CUSTOMER_ID));
	}

	if let Some(tenant_name) = params.get_single(TENANT_NAME_KEY) {
		// Tenant-name lookup is an alias for the stored customer name,
		// matched fuzzily. It replaces the identity clauses built above.
		let name_query = wildcard_query(CUSTOMER_NAME_PATH, tenant_name);
		clauses = if let Some(msp_id) = msp_id {
			vec![dsl::bool_query(
				vec![],
				vec![name_query, dsl::match_query(MSP_ID_PATH, msp_id)],
				None,
			)]
		} else {
			vec![name_query]
		};

		if let Some(customer_name) = params.get_single(CUSTOMER_NAME_KEY) {
			clauses.push(wildcard_query(CUSTOMER_NAME_PATH, customer_name));
		}

		processed.insert(CUSTOMER_ID_KEY.to_string());
		processed.insert(CUSTOMER_NAME_PATH.to_string());
		processed.insert(TENANT_NAME_PATH.to_string());
		processed.insert(MSP_ID_PATH.to_string());
	}

	(clauses, processed)
}

/// One predicate per remaining search field, in storage-path order.
fn field_predicates(params: &SearchParams, processed: &BTreeSet<String>) -> Vec<Value> {
	let mut predicates = Vec::new();
	for (path, field) in params.search_fields() {
		if processed.contains(&path) || field.value.is_empty() {
			continue;
		}
		let has_special = has_custom_special_char(&field.value);
		let predicate = if simple_query_string_eligible(&path, &field.value, has_special) {
			simple_query(&path, &field.value)
		} else {
			query_for_kind(&path, &field)
		};
		predicates.push(predicate);
	}
	predicates
}

/// Multi-term, whitespace-bearing, or operator-bearing values go through
/// `simple_query_string` — except on the universal wildcard field, whose
/// free text is handled by `query_string` below.
fn simple_query_string_eligible(path: &str, value: &ParamValue, has_special: bool) -> bool {
	if path == WILDCARD_FIELD {
		return false;
	}
	match value {
		ParamValue::Many(_) => true,
		ParamValue::Single(s) => s.contains(' ') || has_special,
	}
}

fn has_custom_special_char(value: &ParamValue) -> bool {
	let check = |s: &str| s.contains(CUSTOM_SPECIAL_CHARS);
	match value {
		ParamValue::Single(s) => check(s),
		ParamValue::Many(items) => items.iter().any(|s| check(s)),
	}
}

fn simple_query(path: &str, value: &ParamValue) -> Value {
	let operator = fields::default_operator(path);
	let joiner = format!(" {} ", operator.to_uppercase());
	let query = match value {
		ParamValue::Single(s) => strip_quotes(s)
			.split(' ')
			.collect::<Vec<_>>()
			.join(&joiner),
		// Lists de-duplicate, first occurrence wins, order preserved.
		ParamValue::Many(items) => dedup_preserving_order(items).join(&joiner),
	};
	dsl::simple_query_string(path, &query, operator)
}

fn query_for_kind(path: &str, field: &FieldQuery) -> Value {
	match field.kind {
		QueryKind::QueryString => match &field.value {
			ParamValue::Single(s) => wildcard_query(path, s),
			ParamValue::Many(items) => {
				let joiner = format!(" {} ", fields::default_operator(path).to_uppercase());
				let query = items
					.iter()
					.map(|entry| format!("*{}*", strip_quotes(entry).to_lowercase()))
					.collect::<Vec<_>>()
					.join(&joiner);
				dsl::query_string(path, &query)
			}
		},
		QueryKind::Regexp => {
			let pattern = match &field.value {
				ParamValue::Single(s) => format!(".*{}.*", strip_quotes(s).to_lowercase()),
				ParamValue::Many(items) => {
					format!(".*{}.*", items.join("|").to_lowercase())
				}
			};
			dsl::regexp(path, &pattern)
		}
		QueryKind::Range => match &field.value {
			ParamValue::Single(s) => dsl::range_gte(path, strip_quotes(s)),
			ParamValue::Many(items) => dsl::range_gte(path, items.first().cloned().unwrap_or_default()),
		},
		QueryKind::Match => match &field.value {
			ParamValue::Single(s) => dsl::match_query(path, strip_quotes(s)),
			ParamValue::Many(items) => dsl::match_query(path, items.clone()),
		},
	}
}

/// The fuzzy `query_string` form: lower-cased, wrapped in wildcards.
fn wildcard_query(path: &str, value: &str) -> Value {
	dsl::query_string(path, &format!("*{}*", strip_quotes(value).to_lowercase()))
}

fn dedup_preserving_order(items: &[String]) -> Vec<&str> {
	let mut seen = BTreeSet::new();
	items
		.iter()
		.map(|s| strip_quotes(s))
		.filter(|s| seen.insert(*s))
		.collect()
}
