// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Search-backend query JSON constructors.
//!
//! Thin builders over `serde_json::json!` for the handful of query forms
//! the audit trail emits. `serde_json` maps order their keys, so two
//! structurally equal trees serialize identically.

use serde_json::{json, Value};

pub fn match_query(field: &str, value: impl Into<Value>) -> Value {
	json!({ "match": { field: value.into() } })
}

pub fn query_string(default_field: &str, query: &str) -> Value {
	json!({ "query_string": { "default_field": default_field, "query": query } })
}

pub fn simple_query_string(field: &str, query: &str, default_operator: &str) -> Value {
	json!({
		"simple_query_string": {
			"query": query,
			"fields": [field],
			"default_operator": default_operator,
		}
	})
}

pub fn regexp(field: &str, pattern: &str) -> Value {
	json!({ "regexp": { field: pattern } })
}

/// Open-ended lower bound.
pub fn range_gte(field: &str, value: impl Into<Value>) -> Value {
	json!({ "range": { field: { "gte": value.into() } } })
}

pub fn range_between(field: &str, gte: i64, lte: i64) -> Value {
	json!({ "range": { field: { "gte": gte, "lte": lte } } })
}

pub fn bool_query(should: Vec<Value>, must: Vec<Value>, minimum_should_match: Option<u32>) -> Value {
	let mut body = serde_json::Map::new();
	if !should.is_empty() {
		body.insert("should".into(), Value::Array(should));
	}
	if !must.is_empty() {
		body.insert("must".into(), Value::Array(must));
	}
	if let Some(minimum) = minimum_should_match {
		body.insert("minimum_should_match".into(), json!(minimum));
	}
	json!({ "bool": body })
}

/// Fold predicates into a single conjunction. One predicate stays bare;
/// several become a `bool.must` group.
pub fn conjoin(mut predicates: Vec<Value>) -> Option<Value> {
	match predicates.len() {
		0 => None,
		1 => Some(predicates.remove(0)),
		_ => Some(json!({ "bool": { "must": predicates } })),
	}
}
