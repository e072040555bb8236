// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Normalized search request parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fields::{self, MatchCriteria, QueryKind};

pub const DEFAULT_LIMIT: u32 = 50;
pub const DEFAULT_OFFSET: u32 = 0;

/// Trim one matching pair of surrounding double or single quotes.
///
/// Exact-phrase inputs from the UI arrive quoted; the quotes are not part
/// of the value.
pub fn strip_quotes(value: &str) -> &str {
	let trimmed = value.trim();
	if trimmed.len() >= 2
		&& ((trimmed.starts_with('"') && trimmed.ends_with('"'))
			|| (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
	{
		&trimmed[1..trimmed.len() - 1]
	} else {
		trimmed
	}
}

/// A requested value for one logical field: a single term or a list of
/// alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
	Single(String),
	Many(Vec<String>),
}

impl ParamValue {
	pub fn is_empty(&self) -> bool {
		match self {
			ParamValue::Single(s) => s.is_empty(),
			ParamValue::Many(items) => items.is_empty(),
		}
	}

	pub fn as_single(&self) -> Option<&str> {
		match self {
			ParamValue::Single(s) => Some(s),
			ParamValue::Many(_) => None,
		}
	}
}

impl From<&str> for ParamValue {
	fn from(s: &str) -> Self {
		ParamValue::Single(s.to_string())
	}
}

impl From<String> for ParamValue {
	fn from(s: String) -> Self {
		ParamValue::Single(s)
	}
}

impl From<Vec<String>> for ParamValue {
	fn from(items: Vec<String>) -> Self {
		ParamValue::Many(items)
	}
}

/// The value and query form resolved for one storage path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldQuery {
	pub value: ParamValue,
	pub kind: QueryKind,
}

/// One request's search parameters, normalized for query construction.
///
/// Field values and metadata live in `BTreeMap`s so iteration order, and
/// therefore the produced query tree, is deterministic.
#[derive(Debug, Clone)]
pub struct SearchParams {
	/// Logical field name → requested value.
	pub values: BTreeMap<String, ParamValue>,
	/// Logical field name → caller-declared match criteria.
	pub meta: BTreeMap<String, MatchCriteria>,
	pub offset: u32,
	pub limit: u32,
	/// Caller sort override; `-field` sorts descending.
	pub sort: Option<String>,
	/// Requested window bounds, epoch seconds or milliseconds.
	pub start_time: Option<i64>,
	pub end_time: Option<i64>,
}

impl Default for SearchParams {
	fn default() -> Self {
		SearchParams {
			values: BTreeMap::new(),
			meta: BTreeMap::new(),
			offset: DEFAULT_OFFSET,
			limit: DEFAULT_LIMIT,
			sort: None,
			start_time: None,
			end_time: None,
		}
	}
}

impl SearchParams {
	pub fn new(customer_id: impl Into<String>, app_slug: impl Into<String>) -> Self {
		let mut params = SearchParams::default();
		params.insert(fields::CUSTOMER_ID_KEY, customer_id.into());
		params.insert(fields::APP_SLUG_KEY, app_slug.into());
		params
	}

	pub fn insert(&mut self, field: impl Into<String>, value: impl Into<ParamValue>) {
		self.values.insert(field.into(), value.into());
	}

	pub fn remove(&mut self, field: &str) {
		self.values.remove(field);
	}

	pub fn get(&self, field: &str) -> Option<&ParamValue> {
		self.values.get(field)
	}

	/// Single-string value of a field, if present and not a list.
	pub fn get_single(&self, field: &str) -> Option<&str> {
		self.values.get(field).and_then(ParamValue::as_single)
	}

	pub fn set_criteria(&mut self, field: impl Into<String>, criteria: MatchCriteria) {
		self.meta.insert(field.into(), criteria);
	}

	/// Map the logical parameters onto storage paths with their resolved
	/// query forms, dropping execution-context parameters.
	pub fn search_fields(&self) -> BTreeMap<String, FieldQuery> {
		let mut mapped = BTreeMap::new();
		for (field, value) in &self.values {
			if fields::is_excluded(field) {
				continue;
			}
			let criteria = self.meta.get(field).copied().unwrap_or_default();
			mapped.insert(
				fields::storage_path(field),
				FieldQuery {
					value: value.clone(),
					kind: fields::query_kind(criteria),
				},
			);
		}
		mapped
	}
}
