// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error taxonomy for the audit-trail service.
//!
//! Backend-specific failures (transport, serialization, missing indices)
//! are mapped into [`TrailError`] at the data-access boundary; callers
//! above that boundary never see backend error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrailError>;

#[derive(Debug, Error)]
pub enum TrailError {
	/// Invalid caller input: unknown category, bad device type,
	/// unsupported export column.
	#[error("invalid request: {0}")]
	InvalidRequest(String),

	/// The caller is not authorized to view audit logs.
	#[error("forbidden: {0}")]
	Forbidden(String),

	/// Unknown app/customer authorization or missing record.
	#[error("not found: {0}")]
	NotFound(String),

	/// Search backend or external service failure.
	#[error("backend error: {0}")]
	Backend(String),

	/// Payload or response (de)serialization failure.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl TrailError {
	/// HTTP status the transport layer maps this error to.
	pub fn status_code(&self) -> u16 {
		match self {
			TrailError::InvalidRequest(_) => 400,
			TrailError::Forbidden(_) => 403,
			TrailError::NotFound(_) => 404,
			TrailError::Backend(_) | TrailError::Serialization(_) => 500,
		}
	}
}

/// Outcome of a read against the search backend.
///
/// A missing index or alias is an expected condition for first-time and
/// no-data queries, so it is carried as [`SearchOutcome::Empty`] rather
/// than an error. Callers never inspect error types to tell "no data"
/// from a genuine failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome<T> {
	Found(T),
	Empty,
}

impl<T> SearchOutcome<T> {
	pub fn into_option(self) -> Option<T> {
		match self {
			SearchOutcome::Found(value) => Some(value),
			SearchOutcome::Empty => None,
		}
	}

	pub fn is_empty(&self) -> bool {
		matches!(self, SearchOutcome::Empty)
	}
}
