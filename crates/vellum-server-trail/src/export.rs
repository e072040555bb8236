// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! File-export orchestration.
//!
//! Thin composition over the list query: validates the requested
//! columns, fetches one export-sized page with details, and hands the
//! normalized data to the CSV/PDF writer port.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use vellum_server_search::fields::CUSTOMER_ID_KEY;
use vellum_server_search::params::SearchParams;
use vellum_server_search::store::MAX_DOC_LIMIT;
use vellum_trail_core::app::AppSlug;
use vellum_trail_core::error::{Result, TrailError};
use vellum_trail_core::time::epoch_millis_now;

use crate::service::TrailService;

/// Widest PDF the renderer lays out legibly.
pub const PDF_MAX_COLUMN_COUNT: usize = 8;

const AUDIT_ID_COLUMN: &str = "audit_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileExtension {
	Csv,
	Pdf,
}

impl FileExtension {
	pub fn as_str(&self) -> &'static str {
		match self {
			FileExtension::Csv => "csv",
			FileExtension::Pdf => "pdf",
		}
	}
}

impl fmt::Display for FileExtension {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl TrailService {
	/// Generate a CSV or PDF export of the matching audit entries.
	/// Returns the generated file's path, or `None` when there is no
	/// data to export.
	#[instrument(skip(self, params, columns))]
	pub async fn generate_audit_file(
		&self,
		mut params: SearchParams,
		extension: FileExtension,
		app: AppSlug,
		columns: Vec<String>,
	) -> Result<Option<String>> {
		if columns.iter().any(|column| column == AUDIT_ID_COLUMN) {
			return Err(TrailError::InvalidRequest(format!(
				"unsupported column: {AUDIT_ID_COLUMN}"
			)));
		}

		let columns = dedup_columns(columns);
		if extension == FileExtension::Pdf && columns.len() > PDF_MAX_COLUMN_COUNT {
			return Err(TrailError::InvalidRequest(format!(
				"a PDF export is limited to {PDF_MAX_COLUMN_COUNT} columns"
			)));
		}

		let customer_id = params
			.get_single(CUSTOMER_ID_KEY)
			.unwrap_or_default()
			.to_string();

		params.offset = 0;
		params.limit = MAX_DOC_LIMIT as u32;
		let Some(data) = self.get_audit_trail(params, true).await? else {
			return Ok(None);
		};

		let generated_at = epoch_millis_now() / 1000;
		let path = self
			.writer
			.write(app, &customer_id, generated_at, &data, &columns, extension)
			.await?;
		Ok(Some(path))
	}
}

/// Drop duplicate columns, first occurrence wins.
fn dedup_columns(columns: Vec<String>) -> Vec<String> {
	let mut deduped: Vec<String> = Vec::with_capacity(columns.len());
	for column in columns {
		if !deduped.contains(&column) {
			deduped.push(column);
		}
	}
	deduped
}
