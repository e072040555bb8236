// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ingestion formatting.
//!
//! Converts an inbound [`AuditPayload`] into the storage-shaped
//! [`AuditRecord`]: enriches customer name and MSP id from the account
//! directory, normalizes the event time to epoch milliseconds, validates
//! device type and category, and stores the category as its backend code.

use serde_json::json;
use tracing::{debug, instrument};

use vellum_server_search::fields::{DEVICE_TYPE_KEY, MSP_ID_KEY};
use vellum_trail_core::app::{
	self, is_valid_device_type, INTERNAL_CUSTOMER_ID, INTERNAL_CUSTOMER_NAME,
};
use vellum_trail_core::error::{Result, TrailError};
use vellum_trail_core::record::{AuditInfo, AuditPayload, AuditRecord};
use vellum_trail_core::time::to_millis;

use crate::clients::AccountDirectory;

/// Build the storage record for one inbound event.
#[instrument(skip(directory, payload), fields(customer_id = %payload.customer_id))]
pub async fn build_audit_record(
	directory: &dyn AccountDirectory,
	payload: AuditPayload,
) -> Result<AuditRecord> {
	let AuditPayload {
		customer_id,
		app_slug,
		app_instance_id,
		category,
		username,
		customer_name,
		description,
		created_at,
		mut additional_info,
		audit_details,
	} = payload;

	// Internal platform actions skip the directory lookup entirely.
	let (directory_name, directory_msp_id) = if customer_id == INTERNAL_CUSTOMER_ID {
		(INTERNAL_CUSTOMER_NAME.to_string(), None)
	} else {
		let details = directory
			.get_customer_details(&customer_id)
			.await?
			.ok_or_else(|| {
				TrailError::NotFound(format!(
					"account details not found for customer {customer_id}"
				))
			})?;
		(details.customer_name, details.msp_id)
	};

	let customer_name = customer_name
		.filter(|name| !name.is_empty())
		.unwrap_or(directory_name);

	let received_msp_id = additional_info
		.get(MSP_ID_KEY)
		.and_then(|value| value.as_str())
		.map(str::to_string)
		.or_else(|| directory_msp_id.clone());
	let msp_id = match &directory_msp_id {
		// A customer that is itself an MSP marks its own records.
		Some(id) if directory.is_msp(id).await? => Some(customer_id.clone()),
		_ => received_msp_id,
	};
	if let Some(msp_id) = msp_id {
		debug!(%customer_id, %msp_id, "marking record with msp id");
		additional_info.insert(MSP_ID_KEY.to_string(), json!(msp_id));
	}

	if let Some(device_type) = additional_info.get(DEVICE_TYPE_KEY) {
		let valid = device_type
			.as_str()
			.is_some_and(is_valid_device_type);
		if !valid {
			return Err(TrailError::InvalidRequest(format!(
				"invalid device type: {device_type}"
			)));
		}
	}

	// The stored category is always the backend code; an unrecognized
	// label never reaches the index.
	let category_code = app::category_code(app_slug, &category)?.to_string();

	// Header-only detail payloads carry nothing worth a separate fetch.
	let audit_details = audit_details.filter(|details| !details.body.is_empty());
	let has_details = audit_details.is_some();

	Ok(AuditRecord {
		customer_id,
		app_slug: app_slug.as_str().to_string(),
		app_instance_id,
		username: username.clone(),
		audit_info: AuditInfo {
			category: category_code,
			username,
			customer_name: Some(customer_name),
			description,
			created_at: to_millis(created_at),
			has_details,
			additional_info,
		},
		audit_details,
		created_at: None,
	})
}
