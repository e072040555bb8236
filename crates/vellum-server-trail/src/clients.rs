// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! External-collaborator ports.
//!
//! Account directory and app catalog are HTTP lookup services; the
//! mirror store and the file writers are opaque sinks owned elsewhere.
//! The service layer depends only on the traits here, so tests run
//! against in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use vellum_trail_core::app::AppSlug;
use vellum_trail_core::error::{Result, TrailError};
use vellum_trail_core::record::AuditRecord;

use crate::export::FileExtension;
use crate::response::AuditTrailResponse;

const LOOKUP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
	pub customer_id: String,
	pub customer_name: String,
	#[serde(default)]
	pub msp_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppDetails {
	pub app_id: String,
	pub app_slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppInstance {
	pub app_id: String,
	#[serde(default)]
	pub app_instance_id: Option<String>,
}

/// Account lookup service.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
	/// `None` when the account service does not know the customer.
	async fn get_customer_details(&self, customer_id: &str) -> Result<Option<CustomerDetails>>;

	/// Whether the given id names a managed service provider.
	async fn is_msp(&self, msp_id: &str) -> Result<bool>;

	/// Whether the customer itself is an MSP.
	async fn is_msp_customer(&self, customer_id: &str) -> Result<bool>;
}

/// App-catalog lookup service.
#[async_trait]
pub trait AppCatalog: Send + Sync {
	async fn get_app_details(&self, app: AppSlug) -> Result<Option<AppDetails>>;
	async fn get_app_instances_for_customer(&self, customer_id: &str) -> Result<Vec<AppInstance>>;
}

/// Secondary durable store mirroring every indexed record, keyed by the
/// primary store's assigned document id.
#[async_trait]
pub trait MirrorStore: Send + Sync {
	async fn add_audit_record(&self, audit_id: &str, record: &AuditRecord) -> Result<bool>;
}

/// CSV/PDF renderer. Returns the path of the generated file.
#[async_trait]
pub trait AuditFileWriter: Send + Sync {
	async fn write(
		&self,
		app: AppSlug,
		customer_id: &str,
		generated_at: i64,
		data: &AuditTrailResponse,
		columns: &[String],
		extension: FileExtension,
	) -> Result<String>;
}

pub struct HttpAccountDirectory {
	http: reqwest::Client,
	base_url: String,
}

impl HttpAccountDirectory {
	pub fn new(base_url: impl Into<String>) -> Result<Self> {
		Ok(HttpAccountDirectory {
			http: lookup_client()?,
			base_url: base_url.into().trim_end_matches('/').to_string(),
		})
	}
}

#[async_trait]
impl AccountDirectory for HttpAccountDirectory {
	#[tracing::instrument(skip(self))]
	async fn get_customer_details(&self, customer_id: &str) -> Result<Option<CustomerDetails>> {
		let url = format!("{}/customers/{customer_id}", self.base_url);
		let response = self
			.http
			.get(&url)
			.send()
			.await
			.map_err(|e| TrailError::Backend(format!("customer lookup failed: {e}")))?;

		match response.status() {
			StatusCode::NOT_FOUND => Ok(None),
			status if status.is_success() => {
				let details = response.json().await.map_err(|e| {
					TrailError::Backend(format!("failed to parse customer details: {e}"))
				})?;
				Ok(Some(details))
			}
			status => Err(TrailError::Backend(format!(
				"customer lookup returned {status} for {customer_id}"
			))),
		}
	}

	#[tracing::instrument(skip(self))]
	async fn is_msp(&self, msp_id: &str) -> Result<bool> {
		let url = format!("{}/msps/{msp_id}", self.base_url);
		let response = self
			.http
			.get(&url)
			.send()
			.await
			.map_err(|e| TrailError::Backend(format!("msp lookup failed: {e}")))?;

		match response.status() {
			StatusCode::NOT_FOUND => Ok(false),
			status if status.is_success() => Ok(true),
			status => Err(TrailError::Backend(format!(
				"msp lookup returned {status} for {msp_id}"
			))),
		}
	}

	#[tracing::instrument(skip(self))]
	async fn is_msp_customer(&self, customer_id: &str) -> Result<bool> {
		match self.get_customer_details(customer_id).await? {
			Some(details) => match details.msp_id {
				Some(msp_id) => Ok(msp_id == customer_id),
				None => Ok(false),
			},
			None => Ok(false),
		}
	}
}

pub struct HttpAppCatalog {
	http: reqwest::Client,
	base_url: String,
}

impl HttpAppCatalog {
	pub fn new(base_url: impl Into<String>) -> Result<Self> {
		Ok(HttpAppCatalog {
			http: lookup_client()?,
			base_url: base_url.into().trim_end_matches('/').to_string(),
		})
	}
}

#[derive(Debug, Deserialize)]
struct AppInstancesEnvelope {
	#[serde(default)]
	instances: Vec<AppInstance>,
}

#[async_trait]
impl AppCatalog for HttpAppCatalog {
	#[tracing::instrument(skip(self))]
	async fn get_app_details(&self, app: AppSlug) -> Result<Option<AppDetails>> {
		let url = format!("{}/apps/{app}", self.base_url);
		let response = self
			.http
			.get(&url)
			.send()
			.await
			.map_err(|e| TrailError::Backend(format!("app lookup failed: {e}")))?;

		match response.status() {
			StatusCode::NOT_FOUND => Ok(None),
			status if status.is_success() => {
				let details = response.json().await.map_err(|e| {
					TrailError::Backend(format!("failed to parse app details: {e}"))
				})?;
				Ok(Some(details))
			}
			status => Err(TrailError::Backend(format!(
				"app lookup returned {status} for {app}"
			))),
		}
	}

	#[tracing::instrument(skip(self))]
	async fn get_app_instances_for_customer(&self, customer_id: &str) -> Result<Vec<AppInstance>> {
		let url = format!("{}/customers/{customer_id}/instances", self.base_url);
		let response = self
			.http
			.get(&url)
			.send()
			.await
			.map_err(|e| TrailError::Backend(format!("app instance lookup failed: {e}")))?;

		match response.status() {
			StatusCode::NOT_FOUND => Ok(Vec::new()),
			status if status.is_success() => {
				let envelope: AppInstancesEnvelope = response.json().await.map_err(|e| {
					TrailError::Backend(format!("failed to parse app instances: {e}"))
				})?;
				Ok(envelope.instances)
			}
			status => Err(TrailError::Backend(format!(
				"app instance lookup returned {status} for {customer_id}"
			))),
		}
	}
}

fn lookup_client() -> Result<reqwest::Client> {
	reqwest::Client::builder()
		.timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
		.build()
		.map_err(|e| TrailError::Backend(format!("failed to build lookup client: {e}")))
}
