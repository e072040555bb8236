// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Search backend configuration section.

use serde::{Deserialize, Serialize};

const DEFAULT_ENDPOINT: &str = "http://localhost:9200";
const DEFAULT_SHARDS: u32 = 3;
const DEFAULT_REPLICAS: u32 = 1;
const DEFAULT_REFRESH_INTERVAL: &str = "30s";
const DEFAULT_RETENTION_DAYS: u32 = 365;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchBackendConfigLayer {
	pub endpoint: Option<String>,
	pub username: Option<String>,
	pub password: Option<String>,
	pub shards: Option<u32>,
	pub replicas: Option<u32>,
	pub refresh_interval: Option<String>,
	pub retention_days: Option<u32>,
	pub timeout_secs: Option<u64>,
}

impl SearchBackendConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint;
		}
		if other.username.is_some() {
			self.username = other.username;
		}
		if other.password.is_some() {
			self.password = other.password;
		}
		if other.shards.is_some() {
			self.shards = other.shards;
		}
		if other.replicas.is_some() {
			self.replicas = other.replicas;
		}
		if other.refresh_interval.is_some() {
			self.refresh_interval = other.refresh_interval;
		}
		if other.retention_days.is_some() {
			self.retention_days = other.retention_days;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
	}

	pub fn finalize(self) -> SearchBackendConfig {
		SearchBackendConfig {
			endpoint: self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
			username: self.username,
			password: self.password,
			shards: self.shards.unwrap_or(DEFAULT_SHARDS),
			replicas: self.replicas.unwrap_or(DEFAULT_REPLICAS),
			refresh_interval: self
				.refresh_interval
				.unwrap_or_else(|| DEFAULT_REFRESH_INTERVAL.to_string()),
			retention_days: self.retention_days.unwrap_or(DEFAULT_RETENTION_DAYS),
			timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchBackendConfig {
	pub endpoint: String,
	pub username: Option<String>,
	pub password: Option<String>,
	pub shards: u32,
	pub replicas: u32,
	pub refresh_interval: String,
	pub retention_days: u32,
	pub timeout_secs: u64,
}

impl Default for SearchBackendConfig {
	fn default() -> Self {
		SearchBackendConfigLayer::default().finalize()
	}
}

impl SearchBackendConfig {
	pub fn has_credentials(&self) -> bool {
		self.username.is_some() && self.password.is_some()
	}
}
