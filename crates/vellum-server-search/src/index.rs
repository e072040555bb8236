// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rolling index-name resolution.
//!
//! Writes target "today's" index; reads go through the stable alias,
//! which spans every historical index. The resolver caches the last
//! index it confirmed to exist. Concurrent requests racing on an unset
//! cache may each run the existence check, and index creation is
//! idempotent, so the race is benign. The lock is never held across an
//! I/O call.

use chrono::{Datelike, NaiveDate, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use vellum_trail_core::error::Result;

use crate::client::SearchClient;
use crate::config::SearchBackendConfig;

/// Stable alias covering all audit-trail indices.
pub const AUDIT_TRAIL_ALIAS: &str = "audit-trail";

/// Prefix of every rolling index name.
pub const AUDIT_TRAIL_INDEX_PREFIX: &str = "audit-trail-";

const THIRTY_DAYS: u32 = 30;

pub struct IndexResolver {
	shards: u32,
	replicas: u32,
	refresh_interval: String,
	retention_days: u32,
	current: RwLock<Option<String>>,
}

impl IndexResolver {
	pub fn new(config: &SearchBackendConfig) -> Self {
		IndexResolver {
			shards: config.shards,
			replicas: config.replicas,
			refresh_interval: config.refresh_interval.clone(),
			retention_days: config.retention_days,
			current: RwLock::new(None),
		}
	}

	/// Index name for the given date: a daily index when retention is
	/// thirty days, monthly otherwise.
	pub fn index_name(&self, date: NaiveDate) -> String {
		if self.retention_days == THIRTY_DAYS {
			format!(
				"{AUDIT_TRAIL_INDEX_PREFIX}{}-{:02}-{:02}",
				date.year(),
				date.month(),
				date.day()
			)
		} else {
			format!(
				"{AUDIT_TRAIL_INDEX_PREFIX}{}-{:02}",
				date.year(),
				date.month()
			)
		}
	}

	/// Resolve today's index, creating it on first use.
	pub async fn current_index(&self, client: &SearchClient) -> Result<String> {
		let name = self.index_name(Utc::now().date_naive());
		if self.is_cached(&name).await {
			return Ok(name);
		}

		if !client.index_exists(&name).await? {
			client.create_index(&name, &self.settings_body()).await?;
		}
		self.remember(name.clone()).await;
		Ok(name)
	}

	fn settings_body(&self) -> Value {
		json!({
			"settings": {
				"number_of_shards": self.shards,
				"number_of_replicas": self.replicas,
				"refresh_interval": self.refresh_interval,
			},
			"aliases": {
				AUDIT_TRAIL_ALIAS: {},
			},
		})
	}

	async fn is_cached(&self, name: &str) -> bool {
		self.current.read().await.as_deref() == Some(name)
	}

	async fn remember(&self, name: String) {
		*self.current.write().await = Some(name);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn resolver(retention_days: u32) -> IndexResolver {
		IndexResolver::new(&SearchBackendConfig {
			retention_days,
			..Default::default()
		})
	}

	fn date(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).unwrap()
	}

	#[test]
	fn monthly_index_name_by_default() {
		assert_eq!(
			resolver(365).index_name(date(2026, 8, 4)),
			"audit-trail-2026-08"
		);
	}

	#[test]
	fn daily_index_name_for_thirty_day_retention() {
		assert_eq!(
			resolver(30).index_name(date(2026, 8, 4)),
			"audit-trail-2026-08-04"
		);
	}

	#[test]
	fn settings_body_carries_alias_and_index_settings() {
		let body = resolver(365).settings_body();
		assert_eq!(body["settings"]["number_of_shards"], 3);
		assert_eq!(body["settings"]["number_of_replicas"], 1);
		assert_eq!(body["settings"]["refresh_interval"], "30s");
		assert!(body["aliases"][AUDIT_TRAIL_ALIAS].is_object());
	}

	#[tokio::test]
	async fn cache_remembers_the_confirmed_index() {
		let resolver = resolver(365);
		assert!(!resolver.is_cached("audit-trail-2026-08").await);

		resolver.remember("audit-trail-2026-08".to_string()).await;
		assert!(resolver.is_cached("audit-trail-2026-08").await);
		// A new month invalidates the cached name.
		assert!(!resolver.is_cached("audit-trail-2026-09").await);
	}
}
