// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application catalog and per-app audit categories.
//!
//! Categories are stored as backend-internal codes; the user-facing label
//! is a pure mapping of `(app, code)` and is injective per app, so the
//! label → code direction is always recoverable.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TrailError};

/// Reserved customer id for actions performed by the platform itself.
pub const INTERNAL_CUSTOMER_ID: &str = "vellum-internal";

/// Display name stored for internal platform actions.
pub const INTERNAL_CUSTOMER_NAME: &str = "Vellum Platform";

/// Device types accepted in `additional_info.device_type`.
pub const DEVICE_TYPES: [&str; 5] = ["ios", "android", "windows", "macos", "linux"];

/// A client application that emits audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppSlug {
	/// The internal platform app; queries for it skip instance
	/// authorization and target the slug directly.
	Console,
	Directory,
	Devices,
	Gateway,
	/// Pseudo-slug meaning "every concrete app".
	All,
}

impl AppSlug {
	pub fn as_str(&self) -> &'static str {
		match self {
			AppSlug::Console => "console",
			AppSlug::Directory => "directory",
			AppSlug::Devices => "devices",
			AppSlug::Gateway => "gateway",
			AppSlug::All => "all",
		}
	}

	/// Every concrete app, excluding the `all` pseudo-slug.
	pub fn concrete() -> [AppSlug; 4] {
		[
			AppSlug::Console,
			AppSlug::Directory,
			AppSlug::Devices,
			AppSlug::Gateway,
		]
	}
}

impl fmt::Display for AppSlug {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl std::str::FromStr for AppSlug {
	type Err = TrailError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"console" => Ok(AppSlug::Console),
			"directory" => Ok(AppSlug::Directory),
			"devices" => Ok(AppSlug::Devices),
			"gateway" => Ok(AppSlug::Gateway),
			"all" => Ok(AppSlug::All),
			other => Err(TrailError::InvalidRequest(format!(
				"unknown app slug: {other}"
			))),
		}
	}
}

/// `(backend code, user-facing label)` pairs declared for one app.
fn categories(app: AppSlug) -> &'static [(&'static str, &'static str)] {
	match app {
		AppSlug::Console => &[
			("login", "Login"),
			("logout", "Logout"),
			("config_change", "Configuration"),
			("user_mgmt", "User Management"),
		],
		AppSlug::Directory => &[
			("login", "Login"),
			("group_change", "Group Change"),
			("policy_change", "Policy"),
		],
		AppSlug::Devices => &[
			("login", "Login"),
			("enrollment", "Enrollment"),
			("firmware", "Firmware Update"),
		],
		AppSlug::Gateway => &[
			("login", "Login"),
			("tunnel", "Tunnel"),
			("acl_change", "Access Rules"),
		],
		AppSlug::All => &[],
	}
}

fn category_pairs(app: AppSlug) -> Vec<(&'static str, &'static str)> {
	match app {
		AppSlug::All => {
			let mut pairs = Vec::new();
			for concrete in AppSlug::concrete() {
				for pair in categories(concrete) {
					if !pairs.contains(pair) {
						pairs.push(*pair);
					}
				}
			}
			pairs
		}
		other => categories(other).to_vec(),
	}
}

/// The user-facing category labels for an app, declaration order preserved.
pub fn category_labels(app: AppSlug) -> Vec<&'static str> {
	category_pairs(app).iter().map(|(_, label)| *label).collect()
}

/// Translate a stored backend code to its user-facing label.
pub fn category_label(app: AppSlug, code: &str) -> Option<&'static str> {
	category_pairs(app)
		.iter()
		.find(|(c, _)| *c == code)
		.map(|(_, label)| *label)
}

/// Translate a user-facing label to its backend code.
///
/// An unrecognized label is a client error: categories are a closed,
/// app-declared set.
pub fn category_code(app: AppSlug, label: &str) -> Result<&'static str> {
	category_pairs(app)
		.iter()
		.find(|(_, l)| *l == label)
		.map(|(code, _)| *code)
		.ok_or_else(|| TrailError::InvalidRequest(format!("invalid category: {label}")))
}

pub fn is_valid_device_type(device_type: &str) -> bool {
	DEVICE_TYPES.contains(&device_type)
}
