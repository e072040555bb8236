// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-request visibility scope and time window.

/// Widest span a single query may cover, in milliseconds (90 days).
pub const MAX_AUDIT_WINDOW_MS: i64 = 90 * 24 * 60 * 60 * 1000;

/// Capability flags granted to the caller for one request.
///
/// Produced by the role provider; only one non-internal visibility scope
/// is authoritative per request (admin beats MSP beats self) — the role
/// resolver enforces the ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleGrants {
	/// Access to audit logs is globally restricted for this app/customer.
	pub restrict_access: bool,
	pub admin_level: bool,
	pub msp_level: bool,
	pub self_level: bool,
	/// Independent of the scopes above: internal platform actions are
	/// visible alongside the customer's own.
	pub internal_audit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationType {
	#[default]
	Standard,
	MspView,
}

/// Resolved visibility scope threaded into query construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestScope {
	pub authorization: AuthorizationType,
	/// Admin callers see every tenant's records.
	pub admin_level: bool,
	/// OR in records written by the reserved internal customer.
	pub internal_logs: bool,
}

/// Inclusive window over `audit_info.created_at`, epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
	pub start: i64,
	pub end: i64,
}

impl TimeWindow {
	/// Derive the effective window for a request.
	///
	/// A missing end anchors at `now`. A missing start, or a requested
	/// span wider than `max_span`, pulls the start forward to
	/// `end - max_span`.
	pub fn derive(start: Option<i64>, end: Option<i64>, now: i64, max_span: i64) -> Self {
		let end = end.unwrap_or(now);
		let start = match start {
			Some(start) if end - start <= max_span => start,
			_ => end - max_span,
		};
		TimeWindow { start, end }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const NOW: i64 = 1_700_000_000_000;

	#[test]
	fn missing_end_anchors_at_now() {
		let window = TimeWindow::derive(Some(NOW - 1000), None, NOW, MAX_AUDIT_WINDOW_MS);
		assert_eq!(window.end, NOW);
		assert_eq!(window.start, NOW - 1000);
	}

	#[test]
	fn missing_start_derives_from_end() {
		let window = TimeWindow::derive(None, Some(NOW), NOW, MAX_AUDIT_WINDOW_MS);
		assert_eq!(window.start, NOW - MAX_AUDIT_WINDOW_MS);
		assert_eq!(window.end, NOW);
	}

	#[test]
	fn over_wide_span_clamps_start_forward() {
		let start = NOW - MAX_AUDIT_WINDOW_MS - 1;
		let window = TimeWindow::derive(Some(start), Some(NOW), NOW, MAX_AUDIT_WINDOW_MS);
		assert_eq!(window.start, NOW - MAX_AUDIT_WINDOW_MS);
		assert_eq!(window.end, NOW);
	}

	#[test]
	fn exact_max_span_is_not_clamped() {
		let start = NOW - MAX_AUDIT_WINDOW_MS;
		let window = TimeWindow::derive(Some(start), Some(NOW), NOW, MAX_AUDIT_WINDOW_MS);
		assert_eq!(window.start, start);
	}

	proptest! {
		#[test]
		fn span_never_exceeds_max(
			start in proptest::option::of(0i64..NOW),
			end in proptest::option::of(0i64..NOW),
		) {
			let window = TimeWindow::derive(start, end, NOW, MAX_AUDIT_WINDOW_MS);
			prop_assert!(window.end - window.start <= MAX_AUDIT_WINDOW_MS);
		}

		#[test]
		fn requested_end_is_preserved(end in 0i64..NOW) {
			let window = TimeWindow::derive(None, Some(end), NOW, MAX_AUDIT_WINDOW_MS);
			prop_assert_eq!(window.end, end);
		}
	}
}
