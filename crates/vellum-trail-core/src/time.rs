// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Epoch-millisecond helpers.

use chrono::Utc;

/// Epoch values below this are second-resolution. Millisecond timestamps
/// crossed 10^12 in 2001; the service never handles earlier instants.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

pub fn epoch_millis_now() -> i64 {
	Utc::now().timestamp_millis()
}

/// Normalize an epoch timestamp to milliseconds.
pub fn to_millis(epoch: i64) -> i64 {
	if epoch < MILLIS_THRESHOLD {
		epoch * 1000
	} else {
		epoch
	}
}
