// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core domain types for the Vellum audit-trail service.
//!
//! This crate holds the pieces shared by every layer:
//!
//! - [`AuditPayload`] / [`AuditRecord`]: the ingest and storage shapes
//! - [`AppSlug`] and the per-app category registry
//! - [`RequestScope`] / [`TimeWindow`]: per-request execution context
//! - [`TrailError`]: the error taxonomy the transport layer maps to HTTP

pub mod app;
pub mod error;
pub mod record;
pub mod scope;
pub mod time;

pub use app::{AppSlug, DEVICE_TYPES, INTERNAL_CUSTOMER_ID, INTERNAL_CUSTOMER_NAME};
pub use error::{Result, SearchOutcome, TrailError};
pub use record::{AuditDetails, AuditInfo, AuditPayload, AuditRecord};
pub use scope::{AuthorizationType, RequestScope, RoleGrants, TimeWindow, MAX_AUDIT_WINDOW_MS};
