// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role resolution.
//!
//! Determines the caller's visibility scope for one request and adjusts
//! the search parameters to match. Evaluation order is strict: a global
//! restriction denies outright, then admin beats MSP beats self.
//! Internal-audit visibility is independent of that ordering.

use async_trait::async_trait;
use tracing::instrument;

use vellum_server_search::fields::{MSP_ID_KEY, TENANT_ID_KEY, TENANT_NAME_KEY};
use vellum_server_search::params::SearchParams;
use vellum_trail_core::app::AppSlug;
use vellum_trail_core::error::{Result, TrailError};
use vellum_trail_core::scope::{AuthorizationType, RequestScope, RoleGrants};

use crate::clients::AccountDirectory;

/// Produces the caller's capability flags for one request. The session
/// and permission middleware behind it are external.
#[async_trait]
pub trait RoleProvider: Send + Sync {
	async fn grants(&self, app: AppSlug, customer_id: &str) -> Result<RoleGrants>;
}

/// Resolve the caller's scope and shape `params` accordingly.
///
/// The explicit denial surfaces as `Forbidden`; every other failure in
/// here is wrapped as a server error.
#[instrument(skip(roles, directory, params))]
pub async fn resolve_scope(
	roles: &dyn RoleProvider,
	directory: &dyn AccountDirectory,
	app: AppSlug,
	customer_id: &str,
	params: &mut SearchParams,
) -> Result<RequestScope> {
	apply_grants(roles, directory, app, customer_id, params)
		.await
		.map_err(|err| match err {
			TrailError::Forbidden(_) => err,
			other => TrailError::Backend(format!(
				"role resolution failed for customer {customer_id}: {other}"
			)),
		})
}

async fn apply_grants(
	roles: &dyn RoleProvider,
	directory: &dyn AccountDirectory,
	app: AppSlug,
	customer_id: &str,
	params: &mut SearchParams,
) -> Result<RequestScope> {
	let grants = roles.grants(app, customer_id).await?;

	if grants.restrict_access {
		return Err(TrailError::Forbidden(format!(
			"customer {customer_id} is not authorized to view audit logs"
		)));
	}

	let mut scope = RequestScope::default();
	if grants.admin_level {
		scope.admin_level = true;
	} else if grants.msp_level || directory.is_msp_customer(customer_id).await? {
		// The MSP queries as itself: its own id doubles as the msp_id
		// marker its child tenants' records carry.
		scope.authorization = AuthorizationType::MspView;
		params.insert(MSP_ID_KEY, customer_id.to_string());
	} else if grants.self_level {
		// Self scope may not filter across tenant or MSP boundaries.
		params.remove(MSP_ID_KEY);
		params.remove(TENANT_ID_KEY);
		params.remove(TENANT_NAME_KEY);
	}

	if grants.internal_audit {
		scope.internal_logs = true;
	}

	Ok(scope)
}
