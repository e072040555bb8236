// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit-trail service orchestration.
//!
//! [`TrailService`] wires role resolution, customer-app authorization,
//! category translation, query execution, and the ingestion dual write
//! over the collaborator ports. Each operation is stateless; the only
//! shared state lives behind the store's index resolver.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use vellum_server_search::fields::{ALL_FIELDS_KEY, APP_SLUG_KEY, CATEGORY_KEY, CUSTOMER_ID_KEY};
use vellum_server_search::params::{strip_quotes, SearchParams};
use vellum_server_search::store::TrailStore;
use vellum_trail_core::app::{self, AppSlug};
use vellum_trail_core::error::{Result, SearchOutcome, TrailError};
use vellum_trail_core::record::{AuditDetails, AuditPayload};
use vellum_trail_core::scope::{RequestScope, TimeWindow, MAX_AUDIT_WINDOW_MS};
use vellum_trail_core::time::{epoch_millis_now, to_millis};

use crate::clients::{AccountDirectory, AppCatalog, AuditFileWriter, MirrorStore};
use crate::ingest::build_audit_record;
use crate::response::{build_audit_response, AuditTrailResponse};
use crate::roles::{resolve_scope, RoleProvider};

pub struct TrailService {
	pub(crate) store: Arc<dyn TrailStore>,
	pub(crate) directory: Arc<dyn AccountDirectory>,
	pub(crate) catalog: Arc<dyn AppCatalog>,
	pub(crate) mirror: Arc<dyn MirrorStore>,
	pub(crate) roles: Arc<dyn RoleProvider>,
	pub(crate) writer: Arc<dyn AuditFileWriter>,
}

impl TrailService {
	pub fn new(
		store: Arc<dyn TrailStore>,
		directory: Arc<dyn AccountDirectory>,
		catalog: Arc<dyn AppCatalog>,
		mirror: Arc<dyn MirrorStore>,
		roles: Arc<dyn RoleProvider>,
		writer: Arc<dyn AuditFileWriter>,
	) -> Self {
		TrailService {
			store,
			directory,
			catalog,
			mirror,
			roles,
			writer,
		}
	}

	/// Paginated, filtered, role-scoped audit query.
	///
	/// `None` means the index family holds no data yet, which callers
	/// serve as an empty result rather than an error.
	#[instrument(skip(self, params))]
	pub async fn get_audit_trail(
		&self,
		mut params: SearchParams,
		include_details: bool,
	) -> Result<Option<AuditTrailResponse>> {
		let (app, scope) = self.prepare_query(&mut params).await?;
		let window = derive_window(params.start_time, params.end_time);

		match self.store.get_audit_records(&params, &scope, &window).await? {
			SearchOutcome::Empty => Ok(None),
			SearchOutcome::Found((hits, total)) => Ok(Some(build_audit_response(
				app,
				hits,
				total,
				params.offset,
				params.limit,
				include_details,
			)?)),
		}
	}

	/// Point lookup of one entry's detail payload. `None` when the
	/// document has no header and no body; callers map that to 404.
	#[instrument(skip(self))]
	pub async fn get_audit_trail_details(
		&self,
		index: &str,
		audit_id: &str,
	) -> Result<Option<AuditDetails>> {
		self.store.get_audit_details(index, audit_id).await
	}

	/// Cardinality of entries since `start_time`, through the same
	/// authorization pipeline as the list query.
	#[instrument(skip(self, params))]
	pub async fn get_audit_trail_count(
		&self,
		mut params: SearchParams,
		start_time: i64,
	) -> Result<Option<u64>> {
		let (_, scope) = self.prepare_query(&mut params).await?;
		let window = derive_window(Some(start_time), params.end_time);

		let outcome = self.store.get_audit_count(&params, &scope, &window).await?;
		Ok(outcome.into_option())
	}

	/// Ingest one event: index write first, then the mirror write keyed
	/// by the assigned id. Overall success requires both; a partial
	/// failure is reported as failure and is not rolled back.
	#[instrument(skip(self, payload), fields(customer_id = %payload.customer_id))]
	pub async fn set_audit_trail(&self, payload: AuditPayload) -> Result<bool> {
		let record = build_audit_record(self.directory.as_ref(), payload).await?;

		let audit_id = self.store.add_audit_record(&record).await?;
		let mirrored = self.mirror.add_audit_record(&audit_id, &record).await?;
		if !mirrored {
			warn!(%audit_id, "mirror write failed after index write succeeded");
		}
		Ok(mirrored)
	}

	/// User-facing category labels for an app.
	pub fn get_audit_trail_categories(&self, app: AppSlug) -> Vec<&'static str> {
		app::category_labels(app)
	}

	/// The shared front half of every query: role resolution, app
	/// authorization, category translation, universal-search shaping.
	async fn prepare_query(&self, params: &mut SearchParams) -> Result<(AppSlug, RequestScope)> {
		let customer_id = params
			.get_single(CUSTOMER_ID_KEY)
			.ok_or_else(|| TrailError::InvalidRequest("missing customer_id".to_string()))?
			.to_string();
		let app: AppSlug = params
			.get_single(APP_SLUG_KEY)
			.ok_or_else(|| TrailError::InvalidRequest("missing app_slug".to_string()))?
			.parse()?;

		let scope = resolve_scope(
			self.roles.as_ref(),
			self.directory.as_ref(),
			app,
			&customer_id,
			params,
		)
		.await?;

		let apps = self.authorized_apps(&customer_id, app).await?;
		if apps.is_empty() {
			return Err(TrailError::NotFound(format!(
				"no authorized applications found for customer {customer_id}"
			)));
		}
		debug!(%customer_id, ?apps, "resolved authorized apps");
		params.insert(APP_SLUG_KEY, apps);

		if let Some(label) = params.get_single(CATEGORY_KEY).map(str::to_string) {
			let code = app::category_code(app, &label)?;
			params.insert(CATEGORY_KEY, code.to_string());
		}

		// Free text that names a category also matches documents stored
		// under the backend code, so search for both alternatives.
		if let Some(text) = params.get_single(ALL_FIELDS_KEY).map(str::to_string) {
			if let Ok(code) = app::category_code(app, strip_quotes(&text)) {
				if !code.eq_ignore_ascii_case(&text) {
					params.insert(ALL_FIELDS_KEY, vec![text, code.to_string()]);
				}
			}
		}

		Ok((app, scope))
	}

	/// App slugs the customer may query. The internal app needs no
	/// instance; the `all` pseudo-slug expands to every concrete app.
	async fn authorized_apps(&self, customer_id: &str, app: AppSlug) -> Result<Vec<String>> {
		if app == AppSlug::Console {
			return Ok(vec![app.as_str().to_string()]);
		}

		let slugs: Vec<AppSlug> = match app {
			AppSlug::All => AppSlug::concrete().to_vec(),
			other => vec![other],
		};

		let mut app_ids: BTreeMap<String, AppSlug> = BTreeMap::new();
		for slug in slugs {
			if let Some(details) = self.catalog.get_app_details(slug).await? {
				app_ids.insert(details.app_id, slug);
			}
		}

		let instances = self
			.catalog
			.get_app_instances_for_customer(customer_id)
			.await?;
		if instances.is_empty() {
			return Err(TrailError::NotFound(format!(
				"no app instances found for customer {customer_id}"
			)));
		}

		let mut authorized: Vec<String> = Vec::new();
		for instance in instances {
			if let Some(slug) = app_ids.get(&instance.app_id) {
				let name = slug.as_str().to_string();
				if !authorized.contains(&name) {
					authorized.push(name);
				}
			}
		}
		Ok(authorized)
	}
}

fn derive_window(start: Option<i64>, end: Option<i64>) -> TimeWindow {
	TimeWindow::derive(
		start.map(to_millis),
		end.map(to_millis),
		epoch_millis_now(),
		MAX_AUDIT_WINDOW_MS,
	)
}

#[cfg(test)]
pub(crate) mod testing {
	use super::*;
	use async_trait::async_trait;
	use std::sync::Mutex;
	use vellum_server_search::store::RecordHit;
	use vellum_trail_core::record::AuditRecord;
	use vellum_trail_core::scope::RoleGrants;

	use crate::clients::{AppDetails, AppInstance, CustomerDetails};
	use crate::export::FileExtension;

	#[derive(Default)]
	pub struct FakeStore {
		pub records: Mutex<Vec<AuditRecord>>,
		pub last_params: Mutex<Option<SearchParams>>,
		pub empty: bool,
		pub count: u64,
	}

	#[async_trait]
	impl TrailStore for FakeStore {
		async fn add_audit_record(&self, record: &AuditRecord) -> Result<String> {
			let mut records = self.records.lock().unwrap();
			records.push(record.clone());
			Ok(format!("doc-{}", records.len()))
		}

		async fn get_audit_records(
			&self,
			params: &SearchParams,
			_scope: &RequestScope,
			_window: &TimeWindow,
		) -> Result<SearchOutcome<(Vec<RecordHit>, u64)>> {
			*self.last_params.lock().unwrap() = Some(params.clone());
			if self.empty {
				return Ok(SearchOutcome::Empty);
			}
			let records = self.records.lock().unwrap().clone();
			let total = records.len() as u64;
			let hits = records
				.into_iter()
				.enumerate()
				.map(|(i, record)| RecordHit {
					index: "audit-trail-2026-08".to_string(),
					audit_id: format!("doc-{}", i + 1),
					record,
				})
				.collect();
			Ok(SearchOutcome::Found((hits, total)))
		}

		async fn get_audit_details(
			&self,
			_index: &str,
			_audit_id: &str,
		) -> Result<Option<AuditDetails>> {
			Ok(None)
		}

		async fn get_audit_count(
			&self,
			params: &SearchParams,
			_scope: &RequestScope,
			_window: &TimeWindow,
		) -> Result<SearchOutcome<u64>> {
			*self.last_params.lock().unwrap() = Some(params.clone());
			if self.empty {
				return Ok(SearchOutcome::Empty);
			}
			Ok(SearchOutcome::Found(self.count))
		}
	}

	#[derive(Default)]
	pub struct FakeDirectory {
		pub customer: Option<CustomerDetails>,
		pub msp_customer: bool,
	}

	#[async_trait]
	impl AccountDirectory for FakeDirectory {
		async fn get_customer_details(&self, _customer_id: &str) -> Result<Option<CustomerDetails>> {
			Ok(self.customer.clone())
		}

		async fn is_msp(&self, _msp_id: &str) -> Result<bool> {
			Ok(false)
		}

		async fn is_msp_customer(&self, _customer_id: &str) -> Result<bool> {
			Ok(self.msp_customer)
		}
	}

	#[derive(Default)]
	pub struct FakeCatalog {
		pub apps: Vec<AppDetails>,
		pub instances: Vec<AppInstance>,
		pub detail_lookups: Mutex<usize>,
	}

	#[async_trait]
	impl AppCatalog for FakeCatalog {
		async fn get_app_details(&self, app: AppSlug) -> Result<Option<AppDetails>> {
			*self.detail_lookups.lock().unwrap() += 1;
			Ok(self
				.apps
				.iter()
				.find(|details| details.app_slug == app.as_str())
				.cloned())
		}

		async fn get_app_instances_for_customer(
			&self,
			_customer_id: &str,
		) -> Result<Vec<AppInstance>> {
			Ok(self.instances.clone())
		}
	}

	#[derive(Default)]
	pub struct FakeMirror {
		pub fail: bool,
		pub written: Mutex<Vec<String>>,
	}

	#[async_trait]
	impl MirrorStore for FakeMirror {
		async fn add_audit_record(&self, audit_id: &str, _record: &AuditRecord) -> Result<bool> {
			self.written.lock().unwrap().push(audit_id.to_string());
			Ok(!self.fail)
		}
	}

	#[derive(Default)]
	pub struct FakeRoles {
		pub grants: RoleGrants,
	}

	#[async_trait]
	impl RoleProvider for FakeRoles {
		async fn grants(&self, _app: AppSlug, _customer_id: &str) -> Result<RoleGrants> {
			Ok(self.grants)
		}
	}

	#[derive(Default)]
	pub struct FakeWriter {
		pub calls: Mutex<Vec<(FileExtension, Vec<String>)>>,
	}

	#[async_trait]
	impl AuditFileWriter for FakeWriter {
		async fn write(
			&self,
			_app: AppSlug,
			customer_id: &str,
			generated_at: i64,
			_data: &AuditTrailResponse,
			columns: &[String],
			extension: FileExtension,
		) -> Result<String> {
			self.calls
				.lock()
				.unwrap()
				.push((extension, columns.to_vec()));
			Ok(format!(
				"/exports/{customer_id}/audit-{generated_at}.{extension}"
			))
		}
	}

	pub fn console_catalog() -> FakeCatalog {
		FakeCatalog {
			apps: vec![
				AppDetails {
					app_id: "a-directory".to_string(),
					app_slug: "directory".to_string(),
				},
				AppDetails {
					app_id: "a-devices".to_string(),
					app_slug: "devices".to_string(),
				},
			],
			instances: vec![AppInstance {
				app_id: "a-directory".to_string(),
				app_instance_id: Some("i-1".to_string()),
			}],
			detail_lookups: Mutex::new(0),
		}
	}

	pub fn acme_directory() -> FakeDirectory {
		FakeDirectory {
			customer: Some(CustomerDetails {
				customer_id: "C1".to_string(),
				customer_name: "Acme".to_string(),
				msp_id: None,
			}),
			msp_customer: false,
		}
	}

	pub struct ServiceFixture {
		pub store: Arc<FakeStore>,
		pub catalog: Arc<FakeCatalog>,
		pub mirror: Arc<FakeMirror>,
		pub writer: Arc<FakeWriter>,
		pub service: TrailService,
	}

	pub fn fixture_with(
		store: FakeStore,
		directory: FakeDirectory,
		catalog: FakeCatalog,
		mirror: FakeMirror,
		grants: RoleGrants,
	) -> ServiceFixture {
		let store = Arc::new(store);
		let catalog = Arc::new(catalog);
		let mirror = Arc::new(mirror);
		let writer = Arc::new(FakeWriter::default());
		let service = TrailService::new(
			store.clone(),
			Arc::new(directory),
			catalog.clone(),
			mirror.clone(),
			Arc::new(FakeRoles { grants }),
			writer.clone(),
		);
		ServiceFixture {
			store,
			catalog,
			mirror,
			writer,
			service,
		}
	}

	pub fn fixture() -> ServiceFixture {
		fixture_with(
			FakeStore::default(),
			acme_directory(),
			console_catalog(),
			FakeMirror::default(),
			RoleGrants::default(),
		)
	}
}
