//! Demand-driven metadata cache
//!
//! Single source of truth for the catalogs, schemas, tables, and columns the
//! engine knows about, and the only place that issues metadata requests to
//! the backend. Every request is keyed (catalog, `catalog.schema`, or fully
//! qualified table) and guarded by an explicit [`FetchState`] tag, and is
//! only issued for names already present in the parent set.
//!
//! Fetch failures never propagate: they are logged, the key is tagged
//! [`FetchState::Failed`], and the next call for the same key retries.

use crate::metadata::resource::{ColumnInfo, Defaults, ResourceClient, ResourceRequest, fetch};
use crate::suggest::SuggestionItem;
use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Registry key of the single catalog-list fetch
const CATALOGS_KEY: &str = "";

/// Request state of one fetch key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    NotRequested,
    InFlight,
    Loaded,
    Failed,
}

/// What an `ensure_*` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Unknown name, already loaded, or a request for the key is in flight
    Skipped,
    /// New data was fetched and recorded
    Loaded,
    /// Previously fetched columns became the active column set
    Reused,
    /// The request failed; the key may be retried
    Failed,
}

impl FetchOutcome {
    /// Whether suggestion contents changed
    pub fn changed(self) -> bool {
        matches!(self, FetchOutcome::Loaded | FetchOutcome::Reused)
    }
}

#[derive(Debug, Default)]
struct FetchRegistry {
    states: HashMap<String, FetchState>,
}

impl FetchRegistry {
    fn state(&self, key: &str) -> FetchState {
        self.states.get(key).copied().unwrap_or_default()
    }

    /// Mark `key` in flight unless it is already in flight or loaded.
    fn begin(&mut self, key: &str) -> bool {
        match self.state(key) {
            FetchState::InFlight | FetchState::Loaded => false,
            FetchState::NotRequested | FetchState::Failed => {
                self.states.insert(key.to_string(), FetchState::InFlight);
                true
            }
        }
    }

    fn finish(&mut self, key: &str, ok: bool) {
        let state = if ok {
            FetchState::Loaded
        } else {
            FetchState::Failed
        };
        self.states.insert(key.to_string(), state);
    }
}

#[derive(Debug, Default)]
struct CacheState {
    catalogs: IndexSet<String>,
    /// `catalog.schema` and bare `schema`
    schemas: IndexSet<String>,
    /// `catalog.schema.table`, `schema.table` and bare `table`
    tables: IndexSet<String>,
    schemas_by_catalog: HashMap<String, Vec<String>>,
    tables_by_schema: HashMap<String, Vec<String>>,
    columns: HashMap<String, Vec<ColumnInfo>>,
    active_table: Option<String>,
    /// Catalog/schema/table suggestions in discovery order, unique by label
    table_entries: IndexMap<String, SuggestionItem>,

    catalog_fetch: FetchRegistry,
    schema_fetches: FetchRegistry,
    table_fetches: FetchRegistry,
    column_fetches: FetchRegistry,

    /// Backend-reported (or fallback) context, adopted once its names are known
    default_catalog: Option<String>,
    default_schema: Option<String>,
    current_catalog: Option<String>,
    current_schema: Option<String>,
}

impl CacheState {
    /// Fill an unset current catalog/schema from the defaults once they
    /// resolve against the known sets.
    fn adopt_defaults(&mut self) {
        if self.current_catalog.is_none() {
            let catalog = self
                .default_catalog
                .clone()
                .filter(|c| self.catalogs.contains(c));
            if catalog.is_some() {
                tracing::debug!(catalog = ?catalog, "adopted default catalog");
                self.current_catalog = catalog;
            }
        }
        if self.current_schema.is_none() {
            let schema = match (&self.current_catalog, &self.default_schema) {
                (Some(catalog), Some(schema))
                    if self.schemas.contains(&format!("{catalog}.{schema}")) =>
                {
                    Some(schema.clone())
                }
                _ => None,
            };
            if schema.is_some() {
                tracing::debug!(schema = ?schema, "adopted default schema");
                self.current_schema = schema;
            }
        }
    }

    fn add_entry(&mut self, item: SuggestionItem) {
        self.table_entries.entry(item.label.clone()).or_insert(item);
    }

    fn record_catalogs(&mut self, catalogs: &[String]) {
        for catalog in catalogs {
            self.catalogs.insert(catalog.clone());
            self.add_entry(SuggestionItem::catalog(catalog));
        }
    }

    fn record_schemas(&mut self, catalog: &str, schemas: &[String]) {
        for schema in schemas {
            let qualified = format!("{catalog}.{schema}");
            self.add_entry(SuggestionItem::schema(&qualified));
            self.add_entry(SuggestionItem::schema(schema));
            self.schemas.insert(qualified);
            self.schemas.insert(schema.clone());
        }
        self.schemas_by_catalog
            .insert(catalog.to_string(), schemas.to_vec());
    }

    fn record_tables(&mut self, catalog: &str, schema: &str, tables: &[String]) {
        for table in tables {
            let qualified = format!("{catalog}.{schema}.{table}");
            let partial = format!("{schema}.{table}");
            self.add_entry(SuggestionItem::table(&qualified));
            self.add_entry(SuggestionItem::table(&partial));
            self.add_entry(SuggestionItem::table(table));
            self.tables.insert(qualified);
            self.tables.insert(partial);
            self.tables.insert(table.clone());
        }
        self.tables_by_schema
            .insert(format!("{catalog}.{schema}"), tables.to_vec());
    }
}

/// Known metadata plus the fetch machinery that grows it
pub struct MetadataCache<C> {
    client: C,
    state: Mutex<CacheState>,
    fallback_catalog: Option<String>,
    fallback_schema: Option<String>,
}

impl<C: ResourceClient> MetadataCache<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: Mutex::new(CacheState::default()),
            fallback_catalog: None,
            fallback_schema: None,
        }
    }

    /// Catalog and schema to assume when the backend cannot report defaults
    pub fn with_fallback(mut self, catalog: Option<String>, schema: Option<String>) -> Self {
        self.fallback_catalog = catalog;
        self.fallback_schema = schema;
        self
    }

    /// Load defaults and the catalog list, then the schemas of the default
    /// catalog and the tables of the default schema.
    ///
    /// Returns whether any suggestion contents changed.
    pub async fn initialize(&self) -> bool {
        self.load_defaults().await;
        let mut changed = self.ensure_catalogs().await.changed();
        changed |= self.preload_context().await;
        changed
    }

    /// Ask the backend for its default catalog and schema, falling back to
    /// the configured ones. They become current as soon as they resolve.
    pub async fn load_defaults(&self) {
        let (catalog, schema) =
            match fetch::<_, Defaults>(&self.client, ResourceRequest::Defaults).await {
                Ok(defaults) => {
                    tracing::debug!(
                        catalog = %defaults.default_catalog,
                        schema = %defaults.default_schema,
                        "backend defaults"
                    );
                    (Some(defaults.default_catalog), Some(defaults.default_schema))
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to fetch default catalog and schema");
                    (self.fallback_catalog.clone(), self.fallback_schema.clone())
                }
            };

        let mut state = self.state.lock();
        state.default_catalog = catalog;
        state.default_schema = schema;
        state.adopt_defaults();
    }

    /// Fetch the schemas of the current catalog and the tables of the
    /// current schema. Returns whether any suggestion contents changed.
    pub async fn preload_context(&self) -> bool {
        let Some(catalog) = self.current_catalog() else {
            return false;
        };
        let mut changed = self.ensure_schemas(&catalog).await.changed();
        if let Some(schema) = self.current_schema() {
            changed |= self.ensure_tables(&catalog, &schema).await.changed();
        }
        changed
    }

    /// Fetch the catalog list unless it is loaded or in flight.
    pub async fn ensure_catalogs(&self) -> FetchOutcome {
        let started = self.state.lock().catalog_fetch.begin(CATALOGS_KEY);
        if !started {
            return FetchOutcome::Skipped;
        }

        match fetch::<_, Vec<String>>(&self.client, ResourceRequest::Catalogs).await {
            Ok(catalogs) => {
                tracing::debug!(count = catalogs.len(), "loaded catalogs");
                let mut state = self.state.lock();
                state.record_catalogs(&catalogs);
                state.catalog_fetch.finish(CATALOGS_KEY, true);
                state.adopt_defaults();
                FetchOutcome::Loaded
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch catalogs");
                self.state.lock().catalog_fetch.finish(CATALOGS_KEY, false);
                FetchOutcome::Failed
            }
        }
    }

    /// Fetch the schemas of a known catalog, once.
    pub async fn ensure_schemas(&self, catalog: &str) -> FetchOutcome {
        let started = {
            let mut state = self.state.lock();
            state.catalogs.contains(catalog) && state.schema_fetches.begin(catalog)
        };
        if !started {
            return FetchOutcome::Skipped;
        }

        let request = ResourceRequest::Schemas {
            catalog: Some(catalog),
        };
        match fetch::<_, Vec<String>>(&self.client, request).await {
            Ok(schemas) => {
                tracing::debug!(catalog = %catalog, count = schemas.len(), "loaded schemas");
                let mut state = self.state.lock();
                state.record_schemas(catalog, &schemas);
                state.schema_fetches.finish(catalog, true);
                state.adopt_defaults();
                FetchOutcome::Loaded
            }
            Err(err) => {
                tracing::warn!(catalog = %catalog, error = %err, "failed to fetch schemas");
                self.state.lock().schema_fetches.finish(catalog, false);
                FetchOutcome::Failed
            }
        }
    }

    /// Fetch the tables of a known `catalog.schema`, once.
    pub async fn ensure_tables(&self, catalog: &str, schema: &str) -> FetchOutcome {
        let key = format!("{catalog}.{schema}");
        let started = {
            let mut state = self.state.lock();
            state.schemas.contains(&key) && state.table_fetches.begin(&key)
        };
        if !started {
            return FetchOutcome::Skipped;
        }

        let request = ResourceRequest::Tables {
            catalog: Some(catalog),
            schema,
        };
        match fetch::<_, Vec<String>>(&self.client, request).await {
            Ok(tables) => {
                tracing::debug!(schema = %key, count = tables.len(), "loaded tables");
                let mut state = self.state.lock();
                state.record_tables(catalog, schema, &tables);
                state.table_fetches.finish(&key, true);
                FetchOutcome::Loaded
            }
            Err(err) => {
                tracing::warn!(schema = %key, error = %err, "failed to fetch tables");
                self.state.lock().table_fetches.finish(&key, false);
                FetchOutcome::Failed
            }
        }
    }

    /// Make the columns of a known table the active column set, fetching
    /// them on first use.
    pub async fn ensure_columns(&self, table: &str) -> FetchOutcome {
        let started = {
            let mut state = self.state.lock();
            if !state.tables.contains(table) {
                return FetchOutcome::Skipped;
            }
            match state.column_fetches.state(table) {
                FetchState::InFlight => return FetchOutcome::Skipped,
                FetchState::Loaded => {
                    if state.active_table.as_deref() == Some(table) {
                        return FetchOutcome::Skipped;
                    }
                    tracing::debug!(table = %table, "cache hit for columns");
                    state.active_table = Some(table.to_string());
                    return FetchOutcome::Reused;
                }
                FetchState::NotRequested | FetchState::Failed => {
                    state.column_fetches.begin(table)
                }
            }
        };
        if !started {
            return FetchOutcome::Skipped;
        }

        match fetch::<_, Vec<ColumnInfo>>(&self.client, ResourceRequest::Columns { table }).await {
            Ok(columns) => {
                tracing::debug!(table = %table, count = columns.len(), "loaded columns");
                let mut state = self.state.lock();
                state.columns.insert(table.to_string(), columns);
                state.active_table = Some(table.to_string());
                state.column_fetches.finish(table, true);
                FetchOutcome::Loaded
            }
            Err(err) => {
                tracing::warn!(table = %table, error = %err, "failed to fetch columns");
                self.state.lock().column_fetches.finish(table, false);
                FetchOutcome::Failed
            }
        }
    }
}

impl<C> MetadataCache<C> {
    /// Switch the current catalog. Unknown catalogs are ignored.
    pub fn use_catalog(&self, catalog: &str) -> bool {
        let mut state = self.state.lock();
        if !state.catalogs.contains(catalog) {
            return false;
        }
        state.current_catalog = Some(catalog.to_string());
        true
    }

    /// Switch the current schema. The schema must be known under the current
    /// catalog (or at all, when no catalog is current).
    pub fn use_schema(&self, schema: &str) -> bool {
        let mut state = self.state.lock();
        let known = match &state.current_catalog {
            Some(catalog) => state.schemas.contains(&format!("{catalog}.{schema}")),
            None => state.schemas.contains(schema),
        };
        if known {
            state.current_schema = Some(schema.to_string());
        }
        known
    }

    pub fn current_catalog(&self) -> Option<String> {
        self.state.lock().current_catalog.clone()
    }

    pub fn current_schema(&self) -> Option<String> {
        self.state.lock().current_schema.clone()
    }

    pub fn catalogs(&self) -> Vec<String> {
        self.state.lock().catalogs.iter().cloned().collect()
    }

    /// Schemas of `catalog` as reported by the backend (empty until fetched)
    pub fn schemas_of(&self, catalog: &str) -> Vec<String> {
        self.state
            .lock()
            .schemas_by_catalog
            .get(catalog)
            .cloned()
            .unwrap_or_default()
    }

    /// Tables of `catalog.schema` as reported by the backend (empty until fetched)
    pub fn tables_of(&self, catalog: &str, schema: &str) -> Vec<String> {
        self.state
            .lock()
            .tables_by_schema
            .get(&format!("{catalog}.{schema}"))
            .cloned()
            .unwrap_or_default()
    }

    /// Table whose columns are currently suggested
    pub fn active_table(&self) -> Option<String> {
        self.state.lock().active_table.clone()
    }

    pub fn catalog_fetch_state(&self) -> FetchState {
        self.state.lock().catalog_fetch.state(CATALOGS_KEY)
    }

    pub fn schema_fetch_state(&self, catalog: &str) -> FetchState {
        self.state.lock().schema_fetches.state(catalog)
    }

    pub fn table_fetch_state(&self, catalog: &str, schema: &str) -> FetchState {
        self.state
            .lock()
            .table_fetches
            .state(&format!("{catalog}.{schema}"))
    }

    pub fn column_fetch_state(&self, table: &str) -> FetchState {
        self.state.lock().column_fetches.state(table)
    }

    /// Catalog, schema and table suggestions in discovery order
    pub fn table_suggestions(&self) -> Vec<SuggestionItem> {
        self.state.lock().table_entries.values().cloned().collect()
    }

    /// Column suggestions of the active table
    pub fn column_suggestions(&self) -> Vec<SuggestionItem> {
        let state = self.state.lock();
        state
            .active_table
            .as_ref()
            .and_then(|table| state.columns.get(table))
            .map(|columns| {
                columns
                    .iter()
                    .map(|c| SuggestionItem::column(&c.name, &c.data_type))
                    .collect()
            })
            .unwrap_or_default()
    }
}
