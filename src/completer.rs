//! Clause-aware suggestion engine
//!
//! Ties the pieces together for one editor session: the editor reports text
//! and cursor changes through [`SuggestionEngine::update_suggestions`], the
//! engine works out the clause under the cursor, pulls whatever metadata the
//! partially typed table reference calls for, and rebuilds the clause lists.
//! [`SuggestionEngine::get_suggestions`] then answers synchronously from
//! whatever has been fetched so far.

use crate::config::Settings;
use crate::error::Result;
use crate::metadata::{FetchOutcome, MetadataCache, MetadataFixture, ResourceClient};
use crate::sql::{
    Clause, ClauseLocation, CursorPosition, TableReference, locate_clause, parse_use,
    position_to_offset, table_reference_after,
};
use crate::suggest::{ClauseSuggestionBuilder, SuggestionItem, SuggestionPolicy};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

struct EngineInner<C> {
    cache: MetadataCache<C>,
    builder: Mutex<ClauseSuggestionBuilder>,
    location: Mutex<ClauseLocation>,
    initialized: OnceCell<()>,
}

/// Suggestion engine; a cheap, cloneable handle to per-session state
pub struct SuggestionEngine<C> {
    inner: Arc<EngineInner<C>>,
}

impl<C> Clone for SuggestionEngine<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: ResourceClient + 'static> SuggestionEngine<C> {
    /// Record a text/cursor change and fetch metadata in the background.
    ///
    /// The current clause is updated before this returns; metadata fetches
    /// run on the tokio runtime and rebuild the suggestion lists as they
    /// complete. The returned handle can be awaited or dropped.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn update_suggestions(&self, text: &str, position: CursorPosition) -> JoinHandle<()> {
        let (location, offset) = self.locate(text, position);
        let engine = self.clone();
        let text = text.to_string();
        tokio::spawn(async move { engine.sync_metadata(&text, location, offset).await })
    }
}

impl SuggestionEngine<MetadataFixture> {
    /// Engine serving metadata from a fixture file
    pub fn from_fixture(path: &Path, settings: &Settings) -> Result<Self> {
        let fixture = MetadataFixture::load(path)?;
        Ok(Self::new(fixture, settings))
    }
}

impl<C: ResourceClient> SuggestionEngine<C> {
    pub fn new(client: C, settings: &Settings) -> Self {
        Self::with_policy(client, settings, SuggestionPolicy::default())
    }

    pub fn with_policy(client: C, settings: &Settings, policy: SuggestionPolicy) -> Self {
        let cache = MetadataCache::new(client).with_fallback(
            settings.fallback_catalog.clone(),
            settings.fallback_schema.clone(),
        );
        Self {
            inner: Arc::new(EngineInner {
                cache,
                builder: Mutex::new(ClauseSuggestionBuilder::new(
                    policy,
                    &settings.extra_functions,
                )),
                location: Mutex::new(ClauseLocation::START),
                initialized: OnceCell::new(),
            }),
        }
    }

    /// Same as [`update_suggestions`](Self::update_suggestions), but awaits
    /// the metadata work in place.
    pub async fn refresh(&self, text: &str, position: CursorPosition) {
        let (location, offset) = self.locate(text, position);
        self.sync_metadata(text, location, offset).await;
    }

    /// Suggestions for the clause under the cursor
    pub fn get_suggestions(&self) -> Vec<SuggestionItem> {
        let clause = self.current_clause();
        self.inner.builder.lock().suggestions(clause).to_vec()
    }

    pub fn current_clause(&self) -> Clause {
        self.inner.location.lock().clause
    }

    pub fn current_catalog(&self) -> Option<String> {
        self.inner.cache.current_catalog()
    }

    pub fn current_schema(&self) -> Option<String> {
        self.inner.cache.current_schema()
    }

    pub fn cache(&self) -> &MetadataCache<C> {
        &self.inner.cache
    }

    /// Load the backend defaults and the catalog list. Runs once per engine;
    /// later and concurrent callers wait for the first run. Everything below
    /// the catalog level is fetched on demand by later refreshes.
    pub async fn initialize(&self) {
        self.inner
            .initialized
            .get_or_init(|| async {
                self.inner.cache.load_defaults().await;
                self.ensure_catalogs().await;
            })
            .await;
    }

    /// Candidates for the next segment of a dotted table reference:
    /// catalogs and schemas end in `.` so the editor can keep completing.
    pub async fn complete_table_reference(&self, token: &str) -> Vec<SuggestionItem> {
        self.initialize().await;
        let cache = &self.inner.cache;
        let parts: Vec<&str> = token.split('.').filter(|p| !p.is_empty()).collect();
        let (current_catalog, current_schema) = self.load_current_context().await;
        let mut items = Vec::new();

        match parts.as_slice() {
            [] => {
                items.extend(
                    cache
                        .catalogs()
                        .iter()
                        .map(|c| SuggestionItem::catalog(&format!("{c}."))),
                );
                if let Some(catalog) = &current_catalog {
                    items.extend(
                        cache
                            .schemas_of(catalog)
                            .iter()
                            .map(|s| SuggestionItem::schema(&format!("{s}."))),
                    );
                    if let Some(schema) = &current_schema {
                        items.extend(
                            cache
                                .tables_of(catalog, schema)
                                .iter()
                                .map(|t| SuggestionItem::table(t)),
                        );
                    }
                }
            }
            [first] => {
                self.ensure_schemas(first).await;
                items.extend(
                    cache
                        .schemas_of(first)
                        .iter()
                        .map(|s| SuggestionItem::schema(&format!("{s}."))),
                );
                if let Some(catalog) = &current_catalog {
                    self.ensure_tables(catalog, first).await;
                    items.extend(
                        cache
                            .tables_of(catalog, first)
                            .iter()
                            .map(|t| SuggestionItem::table(t)),
                    );
                }
            }
            [catalog, schema] => {
                self.ensure_schemas(catalog).await;
                self.ensure_tables(catalog, schema).await;
                items.extend(
                    cache
                        .tables_of(catalog, schema)
                        .iter()
                        .map(|t| SuggestionItem::table(t)),
                );
            }
            _ => {}
        }
        items
    }

    /// Update the current clause; returns it with the cursor byte offset.
    fn locate(&self, text: &str, position: CursorPosition) -> (ClauseLocation, usize) {
        let offset = position_to_offset(text, position);
        let location = locate_clause(text, offset);
        tracing::trace!(clause = %location.clause, start = location.start, offset, "cursor clause");
        *self.inner.location.lock() = location;
        (location, offset)
    }

    async fn sync_metadata(&self, text: &str, location: ClauseLocation, offset: usize) {
        self.initialize().await;
        // A failed catalog fetch during initialization is retried here
        self.ensure_catalogs().await;

        // Independent chains: a stalled fetch in one only delays its own data
        futures::join!(
            self.apply_use_statements(text),
            self.load_current_context(),
            self.resolve_at(text, location, offset)
        );
    }

    /// Fetch the schemas of the current catalog and the tables of the
    /// current schema, then report that context.
    async fn load_current_context(&self) -> (Option<String>, Option<String>) {
        let Some(catalog) = self.inner.cache.current_catalog() else {
            return (None, None);
        };
        self.ensure_schemas(&catalog).await;
        // the default schema may only resolve once the schemas are in
        let schema = self.inner.cache.current_schema();
        if let Some(schema) = &schema {
            self.ensure_tables(&catalog, schema).await;
        }
        (Some(catalog), schema)
    }

    async fn resolve_at(&self, text: &str, location: ClauseLocation, offset: usize) {
        let search_from = match location.clause {
            Clause::Select => offset,
            Clause::From => location.start,
            _ => return,
        };
        if let Some(reference) = table_reference_after(text, search_from) {
            self.resolve_reference(reference).await;
        }
    }

    async fn apply_use_statements(&self, text: &str) {
        let uses = parse_use(text);
        if uses.is_empty() {
            return;
        }
        let cache = &self.inner.cache;

        if let Some(catalog) = &uses.catalog {
            if cache.use_catalog(catalog) {
                self.ensure_schemas(catalog).await;
            }
        }

        if let Some(schema_use) = &uses.schema {
            if let Some(catalog) = &schema_use.catalog {
                if cache.use_catalog(catalog) {
                    self.ensure_schemas(catalog).await;
                }
            }
            if cache.use_schema(&schema_use.schema) {
                if let Some(catalog) = cache.current_catalog() {
                    self.ensure_tables(&catalog, &schema_use.schema).await;
                }
            }
        }
    }

    /// Fetch what a (partial) table reference could refer to. Ambiguous
    /// readings are all tried; the cache's existence checks discard the ones
    /// that do not resolve.
    async fn resolve_reference(&self, reference: TableReference) {
        match reference {
            TableReference::Bare(name) => {
                let as_table = async {
                    if let (Some(c), Some(s)) = self.load_current_context().await {
                        self.ensure_columns(&format!("{c}.{s}.{name}")).await;
                    }
                };
                let as_catalog = async {
                    self.ensure_schemas(&name).await;
                };
                let as_schema = async {
                    if let (Some(c), _) = self.load_current_context().await {
                        self.ensure_tables(&c, &name).await;
                    }
                };
                futures::join!(as_table, as_catalog, as_schema);
            }
            TableReference::Pair(first, second) => {
                let schema_table = async {
                    if let (Some(c), _) = self.load_current_context().await {
                        self.ensure_tables(&c, &first).await;
                        self.ensure_columns(&format!("{c}.{first}.{second}")).await;
                    }
                };
                let catalog_schema = async {
                    self.ensure_schemas(&first).await;
                    self.ensure_tables(&first, &second).await;
                };
                futures::join!(schema_table, catalog_schema);
            }
            TableReference::Qualified {
                catalog,
                schema,
                table,
            } => {
                self.ensure_schemas(&catalog).await;
                self.ensure_tables(&catalog, &schema).await;
                self.ensure_columns(&format!("{catalog}.{schema}.{table}"))
                    .await;
            }
        }
    }

    async fn ensure_catalogs(&self) -> FetchOutcome {
        let outcome = self.inner.cache.ensure_catalogs().await;
        self.rebuild_if_changed(outcome)
    }

    async fn ensure_schemas(&self, catalog: &str) -> FetchOutcome {
        let outcome = self.inner.cache.ensure_schemas(catalog).await;
        self.rebuild_if_changed(outcome)
    }

    async fn ensure_tables(&self, catalog: &str, schema: &str) -> FetchOutcome {
        let outcome = self.inner.cache.ensure_tables(catalog, schema).await;
        self.rebuild_if_changed(outcome)
    }

    async fn ensure_columns(&self, table: &str) -> FetchOutcome {
        let outcome = self.inner.cache.ensure_columns(table).await;
        self.rebuild_if_changed(outcome)
    }

    fn rebuild_if_changed(&self, outcome: FetchOutcome) -> FetchOutcome {
        if outcome.changed() {
            self.rebuild();
        }
        outcome
    }

    /// Recompute every clause list from the cache. The builder lock is held
    /// while the cache is read so concurrent rebuilds cannot publish stale
    /// snapshots out of order.
    fn rebuild(&self) {
        let mut builder = self.inner.builder.lock();
        let tables = self.inner.cache.table_suggestions();
        let columns = self.inner.cache.column_suggestions();
        builder.rebuild(&tables, &columns);
    }
}

/// Extract the word immediately before byte offset `offset` of `text`.
///
/// Scans backward to the word start. Word delimiters are whitespace and
/// `(),;=<>!+-*/'"`; dots stay inside the word so qualified names narrow
/// as a whole.
pub fn word_before_offset(text: &str, offset: usize) -> &str {
    let mut end = offset.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let start = text[..end]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace() || "(),;=<>!+-*/'\"".contains(*c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &text[start..end]
}

/// Keep the suggestions whose label extends `prefix` (case-insensitive).
/// Exact matches are dropped; an empty prefix keeps everything.
pub fn narrow(items: Vec<SuggestionItem>, prefix: &str) -> Vec<SuggestionItem> {
    if prefix.is_empty() {
        return items;
    }
    let prefix_lower = prefix.to_lowercase();
    items
        .into_iter()
        .filter(|item| {
            item.label.len() > prefix.len() && item.label.to_lowercase().starts_with(&prefix_lower)
        })
        .collect()
}
