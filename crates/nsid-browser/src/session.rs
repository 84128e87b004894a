use chrono::Utc;
use nsid_resolver::{LexiconPipeline, LexiconSchema, ResolveError, ResolvedRecord};
use nsid_tree::{build_tree, find_in, ExpansionState, FilterOptions, NodeAction, TreeNode};
use nsid_types::{CollectionRecord, RecordLocator, SchemaKeySet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::activity::{fill_daily_gaps, series_limit, DailyView, FeedRange, FeedServer};
use crate::config::{AppConfig, TreeConfig};
use crate::data_api::DataApiClient;
use crate::error::{BrowserError, BrowserResult};
use crate::generation::{Generation, Ticket};
use crate::preference::{PreferenceStore, Preferences};
use crate::summary::DashboardSummary;

/// Content of the detail pane opened from a record node
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Schema(LexiconSchema),
    Record(ResolvedRecord),
    Failed { subject: String, message: String },
}

/// Human-readable status for a failed schema or record lookup
pub fn describe_failure(error: &ResolveError) -> String {
    match error {
        ResolveError::NotFound(reason) => format!("Nothing found: {}", reason),
        ResolveError::InvalidEndpoint(reason) => format!("Invalid service endpoint: {}", reason),
        ResolveError::NetworkFailure(reason) => format!("Could not reach host: {}", reason),
        ResolveError::UnsupportedMethod(method) => format!("Can't resolve did:{} identifiers", method),
        other => other.to_string(),
    }
}

#[derive(Debug, Default)]
struct SessionState {
    collections: Vec<CollectionRecord>,
    schema_keys: SchemaKeySet,
    filters: FilterOptions,
    preferences: Preferences,
    tree: Vec<TreeNode>,
    expansion: ExpansionState,
    detail: Option<DetailView>,
}

impl SessionState {
    fn effective_filters(&self) -> FilterOptions {
        let mut filters = self.filters.clone();
        self.preferences.apply(&mut filters);
        filters
    }

    fn rebuild(&mut self) {
        self.tree = build_tree(&self.collections, &self.schema_keys, &self.effective_filters());
        self.expansion.retain_existing(&self.tree);
    }
}

/// Browser state over the data API and the resolution pipeline.
///
/// Loads and detail lookups each carry a generation ticket; a result whose
/// ticket was superseded is dropped instead of overwriting newer state.
pub struct BrowserSession {
    data_api: DataApiClient,
    pipeline: LexiconPipeline,
    preference_store: Arc<dyn PreferenceStore>,
    new_window_hours: i64,
    state: RwLock<SessionState>,
    load_generation: Generation,
    detail_generation: Generation,
}

impl BrowserSession {
    pub fn new(config: &AppConfig, preference_store: Arc<dyn PreferenceStore>) -> BrowserResult<Self> {
        let data_api = DataApiClient::new(&config.data_api)?;
        let pipeline = LexiconPipeline::new(&config.resolver)?;
        Self::from_parts(data_api, pipeline, preference_store, &config.tree)
    }

    pub fn from_parts(
        data_api: DataApiClient,
        pipeline: LexiconPipeline,
        preference_store: Arc<dyn PreferenceStore>,
        tree_config: &TreeConfig,
    ) -> BrowserResult<Self> {
        let preferences = preference_store.load()?;
        let filters = FilterOptions {
            allowed_tlds: tree_config.allow_list(),
            layout: tree_config.layout(),
            ..FilterOptions::default()
        };

        Ok(Self {
            data_api,
            pipeline,
            preference_store,
            new_window_hours: tree_config.new_window_hours,
            state: RwLock::new(SessionState {
                filters,
                preferences,
                ..SessionState::default()
            }),
            load_generation: Generation::new(),
            detail_generation: Generation::new(),
        })
    }

    pub fn data_api(&self) -> &DataApiClient {
        &self.data_api
    }

    pub fn pipeline(&self) -> &LexiconPipeline {
        &self.pipeline
    }

    /// Fetch collections and schema keys, replacing the previous list wholesale
    pub async fn reload(&self) -> BrowserResult<usize> {
        let ticket = self.load_generation.begin();
        info!("Loading collections");

        let (collections, schema_keys) = tokio::try_join!(
            self.data_api.list_collections(Utc::now(), self.new_window_hours),
            self.data_api.list_schema_keys(),
        )?;

        if !self.load_generation.is_current(ticket) {
            debug!("Discarding superseded collection load");
            return Err(BrowserError::Stale("collection load".to_string()));
        }

        let mut state = self.state.write().await;
        state.collections = collections;
        state.schema_keys = schema_keys;
        state.rebuild();
        info!(
            "Loaded {} collections and {} schema keys",
            state.collections.len(),
            state.schema_keys.len()
        );
        Ok(state.collections.len())
    }

    /// Replace the loaded data directly, bypassing the data API
    pub async fn replace_collections(&self, collections: Vec<CollectionRecord>, schema_keys: SchemaKeySet) {
        self.load_generation.invalidate();
        let mut state = self.state.write().await;
        state.collections = collections;
        state.schema_keys = schema_keys;
        state.rebuild();
    }

    pub async fn tree(&self) -> Vec<TreeNode> {
        self.state.read().await.tree.clone()
    }

    pub async fn collections(&self) -> Vec<CollectionRecord> {
        self.state.read().await.collections.clone()
    }

    pub async fn filters(&self) -> FilterOptions {
        self.state.read().await.effective_filters()
    }

    /// Change the filters and rebuild the tree
    pub async fn update_filters<F>(&self, update: F) -> Vec<TreeNode>
    where
        F: FnOnce(&mut FilterOptions),
    {
        let mut state = self.state.write().await;
        update(&mut state.filters);
        state.rebuild();
        state.tree.clone()
    }

    /// Drop search and date filters, keeping toggles and layout
    pub async fn clear_search(&self) -> Vec<TreeNode> {
        self.update_filters(|filters| {
            filters.search = None;
            filters.first_indexed = Default::default();
            filters.last_indexed = Default::default();
        })
        .await
    }

    pub async fn preferences(&self) -> Preferences {
        self.state.read().await.preferences
    }

    /// Persist new toggles and rebuild the tree with them
    pub async fn set_preferences(&self, preferences: Preferences) -> BrowserResult<()> {
        self.preference_store.save(&preferences)?;
        let mut state = self.state.write().await;
        state.preferences = preferences;
        state.rebuild();
        Ok(())
    }

    /// Headline numbers over the loaded collections, honouring the transaction toggle
    pub async fn summary(&self) -> DashboardSummary {
        let state = self.state.read().await;
        DashboardSummary::from_visible_records(
            &state.collections,
            state.preferences.except_collection_with_transaction,
        )
    }

    /// `summary` plus the indexer-wide numbers only the data API knows
    pub async fn dashboard(&self) -> BrowserResult<DashboardSummary> {
        let (unique_dids, cursor) = tokio::try_join!(
            self.data_api.unique_did_count(),
            self.data_api.indexer_cursor(),
        )?;

        let mut summary = self.summary().await.with_indexer_cursor(cursor, Utc::now());
        summary.unique_did_count = unique_dids;
        Ok(summary)
    }

    /// Feed generator servers active in `range`, largest first
    pub async fn feed_servers(&self, range: FeedRange) -> BrowserResult<Vec<FeedServer>> {
        self.data_api.feed_servers(range, Utc::now()).await
    }

    /// Daily counts of `view` from the oldest day to today, gaps filled with 0
    pub async fn daily_activity(&self, view: DailyView, days: u32) -> BrowserResult<Vec<u64>> {
        let rows = self.data_api.daily_series(view, series_limit(days)).await?;
        Ok(fill_daily_gaps(&rows))
    }

    /// Click a node by path: folders toggle, record leaves open their schema
    pub async fn click(&self, path: &str) -> BrowserResult<NodeAction> {
        let action = {
            let mut state = self.state.write().await;
            let SessionState { tree, expansion, .. } = &mut *state;
            let node = find_in(tree, path).ok_or_else(|| BrowserError::UnknownNode(path.to_string()))?;
            expansion.interact(node)
        };

        if let NodeAction::OpenDetail(collection) = &action {
            self.open_schema(collection).await?;
        }
        Ok(action)
    }

    pub async fn is_expanded(&self, path: &str) -> bool {
        let state = self.state.read().await;
        find_in(&state.tree, path).map_or(false, |node| state.expansion.is_expanded(node))
    }

    pub async fn expand_all(&self) {
        let mut state = self.state.write().await;
        let SessionState { tree, expansion, .. } = &mut *state;
        expansion.expand_all(tree);
    }

    pub async fn collapse_all(&self) {
        self.state.write().await.expansion.collapse_all();
    }

    pub async fn detail(&self) -> Option<DetailView> {
        self.state.read().await.detail.clone()
    }

    /// Close the detail pane and drop any lookup still in flight
    pub async fn close_detail(&self) {
        self.detail_generation.invalidate();
        self.state.write().await.detail = None;
    }

    /// Resolve and show the published schema of `nsid`
    pub async fn open_schema(&self, nsid: &str) -> BrowserResult<DetailView> {
        let ticket = self.detail_generation.begin();
        let view = match self.pipeline.fetch_schema(nsid).await {
            Ok(schema) => DetailView::Schema(schema),
            Err(e) => {
                warn!("No schema for {}: {}", nsid, e);
                DetailView::Failed {
                    subject: nsid.to_string(),
                    message: describe_failure(&e),
                }
            }
        };

        self.commit_detail(ticket, view).await
    }

    /// Resolve the owner's hosting service and show the record
    pub async fn open_record(&self, locator: &RecordLocator) -> BrowserResult<DetailView> {
        let ticket = self.detail_generation.begin();
        self.open_record_with(ticket, locator).await
    }

    async fn open_record_with(&self, ticket: Ticket, locator: &RecordLocator) -> BrowserResult<DetailView> {
        let view = match self.pipeline.fetch_locator(locator).await {
            Ok(record) => DetailView::Record(record),
            Err(e) => {
                warn!("No record at {}: {}", locator, e);
                DetailView::Failed {
                    subject: locator.to_string(),
                    message: describe_failure(&e),
                }
            }
        };

        self.commit_detail(ticket, view).await
    }

    /// Show the most recently indexed record of `collection`
    pub async fn open_latest_record(&self, collection: &str) -> BrowserResult<DetailView> {
        let ticket = self.detail_generation.begin();
        let latest = self.data_api.latest_record(collection).await;

        if !self.detail_generation.is_current(ticket) {
            debug!("Discarding superseded latest-record lookup for {}", collection);
            return Err(BrowserError::Stale("detail lookup".to_string()));
        }

        match latest? {
            Some(locator) => self.open_record_with(ticket, &locator).await,
            None => {
                let view = DetailView::Failed {
                    subject: collection.to_string(),
                    message: format!("No indexed record in {}", collection),
                };
                self.commit_detail(ticket, view).await
            }
        }
    }

    async fn commit_detail(&self, ticket: Ticket, view: DetailView) -> BrowserResult<DetailView> {
        let mut state = self.state.write().await;
        if !self.detail_generation.is_current(ticket) {
            debug!("Discarding superseded detail lookup");
            return Err(BrowserError::Stale("detail lookup".to_string()));
        }
        state.detail = Some(view.clone());
        Ok(view)
    }
}
