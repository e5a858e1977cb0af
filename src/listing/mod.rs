/// Category-filtered content listings
///
/// A `FilteredListView` fetches one collection from the content store, derives
/// the category set from what came back and serves the subset matching the
/// selected category. Projects and skills each get their own instance; the
/// project listing delays the re-render after a filter change so the card
/// transition can play.
///
/// Load lifecycle: `Idle -> Loading -> {Success, Error}`, `Error -> Loading`
/// via `retry`. Category selection only exists inside `Success`.

pub mod cards;
pub mod categories;

pub use cards::{ProjectCard, SkillCard, PREVIEW_PLACEHOLDER};
pub use categories::{derive_categories, filter_records, render_keys, ALL_CATEGORY};

use crate::{
    content::{AssetUrlResolver, ContentClient, DocumentQuery, SortDirection},
    metrics,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use thiserror::Error;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, warn};

/// A record type a listing can hold
pub trait ListRecord: DeserializeOwned + Clone + Send + Sync + 'static {
    type Card: Serialize + Send;

    /// Prefix for positional render keys
    const KEY_PREFIX: &'static str;

    fn record_id(&self) -> Option<&str>;

    /// Category labels; empty when uncategorized
    fn labels(&self) -> Vec<&str>;

    fn has_label(&self, label: &str) -> bool {
        self.labels().iter().any(|candidate| *candidate == label)
    }

    fn to_card(&self, key: String, assets: &AssetUrlResolver) -> Self::Card;
}

/// Load lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListPhase {
    Idle,
    Loading,
    Success,
    Error,
}

impl std::fmt::Display for ListPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ListPhase::Idle => "idle",
            ListPhase::Loading => "loading",
            ListPhase::Success => "success",
            ListPhase::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ListError {
    #[error("retry is only available after a failed load (listing is {0})")]
    RetryUnavailable(ListPhase),
}

/// Result of a category selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectOutcome {
    /// Category was already selected; nothing changed
    Unchanged,
    /// Displayed set recomputed immediately
    Applied,
    /// Displayed set cleared; recomputed after the transition delay
    Scheduled,
    /// Listing has no records loaded yet
    NotReady,
}

/// User-facing copy for a listing
#[derive(Debug, Clone)]
pub struct SectionCopy {
    pub loading_heading: String,
    pub error_message: String,
    pub empty_all: String,
    /// `{category}` is replaced with the selected category
    pub empty_filtered: String,
}

impl SectionCopy {
    fn empty_message(&self, selected: &str) -> String {
        if selected == ALL_CATEGORY {
            self.empty_all.clone()
        } else {
            self.empty_filtered.replace("{category}", selected)
        }
    }
}

/// Per-instance listing settings
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Metrics/log label
    pub collection: &'static str,
    pub query: String,
    pub transition_delay: Duration,
    pub copy: SectionCopy,
}

impl ListOptions {
    pub fn projects(transition_delay: Duration) -> Self {
        Self {
            collection: "projects",
            query: DocumentQuery::of_type("project")
                .order_by("_createdAt", SortDirection::Desc)
                .project([
                    "_id",
                    "title",
                    "description",
                    "projectLink",
                    "codeLink",
                    "imgUrl",
                    "tags",
                ])
                .to_string(),
            transition_delay,
            copy: SectionCopy {
                loading_heading: "Curating Projects...".to_string(),
                error_message: "Unable to retrieve projects. Please refresh and try again."
                    .to_string(),
                empty_all: "No projects available at the moment".to_string(),
                empty_filtered: "No projects match \"{category}\" category".to_string(),
            },
        }
    }

    pub fn skills(transition_delay: Duration) -> Self {
        Self {
            collection: "skills",
            query: DocumentQuery::of_type("skills")
                .order_by("name", SortDirection::Asc)
                .to_string(),
            transition_delay,
            copy: SectionCopy {
                loading_heading: "Loading Technical Skills...".to_string(),
                error_message: "Failed to load skills".to_string(),
                empty_all: "No skills found for the selected category.".to_string(),
                empty_filtered: "No skills found for the selected category.".to_string(),
            },
        }
    }
}

/// Serializable view of a listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSnapshot<C> {
    pub collection: &'static str,
    pub phase: ListPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub can_retry: bool,
    pub categories: Vec<String>,
    pub selected_category: String,
    pub transitioning: bool,
    pub items: Vec<C>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

struct ListState<R> {
    phase: ListPhase,
    error: Option<String>,
    records: Vec<R>,
    categories: Vec<String>,
    selected: String,
    displayed: Vec<R>,
    transitioning: bool,
    load_generation: u64,
    transition_generation: u64,
    pending_transition: Option<JoinHandle<()>>,
}

impl<R: ListRecord> ListState<R> {
    fn new() -> Self {
        Self {
            phase: ListPhase::Idle,
            error: None,
            records: Vec::new(),
            categories: vec![ALL_CATEGORY.to_string()],
            selected: ALL_CATEGORY.to_string(),
            displayed: Vec::new(),
            transitioning: false,
            load_generation: 0,
            transition_generation: 0,
            pending_transition: None,
        }
    }

    /// Enter `Loading` and return the generation the new fetch belongs to
    fn begin_load(&mut self) -> u64 {
        self.load_generation += 1;
        self.phase = ListPhase::Loading;
        self.error = None;
        self.cancel_transition();
        self.load_generation
    }

    fn cancel_transition(&mut self) {
        self.transition_generation += 1;
        if let Some(handle) = self.pending_transition.take() {
            handle.abort();
        }
        self.transitioning = false;
    }
}

/// Fetch-once, filter-client-side listing of one collection
pub struct FilteredListView<R: ListRecord> {
    client: Arc<dyn ContentClient>,
    assets: AssetUrlResolver,
    options: ListOptions,
    state: Arc<Mutex<ListState<R>>>,
}

impl<R: ListRecord> FilteredListView<R> {
    pub fn new(client: Arc<dyn ContentClient>, assets: AssetUrlResolver, options: ListOptions) -> Self {
        Self {
            client,
            assets,
            options,
            state: Arc::new(Mutex::new(ListState::new())),
        }
    }

    pub fn collection(&self) -> &'static str {
        self.options.collection
    }

    /// Fetch the collection once and replace the listing's records
    ///
    /// Issues exactly one fetch. When loads overlap, only the most recently
    /// started one is applied.
    pub async fn load(&self) -> ListPhase {
        let generation = self.state.lock().await.begin_load();
        self.run_load(generation).await
    }

    /// Start the first load, unless something already started one
    pub async fn load_if_idle(&self) -> Option<ListPhase> {
        let generation = {
            let mut state = self.state.lock().await;
            if state.phase != ListPhase::Idle {
                return None;
            }
            state.begin_load()
        };
        Some(self.run_load(generation).await)
    }

    /// Reload after a failed (or never started) load
    ///
    /// The phase check and the switch to `Loading` happen under one lock, so
    /// of several concurrent retries only the first one fetches.
    pub async fn retry(&self) -> Result<ListPhase, ListError> {
        let generation = {
            let mut state = self.state.lock().await;
            if !matches!(state.phase, ListPhase::Error | ListPhase::Idle) {
                return Err(ListError::RetryUnavailable(state.phase));
            }
            state.begin_load()
        };
        Ok(self.run_load(generation).await)
    }

    async fn run_load(&self, generation: u64) -> ListPhase {
        debug!(collection = self.options.collection, generation, "loading listing");
        let started = Instant::now();
        let result = self.client.fetch(&self.options.query).await;
        metrics::record_content_fetch(
            self.options.collection,
            result.is_ok(),
            started.elapsed().as_secs_f64(),
        );

        let mut state = self.state.lock().await;
        if state.load_generation != generation {
            debug!(
                collection = self.options.collection,
                generation,
                latest = state.load_generation,
                "discarding superseded load"
            );
            return state.phase;
        }

        match result {
            Ok(documents) => {
                let records = decode_records::<R>(self.options.collection, documents);
                debug!(
                    collection = self.options.collection,
                    count = records.len(),
                    backend = self.client.backend_tag(),
                    "listing loaded"
                );
                state.categories = derive_categories(&records);
                state.displayed = records.clone();
                state.records = records;
                state.selected = ALL_CATEGORY.to_string();
                state.phase = ListPhase::Success;
            }
            Err(e) => {
                error!(
                    collection = self.options.collection,
                    backend = self.client.backend_tag(),
                    error = %e,
                    "listing fetch failed"
                );
                state.records.clear();
                state.displayed.clear();
                state.categories = vec![ALL_CATEGORY.to_string()];
                state.selected = ALL_CATEGORY.to_string();
                state.error = Some(self.options.copy.error_message.clone());
                state.phase = ListPhase::Error;
            }
        }

        state.phase
    }

    /// Change the selected category
    ///
    /// Selecting the current category does nothing. Otherwise the selection
    /// changes at once and the displayed set is recomputed after the
    /// transition delay; a newer selection supersedes a pending one.
    pub async fn select_category(&self, category: &str) -> SelectOutcome {
        let mut state = self.state.lock().await;

        if state.phase != ListPhase::Success {
            return SelectOutcome::NotReady;
        }
        if state.selected == category {
            return SelectOutcome::Unchanged;
        }

        metrics::record_category_selection(self.options.collection);
        state.cancel_transition();
        state.selected = category.to_string();

        if self.options.transition_delay.is_zero() {
            state.displayed = filter_records(&state.records, category);
            return SelectOutcome::Applied;
        }

        state.displayed.clear();
        state.transitioning = true;

        let generation = state.transition_generation;
        let delay = self.options.transition_delay;
        let weak = Arc::downgrade(&self.state);
        state.pending_transition = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // View dropped while the timer was pending
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut state = shared.lock().await;
            if state.transition_generation != generation {
                return;
            }
            let displayed = filter_records(&state.records, &state.selected);
            state.displayed = displayed;
            state.transitioning = false;
            state.pending_transition = None;
        }));

        SelectOutcome::Scheduled
    }

    /// Derived category set, `"All"` first
    pub async fn categories(&self) -> Vec<String> {
        self.state.lock().await.categories.clone()
    }

    pub async fn phase(&self) -> ListPhase {
        self.state.lock().await.phase
    }

    pub async fn selected_category(&self) -> String {
        self.state.lock().await.selected.clone()
    }

    /// Records currently on screen
    pub async fn displayed(&self) -> Vec<R> {
        self.state.lock().await.displayed.clone()
    }

    /// Abort a pending category transition, leaving the displayed set as is
    pub async fn cancel_pending_transition(&self) {
        self.state.lock().await.cancel_transition();
    }

    pub async fn snapshot(&self) -> ListSnapshot<R::Card> {
        let state = self.state.lock().await;
        let copy = &self.options.copy;

        let items = if state.phase == ListPhase::Success {
            render_keys(&state.displayed)
                .into_iter()
                .zip(state.displayed.iter())
                .map(|(key, record)| record.to_card(key, &self.assets))
                .collect()
        } else {
            Vec::new()
        };

        let empty_message = (state.phase == ListPhase::Success
            && !state.transitioning
            && state.displayed.is_empty())
        .then(|| copy.empty_message(&state.selected));

        ListSnapshot {
            collection: self.options.collection,
            phase: state.phase,
            heading: (state.phase == ListPhase::Loading).then(|| copy.loading_heading.clone()),
            error: state.error.clone(),
            can_retry: state.phase == ListPhase::Error,
            categories: state.categories.clone(),
            selected_category: state.selected.clone(),
            transitioning: state.transitioning,
            items,
            empty_message,
        }
    }
}

impl<R: ListRecord> Drop for FilteredListView<R> {
    fn drop(&mut self) {
        // Contended lock: the timer still holds only a weak reference and
        // finds the view gone.
        if let Ok(mut state) = self.state.try_lock() {
            if let Some(handle) = state.pending_transition.take() {
                handle.abort();
            }
        }
    }
}

/// Decode store documents, skipping ones that do not fit the record shape
fn decode_records<R: ListRecord>(collection: &str, documents: Vec<Value>) -> Vec<R> {
    documents
        .into_iter()
        .enumerate()
        .filter_map(|(index, document)| match serde_json::from_value::<R>(document) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(collection, index, error = %e, "skipping malformed document");
                None
            }
        })
        .collect()
}
