//! # Engine Facade
//!
//! [`CardEngine`] is the single owned application-state object. Every UI
//! (the CLI, a desktop shell, tests) drives the same engine and reads the same
//! derived views.
//!
//! ## What It Owns
//!
//! - **Source state**: the [`CardIndex`], the [`Selection`], the current
//!   [`CardQuery`], viewport width, the tag disclosure flag, settings and
//!   recent-directory history.
//! - **Scan bookkeeping**: a [`ScanTracker`] and the last scan error.
//! - **Derived views**: visible cards, column layout and tag summary, each
//!   memoized on the exact tuple of inputs it reads.
//!
//! ## What It Does NOT Do
//!
//! - **Run scans**: opening a directory returns a [`ScanRequest`]. The host
//!   runs it however it likes (inline via [`CardEngine::run_scan`], or on a
//!   worker thread) and feeds the events back through
//!   [`CardEngine::handle_scan_event`].
//! - **Touch the filesystem**: documents go through the [`CardService`],
//!   persisted state through the [`StateBackend`].
//!
//! ## Initialization Order
//!
//! [`CardEngine::init`] loads settings, then recent directories, then the last
//! directory. If a last directory exists, the initial scan request is returned
//! (scan depth already comes from the loaded settings).
//!
//! ## Change Notification
//!
//! Every mutating call refreshes the derived views first and then tells each
//! subscribed listener what changed via a [`Change`]. Listeners observe a
//! consistent engine: the index, selection and views have all been updated by
//! the time they run.
//!
//! ## Generic Over Collaborators
//!
//! `CardEngine<S: CardService, B: StateBackend>`:
//! - Production: `CardEngine<FsCardService, FsStateBackend>`
//! - Testing: `CardEngine<MemCardService, MemStateBackend>`

use crate::config::EngineConfig;
use crate::error::{CardError, Result};
use crate::index::CardIndex;
use crate::layout::{self, ColumnLayout};
use crate::memo::Memo;
use crate::model::{CardMeta, SortKey, SortOrder};
use crate::query::{self, CardQuery};
use crate::recent::RecentDirectories;
use crate::scan::{ScanEvent, ScanOutcome, ScanRequest, ScanState, ScanTracker};
use crate::selection::Selection;
use crate::service::CardService;
use crate::settings::{DisplaySettings, SettingsPatch, SettingsStore};
use crate::store::{self, StateBackend};
use crate::tags::{self, TagSummary};
use log::{debug, info, warn};

/// Default viewport width before the host reports a real one.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1200;

/// What a mutation touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    ScanStarted(ScanRequest),
    ScanFinished { total: usize },
    ScanFailed(String),
    Index,
    Query,
    Viewport,
    Selection,
    Settings,
    Recent,
}

/// How many times each derived view actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewStats {
    pub visible: u64,
    pub layout: u64,
    pub tags: u64,
}

type Listener = Box<dyn FnMut(&Change)>;
type VisibleKey = (u64, CardQuery);

pub struct CardEngine<S: CardService, B: StateBackend> {
    service: S,
    backend: B,
    config: EngineConfig,
    settings: SettingsStore,
    recent: RecentDirectories,
    index: CardIndex,
    selection: Selection,
    query: CardQuery,
    viewport_width: u32,
    tags_expanded: bool,
    tracker: ScanTracker,
    last_scan_error: Option<String>,
    visible: Memo<VisibleKey, Vec<CardMeta>>,
    layout: Memo<(VisibleKey, usize, u32), ColumnLayout>,
    tag_summary: Memo<u64, TagSummary>,
    listeners: Vec<Listener>,
}

impl<S: CardService, B: StateBackend> CardEngine<S, B> {
    /// Builds the engine and, if a last directory was persisted, the request
    /// for its initial scan.
    pub fn init(service: S, backend: B, config: EngineConfig) -> (Self, Option<ScanRequest>) {
        let settings = SettingsStore::load(&backend);
        let recent = RecentDirectories::load(&backend, config.recent_limit);
        let last_directory = store::load_last_directory(&backend);

        let mut engine = Self {
            service,
            backend,
            config,
            settings,
            recent,
            index: CardIndex::new(),
            selection: Selection::default(),
            query: CardQuery::default(),
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            tags_expanded: false,
            tracker: ScanTracker::new(),
            last_scan_error: None,
            visible: Memo::new(),
            layout: Memo::new(),
            tag_summary: Memo::new(),
            listeners: Vec::new(),
        };

        let request = last_directory.map(|dir| {
            info!("Resuming last directory {}", dir);
            engine.begin_scan(&dir)
        });
        engine.refresh();
        (engine, request)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Change) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn refresh(&mut self) {
        self.layout();
        self.tag_summary();
    }

    fn commit(&mut self, change: Change) {
        self.refresh();
        for listener in self.listeners.iter_mut() {
            listener(&change);
        }
    }

    // --- Directories and scans ---

    fn begin_scan(&mut self, dir: &str) -> ScanRequest {
        self.index.clear();
        self.selection.clear();
        self.last_scan_error = None;
        let request = self.tracker.begin(dir, self.settings.current().scan_depth);
        debug!("Scan requested: {:?}", request);
        request
    }

    /// Makes `dir` the active directory: records it in history, persists it as
    /// the last directory, clears the index and returns the scan to run.
    /// Listeners see `ScanStarted` followed by `Recent`.
    pub fn open_directory(&mut self, dir: &str) -> ScanRequest {
        info!("Opening directory {}", dir);
        self.recent.open(&self.backend, dir);
        store::save_last_directory(&self.backend, dir);
        let request = self.begin_scan(dir);
        self.commit(Change::ScanStarted(request.clone()));
        self.commit(Change::Recent);
        request
    }

    /// Opens the `position`-th entry of the recent-directory history.
    pub fn open_recent(&mut self, position: usize) -> Option<ScanRequest> {
        let dir = self.recent.entries().get(position).cloned()?;
        Some(self.open_directory(&dir))
    }

    /// Rescans the active directory from scratch.
    pub fn reload(&mut self) -> Option<ScanRequest> {
        let dir = self.tracker.current_dir()?.to_string();
        let request = self.begin_scan(&dir);
        self.commit(Change::ScanStarted(request.clone()));
        Some(request)
    }

    /// Applies one event from a running scan. Events from any generation
    /// other than the one currently awaited are dropped.
    pub fn handle_scan_event(&mut self, event: ScanEvent) -> ScanOutcome {
        let generation = event.generation();
        if !self.tracker.is_current(generation) {
            debug!(
                "Dropping stale scan event {} (latest is {})",
                generation,
                self.tracker.last_generation()
            );
            return ScanOutcome::Stale;
        }

        match event {
            ScanEvent::Batch { cards, .. } => {
                let absorbed = cards.len();
                self.index.add_or_replace(cards);
                debug!("Absorbed {} cards ({} total)", absorbed, self.index.len());
                self.commit(Change::Index);
                ScanOutcome::Absorbed(absorbed)
            }
            ScanEvent::Complete {
                total, duration_ms, ..
            } => {
                self.tracker.finish(generation);
                info!("Loaded {} cards in {}ms", total, duration_ms);
                self.commit(Change::ScanFinished { total });
                ScanOutcome::Completed { total }
            }
            ScanEvent::Failed { error, .. } => {
                self.tracker.finish(generation);
                self.index.clear();
                self.selection.clear();
                warn!("Scan failed: {}", error);
                self.last_scan_error = Some(error.clone());
                self.commit(Change::ScanFailed(error.clone()));
                ScanOutcome::Failed(error)
            }
        }
    }

    /// Runs `request` synchronously through the service and applies every
    /// event. Returns the outcome of the terminal event.
    pub fn run_scan(&mut self, request: &ScanRequest) -> ScanOutcome {
        let mut events = Vec::new();
        self.service.scan(request, &mut |event| events.push(event));
        let mut outcome = ScanOutcome::Stale;
        for event in events {
            outcome = self.handle_scan_event(event);
        }
        outcome
    }

    pub fn scan_state(&self) -> &ScanState {
        self.tracker.state()
    }

    pub fn is_scanning(&self) -> bool {
        self.tracker.is_scanning()
    }

    pub fn current_dir(&self) -> Option<&str> {
        self.tracker.current_dir()
    }

    pub fn last_scan_error(&self) -> Option<&str> {
        self.last_scan_error.as_deref()
    }

    // --- Index ---

    pub fn add_cards(&mut self, cards: Vec<CardMeta>) {
        self.index.add_or_replace(cards);
        self.commit(Change::Index);
    }

    pub fn update_card(&mut self, card: CardMeta) {
        self.index.update(card);
        self.commit(Change::Index);
    }

    /// Removes a card from the index, clearing the selection if it pointed
    /// at that card.
    pub fn remove_card(&mut self, path: &str) -> bool {
        let removed = self.index.remove(path);
        if self.selection.is(path) {
            self.selection.clear();
        }
        self.commit(Change::Index);
        removed
    }

    pub fn clear_cards(&mut self) {
        self.index.clear();
        self.selection.clear();
        self.commit(Change::Index);
    }

    pub fn index(&self) -> &CardIndex {
        &self.index
    }

    // --- Query and view ---

    pub fn query(&self) -> &CardQuery {
        &self.query
    }

    pub fn set_search(&mut self, text: &str) {
        self.query.search = text.to_string();
        self.commit(Change::Query);
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        self.query.toggle_tag(tag);
        self.commit(Change::Query);
    }

    pub fn set_selected_tags<I, T>(&mut self, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.query.tags.clear();
        for tag in tags {
            let tag = tag.into();
            if !self.query.tags.contains(&tag) {
                self.query.tags.push(tag);
            }
        }
        self.commit(Change::Query);
    }

    pub fn clear_filters(&mut self) {
        self.query.search.clear();
        self.query.tags.clear();
        self.commit(Change::Query);
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.query.sort_key = key;
        self.commit(Change::Query);
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.query.sort_order = order;
        self.commit(Change::Query);
    }

    pub fn toggle_sort_order(&mut self) {
        self.query.sort_order = self.query.sort_order.toggled();
        self.commit(Change::Query);
    }

    pub fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    pub fn set_viewport_width(&mut self, width: u32) {
        self.viewport_width = width;
        self.commit(Change::Viewport);
    }

    pub fn tags_expanded(&self) -> bool {
        self.tags_expanded
    }

    pub fn set_tags_expanded(&mut self, expanded: bool) {
        self.tags_expanded = expanded;
        self.commit(Change::Query);
    }

    /// Filtered and sorted cards for the current query.
    pub fn visible_cards(&mut self) -> &[CardMeta] {
        let key = (self.index.revision(), self.query.clone());
        let index = &self.index;
        let query = &self.query;
        self.visible
            .get_or_compute(key, || query::visible_cards(index, query))
    }

    /// Visible cards dealt into columns for the current viewport and card width.
    pub fn layout(&mut self) -> &ColumnLayout {
        let card_width = self.settings.current().card_width;
        let gap = self.config.column_gap;
        let viewport = self.viewport_width;
        let columns = layout::column_count(viewport, card_width, gap);

        let key = (self.index.revision(), self.query.clone());
        let index = &self.index;
        let query = &self.query;
        let visible = self
            .visible
            .get_or_compute(key.clone(), || query::visible_cards(index, query));
        self.layout.get_or_compute((key, columns, card_width), || {
            ColumnLayout::compute(visible, viewport, card_width, gap)
        })
    }

    /// Tag counts over the whole index, split into featured and extra.
    pub fn tag_summary(&mut self) -> &TagSummary {
        let index = &self.index;
        let limit = self.config.featured_tag_limit;
        let min_count = self.config.min_tag_count;
        self.tag_summary.get_or_compute(index.revision(), || {
            tags::summarize(index, limit, min_count)
        })
    }

    pub fn view_stats(&self) -> ViewStats {
        ViewStats {
            visible: self.visible.computations(),
            layout: self.layout.computations(),
            tags: self.tag_summary.computations(),
        }
    }

    // --- Selection and editing ---

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The selected card, if it is still indexed.
    pub fn selected_card(&self) -> Option<&CardMeta> {
        self.selection.selected_in(&self.index)
    }

    /// Selects `path` and loads its content. Only indexed cards can be
    /// selected. On a failed load the selection is kept without content and
    /// the error is returned.
    pub fn select_card(&mut self, path: &str) -> Result<()> {
        if !self.index.contains(path) {
            return Err(CardError::NotFound(path.to_string()));
        }
        self.selection.select(path);
        let loaded = self.service.read_content(path);
        let result = match loaded {
            Ok(content) => {
                self.selection.set_content(content);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path, e);
                Err(e)
            }
        };
        self.commit(Change::Selection);
        result
    }

    pub fn close_selection(&mut self) {
        self.selection.clear();
        self.commit(Change::Selection);
    }

    pub fn begin_edit(&mut self) -> bool {
        if self.selected_card().is_none() {
            return false;
        }
        let started = self.selection.begin_edit();
        self.commit(Change::Selection);
        started
    }

    pub fn set_draft(&mut self, text: &str) {
        self.selection.set_draft(text);
        self.commit(Change::Selection);
    }

    pub fn cancel_edit(&mut self) {
        self.selection.cancel_edit();
        self.commit(Change::Selection);
    }

    /// Writes the draft of the selected card and re-indexes it.
    pub fn save_edit(&mut self) -> Result<CardMeta> {
        let path = self
            .selected_card()
            .map(|card| card.path.clone())
            .ok_or_else(|| CardError::Service("No card is selected".to_string()))?;
        if !self.selection.is_editing() {
            return Err(CardError::Service(format!("{} is not being edited", path)));
        }
        let card = self.service.write_content(&path, self.selection.draft())?;
        self.index.update(card.clone());
        self.selection.commit_edit();
        self.commit(Change::Index);
        Ok(card)
    }

    // --- Documents ---

    /// Deletes a document and drops it from the index. A document that is
    /// already gone counts as deleted.
    pub fn delete_card(&mut self, path: &str) -> Result<()> {
        match self.service.delete_document(path) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => debug!("{} was already deleted", path),
            Err(e) => return Err(e),
        }
        self.index.remove(path);
        if self.selection.is(path) {
            self.selection.clear();
        }
        self.commit(Change::Index);
        Ok(())
    }

    /// Deletes the selected card. Returns its path, or `None` with nothing selected.
    pub fn delete_selected(&mut self) -> Result<Option<String>> {
        let Some(path) = self.selected_card().map(|card| card.path.clone()) else {
            return Ok(None);
        };
        self.delete_card(&path)?;
        Ok(Some(path))
    }

    /// Creates a document in the active directory and indexes it.
    pub fn create_card(&mut self, filename: &str) -> Result<CardMeta> {
        let dir = self
            .current_dir()
            .map(str::to_string)
            .ok_or(CardError::NoDirectory)?;
        let card = self.service.create_document(&dir, filename)?;
        info!("Created {}", card.path);
        self.index.update(card.clone());
        self.commit(Change::Index);
        Ok(card)
    }

    // --- Settings and history ---

    pub fn settings(&self) -> &DisplaySettings {
        self.settings.current()
    }

    /// Merges and persists `patch`. A patch that names the scan depth also
    /// reloads the active directory and returns that scan request.
    pub fn patch_settings(&mut self, patch: &SettingsPatch) -> (DisplaySettings, Option<ScanRequest>) {
        let settings = self.settings.patch(&self.backend, patch);
        let request = if patch.touches_scan_depth() {
            self.reload()
        } else {
            None
        };
        self.commit(Change::Settings);
        (settings, request)
    }

    /// Restores default settings. Reloads only if the scan depth changed.
    pub fn reset_settings(&mut self) -> (DisplaySettings, Option<ScanRequest>) {
        let previous_depth = self.settings.current().scan_depth;
        let settings = self.settings.reset(&self.backend);
        let request = if settings.scan_depth != previous_depth {
            self.reload()
        } else {
            None
        };
        self.commit(Change::Settings);
        (settings, request)
    }

    pub fn recent_directories(&self) -> &[String] {
        self.recent.entries()
    }

    pub fn clear_recent(&mut self) {
        self.recent.clear(&self.backend);
        self.commit(Change::Recent);
    }

    // --- Collaborators ---

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
