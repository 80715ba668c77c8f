//! Per-instance orchestration of engine, filter, persistence and menus.

use std::sync::{Arc, RwLock};

use crate::column::{ColumnSpec, validate_columns};
use crate::context_menu::{
    ContextMenuActionEvent, ContextMenuController, ContextMenuItem, MenuClick, MenuPosition,
    MenuSize, MenuState, Viewport,
};
use crate::engine::GridEngine;
use crate::error::TableError;
use crate::export::{export_file_name, export_rows};
use crate::filter::{FuzzyFilterPredicate, FuzzyMatcher, NucleoMatcher};
use crate::search::{Navigator, SearchChannel, Subscription, sync_search_param};
use crate::store::{MemoryStore, ViewStateStore};
use crate::view_state::{ViewState, ViewStatePersistence};

/// Default popup dimensions used until the adapter measures the real
/// menu.
const DEFAULT_MENU_SIZE: MenuSize = MenuSize {
    width: 300,
    height: 200,
};

const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 1920,
    height: 1080,
};

type ActionSink<T> = Arc<dyn Fn(ContextMenuActionEvent<T>) + Send + Sync>;

struct TableInner<T> {
    query: String,
    visible_ids: Vec<String>,
    persistence: ViewStatePersistence,
    navigator: Option<Arc<dyn Navigator>>,
    channel: Option<SearchChannel>,
    on_action: Option<ActionSink<T>>,
    menu: ContextMenuController<T>,
    ready: bool,
    /// A search publish arrived before the engine was ready; run the
    /// deferred filter pass at ready time.
    pending_publish: bool,
}

/// One table instance: wires a grid engine, a fuzzy matcher, a view
/// state store and a search channel together.
///
/// Construction is chainable: [`TableCore::new`] then `with_*` for the
/// optional collaborators. Dropping the core releases its search
/// channel subscription.
pub struct TableCore<T: Clone + Send + Sync + 'static> {
    inner: Arc<RwLock<TableInner<T>>>,
    engine: Arc<dyn GridEngine<T>>,
    predicate: FuzzyFilterPredicate<T>,
    subscription: Option<Subscription>,
}

impl<T: Clone + Send + Sync + 'static> TableCore<T> {
    /// Create a table core with the default nucleo-backed matcher.
    pub fn new(engine: Arc<dyn GridEngine<T>>, columns: Vec<ColumnSpec<T>>) -> Self {
        Self::with_matcher(engine, columns, Arc::new(NucleoMatcher::new()))
    }

    /// Create a table core with an explicit matcher.
    pub fn with_matcher(
        engine: Arc<dyn GridEngine<T>>,
        columns: Vec<ColumnSpec<T>>,
        matcher: Arc<dyn FuzzyMatcher>,
    ) -> Self {
        let descriptors: Vec<_> = columns.iter().map(|c| c.descriptor.clone()).collect();
        validate_columns(&descriptors);

        let mut visible: Vec<_> = descriptors.iter().filter(|c| c.visible).collect();
        visible.sort_by_key(|c| c.order);
        let visible_ids = visible.into_iter().map(|c| c.id.clone()).collect();

        let predicate = FuzzyFilterPredicate::new(columns, matcher);
        let inner = Arc::new(RwLock::new(TableInner {
            query: String::new(),
            visible_ids,
            persistence: ViewStatePersistence::new(Arc::new(MemoryStore::new()), None),
            navigator: None,
            channel: None,
            on_action: None,
            menu: ContextMenuController::new(DEFAULT_VIEWPORT, DEFAULT_MENU_SIZE),
            ready: false,
            pending_publish: false,
        }));

        let engine_predicate = predicate.clone();
        let engine_inner = Arc::clone(&inner);
        engine.set_filter_predicate(Box::new(move |row| {
            let (query, visible) = engine_inner
                .read()
                .map(|g| (g.query.clone(), g.visible_ids.clone()))
                .unwrap_or_default();
            engine_predicate.matches(row, &visible, &query)
        }));

        Self {
            inner,
            engine,
            predicate,
            subscription: None,
        }
    }

    /// Persist view state under `context` in the given store.
    pub fn with_store(self, store: Arc<dyn ViewStateStore>, context: impl Into<String>) -> Self {
        if let Ok(mut guard) = self.inner.write() {
            guard.persistence = ViewStatePersistence::new(store, Some(context.into()));
        }
        self
    }

    /// Mirror search publishes into the page URL through `navigator`.
    pub fn with_navigator(self, navigator: Arc<dyn Navigator>) -> Self {
        if let Ok(mut guard) = self.inner.write() {
            guard.navigator = Some(navigator);
        }
        self
    }

    /// Popup clamping geometry.
    pub fn with_menu_layout(self, viewport: Viewport, menu_size: MenuSize) -> Self {
        if let Ok(mut guard) = self.inner.write() {
            guard.menu = ContextMenuController::new(viewport, menu_size);
        }
        self
    }

    /// Receive dispatched context-menu action events.
    pub fn on_action(self, f: impl Fn(ContextMenuActionEvent<T>) + Send + Sync + 'static) -> Self {
        if let Ok(mut guard) = self.inner.write() {
            guard.on_action = Some(Arc::new(f));
        }
        self
    }

    /// Subscribe to a search channel. The current channel value, if
    /// any, is applied immediately; afterwards every publish causes
    /// exactly one re-filter pass.
    pub fn attach_search(mut self, channel: &SearchChannel) -> Self {
        if let Ok(mut guard) = self.inner.write() {
            guard.channel = Some(channel.clone());
        }
        let inner = Arc::clone(&self.inner);
        let engine = Arc::clone(&self.engine);
        self.subscription =
            Some(channel.subscribe(move |query| Self::apply_query(&inner, &engine, query)));
        if let Some(latest) = channel.latest() {
            Self::apply_query(&self.inner, &self.engine, &latest);
        }
        self
    }

    // -------------------------------------------------------------------------
    // Engine lifecycle
    // -------------------------------------------------------------------------

    /// The engine signalled readiness. Applies persisted view state (or
    /// auto-sizes once without a context) and runs any filter pass that
    /// was deferred while the engine was still wiring up. Tolerates the
    /// signal arriving before or after the rest of the wiring; repeat
    /// signals are ignored.
    pub fn engine_ready(&self) {
        let first = self
            .inner
            .write()
            .map(|mut g| !std::mem::replace(&mut g.ready, true))
            .unwrap_or(false);
        if !first {
            return;
        }

        let Ok(persistence) = self.inner.read().map(|g| g.persistence.clone()) else {
            return;
        };

        // Wire the predicate before any restoration so a republished
        // query filters against real state, not the pass-all stub.
        let deferred = self.predicate.mark_wired();

        let mut republished = false;
        if persistence.has_context() {
            if let Some(state) = persistence.load() {
                self.restore_layout(&persistence, &state);
                republished = self.restore_query(&state);
            }
        } else {
            // Session-only tables size to the viewport exactly once.
            self.engine.auto_size_columns();
        }

        let pending = self
            .inner
            .write()
            .map(|mut g| std::mem::take(&mut g.pending_publish))
            .unwrap_or(false);

        // A republished query already refiltered through the channel
        // callback; do not run a second pass for the same state.
        if (deferred || pending) && !republished {
            self.engine.refilter();
        }
        if pending {
            Self::persist_current_inner(&self.inner, &self.engine);
        }
    }

    fn restore_layout(&self, persistence: &ViewStatePersistence, state: &ViewState) {
        let context = persistence.context().unwrap_or_default();
        if !state.columns.is_empty() {
            if self.engine.apply_column_state(&state.columns) {
                if let Ok(mut guard) = self.inner.write() {
                    guard.visible_ids = state.visible_column_ids();
                }
            } else {
                log::warn!(
                    "stored column layout for '{context}' rejected by the engine; auto-sizing columns"
                );
                self.engine.auto_size_columns();
            }
        }
        let entries = state.sort_entries();
        if !entries.is_empty() && !self.engine.apply_sort_state(&entries) {
            log::warn!("stored sort model for '{context}' rejected by the engine");
        }
    }

    /// Bring a persisted search query back. Returns `true` when the
    /// query was republished on the channel (which refilters on its
    /// own).
    fn restore_query(&self, state: &ViewState) -> bool {
        if state.search_query.is_empty() {
            return false;
        }
        let (channel, live_query) = self
            .inner
            .read()
            .map(|g| (g.channel.clone(), g.query.clone()))
            .unwrap_or((None, String::new()));
        if !live_query.is_empty() {
            // A live publish outranks whatever was stored.
            return false;
        }
        match channel {
            Some(channel) => {
                channel.publish(&state.search_query);
                true
            }
            None => {
                if let Ok(mut guard) = self.inner.write() {
                    guard.query = state.search_query.clone();
                    guard.pending_publish = true;
                }
                false
            }
        }
    }

    fn apply_query(
        inner: &Arc<RwLock<TableInner<T>>>,
        engine: &Arc<dyn GridEngine<T>>,
        query: &str,
    ) {
        let (navigator, ready) = match inner.write() {
            Ok(mut g) => {
                g.query = query.to_string();
                if !g.ready {
                    g.pending_publish = true;
                }
                (g.navigator.clone(), g.ready)
            }
            Err(_) => return,
        };

        if let Some(navigator) = navigator {
            sync_search_param(&*navigator, query);
        }
        if ready {
            Self::persist_current_inner(inner, engine);
            engine.refilter();
        }
    }

    fn persist_current_inner(inner: &Arc<RwLock<TableInner<T>>>, engine: &Arc<dyn GridEngine<T>>) {
        let Ok((persistence, query)) = inner
            .read()
            .map(|g| (g.persistence.clone(), g.query.clone()))
        else {
            return;
        };

        let state = ViewState::assemble(engine.column_state(), &engine.sort_state(), query);
        if !state.columns.is_empty()
            && let Ok(mut guard) = inner.write()
        {
            guard.visible_ids = state.visible_column_ids();
        }
        persistence.save(&state);
    }

    // -------------------------------------------------------------------------
    // Layout and sort change hooks
    // -------------------------------------------------------------------------

    /// A user-visible column reorder, resize or show/hide happened;
    /// persist the layout synchronously.
    pub fn on_column_state_changed(&self) {
        Self::persist_current_inner(&self.inner, &self.engine);
    }

    /// The sort model changed; persist it synchronously.
    pub fn on_sort_changed(&self) {
        Self::persist_current_inner(&self.inner, &self.engine);
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// The query currently applied to the filter.
    pub fn query(&self) -> String {
        self.inner.read().map(|g| g.query.clone()).unwrap_or_default()
    }

    /// Ids of the columns the filter currently searches.
    pub fn visible_column_ids(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|g| g.visible_ids.clone())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Selection and export
    // -------------------------------------------------------------------------

    /// Select (or deselect) rows in bulk. With an active filter only
    /// the filtered-in rows are touched; selecting rows the user cannot
    /// see would contradict visible intent.
    pub fn select_all(&self, deselect: bool) {
        let filter_active = self
            .inner
            .read()
            .map(|g| !g.query.is_empty())
            .unwrap_or(false)
            && self.predicate.is_wired();
        match (filter_active, deselect) {
            (true, false) => self.engine.select_filtered_rows(),
            (true, true) => self.engine.deselect_filtered_rows(),
            (false, false) => self.engine.select_all_rows(),
            (false, true) => self.engine.deselect_all_rows(),
        }
    }

    /// Export the selection when anything is selected, otherwise the
    /// filtered-in rows, named `{context}.csv` or the generic default.
    pub fn export_csv(&self) {
        let context = self
            .inner
            .read()
            .ok()
            .and_then(|g| g.persistence.context().map(str::to_string));
        let rows = export_rows(self.engine.selected_rows(), self.engine.filtered_rows());
        self.engine
            .export_csv(&rows, &export_file_name(context.as_deref()));
    }

    // -------------------------------------------------------------------------
    // Context menu
    // -------------------------------------------------------------------------

    pub fn menu_state(&self) -> MenuState {
        self.inner.read().map(|g| g.menu.state()).unwrap_or_default()
    }

    /// Right-click on a row: open the row menu there, clamped to the
    /// viewport.
    pub fn open_row_menu(&self, row: T, click_x: u32, click_y: u32) -> Option<MenuPosition> {
        self.inner
            .write()
            .map(|mut g| g.menu.open_row_menu(row, click_x, click_y))
            .ok()
    }

    pub fn open_column_menu(&self) {
        if let Ok(mut guard) = self.inner.write() {
            guard.menu.open_column_menu();
        }
    }

    /// Document-wide capture-phase click: closes whichever menu is
    /// open.
    pub fn document_click(&self) {
        if let Ok(mut guard) = self.inner.write() {
            guard.menu.document_click();
        }
    }

    /// The window resized; update popup clamping.
    pub fn set_viewport(&self, viewport: Viewport) {
        if let Ok(mut guard) = self.inner.write() {
            guard.menu.set_viewport(viewport);
        }
    }

    /// See [`ContextMenuController::is_disabled`].
    pub fn is_item_disabled(&self, item: &ContextMenuItem<T>) -> Result<bool, TableError> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.menu.is_disabled(item, &*self.engine)
    }

    /// Dispatch an action item click: the event is published to the
    /// host sink and the menu closes. See
    /// [`ContextMenuController::dispatch`] for the payload shape.
    pub fn dispatch_action(
        &self,
        action: &str,
        multi_row: bool,
        click: &mut MenuClick,
    ) -> Result<(), TableError> {
        let (event, sink) = {
            let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
            let event = guard.menu.dispatch(action, multi_row, click, &*self.engine)?;
            (event, guard.on_action.clone())
        };
        if let Some(sink) = sink {
            sink(event);
        }
        Ok(())
    }
}
