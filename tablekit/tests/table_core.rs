use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tablekit::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Server {
    id: i64,
    name: String,
}

fn edge01() -> Server {
    Server {
        id: 1,
        name: "edge01".to_string(),
    }
}

fn mid01() -> Server {
    Server {
        id: 2,
        name: "mid01".to_string(),
    }
}

fn specs() -> Vec<ColumnSpec<Server>> {
    vec![
        ColumnSpec::new(ColumnDescriptor::new("id", 0, 8), |s: &Server| {
            CellValue::Int(s.id)
        }),
        ColumnSpec::new(ColumnDescriptor::new("name", 1, 30), |s: &Server| {
            CellValue::Text(s.name.clone())
        }),
    ]
}

/// In-memory grid engine double recording every capability call.
#[derive(Default)]
struct MockEngine {
    rows: RwLock<Vec<Server>>,
    selected: RwLock<Vec<Server>>,
    columns: RwLock<Vec<ColumnDescriptor>>,
    sort: RwLock<Vec<SortEntry>>,
    predicate: Mutex<Option<FilterPredicateFn<Server>>>,
    refilter_count: AtomicUsize,
    auto_size_count: AtomicUsize,
    reject_column_state: std::sync::atomic::AtomicBool,
    applied_columns: RwLock<Vec<ColumnDescriptor>>,
    applied_sort: RwLock<Vec<SortEntry>>,
    exports: Mutex<Vec<(Vec<Server>, String)>>,
}

impl MockEngine {
    fn with_rows(rows: Vec<Server>) -> Arc<Self> {
        let engine = Self::default();
        *engine.rows.write().unwrap() = rows;
        Arc::new(engine)
    }

    fn set_selected(&self, rows: Vec<Server>) {
        *self.selected.write().unwrap() = rows;
    }

    fn refilters(&self) -> usize {
        self.refilter_count.load(Ordering::SeqCst)
    }

    fn auto_sizes(&self) -> usize {
        self.auto_size_count.load(Ordering::SeqCst)
    }

    fn exports(&self) -> Vec<(Vec<Server>, String)> {
        self.exports.lock().unwrap().clone()
    }
}

impl GridEngine<Server> for MockEngine {
    fn rows(&self) -> Vec<Server> {
        self.rows.read().unwrap().clone()
    }

    fn filtered_rows(&self) -> Vec<Server> {
        let rows = self.rows();
        let guard = self.predicate.lock().unwrap();
        match guard.as_ref() {
            Some(predicate) => rows.into_iter().filter(|r| predicate(r)).collect(),
            None => rows,
        }
    }

    fn selected_rows(&self) -> Vec<Server> {
        self.selected.read().unwrap().clone()
    }

    fn select_all_rows(&self) {
        *self.selected.write().unwrap() = self.rows();
    }

    fn deselect_all_rows(&self) {
        self.selected.write().unwrap().clear();
    }

    fn select_filtered_rows(&self) {
        let filtered = self.filtered_rows();
        let mut selected = self.selected.write().unwrap();
        for row in filtered {
            if !selected.contains(&row) {
                selected.push(row);
            }
        }
    }

    fn deselect_filtered_rows(&self) {
        let filtered = self.filtered_rows();
        self.selected.write().unwrap().retain(|r| !filtered.contains(r));
    }

    fn column_state(&self) -> Vec<ColumnDescriptor> {
        self.columns.read().unwrap().clone()
    }

    fn apply_column_state(&self, columns: &[ColumnDescriptor]) -> bool {
        if self.reject_column_state.load(Ordering::SeqCst) {
            return false;
        }
        *self.applied_columns.write().unwrap() = columns.to_vec();
        *self.columns.write().unwrap() = columns.to_vec();
        true
    }

    fn sort_state(&self) -> Vec<SortEntry> {
        self.sort.read().unwrap().clone()
    }

    fn apply_sort_state(&self, entries: &[SortEntry]) -> bool {
        *self.applied_sort.write().unwrap() = entries.to_vec();
        *self.sort.write().unwrap() = entries.to_vec();
        true
    }

    fn auto_size_columns(&self) {
        self.auto_size_count.fetch_add(1, Ordering::SeqCst);
    }

    fn set_filter_predicate(&self, predicate: FilterPredicateFn<Server>) {
        *self.predicate.lock().unwrap() = Some(predicate);
    }

    fn refilter(&self) {
        self.refilter_count.fetch_add(1, Ordering::SeqCst);
    }

    fn export_csv(&self, rows: &[Server], file_name: &str) {
        self.exports
            .lock()
            .unwrap()
            .push((rows.to_vec(), file_name.to_string()));
    }
}

#[derive(Default)]
struct RecordingNavigator {
    calls: Mutex<Vec<(String, String)>>,
}

impl Navigator for RecordingNavigator {
    fn replace_query_param(&self, key: &str, value: &str) {
        self.calls
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
    }
}

fn names(rows: &[Server]) -> Vec<&str> {
    rows.iter().map(|r| r.name.as_str()).collect()
}

// ============================================================================
// Filtering through the full wiring
// ============================================================================

#[test]
fn query_filters_rows_by_visible_values() {
    let engine = MockEngine::with_rows(vec![edge01(), mid01()]);
    let channel = SearchChannel::new();
    let table = TableCore::new(engine.clone(), specs()).attach_search(&channel);
    table.engine_ready();

    channel.publish("edg");
    assert_eq!(names(&engine.filtered_rows()), vec!["edge01"]);

    channel.publish("");
    assert_eq!(names(&engine.filtered_rows()), vec!["edge01", "mid01"]);

    channel.publish("zz");
    assert!(engine.filtered_rows().is_empty());
}

#[test]
fn each_publish_causes_exactly_one_refilter() {
    let engine = MockEngine::with_rows(vec![edge01(), mid01()]);
    let channel = SearchChannel::new();
    let _table = TableCore::new(engine.clone(), specs()).attach_search(&channel);
    // No publishes yet and the core is not ready; nothing refilters.
    assert_eq!(engine.refilters(), 0);

    let table = TableCore::new(engine.clone(), specs()).attach_search(&channel);
    table.engine_ready();
    let before = engine.refilters();
    channel.publish("edg");
    assert_eq!(engine.refilters(), before + 1);
    channel.publish("edge0");
    assert_eq!(engine.refilters(), before + 2);
}

#[test]
fn publish_before_engine_ready_defers_one_refilter() {
    let engine = MockEngine::with_rows(vec![edge01(), mid01()]);
    let channel = SearchChannel::new();
    channel.publish("edg");

    let table = TableCore::new(engine.clone(), specs()).attach_search(&channel);
    assert_eq!(engine.refilters(), 0);
    // Rows are not hidden during the startup race.
    assert_eq!(engine.filtered_rows().len(), 2);

    table.engine_ready();
    assert_eq!(engine.refilters(), 1);
    assert_eq!(names(&engine.filtered_rows()), vec!["edge01"]);
}

#[test]
fn engine_ready_before_attach_is_tolerated() {
    let engine = MockEngine::with_rows(vec![edge01(), mid01()]);
    let channel = SearchChannel::new();
    channel.publish("edg");

    let table = TableCore::new(engine.clone(), specs());
    table.engine_ready();
    let table = table.attach_search(&channel);
    assert_eq!(names(&engine.filtered_rows()), vec!["edge01"]);
    drop(table);
}

#[test]
fn dropping_the_core_releases_the_channel_subscription() {
    let engine = MockEngine::with_rows(vec![edge01()]);
    let channel = SearchChannel::new();
    let table = TableCore::new(engine.clone(), specs()).attach_search(&channel);
    table.engine_ready();

    let before = engine.refilters();
    drop(table);
    channel.publish("edg");
    assert_eq!(engine.refilters(), before);
}

#[test]
fn publish_updates_the_url_search_param() {
    let engine = MockEngine::with_rows(vec![edge01()]);
    let channel = SearchChannel::new();
    let navigator = Arc::new(RecordingNavigator::default());
    let table = TableCore::new(engine, specs())
        .with_navigator(navigator.clone())
        .attach_search(&channel);
    table.engine_ready();

    channel.publish("edge 01");
    let calls = navigator.calls.lock().unwrap();
    assert_eq!(calls.last().unwrap(), &("search".to_string(), "edge%2001".to_string()));
}

// ============================================================================
// View state persistence
// ============================================================================

#[test]
fn layout_round_trips_between_table_instances() {
    let store = MemoryStore::new();
    let channel = SearchChannel::new();

    let engine = MockEngine::with_rows(vec![edge01(), mid01()]);
    let layout = vec![
        ColumnDescriptor::new("name", 0, 42),
        ColumnDescriptor::new("id", 1, 8).hidden(),
    ];
    *engine.columns.write().unwrap() = layout.clone();
    *engine.sort.write().unwrap() = vec![SortEntry {
        column_id: "name".to_string(),
        direction: SortDirection::Asc,
        priority: 0,
    }];

    let table = TableCore::new(engine.clone(), specs())
        .with_store(Arc::new(store.clone()), "servers")
        .attach_search(&channel);
    table.engine_ready();
    table.on_column_state_changed();
    drop(table);

    let restored = MockEngine::with_rows(vec![edge01(), mid01()]);
    let table = TableCore::new(restored.clone(), specs())
        .with_store(Arc::new(store.clone()), "servers");
    table.engine_ready();

    let applied = restored.applied_columns.read().unwrap().clone();
    assert_eq!(applied.len(), 2);
    assert_eq!(applied[0].id, "name");
    assert_eq!(applied[0].width, 42);
    assert!(!applied[1].visible);

    let sort = restored.applied_sort.read().unwrap().clone();
    assert_eq!(sort.len(), 1);
    assert_eq!(sort[0].column_id, "name");
}

#[test]
fn rejected_layout_falls_back_to_auto_sizing() {
    let store = MemoryStore::new();
    let engine = MockEngine::with_rows(vec![edge01()]);
    *engine.columns.write().unwrap() = vec![ColumnDescriptor::new("stale", 0, 10)];
    let table = TableCore::new(engine.clone(), specs())
        .with_store(Arc::new(store.clone()), "servers");
    table.engine_ready();
    table.on_column_state_changed();
    drop(table);

    let engine = MockEngine::with_rows(vec![edge01()]);
    engine.reject_column_state.store(true, Ordering::SeqCst);
    let table = TableCore::new(engine.clone(), specs())
        .with_store(Arc::new(store.clone()), "servers");
    table.engine_ready();
    drop(table);

    assert_eq!(engine.auto_sizes(), 1);
}

#[test]
fn without_a_context_columns_auto_size_exactly_once() {
    let engine = MockEngine::with_rows(vec![edge01()]);
    let table = TableCore::new(engine.clone(), specs());
    table.engine_ready();
    table.engine_ready();
    assert_eq!(engine.auto_sizes(), 1);
}

#[test]
fn with_a_context_and_nothing_stored_no_auto_sizing_happens() {
    let engine = MockEngine::with_rows(vec![edge01()]);
    let table = TableCore::new(engine.clone(), specs())
        .with_store(Arc::new(MemoryStore::new()), "servers");
    table.engine_ready();
    assert_eq!(engine.auto_sizes(), 0);
}

#[test]
fn stored_search_query_is_republished_at_ready() {
    let store = MemoryStore::new();
    let channel = SearchChannel::new();

    let engine = MockEngine::with_rows(vec![edge01(), mid01()]);
    *engine.columns.write().unwrap() = vec![
        ColumnDescriptor::new("id", 0, 8),
        ColumnDescriptor::new("name", 1, 30),
    ];
    let table = TableCore::new(engine.clone(), specs())
        .with_store(Arc::new(store.clone()), "servers")
        .attach_search(&channel);
    table.engine_ready();
    channel.publish("edg");
    drop(table);

    let channel = SearchChannel::new();
    let engine = MockEngine::with_rows(vec![edge01(), mid01()]);
    let table = TableCore::new(engine.clone(), specs())
        .with_store(Arc::new(store.clone()), "servers")
        .attach_search(&channel);
    table.engine_ready();

    assert_eq!(channel.latest().as_deref(), Some("edg"));
    assert_eq!(table.query(), "edg");
    assert_eq!(engine.refilters(), 1);
    assert_eq!(names(&engine.filtered_rows()), vec!["edge01"]);
}

// ============================================================================
// Selection and export
// ============================================================================

#[test]
fn select_all_without_filter_touches_every_row() {
    let engine = MockEngine::with_rows(vec![edge01(), mid01()]);
    let table = TableCore::new(engine.clone(), specs());
    table.engine_ready();

    table.select_all(false);
    assert_eq!(engine.selected_rows().len(), 2);
    table.select_all(true);
    assert!(engine.selected_rows().is_empty());
}

#[test]
fn select_all_with_active_filter_touches_only_visible_rows() {
    let engine = MockEngine::with_rows(vec![edge01(), mid01()]);
    let channel = SearchChannel::new();
    let table = TableCore::new(engine.clone(), specs()).attach_search(&channel);
    table.engine_ready();
    channel.publish("edg");

    table.select_all(false);
    assert_eq!(names(&engine.selected_rows()), vec!["edge01"]);
}

#[test]
fn export_prefers_the_selection_over_filtered_rows() {
    let rows = vec![
        edge01(),
        mid01(),
        Server {
            id: 3,
            name: "edge02".to_string(),
        },
    ];
    let engine = MockEngine::with_rows(rows.clone());
    let table = TableCore::new(engine.clone(), specs());
    table.engine_ready();

    // Zero selected: export exactly the filtered-in rows.
    table.export_csv();
    // One selected: export exactly that row.
    engine.set_selected(vec![mid01()]);
    table.export_csv();

    let exports = engine.exports();
    assert_eq!(exports.len(), 2);
    assert_eq!(exports[0].0, rows);
    assert_eq!(exports[0].1, "export.csv");
    assert_eq!(exports[1].0, vec![mid01()]);
}

#[test]
fn export_file_is_named_after_the_context() {
    let engine = MockEngine::with_rows(vec![edge01()]);
    let table = TableCore::new(engine.clone(), specs())
        .with_store(Arc::new(MemoryStore::new()), "servers");
    table.engine_ready();
    table.export_csv();
    assert_eq!(engine.exports()[0].1, "servers.csv");
}

// ============================================================================
// Context menu through the core
// ============================================================================

#[test]
fn dispatch_publishes_to_the_action_sink() {
    let engine = MockEngine::with_rows(vec![edge01(), mid01()]);
    engine.set_selected(vec![edge01(), mid01()]);

    let received: Arc<Mutex<Vec<ContextMenuActionEvent<Server>>>> =
        Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let table = TableCore::new(engine.clone(), specs())
        .on_action(move |event| sink.lock().unwrap().push(event));
    table.engine_ready();

    table.open_row_menu(edge01(), 100, 100);
    let mut click = MenuClick::new();
    table.dispatch_action("delete", true, &mut click).unwrap();

    let events = received.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "delete");
    assert_eq!(events[0].data, ActionData::Multi(vec![edge01(), mid01()]));
    assert!(click.propagation_stopped());
    assert_eq!(table.menu_state(), MenuState::Closed);
}

#[test]
fn single_row_dispatch_emits_the_bare_anchor() {
    let engine = MockEngine::with_rows(vec![edge01(), mid01()]);
    engine.set_selected(vec![edge01(), mid01()]);

    let received: Arc<Mutex<Vec<ContextMenuActionEvent<Server>>>> =
        Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let table = TableCore::new(engine.clone(), specs())
        .on_action(move |event| sink.lock().unwrap().push(event));
    table.engine_ready();

    table.open_row_menu(edge01(), 100, 100);
    let mut click = MenuClick::new();
    table.dispatch_action("restart", false, &mut click).unwrap();

    let events = received.lock().unwrap();
    assert_eq!(events[0].data, ActionData::Single(edge01()));
}

#[test]
fn menu_operations_without_an_anchor_fail_hard() {
    let engine = MockEngine::with_rows(vec![edge01()]);
    let table = TableCore::new(engine, specs());
    table.engine_ready();

    let item = ContextMenuItem::action("restart", "Restart");
    assert!(matches!(
        table.is_item_disabled(&item),
        Err(TableError::InvariantViolation { .. })
    ));
    let mut click = MenuClick::new();
    assert!(matches!(
        table.dispatch_action("restart", false, &mut click),
        Err(TableError::InvariantViolation { .. })
    ));
}

#[test]
fn row_menu_position_is_clamped_to_the_viewport() {
    let engine = MockEngine::with_rows(vec![edge01()]);
    let table = TableCore::new(engine, specs()).with_menu_layout(
        Viewport {
            width: 1920,
            height: 1080,
        },
        MenuSize {
            width: 300,
            height: 200,
        },
    );
    table.engine_ready();

    let pos = table.open_row_menu(edge01(), 1900, 50).unwrap();
    assert_eq!(pos, MenuPosition { x: 1600, y: 50 });
}
