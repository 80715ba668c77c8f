//! Persisted view configuration: column layout, sort order, search query.
//!
//! One `ViewState` per context, serialized as JSON under two store keys:
//! `{context}_table_columns` (layout) and `{context}_table_sort` (sort
//! entries plus the search query). The keys load independently so a
//! corrupt layout never takes the sort model down with it, and vice
//! versa. Without a context the persistence layer is a no-op and view
//! state lives only inside the engine for the session.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::column::{ColumnDescriptor, DEFAULT_COLUMN_WIDTH, SortDirection, validate_columns};
use crate::error::StateError;
use crate::store::ViewStateStore;

pub(crate) const COLUMNS_KEY_SUFFIX: &str = "_table_columns";
pub(crate) const SORT_KEY_SUFFIX: &str = "_table_sort";

/// One column's contribution to the sort model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEntry {
    pub column_id: String,
    pub direction: SortDirection,
    pub priority: u32,
}

/// The persisted combination of column layout and sort order for one
/// context, plus the last search query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub columns: Vec<ColumnDescriptor>,
    pub search_query: String,
}

impl ViewState {
    /// Build a view state from engine-reported column state and sort
    /// model. Sort entries override whatever sort fields the descriptors
    /// carry; entries naming unknown columns materialise a descriptor
    /// with default layout.
    pub fn assemble(
        mut columns: Vec<ColumnDescriptor>,
        entries: &[SortEntry],
        search_query: impl Into<String>,
    ) -> Self {
        for col in &mut columns {
            col.sort_direction = SortDirection::None;
            col.sort_priority = None;
        }
        for entry in entries {
            match columns.iter_mut().find(|c| c.id == entry.column_id) {
                Some(col) => {
                    col.sort_direction = entry.direction;
                    col.sort_priority = Some(entry.priority);
                }
                None => {
                    let order = columns.len();
                    columns.push(ColumnDescriptor {
                        id: entry.column_id.clone(),
                        visible: true,
                        order,
                        width: DEFAULT_COLUMN_WIDTH,
                        sort_direction: entry.direction,
                        sort_priority: Some(entry.priority),
                    });
                }
            }
        }
        Self {
            columns,
            search_query: search_query.into(),
        }
    }

    /// Derive the sort model from the descriptors, ordered by priority.
    pub fn sort_entries(&self) -> Vec<SortEntry> {
        let mut entries: Vec<SortEntry> = self
            .columns
            .iter()
            .filter(|c| c.sort_direction != SortDirection::None)
            .map(|c| SortEntry {
                column_id: c.id.clone(),
                direction: c.sort_direction,
                priority: c.sort_priority.unwrap_or(0),
            })
            .collect();
        entries.sort_by_key(|e| e.priority);
        entries
    }

    /// Ids of the visible columns, in layout order. Only these are
    /// searched by the fuzzy filter.
    pub fn visible_column_ids(&self) -> Vec<String> {
        let mut cols: Vec<&ColumnDescriptor> =
            self.columns.iter().filter(|c| c.visible).collect();
        cols.sort_by_key(|c| c.order);
        cols.into_iter().map(|c| c.id.clone()).collect()
    }
}

/// Layout slice persisted under `{context}_table_columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ColumnLayout {
    id: String,
    visible: bool,
    order: usize,
    width: u16,
}

/// Sort model persisted under `{context}_table_sort`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SortState {
    entries: Vec<SortEntry>,
    #[serde(default)]
    search: String,
}

/// Loads and saves view state for one table instance.
///
/// Mirrors a typed settings provider over a raw key-value backend: the
/// store only sees opaque JSON strings.
#[derive(Clone)]
pub struct ViewStatePersistence {
    store: Arc<dyn ViewStateStore>,
    context: Option<String>,
}

impl ViewStatePersistence {
    pub fn new(store: Arc<dyn ViewStateStore>, context: Option<String>) -> Self {
        Self { store, context }
    }

    /// Whether saves and loads do anything at all.
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Load the persisted view state, or `None` when nothing (readable)
    /// is stored. Each key is read independently; a corrupt entry is
    /// logged and treated as absent.
    pub fn load(&self) -> Option<ViewState> {
        let context = self.context.as_deref()?;
        let layouts: Option<Vec<ColumnLayout>> =
            self.read(&format!("{context}{COLUMNS_KEY_SUFFIX}"));
        let sort: Option<SortState> = self.read(&format!("{context}{SORT_KEY_SUFFIX}"));
        if layouts.is_none() && sort.is_none() {
            return None;
        }

        let columns = layouts
            .unwrap_or_default()
            .into_iter()
            .map(|l| ColumnDescriptor {
                id: l.id,
                visible: l.visible,
                order: l.order,
                width: l.width,
                sort_direction: SortDirection::None,
                sort_priority: None,
            })
            .collect();
        let (entries, search) = match sort {
            Some(s) => (s.entries, s.search),
            None => (Vec::new(), String::new()),
        };

        let state = ViewState::assemble(columns, &entries, search);
        validate_columns(&state.columns);
        Some(state)
    }

    /// Persist the view state. A no-op without a context. Saving the
    /// same state twice leaves storage identical to saving it once.
    pub fn save(&self, state: &ViewState) {
        let Some(context) = self.context.as_deref() else {
            return;
        };

        let layouts: Vec<ColumnLayout> = state
            .columns
            .iter()
            .map(|c| ColumnLayout {
                id: c.id.clone(),
                visible: c.visible,
                order: c.order,
                width: c.width,
            })
            .collect();
        let sort = SortState {
            entries: state.sort_entries(),
            search: state.search_query.clone(),
        };

        self.write(&format!("{context}{COLUMNS_KEY_SUFFIX}"), &layouts);
        self.write(&format!("{context}{SORT_KEY_SUFFIX}"), &sort);
    }

    fn read<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(source) => {
                let err = StateError::Corrupt {
                    key: key.to_string(),
                    source,
                };
                log::warn!("{err}; treating as absent");
                None
            }
        }
    }

    fn write<V: Serialize>(&self, key: &str, value: &V) {
        match serde_json::to_string(value) {
            Ok(json) => self.store.set(key, &json),
            Err(err) => log::warn!("failed to serialize view state for '{key}': {err}"),
        }
    }
}
