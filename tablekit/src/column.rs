//! Column descriptors and per-column accessors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// Default width applied when a persisted sort entry references a column
/// with no surviving layout information.
pub(crate) const DEFAULT_COLUMN_WIDTH: u16 = 100;

/// Sort direction for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    None,
    Asc,
    Desc,
}

/// Column configuration as the engine and the persistence layer see it.
///
/// `id` must be unique within a table. Among columns with a sort
/// direction other than `None`, `sort_priority` must be strictly
/// increasing in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub id: String,
    pub visible: bool,
    pub order: usize,
    pub width: u16,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default)]
    pub sort_priority: Option<u32>,
}

impl ColumnDescriptor {
    /// Create a visible, unsorted column with explicit width.
    pub fn new(id: impl Into<String>, order: usize, width: u16) -> Self {
        Self {
            id: id.into(),
            visible: true,
            order,
            width,
            sort_direction: SortDirection::None,
            sort_priority: None,
        }
    }

    /// Hide the column. Hidden columns are never searched.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Sort by this column.
    pub fn sorted(mut self, direction: SortDirection, priority: u32) -> Self {
        self.sort_direction = direction;
        self.sort_priority = Some(priority);
        self
    }
}

/// Accessor extracting the searchable value of one column from a row.
pub type CellAccessor<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;

/// A column descriptor paired with its value accessor.
///
/// The accessor is the bounded capability that replaces reflective
/// property iteration: the host decides, per column, how a row turns
/// into a stringifiable value.
#[derive(Clone)]
pub struct ColumnSpec<T> {
    pub descriptor: ColumnDescriptor,
    pub accessor: CellAccessor<T>,
}

impl<T> ColumnSpec<T> {
    pub fn new(
        descriptor: ColumnDescriptor,
        accessor: impl Fn(&T) -> CellValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            descriptor,
            accessor: Arc::new(accessor),
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }
}

impl<T> std::fmt::Debug for ColumnSpec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Check the descriptor invariants: unique ids, strictly increasing
/// sort priorities among sorted columns.
///
/// Violations are logged as warnings; the caller decides whether to
/// proceed (a violated layout still renders, it just sorts oddly).
pub fn validate_columns(columns: &[ColumnDescriptor]) -> bool {
    let mut ok = true;

    for (i, col) in columns.iter().enumerate() {
        if columns[..i].iter().any(|c| c.id == col.id) {
            log::warn!("duplicate column id '{}'", col.id);
            ok = false;
        }
    }

    let mut last_priority: Option<u32> = None;
    for col in columns {
        if col.sort_direction == SortDirection::None {
            continue;
        }
        match (last_priority, col.sort_priority) {
            (_, None) => {
                log::warn!("sorted column '{}' has no sort priority", col.id);
                ok = false;
            }
            (Some(prev), Some(p)) if p <= prev => {
                log::warn!(
                    "sort priority {} of column '{}' does not increase past {}",
                    p,
                    col.id,
                    prev
                );
                ok = false;
                last_priority = Some(p);
            }
            (_, Some(p)) => last_priority = Some(p),
        }
    }

    ok
}
