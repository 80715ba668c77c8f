//! Type-erased grid engine capability trait.
//!
//! The actual rendering/data-grid library lives on the host side; the
//! core only consumes the capability set below. Everything here is
//! synchronous: the engine's readiness is reported to the core by the
//! host adapter calling [`crate::table::TableCore::engine_ready`].

use crate::column::ColumnDescriptor;
use crate::view_state::SortEntry;

/// Row-visibility predicate handed to the engine's external filter pass.
pub type FilterPredicateFn<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Capability set the table core consumes from the rendering library.
pub trait GridEngine<T>: Send + Sync {
    /// All rows the engine currently holds.
    fn rows(&self) -> Vec<T>;

    /// Rows currently passing the filter pass (all rows when no filter
    /// is active).
    fn filtered_rows(&self) -> Vec<T>;

    /// The live multi-selection, in engine order.
    fn selected_rows(&self) -> Vec<T>;

    /// Select every row, filtered or not.
    fn select_all_rows(&self);

    /// Clear the entire selection.
    fn deselect_all_rows(&self);

    /// Select only the rows currently passing the filter.
    fn select_filtered_rows(&self);

    /// Deselect only the rows currently passing the filter.
    fn deselect_filtered_rows(&self);

    /// Current column layout as the engine reports it.
    fn column_state(&self) -> Vec<ColumnDescriptor>;

    /// Apply a stored column layout. Returns `false` when the layout is
    /// rejected (e.g. it references columns the table no longer has).
    fn apply_column_state(&self, columns: &[ColumnDescriptor]) -> bool;

    /// Current sort model.
    fn sort_state(&self) -> Vec<SortEntry>;

    /// Apply a stored sort model. Returns `false` on rejection.
    fn apply_sort_state(&self, entries: &[SortEntry]) -> bool;

    /// Size all columns to fit the viewport.
    fn auto_size_columns(&self);

    /// Register the external filter predicate. The engine consults it
    /// on every filter pass.
    fn set_filter_predicate(&self, predicate: FilterPredicateFn<T>);

    /// Re-run the filter pass.
    fn refilter(&self);

    /// Materialise the given rows as a CSV download under `file_name`.
    fn export_csv(&self, rows: &[T], file_name: &str);
}
