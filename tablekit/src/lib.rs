//! tablekit - a reusable generic table core.
//!
//! Provides fuzzy text filtering over arbitrary row shapes, persisted
//! view configuration (column layout and sort order) keyed by a
//! caller-supplied context, a position-aware context-menu protocol with
//! per-action enablement rules, and bulk selection / CSV export
//! orchestration.
//!
//! Rendering, storage and scoring are injected: the host supplies a
//! [`engine::GridEngine`] (the actual data-grid library), a
//! [`store::ViewStateStore`] (a synchronous string key-value store) and
//! optionally a [`filter::FuzzyMatcher`] and [`search::Navigator`]. The
//! [`table::TableCore`] wires one table instance together.

pub mod column;
pub mod context_menu;
pub mod engine;
pub mod error;
pub mod export;
pub mod filter;
pub mod search;
pub mod store;
pub mod table;
pub mod value;
pub mod view_state;

pub mod prelude {
    pub use crate::column::{CellAccessor, ColumnDescriptor, ColumnSpec, SortDirection};
    pub use crate::context_menu::{
        ActionData, ContextMenuActionEvent, ContextMenuController, ContextMenuItem, MenuClick,
        MenuPosition, MenuSize, MenuState, Viewport,
    };
    pub use crate::engine::{FilterPredicateFn, GridEngine};
    pub use crate::error::TableError;
    pub use crate::filter::{FuzzyFilterPredicate, FuzzyMatcher, NucleoMatcher};
    pub use crate::search::{Navigator, SearchChannel, Subscription};
    pub use crate::store::{MemoryStore, ViewStateStore};
    pub use crate::table::TableCore;
    pub use crate::value::CellValue;
    pub use crate::view_state::{SortEntry, ViewState, ViewStatePersistence};
}
