//! Context-menu state machine.
//!
//! Two kinds of popup share one controller: the row action menu (opened
//! by right-clicking a row, which captures that row as the *anchor*) and
//! the column toggle menu. The two are mutually exclusive; a document-
//! wide capture-phase click closes whichever is open, including the case
//! where one menu's trigger is clicked while the other is showing.
//!
//! Action enablement and dispatch read the anchor. The state machine
//! guarantees an anchor exists before any row-menu item is reachable, so
//! calling [`ContextMenuController::is_disabled`] or
//! [`ContextMenuController::dispatch`] without one is a host-wiring bug
//! and fails hard.

use std::sync::Arc;

use crate::engine::GridEngine;
use crate::error::TableError;

/// Popup state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Closed,
    ColumnMenuOpen,
    RowMenuOpen,
}

/// Window dimensions used for popup clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Natural (unclamped) popup dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuSize {
    pub width: u32,
    pub height: u32,
}

/// Top-left corner of an opened popup, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuPosition {
    pub x: u32,
    pub y: u32,
}

/// Clamp a popup opening at the click point into the viewport.
///
/// If the natural bottom edge would exceed the window height the menu
/// flips above the cursor; if the natural right edge would exceed the
/// window width it flips to the left, so the respective edge lands on
/// the click coordinate.
pub fn clamp_to_viewport(
    click_x: u32,
    click_y: u32,
    menu: MenuSize,
    viewport: Viewport,
) -> MenuPosition {
    let x = if click_x + menu.width > viewport.width {
        click_x.saturating_sub(menu.width)
    } else {
        click_x
    };
    let y = if click_y + menu.height > viewport.height {
        click_y.saturating_sub(menu.height)
    } else {
        click_y
    };
    MenuPosition { x, y }
}

/// Enablement predicate for an action item: receives the live
/// multi-selection and the engine.
pub type DisabledFn<T> = Arc<dyn Fn(&[T], &dyn GridEngine<T>) -> bool + Send + Sync>;

/// One entry of the row context menu.
pub enum ContextMenuItem<T> {
    /// Plain navigation; always enabled.
    Link {
        href: String,
        name: String,
        new_tab: bool,
    },
    /// Dispatches a [`ContextMenuActionEvent`] to the host.
    Action {
        action: String,
        name: String,
        /// Whether the action accepts the whole multi-selection. A
        /// single-row action is unconditionally disabled while more
        /// than one row is selected.
        multi_row: bool,
        disabled: Option<DisabledFn<T>>,
    },
}

impl<T> ContextMenuItem<T> {
    pub fn link(href: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Link {
            href: href.into(),
            name: name.into(),
            new_tab: false,
        }
    }

    pub fn action(action: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Action {
            action: action.into(),
            name: name.into(),
            multi_row: false,
            disabled: None,
        }
    }

    /// Open the link in a new tab.
    pub fn new_tab(mut self) -> Self {
        if let Self::Link { new_tab, .. } = &mut self {
            *new_tab = true;
        }
        self
    }

    /// Accept the whole multi-selection.
    pub fn multi_row(mut self) -> Self {
        if let Self::Action { multi_row, .. } = &mut self {
            *multi_row = true;
        }
        self
    }

    /// Custom enablement rule, consulted when the selection count does
    /// not already force the item off.
    pub fn disabled_when(
        mut self,
        f: impl Fn(&[T], &dyn GridEngine<T>) -> bool + Send + Sync + 'static,
    ) -> Self {
        if let Self::Action { disabled, .. } = &mut self {
            *disabled = Some(Arc::new(f));
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Link { name, .. } | Self::Action { name, .. } => name,
        }
    }
}

impl<T> std::fmt::Debug for ContextMenuItem<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Link { href, name, new_tab } => f
                .debug_struct("Link")
                .field("href", href)
                .field("name", name)
                .field("new_tab", new_tab)
                .finish(),
            Self::Action {
                action,
                name,
                multi_row,
                disabled,
            } => f
                .debug_struct("Action")
                .field("action", action)
                .field("name", name)
                .field("multi_row", multi_row)
                .field("disabled", &disabled.is_some())
                .finish(),
        }
    }
}

/// Payload shape of a dispatched action.
///
/// Multi-row actions always carry a list, even when it holds only the
/// anchor; single-row actions carry the bare anchor. The asymmetry is a
/// deliberate part of the contract consumers rely on.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionData<T> {
    Single(T),
    Multi(Vec<T>),
}

/// Outbound event delivered to the hosting page, which performs any
/// actual side effects. The core never calls an API itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenuActionEvent<T> {
    pub action: String,
    pub data: ActionData<T>,
}

/// Abstract click handed to [`ContextMenuController::dispatch`].
///
/// Dispatch stops propagation on it so the document-wide close handler
/// never sees the same click; the adapter layer maps this onto the real
/// pointer event.
#[derive(Debug, Default)]
pub struct MenuClick {
    stopped: bool,
}

impl MenuClick {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.stopped
    }
}

/// Popup state machine, anchor capture, action enablement and dispatch.
pub struct ContextMenuController<T> {
    state: MenuState,
    anchor: Option<T>,
    position: Option<MenuPosition>,
    menu_size: MenuSize,
    viewport: Viewport,
}

impl<T: Clone> ContextMenuController<T> {
    pub fn new(viewport: Viewport, menu_size: MenuSize) -> Self {
        Self {
            state: MenuState::Closed,
            anchor: None,
            position: None,
            menu_size,
            viewport,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    /// The row captured by the last right-click, if any.
    pub fn anchor(&self) -> Option<&T> {
        self.anchor.as_ref()
    }

    /// Position of the currently open row menu.
    pub fn position(&self) -> Option<MenuPosition> {
        self.position
    }

    /// Track window resizes so clamping stays correct.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Right-click on a row: capture it as the anchor and open the row
    /// menu at a viewport-clamped position.
    pub fn open_row_menu(&mut self, row: T, click_x: u32, click_y: u32) -> MenuPosition {
        let position = clamp_to_viewport(click_x, click_y, self.menu_size, self.viewport);
        self.state = MenuState::RowMenuOpen;
        self.anchor = Some(row);
        self.position = Some(position);
        position
    }

    /// Toggle-columns trigger clicked.
    pub fn open_column_menu(&mut self) {
        self.state = MenuState::ColumnMenuOpen;
        self.position = None;
    }

    /// Document-wide capture-phase click: closes whichever menu is open.
    pub fn document_click(&mut self) {
        self.state = MenuState::Closed;
        self.position = None;
    }

    /// Decide whether a menu item is disabled for the current anchor
    /// and live selection.
    ///
    /// Fails with [`TableError::InvariantViolation`] when no row has
    /// been right-clicked.
    pub fn is_disabled(
        &self,
        item: &ContextMenuItem<T>,
        engine: &dyn GridEngine<T>,
    ) -> Result<bool, TableError> {
        if self.anchor.is_none() {
            return Err(TableError::InvariantViolation {
                operation: "is_disabled",
            });
        }
        let ContextMenuItem::Action {
            multi_row,
            disabled,
            ..
        } = item
        else {
            return Ok(false);
        };

        let selection = engine.selected_rows();
        if selection.len() > 1 && !*multi_row {
            // A single-row action can never run against several rows,
            // whatever its custom rule says.
            return Ok(true);
        }
        match disabled {
            Some(f) => Ok(f(&selection, engine)),
            None => Ok(false),
        }
    }

    /// Action item clicked: build the event, stop the click from
    /// reaching the document close handler, close the menu, and hand
    /// the event back for publication to the host.
    ///
    /// Multi-row actions receive the live multi-selection, or a
    /// one-element list holding just the anchor when nothing is
    /// selected. Single-row actions receive the bare anchor.
    pub fn dispatch(
        &mut self,
        action: &str,
        multi_row: bool,
        click: &mut MenuClick,
        engine: &dyn GridEngine<T>,
    ) -> Result<ContextMenuActionEvent<T>, TableError> {
        let Some(anchor) = self.anchor.clone() else {
            return Err(TableError::InvariantViolation {
                operation: "dispatch",
            });
        };

        click.stop_propagation();

        let data = if multi_row {
            let selection = engine.selected_rows();
            if selection.is_empty() {
                ActionData::Multi(vec![anchor])
            } else {
                ActionData::Multi(selection)
            }
        } else {
            ActionData::Single(anchor)
        };

        self.state = MenuState::Closed;
        self.position = None;

        Ok(ContextMenuActionEvent {
            action: action.to_string(),
            data,
        })
    }
}
