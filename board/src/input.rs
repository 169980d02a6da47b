//! Input model: mouse buttons, wheel deltas, UI flags, and the gesture state machine.
//!
//! `InputState` is the active gesture tracked between pointer-down and
//! pointer-up. Panning and dragging are mutually exclusive variants, so the
//! two gesture classes can never interfere. Neither has a cancel path: both
//! end only on pointer-up.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::doc::ItemId;
use crate::transform::Point;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button.
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button; opens the context menu.
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Self {
        match code {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down = zoom out).
    pub dy: f64,
}

/// A drag that just ended far enough to swallow its trailing click.
#[derive(Debug, Clone, PartialEq)]
pub struct SuppressedClick {
    pub id: ItemId,
    /// Event timestamp (ms) after which clicks are honoured again.
    pub until_ms: f64,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Ruler/debug overlay enabled (the context-menu checkbox).
    pub rulers_enabled: bool,
    /// Item currently under the pointer while idle, for the ruler readout.
    pub hovered: Option<ItemId>,
    pub suppressed_click: Option<SuppressedClick>,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is panning by dragging the empty background.
    Panning {
        /// Screen position of the previous pointer event.
        last_screen: Point,
    },
    /// The user is dragging an item by its image.
    DraggingItem {
        id: ItemId,
        /// Canvas-space offset from the item's top-left to the grab point.
        grab_offset: Point,
        /// Screen position of the previous pointer event.
        last_screen: Point,
        /// Total pointer travel in screen pixels since pointer-down.
        travelled: f64,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
