//! Shared numeric constants for the board crate.

// ── Transform ───────────────────────────────────────────────────

/// Smallest allowed canvas scale.
pub const MIN_SCALE: f64 = 0.25;

/// Largest allowed canvas scale.
pub const MAX_SCALE: f64 = 5.0;

/// Scale multiplier applied by one wheel step away from the user (zoom out).
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

/// Scale multiplier applied by one wheel step toward the user (zoom in).
pub const ZOOM_IN_FACTOR: f64 = 1.1;

// ── Items ───────────────────────────────────────────────────────

/// Long-edge length in canvas units of an item at scale factor 1.
pub const BASE_IMAGE_DIMENSION: f64 = 400.0;

/// Exclusive lower bound for a per-item scale factor.
pub const MIN_ITEM_SCALE: f64 = 0.1;

/// Exclusive upper bound for a per-item scale factor.
pub const MAX_ITEM_SCALE: f64 = 10.0;

/// Vertical gap between the fixed block and newly placed dynamic items.
pub const CONTENT_PADDING: f64 = 20.0;

/// First z-index handed out; everything below is reserved for board chrome.
pub const INITIAL_Z_INDEX: u64 = 10;

// ── Canvas ──────────────────────────────────────────────────────

/// Canvas height used when the layout document does not provide one.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 1500.0;

/// Minimum headroom between the fixed block and the canvas bottom edge.
pub const CANVAS_FLOOR_MARGIN: f64 = 100.0;

// ── Gestures ────────────────────────────────────────────────────

/// Pointer travel in screen pixels above which a gesture counts as a drag.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// How long after a drag ends its trailing click is swallowed, in milliseconds.
pub const CLICK_SUPPRESS_MS: f64 = 50.0;

// ── Info overlay ────────────────────────────────────────────────

/// Height of the info overlay band drawn over the bottom of an item.
pub const INFO_OVERLAY_HEIGHT: f64 = 72.0;

/// Height of the link row at the bottom of the info overlay.
pub const INFO_LINK_ROW_HEIGHT: f64 = 20.0;
