//! Canvas resize coordination: bottom-anchoring of dynamic items.
//!
//! DESIGN
//! ======
//! A dynamic item's durable vertical property is its distance from the
//! canvas bottom edge, not its absolute `y`. Whenever the canvas height or
//! the fixed block changes, [`relayout`] re-derives every dynamic item's `y`
//! from that cached distance, clamped so nothing rises into the fixed block.
//!
//! The first relayout is special. Restored `y` values are only seeds, and
//! baselines taken before images decode would use placeholder heights. So
//! [`DecodeBarrier`] tracks every pending decode of the restore batch and
//! [`settle`] runs exactly once, after the last one completes, taking each
//! baseline from the as-placed position.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use std::collections::HashSet;

use crate::consts::{CANVAS_FLOOR_MARGIN, CONTENT_PADDING, DEFAULT_CANVAS_HEIGHT};
use crate::doc::{ItemId, ItemStore};

/// Vertical extent of the canvas and of its fixed-to-top block.
///
/// Invariant: `canvas_height >= fixed_content_height + 100`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasGeometry {
    canvas_height: f64,
    fixed_content_height: f64,
}

impl Default for CanvasGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_HEIGHT)
    }
}

impl CanvasGeometry {
    /// Geometry with no fixed content and the given (floor-clamped) height.
    #[must_use]
    pub fn new(canvas_height: f64) -> Self {
        let mut geometry = Self { canvas_height: DEFAULT_CANVAS_HEIGHT, fixed_content_height: 0.0 };
        geometry.set_canvas_height(canvas_height);
        geometry
    }

    #[must_use]
    pub fn canvas_height(&self) -> f64 {
        self.canvas_height
    }

    #[must_use]
    pub fn fixed_content_height(&self) -> f64 {
        self.fixed_content_height
    }

    /// Smallest height the canvas may take.
    #[must_use]
    pub fn min_canvas_height(&self) -> f64 {
        self.fixed_content_height + CANVAS_FLOOR_MARGIN
    }

    /// Where newly added dynamic items are placed.
    #[must_use]
    pub fn dynamic_content_top(&self) -> f64 {
        self.fixed_content_height + CONTENT_PADDING
    }

    /// Set the canvas height, raising it to the floor if needed. Returns the applied height.
    pub fn set_canvas_height(&mut self, height: f64) -> f64 {
        let floor = self.min_canvas_height();
        self.canvas_height = if height.is_nan() { floor } else { height.max(floor) };
        self.canvas_height
    }

    /// Record a new fixed block height, raising the canvas to keep the floor.
    pub fn set_fixed_content_height(&mut self, height: f64) {
        self.fixed_content_height = height;
        if self.canvas_height < self.min_canvas_height() {
            self.canvas_height = self.min_canvas_height();
        }
    }
}

/// Re-sum the fixed block from the store into `geometry`.
pub fn recompute_fixed_content_height(store: &ItemStore, geometry: &mut CanvasGeometry) {
    geometry.set_fixed_content_height(store.fixed_content_height());
}

/// Re-derive every dynamic item's `y` from its cached distance from the bottom.
///
/// Items that never had a baseline take one from their current position first.
pub fn relayout(store: &mut ItemStore, geometry: &mut CanvasGeometry) {
    recompute_fixed_content_height(store, geometry);
    let canvas_height = geometry.canvas_height();
    let floor = geometry.fixed_content_height();

    for item in store.iter_mut() {
        if item.anchor.is_fixed() {
            continue;
        }
        let bottom = item.bottom();
        let distance = *item.distance_from_bottom.get_or_insert(canvas_height - bottom);
        let y = canvas_height - item.display.height - distance;
        item.y = y.max(floor);
    }
}

/// One-time baseline pass: every dynamic item's distance is taken from where it sits now.
pub fn settle(store: &mut ItemStore, geometry: &mut CanvasGeometry) {
    recompute_fixed_content_height(store, geometry);
    let canvas_height = geometry.canvas_height();
    for item in store.iter_mut() {
        if !item.anchor.is_fixed() {
            item.distance_from_bottom = Some(canvas_height - item.bottom());
        }
    }
    relayout(store, geometry);
}

/// Change the canvas height while preserving every dynamic item's gap to the bottom.
///
/// Returns the applied (floor-clamped) height.
pub fn resize_canvas(store: &mut ItemStore, geometry: &mut CanvasGeometry, height: f64) -> f64 {
    recompute_fixed_content_height(store, geometry);
    let old_height = geometry.canvas_height();
    for item in store.iter_mut() {
        if !item.anchor.is_fixed() && item.distance_from_bottom.is_none() {
            item.distance_from_bottom = Some(old_height - item.bottom());
        }
    }
    let applied = geometry.set_canvas_height(height);
    relayout(store, geometry);
    applied
}

/// Phase of the restore-batch decode barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarrierState {
    /// No restore batch has been registered yet.
    #[default]
    Unarmed,
    /// Waiting for the listed decodes to finish.
    Waiting,
    /// Every decode finished; the settle pass may run (once).
    Released,
}

/// Join over the pending image decodes of the restore batch.
///
/// Completions may arrive in any order and more than once; an id only counts
/// the first time. The barrier releases exactly once.
#[derive(Debug, Default)]
pub struct DecodeBarrier {
    pending: HashSet<ItemId>,
    state: BarrierState,
}

impl DecodeBarrier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the restore batch. Returns `true` if the barrier released
    /// immediately because the batch was empty.
    ///
    /// Arming is one-shot; later calls are ignored and return `false`.
    pub fn arm(&mut self, ids: impl IntoIterator<Item = ItemId>) -> bool {
        if self.state != BarrierState::Unarmed {
            return false;
        }
        self.pending = ids.into_iter().collect();
        self.state = BarrierState::Waiting;
        self.release_if_drained()
    }

    /// Mark one decode as finished (successfully or not, or because its item
    /// was deleted). Returns `true` on the call that releases the barrier.
    pub fn complete(&mut self, id: &ItemId) -> bool {
        if !self.pending.remove(id) {
            return false;
        }
        self.release_if_drained()
    }

    #[must_use]
    pub fn state(&self) -> BarrierState {
        self.state
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn release_if_drained(&mut self) -> bool {
        if self.state == BarrierState::Waiting && self.pending.is_empty() {
            self.state = BarrierState::Released;
            return true;
        }
        false
    }
}
