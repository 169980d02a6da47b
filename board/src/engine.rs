//! Board engine: the state machine behind the canvas.
//!
//! [`EngineCore`] owns the transform, the item store, the layout geometry and
//! the input state, and answers every event with a list of [`Action`]s for the
//! host. It never touches the DOM, so it runs in native tests. [`Engine`]
//! wraps it with the canvas element, its 2D context and the decoded bitmaps.

use std::collections::HashMap;

use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::consts::{CLICK_SUPPRESS_MS, DRAG_THRESHOLD_PX};
use crate::doc::{ItemId, ItemStore, NewItem, Size};
use crate::error::BoardError;
use crate::hit::{self, HitPart};
use crate::input::{Button, InputState, SuppressedClick, UiState, WheelDelta};
use crate::layout::{self, BarrierState, CanvasGeometry, DecodeBarrier};
use crate::persist::LayoutDocument;
use crate::render;
use crate::ruler::RulerReadout;
use crate::transform::{CanvasTransform, Point};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers and commands for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    RenderNeeded,
    SetCursor { cursor: &'static str },
    ItemMoved { id: ItemId, x: f64, y: f64 },
    InfoToggled { id: ItemId, visible: bool },
    ContextMenuRequested { screen: Point, item: Option<ItemId> },
    OpenLink { url: String },
    RulerChanged { readout: Option<RulerReadout> },
    CanvasResized { height: f64 },
    ItemRemoved { id: ItemId },
    LayoutSettled,
}

/// An image the host must decode before the item's geometry is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeRequest {
    pub id: ItemId,
    pub src: String,
}

/// Core engine state holding all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
#[derive(Debug)]
pub struct EngineCore {
    pub store: ItemStore,
    pub geometry: CanvasGeometry,
    pub transform: CanvasTransform,
    pub ui: UiState,
    pub input: InputState,
    pub decodes: DecodeBarrier,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            store: ItemStore::new(),
            geometry: CanvasGeometry::default(),
            transform: CanvasTransform::default(),
            ui: UiState::default(),
            input: InputState::default(),
            decodes: DecodeBarrier::new(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Data inputs ---

    /// Hydrate from the persisted document and return the decodes to start.
    ///
    /// The one-time settle pass runs when the last of these completes (or
    /// right away when the document has no images).
    pub fn restore(&mut self, doc: &LayoutDocument) -> Vec<DecodeRequest> {
        self.transform = doc.transform();
        self.geometry = CanvasGeometry::new(doc.canvas_height());

        self.store.reserve_ids(doc.images.iter().map(|record| &record.id));
        let mut requests = Vec::with_capacity(doc.images.len());
        for record in &doc.images {
            let id = self.store.insert_seeded(record.to_item());
            if id != record.id {
                log::warn!("restored {} collides with a live item; keeping it as {id}", record.id);
            }
            requests.push(DecodeRequest { id, src: record.image_src() });
        }
        log::info!("restored {} images ({} fixed to top)", doc.images.len(), doc.fixed_count());

        if self.decodes.arm(requests.iter().map(|r| r.id.clone())) {
            self.settle();
        }
        requests
    }

    /// Start with an empty board (no document, or it failed to load).
    pub fn restore_empty(&mut self) {
        if self.decodes.arm(Vec::new()) {
            self.settle();
        }
    }

    /// Place a newly picked image at the top of the dynamic area.
    pub fn add_image(&mut self, original_name: &str) -> ItemId {
        self.store.add_item(NewItem::dynamic(original_name), &self.geometry)
    }

    /// Record a finished decode and derive the item's display size.
    pub fn finalize_geometry(&mut self, id: &ItemId, natural_width: f64, natural_height: f64) -> Vec<Action> {
        let natural = Size::new(natural_width, natural_height);
        if let Err(err) = self.store.finalize_geometry(id, natural, &self.geometry) {
            log::debug!("decode finished for a removed item: {err}");
        }
        let mut actions = Vec::new();
        self.refresh_fixed_block();
        self.complete_decode(id, &mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Record a decode that failed; the item keeps its placeholder size.
    pub fn abandon_decode(&mut self, id: &ItemId) -> Vec<Action> {
        log::warn!("image {id} failed to decode");
        let mut actions = Vec::new();
        self.complete_decode(id, &mut actions);
        actions
    }

    /// Snapshot the board for saving.
    #[must_use]
    pub fn export_layout(&self) -> LayoutDocument {
        LayoutDocument::capture(&self.store, &self.geometry, &self.transform)
    }

    fn complete_decode(&mut self, id: &ItemId, actions: &mut Vec<Action>) {
        if self.decodes.complete(id) {
            self.settle();
            actions.push(Action::LayoutSettled);
            actions.push(Action::RenderNeeded);
        }
    }

    fn settle(&mut self) {
        layout::settle(&mut self.store, &mut self.geometry);
        log::info!(
            "layout settled: canvas {}px, fixed block {}px",
            self.geometry.canvas_height(),
            self.geometry.fixed_content_height()
        );
    }

    /// Re-sum the fixed block; re-anchor dynamic items if it or the canvas changed.
    ///
    /// Skipped while the restore batch is still decoding: baselines taken
    /// from placeholder heights would be wrong.
    fn refresh_fixed_block(&mut self) {
        let before = self.geometry;
        layout::recompute_fixed_content_height(&self.store, &mut self.geometry);
        if before != self.geometry && self.decodes.state() != BarrierState::Waiting {
            layout::relayout(&mut self.store, &mut self.geometry);
        }
    }

    // --- Commands ---

    /// Change the canvas height from the context menu.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidHeight`] for non-finite values or values
    /// below `fixed_content_height + 100`.
    pub fn set_canvas_height(&mut self, height: f64) -> Result<Vec<Action>, BoardError> {
        layout::recompute_fixed_content_height(&self.store, &mut self.geometry);
        let minimum = self.geometry.min_canvas_height();
        if !height.is_finite() || height < minimum {
            return Err(BoardError::InvalidHeight { requested: height, minimum });
        }
        let applied = layout::resize_canvas(&mut self.store, &mut self.geometry, height);
        Ok(vec![Action::CanvasResized { height: applied }, Action::RenderNeeded])
    }

    /// Change one item's scale factor from the context menu.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidScale`] outside `(0.1, 10)` and
    /// [`BoardError::UnknownItem`] if the item does not exist.
    pub fn set_item_scale(&mut self, id: &ItemId, scale: f64) -> Result<Vec<Action>, BoardError> {
        self.store.set_scale(id, scale)?;
        self.refresh_fixed_block();
        Ok(vec![Action::RenderNeeded])
    }

    /// Delete an item (the host has already confirmed with the user).
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownItem`] if the item does not exist.
    pub fn delete_item(&mut self, id: &ItemId) -> Result<Vec<Action>, BoardError> {
        self.store.remove(id).ok_or_else(|| BoardError::UnknownItem(id.clone()))?;

        let mut actions = vec![Action::ItemRemoved { id: id.clone() }];
        if matches!(&self.input, InputState::DraggingItem { id: dragged, .. } if dragged == id) {
            self.input = InputState::Idle;
        }
        if self.ui.hovered.as_ref() == Some(id) {
            self.ui.hovered = None;
            if self.ui.rulers_enabled {
                actions.push(Action::RulerChanged { readout: None });
            }
        }
        self.complete_decode(id, &mut actions);
        self.refresh_fixed_block();
        actions.push(Action::RenderNeeded);
        Ok(actions)
    }

    /// Flip the ruler overlay and return the new checkbox state.
    pub fn toggle_rulers(&mut self) -> bool {
        self.ui.rulers_enabled = !self.ui.rulers_enabled;
        self.ui.rulers_enabled
    }

    /// Update viewport dimensions and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = if dpr > 0.0 { dpr } else { 1.0 };
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        if !self.input.is_idle() {
            return Vec::new();
        }
        let canvas_pt = self.transform.screen_to_canvas(screen_pt);
        let hit = hit::hit_test(canvas_pt, &self.store);

        match button {
            Button::Secondary => {
                vec![Action::ContextMenuRequested { screen: screen_pt, item: hit.map(|h| h.id) }]
            }
            Button::Middle => Vec::new(),
            Button::Primary => match hit {
                None => {
                    self.input = InputState::Panning { last_screen: screen_pt };
                    vec![Action::SetCursor { cursor: "grabbing" }]
                }
                Some(hit) if hit.part == HitPart::Image => self.start_drag(hit.id, canvas_pt, screen_pt),
                Some(_) => Vec::new(),
            },
        }
    }

    fn start_drag(&mut self, id: ItemId, canvas_pt: Point, screen_pt: Point) -> Vec<Action> {
        let Some(item) = self.store.get(&id) else {
            return Vec::new();
        };
        let grab_offset = Point::new(canvas_pt.x - item.x, canvas_pt.y - item.y);
        self.store.bump_z_index(&id);
        self.input = InputState::DraggingItem { id, grab_offset, last_screen: screen_pt, travelled: 0.0 };
        vec![Action::SetCursor { cursor: "grabbing" }, Action::RenderNeeded]
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        if self.input.is_idle() {
            return self.update_hover(screen_pt);
        }
        match &mut self.input {
            InputState::Idle => Vec::new(),
            InputState::Panning { last_screen } => {
                let (dx, dy) = (screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                *last_screen = screen_pt;
                self.transform.pan(dx, dy);
                vec![Action::RenderNeeded]
            }
            InputState::DraggingItem { id, grab_offset, last_screen, travelled } => {
                *travelled += last_screen.distance_to(screen_pt);
                *last_screen = screen_pt;
                let id = id.clone();
                let canvas_pt = self.transform.screen_to_canvas(screen_pt);
                let (x, y) = (canvas_pt.x - grab_offset.x, canvas_pt.y - grab_offset.y);
                if self.store.set_position(&id, x, y).is_err() {
                    self.input = InputState::Idle;
                    return Vec::new();
                }
                let mut actions = vec![Action::RenderNeeded];
                if self.ui.rulers_enabled {
                    self.ui.hovered = Some(id.clone());
                    actions.push(Action::RulerChanged { readout: self.readout(&id) });
                }
                actions
            }
        }
    }

    pub fn on_pointer_up(&mut self, _screen_pt: Point, _button: Button, time_ms: f64) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Panning { .. } => vec![Action::SetCursor { cursor: "default" }],
            InputState::DraggingItem { id, travelled, .. } => {
                self.store.bump_z_index(&id);
                if travelled > DRAG_THRESHOLD_PX {
                    self.ui.suppressed_click =
                        Some(SuppressedClick { id: id.clone(), until_ms: time_ms + CLICK_SUPPRESS_MS });
                }
                if self.store.commit_position(&id, &self.geometry).is_err() {
                    return vec![Action::SetCursor { cursor: "default" }];
                }
                let mut actions = vec![Action::SetCursor { cursor: "grab" }];
                if let Some(item) = self.store.get(&id) {
                    actions.push(Action::ItemMoved { id: id.clone(), x: item.x, y: item.y });
                }
                actions.push(Action::RenderNeeded);
                actions
            }
        }
    }

    /// The synthetic click that follows pointer-up.
    pub fn on_click(&mut self, screen_pt: Point, time_ms: f64) -> Vec<Action> {
        if let Some(suppressed) = self.ui.suppressed_click.take() {
            if time_ms <= suppressed.until_ms {
                return Vec::new();
            }
        }
        let canvas_pt = self.transform.screen_to_canvas(screen_pt);
        let Some(hit) = hit::hit_test(canvas_pt, &self.store) else {
            return Vec::new();
        };
        if hit.part == HitPart::Link {
            let url = self.store.get(&hit.id).and_then(|item| hit::link_url(&item.description)).map(str::to_owned);
            return url.map(|url| vec![Action::OpenLink { url }]).unwrap_or_default();
        }
        match self.store.toggle_info(&hit.id) {
            Some(visible) => vec![Action::InfoToggled { id: hit.id, visible }, Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        self.transform.zoom_at(screen_pt, delta.dy);
        vec![Action::RenderNeeded]
    }

    fn update_hover(&mut self, screen_pt: Point) -> Vec<Action> {
        let canvas_pt = self.transform.screen_to_canvas(screen_pt);
        let hovered = hit::hit_test(canvas_pt, &self.store).map(|h| h.id);
        if hovered == self.ui.hovered {
            return Vec::new();
        }
        let cursor = if hovered.is_some() { "grab" } else { "default" };
        self.ui.hovered = hovered;

        let mut actions = vec![Action::SetCursor { cursor }];
        if self.ui.rulers_enabled {
            let readout = self.ui.hovered.as_ref().and_then(|id| self.readout(id));
            actions.push(Action::RulerChanged { readout });
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    // --- Queries ---

    /// Ruler readout for an item under the current transform.
    #[must_use]
    pub fn readout(&self, id: &ItemId) -> Option<RulerReadout> {
        self.store.get(id).map(|item| RulerReadout::for_item(item, &self.transform))
    }

    /// Whether the restore batch has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.decodes.state() == BarrierState::Released
    }
}

/// The full board engine. Wraps `EngineCore` and owns the browser canvas and decoded images.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: HashMap<ItemId, HtmlImageElement>,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx, images: HashMap::new(), core: EngineCore::new() })
    }

    /// Keep a decoded image for drawing and finalize the item's geometry.
    pub fn image_decoded(&mut self, id: &ItemId, image: HtmlImageElement) -> Vec<Action> {
        let (w, h) = (f64::from(image.natural_width()), f64::from(image.natural_height()));
        if self.core.store.get(id).is_some() {
            self.images.insert(id.clone(), image);
        }
        self.core.finalize_geometry(id, w, h)
    }

    /// Delete an item and forget its decoded image.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownItem`] if the item does not exist.
    pub fn delete_item(&mut self, id: &ItemId) -> Result<Vec<Action>, BoardError> {
        let actions = self.core.delete_item(id)?;
        self.images.remove(id);
        Ok(actions)
    }

    /// Resize the backing store to the viewport and device pixel ratio.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.set_viewport(width_css, height_css, dpr);
        let scaled = |css: f64| (css * self.core.dpr).round().clamp(0.0, f64::from(u32::MAX));
        self.canvas.set_width(scaled(width_css) as u32);
        self.canvas.set_height(scaled(height_css) as u32);
    }

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        render::draw(&self.ctx, &self.core, &self.images)
    }
}
