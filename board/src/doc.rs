//! Item layout store: grid items, their geometry, and the id / z-index counters.
//!
//! This module defines the entity placed on the board (`GridItem`), the
//! request type for adding one (`NewItem`), and the store that exclusively
//! owns every live item (`ItemStore`). Geometry is only ever mutated through
//! the store's methods; the renderer, hit-tester and resize coordinator read
//! from it.
//!
//! Both counters are fields of the store rather than free globals: ids are
//! allocated as `img_<n>` and never reused within a session, and z-indices
//! grow monotonically so the most recently touched item is frontmost.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{BASE_IMAGE_DIMENSION, CONTENT_PADDING, INITIAL_Z_INDEX, MAX_ITEM_SCALE, MIN_ITEM_SCALE};
use crate::error::BoardError;
use crate::layout::CanvasGeometry;

/// Default title for items restored without one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Default description for items without one.
pub const DEFAULT_DESCRIPTION: &str = "No description available.";

/// Unique identifier for a grid item, conventionally `img_<n>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// The id allocated for sequence number `n`.
    #[must_use]
    pub fn numbered(n: u64) -> Self {
        Self(format!("img_{n}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric suffix of an `img_<n>` id, reading leading digits only.
    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        let rest = self.0.strip_prefix("img_")?;
        let mut digits = rest.chars().take_while(char::is_ascii_digit).peekable();
        digits.peek()?;
        digits.try_fold(0u64, |acc, c| acc.checked_mul(10)?.checked_add(u64::from(c.to_digit(10)?)))
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Width and height in canvas units (or pixels, for natural image sizes).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Display size for an image of this natural size at `scale_factor`.
    ///
    /// The long edge becomes `BASE_IMAGE_DIMENSION * scale_factor` and the
    /// short edge keeps the aspect ratio. Square images use the height rule.
    #[must_use]
    pub fn fit_long_edge(self, scale_factor: f64) -> Size {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Size::default();
        }
        let aspect = self.width / self.height;
        let long_edge = BASE_IMAGE_DIMENSION * scale_factor;
        if self.width > self.height {
            Size::new(long_edge, long_edge / aspect)
        } else {
            Size::new(long_edge * aspect, long_edge)
        }
    }
}

/// How an item's vertical position is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnchorMode {
    /// Stacks from the top; contributes to the fixed block; never re-laid out.
    FixedToTop,
    /// Keeps a constant distance from the canvas bottom edge.
    #[default]
    DynamicBottomAnchored,
}

impl AnchorMode {
    #[must_use]
    pub fn from_fixed_flag(fixed_to_top: bool) -> Self {
        if fixed_to_top { Self::FixedToTop } else { Self::DynamicBottomAnchored }
    }

    #[must_use]
    pub fn is_fixed(self) -> bool {
        self == Self::FixedToTop
    }
}

/// How an item got its initial position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Position came from the layout document; finalization leaves siblings alone.
    Seeded,
    /// Freshly added at the top of the dynamic area and still waiting for its size.
    Inserted,
    /// Added, sized, and already pushed its older siblings down.
    Stacked,
}

impl Placement {
    fn was_added(self) -> bool {
        matches!(self, Self::Inserted | Self::Stacked)
    }
}

/// One image placed on the board.
#[derive(Debug, Clone)]
pub struct GridItem {
    pub id: ItemId,
    /// Stored file name, `<id>_<original name>` for added images.
    pub filename: String,
    pub original_name: String,
    pub title: String,
    pub description: String,
    /// Intrinsic pixel size, known once the image has decoded.
    pub natural_size: Option<Size>,
    pub scale_factor: f64,
    /// Rendered size in canvas units; zero until geometry is finalized.
    pub display: Size,
    /// Canvas-local left edge.
    pub x: f64,
    /// Canvas-local top edge.
    pub y: f64,
    pub anchor: AnchorMode,
    /// Cached `canvas_height - (y + display.height)` for dynamic items.
    pub distance_from_bottom: Option<f64>,
    pub z_index: u64,
    /// Whether the title/description overlay is shown.
    pub info_visible: bool,
    pub placement: Placement,
}

impl GridItem {
    /// A seeded item with default metadata and unknown natural size.
    #[must_use]
    pub fn seeded(id: ItemId, filename: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id,
            filename: filename.into(),
            original_name: String::new(),
            title: DEFAULT_TITLE.to_owned(),
            description: DEFAULT_DESCRIPTION.to_owned(),
            natural_size: None,
            scale_factor: 1.0,
            display: Size::default(),
            x,
            y,
            anchor: AnchorMode::DynamicBottomAnchored,
            distance_from_bottom: None,
            z_index: 0,
            info_visible: false,
            placement: Placement::Seeded,
        }
    }

    /// Bottom edge in canvas coordinates.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.display.height
    }

    /// Whether `(px, py)` lies inside the item's rendered rectangle.
    #[must_use]
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.display.width && py >= self.y && py <= self.bottom()
    }

    fn refresh_display(&mut self) {
        if let Some(natural) = self.natural_size {
            self.display = natural.fit_long_edge(self.scale_factor);
        }
    }

    fn refresh_distance(&mut self, canvas_height: f64) {
        if !self.anchor.is_fixed() {
            self.distance_from_bottom = Some(canvas_height - self.bottom());
        }
    }
}

/// Request to add a new image to the board.
#[derive(Debug, Clone)]
pub struct NewItem {
    /// File name as picked by the user.
    pub original_name: String,
    pub anchor: AnchorMode,
}

impl NewItem {
    #[must_use]
    pub fn dynamic(original_name: impl Into<String>) -> Self {
        Self { original_name: original_name.into(), anchor: AnchorMode::DynamicBottomAnchored }
    }
}

/// Whether a per-item scale factor is inside the open interval `(0.1, 10)`.
#[must_use]
pub fn is_valid_item_scale(scale: f64) -> bool {
    scale > MIN_ITEM_SCALE && scale < MAX_ITEM_SCALE
}

/// In-memory store of grid items plus the id and z-index counters.
#[derive(Debug)]
pub struct ItemStore {
    items: HashMap<ItemId, GridItem>,
    next_id: u64,
    next_z: u64,
}

impl ItemStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { items: HashMap::new(), next_id: 0, next_z: INITIAL_Z_INDEX }
    }

    /// Add a new image at the top of the dynamic area and return its id.
    ///
    /// Geometry stays zero-sized until [`ItemStore::finalize_geometry`] runs.
    pub fn add_item(&mut self, new: NewItem, geometry: &CanvasGeometry) -> ItemId {
        let id = ItemId::numbered(self.next_id);
        self.next_id += 1;

        let original_name = if new.original_name.is_empty() { "image.png".to_owned() } else { new.original_name };
        let mut item = GridItem::seeded(id.clone(), format!("{id}_{original_name}"), 0.0, geometry.dynamic_content_top());
        item.title.clone_from(&original_name);
        item.original_name = original_name;
        item.anchor = new.anchor;
        item.placement = Placement::Inserted;

        self.items.insert(id.clone(), item);
        id
    }

    /// Advance the id counter past every numeric suffix in `ids`.
    pub fn reserve_ids<'a>(&mut self, ids: impl IntoIterator<Item = &'a ItemId>) {
        for seq in ids.into_iter().filter_map(ItemId::sequence) {
            if seq >= self.next_id {
                self.next_id = seq.saturating_add(1);
            }
        }
    }

    /// Insert an item whose position is already known (restore path) and
    /// return the id it is stored under.
    ///
    /// Advances the id counter past the item's numeric suffix so restored
    /// ids are never handed out again. An id already taken by a live item
    /// is not overwritten: the incoming item gets a fresh id instead.
    pub fn insert_seeded(&mut self, mut item: GridItem) -> ItemId {
        self.reserve_ids([&item.id]);
        if self.items.contains_key(&item.id) {
            item.id = ItemId::numbered(self.next_id);
            self.next_id += 1;
        }
        let id = item.id.clone();
        self.items.insert(id.clone(), item);
        id
    }

    /// Record an item's natural size and derive its display size.
    ///
    /// A freshly added dynamic item pushes the dynamic items beneath it down
    /// by its own height plus padding, exactly once. Added items newer than
    /// it stay put, so a batch stacks newest-on-top whether or not its
    /// siblings have decoded yet. Each push is a delta on current positions,
    /// so the final stack does not depend on which image decodes first.
    /// Finalizing again with the same size is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownItem`] if the item does not exist.
    pub fn finalize_geometry(&mut self, id: &ItemId, natural: Size, geometry: &CanvasGeometry) -> Result<(), BoardError> {
        let item = self.items.get_mut(id).ok_or_else(|| BoardError::UnknownItem(id.clone()))?;
        if item.natural_size == Some(natural) {
            return Ok(());
        }
        item.natural_size = Some(natural);
        item.refresh_display();

        if item.anchor.is_fixed() || item.placement != Placement::Inserted {
            return Ok(());
        }
        item.placement = Placement::Stacked;
        item.refresh_distance(geometry.canvas_height());
        let push = item.display.height + CONTENT_PADDING;
        let sequence = id.sequence();

        for other in self.items.values_mut() {
            if &other.id == id || other.anchor.is_fixed() {
                continue;
            }
            if other.placement.was_added() && other.id.sequence() > sequence {
                continue;
            }
            other.y += push;
            other.refresh_distance(geometry.canvas_height());
        }
        Ok(())
    }

    /// Change an item's scale factor. Position is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidScale`] outside `(0.1, 10)` and
    /// [`BoardError::UnknownItem`] if the item does not exist.
    pub fn set_scale(&mut self, id: &ItemId, scale: f64) -> Result<(), BoardError> {
        if !is_valid_item_scale(scale) {
            return Err(BoardError::InvalidScale { requested: scale });
        }
        let item = self.items.get_mut(id).ok_or_else(|| BoardError::UnknownItem(id.clone()))?;
        item.scale_factor = scale;
        item.refresh_display();
        Ok(())
    }

    /// Move an item's top-left corner. Used for every intermediate drag frame.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownItem`] if the item does not exist.
    pub fn set_position(&mut self, id: &ItemId, x: f64, y: f64) -> Result<(), BoardError> {
        let item = self.items.get_mut(id).ok_or_else(|| BoardError::UnknownItem(id.clone()))?;
        item.x = x;
        item.y = y;
        Ok(())
    }

    /// Re-derive a dynamic item's distance from the bottom once a move settles.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownItem`] if the item does not exist.
    pub fn commit_position(&mut self, id: &ItemId, geometry: &CanvasGeometry) -> Result<(), BoardError> {
        let item = self.items.get_mut(id).ok_or_else(|| BoardError::UnknownItem(id.clone()))?;
        item.refresh_distance(geometry.canvas_height());
        Ok(())
    }

    /// Remove an item by id, returning it if it was present.
    pub fn remove(&mut self, id: &ItemId) -> Option<GridItem> {
        self.items.remove(id)
    }

    /// Move an item to the front, returning its new z-index.
    pub fn bump_z_index(&mut self, id: &ItemId) -> Option<u64> {
        let item = self.items.get_mut(id)?;
        item.z_index = self.next_z;
        self.next_z += 1;
        Some(item.z_index)
    }

    /// Flip an item's info overlay, returning the new visibility.
    pub fn toggle_info(&mut self, id: &ItemId) -> Option<bool> {
        let item = self.items.get_mut(id)?;
        item.info_visible = !item.info_visible;
        Some(item.info_visible)
    }

    /// Sum of rendered heights of all fixed-to-top items.
    #[must_use]
    pub fn fixed_content_height(&self) -> f64 {
        self.items
            .values()
            .filter(|item| item.anchor.is_fixed())
            .map(|item| item.display.height)
            .sum()
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&GridItem> {
        self.items.get(id)
    }

    /// Iterate over items in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &GridItem> {
        self.items.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut GridItem> {
        self.items.values_mut()
    }

    /// All items in draw order: `(z_index, id sequence, id)`, back to front.
    #[must_use]
    pub fn sorted_items(&self) -> Vec<&GridItem> {
        let mut items: Vec<&GridItem> = self.items.values().collect();
        items.sort_by(|a, b| {
            a.z_index
                .cmp(&b.z_index)
                .then_with(|| a.id.sequence().cmp(&b.id.sequence()))
                .then_with(|| a.id.cmp(&b.id))
        });
        items
    }

    /// The id the next `add_item` will allocate.
    #[must_use]
    pub fn peek_next_id(&self) -> ItemId {
        ItemId::numbered(self.next_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}
