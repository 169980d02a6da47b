//! Persisted layout document (`images.json`).
//!
//! The document is a seed, not an authority: restored `y` values are only
//! where items start before the one-time settle pass takes bottom baselines.
//! Missing or falsy fields fall back to defaults the same way the page always
//! has (`scale` 0 → 1, `gridHeight` 0 → 1500, empty title → "Untitled").
//!
//! The engine never writes the document itself; [`LayoutDocument::capture`]
//! is the export path for a host that wants to save the current layout.

#[cfg(test)]
#[path = "persist_test.rs"]
mod persist_test;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_CANVAS_HEIGHT;
use crate::doc::{AnchorMode, DEFAULT_DESCRIPTION, DEFAULT_TITLE, GridItem, ItemId, ItemStore};
use crate::layout::CanvasGeometry;
use crate::transform::CanvasTransform;

/// Directory, relative to the page, that holds restored image files.
pub const IMAGES_DIR: &str = "images";

/// Top-level persisted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_state: Option<GridState>,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

/// Saved transform and canvas height.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_height: Option<f64>,
}

/// One saved image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: ItemId,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_to_top: Option<bool>,
}

fn truthy(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && v.is_finite())
}

fn non_empty(value: Option<&String>, default: &str) -> String {
    match value {
        Some(text) if !text.is_empty() => text.clone(),
        _ => default.to_owned(),
    }
}

impl GridState {
    /// The saved transform, with the scale re-clamped into bounds.
    #[must_use]
    pub fn transform(&self) -> CanvasTransform {
        CanvasTransform::new(
            truthy(self.pan_x).unwrap_or(0.0),
            truthy(self.pan_y).unwrap_or(0.0),
            truthy(self.scale).unwrap_or(1.0),
        )
    }

    #[must_use]
    pub fn canvas_height(&self) -> f64 {
        truthy(self.grid_height).unwrap_or(DEFAULT_CANVAS_HEIGHT)
    }
}

impl ImageRecord {
    /// Build the seeded grid item this record describes.
    #[must_use]
    pub fn to_item(&self) -> GridItem {
        let mut item = GridItem::seeded(
            self.id.clone(),
            self.filename.clone(),
            self.x.filter(|v| v.is_finite()).unwrap_or(0.0),
            self.y.filter(|v| v.is_finite()).unwrap_or(0.0),
        );
        item.original_name.clone_from(&self.original_name);
        item.title = non_empty(self.title.as_ref(), DEFAULT_TITLE);
        item.description = non_empty(self.description.as_ref(), DEFAULT_DESCRIPTION);
        item.scale_factor = self.scale.filter(|s| *s > 0.0 && s.is_finite()).unwrap_or(1.0);
        item.anchor = AnchorMode::from_fixed_flag(self.fixed_to_top.unwrap_or(false));
        item
    }

    /// Page-relative URL of the image file.
    #[must_use]
    pub fn image_src(&self) -> String {
        format!("{IMAGES_DIR}/{}", self.filename)
    }

    #[must_use]
    pub fn from_item(item: &GridItem) -> Self {
        Self {
            id: item.id.clone(),
            filename: item.filename.clone(),
            original_name: item.original_name.clone(),
            title: Some(item.title.clone()),
            description: Some(item.description.clone()),
            x: Some(item.x),
            y: Some(item.y),
            scale: Some(item.scale_factor),
            fixed_to_top: Some(item.anchor.is_fixed()),
        }
    }
}

impl LayoutDocument {
    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed or mistyped input.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Snapshot the current board as a document.
    #[must_use]
    pub fn capture(store: &ItemStore, geometry: &CanvasGeometry, transform: &CanvasTransform) -> Self {
        let mut items: Vec<&GridItem> = store.iter().collect();
        items.sort_by(|a, b| a.id.sequence().cmp(&b.id.sequence()).then_with(|| a.id.cmp(&b.id)));
        Self {
            grid_state: Some(GridState {
                scale: Some(transform.scale()),
                pan_x: Some(transform.pan_x),
                pan_y: Some(transform.pan_y),
                grid_height: Some(geometry.canvas_height()),
            }),
            images: items.into_iter().map(ImageRecord::from_item).collect(),
        }
    }

    /// Saved transform, or the identity when the document has none.
    #[must_use]
    pub fn transform(&self) -> CanvasTransform {
        self.grid_state.as_ref().map(GridState::transform).unwrap_or_default()
    }

    /// Saved canvas height, or the default when the document has none.
    #[must_use]
    pub fn canvas_height(&self) -> f64 {
        self.grid_state.as_ref().map_or(DEFAULT_CANVAS_HEIGHT, GridState::canvas_height)
    }

    /// Number of records flagged fixed-to-top.
    #[must_use]
    pub fn fixed_count(&self) -> usize {
        self.images.iter().filter(|r| r.fixed_to_top.unwrap_or(false)).count()
    }
}
