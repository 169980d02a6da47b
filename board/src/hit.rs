#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::{INFO_LINK_ROW_HEIGHT, INFO_OVERLAY_HEIGHT};
use crate::doc::{GridItem, ItemId, ItemStore};
use crate::transform::Point;

/// Which part of an item was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    /// The image itself; the only part that starts a drag.
    Image,
    /// The info overlay chrome (title and description).
    Overlay,
    /// The link row at the bottom of the info overlay.
    Link,
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub id: ItemId,
    pub part: HitPart,
}

/// Vertical band `(top, bottom)` covered by an item's info overlay, if shown.
#[must_use]
pub fn overlay_band(item: &GridItem) -> Option<(f64, f64)> {
    if !item.info_visible {
        return None;
    }
    let bottom = item.bottom();
    Some((bottom - INFO_OVERLAY_HEIGHT.min(item.display.height), bottom))
}

/// The first `http://` or `https://` token in a description.
#[must_use]
pub fn link_url(description: &str) -> Option<&str> {
    description
        .split_whitespace()
        .find(|token| token.starts_with("https://") || token.starts_with("http://"))
}

/// Frontmost item under `canvas_pt` and the part that was hit.
#[must_use]
pub fn hit_test(canvas_pt: Point, store: &ItemStore) -> Option<Hit> {
    let item = store
        .sorted_items()
        .into_iter()
        .rev()
        .find(|item| item.contains(canvas_pt.x, canvas_pt.y))?;

    let part = match overlay_band(item) {
        Some((top, bottom)) if canvas_pt.y >= top => {
            let has_link = link_url(&item.description).is_some();
            if has_link && canvas_pt.y >= bottom - INFO_LINK_ROW_HEIGHT {
                HitPart::Link
            } else {
                HitPart::Overlay
            }
        }
        _ => HitPart::Image,
    };
    Some(Hit { id: item.id.clone(), part })
}
