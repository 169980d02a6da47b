//! Ruler readout: an item's canvas-local geometry for the debug overlay.

#[cfg(test)]
#[path = "ruler_test.rs"]
mod ruler_test;

use serde::Serialize;

use crate::doc::{GridItem, ItemId};
use crate::transform::{CanvasTransform, Point};

/// What the horizontal and vertical rulers show for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RulerReadout {
    pub id: ItemId,
    /// Canvas-local left edge, rounded.
    pub x: f64,
    /// Canvas-local top edge, rounded.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Screen position of the item's top-left corner, where both rulers start.
    pub screen: Point,
}

impl RulerReadout {
    #[must_use]
    pub fn for_item(item: &GridItem, transform: &CanvasTransform) -> Self {
        Self {
            id: item.id.clone(),
            x: whole(item.x),
            y: whole(item.y),
            width: whole(item.display.width),
            height: whole(item.display.height),
            screen: transform.canvas_to_screen(Point::new(item.x, item.y)),
        }
    }

    /// Label for the horizontal ruler.
    #[must_use]
    pub fn x_label(&self) -> String {
        format!("X: {}px, Width: {}px", self.x, self.width)
    }

    /// Label for the vertical ruler.
    #[must_use]
    pub fn y_label(&self) -> String {
        format!("Y: {}px, Height: {}px", self.y, self.height)
    }
}

// Adding 0.0 folds -0.0 into 0.0 so labels never read "-0px".
fn whole(value: f64) -> f64 {
    value.round() + 0.0
}
