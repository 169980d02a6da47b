//! Rendering: draws the board to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It reads the engine state and produces pixels. It does not mutate any
//! application state.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::consts::INFO_LINK_ROW_HEIGHT;
use crate::doc::{GridItem, ItemId};
use crate::engine::EngineCore;
use crate::hit;
use crate::input::InputState;
use crate::ruler::RulerReadout;
use crate::transform::Point;

/// Padding inside the info overlay, in canvas units.
const OVERLAY_INSET: f64 = 8.0;

/// Ruler label font size in screen pixels.
const RULER_FONT_PX: f64 = 11.0;

/// Draw the full scene: canvas bounds, items, overlays and rulers.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    core: &EngineCore,
    images: &HashMap<ItemId, HtmlImageElement>,
) -> Result<(), JsValue> {
    let (vw, vh) = (core.viewport_width, core.viewport_height);

    // Layer 1: clear in screen space.
    ctx.set_transform(core.dpr, 0.0, 0.0, core.dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, vw, vh);

    // Layer 2: canvas-local content under the pan/zoom transform.
    ctx.save();
    ctx.translate(core.transform.pan_x, core.transform.pan_y)?;
    let scale = core.transform.scale();
    ctx.scale(scale, scale)?;

    let left = core.transform.screen_to_canvas(Point::new(0.0, 0.0)).x;
    let right = core.transform.screen_to_canvas(Point::new(vw, vh)).x;
    draw_bounds(ctx, core, left, right)?;

    let dragging = match &core.input {
        InputState::DraggingItem { id, .. } => Some(id),
        _ => None,
    };
    for item in core.store.sorted_items() {
        draw_item(ctx, item, images.get(&item.id), dragging == Some(&item.id), scale)?;
    }
    ctx.restore();

    // Layer 3: rulers in screen space.
    if core.ui.rulers_enabled {
        if let Some(readout) = core.ui.hovered.as_ref().and_then(|id| core.readout(id)) {
            draw_rulers(ctx, &readout, vw, vh)?;
        }
    }
    Ok(())
}

/// Canvas bottom edge and the top of the dynamic area.
fn draw_bounds(ctx: &CanvasRenderingContext2d, core: &EngineCore, left: f64, right: f64) -> Result<(), JsValue> {
    let scale = core.transform.scale();
    let height = core.geometry.canvas_height();

    ctx.set_fill_style_str("rgba(60, 64, 70, 0.04)");
    ctx.fill_rect(left, 0.0, right - left, height);

    ctx.set_line_width(1.0 / scale);
    ctx.set_stroke_style_str("rgba(31, 26, 23, 0.35)");
    let dash = js_sys::Array::of2(&JsValue::from_f64(6.0 / scale), &JsValue::from_f64(4.0 / scale));
    ctx.set_line_dash(&dash)?;
    ctx.begin_path();
    ctx.move_to(left, height);
    ctx.line_to(right, height);
    ctx.stroke();

    let fixed = core.geometry.fixed_content_height();
    if fixed > 0.0 {
        ctx.set_stroke_style_str("rgba(31, 26, 23, 0.15)");
        ctx.begin_path();
        ctx.move_to(left, fixed);
        ctx.line_to(right, fixed);
        ctx.stroke();
    }
    ctx.set_line_dash(&js_sys::Array::new())?;
    Ok(())
}

fn draw_item(
    ctx: &CanvasRenderingContext2d,
    item: &GridItem,
    image: Option<&HtmlImageElement>,
    dragging: bool,
    scale: f64,
) -> Result<(), JsValue> {
    let (x, y, w, h) = (item.x, item.y, item.display.width, item.display.height);

    if let Some(image) = image {
        if dragging {
            ctx.set_shadow_color("rgba(0, 0, 0, 0.35)");
            ctx.set_shadow_blur(18.0);
        }
        ctx.draw_image_with_html_image_element_and_dw_and_dh(image, x, y, w, h)?;
        ctx.set_shadow_color("transparent");
        ctx.set_shadow_blur(0.0);
    } else {
        // Placeholder until the decode lands.
        ctx.set_fill_style_str("rgba(60, 64, 70, 0.08)");
        ctx.fill_rect(x, y, w, h);
    }

    if dragging {
        ctx.set_line_width(2.0 / scale);
        ctx.set_stroke_style_str("#1F1A17");
        ctx.stroke_rect(x, y, w, h);
    }

    if let Some((top, bottom)) = hit::overlay_band(item) {
        draw_overlay(ctx, item, top, bottom)?;
    }
    Ok(())
}

fn draw_overlay(ctx: &CanvasRenderingContext2d, item: &GridItem, top: f64, bottom: f64) -> Result<(), JsValue> {
    let (x, w) = (item.x, item.display.width);
    let text_w = (w - 2.0 * OVERLAY_INSET).max(0.0);

    ctx.set_fill_style_str("rgba(20, 20, 20, 0.72)");
    ctx.fill_rect(x, top, w, bottom - top);

    ctx.set_text_baseline("top");
    ctx.set_fill_style_str("#fff");
    ctx.set_font("bold 14px sans-serif");
    ctx.fill_text_with_max_width(&item.title, x + OVERLAY_INSET, top + OVERLAY_INSET, text_w)?;
    ctx.set_font("12px sans-serif");
    ctx.fill_text_with_max_width(&item.description, x + OVERLAY_INSET, top + OVERLAY_INSET + 20.0, text_w)?;

    if let Some(url) = hit::link_url(&item.description) {
        ctx.set_fill_style_str("#8ab4f8");
        ctx.set_text_baseline("middle");
        let row_mid = bottom - INFO_LINK_ROW_HEIGHT * 0.5;
        ctx.fill_text_with_max_width(url, x + OVERLAY_INSET, row_mid, text_w)?;
    }
    Ok(())
}

fn draw_rulers(ctx: &CanvasRenderingContext2d, readout: &RulerReadout, vw: f64, vh: f64) -> Result<(), JsValue> {
    let Point { x, y } = readout.screen;

    ctx.set_line_width(1.0);
    ctx.set_stroke_style_str("#d12b2b");
    ctx.begin_path();
    ctx.move_to(x, y);
    ctx.line_to(vw, y);
    ctx.move_to(x, y);
    ctx.line_to(x, vh);
    ctx.stroke();

    ctx.set_fill_style_str("#d12b2b");
    ctx.set_font(&format!("{RULER_FONT_PX:.0}px monospace"));
    ctx.set_text_baseline("bottom");
    ctx.fill_text(&readout.x_label(), x + 4.0, y - 2.0)?;
    ctx.save();
    ctx.translate(x - 2.0, y + 4.0)?;
    ctx.rotate(std::f64::consts::FRAC_PI_2)?;
    ctx.fill_text(&readout.y_label(), 0.0, 0.0)?;
    ctx.restore();
    Ok(())
}
