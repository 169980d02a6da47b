//! JavaScript surface of the board.
//!
//! The page owns exactly one engine, mounted on a canvas element and kept in
//! a thread-local slot. Every exported handler returns the resulting
//! [`Action`]s as a JSON array; when the list contains `render_needed` the
//! scene is redrawn before returning. Work that finishes asynchronously
//! (layout fetch, image decodes) reports its actions to the listener
//! registered with [`set_action_listener`].

use std::cell::RefCell;

use gloo_net::http::Request;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{HtmlCanvasElement, HtmlImageElement};

use crate::doc::ItemId;
use crate::engine::{Action, DecodeRequest, Engine};
use crate::error::BoardError;
use crate::input::{Button, WheelDelta};
use crate::persist::LayoutDocument;
use crate::transform::Point;

thread_local! {
    static ENGINE: RefCell<Option<Engine>> = const { RefCell::new(None) };
    static LISTENER: RefCell<Option<js_sys::Function>> = const { RefCell::new(None) };
}

/// Why the persisted layout could not be loaded.
#[derive(Debug, thiserror::Error)]
enum LoadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] gloo_net::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("malformed layout: {0}")]
    Parse(#[from] serde_json::Error),
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        log::warn!("logger already installed: {err}");
    }
}

fn not_mounted() -> JsValue {
    JsValue::from_str("board is not mounted")
}

fn with_engine<R>(f: impl FnOnce(&mut Engine) -> R) -> Result<R, JsValue> {
    ENGINE.with(|cell| cell.borrow_mut().as_mut().map(f).ok_or_else(not_mounted))
}

fn render_now() {
    ENGINE.with(|cell| {
        if let Some(engine) = cell.borrow().as_ref() {
            if let Err(err) = engine.render() {
                log::error!("render failed: {err:?}");
            }
        }
    });
}

/// Redraw if asked to and serialize the actions for the host.
fn finish(actions: &[Action]) -> String {
    if actions.contains(&Action::RenderNeeded) {
        render_now();
    }
    match serde_json::to_string(actions) {
        Ok(json) => json,
        Err(err) => {
            log::error!("failed to serialize actions: {err}");
            String::from("[]")
        }
    }
}

/// Deliver actions produced outside an exported call.
fn notify(actions: &[Action]) {
    if actions.is_empty() {
        return;
    }
    let json = finish(actions);
    let listener = LISTENER.with(|cell| cell.borrow().clone());
    if let Some(listener) = listener {
        if let Err(err) = listener.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            log::error!("action listener threw: {err:?}");
        }
    }
}

/// Bind the engine to the canvas with the given element id.
///
/// # Errors
///
/// Returns `Err` if there is no such canvas or it has no 2D context.
#[wasm_bindgen]
pub fn mount(canvas_id: &str) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| JsValue::from_str(&format!("no element #{canvas_id}")))?
        .dyn_into::<HtmlCanvasElement>()?;
    let engine = Engine::new(canvas)?;
    ENGINE.with(|cell| *cell.borrow_mut() = Some(engine));
    log::info!("board mounted on #{canvas_id}");
    Ok(())
}

/// Register a callback that receives JSON action arrays from async work.
#[wasm_bindgen]
pub fn set_action_listener(listener: js_sys::Function) {
    LISTENER.with(|cell| *cell.borrow_mut() = Some(listener));
}

/// Fetch the saved layout and start decoding its images.
///
/// A missing or malformed document starts an empty board.
#[wasm_bindgen]
pub fn load_layout(url: String) {
    spawn_local(async move {
        let requests = match fetch_layout(&url).await {
            Ok(doc) => with_engine(|engine| engine.core.restore(&doc)),
            Err(err) => {
                log::warn!("layout at {url} unavailable ({err}); starting empty");
                with_engine(|engine| {
                    engine.core.restore_empty();
                    Vec::new()
                })
            }
        };
        let requests = match requests {
            Ok(requests) => requests,
            Err(err) => {
                log::error!("cannot restore layout: {err:?}");
                return;
            }
        };
        if with_engine(|engine| engine.core.is_settled()).unwrap_or(false) {
            notify(&[Action::LayoutSettled, Action::RenderNeeded]);
        } else {
            render_now();
        }
        for request in requests {
            spawn_local(decode_image(request));
        }
    });
}

async fn fetch_layout(url: &str) -> Result<LayoutDocument, LoadError> {
    let response = Request::get(url).send().await?;
    let status = response.status();
    if !(200..300).contains(&status) {
        return Err(LoadError::Status(status));
    }
    let text = response.text().await?;
    Ok(LayoutDocument::from_json(&text)?)
}

async fn decode_image(request: DecodeRequest) {
    let actions = match load_image(&request.src).await {
        Ok(image) => with_engine(|engine| engine.image_decoded(&request.id, image)),
        Err(err) => {
            log::debug!("decode of {} rejected: {err:?}", request.src);
            with_engine(|engine| engine.core.abandon_decode(&request.id))
        }
    };
    match actions {
        Ok(actions) => notify(&actions),
        Err(err) => log::error!("decode finished after unmount: {err:?}"),
    }
}

async fn load_image(src: &str) -> Result<HtmlImageElement, JsValue> {
    let image = HtmlImageElement::new()?;
    image.set_src(src);
    JsFuture::from(image.decode()).await?;
    Ok(image)
}

/// Add a picked file (already turned into an object URL) and return its id.
///
/// # Errors
///
/// Returns `Err` if the board is not mounted.
#[wasm_bindgen]
pub fn add_image(src: String, original_name: &str) -> Result<String, JsValue> {
    let id = with_engine(|engine| engine.core.add_image(original_name))?;
    log::info!("added {id} from {original_name}");
    spawn_local(decode_image(DecodeRequest { id: id.clone(), src }));
    Ok(id.to_string())
}

// --- Input ---

/// # Errors
///
/// Returns `Err` if the board is not mounted.
#[wasm_bindgen]
pub fn pointer_down(x: f64, y: f64, button: i16) -> Result<String, JsValue> {
    let actions = with_engine(|engine| engine.core.on_pointer_down(Point::new(x, y), Button::from_dom(button)))?;
    Ok(finish(&actions))
}

/// # Errors
///
/// Returns `Err` if the board is not mounted.
#[wasm_bindgen]
pub fn pointer_move(x: f64, y: f64) -> Result<String, JsValue> {
    let actions = with_engine(|engine| engine.core.on_pointer_move(Point::new(x, y)))?;
    Ok(finish(&actions))
}

/// # Errors
///
/// Returns `Err` if the board is not mounted.
#[wasm_bindgen]
pub fn pointer_up(x: f64, y: f64, button: i16, time_ms: f64) -> Result<String, JsValue> {
    let actions =
        with_engine(|engine| engine.core.on_pointer_up(Point::new(x, y), Button::from_dom(button), time_ms))?;
    Ok(finish(&actions))
}

/// # Errors
///
/// Returns `Err` if the board is not mounted.
#[wasm_bindgen]
pub fn click(x: f64, y: f64, time_ms: f64) -> Result<String, JsValue> {
    let actions = with_engine(|engine| engine.core.on_click(Point::new(x, y), time_ms))?;
    Ok(finish(&actions))
}

/// # Errors
///
/// Returns `Err` if the board is not mounted.
#[wasm_bindgen]
pub fn wheel(x: f64, y: f64, dx: f64, dy: f64) -> Result<String, JsValue> {
    let actions = with_engine(|engine| engine.core.on_wheel(Point::new(x, y), WheelDelta { dx, dy }))?;
    Ok(finish(&actions))
}

// --- Context menu commands ---

/// Apply a canvas height typed into the context menu.
///
/// # Errors
///
/// Returns the rejection message for invalid heights, or `Err` if the board
/// is not mounted.
#[wasm_bindgen]
pub fn set_canvas_height(height: f64) -> Result<String, JsValue> {
    let actions = with_engine(|engine| engine.core.set_canvas_height(height))?
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    Ok(finish(&actions))
}

/// # Errors
///
/// Returns the rejection message for out-of-range scales or unknown items.
#[wasm_bindgen]
pub fn set_item_scale(id: &str, scale: f64) -> Result<String, JsValue> {
    let id = ItemId::from(id);
    let actions = with_engine(|engine| engine.core.set_item_scale(&id, scale))?
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    Ok(finish(&actions))
}

/// Delete an item the user confirmed removing.
///
/// # Errors
///
/// Returns `Err` for unknown items or if the board is not mounted.
#[wasm_bindgen]
pub fn delete_item(id: &str) -> Result<String, JsValue> {
    let id = ItemId::from(id);
    let actions = with_engine(|engine| engine.delete_item(&id))?.map_err(|err| JsValue::from_str(&err.to_string()))?;
    log::info!("deleted {id}");
    Ok(finish(&actions))
}

/// # Errors
///
/// Returns `Err` if the board is not mounted.
#[wasm_bindgen]
pub fn toggle_rulers() -> Result<bool, JsValue> {
    let enabled = with_engine(|engine| engine.core.toggle_rulers())?;
    render_now();
    Ok(enabled)
}

/// # Errors
///
/// Returns `Err` if the board is not mounted.
#[wasm_bindgen]
pub fn resize_viewport(width_css: f64, height_css: f64, dpr: f64) -> Result<(), JsValue> {
    with_engine(|engine| engine.set_viewport(width_css, height_css, dpr))?;
    render_now();
    Ok(())
}

/// Current canvas height, for prefilling the height prompt.
///
/// # Errors
///
/// Returns `Err` if the board is not mounted.
#[wasm_bindgen]
pub fn canvas_height() -> Result<f64, JsValue> {
    with_engine(|engine| engine.core.geometry.canvas_height())
}

/// An item's scale factor, for prefilling the scale prompt.
///
/// # Errors
///
/// Returns `Err` for unknown items or if the board is not mounted.
#[wasm_bindgen]
pub fn item_scale(id: &str) -> Result<f64, JsValue> {
    let id = ItemId::from(id);
    with_engine(|engine| engine.core.store.get(&id).map(|item| item.scale_factor))?
        .ok_or_else(|| JsValue::from_str(&BoardError::UnknownItem(id).to_string()))
}

/// Serialize the current board in the `images.json` format.
///
/// # Errors
///
/// Returns `Err` if the board is not mounted or serialization fails.
#[wasm_bindgen]
pub fn export_layout() -> Result<String, JsValue> {
    let doc = with_engine(|engine| engine.core.export_layout())?;
    serde_json::to_string_pretty(&doc).map_err(|err| JsValue::from_str(&err.to_string()))
}

/// # Errors
///
/// Returns `Err` if the board is not mounted or a draw call fails.
#[wasm_bindgen]
pub fn render() -> Result<(), JsValue> {
    ENGINE.with(|cell| cell.borrow().as_ref().ok_or_else(not_mounted)?.render())
}
