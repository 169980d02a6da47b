//! Pan/zoom image board engine.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! board's coordinate transform, the item store and its bottom-anchored
//! layout, the decode barrier that gates the one-time settle pass after a
//! restore, and the gesture state machine that tells drags from clicks. The
//! host page only wires DOM events to [`web`] and reacts to the returned
//! [`engine::Action`]s (cursor changes, context menu, opening links).
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`transform`] | Pan/zoom transform and screen/canvas conversion |
//! | [`doc`] | Grid items and the in-memory item store |
//! | [`layout`] | Canvas geometry, bottom anchoring, and the decode barrier |
//! | [`persist`] | The `images.json` layout document |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing items, info overlays, and their links |
//! | [`ruler`] | Position/size readout for the ruler overlay |
//! | [`render`] | Scene rendering to a 2D context |
//! | [`web`] | `wasm-bindgen` exports for the host page |
//! | [`error`] | Rejected operations |
//! | [`consts`] | Shared numeric constants (zoom limits, thresholds, etc.) |

pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod hit;
pub mod input;
pub mod layout;
pub mod persist;
pub mod render;
pub mod ruler;
pub mod transform;
pub mod web;
