//! Rendering module
//!
//! `scene` turns simulation state into draw commands; `canvas` paints them on
//! an HTML canvas 2D context.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod scene;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;
pub use scene::{Color, DrawCommand, Scene, build_scene, colors};
