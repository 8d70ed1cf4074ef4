//! Canvas 2D backend (WASM only)

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::scene::{DrawCommand, Scene, css};

/// Paints scenes onto an HTML canvas
pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    /// Match the drawing buffer to the element's layout size
    pub fn fit_to_client(&self) -> (f32, f32) {
        let width = self.canvas.client_width().max(0) as u32;
        let height = self.canvas.client_height().max(0) as u32;
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        (width as f32, height as f32)
    }

    pub fn draw(&self, scene: &Scene) {
        for command in &scene.commands {
            if let Err(e) = self.draw_command(command) {
                log::warn!("Draw error: {:?}", e);
            }
        }
    }

    fn draw_command(&self, command: &DrawCommand) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        match command {
            DrawCommand::Clear { width, height } => {
                ctx.clear_rect(0.0, 0.0, *width as f64, *height as f64);
            }
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => {
                ctx.begin_path();
                ctx.arc(center.x as f64, center.y as f64, *radius as f64, 0.0, TAU)?;
                ctx.set_fill_style_str(&css(*color));
                ctx.fill();
                ctx.close_path();
            }
            DrawCommand::Line {
                from,
                to,
                width,
                color,
            } => {
                ctx.set_stroke_style_str(&css(*color));
                ctx.set_line_width(*width as f64);
                ctx.begin_path();
                ctx.move_to(from.x as f64, from.y as f64);
                ctx.line_to(to.x as f64, to.y as f64);
                ctx.stroke();
            }
            DrawCommand::GradientRect {
                origin,
                size,
                top,
                bottom,
            } => {
                let (x, y) = (origin.x as f64, origin.y as f64);
                let gradient = ctx.create_linear_gradient(x, y, x, y + size.y as f64);
                gradient.add_color_stop(0.0, &css(*top))?;
                gradient.add_color_stop(1.0, &css(*bottom))?;
                ctx.set_fill_style_canvas_gradient(&gradient);
                ctx.fill_rect(x, y, size.x as f64, size.y as f64);
            }
            DrawCommand::Polyline {
                points,
                width,
                color,
            } => {
                let Some((first, rest)) = points.split_first() else {
                    return Ok(());
                };
                ctx.set_stroke_style_str(&css(*color));
                ctx.set_line_width(*width as f64);
                ctx.begin_path();
                ctx.move_to(first.x as f64, first.y as f64);
                for p in rest {
                    ctx.line_to(p.x as f64, p.y as f64);
                }
                ctx.stroke();
            }
        }
        Ok(())
    }
}
