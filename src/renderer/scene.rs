//! Scene building: simulation state to draw commands
//!
//! Everything here is a pure function of the board, the live balls and the
//! bin counts. The backend only replays the command list.

use glam::Vec2;

use crate::sim::{Ball, BoardParams, Simulation};
use crate::stats::expected_counts;

/// RGBA, each channel 0-1
pub type Color = [f32; 4];

/// Colors for board elements
pub mod colors {
    use super::Color;

    pub const PEG: Color = [0.2, 0.2, 0.2, 1.0];
    pub const DIVIDER: Color = [0.333, 0.333, 0.333, 1.0];
    pub const BALL: Color = [0.863, 0.078, 0.235, 1.0]; // crimson
    pub const BAR_TOP: Color = [0.255, 0.412, 0.882, 1.0]; // royal blue
    pub const BAR_BOTTOM: Color = [0.0, 0.749, 1.0, 1.0]; // deep sky blue
    pub const EXPECTED: Color = [1.0, 0.549, 0.0, 0.9];
}

/// Line width of the bin dividers
pub const DIVIDER_WIDTH: f32 = 2.0;
/// Line width of the expected-distribution curve
pub const EXPECTED_WIDTH: f32 = 2.0;

/// Format a color as a CSS `rgba()` string
pub fn css(color: Color) -> String {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({}, {}, {}, {})",
        channel(color[0]),
        channel(color[1]),
        channel(color[2]),
        color[3].clamp(0.0, 1.0)
    )
}

/// One drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Clear the whole surface
    Clear { width: f32, height: f32 },
    /// Filled circle
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    /// Straight stroked line
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Color,
    },
    /// Rectangle with a vertical gradient from `top` to `bottom`
    GradientRect {
        origin: Vec2,
        size: Vec2,
        top: Color,
        bottom: Color,
    },
    /// Open stroked path
    Polyline {
        points: Vec<Vec2>,
        width: f32,
        color: Color,
    },
}

/// Ordered draw list for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    /// Scene for the current state of a simulation
    pub fn from_simulation(sim: &Simulation) -> Self {
        let expected_total = (sim.config().show_expected && sim.requested() > 0)
            .then_some(sim.requested());
        build_scene(
            sim.board(),
            sim.balls(),
            sim.bin_counts(),
            sim.one_ball_height(),
            expected_total,
        )
    }

    pub fn circles(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
    }

    pub fn bars(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::GradientRect { .. }))
    }
}

/// Build the full frame: pegs, bin dividers, balls, result bars and the
/// optional expected curve for a run of `expected_total` balls
pub fn build_scene<'a>(
    board: &BoardParams,
    balls: impl IntoIterator<Item = &'a Ball>,
    bin_counts: &[u32],
    one_ball_height: f32,
    expected_total: Option<u32>,
) -> Scene {
    let mut commands = vec![DrawCommand::Clear {
        width: board.width,
        height: board.height,
    }];
    commands.extend(pegs(board));
    commands.extend(bin_dividers(board));
    commands.extend(balls.into_iter().map(ball));
    commands.extend(result_bars(board, bin_counts, one_ball_height));
    if let Some(total) = expected_total {
        commands.extend(expected_curve(board, total, one_ball_height));
    }
    Scene { commands }
}

/// One circle per peg
pub fn pegs(board: &BoardParams) -> impl Iterator<Item = DrawCommand> + '_ {
    board.pegs().map(|center| DrawCommand::Circle {
        center,
        radius: board.pin_radius,
        color: colors::PEG,
    })
}

/// Vertical divider lines from the top of the bins to the canvas bottom
pub fn bin_dividers(board: &BoardParams) -> impl Iterator<Item = DrawCommand> + '_ {
    let top = board.bin_top_y();
    let bottom = top + (board.height - board.last_row_y() - crate::consts::BIN_TOP_GAP);
    board.bin_dividers().map(move |x| DrawCommand::Line {
        from: Vec2::new(x, top),
        to: Vec2::new(x, bottom),
        width: DIVIDER_WIDTH,
        color: colors::DIVIDER,
    })
}

pub fn ball(ball: &Ball) -> DrawCommand {
    DrawCommand::Circle {
        center: ball.pos,
        radius: ball.radius,
        color: colors::BALL,
    }
}

/// A gradient bar per non-empty bin, `count * one_ball_height` tall
pub fn result_bars(board: &BoardParams, bin_counts: &[u32], one_ball_height: f32) -> Vec<DrawCommand> {
    if bin_counts.is_empty() || one_ball_height <= 0.0 {
        return Vec::new();
    }
    let bin_width = board.bin_width();
    bin_counts
        .iter()
        .zip(&board.bin_boundaries)
        .filter(|(count, _)| **count > 0)
        .map(|(&count, &x)| {
            let bar_height = count as f32 * one_ball_height;
            DrawCommand::GradientRect {
                origin: Vec2::new(x, board.height - bar_height),
                size: Vec2::new(bin_width, bar_height),
                top: colors::BAR_TOP,
                bottom: colors::BAR_BOTTOM,
            }
        })
        .collect()
}

/// Binomial expectation traced through the bin centers
pub fn expected_curve(board: &BoardParams, total: u32, one_ball_height: f32) -> Option<DrawCommand> {
    if one_ball_height <= 0.0 {
        return None;
    }
    let half_bin = board.bin_width() / 2.0;
    let points = expected_counts(board.rows, total)
        .into_iter()
        .zip(&board.bin_boundaries)
        .map(|(expected, &x)| {
            Vec2::new(x + half_bin, board.height - expected as f32 * one_ball_height)
        })
        .collect();
    Some(DrawCommand::Polyline {
        points,
        width: EXPECTED_WIDTH,
        color: colors::EXPECTED,
    })
}
