//! Board geometry: peg triangle and bin layout
//!
//! Derived from the canvas size and the row count. A `BoardParams` is rebuilt
//! whenever either changes and is never mutated in place.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Peg and bin layout for one canvas size and row count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardParams {
    /// Number of peg rows (0 is a board with no pegs and a single bin)
    pub rows: u32,
    pub width: f32,
    pub height: f32,
    pub pin_radius: f32,
    pub top_padding: f32,
    pub horizontal_padding: f32,
    /// Distance between neighbouring pegs in a row (also the bin width)
    pub horizontal_spacing: f32,
    /// Distance between peg rows
    pub vertical_spacing: f32,
    /// Always `rows + 1`
    pub num_bins: usize,
    /// Left edge of each bin, ascending
    pub bin_boundaries: Vec<f32>,
}

impl BoardParams {
    pub fn new(width: f32, height: f32, rows: u32) -> Self {
        // Zero rows keeps the spacing of a one-row board
        let divisor = rows.max(1) as f32;
        let horizontal_spacing = ((width - 2.0 * HORIZONTAL_PADDING) / divisor).max(0.0);
        let vertical_spacing = (height * PEG_AREA_RATIO / divisor).max(0.0);
        let num_bins = rows as usize + 1;

        let bin_width = horizontal_spacing;
        let start_x = (width - (num_bins - 1) as f32 * bin_width) / 2.0;
        let bin_boundaries = (0..num_bins)
            .map(|i| start_x + (i as f32 - 0.5) * bin_width)
            .collect();

        log::debug!(
            "Board geometry: {}x{} px, {} rows, spacing {:.1}x{:.1}",
            width,
            height,
            rows,
            horizontal_spacing,
            vertical_spacing
        );

        Self {
            rows,
            width,
            height,
            pin_radius: PIN_RADIUS,
            top_padding: TOP_PADDING,
            horizontal_padding: HORIZONTAL_PADDING,
            horizontal_spacing,
            vertical_spacing,
            num_bins,
            bin_boundaries,
        }
    }

    #[inline]
    pub fn bin_width(&self) -> f32 {
        self.horizontal_spacing
    }

    /// Y coordinate of peg row `row`
    #[inline]
    pub fn row_y(&self, row: u32) -> f32 {
        self.top_padding + row as f32 * self.vertical_spacing
    }

    /// X coordinate of the leftmost peg in `row`
    fn row_start_x(&self, row: u32) -> f32 {
        let row_width = row as f32 * self.horizontal_spacing;
        (self.width - row_width) / 2.0
    }

    /// Peg centers of one row, left to right (row `r` has `r + 1` pegs)
    pub fn pegs_in_row(&self, row: u32) -> impl Iterator<Item = Vec2> + '_ {
        let start_x = self.row_start_x(row);
        let y = self.row_y(row);
        let count = if row < self.rows { row + 1 } else { 0 };
        (0..count).map(move |col| Vec2::new(start_x + col as f32 * self.horizontal_spacing, y))
    }

    /// All peg centers, row by row
    pub fn pegs(&self) -> impl Iterator<Item = Vec2> + '_ {
        (0..self.rows).flat_map(move |row| self.pegs_in_row(row))
    }

    /// The peg of `row` horizontally closest to `x`
    pub fn nearest_peg(&self, row: u32, x: f32) -> Option<Vec2> {
        if row >= self.rows {
            return None;
        }
        let start_x = self.row_start_x(row);
        let col = if self.horizontal_spacing > 0.0 {
            ((x - start_x) / self.horizontal_spacing)
                .round()
                .clamp(0.0, row as f32)
        } else {
            0.0
        };
        Some(Vec2::new(
            start_x + col * self.horizontal_spacing,
            self.row_y(row),
        ))
    }

    /// Bin that collects a ball leaving the board at `x`
    ///
    /// First bin whose right edge lies strictly beyond `x`; anything past the
    /// last edge falls into the last bin.
    pub fn bin_index(&self, x: f32) -> usize {
        let bin_width = self.bin_width();
        self.bin_boundaries
            .iter()
            .position(|&boundary| x < boundary + bin_width)
            .unwrap_or(self.num_bins - 1)
    }

    /// X coordinates of the bin divider lines (`num_bins + 1` of them)
    pub fn bin_dividers(&self) -> impl Iterator<Item = f32> + '_ {
        let bin_width = self.bin_width();
        let start_x = (self.width - self.num_bins as f32 * bin_width) / 2.0;
        (0..=self.num_bins).map(move |i| start_x + i as f32 * bin_width)
    }

    /// Y coordinate of the last peg row (the first row on a zero-row board)
    pub fn last_row_y(&self) -> f32 {
        self.row_y(self.rows.saturating_sub(1))
    }

    /// Top edge of the bins
    pub fn bin_top_y(&self) -> f32 {
        self.last_row_y() + BIN_TOP_GAP
    }

    /// Vertical space available to the result bars
    pub fn bar_area_height(&self) -> f32 {
        ((self.height - self.bin_top_y()) * BAR_AREA_RATIO).max(0.0)
    }

    /// Pixel height of one ball in a result bar, sized so the busiest
    /// expected bin of a `total`-ball run fits the bar area
    pub fn one_ball_height(&self, total: u32) -> f32 {
        let busiest = (total as f32 * BUSIEST_BIN_SHARE).max(1.0);
        self.bar_area_height() / busiest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacing_formulas() {
        let board = BoardParams::new(880.0, 500.0, 8);
        assert_eq!(board.horizontal_spacing, 100.0);
        assert_eq!(board.vertical_spacing, 50.0);
        assert_eq!(board.num_bins, 9);
        assert_eq!(board.row_y(0), TOP_PADDING);
        assert_eq!(board.row_y(2), TOP_PADDING + 100.0);
    }

    #[test]
    fn test_bin_boundaries_centered() {
        let board = BoardParams::new(880.0, 500.0, 8);
        // 8 bin widths centered on 440 start at 40
        let start_x = 40.0;
        for (i, &b) in board.bin_boundaries.iter().enumerate() {
            assert_eq!(b, start_x + (i as f32 - 0.5) * 100.0);
        }
        // Boundaries are symmetric around the center
        let first = board.bin_boundaries[0];
        let last = board.bin_boundaries[8] + board.bin_width();
        assert!((first + last - 880.0).abs() < 1e-3);
    }

    #[test]
    fn test_pegs_centered_triangle() {
        let board = BoardParams::new(880.0, 500.0, 4);
        let top: Vec<_> = board.pegs_in_row(0).collect();
        assert_eq!(top, vec![Vec2::new(440.0, TOP_PADDING)]);

        let row3: Vec<_> = board.pegs_in_row(3).collect();
        assert_eq!(row3.len(), 4);
        assert_eq!(row3[0].x + row3[3].x, 880.0);
        assert_eq!(board.pegs().count(), 1 + 2 + 3 + 4);
        assert_eq!(board.pegs_in_row(4).count(), 0);
    }

    #[test]
    fn test_nearest_peg() {
        let board = BoardParams::new(880.0, 500.0, 8);
        // Row 1 pegs at 390 and 490
        assert_eq!(board.nearest_peg(1, 400.0).map(|p| p.x), Some(390.0));
        assert_eq!(board.nearest_peg(1, 460.0).map(|p| p.x), Some(490.0));
        // Clamped to the row ends
        assert_eq!(board.nearest_peg(1, -1000.0).map(|p| p.x), Some(390.0));
        assert_eq!(board.nearest_peg(1, 5000.0).map(|p| p.x), Some(490.0));
        assert_eq!(board.nearest_peg(8, 440.0), None);
    }

    #[test]
    fn test_ball_on_shared_edge_goes_to_right_bin() {
        let board = BoardParams::new(880.0, 500.0, 8);
        let bw = board.bin_width();
        let b2 = board.bin_boundaries[2];

        assert_eq!(board.bin_index(b2 + 1.0), 2);
        // The edge shared by bins 2 and 3 belongs to bin 3: the lookup is the
        // strict `x < left edge + width`, so bin 2 stops short of its right edge
        assert_eq!(board.bin_index(b2 + bw), 3);
        assert_eq!(board.bin_index(b2 + bw - 0.001), 2);
        // Outside the board on either side
        assert_eq!(board.bin_index(-50.0), 0);
        assert_eq!(board.bin_index(10_000.0), 8);
    }

    #[test]
    fn test_dividers_bracket_bins() {
        let board = BoardParams::new(880.0, 500.0, 8);
        let dividers: Vec<_> = board.bin_dividers().collect();
        assert_eq!(dividers.len(), board.num_bins + 1);
        for (i, &b) in board.bin_boundaries.iter().enumerate() {
            assert!((dividers[i] - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_zero_rows_is_single_bin() {
        let board = BoardParams::new(880.0, 500.0, 0);
        assert_eq!(board.num_bins, 1);
        assert_eq!(board.bin_boundaries.len(), 1);
        assert_eq!(board.pegs().count(), 0);
        assert_eq!(board.bin_index(0.0), 0);
        assert_eq!(board.bin_index(880.0), 0);
        assert!(board.horizontal_spacing.is_finite());
        assert!(board.vertical_spacing.is_finite());
    }

    #[test]
    fn test_one_ball_height() {
        let board = BoardParams::new(880.0, 500.0, 8);
        // Last row at 40 + 7 * 50 = 390, bins start at 410
        assert_eq!(board.bin_top_y(), 410.0);
        let area = (500.0 - 410.0) * BAR_AREA_RATIO;
        assert!((board.bar_area_height() - area).abs() < 1e-3);
        assert!((board.one_ball_height(100) - area / 35.0).abs() < 1e-3);
        // Tiny runs never divide by less than one ball
        assert!((board.one_ball_height(0) - area).abs() < 1e-3);
    }

    #[test]
    fn test_tiny_canvas_is_not_negative() {
        let board = BoardParams::new(20.0, 10.0, 5);
        assert!(board.horizontal_spacing >= 0.0);
        assert!(board.bar_area_height() >= 0.0);
    }
}
