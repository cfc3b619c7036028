//! Overlapping frame grid over a coverage rectangle.
//!
//! ```text
//!   start ──► ┌────┬─┬──┬─┬──┬─┐
//!             │ 0  │ │1 │ │2 │ │   row 0: left to right
//!             ├────┼─┼──┼─┼──┼─┤
//!             │ 5  │ │4 │ │3 │ │   row 1: right to left
//!             ├────┼─┼──┼─┼──┼─┤
//!             │ 6  │ │7 │ │8 │ │   row 2: left to right
//!             └────┴─┴──┴─┴──┴─┘
//!              ◄step►
//! ```
//!
//! Column and row counts are `ceil(extent / step)`, plus one more when the
//! extent is an exact multiple of the step. Axis inversion changes only the
//! traversal order: cell positions are identical, inverted axes are walked
//! from the far side.

use crate::geometry::{BoundingBox, Point};

/// Grid geometry for one coverage rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub start: Point,
    pub frame_width: f64,
    pub frame_height: f64,
    pub step_x: f64,
    pub step_y: f64,
    pub columns: usize,
    pub rows: usize,
}

/// One cell in traversal order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    /// Row in traversal order (0 is acquired first)
    pub pass: usize,
    /// Row in grid space
    pub row: usize,
    /// Column in grid space
    pub column: usize,
    /// Top-left corner of the frame
    pub origin: Point,
}

fn cell_count(extent: f64, step: f64) -> usize {
    let mut n = (extent / step).ceil() as usize;
    if extent % step == 0.0 {
        n += 1;
    }
    n
}

impl GridLayout {
    /// Lay out frames over the rectangle starting at `start` with the given
    /// extent.
    pub fn new(
        start: Point,
        width: f64,
        height: f64,
        frame_width: f64,
        frame_height: f64,
        overlap_percent: f64,
    ) -> Self {
        let keep = 1.0 - overlap_percent / 100.0;
        let step_x = frame_width * keep;
        let step_y = frame_height * keep;
        Self {
            start,
            frame_width,
            frame_height,
            step_x,
            step_y,
            columns: cell_count(width, step_x),
            rows: cell_count(height, step_y),
        }
    }

    /// Layout for a bounding box padded by half a frame on every side.
    pub fn for_bounding_box(
        bbox: &BoundingBox,
        frame_width: f64,
        frame_height: f64,
        overlap_percent: f64,
    ) -> Self {
        let coverage = bbox.padded(frame_width / 2.0, frame_height / 2.0);
        Self::new(
            Point::new(coverage.min_x(), coverage.min_y()),
            coverage.width(),
            coverage.height(),
            frame_width,
            frame_height,
            overlap_percent,
        )
    }

    pub fn cell_count(&self) -> usize {
        self.columns * self.rows
    }

    /// Frame rectangle at a grid position.
    pub fn frame_at(&self, row: usize, column: usize) -> BoundingBox {
        BoundingBox::from_origin_size(
            self.start.x + column as f64 * self.step_x,
            self.start.y + row as f64 * self.step_y,
            self.frame_width,
            self.frame_height,
        )
    }

    /// Cells of one traversal pass, in acquisition order.
    pub fn pass(
        &self,
        pass: usize,
        invert_x: bool,
        invert_y: bool,
    ) -> impl Iterator<Item = GridCell> + '_ {
        let row = if invert_y { self.rows - 1 - pass } else { pass };
        let reverse = pass % 2 == 1;
        let y = self.start.y + row as f64 * self.step_y;

        (0..self.columns).map(move |i| {
            let serpentine = if reverse { self.columns - 1 - i } else { i };
            let column = if invert_x {
                self.columns - 1 - serpentine
            } else {
                serpentine
            };
            GridCell {
                pass,
                row,
                column,
                origin: Point::new(self.start.x + column as f64 * self.step_x, y),
            }
        })
    }

    /// All cells in acquisition order.
    pub fn cells(&self, invert_x: bool, invert_y: bool) -> impl Iterator<Item = GridCell> + '_ {
        (0..self.rows).flat_map(move |p| self.pass(p, invert_x, invert_y))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ten_percent_overlap_counts() {
        let bbox = BoundingBox::new(0.0, 0.0, 1000.0, 1000.0);
        let grid = GridLayout::for_bounding_box(&bbox, 100.0, 100.0, 10.0);
        assert_eq!(grid.step_x, 90.0);
        assert_eq!(grid.step_y, 90.0);
        // 1100 / 90 = 12.2 -> 13, not an exact multiple
        assert_eq!(grid.columns, 13);
        assert_eq!(grid.rows, 13);
        assert_eq!(grid.start, Point::new(-50.0, -50.0));
    }

    #[test]
    fn test_exact_division_adds_one() {
        let bbox = BoundingBox::new(0.0, 0.0, 1000.0, 1000.0);
        let grid = GridLayout::for_bounding_box(&bbox, 100.0, 100.0, 0.0);
        // 1100 / 100 = 11 exactly -> 12
        assert_eq!(grid.columns, 12);
        assert_eq!(grid.rows, 12);
    }

    #[test]
    fn test_serpentine_small_grid() {
        let grid = GridLayout::new(Point::new(0.0, 0.0), 250.0, 150.0, 100.0, 100.0, 0.0);
        assert_eq!((grid.columns, grid.rows), (3, 2));
        let order: Vec<(usize, usize)> = grid.cells(false, false).map(|c| (c.row, c.column)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (0, 2), (1, 2), (1, 1), (1, 0)]);
    }

    #[test]
    fn test_inversion_changes_order_not_positions() {
        let grid = GridLayout::new(Point::new(0.0, 0.0), 250.0, 150.0, 100.0, 100.0, 0.0);

        let order: Vec<(usize, usize)> = grid.cells(true, true).map(|c| (c.row, c.column)).collect();
        assert_eq!(order, vec![(1, 2), (1, 1), (1, 0), (0, 0), (0, 1), (0, 2)]);

        let mut normal: Vec<_> = grid.cells(false, false).map(|c| (c.origin.x, c.origin.y)).collect();
        let mut inverted: Vec<_> = grid.cells(true, true).map(|c| (c.origin.x, c.origin.y)).collect();
        normal.sort_by(|a, b| a.partial_cmp(b).unwrap());
        inverted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(normal, inverted);
    }

    #[test]
    fn test_frame_at() {
        let grid = GridLayout::new(Point::new(-50.0, -50.0), 1100.0, 1100.0, 100.0, 100.0, 10.0);
        let frame = grid.frame_at(1, 2);
        assert_eq!(frame.min_x(), 130.0);
        assert_eq!(frame.min_y(), 40.0);
        assert_eq!(frame.width(), 100.0);
    }

    proptest! {
        #[test]
        fn prop_serpentine_rows(
            width in 1.0f64..2000.0,
            height in 1.0f64..2000.0,
            frame in 50.0f64..400.0,
            overlap in 0.0f64..50.0,
        ) {
            let grid = GridLayout::new(Point::new(0.0, 0.0), width, height, frame, frame, overlap);
            for pass in 0..grid.rows {
                let columns: Vec<usize> = grid.pass(pass, false, false).map(|c| c.column).collect();
                prop_assert_eq!(columns.len(), grid.columns);
                for pair in columns.windows(2) {
                    if pass % 2 == 0 {
                        prop_assert_eq!(pair[1], pair[0] + 1);
                    } else {
                        prop_assert_eq!(pair[0], pair[1] + 1);
                    }
                }
            }
        }

        #[test]
        fn prop_grid_covers_bounding_box(
            x in -5000.0f64..5000.0,
            y in -5000.0f64..5000.0,
            w in 0.0f64..3000.0,
            h in 0.0f64..3000.0,
            frame_w in 50.0f64..500.0,
            frame_h in 50.0f64..500.0,
            overlap in 0.0f64..=90.0,
        ) {
            let bbox = BoundingBox::from_origin_size(x, y, w, h);
            let grid = GridLayout::for_bounding_box(&bbox, frame_w, frame_h, overlap);
            let last = grid.frame_at(grid.rows - 1, grid.columns - 1);
            let first = grid.frame_at(0, 0);
            prop_assert!(first.min_x() <= bbox.min_x());
            prop_assert!(first.min_y() <= bbox.min_y());
            prop_assert!(last.max_x() >= bbox.max_x());
            prop_assert!(last.max_y() >= bbox.max_y());
            // Consecutive frames overlap or touch
            prop_assert!(grid.step_x <= frame_w);
            prop_assert!(grid.step_y <= frame_h);
        }
    }
}
