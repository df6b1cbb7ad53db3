use std::collections::HashSet;

use crate::color::Color;

pub type Cell = Option<Color>;

/// Square grid of cells, row-major: index = `row * side + col`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    pub side: u32,
    pub cells: Vec<Cell>,
}

impl Canvas {
    pub fn new(side: u32) -> Self {
        Self { side, cells: vec![None; (side * side) as usize] }
    }

    #[inline]
    pub fn index(&self, row: i32, col: i32) -> Option<usize> {
        let side = self.side as i32;
        if row < 0 || col < 0 || row >= side || col >= side {
            return None;
        }
        Some((row * side + col) as usize)
    }

    pub fn get(&self, row: i32, col: i32) -> Cell {
        self.index(row, col).and_then(|i| self.cells[i])
    }

    pub fn set(&mut self, row: i32, col: i32, cell: Cell) {
        if let Some(i) = self.index(row, col) {
            self.cells[i] = cell;
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Square brush of `2 * (size / 2) + 1` cells per side centered on (row, col).
    pub fn stamp_brush(&mut self, row: i32, col: i32, size: u32, cell: Cell) {
        let half = (size / 2) as i32;
        for i in -half..=half {
            for j in -half..=half {
                self.set(row + i, col + j, cell);
            }
        }
    }

    /// 4-connected flood fill replacing the exact cell value found at the seed.
    ///
    /// Empty cells are a fillable target like any color. Filling a region with
    /// the color it already has, or seeding outside the grid, is a no-op.
    /// Returns whether anything changed.
    pub fn flood_fill(&mut self, row: i32, col: i32, color: Color) -> bool {
        let Some(seed) = self.index(row, col) else { return false };
        let target = self.cells[seed];
        let new = Some(color);
        if target == new {
            return false;
        }
        let mut stack = vec![(row, col)];
        let mut seen = HashSet::from([(row, col)]);
        while let Some((r, c)) = stack.pop() {
            let Some(i) = self.index(r, c) else { continue };
            if self.cells[i] != target {
                continue;
            }
            self.cells[i] = new;
            for n in [(r + 1, c), (r - 1, c), (r, c + 1), (r, c - 1)] {
                if seen.insert(n) {
                    stack.push(n);
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    #[test]
    fn out_of_range_access_is_ignored() {
        let mut c = Canvas::new(4);
        c.set(-1, 0, Some(RED));
        c.set(0, 4, Some(RED));
        assert!(c.is_empty());
        assert_eq!(c.get(10, 10), None);
        c.set(3, 3, Some(RED));
        assert_eq!(c.cells[15], Some(RED));
    }

    #[test]
    fn brush_sizes_cover_odd_squares() {
        let mut c = Canvas::new(8);
        c.stamp_brush(4, 4, 1, Some(RED));
        assert_eq!(c.cells.iter().filter(|x| x.is_some()).count(), 1);
        c.clear();
        // size / 2 rounds down, so 2 spreads one cell each way like 3
        c.stamp_brush(4, 4, 2, Some(RED));
        assert_eq!(c.cells.iter().filter(|x| x.is_some()).count(), 9);
        assert_eq!(c.get(3, 3), Some(RED));
        c.clear();
        c.stamp_brush(4, 4, 3, Some(RED));
        assert_eq!(c.cells.iter().filter(|x| x.is_some()).count(), 9);
        c.clear();
        c.stamp_brush(0, 0, 4, Some(RED));
        // 5x5 clipped to the corner 3x3
        assert_eq!(c.cells.iter().filter(|x| x.is_some()).count(), 9);
    }

    #[test]
    fn fill_stops_at_boundaries() {
        let mut c = Canvas::new(5);
        for r in 0..5 {
            c.set(r, 2, Some(BLUE));
        }
        assert!(c.flood_fill(0, 0, RED));
        for r in 0..5 {
            assert_eq!(c.get(r, 0), Some(RED));
            assert_eq!(c.get(r, 1), Some(RED));
            assert_eq!(c.get(r, 2), Some(BLUE));
            assert_eq!(c.get(r, 3), None);
        }
    }

    #[test]
    fn fill_is_four_connected() {
        let mut c = Canvas::new(3);
        // diagonal wall leaves the corners unreachable
        c.set(0, 1, Some(BLUE));
        c.set(1, 0, Some(BLUE));
        c.flood_fill(2, 2, RED);
        assert_eq!(c.get(0, 0), None);
        assert_eq!(c.get(1, 1), Some(RED));
    }

    #[test]
    fn fill_with_same_color_is_noop() {
        let mut c = Canvas::new(3);
        c.flood_fill(0, 0, RED);
        let before = c.clone();
        assert!(!c.flood_fill(1, 1, RED));
        assert_eq!(c, before);
        assert!(!c.flood_fill(9, 9, BLUE));
    }

    #[test]
    fn fill_distinguishes_alpha() {
        let mut c = Canvas::new(2);
        c.set(0, 0, Some(RED));
        c.set(0, 1, Some(RED.with_opacity(0.5)));
        c.flood_fill(0, 0, BLUE);
        assert_eq!(c.get(0, 1), Some(RED.with_opacity(0.5)));
    }

    #[test]
    fn fill_handles_large_regions() {
        let mut c = Canvas::new(256);
        assert!(c.flood_fill(128, 128, RED));
        assert!(c.cells.iter().all(|x| *x == Some(RED)));
    }
}
