//! Shape rasterizers and pattern generators. Everything clips to the canvas.

use crate::canvas::{Canvas, Cell};

/// Shapes stamped at the last pressed cell from the Shapes window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StampShape {
    Rectangle,
    Circle,
    Triangle,
    Line,
}

impl StampShape {
    pub const ALL: [StampShape; 4] = [Self::Rectangle, Self::Circle, Self::Triangle, Self::Line];

    pub fn label(self) -> &'static str {
        match self {
            Self::Rectangle => "Rectangle",
            Self::Circle => "Circle",
            Self::Triangle => "Triangle",
            Self::Line => "Line",
        }
    }

    /// Draws the shape anchored at (row, col), sized to a quarter of the canvas side.
    pub fn stamp(self, canvas: &mut Canvas, row: i32, col: i32, cell: Cell) {
        let size = (canvas.side / 4) as i32;
        match self {
            Self::Rectangle => fill_block(canvas, row, col, size, size, cell),
            Self::Circle => fill_disc(canvas, row, col, size / 2, cell),
            Self::Triangle => fill_triangle(canvas, row, col, size, cell),
            Self::Line => line(canvas, row, col, row, col + size, cell),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    Checkerboard,
    Stripes,
    Dots,
    Grid,
}

impl Pattern {
    pub const ALL: [Pattern; 4] = [Self::Checkerboard, Self::Stripes, Self::Dots, Self::Grid];

    pub fn label(self) -> &'static str {
        match self {
            Self::Checkerboard => "Checkerboard",
            Self::Stripes => "Stripes",
            Self::Dots => "Dots",
            Self::Grid => "Grid",
        }
    }

    pub fn covers(self, row: u32, col: u32) -> bool {
        match self {
            Self::Checkerboard => (row + col) % 2 == 0,
            Self::Stripes => row % 4 < 2,
            Self::Dots => row >= 2 && col >= 2 && (row - 2) % 4 == 0 && (col - 2) % 4 == 0,
            Self::Grid => row % 4 == 0 || col % 4 == 0,
        }
    }

    pub fn apply(self, canvas: &mut Canvas, cell: Cell) {
        let side = canvas.side;
        for row in 0..side {
            for col in 0..side {
                if self.covers(row, col) {
                    canvas.set(row as i32, col as i32, cell);
                }
            }
        }
    }
}

/// Filled `h x w` block with its top-left at (row, col).
pub fn fill_block(canvas: &mut Canvas, row: i32, col: i32, h: i32, w: i32, cell: Cell) {
    for i in 0..h {
        for j in 0..w {
            canvas.set(row + i, col + j, cell);
        }
    }
}

/// Disc covering every offset with `i² + j² <= radius²`.
pub fn fill_disc(canvas: &mut Canvas, row: i32, col: i32, radius: i32, cell: Cell) {
    for i in -radius..=radius {
        for j in -radius..=radius {
            if i * i + j * j <= radius * radius {
                canvas.set(row + i, col + j, cell);
            }
        }
    }
}

/// Right triangle: row `i` of the shape covers columns `0..=i`.
pub fn fill_triangle(canvas: &mut Canvas, row: i32, col: i32, size: i32, cell: Cell) {
    for i in 0..size {
        for j in 0..=i {
            canvas.set(row + i, col + j, cell);
        }
    }
}

/// Cells on the Bresenham line between two cells, endpoints included.
pub fn line_points(r0: i32, c0: i32, r1: i32, c1: i32) -> Vec<(i32, i32)> {
    let (mut x0, mut y0, x1, y1) = (c0, r0, c1, r1);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut pts = Vec::with_capacity((dx - dy + 1) as usize);
    loop {
        pts.push((y0, x0));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
    pts
}

pub fn line(canvas: &mut Canvas, r0: i32, c0: i32, r1: i32, c1: i32, cell: Cell) {
    for (r, c) in line_points(r0, c0, r1, c1) {
        canvas.set(r, c, cell);
    }
}

pub fn rect_outline(canvas: &mut Canvas, r0: i32, c0: i32, r1: i32, c1: i32, cell: Cell) {
    let (top, bottom) = (r0.min(r1), r0.max(r1));
    let (left, right) = (c0.min(c1), c0.max(c1));
    line(canvas, top, left, top, right, cell);
    line(canvas, bottom, left, bottom, right, cell);
    line(canvas, top, left, bottom, left, cell);
    line(canvas, top, right, bottom, right, cell);
}

pub fn rect_filled(canvas: &mut Canvas, r0: i32, c0: i32, r1: i32, c1: i32, cell: Cell) {
    let (top, bottom) = (r0.min(r1), r0.max(r1));
    let (left, right) = (c0.min(c1), c0.max(c1));
    fill_block(canvas, top, left, bottom - top + 1, right - left + 1, cell);
}

/// Midpoint circle outline.
pub fn circle_outline(canvas: &mut Canvas, cr: i32, cc: i32, radius: i32, cell: Cell) {
    if radius <= 0 {
        canvas.set(cr, cc, cell);
        return;
    }
    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - x;
    while x >= y {
        let pts = [
            (cc + x, cr + y), (cc + y, cr + x), (cc - y, cr + x), (cc - x, cr + y),
            (cc - x, cr - y), (cc - y, cr - x), (cc + y, cr - x), (cc + x, cr - y),
        ];
        for (px, py) in pts {
            canvas.set(py, px, cell);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Radius for drag circles: distance from the press cell to the release cell.
pub fn drag_radius(r0: i32, c0: i32, r1: i32, c1: i32) -> i32 {
    let dr = (r1 - r0) as f32;
    let dc = (c1 - c0) as f32;
    (dr * dr + dc * dc).sqrt() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    const INK: Cell = Some(Color::BLACK);

    fn count(c: &Canvas) -> usize {
        c.cells.iter().filter(|x| x.is_some()).count()
    }

    #[test]
    fn stamp_sizes_follow_canvas_side() {
        let mut c = Canvas::new(16);
        StampShape::Rectangle.stamp(&mut c, 0, 0, INK);
        assert_eq!(count(&c), 16);

        let mut c = Canvas::new(16);
        StampShape::Triangle.stamp(&mut c, 0, 0, INK);
        assert_eq!(count(&c), 1 + 2 + 3 + 4);

        let mut c = Canvas::new(16);
        StampShape::Line.stamp(&mut c, 3, 2, INK);
        assert_eq!(count(&c), 5);
        assert!((2..=6).all(|col| c.get(3, col).is_some()));

        let mut c = Canvas::new(16);
        StampShape::Circle.stamp(&mut c, 8, 8, INK);
        // radius 2 disc
        assert_eq!(count(&c), 13);
    }

    #[test]
    fn stamps_clip_at_edges() {
        let mut c = Canvas::new(8);
        StampShape::Rectangle.stamp(&mut c, 7, 7, INK);
        assert_eq!(count(&c), 1);
    }

    #[test]
    fn diagonal_line_hits_each_row() {
        let mut c = Canvas::new(8);
        line(&mut c, 0, 0, 7, 7, INK);
        assert_eq!(count(&c), 8);
        assert!((0..8).all(|i| c.get(i, i).is_some()));
    }

    #[test]
    fn line_points_include_both_ends() {
        assert_eq!(line_points(2, 2, 2, 2), vec![(2, 2)]);
        let pts = line_points(0, 4, 2, 0);
        assert_eq!(pts.first(), Some(&(0, 4)));
        assert_eq!(pts.last(), Some(&(2, 0)));
        assert_eq!(pts.len(), 5);
    }

    #[test]
    fn rect_outline_and_fill() {
        let mut c = Canvas::new(8);
        rect_outline(&mut c, 5, 5, 1, 1, INK);
        assert_eq!(count(&c), 16);
        assert!(c.get(3, 3).is_none());
        rect_filled(&mut c, 1, 1, 5, 5, INK);
        assert_eq!(count(&c), 25);
    }

    #[test]
    fn circle_outline_is_symmetric() {
        let mut c = Canvas::new(16);
        circle_outline(&mut c, 8, 8, 4, INK);
        for (r, col) in [(4, 8), (12, 8), (8, 4), (8, 12)] {
            assert!(c.get(r, col).is_some());
        }
        assert!(c.get(8, 8).is_none());
        assert_eq!(drag_radius(0, 0, 3, 4), 5);
    }

    #[test]
    fn patterns_cover_expected_cells() {
        let mut c = Canvas::new(8);
        Pattern::Checkerboard.apply(&mut c, INK);
        assert_eq!(count(&c), 32);
        assert!(c.get(0, 0).is_some() && c.get(0, 1).is_none());

        let mut c = Canvas::new(8);
        Pattern::Stripes.apply(&mut c, INK);
        assert_eq!(count(&c), 32);
        assert!(c.get(2, 0).is_none() && c.get(4, 0).is_some());

        let mut c = Canvas::new(8);
        Pattern::Dots.apply(&mut c, INK);
        assert_eq!(count(&c), 4);
        assert!(c.get(2, 6).is_some() && c.get(6, 6).is_some());

        let mut c = Canvas::new(8);
        Pattern::Grid.apply(&mut c, INK);
        // rows 0 and 4 full, plus columns 0 and 4 in the other 6 rows
        assert_eq!(count(&c), 16 + 12);
    }
}
