use crate::canvas::Cell;
use crate::color::Color;
use crate::document::Document;
use crate::shapes;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tool {
    Pencil,
    Eraser,
    Fill,
    Eyedropper,
    Line,
    Rectangle,
    Circle,
}

impl Tool {
    /// Drag tools draw once, from the press cell to the release cell.
    pub fn is_drag_shape(self) -> bool {
        matches!(self, Tool::Line | Tool::Rectangle | Tool::Circle)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Symmetry {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Symmetry {
    pub const ALL: [Symmetry; 4] = [Self::None, Self::Horizontal, Self::Vertical, Self::Both];

    pub fn next(self) -> Self {
        match self {
            Self::None => Self::Horizontal,
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Both,
            Self::Both => Self::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Horizontal => "Horizontal",
            Self::Vertical => "Vertical",
            Self::Both => "Both",
        }
    }

    /// The pressed point followed by its mirrors.
    pub fn mirror_points(self, row: i32, col: i32, side: u32) -> Vec<(i32, i32)> {
        let last = side as i32 - 1;
        let mut pts = vec![(row, col)];
        if matches!(self, Self::Horizontal | Self::Both) {
            pts.push((last - row, col));
        }
        if matches!(self, Self::Vertical | Self::Both) {
            pts.push((row, last - col));
        }
        if self == Self::Both {
            pts.push((last - row, last - col));
        }
        pts
    }
}

/// Brush state shared by every tool.
#[derive(Clone, Debug)]
pub struct Brush {
    pub rgb: [u8; 3],
    pub opacity: f32,
    pub size: u32,
    pub symmetry: Symmetry,
    pub fill_shapes: bool,
}

pub const MAX_BRUSH_SIZE: u32 = 8;

impl Default for Brush {
    fn default() -> Self {
        Self { rgb: [0, 0, 0], opacity: 1.0, size: 1, symmetry: Symmetry::None, fill_shapes: false }
    }
}

impl Brush {
    pub fn color(&self) -> Color {
        let [r, g, b] = self.rgb;
        Color::rgb(r, g, b).with_opacity(self.opacity)
    }

    pub fn set_color(&mut self, color: Color) {
        self.rgb = color.rgb_array();
        self.opacity = color.opacity();
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size.clamp(1, MAX_BRUSH_SIZE);
    }
}

/// Pencil/eraser stamp at every symmetry point on the active layer.
pub fn paint(doc: &mut Document, frame: usize, layer: usize, brush: &Brush, row: i32, col: i32, cell: Cell) {
    let side = doc.side;
    let Some(l) = doc.layer_mut(frame, layer) else { return };
    for (r, c) in brush.symmetry.mirror_points(row, col, side) {
        l.canvas.stamp_brush(r, c, brush.size, cell);
    }
}

/// Pencil/eraser drag from the previous pointer cell, so fast strokes leave no gaps.
pub fn paint_stroke(doc: &mut Document, frame: usize, layer: usize, brush: &Brush, from: (i32, i32), to: (i32, i32), cell: Cell) {
    for (r, c) in shapes::line_points(from.0, from.1, to.0, to.1) {
        paint(doc, frame, layer, brush, r, c, cell);
    }
}

pub fn fill(doc: &mut Document, frame: usize, layer: usize, color: Color, row: i32, col: i32) -> bool {
    doc.layer_mut(frame, layer).is_some_and(|l| l.canvas.flood_fill(row, col, color))
}

/// Eyedropper. Loads the picked color into the brush and reports whether anything was found.
pub fn pick(doc: &Document, frame: usize, brush: &mut Brush, row: i32, col: i32) -> bool {
    let Some(f) = doc.frames.get(frame) else { return false };
    let Some(first) = f.layers.first() else { return false };
    let Some(index) = first.canvas.index(row, col) else { return false };
    match f.pick(index) {
        Some(c) => {
            brush.set_color(c);
            true
        }
        None => false,
    }
}

/// Finishes a drag shape between the press and release cells.
pub fn drag_shape(doc: &mut Document, frame: usize, layer: usize, tool: Tool, brush: &Brush, start: (i32, i32), end: (i32, i32)) {
    let Some(l) = doc.layer_mut(frame, layer) else { return };
    let cell = Some(brush.color());
    let ((r0, c0), (r1, c1)) = (start, end);
    let canvas = &mut l.canvas;
    match tool {
        Tool::Line => shapes::line(canvas, r0, c0, r1, c1, cell),
        Tool::Rectangle if brush.fill_shapes => shapes::rect_filled(canvas, r0, c0, r1, c1, cell),
        Tool::Rectangle => shapes::rect_outline(canvas, r0, c0, r1, c1, cell),
        Tool::Circle => {
            let radius = shapes::drag_radius(r0, c0, r1, c1);
            if brush.fill_shapes {
                shapes::fill_disc(canvas, r0, c0, radius, cell);
            } else {
                shapes::circle_outline(canvas, r0, c0, radius, cell);
            }
        }
        _ => {}
    }
}

pub fn clear_layer(doc: &mut Document, frame: usize, layer: usize) {
    if let Some(l) = doc.layer_mut(frame, layer) {
        l.canvas.clear();
    }
}
