use crate::canvas::{Canvas, Cell};
use crate::color::Color;
use crate::error::{EditorError, Result};

pub const MAX_SIDE: u32 = 256;

#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub id: u64,
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub canvas: Canvas,
}

impl Layer {
    pub fn new(id: u64, name: impl Into<String>, side: u32) -> Self {
        Self { id, name: name.into(), visible: true, opacity: 1.0, canvas: Canvas::new(side) }
    }
}

/// One animation frame: a layer stack, index 0 at the bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub layers: Vec<Layer>,
}

impl Frame {
    /// Display composite: the topmost visible non-empty cell wins, its alpha scaled
    /// by the layer opacity. No blending between layers.
    pub fn composite(&self) -> Vec<Cell> {
        let len = self.layers.first().map_or(0, |l| l.canvas.cells.len());
        let mut out = vec![None; len];
        for layer in self.layers.iter().filter(|l| l.visible) {
            for (dst, src) in out.iter_mut().zip(&layer.canvas.cells) {
                if let Some(c) = src {
                    *dst = Some(Color { a: (c.a as f32 * layer.opacity.clamp(0.0, 1.0)).round() as u8, ..*c });
                }
            }
        }
        out
    }

    /// Eyedropper lookup: first visible non-empty cell scanning from the top layer down.
    pub fn pick(&self, index: usize) -> Option<Color> {
        self.layers
            .iter()
            .rev()
            .filter(|l| l.visible)
            .find_map(|l| l.canvas.cells.get(index).copied().flatten())
    }

    /// Export composite: visible layers drawn bottom to top with source-over blending.
    pub fn flatten(&self, side: u32) -> image::RgbaImage {
        let mut img = image::RgbaImage::new(side, side);
        let clear = Color::rgba(0, 0, 0, 0);
        for layer in self.layers.iter().filter(|l| l.visible) {
            for (i, cell) in layer.canvas.cells.iter().enumerate() {
                let Some(src) = cell else { continue };
                let (x, y) = (i as u32 % side, i as u32 / side);
                let px = img.get_pixel_mut(x, y);
                let dst = Color::rgba(px[0], px[1], px[2], px[3]);
                let out = if dst == clear && layer.opacity >= 1.0 { *src } else { src.over(dst, layer.opacity) };
                *px = image::Rgba([out.r, out.g, out.b, out.a]);
            }
        }
        img
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub side: u32,
    pub frames: Vec<Frame>,
    next_layer_id: u64,
}

impl Document {
    pub fn new(side: u32) -> Result<Self> {
        if side == 0 || side > MAX_SIDE {
            return Err(EditorError::InvalidSide(side));
        }
        let mut doc = Self { side, frames: Vec::new(), next_layer_id: 1 };
        doc.add_frame();
        Ok(doc)
    }

    /// Assembles a document from already-validated frames.
    ///
    /// New layers get ids above the largest existing one. Returns `None` when
    /// that id space is exhausted (a layer already uses `u64::MAX`).
    pub(crate) fn from_frames(side: u32, frames: Vec<Frame>) -> Option<Self> {
        let max_id = frames.iter().flat_map(|f| &f.layers).map(|l| l.id).max().unwrap_or(0);
        let next_layer_id = max_id.checked_add(1)?;
        Some(Self { side, frames, next_layer_id })
    }

    fn fresh_layer(&mut self, name: String) -> Layer {
        let id = self.next_layer_id;
        self.next_layer_id += 1;
        Layer::new(id, name, self.side)
    }

    pub fn frame(&self, index: usize) -> Result<&Frame> {
        let count = self.frames.len();
        self.frames.get(index).ok_or(EditorError::FrameOutOfRange { index, count })
    }

    pub fn frame_mut(&mut self, index: usize) -> Result<&mut Frame> {
        let count = self.frames.len();
        self.frames.get_mut(index).ok_or(EditorError::FrameOutOfRange { index, count })
    }

    pub fn layer_mut(&mut self, frame: usize, layer: usize) -> Option<&mut Layer> {
        self.frames.get_mut(frame).and_then(|f| f.layers.get_mut(layer))
    }

    // ===== layers =====

    /// Appends an empty layer on top of `frame` and returns its index.
    pub fn add_layer(&mut self, frame: usize) -> Result<usize> {
        let count = self.frame(frame)?.layers.len();
        let layer = self.fresh_layer(format!("Layer {}", count + 1));
        let f = self.frame_mut(frame)?;
        f.layers.push(layer);
        Ok(f.layers.len() - 1)
    }

    /// Removes a layer unless it is the last one. Returns the active index to use afterwards.
    pub fn delete_layer(&mut self, frame: usize, index: usize, active: usize) -> Option<usize> {
        let f = self.frames.get_mut(frame)?;
        if f.layers.len() <= 1 || index >= f.layers.len() {
            return None;
        }
        f.layers.remove(index);
        let active = if active >= index { active.saturating_sub(1) } else { active };
        Some(active.min(f.layers.len() - 1))
    }

    /// Swaps a layer with the one above it. Returns the layer's new index.
    pub fn move_layer_up(&mut self, frame: usize, index: usize) -> Option<usize> {
        let f = self.frames.get_mut(frame)?;
        if index + 1 >= f.layers.len() {
            return None;
        }
        f.layers.swap(index, index + 1);
        Some(index + 1)
    }

    pub fn move_layer_down(&mut self, frame: usize, index: usize) -> Option<usize> {
        let f = self.frames.get_mut(frame)?;
        if index == 0 || index >= f.layers.len() {
            return None;
        }
        f.layers.swap(index, index - 1);
        Some(index - 1)
    }

    pub fn set_layer_opacity(&mut self, frame: usize, index: usize, opacity: f32) {
        if let Some(l) = self.layer_mut(frame, index) {
            l.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    pub fn toggle_layer_visibility(&mut self, frame: usize, index: usize) {
        if let Some(l) = self.layer_mut(frame, index) {
            l.visible = !l.visible;
        }
    }

    pub fn rename_layer(&mut self, frame: usize, index: usize, name: &str) {
        if let Some(l) = self.layer_mut(frame, index) {
            l.name = name.to_owned();
        }
    }

    // ===== frames =====

    /// Appends a frame holding one empty layer and returns its index.
    pub fn add_frame(&mut self) -> usize {
        let layer = self.fresh_layer("Layer 1".to_owned());
        self.frames.push(Frame { layers: vec![layer] });
        self.frames.len() - 1
    }

    /// Inserts a deep copy of `index` right after it; the copies get fresh layer ids.
    pub fn duplicate_frame(&mut self, index: usize) -> Result<usize> {
        let mut copy = self.frame(index)?.clone();
        for layer in &mut copy.layers {
            layer.id = self.next_layer_id;
            self.next_layer_id += 1;
        }
        self.frames.insert(index + 1, copy);
        Ok(index + 1)
    }

    pub fn delete_frame(&mut self, index: usize) -> bool {
        if self.frames.len() <= 1 || index >= self.frames.len() {
            return false;
        }
        self.frames.remove(index);
        true
    }

    pub fn move_frame(&mut self, from: usize, to: usize) -> bool {
        if from >= self.frames.len() || to >= self.frames.len() || from == to {
            return false;
        }
        let f = self.frames.remove(from);
        self.frames.insert(to, f);
        true
    }

    /// Adds a layer built from `cells` on top of `frame`, appending frames as needed.
    /// Lengths other than `side * side` are rejected.
    pub fn push_layer_cells(&mut self, frame: usize, name: &str, cells: Vec<Cell>) -> Result<usize> {
        if cells.len() != (self.side * self.side) as usize {
            return Err(EditorError::InvalidProject(format!("layer has {} cells", cells.len())));
        }
        while self.frames.len() <= frame {
            self.add_frame();
        }
        let index = self.add_layer(frame)?;
        let layer = &mut self.frames[frame].layers[index];
        layer.name = name.to_owned();
        layer.canvas.cells = cells;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    #[test]
    fn new_rejects_bad_sides() {
        assert!(matches!(Document::new(0), Err(EditorError::InvalidSide(0))));
        assert!(Document::new(MAX_SIDE + 1).is_err());
        let doc = Document::new(16).unwrap();
        assert_eq!(doc.frames.len(), 1);
        assert_eq!(doc.frames[0].layers.len(), 1);
        assert_eq!(doc.frames[0].layers[0].canvas.cells.len(), 256);
    }

    #[test]
    fn composite_last_visible_wins() {
        let mut doc = Document::new(2).unwrap();
        let top = doc.add_layer(0).unwrap();
        doc.frames[0].layers[0].canvas.set(0, 0, Some(RED));
        doc.frames[0].layers[0].canvas.set(0, 1, Some(RED));
        doc.frames[0].layers[top].canvas.set(0, 0, Some(BLUE));

        let comp = doc.frames[0].composite();
        assert_eq!(comp[0], Some(BLUE));
        assert_eq!(comp[1], Some(RED));
        assert_eq!(comp[2], None);

        doc.toggle_layer_visibility(0, top);
        assert_eq!(doc.frames[0].composite()[0], Some(RED));
    }

    #[test]
    fn composite_applies_layer_opacity_without_blending() {
        let mut doc = Document::new(1).unwrap();
        doc.frames[0].layers[0].canvas.set(0, 0, Some(RED));
        let top = doc.add_layer(0).unwrap();
        doc.frames[0].layers[top].canvas.set(0, 0, Some(BLUE));
        doc.set_layer_opacity(0, top, 0.5);
        assert_eq!(doc.frames[0].composite()[0], Some(Color::rgba(0, 0, 255, 128)));
    }

    #[test]
    fn pick_scans_from_top() {
        let mut doc = Document::new(2).unwrap();
        let top = doc.add_layer(0).unwrap();
        doc.frames[0].layers[0].canvas.set(1, 1, Some(RED));
        doc.frames[0].layers[top].canvas.set(1, 1, Some(BLUE));
        assert_eq!(doc.frames[0].pick(3), Some(BLUE));
        doc.toggle_layer_visibility(0, top);
        assert_eq!(doc.frames[0].pick(3), Some(RED));
        assert_eq!(doc.frames[0].pick(0), None);
    }

    #[test]
    fn flatten_blends_layer_opacity() {
        let mut doc = Document::new(2).unwrap();
        doc.frames[0].layers[0].canvas.set(0, 0, Some(BLUE));
        let top = doc.add_layer(0).unwrap();
        doc.frames[0].layers[top].canvas.set(0, 0, Some(RED));
        doc.frames[0].layers[top].canvas.set(1, 1, Some(RED));
        doc.set_layer_opacity(0, top, 0.5);

        let img = doc.frames[0].flatten(2);
        assert_eq!(img.get_pixel(0, 0).0, [128, 0, 128, 255]);
        assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 128]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn delete_layer_keeps_one_and_adjusts_active() {
        let mut doc = Document::new(4).unwrap();
        assert_eq!(doc.delete_layer(0, 0, 0), None);
        doc.add_layer(0).unwrap();
        doc.add_layer(0).unwrap();
        // deleting below the active layer shifts it down
        assert_eq!(doc.delete_layer(0, 0, 2), Some(1));
        // deleting above leaves it alone
        assert_eq!(doc.delete_layer(0, 1, 0), Some(0));
        assert_eq!(doc.frames[0].layers.len(), 1);
    }

    #[test]
    fn rename_and_clamp_opacity() {
        let mut doc = Document::new(2).unwrap();
        doc.rename_layer(0, 0, "Outline");
        assert_eq!(doc.frames[0].layers[0].name, "Outline");
        doc.set_layer_opacity(0, 0, 1.5);
        assert_eq!(doc.frames[0].layers[0].opacity, 1.0);
        doc.set_layer_opacity(0, 0, -1.0);
        assert_eq!(doc.frames[0].layers[0].opacity, 0.0);
        // out of range indices are ignored
        doc.rename_layer(0, 4, "x");
        doc.set_layer_opacity(3, 0, 0.5);
        assert_eq!(doc.frames[0].layers[0].opacity, 0.0);
    }

    #[test]
    fn move_layers_within_bounds() {
        let mut doc = Document::new(4).unwrap();
        doc.add_layer(0).unwrap();
        let bottom_id = doc.frames[0].layers[0].id;
        assert_eq!(doc.move_layer_down(0, 0), None);
        assert_eq!(doc.move_layer_up(0, 0), Some(1));
        assert_eq!(doc.frames[0].layers[1].id, bottom_id);
        assert_eq!(doc.move_layer_up(0, 1), None);
    }

    #[test]
    fn layer_ids_stay_unique() {
        let mut doc = Document::new(4).unwrap();
        doc.add_layer(0).unwrap();
        let f = doc.duplicate_frame(0).unwrap();
        doc.add_frame();
        let mut ids: Vec<u64> = doc.frames.iter().flat_map(|f| &f.layers).map(|l| l.id).collect();
        let n = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), n);
        assert_eq!(f, 1);
    }

    #[test]
    fn frame_ops() {
        let mut doc = Document::new(4).unwrap();
        assert!(!doc.delete_frame(0));
        doc.frames[0].layers[0].canvas.set(0, 0, Some(RED));
        doc.duplicate_frame(0).unwrap();
        assert_eq!(doc.frames[1].layers[0].canvas.get(0, 0), Some(RED));
        doc.add_frame();
        assert!(doc.move_frame(2, 0));
        assert!(doc.frames[0].layers[0].canvas.is_empty());
        assert!(doc.delete_frame(0));
        assert_eq!(doc.frames.len(), 2);
        assert!(doc.frame(5).is_err());
    }

    #[test]
    fn push_layer_cells_appends_frames() {
        let mut doc = Document::new(2).unwrap();
        let idx = doc.push_layer_cells(2, "import", vec![Some(RED); 4]).unwrap();
        assert_eq!(doc.frames.len(), 3);
        assert_eq!(idx, 1);
        assert_eq!(doc.frames[2].layers[1].name, "import");
        assert!(doc.push_layer_cells(0, "bad", vec![None; 3]).is_err());
    }
}
