//! `.pxg` project files: the full document as JSON.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::document::{Document, Frame, Layer, MAX_SIDE};
use crate::error::{EditorError, Result};

pub const PROJECT_VERSION: u32 = 1;
pub const PROJECT_EXTENSION: &str = "pxg";

#[derive(Serialize, Deserialize)]
struct ProjectFile {
    version: u32,
    side: u32,
    frames: Vec<FrameRecord>,
}

#[derive(Serialize, Deserialize)]
struct FrameRecord {
    layers: Vec<LayerRecord>,
}

#[derive(Serialize, Deserialize)]
struct LayerRecord {
    id: u64,
    name: String,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "default_opacity")]
    opacity: f32,
    /// `null` or a `#rrggbb[aa]` string per cell, row-major.
    cells: Vec<Option<String>>,
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

pub fn to_json(doc: &Document) -> Result<String> {
    let file = ProjectFile {
        version: PROJECT_VERSION,
        side: doc.side,
        frames: doc
            .frames
            .iter()
            .map(|f| FrameRecord {
                layers: f
                    .layers
                    .iter()
                    .map(|l| LayerRecord {
                        id: l.id,
                        name: l.name.clone(),
                        visible: l.visible,
                        opacity: l.opacity,
                        cells: l.canvas.cells.iter().map(|c| c.map(Color::to_hex)).collect(),
                    })
                    .collect(),
            })
            .collect(),
    };
    Ok(serde_json::to_string(&file)?)
}

/// Parses and validates a project. Structural problems (version, side, empty
/// frames or layers, cell counts, colours, layer ids) all come back as
/// [`EditorError::InvalidProject`]; only malformed JSON is reported as `Json`.
pub fn from_json(text: &str) -> Result<Document> {
    let file: ProjectFile = serde_json::from_str(text)?;
    let invalid = EditorError::InvalidProject;
    if file.version == 0 || file.version > PROJECT_VERSION {
        return Err(invalid(format!("unsupported version {}", file.version)));
    }
    if file.side == 0 || file.side > MAX_SIDE {
        return Err(invalid(format!("side {} is out of range (1..={MAX_SIDE})", file.side)));
    }
    if file.frames.is_empty() {
        return Err(invalid("no frames".into()));
    }
    let len = (file.side * file.side) as usize;
    let mut frames = Vec::with_capacity(file.frames.len());
    let mut seen_ids = HashSet::new();
    for (fi, fr) in file.frames.into_iter().enumerate() {
        if fr.layers.is_empty() {
            return Err(invalid(format!("frame {fi} has no layers")));
        }
        let mut layers = Vec::with_capacity(fr.layers.len());
        for lr in fr.layers {
            if lr.cells.len() != len {
                return Err(invalid(format!("layer {:?} in frame {fi} has {} cells, expected {len}", lr.name, lr.cells.len())));
            }
            if !seen_ids.insert(lr.id) {
                return Err(invalid(format!("duplicate layer id {}", lr.id)));
            }
            let cells = lr
                .cells
                .iter()
                .map(|c| c.as_deref().map(Color::from_hex).transpose())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| invalid(format!("layer {:?} in frame {fi}: {e}", lr.name)))?;
            layers.push(Layer {
                id: lr.id,
                name: lr.name,
                visible: lr.visible,
                opacity: lr.opacity.clamp(0.0, 1.0),
                canvas: Canvas { side: file.side, cells },
            });
        }
        frames.push(Frame { layers });
    }
    Document::from_frames(file.side, frames).ok_or_else(|| invalid("layer ids exhausted".into()))
}

pub fn save(doc: &Document, path: &Path) -> Result<()> {
    std::fs::write(path, to_json(doc)?)?;
    info!(path = %path.display(), "project saved");
    Ok(())
}

pub fn load(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)?;
    let doc = from_json(&text)?;
    info!(path = %path.display(), side = doc.side, frames = doc.frames.len(), "project loaded");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn project_round_trip_preserves_layers() {
        let mut doc = Document::new(4).unwrap();
        let top = doc.add_layer(0).unwrap();
        doc.frames[0].layers[top].canvas.set(1, 2, Some(Color::rgba(1, 2, 3, 4)));
        doc.toggle_layer_visibility(0, 0);
        doc.set_layer_opacity(0, top, 0.25);
        doc.add_frame();

        let back = from_json(&to_json(&doc).unwrap()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn loaded_documents_keep_ids_unique() {
        let doc = Document::new(2).unwrap();
        let mut back = from_json(&to_json(&doc).unwrap()).unwrap();
        let existing = back.frames[0].layers[0].id;
        let idx = back.add_layer(0).unwrap();
        assert_ne!(back.frames[0].layers[idx].id, existing);
    }

    #[test]
    fn rejects_malformed_projects() {
        let wrong_len = r#"{"version":1,"side":2,"frames":[{"layers":[{"id":1,"name":"a","cells":[null]}]}]}"#;
        assert!(matches!(from_json(wrong_len), Err(EditorError::InvalidProject(_))));

        let no_layers = r#"{"version":1,"side":2,"frames":[{"layers":[]}]}"#;
        assert!(matches!(from_json(no_layers), Err(EditorError::InvalidProject(_))));

        let future = r#"{"version":9,"side":2,"frames":[]}"#;
        assert!(matches!(from_json(future), Err(EditorError::InvalidProject(_))));

        let huge = r#"{"version":1,"side":100000,"frames":[]}"#;
        assert!(matches!(from_json(huge), Err(EditorError::InvalidProject(_))));

        let bad_color = r##"{"version":1,"side":1,"frames":[{"layers":[{"id":1,"name":"a","cells":["#zz0000"]}]}]}"##;
        assert!(matches!(from_json(bad_color), Err(EditorError::InvalidProject(_))));

        assert!(matches!(from_json("{not json"), Err(EditorError::Json(_))));
    }

    #[test]
    fn rejects_duplicate_and_exhausted_layer_ids() {
        let dup = r#"{"version":1,"side":1,"frames":[
            {"layers":[{"id":3,"name":"a","cells":[null]}]},
            {"layers":[{"id":3,"name":"b","cells":[null]}]}]}"#;
        assert!(matches!(from_json(dup), Err(EditorError::InvalidProject(_))));

        let max = r#"{"version":1,"side":1,"frames":[{"layers":[{"id":18446744073709551615,"name":"a","cells":[null]}]}]}"#;
        assert!(matches!(from_json(max), Err(EditorError::InvalidProject(_))));

        let near_max = r#"{"version":1,"side":1,"frames":[{"layers":[{"id":18446744073709551614,"name":"a","cells":[null]}]}]}"#;
        let mut doc = from_json(near_max).unwrap();
        let idx = doc.add_layer(0).unwrap();
        assert_eq!(doc.frames[0].layers[idx].id, u64::MAX);
    }

    #[test]
    fn cells_are_written_as_hex_strings() {
        let mut doc = Document::new(1).unwrap();
        doc.frames[0].layers[0].canvas.set(0, 0, Some(Color::rgba(255, 0, 0, 128)));
        let json = to_json(&doc).unwrap();
        assert!(json.contains(r##""cells":["#ff000080"]"##));
    }

    #[test]
    fn missing_optional_fields_default() {
        let text = r##"{"version":1,"side":1,"frames":[{"layers":[{"id":7,"name":"a","cells":["#ff0000"]}]}]}"##;
        let doc = from_json(text).unwrap();
        let layer = &doc.frames[0].layers[0];
        assert!(layer.visible);
        assert_eq!(layer.opacity, 1.0);
        assert_eq!(layer.canvas.get(0, 0), Some(Color::rgb(255, 0, 0)));
    }
}
