use std::collections::BTreeMap;
use std::path::Path;

use rust_embed::RustEmbed;
use tracing::{debug, warn};

use crate::color::Color;
use crate::error::{EditorError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub name: String,
    pub colors: Vec<Color>,
}

const DEFAULT_COLORS: [&str; 10] = [
    "#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF", "#808080", "#FF9900",
];

impl Default for Palette {
    fn default() -> Self {
        let colors = DEFAULT_COLORS.iter().filter_map(|h| Color::from_hex(h).ok()).collect();
        Self { name: "Default".into(), colors }
    }
}

impl Palette {
    /// Parses a `.hex` palette: one color per line, `;` comments and blank lines skipped.
    pub fn from_hex_text(name: &str, text: &str) -> Result<Self> {
        let mut colors = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let c = Color::from_hex(line)
                .map_err(|_| EditorError::InvalidPalette(format!("line {}: {:?}", lineno + 1, line)))?;
            colors.push(c);
        }
        if colors.is_empty() {
            return Err(EditorError::InvalidPalette("no colors".into()));
        }
        Ok(Self { name: name.to_owned(), colors })
    }

    /// `.hex` text, one lowercase `rrggbb[aa]` per line.
    pub fn to_hex_text(&self) -> String {
        let mut out = String::with_capacity(self.colors.len() * 9);
        for c in &self.colors {
            out.push_str(c.to_hex().trim_start_matches('#'));
            out.push('\n');
        }
        out
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Palette");
        Self::from_hex_text(name, &text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_hex_text())?;
        Ok(())
    }

    /// Adds a color unless it is already present. Returns its index.
    pub fn add(&mut self, color: Color) -> usize {
        match self.colors.iter().position(|&c| c == color) {
            Some(i) => i,
            None => {
                self.colors.push(color);
                self.colors.len() - 1
            }
        }
    }
}

#[derive(RustEmbed)]
#[folder = "palettes"]
pub struct EmbeddedPalettes;

impl EmbeddedPalettes {
    /// Bundled `.hex` palettes grouped by folder: (folder, [palette]).
    pub fn grouped_by_folder() -> Vec<(String, Vec<Palette>)> {
        let mut groups: BTreeMap<String, Vec<Palette>> = BTreeMap::new();
        for f in EmbeddedPalettes::iter() {
            let path = f.as_ref();
            if !path.to_ascii_lowercase().ends_with(".hex") {
                continue;
            }
            let Some(file) = EmbeddedPalettes::get(path) else { continue };
            let p = Path::new(path);
            let folder = p.parent().and_then(|s| s.to_str()).unwrap_or("").to_string();
            let name = p.file_stem().and_then(|s| s.to_str()).unwrap_or("Palette");
            let text = String::from_utf8_lossy(file.data.as_ref());
            match Palette::from_hex_text(name, &text) {
                Ok(pal) => groups.entry(folder).or_default().push(pal),
                Err(e) => warn!(path, error = %e, "skipping bundled palette"),
            }
        }
        debug!(groups = groups.len(), "loaded bundled palettes");
        groups.into_iter().collect()
    }

    pub fn find(name: &str) -> Option<Palette> {
        Self::grouped_by_folder().into_iter().flat_map(|(_, items)| items).find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_has_ten_colors() {
        let p = Palette::default();
        assert_eq!(p.colors.len(), 10);
        assert_eq!(p.colors[9], Color::rgb(0xff, 0x99, 0x00));
    }

    #[test]
    fn hex_text_round_trips_with_comments() {
        let text = "; header\n\nff0000\n#00ff0080\n";
        let p = Palette::from_hex_text("test", text).unwrap();
        assert_eq!(p.colors, vec![Color::rgb(255, 0, 0), Color::rgba(0, 255, 0, 128)]);
        assert_eq!(p.to_hex_text(), "ff0000\n00ff0080\n");
    }

    #[test]
    fn bad_palettes_are_rejected() {
        assert!(Palette::from_hex_text("x", "; only comments\n").is_err());
        let err = Palette::from_hex_text("x", "ff0000\nzzz\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn add_skips_duplicates() {
        let mut p = Palette::default();
        assert_eq!(p.add(Color::BLACK), 0);
        assert_eq!(p.add(Color::rgb(1, 2, 3)), 10);
        assert_eq!(p.colors.len(), 11);
    }

    #[test]
    fn bundled_palettes_load() {
        let groups = EmbeddedPalettes::grouped_by_folder();
        assert!(groups.iter().any(|(folder, _)| folder == "retro"));
        let pico = EmbeddedPalettes::find("pico-8").unwrap();
        assert_eq!(pico.colors.len(), 16);
        assert_eq!(EmbeddedPalettes::find("default").unwrap(), Palette { name: "default".into(), ..Palette::default() });
    }
}
