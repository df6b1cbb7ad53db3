use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::history::DEFAULT_MAX_STEPS;
use crate::preview::{MAX_MS_PER_FRAME, MIN_MS_PER_FRAME};

/// User preferences persisted across sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_side: u32,
    pub max_undo_steps: usize,
    /// On-screen size of one cell in points.
    pub zoom: f32,
    pub show_grid: bool,
    pub ms_per_frame: u64,
    pub export_scale: u32,
    pub snap_imports_to_palette: bool,
    pub last_palette: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_side: 32,
            max_undo_steps: DEFAULT_MAX_STEPS,
            zoom: 16.0,
            show_grid: true,
            ms_per_frame: 150,
            export_scale: 1,
            snap_imports_to_palette: false,
            last_palette: "default".into(),
        }
    }
}

impl Settings {
    /// Location of `settings.json`:
    /// Linux `$XDG_CONFIG_HOME/pixelgrid` or `~/.config/pixelgrid`,
    /// Windows `%APPDATA%\PixelGrid`, macOS `~/Library/Application Support/PixelGrid`.
    pub fn path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").ok()?;
            return Some(PathBuf::from(appdata).join("PixelGrid").join("settings.json"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home).join("Library").join("Application Support").join("PixelGrid").join("settings.json"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(dir.join("pixelgrid").join("settings.json"))
        }
    }

    /// Loads settings, falling back to defaults when the file is missing or unreadable.
    pub fn load() -> Self {
        match Self::path() {
            Some(p) => Self::load_from(&p),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read settings, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&text) {
            Ok(s) => s.sanitized(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::path() else { return Ok(()) };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Clamps values edited by hand into their usable ranges.
    fn sanitized(mut self) -> Self {
        self.default_side = self.default_side.clamp(1, crate::document::MAX_SIDE);
        self.max_undo_steps = self.max_undo_steps.max(1);
        self.zoom = self.zoom.clamp(2.0, 64.0);
        self.ms_per_frame = self.ms_per_frame.clamp(MIN_MS_PER_FRAME, MAX_MS_PER_FRAME);
        self.export_scale = self.export_scale.clamp(1, crate::image_io::MAX_EXPORT_SCALE);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pixelgrid-test-{}-{name}", std::process::id())).join("settings.json")
    }

    #[test]
    fn missing_file_gives_defaults() {
        assert_eq!(Settings::load_from(&temp_path("missing")), Settings::default());
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("roundtrip");
        let s = Settings { default_side: 64, show_grid: false, last_palette: "pico-8".into(), ..Settings::default() };
        s.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), s);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn partial_and_malformed_files() {
        let path = temp_path("partial");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"zoom": 500.0, "unknown": 1}"#).unwrap();
        let s = Settings::load_from(&path);
        assert_eq!(s.zoom, 64.0);
        assert_eq!(s.default_side, 32);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
