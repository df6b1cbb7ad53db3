// Headless export: `pixelgrid art.pxg --export out.gif --scale 4`
//
// The output format follows the extension of --export (png, gif, apng).
// No window is opened in this mode.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use crate::error::Result;
use crate::image_io::{self, ExportKind, MAX_EXPORT_SCALE};
use crate::preview::{MAX_MS_PER_FRAME, MIN_MS_PER_FRAME};
use crate::project;

/// Pixel-art editor with layers and frame animation.
#[derive(Parser, Debug)]
#[command(name = "pixelgrid", version, about)]
pub struct Args {
    /// Project file (.pxg) to open, or to export with --export.
    pub project: Option<PathBuf>,

    /// Export the project to this file and exit. Format comes from the extension.
    #[arg(short, long, value_name = "FILE", requires = "project")]
    pub export: Option<PathBuf>,

    /// Frame exported to a still PNG (0-based).
    #[arg(short, long, default_value_t = 0)]
    pub frame: usize,

    /// Integer upscale applied to every exported pixel.
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=MAX_EXPORT_SCALE as i64))]
    pub scale: u32,

    /// Milliseconds per frame for GIF/APNG exports.
    #[arg(short, long, default_value_t = 150, value_parser = clap::value_parser!(u64).range(MIN_MS_PER_FRAME..=MAX_MS_PER_FRAME))]
    pub delay: u64,
}

impl Args {
    pub fn is_headless(&self) -> bool {
        self.export.is_some()
    }
}

/// Runs the export described by `args`.
pub fn run(args: &Args) -> ExitCode {
    let (Some(input), Some(output)) = (&args.project, &args.export) else {
        error!("--export needs a project file");
        return ExitCode::FAILURE;
    };
    match export(input, output, args) {
        Ok(kind) => {
            info!(input = %input.display(), output = %output.display(), ?kind, "export finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(input = %input.display(), output = %output.display(), error = %e, "export failed");
            ExitCode::FAILURE
        }
    }
}

fn export(input: &Path, output: &Path, args: &Args) -> Result<ExportKind> {
    let kind = ExportKind::from_path(output)?;
    let doc = project::load(input)?;
    image_io::export_to_path(&doc, output, args.frame, args.delay, args.scale)?;
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::document::Document;

    fn parse(argv: &[&str]) -> std::result::Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("pixelgrid").chain(argv.iter().copied()))
    }

    #[test]
    fn defaults_and_gui_mode() {
        let args = parse(&[]).unwrap();
        assert!(args.project.is_none());
        assert!(!args.is_headless());
        assert_eq!((args.frame, args.scale, args.delay), (0, 1, 150));
    }

    #[test]
    fn export_requires_project_and_valid_ranges() {
        assert!(parse(&["--export", "out.png"]).is_err());
        assert!(parse(&["a.pxg", "--export", "out.png", "--scale", "0"]).is_err());
        assert!(parse(&["a.pxg", "--export", "out.gif", "--delay", "5"]).is_err());
        let args = parse(&["a.pxg", "-e", "out.gif", "-s", "4", "-d", "100"]).unwrap();
        assert!(args.is_headless());
        assert_eq!((args.scale, args.delay), (4, 100));
    }

    #[test]
    fn exports_project_to_png() {
        let dir = std::env::temp_dir().join(format!("pixelgrid-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("art.pxg");
        let output = dir.join("art.png");

        let mut doc = Document::new(4).unwrap();
        doc.frames[0].layers[0].canvas.set(1, 1, Some(Color::rgb(255, 0, 0)));
        project::save(&doc, &input).unwrap();

        let args = parse(&[input.to_str().unwrap(), "--export", output.to_str().unwrap(), "--scale", "2"]).unwrap();
        assert_eq!(export(&input, &output, &args).unwrap(), ExportKind::Png);
        let img = image::open(&output).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (8, 8));
        assert_eq!(img.get_pixel(2, 2).0, [255, 0, 0, 255]);

        assert!(export(&input, &dir.join("art.bmp"), &args).is_err());
        assert!(export(&dir.join("missing.pxg"), &output, &args).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
