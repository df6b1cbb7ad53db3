#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
use std::process::ExitCode;

use clap::Parser;
use eframe::NativeOptions;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod canvas;
mod cli;
mod color;
mod document;
mod error;
mod history;
mod image_io;
mod palette;
mod preview;
mod project;
mod settings;
mod shapes;
mod tools;

/// Desktop editor built on eframe/egui; `--export` runs headless instead.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = cli::Args::parse();
    if args.is_headless() {
        return cli::run(&args);
    }

    let settings = settings::Settings::load();
    let opened = match &args.project {
        Some(path) => match project::load(path) {
            Ok(doc) => Some((doc, path.clone())),
            Err(e) => {
                error!(path = %path.display(), error = %e, "could not open project");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let native_options = NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("PixelGrid")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    info!("starting editor");
    match eframe::run_native(
        "PixelGrid",
        native_options,
        Box::new(move |cc| Box::new(app::PixelApp::new(cc, settings, opened))),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "editor exited with an error");
            ExitCode::FAILURE
        }
    }
}
