use std::path::PathBuf;
use std::time::Duration;

use eframe::egui::{self, Color32, Context, Key, RichText, Sense, Stroke};
use rfd::FileDialog;
use tracing::{error, info};

use crate::color::Color;
use crate::document::Document;
use crate::history::History;
use crate::image_io::{self, ExportKind};
use crate::palette::{EmbeddedPalettes, Palette};
use crate::preview::{MAX_MS_PER_FRAME, MIN_MS_PER_FRAME, PreviewState};
use crate::project::{self, PROJECT_EXTENSION};
use crate::settings::Settings;
use crate::shapes::{Pattern, StampShape};
use crate::tools::{self, Brush, MAX_BRUSH_SIZE, Symmetry, Tool};

const NEW_SIDES: [u32; 5] = [8, 16, 32, 64, 128];

const SHORTCUTS: &str = "B Pencil · E Eraser · F Fill · I Eyedropper · C Clear · Space Animate · 1-4 Brush size · \
                         Ctrl+Z Undo · Ctrl+Y Redo · Ctrl+S Export PNG · ? Toggle";

pub struct PixelApp {
    pub settings: Settings,
    pub doc: Document,
    pub history: History,
    pub project_path: Option<PathBuf>,
    pub palette: Palette,
    pub grouped_pals: Vec<(String, Vec<Palette>)>,
    pub brush: Brush,
    pub tool: Tool,
    pub active_layer: usize,
    pub preview: PreviewState,
    // pointer state
    pub drawing: bool,
    pub stroke_changed: bool,
    /// Frame the current stroke paints on, fixed at press time.
    pub stroke_frame: usize,
    pub last_cell: Option<(i32, i32)>,
    pub draw_start: Option<(i32, i32)>,
    pub draw_end: Option<(i32, i32)>,
    pub status: String,
    pub dirty: bool,
    // windows
    pub show_new_dialog: bool,
    pub new_side: u32,
    pub show_shapes: bool,
    pub show_patterns: bool,
    pub show_shortcuts: bool,
    pub show_exit_confirm: bool,
    pub renaming: Option<(usize, String)>,
}

/// Layer panel clicks, applied after the panel stops borrowing the document.
enum LayerAction {
    Select(usize),
    ToggleVisible(usize),
    /// Index, value, and whether the edit is finished and should be recorded.
    Opacity(usize, f32, bool),
    Up(usize),
    Down(usize),
    Delete(usize),
    Rename(usize, String),
}

impl PixelApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings, opened: Option<(Document, PathBuf)>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        let grouped_pals = EmbeddedPalettes::grouped_by_folder();
        let palette = EmbeddedPalettes::find(&settings.last_palette).unwrap_or_default();

        let (doc, project_path) = match opened {
            Some((doc, path)) => (doc, Some(path)),
            None => (Self::blank_document(settings.default_side), None),
        };
        let history = History::new(&doc, settings.max_undo_steps);
        let status = match &project_path {
            Some(p) => format!("Opened {}", p.display()),
            None => format!("New {0}x{0} canvas", doc.side),
        };

        Self {
            preview: PreviewState::new(settings.ms_per_frame),
            new_side: doc.side,
            settings,
            doc,
            history,
            project_path,
            palette,
            grouped_pals,
            brush: Brush::default(),
            tool: Tool::Pencil,
            active_layer: 0,
            drawing: false,
            stroke_changed: false,
            stroke_frame: 0,
            last_cell: None,
            draw_start: None,
            draw_end: None,
            status,
            dirty: false,
            show_new_dialog: false,
            show_shapes: false,
            show_patterns: false,
            show_shortcuts: false,
            show_exit_confirm: false,
            renaming: None,
        }
    }

    fn blank_document(side: u32) -> Document {
        Document::new(side).unwrap_or_else(|e| {
            error!(error = %e, "bad default side in settings, using 32");
            Document::new(32).unwrap_or_else(|_| unreachable!("32 is a valid side"))
        })
    }

    fn frame_index(&self) -> usize {
        self.preview.current_frame.min(self.doc.frames.len().saturating_sub(1))
    }

    fn layer_count(&self) -> usize {
        self.doc.frames.get(self.frame_index()).map_or(0, |f| f.layers.len())
    }

    fn clamp_selection(&mut self) {
        self.preview.clamp_to(self.doc.frames.len());
        self.active_layer = self.active_layer.min(self.layer_count().saturating_sub(1));
    }

    // ===== history =====

    /// Records the current document as one undo step.
    fn commit(&mut self) {
        if self.history.commit(&self.doc) {
            self.dirty = true;
        }
    }

    fn undo(&mut self) {
        if let Some(doc) = self.history.undo() {
            self.doc = doc;
            self.clamp_selection();
            self.dirty = true;
            self.status = "Undo".into();
        }
    }

    fn redo(&mut self) {
        if let Some(doc) = self.history.redo() {
            self.doc = doc;
            self.clamp_selection();
            self.dirty = true;
            self.status = "Redo".into();
        }
    }

    fn replace_document(&mut self, doc: Document, path: Option<PathBuf>) {
        self.history.reset(&doc);
        self.doc = doc;
        self.project_path = path;
        self.active_layer = 0;
        self.preview.current_frame = 0;
        self.preview.playing = false;
        self.drawing = false;
        self.dirty = false;
        info!(side = self.doc.side, "history reset");
    }

    // ===== editing =====

    fn clear_active_layer(&mut self) {
        let fi = self.frame_index();
        tools::clear_layer(&mut self.doc, fi, self.active_layer);
        self.commit();
        self.status = "Layer cleared".into();
    }

    fn stamp_shape(&mut self, shape: StampShape) {
        let Some((row, col)) = self.last_cell else {
            self.status = "Click the canvas first to place the shape".into();
            return;
        };
        let fi = self.frame_index();
        let cell = Some(self.brush.color());
        if let Some(l) = self.doc.layer_mut(fi, self.active_layer) {
            shape.stamp(&mut l.canvas, row, col, cell);
        }
        self.commit();
    }

    fn apply_pattern(&mut self, pattern: Pattern) {
        let fi = self.frame_index();
        let cell = Some(self.brush.color());
        if let Some(l) = self.doc.layer_mut(fi, self.active_layer) {
            pattern.apply(&mut l.canvas, cell);
        }
        self.commit();
    }

    fn add_layer(&mut self) {
        match self.doc.add_layer(self.frame_index()) {
            Ok(i) => {
                self.active_layer = i;
                self.commit();
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn apply_layer_action(&mut self, action: LayerAction) {
        let fi = self.frame_index();
        match action {
            LayerAction::Select(i) => {
                self.active_layer = i;
                return;
            }
            LayerAction::ToggleVisible(i) => self.doc.toggle_layer_visibility(fi, i),
            LayerAction::Opacity(i, o, done) => {
                self.doc.set_layer_opacity(fi, i, o);
                if !done {
                    return;
                }
            }
            LayerAction::Up(i) => {
                if let Some(to) = self.doc.move_layer_up(fi, i) {
                    self.active_layer = to;
                }
            }
            LayerAction::Down(i) => {
                if let Some(to) = self.doc.move_layer_down(fi, i) {
                    self.active_layer = to;
                }
            }
            LayerAction::Delete(i) => match self.doc.delete_layer(fi, i, self.active_layer) {
                Some(active) => self.active_layer = active,
                None => {
                    self.status = "A frame needs at least one layer".into();
                    return;
                }
            },
            LayerAction::Rename(i, name) => self.doc.rename_layer(fi, i, &name),
        }
        self.commit();
    }

    fn go_to_frame(&mut self, index: usize) {
        self.preview.current_frame = index;
        self.clamp_selection();
    }

    fn begin_stroke(&mut self, cell: (i32, i32)) {
        let fi = self.frame_index();
        let (row, col) = cell;
        self.stroke_frame = fi;
        self.drawing = true;
        self.stroke_changed = false;
        self.last_cell = Some(cell);
        self.draw_start = Some(cell);
        self.draw_end = Some(cell);
        match self.tool {
            Tool::Pencil => {
                tools::paint(&mut self.doc, fi, self.active_layer, &self.brush, row, col, Some(self.brush.color()));
                self.stroke_changed = true;
            }
            Tool::Eraser => {
                tools::paint(&mut self.doc, fi, self.active_layer, &self.brush, row, col, None);
                self.stroke_changed = true;
            }
            Tool::Fill => {
                if tools::fill(&mut self.doc, fi, self.active_layer, self.brush.color(), row, col) {
                    self.commit();
                }
                self.drawing = false;
            }
            Tool::Eyedropper => {
                if tools::pick(&self.doc, fi, &mut self.brush, row, col) {
                    self.status = format!("Picked {}", self.brush.color());
                    self.tool = Tool::Pencil;
                }
                self.drawing = false;
            }
            Tool::Line | Tool::Rectangle | Tool::Circle => {}
        }
    }

    fn continue_stroke(&mut self, cell: (i32, i32)) {
        let fi = self.stroke_frame;
        let prev = self.draw_end.unwrap_or(cell);
        self.draw_end = Some(cell);
        if prev == cell {
            return;
        }
        let ink = match self.tool {
            Tool::Pencil => Some(self.brush.color()),
            Tool::Eraser => None,
            _ => return,
        };
        tools::paint_stroke(&mut self.doc, fi, self.active_layer, &self.brush, prev, cell, ink);
        self.stroke_changed = true;
    }

    fn end_stroke(&mut self) {
        self.drawing = false;
        if self.tool.is_drag_shape() {
            if let (Some(s), Some(e)) = (self.draw_start, self.draw_end) {
                let fi = self.stroke_frame;
                tools::drag_shape(&mut self.doc, fi, self.active_layer, self.tool, &self.brush, s, e);
                self.stroke_changed = true;
            }
        }
        if self.stroke_changed {
            self.commit();
        }
        self.draw_start = None;
        self.draw_end = None;
    }

    // ===== file actions =====

    fn action_new(&mut self, side: u32) {
        match Document::new(side) {
            Ok(doc) => {
                self.replace_document(doc, None);
                self.settings.default_side = side;
                self.status = format!("New {side}x{side} canvas");
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn action_open_project(&mut self) {
        let Some(path) = FileDialog::new().add_filter("PixelGrid project", &[PROJECT_EXTENSION]).pick_file() else { return };
        match project::load(&path) {
            Ok(doc) => {
                self.status = format!("Opened {}", path.display());
                self.replace_document(doc, Some(path));
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "open failed");
                self.status = format!("Open failed: {e}");
            }
        }
    }

    fn action_save_project(&mut self) -> bool {
        let path = match &self.project_path {
            Some(p) => p.clone(),
            None => {
                let picked = FileDialog::new()
                    .add_filter("PixelGrid project", &[PROJECT_EXTENSION])
                    .set_file_name(format!("pixel-art.{PROJECT_EXTENSION}"))
                    .save_file();
                match picked {
                    Some(p) => p,
                    None => return false,
                }
            }
        };
        match project::save(&self.doc, &path) {
            Ok(()) => {
                self.status = format!("Saved {}", path.display());
                self.project_path = Some(path);
                self.dirty = false;
                true
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "save failed");
                self.status = format!("Save failed: {e}");
                false
            }
        }
    }

    fn action_import_image(&mut self) {
        let Some(path) = FileDialog::new().add_filter("Images", &["png", "jpg", "jpeg", "gif"]).pick_file() else { return };
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Imported").to_owned();
        let snap = self.settings.snap_imports_to_palette.then_some(self.palette.colors.as_slice());
        let fi = self.frame_index();
        let result = image_io::load_rgba_frames(&path)
            .and_then(|frames| image_io::import_frames(&mut self.doc, fi, &name, &frames, snap));
        match result {
            Ok(n) => {
                self.active_layer = self.layer_count().saturating_sub(1);
                self.commit();
                info!(path = %path.display(), layers = n, "image imported");
                self.status = format!("Imported {} ({n} frame{})", path.display(), if n == 1 { "" } else { "s" });
            }
            Err(e) => {
                // frames appended before the failure stay, so record them
                self.commit();
                self.status = format!("Import failed: {e}");
            }
        }
    }

    fn action_export(&mut self, kind: ExportKind) {
        let (label, ext, default_name) = match kind {
            ExportKind::Png => ("PNG", "png", "pixel-art.png"),
            ExportKind::Gif => ("GIF", "gif", "pixel-art.gif"),
            ExportKind::Apng => ("Animated PNG", "apng", "pixel-art.apng"),
        };
        let Some(path) = FileDialog::new().add_filter(label, &[ext]).set_file_name(default_name).save_file() else { return };
        let fi = self.frame_index();
        let result = image_io::export_to_path(&self.doc, &path, fi, self.preview.ms_per_frame, self.settings.export_scale);
        match result {
            Ok(()) => {
                info!(path = %path.display(), ?kind, "exported");
                self.status = format!("Exported {}", path.display());
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "export failed");
                self.status = format!("Export failed: {e}");
            }
        }
    }

    fn action_open_palette(&mut self) {
        let Some(path) = FileDialog::new().add_filter("Palette", &["hex"]).pick_file() else { return };
        match Palette::load(&path) {
            Ok(p) => {
                self.status = format!("Loaded palette {}", p.name);
                self.palette = p;
            }
            Err(e) => self.status = format!("Palette load failed: {e}"),
        }
    }

    fn action_save_palette(&mut self) {
        let name = format!("{}.hex", self.palette.name);
        let Some(path) = FileDialog::new().add_filter("Palette", &["hex"]).set_file_name(name).save_file() else { return };
        match self.palette.save(&path) {
            Ok(()) => self.status = format!("Saved palette {}", path.display()),
            Err(e) => self.status = format!("Palette save failed: {e}"),
        }
    }

    fn persist_settings(&mut self) {
        self.settings.ms_per_frame = self.preview.ms_per_frame;
        self.settings.last_palette = self.palette.name.clone();
        if let Err(e) = self.settings.save() {
            error!(error = %e, "could not save settings");
        }
    }

    // ===== UI =====

    fn ui_menu(&mut self, ui: &mut egui::Ui, ctx: &Context) {
        ui.menu_button("File", |ui| {
            if ui.button("New…").clicked() {
                ui.close_menu();
                self.show_new_dialog = true;
            }
            if ui.button("Open project…").clicked() {
                ui.close_menu();
                self.action_open_project();
            }
            if ui.button("Save project").clicked() {
                ui.close_menu();
                self.action_save_project();
            }
            if ui.button("Save project as…").clicked() {
                ui.close_menu();
                let previous = self.project_path.take();
                if !self.action_save_project() {
                    self.project_path = previous;
                }
            }
            ui.separator();
            if ui.button("Import image (PNG/JPG/GIF)…").clicked() {
                ui.close_menu();
                self.action_import_image();
            }
            ui.checkbox(&mut self.settings.snap_imports_to_palette, "Snap imports to palette");
            ui.separator();
            if ui.button("Export frame as PNG…").clicked() {
                ui.close_menu();
                self.action_export(ExportKind::Png);
            }
            if ui.button("Export animation as GIF…").clicked() {
                ui.close_menu();
                self.action_export(ExportKind::Gif);
            }
            if ui.button("Export animation as APNG…").clicked() {
                ui.close_menu();
                self.action_export(ExportKind::Apng);
            }
            ui.add(egui::Slider::new(&mut self.settings.export_scale, 1..=image_io::MAX_EXPORT_SCALE).text("export scale"));
            ui.separator();
            ui.menu_button("Palettes", |ui| {
                for (group, items) in &self.grouped_pals {
                    ui.menu_button(group.as_str(), |ui| {
                        for pal in items {
                            if ui.selectable_label(self.palette.name == pal.name, pal.name.as_str()).clicked() {
                                self.palette = pal.clone();
                                ui.close_menu();
                            }
                        }
                    });
                }
            });
            if ui.button("Open palette…").clicked() {
                ui.close_menu();
                self.action_open_palette();
            }
            if ui.button("Save palette…").clicked() {
                ui.close_menu();
                self.action_save_palette();
            }
            ui.separator();
            if ui.button("Quit").clicked() {
                ui.close_menu();
                self.request_quit(ctx);
            }
        });

        ui.menu_button("Edit", |ui| {
            if ui.add_enabled(self.history.can_undo(), egui::Button::new("Undo  Ctrl+Z")).clicked() {
                ui.close_menu();
                self.undo();
            }
            if ui.add_enabled(self.history.can_redo(), egui::Button::new("Redo  Ctrl+Y")).clicked() {
                ui.close_menu();
                self.redo();
            }
            ui.label(RichText::new(format!("{} undo steps", self.history.undo_len().saturating_sub(1))).weak());
            if ui.add(egui::Slider::new(&mut self.settings.max_undo_steps, 1..=200).text("history size")).changed() {
                self.history.set_max_steps(self.settings.max_undo_steps);
            }
            ui.separator();
            if ui.button("Clear layer  C").clicked() {
                ui.close_menu();
                self.clear_active_layer();
            }
        });

        ui.menu_button("Insert", |ui| {
            if ui.button("Shapes…").clicked() {
                ui.close_menu();
                self.show_shapes = true;
            }
            if ui.button("Patterns…").clicked() {
                ui.close_menu();
                self.show_patterns = true;
            }
        });

        ui.separator();
        ui.label(RichText::new(&self.status).color(Color32::LIGHT_GRAY));
    }

    fn ui_tools(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.add_enabled(self.history.can_undo(), egui::Button::new("⟲ Undo")).clicked() {
                self.undo();
            }
            if ui.add_enabled(self.history.can_redo(), egui::Button::new("⟳ Redo")).clicked() {
                self.redo();
            }
        });
        ui.separator();
        ui.heading("Tools");
        egui::Grid::new("tools_grid").num_columns(2).spacing([6.0, 6.0]).show(ui, |ui| {
            let mut tool_button = |ui: &mut egui::Ui, tool: Tool, label: &str| {
                if ui.selectable_label(self.tool == tool, label).clicked() {
                    self.tool = tool;
                }
            };
            tool_button(ui, Tool::Pencil, "✏ Pencil (B)");
            tool_button(ui, Tool::Eraser, "⌫ Eraser (E)");
            ui.end_row();
            tool_button(ui, Tool::Fill, "🪣 Fill (F)");
            tool_button(ui, Tool::Eyedropper, "💧 Eyedropper (I)");
            ui.end_row();
            tool_button(ui, Tool::Line, "📏 Line");
            tool_button(ui, Tool::Rectangle, "⬛ Rectangle");
            ui.end_row();
            tool_button(ui, Tool::Circle, "⚪ Circle");
            ui.end_row();
        });
        if matches!(self.tool, Tool::Rectangle | Tool::Circle) {
            ui.checkbox(&mut self.brush.fill_shapes, "Filled shapes");
        }
        ui.separator();
        ui.add(egui::Slider::new(&mut self.brush.size, 1..=MAX_BRUSH_SIZE).text("brush"));
        ui.horizontal(|ui| {
            egui::ComboBox::from_label("Symmetry")
                .selected_text(self.brush.symmetry.label())
                .show_ui(ui, |ui| {
                    for s in Symmetry::ALL {
                        ui.selectable_value(&mut self.brush.symmetry, s, s.label());
                    }
                });
            if ui.button("⟳").on_hover_text("Cycle symmetry").clicked() {
                self.brush.symmetry = self.brush.symmetry.next();
            }
        });
        ui.separator();
        ui.heading("Color");
        ui.horizontal(|ui| {
            ui.color_edit_button_srgb(&mut self.brush.rgb);
            ui.label(self.brush.color().to_hex());
        });
        let mut percent = (self.brush.opacity * 100.0).round() as u32;
        if ui.add(egui::Slider::new(&mut percent, 0..=100).text("opacity %")).changed() {
            self.brush.opacity = percent as f32 / 100.0;
        }
        ui.separator();
        ui.horizontal(|ui| {
            ui.heading("Palette");
            ui.label(RichText::new(&self.palette.name).weak());
        });
        let mut chosen = None;
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(2.0, 2.0);
            for (i, c) in self.palette.colors.iter().enumerate() {
                let (rect, response) = ui.allocate_exact_size(egui::vec2(18.0, 18.0), Sense::click());
                ui.painter().rect_filled(rect, 2.0, c.to_color32());
                if c.rgb_array() == self.brush.rgb {
                    ui.painter().rect_stroke(rect, 2.0, Stroke::new(2.0, Color32::WHITE));
                }
                if response.on_hover_text(c.to_hex()).clicked() {
                    chosen = Some(i);
                }
            }
        });
        if let Some(i) = chosen {
            self.brush.rgb = self.palette.colors[i].rgb_array();
        }
        if ui.button("+ Add current color").clicked() {
            let [r, g, b] = self.brush.rgb;
            self.palette.add(Color::rgb(r, g, b));
        }
    }

    fn ui_layers(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Layers");
            if ui.button("+").on_hover_text("Add layer").clicked() {
                self.add_layer();
            }
        });
        ui.separator();
        let fi = self.frame_index();
        let Some(frame) = self.doc.frames.get(fi) else { return };
        let mut action = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            // top layer first
            for (i, layer) in frame.layers.iter().enumerate().rev() {
                let active = i == self.active_layer;
                egui::Frame::group(ui.style())
                    .fill(if active { Color32::from_gray(60) } else { Color32::TRANSPARENT })
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            let eye = if layer.visible { "👁" } else { "—" };
                            if ui.button(eye).on_hover_text("Toggle visibility").clicked() {
                                action = Some(LayerAction::ToggleVisible(i));
                            }
                            let editing = matches!(&self.renaming, Some((idx, _)) if *idx == i);
                            if let (true, Some((_, buf))) = (editing, &mut self.renaming) {
                                let resp = ui.text_edit_singleline(buf);
                                if resp.lost_focus() {
                                    action = Some(LayerAction::Rename(i, buf.clone()));
                                } else {
                                    resp.request_focus();
                                }
                            } else {
                                let resp = ui.selectable_label(active, layer.name.as_str());
                                if resp.double_clicked() {
                                    self.renaming = Some((i, layer.name.clone()));
                                } else if resp.clicked() {
                                    action = Some(LayerAction::Select(i));
                                }
                            }
                        });
                        ui.horizontal(|ui| {
                            let mut opacity = layer.opacity;
                            let slider = ui.add(egui::Slider::new(&mut opacity, 0.0..=1.0).show_value(false));
                            if slider.changed() {
                                action = Some(LayerAction::Opacity(i, opacity, !slider.dragged()));
                            } else if slider.drag_stopped() {
                                action = Some(LayerAction::Opacity(i, opacity, true));
                            }
                            if ui.small_button("▲").clicked() {
                                action = Some(LayerAction::Up(i));
                            }
                            if ui.small_button("▼").clicked() {
                                action = Some(LayerAction::Down(i));
                            }
                            if ui.small_button("×").on_hover_text("Delete layer").clicked() {
                                action = Some(LayerAction::Delete(i));
                            }
                        });
                    });
            }
        });
        if let Some(a) = action {
            if matches!(a, LayerAction::Rename(..)) {
                self.renaming = None;
            }
            self.apply_layer_action(a);
        }
    }

    fn ui_frames(&mut self, ui: &mut egui::Ui) {
        let count = self.doc.frames.len();
        // playback holds still while a stroke is in progress
        if self.drawing {
            self.preview.hold();
        } else if let Some(f) = self.preview.tick(count) {
            self.go_to_frame(f);
        }
        ui.horizontal(|ui| {
            ui.label("Zoom");
            ui.add(egui::Slider::new(&mut self.settings.zoom, 2.0..=64.0));
            ui.checkbox(&mut self.settings.show_grid, "Grid");
            ui.separator();
            let play = if self.preview.playing { "⏸ Pause" } else { "▶ Play" };
            if ui.button(play).on_hover_text("Space").clicked() {
                self.preview.toggle();
            }
            ui.add(egui::Slider::new(&mut self.preview.ms_per_frame, MIN_MS_PER_FRAME..=MAX_MS_PER_FRAME).text("ms/frame"));
        });
        ui.separator();
        let cur = self.frame_index();
        ui.horizontal(|ui| {
            if ui.add_enabled(cur > 0, egui::Button::new("← Prev")).clicked() {
                self.go_to_frame(cur - 1);
            }
            let mut shown = cur + 1;
            if ui.add(egui::Slider::new(&mut shown, 1..=count).text(format!("/ {count}"))).changed() {
                self.go_to_frame(shown - 1);
            }
            if ui.add_enabled(cur + 1 < count, egui::Button::new("Next →")).clicked() {
                self.go_to_frame(cur + 1);
            }
            ui.separator();
            if ui.button("+ Frame").clicked() {
                let i = self.doc.add_frame();
                self.go_to_frame(i);
                self.commit();
            }
            if ui.button("Duplicate").clicked() {
                if let Ok(i) = self.doc.duplicate_frame(cur) {
                    self.go_to_frame(i);
                    self.commit();
                }
            }
            if ui.add_enabled(count > 1, egui::Button::new("Delete")).clicked() && self.doc.delete_frame(cur) {
                self.go_to_frame(cur.saturating_sub(1));
                self.commit();
            }
            if ui.add_enabled(cur > 0, egui::Button::new("◀ Move")).clicked() && self.doc.move_frame(cur, cur - 1) {
                self.go_to_frame(cur - 1);
                self.commit();
            }
            if ui.add_enabled(cur + 1 < count, egui::Button::new("Move ▶")).clicked() && self.doc.move_frame(cur, cur + 1) {
                self.go_to_frame(cur + 1);
                self.commit();
            }
        });
    }

    fn ui_canvas(&mut self, ui: &mut egui::Ui) {
        let side = self.doc.side;
        let zoom = self.settings.zoom;
        let size = egui::vec2(side as f32 * zoom, side as f32 * zoom);
        let fi = self.frame_index();

        egui::ScrollArea::both().show(ui, |ui| {
            let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
            let painter = ui.painter_at(rect);

            // checkerboard so transparent cells stay visible
            let sq = (zoom / 2.0).max(4.0);
            let (dark, light) = (Color32::from_gray(60), Color32::from_gray(90));
            let mut y = rect.top();
            let mut row = 0;
            while y < rect.bottom() {
                let mut x = rect.left();
                let mut col = 0;
                while x < rect.right() {
                    let r = egui::Rect::from_min_size(egui::pos2(x, y), egui::vec2(sq, sq));
                    painter.rect_filled(r.intersect(rect), 0.0, if (row + col) % 2 == 0 { light } else { dark });
                    x += sq;
                    col += 1;
                }
                y += sq;
                row += 1;
            }

            if let Some(frame) = self.doc.frames.get(fi) {
                let mut rgba = Vec::with_capacity((side * side * 4) as usize);
                for cell in frame.composite() {
                    let c = cell.unwrap_or(Color::rgba(0, 0, 0, 0));
                    rgba.extend_from_slice(&[c.r, c.g, c.b, c.a]);
                }
                let img = egui::ColorImage::from_rgba_unmultiplied([side as usize, side as usize], &rgba);
                let tex = ui.ctx().load_texture("canvas", img, egui::TextureOptions::NEAREST);
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                painter.image(tex.id(), rect, uv, Color32::WHITE);
            }

            if self.settings.show_grid && zoom >= 4.0 {
                let stroke = Stroke::new(1.0, Color32::from_black_alpha(70));
                for i in 0..=side {
                    let t = i as f32 * zoom;
                    painter.line_segment([rect.min + egui::vec2(t, 0.0), rect.min + egui::vec2(t, size.y)], stroke);
                    painter.line_segment([rect.min + egui::vec2(0.0, t), rect.min + egui::vec2(size.x, t)], stroke);
                }
            }

            let (pointer_pos, down, pressed) =
                ui.input(|i| (i.pointer.interact_pos(), i.pointer.primary_down(), i.pointer.primary_pressed()));
            let to_cell = |p: egui::Pos2| {
                let local = (p - rect.min) / zoom;
                (local.y.floor() as i32, local.x.floor() as i32)
            };
            let over_canvas = pointer_pos.filter(|p| rect.contains(*p) && response.hovered());
            if pressed {
                if let Some(p) = over_canvas {
                    self.begin_stroke(to_cell(p));
                }
            } else if down && self.drawing {
                // keep tracking outside the canvas so drag shapes can end off-grid
                if let Some(p) = pointer_pos {
                    let (r, c) = to_cell(p);
                    let last = side as i32 - 1;
                    self.continue_stroke((r.clamp(0, last), c.clamp(0, last)));
                }
            }
            if !down && self.drawing {
                self.end_stroke();
            }

            if self.drawing && self.tool.is_drag_shape() {
                if let (Some(s), Some(e)) = (self.draw_start, self.draw_end) {
                    let center = |(r, c): (i32, i32)| rect.min + egui::vec2((c as f32 + 0.5) * zoom, (r as f32 + 0.5) * zoom);
                    let (a, b) = (center(s), center(e));
                    let stroke = Stroke::new(1.5, Color32::WHITE);
                    match self.tool {
                        Tool::Line => {
                            painter.line_segment([a, b], stroke);
                        }
                        Tool::Rectangle => {
                            painter.rect_stroke(egui::Rect::from_two_pos(a, b), 0.0, stroke);
                        }
                        Tool::Circle => {
                            painter.circle_stroke(a, a.distance(b), stroke);
                        }
                        _ => {}
                    }
                }
            }
        });
    }

    fn ui_windows(&mut self, ctx: &Context) {
        if self.show_new_dialog {
            let mut open = true;
            egui::Window::new("New canvas").collapsible(false).resizable(false).open(&mut open).show(ctx, |ui| {
                ui.label("Canvas size:");
                ui.horizontal(|ui| {
                    for s in NEW_SIDES {
                        ui.selectable_value(&mut self.new_side, s, format!("{s}×{s}"));
                    }
                });
                if self.dirty {
                    ui.label(RichText::new("Unsaved changes will be lost.").color(Color32::YELLOW));
                }
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Create").clicked() {
                        self.action_new(self.new_side);
                        self.show_new_dialog = false;
                    }
                    if ui.button("Cancel").clicked() {
                        self.show_new_dialog = false;
                    }
                });
            });
            self.show_new_dialog &= open;
        }

        if self.show_shapes {
            let mut open = true;
            let mut picked = None;
            egui::Window::new("Shapes").collapsible(false).open(&mut open).show(ctx, |ui| {
                ui.label("Drawn at the last clicked cell, a quarter of the canvas in size.");
                ui.horizontal(|ui| {
                    for shape in StampShape::ALL {
                        if ui.button(shape.label()).clicked() {
                            picked = Some(shape);
                        }
                    }
                });
            });
            if let Some(shape) = picked {
                self.stamp_shape(shape);
                open = false;
            }
            self.show_shapes = open;
        }

        if self.show_patterns {
            let mut open = true;
            let mut picked = None;
            egui::Window::new("Patterns").collapsible(false).open(&mut open).show(ctx, |ui| {
                ui.horizontal(|ui| {
                    for pattern in Pattern::ALL {
                        if ui.button(pattern.label()).clicked() {
                            picked = Some(pattern);
                        }
                    }
                });
            });
            if let Some(pattern) = picked {
                self.apply_pattern(pattern);
                open = false;
            }
            self.show_patterns = open;
        }

        if self.show_shortcuts {
            egui::Area::new(egui::Id::new("shortcuts"))
                .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -140.0])
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(RichText::new("Shortcuts").strong());
                        ui.label(SHORTCUTS);
                    });
                });
        }

        if self.show_exit_confirm {
            egui::Window::new("Unsaved changes")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label("Save the project before quitting?");
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui.button("💾 Save and quit").clicked() && self.action_save_project() {
                            self.show_exit_confirm = false;
                            self.quit(ctx);
                        }
                        if ui.button("Quit without saving").clicked() {
                            self.show_exit_confirm = false;
                            self.dirty = false;
                            self.quit(ctx);
                        }
                        if ui.button("Cancel").clicked() {
                            self.show_exit_confirm = false;
                        }
                    });
                });
        }
    }

    fn request_quit(&mut self, ctx: &Context) {
        if self.dirty {
            self.show_exit_confirm = true;
        } else {
            self.quit(ctx);
        }
    }

    fn quit(&mut self, ctx: &Context) {
        self.persist_settings();
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn handle_shortcuts(&mut self, ctx: &Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let cmd = |k: Key| ctx.input(|i| i.modifiers.command && i.key_pressed(k));
        let plain = |k: Key| ctx.input(|i| !i.modifiers.command && !i.modifiers.alt && i.key_pressed(k));

        if cmd(Key::Z) {
            self.undo();
        }
        if cmd(Key::Y) {
            self.redo();
        }
        if cmd(Key::S) {
            self.action_export(ExportKind::Png);
        }
        if cmd(Key::N) {
            self.show_new_dialog = true;
        }
        if cmd(Key::O) {
            self.action_open_project();
        }
        if cmd(Key::Q) {
            self.request_quit(ctx);
        }

        if plain(Key::B) {
            self.tool = Tool::Pencil;
        }
        if plain(Key::E) {
            self.tool = Tool::Eraser;
        }
        if plain(Key::F) {
            self.tool = Tool::Fill;
        }
        if plain(Key::I) {
            self.tool = Tool::Eyedropper;
        }
        if plain(Key::C) {
            self.clear_active_layer();
        }
        if plain(Key::Space) {
            self.preview.toggle();
        }
        for (key, size) in [(Key::Num1, 1), (Key::Num2, 2), (Key::Num3, 3), (Key::Num4, 4)] {
            if plain(key) {
                self.brush.set_size(size);
            }
        }
        let toggle_help = ctx.input(|i| i.events.iter().any(|e| matches!(e, egui::Event::Text(t) if t == "?" || t == "/")));
        if toggle_help {
            self.show_shortcuts = !self.show_shortcuts;
        }
    }
}

impl eframe::App for PixelApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        if self.preview.playing {
            ctx.request_repaint_after(Duration::from_millis(10));
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| self.ui_menu(ui, ctx));
        });
        egui::SidePanel::left("left").resizable(true).default_width(240.0).show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| self.ui_tools(ui));
        });
        egui::SidePanel::right("right").resizable(true).default_width(220.0).show(ctx, |ui| self.ui_layers(ui));
        egui::TopBottomPanel::bottom("bottom").show(ctx, |ui| self.ui_frames(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.ui_canvas(ui));

        self.ui_windows(ctx);
        self.handle_shortcuts(ctx);

        if ctx.input(|i| i.viewport().close_requested()) {
            if self.dirty {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                self.show_exit_confirm = true;
            } else {
                self.persist_settings();
            }
        }
    }
}
