use crate::canvas::EditorCanvas;
use crate::components::{guides::GuidesPanel, preview::PreviewPanel};
use crate::io::{self, FileHandler, SaveFormat};
use crate::ops::compositor::Interpolation;
use crate::ops::export::ExportMode;
use crate::session::Session;
use crate::settings::EditorSettings;
use crate::transform::{MAX_ZOOM, MIN_ZOOM};
use crate::{log_err, log_info};
use eframe::egui;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::mpsc;

// ============================================================================
// ASYNC IO PIPELINE: background image loading / export writing
// ============================================================================

/// Result delivered from a background IO thread.
pub enum IoResult {
    /// A source file was decoded.
    ImageLoaded { image: RgbaImage, path: PathBuf },
    /// Decoding failed.
    LoadFailed(String),
    /// Export bytes reached the disk.
    ExportComplete { path: PathBuf },
    /// Writing the export failed.
    ExportFailed(String),
}

pub struct NinePatchApp {
    session: Session,
    canvas: EditorCanvas,
    guides_panel: GuidesPanel,
    preview_panel: PreviewPanel,
    file_handler: FileHandler,
    settings: EditorSettings,

    /// Last status line and whether it reports an error.
    status: Option<(String, bool)>,
    io_sender: mpsc::Sender<IoResult>,
    io_receiver: mpsc::Receiver<IoResult>,
    pending_loads: usize,
}

impl NinePatchApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings = EditorSettings::load();
        let (io_sender, io_receiver) = mpsc::channel();
        Self {
            session: Session::new(),
            canvas: EditorCanvas::new(),
            guides_panel: GuidesPanel::new(),
            preview_panel: PreviewPanel::new(&settings),
            file_handler: FileHandler::new(),
            settings,
            status: None,
            io_sender,
            io_receiver,
            pending_loads: 0,
        }
    }

    fn set_status(&mut self, msg: impl Into<String>, is_error: bool) {
        self.status = Some((msg.into(), is_error));
    }

    /// Decode `path` off the UI thread.
    fn spawn_load(&mut self, path: PathBuf, ctx: &egui::Context) {
        let sender = self.io_sender.clone();
        let ctx = ctx.clone();
        self.pending_loads += 1;
        std::thread::spawn(move || {
            let result = match io::load_source(&path) {
                Ok(image) => IoResult::ImageLoaded { image, path },
                Err(e) => IoResult::LoadFailed(e),
            };
            let _ = sender.send(result);
            ctx.request_repaint();
        });
    }

    fn open_dialog(&mut self) {
        match self.file_handler.open_image() {
            Some(Ok((image, path))) => self.load_image(image, path),
            Some(Err(e)) => {
                log_err!("{}", e);
                self.set_status(e, true);
            }
            None => {}
        }
    }

    fn load_image(&mut self, image: RgbaImage, path: PathBuf) {
        let (w, h) = image.dimensions();
        self.session.load(image, Some(path), self.settings.viewport_size);
        self.set_status(format!("Loaded {} ({}×{})", self.session.name, w, h), false);
    }

    fn export(&mut self, mode: ExportMode, ctx: &egui::Context) {
        let format = match mode {
            ExportMode::Compiled => SaveFormat::Png,
            ExportMode::GuideBorder => self.file_handler.last_format,
        };
        let output = match self.session.export(mode, format) {
            Ok(output) => output,
            Err(e) => {
                self.set_status(e.to_string(), true);
                return;
            }
        };
        let Some(path) = self.file_handler.pick_export_path(&output.file_name, format) else {
            return;
        };

        let sender = self.io_sender.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = match io::write_bytes(&path, &output.bytes) {
                Ok(()) => IoResult::ExportComplete { path },
                Err(e) => IoResult::ExportFailed(e),
            };
            let _ = sender.send(result);
            ctx.request_repaint();
        });
    }

    fn drain_io(&mut self) {
        while let Ok(result) = self.io_receiver.try_recv() {
            match result {
                IoResult::ImageLoaded { image, path } => {
                    self.pending_loads = self.pending_loads.saturating_sub(1);
                    self.load_image(image, path);
                }
                IoResult::LoadFailed(e) => {
                    self.pending_loads = self.pending_loads.saturating_sub(1);
                    log_err!("{}", e);
                    self.set_status(e, true);
                }
                IoResult::ExportComplete { path } => {
                    log_info!("Wrote {}", path.display());
                    self.set_status(format!("Saved {}", path.display()), false);
                }
                IoResult::ExportFailed(e) => {
                    log_err!("{}", e);
                    self.set_status(e, true);
                }
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            if ui.button("Open…").clicked() {
                self.open_dialog();
            }
            ui.separator();

            let loaded = self.session.is_loaded();
            if ui
                .add_enabled(loaded, egui::Button::new(ExportMode::GuideBorder.label()))
                .clicked()
            {
                self.export(ExportMode::GuideBorder, ctx);
            }
            egui::ComboBox::from_id_source("export_format")
                .selected_text(self.file_handler.last_format.label())
                .show_ui(ui, |ui| {
                    for f in SaveFormat::all() {
                        ui.selectable_value(&mut self.file_handler.last_format, *f, f.label());
                    }
                });
            if ui
                .add_enabled(loaded, egui::Button::new(ExportMode::Compiled.label()))
                .clicked()
            {
                self.export(ExportMode::Compiled, ctx);
            }
            ui.separator();

            let mut zoom = self.session.zoom();
            if ui
                .add_enabled(
                    loaded,
                    egui::Slider::new(&mut zoom, MIN_ZOOM..=MAX_ZOOM)
                        .text("Zoom")
                        .custom_formatter(|v, _| format!("{:.0}%", v * 100.0)),
                )
                .changed()
            {
                self.session.set_zoom(zoom);
            }
            if ui.add_enabled(loaded, egui::Button::new("Fit")).clicked() {
                self.session.fit_zoom(self.settings.viewport_size);
            }
        });
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            self.guides_panel.show(ui, &mut self.session, &mut self.settings);
            ui.separator();

            egui::ComboBox::from_label("Resampling")
                .selected_text(self.settings.interpolation.label())
                .show_ui(ui, |ui| {
                    for interp in Interpolation::all() {
                        ui.selectable_value(&mut self.settings.interpolation, *interp, interp.label());
                    }
                });
            ui.separator();

            self.preview_panel.show(ui, &self.session, &self.settings);
        });
    }
}

impl eframe::App for NinePatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let title = if self.session.is_loaded() {
            format!("NinePatchFE - {}", self.session.name)
        } else {
            "NinePatchFE".to_string()
        };
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(title));

        if ctx.input(|i| i.viewport().close_requested()) {
            self.settings.preview_scale_x = self.preview_panel.scale_x;
            self.settings.preview_scale_y = self.preview_panel.scale_y;
            self.settings.save();
        }

        self.drain_io();

        // --- Drag-and-Drop: the last dropped image replaces the session ---
        let dropped: Vec<egui::DroppedFile> = ctx.input(|i| i.raw.dropped_files.clone());
        if let Some(path) = dropped.into_iter().filter_map(|f| f.path).last() {
            self.spawn_load(path, ctx);
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar(ui, ctx);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.pending_loads > 0 {
                    ui.spinner();
                }
                match &self.status {
                    Some((msg, true)) => {
                        ui.colored_label(egui::Color32::from_rgb(220, 38, 38), msg);
                    }
                    Some((msg, false)) => {
                        ui.label(msg);
                    }
                    None => {
                        ui.weak("Drop an image here or use Open…");
                    }
                }
            });
        });

        egui::SidePanel::right("guides_panel")
            .resizable(false)
            .min_width(self.settings.preview_size + 24.0)
            .show(ctx, |ui| {
                self.side_panel(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                self.canvas.show(ui, &mut self.session, &self.settings);
            });
        });
    }
}
