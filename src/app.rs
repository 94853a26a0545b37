// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the application structure that implements the
//! eframe::App trait. It owns the document, routes canvas and panel actions
//! to it, runs slow work (image loading, AI requests, export encoding) on
//! background threads and folds the results back in on the UI thread.

use crate::config::AppConfig;
use crate::interaction::{CaptionCommand, InteractionController};
use crate::io::export::{DesktopSink, ExportSink, ShareOutcome};
use crate::io::media;
use crate::models::background::BackgroundImage;
use crate::models::caption::CaptionId;
use crate::models::document::MemeDocument;
use crate::render::compositor::{ExportError, ExportJob, ImageExporter};
use crate::render::fonts::CaptionFont;
use crate::services::gemini::GeminiClient;
use crate::services::transport::{CurlTransport, HttpTransport};
use crate::services::{CaptionSuggester, ImageEditor, ServiceError, SuggestedCaption};
use crate::ui::canvas::{self, CanvasLayout, CanvasView};
use crate::ui::{properties, suggestions, toolbar};
use crate::util::geometry::{fit_contain, DisplayMapping};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

/// Progress of the AI requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Idle,
    Analyzing,
    Editing,
}

/// Where a finished export goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Download,
    Share,
}

/// External services the application talks to.
pub struct Collaborators {
    pub suggester: Arc<dyn CaptionSuggester>,
    pub editor: Arc<dyn ImageEditor>,
    pub transport: Arc<dyn HttpTransport>,
    pub sink: Box<dyn ExportSink>,
}

impl Collaborators {
    /// Production wiring: curl transport, Gemini services, desktop sink.
    pub fn from_config(config: &AppConfig) -> Self {
        let transport: Arc<dyn HttpTransport> =
            Arc::new(CurlTransport::new(Duration::from_secs(config.api.timeout_secs)));
        let client = Arc::new(GeminiClient::new(transport.clone(), config.api.clone()));
        Self {
            suggester: client.clone(),
            editor: client,
            transport,
            sink: Box::new(DesktopSink),
        }
    }
}

type Pending<T> = Option<Receiver<T>>;

/// Main application state.
pub struct MemeApp {
    config: AppConfig,

    /// Background, captions and selection
    document: MemeDocument,

    /// Pointer drag state
    controller: InteractionController,

    /// Typeface shared by preview and export
    font: Arc<CaptionFont>,

    /// AI request lifecycle
    status: RequestStatus,

    /// The one message shown to the user, if any
    error_message: Option<String>,

    /// Suggestions for the current background
    suggestions: Vec<SuggestedCaption>,

    /// Text of the edit prompt field
    edit_instruction: String,

    /// Text of the "Open URL" field
    url_input: String,

    /// Container and image boxes from the last frame
    canvas_layout: Option<CanvasLayout>,

    /// Background uploaded for display
    image_texture: Option<egui::TextureHandle>,

    /// Background changed since the texture was made
    texture_stale: bool,

    /// Receiver for background image loading
    image_loader: Pending<Result<BackgroundImage, String>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Show a failed load to the user instead of only logging it
    report_load_errors: bool,

    suggestion_request: Pending<Result<Vec<SuggestedCaption>, ServiceError>>,
    edit_request: Pending<anyhow::Result<BackgroundImage>>,
    export_request: Pending<(ExportTarget, Result<Vec<u8>, ExportError>)>,

    collaborators: Collaborators,
}

/// Take a finished result out of a pending slot.
///
/// `None` while still running; `Some(None)` if the worker went away without
/// answering.
fn poll_pending<T>(slot: &mut Pending<T>) -> Option<Option<T>> {
    let receiver = slot.as_ref()?;
    match receiver.try_recv() {
        Ok(value) => {
            *slot = None;
            Some(Some(value))
        }
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Disconnected) => {
            *slot = None;
            Some(None)
        }
    }
}

impl MemeApp {
    /// Create the application for a native window.
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> anyhow::Result<Self> {
        let font = CaptionFont::load(config.font.path.as_deref(), config.font.synthetic_bold)?;
        font.install(&cc.egui_ctx);
        let collaborators = Collaborators::from_config(&config);
        Ok(Self::with_collaborators(config, Arc::new(font), collaborators))
    }

    /// Create the application with explicit collaborators.
    pub fn with_collaborators(config: AppConfig, font: Arc<CaptionFont>, collaborators: Collaborators) -> Self {
        Self {
            config,
            document: MemeDocument::new(),
            controller: InteractionController::new(),
            font,
            status: RequestStatus::Idle,
            error_message: None,
            suggestions: Vec::new(),
            edit_instruction: String::new(),
            url_input: String::new(),
            canvas_layout: None,
            image_texture: None,
            texture_stale: false,
            image_loader: None,
            loading_message: None,
            report_load_errors: false,
            suggestion_request: None,
            edit_request: None,
            export_request: None,
            collaborators,
        }
    }

    /// Replace the message shown to the user.
    fn show_error(&mut self, message: String) {
        log::error!("{}", message);
        self.error_message = Some(message);
    }

    fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Run `load` on a background thread and install its result as the
    /// background.
    fn spawn_image_load<F>(&mut self, message: &str, report_errors: bool, load: F)
    where
        F: FnOnce() -> Result<BackgroundImage, String> + Send + 'static,
    {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some(message.to_string());
        self.report_load_errors = report_errors;
        std::thread::spawn(move || {
            let _ = sender.send(load());
        });
    }

    /// Load an image file (asynchronously).
    pub fn load_image_file(&mut self, path: PathBuf) {
        self.spawn_image_load("Loading image...", false, move || {
            media::load_image_file(&path).map_err(|e| e.to_string())
        });
    }

    /// Load dropped image bytes (asynchronously).
    pub fn load_image_bytes(&mut self, bytes: Arc<[u8]>) {
        self.spawn_image_load("Loading image...", false, move || {
            media::load_image_bytes(&bytes).map_err(|e| e.to_string())
        });
    }

    /// Download and load a remote image (asynchronously).
    pub fn load_image_url(&mut self, url: String) {
        let url = url.trim().to_string();
        if url.is_empty() {
            return;
        }
        self.clear_error();
        let transport = self.collaborators.transport.clone();
        let strict = self.config.network.strict_cross_origin;
        self.spawn_image_load("Downloading image...", true, move || {
            media::load_remote_image(&url, transport.as_ref(), strict)
                .map_err(|e| format!("Could not open {url}: {e}"))
        });
    }

    fn set_background(&mut self, background: BackgroundImage) {
        self.document.set_background(background);
        self.suggestions.clear();
        self.texture_stale = true;
    }

    /// Add a caption with the default text and appearance.
    pub fn add_caption(&mut self) -> CaptionId {
        self.document.add_default_caption()
    }

    /// Turn a suggestion into a caption with the default appearance.
    pub fn accept_suggestion(&mut self, index: usize) -> Option<CaptionId> {
        let text = self.suggestions.get(index)?.text.clone();
        Some(self.document.add_caption(text))
    }

    pub fn delete_caption(&mut self, id: CaptionId) {
        self.controller.forget(id);
        self.document.delete_caption(id);
    }

    fn apply_command(&mut self, command: CaptionCommand) {
        match command {
            CaptionCommand::Select(id) => self.document.select(id),
            CaptionCommand::ClearSelection => self.document.clear_selection(),
            CaptionCommand::Move { id, x, y } => self.document.move_caption(id, x, y),
        }
    }

    fn apply_properties_action(&mut self, action: properties::PropertiesAction) {
        use properties::PropertiesAction;
        match action {
            PropertiesAction::Select(id) => self.document.select(id),
            PropertiesAction::SetText(id, text) => self.document.set_text(id, text),
            PropertiesAction::SetColor(id, color) => self.document.set_color(id, color),
            PropertiesAction::SetFontSize(id, size) => self.document.set_font_size(id, size),
            PropertiesAction::Delete(id) => self.delete_caption(id),
            PropertiesAction::None => {}
        }
    }

    /// Ask the suggestion service about the current background.
    pub fn request_suggestions(&mut self) {
        if self.status != RequestStatus::Idle {
            return;
        }
        let Some(background) = self.document.background().cloned() else {
            return;
        };
        self.clear_error();
        self.status = RequestStatus::Analyzing;

        let (sender, receiver) = channel();
        self.suggestion_request = Some(receiver);
        let suggester = self.collaborators.suggester.clone();
        std::thread::spawn(move || {
            let _ = sender.send(suggester.suggest_captions(&background));
        });
    }

    /// Ask the edit service to apply the current instruction.
    pub fn request_image_edit(&mut self) {
        let instruction = self.edit_instruction.trim().to_string();
        if self.status != RequestStatus::Idle || instruction.is_empty() {
            return;
        }
        let Some(background) = self.document.background().cloned() else {
            return;
        };
        self.clear_error();
        self.status = RequestStatus::Editing;

        let (sender, receiver) = channel();
        self.edit_request = Some(receiver);
        let editor = self.collaborators.editor.clone();
        std::thread::spawn(move || {
            let result = editor
                .edit_image(&background, &instruction)
                .map_err(anyhow::Error::from)
                .and_then(|url| media::load_data_url(&url).map_err(anyhow::Error::from));
            let _ = sender.send(result);
        });
    }

    /// Snapshot everything the compositor needs.
    ///
    /// The image box is recomputed for the current background; the one the
    /// canvas last drew may belong to an image that was just replaced.
    fn export_job(&self) -> Result<ExportJob, ExportError> {
        let background = self.document.background().ok_or(ExportError::NoImage)?;
        let container = self.canvas_layout.ok_or(ExportError::NotLaidOut)?.container;
        let (width, height) = (background.natural_width(), background.natural_height());
        let image = fit_contain(width, height, container);
        let mapping = DisplayMapping::from_layout(width, image, container).ok_or(ExportError::NotLaidOut)?;
        Ok(ExportJob {
            background: background.clone(),
            captions: self.document.captions().to_vec(),
            mapping,
            font: self.font.clone(),
        })
    }

    /// Render the meme on a worker, then hand it to `target`.
    pub fn request_export(&mut self, target: ExportTarget) {
        if self.export_request.is_some() {
            return;
        }
        self.clear_error();
        let job = match self.export_job() {
            Ok(job) => job,
            Err(e) => {
                self.show_error(format!("Export failed: {e}"));
                return;
            }
        };

        let (sender, receiver) = channel();
        self.export_request = Some(receiver);
        std::thread::spawn(move || {
            let _ = sender.send((target, job.export_as_image()));
        });
    }

    fn deliver_export(&mut self, target: ExportTarget, png: Vec<u8>) {
        let file_name = self.config.export.file_name.clone();
        if target == ExportTarget::Share {
            match self.collaborators.sink.share(&png, &file_name) {
                Ok(ShareOutcome::Shared) => return,
                Ok(ShareOutcome::Unsupported) => {
                    log::info!("Sharing unavailable, downloading instead");
                }
                Err(e) => {
                    self.show_error(format!("Share failed: {e:#}"));
                    return;
                }
            }
        }
        match self.collaborators.sink.download(&png, &file_name) {
            Ok(Some(path)) => log::info!("Downloaded meme to {}", path.display()),
            Ok(None) => log::debug!("Download cancelled"),
            Err(e) => self.show_error(format!("Download failed: {e:#}")),
        }
    }

    /// Fold finished background work into the application state.
    pub fn poll_requests(&mut self) {
        if let Some(result) = poll_pending(&mut self.image_loader) {
            self.loading_message = None;
            match result {
                Some(Ok(background)) => {
                    self.set_background(background);
                    log::info!("Image loaded successfully");
                }
                Some(Err(e)) if self.report_load_errors => self.show_error(e),
                Some(Err(e)) => log::warn!("Ignoring image: {}", e),
                None => self.show_error("Image loading was interrupted".to_string()),
            }
        }

        if let Some(result) = poll_pending(&mut self.suggestion_request) {
            self.status = RequestStatus::Idle;
            match result {
                Some(Ok(suggestions)) => self.suggestions = suggestions,
                Some(Err(e)) => self.show_error(format!("Caption suggestions failed: {e}")),
                None => self.show_error("Caption suggestions were interrupted".to_string()),
            }
        }

        if let Some(result) = poll_pending(&mut self.edit_request) {
            self.status = RequestStatus::Idle;
            match result {
                Some(Ok(background)) => {
                    self.set_background(background);
                    self.edit_instruction.clear();
                }
                Some(Err(e)) => self.show_error(format!("Image edit failed: {e:#}")),
                None => self.show_error("Image edit was interrupted".to_string()),
            }
        }

        if let Some(result) = poll_pending(&mut self.export_request) {
            match result {
                Some((target, Ok(png))) => self.deliver_export(target, png),
                Some((_, Err(e))) => self.show_error(format!("Export failed: {e}")),
                None => self.show_error("Export was interrupted".to_string()),
            }
        }
    }

    fn has_pending_work(&self) -> bool {
        self.image_loader.is_some()
            || self.suggestion_request.is_some()
            || self.edit_request.is_some()
            || self.export_request.is_some()
    }

    /// Upload the background to the GPU after it changes.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if !self.texture_stale {
            return;
        }
        self.texture_stale = false;
        self.image_texture = self.document.background().map(|background| {
            let size = [
                background.natural_width() as usize,
                background.natural_height() as usize,
            ];
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, background.pixels.as_raw());
            ctx.load_texture("background", color_image, egui::TextureOptions::LINEAR)
        });
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if let Some(bytes) = file.bytes {
            self.load_image_bytes(bytes);
        } else if let Some(path) = file.path {
            self.load_image_file(path);
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.document.clear_selection();
        }

        // Only when no text field is focused, to avoid deleting while typing
        if !ctx.wants_keyboard_input()
            && ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace))
        {
            if let Some(id) = self.document.selected() {
                self.delete_caption(id);
            }
        }
    }

    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image...").clicked() {
                        // Open native file picker
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Images", media::IMAGE_EXTENSIONS)
                            .pick_file()
                        {
                            self.load_image_file(path);
                        }
                        ui.close_menu();
                    }
                    ui.horizontal(|ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut self.url_input)
                                .hint_text("https://...")
                                .desired_width(220.0),
                        );
                        if ui.button("Open URL").clicked() {
                            let url = self.url_input.clone();
                            self.load_image_url(url);
                            ui.close_menu();
                        }
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let has_selection = self.document.selected().is_some();
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Delete Selected"))
                        .clicked()
                    {
                        if let Some(id) = self.document.selected() {
                            self.delete_caption(id);
                        }
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Deselect (Esc)"))
                        .clicked()
                    {
                        self.document.clear_selection();
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(message) = self.error_message.clone() {
                    ui.label(egui::RichText::new(format!("⚠ {message}")).color(egui::Color32::from_rgb(255, 110, 110)));
                    if ui.small_button("✖").on_hover_text("Dismiss").clicked() {
                        self.clear_error();
                    }
                    return;
                }
                let text = match self.status {
                    RequestStatus::Idle if self.document.background().is_none() => "No image loaded".to_string(),
                    RequestStatus::Idle => format!("{} captions", self.document.captions().len()),
                    RequestStatus::Analyzing => "Analyzing image...".to_string(),
                    RequestStatus::Editing => "Editing image...".to_string(),
                };
                ui.label(text);
            });
        });
    }
}

impl eframe::App for MemeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_requests();
        self.refresh_texture(ctx);
        self.handle_dropped_files(ctx);

        // Keep polling while work is in flight
        if self.has_pending_work() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        self.show_menu_bar(ctx);

        let toolbar_state = toolbar::ToolbarState {
            has_image: self.document.background().is_some(),
            busy: self.status != RequestStatus::Idle,
            exporting: self.export_request.is_some(),
        };
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, toolbar_state, &mut self.edit_instruction))
            .inner;
        match toolbar_action {
            toolbar::ToolbarAction::AddCaption => {
                self.add_caption();
            }
            toolbar::ToolbarAction::SuggestCaptions => self.request_suggestions(),
            toolbar::ToolbarAction::EditImage => self.request_image_edit(),
            toolbar::ToolbarAction::Download => self.request_export(ExportTarget::Download),
            toolbar::ToolbarAction::Share => self.request_export(ExportTarget::Share),
            toolbar::ToolbarAction::None => {}
        }

        self.show_status_bar(ctx);

        // Properties and suggestions (right side)
        let (properties_action, accepted) = egui::SidePanel::right("properties")
            .default_width(260.0)
            .show(ctx, |ui| {
                let action = properties::show(ui, self.document.captions(), self.document.selected());
                ui.add_space(16.0);
                let accepted = suggestions::show(ui, &self.suggestions, self.status == RequestStatus::Analyzing);
                (action, accepted)
            })
            .inner;
        self.apply_properties_action(properties_action);
        if let Some(index) = accepted {
            self.accept_suggestion(index);
        }

        self.handle_keyboard(ctx);

        // Main canvas (center)
        let output = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    return canvas::CanvasOutput::default();
                }
                let view = CanvasView {
                    texture: self.image_texture.as_ref(),
                    natural_size: self
                        .document
                        .background()
                        .map(|b| (b.natural_width(), b.natural_height())),
                    captions: self.document.captions(),
                    selected: self.document.selected(),
                    dragging: match self.controller.drag_state() {
                        crate::interaction::DragState::Dragging(id) => Some(id),
                        crate::interaction::DragState::Idle => None,
                    },
                    synthetic_bold: self.font.synthetic_bold(),
                };
                canvas::show(ui, &view)
            })
            .inner;

        if output.layout.is_some() {
            self.canvas_layout = output.layout;
        }
        let container = output.layout.map(|layout| layout.container);
        for event in output.events {
            if let Some(command) = self.controller.handle(event, container) {
                self.apply_command(command);
            }
        }
    }
}
