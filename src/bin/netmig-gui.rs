/*!
 * Desktop viewer for netmig - interactive net-migration map
 *
 * - Loads geometry and statistics (files or network) in a background thread
 * - Shows the choropleth; hovering a municipality highlights it and shows its name
 * - Clicking a municipality opens its figures in the side panel
 * - Exports the joined data as styled GeoJSON
 */

use anyhow::Result;
use eframe::egui;
use netmig::geometry::hit_test;
use netmig::viz::{self, MapLayout};
use netmig::{Client, InteractionStates, JoinedRegion, SourceConfig, api, detail_for, storage};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 900.0])
            .with_min_inner_size([600.0, 500.0])
            .with_title("Net migration by municipality - netmig"),
        ..Default::default()
    };

    eframe::run_native(
        "Net migration map",
        options,
        Box::new(|_cc| Ok(Box::new(MapApp::new()))),
    )
}

#[derive(Debug, Clone, PartialEq)]
enum SourceMode {
    Files,
    Network,
}

#[derive(Debug)]
enum OperationResult {
    Loaded(Vec<JoinedRegion>),
    Error(String),
}

/// Map data and hover state of the current session.
struct Session {
    regions: Vec<JoinedRegion>,
    states: InteractionStates,
    layout: Option<MapLayout>,
    texture: Option<egui::TextureHandle>,
    selected: Option<usize>,
    dirty: bool,
}

impl Session {
    fn new(regions: Vec<JoinedRegion>) -> Self {
        let states = InteractionStates::new(regions.len());
        Self {
            regions,
            states,
            layout: None,
            texture: None,
            selected: None,
            dirty: true,
        }
    }

    /// Re-fit the layout when the canvas size changed noticeably.
    fn ensure_layout(&mut self, width: u32, height: u32) -> Result<()> {
        let stale = match &self.layout {
            Some(l) => l.width.abs_diff(width) > 4 || l.height.abs_diff(height) > 4,
            None => true,
        };
        if stale {
            self.layout = Some(MapLayout::new(&self.regions, width, height)?);
            self.dirty = true;
        }
        Ok(())
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) -> Result<()> {
        let Some(layout) = &self.layout else {
            return Ok(());
        };
        if !self.dirty && self.texture.is_some() {
            return Ok(());
        }
        let mut buf = vec![0u8; (layout.width * layout.height * 3) as usize];
        viz::render_rgb(&self.regions, layout, &self.states, &mut buf)?;
        let image = egui::ColorImage::from_rgb(
            [layout.width as usize, layout.height as usize],
            &buf,
        );
        match &mut self.texture {
            Some(tex) => tex.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("map", image, egui::TextureOptions::LINEAR))
            }
        }
        self.dirty = false;
        Ok(())
    }

    /// Region under a pointer position relative to the map's top-left corner.
    fn region_at(&self, local: egui::Vec2) -> Option<usize> {
        let layout = self.layout.as_ref()?;
        let coord = layout.viewport.to_geo(local.x as f64, local.y as f64);
        hit_test(&layout.shapes, coord)
    }
}

struct MapApp {
    source_mode: SourceMode,
    geometry_path: String,
    statistics_path: String,
    query_path: String,
    config_path: String,
    export_dir: String,

    session: Option<Session>,

    is_loading: bool,
    status_message: String,
    error_message: String,

    operation_receiver: Option<mpsc::Receiver<OperationResult>>,
}

impl MapApp {
    fn new() -> Self {
        let home_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .to_string_lossy()
            .to_string();

        Self {
            source_mode: SourceMode::Files,
            geometry_path: String::new(),
            statistics_path: String::new(),
            query_path: "queries/net_migration.json".to_string(),
            config_path: String::new(),
            export_dir: home_dir,
            session: None,
            is_loading: false,
            status_message: String::new(),
            error_message: String::new(),
            operation_receiver: None,
        }
    }

    fn validate_inputs(&self) -> Result<()> {
        match self.source_mode {
            SourceMode::Files => {
                if self.geometry_path.trim().is_empty() || self.statistics_path.trim().is_empty() {
                    anyhow::bail!("Please choose both a geometry file and a statistics file");
                }
            }
            SourceMode::Network => {
                if self.query_path.trim().is_empty() {
                    anyhow::bail!("Please choose a statistics query document");
                }
            }
        }
        Ok(())
    }

    fn start_loading(&mut self) {
        if let Err(err) = self.validate_inputs() {
            self.error_message = format!("Validation error: {}", err);
            return;
        }

        self.is_loading = true;
        self.error_message.clear();
        self.status_message = "Loading geometry and statistics...".to_string();

        let (sender, receiver) = mpsc::channel();
        self.operation_receiver = Some(receiver);

        let mode = self.source_mode.clone();
        let geometry = PathBuf::from(self.geometry_path.trim());
        let statistics = PathBuf::from(self.statistics_path.trim());
        let query = PathBuf::from(self.query_path.trim());
        let config = self.config_path.trim().to_string();

        thread::spawn(move || {
            let result = load(mode, &geometry, &statistics, &query, &config);
            let message = match result {
                Ok(regions) => OperationResult::Loaded(regions),
                Err(err) => OperationResult::Error(format!("Failed to load data: {:#}", err)),
            };
            let _ = sender.send(message);
        });
    }

    fn check_operation_result(&mut self) {
        if let Some(receiver) = &self.operation_receiver
            && let Ok(result) = receiver.try_recv()
        {
            self.is_loading = false;
            self.operation_receiver = None;

            match result {
                OperationResult::Loaded(regions) => {
                    let summary = netmig::join::summarize(&regions);
                    self.status_message = format!(
                        "Loaded {} municipalities ({} with statistics)",
                        summary.regions, summary.matched
                    );
                    self.error_message.clear();
                    self.session = Some(Session::new(regions));
                }
                OperationResult::Error(error) => {
                    // No partial map: a failed load clears the previous session.
                    self.session = None;
                    self.error_message = error;
                    self.status_message.clear();
                }
            }
        }
    }

    fn export(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let path = Path::new(&self.export_dir).join("netmig_map.geojson");
        match storage::save_geojson(&session.regions, &path) {
            Ok(()) => self.status_message = format!("Exported {}", path.display()),
            Err(err) => self.error_message = format!("Failed to export: {}", err),
        }
    }

    fn sources_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Source:");
            ui.radio_value(&mut self.source_mode, SourceMode::Files, "Files");
            ui.radio_value(&mut self.source_mode, SourceMode::Network, "Network");
        });

        match self.source_mode {
            SourceMode::Files => {
                path_row(ui, "Geometry:", &mut self.geometry_path);
                path_row(ui, "Statistics:", &mut self.statistics_path);
            }
            SourceMode::Network => {
                path_row(ui, "Query:", &mut self.query_path);
                path_row(ui, "Config:", &mut self.config_path);
            }
        }

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.is_loading, egui::Button::new("Load"))
                .clicked()
            {
                self.start_loading();
            }
            if ui
                .add_enabled(self.session.is_some(), egui::Button::new("Export GeoJSON"))
                .clicked()
            {
                self.export();
            }
            if self.is_loading {
                ui.spinner();
            }
        });

        ui.horizontal(|ui| {
            ui.label("Export to:");
            ui.text_edit_singleline(&mut self.export_dir);
            if ui.button("Browse").clicked()
                && let Some(path) = rfd::FileDialog::new().pick_folder()
            {
                self.export_dir = path.to_string_lossy().to_string();
            }
        });

        if !self.status_message.is_empty() {
            ui.colored_label(egui::Color32::DARK_GREEN, &self.status_message);
        }
        if !self.error_message.is_empty() {
            ui.colored_label(egui::Color32::RED, &self.error_message);
        }
    }
}

fn path_row(ui: &mut egui::Ui, label: &str, value: &mut String) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.text_edit_singleline(value);
        if ui.button("Browse").clicked()
            && let Some(path) = rfd::FileDialog::new().pick_file()
        {
            *value = path.to_string_lossy().to_string();
        }
    });
}

fn load(
    mode: SourceMode,
    geometry: &Path,
    statistics: &Path,
    query: &Path,
    config: &str,
) -> Result<Vec<JoinedRegion>> {
    let cfg = if config.is_empty() {
        SourceConfig::default()
    } else {
        SourceConfig::load_from_file(Path::new(config))?
    };
    match mode {
        SourceMode::Files => api::load_session_from_files(geometry, statistics, &cfg),
        SourceMode::Network => {
            let query = api::read_json_file(query)?;
            Client::new(cfg)?.load_session(&query)
        }
    }
}

impl eframe::App for MapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_operation_result();

        if self.is_loading {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("sources").show(ctx, |ui| {
            ui.add_space(4.0);
            self.sources_panel(ui);
            ui.add_space(4.0);
        });

        egui::SidePanel::right("detail")
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Municipality");
                ui.add_space(6.0);
                match self
                    .session
                    .as_ref()
                    .and_then(|s| s.selected.map(|i| &s.regions[i]))
                {
                    Some(region) => {
                        ui.label(detail_for(region).body);
                    }
                    None => {
                        ui.label("Click a municipality to see its figures.");
                    }
                }
            });

        let mut render_error = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = self.session.as_mut() else {
                ui.centered_and_justified(|ui| ui.label("No data loaded"));
                return;
            };

            let avail = ui.available_size();
            let (w, h) = (avail.x.max(64.0) as u32, avail.y.max(64.0) as u32);
            if let Err(err) = session.ensure_layout(w, h) {
                render_error = Some(err);
                return;
            }
            if let Err(err) = session.refresh_texture(ctx) {
                render_error = Some(err);
                return;
            }
            let Some(texture) = &session.texture else {
                return;
            };

            let size = texture.size_vec2();
            let response = ui.add(egui::Image::new((texture.id(), size)).sense(egui::Sense::click()));

            let target = response
                .hover_pos()
                .and_then(|pos| session.region_at(pos - response.rect.min));
            if session.states.pointer_move(target) {
                session.dirty = true;
                ctx.request_repaint();
            }

            if response.clicked() {
                session.selected = target;
            }

            if let Some(label) = target.and_then(|i| detail_for(&session.regions[i]).label) {
                response.on_hover_text_at_pointer(label);
            }
        });

        if let Some(err) = render_error {
            self.error_message = format!("Failed to draw map: {}", err);
            self.session = None;
        }
    }
}
