//! Playlist service test window
//! A throwaway screen for exercising the hosted playlist storage by hand

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use playlist_cloud::backend::RestClient;
use playlist_cloud::config::{AppConfig, BackendConfig, KeySource};
use playlist_cloud::harness::{HarnessState, TaskResult};
use playlist_cloud::PlaylistService;

type Service = PlaylistService<RestClient>;

fn main() -> Result<(), eframe::Error> {
    playlist_cloud::init_logger();

    // Force X11 backend on Linux before any windowing code runs
    #[cfg(target_os = "linux")]
    {
        std::env::set_var("WINIT_UNIX_BACKEND", "x11");
        std::env::remove_var("WAYLAND_DISPLAY");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 520.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Playlist Service Test",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(HarnessApp::new()))
        }),
    )
}

struct HarnessApp {
    service: Result<Arc<Service>, String>,
    state: HarnessState,
    api_key_input: String,

    // Background task channel
    task_receiver: Receiver<TaskResult>,
    task_sender: Sender<TaskResult>,
}

impl HarnessApp {
    fn new() -> Self {
        let (task_sender, task_receiver) = channel();
        let mut app = Self {
            service: Self::build_service(),
            state: HarnessState::default(),
            api_key_input: String::new(),
            task_receiver,
            task_sender,
        };
        app.state.test_connection(&app.service);
        app
    }

    fn build_service() -> Result<Arc<Service>, String> {
        let config = BackendConfig::resolve();
        log::info!("Backend {} (key from {:?})", config.url, config.key_source);
        PlaylistService::connect(config)
            .map(Arc::new)
            .map_err(|e| e.to_string())
    }

    fn test_get_all_playlists(&mut self, ctx: &egui::Context) {
        self.state.begin_fetch();

        let service = match &self.service {
            Ok(service) => Arc::clone(service),
            Err(e) => {
                self.state.apply(TaskResult::Error(e.clone()));
                return;
            }
        };

        let sender = self.task_sender.clone();
        let ctx = ctx.clone();
        thread::spawn(move || {
            let result = match service.get_all_playlists() {
                Ok(playlists) => TaskResult::PlaylistsLoaded(playlists),
                Err(e) => TaskResult::Error(e.to_string()),
            };
            let _ = sender.send(result);
            ctx.request_repaint();
        });
    }

    fn save_key(&mut self) {
        let key = self.api_key_input.trim().to_string();
        if key.is_empty() {
            return;
        }

        let mut config = AppConfig::load();
        config.api_key = key;
        if let Err(e) = config.save() {
            self.state.error = format!("Failed to save settings: {}", e);
            return;
        }

        self.service = Self::build_service();
        if let Ok(service) = &self.service {
            if let KeySource::Environment(name) = service.backend().config().key_source {
                self.state.log(&format!("[WARN] {} is set and takes precedence over the saved key", name));
            }
        }
        self.api_key_input.clear();
        self.state.test_connection(&self.service);
    }
}

impl eframe::App for HarnessApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process background task results (non-blocking)
        while let Ok(result) = self.task_receiver.try_recv() {
            self.state.apply(result);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Playlist Service Test");
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                if ui.button("Test Connection").clicked() {
                    self.state.test_connection(&self.service);
                }
                let fetch = egui::Button::new("Test Get All Playlists");
                if ui.add_enabled(!self.state.loading, fetch).clicked() {
                    self.test_get_all_playlists(ctx);
                }
                if self.state.loading {
                    ui.spinner();
                }
            });

            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.api_key_input)
                        .password(true)
                        .hint_text("API key"),
                );
                if ui.button("Save Key").clicked() {
                    self.save_key();
                }
            });

            ui.separator();

            if !self.state.status.is_empty() {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("Status:").strong());
                    ui.label(self.state.status.as_str());
                });
            }
            if !self.state.error.is_empty() {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("Error:").strong().color(egui::Color32::RED));
                    ui.colored_label(egui::Color32::RED, self.state.error.as_str());
                });
            }

            if !self.state.playlists.is_empty() {
                ui.add_space(8.0);
                ui.label(egui::RichText::new("Playlists Found:").strong());
                egui::ScrollArea::vertical()
                    .id_salt("playlists")
                    .max_height(220.0)
                    .show(ui, |ui| {
                        for summary in &self.state.playlists {
                            ui.label(format!("• {}", summary));
                        }
                    });
            }

            ui.separator();
            ui.label(egui::RichText::new("Log").weak());
            egui::ScrollArea::vertical()
                .id_salt("log")
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for line in &self.state.log {
                        ui.monospace(line.as_str());
                    }
                });
        });
    }
}
