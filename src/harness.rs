//! State behind the manual test window
//!
//! Kept free of UI types so the window's behaviour can be tested headless.

use crate::models::Playlist;

/// Results delivered from background fetches
#[derive(Debug)]
pub enum TaskResult {
    PlaylistsLoaded(Vec<Playlist>),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSummary {
    pub title: String,
    pub count: usize,
}

impl std::fmt::Display for PlaylistSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} channels)", self.title, self.count)
    }
}

#[derive(Debug, Default)]
pub struct HarnessState {
    pub status: String,
    pub error: String,
    pub playlists: Vec<PlaylistSummary>,
    pub loading: bool,
    pub log: Vec<String>,
}

/// Current time as HH:MM:SS (UTC)
fn timestamp_now() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}

impl HarnessState {
    pub fn log(&mut self, message: &str) {
        self.log.push(format!("[{}] {}", timestamp_now(), message));
        // Keep last 200 lines
        if self.log.len() > 200 {
            self.log.remove(0);
        }
    }

    /// Report whether the service could be built.
    pub fn test_connection<T, E: std::fmt::Display>(&mut self, service: &Result<T, E>) {
        self.status = "Testing connection...".to_string();
        self.error.clear();

        match service {
            Ok(_) => {
                self.status = "Playlist service initialized successfully".to_string();
                self.log("[INFO] Service initialized");
            }
            Err(e) => {
                self.status = "Failed".to_string();
                self.error = format!("Service initialization failed: {}", e);
                let line = format!("[ERROR] {}", self.error);
                self.log(&line);
            }
        }
    }

    pub fn begin_fetch(&mut self) {
        self.status = "Fetching playlists...".to_string();
        self.error.clear();
        self.playlists.clear();
        self.loading = true;
    }

    pub fn apply(&mut self, result: TaskResult) {
        self.loading = false;
        match result {
            TaskResult::PlaylistsLoaded(playlists) => {
                self.status = format!("Successfully fetched {} playlists", playlists.len());
                self.playlists = playlists
                    .into_iter()
                    .map(|p| PlaylistSummary {
                        title: p.title,
                        count: p.count,
                    })
                    .collect();
                let line = format!("[INFO] {}", self.status);
                self.log(&line);
            }
            TaskResult::Error(message) => {
                self.status = "Failed".to_string();
                self.error = format!("Failed to fetch playlists: {}", message);
                let line = format!("[ERROR] {}", self.error);
                self.log(&line);
            }
        }
    }
}
