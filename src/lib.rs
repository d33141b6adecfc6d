//! Playlist storage on a hosted REST backend, plus the developer tooling
//! around it: two interactive assistants, a backend health audit and a
//! manual test window.

pub mod assistants;
pub mod audit;
pub mod backend;
pub mod config;
pub mod console;
pub mod error;
pub mod harness;
pub mod mapping;
pub mod models;
pub mod rows;
pub mod runner;
pub mod service;
pub mod shell;

pub use config::BackendConfig;
pub use error::{Error, Result};
pub use models::{Channel, Playlist};
pub use service::PlaylistService;

/// Logger setup shared by the binaries; `RUST_LOG` overrides the default level.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();
}
