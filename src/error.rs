//! Error type shared by the playlist service, backends and config

use thiserror::Error;

use crate::config::{ANON_KEY_ENV, KEY_ENV};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Backend key not configured. Set {KEY_ENV} or {ANON_KEY_ENV} (e.g. via .env)")]
    MissingKey,

    #[error("Playlist not found: {0}")]
    NotFound(String),

    #[error("Expected one playlist with id {id}, found {count}")]
    AmbiguousPlaylist { id: String, count: usize },

    #[error("Playlist ID is required")]
    MissingId,

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] ureq::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;
