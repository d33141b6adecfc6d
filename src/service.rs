//! Playlist storage on top of the hosted `user_playlists` / `playlist_channels` tables
//!
//! Multi-step writes are not atomic. `add_playlist` can leave a playlist
//! row without channels if the second insert fails, and `delete_playlist`
//! can leave an empty playlist row if the second delete fails. Neither is
//! compensated here.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::{Filter, Query, RestBackend, RestClient};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::mapping::{self, iso_timestamp};
use crate::models::{Channel, Playlist, PlaylistMeta, GLOBAL_FAVORITES_PLAYLIST_ID};
use crate::rows::{PlaylistChannelRow, Table, UserPlaylistRow};

/// Upper bound on concurrent channel fetches in `get_all_playlists`
pub const CHANNEL_FETCH_THREADS: usize = 8;

pub struct PlaylistService<B> {
    backend: B,
}

impl PlaylistService<RestClient> {
    /// Build against the hosted backend. Fails when no API key is configured.
    pub fn connect(config: BackendConfig) -> Result<Self> {
        Ok(Self::new(RestClient::connect(config)?))
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Error::from))
        .collect()
}

impl<B: RestBackend> PlaylistService<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn fetch_channel_rows(&self, playlist_id: &str) -> Result<Vec<PlaylistChannelRow>> {
        let query = Query::new()
            .eq("playlist_id", playlist_id)
            .order_asc("sort_order");
        decode_rows(self.backend.select(Table::PlaylistChannels, &query)?)
    }

    /// Channel rows for one playlist, or none if the fetch fails.
    fn channel_rows_or_empty(&self, playlist_id: &str) -> Vec<PlaylistChannelRow> {
        self.fetch_channel_rows(playlist_id).unwrap_or_else(|e| {
            log::error!("Error fetching channels for playlist {}: {}", playlist_id, e);
            Vec::new()
        })
    }

    /// All playlists by ascending sort order, each with its channels.
    ///
    /// Channel fetches run concurrently, at most `CHANNEL_FETCH_THREADS` at
    /// a time, one per playlist. A failed channel
    /// fetch yields that playlist with no channels; a failed playlist select
    /// fails the call.
    pub fn get_all_playlists(&self) -> Result<Vec<Playlist>> {
        let query = Query::new().order_asc("sort_order");
        let rows: Vec<UserPlaylistRow> = self
            .backend
            .select(Table::UserPlaylists, &query)
            .and_then(decode_rows)
            .inspect_err(|e| log::error!("Error fetching playlists: {}", e))?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut channels: Vec<Vec<PlaylistChannelRow>> = Vec::with_capacity(rows.len());
        for batch in rows.chunks(CHANNEL_FETCH_THREADS) {
            std::thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|row| scope.spawn(move || self.channel_rows_or_empty(&row.id)))
                    .collect();
                channels.extend(
                    handles
                        .into_iter()
                        .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic))),
                );
            });
        }

        Ok(rows
            .into_iter()
            .zip(channels)
            .map(|(row, channel_rows)| mapping::row_to_playlist(row, &channel_rows))
            .collect())
    }

    /// One playlist with its channels. The global favorites id never reaches the backend.
    pub fn get_playlist(&self, id: &str) -> Result<Playlist> {
        if id == GLOBAL_FAVORITES_PLAYLIST_ID {
            return Ok(self.get_playlist_with_global_favorites());
        }

        let mut rows: Vec<UserPlaylistRow> = self
            .backend
            .select(Table::UserPlaylists, &Query::new().eq("id", id))
            .and_then(decode_rows)
            .inspect_err(|e| log::error!("Error fetching playlist {}: {}", id, e))?;

        let row = match rows.len() {
            0 => return Err(Error::NotFound(id.to_string())),
            1 => rows.remove(0),
            count => {
                return Err(Error::AmbiguousPlaylist {
                    id: id.to_string(),
                    count,
                })
            }
        };

        let channel_rows = self.channel_rows_or_empty(id);
        Ok(mapping::row_to_playlist(row, &channel_rows))
    }

    pub fn get_playlist_by_id(&self, id: &str) -> Result<Playlist> {
        self.get_playlist(id)
    }

    /// Static stand-in for the favorites aggregate; always empty for now.
    pub fn get_playlist_with_global_favorites(&self) -> Playlist {
        Playlist::global_favorites()
    }

    /// Insert the playlist row, then all channel rows in one batch.
    pub fn add_playlist(&self, playlist: &Playlist) -> Result<()> {
        let row = serde_json::to_value(mapping::playlist_to_row(playlist))?;
        self.backend
            .insert(Table::UserPlaylists, vec![row])
            .inspect_err(|e| log::error!("Error adding playlist {}: {}", playlist.id, e))?;

        if playlist.channels().is_empty() {
            return Ok(());
        }

        let channel_rows = mapping::channels_to_rows(playlist)
            .into_iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        self.backend
            .insert(Table::PlaylistChannels, channel_rows)
            .inspect_err(|e| log::error!("Error adding channels for playlist {}: {}", playlist.id, e))
    }

    /// Rewrite the playlist row. Channel rows are left as they are.
    pub fn update_playlist(&self, id: &str, playlist: &Playlist) -> Result<()> {
        let mut row = mapping::playlist_to_row(playlist);
        row.updated_at = Some(iso_timestamp(Utc::now()));

        self.backend
            .update(Table::UserPlaylists, &Filter::eq("id", id), serde_json::to_value(row)?)
            .inspect_err(|e| log::error!("Error updating playlist {}: {}", id, e))
    }

    /// Patch title, source URL, credentials and auto-refresh only.
    pub fn update_playlist_meta(&self, meta: &PlaylistMeta) -> Result<()> {
        let id = meta
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(Error::MissingId)?;
        let patch = serde_json::to_value(mapping::meta_to_patch(meta, Utc::now()))?;

        self.backend
            .update(Table::UserPlaylists, &Filter::eq("id", id), patch)
            .inspect_err(|e| log::error!("Error updating playlist meta {}: {}", id, e))
    }

    /// Delete channel rows, then the playlist row.
    pub fn delete_playlist(&self, id: &str) -> Result<()> {
        self.backend
            .delete(Table::PlaylistChannels, &Filter::eq("playlist_id", id))
            .inspect_err(|e| log::error!("Error deleting channels of playlist {}: {}", id, e))?;
        self.backend
            .delete(Table::UserPlaylists, &Filter::eq("id", id))
            .inspect_err(|e| log::error!("Error deleting playlist {}: {}", id, e))
    }

    // TODO: favorites need their own table; both calls below are stubs until it exists.
    pub fn update_favorites(&self, id: &str, favorites: &[String]) -> Result<()> {
        log::debug!("update_favorites({}, {} ids) is not persisted", id, favorites.len());
        Ok(())
    }

    pub fn get_favorite_channels(&self, playlist_id: &str) -> Result<Vec<Channel>> {
        log::debug!("get_favorite_channels({}) returns no channels", playlist_id);
        Ok(Vec::new())
    }
}
