//! Row shapes of the two hosted tables, `user_playlists` and `playlist_channels`

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::PlaylistCredentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    UserPlaylists,
    PlaylistChannels,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::UserPlaylists => "user_playlists",
            Table::PlaylistChannels => "playlist_channels",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read a JSON `null` column the same as a missing one.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One `user_playlists` row. Timestamps stay as the backend's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPlaylistRow {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Packed credential bundle, `null` when the playlist has no login
    #[serde(default)]
    pub credentials: Option<PlaylistCredentials>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// One `playlist_channels` row. `id` is generated by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistChannelRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub playlist_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stream_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvg_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvg_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Partial `user_playlists` update written by `update_playlist_meta`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistMetaPatch {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub credentials: Option<PlaylistCredentials>,
    pub is_active: bool,
    pub updated_at: String,
}
