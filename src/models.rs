//! Application-level playlist and channel models
//!
//! These serialize to the shape the playlist manager's UI works with
//! (`_id`, camelCase fields, nested `playlist.items`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id of the synthetic "global favorites" playlist. Never stored in the backend.
pub const GLOBAL_FAVORITES_PLAYLIST_ID: &str = "favorites";
pub const GLOBAL_FAVORITES_TITLE: &str = "Global Favorites";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaylistUpdateState {
    #[default]
    Updated,
    InProgress,
    NotUpdated,
}

/// Login data for Xtream Codes / Stalker portal playlists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl PlaylistCredentials {
    /// Username and password both present and non-empty
    pub fn has_login(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        filled(&self.username) && filled(&self.password)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelGroup {
    pub title: String,
}

/// TV guide metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tvg {
    pub id: String,
    pub name: String,
    pub url: String,
    pub logo: String,
    pub rec: String,
}

/// Per-channel HTTP header overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpOverrides {
    pub referrer: String,
    #[serde(rename = "user-agent")]
    pub user_agent: String,
    pub origin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub group: ChannelGroup,
    #[serde(default)]
    pub tvg: Tvg,
    #[serde(default)]
    pub raw: String,
    #[serde(default)]
    pub http: HttpOverrides,
    #[serde(default)]
    pub radio: bool,
    // Written to the backend but not read back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistHeader {
    pub raw: String,
}

/// Parsed playlist body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistBody {
    #[serde(default)]
    pub header: PlaylistHeader,
    #[serde(default)]
    pub items: Vec<Channel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub credentials: PlaylistCredentials,
    pub auto_refresh: bool,
    #[serde(default)]
    pub position: i64,
    /// Milliseconds since the epoch, 0 when never updated
    #[serde(default)]
    pub update_date: i64,
    #[serde(default)]
    pub update_state: PlaylistUpdateState,
    #[serde(default)]
    pub count: usize,
    pub import_date: DateTime<Utc>,
    pub last_usage: DateTime<Utc>,
    #[serde(default)]
    pub playlist: PlaylistBody,
    #[serde(default)]
    pub favorites: Vec<String>,
}

impl Playlist {
    /// A fresh playlist with a caller-chosen id and no channels.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            url: None,
            credentials: PlaylistCredentials::default(),
            auto_refresh: false,
            position: 0,
            update_date: now.timestamp_millis(),
            update_state: PlaylistUpdateState::Updated,
            count: 0,
            import_date: now,
            last_usage: now,
            playlist: PlaylistBody::default(),
            favorites: Vec::new(),
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.playlist.items
    }

    /// The stubbed "global favorites" pseudo-playlist.
    pub fn global_favorites() -> Self {
        let empty = || Some(String::new());
        let mut playlist = Self::new(GLOBAL_FAVORITES_PLAYLIST_ID, GLOBAL_FAVORITES_TITLE);
        playlist.url = empty();
        playlist.credentials = PlaylistCredentials {
            username: empty(),
            password: empty(),
            server_url: empty(),
            portal_url: empty(),
            mac_address: empty(),
            user_agent: empty(),
        };
        playlist
    }
}

/// Editable playlist metadata (the settings dialog's view of a playlist)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistMeta {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(flatten)]
    pub credentials: PlaylistCredentials,
    #[serde(default)]
    pub auto_refresh: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_json_uses_app_field_names() {
        let mut playlist = Playlist::new("p1", "My List");
        playlist.credentials.mac_address = Some("00:1A:79:00:00:01".to_string());
        let json = serde_json::to_value(&playlist).unwrap();
        assert_eq!(json["_id"], "p1");
        assert_eq!(json["autoRefresh"], false);
        assert_eq!(json["macAddress"], "00:1A:79:00:00:01");
        assert_eq!(json["updateState"], "UPDATED");
        assert!(json.get("username").is_none());
    }

    #[test]
    fn test_channel_http_user_agent_is_hyphenated() {
        let channel = Channel {
            http: HttpOverrides {
                user_agent: "VLC".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_value(&channel).unwrap();
        assert_eq!(json["http"]["user-agent"], "VLC");
    }

    #[test]
    fn test_has_login_requires_both_fields() {
        let mut creds = PlaylistCredentials {
            username: Some("john".to_string()),
            ..Default::default()
        };
        assert!(!creds.has_login());
        creds.password = Some(String::new());
        assert!(!creds.has_login());
        creds.password = Some("secret".to_string());
        assert!(creds.has_login());
    }

    #[test]
    fn test_global_favorites_shape() {
        let fav = Playlist::global_favorites();
        assert_eq!(fav.id, GLOBAL_FAVORITES_PLAYLIST_ID);
        assert_eq!(fav.title, "Global Favorites");
        assert!(fav.channels().is_empty());
        assert_eq!(fav.count, 0);
        assert_eq!(fav.credentials.username.as_deref(), Some(""));
    }
}
