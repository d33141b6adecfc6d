//! Conversion between the application models and the backend rows
//!
//! Forward (`Playlist` -> rows) packs credentials into one column and
//! flattens channel groups/tvg data. Reverse (rows -> `Playlist`) fills
//! every application field, defaulting missing text to "" and missing
//! timestamps to now. Known losses:
//! - credentials are only packed when username and password are both set,
//!   so portal/MAC-only logins are dropped on write
//! - channel category/country/language are written but not read back
//! - channel raw lines are rebuilt as `name,url`; http overrides, radio and
//!   the playlist's favorites come back empty

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::models::{
    Channel, ChannelGroup, HttpOverrides, Playlist, PlaylistBody, PlaylistHeader, PlaylistMeta,
    PlaylistUpdateState, Tvg,
};
use crate::rows::{PlaylistChannelRow, PlaylistMetaPatch, UserPlaylistRow};

/// ISO-8601 with millisecond precision and a `Z` suffix
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a backend timestamp, with or without an offset.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn playlist_to_row(playlist: &Playlist) -> UserPlaylistRow {
    let last_sync = if playlist.update_date > 0 {
        DateTime::from_timestamp_millis(playlist.update_date).map(iso_timestamp)
    } else {
        None
    };

    UserPlaylistRow {
        id: playlist.id.clone(),
        user_id: None,
        name: playlist.title.clone(),
        source_url: playlist.url.clone(),
        credentials: playlist
            .credentials
            .has_login()
            .then(|| playlist.credentials.clone()),
        channel_count: playlist.channels().len() as i64,
        last_sync,
        is_active: playlist.auto_refresh,
        sort_order: playlist.position,
        created_at: None,
        updated_at: None,
    }
}

/// `index` becomes the row's sort order.
pub fn channel_to_row(playlist_id: &str, channel: &Channel, index: usize) -> PlaylistChannelRow {
    PlaylistChannelRow {
        id: None,
        playlist_id: playlist_id.to_string(),
        channel_id: channel.id.clone(),
        name: channel.name.clone(),
        logo_url: non_empty(&channel.tvg.logo),
        stream_url: channel.url.clone(),
        group_name: non_empty(&channel.group.title),
        category: channel.category.clone(),
        country: channel.country.clone(),
        language: channel.language.clone(),
        tvg_id: non_empty(&channel.tvg.id),
        tvg_name: non_empty(&channel.tvg.name),
        is_active: true,
        sort_order: index as i64,
        created_at: None,
        updated_at: None,
    }
}

pub fn channels_to_rows(playlist: &Playlist) -> Vec<PlaylistChannelRow> {
    playlist
        .channels()
        .iter()
        .enumerate()
        .map(|(index, channel)| channel_to_row(&playlist.id, channel, index))
        .collect()
}

pub fn row_to_channel(row: &PlaylistChannelRow) -> Channel {
    Channel {
        id: row.channel_id.clone(),
        name: row.name.clone(),
        url: row.stream_url.clone(),
        group: ChannelGroup {
            title: row.group_name.clone().unwrap_or_default(),
        },
        tvg: Tvg {
            id: row.tvg_id.clone().unwrap_or_default(),
            name: row.tvg_name.clone().unwrap_or_default(),
            url: String::new(),
            logo: row.logo_url.clone().unwrap_or_default(),
            rec: String::new(),
        },
        raw: format!("{},{}", row.name, row.stream_url),
        http: HttpOverrides::default(),
        radio: false,
        category: None,
        country: None,
        language: None,
    }
}

pub fn row_to_playlist(row: UserPlaylistRow, channels: &[PlaylistChannelRow]) -> Playlist {
    let now = Utc::now();
    let timestamp = |value: &Option<String>| {
        value
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(now)
    };

    Playlist {
        update_date: timestamp(&row.last_sync).timestamp_millis(),
        import_date: timestamp(&row.created_at),
        last_usage: timestamp(&row.updated_at),
        id: row.id,
        title: row.name,
        url: row.source_url,
        credentials: row.credentials.unwrap_or_default(),
        auto_refresh: row.is_active,
        position: row.sort_order,
        update_state: PlaylistUpdateState::Updated,
        count: row.channel_count.max(0) as usize,
        playlist: PlaylistBody {
            header: PlaylistHeader::default(),
            items: channels.iter().map(row_to_channel).collect(),
        },
        favorites: Vec::new(),
    }
}

/// Metadata-only patch. The source URL is only touched when a server URL is given.
pub fn meta_to_patch(meta: &PlaylistMeta, at: DateTime<Utc>) -> PlaylistMetaPatch {
    PlaylistMetaPatch {
        name: meta.title.clone(),
        source_url: meta.credentials.server_url.as_deref().and_then(non_empty),
        credentials: meta.credentials.has_login().then(|| meta.credentials.clone()),
        is_active: meta.auto_refresh,
        updated_at: iso_timestamp(at),
    }
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
