use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub mod catalog;

pub use catalog::{SearchItem, SearchResponse, SearchType, TmdbResult, TmdbSearchPage};

/// Kind of catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "media_type", rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            _ => Err(()),
        }
    }
}

/// One of the three personal lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "list_type", rename_all = "UPPERCASE")]
pub enum ListType {
    Favorite,
    Watched,
    Watchlist,
}

impl ListType {
    pub const ALL: [ListType; 3] = [ListType::Favorite, ListType::Watched, ListType::Watchlist];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::Favorite => "FAVORITE",
            ListType::Watched => "WATCHED",
            ListType::Watchlist => "WATCHLIST",
        }
    }
}

impl Display for ListType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListType::ALL
            .into_iter()
            .find(|list_type| list_type.as_str() == s)
            .ok_or(())
    }
}

/// Composite catalog identifier, `"<mediaType>:<externalId>"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaId<'a> {
    pub media_type: MediaType,
    pub external_id: &'a str,
}

impl<'a> MediaId<'a> {
    /// Splits `"movie:299536"` into its parts; `None` if the prefix is unknown
    /// or the external id is empty.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let (prefix, external_id) = raw.split_once(':')?;
        if external_id.is_empty() {
            return None;
        }
        Some(Self {
            media_type: prefix.parse().ok()?,
            external_id,
        })
    }

    pub fn format(media_type: MediaType, external_id: impl Display) -> String {
        format!("{}:{}", media_type, external_id)
    }
}

/// A stored list membership, one row of `user_media`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MediaListEntry {
    pub id: i64,
    pub user_id: String,
    pub media_id: String,
    pub media_type: MediaType,
    pub title: String,
    pub poster_url: Option<String>,
    pub list_type: ListType,
    pub created_at: DateTime<Utc>,
}

/// A validated membership waiting to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewMediaListEntry {
    pub user_id: String,
    pub media_id: String,
    pub media_type: MediaType,
    pub title: String,
    pub poster_url: Option<String>,
    pub list_type: ListType,
}

/// One page of a user's list as returned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPage {
    pub entries: Vec<MediaListEntry>,
    pub total_count: u64,
    pub total_pages: u32,
}

/// `ceil(total_count / page_size)`; a zero page size yields zero pages
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

// ============================================================================
// List API types
// ============================================================================

/// Body of `POST /list/add`. Fields stay loose so validation can name
/// every missing one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToListRequest {
    pub media_id: Option<String>,
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub poster_url: Option<String>,
    pub list_type: Option<String>,
}

/// Body of `POST /list/remove`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromListRequest {
    pub media_id: Option<String>,
    pub list_type: Option<String>,
}

/// Query string of `GET /list`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub list_type: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Result of an add or remove
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<MediaListEntry>,
}

/// List entry as shown to its owner
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: i64,
    pub media_id: String,
    pub media_type: MediaType,
    pub title: String,
    pub poster_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MediaListEntry> for ListItem {
    fn from(entry: MediaListEntry) -> Self {
        Self {
            id: entry.id,
            media_id: entry.media_id,
            media_type: entry.media_type,
            title: entry.title,
            poster_url: entry.poster_url,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<ListItem>,
}
