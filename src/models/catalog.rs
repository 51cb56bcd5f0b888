use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::MediaType;

/// Which TMDB search endpoint to hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchType {
    #[default]
    Multi,
    Movie,
    Tv,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Multi => "multi",
            SearchType::Movie => "movie",
            SearchType::Tv => "tv",
        }
    }
}

impl FromStr for SearchType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multi" => Ok(SearchType::Multi),
            "movie" => Ok(SearchType::Movie),
            "tv" => Ok(SearchType::Tv),
            _ => Err(()),
        }
    }
}

/// Normalized search hit, ready to be added to a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    /// Composite id, e.g. `"movie:299536"`
    pub id: String,
    pub title: String,
    pub media_type: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// `release_date` for movies, `first_air_date` for shows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<SearchItem>,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Page of raw TMDB search results
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchPage {
    pub page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub results: Vec<TmdbResult>,
}

/// One TMDB result. Movie, tv and multi endpoints share this shape; fields a
/// given endpoint does not send are left empty.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbResult {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    /// Only present on `/search/multi`; may be `"person"`
    #[serde(default)]
    pub media_type: Option<String>,
}
