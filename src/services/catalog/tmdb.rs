/// TMDB search provider
///
/// Wraps `/3/search/{multi,movie,tv}` and flattens the three result shapes
/// into `SearchItem`s. Multi search also returns people; those are dropped.
use crate::{
    error::{AppError, AppResult},
    models::{
        MediaId, MediaType, SearchItem, SearchResponse, SearchType, TmdbResult, TmdbSearchPage,
    },
    services::catalog::CatalogProvider,
};
use reqwest::Client as HttpClient;

const UNTITLED: &str = "Untitled";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base_url: String,
    language: String,
}

impl TmdbProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        image_base_url: String,
        language: String,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
            language,
        }
    }

    /// Works out the media type of a result: fixed for movie/tv searches,
    /// taken from the result itself for multi search.
    fn result_media_type(search_type: SearchType, result: &TmdbResult) -> Option<MediaType> {
        match search_type {
            SearchType::Movie => Some(MediaType::Movie),
            SearchType::Tv => Some(MediaType::Tv),
            SearchType::Multi => result.media_type.as_deref()?.parse().ok(),
        }
    }

    fn normalize(&self, search_type: SearchType, result: TmdbResult) -> Option<SearchItem> {
        let media_type = Self::result_media_type(search_type, &result)?;

        let (title, release_date) = match media_type {
            MediaType::Movie => (result.title.or(result.name), result.release_date),
            MediaType::Tv => (result.name.or(result.title), result.first_air_date),
        };

        Some(SearchItem {
            id: MediaId::format(media_type, result.id),
            title: title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            media_type,
            poster_url: result
                .poster_path
                .filter(|p| !p.is_empty())
                .map(|path| format!("{}{}", self.image_base_url, path)),
            overview: result.overview.filter(|o| !o.is_empty()),
            release_date: release_date.filter(|d| !d.is_empty()),
            vote_average: result.vote_average,
        })
    }

    fn normalize_page(&self, search_type: SearchType, page: TmdbSearchPage) -> SearchResponse {
        SearchResponse {
            page: page.page,
            total_pages: page.total_pages,
            results: page
                .results
                .into_iter()
                .filter_map(|result| self.normalize(search_type, result))
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn search(
        &self,
        query: &str,
        page: u32,
        search_type: SearchType,
    ) -> AppResult<SearchResponse> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Query parameter is required".to_string(),
            ));
        }

        let url = format!("{}/3/search/{}", self.api_url, search_type.as_str());
        let page_param = page.to_string();

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[
                ("query", query),
                ("page", page_param.as_str()),
                ("include_adult", "false"),
                ("language", self.language.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let raw: TmdbSearchPage = response.json().await?;
        let normalized = self.normalize_page(search_type, raw);

        tracing::info!(
            query = %query,
            search_type = search_type.as_str(),
            results = normalized.results.len(),
            provider = self.name(),
            "Catalog search completed"
        );

        Ok(normalized)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
