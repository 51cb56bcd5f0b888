/// Media catalog abstraction
///
/// Search goes through a provider so the HTTP layer never talks to a vendor
/// API directly. Providers normalize results into `SearchItem`s whose ids
/// are the same composite ids the lists store.
use crate::{
    error::AppResult,
    models::{SearchResponse, SearchType},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for catalog search providers
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Search the catalog by free text. `page` is 1-based.
    async fn search(
        &self,
        query: &str,
        page: u32,
        search_type: SearchType,
    ) -> AppResult<SearchResponse>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
