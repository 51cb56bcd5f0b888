use crate::{
    error::AppResult,
    models::{EntryPage, ListType, MediaListEntry, NewMediaListEntry},
};

/// Durable storage of list memberships
///
/// Implementations must enforce the `(user_id, media_id, list_type)` uniqueness
/// themselves, atomically. Callers never check for an existing row before
/// inserting.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MembershipStore: Send + Sync {
    /// Inserts the entry unless the triple is already present.
    ///
    /// Returns the created row, or `None` when the entry already existed.
    async fn insert(&self, entry: NewMediaListEntry) -> AppResult<Option<MediaListEntry>>;

    /// Hard-deletes the matching row, returning it if there was one.
    async fn delete(
        &self,
        user_id: &str,
        media_id: &str,
        list_type: ListType,
    ) -> AppResult<Option<MediaListEntry>>;

    /// Most recently added first. `page` is 1-based; pages past the end are empty.
    async fn query(
        &self,
        user_id: &str,
        list_type: ListType,
        page: u32,
        page_size: u32,
    ) -> AppResult<EntryPage>;
}
