use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    db::MembershipStore,
    error::AppResult,
    models::{total_pages, EntryPage, ListType, MediaListEntry, NewMediaListEntry},
};

/// Process-local membership store
///
/// Every mutation runs under one write lock, which plays the role of the
/// unique constraint: the existence check and the insert happen in the same
/// critical section.
#[derive(Clone, Default)]
pub struct InMemoryMembershipStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: Vec<MediaListEntry>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_triple(row: &MediaListEntry, user_id: &str, media_id: &str, list_type: ListType) -> bool {
    row.user_id == user_id && row.media_id == media_id && row.list_type == list_type
}

#[async_trait::async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn insert(&self, entry: NewMediaListEntry) -> AppResult<Option<MediaListEntry>> {
        let mut inner = self.inner.write().await;

        if inner
            .rows
            .iter()
            .any(|row| same_triple(row, &entry.user_id, &entry.media_id, entry.list_type))
        {
            return Ok(None);
        }

        inner.next_id += 1;
        let row = MediaListEntry {
            id: inner.next_id,
            user_id: entry.user_id,
            media_id: entry.media_id,
            media_type: entry.media_type,
            title: entry.title,
            poster_url: entry.poster_url,
            list_type: entry.list_type,
            created_at: Utc::now(),
        };
        inner.rows.push(row.clone());

        Ok(Some(row))
    }

    async fn delete(
        &self,
        user_id: &str,
        media_id: &str,
        list_type: ListType,
    ) -> AppResult<Option<MediaListEntry>> {
        let mut inner = self.inner.write().await;

        let removed = inner
            .rows
            .iter()
            .position(|row| same_triple(row, user_id, media_id, list_type))
            .map(|index| inner.rows.remove(index));

        Ok(removed)
    }

    async fn query(
        &self,
        user_id: &str,
        list_type: ListType,
        page: u32,
        page_size: u32,
    ) -> AppResult<EntryPage> {
        let inner = self.inner.read().await;

        let mut matching: Vec<&MediaListEntry> = inner
            .rows
            .iter()
            .filter(|row| row.user_id == user_id && row.list_type == list_type)
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total_count = matching.len() as u64;
        let offset = (page.saturating_sub(1) as usize).saturating_mul(page_size as usize);
        let entries = matching
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok(EntryPage {
            entries,
            total_count,
            total_pages: total_pages(total_count, page_size),
        })
    }
}
