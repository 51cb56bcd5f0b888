use std::sync::Arc;

use crate::{
    db::MembershipStore,
    error::{AppError, AppResult},
    models::{
        AddToListRequest, EntryPage, ListQuery, ListType, MediaId, MediaListEntry, MediaType,
        NewMediaListEntry, RemoveFromListRequest,
    },
    services::session::Session,
};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

const INVALID_MEDIA_TYPE: &str = r#"Invalid mediaType. Must be "movie" or "tv""#;
const INVALID_LIST_TYPE: &str =
    r#"Invalid listType. Must be "FAVORITE", "WATCHED", or "WATCHLIST""#;
const INVALID_TYPE_PARAM: &str = r#"Invalid type. Must be "FAVORITE", "WATCHED", or "WATCHLIST""#;
const INVALID_PAGINATION: &str = "Invalid pagination parameters";

/// Add/remove/list operations over a user's personal lists
///
/// Holds nothing but the store handle. The caller's session is passed into
/// every call.
#[derive(Clone)]
pub struct ListService {
    store: Arc<dyn MembershipStore>,
}

/// A validated `GET /list` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListPageRequest {
    pub list_type: ListType,
    pub page: u32,
    pub page_size: u32,
}

impl ListService {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// Puts an item into one of the caller's lists.
    ///
    /// Returns the list written to, and `None` in place of the row when the
    /// item was already in that list.
    pub async fn add_to_list(
        &self,
        session: Option<&Session>,
        request: AddToListRequest,
    ) -> AppResult<(ListType, Option<MediaListEntry>)> {
        let session = require_session(session)?;
        let entry = validate_add(&session.user_id, request)?;

        let media_id = entry.media_id.clone();
        let list_type = entry.list_type;
        let created = self.store.insert(entry).await?;

        tracing::info!(
            user_id = %session.user_id,
            media_id = %media_id,
            list_type = %list_type,
            created = created.is_some(),
            "Add to list"
        );

        Ok((list_type, created))
    }

    /// Takes an item out of one of the caller's lists. Removing a non-member
    /// succeeds with `Ok(None)`.
    pub async fn remove_from_list(
        &self,
        session: Option<&Session>,
        request: RemoveFromListRequest,
    ) -> AppResult<(ListType, Option<MediaListEntry>)> {
        let session = require_session(session)?;
        let (media_id, list_type) = validate_remove(request)?;

        let removed = self
            .store
            .delete(&session.user_id, &media_id, list_type)
            .await?;

        tracing::info!(
            user_id = %session.user_id,
            media_id = %media_id,
            list_type = %list_type,
            removed = removed.is_some(),
            "Remove from list"
        );

        Ok((list_type, removed))
    }

    /// Reads one page of the caller's list, newest first.
    pub async fn get_list(
        &self,
        session: Option<&Session>,
        query: ListQuery,
    ) -> AppResult<(ListPageRequest, EntryPage)> {
        let session = require_session(session)?;
        let request = validate_list_query(query)?;

        let page = self
            .store
            .query(
                &session.user_id,
                request.list_type,
                request.page,
                request.page_size,
            )
            .await?;

        tracing::debug!(
            user_id = %session.user_id,
            list_type = %request.list_type,
            page = request.page,
            returned = page.entries.len(),
            total = page.total_count,
            "List fetched"
        );

        Ok((request, page))
    }
}

fn require_session(session: Option<&Session>) -> AppResult<&Session> {
    session.ok_or(AppError::Unauthorized)
}

/// Treats absent and empty strings alike.
/// Trimmed value, or `None` when blank.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn missing_fields_error(missing: &[&str]) -> AppError {
    AppError::InvalidInput(format!("Missing required fields: {}", missing.join(", ")))
}

fn parse_list_type(raw: &str) -> AppResult<ListType> {
    raw.parse()
        .map_err(|_| AppError::InvalidInput(INVALID_LIST_TYPE.to_string()))
}

fn validate_add(user_id: &str, request: AddToListRequest) -> AppResult<NewMediaListEntry> {
    let media_id = present(request.media_id);
    let media_type = present(request.media_type);
    let title = present(request.title);
    let list_type = present(request.list_type);

    let (Some(media_id), Some(media_type), Some(title), Some(list_type)) =
        (media_id.as_deref(), media_type.as_deref(), title.as_deref(), list_type.as_deref())
    else {
        let missing: Vec<&str> = [
            ("mediaId", media_id.is_none()),
            ("mediaType", media_type.is_none()),
            ("title", title.is_none()),
            ("listType", list_type.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, is_missing)| is_missing.then_some(name))
        .collect();
        return Err(missing_fields_error(&missing));
    };

    let media_type: MediaType = media_type
        .parse()
        .map_err(|_| AppError::InvalidInput(INVALID_MEDIA_TYPE.to_string()))?;
    let list_type = parse_list_type(list_type)?;

    match MediaId::parse(media_id) {
        Some(parsed) if parsed.media_type == media_type => {}
        _ => {
            return Err(AppError::InvalidInput(format!(
                r#"Invalid mediaId. Expected "{}:<id>""#,
                media_type
            )))
        }
    }

    Ok(NewMediaListEntry {
        user_id: user_id.to_string(),
        media_id: media_id.to_string(),
        media_type,
        title: title.to_string(),
        poster_url: present(request.poster_url),
        list_type,
    })
}

fn validate_remove(request: RemoveFromListRequest) -> AppResult<(String, ListType)> {
    match (present(request.media_id), present(request.list_type)) {
        (Some(media_id), Some(list_type)) => Ok((media_id, parse_list_type(&list_type)?)),
        (media_id, list_type) => {
            let mut missing = Vec::new();
            if media_id.is_none() {
                missing.push("mediaId");
            }
            if list_type.is_none() {
                missing.push("listType");
            }
            Err(missing_fields_error(&missing))
        }
    }
}

fn parse_page_param(raw: Option<String>, default: u32) -> AppResult<u32> {
    match present(raw) {
        None => Ok(default),
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| AppError::InvalidInput(INVALID_PAGINATION.to_string())),
    }
}

fn validate_list_query(query: ListQuery) -> AppResult<ListPageRequest> {
    let list_type = present(query.list_type).ok_or_else(|| {
        AppError::InvalidInput("Missing required parameter: type".to_string())
    })?;
    let list_type: ListType = list_type
        .parse()
        .map_err(|_| AppError::InvalidInput(INVALID_TYPE_PARAM.to_string()))?;

    let page = parse_page_param(query.page, DEFAULT_PAGE)?;
    let page_size = parse_page_param(query.limit, DEFAULT_PAGE_SIZE)?;

    if page < 1 || page_size < 1 || page_size > MAX_PAGE_SIZE {
        return Err(AppError::InvalidInput(INVALID_PAGINATION.to_string()));
    }

    Ok(ListPageRequest {
        list_type,
        page,
        page_size,
    })
}
