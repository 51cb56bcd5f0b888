use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{
        AddToListRequest, ListItem, ListQuery, ListResponse, MutationResponse,
        RemoveFromListRequest, SearchResponse, SearchType,
    },
};

use super::{AppState, MaybeSession};

/// Query string of `GET /search`
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "type")]
    pub search_type: Option<String>,
}

/// Malformed bodies are the caller's fault, same as missing fields.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| {
            AppError::InvalidInput(format!("Invalid JSON body: {}", rejection.body_text()))
        })
}

/// Query strings get the same JSON error body as everything else.
fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| {
            AppError::InvalidInput(format!("Invalid query string: {}", rejection.body_text()))
        })
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// `POST /list/add`
pub async fn add_to_list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    session: MaybeSession,
    payload: Result<Json<AddToListRequest>, JsonRejection>,
) -> AppResult<Json<MutationResponse>> {
    session.require()?;
    let request = json_body(payload)?;
    tracing::debug!(request_id = %request_id, "Processing add to list");

    // A repeated add is still a success, with no row in `data`.
    let (list_type, created) = state.lists.add_to_list(session.session(), request).await?;

    Ok(Json(MutationResponse {
        success: true,
        message: format!("Added to {}", list_type),
        data: created,
    }))
}

/// `POST /list/remove`
pub async fn remove_from_list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    session: MaybeSession,
    payload: Result<Json<RemoveFromListRequest>, JsonRejection>,
) -> AppResult<Json<MutationResponse>> {
    session.require()?;
    let request = json_body(payload)?;
    tracing::debug!(request_id = %request_id, "Processing remove from list");

    let (list_type, removed) = state
        .lists
        .remove_from_list(session.session(), request)
        .await?;

    Ok(Json(MutationResponse {
        success: true,
        message: format!("Removed from {}", list_type),
        data: removed,
    }))
}

/// `GET /list?type=&page=&limit=`
pub async fn get_list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    session: MaybeSession,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<ListResponse>> {
    let query = query_params(query)?;
    tracing::debug!(request_id = %request_id, "Processing get list");

    let (request, page) = state.lists.get_list(session.session(), query).await?;

    Ok(Json(ListResponse {
        page: request.page,
        total_pages: page.total_pages,
        results: page.entries.into_iter().map(ListItem::from).collect(),
    }))
}

/// `GET /search?q=&page=&type=`
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<Json<SearchResponse>> {
    let params = query_params(params)?;
    let query = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Query parameter is required".to_string()))?;

    let catalog = state.catalog.as_ref().ok_or(AppError::CatalogUnavailable)?;

    let search_type = match params.search_type.as_deref() {
        None | Some("") => SearchType::default(),
        Some(raw) => raw.parse().map_err(|_| {
            AppError::InvalidInput(
                "Invalid type parameter. Must be movie, tv, or multi".to_string(),
            )
        })?,
    };

    let page = match params.page.as_deref().map(str::trim) {
        None | Some("") => 1,
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|page| *page >= 1)
            .ok_or_else(|| AppError::InvalidInput("Invalid page parameter".to_string()))?,
    };

    tracing::info!(
        request_id = %request_id,
        query = %query,
        search_type = search_type.as_str(),
        page,
        "Processing catalog search"
    );

    let response = catalog.search(&query, page, search_type).await?;
    Ok(Json(response))
}
