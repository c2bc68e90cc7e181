// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! REST adapter over the [`AdEngine`].
//!
//! ## Endpoints
//!
//! - `POST /line-items` - Create a line item
//! - `GET /line-items` - List line items (`advertiser_id`, `placement` filters)
//! - `GET /line-items/{id}` - Get a line item by ID
//! - `PUT /line-items/{id}/status` - Change a line item's status
//! - `GET /ads` - Run an auction (`placement`, `category`, `keyword`, `limit`)
//! - `POST /tracking` - Record an impression, click or conversion
//!
//! Monetary values travel as decimal strings, e.g. `"bid": "2.50"`.

use crate::base::{AdvertiserId, LineItemId};
use crate::engine::AdEngine;
use crate::error::AdError;
use crate::line_item::{Ad, LineItem, LineItemCreate, LineItemStatus};
use crate::query::AdQueryParams;
use crate::store::ListFilter;
use crate::tracking::TrackingEvent;
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared application state containing the engine.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AdEngine>,
}

impl AppState {
    pub fn new(engine: AdEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Response body for errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListLineItemsQuery {
    pub advertiser_id: Option<String>,
    pub placement: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: LineItemStatus,
}

/// Error returned by every handler.
///
/// Both domain failures and rejected request bodies or query strings are
/// rendered as an [`ErrorResponse`].
pub enum AppError {
    Domain(AdError),
    Rejected { status: StatusCode, message: String },
}

impl From<AdError> for AppError {
    fn from(err: AdError) -> Self {
        AppError::Domain(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = match self {
            AppError::Domain(err) => {
                let (status, code) = match &err {
                    AdError::NotFound => (StatusCode::NOT_FOUND, "LINE_ITEM_NOT_FOUND"),
                    AdError::StaleVersion => (StatusCode::CONFLICT, "STALE_VERSION"),
                    AdError::DuplicateId => (StatusCode::CONFLICT, "DUPLICATE_ID"),
                    AdError::InvalidAmount => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
                    AdError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
                    AdError::StorageUnavailable(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_UNAVAILABLE")
                    }
                };
                (status, code, err.to_string())
            }
            AppError::Rejected { status, message } => (status, "INVALID_REQUEST", message),
        };

        (
            status,
            Json(ErrorResponse {
                error,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

/// POST /line-items
async fn create_line_item(
    State(state): State<AppState>,
    request: Result<Json<LineItemCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<LineItem>), AppError> {
    let Json(request) = request?;
    let line_item = state.engine.create_line_item(request)?;
    Ok((StatusCode::CREATED, Json(line_item)))
}

/// GET /line-items/{id}
async fn get_line_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LineItem>, AppError> {
    let line_item = state.engine.get_line_item(&LineItemId(id))?;
    Ok(Json(line_item))
}

/// GET /line-items
async fn list_line_items(
    State(state): State<AppState>,
    query: Result<Query<ListLineItemsQuery>, QueryRejection>,
) -> Result<Json<Vec<LineItem>>, AppError> {
    let Query(query) = query?;
    let filter = ListFilter {
        status: None,
        advertiser_id: query
            .advertiser_id
            .filter(|a| !a.is_empty())
            .map(AdvertiserId),
        placement: query.placement.filter(|p| !p.is_empty()),
    };
    Ok(Json(state.engine.list_line_items(&filter)?))
}

/// PUT /line-items/{id}/status
async fn set_line_item_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<LineItem>, AppError> {
    let Json(request) = request?;
    let line_item = state
        .engine
        .set_line_item_status(&LineItemId(id), request.status)?;
    Ok(Json(line_item))
}

/// GET /ads
async fn winning_ads(
    State(state): State<AppState>,
    params: Result<Query<AdQueryParams>, QueryRejection>,
) -> Result<Json<Vec<Ad>>, AppError> {
    let Query(params) = params?;
    let query = state
        .engine
        .validator()
        .validate_query(params)
        .map_err(AdError::from)?;
    Ok(Json(state.engine.winning_ads(&query)?))
}

/// POST /tracking
async fn track(
    State(state): State<AppState>,
    event: Result<Json<TrackingEvent>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(event) = event?;
    state.engine.track(event)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/line-items", post(create_line_item).get(list_line_items))
        .route("/line-items/{id}", get(get_line_item))
        .route("/line-items/{id}/status", put(set_line_item_status))
        .route("/ads", get(winning_ads))
        .route("/tracking", post(track))
        .with_state(state)
}

/// Serves the API on an already bound listener until the process exits.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, create_router(state)).await
}
