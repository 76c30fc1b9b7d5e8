//! # Success Envelopes
//!
//! Every successful response is `{status: "success", data}`; list responses
//! add `pagination`. Errors use [`crate::error::ErrorBody`].

use axum::http::StatusCode;
use axum::Json;
use mcred_core::{Page, PageMeta};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub status: &'static str,
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

/// Handler result for single-record endpoints.
pub type Single<T> = (StatusCode, Json<ApiResponse<T>>);

/// 200 with `data`.
pub fn ok<T>(data: T) -> Single<T> {
    (
        StatusCode::OK,
        Json(ApiResponse {
            status: "success",
            data,
        }),
    )
}

/// 201 with `data`.
pub fn created<T>(data: T) -> Single<T> {
    (
        StatusCode::CREATED,
        Json(ApiResponse {
            status: "success",
            data,
        }),
    )
}

pub fn list<T>(page: Page<T>) -> Json<ListResponse<T>> {
    Json(ListResponse {
        status: "success",
        data: page.data,
        pagination: page.pagination,
    })
}
