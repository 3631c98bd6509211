//! Request extractors whose rejections render as JSON [`ApiError`]s instead of plain text.

use crate::ApiError;
use axum::extract::{FromRequest, FromRequestParts};

/// `axum::Json` with its rejection mapped to [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with its rejection mapped to [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
