use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Datelike, Utc};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, BookDto};
use crate::models::book::{BookListFilter, BookOrdering};

pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ApiResponse<Vec<BookDto>>>, ApiError> {
    let filter = parse_list_params(&params)?;
    let books = state.store().list_books(&filter).await?;

    Ok(Json(ApiResponse::success(
        books.iter().map(BookDto::from).collect(),
    )))
}

pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
) -> Result<Json<ApiResponse<BookDto>>, ApiError> {
    match state.store().get_book(&book_id).await? {
        Some(book) => Ok(Json(ApiResponse::success(BookDto::from(&book)))),
        None => Err(ApiError::book_not_found(&book_id)),
    }
}

/// Parses the repeatable `published_date` / `author` / `ordering` query
/// parameters. An unparseable year rejects the request; an out-of-range year
/// is skipped, but if none survive the request is rejected too.
fn parse_list_params(params: &[(String, String)]) -> Result<BookListFilter, ApiError> {
    let current_year = Utc::now().year();
    let mut filter = BookListFilter::default();
    let mut saw_date_param = false;

    for (key, value) in params {
        match key.as_str() {
            "published_date" => {
                saw_date_param = true;
                let year: i32 = value.parse().map_err(|_| ApiError::BooksNotFound)?;
                if year > 0 && year <= current_year {
                    filter.years.push(year);
                }
            }
            "author" => filter.authors.push(value.clone()),
            "ordering" => {
                if let Some(ordering) = BookOrdering::parse(value) {
                    filter.ordering = Some(ordering);
                }
            }
            _ => {}
        }
    }

    if saw_date_param && filter.years.is_empty() {
        return Err(ApiError::BooksNotFound);
    }

    Ok(filter)
}
