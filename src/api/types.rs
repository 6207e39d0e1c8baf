use serde::Serialize;

use crate::models::book::Book;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookDto {
    pub title: Option<String>,
    pub authors: Vec<String>,
    /// Always the 4-digit year, regardless of the stored date's precision.
    pub published_date: Option<String>,
    pub categories: Vec<String>,
    pub average_rating: Option<f64>,
    pub ratings_count: Option<i32>,
    pub thumbnail: Option<String>,
}

impl From<&Book> for BookDto {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            authors: book.authors.clone(),
            published_date: book
                .published_date
                .map(|date| date.format("%Y").to_string()),
            categories: book.categories.clone(),
            average_rating: book.average_rating,
            ratings_count: book.ratings_count,
            thumbnail: book.thumbnail.clone(),
        }
    }
}
