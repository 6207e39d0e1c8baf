use chrono::{DateTime, NaiveDate, Utc};

/// A catalog book with its related author and category names resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: i32,
    pub external_id: String,
    pub title: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub exact_date: bool,
    pub average_rating: Option<f64>,
    pub ratings_count: Option<i32>,
    pub thumbnail: Option<String>,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
}

/// Filters applied to the book listing.
///
/// `years` and `authors` each OR-combine internally; the two groups are
/// intersected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListFilter {
    /// Calendar years to match against `published_date`, day/month ignored.
    pub years: Vec<i32>,

    /// Case-insensitive substrings matched against author names.
    pub authors: Vec<String>,

    pub ordering: Option<BookOrdering>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookOrdering {
    PublishedDate,
    PublishedDateDesc,
}

impl BookOrdering {
    /// Parses the `ordering` query parameter. Unknown values are ignored
    /// rather than rejected.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "published_date" => Some(Self::PublishedDate),
            "-published_date" => Some(Self::PublishedDateDesc),
            _ => None,
        }
    }
}
