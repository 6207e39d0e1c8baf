//! Maps one decoded volume record into the flat attribute set of a book row,
//! resolving the related author/category entities as it goes. Each record
//! produces its own immutable [`ExtractedBook`]; nothing is carried between
//! loop iterations.

use crate::clients::google_books::Volume;
use crate::db::repositories::author::AuthorRepository;
use crate::db::repositories::category::CategoryRepository;
use crate::entities::{authors, categories};
use chrono::NaiveDate;
use sea_orm::ConnectionTrait;

use super::ingest::IngestError;

/// Flat field set of one book row. Optional fields stay `None` when the
/// source omitted them; they are never defaulted.
#[derive(Debug, Clone)]
pub struct BookFields {
    pub external_id: String,
    pub title: Option<String>,
    pub published: Option<PublishedDate>,
    pub average_rating: Option<f64>,
    pub ratings_count: Option<i32>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishedDate {
    pub date: NaiveDate,
    /// False when the source only gave a year.
    pub exact: bool,
}

/// One record's extraction result: the row fields plus the resolved related
/// entities to link.
#[derive(Debug, Clone)]
pub struct ExtractedBook {
    pub fields: BookFields,
    pub authors: Vec<authors::Model>,
    pub categories: Vec<categories::Model>,
}

/// Extracts one volume record, upserting its authors and categories by
/// unique name. A record without an `id` is a hard failure that aborts the
/// whole ingestion run.
pub async fn extract<C: ConnectionTrait>(
    conn: &C,
    volume: &Volume,
) -> Result<ExtractedBook, IngestError> {
    let external_id = volume
        .id
        .clone()
        .ok_or(IngestError::MissingRequiredField("id"))?;
    let info = &volume.volume_info;

    let mut authors = Vec::new();
    if let Some(names) = &info.authors {
        for name in names {
            authors.push(AuthorRepository::find_or_create(conn, name).await?);
        }
    }

    let mut categories = Vec::new();
    if let Some(names) = &info.categories {
        for name in names {
            categories.push(CategoryRepository::find_or_create(conn, name).await?);
        }
    }

    let published = info
        .published_date
        .as_deref()
        .map(parse_published_date)
        .transpose()?;

    Ok(ExtractedBook {
        fields: BookFields {
            external_id,
            title: info.title.clone(),
            published,
            average_rating: info.average_rating,
            ratings_count: info.ratings_count.and_then(|c| i32::try_from(c).ok()),
            thumbnail: info
                .image_links
                .as_ref()
                .and_then(|links| links.thumbnail.clone()),
        },
        authors,
        categories,
    })
}

/// A 4-character value is a bare year (precision flag false, pinned to
/// January 1st); `YYYY-MM-DD` is a full date (flag true). Anything else is
/// rejected.
pub fn parse_published_date(raw: &str) -> Result<PublishedDate, IngestError> {
    let invalid = || IngestError::InvalidPublishedDate(raw.to_string());

    if raw.len() == 4 {
        let year: i32 = raw.parse().map_err(|_| invalid())?;
        let date = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
        Ok(PublishedDate { date, exact: false })
    } else {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
        Ok(PublishedDate { date, exact: true })
    }
}
