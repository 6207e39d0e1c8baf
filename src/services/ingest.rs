//! The ingestion pipeline: fetch a volume search page from the external
//! source, decode it, partition the records against existing rows by external
//! id, then update in place or bulk-insert with batched relation linking.

use crate::clients::google_books::{self, GoogleBooksClient, Volume};
use crate::config::IngestConfig;
use crate::db::Store;
use crate::db::repositories::book::BookRepository;
use crate::entities::{book_authors, book_categories, books};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set, TransactionTrait};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use super::batch::{self, BatchWriter};
use super::extract::{BookFields, ExtractedBook, extract};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("book source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("failed to decode source response: {0}")]
    Decode(String),

    #[error("no books found in source response")]
    NoRecordsFound,

    #[error("volume record is missing required field '{0}'")]
    MissingRequiredField(&'static str),

    #[error("incorrect published date '{0}'")]
    InvalidPublishedDate(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub created: usize,
    pub updated: usize,
}

pub struct IngestService {
    store: Store,
    client: Arc<GoogleBooksClient>,
    settings: IngestConfig,
}

impl IngestService {
    #[must_use]
    pub const fn new(store: Store, client: Arc<GoogleBooksClient>, settings: IngestConfig) -> Self {
        Self {
            store,
            client,
            settings,
        }
    }

    /// Runs one full ingestion pass for a search query.
    pub async fn ingest(&self, query: &str) -> Result<IngestSummary, IngestError> {
        let raw = self.client.fetch(query).await.map_err(|err| {
            error!("failed to reach book source: {err}");
            IngestError::SourceUnavailable(err.to_string())
        })?;

        let page = google_books::decode(&raw).map_err(|err| {
            error!("failed to decode book source response: {err}");
            IngestError::Decode(err.to_string())
        })?;

        self.ingest_volumes(page.items.unwrap_or_default()).await
    }

    /// Ingests already-decoded volume records. A run with nothing to ingest
    /// is an error, not an empty success.
    pub async fn ingest_volumes(&self, items: Vec<Volume>) -> Result<IngestSummary, IngestError> {
        if items.is_empty() {
            warn!("source returned no volume records");
            return Err(IngestError::NoRecordsFound);
        }

        let summary = if self.settings.atomic {
            let txn = self.store.conn.begin().await?;
            let summary = self.run(&txn, &items).await?;
            txn.commit().await?;
            summary
        } else {
            self.run(&self.store.conn, &items).await?
        };

        info!(
            created = summary.created,
            updated = summary.updated,
            "book ingestion finished"
        );
        Ok(summary)
    }

    async fn run<C: ConnectionTrait>(
        &self,
        conn: &C,
        items: &[Volume],
    ) -> Result<IngestSummary, IngestError> {
        // Records without an id are skipped here but still abort the run
        // during extraction below.
        let all_ids: Vec<String> = items.iter().filter_map(|v| v.id.clone()).collect();
        let existing = BookRepository::existing_ids(conn, &all_ids).await?;

        let mut writer = BatchWriter::new(conn, self.settings.batch_size);
        let mut new_ids: Vec<String> = Vec::new();
        let mut author_pairs: Vec<(String, i32)> = Vec::new();
        let mut category_pairs: Vec<(String, i32)> = Vec::new();
        let mut updated = 0usize;

        for volume in items {
            let extracted = extract(conn, volume).await?;

            if existing.contains(&extracted.fields.external_id) {
                // Existing rows are written directly; only new rows batch.
                update_existing(conn, &extracted).await?;
                updated += 1;
            } else {
                for author in &extracted.authors {
                    author_pairs.push((extracted.fields.external_id.clone(), author.id));
                }
                for category in &extracted.categories {
                    category_pairs.push((extracted.fields.external_id.clone(), category.id));
                }
                writer.add(new_book_model(&extracted.fields)).await?;
                new_ids.push(extracted.fields.external_id.clone());
            }
        }

        if !new_ids.is_empty() {
            writer.finish().await?;

            // The bulk insert does not hand back pks, so resolve them in one
            // batched select before materializing the link rows.
            let pk_by_external = BookRepository::ids_by_external(conn, &new_ids).await?;
            let author_links = author_pairs
                .into_iter()
                .filter_map(|(external_id, author_id)| {
                    pk_by_external
                        .get(&external_id)
                        .map(|pk| book_authors::ActiveModel {
                            book_id: Set(*pk),
                            author_id: Set(author_id),
                        })
                })
                .collect();
            let category_links = category_pairs
                .into_iter()
                .filter_map(|(external_id, category_id)| {
                    pk_by_external
                        .get(&external_id)
                        .map(|pk| book_categories::ActiveModel {
                            book_id: Set(*pk),
                            category_id: Set(category_id),
                        })
                })
                .collect();
            batch::link_relations(conn, author_links, category_links).await?;
        }

        Ok(IngestSummary {
            created: new_ids.len(),
            updated,
        })
    }
}

/// Updates an existing row's present fields in place and replaces both
/// relation sets with the record's current ones.
async fn update_existing<C: ConnectionTrait>(
    conn: &C,
    extracted: &ExtractedBook,
) -> Result<(), IngestError> {
    let fields = &extracted.fields;
    let model = BookRepository::find_by_external(conn, &fields.external_id)
        .await?
        .ok_or_else(|| {
            DbErr::RecordNotFound(format!("book '{}' vanished mid-run", fields.external_id))
        })?;
    let book_pk = model.id;

    let mut active: books::ActiveModel = model.into();
    if let Some(title) = &fields.title {
        active.title = Set(Some(title.clone()));
    }
    if let Some(published) = fields.published {
        active.published_date = Set(Some(published.date));
        active.exact_date = Set(published.exact);
    }
    if let Some(rating) = fields.average_rating {
        active.average_rating = Set(Some(rating));
    }
    if let Some(count) = fields.ratings_count {
        active.ratings_count = Set(Some(count));
    }
    if let Some(thumbnail) = &fields.thumbnail {
        active.thumbnail = Set(Some(thumbnail.clone()));
    }
    active.modified_date = Set(Utc::now());
    active.update(conn).await?;

    let author_ids: Vec<i32> = extracted.authors.iter().map(|a| a.id).collect();
    let category_ids: Vec<i32> = extracted.categories.iter().map(|c| c.id).collect();
    BookRepository::replace_links(conn, book_pk, &author_ids, &category_ids).await?;

    Ok(())
}

fn new_book_model(fields: &BookFields) -> books::ActiveModel {
    let now = Utc::now();
    books::ActiveModel {
        book_id: Set(fields.external_id.clone()),
        title: Set(fields.title.clone()),
        published_date: Set(fields.published.map(|p| p.date)),
        exact_date: Set(fields.published.is_some_and(|p| p.exact)),
        average_rating: Set(fields.average_rating),
        ratings_count: Set(fields.ratings_count),
        thumbnail: Set(fields.thumbnail.clone()),
        created_date: Set(now),
        modified_date: Set(now),
        ..Default::default()
    }
}
