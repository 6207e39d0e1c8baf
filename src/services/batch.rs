//! Buffered bulk writes for newly ingested books. Inserting row-by-row costs
//! one round trip per book and per relation link; the writer flushes in
//! bounded batches instead.

use crate::entities::{book_authors, book_categories, books, prelude::*};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait};
use tracing::debug;

pub struct BatchWriter<'c, C: ConnectionTrait> {
    conn: &'c C,
    batch_size: usize,
    pending: Vec<books::ActiveModel>,
}

impl<'c, C: ConnectionTrait> BatchWriter<'c, C> {
    pub fn new(conn: &'c C, batch_size: usize) -> Self {
        Self {
            conn,
            batch_size: batch_size.max(1),
            pending: Vec::new(),
        }
    }

    /// Buffers one pending insert; reaching the batch size flushes the
    /// buffer in a single bulk statement.
    pub async fn add(&mut self, book: books::ActiveModel) -> Result<(), DbErr> {
        self.pending.push(book);
        if self.pending.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), DbErr> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let batch = std::mem::take(&mut self.pending);
        let count = batch.len();
        Books::insert_many(batch)
            .exec_without_returning(self.conn)
            .await?;
        debug!("flushed {count} new book rows");
        Ok(())
    }

    /// Forces a final flush of any remainder and consumes the writer.
    pub async fn finish(mut self) -> Result<(), DbErr> {
        self.flush().await
    }
}

/// Bulk-creates the many-to-many link rows for newly inserted books, one
/// batched insert per relation type.
pub async fn link_relations<C: ConnectionTrait>(
    conn: &C,
    author_links: Vec<book_authors::ActiveModel>,
    category_links: Vec<book_categories::ActiveModel>,
) -> Result<(), DbErr> {
    if !author_links.is_empty() {
        BookAuthors::insert_many(author_links)
            .exec_without_returning(conn)
            .await?;
    }
    if !category_links.is_empty() {
        BookCategories::insert_many(category_links)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}
