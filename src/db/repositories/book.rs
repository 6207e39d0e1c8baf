use crate::entities::{authors, book_authors, book_categories, books, prelude::*};
use crate::models::book::{Book, BookListFilter, BookOrdering};
use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use std::collections::{HashMap, HashSet};

pub struct BookRepository {
    conn: DatabaseConnection,
}

impl BookRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Lists books matching the filter, with author/category names attached.
    ///
    /// Year values OR-combine, author substrings OR-combine, and the two
    /// groups intersect. Year matching compares against the calendar year of
    /// `published_date` regardless of the stored day/month precision.
    pub async fn list(&self, filter: &BookListFilter) -> anyhow::Result<Vec<Book>> {
        let mut query = Books::find();

        if !filter.years.is_empty() {
            let mut years = Condition::any();
            for year in &filter.years {
                let (Some(start), Some(end)) = (
                    NaiveDate::from_ymd_opt(*year, 1, 1),
                    NaiveDate::from_ymd_opt(*year, 12, 31),
                ) else {
                    continue;
                };
                years = years.add(books::Column::PublishedDate.between(start, end));
            }
            query = query.filter(years);
        }

        if !filter.authors.is_empty() {
            let mut names = Condition::any();
            for needle in &filter.authors {
                names = names.add(
                    Expr::expr(Func::lower(Expr::col((Authors, authors::Column::Name))))
                        .like(format!("%{}%", needle.to_lowercase())),
                );
            }
            query = query
                .join(JoinType::InnerJoin, books::Relation::BookAuthors.def())
                .join(JoinType::InnerJoin, book_authors::Relation::Authors.def())
                .filter(names)
                .distinct();
        }

        query = match filter.ordering {
            Some(BookOrdering::PublishedDate) => query.order_by_asc(books::Column::PublishedDate),
            Some(BookOrdering::PublishedDateDesc) => {
                query.order_by_desc(books::Column::PublishedDate)
            }
            None => query.order_by_asc(books::Column::Id),
        };

        let rows = query.all(&self.conn).await?;
        self.attach_relations(rows).await
    }

    pub async fn get_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<Book>> {
        let row = Books::find()
            .filter(books::Column::BookId.eq(external_id))
            .one(&self.conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(self.attach_relations(vec![row]).await?.pop())
    }

    async fn attach_relations(&self, rows: Vec<books::Model>) -> anyhow::Result<Vec<Book>> {
        let ids: Vec<i32> = rows.iter().map(|m| m.id).collect();

        let mut authors_by_book: HashMap<i32, Vec<String>> = HashMap::new();
        let mut categories_by_book: HashMap<i32, Vec<String>> = HashMap::new();

        if !ids.is_empty() {
            let author_links = BookAuthors::find()
                .filter(book_authors::Column::BookId.is_in(ids.clone()))
                .order_by_asc(book_authors::Column::AuthorId)
                .find_also_related(Authors)
                .all(&self.conn)
                .await?;
            for (link, author) in author_links {
                if let Some(author) = author {
                    authors_by_book
                        .entry(link.book_id)
                        .or_default()
                        .push(author.name);
                }
            }

            let category_links = BookCategories::find()
                .filter(book_categories::Column::BookId.is_in(ids))
                .order_by_asc(book_categories::Column::CategoryId)
                .find_also_related(Categories)
                .all(&self.conn)
                .await?;
            for (link, category) in category_links {
                if let Some(category) = category {
                    categories_by_book
                        .entry(link.book_id)
                        .or_default()
                        .push(category.name);
                }
            }
        }

        Ok(rows
            .into_iter()
            .map(|model| {
                let authors = authors_by_book.remove(&model.id).unwrap_or_default();
                let categories = categories_by_book.remove(&model.id).unwrap_or_default();
                map_model_to_book(model, authors, categories)
            })
            .collect())
    }

    /// Single batched existence check: which of `external_ids` already have a
    /// row. Drives the update-vs-insert partition of an ingestion run.
    pub async fn existing_ids<C: ConnectionTrait>(
        conn: &C,
        external_ids: &[String],
    ) -> Result<HashSet<String>, DbErr> {
        if external_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows: Vec<String> = Books::find()
            .select_only()
            .column(books::Column::BookId)
            .filter(books::Column::BookId.is_in(external_ids.iter().cloned()))
            .into_tuple()
            .all(conn)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Resolves external ids to surrogate pks in one query. Used after a bulk
    /// insert to materialize the relation link rows.
    pub async fn ids_by_external<C: ConnectionTrait>(
        conn: &C,
        external_ids: &[String],
    ) -> Result<HashMap<String, i32>, DbErr> {
        if external_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, String)> = Books::find()
            .select_only()
            .column(books::Column::Id)
            .column(books::Column::BookId)
            .filter(books::Column::BookId.is_in(external_ids.iter().cloned()))
            .into_tuple()
            .all(conn)
            .await?;

        Ok(rows.into_iter().map(|(id, ext)| (ext, id)).collect())
    }

    pub async fn find_by_external<C: ConnectionTrait>(
        conn: &C,
        external_id: &str,
    ) -> Result<Option<books::Model>, DbErr> {
        Books::find()
            .filter(books::Column::BookId.eq(external_id))
            .one(conn)
            .await
    }

    /// Replaces both relation sets of one book with the given ids.
    pub async fn replace_links<C: ConnectionTrait>(
        conn: &C,
        book_pk: i32,
        author_ids: &[i32],
        category_ids: &[i32],
    ) -> Result<(), DbErr> {
        use sea_orm::Set;

        BookAuthors::delete_many()
            .filter(book_authors::Column::BookId.eq(book_pk))
            .exec(conn)
            .await?;
        BookCategories::delete_many()
            .filter(book_categories::Column::BookId.eq(book_pk))
            .exec(conn)
            .await?;

        if !author_ids.is_empty() {
            BookAuthors::insert_many(author_ids.iter().map(|author_id| {
                book_authors::ActiveModel {
                    book_id: Set(book_pk),
                    author_id: Set(*author_id),
                }
            }))
            .exec_without_returning(conn)
            .await?;
        }
        if !category_ids.is_empty() {
            BookCategories::insert_many(category_ids.iter().map(|category_id| {
                book_categories::ActiveModel {
                    book_id: Set(book_pk),
                    category_id: Set(*category_id),
                }
            }))
            .exec_without_returning(conn)
            .await?;
        }

        Ok(())
    }
}

fn map_model_to_book(model: books::Model, authors: Vec<String>, categories: Vec<String>) -> Book {
    Book {
        id: model.id,
        external_id: model.book_id,
        title: model.title,
        published_date: model.published_date,
        exact_date: model.exact_date,
        average_rating: model.average_rating,
        ratings_count: model.ratings_count,
        thumbnail: model.thumbnail,
        created_date: model.created_date,
        modified_date: model.modified_date,
        authors,
        categories,
    }
}
