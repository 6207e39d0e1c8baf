use bookject::api::AppState;
use bookject::clients::google_books::{Volume, decode};
use bookject::config::Config;
use bookject::entities::{books, prelude::*};
use bookject::services::IngestError;
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use std::sync::Arc;

async fn spawn_state(batch_size: usize, atomic: bool) -> Arc<AppState> {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.ingest.batch_size = batch_size;
    config.ingest.atomic = atomic;

    bookject::api::create_app_state(config)
        .await
        .expect("Failed to create app state")
}

fn volumes(raw: &str) -> Vec<Volume> {
    decode(raw).unwrap().items.unwrap_or_default()
}

const HOBBIT: &str = r#"{
    "items": [{
        "id": "YyXoAAAACAAJ",
        "volumeInfo": {
            "title": "Hobbit czyli Tam i z powrotem",
            "authors": ["J. R. R. Tolkien"],
            "categories": ["Baggins, Bilbo (Fictitious character)"],
            "publishedDate": "2004",
            "averageRating": 5,
            "ratingsCount": 2,
            "imageLinks": {
                "thumbnail": "http://books.google.com/books/content?id=YyXoAAAACAAJ"
            }
        }
    }]
}"#;

#[tokio::test]
async fn test_ingesting_one_volume_creates_the_full_row() {
    let state = spawn_state(100, false).await;

    let summary = state
        .ingest_service()
        .ingest_volumes(volumes(HOBBIT))
        .await
        .unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 0);

    let row = Books::find()
        .filter(books::Column::BookId.eq("YyXoAAAACAAJ"))
        .one(&state.store.conn)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.title.as_deref(), Some("Hobbit czyli Tam i z powrotem"));
    assert_eq!(
        row.published_date,
        Some(NaiveDate::from_ymd_opt(2004, 1, 1).unwrap())
    );
    assert!(!row.exact_date);
    assert_eq!(row.average_rating, Some(5.0));
    assert_eq!(row.ratings_count, Some(2));

    let book = state
        .store
        .get_book("YyXoAAAACAAJ")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(book.authors, vec!["J. R. R. Tolkien"]);
    assert_eq!(
        book.categories,
        vec!["Baggins, Bilbo (Fictitious character)"]
    );
}

#[tokio::test]
async fn test_reingesting_the_same_id_updates_in_place() {
    let state = spawn_state(100, false).await;
    let service = state.ingest_service();

    service.ingest_volumes(volumes(HOBBIT)).await.unwrap();

    let second = r#"{
        "items": [{
            "id": "YyXoAAAACAAJ",
            "volumeInfo": {
                "title": "The Hobbit, or There and Back Again",
                "authors": ["J. R. R. Tolkien", "Christopher Tolkien"],
                "publishedDate": "2004-09-15"
            }
        }]
    }"#;
    let summary = service.ingest_volumes(volumes(second)).await.unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 1);

    assert_eq!(Books::find().count(&state.store.conn).await.unwrap(), 1);

    let book = state
        .store
        .get_book("YyXoAAAACAAJ")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        book.title.as_deref(),
        Some("The Hobbit, or There and Back Again")
    );
    assert_eq!(
        book.published_date,
        Some(NaiveDate::from_ymd_opt(2004, 9, 15).unwrap())
    );
    assert!(book.exact_date);
    // Relation sets are replaced with the record's current ones.
    assert_eq!(
        book.authors,
        vec!["J. R. R. Tolkien", "Christopher Tolkien"]
    );
    assert!(book.categories.is_empty());
    // Fields absent from the update are kept, not cleared.
    assert_eq!(book.average_rating, Some(5.0));
}

#[tokio::test]
async fn test_shared_author_names_reuse_one_row() {
    let state = spawn_state(100, false).await;

    let two_books = r#"{
        "items": [
            {
                "id": "aaa",
                "volumeInfo": {
                    "title": "The Two Towers",
                    "authors": ["J. R. R. Tolkien"],
                    "publishedDate": "1954"
                }
            },
            {
                "id": "bbb",
                "volumeInfo": {
                    "title": "The Return of the King",
                    "authors": ["J. R. R. Tolkien"],
                    "publishedDate": "1955"
                }
            }
        ]
    }"#;
    state
        .ingest_service()
        .ingest_volumes(volumes(two_books))
        .await
        .unwrap();

    assert_eq!(Authors::find().count(&state.store.conn).await.unwrap(), 1);

    let first = state.store.get_book("aaa").await.unwrap().unwrap();
    let second = state.store.get_book("bbb").await.unwrap().unwrap();
    assert_eq!(first.authors, vec!["J. R. R. Tolkien"]);
    assert_eq!(second.authors, vec!["J. R. R. Tolkien"]);
}

#[tokio::test]
async fn test_small_batch_size_flushes_in_rounds() {
    let state = spawn_state(2, false).await;

    let five = r#"{
        "items": [
            {"id": "v1", "volumeInfo": {"title": "One", "publishedDate": "2001"}},
            {"id": "v2", "volumeInfo": {"title": "Two", "publishedDate": "2002"}},
            {"id": "v3", "volumeInfo": {"title": "Three", "publishedDate": "2003"}},
            {"id": "v4", "volumeInfo": {"title": "Four", "publishedDate": "2004"}},
            {"id": "v5", "volumeInfo": {"title": "Five", "publishedDate": "2005"}}
        ]
    }"#;
    let summary = state
        .ingest_service()
        .ingest_volumes(volumes(five))
        .await
        .unwrap();

    assert_eq!(summary.created, 5);
    assert_eq!(Books::find().count(&state.store.conn).await.unwrap(), 5);
}

#[tokio::test]
async fn test_empty_result_set_is_an_error_with_no_writes() {
    let state = spawn_state(100, false).await;

    let err = state
        .ingest_service()
        .ingest_volumes(Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::NoRecordsFound));

    // A page without an items collection decodes to the same outcome.
    let err = state
        .ingest_service()
        .ingest_volumes(volumes(r#"{"kind": "books#volumes", "totalItems": 0}"#))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::NoRecordsFound));

    assert_eq!(Books::find().count(&state.store.conn).await.unwrap(), 0);
}

const ONE_GOOD_ONE_MISSING_ID: &str = r#"{
    "items": [
        {"id": "good", "volumeInfo": {"title": "Committed", "publishedDate": "2001"}},
        {"volumeInfo": {"title": "No id here"}}
    ]
}"#;

#[tokio::test]
async fn test_missing_id_aborts_but_keeps_flushed_rows() {
    // Batch size 1 flushes each row as it is buffered, so the first row has
    // already landed when the second record aborts the run.
    let state = spawn_state(1, false).await;

    let err = state
        .ingest_service()
        .ingest_volumes(volumes(ONE_GOOD_ONE_MISSING_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::MissingRequiredField("id")));

    assert_eq!(Books::find().count(&state.store.conn).await.unwrap(), 1);
}

#[tokio::test]
async fn test_atomic_mode_rolls_back_the_whole_run() {
    let state = spawn_state(1, true).await;

    let err = state
        .ingest_service()
        .ingest_volumes(volumes(ONE_GOOD_ONE_MISSING_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::MissingRequiredField("id")));

    assert_eq!(Books::find().count(&state.store.conn).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unparseable_published_date_aborts_the_run() {
    let state = spawn_state(100, false).await;

    let bad_date = r#"{
        "items": [{
            "id": "ccc",
            "volumeInfo": {"title": "Sometime", "publishedDate": "June 2004"}
        }]
    }"#;
    let err = state
        .ingest_service()
        .ingest_volumes(volumes(bad_date))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::InvalidPublishedDate(_)));

    assert_eq!(Books::find().count(&state.store.conn).await.unwrap(), 0);
}
