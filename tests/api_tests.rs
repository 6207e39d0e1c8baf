use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use bookject::api::AppState;
use bookject::clients::google_books::decode;
use bookject::config::Config;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let state = bookject::api::create_app_state(config)
        .await
        .expect("Failed to create app state");
    (bookject::api::router(state.clone()), state)
}

async fn seed(state: &Arc<AppState>, raw: &str) {
    let items = decode(raw).unwrap().items.unwrap_or_default();
    state
        .ingest_service()
        .ingest_volumes(items)
        .await
        .expect("Failed to seed books");
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

const LIBRARY: &str = r#"{
    "items": [
        {
            "id": "YyXoAAAACAAJ",
            "volumeInfo": {
                "title": "Hobbit czyli Tam i z powrotem",
                "authors": ["J. R. R. Tolkien"],
                "categories": ["Baggins, Bilbo (Fictitious character)"],
                "publishedDate": "2004",
                "averageRating": 5,
                "ratingsCount": 2,
                "imageLinks": {
                    "thumbnail": "http://books.google.com/books/content?id=YyXoAAAACAAJ&printsec=frontcover&img=1&zoom=1&source=gbs_api"
                }
            }
        },
        {
            "id": "ML6TpwAACAAJ",
            "volumeInfo": {
                "title": "The Fellowship of the Ring",
                "authors": ["J. R. R. Tolkien"],
                "categories": ["Fiction"],
                "publishedDate": "1994-06-24"
            }
        },
        {
            "id": "RoC1zQEACAAJ",
            "volumeInfo": {
                "title": "The Coming of Conan the Cimmerian",
                "authors": ["Robert E. Howard"],
                "categories": ["Fiction"],
                "publishedDate": "2006"
            }
        }
    ]
}"#;

#[tokio::test]
async fn test_list_books_empty() {
    let (app, _state) = spawn_app().await;

    let (status, json) = get_json(&app, "/books").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_books_returns_representations() {
    let (app, state) = spawn_app().await;
    seed(&state, LIBRARY).await;

    let (status, json) = get_json(&app, "/books").await;
    assert_eq!(status, StatusCode::OK);

    let books = json["data"].as_array().unwrap();
    assert_eq!(books.len(), 3);

    let hobbit = books
        .iter()
        .find(|b| b["title"] == "Hobbit czyli Tam i z powrotem")
        .unwrap();
    assert_eq!(hobbit["authors"], serde_json::json!(["J. R. R. Tolkien"]));
    assert_eq!(hobbit["published_date"], "2004");
    assert_eq!(hobbit["average_rating"], 5.0);
    assert_eq!(hobbit["ratings_count"], 2);
    assert!(
        hobbit["thumbnail"]
            .as_str()
            .unwrap()
            .starts_with("http://books.google.com/")
    );
}

#[tokio::test]
async fn test_year_filter_matches_across_precisions() {
    let (app, state) = spawn_app().await;
    seed(&state, LIBRARY).await;

    // Stored as a bare year.
    let (status, json) = get_json(&app, "/books?published_date=2004").await;
    assert_eq!(status, StatusCode::OK);
    let books = json["data"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "Hobbit czyli Tam i z powrotem");

    // Stored as a full date; the filter still matches by year.
    let (status, json) = get_json(&app, "/books?published_date=1994").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    // Repeated years union.
    let (_, json) = get_json(&app, "/books?published_date=2004&published_date=2006").await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_year_filter_rejects_bad_values() {
    let (app, state) = spawn_app().await;
    seed(&state, LIBRARY).await;

    let (status, json) = get_json(&app, "/books?published_date=hobbit").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);

    // A future year alone matches nothing valid.
    let (status, _) = get_json(&app, "/books?published_date=5000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // But it is skipped when a valid year accompanies it.
    let (status, json) = get_json(&app, "/books?published_date=5000&published_date=2004").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_author_filter_is_case_insensitive_substring_union() {
    let (app, state) = spawn_app().await;
    seed(&state, LIBRARY).await;

    let (status, json) = get_json(&app, "/books?author=tolkien").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    // Repeats union rather than intersect.
    let (_, json) = get_json(&app, "/books?author=tolkien&author=howard").await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);

    let (_, json) = get_json(&app, "/books?author=nobody").await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_ordering_by_published_date() {
    let (app, state) = spawn_app().await;
    seed(&state, LIBRARY).await;

    let (_, json) = get_json(&app, "/books?ordering=-published_date").await;
    let years: Vec<String> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["published_date"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(years, vec!["2006", "2004", "1994"]);

    let (_, json) = get_json(&app, "/books?ordering=published_date").await;
    let years: Vec<String> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["published_date"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(years, vec!["1994", "2004", "2006"]);
}

#[tokio::test]
async fn test_get_book_by_external_id() {
    let (app, state) = spawn_app().await;
    seed(&state, LIBRARY).await;

    let (status, json) = get_json(&app, "/books/YyXoAAAACAAJ").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["title"], "Hobbit czyli Tam i z powrotem");
    assert_eq!(json["data"]["published_date"], "2004");
    assert_eq!(
        json["data"]["authors"],
        serde_json::json!(["J. R. R. Tolkien"])
    );

    let (status, json) = get_json(&app, "/books/doesnotexist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_ingest_requires_query_parameter() {
    let (app, _state) = spawn_app().await;

    for body in ["", "q=", "query=Hobbit"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/db")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body:?}");
    }
}

#[tokio::test]
async fn test_index_page_is_served() {
    let (app, _state) = spawn_app().await;

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Bookject"));
}
