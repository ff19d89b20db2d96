use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use filmshare_api::{
    db::MemoryStore,
    error::{AppError, AppResult},
    models::{MovieId, MovieRecord},
    routes::{create_router, AppState},
    services::catalog::MovieCatalog,
};

/// Fixed in-memory catalog
struct StaticCatalog {
    movies: HashMap<MovieId, MovieRecord>,
}

#[async_trait::async_trait]
impl MovieCatalog for StaticCatalog {
    async fn fetch_movie(&self, movie_id: MovieId) -> AppResult<MovieRecord> {
        self.movies
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("movie {}", movie_id)))
    }

    async fn genre_names(&self, genre_ids: &[u32]) -> AppResult<Vec<String>> {
        Ok(genre_ids
            .iter()
            .filter_map(|id| match id {
                28 => Some("Action".to_string()),
                18 => Some("Drama".to_string()),
                35 => Some("Comedy".to_string()),
                _ => None,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

fn movie(id: MovieId, genres: &[u32]) -> MovieRecord {
    MovieRecord {
        id,
        title: format!("Movie {}", id),
        genre_ids: genres.to_vec(),
        popularity: Some(35.0),
        vote_average: Some(7.2),
        release_date: Some("2011-09-16".to_string()),
        ..Default::default()
    }
}

fn create_test_server() -> TestServer {
    let catalog = StaticCatalog {
        movies: HashMap::from([
            (550, movie(550, &[18])),
            (603, movie(603, &[28])),
            (680, movie(680, &[28, 35])),
        ]),
    };
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(catalog),
        Duration::from_millis(200),
    );
    TestServer::new(create_router(Arc::new(state))).unwrap()
}

async fn rate(server: &TestServer, user_id: i64, movie_id: i64, rating: i64, friend_id: i64) -> Value {
    let response = server
        .post("/api/v1/ratings")
        .json(&json!({
            "user_id": user_id,
            "movie_id": movie_id,
            "rating": rating,
            "genres": ["Action"],
            "popularity": 42.0,
            "friend_id": friend_id
        }))
        .await;
    response.assert_status_ok();
    response.json()
}

fn curated(offset: i64) -> Value {
    curated_in(offset, "en")
}

fn curated_in(offset: i64, language: &str) -> Value {
    let movies: Vec<Value> = (1..=5)
        .map(|i| {
            json!({
                "tmdb_id": offset + i,
                "title": format!("Pick {}", offset + i),
                "genres": ["Drama"],
                "language": language
            })
        })
        .collect();
    Value::Array(movies)
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_request_id_echoed() {
    let server = create_test_server();
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_invalid_rating_rejected() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/ratings")
        .json(&json!({ "user_id": 1, "movie_id": 550, "rating": 5 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("rating"));
}

#[tokio::test]
async fn test_voting_session_flow() {
    let server = create_test_server();

    let response = server.get("/api/v1/taste-match/1/2/session").await;
    response.assert_json(&json!({ "status": "not_started" }));

    let mut last = Value::Null;
    for movie_id in 1..=20 {
        last = rate(&server, 1, movie_id, 1, 2).await;
    }
    assert_eq!(last, json!({ "saved": true, "session_status": "one_side_complete" }));

    let response = server.get("/api/v1/taste-match/1/2/session").await;
    response.assert_json(&json!({
        "status": "waiting_for_friend",
        "your_votes": 20,
        "friend_votes": 0
    }));

    let response = server.get("/api/v1/taste-match/2/1/session").await;
    response.assert_json(&json!({
        "status": "voting_in_progress",
        "votes_you": 0,
        "votes_friend": 20,
        "votes_required": 20
    }));

    for movie_id in 1..=20 {
        last = rate(&server, 2, movie_id, 1, 1).await;
    }
    assert_eq!(last["session_status"], "report_generated");

    let response = server.get("/api/v1/taste-match/2/1/session").await;
    response.assert_status_ok();
    let state: Value = response.json();
    assert_eq!(state["status"], "report_ready");
    assert_eq!(state["report"]["user_low_id"], 1);
    assert_eq!(state["report"]["user_high_id"], 2);
    assert_eq!(state["report"]["match_percentage"], 100);
    assert_eq!(state["report"]["genre_compatibility"]["Action"], 100);
}

#[tokio::test]
async fn test_taste_match_insufficient_data() {
    let server = create_test_server();
    rate(&server, 3, 10, 1, 4).await;

    let response = server.get("/api/v1/taste-match/3/4").await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "status": "insufficient_data",
        "required": 20,
        "your_ratings": 1,
        "friend_ratings": 0
    }));
}

#[tokio::test]
async fn test_taste_match_same_user_rejected() {
    let server = create_test_server();
    let response = server.get("/api/v1/taste-match/3/3").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_watched_history_feeds_taste_vector() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/users/5/watched")
        .json(&json!({ "movie_id": 680 }))
        .await;
    response.assert_json(&json!({ "added": true }));

    let response = server
        .post("/api/v1/users/5/watched")
        .json(&json!({ "movie_id": 680 }))
        .await;
    response.assert_json(&json!({ "added": false }));

    let response = server.get("/api/v1/users/5/taste-vector").await;
    response.assert_status_ok();
    let record: Value = response.json();
    assert_eq!(record["vector"], json!({ "Action": 1.0, "Comedy": 1.0 }));
    assert_eq!(record["total_rated_movies"], 0);
    assert_eq!(record["genres_count"], 2);
}

#[tokio::test]
async fn test_curated_list_compatibility() {
    let server = create_test_server();

    let response = server.get("/api/v1/compatibility/1/2").await;
    response.assert_json(&json!({ "status": "missing_list", "missing": [1, 2] }));

    let response = server
        .put("/api/v1/users/1/curated-list")
        .json(&json!({ "movies": curated(0), "preferred_languages": [" EN ", "en"] }))
        .await;
    response.assert_status_ok();
    let saved: Value = response.json();
    assert_eq!(saved["preferred_languages"], json!(["en"]));

    server
        .put("/api/v1/users/2/curated-list")
        .json(&json!({ "movies": curated(0), "preferred_languages": ["en"] }))
        .await
        .assert_status_ok();

    let response = server.get("/api/v1/compatibility/2/1").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["score"], 100);
    assert_eq!(body["breakdown"]["direct_overlap"], 100.0);
    assert_eq!(body["common_movies"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_movie_languages_match_regardless_of_case() {
    let server = create_test_server();

    let response = server
        .put("/api/v1/users/1/curated-list")
        .json(&json!({ "movies": curated_in(0, "EN"), "preferred_languages": ["EN"] }))
        .await;
    response.assert_status_ok();
    let saved: Value = response.json();
    assert_eq!(saved["movies"][0]["language"], "en");

    server
        .put("/api/v1/users/2/curated-list")
        .json(&json!({ "movies": curated_in(10, "en"), "preferred_languages": ["en"] }))
        .await
        .assert_status_ok();

    let response = server.get("/api/v1/compatibility/1/2").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["breakdown"]["direct_overlap"], 0.0);
    assert_eq!(body["breakdown"]["similar_overlap"], 100.0);
    assert_eq!(body["breakdown"]["language_overlap"], 100.0);
}

#[tokio::test]
async fn test_short_curated_list_rejected() {
    let server = create_test_server();

    let response = server
        .put("/api/v1/users/1/curated-list")
        .json(&json!({ "movies": [{ "tmdb_id": 1, "title": "Only one" }] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    server
        .get("/api/v1/users/1/curated-list")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_score_candidates_endpoint() {
    let server = create_test_server();
    rate(&server, 7, 603, 1, 8).await;

    let response = server
        .post("/api/v1/users/7/recommendations/score")
        .json(&json!({
            "candidates": [movie(603, &[28]), movie(900, &[18]), movie(901, &[28])]
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let ids: Vec<i64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["movie_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![901, 900]);
    assert_eq!(body["profile"]["movie_count"], 1);
    assert_eq!(body["results"][0]["components"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_similar_movies_endpoint() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/movies/similar")
        .json(&json!({
            "target": movie(1, &[28, 35]),
            "candidates": [movie(1, &[28, 35]), movie(2, &[18]), movie(3, &[28, 35])],
            "limit": 5
        }))
        .await;
    response.assert_status_ok();

    let ranked: Vec<Value> = response.json();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["movie_id"], 3);
    assert_eq!(ranked[1]["movie_id"], 2);
}
