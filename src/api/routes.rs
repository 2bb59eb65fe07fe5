use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::health::{HealthReport, HealthState};
use crate::api::validation::validate_match;
use crate::config::RECENT_MATCHES_DEFAULT;
use crate::error::AppError;
use crate::service::timings::RecomputeReport;
use crate::service::MatchService;
use crate::types::{MatchInput, MatchRecord, PlayerStats};

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<MatchService>,
    pub health: Arc<HealthState>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/matches", get(list_matches).post(create_match))
        .route("/matches/recent", get(recent_matches))
        .route(
            "/matches/:id",
            get(get_match).put(update_match).delete(delete_match),
        )
        .route("/stats", get(get_stats))
        .route("/stats/latency", get(get_stats_latency))
        .route("/health", get(get_health))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_matches(State(state): State<ApiState>) -> Result<Json<Vec<MatchRecord>>, AppError> {
    Ok(Json(state.service.get_all_matches().await?))
}

async fn recent_matches(
    State(state): State<ApiState>,
    Query(params): Query<RecentQuery>,
) -> Result<Json<Vec<MatchRecord>>, AppError> {
    let limit = params.limit.unwrap_or(RECENT_MATCHES_DEFAULT);
    Ok(Json(state.service.recent_matches(limit).await?))
}

async fn create_match(
    State(state): State<ApiState>,
    Json(input): Json<MatchInput>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    validate_match(&input, Utc::now().date_naive())?;
    let id = state.service.add_match(input).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn get_match(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<MatchRecord>, AppError> {
    let record = state.service.get_match(&id).await?;
    record.map(Json).ok_or(AppError::NotFound { id })
}

async fn update_match(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(input): Json<MatchInput>,
) -> Result<StatusCode, AppError> {
    validate_match(&input, Utc::now().date_naive())?;
    state.service.update_match(&id, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_match(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.service.delete_match(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_stats(State(state): State<ApiState>) -> Result<Json<PlayerStats>, AppError> {
    Ok(Json(state.service.get_player_stats().await?))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<RecomputeReport> {
    Json(state.service.recompute_report())
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthReport> {
    Json(state.health.report())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::RecomputeTimings;
    use crate::state::InMemoryDocumentStore;
    use serde_json::{json, Value};

    /// Bind to port 0 and return the base URL.
    async fn start_server() -> String {
        let health = Arc::new(HealthState::new());
        let service = Arc::new(MatchService::new(
            Arc::new(InMemoryDocumentStore::new()),
            "player",
            Arc::clone(&health),
            Arc::new(RecomputeTimings::new().unwrap()),
        ));
        let app = router(ApiState { service, health });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn match_lifecycle_over_http() {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/matches"))
            .json(&json!({
                "matchDate": "2025-01-10",
                "opponent": "India",
                "runsScored": 50,
                "ballsFaced": 40,
                "catches": 1
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let id = resp.json::<Value>().await.unwrap()["id"].as_str().unwrap().to_string();

        let resp = client.get(format!("{base}/matches/{id}")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["opponent"], "India");
        assert_eq!(body["matchDate"], "2025-01-10");

        let stats: Value = client
            .get(format!("{base}/stats"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats["totalMatches"], 1);
        assert_eq!(stats["strikeRate"], 125.0);

        let resp = client
            .put(format!("{base}/matches/{id}"))
            .json(&json!({"matchDate": "2025-01-10", "opponent": "India", "runsScored": 80, "ballsFaced": 40}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);

        let stats: Value = client
            .get(format!("{base}/stats"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats["totalRuns"], 80);
        assert_eq!(stats["strikeRate"], 200.0);

        let resp = client.delete(format!("{base}/matches/{id}")).send().await.unwrap();
        assert_eq!(resp.status(), 204);
        let resp = client.get(format!("{base}/matches/{id}")).send().await.unwrap();
        assert_eq!(resp.status(), 404);

        let health: Value = client
            .get(format!("{base}/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["writes_total"], 3);
    }

    #[tokio::test]
    async fn duplicate_is_conflict() {
        let base = start_server().await;
        let client = reqwest::Client::new();
        let body = json!({"matchDate": "2025-01-10", "opponent": "india"});

        let first = client.post(format!("{base}/matches")).json(&body).send().await.unwrap();
        assert_eq!(first.status(), 201);

        let resp = client
            .post(format!("{base}/matches"))
            .json(&json!({"matchDate": "2025-01-10", "opponent": "India"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);
        assert!(resp.text().await.unwrap().contains("India"));
    }

    #[tokio::test]
    async fn update_onto_another_match_is_conflict() {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let first = client
            .post(format!("{base}/matches"))
            .json(&json!({"matchDate": "2025-01-10", "opponent": "India"}))
            .send()
            .await
            .unwrap();
        assert_eq!(first.status(), 201);
        let second = client
            .post(format!("{base}/matches"))
            .json(&json!({"matchDate": "2025-01-12", "opponent": "Australia", "runsScored": 12}))
            .send()
            .await
            .unwrap();
        assert_eq!(second.status(), 201);
        let id = second.json::<Value>().await.unwrap()["id"].as_str().unwrap().to_string();

        let resp = client
            .put(format!("{base}/matches/{id}"))
            .json(&json!({"matchDate": "2025-01-10", "opponent": "INDIA", "runsScored": 99}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);

        let body: Value = client
            .get(format!("{base}/matches/{id}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["matchDate"], "2025-01-12");
        assert_eq!(body["opponent"], "Australia");
        assert_eq!(body["runsScored"], 12);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_the_store() {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/matches"))
            .json(&json!({"matchDate": "2025-01-10", "opponent": "India", "oversBowled": 3.7}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 422);

        let future = (Utc::now().date_naive() + chrono::Duration::days(2)).to_string();
        let resp = client
            .post(format!("{base}/matches"))
            .json(&json!({"matchDate": future, "opponent": "India"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 422);

        let list: Value = client
            .get(format!("{base}/matches"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(list.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn recent_respects_limit_and_missing_update_is_404() {
        let base = start_server().await;
        let client = reqwest::Client::new();

        for (day, opponent) in [("2025-01-01", "A"), ("2025-01-03", "B"), ("2025-01-02", "C")] {
            let resp = client
                .post(format!("{base}/matches"))
                .json(&json!({"matchDate": day, "opponent": opponent}))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 201);
        }

        let recent: Value = client
            .get(format!("{base}/matches/recent?limit=2"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let names: Vec<&str> = recent
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["opponent"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["B", "C"]);

        let resp = client
            .put(format!("{base}/matches/missing"))
            .json(&json!({"matchDate": "2025-01-01", "opponent": "Z"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let latency: Value = client
            .get(format!("{base}/stats/latency"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(latency["samples"], 3);
        assert_eq!(latency["last"]["total_matches"], 3);
        assert!(latency["p99_us"].as_u64().is_some());
    }
}
