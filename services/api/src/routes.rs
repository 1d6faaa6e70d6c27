use crate::infra::{AppState, IdssStore};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use idss_sim::error::AppError;
use idss_sim::idss::{
    AnalysisRequest, AnalysisTarget, HistoricalDataArchive, IdssAction, IdssReport, IdssState,
};
use serde_json::json;

pub(crate) fn with_idss_routes(store: IdssStore) -> Router {
    Router::new()
        .route("/api/v1/idss", get(state_handler))
        .route("/api/v1/idss/report", get(report_handler))
        .route("/api/v1/idss/actions", post(action_handler))
        .route("/api/v1/idss/analysis/request", post(analysis_request_handler))
        .route(
            "/api/v1/historical",
            get(archive_handler).put(replace_archive_handler),
        )
        .with_state(store)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn state_handler(State(store): State<IdssStore>) -> Json<IdssState> {
    Json(store.snapshot().await)
}

async fn report_handler(State(store): State<IdssStore>) -> Json<IdssReport> {
    let state = store.snapshot().await;
    Json(IdssReport::from_tree(&state.tree, state.context))
}

async fn action_handler(
    State(store): State<IdssStore>,
    Json(action): Json<IdssAction>,
) -> Result<Json<IdssState>, AppError> {
    Ok(Json(store.dispatch(action).await?))
}

/// Payload the external narrative service should receive for `target`.
async fn analysis_request_handler(
    State(store): State<IdssStore>,
    Json(target): Json<AnalysisTarget>,
) -> Result<Json<AnalysisRequest>, AppError> {
    let state = store.snapshot().await;
    Ok(Json(state.analysis_request(&target)?))
}

async fn archive_handler(State(store): State<IdssStore>) -> Json<HistoricalDataArchive> {
    Json(store.archive().await)
}

async fn replace_archive_handler(
    State(store): State<IdssStore>,
    Json(archive): Json<HistoricalDataArchive>,
) -> Result<Json<IdssState>, AppError> {
    Ok(Json(
        store.dispatch(IdssAction::MergeHistorical { archive }).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use idss_sim::idss::{OperationalDocument, OperatorSize, ScoringContext};
    use serde_json::Value;
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn archive_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("idss-api-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("scratch dir created");
        dir.join("historical_data.json")
    }

    fn router(name: &str) -> (Router, PathBuf) {
        let state = IdssState::reconcile(
            &OperationalDocument::default(),
            HistoricalDataArchive::default(),
            ScoringContext {
                reference_year: 2024,
                operator_size: OperatorSize::Grande,
            },
            2024,
        );
        let path = archive_path(name);
        (with_idss_routes(IdssStore::new(state, path.clone())), path)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn read_json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let (router, _) = router("health");
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn periodic_edit_rescores_the_report() {
        let (router, _) = router("edit");
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/idss/actions",
                json!({
                    "type": "set_periodic_value",
                    "indicatorId": "4.3",
                    "periodIndex": 0,
                    "field": "value",
                    "value": 0.65
                }),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let state = read_json_body(response).await;
        assert_eq!(state["tree"]["notaFinalCalculada"], json!(0.5));

        let response = router
            .oneshot(Request::get("/api/v1/idss/report").body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes");
        let report = read_json_body(response).await;
        assert_eq!(report["referenceYear"], json!(2024));
        assert_eq!(report["dimensions"][3]["notaFinal"], json!(0.5));
    }

    #[tokio::test]
    async fn unknown_indicator_is_not_found() {
        let (router, _) = router("unknown");
        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/idss/actions",
                json!({ "type": "set_periodicity", "indicatorId": "9.9", "periodicity": "Anual" }),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = read_json_body(response).await;
        assert!(body["error"]
            .as_str()
            .expect("error message")
            .contains("'9.9'"));
    }

    #[tokio::test]
    async fn analysis_request_requires_a_filled_period() {
        let (router, _) = router("analysis");
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/idss/analysis/request",
                json!({ "type": "indicator_last_period", "indicatorId": "4.3" }),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/idss/analysis/request",
                json!({ "type": "idss" }),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["type"], json!("idss"));
        assert_eq!(payload["idssData"]["dimensions"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn replaced_archive_is_persisted_and_merged() {
        let (router, path) = router("archive");
        let archive = json!({
            "idssHistoricalScores": [
                { "programYear": 2023, "baseYear": 2022, "score": 0.7712, "source": "ANS" }
            ],
            "indicatorHistoricalData": [
                { "id": "4.3", "results": [ { "year": 2022, "notaFinal": 0.8, "consolidatedValue": 0.86 } ] }
            ]
        });

        let response = router
            .clone()
            .oneshot(json_request("PUT", "/api/v1/historical", archive))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let state = read_json_body(response).await;
        assert!(state["availableYears"]
            .as_array()
            .expect("years listed")
            .contains(&json!(2022)));

        let written = std::fs::read_to_string(&path).expect("archive persisted");
        let reread: HistoricalDataArchive = serde_json::from_str(&written).expect("archive parses");
        assert_eq!(reread.idss_historical_scores[0].score, Some(0.7712));

        let response = router
            .oneshot(Request::get("/api/v1/historical").body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes");
        let body = read_json_body(response).await;
        assert_eq!(body["indicatorHistoricalData"][0]["id"], json!("4.3"));
    }
}
