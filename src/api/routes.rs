//! HTTP API route definitions.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{health, metrics, ready, status, surebets, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready))
        // Data endpoints
        .route("/api/v1/surebets", get(surebets))
        .route("/surebets", get(surebets))
        .route("/api/v1/status", get(status))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::ScanParams;
    use crate::odds::{EventBuilder, OddsSnapshot};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    async fn loaded_state() -> AppState {
        let state = AppState::new(ScanParams::default());
        let events = vec![
            EventBuilder::new("e1", "Lakers", "Celtics")
                .prices("pinnacle", dec!(2.10), dec!(1.80))
                .prices("smarkets", dec!(1.85), dec!(2.05))
                .build(),
            EventBuilder::new("e2", "Yankees", "Red Sox")
                .sport("baseball_mlb", "MLB")
                .prices("pinnacle", dec!(2.20), dec!(1.75))
                .prices("betfair_ex_eu", dec!(1.70), dec!(2.00))
                .build(),
        ];
        *state.snapshot.write().await = Some(OddsSnapshot::new(events));
        state.set_ready(true);
        state
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let app = create_router(AppState::new(ScanParams::default()));
        let (status, body) = get_json(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, _) = get_json(app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_endpoint_returns_503_when_not_ready() {
        let app = create_router(AppState::new(ScanParams::default()));
        let (status, body) = get_json(app, "/ready").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], false);
    }

    #[tokio::test]
    async fn ready_endpoint_returns_200_when_ready() {
        let app = create_router(loaded_state().await);
        let (status, body) = get_json(app, "/ready").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"], 2);
    }

    #[tokio::test]
    async fn surebets_without_snapshot_is_unavailable() {
        let app = create_router(AppState::new(ScanParams::default()));
        let (status, body) = get_json(app, "/api/v1/surebets").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "no odds data available yet");
    }

    #[tokio::test]
    async fn surebets_are_ranked_by_roi() {
        let app = create_router(loaded_state().await);
        let (status, body) = get_json(app, "/api/v1/surebets").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events_available"], 2);
        assert_eq!(body["count"], 2);
        assert_eq!(body["opportunities"][0]["event_id"], "e2");
        assert_eq!(body["opportunities"][1]["event_id"], "e1");
        assert_eq!(body["opportunities"][1]["roi"], "3.73");
        assert_eq!(body["opportunities"][1]["legs"][0]["stake"], "49.40");
        assert_eq!(body["opportunities"][1]["legs"][1]["bookmaker"], "smarkets");
    }

    #[tokio::test]
    async fn surebets_apply_query_overrides() {
        let app = create_router(loaded_state().await);

        let (_, body) = get_json(app.clone(), "/api/v1/surebets?sport=mlb").await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["opportunities"][0]["sport_title"], "MLB");

        let (_, body) = get_json(app.clone(), "/api/v1/surebets?limit=1").await;
        assert_eq!(body["count"], 1);

        let (_, body) = get_json(app.clone(), "/api/v1/surebets?min_roi=50").await;
        assert_eq!(body["count"], 0);
        assert_eq!(body["events_available"], 2);

        let (_, body) = get_json(app, "/api/v1/surebets?stake=1000").await;
        assert_eq!(body["opportunities"][1]["total_stake"], "1000");
    }

    #[tokio::test]
    async fn invalid_stake_is_bad_request() {
        let app = create_router(loaded_state().await);
        let (status, body) = get_json(app, "/api/v1/surebets?stake=0").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("stake"));
    }

    #[tokio::test]
    async fn oversized_stake_is_bad_request() {
        let app = create_router(loaded_state().await);
        let (status, body) =
            get_json(app, "/api/v1/surebets?stake=79228162514264337593543950335").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("stake"));
    }

    #[tokio::test]
    async fn short_surebets_path_serves_the_same_list() {
        let state = loaded_state().await;
        let (_, full) = get_json(create_router(state.clone()), "/api/v1/surebets").await;
        let (status, short) = get_json(create_router(state), "/surebets").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(short["count"], full["count"]);
        assert_eq!(short["opportunities"][0]["event_id"], "e2");
    }

    #[tokio::test]
    async fn legs_carry_bookmaker_links() {
        let state = AppState::new(ScanParams::default());
        let mut event = EventBuilder::new("e1", "Lakers", "Celtics")
            .prices("pinnacle", dec!(2.10), dec!(1.80))
            .prices("smarkets", dec!(1.85), dec!(2.05))
            .build();
        for quote in event.quotes.iter_mut().filter(|q| q.bookmaker.key == "pinnacle") {
            quote.bookmaker.link = Some("https://www.pinnacle.com/en/e1".to_string());
        }
        *state.snapshot.write().await = Some(OddsSnapshot::new(vec![event]));

        let (_, body) = get_json(create_router(state), "/surebets").await;
        let legs = &body["opportunities"][0]["legs"];
        assert_eq!(legs[0]["link"], "https://www.pinnacle.com/en/e1");
        assert!(legs[1].get("link").is_none());
    }

    #[tokio::test]
    async fn status_reports_counters() {
        let app = create_router(AppState::new(ScanParams::default()));
        let (status, body) = get_json(app, "/api/v1/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "starting");
        assert_eq!(body["scans"], 0);
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_not_found() {
        let app = create_router(AppState::new(ScanParams::default()));
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
