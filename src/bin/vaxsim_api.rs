use std::net::SocketAddr;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use anyhow::Context;
use serde::Serialize;
use serde_json::json;

use vaxsim::model::params::AGE_BAND_WEIGHTS;
use tokio::task::JoinError;
use vaxsim::{simulate, Parameters, SimError, SimulationResult};

#[derive(Debug, Serialize)]
struct AgeBandWeight {
    band: &'static str,
    weight: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000);

    let app = router();

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid HOST/PORT: {}:{}", host, port))?;
    log::info!("[vaxsim-api] listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.context("bind failed")?;
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}

fn router() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/age_bands", get(age_bands))
        .route("/simulate", post(run_simulation))
}

async fn healthz() -> impl IntoResponse {
    Json(json!({"ok": true}))
}

async fn age_bands() -> impl IntoResponse {
    let table: Vec<AgeBandWeight> = AGE_BAND_WEIGHTS
        .iter()
        .map(|(band, weight)| AgeBandWeight { band: band.label(), weight: *weight })
        .collect();
    Json(table)
}

async fn run_simulation(payload: Result<Json<Parameters>, JsonRejection>) -> impl IntoResponse {
    let params = match payload {
        Ok(Json(params)) => params,
        Err(rejection) => {
            log::warn!("[vaxsim-api] rejected body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"return_code": 1, "error": rejection.body_text()})),
            )
                .into_response();
        }
    };

    // Integration is CPU-bound; keep it off the async workers.
    let join = tokio::task::spawn_blocking(move || simulate(&params));
    response_for(join.await)
}

fn response_for(outcome: Result<Result<SimulationResult, SimError>, JoinError>) -> Response {
    match outcome {
        Ok(Ok(result)) => (StatusCode::OK, Json(result)).into_response(),
        Ok(Err(e)) => {
            let (code, return_code) = status_for(&e);
            (code, Json(json!({"return_code": return_code, "error": e.to_string()}))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"return_code": 2, "error": format!("join error: {e}")})),
        )
            .into_response(),
    }
}

fn status_for(e: &SimError) -> (StatusCode, i32) {
    match e {
        SimError::InvalidParameter { .. } => (StatusCode::BAD_REQUEST, 1),
        SimError::NumericalInstability { .. } => (StatusCode::UNPROCESSABLE_ENTITY, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn post_simulate(body: &'static str) -> Response {
        let req = Request::builder()
            .method("POST")
            .uri("/simulate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let payload = Json::<Parameters>::from_request(req, &()).await;
        run_simulation(payload).await.into_response()
    }

    #[test]
    fn maps_errors_to_status_codes() {
        let bad = SimError::InvalidParameter { name: "waning_weeks", reason: "0 must be > 0".into() };
        assert_eq!(status_for(&bad), (StatusCode::BAD_REQUEST, 1));
        let unstable = SimError::NumericalInstability { day: 3, reason: "NaN".into() };
        assert_eq!(status_for(&unstable), (StatusCode::UNPROCESSABLE_ENTITY, 2));
    }

    #[tokio::test]
    async fn simulate_endpoint_returns_both_series() {
        let resp = run_simulation(Ok(Json(Parameters::default()))).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let v = body_json(resp).await;
        assert_eq!(v["I"].as_array().unwrap().len(), 31);
        assert_eq!(v["baseline_I"].as_array().unwrap().len(), 31);
        assert_eq!(v["I"][0], 0.01);
        assert_eq!(v["baseline_I"][0], 0.01);
    }

    #[tokio::test]
    async fn simulate_endpoint_rejects_bad_input() {
        let p = Parameters { transmission_probability: 2.0, ..Parameters::default() };
        let resp = run_simulation(Ok(Json(p))).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = body_json(resp).await;
        assert_eq!(v["return_code"], 1);
    }

    #[tokio::test]
    async fn unknown_band_in_request_body_is_a_bad_request() {
        let resp = post_simulate(r#"{"targeted_age_bands": ["Toddlers"]}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = body_json(resp).await;
        assert_eq!(v["return_code"], 1);
        assert!(v["error"].as_str().unwrap().contains("Toddlers"), "{}", v);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let resp = post_simulate(r#"{"initial_prevalence": "#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["return_code"], 1);
    }

    #[tokio::test]
    async fn stiff_request_completes_on_the_blocking_pool() {
        let resp = post_simulate(r#"{"infection_duration_weeks": 1e-9, "transmission_probability": 0.5}"#).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert!(v["I"][1].as_f64().unwrap() < 1e-12);
    }

    #[tokio::test]
    async fn panicked_worker_maps_to_internal_error() {
        let join = tokio::task::spawn_blocking(|| -> Result<SimulationResult, SimError> { panic!("worker died") }).await;
        let resp = response_for(join);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let v = body_json(resp).await;
        assert_eq!(v["return_code"], 2);
        assert!(v["error"].as_str().unwrap().starts_with("join error"));
    }
}
