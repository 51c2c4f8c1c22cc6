use crate::infra::AppState;
use appraisal::workflows::appraisal::{
    appraisal_router, AppraisalRepository, AppraisalService, Rubric,
};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_appraisal_routes<R>(service: Arc<AppraisalService<R>>) -> axum::Router
where
    R: AppraisalRepository + 'static,
{
    let rubric = axum::Router::new()
        .route("/api/v1/rubric", axum::routing::get(rubric_endpoint::<R>))
        .with_state(service.clone());

    appraisal_router(service)
        .merge(rubric)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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

/// Rubric tables the engine is scoring with, for form builders.
pub(crate) async fn rubric_endpoint<R>(
    State(service): State<Arc<AppraisalService<R>>>,
) -> Json<Rubric>
where
    R: AppraisalRepository + 'static,
{
    Json(service.engine().rubric().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryAppraisalRepository;
    use appraisal::workflows::appraisal::AppraisalSettings;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn service() -> Arc<AppraisalService<InMemoryAppraisalRepository>> {
        Arc::new(AppraisalService::new(
            Arc::new(InMemoryAppraisalRepository::default()),
            AppraisalSettings::default(),
        ))
    }

    fn state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (
            status,
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null),
        )
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_tracks_the_flag() {
        let app = with_appraisal_routes(service()).layer(Extension(state(false)));
        let (status, body) = get(app, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        let app = with_appraisal_routes(service()).layer(Extension(state(true)));
        let (status, _) = get(app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn rubric_endpoint_lists_every_form() {
        let app = with_appraisal_routes(service()).layer(Extension(state(true)));
        let (status, body) = get(app, "/api/v1/rubric").await;

        assert_eq!(status, StatusCode::OK);
        let forms = body["forms"].as_object().expect("forms object");
        assert_eq!(forms.len(), 3);
        assert_eq!(forms["research"]["sections"].as_array().map(Vec::len), Some(17));
        assert_eq!(
            forms["teaching"]["cadre_multipliers"]["Professor"],
            json!(0.68)
        );
    }

    #[tokio::test]
    async fn appraisal_routes_are_mounted() {
        let app = with_appraisal_routes(service()).layer(Extension(state(true)));
        let (status, _) = get(app, "/api/v1/appraisals/CSE/nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
