use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use degree_planner::error::AppError;
use degree_planner::planning::{
    planner_router, AcademicRecords, CatalogSummary, DegreePlannerService, PlannerServiceError,
    PrerequisiteStore,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_planner_routes<R, P>(service: Arc<DegreePlannerService<R, P>>) -> axum::Router
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    planner_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/catalog/summary",
            axum::routing::get(catalog_summary_endpoint),
        )
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

/// Row counts of the loaded catalog, handy for checking what a deployment was seeded with.
pub(crate) async fn catalog_summary_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<CatalogSummary>, AppError> {
    let summary = state
        .records
        .summary()
        .map_err(PlannerServiceError::from)?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{CatalogArgs, PlannerBackend};
    use axum::body::Body;
    use axum::http::Request;
    use degree_planner::config::PlannerConfig;
    use degree_planner::planning::{CourseId, CourseRef};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(ready: bool) -> (axum::Router, Arc<AtomicBool>) {
        let planner = PlannerConfig::default();
        let backend = PlannerBackend::load(&CatalogArgs::default(), &planner).expect("backend");
        backend
            .records
            .insert_course(CourseRef::new(CourseId(1), "CS", "101", 3))
            .expect("course inserted");

        let readiness = Arc::new(AtomicBool::new(ready));
        let state = AppState {
            readiness: readiness.clone(),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            records: backend.records.clone(),
        };
        let router =
            with_planner_routes(Arc::new(backend.service(&planner))).layer(Extension(state));
        (router, readiness)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("request builds")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let (router, _) = app(true);
        let response = router.oneshot(get("/health")).await.expect("responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_follows_the_startup_flag() {
        let (router, readiness) = app(false);
        let response = router.clone().oneshot(get("/ready")).await.expect("responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        readiness.store(true, Ordering::Release);
        let response = router.oneshot(get("/ready")).await.expect("responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ready");
    }

    #[tokio::test]
    async fn catalog_summary_counts_loaded_rows() {
        let (router, _) = app(true);
        let response = router
            .oneshot(get("/api/v1/catalog/summary"))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["courses"], 1);
        assert_eq!(body["students"], 0);
    }

    #[tokio::test]
    async fn planner_routes_are_mounted() {
        let (router, _) = app(true);
        let response = router
            .oneshot(get("/api/v1/students/9/eligible-courses"))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"], "student 9 not found");
    }
}
