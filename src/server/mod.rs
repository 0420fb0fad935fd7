//! HTTP prediction servers.
//!
//! Two near-duplicate variants share this module's state and plumbing:
//! [`api`] (explicit brand, wear frequency in the feature vector) and
//! [`web`] (brand-or-tier resolution via the bucket table). Both expose
//! `GET /health` and `POST /predict`.
//!
//! All shared state is read-only after startup: the artifact bundle and
//! the bucket table are built once, wrapped in an [`Arc`], and handed to
//! every handler. A failed artifact load degrades the server to a
//! "model not loaded" state instead of aborting it.

pub mod api;
pub mod web;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::artifacts::{ArtifactBundle, ArtifactStore};
use crate::brands::BrandBucketTable;
use crate::error::{Result, RewearError};
use crate::features::FeatureProfile;

/// Immutable state shared by all handlers of a server process.
pub struct AppState {
    /// Loaded artifacts, or `None` if loading failed at startup.
    pub bundle: Option<ArtifactBundle>,
    /// Brand bucket table (empty for the api variant).
    pub buckets: BrandBucketTable,
}

impl AppState {
    /// Build the state a server runs with.
    pub fn new(bundle: Option<ArtifactBundle>, buckets: BrandBucketTable) -> Self {
        AppState { bundle, buckets }
    }

    /// Whether a usable model is loaded.
    pub fn model_loaded(&self) -> bool {
        self.bundle.is_some()
    }
}

/// Load artifacts for a server expecting `profile`.
///
/// Any failure is logged with its tagged cause (missing vs corrupt vs
/// wrong profile) and yields a state without a model; `/health` then
/// reports `model_loaded: false` and predictions answer 500.
pub fn load_state(
    store: &ArtifactStore,
    profile: FeatureProfile,
    buckets: BrandBucketTable,
) -> Arc<AppState> {
    let bundle = match store.load() {
        Ok(bundle) => match bundle.model.metadata() {
            Some(meta) if meta.profile == profile => {
                info!(
                    profile = %profile,
                    classes = meta.n_classes,
                    trained_at = %meta.trained_at,
                    "model loaded"
                );
                Some(bundle)
            }
            Some(meta) => {
                warn!(
                    expected = %profile,
                    found = %meta.profile,
                    "model trained with a different feature profile; serving without a model"
                );
                None
            }
            None => {
                warn!("model artifact is untrained; serving without a model");
                None
            }
        },
        Err(err @ RewearError::ArtifactMissing { .. }) => {
            warn!(error = %err, "artifacts not found; serving without a model");
            None
        }
        Err(err) => {
            error!(error = %err, "failed to load artifacts; serving without a model");
            None
        }
    };

    Arc::new(AppState::new(bundle, buckets))
}

/// Payload of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
}

/// Health check handler. Never fails, with or without a model.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: state.model_loaded(),
    })
}

/// One prediction: the raw class code and the probability distribution.
pub(crate) struct Prediction {
    pub class: usize,
    pub proba: Vec<f64>,
}

/// Encode the categorical fields, assemble the feature vector in the
/// model's training order, and invoke the classifier.
pub(crate) fn run_prediction(
    bundle: &ArtifactBundle,
    category: &str,
    material: &str,
    brand: &str,
    price: f64,
    wear_frequency: Option<f64>,
) -> Result<Prediction> {
    let profile = bundle
        .model
        .metadata()
        .ok_or(RewearError::ModelNotTrained)?
        .profile;

    let category = bundle.encoders.category.encode(category)?;
    let material = bundle.encoders.material.encode(material)?;
    let brand = bundle.encoders.brand.encode(brand)?;

    let features = profile.request_vector(category, material, brand, price, wear_frequency)?;
    let class = bundle.model.predict(&features)?;
    let proba = bundle.model.predict_proba(&features)?;

    Ok(Prediction { class, proba })
}

/// JSON error payload `{"error": ...}` with the given status.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// 500 response for a server running without a model.
pub(crate) fn model_not_loaded() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Model not loaded")
}

/// Map a prediction-path error onto an HTTP response: everything caused
/// by the request payload is a 400 carrying the error message.
pub(crate) fn prediction_error(err: RewearError) -> Response {
    match err {
        RewearError::ModelNotTrained => model_not_loaded(),
        other => error_response(StatusCode::BAD_REQUEST, &other.to_string()),
    }
}

/// Bind and serve a router until the process is terminated.
pub async fn serve(router: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    async fn json_body(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_without_artifacts_reports_not_loaded() {
        for app in [
            api::router(Arc::new(AppState::new(None, BrandBucketTable::empty()))),
            web::router(Arc::new(AppState::new(None, BrandBucketTable::empty()))),
        ] {
            let resp = app
                .oneshot(Request::get("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);

            let body = json_body(resp).await;
            assert_eq!(body["status"], "ok");
            assert_eq!(body["model_loaded"], false);
        }
    }

    #[tokio::test]
    async fn test_predict_without_model_is_a_500() {
        let app = api::router(Arc::new(AppState::new(None, BrandBucketTable::empty())));
        let req = Request::post("/predict")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"category":"Shirt","material":"Cotton","brand":"Acme","price":10.0,"expected_wear_frequency":2.0}"#,
            ))
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(resp).await;
        assert_eq!(body["error"], "Model not loaded");
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_400() {
        let app = api::router(Arc::new(AppState::new(None, BrandBucketTable::empty())));
        let req = Request::post("/predict")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
