//! The api server variant.
//!
//! Callers supply a concrete brand and the expected wear frequency; the
//! feature vector is `[category, material, brand, price,
//! wear_frequency]`.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};

use crate::server::{
    AppState, error_response, health_handler, model_not_loaded, prediction_error, run_prediction,
};

/// Body of `POST /predict`. All fields are required.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub category: String,
    pub material: String,
    pub brand: String,
    pub price: f64,
    pub expected_wear_frequency: f64,
}

/// Response of `POST /predict`: the raw class code and the probability
/// matrix, both shaped for a single row.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: Vec<i64>,
    pub probability: Option<Vec<Vec<f64>>>,
}

/// Build the api-variant router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .with_state(state)
}

/// Predict the usability class for one item.
pub async fn predict_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    let Some(bundle) = state.bundle.as_ref() else {
        return model_not_loaded();
    };

    match run_prediction(
        bundle,
        &req.category,
        &req.material,
        &req.brand,
        req.price,
        Some(req.expected_wear_frequency),
    ) {
        Ok(prediction) => (
            StatusCode::OK,
            Json(PredictResponse {
                prediction: vec![prediction.class as i64],
                probability: Some(vec![prediction.proba]),
            }),
        )
            .into_response(),
        Err(err) => prediction_error(err),
    }
}
