//! The web server variant.
//!
//! Callers may supply either a concrete brand or an abstract brand tier;
//! tiers are resolved to a representative brand through the bucket table
//! and the chosen brand is echoed back. The feature vector is
//! `[category, material, brand, price]`.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::brands::BrandTier;
use crate::error::RewearError;
use crate::server::{
    AppState, error_response, health_handler, model_not_loaded, prediction_error, run_prediction,
};

/// Body of `POST /predict`. One of `brand` / `brand_type` must be
/// given; a missing price counts as 0.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub category: String,
    pub material: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub brand_type: Option<String>,
    #[serde(default)]
    pub price: f64,
}

/// Response of `POST /predict`, including the brand the prediction was
/// made for (resolved from the tier when no brand was given).
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: Vec<i64>,
    pub probability: Option<Vec<Vec<f64>>>,
    pub chosen_brand: String,
}

/// Build the web-variant router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .with_state(state)
}

/// Predict the usability class for one item, resolving the brand first.
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

    let chosen_brand = match resolve_brand(&state, &req) {
        Ok(brand) => brand,
        Err(err) => return prediction_error(err),
    };
    debug!(brand = %chosen_brand, "brand resolved");

    match run_prediction(
        bundle,
        &req.category,
        &req.material,
        &chosen_brand,
        req.price,
        None,
    ) {
        Ok(prediction) => (
            StatusCode::OK,
            Json(PredictResponse {
                prediction: vec![prediction.class as i64],
                probability: Some(vec![prediction.proba]),
                chosen_brand,
            }),
        )
            .into_response(),
        Err(err) => prediction_error(err),
    }
}

/// An explicit brand wins; otherwise the tier named by `brand_type` is
/// resolved through the bucket table.
fn resolve_brand(state: &AppState, req: &PredictRequest) -> crate::error::Result<String> {
    if let Some(brand) = req.brand.as_deref().filter(|b| !b.is_empty()) {
        return Ok(brand.to_string());
    }

    let tier_name = req
        .brand_type
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RewearError::invalid_argument("either brand or brand_type is required"))?;

    let tier: BrandTier = tier_name.parse()?;
    state
        .buckets
        .resolve(tier)
        .map(|brand| brand.to_string())
        .ok_or_else(|| {
            RewearError::invalid_argument(format!("no known brands for brand_type {tier}"))
        })
}

#[cfg(test)]
mod tests {
    use crate::brands::BrandBucketTable;

    use super::*;

    fn request(brand: Option<&str>, brand_type: Option<&str>) -> PredictRequest {
        PredictRequest {
            category: "Shirt".to_string(),
            material: "Cotton".to_string(),
            brand: brand.map(str::to_string),
            brand_type: brand_type.map(str::to_string),
            price: 10.0,
        }
    }

    fn state() -> AppState {
        let buckets = BrandBucketTable::from_observations([
            ("Cheapo", 10.0),
            ("Middling", 20.0),
            ("Verdant", 30.0),
            ("Gilded", 40.0),
        ]);
        AppState::new(None, buckets)
    }

    #[test]
    fn test_explicit_brand_wins() {
        let brand = resolve_brand(&state(), &request(Some("Acme"), Some("luxury"))).unwrap();
        assert_eq!(brand, "Acme");
    }

    #[test]
    fn test_tier_resolves_through_buckets() {
        let brand = resolve_brand(&state(), &request(None, Some("luxury"))).unwrap();
        assert_eq!(brand, "Gilded");

        // Hyphens and case are tolerated, as in encoder lookups.
        let brand = resolve_brand(&state(), &request(None, Some("Fast-Fashion"))).unwrap();
        assert_eq!(brand, "Cheapo");
    }

    #[test]
    fn test_missing_brand_and_tier_is_an_error() {
        let err = resolve_brand(&state(), &request(None, None)).unwrap_err();
        assert!(err.to_string().contains("brand or brand_type"));
    }

    #[test]
    fn test_unknown_tier_is_an_error() {
        let err = resolve_brand(&state(), &request(None, Some("bespoke"))).unwrap_err();
        assert_eq!(err.to_string(), "Unknown brand_type label: bespoke");
    }

    #[test]
    fn test_empty_buckets_cannot_resolve() {
        let state = AppState::new(None, BrandBucketTable::empty());
        let err = resolve_brand(&state, &request(None, Some("luxury"))).unwrap_err();
        assert!(err.to_string().contains("no known brands"));
    }
}
