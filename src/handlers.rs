use std::sync::Arc;

use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::artifacts::{Artifacts, Classification, Predictor, Transformer};
use crate::error::ApiError;
use crate::models::{FeatureVector, PredictionResponse, UsageResponse};

pub async fn welcome() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body("<h1>Selamat Datang di API DS Model</h1>")
}

pub async fn predict_usage() -> HttpResponse {
    HttpResponse::Ok().json(UsageResponse::new())
}

pub async fn predict(
    artifacts: web::Data<Artifacts>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    // Checked before the payload so every request gets the same answer.
    let model = artifacts
        .model()
        .cloned()
        .ok_or_else(|| ApiError::ModelUnavailable(artifacts.model_path().display().to_string()))?;

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|err| ApiError::InvalidInput(format!("invalid JSON body: {err}")))?;
    let features = FeatureVector::from_json(&payload)?;
    debug!(?features, "prediction request");

    let scaler = artifacts.scaler().cloned();
    let result = web::block(move || classify(model, scaler, features))
        .await
        .map_err(|err| ApiError::Prediction(err.to_string()))??;

    info!(
        label = result.label,
        probabilities = ?result.probabilities,
        "prediction served"
    );

    Ok(HttpResponse::Ok().json(PredictionResponse::new(
        result.label,
        result.probabilities,
        artifacts.model_name(),
    )))
}

fn classify(
    model: Arc<dyn Predictor>,
    scaler: Option<Arc<dyn Transformer>>,
    features: FeatureVector,
) -> Result<Classification, ApiError> {
    let mut matrix = features.to_matrix();
    if let Some(scaler) = scaler {
        matrix = scaler.transform(&matrix).map_err(|err| {
            warn!(error = %err, "scaler transform failed");
            ApiError::ScalerTransform
        })?;
    }
    model
        .classify(&matrix)
        .map_err(|err| ApiError::Prediction(err.to_string()))
}
