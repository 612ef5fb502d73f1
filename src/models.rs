use ndarray::Array2;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Column order of the feature matrix handed to scalers and models.
pub const FEATURE_NAMES: [&str; 8] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// One patient's inputs, in `FEATURE_NAMES` order, at the `f32` precision
/// artifacts run with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f32; FEATURE_COUNT],
}

impl FeatureVector {
    /// Reads every required key from a JSON object. Unknown keys are ignored.
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let object = body.as_object().ok_or_else(|| {
            ApiError::InvalidInput("request body must be a JSON object".to_string())
        })?;

        let mut values = [0.0; FEATURE_COUNT];
        for (slot, name) in values.iter_mut().zip(FEATURE_NAMES) {
            let raw = object.get(name).ok_or_else(|| {
                ApiError::InvalidInput(format!("missing required key: '{name}'"))
            })?;
            let number = raw.as_f64().ok_or_else(|| {
                ApiError::InvalidInput(format!("'{name}' must be a number, got {raw}"))
            })?;
            // Values beyond f32 range would reach the model as infinities.
            let narrowed = number as f32;
            if !narrowed.is_finite() {
                return Err(ApiError::InvalidInput(format!("'{name}' is out of range")));
            }
            *slot = narrowed;
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f32; FEATURE_COUNT] {
        &self.values
    }

    /// Single-row `1 x FEATURE_COUNT` matrix, the shape artifacts expect.
    pub fn to_matrix(&self) -> Array2<f32> {
        Array2::from_shape_fn((1, FEATURE_COUNT), |(_, col)| self.values[col])
    }
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub message: String,
}

impl UsageResponse {
    pub fn new() -> Self {
        Self {
            message: format!(
                "Send a POST request to this endpoint with JSON body containing the following keys: {}",
                FEATURE_NAMES.join(", ")
            ),
        }
    }
}

impl Default for UsageResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentages rendered as `"12.34%"`, or `"unavailable"` when the model
/// cannot report class probabilities.
#[derive(Debug, Serialize, PartialEq)]
pub struct Probabilities {
    pub negative: String,
    pub positive: String,
}

pub const PROBABILITY_UNAVAILABLE: &str = "unavailable";

impl Probabilities {
    pub fn from_pair(pair: Option<[f32; 2]>) -> Self {
        match pair {
            Some([negative, positive]) => Self {
                negative: format_percent(negative),
                positive: format_percent(positive),
            },
            None => Self {
                negative: PROBABILITY_UNAVAILABLE.to_string(),
                positive: PROBABILITY_UNAVAILABLE.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: String,
    pub probabilities: Probabilities,
}

impl PredictionResponse {
    pub fn new(label: i64, probabilities: Option<[f32; 2]>, model_name: &str) -> Self {
        Self {
            prediction: prediction_message(label, probabilities, model_name),
            probabilities: Probabilities::from_pair(probabilities),
        }
    }
}

pub const LOW_RISK_MESSAGE: &str =
    "Hasil prediksi menunjukkan Anda kemungkinan rendah terkena diabetes.";

fn prediction_message(label: i64, probabilities: Option<[f32; 2]>, model_name: &str) -> String {
    if label != 1 {
        return LOW_RISK_MESSAGE.to_string();
    }
    let lead =
        format!("Anda memiliki peluang menderita diabetes berdasarkan model {model_name} kami.");
    match probabilities {
        Some([_, positive]) => format!(
            "{lead} Kemungkinan menderita diabetes adalah {}.",
            format_percent(positive)
        ),
        None => lead,
    }
}

fn format_percent(probability: f32) -> String {
    format!("{:.2}%", f64::from(probability) * 100.0)
}
