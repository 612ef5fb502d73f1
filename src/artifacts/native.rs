//! JSON-serialized artifacts evaluated in-process.
//!
//! ```json
//! {"kind": "knn", "k": 5, "samples": [[...8 values...]], "labels": [0, 1]}
//! {"kind": "standard", "mean": [...], "scale": [...]}
//! ```

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;

use super::{check_shape, Predictor, Transformer};
use crate::error::{ArtifactError, ArtifactResult};
use crate::models::FEATURE_COUNT;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NativeModel {
    /// Euclidean k-nearest neighbours with majority vote.
    Knn {
        k: usize,
        samples: Vec<Vec<f32>>,
        labels: Vec<i64>,
    },
    Logistic {
        weights: Vec<f32>,
        intercept: f32,
    },
    /// Linear decision rule without probability estimates.
    Threshold {
        weights: Vec<f32>,
        intercept: f32,
    },
}

impl NativeModel {
    pub fn load(path: &Path) -> ArtifactResult<Self> {
        let raw = fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: Self = serde_json::from_slice(&raw)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> ArtifactResult<()> {
        match self {
            Self::Knn { k, samples, labels } => {
                if *k == 0 {
                    return Err(ArtifactError::Invalid("knn requires k >= 1".into()));
                }
                if samples.is_empty() {
                    return Err(ArtifactError::Invalid("knn has no samples".into()));
                }
                if samples.len() != labels.len() {
                    return Err(ArtifactError::Invalid(format!(
                        "knn has {} samples but {} labels",
                        samples.len(),
                        labels.len()
                    )));
                }
                if let Some(bad) = labels.iter().find(|label| !matches!(label, 0 | 1)) {
                    return Err(ArtifactError::Invalid(format!(
                        "knn label {bad} is not binary"
                    )));
                }
                samples.iter().try_for_each(|row| expect_width(row.len()))
            }
            Self::Logistic { weights, .. } | Self::Threshold { weights, .. } => {
                expect_width(weights.len())
            }
        }
    }

    fn linear_score(weights: &[f32], intercept: f32, row: ArrayView1<f32>) -> f32 {
        row.iter().zip(weights).map(|(x, w)| x * w).sum::<f32>() + intercept
    }

    /// Share of the `k` nearest samples voting for label 1.
    fn knn_positive_share(
        k: usize,
        samples: &[Vec<f32>],
        labels: &[i64],
        row: ArrayView1<f32>,
    ) -> f32 {
        let mut distances: Vec<(f32, i64)> = samples
            .iter()
            .zip(labels)
            .map(|(sample, &label)| {
                let dist = sample
                    .iter()
                    .zip(row.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f32>();
                (dist, label)
            })
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0));

        let neighbours = k.min(distances.len());
        let positives = distances[..neighbours]
            .iter()
            .filter(|(_, label)| *label == 1)
            .count();
        positives as f32 / neighbours as f32
    }

    fn positive_probability(&self, features: &Array2<f32>) -> Option<f32> {
        let row = features.row(0);
        match self {
            Self::Knn { k, samples, labels } => {
                Some(Self::knn_positive_share(*k, samples, labels, row))
            }
            Self::Logistic { weights, intercept } => {
                let score = Self::linear_score(weights, *intercept, row);
                Some(1.0 / (1.0 + (-score).exp()))
            }
            Self::Threshold { .. } => None,
        }
    }
}

impl Predictor for NativeModel {
    fn predict(&self, features: &Array2<f32>) -> ArtifactResult<i64> {
        check_shape(features)?;
        let positive = self.positive_probability(features).unwrap_or(0.0);
        let label = match self {
            // Ties go to the negative class, matching an argmax over [neg, pos].
            Self::Knn { .. } => (positive > 0.5) as i64,
            Self::Logistic { .. } => (positive >= 0.5) as i64,
            Self::Threshold { weights, intercept } => {
                (Self::linear_score(weights, *intercept, features.row(0)) >= 0.0) as i64
            }
        };
        Ok(label)
    }

    fn predict_proba(&self, features: &Array2<f32>) -> ArtifactResult<Option<[f32; 2]>> {
        check_shape(features)?;
        Ok(self
            .positive_probability(features)
            .map(|positive| [1.0 - positive, positive]))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NativeScaler {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f32>, scale: Vec<f32> },
    /// `(x - min) / (max - min)`
    MinMax { min: Vec<f32>, max: Vec<f32> },
}

impl NativeScaler {
    pub fn load(path: &Path) -> ArtifactResult<Self> {
        let raw = fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scaler: Self = serde_json::from_slice(&raw)?;
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn validate(&self) -> ArtifactResult<()> {
        let (offset, divisor) = self.offset_and_divisor();
        expect_width(offset.len())?;
        expect_width(divisor.len())?;
        if let Some(col) = divisor.iter().position(|d| !(d.is_finite() && *d > 0.0)) {
            return Err(ArtifactError::Invalid(format!(
                "scaler range for column {col} must be positive"
            )));
        }
        Ok(())
    }

    fn offset_and_divisor(&self) -> (Array1<f32>, Array1<f32>) {
        match self {
            Self::Standard { mean, scale } => {
                (Array1::from(mean.clone()), Array1::from(scale.clone()))
            }
            Self::MinMax { min, max } => {
                let min = Array1::from(min.clone());
                let range = Array1::from(max.clone()) - &min;
                (min, range)
            }
        }
    }
}

impl Transformer for NativeScaler {
    fn transform(&self, features: &Array2<f32>) -> ArtifactResult<Array2<f32>> {
        check_shape(features)?;
        let (offset, divisor) = self.offset_and_divisor();
        let scaled = (features - &offset) / &divisor;
        if scaled.iter().any(|v| !v.is_finite()) {
            return Err(ArtifactError::Invalid("scaled features are not finite".into()));
        }
        Ok(scaled)
    }
}

fn expect_width(actual: usize) -> ArtifactResult<()> {
    if actual == FEATURE_COUNT {
        Ok(())
    } else {
        Err(ArtifactError::Shape {
            expected: FEATURE_COUNT,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: [f32; FEATURE_COUNT]) -> Array2<f32> {
        Array2::from_shape_vec((1, FEATURE_COUNT), values.to_vec()).expect("shape")
    }

    fn knn(k: usize) -> NativeModel {
        serde_json::from_str(&format!(
            r#"{{"kind":"knn","k":{k},
                "samples":[[0,0,0,0,0,0,0,0],[1,0,0,0,0,0,0,0],[10,0,0,0,0,0,0,0],[11,0,0,0,0,0,0,0],[12,0,0,0,0,0,0,0]],
                "labels":[0,0,1,1,1]}}"#
        ))
        .expect("knn json")
    }

    #[test]
    fn knn_votes_among_nearest_samples() {
        let model = knn(3);
        model.validate().expect("valid");

        let near_positive = row([11.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(model.predict(&near_positive).unwrap(), 1);
        assert_eq!(model.predict_proba(&near_positive).unwrap(), Some([0.0, 1.0]));

        let near_negative = row([0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(model.predict(&near_negative).unwrap(), 0);
        let [neg, pos] = model.predict_proba(&near_negative).unwrap().unwrap();
        assert!((neg - 2.0 / 3.0).abs() < 1e-6);
        assert!((pos - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn knn_tie_goes_to_negative_class() {
        let model = knn(4);
        // Nearest four: 1 (label 0), 0 (label 0), 10, 11 (label 1).
        let between = row([5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(model.predict(&between).unwrap(), 0);
        assert_eq!(model.predict_proba(&between).unwrap(), Some([0.5, 0.5]));
    }

    #[test]
    fn knn_validation_catches_bad_artifacts() {
        let zero_k = NativeModel::Knn {
            k: 0,
            samples: vec![vec![0.0; FEATURE_COUNT]],
            labels: vec![0],
        };
        assert!(zero_k.validate().is_err());

        let mismatched = NativeModel::Knn {
            k: 1,
            samples: vec![vec![0.0; FEATURE_COUNT]],
            labels: vec![0, 1],
        };
        assert!(mismatched.validate().is_err());

        let narrow = NativeModel::Knn {
            k: 1,
            samples: vec![vec![0.0; 3]],
            labels: vec![1],
        };
        assert!(matches!(narrow.validate(), Err(ArtifactError::Shape { actual: 3, .. })));

        let multiclass = NativeModel::Knn {
            k: 1,
            samples: vec![vec![0.0; FEATURE_COUNT]],
            labels: vec![2],
        };
        assert!(multiclass.validate().is_err());
    }

    #[test]
    fn logistic_probabilities_sum_to_one() {
        let model = NativeModel::Logistic {
            weights: vec![0.0, 0.05, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            intercept: -6.0,
        };
        let features = row([0.0, 120.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        // score == 0 -> exactly 0.5 -> positive
        assert_eq!(model.predict(&features).unwrap(), 1);
        let [neg, pos] = model.predict_proba(&features).unwrap().unwrap();
        assert!((neg + pos - 1.0).abs() < 1e-6);
        assert!((pos - 0.5).abs() < 1e-6);
    }

    #[test]
    fn threshold_model_has_no_probabilities() {
        let model = NativeModel::Threshold {
            weights: vec![1.0; FEATURE_COUNT],
            intercept: -10.0,
        };
        let features = row([1.0; FEATURE_COUNT]);
        assert_eq!(model.predict(&features).unwrap(), 0);
        assert_eq!(model.predict_proba(&features).unwrap(), None);
        let classified = model.classify(&features).unwrap();
        assert_eq!(classified.probabilities, None);
    }

    #[test]
    fn standard_scaler_centres_and_scales() {
        let scaler = NativeScaler::Standard {
            mean: vec![1.0; FEATURE_COUNT],
            scale: vec![2.0; FEATURE_COUNT],
        };
        scaler.validate().expect("valid");
        let out = scaler.transform(&row([5.0; FEATURE_COUNT])).unwrap();
        assert!(out.iter().all(|v| (*v - 2.0).abs() < 1e-6));
    }

    #[test]
    fn minmax_scaler_maps_range_to_unit() {
        let scaler: NativeScaler = serde_json::from_str(
            r#"{"kind":"minmax","min":[0,0,0,0,0,0,0,0],"max":[10,10,10,10,10,10,10,10]}"#,
        )
        .expect("minmax json");
        let out = scaler.transform(&row([5.0; FEATURE_COUNT])).unwrap();
        assert!(out.iter().all(|v| (*v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn scaler_rejects_zero_scale_and_wrong_width() {
        let zero = NativeScaler::Standard {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![0.0; FEATURE_COUNT],
        };
        assert!(zero.validate().is_err());

        let scaler = NativeScaler::Standard {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        };
        let wide = Array2::<f32>::zeros((1, FEATURE_COUNT + 1));
        assert!(scaler.transform(&wide).is_err());
    }
}
