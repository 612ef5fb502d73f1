//! ONNX artifacts executed with tract.
//!
//! Classifiers are expected as exported by skl2onnx with ZipMap disabled:
//! output 0 holds the label, output 1 (when present) a `[1, 2]` probability
//! tensor. Scalers map `float[1, 8]` to `float[1, 8]`.

use std::path::Path;

use ndarray::Array2;
use tract_core::prelude::{Tensor, TractError};
use tract_onnx::prelude::*;

use super::{check_shape, Classification, Predictor, Transformer};
use crate::error::{ArtifactError, ArtifactResult};
use crate::models::FEATURE_COUNT;

type Plan = TypedRunnableModel<TypedModel>;

fn onnx_err(err: TractError) -> ArtifactError {
    ArtifactError::Onnx(format!("{err:#}"))
}

fn load_plan(path: &Path) -> ArtifactResult<Plan> {
    tract_onnx::onnx()
        .model_for_path(path)
        .and_then(|model| {
            model.with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, FEATURE_COUNT)),
            )
        })
        .and_then(|model| model.into_optimized())
        .and_then(|model| model.into_runnable())
        .map_err(onnx_err)
}

fn run(plan: &Plan, features: &Array2<f32>) -> ArtifactResult<TVec<TValue>> {
    check_shape(features)?;
    let data: Vec<f32> = features.iter().copied().collect();
    let input = Tensor::from_shape(&[1, FEATURE_COUNT], data.as_slice()).map_err(onnx_err)?;
    plan.run(tvec!(input.into())).map_err(onnx_err)
}

fn output(outputs: &TVec<TValue>, index: usize) -> ArtifactResult<&TValue> {
    outputs.get(index).ok_or_else(|| {
        ArtifactError::Invalid(format!("model produced no output #{index}"))
    })
}

pub struct OnnxClassifier {
    plan: Plan,
    has_proba: bool,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> ArtifactResult<Self> {
        let plan = load_plan(path)?;
        let has_proba = plan.model().outputs.len() > 1;
        Ok(Self { plan, has_proba })
    }

    fn label(outputs: &TVec<TValue>) -> ArtifactResult<i64> {
        let labels = output(outputs, 0)?.cast_to::<i64>().map_err(onnx_err)?;
        let labels = labels.as_slice::<i64>().map_err(onnx_err)?;
        labels
            .first()
            .copied()
            .ok_or_else(|| ArtifactError::Invalid("model returned an empty label tensor".into()))
    }

    fn probabilities(outputs: &TVec<TValue>) -> ArtifactResult<[f32; 2]> {
        let probs = output(outputs, 1)?.cast_to::<f32>().map_err(onnx_err)?;
        match probs.as_slice::<f32>().map_err(onnx_err)? {
            [negative, positive, ..] => Ok([*negative, *positive]),
            other => Err(ArtifactError::Invalid(format!(
                "expected two class probabilities, got {}",
                other.len()
            ))),
        }
    }
}

impl Predictor for OnnxClassifier {
    fn predict(&self, features: &Array2<f32>) -> ArtifactResult<i64> {
        Self::label(&run(&self.plan, features)?)
    }

    fn predict_proba(&self, features: &Array2<f32>) -> ArtifactResult<Option<[f32; 2]>> {
        if !self.has_proba {
            return Ok(None);
        }
        Self::probabilities(&run(&self.plan, features)?).map(Some)
    }

    // One graph run yields both outputs.
    fn classify(&self, features: &Array2<f32>) -> ArtifactResult<Classification> {
        let outputs = run(&self.plan, features)?;
        let probabilities = if self.has_proba {
            Some(Self::probabilities(&outputs)?)
        } else {
            None
        };
        Ok(Classification {
            label: Self::label(&outputs)?,
            probabilities,
        })
    }
}

pub struct OnnxScaler {
    plan: Plan,
}

impl OnnxScaler {
    pub fn load(path: &Path) -> ArtifactResult<Self> {
        Ok(Self {
            plan: load_plan(path)?,
        })
    }
}

impl Transformer for OnnxScaler {
    fn transform(&self, features: &Array2<f32>) -> ArtifactResult<Array2<f32>> {
        let outputs = run(&self.plan, features)?;
        let scaled = output(&outputs, 0)?.cast_to::<f32>().map_err(onnx_err)?;
        let values = scaled.as_slice::<f32>().map_err(onnx_err)?.to_vec();
        let width = values.len();
        Array2::from_shape_vec((1, width), values)
            .map_err(|err| ArtifactError::Invalid(err.to_string()))
            .and_then(|scaled| {
                check_shape(&scaled)?;
                Ok(scaled)
            })
    }
}
