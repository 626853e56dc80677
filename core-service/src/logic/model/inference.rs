//! Inference Engine - ONNX Runtime Integration
//!
//! Loads an exported gradient-boosted classifier plus its JSON metadata
//! sidecar and exposes raw class probabilities.
//! The `ProbabilityModel` trait is the seam the backend talks to, so tests
//! can swap in fakes without an ONNX file.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::types::ClassOrder;
use crate::logic::error::ModelError;
use crate::logic::features::layout::{hash_names, layout_hash, FEATURE_VERSION};

// ============================================================================
// MODEL TRAIT
// ============================================================================

/// Anything that maps an aligned feature row to two class probabilities
pub trait ProbabilityModel: Send + Sync {
    fn name(&self) -> &str;

    /// Feature order the model was trained with
    fn feature_names(&self) -> &[String];

    /// Column order of `predict_raw`
    fn class_order(&self) -> ClassOrder;

    /// Raw probabilities in the model's own column order
    fn predict_raw(&self, row: &[f32]) -> Result<[f32; 2], ModelError>;

    /// Global importance per feature, aligned with `feature_names`
    fn feature_importance(&self) -> Option<&[f32]> {
        None
    }
}

// ============================================================================
// METADATA SIDECAR
// ============================================================================

/// `<model>.json` next to the ONNX file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub feature_names: Vec<String>,
    /// Class labels in output column order
    #[serde(default = "default_classes")]
    pub classes: Vec<serde_json::Value>,
    /// Which class label means phishing
    #[serde(default = "default_phishing_class")]
    pub phishing_class: serde_json::Value,
    #[serde(default = "default_model_type")]
    pub model_type: String,
    /// Output tensor holding probabilities; defaults to the last output
    #[serde(default)]
    pub probability_output: Option<String>,
    #[serde(default)]
    pub feature_importance: Option<Vec<f32>>,
    #[serde(default)]
    pub layout_hash: Option<u32>,
}

fn default_classes() -> Vec<serde_json::Value> {
    vec![serde_json::json!(0), serde_json::json!(1)]
}

fn default_phishing_class() -> serde_json::Value {
    serde_json::json!(0)
}

fn default_model_type() -> String {
    "xgboost".to_string()
}

fn label_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl ModelMetadata {
    pub fn class_labels(&self) -> Vec<String> {
        self.classes.iter().map(label_string).collect()
    }

    pub fn class_order(&self) -> Result<ClassOrder, ModelError> {
        ClassOrder::detect(&self.class_labels(), &label_string(&self.phishing_class))
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.feature_names.is_empty() {
            return Err(ModelError::Metadata("feature_names is empty".to_string()));
        }
        if let Some(importance) = &self.feature_importance {
            if importance.len() != self.feature_names.len() {
                return Err(ModelError::Metadata(format!(
                    "feature_importance has {} entries for {} features",
                    importance.len(),
                    self.feature_names.len()
                )));
            }
        }
        Ok(())
    }
}

/// Sidecar path for a model file (`x.onnx` -> `x.json`)
pub fn metadata_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("json")
}

pub fn load_metadata(path: &Path) -> Result<ModelMetadata, ModelError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ModelError::Metadata(format!("Failed to read {}: {}", path.display(), e)))?;

    let metadata: ModelMetadata = serde_json::from_str(&content)
        .map_err(|e| ModelError::Metadata(format!("Failed to parse {}: {}", path.display(), e)))?;

    metadata.validate()?;
    Ok(metadata)
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

pub struct OnnxModel {
    name: String,
    session: Mutex<Session>,
    output_name: String,
    metadata: ModelMetadata,
    class_order: ClassOrder,
}

impl OnnxModel {
    /// Load ONNX model and its metadata sidecar
    pub fn load(model_path: &Path) -> Result<Self, ModelError> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(ModelError::NotFound(model_path.display().to_string()));
        }

        let metadata = load_metadata(&metadata_path(model_path))?;
        let class_order = metadata.class_order()?;

        let layout = hash_names(FEATURE_VERSION, metadata.feature_names.iter().map(String::as_str));
        match metadata.layout_hash {
            Some(declared) if declared != layout => {
                log::warn!("Model layout hash {:08x} does not match its feature list ({:08x})", declared, layout);
            }
            _ => {}
        }
        if layout != layout_hash() {
            log::info!("Model uses its own feature order ({} features); vectors are aligned by name", metadata.feature_names.len());
        }

        let session = Session::builder()
            .map_err(|e| ModelError::Load(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Load(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| ModelError::Load(format!("Failed to load model: {}", e)))?;

        let output_name = match &metadata.probability_output {
            Some(name) => name.clone(),
            None => session.outputs.last()
                .map(|o| o.name.clone())
                .ok_or_else(|| ModelError::Load("No output defined".to_string()))?,
        };

        log::info!("Model class labels: {:?} -> {}", metadata.class_labels(), class_order.describe());

        Ok(Self {
            name: model_path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "onnx".to_string()),
            session: Mutex::new(session),
            output_name,
            metadata,
            class_order,
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl ProbabilityModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.metadata.feature_names
    }

    fn class_order(&self) -> ClassOrder {
        self.class_order
    }

    fn feature_importance(&self) -> Option<&[f32]> {
        self.metadata.feature_importance.as_deref()
    }

    fn predict_raw(&self, row: &[f32]) -> Result<[f32; 2], ModelError> {
        let input = Array2::<f32>::from_shape_vec((1, row.len()), row.to_vec())
            .map_err(|e| ModelError::Inference(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input)
            .map_err(|e| ModelError::Inference(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![input_tensor])
            .map_err(|e| ModelError::Inference(format!("Inference failed: {}", e)))?;

        let output = outputs.get(&self.output_name)
            .ok_or_else(|| ModelError::Inference(format!("No output '{}'", self.output_name)))?;

        let tensor = output.try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(format!("Extract error: {}", e)))?;

        let data = tensor.1;
        match data {
            [a, b, ..] => Ok([*a, *b]),
            // single column means P(second class)
            [p] => Ok([1.0 - *p, *p]),
            [] => Err(ModelError::Inference("Empty output".to_string())),
        }
    }
}
