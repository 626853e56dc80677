//! Classifier Backend
//!
//! Owns the trained model and the rule engine, and decides which one
//! scores. The decision is made by the health check and published as a
//! `Backend` value; callers only ever see `Scorer::score`.
//!
//! Health check: all-zero, all-one and random rows. If the phishing
//! probability barely moves across them the model is degenerate and every
//! request is served by the rule engine from then on.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::fallback::RuleEngine;
use super::inference::{OnnxModel, ProbabilityModel};
use super::types::{check_threshold, ClassifierVerdict, ModelMode};
use crate::logic::error::{Degradation, ModelError};
use crate::logic::features::FeatureVector;

/// Minimum probability spread across check rows for a healthy model
pub const DEGENERACY_EPSILON: f32 = 0.001;

// ============================================================================
// SCORER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    Model,
    RuleBased,
}

impl ScoringMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::RuleBased => "rule_based",
        }
    }
}

/// Common contract of the trained classifier and the rule engine
pub trait Scorer: Send + Sync {
    fn score(&self, features: &FeatureVector, threshold: f32) -> Result<ClassifierVerdict, ModelError>;
    fn method(&self) -> ScoringMethod;
}

impl Scorer for RuleEngine {
    fn score(&self, features: &FeatureVector, threshold: f32) -> Result<ClassifierVerdict, ModelError> {
        RuleEngine::score(self, features, threshold)
    }

    fn method(&self) -> ScoringMethod {
        ScoringMethod::RuleBased
    }
}

/// A loaded model plus the mode it came from
pub struct TrainedModel {
    pub model: Arc<dyn ProbabilityModel>,
    pub mode: ModelMode,
}

impl TrainedModel {
    /// Phishing probability, columns already normalized
    pub fn phishing_probability(&self, row: &[f32]) -> Result<f32, ModelError> {
        let raw = self.model.predict_raw(row)?;
        let (phishing, legitimate) = self.model.class_order().normalize(raw);
        Ok(ClassifierVerdict::from_pair(phishing, legitimate, 1.0).phishing_probability)
    }

    pub fn align(&self, features: &FeatureVector) -> Vec<f32> {
        features.aligned(self.model.feature_names())
    }
}

impl Scorer for TrainedModel {
    fn score(&self, features: &FeatureVector, threshold: f32) -> Result<ClassifierVerdict, ModelError> {
        let threshold = check_threshold(threshold)?;
        let raw = self.model.predict_raw(&self.align(features))?;
        let (phishing, legitimate) = self.model.class_order().normalize(raw);
        Ok(ClassifierVerdict::from_pair(phishing, legitimate, threshold))
    }

    fn method(&self) -> ScoringMethod {
        ScoringMethod::Model
    }
}

/// The scorer selected by the last health check
#[derive(Clone)]
pub enum Backend {
    Trained(Arc<TrainedModel>),
    RuleBased(Arc<RuleEngine>),
}

impl Scorer for Backend {
    fn score(&self, features: &FeatureVector, threshold: f32) -> Result<ClassifierVerdict, ModelError> {
        match self {
            Self::Trained(model) => model.score(features, threshold),
            Self::RuleBased(rules) => Scorer::score(rules.as_ref(), features, threshold),
        }
    }

    fn method(&self) -> ScoringMethod {
        match self {
            Self::Trained(_) => ScoringMethod::Model,
            Self::RuleBased(_) => ScoringMethod::RuleBased,
        }
    }
}

/// What `predict` hands back to the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub verdict: ClassifierVerdict,
    pub method: ScoringMethod,
    pub degradation: Option<Degradation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub loaded: bool,
    pub mode: Option<ModelMode>,
    pub model_name: Option<String>,
    pub feature_count: usize,
    pub class_mapping: Option<String>,
    pub degenerate: bool,
    pub using_fallback: bool,
    pub version: String,
}

// ============================================================================
// CLASSIFIER BACKEND
// ============================================================================

pub struct ClassifierBackend {
    model: RwLock<Option<Arc<TrainedModel>>>,
    selected: RwLock<Option<Backend>>,
    rules: Arc<RuleEngine>,
    degenerate: AtomicBool,
    last_check: Mutex<Option<Instant>>,
    recheck_interval: Duration,
}

impl ClassifierBackend {
    /// Unloaded backend; `is_loaded()` is false until `load` or `install`
    pub fn new(rules: RuleEngine, recheck_interval: Duration) -> Self {
        Self {
            model: RwLock::new(None),
            selected: RwLock::new(None),
            rules: Arc::new(rules),
            degenerate: AtomicBool::new(false),
            last_check: Mutex::new(None),
            recheck_interval,
        }
    }

    /// Backend that serves with the rule engine only
    pub fn rule_based(rules: RuleEngine) -> Self {
        let backend = Self::new(rules, Duration::MAX);
        *backend.selected.write() = Some(Backend::RuleBased(Arc::clone(&backend.rules)));
        backend
    }

    /// Backend around an already-built model (fakes in tests, custom runtimes)
    pub fn with_model(model: Arc<dyn ProbabilityModel>, mode: ModelMode, rules: RuleEngine, recheck_interval: Duration) -> Self {
        let backend = Self::new(rules, recheck_interval);
        backend.install(model, mode);
        backend
    }

    /// Load `mode` from `dir`, falling back to the compatible model
    pub fn load(&self, dir: &Path, mode: ModelMode) -> Result<ModelMode, ModelError> {
        let primary = dir.join(format!("{}.onnx", mode.file_stem()));
        match OnnxModel::load(&primary) {
            Ok(model) => {
                self.install(Arc::new(model), mode);
                return Ok(mode);
            }
            Err(e) if mode == ModelMode::Compatible => {
                log::error!("Compatible model failed to load: {}", e);
                self.unload();
                return Err(e);
            }
            Err(e) => log::error!("{} model failed to load ({}), trying compatible", mode, e),
        }

        let fallback = dir.join(format!("{}.onnx", ModelMode::Compatible.file_stem()));
        match OnnxModel::load(&fallback) {
            Ok(model) => {
                self.install(Arc::new(model), ModelMode::Compatible);
                Ok(ModelMode::Compatible)
            }
            Err(e) => {
                log::error!("Compatible model failed to load: {}", e);
                self.unload();
                Err(e)
            }
        }
    }

    pub fn reload(&self, dir: &Path, mode: ModelMode) -> Result<ModelMode, ModelError> {
        self.load(dir, mode)
    }

    pub fn install(&self, model: Arc<dyn ProbabilityModel>, mode: ModelMode) {
        log::info!("{} model installed ({} features)", mode, model.feature_names().len());
        *self.model.write() = Some(Arc::new(TrainedModel { model, mode }));
        self.check_health();
    }

    pub fn unload(&self) {
        *self.model.write() = None;
        *self.selected.write() = None;
        self.degenerate.store(false, Ordering::Release);
        log::info!("Classifier unloaded");
    }

    pub fn is_loaded(&self) -> bool {
        self.selected.read().is_some()
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate.load(Ordering::Acquire)
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    /// The rule engine as a `Backend`, whatever is selected
    pub fn rule_backend(&self) -> Backend {
        Backend::RuleBased(Arc::clone(&self.rules))
    }

    /// Currently selected scorer
    pub fn backend(&self) -> Option<Backend> {
        self.selected.read().clone()
    }

    /// The trained model, whether or not it is currently serving
    pub fn trained(&self) -> Option<Arc<TrainedModel>> {
        self.model.read().clone()
    }

    /// Run the degeneracy check and publish the selected backend.
    /// Returns true when the model is degenerate.
    pub fn check_health(&self) -> bool {
        let Some(trained) = self.trained() else {
            return false;
        };
        *self.last_check.lock() = Some(Instant::now());

        let width = trained.model.feature_names().len();
        let mut rng = rand::thread_rng();
        let random: Vec<f32> = (0..width).map(|_| rng.gen::<f32>()).collect();
        let rows = [vec![0.0; width], vec![1.0; width], random];

        let outputs: Result<Vec<f32>, ModelError> = rows.iter()
            .map(|row| trained.phishing_probability(row))
            .collect();

        let degenerate = match outputs {
            Ok(probs) => {
                let max = probs.iter().copied().fold(f32::MIN, f32::max);
                let min = probs.iter().copied().fold(f32::MAX, f32::min);
                max - min < DEGENERACY_EPSILON
            }
            Err(e) => {
                log::warn!("Model health check failed: {}", e);
                true
            }
        };

        self.degenerate.store(degenerate, Ordering::Release);
        let selected = if degenerate {
            log::info!("Model output is constant across check rows, rule-based engine active");
            Backend::RuleBased(Arc::clone(&self.rules))
        } else {
            log::info!("Model health check passed");
            Backend::Trained(trained)
        };
        *self.selected.write() = Some(selected);

        degenerate
    }

    /// Takes the recheck slot when the last check is older than the
    /// recheck interval. Only one caller wins per interval.
    fn claim_recheck(&self) -> bool {
        let mut last = self.last_check.lock();
        match *last {
            Some(at) if at.elapsed() >= self.recheck_interval => {
                *last = Some(Instant::now());
                true
            }
            _ => false,
        }
    }

    fn maybe_recheck(&self) {
        if self.claim_recheck() {
            self.check_health();
        }
    }

    pub fn predict(&self, features: &FeatureVector, threshold: f32) -> Result<Scored, ModelError> {
        let threshold = check_threshold(threshold)?;
        self.maybe_recheck();

        let backend = self.backend().ok_or(ModelError::Unavailable)?;
        let degradation = match (&backend, self.is_degenerate()) {
            (Backend::RuleBased(_), true) => Some(Degradation::DegenerateModel),
            _ => None,
        };

        match backend.score(features, threshold) {
            Ok(verdict) => Ok(Scored { verdict, method: backend.method(), degradation }),
            Err(ModelError::InvalidThreshold(t)) => Err(ModelError::InvalidThreshold(t)),
            Err(e) => {
                log::error!("Model prediction failed: {}", e);
                let verdict = self.rules.score(features, threshold)?;
                Ok(Scored {
                    verdict,
                    method: ScoringMethod::RuleBased,
                    degradation: Some(Degradation::InferenceFailed { reason: e.to_string() }),
                })
            }
        }
    }

    /// Rule engine verdict regardless of the selected backend
    pub fn predict_with_rules(&self, features: &FeatureVector, threshold: f32) -> Result<Scored, ModelError> {
        let verdict = self.rules.score(features, threshold)?;
        Ok(Scored { verdict, method: ScoringMethod::RuleBased, degradation: None })
    }

    pub fn model_info(&self) -> ModelInfo {
        let trained = self.trained();
        let degenerate = self.is_degenerate();
        let using_fallback = matches!(self.backend(), Some(Backend::RuleBased(_)));

        let version = match &trained {
            Some(t) if !using_fallback => format!("shield_sight_{}_v1.0", t.mode),
            _ => "shield_sight_rule_based_v1.0".to_string(),
        };

        ModelInfo {
            loaded: self.is_loaded(),
            mode: trained.as_ref().map(|t| t.mode),
            model_name: trained.as_ref().map(|t| t.model.name().to_string()),
            feature_count: trained.as_ref().map_or(0, |t| t.model.feature_names().len()),
            class_mapping: trained.as_ref().map(|t| t.model.class_order().describe().to_string()),
            degenerate,
            using_fallback,
            version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::{layout::idx, FEATURE_LAYOUT};
    use crate::logic::model::{ClassOrder, Label};
    use std::sync::atomic::AtomicUsize;

    /// Phishing probability equals the first feature
    struct EchoModel {
        names: Vec<String>,
        order: ClassOrder,
    }

    impl EchoModel {
        fn new(order: ClassOrder) -> Self {
            Self { names: vec!["URLLength".to_string(), "IsHTTPS".to_string()], order }
        }
    }

    impl ProbabilityModel for EchoModel {
        fn name(&self) -> &str { "echo" }
        fn feature_names(&self) -> &[String] { &self.names }
        fn class_order(&self) -> ClassOrder { self.order }
        fn predict_raw(&self, row: &[f32]) -> Result<[f32; 2], ModelError> {
            let p = row[0].clamp(0.0, 1.0);
            Ok(match self.order {
                ClassOrder::PhishingFirst => [p, 1.0 - p],
                ClassOrder::LegitimateFirst => [1.0 - p, p],
            })
        }
    }

    /// Constant output, counts calls
    struct ConstantModel {
        names: Vec<String>,
        calls: AtomicUsize,
    }

    impl ProbabilityModel for ConstantModel {
        fn name(&self) -> &str { "constant" }
        fn feature_names(&self) -> &[String] { &self.names }
        fn class_order(&self) -> ClassOrder { ClassOrder::PhishingFirst }
        fn predict_raw(&self, _row: &[f32]) -> Result<[f32; 2], ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok([0.7, 0.3])
        }
    }

    struct FailingModel {
        names: Vec<String>,
        fail_after: usize,
        calls: AtomicUsize,
    }

    impl ProbabilityModel for FailingModel {
        fn name(&self) -> &str { "failing" }
        fn feature_names(&self) -> &[String] { &self.names }
        fn class_order(&self) -> ClassOrder { ClassOrder::PhishingFirst }
        fn predict_raw(&self, row: &[f32]) -> Result<[f32; 2], ModelError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
                return Err(ModelError::Inference("boom".to_string()));
            }
            Ok([row[0].clamp(0.0, 1.0), 1.0 - row[0].clamp(0.0, 1.0)])
        }
    }

    fn echo_backend(order: ClassOrder) -> ClassifierBackend {
        ClassifierBackend::with_model(Arc::new(EchoModel::new(order)), ModelMode::Enhanced, RuleEngine::deterministic(), Duration::MAX)
    }

    fn vector_with(p: f32) -> FeatureVector {
        FeatureVector::new().with(idx::URL_LENGTH, p)
    }

    #[test]
    fn test_label_follows_threshold_for_every_t() {
        let backend = echo_backend(ClassOrder::PhishingFirst);
        assert!(!backend.is_degenerate());

        for ti in 0..=20 {
            let t = ti as f32 / 20.0;
            for pi in 0..=20 {
                let p = pi as f32 / 20.0;
                let scored = backend.predict(&vector_with(p), t).unwrap();
                assert_eq!(scored.method, ScoringMethod::Model);
                assert_eq!(scored.verdict.label == Label::Phishing, p >= t, "p={} t={}", p, t);
                let sum = scored.verdict.phishing_probability + scored.verdict.legitimate_probability;
                assert!((sum - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_inverted_class_order_is_normalized() {
        let straight = echo_backend(ClassOrder::PhishingFirst);
        let inverted = echo_backend(ClassOrder::LegitimateFirst);
        let fv = vector_with(0.9);

        let a = straight.predict(&fv, 0.5).unwrap().verdict;
        let b = inverted.predict(&fv, 0.5).unwrap().verdict;
        assert!((a.phishing_probability - 0.9).abs() < 1e-6);
        assert!((b.phishing_probability - 0.9).abs() < 1e-6);
        assert_eq!(a.label, b.label);
    }

    #[test]
    fn test_constant_model_is_degenerate_and_never_called_again() {
        let model = Arc::new(ConstantModel {
            names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        });
        let backend = ClassifierBackend::with_model(model.clone(), ModelMode::Default, RuleEngine::deterministic(), Duration::MAX);

        assert!(backend.is_degenerate());
        assert!(backend.is_loaded());
        let check_calls = model.calls.load(Ordering::SeqCst);
        assert_eq!(check_calls, 3);

        // two inputs differing in one feature
        let a = backend.predict(&FeatureVector::new(), 0.85).unwrap();
        let b = backend.predict(&FeatureVector::new().with(idx::HAS_AT, 1.0), 0.85).unwrap();
        assert_eq!(a.method, ScoringMethod::RuleBased);
        assert_eq!(b.method, ScoringMethod::RuleBased);
        assert_eq!(a.degradation, Some(Degradation::DegenerateModel));
        assert_eq!(model.calls.load(Ordering::SeqCst), check_calls);

        let info = backend.model_info();
        assert!(info.using_fallback);
        assert_eq!(info.version, "shield_sight_rule_based_v1.0");
    }

    #[test]
    fn test_inference_failure_falls_back_to_rules() {
        let model = Arc::new(FailingModel {
            names: vec!["URLLength".to_string()],
            fail_after: 3,
            calls: AtomicUsize::new(0),
        });
        let backend = ClassifierBackend::with_model(model, ModelMode::Enhanced, RuleEngine::deterministic(), Duration::MAX);
        assert!(!backend.is_degenerate());

        let scored = backend.predict(&vector_with(0.5), 0.85).unwrap();
        assert_eq!(scored.method, ScoringMethod::RuleBased);
        assert!(matches!(scored.degradation, Some(Degradation::InferenceFailed { .. })));
    }

    #[test]
    fn test_invalid_threshold() {
        let backend = echo_backend(ClassOrder::PhishingFirst);
        assert_eq!(backend.predict(&FeatureVector::new(), 1.2), Err(ModelError::InvalidThreshold(1.2)));
        assert_eq!(backend.predict(&FeatureVector::new(), -0.5), Err(ModelError::InvalidThreshold(-0.5)));
    }

    #[test]
    fn test_unloaded_backend_is_unavailable() {
        let backend = ClassifierBackend::new(RuleEngine::deterministic(), Duration::MAX);
        assert!(!backend.is_loaded());
        assert_eq!(backend.predict(&FeatureVector::new(), 0.5), Err(ModelError::Unavailable));
    }

    #[test]
    fn test_load_missing_directory_fails_after_compatible_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ClassifierBackend::new(RuleEngine::deterministic(), Duration::MAX);
        let result = backend.load(dir.path(), ModelMode::Enhanced);
        assert!(matches!(result, Err(ModelError::NotFound(path)) if path.contains("compatible")));
        assert!(!backend.is_loaded());
    }

    #[test]
    fn test_rule_based_backend_is_loaded() {
        let backend = ClassifierBackend::rule_based(RuleEngine::deterministic());
        assert!(backend.is_loaded());
        assert!(!backend.is_degenerate());
        let scored = backend.predict(&FeatureVector::new(), 0.85).unwrap();
        assert_eq!(scored.method, ScoringMethod::RuleBased);
        assert_eq!(scored.degradation, None);
    }

    #[test]
    fn test_recheck_reruns_health_check() {
        let backend = ClassifierBackend::with_model(
            Arc::new(EchoModel::new(ClassOrder::PhishingFirst)),
            ModelMode::Enhanced,
            RuleEngine::deterministic(),
            Duration::ZERO,
        );
        let first = *backend.last_check.lock();
        backend.predict(&FeatureVector::new(), 0.5).unwrap();
        let second = *backend.last_check.lock();
        assert!(second >= first);
        assert!(!backend.is_degenerate());
    }

    #[test]
    fn test_recheck_slot_claimed_once_per_interval() {
        let backend = ClassifierBackend::with_model(
            Arc::new(EchoModel::new(ClassOrder::PhishingFirst)),
            ModelMode::Enhanced,
            RuleEngine::deterministic(),
            Duration::from_millis(50),
        );
        assert!(!backend.claim_recheck());
        std::thread::sleep(Duration::from_millis(60));
        assert!(backend.claim_recheck());
        assert!(!backend.claim_recheck());
    }

    /// Echo model that counts calls
    struct CountingEcho {
        names: Vec<String>,
        calls: AtomicUsize,
    }

    impl ProbabilityModel for CountingEcho {
        fn name(&self) -> &str { "counting" }
        fn feature_names(&self) -> &[String] { &self.names }
        fn class_order(&self) -> ClassOrder { ClassOrder::PhishingFirst }
        fn predict_raw(&self, row: &[f32]) -> Result<[f32; 2], ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let p = row[0].clamp(0.0, 1.0);
            Ok([p, 1.0 - p])
        }
    }

    #[test]
    fn test_concurrent_callers_share_one_recheck() {
        let model = Arc::new(CountingEcho {
            names: vec!["URLLength".to_string(), "IsHTTPS".to_string()],
            calls: AtomicUsize::new(0),
        });
        let backend = Arc::new(ClassifierBackend::with_model(
            model.clone(),
            ModelMode::Enhanced,
            RuleEngine::deterministic(),
            Duration::from_millis(200),
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
        std::thread::sleep(Duration::from_millis(250));

        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let backend = Arc::clone(&backend);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    backend.predict(&vector_with(0.9), 0.5).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // 3 rows at load, 3 for the single recheck, one per prediction
        assert_eq!(model.calls.load(Ordering::SeqCst), 3 + 3 + 8);
    }
}
