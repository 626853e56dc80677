//! Prediction Orchestrator
//!
//! Sequences one URL through the pipeline:
//!
//! ```text
//! CacheCheck -> Validate -> DomainAnalysis -> FeatureExtract -> ClassifierInvoke
//!   -> OverrideDecision -> Explanation -> AvailabilityAdjust -> ThreatAggregate
//!   -> CacheStore -> Return
//! ```
//!
//! A cache hit returns immediately. Validation failures and an unloaded
//! classifier are the only errors; everything else degrades and is recorded
//! on the result metadata.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use sha2::{Digest, Sha256};

use super::overrides::{apply_availability, decide};
use super::types::{
    ExplainMetadata, ExplainReport, ExplanationMode, OverrideRule, PredictOptions, PredictionMetadata,
    PredictionOutcome, PredictionResult, PredictorHealth, Stage, StageTiming,
};
use crate::constants::{
    EXPLANATION_TTL_SECS, TTL_CONFIDENT_LEGITIMATE_SECS, TTL_CONFIDENT_PHISHING_SECS, TTL_UNCERTAIN_SECS,
};
use crate::logic::cache::{CacheStats, Clock, SystemClock, TtlCache};
use crate::logic::config::PredictorConfig;
use crate::logic::domain::{DomainAnalyzer, DomainReason};
use crate::logic::error::{Degradation, ModelError, PredictError};
use crate::logic::explain::{
    build_timeline, explain_bounded, generate_summary, template_summary, Explanation, ExplanationJob,
    ExplanationMethod, ExplanationScheduler, ExplanationStatus, ExplanationStore, FeatureContribution, SummaryInput,
    MAX_TOP_FEATURES,
};
use crate::logic::features::{layout::idx, FeatureVector, UrlFeatureExtractor};
use crate::logic::model::{check_threshold, Backend, ClassifierBackend, Label, ModelInfo, RuleEngine, Scored, ScoringMethod};
use crate::logic::pool::CpuPool;
use crate::logic::signals::{AvailabilityReport, GeoReport, SignalHub};
use crate::logic::threat::{aggregate, classify_attack, ThreatInputs};
use crate::logic::validate::validate_url;

/// Public lookup hash: SHA-256 of the trimmed, lower-cased URL
pub fn url_hash(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.trim().to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

/// Retention by verdict: confident verdicts live longer
pub fn cache_ttl(label: Label, confidence: f32) -> Duration {
    let secs = match label {
        Label::Legitimate if confidence > 0.9 => TTL_CONFIDENT_LEGITIMATE_SECS,
        Label::Phishing if confidence > 0.85 => TTL_CONFIDENT_PHISHING_SECS,
        _ => TTL_UNCERTAIN_SECS,
    };
    Duration::from_secs(secs)
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

fn millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100_000.0).round() / 100.0
}

// ============================================================================
// STAGE TIMER
// ============================================================================

struct StageTimer {
    started: Instant,
    last: Instant,
    timings: Vec<StageTiming>,
}

impl StageTimer {
    fn start() -> Self {
        let now = Instant::now();
        Self { started: now, last: now, timings: Vec::with_capacity(9) }
    }

    fn mark(&mut self, stage: Stage) {
        let now = Instant::now();
        self.timings.push(StageTiming { stage, elapsed_ms: millis(now - self.last) });
        self.last = now;
    }

    fn total_ms(&self) -> f64 {
        millis(self.started.elapsed())
    }
}

// ============================================================================
// PREDICTOR
// ============================================================================

pub struct Predictor {
    config: PredictorConfig,
    backend: Arc<ClassifierBackend>,
    analyzer: DomainAnalyzer,
    extractor: UrlFeatureExtractor,
    signals: SignalHub,
    cache: TtlCache<String, PredictionResult>,
    explain_reports: TtlCache<String, ExplainReport>,
    scheduler: ExplanationScheduler,
    pool: Arc<CpuPool>,
}

impl Predictor {
    /// Production wiring. Must be called within a Tokio runtime; the model
    /// is not loaded until `load()`.
    pub fn new(config: PredictorConfig) -> Self {
        let backend = if config.rule_engine_only {
            ClassifierBackend::rule_based(RuleEngine::default())
        } else {
            ClassifierBackend::new(RuleEngine::default(), config.health_recheck_interval)
        };
        let signals = SignalHub::http(config.availability_timeout, config.geo_timeout);
        Self::with_parts(config, Arc::new(backend), signals, Arc::new(SystemClock))
    }

    /// Explicit collaborators, for tests and embedding
    pub fn with_parts(
        config: PredictorConfig,
        backend: Arc<ClassifierBackend>,
        signals: SignalHub,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let pool = Arc::new(CpuPool::new(config.cpu_workers));
        let store = Arc::new(ExplanationStore::with_clock(
            config.explanation_cache_size,
            Duration::from_secs(EXPLANATION_TTL_SECS),
            Arc::clone(&clock),
        ));
        let scheduler = ExplanationScheduler::start(
            store,
            Arc::clone(&backend),
            Arc::clone(&pool),
            config.background_workers,
            config.background_explanation_timeout,
        );

        Self {
            cache: TtlCache::with_clock(config.prediction_cache_size, Arc::clone(&clock)),
            explain_reports: TtlCache::with_clock(config.explanation_cache_size, clock),
            extractor: UrlFeatureExtractor::new(config.feature_cache_size),
            analyzer: DomainAnalyzer::default(),
            backend,
            signals,
            scheduler,
            pool,
            config,
        }
    }

    /// Load the configured model; a rule-engine-only predictor has nothing to load
    pub fn load(&self) -> Result<(), ModelError> {
        if self.config.rule_engine_only {
            log::info!("Rule engine only mode, skipping model load");
            return Ok(());
        }
        let mode = self.backend.load(&self.config.model_dir, self.config.model_mode)?;
        let info = self.backend.model_info();
        log::info!(
            "Predictor ready: {} model, {} features, version {}",
            mode,
            info.feature_count,
            info.version
        );
        Ok(())
    }

    /// Stop background explanations, waiting for queued ones
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        log::info!("Predictor shut down");
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<ClassifierBackend> {
        &self.backend
    }

    pub fn is_loaded(&self) -> bool {
        self.backend.is_loaded()
    }

    pub fn model_info(&self) -> ModelInfo {
        self.backend.model_info()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn explanation_status(&self, url_hash: &str) -> ExplanationStatus {
        self.scheduler.store().status(url_hash)
    }

    pub fn health(&self) -> PredictorHealth {
        let info = self.backend.model_info();
        PredictorHealth {
            model_loaded: info.loaded,
            degenerate: info.degenerate,
            using_fallback: info.using_fallback,
            model_version: info.version,
            cache_size: self.cache.len(),
            cache_capacity: self.cache.capacity(),
            pending_explanations: self.scheduler.store().pending_count(),
            external_checks: self.signals.is_enabled(),
        }
    }

    // ------------------------------------------------------------------------
    // PREDICT
    // ------------------------------------------------------------------------

    pub async fn predict(&self, raw_url: &str, opts: &PredictOptions) -> Result<PredictionOutcome, PredictError> {
        let mut timer = StageTimer::start();
        let hash = url_hash(raw_url);
        let key = format!("{}:{}", opts.cache_namespace(self.config.threshold), hash);

        if let Some(cached) = self.cache.get(&key) {
            log::debug!("Cache hit: {:.50}", raw_url.trim());
            return Ok(PredictionOutcome { result: cached, from_cache: true });
        }
        timer.mark(Stage::CacheCheck);

        let url = validate_url(raw_url).map_err(|e| {
            log::warn!("Rejected URL {:.50}: {}", raw_url.trim(), e);
            e
        })?;
        let threshold = check_threshold(opts.threshold.unwrap_or(self.config.threshold))
            .map_err(|e| PredictError::InvalidInput(e.to_string()))?;
        timer.mark(Stage::Validate);

        if !self.backend.is_loaded() {
            log::error!("Classifier not loaded, rejecting prediction");
            return Err(PredictError::ServiceUnavailable);
        }

        let domain = self.analyzer.analyze(url);
        log::debug!("Domain analysis: {:.50} -> {} ({:.2})", url, domain.reason, domain.trust_adjustment);
        timer.mark(Stage::DomainAnalysis);

        let features = self.extractor.extract(url);
        timer.mark(Stage::FeatureExtract);

        let mut degradations = Vec::new();
        let scored = self.classify(&features, threshold).await?;
        degradations.extend(scored.degradation.clone());
        timer.mark(Stage::ClassifierInvoke);

        let mut decision = decide(&scored.verdict, &domain);
        timer.mark(Stage::OverrideDecision);

        let explanation = match opts.explanation {
            ExplanationMode::Sync => match self.explain_now(scored.method, &features, self.config.sync_explanation_timeout).await {
                Ok(explanation) => Some(explanation),
                Err(degradation) => {
                    log::warn!("Explanation degraded for {:.50}: {}", url, degradation);
                    degradations.push(degradation);
                    Some(Explanation::template(scored.verdict.phishing_probability))
                }
            },
            ExplanationMode::Deferred | ExplanationMode::Skip => None,
        };
        timer.mark(Stage::Explanation);

        let (availability, geo_analysis) = if opts.external_checks {
            let (availability, geo) = tokio::join!(self.signals.availability(url), self.signals.geo(url));
            let availability = availability.map(|observed| {
                degradations.extend(observed.degradation);
                observed.report
            });
            let geo = geo.map(|observed| {
                degradations.extend(observed.degradation);
                observed.report
            });
            (availability, geo)
        } else {
            (None, None)
        };

        if let Some(report) = &availability {
            let claims_https = features.get(idx::IS_HTTPS).unwrap_or(0.0) >= 0.5;
            apply_availability(&mut decision, &domain, claims_https, report);
        }
        timer.mark(Stage::AvailabilityAdjust);

        // queued only once the verdict is final
        if opts.explanation == ExplanationMode::Deferred {
            self.scheduler.schedule(ExplanationJob {
                url: url.to_string(),
                url_hash: hash.clone(),
                label: decision.label,
                confidence: decision.confidence,
                features: Arc::clone(&features),
                domain: domain.clone(),
            });
        }
        let explanation_pending = matches!(self.explanation_status(&hash), ExplanationStatus::Pending);

        let threat = aggregate(&ThreatInputs {
            classifier_confidence: decision.confidence,
            heuristic_risk_weight: explanation.as_ref().map_or(0.0, Explanation::risk_weight),
            availability_risk: availability.as_ref().map_or(0.0, AvailabilityReport::risk),
            geo_risk: geo_analysis.as_ref().map_or(0.0, GeoReport::geo_risk),
            proxy_risk: geo_analysis.as_ref().map_or(0.0, GeoReport::proxy_risk),
            is_phishing: decision.label.is_phishing(),
        });
        let attack_type = decision.label.is_phishing().then(|| classify_attack(url));

        let computed = explanation.as_ref().filter(|e| e.method != ExplanationMethod::Template);
        let summary = match (&decision.summary_override, computed) {
            (Some(text), _) => text.clone(),
            (None, Some(e)) => generate_summary(&SummaryInput {
                label: decision.label,
                confidence: decision.confidence,
                features: &features,
                contributions: &e.top_features,
                domain: &domain,
            }),
            (None, None) => template_summary(decision.label, decision.confidence),
        };
        let timeline = computed.map(|e| build_timeline(decision.label, &e.top_features));
        timer.mark(Stage::ThreatAggregate);

        let processing_time_ms = timer.total_ms();
        let result = PredictionResult {
            url: url.to_string(),
            prediction: decision.label,
            confidence: round4(decision.confidence),
            phishing_probability: round4(scored.verdict.phishing_probability),
            legitimate_probability: round4(scored.verdict.legitimate_probability),
            risk_level: decision.risk_level,
            summary,
            explanation,
            timeline,
            availability,
            geo_analysis,
            threat,
            attack_type,
            metadata: PredictionMetadata {
                url_hash: hash,
                domain_analysis: domain.reason.clone(),
                domain_trusted: domain.is_trusted,
                domain_boost: round4(domain.trust_adjustment),
                classifier_confidence: round4(scored.verdict.confidence()),
                scoring_method: scored.method,
                overrides: decision.applied.clone(),
                degradations,
                explanation_mode: opts.explanation,
                explanation_pending,
                model_version: self.backend.model_info().version,
                processing_time_ms,
                stage_timings: timer.timings,
            },
            timestamp: Utc::now(),
        };

        log::info!(
            "Prediction: {:.50} -> {} (conf: {:.2}, boost: {:.2}, threat: {}, time: {}ms)",
            url,
            result.prediction,
            result.confidence,
            domain.trust_adjustment,
            result.threat.index,
            processing_time_ms
        );

        let ttl = cache_ttl(decision.label, decision.confidence);
        let result = self.cache.insert(key, result, ttl);
        Ok(PredictionOutcome { result, from_cache: false })
    }

    /// Score on the CPU pool; a failed or late model falls back to the rules
    async fn classify(&self, features: &Arc<FeatureVector>, threshold: f32) -> Result<Scored, PredictError> {
        let backend = Arc::clone(&self.backend);
        let row = Arc::clone(features);
        let task = self.pool.run(move || backend.predict(&row, threshold));

        let reason = match tokio::time::timeout(self.config.inference_timeout, task).await {
            Ok(Ok(Ok(scored))) => return Ok(scored),
            Ok(Ok(Err(ModelError::Unavailable))) => return Err(PredictError::ServiceUnavailable),
            Ok(Ok(Err(e @ ModelError::InvalidThreshold(_)))) => return Err(PredictError::InvalidInput(e.to_string())),
            Ok(Ok(Err(e))) => e.to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("inference exceeded {}ms", self.config.inference_timeout.as_millis()),
        };

        log::warn!("Classifier failed ({}), serving with rule engine", reason);
        let mut scored = self.backend
            .predict_with_rules(features, threshold)
            .map_err(|e| PredictError::InvalidInput(e.to_string()))?;
        scored.degradation = Some(Degradation::InferenceFailed { reason });
        Ok(scored)
    }

    /// The scorer that produced the verdict explains it
    fn explainer(&self, method: ScoringMethod) -> Backend {
        match method {
            ScoringMethod::Model => self.backend.backend().unwrap_or_else(|| self.backend.rule_backend()),
            ScoringMethod::RuleBased => self.backend.rule_backend(),
        }
    }

    async fn explain_now(
        &self,
        method: ScoringMethod,
        features: &Arc<FeatureVector>,
        budget: Duration,
    ) -> Result<Explanation, Degradation> {
        explain_bounded(&self.pool, self.explainer(method), Arc::clone(features), budget).await
    }

    // ------------------------------------------------------------------------
    // EXPLAIN
    // ------------------------------------------------------------------------

    /// Forced synchronous explanation with domain and signal factors
    pub async fn explain(&self, raw_url: &str) -> Result<Arc<ExplainReport>, PredictError> {
        let key = url_hash(raw_url);
        if let Some(report) = self.explain_reports.get(&key) {
            return Ok(report);
        }

        let outcome = self.predict(raw_url, &PredictOptions::full()).await?;
        let result = outcome.result;
        let url = result.url.as_str();
        let domain = self.analyzer.analyze(url);

        let mut method = ExplanationMethod::Template;
        let mut base_value = 0.5;
        let mut top_features: Vec<FeatureContribution> = Vec::new();

        // trusted domains are explained by their reputation alone
        if !domain.is_strongly_trusted() {
            let explanation = match &result.explanation {
                Some(e) if e.method != ExplanationMethod::Template => Ok(e.clone()),
                _ => {
                    let features = self.extractor.extract(url);
                    self.explain_now(result.metadata.scoring_method, &features, self.config.background_explanation_timeout)
                        .await
                }
            };
            match explanation {
                Ok(e) => {
                    method = e.method;
                    base_value = e.base_value;
                    top_features = e.top_features;
                }
                Err(degradation) => log::warn!("Explanation failed for {:.50}: {}", url, degradation),
            }
        }

        if domain.trust_adjustment != 0.0 {
            let name = match &domain.reason {
                DomainReason::BrandMimicry(_) => "Brand Mimicry Rule",
                DomainReason::Typosquat(_) => "Typosquatting Rule",
                _ if domain.is_strongly_trusted() => "Trusted Domain Reputation",
                _ => "Domain Analysis",
            };
            let value = if domain.is_trusted { 1.0 } else { 0.0 };
            // trust pulls toward legitimate, so its contribution is negative
            top_features.insert(0, FeatureContribution::new(name, value, round4(-domain.trust_adjustment)));
        }

        if result.metadata.overrides.contains(&OverrideRule::HttpsWithoutTls) {
            top_features.insert(0, FeatureContribution::new("Invalid Security Config", 1.0, 0.8));
        }

        if top_features.is_empty() {
            top_features.push(FeatureContribution::new(
                "Prediction Confidence",
                result.confidence,
                round4(result.confidence - 0.5),
            ));
        }
        top_features.truncate(MAX_TOP_FEATURES);

        let report = ExplainReport {
            url: url.to_string(),
            prediction: result.prediction,
            confidence: result.confidence,
            explanation_method: method,
            base_value,
            top_features,
            summary: result.summary.clone(),
            availability: result.availability.clone(),
            metadata: ExplainMetadata {
                domain_analysis: domain.reason.clone(),
                domain_boost: round4(domain.trust_adjustment),
                prediction_metadata: result.metadata.clone(),
            },
        };

        log::info!("Explanation generated: {:.50} -> method: {}", url, method.as_str());
        Ok(self.explain_reports.insert(key, report, Duration::from_secs(EXPLANATION_TTL_SECS)))
    }
}
