//! End-to-end pipeline tests with the rule engine and fake signal checkers.

#[cfg(test)]
mod integration_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::logic::cache::ManualClock;
    use crate::logic::config::PredictorConfig;
    use crate::logic::domain::DomainReason;
    use crate::logic::error::{BatchError, Degradation, ModelError, PredictError, SignalKind};
    use crate::logic::explain::{ExplanationMethod, ExplanationStatus};
    use crate::logic::model::{ClassOrder, ClassifierBackend, Label, ModelMode, ProbabilityModel, RuleEngine};
    use crate::logic::predictor::{
        url_hash, BatchController, ExplanationMode, OverrideRule, PredictOptions, Predictor, RiskLevel,
    };
    use crate::logic::signals::{
        AvailabilityChecker, AvailabilityReport, AvailabilityStatus, SignalHub, StaticGeoChecker,
    };
    use crate::logic::threat::ThreatLevel;

    // ------------------------------------------------------------------------
    // FAKES
    // ------------------------------------------------------------------------

    struct FixedAvailability(AvailabilityReport);

    #[async_trait]
    impl AvailabilityChecker for FixedAvailability {
        async fn check(&self, _url: &str) -> AvailabilityReport {
            self.0.clone()
        }
    }

    /// Tracks the peak number of concurrent checks
    #[derive(Default)]
    struct CountingAvailability {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AvailabilityChecker for CountingAvailability {
        async fn check(&self, _url: &str) -> AvailabilityReport {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            reachable(true)
        }
    }

    struct NeverAnswers;

    #[async_trait]
    impl AvailabilityChecker for NeverAnswers {
        async fn check(&self, _url: &str) -> AvailabilityReport {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            reachable(true)
        }
    }

    /// Healthy but slow model: p = 0.2 + 0.5 * IsHTTPS
    struct SlowModel {
        names: Vec<String>,
    }

    impl ProbabilityModel for SlowModel {
        fn name(&self) -> &str { "slow" }
        fn feature_names(&self) -> &[String] { &self.names }
        fn class_order(&self) -> ClassOrder { ClassOrder::PhishingFirst }
        fn predict_raw(&self, row: &[f32]) -> Result<[f32; 2], ModelError> {
            std::thread::sleep(Duration::from_millis(20));
            let p = 0.2 + 0.5 * row[0].clamp(0.0, 1.0);
            Ok([p, 1.0 - p])
        }
    }

    fn reachable(ssl_valid: bool) -> AvailabilityReport {
        let mut report = AvailabilityReport::with_status(AvailabilityStatus::Success, Some(true), "");
        report.error_message = None;
        report.status_code = Some(200);
        report.ssl_valid = Some(ssl_valid);
        report
    }

    fn signals(checker: Arc<dyn AvailabilityChecker>) -> SignalHub {
        SignalHub::new(checker, Arc::new(StaticGeoChecker), Duration::from_secs(1), Duration::from_secs(1))
    }

    fn predictor_with(signals: SignalHub) -> (Predictor, Arc<ManualClock>) {
        let clock = ManualClock::new();
        let backend = Arc::new(ClassifierBackend::rule_based(RuleEngine::deterministic()));
        let predictor = Predictor::with_parts(PredictorConfig::rule_based(), backend, signals, clock.clone());
        (predictor, clock)
    }

    fn predictor() -> Predictor {
        predictor_with(signals(Arc::new(FixedAvailability(reachable(true))))).0
    }

    // ------------------------------------------------------------------------
    // END TO END
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_google_is_legitimate() {
        let p = predictor();
        let out = p.predict("https://www.google.com", &PredictOptions::full()).await.unwrap();
        let r = &out.result;

        assert!(!out.from_cache);
        assert_eq!(r.prediction, Label::Legitimate);
        assert!(matches!(r.risk_level, RiskLevel::VeryLow | RiskLevel::Low), "{}", r.risk_level);
        assert_eq!(r.metadata.domain_analysis, DomainReason::ExactMatch);
        assert_eq!(r.metadata.domain_analysis.code(), "exact_domain_match");
        assert!(r.metadata.overrides.contains(&OverrideRule::TrustedDomain));
        assert!(r.attack_type.is_none());
        // legitimate verdicts add nothing through the classifier term
        assert_eq!(r.threat.breakdown.classifier_score, 0.0);
        assert_eq!(r.metadata.url_hash, url_hash("https://www.google.com"));
        assert!((r.phishing_probability + r.legitimate_probability - 1.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_brand_mimicry_is_phishing() {
        let p = predictor();
        let out = p.predict("http://accounts-google-verify.tk/login", &PredictOptions::full()).await.unwrap();
        let r = &out.result;

        assert_eq!(r.prediction, Label::Phishing);
        assert!(matches!(r.risk_level, RiskLevel::High | RiskLevel::Critical), "{}", r.risk_level);
        assert!(r.metadata.domain_analysis.code().starts_with("brand_mimicry"));
        assert!(r.confidence >= 0.95);
        assert!(r.attack_type.is_some());
        assert!(r.threat.index >= 38);
        assert!(r.threat.level >= ThreatLevel::Medium);

        let explanation = r.explanation.as_ref().unwrap();
        assert_eq!(explanation.method, ExplanationMethod::RuleBased);
        assert!(explanation.top_features.len() >= 2);
        assert!(r.timeline.is_some());
        assert!(r.summary.starts_with("PHISHING DETECTED"), "{}", r.summary);
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_before_classifier() {
        let p = predictor();
        for bad in ["", "not a url", "ftp://example.com/file", "https://example.com/<script>"] {
            let err = p.predict(bad, &PredictOptions::fast()).await.unwrap_err();
            assert!(matches!(err, PredictError::InvalidInput(_)), "{:?} -> {:?}", bad, err);
        }
        assert_eq!(p.cache_stats().size, 0);
    }

    #[tokio::test]
    async fn test_invalid_threshold_is_invalid_input() {
        let p = predictor();
        let opts = PredictOptions::fast().with_threshold(1.5);
        let err = p.predict("https://example.com", &opts).await.unwrap_err();
        assert!(matches!(err, PredictError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unloaded_backend_is_unavailable() {
        let backend = Arc::new(ClassifierBackend::new(RuleEngine::deterministic(), Duration::MAX));
        let p = Predictor::with_parts(PredictorConfig::rule_based(), backend, SignalHub::disabled(), ManualClock::new());
        let err = p.predict("https://example.com", &PredictOptions::fast()).await.unwrap_err();
        assert_eq!(err, PredictError::ServiceUnavailable);
        assert!(!p.health().model_loaded);
    }

    #[tokio::test]
    async fn test_threshold_decides_label() {
        let p = predictor();
        // one indicator (no https) scores 0.45
        let low = p.predict("http://example.com", &PredictOptions::fast().with_threshold(0.4)).await.unwrap();
        assert_eq!(low.result.prediction, Label::Phishing);
        let high = p.predict("http://example.com", &PredictOptions::fast().with_threshold(0.5)).await.unwrap();
        assert_eq!(high.result.prediction, Label::Legitimate);
    }

    // ------------------------------------------------------------------------
    // CACHE
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_cache_hit_returns_same_result() {
        let (p, clock) = predictor_with(SignalHub::disabled());
        let opts = PredictOptions::fast();

        let first = p.predict("https://www.google.com", &opts).await.unwrap();
        let second = p.predict("  HTTPS://WWW.GOOGLE.COM ", &opts).await.unwrap();
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert!(Arc::ptr_eq(&first.result, &second.result));

        // uncertain legitimate verdicts live 30 minutes
        clock.advance(Duration::from_secs(1_801));
        let third = p.predict("https://www.google.com", &opts).await.unwrap();
        assert!(!third.from_cache);
        assert!(!Arc::ptr_eq(&first.result, &third.result));

        let stats = p.cache_stats();
        assert_eq!(stats.hits, 1);
        p.shutdown().await;
    }

    #[tokio::test]
    async fn test_options_do_not_share_cache_slots() {
        let (p, _) = predictor_with(signals(Arc::new(FixedAvailability(reachable(true)))));
        let fast = p.predict("https://example.com", &PredictOptions::fast()).await.unwrap();
        let full = p.predict("https://example.com", &PredictOptions::full()).await.unwrap();
        assert!(!full.from_cache);
        assert!(fast.result.availability.is_none());
        assert!(full.result.availability.is_some());
        p.shutdown().await;
    }

    // ------------------------------------------------------------------------
    // EXPLANATIONS
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_deferred_explanation_becomes_ready() {
        let (p, _) = predictor_with(SignalHub::disabled());
        let out = p.predict("http://example.com/login", &PredictOptions::fast()).await.unwrap();
        let hash = out.result.metadata.url_hash.clone();

        assert!(out.result.explanation.is_none());
        assert_eq!(out.result.metadata.explanation_mode, ExplanationMode::Deferred);
        assert!(!matches!(p.explanation_status(&hash), ExplanationStatus::Unknown));

        p.shutdown().await;
        match p.explanation_status(&hash) {
            ExplanationStatus::Ready(stored) => {
                assert_eq!(stored.url_hash, hash);
                assert_eq!(stored.explanation.method, ExplanationMethod::RuleBased);
            }
            other => panic!("expected ready, got {}", other.as_str()),
        }
        assert!(matches!(p.explanation_status("deadbeef"), ExplanationStatus::Unknown));
    }

    #[tokio::test]
    async fn test_sync_explanation_timeout_uses_template() {
        let names = ["IsHTTPS", "URLLength", "DomainLength", "NumDots"].map(String::from).to_vec();
        let backend = Arc::new(ClassifierBackend::with_model(
            Arc::new(SlowModel { names }),
            ModelMode::Enhanced,
            RuleEngine::deterministic(),
            Duration::MAX,
        ));
        let config = PredictorConfig {
            sync_explanation_timeout: Duration::from_millis(10),
            ..PredictorConfig::default()
        };
        let p = Predictor::with_parts(config, backend, SignalHub::disabled(), ManualClock::new());

        let opts = PredictOptions { explanation: ExplanationMode::Sync, external_checks: false, threshold: None };
        let r = p.predict("https://my-little-bakery.fr", &opts).await.unwrap().result;

        assert!(r.metadata.degradations.contains(&Degradation::ExplanationTimeout));
        assert_eq!(r.explanation.as_ref().unwrap().method, ExplanationMethod::Template);
        assert!(r.timeline.is_none());
        assert!(r.summary.starts_with("This URL appears safe"), "{}", r.summary);
    }

    #[tokio::test]
    async fn test_explain_report_factors() {
        let p = predictor();
        let report = p.explain("http://accounts-google-verify.tk/login").await.unwrap();
        assert_eq!(report.top_features[0].feature, "Brand Mimicry Rule");
        assert!(report.top_features[0].contribution > 0.0);
        assert_eq!(report.explanation_method, ExplanationMethod::RuleBased);
        assert!(report.top_features.len() <= 10);

        let again = p.explain("http://accounts-google-verify.tk/login").await.unwrap();
        assert!(Arc::ptr_eq(&report, &again));

        let trusted = p.explain("https://www.google.com").await.unwrap();
        assert_eq!(trusted.top_features[0].feature, "Trusted Domain Reputation");
        assert_eq!(trusted.explanation_method, ExplanationMethod::Template);
    }

    // ------------------------------------------------------------------------
    // AVAILABILITY OVERRIDES
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_https_without_tls_flips_to_phishing() {
        let (p, _) = predictor_with(signals(Arc::new(FixedAvailability(reachable(false)))));
        let r = p.predict("https://my-little-bakery.fr", &PredictOptions::full()).await.unwrap().result;

        assert_eq!(r.prediction, Label::Phishing);
        assert_eq!(r.risk_level, RiskLevel::Medium);
        assert!(r.confidence >= 0.65 && r.confidence <= 0.70);
        assert!(r.metadata.overrides.contains(&OverrideRule::HttpsWithoutTls));
        assert!(r.summary.starts_with("Suspicious"));

        let report = p.explain("https://my-little-bakery.fr").await.unwrap();
        assert_eq!(report.top_features[0].feature, "Invalid Security Config");
    }

    #[tokio::test]
    async fn test_deferred_explanation_stores_final_verdict() {
        let (p, _) = predictor_with(signals(Arc::new(FixedAvailability(reachable(false)))));
        let opts = PredictOptions {
            explanation: ExplanationMode::Deferred,
            external_checks: true,
            threshold: None,
        };
        let out = p.predict("https://my-little-bakery.fr", &opts).await.unwrap();
        assert_eq!(out.result.prediction, Label::Phishing);
        let hash = out.result.metadata.url_hash.clone();

        p.shutdown().await;
        match p.explanation_status(&hash) {
            ExplanationStatus::Ready(stored) => {
                assert_eq!(stored.label, Label::Phishing);
                assert_eq!(stored.confidence, out.result.confidence);
                assert!(stored.summary.starts_with("PHISHING DETECTED"));
            }
            other => panic!("expected ready, got {}", other.as_str()),
        }
    }

    #[tokio::test]
    async fn test_offline_typosquat_is_critical() {
        let offline = AvailabilityReport::failed("connection refused");
        let (p, _) = predictor_with(signals(Arc::new(FixedAvailability(offline))));
        let r = p.predict("http://gogle.com", &PredictOptions::full()).await.unwrap().result;

        assert_eq!(r.prediction, Label::Phishing);
        assert_eq!(r.confidence, 0.99);
        assert_eq!(r.risk_level, RiskLevel::Critical);
        assert!(r.metadata.overrides.contains(&OverrideRule::RestrictedLookalike));
    }

    #[tokio::test]
    async fn test_restricted_legitimate_becomes_caution() {
        let mut restricted = reachable(true);
        restricted.status_code = Some(405);
        let (p, _) = predictor_with(signals(Arc::new(FixedAvailability(restricted))));
        let r = p.predict("https://my-little-bakery.fr", &PredictOptions::full()).await.unwrap().result;

        assert_eq!(r.prediction, Label::Legitimate);
        assert_eq!(r.risk_level, RiskLevel::Caution);
        assert!(r.confidence <= 0.70);
        assert!(r.summary.contains("RESTRICTED (HTTP 405)"), "{}", r.summary);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_timeout_degrades() {
        let (p, _) = predictor_with(signals(Arc::new(NeverAnswers)));
        let r = p.predict("https://example.com", &PredictOptions::batch()).await.unwrap().result;

        let availability = r.availability.as_ref().unwrap();
        assert_eq!(availability.status, AvailabilityStatus::Timeout);
        assert!(r.metadata.degradations.contains(&Degradation::SignalTimeout { signal: SignalKind::Availability }));
    }

    // ------------------------------------------------------------------------
    // BATCH
    // ------------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_batch_respects_concurrency_and_isolates_failures() {
        let checker = Arc::new(CountingAvailability::default());
        let (p, _) = predictor_with(signals(checker.clone()));
        let controller = BatchController::new(Arc::new(p), 5, 100);

        let mut urls: Vec<String> = (0..100).map(|i| format!("https://site{}.example.org/page", i)).collect();
        urls[42] = "not a url".to_string();

        let report = controller.run(urls, PredictOptions::batch()).await.unwrap();
        assert_eq!(report.total, 100);
        assert_eq!(report.successful, 99);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].index, 42);
        assert_eq!(report.errors[0].url, "not a url");
        assert_eq!(report.cache_misses, 99);
        assert_eq!(report.concurrency_limit, 5);

        assert_eq!(checker.calls.load(Ordering::SeqCst), 99);
        let peak = checker.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 5, "peak {}", peak);
    }

    #[tokio::test]
    async fn test_batch_counts_cache_hits() {
        let (p, _) = predictor_with(SignalHub::disabled());
        let controller = BatchController::new(Arc::new(p), 2, 10);
        let urls = vec!["https://example.com".to_string(); 1];
        controller.run(urls.clone(), PredictOptions::batch()).await.unwrap();

        let report = controller.run(urls, PredictOptions::batch()).await.unwrap();
        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.cache_misses, 0);
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected_before_work() {
        let checker = Arc::new(CountingAvailability::default());
        let (p, _) = predictor_with(signals(checker.clone()));
        let controller = BatchController::new(Arc::new(p), 20, 100);

        let urls = vec!["https://example.com".to_string(); 101];
        let err = controller.run(urls, PredictOptions::batch()).await.unwrap_err();
        assert_eq!(err, BatchError::TooLarge { received: 101, limit: 100 });
        assert_eq!(checker.calls.load(Ordering::SeqCst), 0);
    }
}
