//! Batch Concurrency Controller
//!
//! Runs the orchestrator over many URLs with at most `concurrency` runs in
//! flight. Items fail independently; results keep submission order.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Semaphore;

use super::orchestrator::Predictor;
use super::types::{PredictOptions, PredictionOutcome};
use crate::logic::error::BatchError;

const MAX_ERROR_LEN: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct BatchItemError {
    pub index: usize,
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub processing_time_ms: f64,
    pub avg_time_per_url_ms: f64,
    pub concurrency_limit: usize,
    pub results: Vec<PredictionOutcome>,
    pub errors: Vec<BatchItemError>,
}

pub struct BatchController {
    predictor: Arc<Predictor>,
    concurrency: usize,
    max_size: usize,
}

impl BatchController {
    pub fn new(predictor: Arc<Predictor>, concurrency: usize, max_size: usize) -> Self {
        Self {
            predictor,
            concurrency: concurrency.max(1),
            max_size,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub async fn run(&self, urls: Vec<String>, opts: PredictOptions) -> Result<BatchReport, BatchError> {
        if urls.len() > self.max_size {
            return Err(BatchError::TooLarge { received: urls.len(), limit: self.max_size });
        }

        let started = Instant::now();
        let batch_id = uuid::Uuid::new_v4().to_string();
        let total = urls.len();
        log::info!("Batch {}: {} URLs (concurrency: {})", batch_id, total, self.concurrency);

        let limit = Arc::new(Semaphore::new(self.concurrency));
        let handles: Vec<_> = urls.into_iter()
            .enumerate()
            .map(|(index, url)| {
                let predictor = Arc::clone(&self.predictor);
                let limit = Arc::clone(&limit);
                let task_url = url.clone();
                let handle = tokio::spawn(async move {
                    let _permit = limit.acquire_owned().await.ok();
                    predictor.predict(&task_url, &opts).await
                });
                (index, url, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(total);
        let mut errors = Vec::new();
        for (index, url, handle) in handles {
            let message = match handle.await {
                Ok(Ok(outcome)) => {
                    results.push(outcome);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(e) => format!("task failed: {}", e),
            };
            log::warn!("Batch {} item {} failed: {}", batch_id, index, message);
            errors.push(BatchItemError {
                index,
                url,
                error: message.chars().take(MAX_ERROR_LEN).collect(),
            });
        }

        let cache_hits = results.iter().filter(|r| r.from_cache).count();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let report = BatchReport {
            batch_id,
            total,
            successful: results.len(),
            failed: errors.len(),
            cache_hits,
            cache_misses: results.len() - cache_hits,
            processing_time_ms: (elapsed_ms * 100.0).round() / 100.0,
            avg_time_per_url_ms: if total == 0 { 0.0 } else { (elapsed_ms / total as f64 * 100.0).round() / 100.0 },
            concurrency_limit: self.concurrency,
            results,
            errors,
        };

        log::info!(
            "Batch {} complete: {}/{} successful, {} cache hits, {:.0}ms",
            report.batch_id,
            report.successful,
            report.total,
            report.cache_hits,
            report.processing_time_ms
        );
        Ok(report)
    }
}
