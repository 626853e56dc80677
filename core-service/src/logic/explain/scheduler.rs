//! Background Explanation Scheduler
//!
//! Deferred explanations are jobs on a bounded queue. One dispatcher task
//! drains the queue and runs at most `concurrency` jobs at a time; results
//! land in the `ExplanationStore` keyed by URL hash.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

use super::store::ExplanationStore;
use super::summary::{generate_summary, SummaryInput};
use super::timeline::build_timeline;
use super::types::StoredExplanation;
use super::explain_bounded;
use crate::logic::domain::DomainVerdict;
use crate::logic::features::FeatureVector;
use crate::logic::model::{ClassifierBackend, Label};
use crate::logic::pool::CpuPool;

const QUEUE_DEPTH: usize = 1024;

#[derive(Debug, Clone)]
pub struct ExplanationJob {
    pub url: String,
    pub url_hash: String,
    pub label: Label,
    pub confidence: f32,
    pub features: Arc<FeatureVector>,
    pub domain: DomainVerdict,
}

struct Worker {
    store: Arc<ExplanationStore>,
    backend: Arc<ClassifierBackend>,
    pool: Arc<CpuPool>,
    budget: Duration,
}

impl Worker {
    async fn run(&self, job: ExplanationJob) {
        let Some(selected) = self.backend.backend() else {
            self.store.abandon(&job.url_hash);
            return;
        };

        log::info!("Background: computing explanation for {:.50}...", job.url);
        match explain_bounded(&self.pool, selected, Arc::clone(&job.features), self.budget).await {
            Ok(explanation) => {
                let summary = generate_summary(&SummaryInput {
                    label: job.label,
                    confidence: job.confidence,
                    features: &job.features,
                    contributions: &explanation.top_features,
                    domain: &job.domain,
                });
                let timeline = build_timeline(job.label, &explanation.top_features);
                self.store.complete(StoredExplanation {
                    url: job.url.clone(),
                    url_hash: job.url_hash,
                    label: job.label,
                    confidence: job.confidence,
                    explanation,
                    summary,
                    timeline,
                    computed_at: chrono::Utc::now(),
                });
                log::info!("Background: explanation cached for {:.50}", job.url);
            }
            Err(degradation) => {
                log::warn!("Background: {} for {:.50}", degradation, job.url);
                self.store.abandon(&job.url_hash);
            }
        }
    }
}

pub struct ExplanationScheduler {
    sender: Mutex<Option<mpsc::Sender<ExplanationJob>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    store: Arc<ExplanationStore>,
}

impl ExplanationScheduler {
    /// Spawn the dispatcher. Must be called within a Tokio runtime.
    pub fn start(
        store: Arc<ExplanationStore>,
        backend: Arc<ClassifierBackend>,
        pool: Arc<CpuPool>,
        concurrency: usize,
        budget: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let worker = Arc::new(Worker {
            store: Arc::clone(&store),
            backend,
            pool,
            budget,
        });
        let dispatcher = tokio::spawn(dispatch(rx, worker, concurrency.max(1)));

        Self {
            sender: Mutex::new(Some(tx)),
            dispatcher: Mutex::new(Some(dispatcher)),
            store,
        }
    }

    /// Queue a job. False if the hash is already pending/ready or the queue
    /// is full or closed.
    pub fn schedule(&self, job: ExplanationJob) -> bool {
        let Some(tx) = self.sender.lock().clone() else {
            return false;
        };
        if !self.store.mark_pending(&job.url_hash) {
            return false;
        }

        let hash = job.url_hash.clone();
        match tx.try_send(job) {
            Ok(()) => {
                log::debug!("Background: queued explanation {}", &hash[..hash.len().min(8)]);
                true
            }
            Err(e) => {
                log::warn!("Background: explanation queue rejected job: {}", e);
                self.store.abandon(&hash);
                false
            }
        }
    }

    pub fn store(&self) -> &Arc<ExplanationStore> {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Stop accepting jobs and wait for queued ones to finish
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());
        let handle = self.dispatcher.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::error!("Explanation dispatcher ended abnormally: {}", e);
            }
        }
    }
}

async fn dispatch(mut rx: mpsc::Receiver<ExplanationJob>, worker: Arc<Worker>, concurrency: usize) {
    let limit = Arc::new(Semaphore::new(concurrency));
    let mut running = JoinSet::new();

    loop {
        tokio::select! {
            job = rx.recv() => {
                let Some(job) = job else { break };
                let Ok(permit) = Arc::clone(&limit).acquire_owned().await else { break };
                let worker = Arc::clone(&worker);
                running.spawn(async move {
                    let _permit = permit;
                    worker.run(job).await;
                });
            }
            Some(_) = running.join_next(), if !running.is_empty() => {}
        }
    }

    while running.join_next().await.is_some() {}
    log::info!("Explanation dispatcher stopped");
}
