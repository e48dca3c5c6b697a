//! Batch orchestrator
//!
//! Migrates instances in contiguous batches. Instances within a batch run
//! concurrently and are jointly awaited; a failed instance never takes the
//! batch down. Progress is published after each batch, with a fixed pause
//! between batches to let the host breathe. Cancellation applies between
//! batches only.

use crate::engine::{MigrationEngine, MigrationOutcome};
use crate::remote::VariablesApi;
use compass_host::{ComponentKey, DocumentHost, NodeId, VariableHost};
use compass_registry::ComponentRegistry;
use crate::config::EngineConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Counters published after every batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationProgress {
    /// Instances in this run
    pub total: usize,
    /// Successfully migrated so far
    pub completed: usize,
    /// Failed so far
    pub failed: usize,
    /// Configured batch size
    pub batch_size: usize,
    /// 1-based index of the batch just finished
    pub current_batch: usize,
}

/// Final accounting for one batch run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Final progress counters
    pub progress: MigrationProgress,
    /// Wall-clock duration of the whole run, milliseconds
    pub elapsed_ms: u64,
    /// Fastest single instance, milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fastest_ms: Option<u64>,
    /// Slowest single instance, milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slowest_ms: Option<u64>,
    /// Whether the run was cancelled before finishing
    pub cancelled: bool,
    /// Per-instance outcomes, in input order
    pub outcomes: Vec<MigrationOutcome>,
}

/// Runs instance migrations in bounded concurrent batches
pub struct BatchOrchestrator<H> {
    engine: Arc<MigrationEngine<H>>,
    cancel: Arc<AtomicBool>,
}

impl<H: DocumentHost + VariableHost + 'static> BatchOrchestrator<H> {
    /// Create an orchestrator over an engine
    #[must_use]
    pub fn new(engine: Arc<MigrationEngine<H>>) -> Self {
        Self {
            engine,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Convenience constructor building the engine in place
    #[must_use]
    pub fn with_engine(
        host: Arc<H>,
        registry: Arc<ComponentRegistry>,
        config: EngineConfig,
        api: Arc<dyn VariablesApi>,
    ) -> Self {
        Self::new(Arc::new(MigrationEngine::new(host, registry, config, api)))
    }

    /// Handle for requesting cancellation between batches
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Migrate `instances`, publishing progress after each batch
    ///
    /// Counters reset at the start of every run.
    pub async fn run(
        &self,
        instances: Vec<NodeId>,
        target: Option<ComponentKey>,
        progress_tx: Option<mpsc::UnboundedSender<MigrationProgress>>,
    ) -> BatchReport {
        let started = Instant::now();
        // Deserialized configs may carry a zero; chunks() requires >= 1.
        let batch_size = self.engine.config().batch_size.max(1);
        let pause = self.engine.config().batch_pause();

        let mut progress = MigrationProgress {
            total: instances.len(),
            batch_size,
            ..MigrationProgress::default()
        };
        let mut outcomes = Vec::with_capacity(instances.len());
        let mut fastest_ms: Option<u64> = None;
        let mut slowest_ms: Option<u64> = None;
        let mut cancelled = false;

        for (index, batch) in instances.chunks(batch_size).enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::info!(after_batches = index, "batch run cancelled");
                cancelled = true;
                break;
            }
            if index > 0 && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }

            let results = futures::future::join_all(batch.iter().map(|instance| {
                let engine = Arc::clone(&self.engine);
                let target = target.clone();
                async move {
                    let clock = Instant::now();
                    let outcome = engine.migrate_instance(instance, target.as_ref()).await;
                    (outcome, clock.elapsed().as_millis() as u64)
                }
            }))
            .await;

            progress.current_batch = index + 1;
            for (outcome, took_ms) in results {
                if outcome.success {
                    progress.completed += 1;
                } else {
                    progress.failed += 1;
                }
                fastest_ms = Some(fastest_ms.map_or(took_ms, |f| f.min(took_ms)));
                slowest_ms = Some(slowest_ms.map_or(took_ms, |s| s.max(took_ms)));
                outcomes.push(outcome);
            }

            tracing::info!(
                batch = progress.current_batch,
                completed = progress.completed,
                failed = progress.failed,
                total = progress.total,
                "batch finished"
            );
            if let Some(tx) = &progress_tx {
                let _ = tx.send(progress);
            }
        }

        BatchReport {
            progress,
            elapsed_ms: started.elapsed().as_millis() as u64,
            fastest_ms,
            slowest_ms,
            cancelled,
            outcomes,
        }
    }
}
