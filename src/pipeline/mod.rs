pub mod collector;
pub mod dispatcher;
pub mod worker;

use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::composition::{Batch, Composition};
use crate::config::RunConfig;
use crate::error::TapatiteError;
use crate::saturation::SaturationResult;
use crate::simulator::Simulator;

use collector::Collector;
use dispatcher::Dispatcher;
use worker::{Worker, WorkerReport};

pub type WorkerId = usize;

/// One composition handed to one worker
#[derive(Debug, Clone)]
pub struct Assignment {
    /// Row index in the batch
    pub index: usize,
    pub composition: Composition,
}

/// Message from the dispatcher to a worker
#[derive(Debug, Clone)]
pub enum Task {
    Work(Assignment),
    Shutdown,
}

/// Everything that ends up in the result or diagnostic stream
#[derive(Debug, Clone)]
pub enum Emission {
    /// Result column names, once per run
    Header,
    /// Raw fields of the first composition, once per run
    Echo(Composition),
    Result(SaturationResult),
    /// A composition whose simulation produced nothing usable
    Dropped {
        index: usize,
        context: String,
        reason: String,
    },
}

/// Where the two output streams go
pub struct Sinks {
    pub results: Box<dyn Write + Send>,
    pub diagnostics: Box<dyn Write + Send>,
}

impl Sinks {
    pub fn stdio() -> Self {
        Self {
            results: Box::new(std::io::stdout()),
            diagnostics: Box::new(std::io::stderr()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub compositions: usize,
    pub emitted: usize,
    pub dropped: usize,
    pub workers: Vec<WorkerReport>,
}

/// Run the whole batch: one dispatcher, `config.workers` workers, one collector.
pub async fn run(
    batch: Batch,
    simulator: Arc<dyn Simulator>,
    min_percent_melt: f64,
    config: &RunConfig,
    sinks: Sinks,
) -> Result<RunSummary, TapatiteError> {
    config.validate()?;
    let compositions = batch.len();
    tracing::info!(compositions, workers = config.workers, "starting batch");

    let progress = config.progress.then(|| crate::tui::batch_progress(compositions as u64));
    let (emit_tx, emit_rx) = mpsc::unbounded_channel();
    let collector = Collector::new(sinks.results, sinks.diagnostics, progress);
    let collector = tokio::task::spawn_blocking(move || collector.run(emit_rx));

    let (ready_tx, ready_rx) = mpsc::unbounded_channel();
    let mut task_txs = Vec::with_capacity(config.workers);
    let mut set = tokio::task::JoinSet::new();
    for id in 0..config.workers {
        let (task_tx, task_rx) = mpsc::channel(1);
        task_txs.push(task_tx);
        let worker = Worker::new(
            id,
            Arc::clone(&simulator),
            config.scratch_root.clone(),
            min_percent_melt,
            ready_tx.clone(),
            task_rx,
            emit_tx.clone(),
        );
        set.spawn(worker.run());
    }
    // Workers hold the only readiness senders, so the dispatcher sees them all leave.
    drop(ready_tx);

    let dispatched = Dispatcher::new(batch, task_txs, ready_rx, emit_tx)
        .run()
        .await;

    // Dropping the dispatcher closed every task channel, so workers finish
    // even when dispatch failed.
    let mut workers = Vec::with_capacity(config.workers);
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(report) => workers.push(report),
            Err(e) => tracing::error!("worker panicked: {e}"),
        }
    }
    workers.sort_by_key(|r| r.id);

    // A sink failure in the collector explains a stalled dispatch, so it wins.
    let counts = collector
        .await
        .map_err(|e| anyhow::anyhow!("collector panicked: {e}"))??;
    let report = dispatched?;
    tracing::debug!(assigned = report.assignments.len(), "batch fully assigned");

    Ok(RunSummary {
        compositions,
        emitted: counts.emitted,
        dropped: counts.dropped,
        workers,
    })
}
