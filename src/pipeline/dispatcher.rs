use tokio::sync::mpsc;

use super::{Assignment, Emission, Task, WorkerId};
use crate::composition::Batch;
use crate::error::TapatiteError;

/// Hands compositions to whichever worker reports ready next.
///
/// Every worker has at most one readiness signal in flight: it announces,
/// then blocks for a task. The dispatcher answers each signal with the next
/// composition in batch order. Once the batch is exhausted it collects one
/// more signal from every worker, which proves each one has finished its
/// last assignment, and only then broadcasts [`Task::Shutdown`].
pub struct Dispatcher {
    batch: Batch,
    workers: Vec<mpsc::Sender<Task>>,
    ready: mpsc::UnboundedReceiver<WorkerId>,
    emit: mpsc::UnboundedSender<Emission>,
}

/// Which worker received each composition, by batch index
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub assignments: Vec<WorkerId>,
}

impl Dispatcher {
    pub fn new(
        batch: Batch,
        workers: Vec<mpsc::Sender<Task>>,
        ready: mpsc::UnboundedReceiver<WorkerId>,
        emit: mpsc::UnboundedSender<Emission>,
    ) -> Self {
        Self {
            batch,
            workers,
            ready,
            emit,
        }
    }

    pub async fn run(mut self) -> Result<DispatchReport, TapatiteError> {
        self.emit(Emission::Header)?;
        if let Some(first) = self.batch.first() {
            self.emit(Emission::Echo(first.clone()))?;
        }

        let mut report = DispatchReport {
            assignments: Vec::with_capacity(self.batch.len()),
        };

        let compositions = std::mem::take(&mut self.batch.compositions);
        for (index, composition) in compositions.into_iter().enumerate() {
            let worker = self.next_ready().await?;
            tracing::debug!(worker, index, kv = composition.kv(), "assigning");
            self.send(worker, Task::Work(Assignment { index, composition }))
                .await?;
            report.assignments.push(worker);
        }

        // Drain: one more readiness signal per worker means every one is idle.
        let mut idle = vec![false; self.workers.len()];
        while idle.iter().any(|i| !i) {
            let worker = self.next_ready().await?;
            idle[worker] = true;
        }

        tracing::debug!(workers = self.workers.len(), "broadcasting shutdown");
        for worker in 0..self.workers.len() {
            self.send(worker, Task::Shutdown).await?;
        }

        Ok(report)
    }

    /// Wait for any worker's readiness signal
    async fn next_ready(&mut self) -> Result<WorkerId, TapatiteError> {
        match self.ready.recv().await {
            Some(worker) if worker < self.workers.len() => Ok(worker),
            Some(worker) => Err(TapatiteError::WorkerLost(worker)),
            None => Err(TapatiteError::WorkersGone),
        }
    }

    fn emit(&self, emission: Emission) -> Result<(), TapatiteError> {
        self.emit
            .send(emission)
            .map_err(|_| TapatiteError::CollectorGone)
    }

    async fn send(&self, worker: WorkerId, task: Task) -> Result<(), TapatiteError> {
        self.workers[worker]
            .send(task)
            .await
            .map_err(|_| TapatiteError::WorkerLost(worker))
    }
}
