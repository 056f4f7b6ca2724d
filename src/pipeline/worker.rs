use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::{Assignment, Emission, Task, WorkerId};
use crate::error::TapatiteError;
use crate::saturation::{self, SaturationResult};
use crate::scratch::Scratch;
use crate::simulator::Simulator;

/// Per-worker totals, returned when the worker terminates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: WorkerId,
    pub emitted: usize,
    pub dropped: usize,
    /// False if the worker stopped because its channels closed
    pub shut_down: bool,
}

/// One worker: announce ready, take a task, simulate, analyze, emit, repeat.
pub struct Worker {
    id: WorkerId,
    simulator: Arc<dyn Simulator>,
    scratch_root: PathBuf,
    min_percent_melt: f64,
    ready: mpsc::UnboundedSender<WorkerId>,
    tasks: mpsc::Receiver<Task>,
    emit: mpsc::UnboundedSender<Emission>,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        simulator: Arc<dyn Simulator>,
        scratch_root: PathBuf,
        min_percent_melt: f64,
        ready: mpsc::UnboundedSender<WorkerId>,
        tasks: mpsc::Receiver<Task>,
        emit: mpsc::UnboundedSender<Emission>,
    ) -> Self {
        Self {
            id,
            simulator,
            scratch_root,
            min_percent_melt,
            ready,
            tasks,
            emit,
        }
    }

    pub async fn run(mut self) -> WorkerReport {
        let mut report = WorkerReport {
            id: self.id,
            ..WorkerReport::default()
        };
        tracing::debug!(worker = self.id, "worker started");

        loop {
            if self.ready.send(self.id).is_err() {
                break;
            }

            let assignment = match self.tasks.recv().await {
                Some(Task::Work(assignment)) => assignment,
                Some(Task::Shutdown) => {
                    report.shut_down = true;
                    break;
                }
                None => break,
            };

            let emission = match self.process(&assignment).await {
                Ok(result) => Emission::Result(result),
                Err((context, e)) => {
                    if !e.is_per_task() {
                        tracing::error!(worker = self.id, "{context}: {e}");
                    }
                    Emission::Dropped {
                        index: assignment.index,
                        context,
                        reason: e.to_string(),
                    }
                }
            };
            let dropped = matches!(emission, Emission::Dropped { .. });

            // Nothing left to write rows to; further simulations would be wasted.
            if self.emit.send(emission).is_err() {
                tracing::warn!(worker = self.id, "collector gone, stopping");
                break;
            }
            if dropped {
                report.dropped += 1;
            } else {
                report.emitted += 1;
            }
        }

        tracing::debug!(
            worker = self.id,
            emitted = report.emitted,
            dropped = report.dropped,
            "worker stopped"
        );
        report
    }

    /// Run one assignment. Scratch space is gone again by the time this
    /// returns, whatever the outcome.
    async fn process(
        &self,
        assignment: &Assignment,
    ) -> Result<SaturationResult, (String, TapatiteError)> {
        let composition = &assignment.composition;
        let scratch = Scratch::create(&self.scratch_root, self.id, composition)
            .await
            .map_err(|e| {
                (
                    self.scratch_root.display().to_string(),
                    TapatiteError::from(e),
                )
            })?;
        let context = scratch.path().display().to_string();

        let simulated = self.simulator.simulate(composition, scratch.path()).await;
        scratch.remove().await;

        let trace = simulated.map_err(|e| (context.clone(), e))?;
        let melt = trace.melt().map_err(|e| (context, e))?;
        Ok(saturation::analyze(
            composition,
            &melt,
            self.min_percent_melt,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::tests::rock;
    use crate::simulator::mock::MockSimulator;

    struct Harness {
        ready_rx: mpsc::UnboundedReceiver<WorkerId>,
        task_tx: mpsc::Sender<Task>,
        emit_rx: mpsc::UnboundedReceiver<Emission>,
        handle: tokio::task::JoinHandle<WorkerReport>,
        _root: tempfile::TempDir,
    }

    fn spawn_worker(sim: MockSimulator) -> Harness {
        let root = tempfile::tempdir().unwrap();
        let (ready_tx, ready_rx) = mpsc::unbounded_channel();
        let (task_tx, task_rx) = mpsc::channel(1);
        let (emit_tx, emit_rx) = mpsc::unbounded_channel();
        let worker = Worker::new(
            0,
            Arc::new(sim),
            root.path().to_path_buf(),
            10.0,
            ready_tx,
            task_rx,
            emit_tx,
        );
        Harness {
            ready_rx,
            task_tx,
            emit_rx,
            handle: tokio::spawn(worker.run()),
            _root: root,
        }
    }

    fn work(index: usize, kv: f64) -> Task {
        Task::Work(Assignment {
            index,
            composition: rock(60.0, 0.3, kv),
        })
    }

    #[tokio::test]
    async fn failure_is_isolated_to_one_task() {
        let mut h = spawn_worker(MockSimulator::failing_for(vec![2.0]));

        assert_eq!(h.ready_rx.recv().await, Some(0));
        h.task_tx.send(work(0, 1.0)).await.unwrap();
        assert_eq!(h.ready_rx.recv().await, Some(0));
        h.task_tx.send(work(1, 2.0)).await.unwrap();
        // The failed task does not block the next request.
        assert_eq!(h.ready_rx.recv().await, Some(0));
        h.task_tx.send(work(2, 3.0)).await.unwrap();
        assert_eq!(h.ready_rx.recv().await, Some(0));
        h.task_tx.send(Task::Shutdown).await.unwrap();

        let report = h.handle.await.unwrap();
        assert_eq!(report.emitted, 2);
        assert_eq!(report.dropped, 1);
        assert!(report.shut_down);

        let mut results = Vec::new();
        let mut dropped = Vec::new();
        while let Ok(e) = h.emit_rx.try_recv() {
            match e {
                Emission::Result(r) => results.push(r.kv),
                Emission::Dropped { index, context, .. } => dropped.push((index, context)),
                _ => panic!("workers emit only results and drops"),
            }
        }
        assert_eq!(results, vec![1.0, 3.0]);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].0, 1);
        assert!(dropped[0].1.ends_with("out0_2"));
    }

    #[tokio::test]
    async fn scratch_is_released_before_next_request() {
        let mut h = spawn_worker(MockSimulator::new());
        assert_eq!(h.ready_rx.recv().await, Some(0));
        h.task_tx.send(work(0, 5.0)).await.unwrap();
        assert_eq!(h.ready_rx.recv().await, Some(0));
        assert!(!h._root.path().join("out0_5").exists());
        h.task_tx.send(Task::Shutdown).await.unwrap();
        assert!(h.handle.await.unwrap().shut_down);
    }

    #[tokio::test]
    async fn closed_collector_stops_worker_without_counting() {
        let mut h = spawn_worker(MockSimulator::new());
        drop(h.emit_rx);
        assert_eq!(h.ready_rx.recv().await, Some(0));
        h.task_tx.send(work(0, 1.0)).await.unwrap();

        let report = h.handle.await.unwrap();
        assert_eq!(report.emitted, 0);
        assert_eq!(report.dropped, 0);
        assert!(!report.shut_down);
        // No further readiness: the worker did not go back for more work.
        assert_eq!(h.ready_rx.recv().await, None);
    }

    #[tokio::test]
    async fn closed_task_channel_stops_worker() {
        let mut h = spawn_worker(MockSimulator::new());
        assert_eq!(h.ready_rx.recv().await, Some(0));
        drop(h.task_tx);
        let report = h.handle.await.unwrap();
        assert!(!report.shut_down);
        assert_eq!(report.emitted, 0);
    }
}
