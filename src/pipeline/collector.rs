use std::io::Write;

use indicatif::ProgressBar;
use tokio::sync::mpsc;

use super::Emission;
use crate::saturation::SaturationResult;

/// Owns the result and diagnostic sinks; every emission in a run passes
/// through here, in arrival order.
pub struct Collector {
    results: Box<dyn Write + Send>,
    diagnostics: Box<dyn Write + Send>,
    progress: Option<ProgressBar>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorCounts {
    pub emitted: usize,
    pub dropped: usize,
}

impl Collector {
    pub fn new(
        results: Box<dyn Write + Send>,
        diagnostics: Box<dyn Write + Send>,
        progress: Option<ProgressBar>,
    ) -> Self {
        Self {
            results,
            diagnostics,
            progress,
        }
    }

    /// Drain `rx` until every sender is gone. Blocking; run it on a
    /// blocking thread.
    pub fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Emission>,
    ) -> Result<CollectorCounts, std::io::Error> {
        let mut counts = CollectorCounts::default();

        while let Some(emission) = rx.blocking_recv() {
            match emission {
                Emission::Header => {
                    writeln!(self.results, "{}", SaturationResult::header())?;
                }
                Emission::Echo(composition) => {
                    writeln!(self.results, "{}", composition.echo())?;
                }
                Emission::Result(result) => {
                    counts.emitted += 1;
                    self.write_result(&result)?;
                    self.tick();
                }
                Emission::Dropped {
                    index,
                    context,
                    reason,
                } => {
                    counts.dropped += 1;
                    tracing::debug!(index, "composition dropped");
                    let line = format!("{context} : {reason}");
                    match &self.progress {
                        // Keep the bar intact when diagnostics share its terminal.
                        Some(pb) => pb.suspend(|| writeln!(self.diagnostics, "{line}"))?,
                        None => writeln!(self.diagnostics, "{line}")?,
                    }
                    self.tick();
                }
            }
        }

        self.results.flush()?;
        self.diagnostics.flush()?;
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
        Ok(counts)
    }

    fn write_result(&mut self, result: &SaturationResult) -> Result<(), std::io::Error> {
        writeln!(self.results, "{}", result.to_row())?;
        // Rows should reach the sink as they complete, not at exit.
        self.results.flush()
    }

    fn tick(&self) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }
}
