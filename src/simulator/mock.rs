use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Simulator;
use crate::composition::Composition;
use crate::config::MELT_PHASE;
use crate::error::TapatiteError;
use crate::trace::{CoolingTrace, Phase};

/// Mock simulator for testing. Produces a synthetic cooling path from the
/// composition, or fails for identifiers listed in `failing`.
pub struct MockSimulator {
    failing: Vec<f64>,
    call_count: AtomicUsize,
}

impl MockSimulator {
    pub fn new() -> Self {
        Self::failing_for(vec![])
    }

    pub fn failing_for(failing: Vec<f64>) -> Self {
        Self {
            failing,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

/// Ten 20-degree steps from 1200 °C: SiO2 and P2O5 enrich as melt drains.
pub fn synthetic_trace(composition: &Composition) -> CoolingTrace {
    let steps = 0..10;
    let temperature = steps.clone().map(|i| 1200.0 - 20.0 * i as f64).collect();
    let mass = steps.clone().map(|i| 100.0 - 8.0 * i as f64).collect();
    let sio2 = steps
        .clone()
        .map(|i| composition.sio2() + 0.5 * i as f64)
        .collect();
    let p2o5 = steps
        .map(|i| composition.p2o5() * (1.0 + 0.1 * i as f64))
        .collect();

    CoolingTrace::new(vec![Phase::new(MELT_PHASE)
        .with_column("Temperature", temperature)
        .with_column("mass", mass)
        .with_column("SiO2", sio2)
        .with_column("P2O5", p2o5)])
}

impl Simulator for MockSimulator {
    fn simulate<'a>(
        &'a self,
        composition: &'a Composition,
        scratch: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<CoolingTrace, TapatiteError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        if self.failing.contains(&composition.kv()) {
            let context = scratch.display().to_string();
            return Box::pin(async move { Err(TapatiteError::SimulationFailed(context)) });
        }

        let trace = synthetic_trace(composition);
        Box::pin(async move {
            // Let other workers interleave, like a real subprocess would.
            tokio::task::yield_now().await;
            Ok(trace)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::tests::rock;

    #[tokio::test]
    async fn synthetic_trace_is_usable() {
        let sim = MockSimulator::new();
        let trace = sim
            .simulate(&rock(60.0, 0.3, 1.0), Path::new("/tmp"))
            .await
            .unwrap();
        let melt = trace.melt().unwrap();
        assert_eq!(melt.len(), 10);
        assert_eq!(melt.temperature[0], 1200.0);
        assert_eq!(sim.call_count(), 1);
    }

    #[tokio::test]
    async fn failing_identifier() {
        let sim = MockSimulator::failing_for(vec![2.0]);
        assert!(sim
            .simulate(&rock(60.0, 0.3, 2.0), Path::new("/tmp"))
            .await
            .is_err());
        assert!(sim
            .simulate(&rock(60.0, 0.3, 3.0), Path::new("/tmp"))
            .await
            .is_ok());
        assert_eq!(sim.call_count(), 2);
    }
}
