use std::fmt::Write as _;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::Simulator;
use crate::composition::Composition;
use crate::config::{SimulationConfig, LOG_DIR, MELTS_ENV_FILE, MELTS_FILE, PHASE_TABLE};
use crate::error::TapatiteError;
use crate::trace::CoolingTrace;

/// Runs alphaMELTS as a subprocess inside the task's scratch directory.
pub struct MeltsSimulator {
    config: SimulationConfig,
}

impl MeltsSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    async fn simulate_impl(
        &self,
        composition: &Composition,
        scratch: &Path,
    ) -> Result<CoolingTrace, TapatiteError> {
        tokio::fs::write(scratch.join(MELTS_FILE), melts_file(&self.config, composition)).await?;
        tokio::fs::write(scratch.join(MELTS_ENV_FILE), env_file(&self.config)).await?;

        let parts = shell_words(&self.config.command);
        let (program, args) = parts
            .split_first()
            .ok_or_else(|| TapatiteError::Config("empty simulator command".into()))?;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(scratch)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| {
                TapatiteError::SimulationFailed(format!("failed to spawn {program}: {e}"))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // MELTS may exit before reading every answer; a broken pipe is not fatal.
            let _ = stdin.write_all(self.config.batch_script.as_bytes()).await;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TapatiteError::SimulationFailed(format!("wait failed: {e}")))?;

        // Success is judged by the phase table, not the exit status.
        let table = scratch.join(PHASE_TABLE);
        if !tokio::fs::try_exists(&table).await.unwrap_or(false) {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            log_to_file(
                &format!("MELTS_{}", composition.kv()),
                &format!(
                    "exit={}\n{stdout}{stderr}",
                    output.status.code().unwrap_or(-1)
                ),
            );
            return Err(TapatiteError::SimulationFailed(format!(
                "no {PHASE_TABLE} in {}",
                scratch.display()
            )));
        }

        CoolingTrace::load(&table)
    }
}

impl Simulator for MeltsSimulator {
    fn simulate<'a>(
        &'a self,
        composition: &'a Composition,
        scratch: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<CoolingTrace, TapatiteError>> + Send + 'a>> {
        Box::pin(self.simulate_impl(composition, scratch))
    }
}

/// Contents of the `.melts` input file for one composition.
pub fn melts_file(config: &SimulationConfig, composition: &Composition) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Title: tapatite Kv {}", composition.kv());
    for (oxide, value) in composition.melts_components() {
        let _ = writeln!(out, "Initial Composition: {oxide} {value:.4}");
    }
    let _ = writeln!(out, "Initial Temperature: {:.2}", config.initial_temperature);
    let _ = writeln!(out, "Final Temperature: {:.2}", config.final_temperature());
    let _ = writeln!(out, "Initial Pressure: {:.2}", config.initial_pressure);
    let _ = writeln!(out, "Final Pressure: {:.2}", config.initial_pressure);
    let _ = writeln!(out, "Increment Temperature: {:.2}", config.delta_t);
    let _ = writeln!(out, "Increment Pressure: {:.2}", config.delta_p);
    let _ = writeln!(out, "dp/dt: {:.3}", config.dp_dt);
    let _ = writeln!(out, "Log fO2 Path: {}", config.fo2_buffer);
    let _ = writeln!(out, "Log fO2 Delta: {:.2}", config.fo2_delta);
    for phase in &config.suppress {
        let _ = writeln!(out, "Suppress: {phase}");
    }
    out
}

/// Contents of the alphaMELTS environment file.
pub fn env_file(config: &SimulationConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ALPHAMELTS_VERSION\t{}", config.version);
    let _ = writeln!(out, "ALPHAMELTS_MODE\t{}", config.mode);
    let _ = writeln!(out, "ALPHAMELTS_DELTAT\t{}", config.delta_t);
    let _ = writeln!(out, "ALPHAMELTS_DELTAP\t{}", config.delta_p);
    let _ = writeln!(out, "ALPHAMELTS_MINT\t{}", config.final_temperature());
    let _ = writeln!(out, "ALPHAMELTS_MINF\t{}", config.stop_melt_fraction);
    let _ = writeln!(out, "ALPHAMELTS_CELSIUS_OUTPUT\ttrue");
    out
}

fn log_to_file(label: &str, content: &str) {
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = format!("{LOG_DIR}/{ts}_{label}.log");
    if std::fs::create_dir_all(LOG_DIR).is_ok() {
        let _ = std::fs::write(&path, content);
    }
}

/// Simple shell word splitting (handles single/double quotes).
fn shell_words(s: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        while i < len && bytes[i] == b' ' {
            i += 1;
        }
        if i >= len {
            break;
        }

        let quote = bytes[i];
        if quote == b'\'' || quote == b'"' {
            i += 1;
            let start = i;
            while i < len && bytes[i] != quote {
                i += 1;
            }
            words.push(&s[start..i]);
            i += 1;
        } else {
            let start = i;
            while i < len && bytes[i] != b' ' {
                i += 1;
            }
            words.push(&s[start..i]);
        }
    }

    words
}
