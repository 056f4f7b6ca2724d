use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::TapatiteError;

/// File names used by the simulator boundary
pub const PHASE_TABLE: &str = "Phase_main_tbl.txt";
pub const MELTS_FILE: &str = "sc.melts";
pub const MELTS_ENV_FILE: &str = "melts_env.txt";
pub const LOG_DIR: &str = "logs";

/// Name MELTS gives the first liquid phase
pub const MELT_PHASE: &str = "liquid_0";

/// Behavior constants
pub const DEFAULT_WORKERS: usize = 3;
/// Largest SiO2 drop between consecutive samples still treated as noise
pub const SIO2_TOLERANCE: f64 = 0.01;

const DEFAULT_COMMAND: &str = "run_alphamelts.command -f melts_env.txt";

/// Answers fed to the alphaMELTS menu: read sc.melts, set liquidus, run
/// isobaric crystallization, then quit.
const DEFAULT_BATCH_SCRIPT: &str = "1\nsc.melts\n10\n1\n3\n1\nliquid\n1\n0.99\n1\n10\n0\n4\n0\n";

/// Fixed settings for every cooling-path simulation in a run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// MELTS or pMELTS
    pub version: String,
    /// isobaric, ptpath, ...
    pub mode: String,
    pub fo2_buffer: String,
    pub fo2_delta: f64,
    /// Celsius
    pub initial_temperature: f64,
    /// bar
    pub initial_pressure: f64,
    pub delta_t: f64,
    pub delta_p: f64,
    /// Pressure change per temperature step along the path
    pub dp_dt: f64,
    /// Melt fraction (0..1) at which the simulator itself stops stepping
    pub stop_melt_fraction: f64,
    /// Stop the scan once remaining melt drops below this percentage
    pub min_percent_melt: f64,
    pub suppress: Vec<String>,
    pub batch_script: String,
    pub command: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            version: "pMELTS".to_string(),
            mode: "isobaric".to_string(),
            fo2_buffer: "FMQ".to_string(),
            fo2_delta: 1.0,
            initial_temperature: 1700.0,
            initial_pressure: 600.0,
            delta_t: -10.0,
            delta_p: 0.0,
            dp_dt: 0.0,
            stop_melt_fraction: 0.005,
            min_percent_melt: 10.0,
            suppress: vec!["apatite".to_string(), "whitlockite".to_string()],
            batch_script: DEFAULT_BATCH_SCRIPT.to_string(),
            command: command_from_env(),
        }
    }
}

fn command_from_env() -> String {
    std::env::var("TAPATITE_MELTS").unwrap_or_else(|_| DEFAULT_COMMAND.to_string())
}

impl SimulationConfig {
    /// Load settings from a TOML file, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, TapatiteError> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    TapatiteError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::from_toml(&content)?
            }
            None => {
                tracing::debug!("no simulation config given, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, TapatiteError> {
        toml::from_str(content).map_err(|e| TapatiteError::Config(format!("bad config: {e}")))
    }

    pub fn validate(&self) -> Result<(), TapatiteError> {
        if self.delta_t == 0.0 {
            return Err(TapatiteError::Config("delta_t must be non-zero".into()));
        }
        if !(0.0..=100.0).contains(&self.min_percent_melt) {
            return Err(TapatiteError::Config(format!(
                "min_percent_melt must be within 0..=100, got {}",
                self.min_percent_melt
            )));
        }
        if !(0.0..1.0).contains(&self.stop_melt_fraction) {
            return Err(TapatiteError::Config(format!(
                "stop_melt_fraction must be within 0..1, got {}",
                self.stop_melt_fraction
            )));
        }
        if self.command.trim().is_empty() {
            return Err(TapatiteError::Config("empty simulator command".into()));
        }
        Ok(())
    }

    /// Lowest temperature the simulator is allowed to step down to
    pub fn final_temperature(&self) -> f64 {
        if self.delta_t < 0.0 {
            0.0
        } else {
            self.initial_temperature + 1000.0
        }
    }
}

/// Run execution configuration (from CLI flags)
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Number of parallel workers
    pub workers: usize,
    /// Root under which each worker creates its per-task scratch directory
    pub scratch_root: PathBuf,
    /// Show the progress bar on stderr
    pub progress: bool,
}

impl RunConfig {
    pub fn new(workers: usize, scratch_root: Option<PathBuf>, progress: bool) -> Self {
        Self {
            workers,
            scratch_root: scratch_root.unwrap_or_else(std::env::temp_dir),
            progress,
        }
    }

    pub fn validate(&self) -> Result<(), TapatiteError> {
        if self.workers == 0 {
            return Err(TapatiteError::Config("at least one worker is required".into()));
        }
        Ok(())
    }
}
