mod apatite;
mod cli;
mod composition;
mod config;
mod error;
mod pipeline;
mod saturation;
mod scratch;
mod simulator;
mod trace;
mod tui;

use std::io::{IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Command};
use composition::Batch;
use config::{RunConfig, SimulationConfig};
use error::TapatiteError;
use pipeline::Sinks;
use simulator::melts::MeltsSimulator;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tapatite=info")))
        .init();

    let result = match cli.command {
        Some(Command::Bulk { ref input }) => show_bulk(input),
        None => run(&cli).await,
    };

    if let Err(e) = result {
        eprintln!("\n  \x1b[31m✗\x1b[0m {e}\n");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), TapatiteError> {
    let input = cli
        .input
        .as_deref()
        .ok_or_else(|| TapatiteError::Config("no input file given".into()))?;

    let mut sim_config = SimulationConfig::load(cli.config.as_deref())?;
    if let Some(min_melt) = cli.min_melt {
        sim_config.min_percent_melt = min_melt;
        sim_config.validate()?;
    }

    let show_ui = !cli.quiet && std::io::stderr().is_terminal();
    let run_config = RunConfig::new(cli.workers, cli.scratch.clone(), show_ui);
    run_config.validate()?;

    // Configuration and input problems abort here, before any work is dispatched.
    let batch = Batch::load(input)?;
    if batch.is_empty() {
        tracing::warn!("{} holds no compositions", input.display());
    }

    let results: Box<dyn Write + Send> = match &cli.output {
        Some(path) => Box::new(std::io::BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(std::io::stdout()),
    };
    let sinks = Sinks {
        results,
        ..Sinks::stdio()
    };

    if show_ui {
        tui::show_banner();
        tui::status_line(
            "░",
            tui::COLD,
            &format!(
                "{} compositions from {}, {} workers",
                batch.len(),
                input.display(),
                run_config.workers
            ),
        );
    }

    let min_percent_melt = sim_config.min_percent_melt;
    let simulator = Arc::new(MeltsSimulator::new(sim_config));
    let start = std::time::Instant::now();
    let summary = pipeline::run(batch, simulator, min_percent_melt, &run_config, sinks).await?;

    tracing::info!(
        emitted = summary.emitted,
        dropped = summary.dropped,
        "batch complete"
    );
    if show_ui {
        tui::summary(&summary, start.elapsed().as_secs());
    }
    Ok(())
}

fn show_bulk(input: &Path) -> Result<(), TapatiteError> {
    let batch = Batch::load(input)?;
    let stdout = std::io::stdout();
    write_bulk(&batch, &mut stdout.lock())?;
    Ok(())
}

/// Trace-free figures for every composition, one tab-separated row each
fn write_bulk(batch: &Batch, out: &mut impl Write) -> Result<(), std::io::Error> {
    writeln!(out, "Kv\tMbulk\tTsatbulk\tSiO2\tP2O5bulk")?;
    for composition in &batch.compositions {
        let (m_bulk, t_sat_bulk) = saturation::bulk_figures(composition);
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            composition.kv(),
            m_bulk,
            t_sat_bulk,
            composition.sio2(),
            composition.p2o5()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use composition::tests::rock;

    #[test]
    fn bulk_rows() {
        let batch = Batch {
            compositions: vec![rock(60.0, 0.3, 1.0), rock(70.0, 0.0, 2.0)],
        };
        let mut out = Vec::new();
        write_bulk(&batch, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1\t"));
        let cells: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(cells[2], apatite::tapatite(60.0, 0.3).to_string());
        assert_eq!(lines[2].split('\t').nth(2), Some("NaN"));
    }
}
