use anyhow::{Context, Result};
use apportion::{run, run_traced, write_priority_list, MeanMode, Registry, Report, RunOutcome, Settings};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Tsv,
    Json,
}

/// Apportion seats across entities by population (priority method)
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Population table with a header row
    #[arg(default_value = "state_inputs.tsv")]
    input: PathBuf,

    /// JSON settings file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Total seats to hand out, including each entity's first seat
    #[arg(long)]
    seats: Option<u32>,

    /// geometric (Huntington-Hill) or arithmetic (Webster)
    #[arg(long)]
    mean: Option<MeanMode>,

    /// Field delimiter for input and delimited output
    #[arg(long)]
    delimiter: Option<char>,

    /// Header of the entity name column
    #[arg(long)]
    name_column: Option<String>,

    /// Header of the population column
    #[arg(long)]
    population_column: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    format: OutputFormat,

    /// Also print the seat-by-seat priority list
    #[arg(long)]
    trace: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let settings = resolve_settings(&args)?;

    info!(input = %args.input.display(), "loading population table");

    let mut registry = Registry::load_path(&args.input, &settings.table)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    let outcome = if args.trace {
        run_traced(&mut registry, &settings.run)
    } else {
        run(&mut registry, &settings.run)
    }
    .context("Apportionment failed")?;

    // Render fully before writing anything
    let report = Report::from_registry(&registry);
    let buf = render(&report, &outcome, &args, &settings)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&buf).context("Failed to write report")?;
    stdout.flush()?;

    Ok(())
}

fn render(report: &Report, outcome: &RunOutcome, args: &Args, settings: &Settings) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match (args.format, args.trace) {
        (OutputFormat::Tsv, false) => report.write_delimited(&mut buf, &settings.table)?,
        (OutputFormat::Tsv, true) => {
            report.write_delimited(&mut buf, &settings.table)?;
            buf.push(b'\n');
            write_priority_list(&mut buf, &outcome.allocations, &settings.table)?;
        }
        // stdout must stay a single JSON document
        (OutputFormat::Json, false) => report.write_json(&mut buf)?,
        (OutputFormat::Json, true) => {
            report.write_json_with_priority_list(&mut buf, &outcome.allocations)?
        }
    }
    if matches!(args.format, OutputFormat::Json) {
        buf.push(b'\n');
    }
    Ok(buf)
}

/// defaults < settings file < flags
fn resolve_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?,
        None => Settings::default(),
    };

    if let Some(seats) = args.seats {
        settings.run.target_total_seats = seats;
    }
    if let Some(mean) = args.mean {
        settings.run.mean_mode = mean;
    }
    if let Some(delimiter) = args.delimiter {
        settings.table.delimiter = delimiter;
    }
    if let Some(name) = &args.name_column {
        settings.table.name_column = name.clone();
    }
    if let Some(population) = &args.population_column {
        settings.table.population_column = population.clone();
    }

    Ok(settings)
}
