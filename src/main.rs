//! ringwidth CLI
//!
//! Command-line interface over the ringwidth library:
//! - Inspect Heidelberg files
//! - Apply altitude correction or chronology fitting and write results
//! - Query chronology statistics
//! - Export records as CSV

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ringwidth::config::{generate_default_config, Config};
use ringwidth::heidelberg;
use ringwidth::{export, Series, TreeringRecord};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ringwidth")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Read, correct and fit Heidelberg tree-ring series")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize the records in a file
    Inspect {
        /// Heidelberg file
        path: PathBuf,
        /// Print summaries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a linear altitude correction to every series
    Correct {
        /// Heidelberg file
        path: PathBuf,
        /// Multiplicative factor (default from config)
        #[arg(long)]
        factor: Option<f64>,
        /// Additive offset (default from config)
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<f64>,
        /// Output file (default: <input>_corrected.fh)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fit every series against a reference chronology
    Fit {
        /// Heidelberg file with the series to fit
        path: PathBuf,
        /// Single-record chronology file
        #[arg(short, long)]
        chronology: PathBuf,
        /// Output file (default: <input>_fitted.fh)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Mean and variance of a chronology over a year range
    Stats {
        /// Single-record chronology file
        path: PathBuf,
        /// First year (inclusive)
        #[arg(long, allow_hyphen_values = true)]
        from: i32,
        /// Last year (inclusive)
        #[arg(long, allow_hyphen_values = true)]
        to: i32,
    },

    /// Export per-year values as CSV
    Export {
        /// Heidelberg file
        path: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Config loading logs before the configured subscriber exists
    let config = tracing::subscriber::with_default(bootstrap_subscriber(), || {
        load_config(cli.config.as_deref())
    })?;

    init_logging(&config);

    match cli.command {
        Commands::Inspect { path, json } => {
            let series = heidelberg::read_series(&path)?;
            if json {
                println!("{}", export::summaries_to_json(&series)?);
            } else {
                println!("{} record(s) in {}", series.len(), path.display());
                for summary in export::summarize(&series) {
                    println!("  {summary}");
                }
            }
        }

        Commands::Correct {
            path,
            factor,
            offset,
            output,
        } => {
            let factor = factor.unwrap_or(config.correction.factor);
            let offset = offset.unwrap_or(config.correction.offset);

            let mut series = heidelberg::read_series(&path)?;
            for s in &mut series {
                s.altitude_correction(factor, offset);
            }
            write_output(&series, output.as_deref(), &config)?;
        }

        Commands::Fit {
            path,
            chronology,
            output,
        } => {
            let chronology = heidelberg::read_chronology(&chronology)?;
            let mut series = heidelberg::read_series(&path)?;
            for s in &mut series {
                s.altitude_fitting(&chronology)
                    .with_context(|| format!("fitting series {}", s.key()))?;
            }
            write_output(&series, output.as_deref(), &config)?;
        }

        Commands::Stats { path, from, to } => {
            if from > to {
                bail!("--from {from} is after --to {to}");
            }
            let chronology = heidelberg::read_chronology(&path)?;
            let window = chronology.window(from, to);
            if window.is_empty() {
                tracing::warn!(
                    "{}-{} does not overlap chronology {} ({}-{})",
                    from,
                    to,
                    chronology.key(),
                    chronology.begin(),
                    chronology.end()
                );
            }

            println!("Chronology: {}", chronology.key());
            println!("Years:      {from}-{to} ({} values)", window.len());
            println!("Mean:       {:.5}", chronology.mean(from, to));
            println!("Variance:   {:.5}", chronology.variance(from, to));
        }

        Commands::Export { path, output } => {
            let series = heidelberg::read_series(&path)?;
            match output {
                Some(out) => {
                    let file = std::fs::File::create(&out)
                        .with_context(|| format!("creating {}", out.display()))?;
                    export::write_csv(file, &series)?;
                    tracing::info!("Exported {} record(s) to {:?}", series.len(), out);
                }
                None => export::write_csv(std::io::stdout().lock(), &series)?,
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{content}"),
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(Config::load_default()),
    }
}

fn write_output(series: &[Series], output: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    let written = heidelberg::write_file_with(series, output, &config.codec)?;
    println!("Wrote {} series to {}", series.len(), written.display());
    Ok(())
}

fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ringwidth=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("ringwidth={}", config.logging.level)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
