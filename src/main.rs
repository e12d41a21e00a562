//! traffic-counts command line
//!
//! ```bash
//! # Raise every hourly count by 13%
//! traffic-counts scale counts.xlsx counts_modified.xlsx
//!
//! # Force the 24-hour preset totals and check them
//! traffic-counts force-totals day.xlsx day_forced.xlsx --preset twenty-four-hour
//! traffic-counts verify day_forced.xlsx --preset twenty-four-hour
//!
//! # Serve one JSON scale request from stdin
//! traffic-counts request < request.json
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use traffic_counts_lib::commands;
use traffic_counts_lib::config::{Preset, Profile};
use traffic_counts_lib::random::SystemRandom;
use traffic_counts_lib::scaler::{LabelRule, ScaleOptions};

/// Scale and reconcile traffic-count workbooks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Multiply the counts of the hourly sheets by a percentage
    Scale {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Percentage to apply
        #[arg(default_value_t = 13.0)]
        percentage: f64,

        /// "increase" or "decrease"
        #[arg(default_value = "increase")]
        operation: String,

        /// Require a non-formula text label in column A
        #[arg(long)]
        strict_labels: bool,

        /// Seed the jitter for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Redistribute per-direction totals across the hourly sheets
    ForceTotals {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[command(flatten)]
        profile: ProfileArgs,

        /// Seed the redistribution for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Compare a workbook against the profile totals
    Verify {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Handle one JSON scale request and print the JSON response
    Request {
        /// Read the request from a file instead of stdin
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct ProfileArgs {
    /// Profile TOML. Takes precedence over --preset
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Built-in profile. Takes precedence over the config directory profile,
    /// which otherwise falls back to sixteen-hour
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,
}

impl ProfileArgs {
    fn resolve(&self) -> anyhow::Result<Profile> {
        let profile = Profile::resolve(self.profile.as_deref(), self.preset.map(Preset::from))?;
        Ok(profile)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PresetArg {
    SixteenHour,
    TwentyFourHour,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::SixteenHour => Preset::SixteenHour,
            PresetArg::TwentyFourHour => Preset::TwentyFourHour,
        }
    }
}

fn path_str(path: &std::path::Path) -> anyhow::Result<&str> {
    path.to_str()
        .with_context(|| format!("Path is not valid UTF-8: {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `request` keeps stdout for JSON
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Scale {
            input,
            output,
            percentage,
            operation,
            strict_labels,
            seed,
        } => {
            let rule = if strict_labels { LabelRule::Strict } else { LabelRule::Lenient };
            let options = ScaleOptions::parse(percentage, &operation)?.with_label_rule(rule);
            let mut rng = SystemRandom::from_seed_option(seed);

            info!("Processing: {}", input.display());
            let (report, saved) =
                commands::scale_file(path_str(&input)?, path_str(&output)?, &options, &mut rng)
                    .with_context(|| format!("Failed to scale {}", input.display()))?;

            for line in report.log_lines() {
                println!("{}", line);
            }
            println!("Saved to: {} (sha256 {})", saved.path, saved.checksum);
        }

        Command::ForceTotals {
            input,
            output,
            profile,
            seed,
        } => {
            let profile = profile.resolve()?;
            let mut rng = SystemRandom::from_seed_option(seed);

            info!("Processing: {}", input.display());
            let (report, saved) =
                commands::force_totals_file(path_str(&input)?, path_str(&output)?, &profile, &mut rng)
                    .with_context(|| format!("Failed to force totals on {}", input.display()))?;

            println!("Hourly sheets: {}", report.hourly_sheets.len());
            for (direction, rows) in report.direction_rows.iter() {
                println!("{} rows: {:?}", direction, rows);
            }
            for direction in &report.skipped_directions {
                println!("{} not found, skipped", direction);
            }
            if report.formula_cells_skipped > 0 {
                println!("{} formula cells left untouched", report.formula_cells_skipped);
            }
            if let Some(rows) = &report.summary_rows {
                for (direction, row) in rows {
                    println!("Summary row {} for {}", row, direction);
                }
            }
            print!("{}", report.verification);
            println!("Saved to: {} (sha256 {})", saved.path, saved.checksum);
        }

        Command::Verify { input, profile } => {
            let profile = profile.resolve()?;
            let report = commands::verify_file(path_str(&input)?, &profile)
                .with_context(|| format!("Failed to verify {}", input.display()))?;

            print!("{}", report);
            if !report.is_exact() {
                std::process::exit(1);
            }
        }

        Command::Request { input } => {
            let payload = match input {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read request {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .context("Failed to read request from stdin")?;
                    buffer
                }
            };

            let response = commands::handle_scale_request(&payload, &mut SystemRandom::from_entropy());
            println!("{}", response.body);
            if !response.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
