//! `tt1` — load TT-1 shot exports, print their summaries and plot them.
//!
//! ```bash
//! # Compare plasma current and density of two shots, 200-450 ms
//! tt1 plot --data-dir output --shots 1201 1202 --load IP1 HCN1 \
//!     --channels IP1 NE1 --t-init 200 --t-final 450 --save
//!
//! # Summary of one shot as `label, value` lines
//! tt1 summary --data-dir output --shot 1201 --load IP1 HCN1 IT1 --format csv
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use tt1_analysis::{plot_shots, render_summary, Calculator, Config, ShotRecord, SummaryFormat};

#[derive(Parser)]
#[command(name = "tt1")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML file with [plot], [physics] and [summary] tables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plot channels of one or more shots in stacked panels
    Plot {
        /// Directory holding one sub-directory per shot
        #[arg(short, long, value_name = "DIR")]
        data_dir: PathBuf,

        /// Shot numbers, in legend order
        #[arg(short, long, num_args = 1.., required = true)]
        shots: Vec<u32>,

        /// Channels to read from disk, in processing order (IP before HCN)
        #[arg(short, long, num_args = 1.., required = true)]
        load: Vec<String>,

        /// Channels to draw (defaults to the loaded ones)
        #[arg(long, num_args = 1..)]
        channels: Vec<String>,

        /// Start of the plotted window [ms]
        #[arg(long)]
        t_init: Option<f64>,

        /// End of the plotted window [ms]
        #[arg(long)]
        t_final: Option<f64>,

        /// Resample traces to this period [ms]
        #[arg(long)]
        resample: Option<f64>,

        /// Write DischargePlots_<shots>.png
        #[arg(long)]
        save: bool,

        /// Where the figure is written
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Draw each shot's summary on the first panel
        #[arg(long)]
        print_summary: bool,
    },

    /// Print the derived quantities of one shot
    Summary {
        #[arg(short, long, value_name = "DIR")]
        data_dir: PathBuf,

        #[arg(short, long)]
        shot: u32,

        /// Channels to read from disk, in processing order (IP before HCN)
        #[arg(short, long, num_args = 1.., required = true)]
        load: Vec<String>,

        /// Output layout (overrides the config file)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Aligned,
    Json,
}

impl From<FormatArg> for SummaryFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => SummaryFormat::Csv,
            FormatArg::Aligned => SummaryFormat::Aligned,
            FormatArg::Json => SummaryFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Plot {
            data_dir,
            shots,
            load,
            channels,
            t_init,
            t_final,
            resample,
            save,
            output_dir,
            print_summary,
        } => {
            let mut plot = config.plot;
            if let Some(t) = t_init {
                plot.t_init = t;
            }
            if let Some(t) = t_final {
                plot.t_final = t;
            }
            if let Some(dir) = output_dir {
                plot.output_dir = dir;
            }
            plot.resample_period = resample.or(plot.resample_period);
            plot.save |= save;
            plot.print_summary |= print_summary;

            let calculator = Calculator::new(config.physics);
            let records = shots
                .iter()
                .map(|&shot| load_shot(shot, &data_dir, &load, &calculator))
                .collect::<Result<Vec<_>>>()?;
            let channels = if channels.is_empty() { load } else { channels };

            let figure =
                plot_shots(&records, channels.as_slice(), &plot).context("Failed to plot shots")?;
            match figure.saved_to {
                Some(path) => println!("Saved {}", path.display()),
                None => info!("Rendered {} byte PNG (not saved)", figure.png.len()),
            }
            Ok(())
        }
        Commands::Summary {
            data_dir,
            shot,
            load,
            format,
        } => {
            let calculator = Calculator::new(config.physics);
            let record = load_shot(shot, &data_dir, &load, &calculator)?;
            let format = format.map(SummaryFormat::from).unwrap_or(config.summary.format);
            println!("{}", render_summary(&record, format)?);
            Ok(())
        }
    }
}

fn load_shot(
    shot: u32,
    data_dir: &Path,
    channels: &[String],
    calculator: &Calculator,
) -> Result<ShotRecord> {
    let mut record = ShotRecord::with_calculator(shot, data_dir, calculator.clone());
    record
        .load_channels(channels)
        .with_context(|| format!("Failed to load shot {shot}"))?;
    Ok(record)
}
