//! Command line entry point.
//!
//! [`BaseArgs`] holds the options every run accepts: where parameters and reports live,
//! logging, and overrides for the most commonly changed parameters. Overrides are applied on
//! top of the parameters read from `--config` (or the defaults), so a run can start from a
//! shared configuration file and vary a single value.
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Command, FromArgMatches as _};

use crate::context::Context;
use crate::error::EpiError;
use crate::global_properties::read_global_property;
use crate::log::{set_log_level, LevelFilter};
use crate::parameters::{ModelType, Parameters, Params};
#[cfg(feature = "progress_bar")]
use crate::progress::{init_day_progress_bar, update_day_progress, ContextProgressExt};
use crate::report::ContextReportExt;
use crate::simulation::{ContextSimulationExt, DailyResult};
use crate::transmission_manager::TransmissionEvent;

/// Default cli arguments for the epitown runner
#[derive(Args, Debug, Default, Clone)]
pub struct BaseArgs {
    /// Random seed, overriding the one in the configuration
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Optional path for a parameters config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for report output
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Prefix for report file names
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Overwrite existing report files
    #[arg(short, long)]
    pub force_overwrite: bool,

    /// Enable logging at the given level (error, warn, info, debug or trace)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Do not show a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Number of residents
    #[arg(long)]
    pub population: Option<usize>,

    /// Percent of the population infectious on day 0
    #[arg(long)]
    pub starting_infectious_percentage: Option<f64>,

    /// Days a person stays infectious
    #[arg(long)]
    pub infectious_duration: Option<usize>,

    /// Days to simulate
    #[arg(long)]
    pub days: Option<usize>,

    /// Basic reproduction number
    #[arg(long)]
    pub r0: Option<f64>,

    /// SIR or SIS
    #[arg(long)]
    pub model_type: Option<ModelType>,
}

fn create_epitown_cli() -> Command {
    let cli = Command::new("epitown")
        .about("Simulates an epidemic spreading through a synthetic town");
    BaseArgs::augment_args(cli)
}

/// Reads the parameters file, if any, and applies the command line overrides.
///
/// # Errors
///
/// Returns an `EpiError` if the config file cannot be read. Values are validated later, when
/// the simulation is set up.
pub fn build_params(args: &BaseArgs) -> Result<Params, EpiError> {
    let mut params = match &args.config {
        Some(path) => {
            println!("Loading parameters from: {}", path.display());
            read_global_property::<Parameters>(path)?
        }
        None => Params::default(),
    };
    if let Some(seed) = args.random_seed {
        params.seed = seed;
    }
    if let Some(population) = args.population {
        params.population = population;
    }
    if let Some(percentage) = args.starting_infectious_percentage {
        params.starting_infectious_percentage = percentage;
    }
    if let Some(duration) = args.infectious_duration {
        params.infectious_duration_days = duration;
    }
    if let Some(days) = args.days {
        params.simulation_days = days;
    }
    if let Some(r0) = args.r0 {
        params.r0 = r0;
    }
    if let Some(model_type) = args.model_type {
        params.model_type = model_type;
    }
    Ok(params)
}

fn parse_log_level(level: &str) -> Result<LevelFilter, EpiError> {
    LevelFilter::from_str(level).map_err(|_| {
        EpiError::ConfigurationError(format!(
            "unknown log level {level:?}, expected off, error, warn, info, debug or trace"
        ))
    })
}

/// Runs a simulation configured by `args`, writing the `daily_results` and `transmissions`
/// reports, and returns the finished context.
///
/// # Errors
///
/// Returns an `EpiError` if the parameters are invalid or a report file cannot be created.
pub fn run_with_args(args: BaseArgs) -> Result<Context, EpiError> {
    if let Some(level) = &args.log_level {
        set_log_level(parse_log_level(level)?);
    }
    let params = build_params(&args)?;

    let mut context = Context::new();
    context
        .report_options()
        .directory(args.output_dir.clone())
        .file_prefix(args.prefix.clone())
        .overwrite(args.force_overwrite);
    context.add_report::<DailyResult>("daily_results")?;
    context.add_report::<TransmissionEvent>("transmissions")?;

    #[cfg(feature = "progress_bar")]
    {
        if !args.no_progress {
            init_day_progress_bar(params.simulation_days);
            context.set_progress_callback(|day, _| update_day_progress(day));
        }
    }

    context.init_simulation(params)?;
    context.run_simulation()?;
    Ok(context)
}

/// Parses the process arguments and runs a simulation.
///
/// # Errors
///
/// Returns an error if argument parsing or the simulation fails.
pub fn run_from_cli() -> Result<Context, Box<dyn std::error::Error>> {
    let matches = create_epitown_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    Ok(run_with_args(args)?)
}
