use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use gdelt_daily::app::{App, RunOptions};
use gdelt_daily::bigquery::{BigQueryHttpClient, RowSet, WarehouseClient};
use gdelt_daily::config::{ConfigLoader, ConfigOverrides, EnvVars, ResolvedConfig};
use gdelt_daily::domain::{DatasetKind, TargetDate};
use gdelt_daily::error::GdeltError;
use gdelt_daily::output::{JsonOutput, OutputMode, TextOutput};
use gdelt_daily::query::WarehouseQuery;
use gdelt_daily::store::Store;

#[derive(Parser)]
#[command(name = "gdelt-daily")]
#[command(about = "Fetch one day of GDELT Events / GKG rows from BigQuery into SQLite")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch Event records for a day (example: gdelt-daily events 2025-01-06)")]
    Events(RunArgs),
    #[command(about = "Fetch GKG records for a day (example: gdelt-daily gkg 2025-01-06)")]
    Gkg(RunArgs),
    #[command(about = "Fetch both datasets for a day")]
    All(RunArgs),
}

#[derive(Args, Clone)]
struct RunArgs {
    #[arg(help = "Date (YYYY-MM-DD)")]
    date: String,

    #[arg(long, short = 'p', help = "BigQuery project ID")]
    project: Option<String>,

    #[arg(long = "max", short = 'm', help = "Max records to fetch")]
    max_records: Option<u64>,

    #[arg(long)]
    db_dir: Option<String>,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        if let Some(GdeltError::InvalidDate(input)) = report.downcast_ref::<GdeltError>() {
            eprintln!("Error: Invalid date format '{input}'. Use YYYY-MM-DD.");
            return ExitCode::from(1);
        }
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<GdeltError>() {
            return ExitCode::from(error.exit_code());
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Events(args) => run_command(Some(DatasetKind::Events), args, output_mode),
        Commands::Gkg(args) => run_command(Some(DatasetKind::Gkg), args, output_mode),
        Commands::All(args) => run_command(None, args, output_mode),
    }
}

fn prepare(args: &RunArgs) -> Result<(ResolvedConfig, RunOptions), GdeltError> {
    // Reject a bad date before reading config or touching the db directory.
    args.date.parse::<TargetDate>()?;

    let overrides = ConfigOverrides {
        project_id: args.project.clone(),
        max_records: args.max_records,
        db_dir: args.db_dir.clone(),
    };
    let config = ConfigLoader::resolve(args.config.as_deref(), &EnvVars::capture(), overrides)?;
    let options = RunOptions {
        max_records: config.max_records,
        dry_run: args.dry_run,
    };
    Ok((config, options))
}

struct NopWarehouse;

impl WarehouseClient for NopWarehouse {
    fn run_query(&self, _query: &WarehouseQuery) -> Result<RowSet, GdeltError> {
        Err(GdeltError::WarehouseHttp(
            "warehouse client not configured".to_string(),
        ))
    }
}

fn run_command(
    kind: Option<DatasetKind>,
    args: RunArgs,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let (config, options) = prepare(&args)?;
    tracing::info!(
        project = %config.project_id,
        db_dir = %config.db_dir,
        dry_run = options.dry_run,
        "starting run"
    );
    let store = Store::new(config.db_dir.clone());

    if options.dry_run {
        let app = App::new(store, NopWarehouse);
        return execute(app, kind, &args.date, options, output_mode);
    }

    let client = BigQueryHttpClient::new(
        &config.endpoint,
        &config.project_id,
        config.access_token.as_deref(),
        config.timeout,
    )?;
    let app = App::new(store, client);
    execute(app, kind, &args.date, options, output_mode)
}

fn execute<W: WarehouseClient>(
    app: App<W>,
    kind: Option<DatasetKind>,
    date: &str,
    options: RunOptions,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match (kind, output_mode) {
        (Some(kind), OutputMode::NonInteractive) => {
            let result = app.run(kind, date, options, &JsonOutput)?;
            JsonOutput::print_run(&result).into_diagnostic()?;
        }
        (Some(kind), OutputMode::Interactive) => {
            let result = app.run(kind, date, options, &TextOutput)?;
            TextOutput::print_run(&result);
        }
        (None, OutputMode::NonInteractive) => {
            let result = app.run_all(date, options, &JsonOutput)?;
            JsonOutput::print_batch(&result).into_diagnostic()?;
        }
        (None, OutputMode::Interactive) => {
            let result = app.run_all(date, options, &TextOutput)?;
            TextOutput::print_batch(&result);
        }
    }
    Ok(())
}
