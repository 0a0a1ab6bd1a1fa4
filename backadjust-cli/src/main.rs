//! Backadjust CLI: adjust, compare, and batch commands.
//!
//! Commands:
//! - `adjust`: back-adjust one price file for its action log
//! - `compare`: reconcile an adjusted series against a reference, or rank
//!   every configuration variant with `--sweep`
//! - `batch`: adjust every symbol in a directory in parallel

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use backadjust_core::batch::{adjust_universe, SymbolInput};
use backadjust_core::data::{self, read_actions_csv, write_adjusted_csv, write_adjusted_parquet};
use backadjust_core::domain::{AdjustedSeries, PriceObservation, RawAction};
use backadjust_core::fingerprint::AdjustmentFingerprint;
use backadjust_core::reconcile::{compare, sweep, ReconciliationReport};
use backadjust_core::{
    AdjustConfig, BoundaryMode, DividendScaling, LookupConvention, PolicyKind, PriceAdjuster,
};

#[derive(Parser)]
#[command(
    name = "backadjust",
    about = "Backadjust CLI: split- and dividend-adjusted close series"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back-adjust a raw close series for its corporate actions.
    Adjust {
        /// Price file: CSV (date,close[,adj_close]) or Parquet.
        #[arg(long)]
        prices: PathBuf,

        /// Action log CSV (date,action,value). Omit for no actions.
        #[arg(long)]
        actions: Option<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output file; `.parquet` writes Parquet, anything else CSV.
        /// Without it, the adjusted series is printed.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compare the adjusted series with a reference adjusted series.
    Compare {
        /// Price file: CSV (date,close[,adj_close]) or Parquet.
        #[arg(long)]
        prices: PathBuf,

        /// Action log CSV (date,action,value). Omit for no actions.
        #[arg(long)]
        actions: Option<PathBuf>,

        /// Reference file. Defaults to the price file's adj_close column.
        #[arg(long)]
        reference: Option<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,

        /// Run every configuration variant and rank them. Fixes no
        /// variant, so it cannot be combined with config options.
        #[arg(
            long,
            default_value_t = false,
            conflicts_with_all = ["config", "policy", "boundary", "lookup", "dividend_scaling"]
        )]
        sweep: bool,

        /// Maximum absolute error accepted by a plain comparison.
        #[arg(long, default_value_t = 1e-6)]
        tolerance: f64,

        /// Variants to print with --sweep.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Adjust every `SYMBOL.csv` in a directory.
    Batch {
        /// Directory of price files, each with an optional `SYMBOL.actions.csv`.
        #[arg(long)]
        input_dir: PathBuf,

        /// Directory for adjusted `SYMBOL.csv` files.
        #[arg(long, default_value = "adjusted")]
        output_dir: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

/// Config file plus per-field overrides.
#[derive(Args)]
struct ConfigArgs {
    /// TOML file with an [adjustment] table.
    #[arg(long)]
    config: Option<PathBuf>,

    /// price_ratio, inverse_price_ratio, or subtractive.
    #[arg(long)]
    policy: Option<PolicyKind>,

    /// post_event or pre_event.
    #[arg(long)]
    boundary: Option<BoundaryMode>,

    /// previous_close or same_day_close.
    #[arg(long)]
    lookup: Option<LookupConvention>,

    /// unscaled or split_adjusted.
    #[arg(long)]
    dividend_scaling: Option<DividendScaling>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<AdjustConfig> {
        let mut config = match &self.config {
            Some(path) => AdjustConfig::load(path)?,
            None => AdjustConfig::default(),
        };
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(boundary) = self.boundary {
            config.boundary = boundary;
        }
        if let Some(lookup) = self.lookup {
            config.lookup = lookup;
        }
        if let Some(scaling) = self.dividend_scaling {
            config.dividend_scaling = scaling;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Adjust {
            prices,
            actions,
            config,
            output,
        } => run_adjust(&prices, actions.as_deref(), &config, output.as_deref()),
        Commands::Compare {
            prices,
            actions,
            reference,
            config,
            sweep,
            tolerance,
            top,
        } => run_compare(
            &prices,
            actions.as_deref(),
            reference.as_deref(),
            &config,
            sweep,
            tolerance,
            top,
        ),
        Commands::Batch {
            input_dir,
            output_dir,
            config,
        } => run_batch(&input_dir, &output_dir, &config),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_actions(path: Option<&Path>) -> Result<Vec<RawAction>> {
    match path {
        Some(path) => read_actions_csv(path)
            .with_context(|| format!("reading actions from {}", path.display())),
        None => Ok(Vec::new()),
    }
}

fn run_adjust(
    prices_path: &Path,
    actions_path: Option<&Path>,
    config_args: &ConfigArgs,
    output: Option<&Path>,
) -> Result<()> {
    let config = config_args.resolve()?;
    let file = data::read_prices(prices_path)
        .with_context(|| format!("reading prices from {}", prices_path.display()))?;
    let actions = load_actions(actions_path)?;

    info!(
        dates = file.series.len(),
        actions = actions.len(),
        config = %config.label(),
        "adjusting"
    );
    let fingerprint = AdjustmentFingerprint::compute(&config, &file.series, &actions)?;
    let adjusted = PriceAdjuster::new(config).adjust(&file.series, &actions)?;

    print_summary(&config, &adjusted, actions.len());
    println!("Run hash: {}", fingerprint.run_hash());
    println!("{}", serde_json::to_string_pretty(&fingerprint)?);

    match output {
        Some(path) => {
            write_output(path, &adjusted)?;
            println!("Adjusted series saved to: {}", path.display());
        }
        None => print_series(&adjusted),
    }

    Ok(())
}

fn run_compare(
    prices_path: &Path,
    actions_path: Option<&Path>,
    reference_path: Option<&Path>,
    config_args: &ConfigArgs,
    run_sweep: bool,
    tolerance: f64,
    top: usize,
) -> Result<()> {
    let file = data::read_prices(prices_path)
        .with_context(|| format!("reading prices from {}", prices_path.display()))?;
    let actions = load_actions(actions_path)?;
    let reference = match reference_path {
        Some(path) => load_reference(path)?,
        None => match file.reference {
            Some(reference) => reference,
            None => bail!(
                "{} has no adj_close column; pass --reference",
                prices_path.display()
            ),
        },
    };

    if run_sweep {
        let outcomes = sweep(&file.series, &actions, &reference);
        println!("Variants ranked by mean absolute error:");
        for (rank, outcome) in outcomes.iter().take(top).enumerate() {
            match &outcome.result {
                Ok(report) => println!(
                    "  {:>2}. {:<55} mean {:.6}  max {:.6}",
                    rank + 1,
                    outcome.config.label(),
                    report.mean_abs_error,
                    report.max_abs_error
                ),
                Err(e) => println!("  {:>2}. {:<55} failed: {e}", rank + 1, outcome.config.label()),
            }
        }
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        if failed > 0 {
            println!("{failed} of {} variants failed", outcomes.len());
        }
        return Ok(());
    }

    let config = config_args.resolve()?;
    let adjusted = PriceAdjuster::new(config).adjust(&file.series, &actions)?;
    let report = compare(&adjusted, &reference)?;
    print_report(&config, &report);

    if !report.within(tolerance) {
        bail!(
            "max absolute error {:.6} exceeds tolerance {tolerance}",
            report.max_abs_error
        );
    }
    Ok(())
}

fn run_batch(input_dir: &Path, output_dir: &Path, config_args: &ConfigArgs) -> Result<()> {
    let config = config_args.resolve()?;
    let inputs = load_symbols(input_dir)?;
    if inputs.is_empty() {
        bail!("no price files found in {}", input_dir.display());
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    info!(
        symbols = inputs.len(),
        input_dir = %input_dir.display(),
        config = %config.label(),
        "adjusting batch"
    );
    let outputs = adjust_universe(&inputs, config);
    let mut failed = 0usize;
    for output in &outputs {
        match &output.result {
            Ok(adjusted) => {
                let path = output_dir.join(format!("{}.csv", output.symbol));
                write_adjusted_csv(&path, adjusted)?;
                println!(
                    "{:<10} {:>6} dates  -> {}",
                    output.symbol,
                    adjusted.len(),
                    path.display()
                );
            }
            Err(e) => {
                failed += 1;
                eprintln!("Error for {}: {e}", output.symbol);
            }
        }
    }

    println!(
        "Adjusted {} of {} symbols ({})",
        outputs.len() - failed,
        outputs.len(),
        config.label()
    );
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// `SYMBOL.csv` price files, sorted by symbol, with any `SYMBOL.actions.csv`.
fn load_symbols(input_dir: &Path) -> Result<Vec<SymbolInput>> {
    let mut symbols: Vec<String> = fs::read_dir(input_dir)
        .with_context(|| format!("reading {}", input_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let symbol = name.strip_suffix(".csv")?;
            (!symbol.contains('.')).then(|| symbol.to_string())
        })
        .collect();
    symbols.sort();

    symbols
        .into_iter()
        .map(|symbol| {
            let prices_path = input_dir.join(format!("{symbol}.csv"));
            let actions_path = input_dir.join(format!("{symbol}.actions.csv"));
            let prices = data::read_prices(&prices_path)
                .with_context(|| format!("reading prices from {}", prices_path.display()))?
                .series;
            let actions = load_actions(actions_path.exists().then_some(actions_path.as_path()))?;
            Ok(SymbolInput {
                symbol,
                prices,
                actions,
            })
        })
        .collect()
}

/// A reference file's `adj_close` column, or its `close` column if it has none.
fn load_reference(path: &Path) -> Result<Vec<PriceObservation>> {
    let file = data::read_prices(path)
        .with_context(|| format!("reading reference from {}", path.display()))?;
    Ok(file
        .reference
        .unwrap_or_else(|| file.series.observations().to_vec()))
}

fn write_output(path: &Path, adjusted: &AdjustedSeries) -> Result<()> {
    let is_parquet = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_adjusted_parquet(path, adjusted)?;
    } else {
        write_adjusted_csv(path, adjusted)?;
    }
    Ok(())
}

fn print_summary(config: &AdjustConfig, adjusted: &AdjustedSeries, action_count: usize) {
    let range = match (adjusted.points.first(), adjusted.points.last()) {
        (Some(first), Some(last)) => format!("{} to {}", first.date, last.date),
        _ => "empty".to_string(),
    };

    println!();
    println!("=== Adjustment Summary ===");
    println!("Config:         {}", config.label());
    println!("Dates:          {} ({range})", adjusted.len());
    println!("Actions:        {action_count}");
    if let Some(first) = adjusted.points.first() {
        println!("Split factor:   {:.6} (earliest date)", first.split_factor);
        println!("Dividend corr.: {:.6} (earliest date)", first.dividend_correction);
    }
    let negative: Vec<NaiveDate> = adjusted.negative_points().map(|p| p.date).collect();
    if let (Some(first), Some(last)) = (negative.first(), negative.last()) {
        println!(
            "Negative:       {} dates, {first} to {last}",
            negative.len()
        );
    }
    println!();
}

fn print_series(adjusted: &AdjustedSeries) {
    println!("{:<12} {:>14} {:>14}", "date", "close", "adjusted");
    for point in &adjusted.points {
        println!(
            "{:<12} {:>14.4} {:>14.4}",
            point.date, point.raw_close, point.adjusted_close
        );
    }
}

fn print_report(config: &AdjustConfig, report: &ReconciliationReport) {
    println!();
    println!("=== Reconciliation ===");
    println!("Config:         {}", config.label());
    println!("Compared:       {}", report.compared);
    println!("No reference:   {}", report.missing_in_reference);
    if report.non_finite_reference > 0 {
        println!("NaN reference:  {}", report.non_finite_reference);
    }
    println!("Max abs error:  {:.6}", report.max_abs_error);
    println!("Mean abs error: {:.6}", report.mean_abs_error);
    println!("Max rel error:  {:.4}%", report.max_rel_error * 100.0);
    if let Some(date) = report.worst_date {
        println!("Worst date:     {date}");
    }
    println!();
}
