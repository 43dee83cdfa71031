use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use listing_merger::config::Config;
use listing_merger::logging;
use listing_merger::observability;
use listing_merger::pipeline::{Pipeline, PipelineResult, SourceOutcome};
use listing_merger::report;

#[derive(Parser)]
#[command(name = "listing_merger")]
#[command(about = "Clean three business-listing datasets and merge them by phone")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML config file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the input CSV files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory receiving the workbooks
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline, then print the report
    Run {
        /// Also write the report as JSON
        #[arg(long)]
        report_json: Option<PathBuf>,
        /// Write a Prometheus text snapshot of the run's metrics
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },
    /// Load, normalize and export the three sources without merging
    Normalize,
    /// Print the report for an existing merged workbook
    Report {
        /// Merged workbook; defaults to dataset_4.xlsx in the output directory
        #[arg(long)]
        input: Option<PathBuf>,
        /// Also write the report as JSON
        #[arg(long)]
        report_json: Option<PathBuf>,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default(cli.config.as_deref())
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    Ok(config)
}

fn print_sources(sources: &[SourceOutcome]) {
    for outcome in sources {
        let r = &outcome.normalize;
        println!("\n📊 Normalized {}:", outcome.source);
        println!("   Input rows: {}", r.input_rows);
        println!("   Missing phone: {}", r.missing_phone);
        println!("   Duplicate phone: {}", r.duplicate_phone);
        println!("   Escape artifacts: {}", r.escape_artifacts);
        println!("   Output rows: {}", r.output_rows);
        println!("   Output file: {}", outcome.output_file.display());
    }
}

fn print_result(result: &PipelineResult) {
    print_sources(&result.sources);
    println!("\n🔗 Merge:");
    println!("   Distinct phones: {}", result.merge.joined_rows);
    println!("   Dropped without name: {}", result.merge.dropped_without_name);
    println!("   Listings: {}", result.merge.output_rows);
    println!("   Output file: {}", result.merged_file.display());
}

fn summarize_and_print(path: &std::path::Path, report_json: Option<&std::path::Path>) -> Result<()> {
    let report = report::load_and_summarize(path)
        .with_context(|| format!("Failed to read merged workbook {}", path.display()))?;
    println!();
    report::print_report(&report);
    if let Some(json_path) = report_json {
        report::write_json(&report, json_path)
            .with_context(|| format!("Failed to write report to {}", json_path.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Run {
            report_json,
            metrics_file,
        } => {
            println!("🚀 Running full pipeline...");
            let metrics_handle = if metrics_file.is_some() {
                Some(observability::init().context("Failed to install metrics recorder")?)
            } else {
                None
            };

            let report_json = report_json.or_else(|| config.report_json.clone());
            let pipeline = Pipeline::new(config);
            let result = match pipeline.run() {
                Ok(result) => result,
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    println!("❌ Pipeline failed: {}", e);
                    return Err(e).context("Pipeline run failed");
                }
            };
            print_result(&result);

            summarize_and_print(&result.merged_file, report_json.as_deref())?;

            if let (Some(handle), Some(path)) = (metrics_handle, metrics_file) {
                observability::write_snapshot(&handle, &path)
                    .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
            }
            println!("\n✅ Full pipeline completed successfully!");
        }
        Commands::Normalize => {
            println!("🔄 Normalizing sources...");
            let pipeline = Pipeline::new(config);
            let (_, sources) = pipeline.process_sources().context("Normalization failed")?;
            print_sources(&sources);
            println!("\n✅ Normalization completed successfully");
        }
        Commands::Report { input, report_json } => {
            let path = input.unwrap_or_else(|| config.merged_path());
            info!("Reporting on {}", path.display());
            let report_json = report_json.or_else(|| config.report_json.clone());
            summarize_and_print(&path, report_json.as_deref())?;
        }
    }
    Ok(())
}
