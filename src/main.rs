// Entry point and CLI flow.
//
// - `options` loads the rate card and lists what can be selected.
// - `analyse` runs one uplift scenario built from command-line flags.
// - `batch` loads the rate card once and runs every scenario in a JSON file
//   against it.
// Every scenario prints markdown previews and, with `--out-dir`, writes the
// comparison tables as CSV plus a JSON summary.
use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rate_uplift::config::{self, ScenarioConfig};
use rate_uplift::{engine, loader, output, reports, util, Dataset, UpliftKind};

#[derive(Parser)]
#[command(name = "rate-uplift")]
#[command(about = "Rate card revenue & margin uplift analyser", long_about = None)]
struct Cli {
    /// Rate card CSV export
    #[arg(long, global = true, default_value = "rate_card_data.csv")]
    data: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List selectable branches, capabilities, teams, job titles and months
    Options,
    /// Run a single uplift scenario
    Analyse {
        #[arg(long, value_enum, default_value_t = UpliftKind::Percentage)]
        kind: UpliftKind,
        /// Percent for `percentage`, currency per day for `flat_amount`
        #[arg(long)]
        magnitude: Option<Decimal>,
        /// First month the uplift applies to (defaults to the earliest month)
        #[arg(long = "from")]
        effective_month: Option<String>,
        /// Repeat to select several; omit to select every branch
        #[arg(long = "branch")]
        branches: Vec<String>,
        #[arg(long = "capability")]
        capabilities: Vec<String>,
        #[arg(long = "team")]
        teams: Vec<String>,
        #[arg(long = "job-title")]
        job_titles: Vec<String>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        preview_rows: usize,
    },
    /// Run every scenario in a JSON file against one load of the rate card
    Batch {
        #[arg(long)]
        scenarios: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        preview_rows: usize,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load(path: &Path) -> anyhow::Result<Dataset> {
    let (dataset, report) = loader::load_csv(path)
        .with_context(|| format!("failed to load rate card from {}", path.display()))?;
    println!(
        "Processing dataset... ({} roles loaded, {} summary rows excluded, {} months)",
        util::format_int(report.loaded_rows),
        util::format_int(report.summary_rows_excluded),
        util::format_int(dataset.months().len())
    );
    if report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            util::format_int(report.parse_errors)
        );
    }
    println!();
    Ok(dataset)
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Handle `options`: what the sidebar of the original tool offered.
fn handle_options(dataset: &Dataset) {
    let sections = [
        ("Branch", dataset.distinct_branches()),
        ("Capability", dataset.distinct_capabilities()),
        ("Department / Team", dataset.distinct_teams()),
        ("Job Title", dataset.distinct_job_titles()),
        ("Effective From Month", dataset.month_labels()),
    ];
    for (title, values) in sections {
        println!("{} ({}):", title, util::format_int(values.len()));
        for v in values {
            println!("  - {}", v);
        }
        println!();
    }
}

/// Run one scenario, print the four result tables and optionally export them.
fn run_scenario(
    dataset: &Dataset,
    scenario: &ScenarioConfig,
    out_dir: Option<&Path>,
    preview_rows: usize,
) -> anyhow::Result<()> {
    let params = scenario.params(dataset);
    let criteria = scenario.criteria(dataset);
    let label = scenario.name.as_deref().unwrap_or("unnamed");
    let outcome = engine::run(dataset, &criteria, &params)
        .with_context(|| format!("scenario `{}` cannot be computed", label))?;

    if let Some(name) = &scenario.name {
        println!("## {}\n", name);
    }
    let summary = reports::summary_lines(&outcome);
    let monthly = reports::monthly_rows(&outcome);
    let roles = reports::uplifted_table(&outcome);
    let margins = reports::margin_rows(&outcome);

    output::preview_rows("Summary", &summary, summary.len());
    output::preview_rows("Monthly Revenue Comparison", &monthly, monthly.len());
    output::preview_table("Detailed Uplifted Revenue by Role", &roles, preview_rows);
    output::preview_rows("New Margin by Affected Role", &margins, preview_rows);

    if let Some(dir) = out_dir {
        output::export_reports(dir, scenario.name.as_deref(), &outcome)
            .with_context(|| format!("scenario `{}` was not fully exported", label))?;
        println!("(Full tables exported to {})\n", dir.display());
    }
    Ok(())
}

/// Output folder for the `index`-th scenario of a batch. The position prefix
/// keeps names that slug the same from sharing a folder.
fn scenario_dir(base: &Path, index: usize, scenario: &ScenarioConfig) -> PathBuf {
    let slug: String = scenario
        .name
        .as_deref()
        .unwrap_or("")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        base.join(format!("{:02}-scenario", index + 1))
    } else {
        base.join(format!("{:02}-{}", index + 1, slug))
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let dataset = load(&cli.data)?;

    match cli.command {
        Commands::Options => handle_options(&dataset),
        Commands::Analyse {
            kind,
            magnitude,
            effective_month,
            branches,
            capabilities,
            teams,
            job_titles,
            out_dir,
            preview_rows,
        } => {
            let scenario = ScenarioConfig {
                name: None,
                kind,
                magnitude,
                effective_month,
                branches: non_empty(branches),
                capabilities: non_empty(capabilities),
                teams: non_empty(teams),
                job_titles: non_empty(job_titles),
            };
            run_scenario(&dataset, &scenario, out_dir.as_deref(), preview_rows)?;
        }
        Commands::Batch {
            scenarios,
            out_dir,
            preview_rows,
        } => {
            let list = config::load_scenarios(&scenarios).with_context(|| {
                format!("failed to read scenarios from {}", scenarios.display())
            })?;
            info!(count = list.len(), "running scenarios");
            let mut failed = 0usize;
            for (i, scenario) in list.iter().enumerate() {
                let dir = out_dir.as_deref().map(|base| scenario_dir(base, i, scenario));
                if let Err(e) = run_scenario(&dataset, scenario, dir.as_deref(), preview_rows) {
                    error!("{:#}", e);
                    failed += 1;
                }
            }
            if failed > 0 {
                anyhow::bail!("{} of {} scenarios failed", failed, list.len());
            }
        }
    }

    Ok(())
}
