//! riskplan CLI - risk catalog, matrix, coverage and plan document views for security projects

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - The project file is only read, never rewritten

use anyhow::Context;
use clap::{Parser, Subcommand};
use riskplan_core::config::{self, ResolvedConfig};
use riskplan_core::document::{default_template, materialize, render_document_text};
use riskplan_core::export::write_risks_csv;
use riskplan_core::matrix::{impact_axis, probability_axis};
use riskplan_core::measure::Measure;
use riskplan_core::project::NOT_AVAILABLE;
use riskplan_core::report::{
    render_coverage_text, render_matrix_text, render_risks_text, render_threats_text,
    threat_reports,
};
use riskplan_core::{
    load_project, project_coverage, render_json, risk_catalog, BandFilter, MatrixReport, Project,
    RiskFilter, SortKey, ThreatReport,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "riskplan")]
#[command(about = "Risk scoring and measure coverage for security plans")]
#[command(version = env!("RISKPLAN_VERSION"))]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the project's risks with scores and bands
    Risks {
        /// Path to the project JSON file
        project: PathBuf,

        /// Case-insensitive search in names and descriptions
        #[arg(long, default_value = "")]
        search: String,

        /// Band id to keep, or "all"
        #[arg(long, default_value = "all")]
        band: BandFilter,

        /// Ordering (overrides config file)
        #[arg(long)]
        sort: Option<SortKey>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: ExportFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show the probability × impact matrix with risk counts
    Matrix {
        /// Path to the project JSON file
        project: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show prevention / detection / reaction coverage per risk
    Coverage {
        /// Path to the project JSON file
        project: PathBuf,

        /// Global measure library used when the project has none
        #[arg(long)]
        library: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Show threat totals and scatter positions
    Threats {
        /// Path to the project JSON file
        project: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Render the plan document with every dynamic section filled in
    Document {
        /// Path to the project JSON file
        project: PathBuf,

        /// Preparation date printed on the title page
        #[arg(long)]
        date: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Validate or show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ExportFormat {
    Text,
    Json,
    Csv,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThreatsOutput {
    threats: Vec<ThreatReport>,
    probability_axis: [i32; 2],
    impact_axis: [i32; 2],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Risks {
            project,
            search,
            band,
            sort,
            format,
            config: config_path,
        } => {
            let project_data = read_project(&project)?;
            let resolved = load_config_for(&project, config_path.as_deref())?;

            let filter = RiskFilter { text: search, band };
            let sort = sort.unwrap_or(resolved.default_sort);
            let risks = risk_catalog(&project_data, &resolved.policy, &filter, sort);

            match format {
                ExportFormat::Text => {
                    print!("{}", render_risks_text(&risks));
                    if resolved.show_matrix {
                        println!();
                        let report = MatrixReport::new(&resolved.policy, &risks);
                        print!("{}", render_matrix_text(&report));
                    }
                }
                ExportFormat::Json => println!("{}", render_json(&risks)?),
                ExportFormat::Csv => write_risks_csv(std::io::stdout().lock(), &risks)?,
            }
        }
        Commands::Matrix {
            project,
            format,
            config: config_path,
        } => {
            let project_data = read_project(&project)?;
            let resolved = load_config_for(&project, config_path.as_deref())?;
            let risks = risk_catalog(
                &project_data,
                &resolved.policy,
                &RiskFilter::default(),
                resolved.default_sort,
            );
            let report = MatrixReport::new(&resolved.policy, &risks);
            match format {
                OutputFormat::Text => print!("{}", render_matrix_text(&report)),
                OutputFormat::Json => println!("{}", render_json(&report)?),
            }
        }
        Commands::Coverage {
            project,
            library,
            format,
        } => {
            let project_data = read_project(&project)?;
            let global = library.as_deref().map(read_library).transpose()?;
            let rows = project_coverage(&project_data, global.as_deref())?;
            match format {
                OutputFormat::Text => print!("{}", render_coverage_text(&rows)),
                OutputFormat::Json => println!("{}", render_json(&rows)?),
            }
        }
        Commands::Threats { project, format } => {
            let project_data = read_project(&project)?;
            let reports = threat_reports(&project_data.threats);
            match format {
                OutputFormat::Text => print!("{}", render_threats_text(&reports)),
                OutputFormat::Json => {
                    let output = ThreatsOutput {
                        threats: reports,
                        probability_axis: [*probability_axis().start(), *probability_axis().end()],
                        impact_axis: [*impact_axis().start(), *impact_axis().end()],
                    };
                    println!("{}", render_json(&output)?);
                }
            }
        }
        Commands::Document {
            project,
            date,
            format,
        } => {
            let project_data = read_project(&project)?;
            let mut next_id = || uuid::Uuid::new_v4().to_string();
            let blocks = if project_data.document_blocks.is_empty() {
                let prepared_on = date.as_deref().unwrap_or(NOT_AVAILABLE);
                default_template(&project_data, prepared_on, &mut next_id)
            } else {
                project_data.document_blocks.clone()
            };
            let document = materialize(&blocks, &project_data, &mut next_id);
            match format {
                OutputFormat::Text => print!("{}", render_document_text(&document)),
                OutputFormat::Json => println!("{}", render_json(&document)?),
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                match config::load_and_resolve(&project_root, path.as_deref()) {
                    Ok(resolved) => {
                        if let Some(ref p) = resolved.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;
                print_config(&resolved);
            }
        },
    }

    Ok(())
}

fn read_project(path: &Path) -> anyhow::Result<Project> {
    if !path.exists() {
        anyhow::bail!("Project file does not exist: {}", path.display());
    }
    load_project(path)
}

/// Config is discovered next to the project file unless given explicitly
fn load_config_for(project: &Path, config_path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let project_root = match project.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    let resolved = config::load_and_resolve(&project_root, config_path)
        .context("failed to load configuration")?;
    if let Some(path) = &resolved.config_path {
        log::info!("using config: {}", path.display());
    }
    Ok(resolved)
}

fn read_library(path: &Path) -> anyhow::Result<Vec<Measure>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read measure library: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse measure library: {}", path.display()))
}

fn print_config(resolved: &ResolvedConfig) {
    println!("Configuration:");
    if let Some(ref p) = resolved.config_path {
        println!("  Source: {}", p.display());
    } else {
        println!("  Source: defaults (no config file found)");
    }
    println!();
    let scale = resolved.policy.scale();
    println!("Scale:");
    println!("  min: {}", scale.min);
    println!("  max: {}", scale.max);
    println!();
    println!("Bands:");
    for band in resolved.policy.bands() {
        println!("  {:<12} {:>4} - {:<4} {}", band.id, band.min, band.max, band.label);
    }
    println!();
    println!("Display:");
    println!("  default_sort: {}", resolved.default_sort.as_str());
    println!("  show_matrix: {}", resolved.show_matrix);
    println!();
    let admins: Vec<&str> = resolved.roles.admins().collect();
    println!(
        "Admins: {}",
        if admins.is_empty() {
            "none".to_string()
        } else {
            admins.join(", ")
        }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_risks_args() {
        let cli = Cli::try_parse_from([
            "riskplan", "risks", "plan.json", "--band", "high", "--sort", "nameAsc", "--format",
            "csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Risks { band, sort, .. } => {
                assert_eq!(band, BandFilter::Only("high".to_string()));
                assert_eq!(sort, Some(SortKey::NameAsc));
            }
            _ => panic!("expected the risks subcommand"),
        }
    }

    #[test]
    fn test_reject_unknown_sort_key() {
        let result = Cli::try_parse_from(["riskplan", "risks", "plan.json", "--sort", "random"]);
        assert!(result.is_err());
    }
}
