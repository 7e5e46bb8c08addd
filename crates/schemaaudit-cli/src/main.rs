use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schemaaudit_core::{ComparisonReport, Config, CorruptionSection, Counts, Side};
use schemaaudit_engine::{corruption_section, SchemaComparer};
use schemaaudit_index::{CacheProvider, FileAttr, SchemaIndex, SchemaProvider};
use schemaaudit_reference::ReferenceTables;
use schemaaudit_report::{parse_format, ReportWriter};

/// SchemaAudit - compare the record-type schemas of two instances
#[derive(Parser)]
#[command(name = "schemaaudit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: schemaaudit.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare an instance against a baseline and write a report
    Compare {
        /// Baseline cache: a directory of describe results, a .jsonl file or a .json array
        baseline: PathBuf,

        /// Cache of the instance compared against the baseline
        other: PathBuf,

        /// Baseline label (default: cache file name, upper-cased)
        #[arg(long)]
        baseline_label: Option<String>,

        /// Other instance label (default: cache file name, upper-cased)
        #[arg(long)]
        other_label: Option<String>,

        /// Report format: html, csv, text or json (default from config)
        #[arg(short, long)]
        format: Option<String>,

        /// Directory the report is written to (default from config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show totals for one instance
    Inspect {
        /// Instance cache
        cache: PathBuf,

        /// Instance label (default: cache file name, upper-cased)
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Show the corruption summary of one instance
    Corruption {
        /// Instance cache
        cache: PathBuf,

        /// Instance label (default: cache file name, upper-cased)
        #[arg(short, long)]
        label: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Compare {
            baseline,
            other,
            baseline_label,
            other_label,
            format,
            output_dir,
        } => compare_command(
            &config,
            (&baseline, baseline_label),
            (&other, other_label),
            format.as_deref(),
            output_dir.as_deref(),
            cli.verbose,
        ),
        Commands::Inspect { cache, label } => inspect_command(&config, &cache, label, cli.verbose),
        Commands::Corruption { cache, label } => {
            corruption_command(&config, &cache, label, cli.verbose)
        }
    }
}

/// Log to stderr; RUST_LOG overrides the verbosity default
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let config = if let Some(config_path) = path {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else if Path::new("schemaaudit.toml").exists() {
        Config::from_file(Path::new("schemaaudit.toml"))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    tracing::debug!(
        root = %config.project_root.display(),
        format = %config.report.format,
        "configuration loaded"
    );
    Ok(config)
}

/// Instance label from a cache path: `caches/gold.jsonl` -> `GOLD`
fn default_label(cache: &Path) -> String {
    cache
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_uppercase())
        .unwrap_or_else(|| "INSTANCE".to_string())
}

fn load_reference(config: &Config, verbose: bool) -> Result<ReferenceTables> {
    let tables = ReferenceTables::from_config(&config.reference, |p| config.resolve(p))
        .context("Failed to load reference tables")?;

    if verbose {
        eprintln!(
            "{} {} namespaces, {} package entries",
            "Reference tables:".cyan(),
            tables.namespaces.len(),
            tables.packages.len()
        );
    }

    Ok(tables)
}

fn load_index(
    config: &Config,
    tables: &ReferenceTables,
    cache: &Path,
    label: &str,
    verbose: bool,
) -> Result<SchemaIndex> {
    if verbose {
        eprintln!("{} {} from {}", "Loading".cyan(), label, cache.display());
    }

    let provider = CacheProvider::new(label, cache);
    let records = provider
        .describe_types()
        .with_context(|| format!("Failed to read cache {}", cache.display()))?;

    Ok(SchemaIndex::build(label, records, tables, &config.classification))
}

/// Compare command - build both indexes, compare, write the report
fn compare_command(
    config: &Config,
    baseline: (&Path, Option<String>),
    other: (&Path, Option<String>),
    format: Option<&str>,
    output_dir: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    // Format and output location are checked before any index is built
    let format = match format {
        Some(name) => parse_format(name)?,
        None => config.report.format,
    };
    let output_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.resolve(&config.report.output_dir));
    let writer = ReportWriter::create(output_dir, format)?;

    let tables = load_reference(config, verbose)?;

    let (baseline_path, baseline_label) = baseline;
    let (other_path, other_label) = other;
    let baseline_label = baseline_label.unwrap_or_else(|| default_label(baseline_path));
    let other_label = other_label.unwrap_or_else(|| default_label(other_path));

    let baseline = load_index(config, &tables, baseline_path, &baseline_label, verbose)?;
    let other = load_index(config, &tables, other_path, &other_label, verbose)?;

    if verbose {
        eprintln!("{}", "Comparing schemas...".cyan());
    }

    let report = SchemaComparer::from_config(config).compare(&baseline, &other);
    let report_path = writer.write(&report)?;

    print_report_summary(&report);
    println!("{} {}", "Report written to".green(), report_path.display());

    Ok(())
}

/// Inspect command - totals for one instance
fn inspect_command(config: &Config, cache: &Path, label: Option<String>, verbose: bool) -> Result<()> {
    let tables = load_reference(config, verbose)?;
    let label = label.unwrap_or_else(|| default_label(cache));
    let index = load_index(config, &tables, cache, &label, verbose)?;
    let corruption = corruption_section(Side::Other, &index);

    let tops = index.count_files(true);
    let populated = index.count_populated_tops();

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", format!("Instance {}", label).bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Cache: {}", cache.display());
    println!();

    println!("{}", "Files:".bold());
    println!("  Total:      {}", index.count_files(false));
    println!("  Tops:       {}", tops);
    println!("  Sub-files:  {}", index.files_with(FileAttr::Parent, None).len());
    println!("  Corrupt:    {}", index.files_with(FileAttr::Corruption, None).len());
    println!(
        "  Populated:  {} ({:.1}% of tops)",
        populated,
        Counts::percent(populated, tops)
    );
    println!("  Class 3:    {}", index.files_with(FileAttr::Class3, None).len());
    println!("  Deprecated: {}", index.files_with(FileAttr::Deprecated, None).len());
    println!();

    println!("{}", "Content:".bold());
    println!("  Fields:     {}", index.count_fields(index.file_ids(false)));
    println!("  Datapoints: {}", index.datapoints(None));
    println!();

    println!("{}", "Corruption:".bold());
    print_corruption_totals(&corruption);

    Ok(())
}

/// Corruption command - one instance's corruption summary
fn corruption_command(config: &Config, cache: &Path, label: Option<String>, verbose: bool) -> Result<()> {
    let tables = load_reference(config, verbose)?;
    let label = label.unwrap_or_else(|| default_label(cache));
    let index = load_index(config, &tables, cache, &label, verbose)?;
    let corruption = corruption_section(Side::Other, &index);

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", format!("Corruption in {}", label).bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    if corruption.is_empty() {
        println!("{}", "✓ No corruption found!".green().bold());
        return Ok(());
    }

    print_corruption_totals(&corruption);
    println!();

    if !corruption.files.is_empty() {
        println!("{}", "Corrupt files:".bold());
        for group in &corruption.files {
            let ids: Vec<String> = group.files.iter().map(|id| id.to_string()).collect();
            println!("  [{}] {}", group.reason.red(), ids.join(", "));
        }
        println!();
    }

    if !corruption.fields.is_empty() {
        println!("{}", "Corrupt fields:".bold());
        for file in &corruption.fields {
            println!("  {}:", file.file);
            for field in &file.fields {
                println!("    {} ({})", field.number, field.reason.yellow());
            }
        }
    }

    Ok(())
}

fn print_corruption_totals(corruption: &CorruptionSection) {
    let files = corruption.file_count();
    let fields = corruption.field_count();

    if files > 0 {
        println!("  Files:  {}", format!("{}", files).red().bold());
    } else {
        println!("  Files:  {}", format!("{}", files).green());
    }

    if fields > 0 {
        println!("  Fields: {}", format!("{}", fields).yellow());
    } else {
        println!("  Fields: {}", format!("{}", fields).green());
    }
}

fn print_report_summary(report: &ComparisonReport) {
    let counts = &report.counts;

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Schema Comparison Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!("Baseline: {}", report.baseline_label);
    println!("Other: {}", report.other_label);
    println!();

    println!("{}", "Files:".bold());
    println!("  All files: {} ({} in both)", counts.all_files, counts.both_files);

    let other_only = counts.other.only_files;
    if other_only > 0 {
        println!(
            "  Only in {}: {} ({:.1}%)",
            report.other_label,
            format!("{}", other_only).yellow(),
            Counts::percent(other_only, counts.other.files)
        );
    } else {
        println!("  Only in {}: {}", report.other_label, format!("{}", other_only).green());
    }

    let baseline_only = counts.baseline.only_files;
    if baseline_only > 0 {
        println!(
            "  Only in {}: {}",
            report.baseline_label,
            format!("{}", baseline_only).yellow()
        );
    } else {
        println!("  Only in {}: {}", report.baseline_label, format!("{}", baseline_only).green());
    }

    let notable = report.notable_common_files().count();
    println!("  Common files with differences: {}", notable);
    println!();

    println!("{}", "Fields:".bold());
    println!(
        "  Missing from {}: {}",
        report.other_label,
        counts.baseline.unique_fields
    );
    println!(
        "  Custom in {}: {} ({} unique, {} repurposed, {:.1}% of shared)",
        report.other_label,
        format!("{}", counts.custom_fields()).yellow(),
        counts.other.unique_fields,
        counts.renamed_fields,
        Counts::percent(counts.custom_fields(), counts.other.fields_in_shared)
    );
    println!();

    println!("{}", "Corruption:".bold());
    for side in [Side::Baseline, Side::Other] {
        let section = report.corruption(side);
        let files = section.file_count();
        let summary = format!("{} files, {} fields", files, section.field_count());
        if files > 0 {
            println!("  {}: {}", section.label, summary.red());
        } else {
            println!("  {}: {}", section.label, summary.green());
        }
    }
    println!();

    let identical = report.partition.baseline_only.is_empty()
        && report.partition.other_only.is_empty()
        && notable == 0;
    if identical {
        println!("{}", "✓ Schemas match!".green().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn labels_from_cache_paths() {
        assert_eq!(default_label(Path::new("caches/gold.jsonl")), "GOLD");
        assert_eq!(default_label(Path::new("fixtures/other")), "OTHER");
    }

    #[test]
    fn compare_arguments() {
        let cli = Cli::try_parse_from([
            "schemaaudit",
            "--verbose",
            "compare",
            "gold.jsonl",
            "other",
            "--format",
            "csv",
            "--other-label",
            "CG VISTA",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Compare {
                format, other_label, ..
            } => {
                assert_eq!(format.as_deref(), Some("csv"));
                assert_eq!(other_label.as_deref(), Some("CG VISTA"));
            }
            _ => panic!("expected compare"),
        }
    }
}
