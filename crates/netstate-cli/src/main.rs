use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use netstate_capture::{
    equivalence, read_transcript, render_transcript, sniff_vendor, DeviceQuery, Encoding,
    RegexTableParser, ReplayDevice, Segmenter, SnapshotBuilder,
};
use netstate_core::{Config, DiffReport, RowKind, Severity, Snapshot};
use netstate_engine::DiffEngine;

/// netstate - capture and compare network device state
#[derive(Parser)]
#[command(name = "netstate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: netstate.toml)
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
    /// List the command sections of a transcript
    Segment {
        /// Transcript file (plain or .gz)
        transcript: PathBuf,
    },

    /// Parse a transcript into a snapshot
    Capture {
        /// Transcript file (plain or .gz)
        transcript: PathBuf,

        /// Output file for the snapshot
        #[arg(short, long, default_value = "snapshot.json")]
        output: PathBuf,

        /// Source name stored in the snapshot (default: transcript file stem)
        #[arg(long)]
        source_id: Option<String>,
    },

    /// Query a replayed transcript through the device path
    Replay {
        /// Transcript to answer queries from
        transcript: PathBuf,

        /// Commands to query, comma separated (default: every captured command)
        #[arg(long, value_delimiter = ',')]
        commands: Vec<String>,

        /// Output file for the snapshot
        #[arg(short, long, default_value = "snapshot.json")]
        output: PathBuf,

        /// Also write the replies as a .txt transcript next to the snapshot
        #[arg(long)]
        text_backup: bool,
    },

    /// Compare two snapshots
    Diff {
        /// Earlier snapshot
        first: PathBuf,

        /// Later snapshot
        second: PathBuf,

        /// Output file for report.json
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,
    },

    /// Check whether two interface names refer to the same interface
    IntfEq {
        first: String,
        second: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Segment { transcript } => segment_command(&config, &transcript),
        Commands::Capture {
            transcript,
            output,
            source_id,
        } => capture_command(&config, &transcript, &output, source_id, cli.verbose),
        Commands::Replay {
            transcript,
            commands,
            output,
            text_backup,
        } => {
            replay_command(
                &config,
                &transcript,
                commands,
                &output,
                text_backup,
                cli.verbose,
            )
            .await
        }
        Commands::Diff {
            first,
            second,
            output,
        } => diff_command(&config, &first, &second, &output, cli.verbose),
        Commands::IntfEq { first, second } => intf_eq_command(&first, &second),
    }
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let default_path = Path::new("netstate.toml");

    let config = if let Some(path) = path {
        Config::from_file(path).with_context(|| format!("loading {}", path.display()))?
    } else if default_path.exists() {
        Config::from_file(default_path).context("loading netstate.toml")?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    if verbose {
        eprintln!(
            "{} vendor {}, {} diff handler(s), {} parser(s)",
            "Using".cyan(),
            config.vendor,
            config.diff.commands.len(),
            config.parsers.len()
        );
    }

    Ok(config)
}

fn source_id_for(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "capture".to_string());

    let name = name.strip_suffix(".gz").unwrap_or(&name);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

/// Segment command - list transcript sections
fn segment_command(config: &Config, transcript: &Path) -> Result<()> {
    let text = read_transcript(transcript)?;
    let segmenter = Segmenter::from_config(&config.segment)?;
    tracing::debug!(pattern = segmenter.pattern(), "segmenting transcript");
    let sections = segmenter.segment_text(&text)?;

    println!("{:>5}  {:>7}  {}", "#".bold(), "lines".bold(), "command".bold());
    for section in &sections {
        println!(
            "{:>5}  {:>7}  {}",
            section.order_index,
            section.line_count(),
            section.command.green()
        );
    }
    println!();
    println!("{} sections", sections.len());

    Ok(())
}

/// Capture command - segment, parse and save a snapshot
fn capture_command(
    config: &Config,
    transcript: &Path,
    output: &Path,
    source_id: Option<String>,
    verbose: bool,
) -> Result<()> {
    let text = read_transcript(transcript)?;

    match sniff_vendor(&text, &config.segment.vendor_signatures, config.segment.sniff_lines) {
        Some(signature) if verbose => eprintln!("{} {}", "Found signature:".cyan(), signature),
        Some(_) => {}
        None => {
            tracing::warn!(path = %transcript.display(), "no vendor signature in transcript head");
            eprintln!(
                "{} no {} signature in the first {} lines; parsing anyway",
                "Warning:".yellow().bold(),
                config.vendor,
                config.segment.sniff_lines
            );
        }
    }

    let sections = Segmenter::from_config(&config.segment)?.segment_text(&text)?;
    let parser = RegexTableParser::from_config(config)?;
    let source_id = source_id.unwrap_or_else(|| source_id_for(transcript));

    let snapshot = SnapshotBuilder::new(&parser, &config.vendor).build(source_id, &sections);
    snapshot.save_to_file(output)?;

    print_snapshot_summary(&snapshot, output);
    Ok(())
}

/// Replay command - drive the device query path from a saved transcript
async fn replay_command(
    config: &Config,
    transcript: &Path,
    commands: Vec<String>,
    output: &Path,
    text_backup: bool,
    verbose: bool,
) -> Result<()> {
    let text = read_transcript(transcript)?;
    let sections = Segmenter::from_config(&config.segment)?.segment_text(&text)?;
    let device = ReplayDevice::from_sections(source_id_for(transcript), &sections);

    let commands = if commands.is_empty() {
        sections.iter().map(|s| s.command.clone()).collect()
    } else {
        commands
    };

    if verbose {
        eprintln!("{} {} commands from {}", "Querying".cyan(), commands.len(), device.name());
    }

    let parser = RegexTableParser::from_config(config)?;
    let snapshot = SnapshotBuilder::new(&parser, &config.vendor)
        .capture(&device, &commands)
        .await?;
    snapshot.save_to_file(output)?;

    if text_backup {
        let outputs = device.fetch(&commands, Encoding::Text).await?;
        let backup = output.with_extension("txt");
        std::fs::write(&backup, render_transcript(&outputs))
            .with_context(|| format!("writing {}", backup.display()))?;
        if verbose {
            eprintln!("{} {}", "Text backup saved to:".green(), backup.display());
        }
    }

    print_snapshot_summary(&snapshot, output);
    Ok(())
}

/// Diff command - compare two snapshots
fn diff_command(
    config: &Config,
    first: &Path,
    second: &Path,
    output: &Path,
    verbose: bool,
) -> Result<()> {
    let first = Snapshot::load_from_file(first)?;
    let second = Snapshot::load_from_file(second)?;

    if verbose {
        eprintln!(
            "{} {} ({} commands) against {} ({} commands)",
            "Comparing".cyan(),
            first.source_id,
            first.len(),
            second.source_id,
            second.len()
        );
    }

    let report = DiffEngine::from_config(config).diff(&first, &second);

    report
        .save_to_file(output)
        .with_context(|| format!("writing {}", output.display()))?;
    if verbose {
        eprintln!("{} {}", "Report saved to:".green(), output.display());
    }

    print_report_summary(&report);

    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Interface equivalence command
fn intf_eq_command(first: &str, second: &str) -> Result<()> {
    if equivalence(first, second)? {
        println!("{} {} and {} name the same interface", "✓".green(), first, second);
    } else {
        println!("{} {} and {} are different interfaces", "✗".red(), first, second);
    }
    Ok(())
}

fn print_snapshot_summary(snapshot: &Snapshot, output: &Path) {
    println!(
        "{} {} commands from {} ({} parsed, {} raw)",
        "Captured".green().bold(),
        snapshot.len(),
        snapshot.source_id,
        snapshot.parsed_count(),
        snapshot.len() - snapshot.parsed_count()
    );
    println!("Snapshot saved to: {}", output.display());
    println!("Fingerprint: {}", snapshot.fingerprint());
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Error => "ERROR".red().bold(),
        Severity::Warn => "WARN".yellow().bold(),
        Severity::Info => "INFO".cyan(),
    }
}

fn print_report_summary(report: &DiffReport) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Device State Diff Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!("Compared: {} -> {}", report.source_a, report.source_b);
    println!();

    for entry in &report.entries {
        if !entry.has_changes() {
            println!("  {} {}", "✓".green(), entry.command);
            continue;
        }

        println!(
            "  {} {} ({} new, {} missing, {} changed)",
            "●".yellow(),
            entry.command.bold(),
            entry.count(RowKind::New),
            entry.count(RowKind::Missing),
            entry.count(RowKind::Changed)
        );

        for row in entry.changes() {
            let key = row.key.join(" ");
            match row.kind {
                RowKind::New => println!("      {} {}", "+".green(), key),
                RowKind::Missing => println!("      {} {}", "-".red(), key),
                _ => {
                    println!("      {} {}", "~".yellow(), key);
                    for change in &row.details {
                        println!(
                            "          {}: {} -> {}",
                            change.column,
                            change.old.red(),
                            change.new.green()
                        );
                    }
                }
            }
        }
    }
    println!();

    println!("{}", "Summary:".bold());
    println!("  Commands compared: {}", report.summary.commands_compared);
    println!(
        "  Rows: {} new, {} missing, {} changed, {} unchanged",
        report.summary.new, report.summary.missing, report.summary.changed, report.summary.unchanged
    );

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }

    println!("  Info:     {}", report.summary.info);
    println!();

    let diagnostics: Vec<_> = report.all_diagnostics().collect();
    if diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
        return;
    }

    println!("{}", "Diagnostics:".bold());
    for diag in diagnostics {
        println!("  [{}] {}: {}", severity_label(diag.severity), diag.code, diag.message);

        if let Some(loc) = &diag.location {
            println!("    at {}", loc);
        }

        if let (Some(exp), Some(act)) = (&diag.expected, &diag.actual) {
            println!("    first:  {}", exp.cyan());
            println!("    second: {}", act.cyan());
        }
    }
}
