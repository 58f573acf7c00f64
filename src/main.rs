//! CLI entry point for find-key-conflicts
//!
//! Scans a packages directory, builds the conflict index and prints one of
//! the reports: direct conflicts, prefix overlaps, or every key.

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use find_key_conflicts::config::{IgnorePattern, ScanConfig};
use find_key_conflicts::host::{DirectorySource, Platform};
use find_key_conflicts::report::{self, OutputMode, ReportKind, ReportOptions};
use find_key_conflicts::scan::{spawn_scan, ScanOutcome};
use find_key_conflicts::watch::KeymapWatcher;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Parser)]
#[command(name = "find-key-conflicts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Packages directory to scan
    #[arg(short, long, global = true)]
    packages: Option<PathBuf>,

    /// Settings file (relaxed JSON)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Platform whose keymap variants are read (Windows, Linux, OSX)
    #[arg(long, global = true)]
    platform: Option<Platform>,

    /// Ignore bindings made of a single key
    #[arg(long, global = true)]
    ignore_single_key: bool,

    /// Ignore a key sequence, e.g. "ctrl+k, ctrl+c" (repeatable)
    #[arg(long = "ignore", value_name = "PATTERN", global = true)]
    ignore: Vec<String>,

    /// Also report keys bound twice inside one package
    #[arg(long, global = true)]
    internal: bool,

    /// Sort context conditions in the output
    #[arg(long, global = true)]
    sort_context: bool,

    /// Output mode: terminal, text or json
    #[arg(short, long, default_value_t = OutputMode::Terminal, global = true)]
    mode: OutputMode,

    /// Only show keys or commands containing this text
    #[arg(short, long, global = true)]
    filter: Option<String>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Keys bound by more than one package
    Conflicts {
        /// Re-run whenever a keymap changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Keys that shadow longer multi-chord sequences
    Overlaps {
        /// Re-run whenever a keymap changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Every indexed key
    All {
        /// Re-run whenever a keymap changes
        #[arg(short, long)]
        watch: bool,
    },
}

impl Commands {
    fn split(&self) -> (ReportKind, bool) {
        match *self {
            Commands::Conflicts { watch } => (ReportKind::Conflicts, watch),
            Commands::Overlaps { watch } => (ReportKind::Overlaps, watch),
            Commands::All { watch } => (ReportKind::All, watch),
        }
    }
}

/// Everything one run needs, resolved from the command line
struct Run {
    packages: PathBuf,
    platform: Platform,
    config: ScanConfig,
    kind: ReportKind,
    mode: OutputMode,
    options: ReportOptions,
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let (kind, watch) = cli.command.split();
    let run = resolve(cli, kind)?;

    let found = scan_and_report(&run)?;

    if watch {
        watch_loop(&run)?;
    } else if kind == ReportKind::Conflicts && found > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn setup_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("find_key_conflicts={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Expand `~` and environment variables in a user supplied path
fn expand(path: &Path) -> anyhow::Result<PathBuf> {
    let raw = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid path encoding: {}", path.display()))?;
    let expanded = shellexpand::full(raw).with_context(|| format!("Failed to expand {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn default_packages_dir(platform: Platform) -> &'static str {
    match platform {
        Platform::Linux => "~/.config/sublime-text/Packages",
        Platform::Osx => "~/Library/Application Support/Sublime Text/Packages",
        Platform::Windows => "$APPDATA/Sublime Text/Packages",
    }
}

fn resolve(cli: Cli, kind: ReportKind) -> anyhow::Result<Run> {
    let platform = cli.platform.unwrap_or_else(Platform::current);

    let packages = match &cli.packages {
        Some(path) => expand(path)?,
        None => expand(Path::new(default_packages_dir(platform)))?,
    };

    let mut config = match &cli.settings {
        Some(path) => ScanConfig::load(&expand(path)?)?,
        None => ScanConfig::default(),
    };

    // Flags only ever switch options on
    config.ignore_single_key |= cli.ignore_single_key;
    config.display_internal_conflicts |= cli.internal;
    config.sort_context |= cli.sort_context;
    config
        .ignore_patterns
        .extend(cli.ignore.into_iter().map(IgnorePattern::Joined));

    // ANSI colours have no place in a report file
    let mode = match (&cli.output, cli.mode) {
        (Some(_), OutputMode::Terminal) => OutputMode::Text,
        (_, mode) => mode,
    };

    let options = ReportOptions {
        include_internal: config.display_internal_conflicts,
        sort_context: config.sort_context,
        filter: cli.filter,
    };

    let output = cli.output.as_deref().map(expand).transpose()?;

    Ok(Run {
        packages,
        platform,
        config,
        kind,
        mode,
        options,
        output,
    })
}

fn scan(run: &Run) -> anyhow::Result<ScanOutcome> {
    let source = DirectorySource::new(run.packages.clone(), run.platform);
    let alert = |message: &str| eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());

    let handle = spawn_scan(source, run.config.clone(), alert);

    let interactive = std::io::stderr().is_terminal();
    let mut ticks = 0usize;
    let outcome = handle.wait(Duration::from_millis(100), |visited| {
        if interactive {
            eprint!("\r{} Scanning packages... {} files", SPINNER[ticks % SPINNER.len()], visited);
            let _ = std::io::stderr().flush();
            ticks += 1;
        }
    });
    if interactive && ticks > 0 {
        eprint!("\r\x1b[2K");
    }

    outcome.ok_or_else(|| anyhow::anyhow!("Scan worker stopped without a result"))
}

/// Runs one scan and prints the report. Returns the number of sections.
fn scan_and_report(run: &Run) -> anyhow::Result<usize> {
    if !run.packages.is_dir() {
        anyhow::bail!("Packages directory not found: {}", run.packages.display());
    }

    if run.mode == OutputMode::Terminal {
        println!("{} Scanning: {}", "→".cyan(), run.packages.display());
    }

    let outcome = scan(run)?;
    let found = report::sections(&outcome.detector, run.kind, &run.options).len();
    let rendered = report::render(&outcome.detector, run.kind, run.mode, &run.options)?;

    match &run.output {
        Some(path) => {
            report::write_report(path, &rendered)?;
            eprintln!("{} Report written to {}", "✓".green(), path.display());
        }
        None => print!("{}", rendered),
    }

    if run.mode == OutputMode::Terminal {
        print_summary(&outcome, run.kind, found);
    }

    Ok(found)
}

fn print_summary(outcome: &ScanOutcome, kind: ReportKind, found: usize) {
    println!(
        "{} Indexed {} bindings under {} keys from {} packages ({} ignored)",
        "✓".green(),
        outcome.detector.total_bindings(),
        outcome.detector.len(),
        outcome.packages.len(),
        outcome.detector.ignored_count(),
    );

    if !outcome.failures.is_empty() {
        println!(
            "{} {} problem{} while scanning, run with -v for details",
            "⚠".yellow(),
            outcome.failures.len(),
            if outcome.failures.len() == 1 { "" } else { "s" }
        );
    }

    match kind {
        ReportKind::Conflicts if found == 0 => {
            println!("{} {}", "✓".green().bold(), "No conflicts detected!".bold());
        }
        ReportKind::Conflicts => println!(
            "{} Found {} conflicting key{}",
            "✗".red().bold(),
            found,
            if found == 1 { "" } else { "s" }
        ),
        ReportKind::Overlaps => println!("{} {} overlapping prefix keys", "→".cyan(), found),
        ReportKind::All => {}
    }
}

fn watch_loop(run: &Run) -> anyhow::Result<()> {
    let watcher = KeymapWatcher::new(run.packages.clone())
        .with_context(|| format!("Failed to watch {}", run.packages.display()))?;

    eprintln!("{} Watching for keymap changes (Ctrl+C to stop)", "→".cyan());

    while watcher.wait_for_change(Duration::from_millis(250)) {
        let now = chrono::Local::now().format("%H:%M:%S");
        println!("\n{}", format!("── Rescan at {} ──", now).dimmed());
        if let Err(e) = scan_and_report(run) {
            tracing::error!("{:#}", e);
        }
    }

    Ok(())
}
