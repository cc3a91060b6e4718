//! Resiz CLI - batch image conversion
//!
//! Converts a single image or a whole directory tree into a destination
//! directory, using a bounded number of worker slots.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use resiz::batch::resolve_sources;
use resiz::parallel::{ProgressTracker, ProgressUpdate};
use resiz::paths::SUPPORTED_EXTENSIONS;
use resiz::{
    default_concurrency, init_with_config, BatchCoordinator, BatchOptions, BatchResult, Config,
    ImageCodec, OutputFormat, TaskOutcome,
};

/// Exit code when the batch ran but some files failed
const EXIT_PARTIAL_FAILURE: i32 = 2;

/// Resiz - batch image conversion orchestrator
#[derive(Parser)]
#[command(
    name = "resiz",
    version,
    about = "Batch image converter with bounded parallel workers",
    long_about = "Resiz converts a single image or every supported image under a directory \
                  tree into a destination directory. Each file is resized to the requested \
                  width and/or height, re-encoded in the requested format and quality, and \
                  processed on a bounded pool of worker slots. One failing file never stops \
                  the others.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Source image file or directory
    #[arg(value_name = "SOURCE")]
    source: Option<PathBuf>,

    /// Destination directory (default: resized_<timestamp> next to the source)
    #[arg(short, long, value_name = "PATH")]
    destination: Option<PathBuf>,

    /// Target width in pixels
    #[arg(short, long, value_name = "PIXELS")]
    width: Option<u32>,

    /// Target height in pixels
    #[arg(short = 'H', long, value_name = "PIXELS")]
    height: Option<u32>,

    /// Output quality (0-99)
    #[arg(short, long, value_name = "QUALITY", allow_negative_numbers = true)]
    quality: Option<i64>,

    /// Output format (unrecognized names fall back to jpg)
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<String>,

    /// Number of worker slots (default: half the CPUs minus one)
    #[arg(short, long, value_name = "COUNT")]
    threads: Option<usize>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "RESIZ_CONFIG")]
    config: Option<PathBuf>,

    /// Named profile from the configuration
    #[arg(short, long, value_name = "NAME")]
    profile: Option<String>,

    /// Print the batch result as JSON
    #[arg(long)]
    json: bool,

    /// Resolve and list the source files without converting anything
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'Q', long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// List supported input extensions and output formats
    Formats,
    /// Write the default configuration to a file
    ExampleConfig {
        /// Output file path (.toml, .yaml or .yml)
        #[arg(short, long, default_value = "resiz.toml")]
        output: PathBuf,
    },
    /// Show system information and the default concurrency
    Info,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
    };

    if cli.quiet {
        config.logging.level = "error".to_string();
    } else if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    if let Err(e) = init_with_config(&config) {
        eprintln!("{}: {}", style("Error").red().bold(), e.user_message());
        process::exit(1);
    }

    if let Some(command) = cli.command {
        if let Err(e) = handle_subcommand(command) {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
        return;
    }

    let Some(source) = cli.source.clone() else {
        eprintln!("{}: SOURCE is required", style("Error").red().bold());
        eprintln!("Run with --help for usage information");
        process::exit(1);
    };

    let options = match build_options(&cli, source, &config) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}: {}", style("Error").red().bold(), e.user_message());
            process::exit(1);
        }
    };

    if cli.dry_run {
        match resolve_sources(&options) {
            Ok(sources) => {
                print_dry_run(sources.files(), cli.json);
                return;
            }
            Err(e) => {
                eprintln!("{}: {}", style("Error").red().bold(), e.user_message());
                process::exit(1);
            }
        }
    }

    let mut coordinator = BatchCoordinator::new(Arc::new(ImageCodec::new()));
    if let Some(threads) = cli.threads.or(config.processing.threads) {
        coordinator = match coordinator.with_concurrency(threads) {
            Ok(coordinator) => coordinator,
            Err(e) => {
                eprintln!("{}: {}", style("Error").red().bold(), e.user_message());
                process::exit(1);
            }
        };
    }
    info!("Using {} worker slots", coordinator.concurrency());

    let progress_bar = if cli.json || cli.quiet {
        None
    } else {
        let tracker = Arc::new(ProgressTracker::new());
        let handle = spawn_progress_bar(&tracker);
        coordinator = coordinator.with_progress(tracker);
        Some(handle)
    };

    match coordinator.run_batch(options).await {
        Ok(result) => {
            if let Some(handle) = progress_bar {
                // Ends on BatchCompleted
                let _ = handle.await;
            }
            print_summary(&result, cli.json);
            if !result.is_complete_success() {
                process::exit(EXIT_PARTIAL_FAILURE);
            }
        }
        Err(e) => {
            if let Some(handle) = progress_bar {
                handle.abort();
            }
            eprintln!("{}: {}", style("Error").red().bold(), e.user_message());
            process::exit(1);
        }
    }
}

/// Load the config named on the command line, else the default location, else built-ins
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => match Config::default_path().filter(|p| p.is_file()) {
            Some(path) => Config::from_file(&path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => Config::default(),
        },
    };

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Merge CLI flags, profile and config defaults into batch options
fn build_options(cli: &Cli, source: PathBuf, config: &Config) -> resiz::Result<BatchOptions> {
    let options = BatchOptions {
        source,
        destination: cli.destination.clone(),
        width: cli.width,
        height: cli.height,
        quality: cli.quality,
        format: cli.format.clone(),
    };

    let options = config.apply_to(options, cli.profile.as_deref())?;
    debug!("Effective options: {:?}", options);
    Ok(options)
}

/// Drive an indicatif bar from the tracker's broadcast channel
fn spawn_progress_bar(tracker: &ProgressTracker) -> JoinHandle<()> {
    let mut updates = tracker.subscribe();

    tokio::spawn(async move {
        let bar = ProgressBar::new(0);
        if let Ok(bar_style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({per_sec}, {eta})",
        ) {
            bar.set_style(bar_style.progress_chars("#>-"));
        }

        loop {
            match updates.recv().await {
                Ok(ProgressUpdate::Started { total_files }) => {
                    bar.set_length(total_files as u64);
                }
                Ok(ProgressUpdate::FileCompleted {
                    source_path,
                    success,
                }) => {
                    if !success {
                        bar.println(format!("{} {}", style("✗").red(), source_path.display()));
                    }
                    bar.inc(1);
                }
                Ok(ProgressUpdate::BatchCompleted { .. }) => {
                    bar.finish_and_clear();
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    bar.inc(skipped);
                }
                Err(RecvError::Closed) => {
                    bar.abandon();
                    break;
                }
            }
        }
    })
}

fn handle_subcommand(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Formats => show_formats(),
        Commands::ExampleConfig { output } => generate_example_config(&output)?,
        Commands::Info => show_system_info(),
    }
    Ok(())
}

fn show_formats() {
    println!("{}", style("Input extensions:").bold());
    println!("  {}", SUPPORTED_EXTENSIONS.join(", "));
    println!();

    println!("{}", style("Output formats:").bold());
    for format in OutputFormat::ALL {
        let encodable = format == OutputFormat::Raw || format.image_format().is_some();
        let marker = if encodable {
            style("✓").green()
        } else {
            style("-").dim()
        };
        println!("  {} {}", marker, format);
    }
    println!();
    println!(
        "Unrecognized output formats fall back to {}",
        style(OutputFormat::DEFAULT).cyan()
    );
}

fn generate_example_config(output: &Path) -> anyhow::Result<()> {
    Config::default()
        .to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{}: Generated example configuration: {}",
        style("Success").green().bold(),
        output.display()
    );
    Ok(())
}

fn show_system_info() {
    use sysinfo::{CpuExt, System, SystemExt};

    println!("{}", style("Resiz System Information").bold());
    println!();
    println!("{}: {}", style("Version").bold(), resiz::VERSION);
    println!();

    let mut system = System::new_all();
    system.refresh_all();

    println!("{}", style("System:").bold());
    if let Some(name) = system.name() {
        println!("  OS: {}", name);
    }
    if let Some(version) = system.os_version() {
        println!("  Version: {}", version);
    }
    println!("  CPUs: {}", system.cpus().len());
    if let Some(cpu) = system.cpus().first() {
        println!(
            "  CPU: {} ({:.2} GHz)",
            cpu.brand(),
            cpu.frequency() as f64 / 1000.0
        );
    }
    println!(
        "  Memory: {:.2} GB total, {:.2} GB available",
        system.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0,
        system.available_memory() as f64 / 1024.0 / 1024.0 / 1024.0
    );
    println!();

    println!("{}", style("Scheduling:").bold());
    println!("  Default worker slots: {}", default_concurrency());
}

fn print_dry_run(files: &[PathBuf], json: bool) {
    if json {
        match serde_json::to_string_pretty(files) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("{}: {}", style("Error").red().bold(), e),
        }
        return;
    }

    println!("{} files would be converted:", style(files.len()).bold());
    for file in files {
        println!("  {}", file.display());
    }
}

fn print_summary(result: &BatchResult, json: bool) {
    if json {
        match serde_json::to_string_pretty(result) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("{}: {}", style("Error").red().bold(), e),
        }
        return;
    }

    println!();
    println!("{}", style("Conversion Summary:").bold());
    println!("  {}: {}", style("Converted").green(), result.succeeded.len());
    if !result.failed.is_empty() {
        println!("  {}: {}", style("Failed").red(), result.failed.len());
    }
    println!(
        "  {}: {:.2}s",
        style("Duration").blue(),
        result.elapsed.as_secs_f64()
    );
    if result.total() > 0 {
        println!(
            "  {}: {:.1} files/sec",
            style("Speed").cyan(),
            result.files_per_second()
        );
    }

    if !result.failed.is_empty() {
        println!();
        println!("{}", style("Errors:").bold());
        for outcome in &result.failed {
            if let TaskOutcome::Failure {
                source_path,
                kind,
                detail,
            } = outcome
            {
                println!("  {} [{}]: {}", source_path.display(), kind, detail);
            }
        }
    }
}
