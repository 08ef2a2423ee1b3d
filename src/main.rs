//! svg-assets CLI
//!
//! Commands: generate, template, list-presets, list-templates
//! Logs go to stderr; stdout carries the report (or, for the hidden
//! `worker` command, the JSON reply to the parent process).

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use svg_assets::{
    Color, ExecutionMode, FitMode, GenerationReport, Pipeline, PipelineConfig, PresetRegistry, SourceRef,
    Strictness, template,
};

#[derive(Parser)]
#[command(name = "svg-assets", version)]
#[command(about = "Turn one SVG into favicons, PWA icons and social preview images")]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate assets from an SVG (or raster) file
    Generate {
        /// Source SVG or image file
        source: PathBuf,

        #[command(flatten)]
        options: GenerateOptions,
    },

    /// Generate assets from a built-in template
    Template {
        /// Template name (see list-templates)
        name: String,

        #[command(flatten)]
        options: GenerateOptions,
    },

    /// List available presets
    ListPresets,

    /// List built-in templates
    ListTemplates,

    /// Process-pool worker: reads one job from stdin, replies on stdout
    #[command(hide = true)]
    Worker,
}

#[derive(Args)]
struct GenerateOptions {
    /// Output directory
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Preset to use (web, mobile, full, or a custom preset)
    #[arg(short, long, default_value = "web")]
    preset: String,

    /// Background color (hex or CSS name, e.g. '#282a36')
    #[arg(long = "bg", value_name = "COLOR")]
    background: Option<String>,

    /// Foreground color (hex or CSS name, e.g. '#f8f8f2')
    #[arg(long = "fg", value_name = "COLOR")]
    foreground: Option<String>,

    /// Fit mode: cover (crop), contain (pad) or stretch
    #[arg(short, long, default_value_t = FitMode::Cover)]
    fit: FitMode,

    /// Render outputs on a thread pool
    #[arg(short = 'P', long, conflicts_with = "processes")]
    parallel: bool,

    /// Render outputs in worker processes
    #[arg(long)]
    processes: bool,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Keep going when an output fails; the manifest lists the successes
    #[arg(long)]
    best_effort: bool,

    /// Do not write a web manifest
    #[arg(long)]
    no_manifest: bool,

    /// App name recorded in the manifest
    #[arg(long)]
    app_name: Option<String>,

    /// Also write the resolved configuration as JSON
    #[arg(long, value_name = "FILE")]
    save_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Generate { source, options } => generate(SourceRef::path(source), &options),
        Commands::Template { name, options } => generate(template::get_template(&name)?, &options),
        Commands::ListPresets => {
            let registry = PresetRegistry::discover();
            println!("Available presets:\n");
            for preset in registry.iter() {
                println!("  {:<12} {}", preset.name, preset.description);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::ListTemplates => {
            println!("Available templates:\n");
            for name in template::template_names() {
                println!("  {name}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Worker => {
            svg_assets::run_worker().context("worker failed")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn generate(source: SourceRef, options: &GenerateOptions) -> Result<ExitCode> {
    let config = build_config(source, options)?;

    if let Some(path) = &options.save_config {
        let json = config.to_json_pretty().context("failed to serialize configuration")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    }

    let report = Pipeline::new(config)
        .generate(&options.output)
        .with_context(|| format!("failed to generate assets in {}", options.output.display()))?;
    print_report(&report);

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn build_config(source: SourceRef, options: &GenerateOptions) -> Result<PipelineConfig> {
    let registry = PresetRegistry::discover();
    let preset = registry.get(&options.preset)?.clone();

    let mut builder = PipelineConfig::builder(source)
        .with_preset(preset)
        .with_fit_mode(options.fit);

    if let Some(bg) = &options.background {
        let color = Color::parse(bg).with_context(|| format!("invalid --bg color {bg:?}"))?;
        builder = builder.with_background(color);
    }
    if let Some(fg) = &options.foreground {
        let color = Color::parse(fg).with_context(|| format!("invalid --fg color {fg:?}"))?;
        builder = builder.with_foreground(color);
    }

    let execution = if options.processes {
        ExecutionMode::process_pool(options.workers)
    } else if options.parallel {
        ExecutionMode::thread_pool(options.workers)
    } else {
        ExecutionMode::Sequential
    };
    builder = builder.with_execution(execution);

    if options.best_effort {
        builder = builder.with_strictness(Strictness::BestEffort);
    }
    if options.no_manifest {
        builder = builder.with_manifest(false);
    }
    if let Some(name) = &options.app_name {
        builder = builder.with_app_name(name);
    }

    Ok(builder.build())
}

fn print_report(report: &GenerationReport) {
    let written = report.written_files();
    println!(
        "\nGenerated {} files in {}\n",
        written.len(),
        report.output_dir.display()
    );

    let mut rows: Vec<(String, u64)> = written
        .iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().into_owned();
            let size = fs::metadata(path).ok()?.len();
            Some((name, size))
        })
        .collect();
    rows.sort();

    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(4).max(4);
    println!("  {:<width$}  {:>10}", "File", "Size");
    for (name, size) in rows {
        println!("  {name:<width$}  {:>10}", format_size(size));
    }

    if !report.failures.is_empty() {
        println!("\nFailed outputs:\n");
        for failure in &report.failures {
            println!("  {} [{}]: {}", failure.name, failure.error.kind(), failure.error);
        }
    }
    println!();
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}
