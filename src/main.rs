use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tyx_core::constants::SAMPLES_DIR;
use tyx_core::{CheckReport, CoreConfig};
use tyx_schema::{Document, Node};

#[derive(Parser)]
#[command(name = "tyx")]
#[command(about = "Check and inspect TyX documents and settings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate documents, or every document in a directory
    Check {
        /// Files or directories (default: the samples directory)
        paths: Vec<PathBuf>,
    },
    /// Validate a settings file and print the effective values
    Settings {
        /// Settings file (default: the app-wide settings file)
        path: Option<PathBuf>,
    },
    /// Re-serialize a document with indentation
    ///
    /// Keys outside content nodes that TyX does not know are not kept. With --write, a file
    /// holding such keys is left untouched and the command fails.
    Format {
        path: PathBuf,
        /// Overwrite the file instead of printing to stdout
        #[arg(long)]
        write: bool,
    },
    /// Count nodes and text marks in a document
    Stats { path: PathBuf },
}

/// Entry point for the `tyx` command line tool.
///
/// # Environment Variables
/// - `TYX_SETTINGS_DIR`: directory holding `settings.json` (default: platform config dir)
/// - `TYX_SAMPLES_DIR`: directory of sample documents used by `check` with no paths
/// - `RUST_LOG`: log filter (default: `tyx=info`)
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("tyx=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config()?;

    match cli.command {
        Commands::Check { paths } => check(&config, paths),
        Commands::Settings { path } => settings(&config, path),
        Commands::Format { path, write } => format(&path, write),
        Commands::Stats { path } => stats(&path),
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn load_config() -> anyhow::Result<CoreConfig> {
    let settings_dir = tyx_core::resolve_settings_dir(env_path("TYX_SETTINGS_DIR"))?;
    let samples_dir = match env_path("TYX_SAMPLES_DIR") {
        Some(dir) => tyx_core::resolve_samples_dir(Some(dir))?,
        None => tyx_core::resolve_samples_dir(None).unwrap_or_else(|_| PathBuf::from(SAMPLES_DIR)),
    };
    tracing::debug!(
        "settings dir {}, samples dir {}",
        settings_dir.display(),
        samples_dir.display()
    );
    Ok(CoreConfig::new(settings_dir, samples_dir)?)
}

/// Expand directories into the documents they contain.
fn collect_documents(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for path in paths {
        if path.is_dir() {
            documents.extend(tyx_core::find_documents(path)?);
        } else {
            documents.push(path.clone());
        }
    }
    Ok(documents)
}

fn check(config: &CoreConfig, paths: Vec<PathBuf>) -> anyhow::Result<()> {
    let paths = if paths.is_empty() {
        vec![config.samples_dir().to_path_buf()]
    } else {
        paths
    };

    let report = tyx_core::check_files(collect_documents(&paths)?);
    print_report(&report);

    let failed = report.failed().count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} documents failed", report.outcomes.len());
    }
    Ok(())
}

fn print_report(report: &CheckReport) {
    for outcome in &report.outcomes {
        match &outcome.error {
            None => println!("ok    {}", outcome.path.display()),
            Some(e) => println!("FAIL  {}: {}", outcome.path.display(), error_chain(e)),
        }
    }
    println!("{} passed, {} failed", report.passed(), report.failed().count());
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

fn settings(config: &CoreConfig, path: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = match &path {
        Some(path) => tyx_core::get_settings(path)?,
        None => tyx_core::read_settings_file(config)?,
    };
    let source = path.unwrap_or_else(|| config.settings_file());

    println!("settings:          {}", source.display());
    println!("language:          {}", settings.language.as_deref().unwrap_or("(default)"));
    println!("keyboard map:      {}", settings.keyboard_map.as_deref().unwrap_or("(default)"));
    println!("format output:     {}", settings.format_enabled());
    println!("auto start server: {}", settings.auto_start_server.unwrap_or(false));
    println!("server debounce:   {} ms", settings.server_debounce().as_millis());
    println!(
        "shortcuts:         {}",
        settings.keyboard_shortcuts.as_ref().map_or(0, Vec::len)
    );
    println!(
        "math shortcuts:    {}",
        settings.math_inline_shortcuts.as_ref().map_or(0, Vec::len)
    );
    if let Some(functions) = &settings.functions {
        for (name, definition) in functions {
            println!(
                "function {name}: {} required parameter(s){}",
                definition.required_parameter_count(),
                if definition.inline == Some(true) { ", inline" } else { "" }
            );
        }
    }
    Ok(())
}

fn format(path: &Path, write: bool) -> anyhow::Result<()> {
    let document = tyx_core::open_document(path)?;
    let original =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let dropped: Vec<String> = tyx_schema::dropped_fields(&original)?
        .iter()
        .map(ToString::to_string)
        .collect();
    let mut bytes = tyx_schema::serialize_pretty(&document)?;
    bytes.push(b'\n');

    if !dropped.is_empty() {
        if write {
            anyhow::bail!(
                "refusing to rewrite {}: unknown keys would be lost: {}",
                path.display(),
                dropped.join(", ")
            );
        }
        tracing::warn!("output omits unknown keys: {}", dropped.join(", "));
    }

    if write {
        std::fs::write(path, &bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("formatted {}", path.display());
    } else {
        std::io::stdout().write_all(&bytes)?;
    }
    Ok(())
}

/// Number of nodes per `type`, over the whole content tree.
fn count_tags(document: &Document) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for node in document.nodes() {
        *counts.entry(node.tag()).or_insert(0) += 1;
    }
    counts
}

/// Number of text nodes carrying each mark.
fn count_marks(document: &Document) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for node in document.nodes() {
        if let Node::Text(text) = node {
            for (name, _) in text.format.iter_names() {
                *counts.entry(name).or_insert(0) += 1;
            }
            if text.format.unknown_bits() != 0 {
                *counts.entry("UNKNOWN").or_insert(0) += 1;
            }
        }
    }
    counts
}

fn stats(path: &Path) -> anyhow::Result<()> {
    let document = tyx_core::get_document(path)?;

    println!("version: {}", document.version);
    println!("compatible: {}", document.is_compatible());
    println!("blocks: {}", document.blocks().len());
    for (tag, count) in count_tags(&document) {
        println!("  {tag:<16}{count}");
    }
    let marks = count_marks(&document);
    if !marks.is_empty() {
        println!("marks:");
        for (mark, count) in marks {
            println!("  {:<16}{count}", mark.to_lowercase());
        }
    }
    Ok(())
}
