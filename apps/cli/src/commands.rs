//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use siteforge_nodes::DeriveOptions;
use siteforge_pages::{CreatePagesOptions, create_pages};
use siteforge_shared::{RESOLVABLE_EXTENSIONS, SiteConfig, init_config, load_config};

use crate::ingest::{FileSource, ManifestSink, derive_all, ingest_content};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// siteforge — build hooks for Markdown-based sites.
#[derive(Parser)]
#[command(
    name = "siteforge",
    version,
    about = "Derive node slugs and emit a page manifest from content and data feeds.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Site root directory (defaults to the current directory).
    #[arg(long, global = true)]
    pub root: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the build hooks and write the page manifest.
    Build {
        /// Manifest output path (overrides the configured location).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default siteforge.toml into the site root.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "siteforge=info",
        1 => "siteforge=debug",
        _ => "siteforge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let site_root = match &cli.root {
        Some(root) => PathBuf::from(root),
        None => std::env::current_dir()
            .map_err(|e| eyre!("cannot determine working directory: {e}"))?,
    };

    match cli.command {
        Command::Build { out } => cmd_build(&site_root, out.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&site_root),
            ConfigAction::Show => cmd_config_show(&site_root),
        },
    }
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

async fn cmd_build(site_root: &std::path::Path, out: Option<&str>) -> Result<()> {
    let start = std::time::Instant::now();
    let config = load_config(site_root)?;

    let content_dir = site_root.join(&config.paths.content_dir);
    if !content_dir.is_dir() {
        return Err(eyre!(
            "content directory '{}' not found — is '{}' a site root?",
            content_dir.display(),
            site_root.display()
        ));
    }

    info!(
        site_root = %site_root.display(),
        content_dir = %config.paths.content_dir,
        "starting build"
    );

    let spinner = build_spinner();

    // --- Phase 1: ingest the content tree ---
    spinner.set_message("Reading content");
    let mut ingested = ingest_content(&content_dir)?;

    // --- Phase 2: derive node fields ---
    spinner.set_message("Deriving node fields");
    let derive_opts = DeriveOptions {
        content_dir: config.paths.content_dir.clone(),
        static_dir: config.paths.static_dir.clone(),
    };
    let derived = derive_all(&mut ingested, &derive_opts)?;

    // --- Phase 3: create pages ---
    spinner.set_message("Creating pages");
    let source = FileSource::new(
        &ingested,
        site_root.join(&config.sources.products),
        site_root.join(&config.sources.sheet),
    );
    let mut sink = ManifestSink::default();
    let create_opts = CreatePagesOptions {
        templates_dir: PathBuf::from(&config.paths.templates_dir),
    };

    let result = create_pages(&source, &mut sink, &create_opts).await?;

    // --- Phase 4: write the manifest ---
    spinner.set_message("Writing manifest");
    let manifest_path = match out {
        Some(path) => PathBuf::from(path),
        None => site_root.join(&config.paths.manifest),
    };
    sink.write_manifest(&manifest_path)?;

    spinner.finish_and_clear();

    // Print summary
    println!();
    println!("  Build complete!");
    println!("  Files:    {}", ingested.file_count());
    println!(
        "  Nodes:    {} ({} markdown, {} with derived fields)",
        ingested.nodes.len(),
        ingested.markdown_count(),
        derived
    );
    println!(
        "  Pages:    {} ({} markdown, {} product, {} blog)",
        sink.len(),
        result.markdown_pages,
        result.product_pages,
        result.blog_pages
    );
    println!("  Manifest: {}", manifest_path.display());
    println!("  Time:     {:.1}s", start.elapsed().as_secs_f64());
    println!();

    Ok(())
}

/// Spinner shown while build phases run.
fn build_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init(site_root: &std::path::Path) -> Result<()> {
    let path = init_config(site_root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(site_root: &std::path::Path) -> Result<()> {
    let config: SiteConfig = load_config(site_root)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    println!("# resolvable extensions: {}", RESOLVABLE_EXTENSIONS.join(", "));
    Ok(())
}
