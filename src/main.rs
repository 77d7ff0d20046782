use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tmpl_resolve::config::{Cli, Config};
use tmpl_resolve::processor::Renderer;
use tmpl_resolve::runner::{build_pool, collect_results, run_batch};
use tmpl_resolve::scanner::{discover_templates, marker_pattern};
use tmpl_resolve::settings::{default_search_dirs, Settings};
use tmpl_resolve::token::TokenExtractor;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Log to stderr so stdout only carries per-file output
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_cli(cli)?;
    init_logging(config.verbose);

    if !config.root.is_dir() {
        bail!("Template root not found: {}", config.root.display());
    }

    // Everything fatal happens before the first file is touched
    let settings = Settings::load(config.config_file.as_deref(), &default_search_dirs())
        .context("Failed to load settings")?;
    match settings.source() {
        Some(path) => debug!("Using {} ({} values)", path.display(), settings.len()),
        None => debug!("Resolving from environment only"),
    }

    let extractor = TokenExtractor::new().context("Invalid placeholder pattern")?;
    let pattern = marker_pattern(&config.marker)
        .with_context(|| format!("Invalid template marker: {}", config.marker))?;
    let pool = build_pool(config.jobs).context("Failed to build worker pool")?;

    let templates = discover_templates(&config.root, &pattern);
    debug!(
        "Rendering {} template(s) with {} worker(s)",
        templates.len(),
        config.jobs
    );

    let start = Instant::now();
    let renderer = Renderer::new(&extractor, &settings, &config.marker);
    let results = run_batch(&templates, &renderer, &pool);

    let summary = collect_results(&results);
    info!(
        "Rendered {}/{} template(s) in {:.2}s ({} failed, {} unresolved variable(s))",
        summary.written,
        summary.total(),
        start.elapsed().as_secs_f64(),
        summary.failed,
        summary.unresolved
    );

    Ok(())
}
