//! CLI entrypoint for koala.

#[path = "koala/cli.rs"]
mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use cli::{Cli, Command};
use koala_trace::{
    Breakpoint, DisplayMode, ProjectConfig, ReplayScript, Report, SourceLocation, StaticRegistry,
    Tracker,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("koala error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Replay {
            script,
            root,
            diagram,
            suggest,
        } => replay(&script, &root, cli.config.as_deref(), diagram, suggest),
        Command::Suggest { root, breakpoints } => {
            suggest(&root, cli.config.as_deref(), &breakpoints)
        }
    }
}

fn load_config(root: &Path, config: Option<&Path>) -> anyhow::Result<(PathBuf, ProjectConfig)> {
    let root = std::fs::canonicalize(root)
        .with_context(|| format!("source root '{}' does not exist", root.display()))?;
    let config = match config {
        Some(path) => ProjectConfig::load_file(&root, path)?,
        None => ProjectConfig::load(&root),
    };
    Ok((root, config))
}

fn replay(
    script_path: &Path,
    root: &Path,
    config: Option<&Path>,
    diagram: bool,
    suggest: bool,
) -> anyhow::Result<()> {
    let (root, config) = load_config(root, config)?;
    let script = ReplayScript::load(script_path)?;
    let registry = Arc::new(script.registry(&root));
    let mut tracker = Tracker::from_config(&config, registry.clone());

    info!(events = script.events.len(), "replaying {}", script_path.display());
    let outcome = script.run(&mut tracker, &registry, &root);
    if diagram && tracker.mode() == DisplayMode::PostSessionTrace {
        tracker.toggle_view();
    }

    let report = Report::new(&root);
    print!("{}", report.view(&tracker.current_view()));
    for location in &outcome.opened {
        println!("open {}", report.location(location));
    }
    for token in &outcome.rejected {
        println!("rejected token {token:?}");
    }
    for ticket in outcome.tickets {
        match ticket.wait() {
            Ok(suggestions) => print!("{}", report.suggestions(&suggestions)),
            Err(err) => println!("suggestions unavailable: {err}"),
        }
    }
    if suggest {
        print!("{}", report.suggestions(&tracker.suggest()?));
    }
    Ok(())
}

fn suggest(root: &Path, config: Option<&Path>, breakpoints: &[String]) -> anyhow::Result<()> {
    let (root, config) = load_config(root, config)?;
    let breakpoints = breakpoints
        .iter()
        .map(|raw| parse_breakpoint(&root, raw))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let tracker = Tracker::from_config(&config, Arc::new(StaticRegistry::new(breakpoints)));
    let suggestions = tracker.suggest()?;
    print!("{}", Report::new(&root).suggestions(&suggestions));
    Ok(())
}

fn parse_breakpoint(root: &Path, raw: &str) -> anyhow::Result<Breakpoint> {
    let Some((path, line)) = raw.rsplit_once(':') else {
        bail!("breakpoint '{raw}' must be PATH:LINE");
    };
    let line: u32 = line
        .parse()
        .with_context(|| format!("breakpoint '{raw}' has an invalid line"))?;
    if line == 0 || path.is_empty() {
        bail!("breakpoint '{raw}' must be PATH:LINE with a 1-based line");
    }
    let path = root.join(path);
    Ok(Breakpoint::enabled(SourceLocation::new(
        path.to_string_lossy().as_ref(),
        line - 1,
    )))
}
