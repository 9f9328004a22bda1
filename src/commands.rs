use crate::terminal::{TerminalNotifier, TerminalSurface};
use anyhow::{Context, Result};
use colored::Colorize;
use ctxhelp_core::{ContextualHelp, HelpCatalog};
use ctxhelp_parsers::{analyze as analyze_source, Analysis, ExtractConfig};
use std::fs;
use std::path::Path;
use tracing::info;

fn load_config(path: Option<&Path>) -> Result<ExtractConfig> {
    let Some(path) = path else {
        return Ok(ExtractConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))
}

fn analyze_file(file: &Path, config: Option<&Path>) -> Result<Analysis> {
    let config = load_config(config)?;
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    analyze_source(&source, &config).with_context(|| format!("Failed to analyze {}", file.display()))
}

pub fn analyze(file: &Path, json: bool, config: Option<&Path>) -> Result<()> {
    let analysis = analyze_file(file, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Detected GUI framework:".bold(),
        analysis.framework.to_string().green()
    );
    if analysis.elements.is_empty() {
        println!("{}", "No named elements found.".yellow());
        return Ok(());
    }

    let width = analysis
        .elements
        .iter()
        .map(|e| e.identifier.len())
        .max()
        .unwrap_or(0);
    for element in &analysis.elements {
        println!(
            "  {:<width$}  {}",
            element.identifier,
            element.widget_type.dimmed(),
            width = width
        );
    }
    Ok(())
}

pub fn generate(file: &Path, output: &Path, merge: bool, config: Option<&Path>) -> Result<()> {
    let analysis = analyze_file(file, config)?;

    let catalog = if merge && output.exists() {
        let mut catalog = HelpCatalog::load_path(output)
            .with_context(|| format!("Failed to load {}", output.display()))?;
        let added = catalog.merge_elements(&analysis.elements);
        info!("Merged {} new elements into {}", added, output.display());
        catalog
    } else {
        HelpCatalog::from_elements(&analysis.elements)
    };

    catalog
        .save_path(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "{} {} ({} framework, {} elements)",
        "Wrote".green().bold(),
        output.display(),
        analysis.framework,
        catalog.len()
    );
    Ok(())
}

fn open_help(help_file: &Path) -> Result<ContextualHelp> {
    ContextualHelp::open(help_file).with_context(|| format!("Failed to open {}", help_file.display()))
}

pub fn show(help_file: &Path, identifier: Option<&str>, general: bool) -> Result<()> {
    let help = open_help(help_file)?;
    let mut surface = TerminalSurface::stdout();

    match identifier {
        Some(identifier) if !general => {
            help.display_help(identifier, &mut surface, &mut TerminalNotifier);
        }
        _ => help.show_general_help(&mut surface),
    }
    Ok(())
}

pub fn list(help_file: &Path) -> Result<()> {
    let help = open_help(help_file)?;
    let catalog = help.catalog();

    if catalog.is_empty() {
        println!("{}", "No elements.".yellow());
        return Ok(());
    }
    for (identifier, document) in catalog.elements() {
        let lines = document.len();
        let summary = if lines == 0 {
            "empty".dimmed()
        } else {
            format!("{} line{}", lines, if lines == 1 { "" } else { "s" }).normal()
        };
        println!("  {}  {}", identifier.bold(), summary);
    }
    Ok(())
}

pub fn check(help_file: &Path) -> Result<()> {
    let help = open_help(help_file)?;
    println!(
        "{} {} ({} elements)",
        "OK".green().bold(),
        help_file.display(),
        help.catalog().len()
    );
    Ok(())
}
