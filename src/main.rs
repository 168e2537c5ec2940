use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use placard::{naming, FileGenerator, PlacardConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory (overrides config if provided)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Dry run mode - don't write files
    #[arg(long, global = true)]
    dry_run: bool,

    /// Include patterns on template identifiers (glob or regex:pattern)
    #[arg(long, global = true)]
    include: Vec<String>,

    /// Exclude patterns on template identifiers (glob or regex:pattern)
    #[arg(long, global = true)]
    exclude: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new placard project
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Render templates from the configuration (default command)
    Render,
    /// Print the file name derived from a template identifier
    Name {
        identifier: String,

        /// Suffix stripped before deriving
        #[arg(long, default_value = naming::DEFAULT_SUFFIX)]
        suffix: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Init { path }) => init_project(path)?,
        Some(Commands::Name { identifier, suffix }) => {
            let file_name = naming::derive(identifier, suffix, str::to_string)
                .with_context(|| format!("Failed to derive a name from {}", identifier))?;
            println!("{}", file_name);
        }
        Some(Commands::Render) | None => render(&cli)?,
    }

    Ok(())
}

fn init_project(path: &Path) -> Result<()> {
    info!("Initializing placard project at {:?}", path);

    std::fs::create_dir_all(path.join("templates"))?;

    let config_content = r#"marker: "__"
output: "generated"

templates:
  - identifier: UserControllerPhp
    file: templates/controller.php
    replacers:
      class: { value: "user controller", transform: pascalcase }
      table: users
  - identifier: ReadmeTemplate
    name: README
    extension: md
    body: |
      # __project__
    replacers:
      project: MyProject
"#;
    std::fs::write(path.join("placard.yaml"), config_content)?;

    let template_content = r#"<?php

class __class__
{
    const TABLE = '__table__';
}
"#;
    std::fs::write(path.join("templates/controller.php"), template_content)?;

    info!("✓ Project initialized successfully!");
    info!("  Run: placard -c placard.yaml");

    Ok(())
}

fn render(cli: &Cli) -> Result<()> {
    let config_path = cli
        .config
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--config is required"))?;

    info!("Loading config from {:?}", config_path);
    let config = PlacardConfig::load(config_path).context("Failed to load config")?;

    let base_dir = config_path.parent().unwrap_or(Path::new("."));
    let output_dir = match &cli.output {
        Some(output) => output.clone(),
        None => base_dir.join(config.output.as_deref().unwrap_or(".")),
    };

    if cli.dry_run {
        info!("=== DRY RUN MODE ===");
    } else {
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;
    }

    let generator = FileGenerator::new(cli.dry_run);
    for entry in &config.templates {
        if !entry.enabled {
            continue;
        }
        if should_filter(&entry.identifier, &cli.include, &cli.exclude) {
            info!("Skipping template: {}", entry.identifier);
            continue;
        }

        let mut instance = entry
            .instantiate(base_dir, &config.marker)
            .with_context(|| format!("Failed to prepare template {}", entry.identifier))?;
        instance
            .compile()
            .with_context(|| format!("Failed to compile template {}", entry.identifier))?;
        let file_name = instance.full_name()?;
        generator
            .write_sync(&output_dir, &file_name, instance.compiled())
            .with_context(|| format!("Failed to write template {}", entry.identifier))?;
    }

    if cli.dry_run {
        info!("=== DRY RUN COMPLETE ===");
    }

    Ok(())
}

fn should_filter(name: &str, include: &[String], exclude: &[String]) -> bool {
    if !include.is_empty() && !include.iter().any(|pattern| matches_pattern(name, pattern)) {
        return true;
    }
    exclude.iter().any(|pattern| matches_pattern(name, pattern))
}

fn matches_pattern(name: &str, pattern: &str) -> bool {
    if let Some(regex_pattern) = pattern.strip_prefix("regex:") {
        if let Ok(re) = regex::Regex::new(regex_pattern) {
            return re.is_match(name);
        }
    }

    // Single-star glob only; prefix and suffix must not overlap
    if pattern.contains('*') {
        let parts: Vec<&str> = pattern.split('*').collect();
        if parts.len() == 2 {
            return name.len() >= parts[0].len() + parts[1].len()
                && name.starts_with(parts[0])
                && name.ends_with(parts[1]);
        }
    }

    name == pattern
}
