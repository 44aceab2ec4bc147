//! `reqtrack config` command - Configuration management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::core::config::{is_valid_key, VALID_KEYS};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show the path to the configuration file
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., server_url, min_latency_ms)
    pub key: String,

    /// Value to set
    pub value: String,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,
}

pub fn run(cmd: ConfigCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs) -> Result<()> {
    let config = Config::load();

    if let Some(key) = &args.key {
        require_known_key(key)?;
        return match config.get(key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in VALID_KEYS {
        print_config_value(key, config.get(key).as_deref());
    }

    println!();
    println!("{}", style("Resolved:").dim());
    println!("  server: {}", config.server_url());
    println!("  data dir: {}", config.data_dir().display());

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Command-line flags (--server)");
    println!("  2. Environment variables (REQTRACK_SERVER, REQTRACK_MIN_LATENCY_MS, REQTRACK_DATA_DIR)");
    println!("  3. Global config (config.yaml in the user config directory)");
    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    require_known_key(&args.key)?;
    let value = parse_value(&args.key, &args.value)?;

    let config_path = get_global_config_path()?;
    let mut config_map = read_mapping(&config_path)?;
    if let serde_yml::Value::Mapping(map) = &mut config_map {
        map.insert(serde_yml::Value::String(args.key.clone()), value);
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    println!(
        "{} Set {} {} {}",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow()
    );
    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    require_known_key(&args.key)?;
    let config_path = get_global_config_path()?;
    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;
    let removed = match &mut config_map {
        serde_yml::Value::Mapping(map) => map
            .remove(&serde_yml::Value::String(args.key.clone()))
            .is_some(),
        _ => false,
    };
    if !removed {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    println!("{} Removed {}", style("✓").green(), style(&args.key).cyan());
    Ok(())
}

fn run_path() -> Result<()> {
    let path = get_global_config_path()?;
    println!("{}", path.display());
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();
    for (key, description) in VALID_KEYS {
        println!("  {:<22} {}", style(key).cyan(), style(description).dim());
    }
    println!();
    println!(
        "{}",
        style("Use 'reqtrack config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}

// Helper functions

fn get_global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn require_known_key(key: &str) -> Result<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(miette::miette!(
            help = "Run 'reqtrack config keys' to list valid keys",
            "Unknown configuration key '{}'",
            key
        ))
    }
}

/// Numeric keys are stored as YAML numbers so the file still deserializes
fn parse_value(key: &str, raw: &str) -> Result<serde_yml::Value> {
    match key {
        "min_latency_ms" | "request_timeout_secs" => raw
            .trim()
            .parse::<u64>()
            .map(|n| serde_yml::Value::Number(n.into()))
            .map_err(|_| miette::miette!("'{}' expects a whole number, got '{}'", key, raw)),
        _ => Ok(serde_yml::Value::String(raw.to_string())),
    }
}

fn read_mapping(path: &Path) -> Result<serde_yml::Value> {
    if !path.exists() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value =
        serde_yml::from_str(&content).unwrap_or(serde_yml::Value::Mapping(Default::default()));
    if parsed.is_mapping() {
        Ok(parsed)
    } else {
        Ok(serde_yml::Value::Mapping(Default::default()))
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}
