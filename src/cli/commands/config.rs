//! `qms config` command - Configuration management
//!
//! View and modify the layered configuration that selects and parameterizes
//! the storage backend.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{load_config, mask_secret};
use crate::cli::GlobalOpts;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
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
    /// Configuration key (e.g., backend, hosted.url)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of local config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of local config
    #[arg(long, short = 'g')]
    pub global: bool,
}

const VALID_KEYS: &[(&str, &str)] = &[
    ("backend", "Storage backend: embedded or hosted"),
    ("storage_path", "Slot file for the embedded backend"),
    ("storage_key", "Key inside the slot file holding the database image"),
    ("hosted.url", "REST root of the hosted service"),
    ("hosted.api_key", "API key for the hosted service"),
    ("hosted.timeout_secs", "Hosted request timeout in seconds (unset = none)"),
];

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;

    if let Some(key) = &args.key {
        ensure_valid_key(key)?;
        return match get_config_value(&config, key) {
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
        print_config_value(key, get_config_value(&config, key).as_deref());
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Command-line flags (--backend, --storage)");
    println!("  2. Environment variables (QMS_BACKEND, QMS_STORAGE_PATH, QMS_HOSTED_*)");
    println!("  3. Local config (.qms/config.yaml)");
    println!("  4. Global config (~/.config/qms/config.yaml)");

    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    ensure_valid_key(&args.key)?;
    let path = config_path(args.global)?;
    let mut root = read_yaml(&path)?;

    // Scalars keep their YAML type so numeric keys stay numeric
    let value: serde_yml::Value = serde_yml::from_str(&args.value)
        .unwrap_or_else(|_| serde_yml::Value::String(args.value.clone()));
    set_nested_value(&mut root, &args.key, value)?;
    write_yaml(&path, &root)?;

    let scope = if args.global { "global" } else { "local" };
    println!(
        "{} Set {} {} = {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope
    );
    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    ensure_valid_key(&args.key)?;
    let path = config_path(args.global)?;
    if !path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            path.display()
        ));
    }

    let mut root = read_yaml(&path)?;
    if !unset_nested_value(&mut root, &args.key) {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }
    write_yaml(&path, &root)?;

    let scope = if args.global { "global" } else { "local" };
    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope
    );
    Ok(())
}

fn run_path() -> Result<()> {
    println!("{}", style("Configuration file paths:").bold());
    println!();

    let paths = [
        ("Global:", Config::global_config_path()),
        ("Local:", Some(Config::local_config_path())),
    ];
    for (label, path) in paths {
        match path {
            Some(path) => {
                let state = if path.exists() {
                    style("(exists)").green()
                } else {
                    style("(not created)").dim()
                };
                println!("  {:<8} {} {}", style(label).cyan(), path.display(), state);
            }
            None => println!(
                "  {:<8} {}",
                style(label).cyan(),
                style("(no home directory)").dim()
            ),
        }
    }
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
        style("Use 'qms config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}

fn ensure_valid_key(key: &str) -> Result<()> {
    if VALID_KEYS.iter().any(|(k, _)| *k == key) {
        Ok(())
    } else {
        Err(miette::miette!(
            "Unknown config key '{}'. Run 'qms config keys' to list them",
            key
        ))
    }
}

fn config_path(global: bool) -> Result<PathBuf> {
    if global {
        Config::global_config_path()
            .ok_or_else(|| miette::miette!("Could not determine global config directory"))
    } else {
        Ok(Config::local_config_path())
    }
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "backend" => Some(config.backend().to_string()),
        "storage_path" => Some(config.storage_path().display().to_string()),
        "storage_key" => Some(config.storage_key().to_string()),
        "hosted.url" => config.hosted.url.clone(),
        "hosted.api_key" => config.hosted.api_key.as_deref().map(mask_secret),
        "hosted.timeout_secs" => config.hosted.timeout_secs.map(|s| s.to_string()),
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    match value {
        Some(v) => println!("  {}: {}", style(key).cyan(), style(v).yellow()),
        None => println!("  {}: {}", style(key).cyan(), style("(not set)").dim()),
    }
}

fn read_yaml(path: &Path) -> Result<serde_yml::Value> {
    if !path.exists() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value = serde_yml::from_str(&content).into_diagnostic()?;
    if parsed.is_null() {
        Ok(serde_yml::Value::Mapping(Default::default()))
    } else {
        Ok(parsed)
    }
}

/// Write the file only if it still parses as a valid config
fn write_yaml(path: &Path, root: &serde_yml::Value) -> Result<()> {
    serde_yml::from_value::<Config>(root.clone())
        .map_err(|e| miette::miette!("Resulting config would be invalid: {}", e))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(root).into_diagnostic()?;
    fs::write(path, yaml).into_diagnostic()?;
    Ok(())
}

fn set_nested_value(root: &mut serde_yml::Value, key: &str, value: serde_yml::Value) -> Result<()> {
    let mut current = root;
    let mut parts = key.split('.').peekable();

    while let Some(part) = parts.next() {
        let map = current
            .as_mapping_mut()
            .ok_or_else(|| miette::miette!("Config value above '{}' is not a mapping", key))?;
        let map_key = serde_yml::Value::String(part.to_string());

        if parts.peek().is_none() {
            map.insert(map_key, value);
            return Ok(());
        }
        if !map.contains_key(&map_key) {
            map.insert(map_key.clone(), serde_yml::Value::Mapping(Default::default()));
        }
        current = map
            .get_mut(&map_key)
            .ok_or_else(|| miette::miette!("Config key '{}' could not be created", key))?;
    }
    Ok(())
}

fn unset_nested_value(root: &mut serde_yml::Value, key: &str) -> bool {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        return false;
    };

    let mut current = root;
    for part in parents {
        let map_key = serde_yml::Value::String(part.to_string());
        match current.as_mapping_mut().and_then(|m| m.get_mut(&map_key)) {
            Some(next) => current = next,
            None => return false,
        }
    }
    let last_key = serde_yml::Value::String(last.to_string());
    current
        .as_mapping_mut()
        .and_then(|map| map.remove(&last_key))
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_unset_nested() {
        let mut root = serde_yml::Value::Mapping(Default::default());
        set_nested_value(&mut root, "hosted.url", "https://x/rest/v1".into()).unwrap();
        set_nested_value(&mut root, "backend", "hosted".into()).unwrap();

        let config: Config = serde_yml::from_value(root.clone()).unwrap();
        assert_eq!(config.hosted.url.as_deref(), Some("https://x/rest/v1"));

        assert!(unset_nested_value(&mut root, "hosted.url"));
        assert!(!unset_nested_value(&mut root, "hosted.url"));
        assert!(!unset_nested_value(&mut root, "nope.url"));
    }

    #[test]
    fn test_numeric_value_stays_numeric() {
        let mut root = serde_yml::Value::Mapping(Default::default());
        let value: serde_yml::Value = serde_yml::from_str("30").unwrap();
        set_nested_value(&mut root, "hosted.timeout_secs", value).unwrap();
        let config: Config = serde_yml::from_value(root).unwrap();
        assert_eq!(config.hosted.timeout_secs, Some(30));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(ensure_valid_key("hosted.url").is_ok());
        assert!(ensure_valid_key("author").is_err());
    }

    #[test]
    fn test_api_key_is_masked() {
        let mut config = Config::default();
        config.hosted.api_key = Some("secret-key-1234".into());
        assert_eq!(
            get_config_value(&config, "hosted.api_key").as_deref(),
            Some("***********1234")
        );
    }
}
