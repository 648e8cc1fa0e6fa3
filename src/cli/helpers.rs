//! Shared helper functions for CLI commands
//!
//! Configuration loading, repository opening, output format resolution and
//! small string utilities used across command modules.

use chrono::NaiveDate;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::store::{open_repository, RecordRepository};

/// Load layered configuration and apply the global command-line overrides
pub fn load_config(global: &GlobalOpts) -> Result<Config> {
    Ok(Config::load()?.with_overrides(global.backend, global.storage.clone()))
}

/// Open the repository selected by configuration
pub fn open_repo(global: &GlobalOpts) -> Result<Box<dyn RecordRepository>> {
    let config = load_config(global)?;
    Ok(open_repository(&config)?)
}

/// Resolve `Auto` to the given default for this command
pub fn resolve_format(format: OutputFormat, default: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto => default,
        other => other,
    }
}

/// Print a single value as YAML or JSON
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

/// Format a string ID for display, truncating if too long
///
/// IDs longer than 18 characters are truncated to 15 chars with "..." suffix.
pub fn format_short_id_str(id: &str) -> String {
    if id.chars().count() > 18 {
        format!("{}...", id.chars().take(15).collect::<String>())
    } else {
        id.to_string()
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse a `YYYY-MM-DD` date argument
pub fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}'. Use YYYY-MM-DD", s))
}

/// Parse a yes/no style flag argument
pub fn parse_bool(s: &str) -> std::result::Result<bool, String> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Ok(true),
        "false" | "no" | "n" | "0" | "off" => Ok(false),
        _ => Err(format!("Invalid flag '{}'. Use yes or no", s)),
    }
}

/// Mask all but the last four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_short_id_str() {
        assert_eq!(format_short_id_str("DMT-LR3K9F2-A8X3Q"), "DMT-LR3K9F2-A8X3Q");
        assert_eq!(
            format_short_id_str("0f8fad5bd9cb469fa16570867728950e"),
            "0f8fad5bd9cb469..."
        );
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("ééééé", 4), "é...");
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(
            resolve_format(OutputFormat::Auto, OutputFormat::Tsv),
            OutputFormat::Tsv
        );
        assert_eq!(
            resolve_format(OutputFormat::Json, OutputFormat::Tsv),
            OutputFormat::Json
        );
    }

    #[test]
    fn test_parse_date_and_bool() {
        assert_eq!(
            parse_date("2024-05-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert!(parse_date("05/01/2024").is_err());
        assert!(parse_bool("Yes").unwrap());
        assert!(!parse_bool("off").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("secret-key-1234"), "***********1234");
    }
}
