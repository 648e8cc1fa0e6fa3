//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    audit::AuditArgs, completions::CompletionsArgs, config::ConfigCommands, dmt::DmtCommands,
    init::InitArgs, lookup::LookupCommands, schema::SchemaArgs,
};
use crate::core::BackendKind;

#[derive(Parser)]
#[command(name = "qms")]
#[command(author, version, about = "DMT quality record tracker")]
#[command(long_about = "Track DMT (defect / corrective action) records against employees, workcenters, part numbers, customers and inspection items, stored locally or on a hosted REST service.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose (debug) logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Storage backend (overrides config and QMS_BACKEND)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendKind>,

    /// Slot file for the embedded backend (overrides config and QMS_STORAGE_PATH)
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the storage schema and report the active backend
    Init(InitArgs),

    /// Employee management
    #[command(subcommand)]
    Employee(LookupCommands),

    /// Workcenter management
    #[command(subcommand)]
    Workcenter(LookupCommands),

    /// Part number management
    #[command(subcommand)]
    Part(LookupCommands),

    /// Customer management
    #[command(subcommand)]
    Customer(LookupCommands),

    /// Inspection item management
    #[command(subcommand)]
    Inspection(LookupCommands),

    /// DMT (defect / corrective action) record management
    #[command(subcommand)]
    Dmt(DmtCommands),

    /// Show recent changes from the audit log
    Audit(AuditArgs),

    /// Print the table definitions
    Schema(SchemaArgs),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
