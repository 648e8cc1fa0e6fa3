//! `qms init` command - create the storage schema

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::load_config;
use crate::cli::GlobalOpts;
use crate::core::{BackendKind, Config};
use crate::store::open_repository;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Also write the effective backend settings to .qms/config.yaml
    #[arg(long)]
    pub write_config: bool,

    /// Overwrite an existing .qms/config.yaml
    #[arg(long, requires = "write_config")]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let mut repo = open_repository(&config)?;
    repo.ensure_schema()?;

    if !global.quiet {
        println!(
            "{} Initialized {} storage",
            style("✓").green(),
            style(repo.backend_name()).cyan()
        );
        match config.backend() {
            BackendKind::Embedded => println!(
                "   Slot file: {}",
                style(config.storage_path().display()).dim()
            ),
            BackendKind::Hosted => println!(
                "   Service: {}",
                style(config.hosted.url.as_deref().unwrap_or("-")).dim()
            ),
        }
    }

    if args.write_config {
        write_local_config(&config, args.force, global.quiet)?;
    }

    Ok(())
}

fn write_local_config(config: &Config, force: bool, quiet: bool) -> Result<()> {
    let path = Config::local_config_path();
    if path.exists() && !force {
        return Err(miette::miette!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).into_diagnostic()?;
    }

    // Never write the api key into a file that may be committed
    let mut to_write = config.clone();
    to_write.hosted.api_key = None;
    let yaml = serde_yml::to_string(&to_write).into_diagnostic()?;
    std::fs::write(&path, yaml).into_diagnostic()?;

    if !quiet {
        println!(
            "{} Wrote {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }
    Ok(())
}
