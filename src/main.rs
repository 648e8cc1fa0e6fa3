use clap::Parser;
use miette::Result;
use qms::cli::commands::lookup;
use qms::cli::{Cli, Commands};
use qms::entities::LookupKind;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(global.verbose);

    match cli.command {
        Commands::Init(args) => qms::cli::commands::init::run(args, &global),
        Commands::Employee(cmd) => lookup::run(LookupKind::Employee, cmd, &global),
        Commands::Workcenter(cmd) => lookup::run(LookupKind::Workcenter, cmd, &global),
        Commands::Part(cmd) => lookup::run(LookupKind::PartNumber, cmd, &global),
        Commands::Customer(cmd) => lookup::run(LookupKind::Customer, cmd, &global),
        Commands::Inspection(cmd) => lookup::run(LookupKind::InspectionItem, cmd, &global),
        Commands::Dmt(cmd) => qms::cli::commands::dmt::run(cmd, &global),
        Commands::Audit(args) => qms::cli::commands::audit::run(args, &global),
        Commands::Schema(args) => qms::cli::commands::schema::run(args),
        Commands::Config(cmd) => qms::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => qms::cli::commands::completions::run(args),
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("qms=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
