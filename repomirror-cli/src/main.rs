//! repomirror — mirror workspaces and repositories from a main instance to
//! any number of target instances.
//!
//! # Usage
//!
//! ```text
//! repomirror run
//! repomirror once [--dry-run] [--json]
//! repomirror config [--json]
//! repomirror version
//! ```
//!
//! All settings come from environment variables (`MAIN_INSTANCE_URL`,
//! `TARGET_INSTANCES`, ...).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigArgs, once::OnceArgs};

#[derive(Parser, Debug)]
#[command(
    name = "repomirror",
    version,
    about = "Keep target repository instances in sync with a main instance",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sync scheduler in the foreground until SIGINT/SIGTERM.
    Run,

    /// Run exactly one sync cycle and exit.
    Once(OnceArgs),

    /// Print the resolved configuration with passwords redacted.
    Config(ConfigArgs),

    /// Print the release version.
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run => commands::run::run(),
        Commands::Once(args) => args.run(),
        Commands::Config(args) => args.run(),
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
