use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod driver;
mod manifest;

use driver::{BuildArgs, CleanArgs};

#[derive(Parser, Debug)]
#[command(name = "pyrrhic", about = "Incremental build engine driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a manifest's rules, diff against the previous run and apply
    /// the resulting delete/write plan.
    Build {
        /// Path to the TOML manifest naming this build's rules.
        #[arg(long, default_value = "pyrrhic.toml")]
        manifest: PathBuf,
        /// Path the DAG from the previous run is read from and the new one
        /// is written to.
        #[arg(long, default_value = "lastrun.pyrrhic.txt")]
        lastrun: PathBuf,
        /// Delete stale artifacts without prompting.
        #[arg(long)]
        yes: bool,
    },
    /// Remove every artifact recorded in the last persisted run.
    Clean {
        /// Path to the persisted DAG whose artifacts should be removed.
        #[arg(long, default_value = "lastrun.pyrrhic.txt")]
        lastrun: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            manifest,
            lastrun,
            yes,
        } => driver::build(BuildArgs {
            manifest,
            lastrun,
            yes,
        }),
        Command::Clean { lastrun } => driver::clean(CleanArgs { lastrun }),
    }
}
