//! xmerge CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "xmerge")]
#[command(version)]
#[command(about = "Merge configuration templates into workspaces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge an update file or directory into a workspace
    Merge {
        /// Template file or directory merged on every run
        #[arg(short, long)]
        update: PathBuf,

        /// Workspace file or directory to create or update
        #[arg(short, long)]
        workspace: PathBuf,

        /// Template file or directory that seeds a missing workspace
        #[arg(short, long)]
        setup: Option<PathBuf>,

        /// Settings file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Variable definition (NAME=VALUE)
        #[arg(short = 'D', long = "define", value_parser = commands::merge::parse_define)]
        defines: Vec<(String, String)>,

        /// Abort a file merge when an identity query matches several elements
        #[arg(long)]
        fail_on_ambiguous: bool,

        /// Handle templates without the merge namespace as legacy templates
        #[arg(long)]
        legacy: bool,
    },

    /// Write workspace edits back into the update templates
    Inverse {
        /// Workspace file or directory holding the edits
        #[arg(short, long)]
        workspace: PathBuf,

        /// Template file or directory to update
        #[arg(short, long)]
        update: PathBuf,

        /// Settings file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Variable definition (NAME=VALUE)
        #[arg(short = 'D', long = "define", value_parser = commands::merge::parse_define)]
        defines: Vec<(String, String)>,

        /// Also copy properties that only exist in the workspace
        #[arg(long)]
        add_new_properties: bool,
    },

    /// Report XML files that lack the merge namespace
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Settings file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xmerge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            update,
            workspace,
            setup,
            config,
            defines,
            fail_on_ambiguous,
            legacy,
        } => commands::merge::execute(commands::merge::MergeArgs {
            update,
            workspace,
            setup,
            config,
            defines,
            fail_on_ambiguous,
            legacy,
        }),
        Commands::Inverse {
            workspace,
            update,
            config,
            defines,
            add_new_properties,
        } => commands::inverse::execute(commands::inverse::InverseArgs {
            workspace,
            update,
            config,
            defines,
            add_new_properties,
        }),
        Commands::Check { paths, config } => commands::check::execute(&paths, config.as_deref()),
    }
}
