//! packrender CLI - render Kubernetes packs from git, HTTP or local sources

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

use commands::render::RenderArgs;

#[derive(Parser)]
#[command(name = "packrender")]
#[command(version)]
#[command(about = "Fetch, render and decode Kubernetes packs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a pack, render it and print the resulting objects
    Render(RenderArgs),

    /// Manage the rendered-manifest cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,

        /// SQLite cache file
        #[arg(long, global = true, env = "PACKRENDER_CACHE_PATH")]
        cache_path: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show cache statistics
    Stats,

    /// Remove every cached render
    Clear,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Render(args) => commands::render::run(args).await,
        Commands::Cache {
            command,
            cache_path,
        } => match command {
            CacheCommands::Stats => commands::cache::stats(cache_path.as_deref()),
            CacheCommands::Clear => commands::cache::clear(cache_path.as_deref()),
        },
    };

    match result {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}
