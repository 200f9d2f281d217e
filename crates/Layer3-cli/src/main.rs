//! Tessera CLI - Main entry point

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tessera - space-aware privilege authorization
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the privilege definition built from feature descriptors
    Definition {
        /// Feature descriptor file (JSON array)
        #[arg(short, long)]
        features: PathBuf,
    },
    /// Print privileges of every scope, most permissive first
    Rank {
        #[arg(short, long)]
        features: PathBuf,
    },
    /// Explain the effective privileges of a role
    Explain {
        #[arg(short, long)]
        features: PathBuf,

        /// Role file
        #[arg(short, long)]
        role: PathBuf,

        /// Only the entry that applies to this space
        #[arg(short, long)]
        space: Option<String>,
    },
    /// Ask the privilege-check service about the current principal
    Check {
        /// Actions to check
        #[arg(required = true)]
        actions: Vec<String>,

        /// Space to check in (ignored when spaces are disabled)
        #[arg(short, long, default_value = "default")]
        space: String,

        /// Authorization header to forward
        #[arg(long, env = "TESSERA_AUTHORIZATION")]
        authorization: Option<String>,
    },
    /// Show recorded authorization events
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Only failures
        #[arg(long)]
        failures: bool,

        /// Only this user
        #[arg(short, long)]
        user: Option<String>,

        /// Show totals instead of entries
        #[arg(long)]
        stats: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let output = match args.command {
        Command::Definition { features } => commands::definition(&features, args.json)?,
        Command::Rank { features } => commands::rank(&features, args.json)?,
        Command::Explain {
            features,
            role,
            space,
        } => commands::explain(&features, &role, space.as_deref(), args.json)?,
        Command::Check {
            actions,
            space,
            authorization,
        } => commands::check(&actions, &space, authorization, args.json).await?,
        Command::Audit {
            limit,
            failures,
            user,
            stats,
        } => commands::audit(limit, failures, user, stats, args.json)?,
    };

    println!("{}", output);
    Ok(())
}
