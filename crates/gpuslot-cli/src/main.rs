//! gpuslot CLI
//!
//! Command-line interface for the gpuslot reservation daemon.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

/// gpuslot - reserve time slots on shared GPUs
#[derive(Parser, Debug)]
#[command(name = "gpuslot")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Daemon API base URL
    #[arg(long, default_value = "http://localhost:8000/api", global = true)]
    api: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List GPUs and whether they are free right now
    Gpus,

    /// List reservations
    Reservations {
        /// Only reservations on this GPU
        #[arg(long)]
        gpu: Option<u32>,

        /// Only reservations ending after this instant (ISO-8601 with offset)
        #[arg(long)]
        start: Option<String>,

        /// Only reservations starting before this instant (ISO-8601 with offset)
        #[arg(long)]
        end: Option<String>,
    },

    /// Reserve a GPU for a time window
    Reserve {
        /// GPU id
        gpu: u32,

        /// Who the reservation is for
        #[arg(long)]
        user: String,

        /// What the GPU will be used for
        #[arg(long)]
        purpose: String,

        /// Start of the window (ISO-8601 with offset)
        #[arg(long)]
        start: String,

        /// End of the window, exclusive (ISO-8601 with offset)
        #[arg(long)]
        end: String,
    },

    /// Cancel a reservation
    Cancel {
        /// Reservation id
        id: Uuid,
    },

    /// Show which GPUs are free over a window
    Availability {
        /// Start of the window (ISO-8601 with offset)
        #[arg(long)]
        start: String,

        /// End of the window, exclusive (ISO-8601 with offset)
        #[arg(long)]
        end: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let client = commands::ApiClient::new(&cli.api);

    match cli.command {
        Commands::Gpus => {
            commands::gpus(&client).await?;
        }
        Commands::Reservations { gpu, start, end } => {
            commands::reservations(&client, gpu, start, end).await?;
        }
        Commands::Reserve {
            gpu,
            user,
            purpose,
            start,
            end,
        } => {
            commands::reserve(&client, gpu, user, purpose, start, end).await?;
        }
        Commands::Cancel { id } => {
            commands::cancel(&client, id).await?;
        }
        Commands::Availability { start, end } => {
            commands::availability(&client, start, end).await?;
        }
    }

    Ok(())
}
