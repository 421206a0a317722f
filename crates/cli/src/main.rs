//! Heartgate CLI - Owner tooling for photos and content.
//!
//! # Usage
//!
//! ```bash
//! # List photos in display order
//! hg-cli photos list
//!
//! # Upload photos with a shared caption
//! hg-cli photos add -c "Paris" one.jpg two.png
//!
//! # Remove a photo and close the gap in positions
//! hg-cli photos remove 3f2a...
//!
//! # Rewrite every photo position as 0..N-1
//! hg-cli photos resequence
//!
//! # Delete all content and restore the defaults
//! hg-cli reset --yes
//!
//! # Shrink and re-encode an image the way uploads are stored
//! hg-cli resize big.png small.jpg
//!
//! # Try a date against the configured gate
//! hg-cli check-date 21/03/2024
//! ```
//!
//! Configuration is read from the same environment variables as the site
//! server, with a `.env` file in the working directory loaded first.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hg-cli")]
#[command(author, version, about = "Heartgate CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage gallery photos
    Photos {
        #[command(subcommand)]
        action: PhotoAction,
    },
    /// Delete every photo and reason and restore the default text
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
    /// Resize and re-encode an image locally
    Resize {
        /// Source image
        input: PathBuf,

        /// Destination JPEG
        output: PathBuf,

        /// Longest side in pixels (default: `HEARTGATE_PHOTO_MAX_DIMENSION`)
        #[arg(short, long)]
        max_dimension: Option<u32>,

        /// JPEG quality 1-100 (default: `HEARTGATE_PHOTO_QUALITY`)
        #[arg(short, long)]
        quality: Option<u8>,
    },
    /// Check a date against the configured gate
    CheckDate {
        /// Date as typed on the gate, e.g. 21/03/2024
        date: String,
    },
}

#[derive(Subcommand)]
enum PhotoAction {
    /// List photos in display order
    List,
    /// Upload one or more image files
    Add {
        /// Caption applied to every file
        #[arg(short, long, default_value = "")]
        caption: String,

        /// Image files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove a photo by id
    Remove {
        /// Photo id
        id: String,
    },
    /// Rewrite positions as 0..N-1 in display order
    Resequence,
}

#[tokio::main]
async fn main() {
    // Load .env before tracing so RUST_LOG set there applies
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Photos { action } => match action {
            PhotoAction::List => commands::photos::list().await?,
            PhotoAction::Add { caption, files } => commands::photos::add(&files, &caption).await?,
            PhotoAction::Remove { id } => commands::photos::remove(&id).await?,
            PhotoAction::Resequence => commands::photos::resequence().await?,
        },
        Commands::Reset { yes } => commands::site::reset(yes).await?,
        Commands::Resize {
            input,
            output,
            max_dimension,
            quality,
        } => commands::resize::run(&input, &output, max_dimension, quality)?,
        Commands::CheckDate { date } => commands::site::check_date(&date).await?,
    }
    Ok(())
}
