use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use routini_lib::backup::{preview_backup, BackupEngine};
use routini_lib::calendar::CalendarProjection;
use routini_lib::cancellation::CancellationEngine;
use routini_lib::config;
use routini_lib::db::ClinicStore;

#[derive(Parser)]
#[command(name = "routini")]
#[command(about = "Clinic scheduling: backups, cancellations and the calendar feed")]
#[command(version)]
struct Cli {
    /// Database file (defaults to ~/Routini/routini.db or $ROUTINI_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a JSON backup of every table
    Export {
        /// Target directory (defaults to ~/Routini/backups)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Replace the store contents with a backup file
    Import { file: PathBuf },
    /// Show what a backup file contains without importing it
    Preview { file: PathBuf },
    /// Cancel an appointment
    Cancel {
        id: String,

        /// Why the appointment is cancelled
        #[arg(short, long)]
        reason: String,

        /// Also cancel the later appointments of the same professional and patient
        #[arg(long)]
        following: bool,
    },
    /// Print the calendar events as JSON
    Calendar,
    /// List the next appointments
    Upcoming {
        #[arg(short, long, default_value_t = 5)]
        max: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    routini_lib::init_tracing();
    let cli = Cli::parse();
    let db = cli.db;

    match cli.command {
        Commands::Preview { file } => {
            let preview = preview_backup(&file)
                .with_context(|| format!("cannot read backup {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        Commands::Export { dir } => {
            let dir = dir.unwrap_or_else(config::backups_dir);
            let path = BackupEngine::new(open_store(db)?).export_to_dir(&dir).await?;
            println!("Backup written to {}", path.display());
        }
        Commands::Import { file } => {
            let counts = BackupEngine::new(open_store(db)?).import_file(&file).await?;
            println!(
                "Restored {} professionals, {} patients, {} appointments, {} tags",
                counts.professionals, counts.patients, counts.appointments, counts.tags
            );
        }
        Commands::Cancel { id, reason, following } => {
            let n = CancellationEngine::new(open_store(db)?)
                .cancel_from(&id, &reason, following)
                .await?;
            println!("{n} appointment(s) cancelled");
        }
        Commands::Calendar => {
            let events = CalendarProjection::new(open_store(db)?).events().await?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        Commands::Upcoming { max } => {
            let upcoming = CalendarProjection::new(open_store(db)?)
                .upcoming(chrono::Utc::now(), max)
                .await?;
            if upcoming.is_empty() {
                println!("No upcoming appointments");
            }
            for appt in upcoming {
                println!(
                    "{}  {}  {}",
                    appt.start.format("%Y-%m-%d %H:%M"),
                    appt.kind,
                    appt.id
                );
            }
        }
    }

    Ok(())
}

fn open_store(db: Option<PathBuf>) -> Result<ClinicStore> {
    let path = db.unwrap_or_else(config::database_path);
    ClinicStore::open(&path).with_context(|| format!("cannot open database {}", path.display()))
}
