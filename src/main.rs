use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};

mod bucket;
mod catalog;
mod config;
mod dates;
mod error;
mod feed;
mod logging;
mod models;
mod quarter;
mod report;
mod roster;

use config::BoardConfig;
use feed::{HttpFeed, InstructorDirectory, PageTracker};
use models::ListingMode;
use report::{DefaultCard, ListingFormat};
use roster::RosterClient;

#[derive(Parser)]
#[command(name = "courseboard")]
#[command(about = "Course discovery listings and team roster tools", long_about = None)]
struct Cli {
    /// Path to courseboard.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sort courses into listing buckets and render them
    List {
        /// JSON or CSV export of course records
        #[arg(long)]
        courses: PathBuf,
        #[arg(long, value_enum)]
        mode: Option<ListingMode>,
        /// Reference time (RFC 3339 or YYYY-MM-DD); defaults to now
        #[arg(long)]
        now: Option<String>,
        #[arg(long, value_enum, default_value_t = ListingFormat::Markdown)]
        format: ListingFormat,
        /// Fetch instructor names from the course info feed
        #[arg(long)]
        with_instructors: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List instructor names published by the course info feed
    Instructors {
        #[arg(long, default_value_t = 1)]
        start_page: u32,
    },
    /// Team membership CSV management
    Roster {
        #[command(subcommand)]
        action: RosterAction,
    },
}

#[derive(Subcommand)]
enum RosterAction {
    /// Check a roster CSV without uploading it
    Validate { csv: PathBuf },
    /// Upload a roster CSV to the team membership endpoint
    Upload { csv: PathBuf },
    /// Download the current roster CSV
    Download {
        #[arg(long, default_value = "team_memberships.csv")]
        out: PathBuf,
    },
}

async fn collect_instructors(
    config: &BoardConfig,
    start_page: u32,
) -> anyhow::Result<InstructorDirectory> {
    let endpoint = config.endpoint(&config.feed_path)?;
    let feed = HttpFeed::new(endpoint, config.request_timeout())?;
    let mut tracker = PageTracker::new();
    let mut directory = InstructorDirectory::default();

    let pages = feed::crawl_instructors(&feed, &mut tracker, &mut directory, start_page).await;
    tracing::info!(
        pages,
        tracked = tracker.len(),
        courses = directory.len(),
        "instructor crawl finished"
    );
    Ok(directory)
}

fn roster_client(config: &BoardConfig) -> anyhow::Result<RosterClient> {
    let path = config
        .team_membership_path
        .as_deref()
        .context("team_membership_path must be set in courseboard.toml")?;
    let url = config.endpoint(path)?;
    Ok(RosterClient::new(url, config.request_timeout())?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();
    let config = BoardConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::List {
            courses,
            mode,
            now,
            format,
            with_instructors,
            out,
        } => {
            let now = match now {
                Some(raw) => dates::parse_timestamp(&raw)
                    .with_context(|| format!("--now must be RFC 3339 or YYYY-MM-DD, got {raw}"))?,
                None => Utc::now(),
            };
            let mode = mode.unwrap_or(config.listing_mode);
            let records = catalog::load_courses(&courses)?;

            let directory = if with_instructors {
                collect_instructors(&config, 1).await?
            } else {
                InstructorDirectory::default()
            };
            let renderer = DefaultCard::new(format).with_instructors(&directory);

            let listing = match mode {
                ListingMode::Status => {
                    let buckets = bucket::classify_status(&records, now);
                    report::build_status_listing(&buckets, &renderer, format, now)
                }
                ListingMode::Quarter => {
                    let sections = quarter::classify_quarters(&records, now);
                    report::build_quarter_listing(&sections, &renderer, format, now)
                }
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, listing)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Listing written to {}.", path.display());
                }
                None => print!("{listing}"),
            }
        }
        Commands::Instructors { start_page } => {
            let directory = collect_instructors(&config, start_page).await?;

            if directory.is_empty() {
                println!("No instructors found in the course feed.");
                return Ok(());
            }

            for (course, names) in directory.iter() {
                println!("- {course}: {}", names.join(", "));
            }
        }
        Commands::Roster { action } => match action {
            RosterAction::Validate { csv } => {
                let file = std::fs::File::open(&csv)
                    .with_context(|| format!("failed to open {}", csv.display()))?;
                let summary = roster::validate_roster(file)?;
                println!(
                    "{} is valid: {} members, columns {}.",
                    csv.display(),
                    summary.rows,
                    summary.columns.join(", ")
                );
            }
            RosterAction::Upload { csv } => {
                let message = roster_client(&config)?.upload(&csv).await?;
                println!("{message}");
            }
            RosterAction::Download { out } => {
                let written = roster_client(&config)?.download(&out).await?;
                println!("Saved {written} bytes to {}.", out.display());
            }
        },
    }

    Ok(())
}
