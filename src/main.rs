mod clean;
mod config;
mod db;
mod download;
mod error;
mod harvest;
mod parser;
mod search;
mod triplets;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use config::Settings;
use search::{ProfileKind, SearchClient};

#[derive(Parser)]
#[command(name = "profile_scraper", about = "Find, download, clean and parse public profile pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for profile URLs and write a results file
    Search {
        /// Search company pages instead of people
        #[arg(long)]
        companies: bool,
        /// People CSV or company list (default from settings)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Results file to write (default from settings)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Max people to read from the CSV
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// First company line to search
        #[arg(long, default_value = "0")]
        start: usize,
        /// Stop before this company line
        #[arg(long)]
        end: Option<usize>,
    },
    /// Download every found profile page
    Download {
        /// Results file (default from settings)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Parallel downloads
        #[arg(short, long)]
        workers: Option<usize>,
        /// Replace pages already on disk
        #[arg(long)]
        overwrite: bool,
    },
    /// Strip saved pages down to their main content
    Clean,
    /// Parse cleaned pages into the database
    Parse {
        /// Results file (default from settings)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Download + clean + parse in one go
    Run {
        /// Results file (default from settings)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Parallel downloads
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Extract numeric company ids from downloaded company pages
    CompanyIds {
        /// Company results file (default from settings)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// CSV to write
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Recover public profile URLs from hand-saved pages
    PublicUrls {
        /// Directory holding the saved pages
        #[arg(long)]
        dir: PathBuf,
        /// File listing one page file name per line
        #[arg(long)]
        list: PathBuf,
        /// Results file to write (default from settings)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show row counts
    Stats,
    /// People overview table
    People {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Search {
            companies,
            input,
            output,
            limit,
            start,
            end,
        } => {
            let client = SearchClient::new(&settings)?;
            let (kind, queries) = if companies {
                let path = input.unwrap_or_else(|| settings.companies_txt.clone());
                (ProfileKind::Company, search::read_companies(&path, start, end)?)
            } else {
                let path = input.unwrap_or_else(|| settings.people_csv.clone());
                (ProfileKind::Person, search::read_people(&path, limit)?)
            };
            println!("Searching {} queries...", queries.len());
            let results = search::search_all(&client, kind, &queries).await;
            let out = output.unwrap_or_else(|| settings.results_file.clone());
            triplets::write_results(&out, &results)?;
            println!(
                "Found {} of {} profiles, written to {}",
                results.iter().flatten().count(),
                results.len(),
                out.display()
            );
            Ok(())
        }
        Commands::Download {
            input,
            workers,
            overwrite,
        } => {
            let results = load_results(&settings, input)?;
            let workers = workers.unwrap_or(settings.workers);
            println!("Downloading with {} workers...", workers);
            let stats = download::download_all(&settings, &results, overwrite, workers).await?;
            println!(
                "Done: {} pages ({} saved, {} skipped, {} failed).",
                stats.total, stats.saved, stats.skipped, stats.failed
            );
            Ok(())
        }
        Commands::Clean => {
            let stats = clean::clean_all(&settings)?;
            println!(
                "Cleaned {} of {} pages ({} failed).",
                stats.cleaned, stats.total, stats.failed
            );
            Ok(())
        }
        Commands::Parse { input } => {
            let results = load_results(&settings, input)?;
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let stats = parser::parse_all(&conn, &settings, &results)?;
            stats.print();
            Ok(())
        }
        Commands::Run { input, workers } => {
            let results = load_results(&settings, input)?;
            let workers = workers.unwrap_or(settings.workers);

            // Phase 1: Download
            let t_download = Instant::now();
            let stats = download::download_all(&settings, &results, false, workers).await?;
            println!(
                "Downloaded {} pages ({} saved, {} skipped, {} failed) in {:.1}s",
                stats.total,
                stats.saved,
                stats.skipped,
                stats.failed,
                t_download.elapsed().as_secs_f64()
            );

            // Phase 2: Clean
            let cleaned = clean::clean_all(&settings)?;
            println!("Cleaned {} of {} pages.", cleaned.cleaned, cleaned.total);

            // Phase 3: Parse
            let t_parse = Instant::now();
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let parsed = parser::parse_all(&conn, &settings, &results)?;
            println!("Parsed in {:.1}s", t_parse.elapsed().as_secs_f64());
            parsed.print();
            Ok(())
        }
        Commands::CompanyIds { input, output } => {
            let results = load_results(&settings, input)?;
            let rows = harvest::company_ids(&settings, &results);
            harvest::write_company_ids(&output, &rows)?;
            println!(
                "Found {} company ids, written to {}",
                rows.iter().filter(|r| r.id.is_some()).count(),
                output.display()
            );
            Ok(())
        }
        Commands::PublicUrls { dir, list, output } => {
            let found = harvest::public_urls(&dir, &list)?;
            let out = output.unwrap_or_else(|| settings.results_file.clone());
            let results: Vec<_> = found.into_iter().map(Some).collect();
            triplets::write_results(&out, &results)?;
            println!("Recovered {} URLs, written to {}", results.len(), out.display());
            Ok(())
        }
        Commands::People { limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, limit)?;
            if rows.is_empty() {
                println!("No people found. Run 'parse' first.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<24} | {:<32} | {:<20} | {:>4} | {:>4} | {:>6}",
                "#", "Name", "Headline", "Locality", "Exp", "Edu", "Skills"
            );
            println!("{}", "-".repeat(110));
            for r in &rows {
                println!(
                    "{:>4} | {:<24} | {:<32} | {:<20} | {:>4} | {:>4} | {:>6}",
                    r.id,
                    truncate(&r.name, 24),
                    truncate(&r.headline, 32),
                    truncate(&r.locality, 20),
                    r.experiences,
                    r.educations,
                    r.skills
                );
            }
            println!("\n{} people", rows.len());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("People:         {}", s.people);
            println!("Experiences:    {}", s.experiences);
            println!("Educations:     {}", s.educations);
            println!("Certifications: {}", s.certifications);
            println!("Skill links:    {}", s.skills);
            println!("Titles:         {}", s.titles);
            println!("Companies:      {}", s.companies);
            println!("Schools:        {}", s.schools);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn load_results(
    settings: &Settings,
    input: Option<PathBuf>,
) -> anyhow::Result<Vec<Option<triplets::Triplet>>> {
    let path = input.unwrap_or_else(|| settings.results_file.clone());
    triplets::read_results(&path).context("Run 'search' first or pass --input")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
