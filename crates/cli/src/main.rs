use anyhow::{Context, Result};
use catalog::{CanonicalMovieId, Catalog};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::Rng;
use rayon::prelude::*;
use server::{EngineConfig, RatingUpdate, RecommendationOrchestrator, RecommendationSet};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::warn;

/// ReelRecs - Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Paginated collaborative, content-based and genre recommendations", long_about = None)]
struct Cli {
    /// Directory holding users.dat, movies.dat and ratings.dat (overrides RECS_DATA_DIR)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Skip the catalog and serve the deterministic offline sample
    #[arg(long)]
    offline: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get one page of recommendations for a user
    Recommend {
        #[arg(long)]
        user_id: String,

        /// Zero-based page number
        #[arg(long, default_value = "0")]
        page: usize,

        /// Ids per section (defaults to RECS_DEFAULT_LIMIT)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Load more ids for a single section
    More {
        #[arg(long)]
        user_id: String,

        /// collaborative, contentBased or a genre name
        #[arg(long)]
        section: String,

        #[arg(long, default_value = "1")]
        page: usize,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Write recommendations for every user to a JSON file
    GenerateFile {
        /// Output path (defaults to RECS_OUTPUT_PATH)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Submit a rating
    Rate {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        movie_id: String,

        /// 1 to 5
        #[arg(long)]
        value: u8,
    },

    /// Show a user's rating history summary
    User {
        #[arg(long)]
        user_id: String,
    },

    /// Time page-0 requests for random users
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env().context("Failed to load configuration")?;
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir.clone();
    }

    let catalog = open_catalog(&config, cli.offline, &mut io::stderr())?;
    let mut orchestrator = RecommendationOrchestrator::with_config(catalog, config);

    match cli.command {
        Commands::Recommend {
            user_id,
            page,
            limit,
        } => {
            let limit = limit.unwrap_or(orchestrator.config().default_limit);
            handle_recommend(&orchestrator, &user_id, page, limit, cli.json)?
        }
        Commands::More {
            user_id,
            section,
            page,
            limit,
        } => {
            let limit = limit.unwrap_or(orchestrator.config().default_limit);
            handle_more(&orchestrator, &user_id, &section, page, limit, cli.json)?
        }
        Commands::GenerateFile { output } => {
            let output = output.unwrap_or_else(|| orchestrator.config().output_path.clone());
            handle_generate_file(&orchestrator, output)?
        }
        Commands::Rate {
            user_id,
            movie_id,
            value,
        } => handle_rate(
            &orchestrator,
            RatingUpdate {
                user_id,
                movie_id,
                value,
            },
        )?,
        Commands::User { user_id } => handle_user(&orchestrator, &user_id, cli.json)?,
        Commands::Benchmark { requests } => handle_benchmark(&orchestrator, requests)?,
    }

    orchestrator.shutdown();
    Ok(())
}

/// Load the catalog, or fall back to offline mode when there is none.
///
/// Progress goes to `status` so stdout carries only command output.
fn open_catalog(config: &EngineConfig, offline: bool, status: &mut impl Write) -> Result<Catalog> {
    if offline {
        writeln!(status, "{} Offline mode requested", "•".yellow())?;
        return Ok(Catalog::offline());
    }
    let Some(data_dir) = &config.data_dir else {
        writeln!(status, "{} No data directory configured, serving offline", "•".yellow())?;
        return Ok(Catalog::offline());
    };

    writeln!(status, "Loading catalog from {}...", data_dir.display())?;
    let start = Instant::now();
    match Catalog::open(data_dir) {
        Ok(catalog) => {
            writeln!(status, "{} Loaded catalog in {:?}", "✓".green(), start.elapsed())?;
            Ok(catalog)
        }
        Err(e) => {
            warn!("Failed to load catalog from {}: {}", data_dir.display(), e);
            writeln!(status, "{} Catalog unavailable, serving offline", "✗".red())?;
            Ok(Catalog::offline())
        }
    }
}

/// Handle the 'recommend' command
fn handle_recommend(
    orchestrator: &RecommendationOrchestrator,
    user_id: &str,
    page: usize,
    limit: usize,
    json: bool,
) -> Result<()> {
    let set = orchestrator.generate(user_id, page, limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&set)?);
        return Ok(());
    }
    print_recommendations(orchestrator.catalog(), user_id, page, &set);
    Ok(())
}

/// Handle the 'more' command
fn handle_more(
    orchestrator: &RecommendationOrchestrator,
    user_id: &str,
    section: &str,
    page: usize,
    limit: usize,
    json: bool,
) -> Result<()> {
    let ids = orchestrator
        .generate_more(user_id, section, page, limit)
        .with_context(|| format!("Failed to load more for section '{}'", section))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ids)?);
        return Ok(());
    }
    println!(
        "{}",
        format!("{} for user {} (page {}):", section, user_id, page).bold().blue()
    );
    print_section(orchestrator.catalog(), &ids);
    Ok(())
}

/// Handle the 'generate-file' command
fn handle_generate_file(orchestrator: &RecommendationOrchestrator, output: PathBuf) -> Result<()> {
    let start = Instant::now();
    let users = orchestrator
        .write_recommendations_file(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "{} Wrote recommendations for {} users to {} in {:?}",
        "✓".green(),
        users,
        output.display(),
        start.elapsed()
    );
    Ok(())
}

/// Handle the 'rate' command
fn handle_rate(orchestrator: &RecommendationOrchestrator, update: RatingUpdate) -> Result<()> {
    orchestrator
        .record_rating(&update)
        .context("Rating rejected")?;
    println!(
        "{} Recorded rating {} for movie {} by user {}",
        "✓".green(),
        update.value,
        update.movie_id,
        update.user_id
    );
    Ok(())
}

/// Handle the 'user' command
fn handle_user(orchestrator: &RecommendationOrchestrator, user_id: &str, json: bool) -> Result<()> {
    let profile = orchestrator
        .user_profile(user_id)
        .with_context(|| format!("Failed to read history for user {}", user_id))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!("{}", format!("User ID: {}", profile.user_id).bold().blue());
    println!("{}Number of ratings: {}", "• ".cyan(), profile.rated_count);
    println!("{}Liked (4+): {}", "• ".cyan(), profile.liked_count);
    println!("{}Average rating: {:.2}", "• ".cyan(), profile.avg_rating);
    let genres = profile
        .preferred_genres
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    println!("{}Preferred genres: {}", "• ".green(), genres);
    Ok(())
}

/// Handle the 'benchmark' command
fn handle_benchmark(orchestrator: &RecommendationOrchestrator, requests: usize) -> Result<()> {
    let user_ids = if orchestrator.is_offline() {
        sources::OfflineCatalog::sample_users()
    } else {
        orchestrator.catalog().user_ids()?
    };
    anyhow::ensure!(!user_ids.is_empty(), "No users to benchmark");

    let mut rng = rand::rng();
    let picks: Vec<&String> = (0..requests)
        .map(|_| &user_ids[rng.random_range(0..user_ids.len())])
        .collect();

    let start = Instant::now();
    let mut timings: Vec<Duration> = picks
        .par_iter()
        .map(|user_id| {
            let request = Instant::now();
            orchestrator.generate(user_id, 0, orchestrator.config().default_limit);
            request.elapsed()
        })
        .collect();
    let total_time = start.elapsed();

    if timings.is_empty() {
        println!("No requests made");
        return Ok(());
    }
    timings.sort();
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f32 / total_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);
    Ok(())
}

fn print_recommendations(catalog: &Catalog, user_id: &str, page: usize, set: &RecommendationSet) {
    println!(
        "{}",
        format!("Recommendations for user {} (page {}):", user_id, page).bold().blue()
    );
    println!("{}", "Collaborative".bold());
    print_section(catalog, &set.collaborative);
    println!("{}", "Content based".bold());
    print_section(catalog, &set.content_based);
    for (genre, ids) in set.genres.iter() {
        println!("{}", genre.to_string().bold());
        print_section(catalog, ids);
    }
}

/// Rank, id and title when the catalog knows it
fn print_section(catalog: &Catalog, ids: &[CanonicalMovieId]) {
    if ids.is_empty() {
        println!("  (none)");
    }
    for (rank, id) in ids.iter().enumerate() {
        let title = catalog
            .movie(id)
            .ok()
            .flatten()
            .map(|movie| movie.title)
            .unwrap_or_default();
        println!("  {}. {} {}", (rank + 1).to_string().green(), id, title);
    }
}
