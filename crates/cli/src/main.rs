use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{ArtifactLocation, BlobLocation, UserId};
use rand::Rng;
use server::{
    serve, AppState, ArtifactEngineLoader, EngineCell, EngineLoader, Recommendation,
    RecommendationEngine,
};
use sources::CandidateSource;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// reco - Article recommendation engine
#[derive(Parser)]
#[command(name = "reco")]
#[command(about = "Serve and inspect factorization-model article recommendations", long_about = None)]
struct Cli {
    #[command(flatten)]
    artifacts: ArtifactArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Where the artifact bundle lives
#[derive(Args, Debug)]
struct ArtifactArgs {
    /// Local directory holding the artifact bundle
    #[arg(long, env = "ARTIFACTS_DIR", global = true)]
    artifacts_dir: Option<PathBuf>,

    /// Blob storage base URL (used when no directory is given)
    #[arg(long, env = "ARTIFACTS_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Blob container name
    #[arg(long, env = "ARTIFACTS_CONTAINER", default_value = "artifacts", global = true)]
    container: String,

    /// Path prefix inside the container (empty = container root)
    #[arg(long, env = "ARTIFACTS_PREFIX", default_value = "", global = true)]
    prefix: String,

    /// SAS token appended to blob URLs
    #[arg(long, env = "ARTIFACTS_SAS_TOKEN", global = true, hide_env_values = true)]
    sas_token: Option<String>,
}

impl ArtifactArgs {
    fn location(&self) -> Result<ArtifactLocation> {
        if let Some(dir) = &self.artifacts_dir {
            return Ok(ArtifactLocation::Directory(dir.clone()));
        }
        let base_url = self
            .base_url
            .clone()
            .ok_or_else(|| anyhow!("No artifact location: pass --artifacts-dir or --base-url"))?;

        Ok(ArtifactLocation::Blob(BlobLocation {
            base_url,
            container: self.container.clone(),
            prefix: self.prefix.clone(),
            sas_token: self.sas_token.clone().filter(|t| !t.is_empty()),
        }))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Get article recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return (default: bundle top_k)
        #[arg(long)]
        k: Option<usize>,

        /// Show provenance and score for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Show what the bundle knows about a user
    User {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// Show artifact bundle statistics
    Inspect,

    /// Run the HTTP server
    Serve {
        /// Address to bind
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:7071")]
        bind: String,

        /// Upper bound for the requested k
        #[arg(long, env = "MAX_K", default_value = "100")]
        max_k: usize,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,

        /// Items per request
        #[arg(long, default_value = "10")]
        k: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let location = cli.artifacts.location()?;

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            k,
            explain,
        } => {
            let engine = load_engine(location).await?;
            handle_recommend(&engine, user_id, k, explain)?;
        }
        Commands::User { user_id } => {
            let engine = load_engine(location).await?;
            handle_user(&engine, user_id);
        }
        Commands::Inspect => {
            let engine = load_engine(location).await?;
            handle_inspect(&engine);
        }
        Commands::Serve { bind, max_k } => handle_serve(location, bind, max_k).await?,
        Commands::Benchmark {
            requests,
            concurrent,
            k,
        } => handle_benchmark(load_engine(location).await?, requests, concurrent, k).await?,
    }

    Ok(())
}

/// Load the bundle once (this may take a moment)
async fn load_engine(location: ArtifactLocation) -> Result<Arc<RecommendationEngine>> {
    println!("Loading artifact bundle from {}...", location);
    let start = Instant::now();

    let loader = ArtifactEngineLoader::new(location);
    let engine = tokio::task::spawn_blocking(move || loader.load())
        .await
        .context("Loader task panicked")?
        .context("Failed to load artifact bundle")?;

    println!("{} Loaded bundle in {:?}", "✓".green(), start.elapsed());
    Ok(Arc::new(engine))
}

/// Handle the 'recommend' command
fn handle_recommend(
    engine: &RecommendationEngine,
    user_id: UserId,
    k: Option<usize>,
    explain: bool,
) -> Result<()> {
    let k = k.unwrap_or_else(|| engine.top_k());
    let recommendation = engine.recommend(user_id, k)?;

    print_recommendation(&recommendation, explain);
    Ok(())
}

/// Handle the 'user' command
fn handle_user(engine: &RecommendationEngine, user_id: UserId) {
    let bundle = engine.bundle();

    println!("{}", format!("User ID: {}", user_id).bold().blue());
    match bundle.user_index(user_id) {
        Some(idx) => println!("{}Known to model (user index {})", "• ".green(), idx),
        None => println!("{}Unknown to model (served from trending)", "• ".yellow()),
    }

    let mut seen: Vec<_> = bundle
        .seen_items(user_id)
        .map(|s| s.iter().copied().collect())
        .unwrap_or_default();
    seen.sort_unstable();

    println!("{}Seen articles: {}", "• ".cyan(), seen.len());
    for item_id in seen.iter().take(20) {
        println!("  - {}", item_id);
    }
    if seen.len() > 20 {
        println!("  ... and {} more", seen.len() - 20);
    }
}

/// Handle the 'inspect' command
fn handle_inspect(engine: &RecommendationEngine) {
    let counts = engine.bundle().counts();

    println!("{}", "Artifact bundle:".bold().blue());
    println!("{}Model: {}", "• ".green(), engine.bundle().model().name());
    println!("{}Users: {}", "• ".green(), counts.users);
    println!("{}Items: {}", "• ".green(), counts.items);
    println!("{}Item feature columns: {}", "• ".green(), counts.item_features);
    println!("{}Users with history: {}", "• ".cyan(), counts.users_with_history);
    println!("{}Trending length: {}", "• ".cyan(), counts.trending);
    println!("{}Default top_k: {}", "• ".cyan(), counts.top_k);
}

/// Handle the 'serve' command; the engine loads on the first request
async fn handle_serve(location: ArtifactLocation, bind: String, max_k: usize) -> Result<()> {
    info!("Serving recommendations from {} (max_k: {})", location, max_k);

    let cell = EngineCell::new(ArtifactEngineLoader::new(location));
    serve(AppState::new(Arc::new(cell), max_k), &bind).await
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    engine: Arc<RecommendationEngine>,
    requests: usize,
    concurrent: usize,
    k: usize,
) -> Result<()> {
    if requests == 0 {
        return Err(anyhow!("--requests must be at least 1"));
    }

    // Mix of known users (80%) and random unknown ids
    let known: Vec<UserId> = engine.bundle().user_ids().collect();
    let user_ids: Vec<UserId> = {
        let mut rng = rand::rng();
        (0..requests)
            .map(|_| {
                if !known.is_empty() && rng.random_bool(0.8) {
                    known[rng.random_range(0..known.len())]
                } else {
                    -rng.random_range(1..=1_000_000_i64)
                }
            })
            .collect()
    };

    // Use tokio::spawn with a semaphore to bound concurrency
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_start = Instant::now();
    let mut handles = vec![];
    for user in user_ids {
        let engine = engine.clone();
        let permits = permits.clone();
        let handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            tokio::task::spawn_blocking(move || engine.recommend(user, k)).await??;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    // Wait for all tasks to complete and collect timings
    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall_time = wall_start.elapsed();

    timings.sort();
    let percentile = |p: f64| {
        let idx = ((timings.len() as f64 * p) as usize).min(timings.len() - 1);
        timings[idx]
    };
    let total: Duration = timings.iter().sum();
    let avg_latency = total / timings.len() as u32;
    let throughput = requests as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} (concurrency {}, k {})", requests, concurrent, k);
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendation(recommendation: &Recommendation, explain: bool) {
    println!(
        "{} {} ({})",
        "Recommendations for user".bold().blue(),
        recommendation.user_id.to_string().bold().blue(),
        recommendation.strategy.to_string().yellow()
    );
    if recommendation.is_empty() {
        println!("  (nothing to recommend)");
        return;
    }

    for (rank, item) in recommendation.items.iter().enumerate() {
        print!("{}. {}", (rank + 1).to_string().green(), item.item_id);
        if explain {
            match item.source {
                CandidateSource::Model => print!(
                    "  [model score={:.4}{}]",
                    item.base_score,
                    item.metadata
                        .item_index
                        .map(|idx| format!(", index {}", idx))
                        .unwrap_or_default()
                ),
                CandidateSource::Trending => print!(
                    "  [trending{}]",
                    item.metadata
                        .trending_rank
                        .map(|rank| format!(" #{}", rank + 1))
                        .unwrap_or_default()
                ),
            }
        }
        println!();
    }
}
