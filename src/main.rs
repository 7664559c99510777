mod api;
mod feed;
mod server;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use reach_sim::config::ReferenceConfig;
use reach_sim::estimator::ReachEstimator;
use reach_sim::{
    format_float, format_number, format_percent, DemographicSelection, EstimateRequest,
};

#[derive(Parser)]
#[command(name = "reach-sim", about = "Audience reach & overlap estimator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Estimate reach and deduplicated reach for a persona selection
    Estimate(EstimateArgs),
    /// List the segments in the audience reference feed
    Segments(SegmentsArgs),
    /// Run the dashboard API server
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
struct EstimateArgs {
    /// Persona to include; repeat for multiple
    #[arg(long = "persona")]
    personas: Vec<String>,
    /// Region to aggregate over; repeat for multiple (default: all)
    #[arg(long = "region")]
    regions: Vec<String>,
    /// Race filter value; repeat for multiple
    #[arg(long = "race")]
    races: Vec<String>,
    /// Generation filter value; repeat for multiple
    #[arg(long = "generation")]
    generations: Vec<String>,
    /// Income tier filter value; repeat for multiple
    #[arg(long = "income")]
    incomes: Vec<String>,
    /// Feed source: CSV file path or http(s) URL
    #[arg(long)]
    feed: Option<String>,
    /// Reference tables TOML path
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    details: bool,
}

#[derive(Args, Debug, Clone)]
struct SegmentsArgs {
    #[arg(long)]
    feed: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
    #[arg(long, default_value = "webapp/dist")]
    web_root: String,
    /// Directory holding the audience-group store file
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    #[arg(long)]
    feed: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Estimate(args) => run_estimate(args).await,
        Command::Segments(args) => run_segments(args).await,
        Command::Serve(args) => server::serve(args).await,
    }
}

async fn run_estimate(args: EstimateArgs) -> Result<(), String> {
    if args.personas.is_empty() {
        return Err("missing personas: pass --persona at least once".to_string());
    }

    let (config, _) = ReferenceConfig::load(args.config.clone())?;
    let estimator = ReachEstimator::new(&config);
    let catalog = feed::AudienceFeed::from_env(args.feed.clone())?
        .catalog()
        .await?;

    let request = EstimateRequest {
        personas: args.personas.clone(),
        regions: args.regions.clone(),
        demographics: DemographicSelection {
            race: args.races.clone(),
            generation: args.generations.clone(),
            income: args.incomes.clone(),
        },
    };

    for name in &args.personas {
        if catalog.get(name).is_none() {
            eprintln!("Warning: unknown persona: {}", name);
        }
    }

    let result = estimator.estimate(&catalog, &request);

    println!(
        "Unique combined audience: {}",
        format_number(result.unique_combined_audience)
    );
    println!(
        "Total audience: {} (estimated overlap removed: {})",
        format_number(result.total_adjusted_audience),
        format_number(result.estimated_overlap_count)
    );
    println!(
        "Average overlap factor: {}",
        format_percent(result.pairwise_overlap_factor)
    );
    println!(
        "Demographic multiplier: {}",
        format_float(result.demographic_multiplier, 3)
    );
    println!(
        "Segments: {} matched (of {} selected)",
        result.per_segment.len(),
        args.personas.len()
    );

    if args.details {
        println!("\nPer-segment breakdown:");
        for segment in &result.per_segment {
            let label = if segment.is_demographic {
                "Demographic"
            } else {
                segment.category.as_deref().unwrap_or("Uncategorized")
            };
            println!(
                "  {} [{}]: raw {} -> adjusted {}",
                segment.name,
                label,
                format_number(segment.raw_audience),
                format_number(segment.adjusted_audience)
            );
        }
    }

    Ok(())
}

async fn run_segments(args: SegmentsArgs) -> Result<(), String> {
    let (config, _) = ReferenceConfig::load(args.config.clone())?;
    let estimator = ReachEstimator::new(&config);
    let catalog = feed::AudienceFeed::from_env(args.feed.clone())?
        .catalog()
        .await?;

    println!(
        "{} segments across {} regions",
        catalog.len(),
        catalog.regions().len()
    );
    for row in api::catalog_rows(&catalog, estimator.scorer()) {
        let label = if row.is_demographic {
            "Demographic"
        } else {
            row.category.as_deref().unwrap_or("Uncategorized")
        };
        println!(
            "  {} [{}]: {}",
            row.name,
            label,
            format_number(row.total_audience)
        );
    }

    Ok(())
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
