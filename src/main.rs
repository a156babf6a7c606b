//! CLI interface for sketch matching

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use sketch_knn::{
    evaluate, majority_label, render, sort_by_distance, Dataset, KPolicy, KnnSearch, LocalCost,
    Point, SearchConfig, SearchResult, Sketch,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sketch-knn")]
#[command(about = "Find the sketches most similar to a query with dynamic time warping", long_about = None)]
struct Cli {
    /// Number of neighbours to compute
    #[arg(short, long, default_value = "4", global = true)]
    k: usize,

    /// Point-to-point cost used inside the warping distance
    #[arg(long, value_enum, default_value = "mean-absolute", global = true)]
    cost: CostType,

    /// Fail instead of clamping when k exceeds the training set size
    #[arg(long, global = true)]
    strict_k: bool,

    /// Log search progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy)]
enum CostType {
    MeanAbsolute,
    Euclidean,
}

impl From<CostType> for LocalCost {
    fn from(cost: CostType) -> Self {
        match cost {
            CostType::MeanAbsolute => LocalCost::MeanAbsolute,
            CostType::Euclidean => LocalCost::Euclidean,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search the training set for neighbours of one test sketch
    Search {
        /// Path to the reference dataset
        train: String,
        /// Path to the dataset holding the query
        test: String,
        /// Index of the test sketch to use, modulo the test set size (random if omitted)
        #[arg(short, long)]
        index: Option<usize>,
        /// Directory to save the query and its neighbours as PPM images
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Search the training set for neighbours of an ad-hoc sketch
    Query {
        /// Path to the reference dataset
        train: String,
        /// Query points as space-separated pairs (e.g., "0,0 1,1 2,2")
        #[arg(short, long)]
        points: String,
        /// Directory to save the query and its neighbours as PPM images
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Classify every test sketch and report the accuracy
    Evaluate {
        /// Path to the reference dataset
        train: String,
        /// Path to the labelled test dataset
        test: String,
    },
}

fn print_neighbours(result: &mut SearchResult<'_, String>) {
    sort_by_distance(&mut result.neighbours);

    println!("Neighbours (from training set):");
    for (i, n) in result.neighbours.iter().enumerate() {
        println!(
            "{}) class '{}' with distance {:.4}",
            i + 1,
            n.sketch.label(),
            n.distance
        );
    }
    if let Some(label) = majority_label(&result.neighbours) {
        println!("Predicted class: {}", label);
    }
    println!("{}", result.stats);
}

fn save_images(dir: &Path, query: &[Point], result: &SearchResult<'_, String>) -> Result<()> {
    let written = render::save_results(dir, query, &result.neighbours)?;
    println!("Saved {} images to {}", written.len(), dir.display());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = SearchConfig::new(cli.k)
        .with_cost(cli.cost.into())
        .with_k_policy(if cli.strict_k {
            KPolicy::Reject
        } else {
            KPolicy::Clamp
        });
    let search = KnnSearch::new(config);

    match cli.command {
        Commands::Search {
            train,
            test,
            index,
            output,
        } => {
            let train: Dataset<String> = Dataset::load(&train)?;
            let test: Dataset<String> = Dataset::load(&test)?;

            let index = test.query_index(index, &mut rand::thread_rng())?;
            let query = &test[index];
            println!(
                "Class of selected sketch {} is {} (from test set)",
                index,
                query.label()
            );

            let mut result = search.search(&train, query.points())?;
            print_neighbours(&mut result);
            if let Some(dir) = output {
                save_images(&dir, query.points(), &result)?;
            }
        }
        Commands::Query {
            train,
            points,
            output,
        } => {
            let train: Dataset<String> = Dataset::load(&train)?;
            let query = Sketch::parse_points(&points, ())?;

            let mut result = search.search(&train, query.points())?;
            print_neighbours(&mut result);
            if let Some(dir) = output {
                save_images(&dir, query.points(), &result)?;
            }
        }
        Commands::Evaluate { train, test } => {
            let train: Dataset<String> = Dataset::load(&train)?;
            let test: Dataset<String> = Dataset::load(&test)?;

            let evaluation = evaluate(&search, &train, &test)?;
            println!(
                "Correctly classified {} of {} sketches ({:.2} %)",
                evaluation.correct,
                evaluation.total,
                evaluation.accuracy() * 100.0
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli)
}
