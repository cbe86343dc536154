mod analyze;
mod render;

use clap::{Parser, Subcommand, ValueEnum};
use sovscan_core::{AnalysisConfig, DEFAULT_MAX_RESULTS, DEFAULT_TARGET_BRAND};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sovscan")]
#[command(about = "Brand share-of-voice analysis over web search results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search, fetch and analyze pages for a keyword
    Analyze {
        /// Search keyword (at least 2 characters)
        #[arg(long)]
        keyword: String,
        /// Number of search results to analyze (5-50)
        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: u32,
        /// Brand whose share of voice is highlighted
        #[arg(long, default_value = DEFAULT_TARGET_BRAND)]
        target_brand: String,
        /// Product category, carried through to the report
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the brand roster detection looks for
    Brands {
        /// Show the run roster for this target brand
        #[arg(long)]
        target_brand: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Markdown summary
    Text,
    /// Full report as JSON
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sovscan_core::load_dotenv();
    let log_level = sovscan_core::log_level_from_env();
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            keyword,
            max_results,
            target_brand,
            category,
            format,
        } => {
            let mut config = AnalysisConfig::new(keyword)
                .with_max_results(max_results)
                .with_target_brand(target_brand);
            if let Some(category) = category {
                config = config.with_category(category);
            }
            analyze::run_analyze(&config, format).await
        }
        Commands::Brands { target_brand } => run_brands(target_brand.as_deref()),
    }
}

/// Print the configured roster, or the run roster for `target_brand`.
fn run_brands(target_brand: Option<&str>) -> anyhow::Result<()> {
    let path = sovscan_core::brands_path_from_env();
    let roster = sovscan_core::load_roster(path.as_deref())?;

    let names = match target_brand {
        Some(target) => roster.for_target(target),
        None => roster.names().to_vec(),
    };
    for name in names {
        println!("{name}");
    }
    Ok(())
}
