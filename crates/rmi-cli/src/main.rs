mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rmi_metrics::Dimension;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rmi")]
#[command(about = "Restaurant market insights from a reviews CSV")]
struct Cli {
    /// Reviews CSV to analyse
    #[arg(long, short, global = true, env = "RMI_DATA_FILE")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List restaurants, cities and cuisines available for selection
    Options {
        /// Only list restaurants in this city
        #[arg(long)]
        city: Option<String>,

        /// Only list restaurants serving this cuisine
        #[arg(long)]
        cuisine: Option<String>,
    },
    /// Show one analytic dimension (or all of them) for a restaurant
    View {
        restaurant: String,

        /// overview, competitors, sentiment, delivery, price or menu
        #[arg(long, short)]
        dimension: Option<Dimension>,
    },
    /// Ask a question about a restaurant, answered from its metrics
    Ask {
        restaurant: String,

        question: String,

        /// Print the grounding context instead of calling the agent
        #[arg(long)]
        context_only: bool,
    },
    /// Print the first cleaned rows of the dataset
    Preview {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = rmi_core::load_app_config_from_env()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        println!("rmi ready; run `rmi --help` for commands");
        return Ok(());
    };
    let Some(file) = cli.file else {
        anyhow::bail!("no dataset given; pass --file <CSV> or set RMI_DATA_FILE");
    };

    let session = commands::Session::open(&config, &file)?;
    match command {
        Commands::Options { city, cuisine } => {
            commands::run_options(&session, city.as_deref(), cuisine.as_deref())
        }
        Commands::View {
            restaurant,
            dimension,
        } => commands::run_view(&session, &restaurant, dimension),
        Commands::Ask {
            restaurant,
            question,
            context_only,
        } => commands::run_ask(&session, &config, &restaurant, &question, context_only).await,
        Commands::Preview { limit } => commands::run_preview(&session, limit),
    }
}
