use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use storefront::config::{load_config, LogFormat};
use storefront::db::{Connector, MongoConnector};
use storefront::observability::logging;
use storefront::search::{IndexSync, PineconeSync};
use storefront::seed::{ProductSeeder, SeedOptions, Seeder};

#[derive(Parser)]
#[command(name = "storefront-admin")]
#[command(about = "Maintenance CLI for the Storefront API", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "STOREFRONT_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the bundled product catalog
    Seed {
        /// Replace existing products
        #[arg(long)]
        force: bool,
    },
    /// Push the catalog to the Pinecone index
    Sync,
    /// Query a running server's health endpoint
    Health {
        #[arg(short, long, default_value = "http://localhost:8000")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(LogFormat::Pretty);

    match cli.command {
        Commands::Seed { force } => {
            let config = load_config(cli.config.as_deref())?;
            let store = connect(&config).await?;
            let options = SeedOptions {
                force,
                skip_if_exists: !force,
            };
            let outcome = ProductSeeder::new().seed(store.as_ref(), options).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Sync => {
            let config = load_config(cli.config.as_deref())?;
            let store = connect(&config).await?;
            PineconeSync::new(config.search.clone()).sync(store.as_ref()).await?;
            println!("Pinecone sync complete");
        }
        Commands::Health { url } => {
            let res = reqwest::Client::new()
                .get(format!("{}/health", url.trim_end_matches('/')))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn connect(
    config: &storefront::AppConfig,
) -> Result<std::sync::Arc<dyn storefront::db::Store>, Box<dyn std::error::Error>> {
    let uri = config.database.uri.as_deref().ok_or("MONGO_URI is not set")?;
    Ok(MongoConnector::new(config.database.name.clone()).connect(uri).await?)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
