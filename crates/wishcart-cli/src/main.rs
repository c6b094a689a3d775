mod probe;
mod watch;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "wishcart")]
#[command(about = "Watch a wish list and buy the first item that comes back in stock")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in, poll the wish list and check out the first available item
    Watch {
        /// Fill the payment form but do not submit it
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the effective configuration with secrets redacted
    Config,
    /// Check that the browser debugging endpoint is reachable
    Probe {
        /// Browser debugging endpoint
        #[arg(
            long,
            env = "WISHCART_CHROME_ENDPOINT",
            default_value = "http://127.0.0.1:9222"
        )]
        endpoint: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = std::env::var("WISHCART_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Watch { dry_run }) => {
            let config = wishcart_core::load_app_config()?;
            watch::run_watch(&config, dry_run).await?;
        }
        Some(Commands::Config) => {
            let config = wishcart_core::load_app_config()?;
            println!("{config:#?}");
        }
        Some(Commands::Probe { endpoint }) => probe::run_probe(&endpoint).await?,
        None => println!("nothing to do; see `wishcart --help`"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
