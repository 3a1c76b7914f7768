use clap::{Parser, Subcommand};
use swapflow::adapters::PostgresStore;
use swapflow::config::AppConfig;
use swapflow::error::{Result, SwapflowError};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swapflow", about = "DEX swap-order execution engine")]
struct Cli {
    /// Configuration directory
    #[arg(long, default_value = "config", env = "SWAPFLOW_CONFIG_DIR")]
    config_dir: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server and order worker pool (default)
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config_dir)?;
    init_logging(&config);

    if let Err(errors) = config.validate() {
        for problem in &errors {
            error!("Configuration error: {}", problem);
        }
        return Err(SwapflowError::Validation(errors.join("; ")));
    }

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            swapflow::server::run(config).await
        }
        Commands::Migrate => {
            let store =
                PostgresStore::new(&config.database.url, config.database.max_connections).await?;
            store.migrate().await?;
            Ok(())
        }
    }
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},swapflow=debug,sqlx=warn", config.logging.level))
    });

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
