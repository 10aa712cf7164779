//! Tablecart - collaborative table ordering client.

use std::path::PathBuf;
use std::sync::Arc;

use cart_config::{init_logging, Config, Paths};
use cart_storage::{CredentialsManager, FileStorage};
use clap::{Parser, Subcommand};
use device_identity::DeviceId;
use table_client::TableClient;
use tracing::info;

/// Tablecart command-line interface.
#[derive(Parser)]
#[command(name = "tablecart")]
#[command(about = "Collaborative table ordering client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Base directory for runtime files (config, credentials, logs). Defaults to ~/.tablecart
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a table using the QR-code pid and token
    Join {
        /// Table public id
        table_pid: String,
        /// Join token from the table code
        token: String,
    },
    /// Resume the previously joined table
    Resume,
    /// Leave the current table and forget its credentials
    Leave,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;
    let config = Config::load(&paths)?;

    let storage = Box::new(FileStorage::new(paths.credentials_file()));
    let credentials = Arc::new(CredentialsManager::new(storage));
    let device_id = DeviceId::load_or_generate(&credentials)?;
    let client = Arc::new(TableClient::new(&config, Arc::clone(&credentials)));

    match cli.command {
        Some(Commands::Join { table_pid, token }) => {
            let creds = client.join(&table_pid, &token, &device_id).await?;
            info!(
                table_number = creds.table_number,
                restaurant = %creds.restaurant_name,
                "Joined table"
            );
            wait_for_shutdown(&client).await;
        }
        Some(Commands::Resume) | None => match client.resume().await? {
            Some(creds) => {
                info!(
                    table_number = creds.table_number,
                    restaurant = %creds.restaurant_name,
                    "Resumed table session"
                );
                wait_for_shutdown(&client).await;
            }
            None => {
                eprintln!("No table session to resume. Use `tablecart join <table_pid> <token>`.");
                std::process::exit(1);
            }
        },
        Some(Commands::Leave) => {
            credentials.clear_session()?;
            info!("Left table; credentials cleared");
        }
    }

    Ok(())
}

async fn wait_for_shutdown(client: &Arc<TableClient>) {
    let _ = tokio::signal::ctrl_c().await;
    client.shutdown().await;
}
