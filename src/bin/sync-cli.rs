use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use photosync_lib::config::{AppConfig, DEFAULT_CONFIG_FILE};
use photosync_lib::sync_engine::{SyncConfiguration, SyncDefinition};
use photosync_lib::SyncService;

#[derive(Parser)]
#[command(name = "sync-cli")]
#[command(about = "Photo directory synchronization CLI", long_about = None)]
struct Cli {
    /// YAML config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Directory holding the stored definitions (overrides the config file)
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append a definition to the stored configuration
    Add {
        #[arg(short, long)]
        source: String,

        #[arg(short, long)]
        destination: String,

        #[arg(short = 'r', long)]
        include_sub_folders: bool,

        /// Delete destination files that are not in the source
        #[arg(short = 'm', long)]
        delete_missing: bool,
    },
    /// Show the stored definitions
    List,
    /// Remove every stored definition
    Clear,
    /// Synchronize every stored definition
    Run {
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(store) = cli.store {
        config.store_dir = store;
    }
    let service = Arc::new(SyncService::from_config(&config));

    match cli.command {
        Command::Add {
            source,
            destination,
            include_sub_folders,
            delete_missing,
        } => {
            let mut configuration = service.load_configuration()?;
            configuration.push(
                SyncDefinition::new(source.clone(), destination.clone())
                    .include_sub_folders(include_sub_folders)
                    .delete_assets_not_in_source(delete_missing),
            );
            let before = configuration.len();
            let kept = service.save_configuration(&configuration)?;
            if kept < before {
                anyhow::bail!("Rejected malformed path: '{source}' => '{destination}'");
            }
            println!("✅ Added '{source}' => '{destination}' ({kept} definition(s) stored)");
        }
        Command::List => {
            let configuration = service.load_configuration()?;
            if configuration.is_empty() {
                println!("No sync definitions stored.");
                return Ok(());
            }
            println!(
                "{:<4} {:<40} {:<40} {:<6} {:<6}",
                "#", "SOURCE", "DESTINATION", "SUBS", "DELETE"
            );
            println!("{}", "-".repeat(100));
            for (i, definition) in configuration.iter().enumerate() {
                println!(
                    "{:<4} {:<40} {:<40} {:<6} {:<6}",
                    i + 1,
                    definition.source_directory.as_deref().unwrap_or_default(),
                    definition.destination_directory.as_deref().unwrap_or_default(),
                    definition.include_sub_folders,
                    definition.delete_assets_not_in_source,
                );
            }
        }
        Command::Clear => {
            service.save_configuration(&SyncConfiguration::new())?;
            println!("🧹 Cleared stored definitions");
        }
        Command::Run { json } => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} action(s) {msg}")?,
            );
            pb.enable_steady_tick(Duration::from_millis(120));

            let configuration = service.load_configuration()?;
            let sink_pb = pb.clone();
            let outcome = Arc::clone(&service)
                .run_in_background(configuration, move |event| {
                    sink_pb.inc(1);
                    sink_pb.set_message(event.to_string());
                })
                .await;

            let results = match outcome {
                Ok(results) => {
                    pb.finish_with_message("✅ Synchronization complete!");
                    results
                }
                Err(e) => {
                    pb.abandon_with_message("❌ Synchronization failed!");
                    eprintln!("❌ Error [{}]: {e}", e.code());
                    // Broken stored configuration vs. a failure while running
                    std::process::exit(if e.is_caller_error() { 2 } else { 1 });
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!();
                println!("📊 Results:");
                for result in &results {
                    println!("   {}", result.message);
                }
                println!("   Total actions: {}", service.last_total_synced());
            }
        }
    }

    Ok(())
}
