use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use holocron_cli::{
    default_database_path, failure_exit_status, resolve_sync_config, sync_catalog, Command,
    Config, SyncArgs,
};
use holocron_core::{load_mirrors_config, AppError, DbConfig, SyncReport};
use holocron_db::CatalogRepository;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::parse();

    // Setup logging (stderr to keep stdout clean for reports)
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let database_url = match config.database_url {
        Some(url) => url,
        None => {
            let path = default_database_path();
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            format!("sqlite://{}", path.display())
        }
    };

    match config.command {
        Command::Sync {
            base,
            mirror,
            insecure,
            limit_people,
            config: mirrors_path,
        } => {
            let args = SyncArgs {
                base,
                mirror,
                insecure,
                limit_people,
            };
            match run_sync(&database_url, &args, mirrors_path.as_deref()).await {
                Ok(report) => {
                    print_report(&report);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    error!("{}", e);
                    eprintln!("\n{}\n", e.user_message());
                    Ok(ExitCode::from(failure_exit_status(&e)))
                }
            }
        }
        Command::Stats => {
            let pool = holocron_db::connect(&database_url, &DbConfig::default())
                .await
                .context("Failed to open database")?;
            show_stats(&CatalogRepository::new(pool)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Mirrors {
            config: mirrors_path,
        } => {
            show_mirrors(mirrors_path.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_sync(
    database_url: &str,
    args: &SyncArgs,
    mirrors_path: Option<&Path>,
) -> Result<SyncReport, AppError> {
    let mirrors = load_mirrors_config(mirrors_path)?;
    let sync_config = resolve_sync_config(args, &mirrors)?;

    info!("Connecting to database...");
    let pool = holocron_db::connect(database_url, &DbConfig::default()).await?;

    // Ctrl-C rolls the run back instead of killing it mid-transaction
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling sync");
            trigger.cancel();
        }
    });

    info!(
        "Using catalog base: {} (verify TLS = {})",
        sync_config.base_url, sync_config.verify_tls
    );
    sync_catalog(&pool, &sync_config, &cancel).await
}

fn print_report(report: &SyncReport) {
    println!("\nSync complete in {:.1}s\n", report.duration.as_secs_f64());
    println!("  {:<18} {:>8} {:>8}", "", "created", "updated");
    for (label, stats) in [
        ("Celestial bodies", &report.bodies),
        ("Productions", &report.productions),
        ("Characters", &report.characters),
    ] {
        println!("  {:<18} {:>8} {:>8}", label, stats.created, stats.updated);
    }
    if report.dangling_references > 0 {
        println!(
            "\n  {} dangling reference(s) skipped",
            report.dangling_references
        );
    }
    println!();
}

/// Show database statistics
async fn show_stats(repo: &CatalogRepository) -> anyhow::Result<()> {
    let stats = repo.get_stats().await?;

    println!("\nCatalog Statistics\n");
    println!("  Celestial bodies:      {}", stats.bodies);
    println!("  Productions:           {}", stats.productions);
    println!("  Characters:            {}", stats.characters);
    println!("  Production ↔ body:     {}", stats.production_bodies);
    println!("  Character ↔ production: {}", stats.character_productions);
    println!();

    Ok(())
}

fn show_mirrors(path: Option<&Path>) -> anyhow::Result<()> {
    let mirrors = load_mirrors_config(path)?;
    let enabled = mirrors.enabled_mirrors();

    if enabled.is_empty() {
        println!("\nNo mirrors configured.");
        if let Some(default) = holocron_core::default_config_path() {
            println!("Add [[mirrors]] entries to {}", default.display());
        }
        println!();
        return Ok(());
    }

    println!("\nConfigured mirrors:\n");
    for m in enabled {
        let tls = if m.verify_tls { "" } else { " (TLS verification off)" };
        println!("  {:<12} {}{}", m.name, m.url, tls);
        if let Some(desc) = &m.description {
            println!("  {:<12} {}", "", desc);
        }
    }
    println!();
    Ok(())
}
