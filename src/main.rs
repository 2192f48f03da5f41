use clap::Parser;
use issuedump::{
    cli::{
        commands::{self, SyncOptions},
        Cli, Commands, SyncArgs,
    },
    config::Settings,
    Result,
};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file if it exists
    // Silently ignore if file doesn't exist
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,issuedump=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e.log_safe());
            eprintln!("Error: {}", e.log_safe());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::from_env()?;

    match cli.into_command() {
        Commands::Sync(SyncArgs {
            repos,
            page,
            stream,
            jobs,
            dump,
        }) => {
            if let Some(jobs) = jobs {
                settings.sync.jobs = jobs;
            }
            settings.validate()?;

            let options = SyncOptions {
                repos,
                start_page: page,
                streams: stream.streams(),
                jobs: settings.sync.jobs,
                dump,
            };
            commands::sync(&settings, options, shutdown_token()).await?;
        }
        Commands::Dump { repos, output } => {
            settings.validate()?;
            commands::dump(&settings, &repos, output).await?;
        }
        Commands::Status { repo } => {
            settings.validate()?;
            commands::status(&settings, &repo).await?;
        }
        Commands::Limits => {
            settings.validate()?;
            commands::limits(&settings).await?;
        }
        Commands::Migrate => {
            settings.validate()?;
            commands::migrate(&settings).await?;
        }
    }

    Ok(())
}

/// Token cancelled on Ctrl+C; the sync stops at the next page boundary
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current page");
            cancel.cancel();
        }
    });

    token
}
