//! dynamock-client CLI entry point.

use std::process::ExitCode;

use anstream::{eprintln, println};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dynamock_client::cli::{Cli, Commands, OutputFormat};
use dynamock_client::output::{json, pretty};
use dynamock_client::{create_client, describe_table_status, list_table_names, ConnectionConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynamock_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> dynamock_client::Result<()> {
    let config = ConnectionConfig::from_cli(&cli);
    if !cli.quiet {
        tracing::info!("Target: {}", config.target_display());
    }
    let client = create_client(&config).await;

    match cli.command {
        Commands::Tables => print_table_names(&list_table_names(&client).await?, cli.format)?,
        Commands::Status { table } => {
            let summary = describe_table_status(&client, &table).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", json::format_json(&summary)?),
                OutputFormat::Pretty => println!("{}", pretty::format_table_summary(&summary)),
            }
        }
        Commands::Inspect { table } => {
            let names = list_table_names(&client).await?;
            let summary = describe_table_status(&client, &table).await?;
            match cli.format {
                OutputFormat::Json => println!(
                    "{}",
                    json::format_json(&serde_json::json!({ "tables": names, "table": summary }))?
                ),
                OutputFormat::Pretty => {
                    println!("{}", pretty::format_table_names(&names));
                    println!();
                    println!("{}", pretty::format_table_summary(&summary));
                }
            }
        }
    }

    Ok(())
}

fn print_table_names(names: &[String], format: OutputFormat) -> dynamock_client::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", json::format_json(&names)?),
        OutputFormat::Pretty => println!("{}", pretty::format_table_names(names)),
    }
    Ok(())
}
