//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};

/// List DynamoDB tables and read a table's status.
#[derive(Debug, Parser)]
#[command(name = "dynamock-client")]
#[command(about = "List DynamoDB tables and read a table's status", long_about = None)]
pub struct Cli {
    /// Endpoint to talk to instead of AWS (e.g. localhost:8000).
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Use plain HTTP for an endpoint given without a scheme.
    #[arg(long)]
    pub no_ssl: bool,

    /// Access key id. Falls back to the SDK credential chain when unset.
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    /// Secret access key.
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    /// AWS region.
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Suppress non-essential output.
    #[arg(long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Human-readable output with colors.
    #[default]
    Pretty,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every table name.
    Tables,
    /// Show the status of one table.
    Status {
        /// Table name.
        table: String,
    },
    /// List every table name, then show the status of one table.
    Inspect {
        /// Table name.
        table: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_command() {
        let cli = Cli::try_parse_from([
            "dynamock-client",
            "--endpoint-url",
            "localhost:8000",
            "--no-ssl",
            "--format",
            "json",
            "status",
            "users",
        ])
        .unwrap();

        assert_eq!(cli.endpoint_url.as_deref(), Some("localhost:8000"));
        assert!(cli.no_ssl);
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Status { ref table } if table == "users"));
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["dynamock-client"]).is_err());
    }
}
