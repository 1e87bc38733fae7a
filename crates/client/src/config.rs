//! SDK connection setup (Imperative Shell).

use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::Client;

use crate::cli::Cli;

const DEFAULT_REGION: &str = "us-east-1";

/// An endpoint that replaces the regional AWS endpoint, e.g. a local mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointOverride {
    pub url: String,
    /// Scheme to use when `url` has none.
    pub use_ssl: bool,
}

impl EndpointOverride {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            use_ssl: true,
        }
    }

    /// The URL handed to the SDK.
    ///
    /// A URL that already names its scheme is used verbatim.
    pub fn resolved_url(&self) -> String {
        if self.url.contains("://") {
            self.url.clone()
        } else if self.use_ssl {
            format!("https://{}", self.url)
        } else {
            format!("http://{}", self.url)
        }
    }
}

/// Everything needed to build a DynamoDB client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: String,
    pub endpoint: Option<EndpointOverride>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
        }
    }
}

impl ConnectionConfig {
    /// Builds the configuration from parsed flags (which already carry their
    /// environment fallbacks).
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            access_key_id: cli.access_key_id.clone(),
            secret_access_key: cli.secret_access_key.clone(),
            region: cli.region.clone(),
            endpoint: cli.endpoint_url.as_ref().map(|url| EndpointOverride {
                url: url.clone(),
                use_ssl: !cli.no_ssl,
            }),
        }
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("Local DynamoDB ({})", endpoint.resolved_url()),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }

    fn static_credentials(&self) -> Option<Credentials> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "dynamock-client",
            )),
            _ => None,
        }
    }
}

/// Creates a DynamoDB client with the given configuration.
pub async fn create_client(config: &ConnectionConfig) -> Client {
    let mut sdk_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));

    if let Some(credentials) = config.static_credentials() {
        sdk_config_loader = sdk_config_loader.credentials_provider(credentials);
    }

    if let Some(endpoint) = &config.endpoint {
        let url = endpoint.resolved_url();
        tracing::debug!(endpoint = %url, "using endpoint override");
        sdk_config_loader = sdk_config_loader.endpoint_url(url);
    }

    let sdk_config = sdk_config_loader.load().await;
    Client::new(&sdk_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_resolved_url_adds_scheme() {
        let mut endpoint = EndpointOverride::new("localhost:3000");
        assert_eq!(endpoint.resolved_url(), "https://localhost:3000");

        endpoint.use_ssl = false;
        assert_eq!(endpoint.resolved_url(), "http://localhost:3000");
    }

    #[test]
    fn test_resolved_url_keeps_explicit_scheme() {
        let endpoint = EndpointOverride {
            url: "http://localhost:3000".to_string(),
            use_ssl: true,
        };
        assert_eq!(endpoint.resolved_url(), "http://localhost:3000");
    }

    #[test]
    fn test_target_display() {
        let config = ConnectionConfig::default();
        assert_eq!(config.target_display(), "AWS DynamoDB (region: us-east-1)");

        let config = ConnectionConfig {
            endpoint: Some(EndpointOverride {
                url: "localhost:8000".to_string(),
                use_ssl: false,
            }),
            ..Default::default()
        };
        assert_eq!(
            config.target_display(),
            "Local DynamoDB (http://localhost:8000)"
        );
    }

    #[test]
    fn test_from_cli() {
        let cli = Cli::try_parse_from([
            "dynamock-client",
            "--endpoint-url",
            "localhost:3000",
            "--no-ssl",
            "--access-key-id",
            "AKID",
            "--secret-access-key",
            "SECRET",
            "--region",
            "eu-west-1",
            "tables",
        ])
        .unwrap();

        let config = ConnectionConfig::from_cli(&cli);

        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.access_key_id.as_deref(), Some("AKID"));
        assert_eq!(
            config.endpoint,
            Some(EndpointOverride {
                url: "localhost:3000".to_string(),
                use_ssl: false,
            })
        );
        assert!(config.static_credentials().is_some());
    }

    #[test]
    fn test_partial_credentials_use_default_chain() {
        let config = ConnectionConfig {
            access_key_id: Some("AKID".to_string()),
            ..Default::default()
        };
        assert!(config.static_credentials().is_none());
    }
}
