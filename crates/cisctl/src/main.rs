// # cisctl - CIS resource lifecycle driver
//
// A thin host for `cis-core`: it runs one lifecycle callback for one
// resource record and exits. All resource logic lives in `cis-core`.
//
// 1. Read configuration from environment variables
// 2. Initialize logging (stderr, so stdout stays machine-readable)
// 3. Read the resource record as JSON from stdin
// 4. Run the operation and print the updated record as JSON on stdout
//
// ## Usage
//
// ```bash
// cisctl apply <resource_type> <create|read|update|delete|exists> < record.json
// cisctl types
// ```
//
// The record has the shape `{"id": ..., "attributes": {...}, "prior": {...}}`.
// `prior` holds the attributes as last stored and drives change detection
// on update.
//
// ## Configuration
//
// - `CIS_ENDPOINT`: CIS API base URL
// - `CIS_RC_ENDPOINT`: Resource controller base URL
// - `CIS_TOKEN_ENV`: Name of the variable holding the API token (default `IC_IAM_TOKEN`)
// - `CIS_POLL_DELAY_SECS`: Wait before the first status poll
// - `CIS_POLL_INTERVAL_SECS`: Wait between status polls
// - `CIS_TIMEOUT_SECS`: Create/update/delete budget
// - `CIS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export IC_IAM_TOKEN=...
// echo '{"attributes":{"cis_id":"crn:v1:...","domain":"example.com"}}' \
//     | cisctl apply ibm_cis_domain create
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cis_core::config::{EndpointConfig, PollConfig, ProviderConfig, TimeoutConfig};
use cis_core::{Operation, Outcome, ResourceData, ResourceRegistry};
use std::env;
use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Operation succeeded
/// - 1: Configuration or usage error
/// - 2: Operation failed
/// - 3: Interrupted before the operation finished
#[derive(Debug, Clone, Copy)]
enum CisExitCode {
    Success = 0,
    ConfigError = 1,
    OperationError = 2,
    Interrupted = 3,
}

impl From<CisExitCode> for ExitCode {
    fn from(code: CisExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser)]
#[command(name = "cisctl", version)]
#[command(about = "Run one CIS resource lifecycle operation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered resource types
    Types,
    /// Run one lifecycle callback on the record read from stdin
    Apply {
        /// Resource type, e.g. ibm_cis_domain
        resource_type: String,
        /// Lifecycle callback to run
        #[arg(value_enum)]
        operation: OperationArg,
    },
}

/// Lifecycle callback as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OperationArg {
    Create,
    Read,
    Update,
    Delete,
    Exists,
}

impl From<OperationArg> for Operation {
    fn from(arg: OperationArg) -> Self {
        match arg {
            OperationArg::Create => Operation::Create,
            OperationArg::Read => Operation::Read,
            OperationArg::Update => Operation::Update,
            OperationArg::Delete => Operation::Delete,
            OperationArg::Exists => Operation::Exists,
        }
    }
}

/// Application configuration
struct Config {
    cis_endpoint: Option<String>,
    rc_endpoint: Option<String>,
    token_env: Option<String>,
    poll_delay_secs: Option<u64>,
    poll_interval_secs: Option<u64>,
    timeout_secs: Option<u64>,
    log_level: String,
}

/// Parse an optional numeric variable, rejecting garbage instead of
/// silently falling back to a default
fn env_u64(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a whole number of seconds. Got: {}", name, value)),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            cis_endpoint: env::var("CIS_ENDPOINT").ok(),
            rc_endpoint: env::var("CIS_RC_ENDPOINT").ok(),
            token_env: env::var("CIS_TOKEN_ENV").ok(),
            poll_delay_secs: env_u64("CIS_POLL_DELAY_SECS")?,
            poll_interval_secs: env_u64("CIS_POLL_INTERVAL_SECS")?,
            timeout_secs: env_u64("CIS_TIMEOUT_SECS")?,
            log_level: env::var("CIS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate numeric ranges and the log level
    fn validate(&self) -> Result<()> {
        if let Some(delay) = self.poll_delay_secs
            && delay > 300
        {
            anyhow::bail!(
                "CIS_POLL_DELAY_SECS must be between 0 and 300 seconds. Got: {}",
                delay
            );
        }

        if let Some(interval) = self.poll_interval_secs
            && !(1..=300).contains(&interval)
        {
            anyhow::bail!(
                "CIS_POLL_INTERVAL_SECS must be between 1 and 300 seconds. Got: {}",
                interval
            );
        }

        if let Some(timeout) = self.timeout_secs
            && !(1..=86400).contains(&timeout)
        {
            anyhow::bail!(
                "CIS_TIMEOUT_SECS must be between 1 and 86400 seconds. Got: {}",
                timeout
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "CIS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the library configuration, applying overrides to defaults
    fn to_provider_config(&self) -> Result<ProviderConfig> {
        let defaults = ProviderConfig::default();
        let poll_defaults = PollConfig::default();

        let config = ProviderConfig {
            endpoints: EndpointConfig {
                cis: self
                    .cis_endpoint
                    .clone()
                    .unwrap_or(defaults.endpoints.cis),
                resource_controller: self
                    .rc_endpoint
                    .clone()
                    .unwrap_or(defaults.endpoints.resource_controller),
                ..defaults.endpoints
            },
            token_env: self.token_env.clone().unwrap_or(defaults.token_env),
            poll: PollConfig {
                delay_secs: self.poll_delay_secs.unwrap_or(poll_defaults.delay_secs),
                min_interval_secs: self
                    .poll_interval_secs
                    .unwrap_or(poll_defaults.min_interval_secs),
            },
            timeouts: match self.timeout_secs {
                Some(secs) => TimeoutConfig {
                    create_secs: secs,
                    update_secs: secs,
                    delete_secs: secs,
                },
                None => defaults.timeouts,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                CisExitCode::ConfigError.into()
            } else {
                CisExitCode::Success.into()
            };
        }
    };

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return CisExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return CisExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CisExitCode::ConfigError.into();
    }

    let (resource_type, operation) = match cli.command {
        Commands::Types => {
            for name in ResourceRegistry::builtin().list() {
                println!("{}", name);
            }
            return CisExitCode::Success.into();
        }
        Commands::Apply {
            resource_type,
            operation,
        } => (resource_type, Operation::from(operation)),
    };

    let provider_config = match config.to_provider_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return CisExitCode::ConfigError.into();
        }
    };

    let mut data = match read_record() {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Invalid resource record on stdin: {:#}", e);
            return CisExitCode::ConfigError.into();
        }
    };

    // Operations are sequential; a single-threaded runtime is enough.
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CisExitCode::OperationError.into();
        }
    };

    let result = rt.block_on(async {
        tokio::select! {
            result = run(provider_config, &resource_type, operation, &mut data) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        }
    });

    let code = match result {
        Some(Ok(outcome)) => match print_result(&data, outcome) {
            Ok(()) => CisExitCode::Success,
            Err(e) => {
                error!("Failed to write result: {}", e);
                CisExitCode::OperationError
            }
        },
        Some(Err(e)) => {
            error!("{} {} failed: {:#}", operation, resource_type, e);
            CisExitCode::OperationError
        }
        None => {
            error!("Interrupted; the remote operation may still be in progress");
            CisExitCode::Interrupted
        }
    };

    code.into()
}

fn read_record() -> Result<ResourceData> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;

    if input.trim().is_empty() {
        return Ok(ResourceData::new());
    }

    serde_json::from_str(&input).context("Expected {\"id\", \"attributes\", \"prior\"}")
}

fn print_result(data: &ResourceData, outcome: Outcome) -> Result<()> {
    let output = match outcome {
        Outcome::Applied => serde_json::to_string_pretty(data)?,
        Outcome::Exists(exists) => serde_json::json!({ "exists": exists }).to_string(),
    };
    println!("{}", output);
    Ok(())
}

/// Run one lifecycle callback
async fn run(
    config: ProviderConfig,
    resource_type: &str,
    operation: Operation,
    data: &mut ResourceData,
) -> Result<Outcome> {
    let factory = client_factory(&config)?;
    let provider = cis_core::CisProvider::with_builtin_resources(factory, config)?;

    info!("Running {} on {}", operation, resource_type);
    let outcome = provider.apply(resource_type, operation, data).await?;
    Ok(outcome)
}

#[cfg(feature = "http")]
fn client_factory(config: &ProviderConfig) -> Result<Arc<dyn cis_core::ClientFactory>> {
    let factory = cis_client_http::HttpClientFactory::new(config)?;
    Ok(Arc::new(factory))
}

#[cfg(not(feature = "http"))]
fn client_factory(_config: &ProviderConfig) -> Result<Arc<dyn cis_core::ClientFactory>> {
    anyhow::bail!("cisctl was built without the `http` feature; no API client is available")
}
