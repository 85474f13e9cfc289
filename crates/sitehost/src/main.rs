// # sitehost - static website provisioner
//
// This binary is a THIN integration layer:
// - All provisioning logic lives in sitehost-core
// - All AWS calls live in sitehost-provider-aws
// - Configuration is via environment variables only
//
// It is responsible for:
// 1. Reading and validating configuration from the environment
// 2. Initializing logging and the runtime
// 3. Building the Route 53 / S3 clients
// 4. Running one provisioning pass and printing the report
//
// ## Configuration
//
// - `SITEHOST_DOMAIN`: Apex domain to host (required)
// - `SITEHOST_REGION`: Hosting region, `us-east-1` (default) or `us-west-2`
// - `SITEHOST_SKIP_PLACEHOLDERS`: Do not upload placeholder pages (default false)
// - `SITEHOST_STRICT_EXCLUSIVITY`: Fail when both buckets serve content (default false)
// - `SITEHOST_TIMEOUT_SECS`: Overall deadline, 10..=3600 (default 300)
// - `SITEHOST_LOG_LEVEL`: trace, debug, info (default), warn, error
// - `SITEHOST_OUTPUT`: `text` (default) or `json`
//
// AWS credentials come from the default provider chain.
//
// ## Example
//
// ```bash
// export SITEHOST_DOMAIN=example.com
// export SITEHOST_REGION=us-west-2
// export SITEHOST_OUTPUT=json
//
// sitehost
// ```

use anyhow::{Context, Result};
use sitehost_core::{ProvisionConfig, ProvisionReport, RegionId, WebsiteProvisioner};
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Provisioning completed
/// - 1: Configuration or startup error
/// - 2: Runtime error (provider failure, timeout)
#[derive(Debug, Clone, Copy)]
enum SitehostExitCode {
    /// Provisioning completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<SitehostExitCode> for ExitCode {
    fn from(code: SitehostExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// How the report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

/// Application configuration
#[derive(Debug)]
struct Config {
    domain: String,
    region: String,
    skip_placeholders: bool,
    strict_exclusivity: bool,
    timeout_secs: u64,
    log_level: String,
    output: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let domain = lookup("SITEHOST_DOMAIN").context(
            "SITEHOST_DOMAIN is required. Set it via: export SITEHOST_DOMAIN=example.com",
        )?;

        Ok(Self {
            domain,
            region: lookup("SITEHOST_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            skip_placeholders: parse_flag(
                "SITEHOST_SKIP_PLACEHOLDERS",
                lookup("SITEHOST_SKIP_PLACEHOLDERS"),
            )?,
            strict_exclusivity: parse_flag(
                "SITEHOST_STRICT_EXCLUSIVITY",
                lookup("SITEHOST_STRICT_EXCLUSIVITY"),
            )?,
            timeout_secs: match lookup("SITEHOST_TIMEOUT_SECS") {
                Some(raw) => raw.trim().parse().with_context(|| {
                    format!("SITEHOST_TIMEOUT_SECS must be a number of seconds. Got: {}", raw)
                })?,
                None => 300,
            },
            log_level: lookup("SITEHOST_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            output: lookup("SITEHOST_OUTPUT").unwrap_or_else(|| "text".to_string()),
        })
    }

    /// Validate the configuration and build the core configuration
    fn validate(&self) -> Result<ProvisionConfig> {
        let region: RegionId = self
            .region
            .parse()
            .context("SITEHOST_REGION is not valid")?;

        let provision = ProvisionConfig::new(self.domain.clone(), region)
            .with_upload_placeholders(!self.skip_placeholders)
            .with_strict_exclusivity(self.strict_exclusivity);
        provision
            .validate()
            .context("SITEHOST_DOMAIN is not valid")?;

        if !(10..=3600).contains(&self.timeout_secs) {
            anyhow::bail!(
                "SITEHOST_TIMEOUT_SECS must be between 10 and 3600 seconds. Got: {}",
                self.timeout_secs
            );
        }

        self.log_level()?;
        self.output_format()?;

        Ok(provision)
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "SITEHOST_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    fn output_format(&self) -> Result<OutputFormat> {
        match self.output.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => anyhow::bail!(
                "SITEHOST_OUTPUT '{}' is not valid. Valid formats: text, json",
                self.output
            ),
        }
    }
}

/// Parse a boolean switch; unset means false
fn parse_flag(name: &str, value: Option<String>) -> Result<bool> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be true or false. Got: {}", name, value),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return SitehostExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    let provision = match config.validate() {
        Ok(provision) => provision,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return SitehostExitCode::ConfigError.into();
        }
    };

    let (log_level, output) = match (config.log_level(), config.output_format()) {
        (Ok(level), Ok(output)) => (level, output),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Configuration validation error: {:#}", e);
            return SitehostExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SitehostExitCode::ConfigError.into();
    }

    info!(domain = %provision.domain, region = %provision.region, "Starting sitehost");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SitehostExitCode::RuntimeError.into();
        }
    };

    let timeout = Duration::from_secs(config.timeout_secs);
    let result = rt.block_on(async {
        match tokio::time::timeout(timeout, run(provision)).await {
            Ok(Ok(report)) => match print_report(&report, output) {
                Ok(()) => SitehostExitCode::Success,
                Err(e) => {
                    error!("Failed to print report: {:#}", e);
                    SitehostExitCode::RuntimeError
                }
            },
            Ok(Err(e)) => {
                error!("Provisioning failed: {:#}", e);
                SitehostExitCode::RuntimeError
            }
            Err(_) => {
                error!("Provisioning timed out after {:?}", timeout);
                SitehostExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run one provisioning pass against AWS
async fn run(provision: ProvisionConfig) -> Result<ProvisionReport> {
    let sdk_config = sitehost_provider_aws::load_sdk_config(provision.region).await;
    let (dns, storage) = sitehost_provider_aws::clients(&sdk_config);

    let (provisioner, mut events) =
        WebsiteProvisioner::new(Box::new(dns), Box::new(storage), provision)?;

    let event_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(event = ?event, "Provision event");
        }
    });

    let report = provisioner.run().await;

    // Closing the sender ends the event log task
    drop(provisioner);
    if let Err(e) = event_log.await {
        debug!("Event log task ended abnormally: {}", e);
    }

    Ok(report?)
}

fn print_report(report: &ProvisionReport, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            println!("domain:    {} ({})", report.domain, report.region);
            println!(
                "zone:      {} {}{}",
                report.zone.zone.id,
                report.zone.zone.name,
                if report.zone.created { " (created)" } else { "" }
            );
            for bucket in [&report.apex, &report.www] {
                println!(
                    "bucket:    {} {:?}{}",
                    bucket.name,
                    bucket.role,
                    if bucket.changed() { " (changed)" } else { "" }
                );
            }
            println!("primary:   {}", report.primary_domain);
            println!("records:   apex {:?}, www {:?}", report.apex_record, report.www_record);
            println!("changes:   {}", report.changes_made());
        }
    }
    Ok(())
}
