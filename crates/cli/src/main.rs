mod render;

use anyhow::{Context, Result};
use clap::Parser;
use cloud::{AwsCli, CliEnvironment, Environment, InMemoryEnvironment};
use colored::Colorize;
use events::{drain_run, EventBus};
use orchestrator::{
    AssumeAvailable, AwsCredentials, RunContext, Sequencer, StaticCredentials, Validator,
};
use provision_core::config::DEFAULT_CONFIG_FILE;
use provision_core::{ProvisionConfig, RunOptions, RunState, StepName};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::render::ProgressRenderer;

#[derive(Parser, Debug)]
#[command(name = "mlops-provision")]
#[command(about = "Provision and validate the churn pipeline's cloud infrastructure", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the configured AWS account id
    #[arg(long)]
    account_id: Option<String>,

    /// Override the configured AWS region
    #[arg(long)]
    region: Option<String>,

    #[arg(long)]
    skip_prerequisites: bool,

    #[arg(long)]
    skip_environment: bool,

    #[arg(long)]
    skip_object_store: bool,

    #[arg(long)]
    skip_execution_role: bool,

    #[arg(long)]
    skip_registry_group: bool,

    /// Skip uploading training data
    #[arg(long)]
    skip_data: bool,

    /// Skip connecting to the EKS cluster
    #[arg(long)]
    skip_cluster: bool,

    /// Skip publishing credentials into the cluster
    #[arg(long)]
    skip_secrets: bool,

    #[arg(long)]
    skip_validation: bool,

    /// Only check existing resources, never create anything
    #[arg(long, conflicts_with = "simulate")]
    validate_only: bool,

    /// Rehearse the run against a simulated environment
    #[arg(long)]
    simulate: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn run_options(&self) -> RunOptions {
        RunOptions::new()
            .skip_if(StepName::Prerequisites, self.skip_prerequisites)
            .skip_if(StepName::Environment, self.skip_environment)
            .skip_if(StepName::ObjectStore, self.skip_object_store)
            .skip_if(StepName::ExecutionRole, self.skip_execution_role)
            .skip_if(StepName::RegistryGroup, self.skip_registry_group)
            .skip_if(StepName::DataSetup, self.skip_data)
            .skip_if(StepName::ClusterConnection, self.skip_cluster)
            .skip_if(StepName::CredentialBridge, self.skip_secrets)
            .skip_if(StepName::Validation, self.skip_validation)
    }

    fn load_config(&self) -> Result<ProvisionConfig> {
        let mut config = ProvisionConfig::load(&self.config)
            .with_context(|| format!("Failed to load {}", self.config.display()))?;
        if let Some(account_id) = &self.account_id {
            config = config.with_account_id(account_id);
        }
        if let Some(region) = &self.region {
            config = config.with_region(region);
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Arc::new(cli.load_config()?);
    tracing::info!(
        region = %config.region,
        account = %config.account_id,
        simulate = cli.simulate,
        "Configuration loaded"
    );

    if cli.validate_only {
        let env = CliEnvironment::new(
            AwsCli::new(&config.region).with_profile(config.profile.clone()),
            &config.cluster_name,
        );
        return validate_only(&env, &config, cli.json).await;
    }

    let ctx = if cli.simulate {
        simulated_context(Arc::clone(&config))?
    } else {
        let env = CliEnvironment::new(
            AwsCli::new(&config.region).with_profile(config.profile.clone()),
            &config.cluster_name,
        );
        RunContext::new(Arc::clone(&config), Arc::new(env))
    };

    provision(ctx, &cli.run_options(), cli.json).await
}

/// Every tool present, fixed dummy credentials, nothing provisioned yet.
fn simulated_context(config: Arc<ProvisionConfig>) -> Result<RunContext> {
    let env = InMemoryEnvironment::new(config.account_id.clone());
    let credentials = AwsCredentials::new("SIMULATEDACCESSKEY", "simulated-secret-key")?;
    Ok(RunContext::new(config, Arc::new(env))
        .with_tools(Arc::new(AssumeAvailable))
        .with_credentials(Arc::new(StaticCredentials::new(credentials))))
}

async fn provision(mut ctx: RunContext, options: &RunOptions, json: bool) -> Result<ExitCode> {
    let bus = EventBus::new();
    let renderer = if json {
        None
    } else {
        let rx = bus.subscribe();
        let mut progress = ProgressRenderer::new();
        Some(tokio::spawn(drain_run(rx, move |envelope| {
            progress.handle(envelope)
        })))
    };

    let report = Sequencer::standard()
        .with_event_bus(bus)
        .run(&mut ctx, options)
        .await
        .context("Provisioning run hit an internal error")?;

    if let Some(handle) = renderer {
        handle.await.context("Progress renderer panicked")?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        print!("{}", report.summary());
        match report.state {
            RunState::Degraded => eprintln!(
                "{} best-effort checks failed; see the validation report above",
                "warning:".yellow().bold()
            ),
            RunState::Aborted => {
                if let Some(failed) = report.failure() {
                    eprintln!(
                        "{} step {} failed: {}",
                        "error:".red().bold(),
                        failed.name(),
                        failed.detail().unwrap_or("unknown error")
                    );
                }
            }
            _ => {}
        }
    }

    Ok(ExitCode::from(report.exit_code()))
}

async fn validate_only(env: &dyn Environment, config: &ProvisionConfig, json: bool) -> Result<ExitCode> {
    let report = Validator::new(env).validate(&config.resource_specs()).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.summary());
    }

    Ok(if report.all_accessible() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mlops_provision=info,orchestrator=info,cloud=info".into()),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_skip_flags_map_to_steps() {
        let cli = Cli::parse_from([
            "mlops-provision",
            "--skip-data",
            "--skip-secrets",
            "--skip-cluster",
        ]);
        let options = cli.run_options();

        assert!(options.is_skipped(StepName::DataSetup));
        assert!(options.is_skipped(StepName::CredentialBridge));
        assert!(options.is_skipped(StepName::ClusterConnection));
        assert!(!options.is_skipped(StepName::Validation));
        assert_eq!(options.skipped().count(), 3);
    }

    #[test]
    fn test_every_step_has_a_skip_flag() {
        let cli = Cli::parse_from([
            "mlops-provision",
            "--skip-prerequisites",
            "--skip-environment",
            "--skip-object-store",
            "--skip-execution-role",
            "--skip-registry-group",
            "--skip-data",
            "--skip-cluster",
            "--skip-secrets",
            "--skip-validation",
        ]);
        let options = cli.run_options();
        for name in StepName::ORDER {
            assert!(options.is_skipped(name), "{} has no skip flag", name);
        }
    }

    #[test]
    fn test_validate_only_conflicts_with_simulate() {
        let result = Cli::try_parse_from(["mlops-provision", "--validate-only", "--simulate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_applied_before_validation() {
        let cli = Cli::parse_from([
            "mlops-provision",
            "--config",
            "/nonexistent/provision.toml",
            "--account-id",
            "123456789012",
            "--region",
            "us-east-1",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.account_id, "123456789012");
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn test_missing_account_id_is_startup_error() {
        let cli = Cli::parse_from(["mlops-provision", "--config", "/nonexistent/provision.toml"]);
        let err = cli.load_config().unwrap_err();
        assert!(format!("{:#}", err).contains("account_id"));
    }

    #[tokio::test]
    async fn test_simulated_run_succeeds() {
        let config = ProvisionConfig::default().with_account_id("123456789012");
        let ctx = simulated_context(Arc::new(config)).unwrap();
        let code = provision(ctx, &RunOptions::new().skip(StepName::DataSetup), true)
            .await
            .unwrap();
        assert_eq!(format!("{:?}", code), format!("{:?}", ExitCode::SUCCESS));
    }
}
