mod cli;

use clap::Parser;
use cli::{Cli, Commands, SiteArgs};
use tracing::info;

use sitekeeper::client::RemoteManagerClient;
use sitekeeper::client::models::UpdateKind;
use sitekeeper::config::Config;
use sitekeeper::orchestrator::{UpdateOrchestrator, UpdateOutcome};

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::ValidateKey(args) => {
            let client = build_client(&args, &config)?;
            let result = client.validate_api_key().await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.valid {
                return Err("API key validation failed".into());
            }
        }
        Commands::Status(args) => {
            let client = build_client(&args, &config)?;
            let status = client.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Updates(args) => {
            let client = build_client(&args, &config)?;
            let updates = client.updates().await?;
            println!("{}", serde_json::to_string_pretty(&updates)?);
        }
        Commands::Update(args) => {
            let kind: UpdateKind = args.kind.into();
            if kind != UpdateKind::Core && args.item.is_empty() {
                return Err("--item is required for plugin and theme updates".into());
            }

            let client = build_client(&args.site, &config)?;
            let orchestrator = UpdateOrchestrator::new(&client);
            // The perform payload identifies core with a flag, not a name
            let identifier = if kind == UpdateKind::Core {
                "wordpress".to_string()
            } else {
                args.item.clone()
            };

            let attempt = orchestrator.update_item(kind, &identifier).await;
            println!("{}", serde_json::to_string_pretty(&attempt)?);
            info!(outcome = %attempt.outcome, "Update finished");

            if let UpdateOutcome::Failed { message } = &attempt.outcome {
                return Err(message.clone().into());
            }
        }
    }

    Ok(())
}

/// Resolve site coordinates from CLI flags, then config/environment.
fn build_client(args: &SiteArgs, config: &Config) -> Result<RemoteManagerClient, AnyError> {
    let base_url = args
        .site
        .clone()
        .or_else(|| config.site.base_url.clone())
        .ok_or("no site URL: pass --site or set site.base_url in the config")?;

    let api_key = args
        .api_key
        .clone()
        .or_else(|| config.site.api_key.clone())
        .ok_or("no API key: pass --api-key or set SITEKEEPER_API_KEY")?;

    Ok(RemoteManagerClient::new(
        &base_url,
        &api_key,
        config.client.clone(),
    )?)
}
