use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use deskbridge::api::ApiServer;
use deskbridge::{Config, WebhookDispatcher};

/// Deskbridge - VK community to Chatwoot helpdesk bridge
#[derive(Parser)]
#[command(name = "deskbridge", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "BRIDGE_PORT", default_value = "8080")]
    port: u16,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,deskbridge=info",
        1 => "info,deskbridge=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing::info!(
        inbox_id = config.chatwoot.inbox_id,
        account_id = config.chatwoot.account_id,
        group_id = ?config.vk.group_id,
        secret_configured = config.vk.secret.is_some(),
        port = cli.port,
        "starting deskbridge"
    );

    let dispatcher = WebhookDispatcher::from_config(&config)?;
    let server = ApiServer::new(dispatcher, cli.port);

    server.run().await?;

    Ok(())
}
