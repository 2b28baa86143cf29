use anyhow::Context;
use clap::Parser;
use mockhost::{MockHostConfig, MockResource, ResourceState};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Programmable HTTP mock server
#[derive(Parser, Debug)]
#[command(name = "mockhost", version)]
struct Args {
    /// Port to listen on (overrides the config file; 0 picks a free port)
    #[arg(short, long, env = "MOCKHOST_PORT")]
    port: Option<u16>,

    /// Host to bind (overrides the config file)
    #[arg(long, env = "MOCKHOST_HOST")]
    host: Option<String>,

    /// YAML file declaring endpoints
    #[arg(short, long, env = "MOCKHOST_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MockHostConfig::from_file(path)?,
        None => MockHostConfig::default(),
    };
    if let Some(port) = args.port {
        config.listen.port = port;
    }
    if let Some(host) = args.host {
        config.listen.host = host;
    }
    config.validate()?;

    let resource = MockResource::start(config.name.clone(), &config.listen, |server| {
        config.register_endpoints(server)
    })
    .await;

    if resource.state() != ResourceState::Running {
        let error = resource.snapshot().error.unwrap_or_default();
        anyhow::bail!("Resource '{}' failed to start: {}", resource.name(), error);
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");
    resource.stop().await;
    Ok(())
}
