use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use password_store::{cli::Cli, config::ServiceConfig, server, service::HashService};

fn init_tracing() {
    use std::io::IsTerminal;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ServiceConfig::from(&cli);
    config.validate()?;

    let listener = TcpListener::bind(cli.listen).await?;
    let addr = listener.local_addr()?;
    let service = HashService::start(&config);
    info!("password store listening on {}", addr);

    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = ?err, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };
    if let Err(err) = server::serve_until(listener, service, ctrl_c).await {
        warn!("server exited with error: {err:?}");
        return Err(err);
    }

    Ok(())
}
