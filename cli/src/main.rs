use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wrap_cli::config::{self, Args, Mode, DEFAULT_LOG_FILTER};
use wrap_cli::{demo, Listener};
use wrap_core::App;
use wrap_server::ServerConfig;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = config::load_dotenv() {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }
    let args = Args::parse();

    // stderr only: stdout carries responses in repl mode.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app = demo::app(args.env);
    tracing::info!(env = %app.env(), "starting");

    let result = match args.mode {
        Mode::Serve { addr } => serve(addr, app).await,
        Mode::Repl => repl(app).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "exiting");
            ExitCode::FAILURE
        }
    }
}

async fn serve(addr: std::net::SocketAddr, app: Arc<App>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    wrap_server::run_until(listener, app, ServerConfig::default(), shutdown_signal()).await?;
    tracing::info!("stopped");
    Ok(())
}

async fn repl(app: Arc<App>) -> std::io::Result<()> {
    let listener = Listener::new(app);
    tokio::task::spawn_blocking(move || {
        let mut stdout = std::io::stdout().lock();
        Listener::banner(&mut stdout)?;
        listener.listen(std::io::stdin().lock(), stdout)
    })
    .await
    .map_err(std::io::Error::other)?
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
