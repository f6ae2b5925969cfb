use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use pimovie::download::{DownloadConfig, Downloader};
use pimovie::http::{self, state::AppState};
use pimovie::player::{Session, SessionConfig, SystemHost};
use pimovie::{cli, config, shutdown};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    let file_config = config::find_config_file(args.config.as_deref()).and_then(|path| {
        match config::load_config(&path) {
            Ok(cfg) => {
                tracing::debug!("Loaded config from {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                None
            }
        }
    });

    let config = config::Config::resolve(file_config, &args);

    if !config.media_dir.is_dir() {
        eprintln!("error: not a directory: {}", config.media_dir.display());
        std::process::exit(1);
    }
    if let Err(e) = which::which(&config.player) {
        tracing::warn!("Player {} not found ({}); play requests will fail", config.player, e);
    }

    let session = Session::spawn(
        SessionConfig {
            media_dir: config.media_dir.clone(),
            player: config.player.clone(),
            player_args: config.player_args.clone(),
            kill_name: config.kill_name.clone(),
        },
        Arc::new(SystemHost),
    );
    let downloader = Downloader::new(DownloadConfig {
        program: config.downloader.clone(),
        args: config.downloader_args.clone(),
        dir: config.media_dir.clone(),
    });

    match session.list_movies().await {
        Ok(movies) => tracing::info!("{} movies in {}", movies.len(), config.media_dir.display()),
        Err(e) => tracing::warn!("{}", e),
    }

    let state = AppState {
        session: session.clone(),
        downloader,
    };
    let app = http::build_router(state, config.web_root.as_deref());

    let addr = if config.localhost {
        SocketAddr::from(([127, 0, 0, 1], config.port))
    } else {
        SocketAddr::from(([0, 0, 0, 0], config.port))
    };
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap_or_else(|e| {
        eprintln!("error: failed to bind {}: {}", addr, e);
        std::process::exit(1);
    });
    tracing::info!("{} listening at http://{}", session.version(), addr);

    let graceful = shutdown::graceful_then_forced(shutdown::ctrl_c, || {
        eprintln!("\npimovie: forced exit");
        std::process::exit(1);
    });
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = graceful.await;
        })
        .await
    {
        tracing::error!("HTTP server error: {}", e);
    }

    match session.stop().await {
        Ok(outcome) => tracing::debug!("{}", outcome.message()),
        Err(e) => tracing::warn!("Failed to stop player: {}", e),
    }
    tracing::info!("Goodbye.");
}
