#![cfg_attr(not(test), deny(clippy::panic))]

use clap::Parser;
use masquerade_server::api;
use masquerade_server::clock::TokioClock;
use masquerade_server::config;
use masquerade_server::llm;
use masquerade_server::logging;
use masquerade_server::room::RoomRegistry;
use std::net::SocketAddr;
use std::sync::Arc;

/// Masquerade -- social-deduction game server where humans hide among
/// LLM-driven agents
#[derive(Parser, Debug)]
#[command(name = "masquerade-server")]
#[command(about = "A multi-room social-deduction game server with LLM-driven agents")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration (secrets redacted) as JSON and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = Arc::new(config::load());

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg.redacted())
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Bind: {}:{}", cfg.host, cfg.port);
                println!("  AI provider: {:?} ({})", cfg.ai.provider, cfg.ai.model);
                println!("  Discussion window: {}s", cfg.game.discussion_secs);
                println!("  Voting window: {}s", cfg.game.voting_secs);
                println!("  Rounds to win: {}", cfg.game.rounds_to_win);
                println!("  Default agents per room: {}", cfg.game.num_ai_players);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result.map_err(|e| anyhow::anyhow!("invalid configuration:\n{e}"))?;

    logging::init_with_config(&cfg.logging);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address: {e}"))?;

    tracing::info!(%addr, "Starting Masquerade server");

    let provider = llm::build_provider(&cfg.ai)?;
    let registry = RoomRegistry::new(&cfg, provider, Arc::new(TokioClock));
    registry.spawn_sweeper();

    let router = api::create_router(Arc::clone(&registry), Arc::clone(&cfg));

    // CORS: permissive by default, or an explicit origin list.
    use tower_http::cors::{Any, CorsLayer};
    let cors = if cfg.server.cors_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = cfg
            .server
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();
        if origins.is_empty() {
            tracing::warn!("No valid CORS origins configured, using permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };
    let router = router.layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        cors_origins = %cfg.server.cors_origins,
        "Server started - REST under /api, events at /ws/{{code}}/{{player_id}}"
    );

    let shutdown_registry = Arc::clone(&registry);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received, terminating rooms");
            shutdown_registry.shutdown().await;
        })
        .await?;

    Ok(())
}
