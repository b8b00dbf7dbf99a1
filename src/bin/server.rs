use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use frame_cut_planner::config::ServerConfig;
use frame_cut_planner::types::{CuttingPlanResult, Demand, Stock};
use frame_cut_planner::{PlanError, expand_demands};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize, Serialize)]
struct PlanRequest {
    stock: Stock,
    pieces: Vec<Demand>,
    /// Reject the whole plan when a piece does not fit the stock.
    #[serde(default)]
    strict: bool,
}

async fn plan(Json(req): Json<PlanRequest>) -> Result<Json<CuttingPlanResult>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /plan"
    );

    let bad_request = |e: PlanError| (StatusCode::BAD_REQUEST, e.to_string());

    req.stock.validate().map_err(bad_request)?;
    let pieces = expand_demands(&req.stock, &req.pieces).map_err(bad_request)?;
    let mut result = req.stock.plan(&pieces).map_err(bad_request)?;

    if !result.is_complete() {
        tracing::warn!(unplaced = result.unplaced.len(), stock = %req.stock, "plan has unplaced pieces");
    }
    if req.strict {
        result = result.into_strict().map_err(bad_request)?;
    }

    Ok(Json(result))
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/plan", post(plan))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

fn main() {
    let config = ServerConfig::from_env();

    let _sentry = config.sentry_dsn.clone().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("failed to open {}: {e}", config.log_file);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    // Sentry must be initialised before the runtime starts its threads.
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(serve(&config)) {
        tracing::error!(error = %e, "server stopped");
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}

async fn serve(config: &ServerConfig) -> std::io::Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("Listening on {addr}");
    tracing::info!(%addr, "listening");
    axum::serve(listener, app()).await
}
