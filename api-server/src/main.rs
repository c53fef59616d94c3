mod config;
mod error;
mod handlers;
mod ledger;
mod rate_limit;
mod response;
mod store;
mod types;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use actix_cors::Cors;
use actix_web::{error::InternalError, http::StatusCode, middleware, web, App, HttpServer};

use config::{AppState, ServerConfig};
use ledger::SessionLedger;
use rate_limit::RateLimiter;
use response::json_error_with_code;
use store::SessionStore;

pub(crate) fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/api/game/start", web::post().to(handlers::start_session))
        .route("/api/game/end", web::post().to(handlers::end_session))
        .route(
            "/api/game/session/{session_id}",
            web::get().to(handlers::get_session),
        )
        .route("/api/game/stats", web::get().to(handlers::game_stats))
        .route("/api/leaderboard", web::get().to(handlers::leaderboard))
        .route(
            "/api/leaderboard/user/{username}",
            web::get().to(handlers::user_scores),
        )
        .route(
            "/api/leaderboard/stats",
            web::get().to(handlers::leaderboard_stats),
        );
}

fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let response = json_error_with_code(
                StatusCode::BAD_REQUEST,
                &format!("invalid JSON body: {err}"),
                "invalid_json",
            );
            InternalError::from_response(err, response).into()
        })
}

fn spawn_rate_limit_sweep_task(limiter: Arc<RateLimiter>, sweep_secs: u64) {
    tokio::spawn(async move {
        let sweep = Duration::from_secs(sweep_secs);
        loop {
            tokio::time::sleep(sweep).await;
            let removed = limiter.sweep(Instant::now());
            if removed > 0 {
                tracing::debug!(removed, "dropped idle rate-limit buckets");
            }
        }
    });
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let store = SessionStore::open(&config.data_dir).map_err(std::io::Error::other)?;

    tracing::info!(
        "starting reflex api: bind_addr={} data_dir={} game_time=[{}..={}]s flag_implausible={} reject_implausible={} rate_limit={}",
        config.bind_addr,
        config.data_dir.display(),
        config.policy.min_time_seconds,
        config.policy.max_time_seconds,
        config.policy.flag_on_finalize,
        config.policy.reject_on_submit,
        config.rate_limit_enabled
    );

    let state = AppState {
        ledger: Arc::new(SessionLedger::new(store, config.policy)),
        limiter: Arc::new(RateLimiter::new(config.rate_limit_enabled)),
        policy: config.policy,
    };
    spawn_rate_limit_sweep_task(state.limiter.clone(), config.rate_limit_sweep_secs);

    let json_limit = config.json_limit;
    let mut server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config(json_limit))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    });
    if let Some(workers) = config.http_workers {
        server = server.workers(workers);
    }

    server.bind(config.bind_addr.as_str())?.run().await
}
