/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (store / auth services) → Router 組み立て
 * - Middleware の適用 (identity / security headers / CORS / http)
 * - axum::serve() で起動、Ctrl-C で graceful shutdown
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware::{self, auth::public::PublicPaths};
use crate::repos::{
    self, CredentialStore, MemoryCredentialStore, MemoryTodoStore, PgCredentialStore, PgTodoStore,
    TodoStore,
};
use crate::services::auth::build_auth_services;
use crate::state::AppState;

const DB_MAX_CONNECTIONS: u32 = 10;

fn init_tracing() {
    // RUST_LOG があればそちらを優先
    // RUST_LOG=info,todo_auth_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr は起動方法によっては見えないので tracing にも出す
        tracing::error!(?info, "panic");

        // 開発中は即落として気付けるようにする
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let (users, todos): (Arc<dyn CredentialStore>, Arc<dyn TodoStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(DB_MAX_CONNECTIONS)
                    .connect(url)
                    .await
                    .context("connect to DATABASE_URL")?;
                repos::migrate(&pool).await.context("run migrations")?;

                (
                    Arc::new(PgCredentialStore::new(pool.clone())),
                    Arc::new(PgTodoStore::new(pool)),
                )
            }
            None => {
                tracing::warn!(
                    "DATABASE_URL is not set; using in-memory stores (data is lost on restart)"
                );
                (
                    Arc::new(MemoryCredentialStore::new()),
                    Arc::new(MemoryTodoStore::new()),
                )
            }
        };

    // 署名鍵はここで一度だけ生成する。再起動すると既存 token は全て無効になる
    let (tokens, auth) = build_auth_services(config, users)?;

    Ok(AppState::new(auth, tokens, todos, PublicPaths::default()))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = middleware::auth::access::apply(api::routes(), state.clone()).with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
