use std::{future::IntoFuture, process, sync::Arc};

use bilemo::{
    application::{auth::TokenAuthenticator, error::AppError},
    cache::{
        CacheConfig, MemoryTagStore, ReadThroughCache, TagAwareStore, TagInvalidator,
        spawn_sweeper,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, Repositories},
        memory::InMemoryRepositories,
        telemetry,
    },
};
use clap::Parser;
use tokio::sync::watch;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let cli_args = config::CliArgs::parse();
    let settings = config::load(&cli_args)?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Some(config::Command::Migrate(_)) => run_migrations(&settings).await,
        Some(config::Command::Serve(_)) | None => run_serve(settings).await,
    }
}

async fn run_migrations(settings: &config::Settings) -> Result<(), AppError> {
    let database_url = settings.database.url.as_deref().ok_or_else(|| {
        InfraError::configuration(
            "database url is required (provide --database-url or set BILEMO__DATABASE__URL)",
        )
    })?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::migration(err.to_string()))?;

    info!(target: "bilemo::migrate", "Migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let (repositories, db) = init_repositories(&settings).await?;

    let cache_config = CacheConfig::from(&settings.cache);
    let store: Arc<dyn TagAwareStore> = Arc::new(MemoryTagStore::new(&cache_config));
    let cache = ReadThroughCache::new(store.clone(), &cache_config);
    let invalidator = TagInvalidator::new(store.clone());

    let sweeper = cache_config
        .enabled
        .then(|| spawn_sweeper(store, cache_config.sweep_interval));
    if !cache_config.enabled {
        warn!(target: "bilemo::cache", "Listing cache disabled; every request hits storage");
    }

    let authenticator = TokenAuthenticator::from_settings(&settings.auth);
    if authenticator.is_empty() {
        warn!(
            target: "bilemo::auth",
            "No API tokens configured; every /api request will be rejected"
        );
    }

    let state = ApiState::new(
        repositories,
        cache,
        invalidator,
        authenticator,
        settings.pagination,
        db,
    );

    let result = serve_http(&settings, state).await;

    if let Some(handle) = sweeper {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<(Repositories, Option<Arc<PostgresRepositories>>), AppError> {
    let Some(database_url) = settings.database.url.as_deref() else {
        warn!(
            target: "bilemo::storage",
            "No database url configured; serving from in-memory storage"
        );
        let memory = Arc::new(InMemoryRepositories::new());
        return Ok((Repositories::shared(memory), None));
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::migration(err.to_string()))?;

    let postgres = Arc::new(PostgresRepositories::new(pool));
    Ok((Repositories::shared(postgres.clone()), Some(postgres)))
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(target: "bilemo::http", addr = %settings.server.addr, "Listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let mut graceful_rx = shutdown_rx.clone();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = graceful_rx.wait_for(|stop| *stop).await;
        })
        .into_future();
    tokio::pin!(server);

    let mut deadline_rx = shutdown_rx;
    tokio::select! {
        result = &mut server => result.map_err(InfraError::from)?,
        _ = deadline_rx.wait_for(|stop| *stop) => {
            info!(target: "bilemo::http", "Shutdown requested; draining connections");
            let grace = settings.server.graceful_shutdown;
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result.map_err(InfraError::from)?,
                Err(_) => warn!(
                    target: "bilemo::http",
                    grace_seconds = grace.as_secs(),
                    "Graceful shutdown timed out; dropping open connections"
                ),
            }
        }
    }

    info!(target: "bilemo::http", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
