use actix_middleware::{
    CorrelationIdMiddleware, Logging, MetricsMiddleware, PrincipalMiddleware, PrincipalVerifier,
};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use cache_invalidation::InvalidationPublisher;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use social_service::config::{Config, StorageBackend};
use social_service::handlers::{
    json_config, path_config, payload_config, register_ops_routes, register_routes,
};
use social_service::repository::{MemoryStore, Repositories};
use social_service::services::{
    HttpIdentityDirectory, IdentityDirectory, ImageStore, NoopViewInvalidator,
    RedisViewInvalidator, S3ImageStore, UnconfiguredDirectory, ViewInvalidator,
};
use social_service::AppState;

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,social_service=debug,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_verifier(config: &Config) -> Result<PrincipalVerifier> {
    let auth = &config.auth;
    let mut verifier = match (&auth.public_key_pem, &auth.secret) {
        (Some(pem), _) => PrincipalVerifier::from_rsa_pem(pem.replace("\\n", "\n").as_bytes())
            .context("Invalid JWT_PUBLIC_KEY_PEM")?,
        (None, Some(secret)) => {
            warn!("Verifying bearer tokens with a shared HS256 secret");
            PrincipalVerifier::from_secret(secret.as_bytes())
        }
        (None, None) => anyhow::bail!("no JWT verification key configured"),
    };

    if let Some(issuer) = &auth.issuer {
        verifier = verifier.with_issuer(issuer);
    }
    if let Some(audience) = &auth.audience {
        verifier = verifier.with_audience(audience);
    }
    Ok(verifier)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting social-service");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        env = %config.app.env,
        http_port = config.app.http_port,
        backend = ?config.app.storage_backend,
        "Configuration loaded"
    );

    // Repositories
    let (repos, pool) = match (config.app.storage_backend, config.database.clone()) {
        (StorageBackend::Postgres, Some(db_config)) => {
            db_config.log_config();
            let pool = db_pool::create_pool(db_config)
                .await
                .context("Failed to connect to database")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Database migrations completed");

            (Repositories::postgres(pool.clone()), Some(pool))
        }
        (StorageBackend::Postgres, None) => anyhow::bail!("postgres backend without DATABASE_URL"),
        (StorageBackend::Memory, _) => {
            warn!("Using in-memory storage; data is lost on restart");
            (Repositories::memory(MemoryStore::new()), None)
        }
    };

    // View invalidation
    let invalidator: Arc<dyn ViewInvalidator> = match &config.redis.url {
        Some(url) => {
            let publisher = InvalidationPublisher::new(url, "social-service".to_string())
                .await
                .context("Failed to connect to Redis")?;
            info!(channel = %publisher.channel(), "View invalidation enabled");
            Arc::new(RedisViewInvalidator::new(publisher))
        }
        None => {
            info!("REDIS_URL not set, view invalidation disabled");
            Arc::new(NoopViewInvalidator)
        }
    };

    // Identity directory
    let directory: Arc<dyn IdentityDirectory> =
        match (&config.directory.base_url, &config.directory.secret_key) {
            (Some(base_url), Some(secret_key)) => Arc::new(
                HttpIdentityDirectory::new(
                    base_url,
                    secret_key,
                    Duration::from_secs(config.directory.timeout_secs),
                )
                .context("Failed to build identity directory client")?,
            ),
            _ => {
                warn!("Identity directory not configured; user sync is unavailable");
                Arc::new(UnconfiguredDirectory)
            }
        };

    // Image storage
    let images: Option<Arc<dyn ImageStore>> = match config.storage.clone() {
        Some(s3_config) => {
            let client = s3_utils::S3Client::with_config(s3_config).await;
            if let Err(e) = client.health_check().await {
                warn!(error = %e, "S3 bucket not reachable at startup");
            }
            Some(Arc::new(S3ImageStore::new(client)))
        }
        None => {
            info!("S3_BUCKET not set, image uploads disabled");
            None
        }
    };

    let mut state = AppState::new(repos, directory, invalidator, images);
    if let Some(pool) = pool {
        state = state.with_pool(pool);
    }

    let verifier = Arc::new(build_verifier(&config)?);
    let http_addr = format!("{}:{}", config.app.host, config.app.http_port);

    let http_server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config())
            .app_data(path_config())
            .app_data(payload_config())
            .wrap(PrincipalMiddleware::new(verifier.clone()))
            .wrap(MetricsMiddleware)
            .wrap(Logging)
            .wrap(CorrelationIdMiddleware)
            .configure(register_ops_routes)
            .configure(register_routes)
    })
    .bind(&http_addr)
    .context("Failed to bind HTTP server")?
    .disable_signals()
    .run();

    info!("HTTP server listening on http://{}", http_addr);

    let handle = http_server.handle();
    let mut join_set = JoinSet::new();

    join_set.spawn(async move {
        http_server
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))
    });

    join_set.spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        handle.stop(true).await;
        Ok(())
    });

    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!("Task failed: {:#}", e);
                return Err(e);
            }
            Err(e) => {
                tracing::error!("Task panicked: {:#}", e);
                return Err(anyhow::anyhow!("Task panicked: {}", e));
            }
        }
    }

    info!("social-service shut down");
    Ok(())
}
