use std::sync::Arc;

use anyhow::Context as _;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use civic_complaints::config::ComplaintsConfig;
use civic_complaints::infra::classifier::ClassifierClient;
use civic_complaints::infra::mail::MailNotifier;
use civic_complaints::infra::storage::LocalImageStore;
use civic_complaints::router::{HttpOptions, build_router};
use civic_complaints::state::AppState;
use civic_complaints::usecase::locks::ComplaintLocks;
use civic_complaints::usecase::user::SeedAdminUseCase;
use civic_complaints_migration::Migrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    civic_core::tracing::init_tracing("info,sqlx=warn");

    let config = ComplaintsConfig::from_env()?;

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("failed to run migrations")?;

    let state = AppState {
        db,
        locks: Arc::new(ComplaintLocks::new()),
        notifier: MailNotifier::from_config(config.smtp.as_ref())?,
        classifier: ClassifierClient::from_config(config.classifier.as_ref()),
        images: LocalImageStore {
            dir: config.upload_dir.clone(),
        },
        dependency_timeout: config.dependency_timeout,
    };

    if let Some(seed) = &config.admin_seed {
        let usecase = SeedAdminUseCase {
            users: state.user_repo(),
        };
        if usecase.execute(seed).await? {
            info!(email = %seed.email, "created administrator account");
        }
    }

    let router = build_router(state, &HttpOptions::from_config(&config)?);
    let http_addr = format!("0.0.0.0:{}", config.complaints_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;

    info!("complaints service listening on {http_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
