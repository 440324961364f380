use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use tracing::info;

use moveline_agent::availability::{AvailabilityChecker, BookingLedgerStore};
use moveline_agent::booking::BookingCoordinator;
use moveline_agent::distance::{DistanceService, HttpDistanceService, UnavailableDistanceService};
use moveline_agent::extractor::FieldExtractor;
use moveline_agent::nlu::HttpNluClient;
use moveline_agent::runtime::{AgentRuntime, RuntimeDeps};
use moveline_core::audit::InMemoryAuditSink;
use moveline_core::config::{AppConfig, ConfigError, LoadOptions, NluProvider};
use moveline_core::pricing::DeterministicPricingEngine;
use moveline_core::script::engine::{ScriptEngine, ScriptPolicy};
use moveline_db::repositories::{BookingRepository, ScheduleStore, SqlScheduleStore};
use moveline_db::{connect_with_settings, migrations, DbPool, SqlBookingRepository};
use moveline_notify::{
    EmailChannel, HttpEmailChannel, HttpSmsChannel, NoopEmailChannel, NoopSmsChannel,
    NotificationDispatcher, SmsChannel, Templates,
};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("notification templates failed to compile: {0}")]
    Templates(#[source] tera::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        call_id = "unknown",
        booking_id = "unknown",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        call_id = "unknown",
        booking_id = "unknown",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        call_id = "unknown",
        booking_id = "unknown",
        "database migrations applied"
    );

    let runtime = Arc::new(build_runtime(&config, db_pool.clone())?);

    Ok(Application { config, db_pool, runtime })
}

fn build_runtime(config: &AppConfig, db_pool: DbPool) -> Result<AgentRuntime, BootstrapError> {
    let http = reqwest::Client::new();

    let bookings: Arc<dyn BookingRepository> =
        Arc::new(SqlBookingRepository::new(db_pool.clone()));
    let crew_stores: Vec<Arc<dyn ScheduleStore>> = config
        .scheduling
        .stores
        .iter()
        .map(|name| {
            Arc::new(SqlScheduleStore::new(name.clone(), db_pool.clone())) as Arc<dyn ScheduleStore>
        })
        .collect();

    let mut checker_stores: Vec<Arc<dyn ScheduleStore>> =
        vec![Arc::new(BookingLedgerStore::new(bookings.clone()))];
    checker_stores.extend(crew_stores.iter().cloned());

    let email: Arc<dyn EmailChannel> = match (
        config.notifications.email_enabled,
        config.notifications.email_api_url.as_ref(),
    ) {
        (true, Some(api_url)) => Arc::new(HttpEmailChannel::new(
            http.clone(),
            api_url.clone(),
            clone_secret(config.notifications.email_api_key.as_ref()),
            config.notifications.email_from.clone(),
        )),
        _ => Arc::new(NoopEmailChannel),
    };
    let sms: Arc<dyn SmsChannel> = match (
        config.notifications.sms_enabled,
        config.notifications.sms_api_url.as_ref(),
    ) {
        (true, Some(api_url)) => Arc::new(HttpSmsChannel::new(
            http.clone(),
            api_url.clone(),
            clone_secret(config.notifications.sms_api_key.as_ref()),
            config.notifications.sms_from.clone(),
        )),
        _ => Arc::new(NoopSmsChannel),
    };

    let dispatcher = Arc::new(NotificationDispatcher::new(
        email,
        sms,
        Templates::new().map_err(BootstrapError::Templates)?,
        config.notifications.operations_email.clone(),
        config.notifications.booking_link_base_url.clone(),
    ));

    let nlu_base_url = config.nlu.base_url.clone().unwrap_or_else(|| {
        match config.nlu.provider {
            NluProvider::Ollama => "http://localhost:11434".to_owned(),
            NluProvider::OpenAi => "https://api.openai.com".to_owned(),
            NluProvider::Anthropic => "https://api.anthropic.com".to_owned(),
        }
    });
    let nlu = Arc::new(HttpNluClient::new(
        http.clone(),
        nlu_base_url,
        config.nlu.model.clone(),
        clone_secret(config.nlu.api_key.as_ref()),
    ));

    let distance: Arc<dyn DistanceService> = if config.geocoding.enabled {
        Arc::new(HttpDistanceService::new(http, config.geocoding.base_url.clone()))
    } else {
        Arc::new(UnavailableDistanceService)
    };

    let coordinator = BookingCoordinator::new(
        bookings,
        AvailabilityChecker::new(checker_stores.clone()),
        crew_stores,
        dispatcher.clone(),
    );

    Ok(AgentRuntime::new(RuntimeDeps {
        engine: ScriptEngine::new(ScriptPolicy { retry_budget: config.script.retry_budget }),
        extractor: FieldExtractor::new(nlu, Duration::from_secs(config.nlu.timeout_secs)),
        distance,
        pricing: Arc::new(DeterministicPricingEngine),
        checker: AvailabilityChecker::new(checker_stores),
        coordinator,
        dispatcher,
        audit: Arc::new(InMemoryAuditSink::default()),
        transfer_number: config.script.transfer_number.clone(),
        distance_timeout: Duration::from_secs(config.geocoding.timeout_secs),
        idle_timeout: Duration::from_secs(config.script.idle_timeout_secs),
    }))
}

fn clone_secret(secret: Option<&SecretString>) -> Option<SecretString> {
    secret.cloned()
}

#[cfg(test)]
mod tests {
    use moveline_core::config::{ConfigOverrides, LoadOptions, NluProvider};

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_when_nlu_credentials_are_missing() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                nlu_provider: Some(NluProvider::OpenAi),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = match result {
            Ok(_) => panic!("bootstrap should fail without an nlu api key"),
            Err(error) => error.to_string(),
        };
        assert!(message.contains("nlu.api_key"));
    }

    #[tokio::test]
    async fn integration_smoke_covers_startup_and_the_voice_data_path() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with defaults");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('bookings', 'schedule_entries')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected foundation tables to be available after bootstrap");
        assert_eq!(table_count, 2, "bootstrap should expose baseline booking-path tables");

        let greeting = app
            .runtime
            .handle_event(moveline_agent::runtime::InboundEvent::CallStart {
                call_id: "CA-BOOT-1".to_owned(),
                caller: "+15125550100".to_owned(),
            })
            .await;
        match greeting {
            moveline_agent::runtime::OutputAction::Say { text, gather } => {
                assert!(gather);
                assert!(text.contains("Moveline"));
            }
            other => panic!("expected greeting prompt, got {other:?}"),
        }

        app.db_pool.close().await;
    }
}
