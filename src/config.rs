use crate::schemas::AppState;
use anyhow::{Context, Result};
use chrono::NaiveTime;
use common::AutomationConfig;
use sea_orm::Database;

/// Initialize application configuration and state
pub async fn initialize_app_state() -> Result<AppState> {
    // Load configuration
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://sdabill.db".to_string());
    initialize_app_state_with_url(&database_url).await
}

/// Initialize application state against an explicit database URL
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    // Connect to database
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    let automation = load_automation_config()?;

    Ok(AppState { db, automation })
}

/// Read the organization automation settings from the environment once and
/// hand them around as an explicit value.
pub fn load_automation_config() -> Result<AutomationConfig> {
    let timezone = match std::env::var("ORG_TIMEZONE") {
        Ok(name) => name
            .parse()
            .with_context(|| format!("invalid ORG_TIMEZONE '{}'", name))?,
        Err(_) => chrono_tz::Australia::Sydney,
    };
    let run_time = match std::env::var("DRAWDOWN_RUN_TIME") {
        Ok(value) => NaiveTime::parse_from_str(&value, "%H:%M")
            .with_context(|| format!("invalid DRAWDOWN_RUN_TIME '{}', expected HH:MM", value))?,
        Err(_) => NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
    };
    let notify_emails = std::env::var("DRAWDOWN_NOTIFY_EMAILS")
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(AutomationConfig {
        timezone,
        run_time,
        notify_emails,
    })
}

/// Get bind address from environment or use default
pub fn get_bind_address() -> String {
    std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}
