pub mod test_utils {
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use chrono::NaiveTime;
    use common::AutomationConfig;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

    /// Create an in-memory SQLite database for testing. The pool is capped
    /// at one connection so every request sees the same in-memory database.
    pub async fn setup_test_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = Database::connect(options)
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Automation settings used by the tests: Sydney time, 02:00 runs.
    pub fn test_automation_config() -> AutomationConfig {
        AutomationConfig {
            timezone: chrono_tz::Australia::Sydney,
            run_time: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
            notify_emails: vec![],
        }
    }

    /// Create AppState for testing, seeded with one resident
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;

        let test_resident = model::entities::resident::ActiveModel {
            organization_id: Set(1),
            first_name: Set("Alex".to_string()),
            last_name: Set("Nguyen".to_string()),
            ndis_number: Set("430111222".to_string()),
            ..Default::default()
        };
        test_resident
            .insert(&db)
            .await
            .expect("Failed to create test resident");

        AppState {
            db,
            automation: test_automation_config(),
        }
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        let state = setup_test_app_state().await;
        create_router(state)
    }
}
