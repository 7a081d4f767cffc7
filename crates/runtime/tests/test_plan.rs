use std::path::Path;

use anyhow::Result;
use parlor_config::AppConfig;
use parlor_runtime::BackendServices;
use tempfile::TempDir;

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.to_string_lossy())
}

fn build_config(database_url: String) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = database_url;
    config.database.max_connections = 2;
    // Nothing listens on port 1; bus connection attempts fail fast.
    config.redis.url = "redis://127.0.0.1:1/".to_string();
    config
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_prepares_database_before_transports() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/init.db");
    let config = build_config(sqlite_url(&db_path));

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected bus connection to fail against a dead port"),
        Err(error) => error,
    };

    // The pool and schema were prepared before the bus connection failed.
    assert!(db_path.exists(), "database file should have been created");
    assert!(
        format!("{error:?}").contains("fan-out bus"),
        "expected a bus connection failure, got {error:?}"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_propagates_database_failures() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let bogus = format!(
        "postgres://{}/ignored.db",
        temp_dir.path().join("nope").to_string_lossy()
    );
    let config = build_config(bogus);

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected database connection to fail for non-sqlite URL"),
        Err(error) => error,
    };
    assert!(
        error.to_string().contains("invalid database url"),
        "expected database url rejection, got {error}"
    );
    Ok(())
}

#[test]
fn telemetry_init_tracing_sets_global_subscriber() {
    parlor_runtime::telemetry::init_tracing().expect("first initialisation should succeed");

    let second = parlor_runtime::telemetry::init_tracing();
    assert!(
        second.is_err(),
        "initialising telemetry twice should fail with global subscriber already set"
    );
}
