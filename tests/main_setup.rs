use formation_backoffice::{
    AppConfig,
    config::{ConfigError, Env},
};
use serial_test::serial;
use std::{env, panic};

const CONFIG_VARS: [&str; 13] = [
    "APP_ENV",
    "MONGODB_URI",
    "MONGODB_DB",
    "PAYLOAD_SECRET",
    "PORT",
    "TOKEN_EXPIRATION",
    "S3_ENDPOINT",
    "S3_REGION",
    "S3_ACCESS_KEY",
    "S3_SECRET_KEY",
    "S3_BUCKET_NAME",
    "S3_PUBLIC_URL",
    "RUST_LOG",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with a clean configuration environment plus `vars`, then
/// restores whatever was set before.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_production_fails_fast_without_secret() {
    let result = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("MONGODB_URI", "mongodb://db.internal:27017/formation"),
            ("S3_ACCESS_KEY", "key"),
            ("S3_SECRET_KEY", "secret"),
        ],
        AppConfig::load,
    );

    assert_eq!(result.unwrap_err(), ConfigError::Missing("PAYLOAD_SECRET"));
}

#[test]
#[serial]
fn test_production_requires_database_uri() {
    let result = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("PAYLOAD_SECRET", "prod-secret"),
            ("S3_ACCESS_KEY", "key"),
            ("S3_SECRET_KEY", "secret"),
        ],
        AppConfig::load,
    );

    assert_eq!(result.unwrap_err(), ConfigError::Missing("MONGODB_URI"));
}

#[test]
#[serial]
fn test_production_requires_storage_credentials() {
    let result = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("MONGODB_URI", "mongodb://db.internal:27017"),
            ("PAYLOAD_SECRET", "prod-secret"),
            ("S3_ACCESS_KEY", "key"),
        ],
        AppConfig::load,
    );

    assert_eq!(result.unwrap_err(), ConfigError::Missing("S3_SECRET_KEY"));
}

#[test]
#[serial]
fn test_production_complete_configuration() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("MONGODB_URI", "mongodb://db.internal:27017"),
            ("MONGODB_DB", "formation_prod"),
            ("PAYLOAD_SECRET", "prod-secret"),
            ("PORT", "8080"),
            ("TOKEN_EXPIRATION", "3600"),
            ("S3_ACCESS_KEY", "key"),
            ("S3_SECRET_KEY", "secret"),
            ("S3_PUBLIC_URL", "https://cdn.example.org/media"),
        ],
        AppConfig::load,
    )
    .expect("complete production config must load");

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.mongodb_uri.as_deref(), Some("mongodb://db.internal:27017"));
    assert_eq!(config.mongodb_db, "formation_prod");
    assert_eq!(config.payload_secret, "prod-secret");
    assert_eq!(config.port, 8080);
    assert_eq!(config.token_expiration, 3600);
    assert_eq!(config.s3_public_url.as_deref(), Some("https://cdn.example.org/media"));
}

#[test]
#[serial]
fn test_local_env_defaults() {
    let config = run_with_env(&[("APP_ENV", "local")], AppConfig::load)
        .expect("local config never requires secrets");

    assert_eq!(config.env, Env::Local);
    // No URI selects the in-memory repository.
    assert!(config.mongodb_uri.is_none());
    assert_eq!(config.mongodb_db, "formation");
    assert_eq!(config.port, 3000);
    assert_eq!(config.token_expiration, 7200);
    assert_eq!(config.s3_endpoint, "http://localhost:9000");
    assert!(!config.payload_secret.is_empty());
}

#[test]
#[serial]
fn test_unknown_app_env_is_local() {
    let config = run_with_env(&[("APP_ENV", "staging")], AppConfig::load).unwrap();
    assert_eq!(config.env, Env::Local);
}

#[test]
#[serial]
fn test_blank_values_count_as_unset() {
    let config = run_with_env(&[("MONGODB_URI", "   "), ("MONGODB_DB", "")], AppConfig::load)
        .unwrap();

    assert!(config.mongodb_uri.is_none());
    assert_eq!(config.mongodb_db, "formation");
}

#[test]
#[serial]
fn test_invalid_port_is_rejected() {
    let result = run_with_env(&[("PORT", "eighty")], AppConfig::load);

    assert_eq!(
        result.unwrap_err(),
        ConfigError::Invalid {
            name: "PORT",
            value: "eighty".to_string()
        }
    );
}

#[test]
#[serial]
fn test_non_positive_token_expiration_is_rejected() {
    let result = run_with_env(&[("TOKEN_EXPIRATION", "0")], AppConfig::load);
    assert!(matches!(
        result,
        Err(ConfigError::Invalid {
            name: "TOKEN_EXPIRATION",
            ..
        })
    ));
}
