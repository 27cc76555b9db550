//! Tests for loading configuration from the environment.

use std::time::Duration;

use sentifl_client::config::{Config, ConfigError};
use serial_test::serial;

const VARS: &[&str] = &[
    "API_BASE_URL",
    "MUSIC_API_BASE_URL",
    "HTTP_TIMEOUT_SECS",
    "SESSION_PATH",
    "POST_PAGE_SIZE",
    "SEARCH_DEBOUNCE_MS",
    "S3_BUCKET",
    "S3_REGION",
    "S3_ENDPOINT",
    "S3_PREFIX",
    "S3_PUBLIC_URL",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults() {
    clear_env();
    std::env::set_var("API_BASE_URL", "https://api.sentifl.example/api/v1");
    std::env::set_var("MUSIC_API_BASE_URL", "https://music.sentifl.example");

    let config = Config::from_env().expect("config");
    config.validate().expect("valid");

    assert_eq!(config.post_page_size, 5);
    assert_eq!(config.http_timeout, Duration::from_secs(30));
    assert_eq!(config.search_debounce, Duration::from_millis(300));
    assert_eq!(config.s3_bucket, None);
    assert_eq!(config.s3_prefix, "uploads/");
    clear_env();
}

#[test]
#[serial]
fn test_missing_base_url() {
    clear_env();
    std::env::set_var("MUSIC_API_BASE_URL", "https://music.sentifl.example");

    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::MissingEnvVar(ref name)) if name == "API_BASE_URL"
    ));
    clear_env();
}

#[test]
#[serial]
fn test_overrides_and_bad_numbers() {
    clear_env();
    std::env::set_var("API_BASE_URL", "https://api.sentifl.example/api/v1");
    std::env::set_var("MUSIC_API_BASE_URL", "https://music.sentifl.example");
    std::env::set_var("POST_PAGE_SIZE", "20");
    std::env::set_var("S3_BUCKET", "sentifl-media");

    let config = Config::from_env().unwrap();
    assert_eq!(config.post_page_size, 20);
    assert_eq!(config.s3_bucket.as_deref(), Some("sentifl-media"));

    std::env::set_var("POST_PAGE_SIZE", "lots");
    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::ParseInt { .. })
    ));

    std::env::set_var("POST_PAGE_SIZE", "0");
    assert!(Config::from_env().unwrap().validate().is_err());
    clear_env();
}
