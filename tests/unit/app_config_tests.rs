/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use yantwai::app_config::{Config, LogLevel};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.tiers.primary.model, "gemini-2.0-flash");
    assert_eq!(config.tiers.primary.batch_size, 15);
    assert_eq!(config.tiers.lite.model, "gemini-2.0-flash-lite");
    assert_eq!(config.tiers.lite.batch_size, 30);
    assert_eq!(config.tiers.pro.model, "gemini-2.0-pro-exp");
    assert_eq!(config.tiers.pro.batch_size, 5);

    assert_eq!(config.thresholds.success_max_pct, 0.5);
    assert_eq!(config.thresholds.partial_max_pct, 20.0);
    assert_eq!(config.thresholds.retry_success_max_pct, 10.0);

    assert_eq!(config.max_shard_chars, 6000);
    assert_eq!(config.batch_interval_secs, 66);
    assert_eq!(config.request_timeout_secs, 180);
    assert_eq!(config.api_key_env, "GEMINI_API_KEY");
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.max_shard_chars = 0;
    assert!(config.validate().is_err());
    config.max_shard_chars = 6000;

    config.tiers.primary.model = String::new();
    assert!(config.validate().is_err());
    config.tiers.primary.model = "gemini-2.0-flash".to_string();

    config.tiers.lite.batch_size = 0;
    assert!(config.validate().is_err());
    config.tiers.lite.batch_size = 30;

    config.thresholds.success_max_pct = 120.0;
    assert!(config.validate().is_err());
    config.thresholds.success_max_pct = 0.5;

    // first-pass success bound above the partial bound is inconsistent
    config.thresholds.success_max_pct = 30.0;
    config.thresholds.partial_max_pct = 20.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_roundTrip_throughFile() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.max_shard_chars = 4000;
    config.tiers.primary.temperature = 0.7;
    config.save_to_file(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.max_shard_chars, 4000);
    assert_eq!(loaded.tiers.primary.temperature, 0.7);
    Ok(())
}

#[test]
fn test_config_fromPartialJson_shouldFillDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");
    std::fs::write(&path, r#"{ "max_shard_chars": 2500 }"#)?;

    let config = Config::from_file(&path)?;
    assert_eq!(config.max_shard_chars, 2500);
    assert_eq!(config.batch_interval_secs, 66);
    assert_eq!(config.tiers.lite.model, "gemini-2.0-flash-lite");
    Ok(())
}

#[test]
fn test_config_fromInvalidJson_shouldError() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{ broken")?;
    assert!(Config::from_file(&path).is_err());
    Ok(())
}

#[test]
fn test_api_key_readsConfiguredEnvVar() {
    let mut config = Config::default();
    config.api_key_env = "YANTWAI_TEST_API_KEY".to_string();

    // set_var is unsafe in edition 2024; this test owns the variable
    unsafe { std::env::remove_var("YANTWAI_TEST_API_KEY") };
    assert!(config.api_key().is_err());

    unsafe { std::env::set_var("YANTWAI_TEST_API_KEY", "secret") };
    assert_eq!(config.api_key().unwrap(), "secret");
    unsafe { std::env::remove_var("YANTWAI_TEST_API_KEY") };
}
