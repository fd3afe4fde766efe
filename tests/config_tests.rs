//! Unit tests for configuration loading and validation.

use std::time::Duration;

use oscpi::test_support::EnvGuard;
use oscpi::{CloudConfig, ConfigError};
use rstest::{fixture, rstest};

#[fixture]
fn valid_config() -> CloudConfig {
    CloudConfig {
        volume_api_url: String::from("https://cloud.example/v1/11111111-2222-3333-4444-555555555555"),
        compute_api_url: String::from("https://cloud.example/v2/11111111-2222-3333-4444-555555555555"),
        auth_token: String::from("gAAAAABtokenexample"),
        region: None,
        ignore_server_availability_zone: false,
        state_timeout_secs: 300,
    }
}

#[rstest]
fn validation_accepts_a_complete_configuration(valid_config: CloudConfig) {
    assert!(valid_config.validate().is_ok());
}

#[rstest]
fn validation_rejects_missing_token_with_actionable_error(valid_config: CloudConfig) {
    let cfg = CloudConfig {
        auth_token: String::new(),
        ..valid_config
    };

    let error = cfg.validate().expect_err("token is required");
    let ConfigError::MissingField(ref message) = error else {
        panic!("expected MissingField error");
    };
    assert!(
        message.contains("OS_AUTH_TOKEN"),
        "error should mention env var: {message}"
    );
    assert!(
        message.contains("oscpi.toml"),
        "error should mention config file: {message}"
    );
    assert!(
        message.contains("auth_token"),
        "error should mention TOML key: {message}"
    );
}

/// Verifies that validation produces actionable errors mentioning both the
/// environment variable and configuration file for each required field.
#[rstest]
fn validation_produces_actionable_errors_for_all_fields(valid_config: CloudConfig) {
    fn assert_actionable(
        mut cfg: CloudConfig,
        mutate: impl FnOnce(&mut CloudConfig),
        env_var: &str,
        toml_key: &str,
    ) {
        mutate(&mut cfg);
        let error = cfg.validate().expect_err("validation should fail");
        let message = error.to_string();
        assert!(
            message.contains(env_var),
            "error should mention env var {env_var}: {message}"
        );
        assert!(
            message.contains("oscpi.toml"),
            "error should mention config file: {message}"
        );
        assert!(
            message.contains(toml_key),
            "error should mention TOML key {toml_key}: {message}"
        );
    }

    assert_actionable(
        valid_config.clone(),
        |cfg| cfg.volume_api_url = String::new(),
        "OS_VOLUME_API_URL",
        "volume_api_url",
    );
    assert_actionable(
        valid_config.clone(),
        |cfg| cfg.compute_api_url = String::from("   "),
        "OS_COMPUTE_API_URL",
        "compute_api_url",
    );
    assert_actionable(
        valid_config,
        |cfg| cfg.auth_token = String::new(),
        "OS_AUTH_TOKEN",
        "auth_token",
    );
}

#[rstest]
fn settings_carry_the_zone_flag_and_timeout(valid_config: CloudConfig) {
    let cfg = CloudConfig {
        ignore_server_availability_zone: true,
        state_timeout_secs: 42,
        ..valid_config
    };

    let settings = cfg.as_settings();
    assert!(settings.ignore_server_availability_zone);
    assert_eq!(settings.wait_timeout, Duration::from_secs(42));
}

#[tokio::test]
async fn load_without_cli_args_reads_the_environment() {
    let _guard = EnvGuard::set_vars(&[
        ("OS_VOLUME_API_URL", "https://env.example/v1/tenant"),
        ("OS_COMPUTE_API_URL", "https://env.example/v2/tenant"),
        ("OS_AUTH_TOKEN", "env-token"),
    ])
    .await;

    let cfg = CloudConfig::load_without_cli_args().expect("environment should satisfy the loader");
    assert_eq!(cfg.volume_api_url, "https://env.example/v1/tenant");
    assert_eq!(cfg.compute_api_url, "https://env.example/v2/tenant");
    assert_eq!(cfg.auth_token, "env-token");
    assert!(!cfg.ignore_server_availability_zone, "flag defaults to off");
    assert_eq!(cfg.state_timeout_secs, 300, "timeout defaults to five minutes");
}
