// ==========================
// tests/unit/config_tests.rs
// ==========================
//! Unit tests for the configuration module
use auth_lib::auth::ClearPolicy;
use auth_lib::config::Settings;
use figment::Jail;

#[test]
fn test_settings_default() {
    let settings = Settings::default();

    assert_eq!(settings.hash_cost, 12);
    assert_eq!(settings.environment, "development");
    assert_eq!(settings.rate_limit.max_attempts, 5);
    assert_eq!(settings.rate_limit.window_secs, 900);
    assert_eq!(settings.rate_limit.clear_on, ClearPolicy::Success);
    assert!(settings.data_dir.is_none());
    // no secrets by default
    assert!(settings.validate().is_err());
}

#[test]
fn test_file_and_env_layering() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "tokenwarden.toml",
            r#"
                access_token_secret = "file-access"
                refresh_token_secret = "file-refresh"
                environment = "production"

                [rate_limit]
                max_attempts = 3
                clear_on = "success_or_redirect"
            "#,
        )?;
        jail.set_env("TOKENWARDEN_REFRESH_TOKEN_SECRET", "env-refresh");
        jail.set_env("TOKENWARDEN_RATE_LIMIT__WINDOW_SECS", "60");
        jail.set_env("TOKENWARDEN_REFRESH_COOKIE_SECURE", "0");

        let settings = Settings::load().map_err(|e| e.to_string())?;
        assert_eq!(settings.access_token_secret, "file-access");
        assert_eq!(settings.refresh_token_secret, "env-refresh");
        assert_eq!(settings.rate_limit.max_attempts, 3);
        assert_eq!(settings.rate_limit.window_secs, 60);
        assert_eq!(settings.rate_limit.clear_on, ClearPolicy::SuccessOrRedirect);
        assert!(settings.is_production());
        // the explicit override beats the production flag
        assert!(!settings.secure_cookies());
        Ok(())
    });
}

#[test]
fn test_load_rejects_shared_secret() {
    Jail::expect_with(|jail| {
        jail.set_env("TOKENWARDEN_ACCESS_TOKEN_SECRET", "same");
        jail.set_env("TOKENWARDEN_REFRESH_TOKEN_SECRET", "same");
        assert!(Settings::load().is_err());
        Ok(())
    });
}
