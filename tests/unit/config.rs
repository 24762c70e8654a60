use super::*;

#[test]
fn empty_object_is_all_defaults() {
    let cfg = AppConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, AppConfig::default());
    assert_eq!(cfg.cache.budgets.art_bytes, 2 * 1024 * 1024 * 1024);
    assert_eq!(cfg.cache.budgets.identifier_bytes, 1024 * 1024 * 1024);
    assert_eq!(cfg.timeout(), Duration::from_secs(10));
    assert!(cfg.validate().is_ok());
}

#[test]
fn partial_sections_keep_other_defaults() {
    let cfg = AppConfig::from_json_str(
        r#"{"http":{"timeout_ms":2500},"cache":{"root":"/tmp/fmi-test","art_bytes":1024}}"#,
    )
    .unwrap();
    assert_eq!(cfg.http.timeout_ms, 2500);
    assert!(cfg.http.user_agent.starts_with("fmi/"));
    assert_eq!(cfg.cache.budgets.art_bytes, 1024);
    assert_eq!(cfg.cache.budgets.identifier_bytes, 1024 * 1024 * 1024);
    assert_eq!(cfg.cache_root().unwrap(), PathBuf::from("/tmp/fmi-test"));
}

#[test]
fn env_overrides_apply_and_ignore_blanks() {
    let mut cfg = AppConfig::default();
    cfg.apply_overrides(|name| match name {
        "FMI_LASTFM_API_KEY" => Some("abc".to_string()),
        "FMI_USER_AGENT" => Some("   ".to_string()),
        "FMI_FONTS_DIR" => Some("/opt/fonts".to_string()),
        _ => None,
    });
    assert_eq!(cfg.lastfm.api_key, "abc");
    assert!(cfg.http.user_agent.starts_with("fmi/"));
    assert_eq!(cfg.fonts.dir, PathBuf::from("/opt/fonts"));
    assert_eq!(cfg.cache.root, None);
}

#[test]
fn validate_rejects_zero_values() {
    let mut cfg = AppConfig::default();
    cfg.http.timeout_ms = 0;
    assert!(matches!(cfg.validate(), Err(FmiError::Validation(_))));

    let mut cfg = AppConfig::default();
    cfg.cache.budgets.identifier_bytes = 0;
    assert!(matches!(cfg.validate(), Err(FmiError::Validation(_))));

    let mut cfg = AppConfig::default();
    cfg.lastfm.endpoint = "::".to_string();
    assert!(matches!(cfg.validate(), Err(FmiError::Validation(_))));
}

#[test]
fn unknown_json_is_an_error() {
    assert!(AppConfig::from_json_str("[1,2]").is_err());
}
