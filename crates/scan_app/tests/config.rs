use std::fs;
use std::time::Duration;

use pretty_assertions::assert_eq;
use scan_app::config::{
    read_config, save_config, AppConfig, CameraFacing, ConfigError, LogOutput,
};
use tempfile::TempDir;

#[test]
fn missing_file_gives_defaults() {
    let temp = TempDir::new().unwrap();
    let config = read_config(&temp.path().join("scan.ron")).unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.service.base_url, "http://localhost:5000");
}

#[test]
fn partial_file_fills_in_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scan.ron");
    fs::write(
        &path,
        r#"(
            service: (base_url: "http://scanner.local:8080", request_timeout_ms: 1500),
            facing_mode: User,
            auto_analyze: true,
        )"#,
    )
    .unwrap();

    let config = read_config(&path).unwrap();
    assert_eq!(config.facing_mode, CameraFacing::User);
    assert!(config.auto_analyze);
    assert_eq!(config.log_destination, LogOutput::Terminal);

    let settings = config.service.settings();
    assert_eq!(settings.base_url, "http://scanner.local:8080");
    assert_eq!(settings.request_timeout, Duration::from_millis(1500));
    assert_eq!(settings.connect_timeout, Duration::from_secs(2));
}

#[test]
fn unparsable_file_is_reported_to_the_caller() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scan.ron");
    fs::write(&path, "(service: [oops").unwrap();

    let err = read_config(&path).unwrap_err();
    assert!(matches!(&err, ConfigError::Parse { path: p, .. } if *p == path));
    assert!(err.to_string().starts_with("failed to parse config"));
}

#[test]
fn unreadable_path_is_reported_to_the_caller() {
    let temp = TempDir::new().unwrap();
    // A directory exists at the path but cannot be read as a file.
    let err = read_config(temp.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn saved_config_loads_back() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("scan.ron");
    let config = AppConfig {
        auto_analyze: true,
        log_destination: LogOutput::Both,
        ..AppConfig::default()
    };

    let written = save_config(&path, &config).unwrap();
    assert_eq!(written, path);
    assert_eq!(read_config(&path).unwrap(), config);
}
