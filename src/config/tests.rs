use std::io::Write;

use super::*;

#[test]
fn defaults_match_service_contract() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 3000);
    assert_eq!(settings.server.addr.ip().to_string(), "0.0.0.0");
    assert_eq!(settings.uploads.max_file_bytes.get(), 20 * 1024 * 1024);
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn default_impl_agrees_with_raw_defaults() {
    let built = Settings::from_raw(RawSettings::default()).expect("valid settings");
    let default = Settings::default();

    assert_eq!(built.server.addr, default.server.addr);
    assert_eq!(
        built.uploads.max_file_bytes,
        default.uploads.max_file_bytes
    );
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn upload_limit_can_be_overridden_via_cli() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        max_upload_bytes: Some(1_572_864),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.uploads.max_file_bytes.get(), 1_572_864);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_port_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);

    let err = Settings::from_raw(raw).expect_err("port 0 is invalid");
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
}

#[test]
fn zero_upload_limit_is_rejected() {
    let mut raw = RawSettings::default();
    raw.uploads.max_file_bytes = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero limit is invalid");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "uploads.max_file_bytes",
            ..
        }
    ));
}

#[test]
fn zero_shutdown_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.graceful_shutdown_seconds = Some(0);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn unknown_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());

    let err = Settings::from_raw(raw).expect_err("unknown level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn invalid_host_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.host = Some("not a host".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid host");
    assert!(matches!(err, LoadError::Invalid { key: "server.addr", .. }));
}

#[test]
fn ipv6_hosts_are_bracketed() {
    let mut raw = RawSettings::default();
    raw.server.host = Some("::1".to_string());
    raw.server.port = Some(8080);

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.server.addr.to_string(), "[::1]:8080");
}

#[test]
fn parse_cli_arguments() {
    let args = CliArgs::parse_from([
        "docx2html",
        "--port",
        "8081",
        "--host",
        "127.0.0.1",
        "--log-json",
        "true",
        "--max-upload-bytes",
        "1024",
    ]);

    assert_eq!(args.overrides.port, Some(8081));
    assert_eq!(args.overrides.host.as_deref(), Some("127.0.0.1"));
    assert_eq!(args.overrides.log_json, Some(true));
    assert_eq!(args.overrides.max_upload_bytes, Some(1024));
}

#[test]
fn config_file_is_layered_under_cli() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    writeln!(
        file,
        "[server]\nhost = \"127.0.0.1\"\nport = 5000\n\n[uploads]\nmax_file_bytes = 2048\n"
    )
    .expect("write config");

    let cli = CliArgs {
        config_file: Some(file.path().to_path_buf()),
        overrides: ServeOverrides {
            port: Some(5001),
            ..Default::default()
        },
    };

    let settings = load(&cli).expect("settings load");
    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:5001");
    assert_eq!(settings.uploads.max_file_bytes.get(), 2048);
}

#[test]
fn missing_config_file_fails() {
    let cli = CliArgs {
        config_file: Some("/definitely/not/here.toml".into()),
        ..Default::default()
    };

    assert!(matches!(load(&cli), Err(LoadError::Build(_))));
}
