use chrono::FixedOffset;
use rattendance::config::Config;
use rattendance::errors::ErrorKind;
use std::fs;
use std::time::Duration;

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config::load_from(&dir.path().join("absent.conf")).unwrap();

    assert_eq!(cfg.endpoint, None);
    assert_eq!(cfg.utc_offset, "+09:00");
    assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
    assert_eq!(cfg.connectivity_timeout(), Duration::from_secs(3));
    assert_eq!(cfg.poll_interval(), Duration::from_secs(60));
    assert_eq!(cfg.export_prefix, "morning_attendance");
    assert_eq!(cfg.offset().unwrap(), FixedOffset::east_opt(9 * 3600).unwrap());
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rattendance.conf");
    fs::write(
        &path,
        concat!(
            "database: /var/lib/att.sqlite\n",
            "endpoint: https://script.google.com/macros/s/x/exec\n",
            "utc_offset: \"-03:30\"\n",
        ),
    )
    .unwrap();

    let cfg = Config::load_from(&path).unwrap();
    assert_eq!(cfg.database, "/var/lib/att.sqlite");
    assert_eq!(
        cfg.endpoint.as_deref(),
        Some("https://script.google.com/macros/s/x/exec")
    );
    assert_eq!(
        cfg.offset().unwrap(),
        FixedOffset::west_opt(3 * 3600 + 30 * 60).unwrap()
    );
    assert_eq!(cfg.poll_interval_secs, 60);
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("rattendance.conf");

    let mut cfg = Config::with_database("/tmp/att.sqlite");
    cfg.request_timeout_secs = 5;
    cfg.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), cfg);
}

#[test]
fn test_bad_values_are_configuration_failures() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rattendance.conf");

    for body in [
        "database: x.sqlite\nutc_offset: Seoul\n",
        "database: x.sqlite\nrequest_timeout_secs: 0\n",
        "database: x.sqlite\npoll_interval_secs: 0\n",
        "database: [unclosed\n",
    ] {
        fs::write(&path, body).unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationFailure, "{body}");
    }
}
