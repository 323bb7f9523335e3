#![forbid(unsafe_code)]
mod common;

use common::{d, fixture};
use garde::calendar::{Period, ViewMode};
use garde::config::{ClientConfig, ConfigError, DEFAULT_BASE_URL};
use garde::io::{export_shifts_csv, export_shifts_json};
use garde::model::RoleFilter;
use garde::session::Session;
use garde::storage::{JsonStorage, Snapshot, Storage};
use tempfile::tempdir;

#[test]
fn config_defaults_point_at_local_backend() {
    let cfg = ClientConfig::default();
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert!(cfg.token.is_none());
    assert_eq!(cfg.default_view, ViewMode::Week);
    assert_eq!(cfg.default_role, RoleFilter::All);
}

#[test]
fn config_save_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let cfg = ClientConfig {
        base_url: "https://hopital.example/api/".into(),
        token: Some("abc".into()),
        default_view: ViewMode::Day,
        default_role: RoleFilter::Nurse,
        snapshot: Some(dir.path().join("cache.json")),
    };
    cfg.save_to(&path).unwrap();
    assert_eq!(ClientConfig::load_from(&path).unwrap(), cfg);
    assert_eq!(cfg.snapshot_path(), Some(dir.path().join("cache.json")));
}

#[test]
fn partial_config_keeps_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "default_role = \"doctor\"\ndefault_view = \"list\"\n").unwrap();
    let cfg = ClientConfig::load_from(&path).unwrap();
    assert_eq!(cfg.default_role, RoleFilter::Doctor);
    assert_eq!(cfg.default_view, ViewMode::List);
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
}

#[test]
fn broken_config_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "default_role = [").unwrap();
    assert!(matches!(ClientConfig::load_from(&path), Err(ConfigError::Parse(_))));
}

#[test]
fn flags_override_file_but_blank_flags_do_not() {
    let cfg = ClientConfig {
        token: Some("from-file".into()),
        ..ClientConfig::default()
    }
    .merge(Some("http://other:8080".into()), Some("  ".into()));
    assert_eq!(cfg.base_url, "http://other:8080");
    assert_eq!(cfg.token.as_deref(), Some("from-file"));

    let session = cfg.session().unwrap();
    assert_eq!(session.base_url().as_str(), "http://other:8080/");
}

#[test]
fn bad_base_url_is_reported() {
    let cfg = ClientConfig {
        base_url: "not a url".into(),
        ..ClientConfig::default()
    };
    assert!(matches!(cfg.session(), Err(ConfigError::BaseUrl { .. })));
}

#[test]
fn session_decodes_claims_and_hides_token() {
    // {"userId":"D1","role":"doctor"}
    let token = "eyJhbGciOiJIUzI1NiJ9.eyJ1c2VySWQiOiJEMSIsInJvbGUiOiJkb2N0b3IifQ.sig";
    let session = Session::new("http://localhost:3006", Some(token.into())).unwrap();
    let claims = session.claims().unwrap();
    assert_eq!(claims.user_id.as_deref(), Some("D1"));
    assert_eq!(claims.role.as_deref(), Some("doctor"));

    let debug = format!("{session:?}");
    assert!(!debug.contains(token));
    assert!(debug.contains("<redacted>"));

    let blank = Session::new("http://localhost:3006", Some(" ".into())).unwrap();
    assert!(blank.token().is_none());
    assert!(blank.claims().is_none());
}

#[test]
fn snapshot_round_trip_and_coverage() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::open(dir.path().join("cache").join("snapshot.json")).unwrap();
    assert!(!storage.exists());

    let snapshot = Snapshot {
        fetched_at: d(2024, 6, 1).and_hms_opt(8, 0, 0).unwrap(),
        period: Period {
            start: d(2024, 6, 2),
            end: d(2024, 6, 8),
        },
        data: fixture(),
    };
    storage.save(&snapshot).unwrap();
    assert_eq!(storage.load().unwrap(), snapshot);

    assert!(snapshot.covers(Period {
        start: d(2024, 6, 3),
        end: d(2024, 6, 3),
    }));
    assert!(!snapshot.covers(Period {
        start: d(2024, 6, 9),
        end: d(2024, 6, 15),
    }));
}

#[test]
fn exports_use_staff_names() {
    let dir = tempdir().unwrap();
    let data = fixture();
    let shifts: Vec<_> = data.shifts.iter().take(2).collect();

    let csv = dir.path().join("shifts.csv");
    export_shifts_csv(&csv, &shifts, &data.staff).unwrap();
    let text = std::fs::read_to_string(&csv).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.contains("e2,Garde nuit,Night,2024-06-03,2024-06-03T22:00:00,2024-06-04T06:00:00,Dr Alice Martin,,"));

    let json = dir.path().join("shifts.json");
    export_shifts_json(&json, &shifts, &data.staff).unwrap();
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(value[0]["nurses"][0], "Bob Durand");
    assert_eq!(value[1]["end"], "2024-06-04T06:00:00");
}
