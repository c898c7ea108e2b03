//! Error taxonomy tests

use std::collections::HashSet;

use hitcounter::errors::HitCounterError;

#[test]
fn test_error_codes_are_unique() {
    let errors = [
        HitCounterError::config_load("a"),
        HitCounterError::storage_operation("b"),
        HitCounterError::validation("c"),
        HitCounterError::not_found("d"),
        HitCounterError::serialization("e"),
        HitCounterError::date_parse("f"),
    ];

    let codes: HashSet<&str> = errors.iter().map(|e| e.code()).collect();
    assert_eq!(codes.len(), errors.len());
}

#[test]
fn test_display_format() {
    let err = HitCounterError::not_found("hitcount 7 does not exist");
    assert_eq!(
        err.to_string(),
        "Resource Not Found: hitcount 7 does not exist"
    );
    assert_eq!(err.code(), "E004");
    assert_eq!(err.message(), "hitcount 7 does not exist");
}

#[test]
fn test_from_io_error() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: HitCounterError = io.into();
    assert!(matches!(err, HitCounterError::StorageOperation(_)));
}

#[test]
fn test_from_serde_json_error() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: HitCounterError = json_err.into();
    assert!(matches!(err, HitCounterError::Serialization(_)));
}

#[test]
fn test_from_toml_error() {
    let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
    let err: HitCounterError = toml_err.into();
    assert!(matches!(err, HitCounterError::ConfigLoad(_)));
}
