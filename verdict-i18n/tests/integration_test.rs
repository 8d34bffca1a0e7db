//! Integration tests for verdict-i18n

use std::fs;
use verdict_i18n::*;

#[test]
fn test_load_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("en.json"),
        r#"{"required": "The :attribute field is required.", "min": {"string": "Too short"}}"#,
    )
    .unwrap();
    fs::write(dir.path().join("id.json"), r#"{"required": ":attribute wajib diisi."}"#).unwrap();
    fs::write(dir.path().join("README.txt"), "ignored").unwrap();

    let mut messages = Messages::new();
    messages.load_from_dir(dir.path()).unwrap();

    assert_eq!(messages.locales(), vec![Locale::en(), Locale::id()]);

    let translator = Translator::new(messages, Locale::en());
    assert_eq!(translator.t("required", &Locale::id()), ":attribute wajib diisi.");
    assert_eq!(translator.t("min.string", &Locale::id()), "Too short");
}

#[test]
fn test_load_from_dir_rejects_bad_locale_filename() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bahasa.json"), "{}").unwrap();

    let mut messages = Messages::new();
    let err = messages.load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, I18nError::InvalidLocale(_)));
}

#[test]
fn test_load_from_missing_dir_is_io_error() {
    let mut messages = Messages::new();
    let err = messages.load_from_dir("/definitely/not/here").unwrap_err();
    assert!(matches!(err, I18nError::IoError(_)));
}

#[test]
fn test_accept_language_negotiation() {
    let available = [Locale::en(), Locale::id()];
    let default = Locale::en();
    let requested = parse_accept_language("id-ID,id;q=0.9");

    assert_eq!(negotiate_locale(&requested, &available, &default).tag(), "id");
}
