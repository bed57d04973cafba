//! Integration tests for reading and updating config files on disk

use spellcfg_core::ErrorKind;
use spellcfg_core::TokioFs;
use spellcfg_core::settings_file::{
    add_ignore_word_to_settings_and_update, add_word_to_settings_and_update, read_settings,
    remove_language_ids_from_settings_and_update, remove_word_from_settings_and_update,
    write_add_language_ids_to_settings, write_settings,
};
use spellcfg_core::CSpellSettings;
use std::fs;
use tempfile::TempDir;
use url::Url;

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[tokio::test]
async fn test_write_then_read_preserves_settings() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/dir/cspell.json");
    let uri = Url::from_file_path(&path).unwrap();
    let settings: CSpellSettings = serde_json::from_value(serde_json::json!({
        "version": "0.2",
        "words": ["alpha", "beta"],
        "ignorePaths": ["node_modules", { "glob": "/dist/**", "root": "." }],
        "customOption": { "kept": true }
    }))
    .unwrap();

    write_settings(&TokioFs, &uri, &settings).await.unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\n    \"version\": \"0.2\""));

    let read_back = read_settings(&TokioFs, &uri, None).await.unwrap();
    assert_eq!(read_back, settings);
}

#[tokio::test]
async fn test_read_missing_file_returns_defaults() {
    let temp = TempDir::new().unwrap();
    let uri = Url::from_file_path(temp.path().join("missing.json")).unwrap();

    let settings = read_settings(&TokioFs, &uri, None).await.unwrap();
    assert_eq!(settings.version.as_deref(), Some("0.2"));

    let custom = CSpellSettings {
        language: Some("fr".to_string()),
        ..Default::default()
    };
    let settings = read_settings(&TokioFs, &uri, Some(&custom)).await.unwrap();
    assert_eq!(settings, custom);
}

#[tokio::test]
async fn test_add_word_to_empty_word_list() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cspell.json");
    fs::write(&path, r#"{ "words": [] }"#).unwrap();
    let uri = Url::from_file_path(&path).unwrap();

    let updated = add_word_to_settings_and_update(&TokioFs, &uri, "word").await.unwrap();
    assert_eq!(updated.words, Some(strings(&["word"])));

    let again = add_word_to_settings_and_update(&TokioFs, &uri, " word ").await.unwrap();
    assert_eq!(again.words, Some(strings(&["word"])));
}

#[tokio::test]
async fn test_add_word_creates_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".vscode/cspell.json");
    let uri = Url::from_file_path(&path).unwrap();

    add_word_to_settings_and_update(&TokioFs, &uri, "Zeta").await.unwrap();
    add_word_to_settings_and_update(&TokioFs, &uri, "alpha").await.unwrap();

    let settings = read_settings(&TokioFs, &uri, None).await.unwrap();
    assert_eq!(settings.words, Some(strings(&["alpha", "Zeta"])));
    assert_eq!(settings.version.as_deref(), Some("0.2"));
}

#[tokio::test]
async fn test_remove_words_ignores_case() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cspell.json");
    fs::write(&path, r#"{ "words": ["one", "two", "Three", "four"] }"#).unwrap();
    let uri = Url::from_file_path(&path).unwrap();

    let updated = remove_word_from_settings_and_update(&TokioFs, &uri, "three").await.unwrap();
    assert_eq!(updated.words, Some(strings(&["one", "two", "four"])));
}

#[tokio::test]
async fn test_ignore_words_kept_separately() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cspell.jsonc");
    fs::write(&path, "{\n  // words\n  \"words\": [\"keep\"],\n}").unwrap();
    let uri = Url::from_file_path(&path).unwrap();

    let updated = add_ignore_word_to_settings_and_update(&TokioFs, &uri, "todo").await.unwrap();
    assert_eq!(updated.words, Some(strings(&["keep"])));
    assert_eq!(updated.ignore_words, Some(strings(&["todo"])));
}

#[tokio::test]
async fn test_language_ids_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cspell.json");
    fs::write(&path, "{}").unwrap();
    let uri = Url::from_file_path(&path).unwrap();

    let untouched =
        write_add_language_ids_to_settings(&TokioFs, &uri, &strings(&["rust"]), true).await.unwrap();
    assert_eq!(untouched.enabled_language_ids, None);

    let added = write_add_language_ids_to_settings(&TokioFs, &uri, &strings(&["rust", "toml"]), false)
        .await
        .unwrap();
    assert_eq!(added.enabled_language_ids, Some(strings(&["rust", "toml"])));

    let removed =
        remove_language_ids_from_settings_and_update(&TokioFs, &uri, &strings(&["rust", "toml"]))
            .await
            .unwrap();
    assert_eq!(removed.enabled_language_ids, None);
}

#[tokio::test]
async fn test_dynamic_config_is_never_written() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cspell.config.js");
    let uri = Url::from_file_path(&path).unwrap();

    let err = add_word_to_settings_and_update(&TokioFs, &uri, "word").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedUpdateFormat);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_package_json_is_never_written() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("package.json");
    let original = r#"{ "name": "demo", "cspell": { "words": [] } }"#;
    fs::write(&path, original).unwrap();
    let uri = Url::from_file_path(&path).unwrap();

    let err = add_word_to_settings_and_update(&TokioFs, &uri, "word").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedUpdateFormat);
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}
