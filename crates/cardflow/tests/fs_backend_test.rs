use cardflow::settings::{DisplaySettings, SettingsPatch, SettingsStore};
use cardflow::store::backend::StateBackend;
use cardflow::store::fs_backend::FsStateBackend;
use cardflow::store::{self, SETTINGS_KEY};
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, FsStateBackend) {
    let dir = TempDir::new().unwrap();
    let backend = FsStateBackend::new(dir.path().join("state"));
    (dir, backend)
}

#[test]
fn test_missing_key_is_none() {
    let (_dir, backend) = setup();
    assert_eq!(backend.load("settings").unwrap(), None);
}

#[test]
fn test_save_creates_root_and_round_trips() {
    let (_dir, backend) = setup();
    backend.save("recent-directories", r#"["/a"]"#).unwrap();

    assert!(backend.root().join("recent-directories.json").exists());
    assert_eq!(
        backend.load("recent-directories").unwrap().as_deref(),
        Some(r#"["/a"]"#)
    );
}

#[test]
fn test_atomic_write_leaves_no_tmp_files() {
    let (_dir, backend) = setup();
    backend.save("settings", "{}").unwrap();
    backend.save("settings", r#"{"cardWidth":300}"#).unwrap();

    for entry in fs::read_dir(backend.root()).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
    }
}

#[test]
fn test_remove_is_idempotent() {
    let (_dir, backend) = setup();
    backend.save("last-directory", r#""/notes""#).unwrap();
    backend.remove("last-directory").unwrap();
    backend.remove("last-directory").unwrap();
    assert_eq!(backend.load("last-directory").unwrap(), None);
}

#[test]
fn test_settings_survive_restart() {
    let (dir, backend) = setup();
    let mut settings = SettingsStore::load(&backend);
    settings.patch(
        &backend,
        &SettingsPatch {
            title_lines: Some(3),
            ..Default::default()
        },
    );

    let reopened = FsStateBackend::new(dir.path().join("state"));
    let loaded = SettingsStore::load(&reopened);
    assert_eq!(loaded.current().title_lines, 3);
    assert_eq!(loaded.current().card_width, 280);
}

#[test]
fn test_hand_edited_settings_degrade_per_field() {
    let (_dir, backend) = setup();
    backend
        .save(
            SETTINGS_KEY,
            r#"{"cardWidth":100,"titleLines":"three","language":"en","futureFlag":true}"#,
        )
        .unwrap();

    let loaded = *SettingsStore::load(&backend).current();
    assert_eq!(loaded.card_width, 200);
    assert_eq!(loaded.title_lines, DisplaySettings::default().title_lines);
    assert_eq!(loaded.language.to_string(), "en");
}

#[test]
fn test_corrupt_file_reads_as_absent() {
    let (_dir, backend) = setup();
    backend.save("last-directory", "not json").unwrap();
    assert_eq!(store::load_last_directory(&backend), None);
}
