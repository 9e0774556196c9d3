use super::*;

#[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
struct Draft {
    title: String,
    count: u32,
}

fn draft() -> Draft {
    Draft { title: "hello".into(), count: 3 }
}

// =============================================================
// FileStore
// =============================================================

#[test]
fn file_store_load_missing_key_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    assert_eq!(store.load(USER_KEY).unwrap(), None);
}

#[test]
fn file_store_save_creates_directory_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = FileStore::new(&nested);
    store.save(USER_KEY, "{}").unwrap();
    assert!(nested.join("user.json").is_file());
    assert!(!nested.join("user.json.tmp").exists());
    assert_eq!(store.load(USER_KEY).unwrap().as_deref(), Some("{}"));
}

#[test]
fn file_store_save_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    store.save(COOKIES_KEY, "a=1").unwrap();
    store.save(COOKIES_KEY, "a=2").unwrap();
    assert_eq!(store.load(COOKIES_KEY).unwrap().as_deref(), Some("a=2"));
}

#[test]
fn file_store_concurrent_saves_never_share_a_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let values: Vec<String> = (0..8).map(|n| format!("{{\"writer\":{n}}}")).collect();
    std::thread::scope(|scope| {
        for value in &values {
            let store = FileStore::new(dir.path());
            scope.spawn(move || {
                for _ in 0..20 {
                    store.save(USER_KEY, value).unwrap();
                }
            });
        }
    });

    let stored = FileStore::new(dir.path()).load(USER_KEY).unwrap().unwrap();
    assert!(values.contains(&stored));
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .filter(|name| name != "user.json")
        .collect();
    assert!(leftovers.is_empty(), "stray files: {leftovers:?}");
}

#[test]
fn file_store_remove_missing_key_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    store.remove(USER_KEY).unwrap();
}

#[test]
fn file_store_remove_deletes_value() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    store.save(USER_KEY, "{}").unwrap();
    store.remove(USER_KEY).unwrap();
    assert_eq!(store.load(USER_KEY).unwrap(), None);
}

#[test]
fn file_store_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    assert!(matches!(store.save("../escape", "x"), Err(StorageError::InvalidKey(_))));
    assert!(matches!(store.load(""), Err(StorageError::InvalidKey(_))));
}

// =============================================================
// MemoryStore
// =============================================================

#[test]
fn memory_store_round_trips_and_removes() {
    let store = MemoryStore::new();
    store.save(USER_KEY, "x").unwrap();
    assert!(store.contains(USER_KEY));
    assert_eq!(store.load(USER_KEY).unwrap().as_deref(), Some("x"));
    store.remove(USER_KEY).unwrap();
    assert!(!store.contains(USER_KEY));
}

// =============================================================
// JSON helpers
// =============================================================

#[test]
fn save_json_then_load_json_returns_value() {
    let store = MemoryStore::new();
    save_json(&store, "draft", &draft());
    assert_eq!(load_json::<Draft>(&store, "draft"), Some(draft()));
}

#[test]
fn load_json_missing_key_is_none() {
    let store = MemoryStore::new();
    assert_eq!(load_json::<Draft>(&store, "draft"), None);
}

#[test]
fn load_json_discards_corrupt_value() {
    let store = MemoryStore::new();
    store.save("draft", "{not json").unwrap();
    assert_eq!(load_json::<Draft>(&store, "draft"), None);
    assert!(!store.contains("draft"));
}

#[test]
fn load_json_discards_value_of_wrong_shape() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    store.save("draft", r#"{"title":"x"}"#).unwrap();
    assert_eq!(load_json::<Draft>(&store, "draft"), None);
    assert_eq!(store.load("draft").unwrap(), None);
}
