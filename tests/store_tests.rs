use formguard::error::StoreError;
use formguard::store::{FileStore, KeyValueStore, MemoryStore, ScopedStore};

#[test]
fn memory_store_round_trips_and_overwrites() {
    let store = MemoryStore::new();
    assert!(store.is_empty());
    assert_eq!(store.get("k").unwrap(), None);

    store.set("k", "1").unwrap();
    store.set("k", "2").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("2"));
    assert_eq!(store.len(), 1);
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    {
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("ledger").unwrap(), None);
        store.set("ledger", "[1,2,3]").unwrap();
    }

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.get("ledger").unwrap().as_deref(), Some("[1,2,3]"));
}

#[test]
fn file_store_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(FileStore::open(&path), Err(StoreError::Corrupt(_))));
}

#[test]
fn file_store_reports_write_failures() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("store.json");

    let store = FileStore::open(&path).unwrap();
    assert!(matches!(store.set("k", "v"), Err(StoreError::Io(_))));
}

#[test]
fn scoped_stores_do_not_share_keys() {
    let shared = MemoryStore::new();
    let alice = ScopedStore::new(&shared, "203.0.113.7");
    let bob = ScopedStore::new(&shared, "198.51.100.4");

    alice.set("formguard_submissions", "[1]").unwrap();
    assert_eq!(bob.get("formguard_submissions").unwrap(), None);
    assert_eq!(
        shared.get("203.0.113.7/formguard_submissions").unwrap().as_deref(),
        Some("[1]")
    );
}

#[test]
fn failed_write_leaves_file_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("store.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    let store = FileStore::open(&path).unwrap();
    store.set("k", "v1").unwrap();

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    assert!(matches!(store.set("k", "v2"), Err(StoreError::Io(_))));
    assert!(matches!(store.remove("k"), Err(StoreError::Io(_))));
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v1"));
}

#[test]
fn stores_list_and_remove_keys() {
    let dir = tempfile::tempdir().unwrap();
    let file = FileStore::open(dir.path().join("store.json")).unwrap();
    let memory = MemoryStore::new();
    let stores: [&dyn KeyValueStore; 2] = [&file, &memory];

    for store in stores {
        store.set("a/session", "1").unwrap();
        store.set("a/ledger", "[]").unwrap();
        store.set("b/session", "2").unwrap();

        let mut keys = store.keys("a/").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a/ledger", "a/session"]);

        store.remove("a/ledger").unwrap();
        store.remove("missing").unwrap();
        assert_eq!(store.get("a/ledger").unwrap(), None);
        assert_eq!(store.keys("").unwrap().len(), 2);
    }

    let reopened = FileStore::open(dir.path().join("store.json")).unwrap();
    assert_eq!(reopened.get("a/ledger").unwrap(), None);
    assert_eq!(reopened.get("b/session").unwrap().as_deref(), Some("2"));
}

#[test]
fn scoped_store_lists_its_own_keys() {
    let shared = MemoryStore::new();
    let alice = ScopedStore::new(&shared, "203.0.113.7");
    let bob = ScopedStore::new(&shared, "198.51.100.4");

    alice.set("formguard_session_contact", "1").unwrap();
    alice.set("formguard_submissions", "[1]").unwrap();
    bob.set("formguard_session_contact", "2").unwrap();

    let mut keys = alice.keys("").unwrap();
    keys.sort();
    assert_eq!(keys, vec!["formguard_session_contact", "formguard_submissions"]);

    alice.remove("formguard_session_contact").unwrap();
    assert_eq!(alice.keys("formguard_session_").unwrap(), Vec::<String>::new());
    assert_eq!(bob.get("formguard_session_contact").unwrap().as_deref(), Some("2"));
}
