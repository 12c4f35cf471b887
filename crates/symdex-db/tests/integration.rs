use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use symdex_db::{
    IndexDao, IndexPreferences, IndexStore, RecoveryPolicy, SchemaAction, StoreError,
    SCHEMA_VERSION,
};
use symdex_types::{Route, Service};

fn db_file(state_dir: &Path) -> std::path::PathBuf {
    state_dir.join("symfonymodel.db")
}

/// Writes a database that has the base table but a foreign schema version.
fn write_outdated_database(state_dir: &Path) {
    let conn = Connection::open(db_file(state_dir)).expect("should create outdated db");
    conn.execute_batch(
        "CREATE TABLE services (id INTEGER PRIMARY KEY, name TEXT);
         CREATE TABLE legacy_marker (id INTEGER PRIMARY KEY);
         PRAGMA user_version = 99;",
    )
    .expect("should write outdated schema");
}

fn write_garbage(state_dir: &Path) {
    std::fs::write(db_file(state_dir), vec![0xa5_u8; 8192]).expect("should write garbage");
}

fn table_exists(store: &IndexStore, table: &str) -> bool {
    let conn = store.connection().expect("should get connection");
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [table],
        |row| row.get(0),
    )
    .expect("should query sqlite_master")
}

#[test]
fn reopening_a_compatible_database_keeps_its_rows() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let prefs = IndexPreferences::default();

    {
        let store = IndexStore::open(dir.path(), &prefs).expect("first open should succeed");
        let conn = store.connection().expect("should get connection");
        store
            .services()
            .insert(
                &conn,
                &Service {
                    id: "router".to_string(),
                    class_name: Some("Symfony\\Component\\Routing\\Router".to_string()),
                    public: true,
                    tags: vec![],
                    path: "app/config/services.yml".to_string(),
                },
            )
            .expect("insert should succeed");
        drop(conn);
        store.dispose();
    }

    let store = IndexStore::open(dir.path(), &prefs).expect("second open should succeed");
    assert_eq!(store.open_report().schema, SchemaAction::Reused);
    assert_eq!(store.open_report().attempts, 1);

    let conn = store.connection().expect("should get connection");
    let router = store
        .services()
        .find_by_id(&conn, "router")
        .expect("query should succeed");
    assert!(router.is_some(), "row should survive a reopen");
}

#[test]
fn incompatible_schema_triggers_rebuild() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    write_outdated_database(dir.path());

    let store =
        IndexStore::open(dir.path(), &IndexPreferences::default()).expect("open should succeed");

    assert_eq!(store.open_report().schema, SchemaAction::Rebuilt);
    assert!(!table_exists(&store, "legacy_marker"), "old tables should be gone");
    assert_eq!(
        store.summary().expect("summary should succeed").schema_version,
        SCHEMA_VERSION
    );
}

#[test]
fn preserve_policy_keeps_a_backup_of_the_incompatible_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    write_outdated_database(dir.path());

    let prefs = IndexPreferences {
        recovery: RecoveryPolicy::Preserve,
        ..IndexPreferences::default()
    };
    let store = IndexStore::open(dir.path(), &prefs).expect("open should succeed");
    assert_eq!(store.open_report().schema, SchemaAction::Rebuilt);

    let backups: Vec<_> = std::fs::read_dir(dir.path())
        .expect("should list state dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("symfonymodel.db.") && name.ends_with(".bak"))
        .collect();
    assert_eq!(backups.len(), 1, "expected one backup, got {backups:?}");

    let backup = Connection::open(dir.path().join(&backups[0])).expect("should open backup");
    let version: i64 = backup
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .expect("should read backup version");
    assert_eq!(version, 99);
}

#[test]
fn fail_policy_refuses_incompatible_database() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    write_outdated_database(dir.path());

    let prefs = IndexPreferences {
        recovery: RecoveryPolicy::Fail,
        ..IndexPreferences::default()
    };
    let err = IndexStore::open(dir.path(), &prefs).expect_err("open should fail");

    match err {
        StoreError::IncompatibleSchema { found, expected } => {
            assert_eq!(found, 99);
            assert_eq!(expected, SCHEMA_VERSION);
        }
        other => panic!("unexpected error type: {other:?}"),
    }

    let conn = Connection::open(db_file(dir.path())).expect("file should still be there");
    let marker: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE name = 'legacy_marker')",
            [],
            |row| row.get(0),
        )
        .expect("should query sqlite_master");
    assert!(marker, "database must not be touched under the fail policy");
}

#[test]
fn corrupted_file_is_deleted_and_open_retried_once() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    write_garbage(dir.path());

    let store =
        IndexStore::open(dir.path(), &IndexPreferences::default()).expect("retry should succeed");

    let report = store.open_report();
    assert_eq!(report.attempts, 2);
    assert_eq!(report.schema, SchemaAction::Initialized);
}

#[test]
fn corrupted_file_exhausts_a_single_attempt() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    write_garbage(dir.path());

    let prefs = IndexPreferences {
        max_open_attempts: 1,
        ..IndexPreferences::default()
    };
    let err = IndexStore::open(dir.path(), &prefs).expect_err("open should give up");

    match err {
        StoreError::OpenExhausted { attempts, source } => {
            assert_eq!(attempts, 1);
            assert!(matches!(*source, StoreError::Database(_)));
        }
        other => panic!("unexpected error type: {other:?}"),
    }
    assert!(
        !db_file(dir.path()).exists(),
        "corrupted file should be removed even when giving up"
    );
}

#[test]
fn corrupted_file_is_left_alone_under_fail_policy() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    write_garbage(dir.path());

    let prefs = IndexPreferences {
        recovery: RecoveryPolicy::Fail,
        ..IndexPreferences::default()
    };
    let err = IndexStore::open(dir.path(), &prefs).expect_err("open should fail");

    assert!(matches!(err, StoreError::Database(_)));
    assert_eq!(
        std::fs::read(db_file(dir.path())).expect("file should remain"),
        vec![0xa5_u8; 8192]
    );
}

#[test]
fn concurrent_writers_share_the_pool() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let prefs = IndexPreferences {
        pool_max_size: 4,
        ..IndexPreferences::default()
    };
    let store = Arc::new(IndexStore::open(dir.path(), &prefs).expect("open should succeed"));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let conn = store.connection().expect("should get connection");
                store
                    .routes()
                    .insert(
                        &conn,
                        &Route {
                            name: format!("route_{i}"),
                            pattern: format!("/r/{i}"),
                            controller: None,
                            path: "routing.yml".to_string(),
                        },
                    )
                    .expect("insert should succeed");
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer thread should not panic");
    }

    let conn = store.connection().expect("should get connection");
    assert_eq!(store.routes().count(&conn).expect("count should succeed"), 8);
}
