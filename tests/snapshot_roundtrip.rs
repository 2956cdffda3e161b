use snapdb::{Engine, Output, Value};

fn select(engine: &mut Engine, sql: &str) -> snapdb::ResultSet {
    match engine.execute(sql).unwrap() {
        Output::Rows(rs) => rs,
        other => panic!("expected rows, got {:?}", other),
    }
}

#[test]
fn test_save_and_reopen_preserves_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");

    let mut engine = Engine::new();
    engine
        .execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT UNIQUE)")
        .unwrap();
    engine
        .execute("CREATE TABLE tasks (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL, title TEXT NOT NULL)")
        .unwrap();
    engine
        .execute("INSERT INTO users (name, email) VALUES ('Alice', 'alice@x.com')")
        .unwrap();
    engine
        .execute("INSERT INTO tasks (user_id, title) VALUES (1, 'write docs')")
        .unwrap();
    engine.save(&path).unwrap();

    let mut reopened = Engine::open(&path);

    // Table creation order survives the round trip.
    assert_eq!(reopened.database().table_names(), vec!["users", "tasks"]);

    // Rows and joins behave exactly as before the save.
    let result = select(
        &mut reopened,
        "SELECT users.name, tasks.title FROM tasks JOIN users ON tasks.user_id = users.id",
    );
    assert_eq!(result.len(), 1);
    assert_eq!(result.rows[0][0], Value::Text("Alice".into()));

    // The rebuilt unique index still enforces constraints.
    let err = reopened
        .execute("INSERT INTO users (name, email) VALUES ('Eve', 'alice@x.com')")
        .unwrap_err();
    assert!(matches!(err, snapdb::Error::UniqueViolation { .. }));
}

#[test]
fn test_row_id_counter_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");

    let mut engine = Engine::new();
    engine
        .execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
        .unwrap();
    engine
        .execute("INSERT INTO users (name) VALUES ('a')")
        .unwrap();
    engine
        .execute("INSERT INTO users (name) VALUES ('b')")
        .unwrap();
    // Delete the highest row; its id must stay burned after reload.
    engine.execute("DELETE FROM users WHERE id = 2").unwrap();
    engine.save(&path).unwrap();

    let mut reopened = Engine::open(&path);
    let output = reopened
        .execute("INSERT INTO users (name) VALUES ('c')")
        .unwrap();
    assert_eq!(
        output,
        Output::Affected {
            count: 1,
            last_insert_id: Some(3)
        }
    );
}

#[test]
fn test_missing_snapshot_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(dir.path().join("never-written.json"));
    assert!(engine.database().table_names().is_empty());
}

#[test]
fn test_corrupt_snapshot_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, "not a snapshot").unwrap();

    let engine = Engine::open(&path);
    assert!(engine.database().table_names().is_empty());
}

#[test]
fn test_save_overwrites_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");

    let mut engine = Engine::new();
    engine
        .execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
        .unwrap();
    engine
        .execute("INSERT INTO users (name) VALUES ('a')")
        .unwrap();
    engine.save(&path).unwrap();

    engine.execute("DELETE FROM users WHERE id = 1").unwrap();
    engine.save(&path).unwrap();

    let mut reopened = Engine::open(&path);
    assert!(select(&mut reopened, "SELECT * FROM users").is_empty());
}
