use cardly_database::*;

const FIRST: Migration = Migration::new(
    "cards",
    "0001",
    "DEFINE TABLE IF NOT EXISTS card SCHEMALESS;
     DEFINE INDEX IF NOT EXISTS card_uid ON card FIELDS uid UNIQUE;",
);

const SECOND: Migration =
    Migration::new("cards", "0002", "DEFINE FIELD IF NOT EXISTS slug ON card TYPE string;");

#[tokio::test]
async fn connect_in_memory_and_health_check() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "health")
        .init()
        .await
        .expect("connect to mem://");

    db.health().await.expect("health check");
}

#[tokio::test]
async fn missing_parameters_fail_validation() {
    let err = Database::builder().init().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));

    let err = Database::builder().url("mem://").init().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));
}

#[tokio::test]
async fn migrations_are_recorded_once() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "migrations")
        .migrations([FIRST, SECOND])
        .init()
        .await
        .expect("apply migrations");

    let count: Option<i64> = db
        .query("RETURN array::len(SELECT * FROM migration)")
        .await
        .expect("query")
        .take(0)
        .expect("take");
    assert_eq!(count, Some(2));

    db.query("CREATE card CONTENT { uid: 'abc' }").await.expect("insert").check().expect("ok");
    let duplicate = db.query("CREATE card CONTENT { uid: 'abc' }").await.expect("query").check();
    assert!(duplicate.is_err(), "unique index from the migration is active");
}

#[tokio::test]
async fn rerun_skips_applied_migrations() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "rerun")
        .migrations([FIRST])
        .init()
        .await
        .expect("first run");

    let report = db.migrate(&[FIRST, SECOND]).await.expect("second run");
    assert_eq!(report.skipped, vec![FIRST]);
    assert_eq!(report.applied, vec![SECOND]);
}

#[tokio::test]
async fn edited_migration_aborts() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "tamper")
        .migrations([FIRST])
        .init()
        .await
        .expect("first run");

    db.query("UPDATE migration SET checksum = 'tampered' WHERE slice = 'cards'")
        .await
        .expect("update")
        .check()
        .expect("ok");

    let err = db.migrate(&[FIRST]).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Migration { .. }));
}

#[tokio::test]
async fn failing_script_is_a_migration_error() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "broken")
        .init()
        .await
        .expect("connect");

    let broken = Migration::new("cards", "0009", "THIS IS NOT SURREALQL;");
    let err = db.migrate(&[broken]).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Migration { .. } | DatabaseError::Surreal { .. }));
}
