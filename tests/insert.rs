use rowdb::error::{DbError, DbResult};
use rowdb::storage::row::Row;
use rowdb::table::Table;
use tempfile::TempDir;

fn open_table(dir: &TempDir) -> Table {
    let _ = env_logger::builder().is_test(true).try_init();
    Table::open(dir.path().join("test.rowdb")).unwrap()
}

fn all_rows(table: &mut Table) -> Vec<Row> {
    table
        .select_all()
        .unwrap()
        .collect::<DbResult<Vec<Row>>>()
        .unwrap()
}

#[test]
fn out_of_order_inserts_scan_sorted() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);

    table.insert(&Row::new(1, "a", "a@b.com")).unwrap();
    table.insert(&Row::new(3, "c", "c@d.com")).unwrap();
    table.insert(&Row::new(2, "b", "b@d.com")).unwrap();

    let rows = all_rows(&mut table);
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(rows[1].username, "b");
    assert_eq!(rows[1].email, "b@d.com");
}

#[test]
fn duplicate_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);

    table.insert(&Row::new(2, "b", "b@d.com")).unwrap();
    let res = table.insert(&Row::new(2, "x", "x@y.com"));
    assert!(matches!(res, Err(DbError::DuplicateKey(2))));
}

#[test]
fn duplicate_insert_leaves_stored_row_unchanged() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);

    table.insert(&Row::new(7, "original", "original@example.com")).unwrap();
    assert!(table.insert(&Row::new(7, "imposter", "imposter@example.com")).is_err());

    let rows = all_rows(&mut table);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].username, "original");
    assert_eq!(rows[0].email, "original@example.com");
}

#[test]
fn validation_failure_leaves_table_unchanged() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);

    table.insert(&Row::new(1, "ok", "ok@example.com")).unwrap();
    let res = table.insert(&Row::new(2, "u".repeat(33), "too@long.com"));
    assert!(matches!(res, Err(DbError::ValueTooLarge { .. })));
    let res = table.insert(&Row::new(-5, "neg", "neg@example.com"));
    assert!(matches!(res, Err(DbError::NegativeKey(-5))));

    let rows = all_rows(&mut table);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 1);
}
