use rowdb::error::DbResult;
use rowdb::storage::page::{INTERNAL_MAX_KEYS, LEAF_MAX_CELLS};
use rowdb::storage::row::Row;
use rowdb::table::Table;
use tempfile::TempDir;

fn open_table(dir: &TempDir) -> Table {
    let _ = env_logger::builder().is_test(true).try_init();
    Table::open(dir.path().join("test.rowdb")).unwrap()
}

fn row(id: i64) -> Row {
    Row::new(id, format!("user{id}"), format!("user{id}@example.com"))
}

fn ids(table: &mut Table) -> Vec<i64> {
    table
        .select_all()
        .unwrap()
        .map(|r| r.map(|row| row.id))
        .collect::<DbResult<Vec<i64>>>()
        .unwrap()
}

#[test]
fn ascending_inserts_force_leaf_splits() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);

    // Three leaves' worth of rows guarantees at least two leaf splits.
    let n = (LEAF_MAX_CELLS * 3) as i64;
    for i in 0..n {
        table.insert(&row(i)).unwrap();
    }

    assert_eq!(ids(&mut table), (0..n).collect::<Vec<i64>>());
}

#[test]
fn descending_inserts_force_internal_splits() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);

    // Enough rows that the internal root itself must split, growing the tree
    // to three levels.
    let n = (LEAF_MAX_CELLS * (INTERNAL_MAX_KEYS + 2) * 3) as i64;
    for i in (0..n).rev() {
        table.insert(&row(i)).unwrap();
    }

    assert_eq!(ids(&mut table), (0..n).collect::<Vec<i64>>());
}

#[test]
fn interleaved_inserts_keep_every_key_exactly_once() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);

    for i in (0..100).step_by(2) {
        table.insert(&row(i)).unwrap();
    }
    for i in (1..100).step_by(2) {
        table.insert(&row(i)).unwrap();
    }

    assert_eq!(ids(&mut table), (0..100).collect::<Vec<i64>>());
}

#[test]
fn duplicates_still_detected_after_splits() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);

    for i in 0..60 {
        table.insert(&row(i)).unwrap();
    }
    for i in [0, 13, 14, 29, 59] {
        assert!(table.insert(&row(i)).is_err(), "key {i} accepted twice");
    }
    assert_eq!(ids(&mut table).len(), 60);
}

#[test]
fn rows_survive_splits_intact() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);

    for i in 0..50 {
        table.insert(&row(i)).unwrap();
    }

    let rows = table
        .select_all()
        .unwrap()
        .collect::<DbResult<Vec<Row>>>()
        .unwrap();
    for (i, r) in rows.iter().enumerate() {
        assert_eq!(r, &row(i as i64));
    }
}
