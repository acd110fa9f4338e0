use rowdb::error::DbResult;
use rowdb::storage::row::Row;
use rowdb::table::Table;
use tempfile::TempDir;

fn open_table(dir: &TempDir) -> Table {
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
fn empty_table_yields_no_rows() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);
    assert_eq!(ids(&mut table), Vec::<i64>::new());
}

#[test]
fn shuffled_inserts_scan_in_key_order() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);

    // 61 and 97 are coprime, so this visits every key in 0..97 exactly once
    // in a scrambled order.
    for i in 0..97 {
        table.insert(&row((i * 61) % 97)).unwrap();
    }

    assert_eq!(ids(&mut table), (0..97).collect::<Vec<i64>>());
}

#[test]
fn scan_is_restartable() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);
    for i in [5, 1, 3] {
        table.insert(&row(i)).unwrap();
    }

    assert_eq!(ids(&mut table), vec![1, 3, 5]);
    assert_eq!(ids(&mut table), vec![1, 3, 5]);
}

#[test]
fn exhausted_scan_keeps_yielding_nothing() {
    let dir = TempDir::new().unwrap();
    let mut table = open_table(&dir);
    for i in 0..20 {
        table.insert(&row(i)).unwrap();
    }

    let mut scan = table.select_all().unwrap();
    assert_eq!(scan.by_ref().count(), 20);
    assert!(scan.next().is_none());
    assert!(scan.next().is_none());
}
