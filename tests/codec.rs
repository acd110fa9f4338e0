use rowdb::error::DbError;
use rowdb::storage::row::{Row, EMAIL_MAX, ROW_SIZE, USERNAME_MAX};

#[test]
fn encode_decode_round_trip() {
    let row = Row::new(42, "alice", "alice@example.com");
    let record = row.encode().unwrap();
    assert_eq!(record.len(), ROW_SIZE);
    assert_eq!(Row::decode(&record).unwrap(), row);
}

#[test]
fn empty_text_columns_round_trip() {
    let row = Row::new(0, "", "");
    let record = row.encode().unwrap();
    assert_eq!(Row::decode(&record).unwrap(), row);
}

#[test]
fn username_at_limit_round_trips() {
    let row = Row::new(1, "u".repeat(USERNAME_MAX), "u@example.com");
    let record = row.encode().unwrap();
    assert_eq!(Row::decode(&record).unwrap(), row);
}

#[test]
fn username_one_byte_over_is_rejected() {
    let row = Row::new(1, "u".repeat(USERNAME_MAX + 1), "u@example.com");
    assert!(matches!(
        row.encode(),
        Err(DbError::ValueTooLarge { column: "username", .. })
    ));
}

#[test]
fn email_at_limit_round_trips() {
    let row = Row::new(2, "bob", "e".repeat(EMAIL_MAX));
    let record = row.encode().unwrap();
    assert_eq!(Row::decode(&record).unwrap(), row);
}

#[test]
fn email_one_byte_over_is_rejected() {
    let row = Row::new(2, "bob", "e".repeat(EMAIL_MAX + 1));
    assert!(matches!(
        row.encode(),
        Err(DbError::ValueTooLarge { column: "email", .. })
    ));
}

#[test]
fn negative_id_is_rejected() {
    let row = Row::new(-1, "carol", "carol@example.com");
    assert!(matches!(row.encode(), Err(DbError::NegativeKey(-1))));
}

#[test]
fn id_beyond_u32_is_rejected() {
    let row = Row::new(u32::MAX as i64 + 1, "dave", "dave@example.com");
    assert!(matches!(
        row.encode(),
        Err(DbError::ValueTooLarge { column: "id", .. })
    ));
}

#[test]
fn decode_rejects_wrong_record_size() {
    assert!(matches!(
        Row::decode(&[0u8; ROW_SIZE - 1]),
        Err(DbError::Corrupted(_))
    ));
}
