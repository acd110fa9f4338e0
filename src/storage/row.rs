use crate::error::{DbError, DbResult};

pub const ID_SIZE: usize = 4;
pub const USERNAME_MAX: usize = 32;
pub const EMAIL_MAX: usize = 255;

/// Size of one encoded row on disk.
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_MAX + EMAIL_MAX;

const USERNAME_OFFSET: usize = ID_SIZE;
const EMAIL_OFFSET: usize = ID_SIZE + USERNAME_MAX;

// ┌──────────────────────────────────────────────────────────────┐
// │ Offset │ Length │ Description                                │
// │────────┼────────┼────────────────────────────────────────────│
// │   0    │   4    │ id (u32, little-endian)                    │
// │   4    │   32   │ username (UTF-8, NUL-padded)               │
// │   36   │  255   │ email (UTF-8, NUL-padded)                  │
// └──────────────────────────────────────────────────────────────┘

/// A single table row. The id doubles as the unique tree key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl Row {
    pub fn new(id: i64, username: impl Into<String>, email: impl Into<String>) -> Self {
        Row { id, username: username.into(), email: email.into() }
    }

    /// Encode this row into its fixed-size on-disk record.
    ///
    /// Validates before any storage is touched: the id must be non-negative
    /// and fit the on-disk u32 key, and the text columns must fit their slots.
    pub fn encode(&self) -> DbResult<[u8; ROW_SIZE]> {
        if self.id < 0 {
            return Err(DbError::NegativeKey(self.id));
        }
        if self.id > u32::MAX as i64 {
            return Err(DbError::ValueTooLarge { column: "id", max: u32::MAX as usize });
        }
        let username = self.username.as_bytes();
        if username.len() > USERNAME_MAX {
            return Err(DbError::ValueTooLarge { column: "username", max: USERNAME_MAX });
        }
        let email = self.email.as_bytes();
        if email.len() > EMAIL_MAX {
            return Err(DbError::ValueTooLarge { column: "email", max: EMAIL_MAX });
        }

        let mut buf = [0u8; ROW_SIZE];
        buf[..ID_SIZE].copy_from_slice(&(self.id as u32).to_le_bytes());
        buf[USERNAME_OFFSET..USERNAME_OFFSET + username.len()].copy_from_slice(username);
        buf[EMAIL_OFFSET..EMAIL_OFFSET + email.len()].copy_from_slice(email);
        Ok(buf)
    }

    /// Decode one on-disk record. Exact inverse of [`Row::encode`] for every
    /// row that `encode` accepts.
    pub fn decode(buf: &[u8]) -> DbResult<Row> {
        if buf.len() != ROW_SIZE {
            return Err(DbError::Corrupted(format!(
                "row record is {} bytes, expected {}",
                buf.len(),
                ROW_SIZE
            )));
        }
        let id = u32::from_le_bytes(buf[..ID_SIZE].try_into().unwrap()) as i64;
        let username = read_padded_text(&buf[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_MAX]);
        let email = read_padded_text(&buf[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_MAX]);
        Ok(Row { id, username, email })
    }
}

/// Read a NUL-padded text column, dropping the padding.
fn read_padded_text(slot: &[u8]) -> String {
    let len = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..len]).into_owned()
}
