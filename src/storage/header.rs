//! File header stored in page 0. The root page index lives here so the tree
//! can be recovered after reopening the file; page 0 is never a tree node.

use crate::error::{DbError, DbResult};
use crate::storage::page::PAGE_SIZE;

/// Magic bytes identifying a rowdb database file.
pub const MAGIC: &[u8; 8] = b"rowdb\0\0\0";

/// On-disk format version.
pub const FORMAT_VERSION: u32 = 1;

const VERSION_OFFSET: usize = 8;
const ROOT_PAGE_OFFSET: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Page number of the tree's root node.
    pub root_page: u32,
}

impl FileHeader {
    pub fn new(root_page: u32) -> Self {
        FileHeader { root_page }
    }

    /// Serialize the header into page 0's buffer.
    pub fn write_to(&self, page: &mut [u8; PAGE_SIZE]) {
        page[..8].copy_from_slice(MAGIC);
        page[VERSION_OFFSET..VERSION_OFFSET + 4].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        page[ROOT_PAGE_OFFSET..ROOT_PAGE_OFFSET + 4].copy_from_slice(&self.root_page.to_le_bytes());
    }

    /// Deserialize the header from page 0's buffer.
    pub fn read_from(page: &[u8; PAGE_SIZE]) -> DbResult<FileHeader> {
        if &page[..8] != MAGIC {
            return Err(DbError::Corrupted("not a rowdb database file".into()));
        }
        let version = u32::from_le_bytes(page[VERSION_OFFSET..VERSION_OFFSET + 4].try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(DbError::Corrupted(format!(
                "unsupported format version {version} (expected {FORMAT_VERSION})"
            )));
        }
        let root_page =
            u32::from_le_bytes(page[ROOT_PAGE_OFFSET..ROOT_PAGE_OFFSET + 4].try_into().unwrap());
        if root_page == 0 {
            return Err(DbError::Corrupted("header names page 0 as the tree root".into()));
        }
        Ok(FileHeader { root_page })
    }
}
