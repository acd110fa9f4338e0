use std::path::Path;

use log::debug;

use crate::error::DbResult;
use crate::storage::btree::BTree;
use crate::storage::header::FileHeader;
use crate::storage::pager::Pager;
use crate::storage::row::Row;

/// The single fixed-schema table: a pager bound to the root of its key-ordered
/// tree. All operations take `&mut self`, so one open handle serves exactly
/// one caller at a time.
pub struct Table {
    pager: Pager,
    header: FileHeader,
}

impl Table {
    /// Open (or create) the table stored at `path`.
    ///
    /// A fresh file gets a header page at page 0 and an empty leaf root at
    /// page 1. An existing file must carry a valid header; the root page index
    /// is read from it, never assumed.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Table> {
        let mut pager = Pager::open(path)?;
        let header = if pager.file_length_pages() == 0 {
            debug!("creating new database file");
            let header_page = pager.allocate_page()?;
            debug_assert_eq!(header_page, 0);
            let root = BTree::initialize_root(&mut pager)?;
            let header = FileHeader::new(root);
            let page = pager.get_page(header_page)?;
            header.write_to(&mut page.data);
            pager.flush_page(header_page)?;
            header
        } else {
            let page = pager.get_page(0)?;
            FileHeader::read_from(&page.data)?
        };
        debug!("opened table with root page {}", header.root_page);
        Ok(Table { pager, header })
    }

    /// Insert one row, keyed by its id. Codec and tree failures surface
    /// unchanged; validation happens before any page is touched.
    pub fn insert(&mut self, row: &Row) -> DbResult<()> {
        let record = row.encode()?;
        let mut tree = BTree::open_root(&mut self.pager, self.header.root_page);
        tree.insert(row.id as u32, &record)?;

        let root = tree.root_page();
        if root != self.header.root_page {
            debug!("root moved from {} to {root}", self.header.root_page);
            self.header.root_page = root;
            self.write_header()?;
        }
        Ok(())
    }

    /// Lazily yield every row in strictly increasing key order.
    pub fn select_all(&mut self) -> DbResult<impl Iterator<Item = DbResult<Row>> + '_> {
        let tree = BTree::open_root(&mut self.pager, self.header.root_page);
        Ok(tree.scan()?.map(|cell| cell.and_then(|c| Row::decode(&c.row))))
    }

    /// Flush every dirty page and the header, then release the file.
    pub fn close(mut self) -> DbResult<()> {
        self.flush()
    }

    fn flush(&mut self) -> DbResult<()> {
        self.write_header()?;
        self.pager.flush_all()
    }

    fn write_header(&mut self) -> DbResult<()> {
        let page = self.pager.get_page(0)?;
        self.header.write_to(&mut page.data);
        self.pager.flush_page(0)
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        // close() already flushed if it ran; flushing again is idempotent.
        let _ = self.flush();
    }
}
