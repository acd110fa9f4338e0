use log::debug;

use crate::error::{DbError, DbResult};
use crate::storage::page::{
    get_cell_count, get_is_rightmost, get_next_leaf, get_node_type, get_parent, internal_child,
    internal_key, leaf_key, leaf_row, set_cell_count, set_internal_child, set_internal_key,
    set_is_rightmost, set_is_root, set_leaf_cell, set_next_leaf, set_node_type, set_parent,
    HEADER_SIZE, INTERNAL_MAX_KEYS, LEAF_HEADER_SIZE, LEAF_MAX_CELLS, NODE_INTERNAL, NODE_LEAF,
};
use crate::storage::pager::Pager;
use crate::storage::row::ROW_SIZE;

/// One leaf entry: the row key plus the encoded row bytes.
#[derive(Debug, Clone)]
pub struct Cell {
    pub key: u32,
    pub row: Vec<u8>,
}

/// Position of a key (or its insertion point) inside a leaf.
#[derive(Debug, Clone, Copy)]
pub struct LeafPos {
    pub page_num: u32,
    pub cell_num: usize,
    /// True if the cell at this position already holds the searched key.
    pub exact: bool,
}

/// A B-tree that can grow to arbitrary height by splitting leaves and internal
/// nodes. Pages with NODE_TYPE=NODE_LEAF store fixed-size row cells sorted by
/// key and are chained left-to-right through next-leaf pointers; pages with
/// NODE_TYPE=NODE_INTERNAL store separator keys and child pointers.
///
/// On insert:
///   1. Descend from the root to the target leaf (binary search at each node).
///   2. A cell with the same key at that position is a duplicate; nothing is
///      written.
///   3. Insert the new cell in sorted position. If the leaf still fits, done.
///   4. If the leaf overflowed, split it:
///        • allocate a new right sibling,
///        • move the upper half of the cells into it,
///        • re-link the leaf chain (the rightmost flag moves with the chain),
///        • push (first key of right half, new page) into the parent.
///   5. A parent that overflows splits the same way, recursively. Splitting
///      the root allocates a fresh internal root, so the tree grows by one
///      level and all leaves stay at equal depth.
pub struct BTree<'a> {
    root_page: u32,
    pager: &'a mut Pager,
}

impl<'a> BTree<'a> {
    /// Bind an existing tree rooted at `root_page`.
    pub fn open_root(pager: &'a mut Pager, root_page: u32) -> BTree<'a> {
        BTree { root_page, pager }
    }

    /// Allocate and format an empty leaf to serve as the root of a fresh tree.
    /// Returns its page number.
    pub fn initialize_root(pager: &mut Pager) -> DbResult<u32> {
        let root = pager.allocate_page()?;
        debug!("initializing empty leaf root at page {root}");
        let page = pager.get_page(root)?;
        set_node_type(&mut page.data, NODE_LEAF);
        set_is_root(&mut page.data, true);
        set_parent(&mut page.data, 0);
        set_cell_count(&mut page.data, 0);
        set_next_leaf(&mut page.data, 0);
        set_is_rightmost(&mut page.data, true);
        pager.flush_page(root)?;
        Ok(root)
    }

    /// The current root page. Splits can move the root; callers that persist
    /// the root index must re-read it after every insert.
    pub fn root_page(&self) -> u32 {
        self.root_page
    }

    /// Descend from the root to the leaf whose key range contains `key` and
    /// binary-search that leaf for the key's cell or insertion point.
    pub fn find(&mut self, key: u32) -> DbResult<LeafPos> {
        let mut page_num = self.root_page;
        loop {
            let page = self.pager.get_page(page_num)?;
            match get_node_type(&page.data) {
                NODE_LEAF => {
                    let count = get_cell_count(&page.data) as usize;
                    let (mut lo, mut hi) = (0usize, count);
                    while lo < hi {
                        let mid = (lo + hi) / 2;
                        if leaf_key(&page.data, mid) < key {
                            lo = mid + 1;
                        } else {
                            hi = mid;
                        }
                    }
                    let exact = lo < count && leaf_key(&page.data, lo) == key;
                    return Ok(LeafPos { page_num, cell_num: lo, exact });
                }
                NODE_INTERNAL => {
                    let count = get_cell_count(&page.data) as usize;
                    // Ties descend right: the child after separator k holds keys ≥ k.
                    let (mut lo, mut hi) = (0usize, count);
                    while lo < hi {
                        let mid = (lo + hi) / 2;
                        if internal_key(&page.data, mid) <= key {
                            lo = mid + 1;
                        } else {
                            hi = mid;
                        }
                    }
                    let child = internal_child(&page.data, lo);
                    debug!("find: key {key} descends from internal {page_num} to child {child}");
                    page_num = child;
                }
                other => {
                    return Err(DbError::Corrupted(format!(
                        "page {page_num} has unknown node type {other}"
                    )));
                }
            }
        }
    }

    /// Insert `(key, row)` into the tree. `row` must be one encoded record.
    pub fn insert(&mut self, key: u32, row: &[u8]) -> DbResult<()> {
        if row.len() != ROW_SIZE {
            return Err(DbError::Corrupted(format!(
                "row record is {} bytes, expected {ROW_SIZE}",
                row.len()
            )));
        }

        debug!("insert: descending from root {} for key {key}", self.root_page);
        let pos = self.find(key)?;
        if pos.exact {
            return Err(DbError::DuplicateKey(key as i64));
        }

        let mut cells = self.read_leaf_cells(pos.page_num)?;
        cells.insert(pos.cell_num, Cell { key, row: row.to_vec() });

        if cells.len() <= LEAF_MAX_CELLS {
            debug!("insert: key {key} placed in leaf {} at cell {}", pos.page_num, pos.cell_num);
            self.write_leaf_cells(pos.page_num, &cells)
        } else {
            debug!("insert: leaf {} overflowed; splitting", pos.page_num);
            self.split_leaf(pos.page_num, cells)
        }
    }

    /// Split a leaf that has overflowed. `cells` is the full sorted cell list
    /// including the new entry.
    fn split_leaf(&mut self, leaf_page: u32, cells: Vec<Cell>) -> DbResult<()> {
        let split = cells.len() / 2;
        let left = &cells[..split];
        let right = &cells[split..];
        let separator = right[0].key;

        let (old_next, old_rightmost, parent) = {
            let page = self.pager.get_page(leaf_page)?;
            (get_next_leaf(&page.data), get_is_rightmost(&page.data), get_parent(&page.data))
        };

        // Allocate before rewriting anything so a full table leaves the leaf intact.
        let new_leaf = self.pager.allocate_page()?;
        debug!(
            "split_leaf: leaf {leaf_page} → {} + {} cells, new right sibling {new_leaf}, separator {separator}",
            left.len(),
            right.len()
        );

        {
            let page = self.pager.get_page(new_leaf)?;
            set_node_type(&mut page.data, NODE_LEAF);
            set_is_root(&mut page.data, false);
            set_parent(&mut page.data, parent);
            set_cell_count(&mut page.data, 0);
            set_next_leaf(&mut page.data, old_next);
            set_is_rightmost(&mut page.data, old_rightmost);
        }
        self.write_leaf_cells(new_leaf, right)?;

        {
            let page = self.pager.get_page(leaf_page)?;
            set_next_leaf(&mut page.data, new_leaf);
            set_is_rightmost(&mut page.data, false);
        }
        self.write_leaf_cells(leaf_page, left)?;

        self.insert_in_parent(leaf_page, separator, new_leaf)
    }

    /// Insert a new `(separator, new_page)` entry into the parent of `old_page`,
    /// splitting the parent (and so on upward) if it is full. If `old_page` was
    /// the root, a fresh internal root is created and the tree grows a level.
    fn insert_in_parent(&mut self, old_page: u32, separator: u32, new_page: u32) -> DbResult<()> {
        if old_page == self.root_page {
            let new_root = self.pager.allocate_page()?;
            debug!("insert_in_parent: {old_page} was the root; new internal root {new_root}");
            {
                let page = self.pager.get_page(new_root)?;
                page.data.fill(0);
                set_node_type(&mut page.data, NODE_INTERNAL);
                set_is_root(&mut page.data, true);
                set_parent(&mut page.data, 0);
                set_cell_count(&mut page.data, 1);
                set_internal_child(&mut page.data, 0, old_page);
                set_internal_key(&mut page.data, 0, separator);
                set_internal_child(&mut page.data, 1, new_page);
            }
            {
                let page = self.pager.get_page(old_page)?;
                set_is_root(&mut page.data, false);
                set_parent(&mut page.data, new_root);
            }
            {
                let page = self.pager.get_page(new_page)?;
                set_parent(&mut page.data, new_root);
            }
            self.pager.flush_page(new_root)?;
            self.pager.flush_page(old_page)?;
            self.pager.flush_page(new_page)?;
            self.root_page = new_root;
            return Ok(());
        }

        let parent_page = get_parent(&self.pager.get_page(old_page)?.data);
        let (mut keys, mut children) = self.read_internal(parent_page)?;

        let idx = keys.partition_point(|&k| k < separator);
        keys.insert(idx, separator);
        children.insert(idx + 1, new_page);

        {
            let page = self.pager.get_page(new_page)?;
            set_parent(&mut page.data, parent_page);
        }
        self.pager.flush_page(new_page)?;

        if keys.len() <= INTERNAL_MAX_KEYS {
            debug!("insert_in_parent: separator {separator} fits in internal {parent_page}");
            self.write_internal(parent_page, &keys, &children)
        } else {
            debug!("insert_in_parent: internal {parent_page} overflowed; splitting");
            self.split_internal(parent_page, keys, children)
        }
    }

    /// Split an internal node. `keys` and `children` are the full lists after
    /// the separator that overflowed it was inserted. The middle key is pushed
    /// up to the parent rather than kept in either half.
    fn split_internal(&mut self, page_num: u32, keys: Vec<u32>, children: Vec<u32>) -> DbResult<()> {
        let mid = keys.len() / 2;
        let separator = keys[mid];
        let left_keys = &keys[..mid];
        let left_children = &children[..=mid];
        let right_keys = &keys[mid + 1..];
        let right_children = &children[mid + 1..];

        let parent = get_parent(&self.pager.get_page(page_num)?.data);
        let new_internal = self.pager.allocate_page()?;
        debug!(
            "split_internal: internal {page_num} → {}+{} keys, new sibling {new_internal}, pushing up {separator}",
            left_keys.len(),
            right_keys.len()
        );

        {
            let page = self.pager.get_page(new_internal)?;
            page.data.fill(0);
            set_node_type(&mut page.data, NODE_INTERNAL);
            set_is_root(&mut page.data, false);
            set_parent(&mut page.data, parent);
            set_cell_count(&mut page.data, 0);
        }
        self.write_internal(new_internal, right_keys, right_children)?;
        self.write_internal(page_num, left_keys, left_children)?;

        // Children that moved right now hang off the new node.
        for &child in right_children {
            let page = self.pager.get_page(child)?;
            set_parent(&mut page.data, new_internal);
            self.pager.flush_page(child)?;
        }

        self.insert_in_parent(page_num, separator, new_internal)
    }

    /// Start an ordered full scan at the leftmost leaf's first cell.
    pub fn scan(mut self) -> DbResult<Cursor<'a>> {
        let mut page_num = self.root_page;
        loop {
            let page = self.pager.get_page(page_num)?;
            if get_node_type(&page.data) == NODE_LEAF {
                break;
            }
            page_num = internal_child(&page.data, 0);
        }
        // Only an empty root leaf can have zero cells; splits never leave one.
        let end_of_table = {
            let page = self.pager.get_page(page_num)?;
            get_cell_count(&page.data) == 0
        };
        debug!("scan: starting at leftmost leaf {page_num}");
        Ok(Cursor { btree: self, page_num, cell_num: 0, end_of_table })
    }

    /// Read all cells of a leaf page.
    fn read_leaf_cells(&mut self, page_num: u32) -> DbResult<Vec<Cell>> {
        let page = self.pager.get_page(page_num)?;
        if get_node_type(&page.data) != NODE_LEAF {
            return Err(DbError::Corrupted(format!("page {page_num} is not a leaf")));
        }
        let count = get_cell_count(&page.data) as usize;
        let mut cells = Vec::with_capacity(count);
        for i in 0..count {
            cells.push(Cell { key: leaf_key(&page.data, i), row: leaf_row(&page.data, i).to_vec() });
        }
        Ok(cells)
    }

    /// Write a complete sorted cell list into a leaf page and flush it.
    /// Header fields other than the cell count are left as they are.
    fn write_leaf_cells(&mut self, page_num: u32, cells: &[Cell]) -> DbResult<()> {
        if cells.len() > LEAF_MAX_CELLS {
            return Err(DbError::Corrupted(format!(
                "leaf {page_num} cannot hold {} cells",
                cells.len()
            )));
        }
        let page = self.pager.get_page(page_num)?;
        if get_node_type(&page.data) != NODE_LEAF {
            return Err(DbError::Corrupted(format!("page {page_num} is not a leaf")));
        }
        page.data[LEAF_HEADER_SIZE..].fill(0);
        for (i, cell) in cells.iter().enumerate() {
            set_leaf_cell(&mut page.data, i, cell.key, &cell.row);
        }
        set_cell_count(&mut page.data, cells.len() as u16);
        self.pager.flush_page(page_num)
    }

    /// Read all separator keys and child pointers from an internal node.
    /// `children.len() == keys.len() + 1`.
    fn read_internal(&mut self, page_num: u32) -> DbResult<(Vec<u32>, Vec<u32>)> {
        let page = self.pager.get_page(page_num)?;
        if get_node_type(&page.data) != NODE_INTERNAL {
            return Err(DbError::Corrupted(format!("page {page_num} is not an internal node")));
        }
        let count = get_cell_count(&page.data) as usize;
        let mut keys = Vec::with_capacity(count);
        let mut children = Vec::with_capacity(count + 1);
        children.push(internal_child(&page.data, 0));
        for i in 0..count {
            keys.push(internal_key(&page.data, i));
            children.push(internal_child(&page.data, i + 1));
        }
        Ok((keys, children))
    }

    /// Write a complete internal node given `keys` and `children`, and flush it.
    fn write_internal(&mut self, page_num: u32, keys: &[u32], children: &[u32]) -> DbResult<()> {
        if children.len() != keys.len() + 1 {
            return Err(DbError::Corrupted(format!(
                "internal {page_num}: {} children for {} keys",
                children.len(),
                keys.len()
            )));
        }
        if keys.len() > INTERNAL_MAX_KEYS {
            return Err(DbError::Corrupted(format!(
                "internal {page_num} cannot hold {} keys",
                keys.len()
            )));
        }
        let page = self.pager.get_page(page_num)?;
        if get_node_type(&page.data) != NODE_INTERNAL {
            return Err(DbError::Corrupted(format!("page {page_num} is not an internal node")));
        }
        page.data[HEADER_SIZE..].fill(0);
        set_internal_child(&mut page.data, 0, children[0]);
        for i in 0..keys.len() {
            set_internal_key(&mut page.data, i, keys[i]);
            set_internal_child(&mut page.data, i + 1, children[i + 1]);
        }
        set_cell_count(&mut page.data, keys.len() as u16);
        self.pager.flush_page(page_num)
    }
}

/// Ordered traversal position over the leaf chain. Yields every cell exactly
/// once, strictly increasing by key; once exhausted it stays exhausted.
pub struct Cursor<'a> {
    btree: BTree<'a>,
    page_num: u32,
    cell_num: usize,
    end_of_table: bool,
}

impl Iterator for Cursor<'_> {
    type Item = DbResult<Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end_of_table {
            return None;
        }
        let page = match self.btree.pager.get_page(self.page_num) {
            Ok(page) => page,
            Err(e) => {
                self.end_of_table = true;
                return Some(Err(e));
            }
        };
        let count = get_cell_count(&page.data) as usize;
        if self.cell_num >= count {
            self.end_of_table = true;
            return Some(Err(DbError::Corrupted(format!(
                "cursor at cell {} of leaf {} with only {count} cells",
                self.cell_num, self.page_num
            ))));
        }

        let cell = Cell {
            key: leaf_key(&page.data, self.cell_num),
            row: leaf_row(&page.data, self.cell_num).to_vec(),
        };

        self.cell_num += 1;
        if self.cell_num >= count {
            let next = get_next_leaf(&page.data);
            if next == 0 {
                self.end_of_table = true;
            } else {
                self.page_num = next;
                self.cell_num = 0;
            }
        }
        Some(Ok(cell))
    }
}
