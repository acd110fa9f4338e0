use crate::storage::row::ROW_SIZE;

// ┌─────────────────────────────────────────────────────────────────────────┐
// │ Offset │ Length │ Description                                           │
// │────────┼────────┼───────────────────────────────────────────────────────│
// │   0    │   1    │ NODE_TYPE (0 = internal, 1 = leaf)                    │
// │   1    │   1    │ IS_ROOT   (0 = false, 1 = true)                       │
// │   2    │   4    │ PARENT_PAGE (u32): page number of parent (0 if none)  │
// │   6    │   2    │ CELL_COUNT: number of cells in this node (u16)        │
// │────────┼────────┼───────────────────────────────────────────────────────│
// │ Leaf only:                                                              │
// │   8    │   4    │ NEXT_LEAF (u32): right sibling page (0 = none)        │
// │   12   │   1    │ IS_RIGHTMOST (0 = false, 1 = true)                    │
// │   13   │   3    │ reserved                                              │
// │   16   │  ...   │ cells: [key u32][row bytes ROW_SIZE], sorted by key   │
// │────────┼────────┼───────────────────────────────────────────────────────│
// │ Internal only:                                                          │
// │   8    │   4    │ leftmost child page (u32)                             │
// │   12   │  ...   │ pairs: [separator key u32][child page u32]            │
// └─────────────────────────────────────────────────────────────────────────┘

pub const PAGE_SIZE: usize = 4096;

pub const NODE_TYPE_OFFSET: usize = 0;
pub const IS_ROOT_OFFSET: usize = 1;
pub const PARENT_PAGE_OFFSET: usize = 2;
pub const CELL_COUNT_OFFSET: usize = 6;
pub const HEADER_SIZE: usize = 8;

pub const NODE_INTERNAL: u8 = 0;
pub const NODE_LEAF: u8 = 1;

pub const NEXT_LEAF_OFFSET: usize = 8;
pub const IS_RIGHTMOST_OFFSET: usize = 12;
pub const LEAF_HEADER_SIZE: usize = 16;

/// One leaf cell: 4-byte key followed by the encoded row.
pub const LEAF_CELL_SIZE: usize = 4 + ROW_SIZE;
pub const LEAF_MAX_CELLS: usize = (PAGE_SIZE - LEAF_HEADER_SIZE) / LEAF_CELL_SIZE;

/// Separator budget per internal node. Kept small so multi-level splits are
/// reachable within the page budget; a 4 KiB page could hold far more.
pub const INTERNAL_MAX_KEYS: usize = 3;

fn read_u32(page: &[u8; PAGE_SIZE], offset: usize) -> u32 {
    u32::from_le_bytes(page[offset..offset + 4].try_into().unwrap())
}

fn write_u32(page: &mut [u8; PAGE_SIZE], offset: usize, value: u32) {
    page[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Given a raw page buffer, read its node type (internal vs. leaf).
pub fn get_node_type(page: &[u8; PAGE_SIZE]) -> u8 {
    page[NODE_TYPE_OFFSET]
}

/// Set the node type (internal=0, leaf=1).
pub fn set_node_type(page: &mut [u8; PAGE_SIZE], node_type: u8) {
    page[NODE_TYPE_OFFSET] = node_type;
}

/// Read the "is_root" flag.
pub fn get_is_root(page: &[u8; PAGE_SIZE]) -> bool {
    page[IS_ROOT_OFFSET] != 0
}

/// Set or clear the "is_root" flag.
pub fn set_is_root(page: &mut [u8; PAGE_SIZE], is_root: bool) {
    page[IS_ROOT_OFFSET] = if is_root { 1 } else { 0 };
}

/// Read the parent page number (u32).
pub fn get_parent(page: &[u8; PAGE_SIZE]) -> u32 {
    read_u32(page, PARENT_PAGE_OFFSET)
}

/// Set the parent page number (u32).
pub fn set_parent(page: &mut [u8; PAGE_SIZE], parent: u32) {
    write_u32(page, PARENT_PAGE_OFFSET, parent);
}

/// Read the number of cells in this node (u16).
pub fn get_cell_count(page: &[u8; PAGE_SIZE]) -> u16 {
    u16::from_le_bytes(page[CELL_COUNT_OFFSET..CELL_COUNT_OFFSET + 2].try_into().unwrap())
}

/// Set the number of cells (u16).
pub fn set_cell_count(page: &mut [u8; PAGE_SIZE], count: u16) {
    page[CELL_COUNT_OFFSET..CELL_COUNT_OFFSET + 2].copy_from_slice(&count.to_le_bytes());
}

/// Read a leaf's right-sibling page number (0 = no sibling).
pub fn get_next_leaf(page: &[u8; PAGE_SIZE]) -> u32 {
    read_u32(page, NEXT_LEAF_OFFSET)
}

pub fn set_next_leaf(page: &mut [u8; PAGE_SIZE], next: u32) {
    write_u32(page, NEXT_LEAF_OFFSET, next);
}

/// Read the flag marking the tree's rightmost leaf.
pub fn get_is_rightmost(page: &[u8; PAGE_SIZE]) -> bool {
    page[IS_RIGHTMOST_OFFSET] != 0
}

pub fn set_is_rightmost(page: &mut [u8; PAGE_SIZE], rightmost: bool) {
    page[IS_RIGHTMOST_OFFSET] = if rightmost { 1 } else { 0 };
}

fn leaf_cell_offset(cell: usize) -> usize {
    LEAF_HEADER_SIZE + cell * LEAF_CELL_SIZE
}

/// Read the key of leaf cell `cell`.
pub fn leaf_key(page: &[u8; PAGE_SIZE], cell: usize) -> u32 {
    read_u32(page, leaf_cell_offset(cell))
}

/// Borrow the encoded row bytes of leaf cell `cell`.
pub fn leaf_row(page: &[u8; PAGE_SIZE], cell: usize) -> &[u8] {
    let start = leaf_cell_offset(cell) + 4;
    &page[start..start + ROW_SIZE]
}

/// Overwrite leaf cell `cell` with `(key, row)`. `row` must be `ROW_SIZE` bytes.
pub fn set_leaf_cell(page: &mut [u8; PAGE_SIZE], cell: usize, key: u32, row: &[u8]) {
    let offset = leaf_cell_offset(cell);
    write_u32(page, offset, key);
    page[offset + 4..offset + 4 + ROW_SIZE].copy_from_slice(row);
}

// Internal body: [leftmost child][key_0][child_1][key_1][child_2]...
// Child i sits at HEADER_SIZE + 8*i; separator key i at HEADER_SIZE + 4 + 8*i.

/// Read child pointer `i` of an internal node (`i` in `0..=cell_count`).
pub fn internal_child(page: &[u8; PAGE_SIZE], i: usize) -> u32 {
    read_u32(page, HEADER_SIZE + 8 * i)
}

pub fn set_internal_child(page: &mut [u8; PAGE_SIZE], i: usize, child: u32) {
    write_u32(page, HEADER_SIZE + 8 * i, child);
}

/// Read separator key `i` of an internal node (`i` in `0..cell_count`).
pub fn internal_key(page: &[u8; PAGE_SIZE], i: usize) -> u32 {
    read_u32(page, HEADER_SIZE + 4 + 8 * i)
}

pub fn set_internal_key(page: &mut [u8; PAGE_SIZE], i: usize, key: u32) {
    write_u32(page, HEADER_SIZE + 4 + 8 * i, key);
}
