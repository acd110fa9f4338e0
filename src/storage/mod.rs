pub mod btree;
pub mod header;
pub mod page;
pub mod pager;
pub mod row;
