use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::error::{DbError, DbResult};
use crate::storage::page::PAGE_SIZE;

/// Hard cap on the number of pages in one database file.
pub const MAX_PAGES: u32 = 100;

/// A single 4 KiB page of data.
pub struct Page {
    pub data: [u8; PAGE_SIZE],
}

impl Page {
    pub fn new() -> Self {
        Page { data: [0; PAGE_SIZE] }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new()
    }
}

/// Pager: manages reading/writing 4 KiB pages from/into the database file,
/// and keeps a simple in-memory cache. Distinguishes pages already on disk
/// from pages newly allocated in memory.
pub struct Pager {
    file: File,

    /// The number of pages that already existed on disk when we opened this file.
    file_length_pages: u32,

    /// The total number of pages that the pager knows about right now
    /// (including any newly allocated ones not yet flushed).
    num_pages: u32,

    /// A very basic cache: `cache[page_num] = Some(Box<Page>)` if that page is loaded.
    cache: Vec<Option<Box<Page>>>,
}

impl Pager {
    /// Open (or create) the database file at `path`.
    /// - `file_length_pages` is set to file_size / PAGE_SIZE.
    /// - `num_pages` is initially the same as `file_length_pages`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let file_len = file.metadata()?.len();
        if file_len % PAGE_SIZE as u64 != 0 {
            return Err(DbError::Corrupted(format!(
                "file length {file_len} is not a whole number of pages"
            )));
        }
        let file_length_pages = (file_len / PAGE_SIZE as u64) as u32;
        debug!("opened database file with {file_length_pages} pages on disk");

        Ok(Pager {
            file,
            file_length_pages,
            num_pages: file_length_pages,
            cache: Vec::new(),
        })
    }

    /// Return a mutable reference to the requested page, loading it from disk
    /// if it already existed there. Newly allocated pages start zeroed.
    ///
    /// Asking for a page that was never allocated is a caller bug and reports
    /// as corruption rather than silently growing the file.
    pub fn get_page(&mut self, page_num: u32) -> DbResult<&mut Page> {
        if page_num >= self.num_pages {
            return Err(DbError::Corrupted(format!(
                "page {page_num} is out of range ({} pages allocated)",
                self.num_pages
            )));
        }

        // Ensure our cache vector is large enough.
        if self.cache.len() <= page_num as usize {
            self.cache.resize_with(page_num as usize + 1, || None);
        }

        // If not already in cache, create a new Page and load from disk if needed.
        if self.cache[page_num as usize].is_none() {
            // Always start with a zeroed page.
            let mut page = Box::new(Page::new());

            // Only read from disk if this page existed when we opened the file.
            if page_num < self.file_length_pages {
                let offset = (page_num as u64) * (PAGE_SIZE as u64);
                self.file.seek(SeekFrom::Start(offset))?;
                self.file.read_exact(&mut page.data)?;
            }
            self.cache[page_num as usize] = Some(page);
        }

        // Safe to unwrap: we just inserted a Page if it was None.
        Ok(self.cache[page_num as usize].as_mut().unwrap())
    }

    /// Allocate a new page at the end (in memory). Increments `num_pages`.
    /// Does NOT change `file_length_pages` until the page is actually flushed.
    pub fn allocate_page(&mut self) -> DbResult<u32> {
        if self.num_pages >= MAX_PAGES {
            return Err(DbError::TableFull);
        }
        let new_page_num = self.num_pages;
        self.num_pages += 1;
        if self.cache.len() <= new_page_num as usize {
            self.cache.resize_with(new_page_num as usize + 1, || None);
        }
        Ok(new_page_num)
    }

    /// Write the cached page `page_num` back to disk. If this is a brand-new
    /// page (i.e. ≥ `file_length_pages`), update `file_length_pages` so
    /// subsequent reads know it's on disk. Pages never materialized in the
    /// cache have nothing to write.
    pub fn flush_page(&mut self, page_num: u32) -> DbResult<()> {
        if page_num as usize >= self.cache.len() {
            return Ok(());
        }
        if let Some(page_box) = &self.cache[page_num as usize] {
            let offset = (page_num as u64) * (PAGE_SIZE as u64);
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.write_all(&page_box.data)?;
            self.file.flush()?;

            if page_num >= self.file_length_pages {
                self.file_length_pages = page_num + 1;
            }
        }
        Ok(())
    }

    /// Write every page the pager knows about back to disk.
    pub fn flush_all(&mut self) -> DbResult<()> {
        for page_num in 0..self.num_pages {
            self.flush_page(page_num)?;
        }
        Ok(())
    }

    /// How many pages were already in the file when we opened it?
    pub fn file_length_pages(&self) -> u32 {
        self.file_length_pages
    }

    /// How many pages does the pager know about right now (on-disk + newly allocated)?
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }
}
