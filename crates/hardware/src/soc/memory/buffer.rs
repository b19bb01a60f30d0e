//! Sparse Backing Store.
//!
//! Main memory contents, allocated a page at a time on first write. Large
//! memories cost nothing until they are touched, and unwritten bytes read as
//! zero.

use std::collections::HashMap;

/// Bytes per backing page.
pub const PAGE_SIZE: usize = 4096;

/// Lazily allocated byte buffer addressed by offset.
#[derive(Debug, Default, Clone)]
pub struct SparseBuffer {
    pages: HashMap<u64, Box<[u8]>>,
}

impl SparseBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of allocated pages.
    pub fn resident_pages(&self) -> usize {
        self.pages.len()
    }

    /// Fills `out` with the bytes starting at `offset`.
    pub fn read_slice(&self, offset: u64, out: &mut [u8]) {
        let mut done = 0;
        while done < out.len() {
            let pos = offset + done as u64;
            let (page, in_page) = split(pos);
            let len = (PAGE_SIZE - in_page).min(out.len() - done);
            match self.pages.get(&page) {
                Some(bytes) => out[done..done + len].copy_from_slice(&bytes[in_page..in_page + len]),
                None => out[done..done + len].fill(0),
            }
            done += len;
        }
    }

    /// Writes `data` starting at `offset`.
    pub fn write_slice(&mut self, offset: u64, data: &[u8]) {
        let mut done = 0;
        while done < data.len() {
            let pos = offset + done as u64;
            let (page, in_page) = split(pos);
            let len = (PAGE_SIZE - in_page).min(data.len() - done);
            let bytes = self
                .pages
                .entry(page)
                .or_insert_with(|| vec![0; PAGE_SIZE].into_boxed_slice());
            bytes[in_page..in_page + len].copy_from_slice(&data[done..done + len]);
            done += len;
        }
    }

    /// Reads one byte.
    pub fn read_u8(&self, offset: u64) -> u8 {
        let (page, in_page) = split(offset);
        self.pages.get(&page).map_or(0, |bytes| bytes[in_page])
    }
}

const fn split(offset: u64) -> (u64, usize) {
    (offset / PAGE_SIZE as u64, (offset % PAGE_SIZE as u64) as usize)
}
