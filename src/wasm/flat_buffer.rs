//! Flat page table for the zero-copy WASM bridge
//!
//! ## u32 Buffer Layout:
//! ```text
//! Header:
//! [0]     MAGIC (0x50504752 = "PPGR")
//! [1]     SCHEMA_VERSION (currently 1)
//! [2]     generation_lo
//! [3]     generation_hi
//! [4]     page_count
//! [5]     text_buffer_len (UTF-8 bytes)
//! [6]     text_utf16_len
//! [7]     reserved
//! [8..]   page records
//!
//! Per-page (U32_PER_PAGE):
//!   [index, section, text_offset, text_len, text_utf16_offset, text_utf16_len, flags]
//!     text_offset/text_len: byte range in text_data (UTF-8)
//!     text_utf16_offset/text_utf16_len: range for JS substring after one decode
//!     flags: bit0=overflow, bit1=blank
//! ```
//!
//! ## f32 Buffer Layout:
//! ```text
//! [0..5]  page_width, page_height, content_width, content_height, total_height
//! [5..]   per-page height
//! ```
//!
//! The text buffer holds every page's markup back to back.

use crate::render::{PageSet, RenderedPage};

/// Magic number for format validation: "PPGR" (Print PaGeR)
pub const MAGIC: u32 = 0x5050_4752;

/// Schema version for protocol compatibility checking
pub const SCHEMA_VERSION: u32 = 1;

/// Header size in u32 elements
pub const HEADER_SIZE: usize = 8;

/// Header size in f32 elements
pub const F32_HEADER_SIZE: usize = 5;

/// Number of u32 values per page record
pub const U32_PER_PAGE: usize = 7;

/// Flags bitmask
pub const FLAG_OVERFLOW: u32 = 0b01;
pub const FLAG_BLANK: u32 = 0b10;

/// Page buffer for zero-copy WASM transfer
#[derive(Debug)]
pub struct PageBuffer {
    /// Header and page records
    pub u32_data: Vec<u32>,
    /// Geometry and page heights
    pub f32_data: Vec<f32>,
    /// UTF-8 markup of all pages
    pub text_data: Vec<u8>,

    utf16_text_offset: usize,
}

impl Default for PageBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageBuffer {
    pub fn new() -> Self {
        Self {
            u32_data: Vec::with_capacity(256),
            f32_data: Vec::with_capacity(64),
            text_data: Vec::with_capacity(4096),
            utf16_text_offset: 0,
        }
    }

    pub fn clear(&mut self) {
        self.u32_data.clear();
        self.f32_data.clear();
        self.text_data.clear();
        self.utf16_text_offset = 0;
    }

    /// Reserve room for `pages` records and `text_bytes` of markup.
    ///
    /// JS holds pointers into these buffers, so everything must fit without
    /// reallocating once writing starts.
    pub fn prepare(&mut self, pages: usize, text_bytes: usize) {
        let u32_target = HEADER_SIZE + pages * U32_PER_PAGE + 16;
        let f32_target = F32_HEADER_SIZE + pages + 16;
        let text_target = text_bytes + 256;

        if self.u32_data.capacity() < u32_target {
            self.u32_data = Vec::with_capacity(u32_target);
        } else {
            self.u32_data.clear();
        }
        if self.f32_data.capacity() < f32_target {
            self.f32_data = Vec::with_capacity(f32_target);
        } else {
            self.f32_data.clear();
        }
        if self.text_data.capacity() < text_target {
            self.text_data = Vec::with_capacity(text_target);
        } else {
            self.text_data.clear();
        }
        self.utf16_text_offset = 0;
    }

    /// Fill the buffer from a page set
    pub fn write(&mut self, pages: &PageSet, generation: u64) {
        let text_bytes = pages.iter().map(|p| p.markup.len()).sum();
        self.prepare(pages.total_pages(), text_bytes);

        self.write_header(generation, pages.total_pages() as u32);
        let geometry = pages.geometry();
        self.f32_data.extend_from_slice(&[
            geometry.page_width,
            geometry.page_height,
            geometry.content_width(),
            geometry.content_height(),
            0.0,
        ]);

        for page in pages {
            self.write_page(page);
        }
        self.finalize();
    }

    fn write_header(&mut self, generation: u64, page_count: u32) {
        self.u32_data.push(MAGIC); // [0] magic number
        self.u32_data.push(SCHEMA_VERSION); // [1] schema version
        self.u32_data.push((generation & 0xFFFF_FFFF) as u32); // [2] generation_lo
        self.u32_data.push((generation >> 32) as u32); // [3] generation_hi
        self.u32_data.push(page_count); // [4] page_count
        self.u32_data.push(0); // [5] text_buffer_len (placeholder)
        self.u32_data.push(0); // [6] text_utf16_len (placeholder)
        self.u32_data.push(0); // [7] reserved
    }

    fn write_page(&mut self, page: &RenderedPage) {
        let text_offset = self.text_data.len();
        let utf16_len = page.markup.encode_utf16().count();
        self.text_data.extend_from_slice(page.markup.as_bytes());

        let mut flags = 0;
        if page.overflow {
            flags |= FLAG_OVERFLOW;
        }
        if page.is_blank() {
            flags |= FLAG_BLANK;
        }

        self.u32_data.extend_from_slice(&[
            page.index as u32,
            page.section as u32,
            text_offset as u32,
            page.markup.len() as u32,
            self.utf16_text_offset as u32,
            utf16_len as u32,
            flags,
        ]);
        self.f32_data.push(page.height);
        self.utf16_text_offset += utf16_len;
    }

    /// Synchronize header totals with the written data
    fn finalize(&mut self) {
        if self.u32_data.len() < HEADER_SIZE || self.f32_data.len() < F32_HEADER_SIZE {
            return;
        }
        self.u32_data[5] = self.text_data.len() as u32;
        self.u32_data[6] = self.utf16_text_offset as u32;
        self.f32_data[4] = self.f32_data[F32_HEADER_SIZE..].iter().sum();

        #[cfg(debug_assertions)]
        self.validate_offsets();
    }

    /// Check that every page record points inside the text buffer (debug builds only)
    #[cfg(debug_assertions)]
    fn validate_offsets(&self) {
        let page_count = self.u32_data[4] as usize;
        let text_len = self.text_data.len();

        debug_assert_eq!(
            self.u32_data.len(),
            HEADER_SIZE + page_count * U32_PER_PAGE,
            "page record count does not match header"
        );
        debug_assert_eq!(self.f32_data.len(), F32_HEADER_SIZE + page_count);

        for (page_idx, record) in self.u32_data[HEADER_SIZE..]
            .chunks_exact(U32_PER_PAGE)
            .enumerate()
        {
            let offset = record[2] as usize;
            let length = record[3] as usize;
            debug_assert!(
                offset + length <= text_len,
                "Invalid text range for page {}: offset {} + length {} > text buffer size {}",
                page_idx,
                offset,
                length,
                text_len
            );
        }
    }

    pub fn page_count(&self) -> usize {
        self.u32_data.get(4).copied().unwrap_or(0) as usize
    }

    /// Decode the markup of a 0-based page record
    pub fn page_markup(&self, i: usize) -> Option<&str> {
        let base = HEADER_SIZE + i * U32_PER_PAGE;
        let record = self.u32_data.get(base..base + U32_PER_PAGE)?;
        let start = record[2] as usize;
        let end = start + record[3] as usize;
        std::str::from_utf8(self.text_data.get(start..end)?).ok()
    }

    // Accessors for WASM
    // Return u32 instead of usize for explicit WASM contract (wasm32 linear memory uses u32 offsets)

    pub fn u32_ptr(&self) -> u32 {
        self.u32_data.as_ptr() as u32
    }

    pub fn u32_len(&self) -> u32 {
        self.u32_data.len() as u32
    }

    pub fn f32_ptr(&self) -> u32 {
        self.f32_data.as_ptr() as u32
    }

    pub fn f32_len(&self) -> u32 {
        self.f32_data.len() as u32
    }

    pub fn text_ptr(&self) -> u32 {
        self.text_data.as_ptr() as u32
    }

    pub fn text_len(&self) -> u32 {
        self.text_data.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PageGeometry;

    fn page_set(pages: &[(&str, f32, bool)]) -> PageSet {
        let pages = pages
            .iter()
            .enumerate()
            .map(|(i, &(markup, height, overflow))| RenderedPage {
                index: i + 1,
                section: i / 2,
                span: 0..markup.len(),
                markup: markup.to_string(),
                height,
                overflow,
            })
            .collect();
        PageSet::new(pages, PageGeometry::default(), 0)
    }

    #[test]
    fn test_page_buffer_basic() {
        let set = page_set(&[("<p>a</p>", 40.0, false), ("<p>b</p>", 30.0, false)]);
        let mut buffer = PageBuffer::new();
        buffer.write(&set, 0x1_0000_0002);

        assert_eq!(buffer.u32_data[0], MAGIC);
        assert_eq!(buffer.u32_data[1], SCHEMA_VERSION);
        assert_eq!(buffer.u32_data[2], 2);
        assert_eq!(buffer.u32_data[3], 1);
        assert_eq!(buffer.page_count(), 2);
        assert_eq!(buffer.u32_data[5], 16);
        assert_eq!(buffer.u32_len() as usize, HEADER_SIZE + 2 * U32_PER_PAGE);

        assert_eq!(buffer.page_markup(0), Some("<p>a</p>"));
        assert_eq!(buffer.page_markup(1), Some("<p>b</p>"));
        assert_eq!(buffer.page_markup(2), None);

        assert_eq!(buffer.f32_data[4], 70.0);
        assert_eq!(&buffer.f32_data[F32_HEADER_SIZE..], &[40.0, 30.0]);
    }

    #[test]
    fn test_utf16_offsets_for_batch_decode() {
        let set = page_set(&[("<p>é😀</p>", 10.0, false), ("<p>x</p>", 10.0, false)]);
        let mut buffer = PageBuffer::new();
        buffer.write(&set, 1);

        let first = &buffer.u32_data[HEADER_SIZE..HEADER_SIZE + U32_PER_PAGE];
        let second = &buffer.u32_data[HEADER_SIZE + U32_PER_PAGE..];
        // "é" is one UTF-16 unit, the emoji two
        assert_eq!(first[4], 0);
        assert_eq!(first[5], 10);
        assert_eq!(second[4], 10);
        assert_eq!(second[2], "<p>é😀</p>".len() as u32);
        assert_eq!(buffer.u32_data[6], 18);
    }

    #[test]
    fn test_flags() {
        let set = page_set(&[("", 0.0, false), ("<table></table>", 900.0, true)]);
        let mut buffer = PageBuffer::new();
        buffer.write(&set, 3);

        assert_eq!(buffer.u32_data[HEADER_SIZE + 6], FLAG_BLANK);
        assert_eq!(buffer.u32_data[HEADER_SIZE + U32_PER_PAGE + 6], FLAG_OVERFLOW);
    }

    #[test]
    fn test_prepare_prevents_reallocation() {
        let set = page_set(&[("<p>a</p>", 1.0, false); 6]);
        let mut buffer = PageBuffer::new();
        buffer.write(&set, 1);
        let ptr = buffer.u32_ptr();

        // Same shape again reuses the allocation
        buffer.write(&set, 2);
        assert_eq!(buffer.u32_ptr(), ptr);
        assert_eq!(buffer.u32_data[2], 2);
    }
}
