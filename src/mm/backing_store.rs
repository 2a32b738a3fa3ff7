//! Backing store: the per-page content pages are loaded from and dirty
//! pages are written back to.

use super::{PageData, VirtPageNum};
use crate::config::PAGE_SIZE;
use crate::error::{VmError, VmResult};
use core::fmt::{self, Display, Formatter};
use rand::Rng;

pub struct BackingStore {
    pages: Vec<PageData>,
}

impl BackingStore {
    /// One page of printable ASCII per virtual page.
    pub fn new<R: Rng>(page_count: usize, rng: &mut R) -> VmResult<Self> {
        let mut pages = Vec::new();
        pages
            .try_reserve_exact(page_count)
            .map_err(|_| VmError::OutOfMemory("backing store"))?;
        for _ in 0..page_count {
            let mut page = [0u8; PAGE_SIZE];
            for byte in page.iter_mut() {
                *byte = rng.gen_range(b' '..=b'~');
            }
            pages.push(page);
        }
        Ok(Self { pages })
    }
    #[cfg(test)]
    pub(crate) fn from_pages(pages: Vec<PageData>) -> Self {
        Self { pages }
    }
    pub fn len(&self) -> usize {
        self.pages.len()
    }
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
    pub fn page(&self, vpn: VirtPageNum) -> VmResult<&PageData> {
        let page_count = self.pages.len();
        self.pages.get(vpn.0).ok_or(VmError::PageOutOfRange {
            page: vpn.0,
            page_count,
        })
    }
    pub fn read_page(&self, vpn: VirtPageNum, buf: &mut PageData) -> VmResult<()> {
        buf.copy_from_slice(self.page(vpn)?);
        Ok(())
    }
    pub fn write_page(&mut self, vpn: VirtPageNum, data: &PageData) -> VmResult<()> {
        let page_count = self.pages.len();
        let page = self.pages.get_mut(vpn.0).ok_or(VmError::PageOutOfRange {
            page: vpn.0,
            page_count,
        })?;
        page.copy_from_slice(data);
        Ok(())
    }
    pub fn into_pages(self) -> Vec<PageData> {
        self.pages
    }
}

impl Display for BackingStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, page) in self.pages.iter().enumerate() {
            writeln!(f, "Page {} ---> {}", i, String::from_utf8_lossy(page))?;
        }
        Ok(())
    }
}
