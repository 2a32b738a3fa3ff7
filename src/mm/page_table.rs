//! Implementation of [`PageTableEntry`] and [`PageTable`].

use super::{PhysPageNum, VirtPageNum};
use crate::config::AGING_HIGH_BIT;
use crate::error::{VmError, VmResult};
use crate::task::Pid;
use core::fmt::{self, Display, Formatter};

bitflags! {
    /// page table entry flags
    pub struct PTEFlags: u8 {
        /// resident in a frame
        const V = 1 << 0;
        /// written since it was loaded
        const D = 1 << 1;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// page table entry structure
pub struct PageTableEntry {
    pub flags: PTEFlags,
    /// frame holding the page, `Some` iff `V` is set
    pub ppn: Option<PhysPageNum>,
    /// requester waiting for this page to be loaded
    pub referenced: Option<Pid>,
    /// accesses since the start of the run, used by NFU
    pub counter: u32,
    /// aging counter, halved on every access to any page
    pub aging: u8,
}

impl PageTableEntry {
    pub fn empty() -> Self {
        PageTableEntry {
            flags: PTEFlags::empty(),
            ppn: None,
            referenced: None,
            counter: 0,
            aging: 0,
        }
    }
    pub fn is_valid(&self) -> bool {
        self.flags.contains(PTEFlags::V)
    }
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(PTEFlags::D)
    }
    pub fn ppn(&self) -> Option<PhysPageNum> {
        self.ppn
    }
}

impl Default for PageTableEntry {
    fn default() -> Self {
        Self::empty()
    }
}

/// page table shared by the pager and the MMU
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageTable {
    entries: Vec<PageTableEntry>,
}

impl PageTable {
    pub fn new(page_count: usize) -> VmResult<Self> {
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(page_count)
            .map_err(|_| VmError::OutOfMemory("page table"))?;
        entries.resize(page_count, PageTableEntry::empty());
        Ok(Self { entries })
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn entries(&self) -> &[PageTableEntry] {
        &self.entries
    }
    pub fn entry(&self, vpn: VirtPageNum) -> VmResult<&PageTableEntry> {
        let page_count = self.entries.len();
        self.entries.get(vpn.0).ok_or(VmError::PageOutOfRange {
            page: vpn.0,
            page_count,
        })
    }
    fn entry_mut(&mut self, vpn: VirtPageNum) -> VmResult<&mut PageTableEntry> {
        let page_count = self.entries.len();
        self.entries.get_mut(vpn.0).ok_or(VmError::PageOutOfRange {
            page: vpn.0,
            page_count,
        })
    }
    /// frame of `vpn` if it is resident
    pub fn translate(&self, vpn: VirtPageNum) -> Option<PhysPageNum> {
        self.entries
            .get(vpn.0)
            .filter(|pte| pte.is_valid())
            .and_then(|pte| pte.ppn)
    }
    /// Record one access to `vpn`: every aging counter is halved first, then
    /// the accessed page gets the high bit and its NFU counter is bumped.
    pub fn touch(&mut self, vpn: VirtPageNum) -> VmResult<()> {
        self.entry(vpn)?;
        for pte in self.entries.iter_mut() {
            pte.aging >>= 1;
        }
        let pte = &mut self.entries[vpn.0];
        pte.aging |= AGING_HIGH_BIT;
        pte.counter = pte.counter.saturating_add(1);
        Ok(())
    }
    /// Mark `pid` as waiting for `vpn`. Only one fault may be outstanding.
    pub fn mark_referenced(&mut self, vpn: VirtPageNum, pid: Pid) -> VmResult<()> {
        if self.pending_fault().is_some() {
            return Err(VmError::Protocol("a page fault is already outstanding"));
        }
        let pte = self.entry_mut(vpn)?;
        if pte.is_valid() {
            return Err(VmError::Protocol("fault raised for a resident page"));
        }
        pte.referenced = Some(pid);
        Ok(())
    }
    /// first page, in index order, with a requester waiting on it
    pub fn pending_fault(&self) -> Option<(VirtPageNum, Pid)> {
        self.entries
            .iter()
            .enumerate()
            .find_map(|(i, pte)| pte.referenced.map(|pid| (VirtPageNum(i), pid)))
    }
    pub fn set_dirty(&mut self, vpn: VirtPageNum) -> VmResult<()> {
        let pte = self.entry_mut(vpn)?;
        if !pte.is_valid() {
            return Err(VmError::Protocol("write to a page that is not resident"));
        }
        pte.flags |= PTEFlags::D;
        Ok(())
    }
    pub fn clear_dirty(&mut self, vpn: VirtPageNum) -> VmResult<()> {
        self.entry_mut(vpn)?.flags.remove(PTEFlags::D);
        Ok(())
    }
    /// `vpn` is now resident in `ppn`, clean, with nobody waiting on it
    pub fn map(&mut self, vpn: VirtPageNum, ppn: PhysPageNum) -> VmResult<()> {
        if let Some((owner, _)) = self.resident().find(|(_, pte)| pte.ppn == Some(ppn)) {
            if owner != vpn {
                return Err(VmError::Protocol("frame is already mapped"));
            }
        }
        let pte = self.entry_mut(vpn)?;
        pte.flags = PTEFlags::V;
        pte.ppn = Some(ppn);
        pte.referenced = None;
        Ok(())
    }
    /// drop the mapping of `vpn`, returning the frame it held
    pub fn unmap(&mut self, vpn: VirtPageNum) -> VmResult<Option<PhysPageNum>> {
        let pte = self.entry_mut(vpn)?;
        let ppn = pte.ppn.take();
        pte.flags = PTEFlags::empty();
        pte.referenced = None;
        Ok(ppn)
    }
    /// resident pages in index order
    pub fn resident(&self) -> impl Iterator<Item = (VirtPageNum, &PageTableEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, pte)| pte.is_valid())
            .map(|(i, pte)| (VirtPageNum(i), pte))
    }
}

impl Display for PageTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, pte) in self.entries.iter().enumerate() {
            writeln!(
                f,
                "Page {} ---> valid={}, frame={}, dirty={}, referenced={}",
                i,
                pte.is_valid() as u8,
                pte.ppn.map_or(-1, |ppn| ppn.0 as isize),
                pte.is_dirty() as u8,
                pte.referenced.map_or(0, Pid::as_usize),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::pid_alloc;

    #[test]
    fn starts_invalid_and_clean() {
        let pt = PageTable::new(4).unwrap();
        assert_eq!(pt.len(), 4);
        assert!(pt.entries().iter().all(|pte| *pte == PageTableEntry::empty()));
        assert_eq!(pt.pending_fault(), None);
        assert_eq!(pt.translate(VirtPageNum(0)), None);
    }

    #[test]
    fn touch_halves_all_then_sets_high_bit() {
        let mut pt = PageTable::new(3).unwrap();
        pt.touch(VirtPageNum(0)).unwrap();
        pt.touch(VirtPageNum(1)).unwrap();
        pt.touch(VirtPageNum(0)).unwrap();
        let aging: Vec<u8> = pt.entries().iter().map(|pte| pte.aging).collect();
        assert_eq!(aging, vec![0xA0, 0x40, 0x00]);
        let counters: Vec<u32> = pt.entries().iter().map(|pte| pte.counter).collect();
        assert_eq!(counters, vec![2, 1, 0]);
    }

    #[test]
    fn touch_out_of_range_leaves_table_alone() {
        let mut pt = PageTable::new(2).unwrap();
        pt.touch(VirtPageNum(0)).unwrap();
        let before = pt.clone();
        assert_eq!(
            pt.touch(VirtPageNum(2)),
            Err(VmError::PageOutOfRange {
                page: 2,
                page_count: 2
            })
        );
        assert_eq!(pt, before);
    }

    #[test]
    fn only_one_fault_outstanding() {
        let mut pt = PageTable::new(3).unwrap();
        let pid = pid_alloc();
        pt.mark_referenced(VirtPageNum(2), pid.0).unwrap();
        assert_eq!(pt.pending_fault(), Some((VirtPageNum(2), pid.0)));
        assert!(matches!(
            pt.mark_referenced(VirtPageNum(1), pid.0),
            Err(VmError::Protocol(_))
        ));
        pt.map(VirtPageNum(2), PhysPageNum(0)).unwrap();
        assert_eq!(pt.pending_fault(), None);
        assert_eq!(pt.translate(VirtPageNum(2)), Some(PhysPageNum(0)));
    }

    #[test]
    fn dirty_requires_residency() {
        let mut pt = PageTable::new(2).unwrap();
        assert!(pt.set_dirty(VirtPageNum(0)).is_err());
        pt.map(VirtPageNum(0), PhysPageNum(1)).unwrap();
        pt.set_dirty(VirtPageNum(0)).unwrap();
        assert!(pt.entry(VirtPageNum(0)).unwrap().is_dirty());
        assert_eq!(pt.unmap(VirtPageNum(0)).unwrap(), Some(PhysPageNum(1)));
        let pte = pt.entry(VirtPageNum(0)).unwrap();
        assert!(!pte.is_valid() && !pte.is_dirty());
        assert_eq!(pte.counter, 0);
    }

    #[test]
    fn frames_are_not_aliased() {
        let mut pt = PageTable::new(2).unwrap();
        pt.map(VirtPageNum(0), PhysPageNum(0)).unwrap();
        assert!(pt.map(VirtPageNum(1), PhysPageNum(0)).is_err());
        pt.map(VirtPageNum(1), PhysPageNum(1)).unwrap();
        let resident: Vec<_> = pt.resident().map(|(vpn, _)| vpn).collect();
        assert_eq!(resident, vec![VirtPageNum(0), VirtPageNum(1)]);
    }

    #[test]
    fn dump_matches_page_lines() {
        let mut pt = PageTable::new(2).unwrap();
        pt.map(VirtPageNum(1), PhysPageNum(0)).unwrap();
        assert_eq!(
            pt.to_string(),
            "Page 0 ---> valid=0, frame=-1, dirty=0, referenced=0\n\
             Page 1 ---> valid=1, frame=0, dirty=0, referenced=0\n"
        );
    }
}
