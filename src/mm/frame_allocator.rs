//! Implementation of [`FrameStore`], the simulated RAM the pager loads
//! pages into.

use super::PhysPageNum;
use crate::config::PAGE_SIZE;
use crate::error::{VmError, VmResult};
use core::fmt::{self, Display, Formatter};

/// content of one page or frame
pub type PageData = [u8; PAGE_SIZE];

/// fixed number of frame slots, each empty or holding one resident page
pub struct FrameStore {
    frames: Vec<Option<PageData>>,
}

impl FrameStore {
    pub fn new(frame_count: usize) -> VmResult<Self> {
        let mut frames = Vec::new();
        frames
            .try_reserve_exact(frame_count)
            .map_err(|_| VmError::OutOfMemory("frame store"))?;
        frames.resize(frame_count, None);
        Ok(Self { frames })
    }
    pub fn len(&self) -> usize {
        self.frames.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
    /// lowest empty frame, if any
    pub fn frame_alloc(&self) -> Option<PhysPageNum> {
        self.frames.iter().position(Option::is_none).map(PhysPageNum)
    }
    pub fn get_num_empty_frame(&self) -> usize {
        self.frames.iter().filter(|frame| frame.is_none()).count()
    }
    /// copy `data` into `ppn`, replacing whatever the frame held
    pub fn load(&mut self, ppn: PhysPageNum, data: &PageData) -> VmResult<()> {
        let slot = self
            .frames
            .get_mut(ppn.0)
            .ok_or(VmError::Protocol("frame number out of range"))?;
        *slot = Some(*data);
        Ok(())
    }
    pub fn get_bytes_array(&self, ppn: PhysPageNum) -> Option<&PageData> {
        self.frames.get(ppn.0).and_then(Option::as_ref)
    }
    pub fn get_bytes_array_mut(&mut self, ppn: PhysPageNum) -> Option<&mut PageData> {
        self.frames.get_mut(ppn.0).and_then(Option::as_mut)
    }
}

impl Display for FrameStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            match frame {
                Some(data) => writeln!(f, "Frame {} ---> {}", i, String::from_utf8_lossy(data))?,
                None => writeln!(f, "Frame {} ---> (null)", i)?,
            }
        }
        Ok(())
    }
}
