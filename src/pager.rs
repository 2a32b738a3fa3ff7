//! The pager: resolves page faults raised by attached MMUs.
//!
//! The pager owns the frame store and the backing store and creates the page
//! table before any MMU attaches. It sleeps on the fault-notify channel; on
//! every wake it scans the page table for the page an MMU is waiting on,
//! brings that page into RAM (evicting a resident page when no frame is
//! free) and resumes the MMU. A wake with no page waiting means the MMU has
//! finished, and the pager shuts down.

use crate::config::{VmConfig, PAGE_SIZE};
use crate::error::{VmError, VmResult};
use crate::mm::{
    BackingStore, FrameStore, PageData, PageTable, PhysPageNum, ReplacementPolicy, VirtPageNum,
};
use crate::signal::{self, FaultNotify, MmuPort, Resume};
use crate::task::{pid_alloc, Pid};
use rand::rngs::StdRng;
use rand::Rng;
use spin::Mutex;
use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::Arc;

/// what one wake of the pager did
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FaultOutcome {
    /// `vpn` was loaded into `ppn` for `requester`
    Loaded {
        requester: Pid,
        vpn: VirtPageNum,
        ppn: PhysPageNum,
        evicted: Option<Eviction>,
    },
    /// nothing was pending
    Shutdown,
}

/// page pushed out of RAM to make room
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Eviction {
    pub vpn: VirtPageNum,
    /// the page was dirty and went back to the backing store first
    pub written_back: bool,
}

/// state handed back when the pager terminates
#[derive(Debug)]
pub struct PagerReport {
    /// backing-store reads and writes over the whole run
    pub disk_accesses: usize,
    pub page_table: PageTable,
    pub backing_store: Vec<PageData>,
}

pub struct Pager<R: Rng = StdRng> {
    page_table: Arc<Mutex<PageTable>>,
    frames: FrameStore,
    disk: BackingStore,
    policy: ReplacementPolicy,
    rng: R,
    disk_access: usize,
    notify_tx: Option<SyncSender<FaultNotify>>,
    notify_rx: Receiver<FaultNotify>,
    requesters: BTreeMap<Pid, SyncSender<Resume>>,
}

impl Pager<StdRng> {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Self::with_rng(config, config.rng())
    }
}

impl<R: Rng> Pager<R> {
    /// Allocate RAM, fill the backing store from `rng` and create the page
    /// table with every page invalid.
    pub fn with_rng(config: &VmConfig, mut rng: R) -> VmResult<Self> {
        let disk = BackingStore::new(config.page_count, &mut rng)?;
        let frames = FrameStore::new(config.frame_count)?;
        let page_table = PageTable::new(config.page_count)?;
        trace!("Initialized page table\n{}", page_table);
        trace!("Initialized RAM\n{}", frames);
        trace!("Initialized disk\n{}", disk);
        info!("Selected page replacement algorithm: {}", config.policy);
        let (notify_tx, notify_rx) = signal::channel();
        Ok(Self {
            page_table: Arc::new(Mutex::new(page_table)),
            frames,
            disk,
            policy: config.policy,
            rng,
            disk_access: 0,
            notify_tx: Some(notify_tx),
            notify_rx,
            requesters: BTreeMap::new(),
        })
    }

    /// Hand out an MMU's end of the handshake. Only possible before `run`.
    pub fn attach(&mut self) -> VmResult<MmuPort> {
        let notify = self
            .notify_tx
            .clone()
            .ok_or(VmError::Protocol("pager is already running"))?;
        let (resume_tx, resume_rx) = signal::channel();
        let pid = pid_alloc();
        self.requesters.insert(pid.0, resume_tx);
        debug!("MMU process (pid={}) attached", pid.0);
        Ok(MmuPort {
            pid,
            page_table: Arc::clone(&self.page_table),
            notify,
            resume: resume_rx,
        })
    }

    pub fn disk_accesses(&self) -> usize {
        self.disk_access
    }

    /// Serve fault notifications until the MMU signals that it is done.
    pub fn run(mut self) -> VmResult<PagerReport> {
        // from here on only attached MMUs hold the notify end
        self.notify_tx = None;
        loop {
            self.notify_rx
                .recv()
                .map_err(|_| VmError::Protocol("MMU hung up without shutting down"))?;
            match self.handle_fault()? {
                FaultOutcome::Shutdown => return Ok(self.shutdown()),
                FaultOutcome::Loaded { requester, .. } => self.resume(requester)?,
            }
        }
    }

    /// One wake of the pager: resolve the pending fault, if there is one.
    pub fn handle_fault(&mut self) -> VmResult<FaultOutcome> {
        let shared = Arc::clone(&self.page_table);
        let mut page_table = shared.lock();
        let (vpn, requester) = match page_table.pending_fault() {
            Some(fault) => fault,
            None => return Ok(FaultOutcome::Shutdown),
        };
        info!("A disk access request from MMU process (pid={})", requester);
        debug!("Page {} is referenced", vpn);
        let (ppn, evicted) = match self.frames.frame_alloc() {
            Some(ppn) => {
                debug!("We can allocate it to free frame {}", ppn);
                (ppn, None)
            }
            None => {
                debug!("We do not have free frames in RAM");
                let (ppn, eviction) = self.evict(&mut page_table)?;
                debug!(
                    "Replace/Evict page {} with page {} to be allocated to frame {}",
                    eviction.vpn, vpn, ppn
                );
                (ppn, Some(eviction))
            }
        };
        self.load(vpn, ppn)?;
        page_table.map(vpn, ppn)?;
        trace!("RAM array\n{}", self.frames);
        debug!(
            "Disk accesses is {} so far, {} free frames left",
            self.disk_access,
            self.frames.get_num_empty_frame()
        );
        Ok(FaultOutcome::Loaded {
            requester,
            vpn,
            ppn,
            evicted,
        })
    }

    /// Free the frame of the page the policy picks, writing it back first
    /// if it is dirty.
    fn evict(&mut self, page_table: &mut PageTable) -> VmResult<(PhysPageNum, Eviction)> {
        let victim = self
            .policy
            .select_victim(page_table, &mut self.rng)
            .ok_or(VmError::Protocol("no resident page to evict"))?;
        let pte = *page_table.entry(victim)?;
        let ppn = pte
            .ppn()
            .ok_or(VmError::Protocol("resident page without a frame"))?;
        let written_back = pte.is_dirty();
        if written_back {
            let data = self
                .frames
                .get_bytes_array(ppn)
                .ok_or(VmError::Protocol("resident page in an empty frame"))?;
            self.disk.write_page(victim, data)?;
            self.disk_access += 1;
            page_table.clear_dirty(victim)?;
            debug!(
                "Page {} is dirty, written back to disk ({} disk accesses so far)",
                victim, self.disk_access
            );
        }
        page_table.unmap(victim)?;
        Ok((
            ppn,
            Eviction {
                vpn: victim,
                written_back,
            },
        ))
    }

    fn load(&mut self, vpn: VirtPageNum, ppn: PhysPageNum) -> VmResult<()> {
        let mut data = [0u8; PAGE_SIZE];
        self.disk.read_page(vpn, &mut data)?;
        self.frames.load(ppn, &data)?;
        self.disk_access += 1;
        debug!("Copying data from disk (page={}) to RAM (frame={})", vpn, ppn);
        Ok(())
    }

    fn resume(&self, requester: Pid) -> VmResult<()> {
        let resume = self
            .requesters
            .get(&requester)
            .ok_or(VmError::Protocol("fault raised by an unknown requester"))?;
        resume
            .send(Resume)
            .map_err(|_| VmError::Protocol("requester hung up while waiting"))?;
        debug!("Resume MMU process (pid={})", requester);
        Ok(())
    }

    /// Release RAM, the backing store and the page table handle.
    pub fn shutdown(self) -> PagerReport {
        info!("{} disk accesses in total", self.disk_access);
        let page_table = self.page_table.lock().clone();
        info!("Pager is terminated");
        PagerReport {
            disk_accesses: self.disk_access,
            page_table,
            backing_store: self.disk.into_pages(),
        }
    }
}
