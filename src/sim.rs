//! Wiring: the pager and the MMU on two threads, talking only through the
//! page table and the handshake channels.

use crate::config::VmConfig;
use crate::error::{VmError, VmResult};
use crate::mm::PageTable;
use crate::mmu::{Access, Mmu, MmuReport, Request};
use crate::pager::{Pager, PagerReport};
use std::thread::{self, JoinHandle};

/// outcome of a complete run
#[derive(Debug)]
pub struct SimReport {
    pub hits: usize,
    pub misses: usize,
    pub disk_accesses: usize,
    /// page table as the pager left it
    pub page_table: PageTable,
}

impl SimReport {
    fn new(mmu: MmuReport, pager: PagerReport) -> Self {
        Self {
            hits: mmu.hits,
            misses: mmu.misses,
            disk_accesses: pager.disk_accesses,
            page_table: pager.page_table,
        }
    }

    pub fn hit_ratio(&self) -> f64 {
        MmuReport {
            hits: self.hits,
            misses: self.misses,
        }
        .hit_ratio()
    }
}

fn spawn_pager(config: &VmConfig) -> VmResult<(Mmu, JoinHandle<VmResult<PagerReport>>)> {
    let mut pager = Pager::new(config)?;
    let port = pager.attach()?;
    let handle = thread::Builder::new()
        .name("pager".into())
        .spawn(move || pager.run())?;
    Ok((Mmu::new(port), handle))
}

fn join_pager(handle: JoinHandle<VmResult<PagerReport>>) -> VmResult<PagerReport> {
    handle
        .join()
        .map_err(|_| VmError::Protocol("pager thread panicked"))?
}

/// A pager running on its own thread and an MMU driven request by request
/// from the caller's thread.
pub struct Simulation {
    mmu: Mmu,
    pager: JoinHandle<VmResult<PagerReport>>,
}

impl Simulation {
    pub fn start(config: &VmConfig) -> VmResult<Self> {
        let (mmu, pager) = spawn_pager(config)?;
        Ok(Self { mmu, pager })
    }

    pub fn access(&mut self, request: Request) -> VmResult<Access> {
        self.mmu.access(request)
    }

    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    /// Shut the MMU down and wait for the pager to terminate.
    pub fn finish(self) -> VmResult<SimReport> {
        let mmu = self.mmu.shutdown();
        let pager = join_pager(self.pager);
        Ok(SimReport::new(mmu?, pager?))
    }
}

/// Run `requests` to completion with the MMU and the pager on threads of
/// their own.
pub fn run(config: &VmConfig, requests: Vec<Request>) -> VmResult<SimReport> {
    let (mmu, pager) = spawn_pager(config)?;
    let mmu = thread::Builder::new()
        .name("mmu".into())
        .spawn(move || mmu.run(requests))?;
    let mmu = mmu
        .join()
        .map_err(|_| VmError::Protocol("MMU thread panicked"))?;
    let pager = join_pager(pager);
    Ok(SimReport::new(mmu?, pager?))
}
