//! The MMU: issues page accesses against the shared page table and raises a
//! fault with the pager whenever the page is not resident.

use crate::error::{VmError, VmResult};
use crate::mm::{PageTable, VirtPageNum};
use crate::signal::MmuPort;
use crate::task::Pid;
use core::fmt::{self, Display, Formatter};
use core::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// one page access, written `R<page>` or `W<page>` on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub mode: AccessMode,
    pub vpn: VirtPageNum,
}

impl Request {
    pub fn read(page: usize) -> Self {
        Self {
            mode: AccessMode::Read,
            vpn: VirtPageNum(page),
        }
    }
    pub fn write(page: usize) -> Self {
        Self {
            mode: AccessMode::Write,
            vpn: VirtPageNum(page),
        }
    }
    /// Parse a request sequence. Tokens that do not start with `R` or `W`
    /// are skipped.
    pub fn parse_all<'a, I>(tokens: I) -> VmResult<Vec<Request>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut requests = Vec::new();
        for token in tokens {
            if !token.starts_with(|c: char| c == 'R' || c == 'W') {
                warn!("Skipping `{}`, not a read or write request", token);
                continue;
            }
            requests.push(token.parse()?);
        }
        Ok(requests)
    }
}

impl FromStr for Request {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VmError::InvalidRequest(s.into());
        let mode = match s.chars().next() {
            Some('R') => AccessMode::Read,
            Some('W') => AccessMode::Write,
            _ => return Err(invalid()),
        };
        let page = s[1..].parse::<usize>().map_err(|_| invalid())?;
        Ok(Self {
            mode,
            vpn: VirtPageNum(page),
        })
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.mode {
            AccessMode::Read => write!(f, "R{}", self.vpn),
            AccessMode::Write => write!(f, "W{}", self.vpn),
        }
    }
}

/// how a request was resolved
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Hit,
    Miss,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MmuReport {
    pub hits: usize,
    pub misses: usize,
}

impl MmuReport {
    /// hits / (hits + misses) in percent, 0 when nothing was requested
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64 * 100.0
    }
}

pub struct Mmu {
    port: MmuPort,
    page_count: usize,
    hit: usize,
    miss: usize,
}

impl Mmu {
    pub fn new(port: MmuPort) -> Self {
        let page_count = port.page_table().lock().len();
        Self {
            port,
            page_count,
            hit: 0,
            miss: 0,
        }
    }

    pub fn pid(&self) -> Pid {
        self.port.pid()
    }

    pub fn report(&self) -> MmuReport {
        MmuReport {
            hits: self.hit,
            misses: self.miss,
        }
    }

    /// copy of the page table as the MMU currently sees it
    pub fn snapshot(&self) -> PageTable {
        self.port.page_table().lock().clone()
    }

    /// Issue one access. Blocks on a miss until the pager has loaded the
    /// page.
    pub fn access(&mut self, request: Request) -> VmResult<Access> {
        let vpn = request.vpn;
        if vpn.0 >= self.page_count {
            return Err(VmError::PageOutOfRange {
                page: vpn.0,
                page_count: self.page_count,
            });
        }
        match request.mode {
            AccessMode::Read => debug!("Read request for page {}", vpn),
            AccessMode::Write => debug!("Write request for page {}", vpn),
        }
        let resident = {
            let mut page_table = self.port.page_table().lock();
            page_table.touch(vpn)?;
            let resident = page_table.translate(vpn).is_some();
            if !resident {
                page_table.mark_referenced(vpn, self.pid())?;
            }
            resident
        };
        let access = if resident {
            self.hit += 1;
            debug!("It is a valid page!");
            Access::Hit
        } else {
            self.miss += 1;
            debug!("It is not a valid page ---> page fault");
            debug!("Ask pager to load it from disk and wait");
            self.port.notify()?;
            self.port.wait_resume()?;
            debug!("MMU resumed by pager");
            Access::Miss
        };
        let mut page_table = self.port.page_table().lock();
        if request.mode == AccessMode::Write {
            debug!("It is a write request then set the dirty field");
            page_table.set_dirty(vpn)?;
        }
        trace!("Page table\n{}", *page_table);
        Ok(access)
    }

    /// Issue every request in order, then shut the pager down.
    pub fn run<I>(mut self, requests: I) -> VmResult<MmuReport>
    where
        I: IntoIterator<Item = Request>,
    {
        for request in requests {
            self.access(request)?;
        }
        self.shutdown()
    }

    /// Tell the pager there is nothing left, with no page marked as
    /// referenced, and drop the handle on the page table.
    pub fn shutdown(self) -> VmResult<MmuReport> {
        info!("Done all requests.");
        let report = self.report();
        info!("The hit ratio is: {:.2}%", report.hit_ratio());
        self.port.notify()?;
        info!("MMU terminates.");
        Ok(report)
    }
}
