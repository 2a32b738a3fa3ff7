//! Fault-notify / resume handshake between an MMU and the pager
//!
//! Neither message carries a payload: the receiver re-reads the shared page
//! table to find out what changed. Both channels hold a single message, and
//! a closed channel means the peer is gone.

use crate::config::SIGNAL_CHANNEL_DEPTH;
use crate::error::{VmError, VmResult};
use crate::mm::PageTable;
use crate::task::{Pid, PidHandle};
use spin::Mutex;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;

/// MMU -> pager: a fault is pending, or nothing is and the run is over
#[derive(Debug)]
pub struct FaultNotify;

/// pager -> MMU: the faulting page is resident now
#[derive(Debug)]
pub struct Resume;

pub fn channel<T>() -> (SyncSender<T>, Receiver<T>) {
    sync_channel(SIGNAL_CHANNEL_DEPTH)
}

/// an MMU's end of the handshake, handed out by `Pager::attach`
pub struct MmuPort {
    pub(crate) pid: PidHandle,
    pub(crate) page_table: Arc<Mutex<PageTable>>,
    pub(crate) notify: SyncSender<FaultNotify>,
    pub(crate) resume: Receiver<Resume>,
}

impl MmuPort {
    pub fn pid(&self) -> Pid {
        self.pid.0
    }
    pub fn page_table(&self) -> &Arc<Mutex<PageTable>> {
        &self.page_table
    }
    pub fn notify(&self) -> VmResult<()> {
        self.notify
            .send(FaultNotify)
            .map_err(|_| VmError::Protocol("pager is gone"))
    }
    /// the single suspension point of an MMU
    pub fn wait_resume(&self) -> VmResult<()> {
        self.resume
            .recv()
            .map(|Resume| ())
            .map_err(|_| VmError::Protocol("pager hung up before resuming"))
    }
}
