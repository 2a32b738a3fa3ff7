//! Virtual-memory simulator
//!
//! Two parties share one page table. The [`mmu`] walks a list of read and
//! write requests, keeping the access counters of every page up to date, and
//! raises a page fault whenever the requested page is not resident. The
//! [`pager`] owns RAM and the backing store; it resolves each fault by
//! loading the page into a free frame, or by evicting a resident page chosen
//! by one of the replacement algorithms in [`mm`] (random, NFU, aging).
//!
//! Only one fault can be outstanding: after raising it the MMU blocks until
//! the pager resumes it, so the two never mutate the page table at the same
//! time. The handshake itself lives in [`signal`], and [`sim`] puts both
//! parties on their own threads.

#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;

pub mod config;
pub mod error;
pub mod logging;
pub mod mm;
pub mod mmu;
pub mod pager;
pub mod signal;
pub mod sim;
pub mod task;

pub use config::VmConfig;
pub use error::{VmError, VmResult};
pub use mm::ReplacementPolicy;
pub use mmu::{Access, AccessMode, Mmu, MmuReport, Request};
pub use pager::{Pager, PagerReport};
pub use sim::{SimReport, Simulation};
