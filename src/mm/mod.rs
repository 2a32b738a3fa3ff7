//! Memory management implementation
//!
//! Everything the pager owns or shares is implemented here: the page table
//! both sides agree on, the frame store standing in for RAM, the backing
//! store standing in for the disk, and the replacement algorithms choosing
//! which resident page leaves RAM when it is full.

mod address;
mod backing_store;
mod frame_allocator;
mod page_table;
mod replacement;

pub use address::{PhysPageNum, VirtPageNum};
pub use backing_store::BackingStore;
pub use frame_allocator::{FrameStore, PageData};
pub use page_table::{PTEFlags, PageTable, PageTableEntry};
pub use replacement::ReplacementPolicy;
