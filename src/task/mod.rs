//! Identities of the parties taking part in the fault handshake

mod pid;

pub use pid::{pid_alloc, Pid, PidHandle};
