//! Error type shared by the pager and the MMU

use core::fmt;

/// every fatal condition of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// bad process parameter (counts, missing arguments)
    InvalidArgument(String),
    /// requested page lies outside `[0, page_count)`
    PageOutOfRange { page: usize, page_count: usize },
    /// replacement policy name not in `random | nfu | aging`
    UnknownPolicy(String),
    /// request token that could not be parsed
    InvalidRequest(String),
    /// frame store, backing store or page table could not be allocated
    OutOfMemory(&'static str),
    /// the host refused a resource, e.g. a thread
    Io(String),
    /// handshake broken: peer gone, second outstanding fault, unknown requester
    Protocol(&'static str),
}

pub type VmResult<T> = Result<T, VmError>;

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Self::PageOutOfRange { page, page_count } => write!(
                f,
                "page {} out of range, page table holds {} pages",
                page, page_count
            ),
            Self::UnknownPolicy(name) => write!(
                f,
                "unknown page replacement algorithm `{}`, expected random, nfu or aging",
                name
            ),
            Self::InvalidRequest(token) => write!(f, "invalid request `{}`", token),
            Self::OutOfMemory(what) => write!(f, "out of memory while allocating {}", what),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
            Self::Protocol(msg) => write!(f, "protocol violation: {}", msg),
        }
    }
}

impl std::error::Error for VmError {}

impl From<std::io::Error> for VmError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}
