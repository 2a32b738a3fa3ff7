//! Constants and run configuration used in the simulator

use crate::error::{VmError, VmResult};
use crate::mm::ReplacementPolicy;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// bytes held by one page (and one frame)
pub const PAGE_SIZE: usize = 8;
/// width of the aging counter in bits
pub const AGING_BITS: u32 = u8::BITS;
/// value added to the accessed page's aging counter after the decay
pub const AGING_HIGH_BIT: u8 = 1 << (AGING_BITS - 1);
/// depth of the fault-notify and resume channels
pub const SIGNAL_CHANNEL_DEPTH: usize = 1;

/// parameters the pager is started with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmConfig {
    pub page_count: usize,
    pub frame_count: usize,
    pub policy: ReplacementPolicy,
    /// fixed seed for backing-store content and the random policy
    pub seed: Option<u64>,
}

impl VmConfig {
    pub fn new(page_count: usize, frame_count: usize, policy: ReplacementPolicy) -> VmResult<Self> {
        if page_count == 0 {
            return Err(VmError::InvalidArgument("page count must be positive".into()));
        }
        if frame_count == 0 {
            return Err(VmError::InvalidArgument("frame count must be positive".into()));
        }
        Ok(Self {
            page_count,
            frame_count,
            policy,
            seed: None,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// rng for this run: seeded when a seed was given, from entropy otherwise
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
