//! Page replacement: picks the resident page to evict when RAM is full.

use super::{PageTable, VirtPageNum};
use crate::error::VmError;
use core::fmt::{self, Display, Formatter};
use core::str::FromStr;
use rand::seq::IteratorRandom;
use rand::Rng;

/// replacement algorithm, chosen once when the pager starts
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReplacementPolicy {
    /// uniformly among resident pages
    Random,
    /// not frequently used: smallest access counter
    Nfu,
    /// smallest aging counter
    Aging,
}

impl ReplacementPolicy {
    /// Resident page to evict, `None` only if nothing is resident. Ties go to
    /// the lowest page number. The page table is not modified.
    pub fn select_victim<R: Rng>(
        &self,
        page_table: &PageTable,
        rng: &mut R,
    ) -> Option<VirtPageNum> {
        match self {
            Self::Random => page_table.resident().map(|(vpn, _)| vpn).choose(rng),
            Self::Nfu => page_table
                .resident()
                .min_by_key(|(vpn, pte)| (pte.counter, *vpn))
                .map(|(vpn, _)| vpn),
            Self::Aging => page_table
                .resident()
                .min_by_key(|(vpn, pte)| (pte.aging, *vpn))
                .map(|(vpn, _)| vpn),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Nfu => "nfu",
            Self::Aging => "aging",
        }
    }
}

impl FromStr for ReplacementPolicy {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "nfu" => Ok(Self::Nfu),
            "aging" => Ok(Self::Aging),
            _ => Err(VmError::UnknownPolicy(s.into())),
        }
    }
}

impl Display for ReplacementPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
