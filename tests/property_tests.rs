//! Property-based tests for the page table invariants.
//!
//! Every trace is replayed request by request, and the page table is checked
//! between handshakes, i.e. each time the MMU gets control back.

use proptest::prelude::*;
use std::collections::BTreeSet;
use vmsim::mm::{PageTable, VirtPageNum};
use vmsim::{Access, AccessMode, ReplacementPolicy, Request, Simulation, VmConfig};

// ============================================================================
// Strategies
// ============================================================================

fn policy() -> impl Strategy<Value = ReplacementPolicy> {
    prop_oneof![
        Just(ReplacementPolicy::Random),
        Just(ReplacementPolicy::Nfu),
        Just(ReplacementPolicy::Aging),
    ]
}

/// (pages, frames, policy, trace) with every request in range
fn run_setup() -> impl Strategy<Value = (usize, usize, ReplacementPolicy, Vec<Request>)> {
    (1usize..8, 1usize..6, policy()).prop_flat_map(|(pages, frames, policy)| {
        let request = (any::<bool>(), 0..pages).prop_map(|(write, page)| {
            if write {
                Request::write(page)
            } else {
                Request::read(page)
            }
        });
        (
            Just(pages),
            Just(frames),
            Just(policy),
            prop::collection::vec(request, 0..60),
        )
    })
}

// ============================================================================
// Checks
// ============================================================================

fn check_table(pt: &PageTable, frames: usize) -> Result<(), TestCaseError> {
    let mut used = BTreeSet::new();
    for (i, pte) in pt.entries().iter().enumerate() {
        prop_assert_eq!(pte.is_valid(), pte.ppn().is_some(), "page {}", i);
        if let Some(ppn) = pte.ppn() {
            prop_assert!(ppn.0 < frames, "page {} in frame {}", i, ppn.0);
            prop_assert!(used.insert(ppn), "frame {} mapped twice", ppn.0);
        }
        if pte.is_dirty() {
            prop_assert!(pte.is_valid(), "page {} dirty but not resident", i);
        }
        prop_assert!(pte.referenced.is_none(), "page {} still referenced", i);
    }
    prop_assert!(pt.resident().count() <= frames);
    prop_assert_eq!(pt.pending_fault(), None);
    Ok(())
}

/// the page the policy evicted must have been its pick on the post-access
/// counters, lowest page first on ties
fn check_victim(
    policy: ReplacementPolicy,
    before: &PageTable,
    after: &PageTable,
) -> Result<(), TestCaseError> {
    let evicted: Vec<VirtPageNum> = before
        .resident()
        .map(|(vpn, _)| vpn)
        .filter(|&vpn| after.translate(vpn).is_none())
        .collect();
    prop_assert!(evicted.len() <= 1);
    let victim = match evicted.first() {
        Some(&vpn) if policy != ReplacementPolicy::Random => vpn,
        _ => return Ok(()),
    };
    let key = |vpn: VirtPageNum| {
        let pte = after.entry(vpn).unwrap();
        match policy {
            ReplacementPolicy::Aging => u32::from(pte.aging),
            _ => pte.counter,
        }
    };
    let expected = before
        .resident()
        .map(|(vpn, _)| vpn)
        .min_by_key(|&vpn| (key(vpn), vpn))
        .unwrap();
    prop_assert_eq!(victim, expected);
    Ok(())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invariants_hold_between_handshakes(
        (pages, frames, policy, trace) in run_setup(),
        seed in any::<u64>()
    ) {
        let config = VmConfig::new(pages, frames, policy).unwrap().with_seed(seed);
        let mut sim = Simulation::start(&config).unwrap();
        let mut expected_aging = vec![0u8; pages];
        let mut expected_counter = vec![0u32; pages];

        for request in trace.iter().copied() {
            let before = sim.mmu().snapshot();
            let was_resident = before.translate(request.vpn).is_some();
            let access = sim.access(request).unwrap();
            let after = sim.mmu().snapshot();

            prop_assert_eq!(access == Access::Hit, was_resident);
            check_table(&after, frames)?;
            if access == Access::Miss && before.resident().count() == frames {
                prop_assert_eq!(
                    before.resident().filter(|(vpn, _)| after.translate(*vpn).is_none()).count(),
                    1
                );
            }
            check_victim(policy, &before, &after)?;

            let pte = after.entry(request.vpn).unwrap();
            prop_assert!(pte.is_valid());
            if request.mode == AccessMode::Write {
                prop_assert!(pte.is_dirty());
            }

            // halve everything, then set the top bit on the accessed page
            for aging in expected_aging.iter_mut() {
                *aging /= 2;
            }
            expected_aging[request.vpn.0] += 0x80;
            expected_counter[request.vpn.0] += 1;
            let aging: Vec<u8> = after.entries().iter().map(|pte| pte.aging).collect();
            let counter: Vec<u32> = after.entries().iter().map(|pte| pte.counter).collect();
            prop_assert_eq!(&aging, &expected_aging);
            prop_assert_eq!(&counter, &expected_counter);
        }

        let report = sim.finish().unwrap();
        prop_assert_eq!(report.hits + report.misses, trace.len());
        prop_assert!(report.disk_accesses >= report.misses);
        prop_assert!(report.disk_accesses <= 2 * report.misses);
        check_table(&report.page_table, frames)?;
    }
}
