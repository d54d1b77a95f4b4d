//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the economy produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Economy values are `f32`, so determinism rests on doing the same float
//! operations in the same order:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Structures are always visited in sorted ID order, and neighbor lists
//!   are sorted before their modifiers are multiplied in.
//!
//! - **Neighbor inclusion**: Positions are fixed-point, so whether a
//!   structure is inside the interference radius never depends on float
//!   rounding.
//!
//! - **Wall clock**: The world never reads time; the host advances it.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use bp_core::world::SimulationWorld;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of frames simulated.
    pub frames: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Economy is non-deterministic!\n\
                 Runs: {}\n\
                 Frames: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.frames,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a setup several times and verify every run ends in the same state.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `frames` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one step
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    frames: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..frames {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        frames,
    }
}

/// Advance a world by one calculation period and run a frame.
pub fn step_world(world: &mut SimulationWorld) {
    crate::fixtures::step_period(world);
}

/// Run a world setup twice for `periods` economy periods and compare hashes.
pub fn verify_world_determinism<F>(setup_fn: F, periods: u64) -> bool
where
    F: Fn() -> SimulationWorld,
{
    verify_determinism(2, periods, &setup_fn, step_world, SimulationWorld::state_hash)
        .is_deterministic
}

/// Run `num_worlds` copies on scoped threads and collect their final hashes.
///
/// Catches anything that leaks thread-local or address-dependent state
/// into the economy.
pub fn run_parallel_worlds<F>(setup_fn: F, num_worlds: usize, periods: u64) -> DeterminismResult
where
    F: Fn() -> SimulationWorld + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_worlds)
            .map(|_| {
                s.spawn(|| {
                    let mut world = setup_fn();
                    for _ in 0..periods {
                        step_world(&mut world);
                    }
                    world.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_default())
            .collect()
    });

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        frames: periods,
    }
}

/// Compare two runs period by period, finding the first divergence.
///
/// Returns `None` if the runs never differ, `Some(period)` otherwise.
pub fn find_first_divergence<F>(setup_fn: F, periods: u64) -> Option<u64>
where
    F: Fn() -> SimulationWorld,
{
    let mut world1 = setup_fn();
    let mut world2 = setup_fn();

    if world1.state_hash() != world2.state_hash() {
        return Some(0);
    }

    for period in 1..=periods {
        step_world(&mut world1);
        step_world(&mut world2);

        if world1.state_hash() != world2.state_hash() {
            return Some(period);
        }
    }

    None
}

/// Verify that a snapshot round trip preserves world state exactly.
pub fn verify_serialization_determinism<F>(setup_fn: F, periods: u64) -> bool
where
    F: Fn() -> SimulationWorld,
{
    let mut world = setup_fn();

    for _ in 0..periods {
        step_world(&mut world);
    }

    let hash_before = world.state_hash();

    let Ok(bytes) = world.serialize() else {
        return false;
    };
    let Ok(restored) = SimulationWorld::deserialize(&bytes) else {
        return false;
    };

    hash_before == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for economy tests.
pub mod strategies {
    use bp_core::components::StructureKind;
    use bp_core::math::Vec3Fixed;
    use proptest::prelude::*;

    /// A coordinate within a typical map, in whole units.
    pub fn arb_coord() -> impl Strategy<Value = i32> {
        -4000i32..4000i32
    }

    /// A position on the ground plane.
    pub fn arb_position() -> impl Strategy<Value = Vec3Fixed> {
        (arb_coord(), arb_coord()).prop_map(|(x, y)| Vec3Fixed::from_units(x, y, 0))
    }

    /// A mining structure kind.
    pub fn arb_mining_kind() -> impl Strategy<Value = StructureKind> {
        prop_oneof![Just(StructureKind::Drill), Just(StructureKind::Leech)]
    }

    /// A mining structure placement.
    pub fn arb_miner() -> impl Strategy<Value = (StructureKind, Vec3Fixed)> {
        (arb_mining_kind(), arb_position())
    }

    /// Up to `max` mining structure placements.
    pub fn arb_miners(max: usize) -> impl Strategy<Value = Vec<(StructureKind, Vec3Fixed)>> {
        prop::collection::vec(arb_miner(), 0..=max)
    }

    /// A distance in `[0, 2 * range]` paired with a positive range.
    pub fn arb_distance_in_range() -> impl Strategy<Value = (f32, f32)> {
        (1.0f32..5000.0).prop_flat_map(|range| (0.0f32..=2.0 * range, Just(range)))
    }

    /// Any ledger adjustment, including large negatives.
    pub fn arb_amount() -> impl Strategy<Value = f32> {
        -1.0e6f32..1.0e6f32
    }
}
