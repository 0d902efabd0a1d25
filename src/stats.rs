//! Per-step counters: the observable outputs of a [`crate::world::World`]
//! step, useful for tests and for tuning iteration counts.

/// Accumulates over one call to [`crate::world::World::step`]. Field-wise
/// equality is stable across runs given identical inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepStats {
    // Pair-update (pre-solve) counters.
    pub proxies_created: u32,
    pub proxies_moved: u32,
    pub contacts_added: u32,
    pub contacts_destroyed: u32,
    pub contacts_updated: u32,
    pub contacts_skipped: u32,
    pub contacts_ignored: u32,

    // Regular (discrete) solve counters.
    pub islands_found: u32,
    pub islands_solved: u32,
    pub bodies_slept: u32,
    pub min_separation: f32,
    pub max_incremental_impulse: f32,
    pub velocity_iterations_sum: u32,
    pub position_iterations_sum: u32,

    // Continuous (TOI) solve counters.
    pub toi_contacts_found: u32,
    pub toi_contacts_at_max_substeps: u32,
    pub max_distance_iters: u32,
    pub max_toi_root_iters: u32,
    pub max_toi_iters: u32,
}

impl StepStats {
    pub fn new() -> Self {
        StepStats { min_separation: 0.0, ..Default::default() }
    }
}
