//! Battle determination and resolution.
//!
//! Leaf first: `arena` groups sectors, `battle` builds sides and holds
//! plans, `plan` validates them, `resolution` computes and commits the
//! outcome, and `phase` drives the round.

pub mod arena;
#[allow(clippy::module_inception)]
pub mod battle;
pub mod phase;
pub mod plan;
pub mod resolution;

pub use arena::{all_arenas, arenas_for, Arena};
pub use battle::{
    aggregate_forces, choose_aggressor, fold_alliances, is_contested, sides_in, Battle,
    OutcomeOverride, Side, SideId,
};
pub use phase::{contested_arenas, ArenaSummary, Battles, PhaseError, PhaseStep};
pub use plan::{validate_plan, BattlePlan, PlanContext, PlanError};
pub use resolution::{
    allocate_dial, commit_outcome, compute_outcome, dialed_strength, settle_obligation,
    BattleResult, Obligation, ObligationChoice, SideOutcome, Strength, CAPTURE_KILL_REWARD,
};
