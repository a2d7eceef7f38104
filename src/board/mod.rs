//! Board representation and game-state types.
//!
//! Contains factions and their capabilities, territories and storm sectors,
//! leaders, treachery cards, force pools, and the overall game state.

pub mod card;
pub mod faction;
pub mod forces;
pub mod leader;
pub mod state;
pub mod territory;

pub use card::{card_kind, CardKind, DefenseClass, WeaponClass, CARD_CATALOGUE};
pub use faction::{
    AllianceFolding, BonusStrengthRule, Capabilities, Faction, SpecialForces, SpecialRole,
    ALL_FACTIONS, FACTION_COUNT,
};
pub use forces::{ForcePool, Occupant};
pub use leader::{starting_leaders, Leader, LeaderStatus, LeaderValue};
pub use state::{FactionState, GameState};
pub use territory::{
    is_valid_sector, storm_order, Sector, Territory, TerritoryKind, ALL_TERRITORIES,
    SECTOR_COUNT, TERRITORY_COUNT,
};
