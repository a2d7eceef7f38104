//! Factions and their battle capabilities.
//!
//! Faction-specific rules are expressed as data in a compile-time capability
//! table indexed by the `Faction` enum discriminant. The battle engine asks a
//! faction what it can do instead of matching on who it is.

use serde::{Deserialize, Serialize};

/// The number of playable factions.
pub const FACTION_COUNT: usize = 12;

/// One of the playable factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Faction {
    Atreides = 0,
    Harkonnen = 1,
    Emperor = 2,
    Fremen = 3,
    #[serde(rename = "bg")]
    BeneGesserit = 4,
    Guild = 5,
    Ix = 6,
    #[serde(rename = "bt")]
    Tleilaxu = 7,
    Choam = 8,
    Richese = 9,
    Ecaz = 10,
    Moritani = 11,
}

/// All factions in index order.
pub const ALL_FACTIONS: [Faction; FACTION_COUNT] = [
    Faction::Atreides,
    Faction::Harkonnen,
    Faction::Emperor,
    Faction::Fremen,
    Faction::BeneGesserit,
    Faction::Guild,
    Faction::Ix,
    Faction::Tleilaxu,
    Faction::Choam,
    Faction::Richese,
    Faction::Ecaz,
    Faction::Moritani,
];

impl Faction {
    /// Returns the lowercase identifier used in commands and saved state.
    pub const fn id(self) -> &'static str {
        FACTION_INFO[self as usize].id
    }

    /// Returns the display name used in announcements.
    pub const fn name(self) -> &'static str {
        FACTION_INFO[self as usize].name
    }

    /// Returns the battle capabilities of this faction.
    pub const fn capabilities(self) -> &'static Capabilities {
        &FACTION_INFO[self as usize].capabilities
    }

    /// Parses a faction from its lowercase identifier.
    pub fn from_id(id: &str) -> Option<Faction> {
        ALL_FACTIONS.iter().copied().find(|f| f.id() == id)
    }
}

impl std::fmt::Display for Faction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a faction's distinguished units behave in battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialRole {
    /// Elite units worth two on the battle wheel, except against the listed factions.
    Elite { negated_by: &'static [Faction] },
    /// Units that occupy territory but never fight.
    NonCombat,
}

/// A faction's distinguished unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialForces {
    pub name: &'static str,
    pub role: SpecialRole,
}

/// A one-off strength bonus unlocked by accumulated losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusStrengthRule {
    pub name: &'static str,
    pub bonus: u32,
    pub min_losses: u32,
}

/// Who speaks for a folded alliance side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllianceFolding {
    /// The faction leads when it is first in turn order.
    Leads,
    /// The faction's ally always leads a shared side.
    DefersToAlly,
}

/// The set of optional battle capabilities a faction exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub special_forces: Option<SpecialForces>,
    pub disguised_token: bool,
    pub bonus_strength: Option<BonusStrengthRule>,
    pub fights_without_spice: bool,
    pub alliance_folding: AllianceFolding,
    pub captures_leaders: bool,
}

impl Capabilities {
    /// Returns true if this faction's special units never fight.
    pub fn special_is_noncombat(&self) -> bool {
        matches!(
            self.special_forces,
            Some(SpecialForces { role: SpecialRole::NonCombat, .. })
        )
    }

    /// Wheel strength of one special unit fighting against the factions of
    /// the opposing side, in half points.
    pub fn special_strength_halves(&self, opponents: &[Faction]) -> u32 {
        match self.special_forces {
            Some(SpecialForces { role: SpecialRole::Elite { negated_by }, .. }) => {
                if opponents.iter().any(|o| negated_by.contains(o)) {
                    2
                } else {
                    4
                }
            }
            Some(SpecialForces { role: SpecialRole::NonCombat, .. }) => 0,
            None => 2,
        }
    }
}

const PLAIN: Capabilities = Capabilities {
    special_forces: None,
    disguised_token: false,
    bonus_strength: None,
    fights_without_spice: false,
    alliance_folding: AllianceFolding::Leads,
    captures_leaders: false,
};

/// Static metadata for a faction.
pub struct FactionInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub capabilities: Capabilities,
}

/// Compile-time lookup table: index by `Faction as usize`.
pub static FACTION_INFO: [FactionInfo; FACTION_COUNT] = [
    FactionInfo {
        id: "atreides",
        name: "Atreides",
        capabilities: Capabilities {
            bonus_strength: Some(BonusStrengthRule { name: "Kwisatz Haderach", bonus: 2, min_losses: 7 }),
            ..PLAIN
        },
    },
    FactionInfo {
        id: "harkonnen",
        name: "Harkonnen",
        capabilities: Capabilities { captures_leaders: true, ..PLAIN },
    },
    FactionInfo {
        id: "emperor",
        name: "Emperor",
        capabilities: Capabilities {
            special_forces: Some(SpecialForces {
                name: "Sardaukar",
                role: SpecialRole::Elite { negated_by: &[Faction::Fremen] },
            }),
            ..PLAIN
        },
    },
    FactionInfo {
        id: "fremen",
        name: "Fremen",
        capabilities: Capabilities {
            special_forces: Some(SpecialForces {
                name: "Fedaykin",
                role: SpecialRole::Elite { negated_by: &[] },
            }),
            fights_without_spice: true,
            ..PLAIN
        },
    },
    FactionInfo {
        id: "bg",
        name: "Bene Gesserit",
        capabilities: Capabilities {
            special_forces: Some(SpecialForces { name: "Advisor", role: SpecialRole::NonCombat }),
            ..PLAIN
        },
    },
    FactionInfo { id: "guild", name: "Spacing Guild", capabilities: PLAIN },
    FactionInfo {
        id: "ix",
        name: "Ix",
        capabilities: Capabilities {
            special_forces: Some(SpecialForces {
                name: "Cyborg",
                role: SpecialRole::Elite { negated_by: &[] },
            }),
            ..PLAIN
        },
    },
    FactionInfo { id: "bt", name: "Bene Tleilax", capabilities: PLAIN },
    FactionInfo { id: "choam", name: "CHOAM", capabilities: PLAIN },
    FactionInfo {
        id: "richese",
        name: "Richese",
        capabilities: Capabilities { disguised_token: true, ..PLAIN },
    },
    FactionInfo {
        id: "ecaz",
        name: "Ecaz",
        capabilities: Capabilities { alliance_folding: AllianceFolding::DefersToAlly, ..PLAIN },
    },
    FactionInfo { id: "moritani", name: "Moritani", capabilities: PLAIN },
];
