//! Force pools and per-sector occupancy entries.

use serde::{Deserialize, Serialize};

use super::faction::Faction;
use super::territory::{Sector, Territory};

/// Units of one faction in one place: regular units, special (elite or
/// non-combat) units, and an optional disguised token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForcePool {
    #[serde(default)]
    pub regular: u32,
    #[serde(default)]
    pub special: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disguised: bool,
}

impl ForcePool {
    pub const fn new(regular: u32, special: u32) -> Self {
        ForcePool { regular, special, disguised: false }
    }

    /// A pool holding only a disguised token.
    pub const fn disguised_token() -> Self {
        ForcePool { regular: 0, special: 0, disguised: true }
    }

    /// Number of real units, ignoring the disguised token.
    pub const fn total(&self) -> u32 {
        self.regular.saturating_add(self.special)
    }

    pub const fn is_empty(&self) -> bool {
        self.regular == 0 && self.special == 0 && !self.disguised
    }

    /// Units of `faction` that count as fighting forces.
    pub fn fighting(&self, faction: Faction) -> ForcePool {
        let special = if faction.capabilities().special_is_noncombat() { 0 } else { self.special };
        ForcePool::new(self.regular, special)
    }

    /// Adds another pool's units to this one.
    pub fn absorb(&mut self, other: ForcePool) {
        self.regular = self.regular.saturating_add(other.regular);
        self.special = self.special.saturating_add(other.special);
        self.disguised |= other.disguised;
    }

    /// Removes up to the requested units, returning what was actually removed.
    pub fn take(&mut self, regular: u32, special: u32) -> ForcePool {
        let r = regular.min(self.regular);
        let s = special.min(self.special);
        self.regular -= r;
        self.special -= s;
        ForcePool::new(r, s)
    }
}

impl std::fmt::Display for ForcePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.special > 0 {
            write!(f, "{} + {}*", self.regular, self.special)?;
        } else {
            write!(f, "{}", self.regular)?;
        }
        if self.disguised {
            f.write_str(" + token")?;
        }
        Ok(())
    }
}

/// One faction's units in one sector of a territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub territory: Territory,
    pub sector: Sector,
    pub faction: Faction,
    pub forces: ForcePool,
}
