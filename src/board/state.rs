//! Game state representation.
//!
//! The single authoritative table the battle engine reads from and commits
//! into: faction holdings, the per-sector force ledger, storm position and
//! turn order. Battles refer to factions and territories by id and look
//! everything else up here.

use serde::{Deserialize, Serialize};

use super::faction::Faction;
use super::forces::{ForcePool, Occupant};
use super::leader::{starting_leaders, Leader, LeaderStatus};
use super::territory::{is_valid_sector, Sector, Territory};

/// Everything a faction holds that a battle may touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionState {
    pub faction: Faction,
    #[serde(default)]
    pub ally: Option<Faction>,
    pub leaders: Vec<Leader>,
    #[serde(default)]
    pub hand: Vec<String>,
    #[serde(default)]
    pub spice: u32,
    #[serde(default)]
    pub reserves: ForcePool,
    /// Units currently in the tanks.
    #[serde(default)]
    pub tanks: ForcePool,
    /// Cumulative units lost to the tanks this game.
    #[serde(default)]
    pub forces_lost: u32,
}

impl FactionState {
    /// Creates a faction with its starting leaders and nothing else.
    pub fn new(faction: Faction) -> Self {
        FactionState {
            faction,
            ally: None,
            leaders: starting_leaders(faction),
            hand: Vec::new(),
            spice: 0,
            reserves: ForcePool::default(),
            tanks: ForcePool::default(),
            forces_lost: 0,
        }
    }

    pub fn holds_card(&self, name: &str) -> bool {
        self.hand.iter().any(|c| c == name)
    }

    /// Removes one copy of a card from hand. Returns false if absent.
    pub fn remove_card(&mut self, name: &str) -> bool {
        match self.hand.iter().position(|c| c == name) {
            Some(i) => {
                self.hand.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn leader(&self, name: &str) -> Option<&Leader> {
        self.leaders.iter().find(|l| l.name == name)
    }

    pub fn leader_mut(&mut self, name: &str) -> Option<&mut Leader> {
        self.leaders.iter_mut().find(|l| l.name == name)
    }

    /// Returns true if at least one leader could fight in `territory`.
    pub fn has_leader_for(&self, territory: Territory) -> bool {
        self.leaders.iter().any(|l| l.can_fight_in(territory))
    }
}

/// Complete state the battle phase operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Sector currently under the storm.
    pub storm: Sector,
    /// Factions in turn order for this round.
    pub turn_order: Vec<Faction>,
    pub factions: Vec<FactionState>,
    /// Per-sector force ledger.
    #[serde(default)]
    pub occupancy: Vec<Occupant>,
    /// Treachery discard pile.
    #[serde(default)]
    pub discard: Vec<String>,
}

impl GameState {
    /// Creates a state with no factions and no forces.
    pub fn empty(storm: Sector) -> Self {
        GameState {
            storm,
            turn_order: Vec::new(),
            factions: Vec::new(),
            occupancy: Vec::new(),
            discard: Vec::new(),
        }
    }

    /// Adds a faction at the end of turn order. Returns false if already present.
    pub fn add_faction(&mut self, faction: Faction) -> bool {
        if self.faction(faction).is_some() {
            return false;
        }
        self.factions.push(FactionState::new(faction));
        self.turn_order.push(faction);
        true
    }

    pub fn faction(&self, faction: Faction) -> Option<&FactionState> {
        self.factions.iter().find(|f| f.faction == faction)
    }

    pub fn faction_mut(&mut self, faction: Faction) -> Option<&mut FactionState> {
        self.factions.iter_mut().find(|f| f.faction == faction)
    }

    /// Forms a symmetric alliance, dissolving any previous ones.
    pub fn set_alliance(&mut self, a: Faction, b: Faction) {
        for fs in &mut self.factions {
            if fs.ally == Some(a) || fs.ally == Some(b) {
                fs.ally = None;
            }
        }
        if let Some(fs) = self.faction_mut(a) {
            fs.ally = Some(b);
        }
        if let Some(fs) = self.faction_mut(b) {
            fs.ally = Some(a);
        }
    }

    pub fn ally_of(&self, faction: Faction) -> Option<Faction> {
        self.faction(faction).and_then(|f| f.ally)
    }

    /// Position of `faction` in turn order; factions not seated sort last.
    pub fn turn_position(&self, faction: Faction) -> usize {
        self.turn_order
            .iter()
            .position(|f| *f == faction)
            .unwrap_or(usize::MAX)
    }

    /// Adds units to a sector of a territory. Returns false if the sector is
    /// not part of the territory.
    pub fn place_forces(
        &mut self,
        territory: Territory,
        sector: Sector,
        faction: Faction,
        forces: ForcePool,
    ) -> bool {
        let valid = if territory.is_safe() {
            sector == 0
        } else {
            is_valid_sector(sector) && territory.contains_sector(sector)
        };
        if !valid {
            return false;
        }
        match self.occupant_mut(territory, sector, faction) {
            Some(occ) => occ.forces.absorb(forces),
            None => self.occupancy.push(Occupant { territory, sector, faction, forces }),
        }
        true
    }

    /// Places a faction's disguised token in a sector.
    pub fn place_disguised_token(&mut self, territory: Territory, sector: Sector, faction: Faction) -> bool {
        self.place_forces(territory, sector, faction, ForcePool::disguised_token())
    }

    /// Units of `faction` in one sector.
    pub fn forces_at(&self, territory: Territory, sector: Sector, faction: Faction) -> ForcePool {
        self.occupancy
            .iter()
            .find(|o| o.territory == territory && o.sector == sector && o.faction == faction)
            .map(|o| o.forces)
            .unwrap_or_default()
    }

    /// All occupancy entries of a territory.
    pub fn occupants_in(&self, territory: Territory) -> impl Iterator<Item = &Occupant> + '_ {
        self.occupancy.iter().filter(move |o| o.territory == territory)
    }

    fn occupant_mut(&mut self, territory: Territory, sector: Sector, faction: Faction) -> Option<&mut Occupant> {
        self.occupancy
            .iter_mut()
            .find(|o| o.territory == territory && o.sector == sector && o.faction == faction)
    }

    /// Sends up to the requested units from a sector to the faction's tanks.
    /// Returns the units actually removed.
    pub fn destroy_forces(
        &mut self,
        territory: Territory,
        sector: Sector,
        faction: Faction,
        regular: u32,
        special: u32,
    ) -> ForcePool {
        let removed = match self.occupant_mut(territory, sector, faction) {
            Some(occ) => occ.forces.take(regular, special),
            None => return ForcePool::default(),
        };
        if let Some(fs) = self.faction_mut(faction) {
            fs.tanks.absorb(removed);
            fs.forces_lost = fs.forces_lost.saturating_add(removed.total());
        }
        self.prune();
        removed
    }

    /// Removes a disguised token from a sector. Returns false if none was there.
    pub fn remove_disguised_token(&mut self, territory: Territory, sector: Sector, faction: Faction) -> bool {
        let removed = match self.occupant_mut(territory, sector, faction) {
            Some(occ) if occ.forces.disguised => {
                occ.forces.disguised = false;
                true
            }
            _ => false,
        };
        self.prune();
        removed
    }

    /// Flips a disguised token face up, replacing it with up to `regular`
    /// units from the owner's reserves. Returns the number of units placed,
    /// or None if there was no token in that sector.
    pub fn reveal_disguised_token(
        &mut self,
        territory: Territory,
        sector: Sector,
        faction: Faction,
        regular: u32,
    ) -> Option<u32> {
        if !self.remove_disguised_token(territory, sector, faction) {
            return None;
        }
        let placed = match self.faction_mut(faction) {
            Some(fs) => fs.reserves.take(regular, 0).regular,
            None => 0,
        };
        if placed > 0 {
            self.place_forces(territory, sector, faction, ForcePool::new(placed, 0));
        }
        Some(placed)
    }

    /// Sends a leader to the tanks. Returns false if the holder has no such leader.
    pub fn kill_leader(&mut self, holder: Faction, name: &str) -> bool {
        match self.faction_mut(holder).and_then(|fs| fs.leader_mut(name)) {
            Some(leader) => {
                leader.status = LeaderStatus::Tanks;
                true
            }
            None => false,
        }
    }

    /// Returns every leader that fought this round to the available pool.
    pub fn reset_fought_leaders(&mut self) {
        for fs in &mut self.factions {
            for leader in &mut fs.leaders {
                if matches!(leader.status, LeaderStatus::Fought { .. }) {
                    leader.status = LeaderStatus::Available;
                }
            }
        }
    }

    fn prune(&mut self) {
        self.occupancy.retain(|o| !o.forces.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_factions() -> GameState {
        let mut state = GameState::empty(1);
        state.add_faction(Faction::Atreides);
        state.add_faction(Faction::Harkonnen);
        state
    }

    #[test]
    fn empty_state_has_no_forces() {
        let state = GameState::empty(3);
        assert!(state.occupancy.is_empty());
        assert!(state.factions.is_empty());
    }

    #[test]
    fn add_faction_rejects_duplicate() {
        let mut state = two_factions();
        assert!(!state.add_faction(Faction::Atreides));
        assert_eq!(state.turn_order, vec![Faction::Atreides, Faction::Harkonnen]);
        assert_eq!(state.faction(Faction::Atreides).unwrap().leaders.len(), 5);
    }

    #[test]
    fn place_forces_accumulates_per_sector() {
        let mut state = two_factions();
        assert!(state.place_forces(Territory::ImperialBasin, 9, Faction::Atreides, ForcePool::new(2, 0)));
        assert!(state.place_forces(Territory::ImperialBasin, 9, Faction::Atreides, ForcePool::new(3, 0)));
        assert_eq!(state.forces_at(Territory::ImperialBasin, 9, Faction::Atreides), ForcePool::new(5, 0));
        assert_eq!(state.occupancy.len(), 1);
    }

    #[test]
    fn place_forces_rejects_foreign_sector() {
        let mut state = two_factions();
        assert!(!state.place_forces(Territory::Arrakeen, 11, Faction::Atreides, ForcePool::new(1, 0)));
        assert!(!state.place_forces(Territory::PolarSink, 3, Faction::Atreides, ForcePool::new(1, 0)));
        assert!(state.place_forces(Territory::PolarSink, 0, Faction::Atreides, ForcePool::new(1, 0)));
    }

    #[test]
    fn destroy_forces_moves_to_tanks() {
        let mut state = two_factions();
        state.place_forces(Territory::Carthag, 11, Faction::Harkonnen, ForcePool::new(4, 0));
        let removed = state.destroy_forces(Territory::Carthag, 11, Faction::Harkonnen, 10, 0);
        assert_eq!(removed, ForcePool::new(4, 0));
        let hk = state.faction(Faction::Harkonnen).unwrap();
        assert_eq!(hk.tanks, ForcePool::new(4, 0));
        assert_eq!(hk.forces_lost, 4);
        assert!(state.occupancy.is_empty());
    }

    #[test]
    fn alliance_is_symmetric_and_exclusive() {
        let mut state = two_factions();
        state.add_faction(Faction::Fremen);
        state.set_alliance(Faction::Atreides, Faction::Harkonnen);
        assert_eq!(state.ally_of(Faction::Harkonnen), Some(Faction::Atreides));
        state.set_alliance(Faction::Atreides, Faction::Fremen);
        assert_eq!(state.ally_of(Faction::Harkonnen), None);
        assert_eq!(state.ally_of(Faction::Fremen), Some(Faction::Atreides));
    }

    #[test]
    fn reveal_token_draws_from_reserves() {
        let mut state = GameState::empty(1);
        state.add_faction(Faction::Richese);
        state.faction_mut(Faction::Richese).unwrap().reserves = ForcePool::new(2, 0);
        state.place_disguised_token(Territory::Basin, 12, Faction::Richese);
        assert_eq!(state.reveal_disguised_token(Territory::Basin, 12, Faction::Richese, 3), Some(2));
        assert_eq!(state.forces_at(Territory::Basin, 12, Faction::Richese), ForcePool::new(2, 0));
        assert_eq!(state.reveal_disguised_token(Territory::Basin, 12, Faction::Richese, 3), None);
    }

    #[test]
    fn turn_position_unknown_sorts_last() {
        let state = two_factions();
        assert_eq!(state.turn_position(Faction::Harkonnen), 1);
        assert_eq!(state.turn_position(Faction::Ecaz), usize::MAX);
    }
}
