//! A single arena's contest.
//!
//! Aggregates the forces in an arena into sides, folds allies present
//! together into one side, picks the aggressor by turn order and holds the
//! two sealed plans until both are in.

use serde::{Deserialize, Serialize};

use crate::board::{Faction, ForcePool, GameState};
use crate::config::RulesConfig;

use super::arena::Arena;
use super::phase::PhaseError;
use super::plan::{validate_plan, BattlePlan, PlanContext, PlanError};

/// Identifies one side of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideId {
    /// A faction, possibly speaking for a folded alliance.
    Faction(Faction),
    /// A face-down token whose owner is not yet public.
    Disguised(Faction),
}

impl SideId {
    /// The faction that submits plans and pays for this side.
    pub const fn owner(self) -> Faction {
        match self {
            SideId::Faction(f) | SideId::Disguised(f) => f,
        }
    }

    pub const fn is_disguised(self) -> bool {
        matches!(self, SideId::Disguised(_))
    }
}

impl std::fmt::Display for SideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SideId::Faction(faction) => f.write_str(faction.name()),
            SideId::Disguised(_) => f.write_str("Unknown"),
        }
    }
}

/// Fighting units of one side, per member faction, lead first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Side {
    pub id: SideId,
    pub members: Vec<(Faction, ForcePool)>,
}

impl Side {
    pub fn lead(&self) -> Faction {
        self.id.owner()
    }

    /// Combined fighting units of every member.
    pub fn forces(&self) -> ForcePool {
        let mut total = ForcePool::default();
        for (_, pool) in &self.members {
            total.absorb(*pool);
        }
        total
    }

    pub fn includes(&self, faction: Faction) -> bool {
        self.members.iter().any(|(f, _)| *f == faction)
    }

    /// Display name: "Unknown" for a disguised side, member names otherwise.
    pub fn label(&self) -> String {
        if self.id.is_disguised() {
            return self.id.to_string();
        }
        let names: Vec<&str> = self.members.iter().map(|(f, _)| f.name()).collect();
        names.join(" & ")
    }

    /// Returns true if the two sides are enemies: no shared member and no alliance between them.
    pub fn opposes(&self, other: &Side, game: &GameState) -> bool {
        !self.members.iter().any(|(a, _)| {
            other
                .members
                .iter()
                .any(|(b, _)| a == b || game.ally_of(*a) == Some(*b))
        })
    }
}

/// Sums fighting units per faction across the arena's sectors.
///
/// Non-combat units are ignored. A disguised token becomes its own side
/// labeled "Unknown". Sides come back in turn order of their owner.
pub fn aggregate_forces(arena: &Arena, game: &GameState) -> Vec<Side> {
    let mut sides: Vec<Side> = Vec::new();
    let mut add = |id: SideId, pool: ForcePool| match sides.iter_mut().find(|s| s.id == id) {
        Some(side) => side.members[0].1.absorb(pool),
        None => sides.push(Side { id, members: vec![(id.owner(), pool)] }),
    };

    for occ in game.occupants_in(arena.territory).filter(|o| arena.contains(o.sector)) {
        let fighting = occ.forces.fighting(occ.faction);
        if fighting.total() > 0 {
            add(SideId::Faction(occ.faction), fighting);
        }
        if occ.forces.disguised {
            add(SideId::Disguised(occ.faction), ForcePool::disguised_token());
        }
    }

    sides.sort_by_key(|s| (game.turn_position(s.lead()), s.id));
    sides
}

/// Folds allied factions present in the same arena into one side.
pub fn fold_alliances(sides: Vec<Side>, game: &GameState) -> Vec<Side> {
    let mut folded: Vec<Side> = Vec::new();
    for side in sides {
        if let SideId::Faction(faction) = side.id {
            let partner = game
                .ally_of(faction)
                .and_then(|ally| folded.iter_mut().find(|s| s.id == SideId::Faction(ally)));
            if let Some(existing) = partner {
                existing.members.extend(side.members);
                let lead = alliance_lead(&existing.members, game);
                existing.members.sort_by_key(|(f, _)| *f != lead);
                existing.id = SideId::Faction(lead);
                continue;
            }
        }
        folded.push(side);
    }
    folded.sort_by_key(|s| (game.turn_position(s.lead()), s.id));
    folded
}

fn alliance_lead(members: &[(Faction, ForcePool)], game: &GameState) -> Faction {
    use crate::board::AllianceFolding;
    let leaders: Vec<Faction> = members
        .iter()
        .map(|(f, _)| *f)
        .filter(|f| f.capabilities().alliance_folding == AllianceFolding::Leads)
        .collect();
    let pool = if leaders.is_empty() {
        members.iter().map(|(f, _)| *f).collect()
    } else {
        leaders
    };
    pool.into_iter()
        .min_by_key(|f| game.turn_position(*f))
        .unwrap_or(members[0].0)
}

/// Fighting sides of an arena after alliance folding.
pub fn sides_in(arena: &Arena, game: &GameState) -> Vec<Side> {
    fold_alliances(aggregate_forces(arena, game), game)
}

/// Returns true if at least two of the sides are enemies.
pub fn is_contested(sides: &[Side], game: &GameState) -> bool {
    sides
        .iter()
        .enumerate()
        .any(|(i, a)| sides[i + 1..].iter().any(|b| a.opposes(b, game)))
}

/// The earliest side in turn order that has an enemy. Disguised sides never
/// act first.
pub fn choose_aggressor(sides: &[Side], game: &GameState) -> Option<SideId> {
    sides
        .iter()
        .filter(|s| !s.id.is_disguised())
        .find(|s| sides.iter().any(|o| s.opposes(o, game)))
        .map(|s| s.id)
}

/// How an external effect decides the battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeOverride {
    /// The named side wins; casualties follow the normal rules.
    Winner(SideId),
    /// The named side exposes the opposing leader as a traitor: it wins,
    /// loses nothing, and the opposing leader dies.
    Traitor(SideId),
}

/// One arena's contest between an aggressor and its chosen opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    pub arena: Arena,
    /// Every fighting side present when the battle was activated.
    pub sides: Vec<Side>,
    pub aggressor: SideId,
    pub opponent: Option<SideId>,
    pub aggressor_plan: Option<BattlePlan>,
    pub opponent_plan: Option<BattlePlan>,
    /// Sides whose plans are announced on submission.
    #[serde(default)]
    pub revealed: Vec<SideId>,
    #[serde(default)]
    pub outcome_override: Option<OutcomeOverride>,
}

impl Battle {
    /// Builds the battle for an arena, or None if it holds no contest.
    pub fn new(arena: Arena, game: &GameState) -> Option<Battle> {
        let sides = sides_in(&arena, game);
        let aggressor = choose_aggressor(&sides, game)?;
        let mut battle = Battle {
            arena,
            sides,
            aggressor,
            opponent: None,
            aggressor_plan: None,
            opponent_plan: None,
            revealed: Vec::new(),
            outcome_override: None,
        };
        let opponents = battle.opponents(game);
        if opponents.len() == 1 {
            battle.opponent = Some(opponents[0]);
        }
        Some(battle)
    }

    pub fn side(&self, id: SideId) -> Option<&Side> {
        self.sides.iter().find(|s| s.id == id)
    }

    /// Display name of a side, falling back to its id.
    pub fn label(&self, id: SideId) -> String {
        self.side(id).map(|s| s.label()).unwrap_or_else(|| id.to_string())
    }

    /// Sides the aggressor may fight.
    pub fn opponents(&self, game: &GameState) -> Vec<SideId> {
        let Some(aggressor) = self.side(self.aggressor) else {
            return Vec::new();
        };
        self.sides
            .iter()
            .filter(|s| aggressor.opposes(s, game))
            .map(|s| s.id)
            .collect()
    }

    /// Aggressor and opponent, once the opponent is known.
    pub fn combatants(&self) -> Option<(SideId, SideId)> {
        self.opponent.map(|o| (self.aggressor, o))
    }

    /// Finds the battle side a faction speaks for, including its disguised token.
    pub fn side_of(&self, faction: Faction, disguised: bool) -> Option<SideId> {
        let wanted = if disguised { SideId::Disguised(faction) } else { SideId::Faction(faction) };
        if self.side(wanted).is_some() {
            return Some(wanted);
        }
        if disguised {
            return None;
        }
        self.sides
            .iter()
            .find(|s| !s.id.is_disguised() && s.includes(faction))
            .map(|s| s.id)
    }

    /// Narrows the battle to the aggressor and `opponent`.
    pub fn select_opponent(&mut self, opponent: SideId, game: &GameState) -> Result<(), PhaseError> {
        if self.opponent.is_some() {
            return Err(PhaseError::OpponentAlreadyChosen);
        }
        if !self.opponents(game).contains(&opponent) {
            return Err(PhaseError::NotAnOpponent(self.label(opponent)));
        }
        self.opponent = Some(opponent);
        Ok(())
    }

    fn slot(&self, id: SideId) -> Option<&Option<BattlePlan>> {
        if id == self.aggressor {
            Some(&self.aggressor_plan)
        } else if Some(id) == self.opponent {
            Some(&self.opponent_plan)
        } else {
            None
        }
    }

    fn slot_mut(&mut self, id: SideId) -> Option<&mut Option<BattlePlan>> {
        if id == self.aggressor {
            Some(&mut self.aggressor_plan)
        } else if Some(id) == self.opponent {
            Some(&mut self.opponent_plan)
        } else {
            None
        }
    }

    pub fn plan_for(&self, id: SideId) -> Option<&BattlePlan> {
        self.slot(id).and_then(|p| p.as_ref())
    }

    pub fn has_both_plans(&self) -> bool {
        self.aggressor_plan.is_some() && self.opponent_plan.is_some()
    }

    /// Live fighting units of a combatant side.
    pub fn live_forces(&self, id: SideId, game: &GameState) -> ForcePool {
        sides_in(&self.arena, game)
            .into_iter()
            .find(|s| s.id == id)
            .map(|s| s.forces())
            .unwrap_or_default()
    }

    /// Returns true if both combatants still have units in the arena.
    pub fn is_live(&self, game: &GameState) -> bool {
        let Some((a, o)) = self.combatants() else {
            return false;
        };
        let live = sides_in(&self.arena, game);
        live.iter().any(|s| s.id == a) && live.iter().any(|s| s.id == o)
    }

    fn check_plan(&self, id: SideId, plan: &BattlePlan, game: &GameState, config: &RulesConfig) -> Result<(), PlanError> {
        let label = self.label(id);
        let ctx = PlanContext {
            side_label: &label,
            territory: self.arena.territory,
            lead: id.owner(),
            forces: self.live_forces(id, game),
        };
        validate_plan(plan, &ctx, game, config)
    }

    /// Records a side's plan after validating it. Returns true once both
    /// plans are in.
    pub fn submit_plan(
        &mut self,
        id: SideId,
        plan: BattlePlan,
        game: &GameState,
        config: &RulesConfig,
    ) -> Result<bool, PhaseError> {
        let label = self.label(id);
        match self.slot(id) {
            None => return Err(PlanError::SideNotInBattle(label).into()),
            Some(Some(_)) => return Err(PlanError::PlanAlreadySubmitted(label).into()),
            Some(None) => {}
        }
        self.check_plan(id, &plan, game, config)?;
        if let Some(slot) = self.slot_mut(id) {
            *slot = Some(plan);
        }
        Ok(self.has_both_plans())
    }

    /// Clears a side's recorded plan so it can start over.
    pub fn withdraw_plan(&mut self, id: SideId) -> Result<BattlePlan, PhaseError> {
        let label = self.label(id);
        match self.slot_mut(id) {
            Some(slot) => slot.take().ok_or(PhaseError::NoPlanToWithdraw(label)),
            None => Err(PlanError::SideNotInBattle(label).into()),
        }
    }

    /// Re-checks every recorded plan against the live ledger.
    pub fn revalidate(&self, game: &GameState, config: &RulesConfig) -> Result<(), PhaseError> {
        for (id, plan) in [(Some(self.aggressor), &self.aggressor_plan), (self.opponent, &self.opponent_plan)] {
            if let (Some(id), Some(plan)) = (id, plan) {
                self.check_plan(id, plan, game, config)
                    .map_err(|source| PhaseError::PlanInvalidated { side: self.label(id), source })?;
            }
        }
        Ok(())
    }

    /// Marks a side's plan as public.
    pub fn reveal(&mut self, id: SideId) -> Result<(), PhaseError> {
        if self.side(id).is_none() {
            return Err(PlanError::SideNotInBattle(id.to_string()).into());
        }
        if !self.revealed.contains(&id) {
            self.revealed.push(id);
        }
        Ok(())
    }

    pub fn is_revealed(&self, id: SideId) -> bool {
        self.revealed.contains(&id)
    }

    /// Installs an outcome override for one of the combatants.
    pub fn set_override(&mut self, outcome: OutcomeOverride) -> Result<(), PhaseError> {
        let (OutcomeOverride::Winner(id) | OutcomeOverride::Traitor(id)) = outcome;
        if self.slot(id).is_none() {
            return Err(PlanError::SideNotInBattle(self.label(id)).into());
        }
        self.outcome_override = Some(outcome);
        Ok(())
    }

    /// One-line description of who fights whom with what.
    pub fn describe(&self) -> String {
        let forces = |id: SideId| self.side(id).map(|s| s.forces().to_string()).unwrap_or_default();
        match self.opponent {
            Some(o) => format!(
                "{} ({}) vs {} ({}) in {}",
                self.label(self.aggressor),
                forces(self.aggressor),
                self.label(o),
                forces(o),
                self.arena
            ),
            None => {
                let all: Vec<String> = self
                    .sides
                    .iter()
                    .map(|s| format!("{} ({})", s.label(), s.forces()))
                    .collect();
                format!("{} in {}", all.join(", "), self.arena)
            }
        }
    }
}
