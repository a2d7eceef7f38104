//! Battle resolution.
//!
//! Resolution is split in two. `compute_outcome` reads the battle and the
//! game state and produces a `BattleResult` without touching anything;
//! `commit_outcome` then applies that result to the ledger in one step.
//! A failure in the first half leaves the game exactly as it was.
//!
//! Strength is counted in half points so unsupported units can be worth 0.5.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{card_kind, CardKind, DefenseClass, Faction, ForcePool, GameState, LeaderStatus, WeaponClass};
use crate::config::RulesConfig;
use crate::notify::Choice;

use super::arena::Arena;
use super::battle::{sides_in, Battle, OutcomeOverride, Side, SideId};
use super::phase::PhaseError;
use super::plan::BattlePlan;

/// Spice paid by a faction that kills a captured leader instead of keeping it.
pub const CAPTURE_KILL_REWARD: u32 = 2;

/// Battle strength in half points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Strength(pub u32);

impl Strength {
    pub const fn whole(points: u32) -> Self {
        Strength(points * 2)
    }

    pub const fn halves(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}

/// What happened to one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideOutcome {
    pub side: SideId,
    pub label: String,
    pub strength: Strength,
    /// Leader who fought, if any.
    pub leader: Option<String>,
    pub leader_killed: bool,
    /// Units sent to the tanks, per member faction.
    pub losses: Vec<(Faction, ForcePool)>,
    pub spice_paid: u32,
    /// Played cards that go to the discard pile.
    pub discarded: Vec<String>,
    /// Played cards the side may choose to keep.
    pub retainable: Vec<String>,
}

impl SideOutcome {
    pub fn units_lost(&self) -> u32 {
        self.losses
            .iter()
            .fold(0u32, |n, (_, p)| n.saturating_add(p.total()).saturating_add(u32::from(p.disguised)))
    }
}

/// The computed outcome of one battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleResult {
    pub arena: Arena,
    /// None when a lasgun met a shield.
    pub winner: Option<SideId>,
    pub aggressor: SideOutcome,
    pub opponent: SideOutcome,
    pub explosion: bool,
    pub traitor: bool,
    /// Spice the winner collects for killed leaders.
    pub payout: u32,
}

impl BattleResult {
    pub fn outcome(&self, side: SideId) -> Option<&SideOutcome> {
        [&self.aggressor, &self.opponent].into_iter().find(|o| o.side == side)
    }

    pub fn loser(&self) -> Option<SideId> {
        let winner = self.winner?;
        [self.aggressor.side, self.opponent.side].into_iter().find(|s| *s != winner)
    }

    /// Announcement text describing the result.
    pub fn summary(&self) -> String {
        let mut text = if self.explosion {
            format!("Lasgun and shield explode in {}. Both sides are destroyed.", self.arena)
        } else {
            let winner = self.winner.and_then(|w| self.outcome(w)).map(|o| o.label.as_str()).unwrap_or("Nobody");
            if self.traitor {
                format!("{} calls a traitor and wins the battle in {}.", winner, self.arena)
            } else {
                format!(
                    "{} wins the battle in {}: {} {} vs {} {}.",
                    winner,
                    self.arena,
                    self.aggressor.label,
                    self.aggressor.strength,
                    self.opponent.label,
                    self.opponent.strength
                )
            }
        };
        for side in [&self.aggressor, &self.opponent] {
            if side.leader_killed {
                if let Some(leader) = &side.leader {
                    text.push_str(&format!(" {} of {} is killed.", leader, side.label));
                }
            }
            let lost = side.units_lost();
            if lost > 0 {
                text.push_str(&format!(" {} loses {} forces.", side.label, lost));
            }
        }
        if self.payout > 0 {
            text.push_str(&format!(" The winner collects {} spice for fallen leaders.", self.payout));
        }
        text
    }
}

/// Choices owed by a faction after a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Obligation {
    /// The winner decides whether to keep its played weapon and defense.
    CardRetention { faction: Faction, cards: Vec<String> },
    /// The winner may capture or kill one of the loser's leaders.
    LeaderCapture { captor: Faction, victim: Faction, candidates: Vec<String> },
}

/// An answer to an obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationChoice {
    Keep,
    Discard,
    Capture(String),
    Kill(String),
    Decline,
}

impl Obligation {
    /// The faction that must answer.
    pub fn owner(&self) -> Faction {
        match self {
            Obligation::CardRetention { faction, .. } => *faction,
            Obligation::LeaderCapture { captor, .. } => *captor,
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            Obligation::CardRetention { faction, cards } => {
                format!("{} may keep or discard {}.", faction, cards.join(", "))
            }
            Obligation::LeaderCapture { captor, victim, .. } => {
                format!("{} may capture or kill a leader of {}.", captor, victim)
            }
        }
    }

    /// Selectable answers, numbered from 1.
    pub fn choices(&self) -> Vec<Choice> {
        let labels: Vec<String> = match self {
            Obligation::CardRetention { .. } => vec!["Keep".into(), "Discard".into()],
            Obligation::LeaderCapture { candidates, .. } => candidates
                .iter()
                .flat_map(|c| [format!("Capture {}", c), format!("Kill {}", c)])
                .chain(std::iter::once("Decline".to_string()))
                .collect(),
        };
        labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| Choice { id: i + 1, label })
            .collect()
    }
}

/// Half-point strength of the units a side dialed.
///
/// Spice backs the strongest units first. Units without backing count half
/// when spice support is on; factions that fight without spice always count
/// in full, and so does a disguised token. Elite units lose their edge when
/// any of `opponents` negates them.
pub fn dialed_strength(side: &Side, plan: &BattlePlan, opponents: &[Faction], config: &RulesConfig) -> u32 {
    // (halves per unit, count, needs spice)
    let mut groups: Vec<(u32, u32, bool)> = Vec::new();
    for (faction, pool) in allocate_dial(side, plan.regular_dialed, plan.special_dialed) {
        let caps = faction.capabilities();
        let needs_spice = config.spice_support && !caps.fights_without_spice;
        if pool.disguised {
            groups.push((2, 1, false));
        }
        groups.push((caps.special_strength_halves(opponents), pool.special, needs_spice));
        groups.push((2, pool.regular, needs_spice));
    }
    groups.sort_by_key(|g| std::cmp::Reverse(g.0));

    let mut spice = plan.spice;
    let mut total = 0u32;
    for (full, count, needs_spice) in groups {
        if !needs_spice {
            total = total.saturating_add(full.saturating_mul(count));
            continue;
        }
        let backed = count.min(spice);
        spice -= backed;
        total = total
            .saturating_add(full.saturating_mul(backed))
            .saturating_add((full / 2).saturating_mul(count - backed));
    }
    total
}

/// Spreads dialed units across a side's members, lead first.
///
/// A disguised token is dialed as one regular unit once the member's real
/// regulars are used up.
pub fn allocate_dial(side: &Side, regular: u32, special: u32) -> Vec<(Faction, ForcePool)> {
    let (mut regular, mut special) = (regular, special);
    let mut out = Vec::new();
    for (faction, pool) in &side.members {
        let r = regular.min(pool.regular);
        let s = special.min(pool.special);
        regular -= r;
        special -= s;
        let mut taken = ForcePool::new(r, s);
        if pool.disguised && regular > 0 {
            taken.disguised = true;
            regular -= 1;
        }
        if !taken.is_empty() {
            out.push((*faction, taken));
        }
    }
    out
}

fn weapon_class(plan: &BattlePlan) -> Option<WeaponClass> {
    match plan.weapon.as_deref().and_then(card_kind) {
        Some(CardKind::Weapon(w)) => Some(w),
        _ => None,
    }
}

fn defense_class(plan: &BattlePlan) -> Option<DefenseClass> {
    match plan.defense.as_deref().and_then(card_kind) {
        Some(CardKind::Defense(d)) => Some(d),
        _ => None,
    }
}

/// Returns true if `attacker`'s weapon gets past `target`'s defense.
fn weapon_lands(attacker: &BattlePlan, target: &BattlePlan) -> bool {
    match weapon_class(attacker) {
        Some(weapon) => !defense_class(target).is_some_and(|d| d.stops(weapon)),
        None => false,
    }
}

/// Returns true if any weapon on the table detonates any defense on the table.
fn is_explosion(a: &BattlePlan, o: &BattlePlan) -> bool {
    let weapons: Vec<WeaponClass> = [a, o].into_iter().filter_map(weapon_class).collect();
    [a, o]
        .into_iter()
        .filter_map(defense_class)
        .any(|d| weapons.iter().any(|w| d.explodes_with(*w)))
}

struct Contender<'a> {
    side: &'a Side,
    plan: &'a BattlePlan,
    label: String,
    leader_value: u32,
    leader_killed: bool,
    strength: Strength,
}

impl<'a> Contender<'a> {
    fn new(side: &'a Side, plan: &'a BattlePlan, game: &GameState) -> Self {
        let leader_value = plan
            .leader
            .as_deref()
            .and_then(|name| game.faction(side.lead()).and_then(|fs| fs.leader(name)))
            .map(|l| l.value.base())
            .unwrap_or(0);
        Contender {
            side,
            plan,
            label: side.label(),
            leader_value,
            leader_killed: false,
            strength: Strength::default(),
        }
    }

    fn score(&mut self, opponents: &[Faction], config: &RulesConfig) {
        let mut halves = dialed_strength(self.side, self.plan, opponents, config);
        if !self.leader_killed {
            halves = halves.saturating_add(self.leader_value.saturating_mul(2));
            if self.plan.use_bonus {
                if let Some(rule) = self.side.lead().capabilities().bonus_strength {
                    halves = halves.saturating_add(rule.bonus * 2);
                }
            }
        }
        self.strength = Strength(halves);
    }

    fn all_forces(&self) -> Vec<(Faction, ForcePool)> {
        self.side.members.iter().filter(|(_, p)| !p.is_empty()).copied().collect()
    }

    fn outcome(self, won: Option<bool>, explosion: bool, traitor_win: bool, config: &RulesConfig) -> SideOutcome {
        let losses = match won {
            Some(true) if traitor_win => Vec::new(),
            Some(true) => allocate_dial(self.side, self.plan.regular_dialed, self.plan.special_dialed),
            Some(false) | None => self.all_forces(),
        };
        let spice_paid = if traitor_win { 0 } else { self.plan.spice };

        let mut discarded = Vec::new();
        let mut retainable = Vec::new();
        for card in self.plan.cards() {
            let keepable = matches!(card_kind(card), Some(CardKind::Weapon(_)) | Some(CardKind::Defense(_)));
            if won == Some(true) && !explosion && keepable {
                if config.ask_card_retention {
                    retainable.push(card.to_string());
                }
            } else {
                discarded.push(card.to_string());
            }
        }

        SideOutcome {
            side: self.side.id,
            label: self.label,
            strength: self.strength,
            leader: self.plan.leader.clone(),
            leader_killed: self.leader_killed,
            losses,
            spice_paid,
            discarded,
            retainable,
        }
    }
}

/// Works out the result of a battle with both plans in, without changing
/// the game state.
pub fn compute_outcome(battle: &Battle, game: &GameState, config: &RulesConfig) -> Result<BattleResult, PhaseError> {
    let (a_id, o_id) = battle.combatants().ok_or(PhaseError::PlansIncomplete)?;
    let a_plan = battle.aggressor_plan.as_ref().ok_or(PhaseError::PlansIncomplete)?;
    let o_plan = battle.opponent_plan.as_ref().ok_or(PhaseError::PlansIncomplete)?;
    battle.revalidate(game, config)?;

    let live = sides_in(&battle.arena, game);
    let find = |id: SideId| {
        live.iter()
            .find(|s| s.id == id)
            .ok_or_else(|| PhaseError::SideGone(battle.label(id)))
    };
    let a_side = find(a_id)?;
    let o_side = find(o_id)?;

    let mut a = Contender::new(a_side, a_plan, game);
    let mut o = Contender::new(o_side, o_plan, game);

    let traitor_caller = match battle.outcome_override {
        Some(OutcomeOverride::Traitor(caller)) => Some(caller),
        _ => None,
    };
    // An override decides the battle; nothing detonates.
    let explosion = battle.outcome_override.is_none()
        && config.lasgun_shield_explosion
        && is_explosion(a_plan, o_plan);

    match traitor_caller {
        Some(caller) if caller == a_id => o.leader_killed = o_plan.leader.is_some(),
        Some(_) => a.leader_killed = a_plan.leader.is_some(),
        None if explosion => {
            a.leader_killed = a_plan.leader.is_some();
            o.leader_killed = o_plan.leader.is_some();
        }
        None => {
            a.leader_killed = a_plan.leader.is_some() && weapon_lands(o_plan, a_plan);
            o.leader_killed = o_plan.leader.is_some() && weapon_lands(a_plan, o_plan);
        }
    }

    let a_factions: Vec<Faction> = a_side.members.iter().map(|(f, _)| *f).collect();
    let o_factions: Vec<Faction> = o_side.members.iter().map(|(f, _)| *f).collect();
    a.score(&o_factions, config);
    o.score(&a_factions, config);

    let winner = match (battle.outcome_override, explosion) {
        (Some(OutcomeOverride::Winner(id)), _) | (Some(OutcomeOverride::Traitor(id)), _) => Some(id),
        (None, true) => None,
        (None, false) if o.strength > a.strength => Some(o_id),
        (None, false) => Some(a_id),
    };

    let payout = if config.leader_kill_payout && winner.is_some() {
        [&a, &o]
            .iter()
            .filter(|c| c.leader_killed)
            .fold(0u32, |n, c| n.saturating_add(c.leader_value))
    } else {
        0
    };

    debug!(
        arena = %battle.arena,
        aggressor = %a.strength,
        opponent = %o.strength,
        explosion,
        "battle computed"
    );

    let traitor = traitor_caller.is_some();
    let won = |id: SideId| winner.map(|w| w == id);
    Ok(BattleResult {
        arena: battle.arena.clone(),
        winner,
        aggressor: a.outcome(won(a_id), explosion, traitor && won(a_id) == Some(true), config),
        opponent: o.outcome(won(o_id), explosion, traitor && won(o_id) == Some(true), config),
        explosion,
        traitor,
        payout,
    })
}

/// Removes a member's losses from the arena's sectors in storm order.
fn remove_losses(game: &mut GameState, arena: &Arena, faction: Faction, losses: ForcePool) {
    let (mut regular, mut special) = (losses.regular, losses.special);
    for sector in &arena.sectors {
        if regular == 0 && special == 0 {
            break;
        }
        let removed = game.destroy_forces(arena.territory, *sector, faction, regular, special);
        regular -= removed.regular;
        special -= removed.special;
    }
    if losses.disguised {
        for sector in &arena.sectors {
            if game.remove_disguised_token(arena.territory, *sector, faction) {
                break;
            }
        }
    }
}

/// Applies a computed result to the game state. Returns the obligations the
/// result leaves behind.
pub fn commit_outcome(result: &BattleResult, game: &mut GameState) -> Vec<Obligation> {
    let territory = result.arena.territory;
    let mut obligations = Vec::new();

    for side in [&result.aggressor, &result.opponent] {
        let lead = side.side.owner();
        for (faction, losses) in &side.losses {
            remove_losses(game, &result.arena, *faction, *losses);
        }

        let won = result.winner == Some(side.side);
        if let Some(fs) = game.faction_mut(lead) {
            fs.spice = fs.spice.saturating_sub(side.spice_paid);
            if won {
                fs.spice = fs.spice.saturating_add(result.payout);
            }
            for card in &side.discarded {
                fs.remove_card(card);
            }
            if let Some(name) = &side.leader {
                if let Some(leader) = fs.leader_mut(name) {
                    leader.status = if side.leader_killed {
                        LeaderStatus::Tanks
                    } else {
                        LeaderStatus::Fought { territory }
                    };
                }
            }
        }
        game.discard.extend(side.discarded.iter().cloned());

        if won && !side.retainable.is_empty() {
            obligations.push(Obligation::CardRetention { faction: lead, cards: side.retainable.clone() });
        }
    }

    if let (Some(winner), Some(loser)) = (result.winner, result.loser()) {
        let captor = winner.owner();
        let victim = loser.owner();
        if captor.capabilities().captures_leaders && captor != victim {
            let candidates: Vec<String> = game
                .faction(victim)
                .map(|fs| {
                    fs.leaders
                        .iter()
                        .filter(|l| l.status == LeaderStatus::Available && l.original_owner.is_none())
                        .map(|l| l.name.clone())
                        .collect()
                })
                .unwrap_or_default();
            if !candidates.is_empty() {
                obligations.push(Obligation::LeaderCapture { captor, victim, candidates });
            }
        }
    }

    obligations
}

/// Applies an answer to an obligation. Returns the announcement text.
pub fn settle_obligation(
    game: &mut GameState,
    obligation: &Obligation,
    choice: &ObligationChoice,
) -> Result<String, PhaseError> {
    match (obligation, choice) {
        (Obligation::CardRetention { faction, cards }, ObligationChoice::Keep) => {
            Ok(format!("{} keeps {}.", faction, cards.join(", ")))
        }
        (Obligation::CardRetention { faction, cards }, ObligationChoice::Discard) => {
            if let Some(fs) = game.faction_mut(*faction) {
                for card in cards {
                    fs.remove_card(card);
                }
            }
            game.discard.extend(cards.iter().cloned());
            Ok(format!("{} discards {}.", faction, cards.join(", ")))
        }
        (Obligation::LeaderCapture { captor, victim, candidates }, ObligationChoice::Capture(name))
            if candidates.contains(name) =>
        {
            let taken = game.faction_mut(*victim).and_then(|fs| {
                let idx = fs.leaders.iter().position(|l| &l.name == name)?;
                Some(fs.leaders.remove(idx))
            });
            let mut leader = taken.ok_or_else(|| PhaseError::InvalidObligationChoice(name.clone()))?;
            leader.original_owner = Some(*victim);
            leader.status = LeaderStatus::Available;
            if let Some(fs) = game.faction_mut(*captor) {
                fs.leaders.push(leader);
            }
            Ok(format!("{} captures {} from {}.", captor, name, victim))
        }
        (Obligation::LeaderCapture { captor, victim, candidates }, ObligationChoice::Kill(name))
            if candidates.contains(name) =>
        {
            if !game.kill_leader(*victim, name) {
                return Err(PhaseError::InvalidObligationChoice(name.clone()));
            }
            if let Some(fs) = game.faction_mut(*captor) {
                fs.spice = fs.spice.saturating_add(CAPTURE_KILL_REWARD);
            }
            Ok(format!(
                "{} kills {} of {} and collects {} spice.",
                captor, name, victim, CAPTURE_KILL_REWARD
            ))
        }
        (Obligation::LeaderCapture { captor, .. }, ObligationChoice::Decline) => {
            Ok(format!("{} takes no leader.", captor))
        }
        (_, other) => Err(PhaseError::InvalidObligationChoice(format!("{:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::arena::arenas_for;
    use crate::board::{Leader, LeaderValue, Territory};

    fn game() -> GameState {
        let mut game = GameState::empty(1);
        for f in [Faction::Atreides, Faction::Harkonnen, Faction::Emperor, Faction::Fremen] {
            game.add_faction(f);
            let fs = game.faction_mut(f).unwrap();
            fs.spice = 10;
            fs.hand = vec![
                "Crysknife".into(),
                "Chaumas".into(),
                "Shield".into(),
                "Snooper".into(),
                "Lasgun".into(),
                "Cheap Hero".into(),
                "Baliset".into(),
            ];
        }
        game
    }

    fn battle(game: &mut GameState, a: (Faction, ForcePool), o: (Faction, ForcePool)) -> Battle {
        game.place_forces(Territory::ImperialBasin, 9, a.0, a.1);
        game.place_forces(Territory::ImperialBasin, 10, o.0, o.1);
        let arena = arenas_for(Territory::ImperialBasin, game.storm).remove(0);
        Battle::new(arena, game).unwrap()
    }

    fn fight(game: &mut GameState, battle: &mut Battle, a: BattlePlan, o: BattlePlan) -> BattleResult {
        let config = RulesConfig::default();
        battle.submit_plan(battle.aggressor, a, game, &config).unwrap();
        let opponent = battle.opponent.unwrap();
        battle.submit_plan(opponent, o, game, &config).unwrap();
        compute_outcome(battle, game, &config).unwrap()
    }

    const A: SideId = SideId::Faction(Faction::Atreides);
    const H: SideId = SideId::Faction(Faction::Harkonnen);

    #[test]
    fn strength_formats_halves() {
        assert_eq!(Strength::whole(5).to_string(), "5");
        assert_eq!(Strength(9).to_string(), "4.5");
        assert_eq!(Strength(1).to_string(), "0.5");
    }

    #[test]
    fn higher_total_wins() {
        let mut game = game();
        let mut b = battle(&mut game, (Faction::Atreides, ForcePool::new(5, 0)), (Faction::Harkonnen, ForcePool::new(7, 0)));
        let r = fight(
            &mut game,
            &mut b,
            BattlePlan::led_by("Duncan Idaho").dial(2),
            BattlePlan::led_by("Umman Kudu").dial(3),
        );
        // 2 + 2 against 1 + 3
        assert_eq!(r.aggressor.strength, Strength::whole(4));
        assert_eq!(r.opponent.strength, Strength::whole(4));
        assert_eq!(r.winner, Some(A), "ties go to the aggressor");
        assert_eq!(r.opponent.units_lost(), 7);
        assert_eq!(r.aggressor.losses, vec![(Faction::Atreides, ForcePool::new(2, 0))]);
    }

    #[test]
    fn unbacked_units_count_half() {
        let mut game = game();
        let mut b = battle(&mut game, (Faction::Atreides, ForcePool::new(5, 0)), (Faction::Harkonnen, ForcePool::new(7, 0)));
        let r = fight(
            &mut game,
            &mut b,
            BattlePlan::led_by("Duncan Idaho").dial(3).with_spice(0),
            BattlePlan::led_by("Umman Kudu").dial(3).with_spice(2),
        );
        assert_eq!(r.aggressor.strength.to_string(), "3.5");
        assert_eq!(r.opponent.strength.to_string(), "3.5");
    }

    #[test]
    fn spice_support_can_be_disabled() {
        let side = Side { id: A, members: vec![(Faction::Atreides, ForcePool::new(4, 0))] };
        let plan = BattlePlan::led_by("Duncan Idaho").dial(4).with_spice(0);
        let config = RulesConfig { spice_support: false, ..Default::default() };
        assert_eq!(dialed_strength(&side, &plan, &[Faction::Harkonnen], &config), 8);
        assert_eq!(dialed_strength(&side, &plan, &[Faction::Harkonnen], &RulesConfig::default()), 4);
    }

    #[test]
    fn elite_units_double_unless_negated() {
        let side = Side { id: SideId::Faction(Faction::Emperor), members: vec![(Faction::Emperor, ForcePool::new(0, 2))] };
        let plan = BattlePlan::led_by("Bashar").with_special(2).with_spice(2);
        let config = RulesConfig::default();
        assert_eq!(dialed_strength(&side, &plan, &[Faction::Atreides], &config), 8);
        assert_eq!(dialed_strength(&side, &plan, &[Faction::Fremen], &config), 4);
        assert_eq!(dialed_strength(&side, &plan, &[Faction::Atreides, Faction::Fremen], &config), 4);
    }

    #[test]
    fn spice_backs_elites_first() {
        let side = Side {
            id: SideId::Faction(Faction::Emperor),
            members: vec![(Faction::Emperor, ForcePool::new(2, 1))],
        };
        let plan = BattlePlan::led_by("Bashar").dial(2).with_special(1).with_spice(1);
        // elite backed: 4 halves; two regulars unbacked: 1 + 1
        assert_eq!(dialed_strength(&side, &plan, &[Faction::Atreides], &RulesConfig::default()), 6);
    }

    #[test]
    fn fremen_need_no_spice() {
        let side = Side { id: SideId::Faction(Faction::Fremen), members: vec![(Faction::Fremen, ForcePool::new(3, 0))] };
        let plan = BattlePlan::led_by("Jamis").dial(3).with_spice(0);
        assert_eq!(dialed_strength(&side, &plan, &[Faction::Atreides], &RulesConfig::default()), 6);
    }

    #[test]
    fn allocation_fills_lead_first() {
        let side = Side {
            id: H,
            members: vec![(Faction::Harkonnen, ForcePool::new(2, 0)), (Faction::Fremen, ForcePool::new(3, 1))],
        };
        let alloc = allocate_dial(&side, 4, 1);
        assert_eq!(
            alloc,
            vec![(Faction::Harkonnen, ForcePool::new(2, 0)), (Faction::Fremen, ForcePool::new(2, 1))]
        );
    }

    #[test]
    fn unmatched_weapon_kills_leader_of_winner() {
        let mut game = game();
        let mut b = battle(&mut game, (Faction::Atreides, ForcePool::new(8, 0)), (Faction::Harkonnen, ForcePool::new(3, 0)));
        let r = fight(
            &mut game,
            &mut b,
            BattlePlan::led_by("Thufir Hawat").dial(6),
            BattlePlan::led_by("Umman Kudu").dial(1).with_weapon("Chaumas"),
        );
        assert!(r.aggressor.leader_killed);
        assert_eq!(r.aggressor.strength, Strength::whole(6));
        assert_eq!(r.winner, Some(A));
        assert_eq!(r.payout, 5);
        assert_eq!(r.opponent.discarded, vec!["Chaumas".to_string()]);
    }

    #[test]
    fn matching_defense_saves_leader() {
        let mut game = game();
        let mut b = battle(&mut game, (Faction::Atreides, ForcePool::new(8, 0)), (Faction::Harkonnen, ForcePool::new(3, 0)));
        let r = fight(
            &mut game,
            &mut b,
            BattlePlan::led_by("Thufir Hawat").dial(1).with_defense("Snooper"),
            BattlePlan::led_by("Umman Kudu").dial(1).with_weapon("Chaumas"),
        );
        assert!(!r.aggressor.leader_killed);
        assert_eq!(r.aggressor.retainable, vec!["Snooper".to_string()]);
        assert_eq!(r.payout, 0);
    }

    #[test]
    fn lasgun_and_shield_explode() {
        let mut game = game();
        let mut b = battle(&mut game, (Faction::Atreides, ForcePool::new(4, 0)), (Faction::Harkonnen, ForcePool::new(3, 0)));
        let r = fight(
            &mut game,
            &mut b,
            BattlePlan::led_by("Thufir Hawat").dial(1).with_weapon("Lasgun"),
            BattlePlan::led_by("Umman Kudu").dial(1).with_defense("Shield"),
        );
        assert!(r.explosion);
        assert_eq!(r.winner, None);
        assert!(r.aggressor.leader_killed && r.opponent.leader_killed);
        assert_eq!(r.aggressor.units_lost() + r.opponent.units_lost(), 7);
        assert_eq!(r.payout, 0);
    }

    #[test]
    fn forced_winner_suppresses_explosion() {
        let mut game = game();
        let mut b = battle(&mut game, (Faction::Atreides, ForcePool::new(4, 0)), (Faction::Harkonnen, ForcePool::new(3, 0)));
        b.set_override(OutcomeOverride::Winner(H)).unwrap();
        let r = fight(
            &mut game,
            &mut b,
            BattlePlan::led_by("Thufir Hawat").dial(1).with_weapon("Lasgun"),
            BattlePlan::led_by("Umman Kudu").dial(1).with_defense("Shield"),
        );
        assert!(!r.explosion);
        assert_eq!(r.winner, Some(H));
        // The lasgun still goes through the shield.
        assert!(r.opponent.leader_killed);
        assert!(!r.aggressor.leader_killed);
        assert_eq!(r.payout, 1);
        assert_eq!(r.opponent.losses, vec![(Faction::Harkonnen, ForcePool::new(1, 0))]);
        assert_eq!(r.aggressor.units_lost(), 4);
    }

    #[test]
    fn allied_fremen_negate_elites() {
        let mut game = game();
        game.set_alliance(Faction::Atreides, Faction::Fremen);
        game.place_forces(Territory::ImperialBasin, 9, Faction::Fremen, ForcePool::new(2, 0));
        let mut b = battle(&mut game, (Faction::Atreides, ForcePool::new(3, 0)), (Faction::Emperor, ForcePool::new(0, 2)));
        assert_eq!(b.aggressor, A);
        let r = fight(
            &mut game,
            &mut b,
            BattlePlan::led_by("Duncan Idaho").dial(1),
            BattlePlan::led_by("Bashar").with_special(2).with_spice(2),
        );
        // Bashar 2 plus two Sardaukar at regular strength
        assert_eq!(r.opponent.strength, Strength::whole(4));
        assert_eq!(r.winner, Some(SideId::Faction(Faction::Emperor)));
    }

    #[test]
    fn traitor_wins_without_losses() {
        let mut game = game();
        let mut b = battle(&mut game, (Faction::Atreides, ForcePool::new(2, 0)), (Faction::Harkonnen, ForcePool::new(9, 0)));
        b.set_override(OutcomeOverride::Traitor(A)).unwrap();
        let r = fight(
            &mut game,
            &mut b,
            BattlePlan::led_by("Duncan Idaho").dial(2),
            BattlePlan::led_by("Feyd-Rautha").dial(9).with_spice(9),
        );
        assert!(r.traitor);
        assert_eq!(r.winner, Some(A));
        assert!(r.aggressor.losses.is_empty());
        assert_eq!(r.aggressor.spice_paid, 0);
        assert!(r.opponent.leader_killed);
        assert_eq!(r.payout, 6);
    }

    #[test]
    fn commit_moves_losses_spice_and_cards() {
        let mut game = game();
        game.place_forces(Territory::ImperialBasin, 11, Faction::Harkonnen, ForcePool::new(2, 0));
        let mut b = battle(&mut game, (Faction::Atreides, ForcePool::new(5, 0)), (Faction::Harkonnen, ForcePool::new(1, 0)));
        let r = fight(
            &mut game,
            &mut b,
            BattlePlan::led_by("Duncan Idaho").dial(3).with_weapon("Crysknife"),
            BattlePlan::led_by("Umman Kudu").dial(1).with_weapon("Baliset"),
        );
        let obligations = commit_outcome(&r, &mut game);

        let at = game.faction(Faction::Atreides).unwrap();
        // paid 3, collected 1 for Umman Kudu
        assert_eq!(at.spice, 8);
        assert_eq!(at.tanks, ForcePool::new(3, 0));
        assert!(at.holds_card("Crysknife"));
        assert_eq!(at.leader("Duncan Idaho").unwrap().status, LeaderStatus::Fought { territory: Territory::ImperialBasin });
        assert_eq!(game.forces_at(Territory::ImperialBasin, 9, Faction::Atreides), ForcePool::new(2, 0));

        let hk = game.faction(Faction::Harkonnen).unwrap();
        assert_eq!(hk.tanks, ForcePool::new(3, 0));
        assert!(!hk.holds_card("Baliset"));
        assert!(game.occupants_in(Territory::ImperialBasin).all(|o| o.faction == Faction::Atreides));
        assert_eq!(game.discard, vec!["Baliset".to_string()]);

        assert_eq!(
            obligations,
            vec![Obligation::CardRetention { faction: Faction::Atreides, cards: vec!["Crysknife".into()] }]
        );
    }

    #[test]
    fn harkonnen_win_offers_capture() {
        let mut game = game();
        let mut b = battle(&mut game, (Faction::Atreides, ForcePool::new(1, 0)), (Faction::Harkonnen, ForcePool::new(5, 0)));
        let r = fight(
            &mut game,
            &mut b,
            BattlePlan::led_by("Dr. Wellington Yueh").dial(1),
            BattlePlan::led_by("Feyd-Rautha").dial(4),
        );
        assert_eq!(r.winner, Some(H));
        let obligations = commit_outcome(&r, &mut game);
        let capture = obligations
            .iter()
            .find(|o| matches!(o, Obligation::LeaderCapture { .. }))
            .unwrap()
            .clone();
        let Obligation::LeaderCapture { candidates, .. } = &capture else { unreachable!() };
        assert_eq!(candidates.len(), 4, "the leader who fought is not a candidate");

        let text = settle_obligation(&mut game, &capture, &ObligationChoice::Capture("Thufir Hawat".into())).unwrap();
        assert_eq!(text, "Harkonnen captures Thufir Hawat from Atreides.");
        let hk = game.faction(Faction::Harkonnen).unwrap();
        assert_eq!(hk.leader("Thufir Hawat").unwrap().original_owner, Some(Faction::Atreides));
        assert!(game.faction(Faction::Atreides).unwrap().leader("Thufir Hawat").is_none());
    }

    #[test]
    fn killing_a_captive_pays_spice() {
        let mut game = game();
        let obligation = Obligation::LeaderCapture {
            captor: Faction::Harkonnen,
            victim: Faction::Atreides,
            candidates: vec!["Gurney Halleck".into()],
        };
        settle_obligation(&mut game, &obligation, &ObligationChoice::Kill("Gurney Halleck".into())).unwrap();
        assert_eq!(game.faction(Faction::Harkonnen).unwrap().spice, 12);
        assert!(!game.faction(Faction::Atreides).unwrap().leader("Gurney Halleck").unwrap().is_alive());
        assert!(matches!(
            settle_obligation(&mut game, &obligation, &ObligationChoice::Keep),
            Err(PhaseError::InvalidObligationChoice(_))
        ));
        assert!(matches!(
            settle_obligation(&mut game, &obligation, &ObligationChoice::Capture("Lady Jessica".into())),
            Err(PhaseError::InvalidObligationChoice(_))
        ));
    }

    #[test]
    fn obligation_choices_are_numbered() {
        let obligation = Obligation::LeaderCapture {
            captor: Faction::Harkonnen,
            victim: Faction::Atreides,
            candidates: vec!["Gurney Halleck".into()],
        };
        let choices = obligation.choices();
        assert_eq!(choices.len(), 3);
        assert_eq!(choices[0].id, 1);
        assert_eq!(choices[1].label, "Kill Gurney Halleck");
        assert_eq!(choices[2].label, "Decline");
    }

    #[test]
    fn variable_leader_counts_zero() {
        let mut game = game();
        game.faction_mut(Faction::Atreides)
            .unwrap()
            .leaders
            .push(Leader::new("Face Dancer", LeaderValue::Variable));
        let mut b = battle(&mut game, (Faction::Atreides, ForcePool::new(2, 0)), (Faction::Harkonnen, ForcePool::new(2, 0)));
        let r = fight(
            &mut game,
            &mut b,
            BattlePlan::led_by("Face Dancer").dial(1),
            BattlePlan::led_by("Umman Kudu").dial(1),
        );
        assert_eq!(r.aggressor.strength, Strength::whole(1));
        assert_eq!(r.opponent.strength, Strength::whole(2));
        assert_eq!(r.winner, Some(H));
    }
}
