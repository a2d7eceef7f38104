//! Battles phase controller.
//!
//! An explicit, serializable state machine. Every pause for a human answer
//! (arena pick, opponent pick, plan drafting, post-battle obligations) is a
//! `PhaseStep` value plus the data held in `Battles`, so a saved controller
//! resumes exactly where it stopped.
//!
//! Arenas are rescanned from the live ledger before every activation. An
//! arena that lost its contest in the meantime is skipped without an error.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::board::GameState;
use crate::config::RulesConfig;
use crate::notify::{Choice, Topic};

use super::arena::{all_arenas, Arena};
use super::battle::{choose_aggressor, is_contested, sides_in, Battle, OutcomeOverride, Side, SideId};
use super::plan::{BattlePlan, PlanError};
use super::resolution::{commit_outcome, compute_outcome, settle_obligation, BattleResult, Obligation, ObligationChoice};

/// Where the phase currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStep {
    NotStarted,
    ArenasIdentified,
    AwaitingArenaSelection,
    ArenaActive,
    AwaitingOpponentSelection,
    PlansPending,
    ArenaResolved,
    PhaseComplete,
    Ended,
}

impl std::fmt::Display for PhaseStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PhaseStep::NotStarted => "not started",
            PhaseStep::ArenasIdentified => "arenas identified",
            PhaseStep::AwaitingArenaSelection => "awaiting arena selection",
            PhaseStep::ArenaActive => "arena active",
            PhaseStep::AwaitingOpponentSelection => "awaiting opponent selection",
            PhaseStep::PlansPending => "plans pending",
            PhaseStep::ArenaResolved => "arena resolved",
            PhaseStep::PhaseComplete => "phase complete",
            PhaseStep::Ended => "ended",
        };
        f.write_str(s)
    }
}

/// Errors from phase operations. A rejected operation leaves the controller
/// and the game state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    #[error("cannot {operation} while {step}")]
    OutOfSequence { operation: &'static str, step: PhaseStep },

    #[error("must resolve pending obligation first")]
    MustResolvePendingObligation,

    #[error("{0} contested arena(s) remain")]
    BattlesRemaining(usize),

    #[error("no arena choice {0}")]
    InvalidArenaIndex(usize),

    #[error("no battle is active")]
    NoActiveBattle,

    #[error("{0} is not a valid opponent")]
    NotAnOpponent(String),

    #[error("the opponent has already been chosen")]
    OpponentAlreadyChosen,

    #[error("{0} has no plan to withdraw")]
    NoPlanToWithdraw(String),

    #[error("no obligation is pending")]
    NoPendingObligation,

    #[error("'{0}' does not answer the pending obligation")]
    InvalidObligationChoice(String),

    #[error("both plans are required before resolving")]
    PlansIncomplete,

    #[error("{0} no longer has forces in the arena")]
    SideGone(String),

    #[error("the plan of {side} no longer holds: {source}")]
    PlanInvalidated { side: String, source: PlanError },

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// A contested arena as of the last scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaSummary {
    pub arena: Arena,
    pub sides: Vec<Side>,
    pub aggressor: SideId,
}

impl ArenaSummary {
    pub fn describe(&self) -> String {
        let sides: Vec<String> = self
            .sides
            .iter()
            .map(|s| format!("{} ({})", s.label(), s.forces()))
            .collect();
        format!("{}: {}", self.arena, sides.join(" vs "))
    }
}

/// Lists every contested arena in board order.
pub fn contested_arenas(game: &GameState) -> Vec<ArenaSummary> {
    all_arenas(game.storm)
        .into_iter()
        .filter_map(|arena| {
            let sides = sides_in(&arena, game);
            if !is_contested(&sides, game) {
                return None;
            }
            let aggressor = choose_aggressor(&sides, game)?;
            Some(ArenaSummary { arena, sides, aggressor })
        })
        .collect()
}

/// The battles phase of one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battles {
    pub config: RulesConfig,
    pub step: PhaseStep,
    /// Contested arenas from the latest scan.
    #[serde(default)]
    pub arenas: Vec<ArenaSummary>,
    /// Indices into `arenas` the acting faction may choose from.
    #[serde(default)]
    pub candidates: Vec<usize>,
    #[serde(default)]
    pub battle: Option<Battle>,
    #[serde(default)]
    pub last_result: Option<BattleResult>,
    /// Post-battle obligations, answered front first.
    #[serde(default)]
    pub obligations: Vec<Obligation>,
    #[serde(default)]
    pub resolved: usize,
}

impl Default for Battles {
    fn default() -> Self {
        Battles::new(RulesConfig::default())
    }
}

impl Battles {
    pub fn new(config: RulesConfig) -> Self {
        Battles {
            config,
            step: PhaseStep::NotStarted,
            arenas: Vec::new(),
            candidates: Vec::new(),
            battle: None,
            last_result: None,
            obligations: Vec::new(),
            resolved: 0,
        }
    }

    pub fn step(&self) -> PhaseStep {
        self.step
    }

    pub fn active_battle(&self) -> Option<&Battle> {
        self.battle.as_ref()
    }

    pub fn pending_obligation(&self) -> Option<&Obligation> {
        self.obligations.first()
    }

    fn expect(&self, operation: &'static str, allowed: &[PhaseStep]) -> Result<(), PhaseError> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(PhaseError::OutOfSequence { operation, step: self.step })
        }
    }

    fn transition(&mut self, to: PhaseStep) {
        debug!(from = %self.step, to = %to, "phase transition");
        self.step = to;
    }

    fn battle_mut(&mut self) -> Result<&mut Battle, PhaseError> {
        self.battle.as_mut().ok_or(PhaseError::NoActiveBattle)
    }

    /// Scans the board and announces the contested arenas.
    pub fn start<T: Topic + ?Sized>(&mut self, game: &GameState, topic: &mut T) -> Result<(), PhaseError> {
        self.expect("start the battle phase", &[PhaseStep::NotStarted, PhaseStep::Ended])?;
        self.arenas = contested_arenas(game);
        self.candidates.clear();
        self.battle = None;
        self.last_result = None;
        self.resolved = 0;
        info!(arenas = self.arenas.len(), storm = game.storm, "battle phase started");

        if self.arenas.is_empty() {
            topic.publish("No battles this round.");
            self.transition(PhaseStep::PhaseComplete);
            return Ok(());
        }
        let lines: Vec<String> = self.arenas.iter().map(|a| a.describe()).collect();
        topic.publish(&format!("Battles this round: {}", lines.join("; ")));
        self.transition(PhaseStep::ArenasIdentified);
        Ok(())
    }

    /// Moves to the next battle, or completes the phase.
    pub fn advance<T: Topic + ?Sized>(&mut self, game: &GameState, topic: &mut T) -> Result<(), PhaseError> {
        if !self.obligations.is_empty() {
            return Err(PhaseError::MustResolvePendingObligation);
        }
        self.expect("advance", &[PhaseStep::ArenasIdentified, PhaseStep::ArenaResolved])?;
        self.choose_next(game, topic);
        Ok(())
    }

    fn choose_next<T: Topic + ?Sized>(&mut self, game: &GameState, topic: &mut T) {
        let before = self.arenas.len();
        self.arenas = contested_arenas(game);
        debug!(before, after = self.arenas.len(), "arenas rescanned");

        let Some(acting) = self
            .arenas
            .iter()
            .map(|a| a.aggressor.owner())
            .min_by_key(|f| game.turn_position(*f))
        else {
            self.candidates.clear();
            topic.publish("All battles are resolved.");
            info!(resolved = self.resolved, "battle phase complete");
            self.transition(PhaseStep::PhaseComplete);
            return;
        };

        self.candidates = self
            .arenas
            .iter()
            .enumerate()
            .filter(|(_, a)| a.aggressor.owner() == acting)
            .map(|(i, _)| i)
            .collect();

        if self.candidates.len() == 1 {
            let arena = self.arenas[self.candidates[0]].arena.clone();
            self.activate(arena, game, topic);
            return;
        }

        let choices = self.arena_choices();
        topic.publish_choices(&format!("{} must choose where to fight.", acting), &choices);
        self.transition(PhaseStep::AwaitingArenaSelection);
    }

    /// The arenas the acting faction may pick, numbered from 1.
    pub fn arena_choices(&self) -> Vec<Choice> {
        self.candidates
            .iter()
            .enumerate()
            .map(|(i, idx)| Choice { id: i + 1, label: self.arenas[*idx].arena.label() })
            .collect()
    }

    fn activate<T: Topic + ?Sized>(&mut self, arena: Arena, game: &GameState, topic: &mut T) {
        let Some(battle) = Battle::new(arena.clone(), game) else {
            warn!(arena = %arena, "arena no longer contested, skipping");
            self.choose_next(game, topic);
            return;
        };
        self.transition(PhaseStep::ArenaActive);
        info!(battle = %battle.describe(), "battle activated");
        topic.publish(&format!("Next battle: {}.", battle.describe()));

        if battle.opponent.is_none() {
            let choices: Vec<Choice> = battle
                .opponents(game)
                .into_iter()
                .enumerate()
                .map(|(i, id)| Choice { id: i + 1, label: battle.label(id) })
                .collect();
            topic.publish_choices(
                &format!("{} must choose an opponent.", battle.label(battle.aggressor)),
                &choices,
            );
            self.battle = Some(battle);
            self.transition(PhaseStep::AwaitingOpponentSelection);
        } else {
            self.announce_plans_due(&battle, topic);
            self.battle = Some(battle);
            self.transition(PhaseStep::PlansPending);
        }
    }

    fn announce_plans_due<T: Topic + ?Sized>(&self, battle: &Battle, topic: &mut T) {
        if let Some((a, o)) = battle.combatants() {
            topic.publish(&format!(
                "{} and {} submit battle plans.",
                battle.label(a),
                battle.label(o)
            ));
        }
    }

    /// Picks one of the offered arenas. `index` is 0-based into `arena_choices`.
    pub fn select_arena<T: Topic + ?Sized>(
        &mut self,
        index: usize,
        game: &GameState,
        topic: &mut T,
    ) -> Result<(), PhaseError> {
        self.expect("select an arena", &[PhaseStep::AwaitingArenaSelection])?;
        let idx = *self.candidates.get(index).ok_or(PhaseError::InvalidArenaIndex(index))?;
        let arena = self.arenas[idx].arena.clone();
        self.activate(arena, game, topic);
        Ok(())
    }

    /// Names the aggressor's opponent when three or more sides are present.
    pub fn select_opponent<T: Topic + ?Sized>(
        &mut self,
        opponent: SideId,
        game: &GameState,
        topic: &mut T,
    ) -> Result<(), PhaseError> {
        self.expect("select an opponent", &[PhaseStep::AwaitingOpponentSelection])?;
        let battle = self.battle_mut()?;
        battle.select_opponent(opponent, game)?;
        let battle = battle.clone();
        self.announce_plans_due(&battle, topic);
        self.transition(PhaseStep::PlansPending);
        Ok(())
    }

    /// Records a side's plan. The second plan resolves the battle and the
    /// result is returned.
    pub fn submit_plan<T: Topic + ?Sized>(
        &mut self,
        side: SideId,
        plan: BattlePlan,
        game: &mut GameState,
        topic: &mut T,
    ) -> Result<Option<BattleResult>, PhaseError> {
        self.expect("submit a plan", &[PhaseStep::PlansPending])?;
        let config = self.config.clone();
        let battle = self.battle.as_mut().ok_or(PhaseError::NoActiveBattle)?;

        if !battle.is_live(game) {
            warn!(arena = %battle.arena, "battle lost a side before resolution, skipping");
            self.battle = None;
            self.transition(PhaseStep::ArenaResolved);
            return Ok(None);
        }

        battle.revalidate(game, &config)?;
        let description = plan.describe();
        let ready = battle.submit_plan(side, plan, game, &config)?;
        let label = battle.label(side);
        if battle.is_revealed(side) {
            topic.publish(&format!("{} reveals its plan: {}.", label, description));
        } else {
            topic.publish(&format!("{} has submitted a plan.", label));
        }
        if !ready {
            return Ok(None);
        }

        let result = match compute_outcome(battle, game, &config) {
            Ok(result) => result,
            Err(err) => {
                battle.withdraw_plan(side)?;
                return Err(err);
            }
        };
        let obligations = commit_outcome(&result, game);
        info!(
            arena = %result.arena,
            winner = ?result.winner,
            explosion = result.explosion,
            "battle resolved"
        );
        topic.publish(&result.summary());
        if let Some(first) = obligations.first() {
            topic.publish_choices(&first.prompt(), &first.choices());
        }

        self.obligations = obligations;
        self.battle = None;
        self.last_result = Some(result.clone());
        self.resolved += 1;
        self.transition(PhaseStep::ArenaResolved);
        Ok(Some(result))
    }

    /// Clears a side's recorded plan so it can draft again.
    pub fn withdraw_plan<T: Topic + ?Sized>(&mut self, side: SideId, topic: &mut T) -> Result<(), PhaseError> {
        self.expect("withdraw a plan", &[PhaseStep::PlansPending])?;
        let battle = self.battle_mut()?;
        battle.withdraw_plan(side)?;
        let label = battle.label(side);
        topic.publish(&format!("{} starts over.", label));
        Ok(())
    }

    /// Marks a side's plan as revealed. A plan already recorded is announced now.
    pub fn reveal_side<T: Topic + ?Sized>(&mut self, side: SideId, topic: &mut T) -> Result<(), PhaseError> {
        self.expect(
            "reveal a side",
            &[PhaseStep::ArenaActive, PhaseStep::AwaitingOpponentSelection, PhaseStep::PlansPending],
        )?;
        let battle = self.battle_mut()?;
        battle.reveal(side)?;
        if let Some(plan) = battle.plan_for(side) {
            let text = format!("{} reveals its plan: {}.", battle.label(side), plan.describe());
            topic.publish(&text);
        }
        Ok(())
    }

    /// Forces the outcome of the active battle. Recorded plans are checked
    /// against the live ledger first.
    pub fn set_override<T: Topic + ?Sized>(
        &mut self,
        outcome: OutcomeOverride,
        game: &GameState,
        topic: &mut T,
    ) -> Result<(), PhaseError> {
        self.expect("override the outcome", &[PhaseStep::PlansPending])?;
        let config = self.config.clone();
        let battle = self.battle_mut()?;
        battle.revalidate(game, &config)?;
        battle.set_override(outcome)?;
        let text = match outcome {
            OutcomeOverride::Winner(id) => format!("{} will win this battle.", battle.label(id)),
            OutcomeOverride::Traitor(id) => format!("{} calls a traitor.", battle.label(id)),
        };
        topic.publish(&text);
        Ok(())
    }

    /// Answers the front obligation.
    pub fn resolve_obligation<T: Topic + ?Sized>(
        &mut self,
        choice: &ObligationChoice,
        game: &mut GameState,
        topic: &mut T,
    ) -> Result<(), PhaseError> {
        let obligation = self.obligations.first().ok_or(PhaseError::NoPendingObligation)?;
        let text = settle_obligation(game, obligation, choice)?;
        self.obligations.remove(0);
        topic.publish(&text);
        if let Some(next) = self.obligations.first() {
            topic.publish_choices(&next.prompt(), &next.choices());
        }
        Ok(())
    }

    /// Ends the phase and returns leaders who fought to the available pool.
    pub fn end<T: Topic + ?Sized>(&mut self, game: &mut GameState, topic: &mut T) -> Result<(), PhaseError> {
        if !self.obligations.is_empty() {
            return Err(PhaseError::MustResolvePendingObligation);
        }
        self.expect(
            "end the battle phase",
            &[PhaseStep::ArenasIdentified, PhaseStep::ArenaResolved, PhaseStep::PhaseComplete],
        )?;
        let remaining = contested_arenas(game).len();
        if remaining > 0 {
            return Err(PhaseError::BattlesRemaining(remaining));
        }
        game.reset_fought_leaders();
        self.arenas.clear();
        self.candidates.clear();
        info!(resolved = self.resolved, "battle phase ended");
        topic.publish("The battle phase is over.");
        self.transition(PhaseStep::Ended);
        Ok(())
    }
}
