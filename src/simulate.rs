//! Random battle-phase simulation.
//!
//! Deals random boards, plays every battle of the phase with random but legal
//! choices, and records what happened. Games are independent and run in
//! parallel with rayon; each game is single-threaded and reproducible from
//! its seed.

use std::collections::BTreeMap;
use std::io::Write;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

use crate::battle::{
    Battle, BattlePlan, Battles, Obligation, ObligationChoice, PhaseError, PhaseStep, SideId,
};
use crate::board::{
    card_kind, CardKind, Faction, ForcePool, GameState, Territory, ALL_FACTIONS, ALL_TERRITORIES,
    CARD_CATALOGUE,
};
use crate::config::RulesConfig;
use crate::notify::{MemoryTopic, Topic, TracingTopic};

/// Upper bound on controller steps per game.
const MAX_STEPS: usize = 500;

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of games to play.
    pub games: usize,
    /// Factions seated per game.
    pub factions: usize,
    /// Force stacks each faction places.
    pub stacks: usize,
    /// Territories forces are dealt into. Fewer means more battles.
    pub territories: usize,
    /// Number of parallel threads.
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    pub quiet: bool,
    pub rules: RulesConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            games: 100,
            factions: 6,
            stacks: 3,
            territories: 8,
            threads: 4,
            seed: 0,
            quiet: false,
            rules: RulesConfig::default(),
        }
    }
}

/// Errors that stop a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("factions must be between 2 and {max}, got {got}")]
    FactionCount { got: usize, max: usize },
}

/// What happened in one simulated game.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    pub game_id: usize,
    pub storm: u8,
    pub battles: usize,
    pub explosions: usize,
    pub winners: Vec<Faction>,
    pub leaders_killed: usize,
    pub forces_lost: u32,
    /// Random plans the controller rejected.
    pub rejected_plans: usize,
    /// Set when the controller returned an unexpected error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl GameRecord {
    fn new(game_id: usize, storm: u8) -> Self {
        GameRecord {
            game_id,
            storm,
            battles: 0,
            explosions: 0,
            winners: Vec::new(),
            leaders_killed: 0,
            forces_lost: 0,
            rejected_plans: 0,
            failure: None,
        }
    }
}

/// Aggregate statistics over a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationSummary {
    pub games: usize,
    pub battles: usize,
    pub explosions: usize,
    pub leaders_killed: usize,
    pub forces_lost: u32,
    pub rejected_plans: usize,
    pub failures: usize,
    pub wins: BTreeMap<Faction, usize>,
}

/// Deals a random board.
pub fn random_game(config: &SimulationConfig, rng: &mut SmallRng) -> GameState {
    let mut game = GameState::empty(rng.gen_range(1..=18));

    let mut factions = ALL_FACTIONS.to_vec();
    factions.shuffle(rng);
    factions.truncate(config.factions.clamp(2, ALL_FACTIONS.len()));
    for faction in &factions {
        game.add_faction(*faction);
    }
    if factions.len() >= 3 && rng.gen_bool(0.3) {
        game.set_alliance(factions[0], factions[1]);
    }

    let mut territories: Vec<Territory> = ALL_TERRITORIES.iter().copied().filter(|t| !t.is_safe()).collect();
    territories.shuffle(rng);
    territories.truncate(config.territories.max(1));

    for faction in factions {
        let caps = faction.capabilities();
        if let Some(fs) = game.faction_mut(faction) {
            fs.spice = rng.gen_range(0..=15);
            fs.reserves = ForcePool::new(10, 0);
            fs.forces_lost = rng.gen_range(0..=10);
            for _ in 0..rng.gen_range(0..=4) {
                if let Some(card) = CARD_CATALOGUE.choose(rng) {
                    fs.hand.push(card.name.to_string());
                }
            }
        }
        for _ in 0..config.stacks {
            let Some(territory) = territories.choose(rng).copied() else {
                continue;
            };
            let Some(sector) = territory.sectors().choose(rng).copied() else {
                continue;
            };
            let special = if caps.special_forces.is_some() { rng.gen_range(0..=2) } else { 0 };
            let pool = ForcePool::new(rng.gen_range(1..=6), special);
            game.place_forces(territory, sector, faction, pool);
        }
        if caps.disguised_token && rng.gen_bool(0.5) {
            if let Some(territory) = territories.choose(rng).copied() {
                if let Some(sector) = territory.sectors().choose(rng).copied() {
                    game.place_disguised_token(territory, sector, faction);
                }
            }
        }
    }
    game
}

/// Drafts a random plan that passes validation for ordinary boards.
pub fn random_plan(game: &GameState, battle: &Battle, side: SideId, rng: &mut SmallRng) -> BattlePlan {
    let lead = side.owner();
    let Some(fs) = game.faction(lead) else {
        return BattlePlan::default();
    };
    let forces = battle.live_forces(side, game);
    let territory = battle.arena.territory;

    let mut plan = BattlePlan::default();
    let leaders: Vec<&str> = fs
        .leaders
        .iter()
        .filter(|l| l.can_fight_in(territory))
        .map(|l| l.name.as_str())
        .collect();
    match leaders.choose(rng) {
        Some(name) => plan.leader = Some(name.to_string()),
        None => {
            plan.substitute = fs
                .hand
                .iter()
                .find(|c| card_kind(c) == Some(CardKind::LeaderSubstitute))
                .cloned();
        }
    }

    plan.regular_dialed = rng.gen_range(0..=forces.regular + u32::from(forces.disguised));
    plan.special_dialed = rng.gen_range(0..=forces.special);
    plan.spice = rng.gen_range(0..=fs.spice.min(plan.dialed()));

    let weapons: Vec<&String> = fs
        .hand
        .iter()
        .filter(|c| matches!(card_kind(c), Some(CardKind::Weapon(_))))
        .collect();
    let defenses: Vec<&String> = fs
        .hand
        .iter()
        .filter(|c| matches!(card_kind(c), Some(CardKind::Defense(_))))
        .collect();
    if rng.gen_bool(0.6) {
        plan.weapon = weapons.choose(rng).map(|c| c.to_string());
    }
    if rng.gen_bool(0.6) {
        plan.defense = defenses.choose(rng).map(|c| c.to_string());
    }

    if let Some(rule) = lead.capabilities().bonus_strength {
        plan.use_bonus = plan.leader.is_some() && fs.forces_lost >= rule.min_losses && rng.gen_bool(0.5);
    }
    plan
}

fn random_answer(obligation: &Obligation, rng: &mut SmallRng) -> ObligationChoice {
    match obligation {
        Obligation::CardRetention { .. } => {
            if rng.gen_bool(0.7) {
                ObligationChoice::Keep
            } else {
                ObligationChoice::Discard
            }
        }
        Obligation::LeaderCapture { candidates, .. } => match (candidates.choose(rng), rng.gen_range(0..3)) {
            (Some(name), 0) => ObligationChoice::Capture(name.clone()),
            (Some(name), 1) => ObligationChoice::Kill(name.clone()),
            _ => ObligationChoice::Decline,
        },
    }
}

/// Plays one battle phase with random choices.
pub fn play_game(config: &SimulationConfig, game_id: usize, rng: &mut SmallRng) -> GameRecord {
    let mut game = random_game(config, rng);
    let mut record = GameRecord::new(game_id, game.storm);
    if let Err(e) = play_phase(&mut game, config, rng, &mut record) {
        warn!(game_id, error = %e, "simulated game failed");
        record.failure = Some(e.to_string());
    }
    record
}

fn play_phase(
    game: &mut GameState,
    config: &SimulationConfig,
    rng: &mut SmallRng,
    record: &mut GameRecord,
) -> Result<(), PhaseError> {
    let mut phase = Battles::new(config.rules.clone());
    let mut memory = MemoryTopic::new();
    let mut log = TracingTopic;
    let topic: &mut dyn Topic = if config.quiet { &mut memory } else { &mut log };
    phase.start(game, topic)?;

    for _ in 0..MAX_STEPS {
        match phase.step() {
            PhaseStep::ArenasIdentified | PhaseStep::ArenaResolved => {
                match phase.pending_obligation().cloned() {
                    Some(obligation) => {
                        let answer = random_answer(&obligation, rng);
                        phase.resolve_obligation(&answer, game, topic)?;
                    }
                    None => phase.advance(game, topic)?,
                }
            }
            PhaseStep::AwaitingArenaSelection => {
                let index = rng.gen_range(0..phase.arena_choices().len());
                phase.select_arena(index, game, topic)?;
            }
            PhaseStep::AwaitingOpponentSelection => {
                let battle = phase.active_battle().ok_or(PhaseError::NoActiveBattle)?;
                let opponents = battle.opponents(game);
                let opponent = *opponents.choose(rng).ok_or(PhaseError::NoActiveBattle)?;
                phase.select_opponent(opponent, game, topic)?;
            }
            PhaseStep::PlansPending => submit_next_plan(&mut phase, game, rng, record, topic)?,
            PhaseStep::PhaseComplete => {
                phase.end(game, topic)?;
                return Ok(());
            }
            PhaseStep::NotStarted | PhaseStep::ArenaActive | PhaseStep::Ended => return Ok(()),
        }
    }
    warn!(game_id = record.game_id, "step limit reached");
    Ok(())
}

fn submit_next_plan(
    phase: &mut Battles,
    game: &mut GameState,
    rng: &mut SmallRng,
    record: &mut GameRecord,
    topic: &mut dyn Topic,
) -> Result<(), PhaseError> {
    let battle = phase.active_battle().ok_or(PhaseError::NoActiveBattle)?;
    let (a, o) = battle.combatants().ok_or(PhaseError::PlansIncomplete)?;
    let side = if battle.plan_for(a).is_none() { a } else { o };
    let plan = random_plan(game, battle, side, rng);

    let outcome = match phase.submit_plan(side, plan, game, topic) {
        Ok(outcome) => outcome,
        Err(PhaseError::Plan(_)) => {
            record.rejected_plans += 1;
            let fallback = fallback_plan(game, phase, side);
            phase.submit_plan(side, fallback, game, topic)?
        }
        Err(e) => return Err(e),
    };

    if let Some(result) = outcome {
        record.battles += 1;
        record.explosions += usize::from(result.explosion);
        if let Some(winner) = result.winner {
            record.winners.push(winner.owner());
        }
        for side in [&result.aggressor, &result.opponent] {
            record.leaders_killed += usize::from(side.leader_killed);
            record.forces_lost += side.units_lost();
        }
    }
    Ok(())
}

/// The plainest plan a side can legally make: first usable leader, nothing dialed.
fn fallback_plan(game: &GameState, phase: &Battles, side: SideId) -> BattlePlan {
    let territory = phase.active_battle().map(|b| b.arena.territory);
    let fs = game.faction(side.owner());
    let leader = fs.and_then(|fs| {
        fs.leaders
            .iter()
            .find(|l| territory.is_some_and(|t| l.can_fight_in(t)))
            .map(|l| l.name.clone())
    });
    let substitute = match leader {
        Some(_) => None,
        None => fs.and_then(|fs| {
            fs.hand
                .iter()
                .find(|c| card_kind(c) == Some(CardKind::LeaderSubstitute))
                .cloned()
        }),
    };
    BattlePlan { leader, substitute, ..Default::default() }
}

fn seeded_rng(seed: u64, offset: usize) -> SmallRng {
    if seed != 0 {
        SmallRng::seed_from_u64(seed.wrapping_add(offset as u64))
    } else {
        SmallRng::from_entropy()
    }
}

/// Plays `config.games` games, in parallel when `config.threads > 1`.
/// Records come back in game order.
pub fn run_simulation(config: &SimulationConfig) -> Result<Vec<GameRecord>, SimulationError> {
    if !(2..=ALL_FACTIONS.len()).contains(&config.factions) {
        return Err(SimulationError::FactionCount { got: config.factions, max: ALL_FACTIONS.len() });
    }
    let start = Instant::now();
    let play = |i: usize| {
        let mut rng = seeded_rng(config.seed, i);
        let game = play_game(config, i, &mut rng);
        if !config.quiet {
            info!(game = i + 1, total = config.games, battles = game.battles, "game finished");
        }
        game
    };

    let games: Vec<GameRecord> = if config.threads > 1 {
        use rayon::prelude::*;
        let pool = rayon::ThreadPoolBuilder::new().num_threads(config.threads).build()?;
        pool.install(|| (0..config.games).into_par_iter().map(play).collect())
    } else {
        (0..config.games).map(play).collect()
    };

    info!(
        games = config.games,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "simulation complete"
    );
    Ok(games)
}

/// Totals a set of game records.
pub fn summarize(games: &[GameRecord]) -> SimulationSummary {
    let mut summary = SimulationSummary { games: games.len(), ..Default::default() };
    for game in games {
        summary.battles += game.battles;
        summary.explosions += game.explosions;
        summary.leaders_killed += game.leaders_killed;
        summary.forces_lost += game.forces_lost;
        summary.rejected_plans += game.rejected_plans;
        summary.failures += usize::from(game.failure.is_some());
        for winner in &game.winners {
            *summary.wins.entry(*winner).or_default() += 1;
        }
    }
    summary
}

/// Writes game records as JSONL (one JSON object per game, one per line).
pub fn write_jsonl<W: Write>(games: &[GameRecord], out: &mut W) -> std::io::Result<()> {
    for game in games {
        serde_json::to_writer(&mut *out, game)?;
        writeln!(out)?;
    }
    out.flush()
}
