//! Engine state management.
//!
//! Holds the loaded game state, the battles phase controller and the rule
//! options between commands, and dispatches parsed commands to them.
//! Announcements are written as `info` lines, followed by `ok` or
//! `error <message>` for every command.

use std::io::{self, Write};

use serde::Serialize;
use tracing::{debug, warn};

use crate::battle::{Battles, OutcomeOverride, PhaseError, SideId};
use crate::board::GameState;
use crate::config::{ConfigError, RulesConfig};
use crate::notify::{Topic, WriterTopic};
use crate::protocol::parser::{Command, SideRef};

/// Errors raised while executing a command.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no position loaded")]
    NoPosition,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error("{0} has no side in the active battle")]
    NoSuchSide(String),

    #[error("no disguised token of {0} in that sector")]
    NoToken(String),
}

/// Saved form of the engine: the game and the phase in progress.
#[derive(Serialize)]
pub struct Snapshot<'a> {
    pub game: &'a GameState,
    pub battles: &'a Battles,
}

/// Holds the mutable state of the engine between commands.
pub struct Engine {
    pub game: Option<GameState>,
    pub battles: Battles,
    pub config: RulesConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(RulesConfig::default())
    }
}

impl Engine {
    pub fn new(config: RulesConfig) -> Self {
        Engine { game: None, battles: Battles::new(config.clone()), config }
    }

    /// Loads a game state from JSON and resets the phase.
    pub fn set_position(&mut self, json: &str) -> Result<(), EngineError> {
        let game: GameState = serde_json::from_str(json)?;
        self.game = Some(game);
        self.battles = Battles::new(self.config.clone());
        Ok(())
    }

    /// Sets a rule option. Flags given without a value are switched on.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), EngineError> {
        self.config.set_option(name, value.unwrap_or("true"))?;
        self.battles.config = self.config.clone();
        Ok(())
    }

    /// Resolves a side reference against the active battle.
    fn side(&self, side: SideRef) -> Result<SideId, EngineError> {
        let label = if side.disguised {
            format!("token:{}", side.faction.id())
        } else {
            side.faction.id().to_string()
        };
        match self.battles.active_battle() {
            Some(battle) => battle.side_of(side.faction, side.disguised).ok_or(EngineError::NoSuchSide(label)),
            None => Err(PhaseError::NoActiveBattle.into()),
        }
    }

    fn state_json(&self) -> Result<String, EngineError> {
        let game = self.game.as_ref().ok_or(EngineError::NoPosition)?;
        Ok(serde_json::to_string(&Snapshot { game, battles: &self.battles })?)
    }

    /// Executes one command, writing announcements to `out`.
    pub fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> Result<(), EngineError> {
        debug!(?cmd, "executing");
        if let Command::SetOption { name, value } = &cmd {
            return self.set_option(name, value.as_deref());
        }
        if let Command::Position { json } = &cmd {
            return self.set_position(json);
        }
        if let Command::State = cmd {
            let json = self.state_json()?;
            let _ = writeln!(out, "state {}", json);
            return Ok(());
        }

        let mut topic = WriterTopic::new(&mut *out);
        let sides = match &cmd {
            Command::Opponent(s)
            | Command::Withdraw(s)
            | Command::Reveal(s)
            | Command::Winner(s)
            | Command::Traitor(s)
            | Command::Plan { side: s, .. } => Some(self.side(*s)?),
            _ => None,
        };

        let game = self.game.as_mut().ok_or(EngineError::NoPosition)?;
        let battles = &mut self.battles;
        match cmd {
            Command::Start => battles.start(game, &mut topic)?,
            Command::Next => battles.advance(game, &mut topic)?,
            Command::Arena(n) => battles.select_arena(n - 1, game, &mut topic)?,
            Command::Opponent(_) => {
                battles.select_opponent(require(sides)?, game, &mut topic)?;
            }
            Command::Plan { plan, .. } => {
                battles.submit_plan(require(sides)?, plan, game, &mut topic)?;
            }
            Command::Withdraw(_) => battles.withdraw_plan(require(sides)?, &mut topic)?,
            Command::Reveal(_) => battles.reveal_side(require(sides)?, &mut topic)?,
            Command::Winner(_) => {
                battles.set_override(OutcomeOverride::Winner(require(sides)?), game, &mut topic)?;
            }
            Command::Traitor(_) => {
                battles.set_override(OutcomeOverride::Traitor(require(sides)?), game, &mut topic)?;
            }
            Command::Unmask { faction, territory, sector, count } => {
                let placed = game
                    .reveal_disguised_token(territory, sector, faction, count)
                    .ok_or_else(|| EngineError::NoToken(faction.to_string()))?;
                topic.publish(&format!("{} reveals its token in {} with {} forces.", faction, territory, placed));
            }
            Command::Resolve(choice) => battles.resolve_obligation(&choice, game, &mut topic)?,
            Command::End => battles.end(game, &mut topic)?,
            Command::IsReady
            | Command::Quit
            | Command::SetOption { .. }
            | Command::Position { .. }
            | Command::State => {}
        }
        Ok(())
    }

    /// Runs one command and reports the outcome. Returns false on `quit`.
    pub fn handle<W: Write>(&mut self, cmd: Command, out: &mut W) -> io::Result<bool> {
        match cmd {
            Command::Quit => return Ok(false),
            Command::IsReady => {
                writeln!(out, "readyok")?;
            }
            cmd => match self.execute(cmd, out) {
                Ok(()) => writeln!(out, "ok")?,
                Err(e) => {
                    warn!(error = %e, "command rejected");
                    writeln!(out, "error {}", e)?;
                }
            },
        }
        out.flush()?;
        Ok(true)
    }
}

fn require(side: Option<SideId>) -> Result<SideId, EngineError> {
    side.ok_or(EngineError::Phase(PhaseError::NoActiveBattle))
}
