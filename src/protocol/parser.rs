//! Driver command parser.
//!
//! Parses incoming protocol lines into structured `Command` variants that
//! the engine loop dispatches on. One command per line, tokens separated by
//! whitespace; JSON payloads and leader names take the rest of the line.

use crate::battle::{BattlePlan, ObligationChoice};
use crate::board::{Faction, Sector, Territory};

/// Names a battle side on the wire: a faction id, or `token:<faction>` for
/// that faction's disguised token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideRef {
    pub faction: Faction,
    pub disguised: bool,
}

impl SideRef {
    pub const fn faction(faction: Faction) -> Self {
        SideRef { faction, disguised: false }
    }

    pub const fn token(faction: Faction) -> Self {
        SideRef { faction, disguised: true }
    }
}

/// A parsed driver command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Synchronization ping; engine must reply `readyok`.
    IsReady,

    /// Set a rule option: `setoption name <id> [value <x>]`.
    SetOption { name: String, value: Option<String> },

    /// Load a game state from JSON.
    Position { json: String },

    /// Start the battle phase.
    Start,

    /// Advance to the next battle.
    Next,

    /// Pick an offered arena, numbered from 1.
    Arena(usize),

    /// Name the aggressor's opponent.
    Opponent(SideRef),

    /// Submit a side's plan.
    Plan { side: SideRef, plan: BattlePlan },

    /// Clear a side's recorded plan.
    Withdraw(SideRef),

    /// Mark a side's plan as revealed.
    Reveal(SideRef),

    /// Force the named side to win the active battle.
    Winner(SideRef),

    /// The named side calls a traitor.
    Traitor(SideRef),

    /// Flip a disguised token face up: `unmask <faction> <territory> <sector> <count>`.
    Unmask { faction: Faction, territory: Territory, sector: Sector, count: u32 },

    /// Answer the pending obligation.
    Resolve(ObligationChoice),

    /// End the battle phase.
    End,

    /// Print the current state as JSON.
    State,

    /// Terminate the engine process.
    Quit,
}

/// Reasons a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("malformed {command}: expected '{usage}'")]
    Malformed { command: &'static str, usage: &'static str },

    #[error("unknown faction: '{0}'")]
    UnknownFaction(String),

    #[error("unknown territory: '{0}'")]
    UnknownTerritory(String),

    #[error("invalid number: '{0}'")]
    InvalidNumber(String),

    #[error("invalid plan JSON: {0}")]
    InvalidPlan(String),
}

/// Parses a single line of input into a `Command`.
///
/// Returns `Ok(None)` for empty lines.
pub fn parse_command(line: &str) -> Result<Option<Command>, ProtocolError> {
    let trimmed = line.trim();
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return Ok(None);
    };

    let cmd = match *first {
        "isready" => Command::IsReady,
        "start" => Command::Start,
        "next" => Command::Next,
        "end" => Command::End,
        "state" => Command::State,
        "quit" => Command::Quit,
        "keep" => Command::Resolve(ObligationChoice::Keep),
        "discard" => Command::Resolve(ObligationChoice::Discard),
        "decline" => Command::Resolve(ObligationChoice::Decline),

        "setoption" => parse_setoption(&tokens)?,
        "position" => Command::Position { json: rest(trimmed, "position", "position <json>")? },
        "arena" => parse_arena(&tokens)?,
        "opponent" => Command::Opponent(side_arg(&tokens, "opponent", "opponent <side>")?),
        "withdraw" => Command::Withdraw(side_arg(&tokens, "withdraw", "withdraw <side>")?),
        "reveal" => Command::Reveal(side_arg(&tokens, "reveal", "reveal <side>")?),
        "winner" => Command::Winner(side_arg(&tokens, "winner", "winner <side>")?),
        "traitor" => Command::Traitor(side_arg(&tokens, "traitor", "traitor <side>")?),
        "plan" => parse_plan(&tokens, trimmed)?,
        "unmask" => parse_unmask(&tokens)?,
        "capture" => Command::Resolve(ObligationChoice::Capture(rest(trimmed, "capture", "capture <leader>")?)),
        "kill" => Command::Resolve(ObligationChoice::Kill(rest(trimmed, "kill", "kill <leader>")?)),

        other => return Err(ProtocolError::UnknownCommand(other.to_string())),
    };
    Ok(Some(cmd))
}

/// Everything after the keyword, trimmed. Fails if nothing follows.
fn rest(line: &str, keyword: &'static str, usage: &'static str) -> Result<String, ProtocolError> {
    let tail = line.strip_prefix(keyword).unwrap_or("").trim();
    if tail.is_empty() {
        return Err(ProtocolError::Malformed { command: keyword, usage });
    }
    Ok(tail.to_string())
}

fn parse_number<T: std::str::FromStr>(token: &str) -> Result<T, ProtocolError> {
    token.parse().map_err(|_| ProtocolError::InvalidNumber(token.to_string()))
}

fn parse_faction(token: &str) -> Result<Faction, ProtocolError> {
    Faction::from_id(token).ok_or_else(|| ProtocolError::UnknownFaction(token.to_string()))
}

/// Parses a side reference: `<faction>` or `token:<faction>`.
pub fn parse_side(token: &str) -> Result<SideRef, ProtocolError> {
    match token.strip_prefix("token:") {
        Some(id) => Ok(SideRef::token(parse_faction(id)?)),
        None => Ok(SideRef::faction(parse_faction(token)?)),
    }
}

fn side_arg(tokens: &[&str], command: &'static str, usage: &'static str) -> Result<SideRef, ProtocolError> {
    if tokens.len() != 2 {
        return Err(ProtocolError::Malformed { command, usage });
    }
    parse_side(tokens[1])
}

/// Parses `setoption name <id> [value <x>]`.
fn parse_setoption(tokens: &[&str]) -> Result<Command, ProtocolError> {
    const USAGE: &str = "setoption name <id> [value <x>]";
    if tokens.len() < 3 || tokens[1] != "name" {
        return Err(ProtocolError::Malformed { command: "setoption", usage: USAGE });
    }

    let (name, value) = match tokens.iter().position(|&t| t == "value") {
        Some(vi) => {
            let name_parts = &tokens[2..vi];
            let value_parts = &tokens[vi + 1..];
            if name_parts.is_empty() {
                return Err(ProtocolError::Malformed { command: "setoption", usage: USAGE });
            }
            let value = if value_parts.is_empty() { None } else { Some(value_parts.join(" ")) };
            (name_parts.join(" "), value)
        }
        None => (tokens[2..].join(" "), None),
    };

    Ok(Command::SetOption { name, value })
}

/// Parses `arena <n>` where n counts from 1.
fn parse_arena(tokens: &[&str]) -> Result<Command, ProtocolError> {
    if tokens.len() != 2 {
        return Err(ProtocolError::Malformed { command: "arena", usage: "arena <n>" });
    }
    let n: usize = parse_number(tokens[1])?;
    if n == 0 {
        return Err(ProtocolError::InvalidNumber(tokens[1].to_string()));
    }
    Ok(Command::Arena(n))
}

/// Parses `plan <side> <json>`.
fn parse_plan(tokens: &[&str], line: &str) -> Result<Command, ProtocolError> {
    const USAGE: &str = "plan <side> <json>";
    if tokens.len() < 3 {
        return Err(ProtocolError::Malformed { command: "plan", usage: USAGE });
    }
    let side = parse_side(tokens[1])?;
    let json = line
        .strip_prefix("plan")
        .unwrap_or("")
        .trim_start()
        .strip_prefix(tokens[1])
        .unwrap_or("")
        .trim();
    let plan: BattlePlan = serde_json::from_str(json).map_err(|e| ProtocolError::InvalidPlan(e.to_string()))?;
    Ok(Command::Plan { side, plan })
}

/// Parses `unmask <faction> <territory> <sector> <count>`.
fn parse_unmask(tokens: &[&str]) -> Result<Command, ProtocolError> {
    if tokens.len() != 5 {
        return Err(ProtocolError::Malformed {
            command: "unmask",
            usage: "unmask <faction> <territory> <sector> <count>",
        });
    }
    let faction = parse_faction(tokens[1])?;
    let territory =
        Territory::from_id(tokens[2]).ok_or_else(|| ProtocolError::UnknownTerritory(tokens[2].to_string()))?;
    Ok(Command::Unmask {
        faction,
        territory,
        sector: parse_number(tokens[3])?,
        count: parse_number(tokens[4])?,
    })
}
