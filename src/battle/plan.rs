//! Battle plans and their validation.
//!
//! A plan is a side's sealed commitment: who leads, how many units go on the
//! wheel, how much spice backs them, and which cards are played. Validation
//! is a pure check against the game state and never mutates it.

use serde::{Deserialize, Serialize};

use crate::board::{card_kind, CardKind, Faction, ForcePool, GameState, Territory};
use crate::config::{RulesConfig, SubstituteRule};

/// A side's sealed battle plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattlePlan {
    /// Name of the leader fighting.
    pub leader: Option<String>,
    /// Name of a leader-substitute card played instead of a leader.
    pub substitute: Option<String>,
    pub regular_dialed: u32,
    pub special_dialed: u32,
    /// Spice backing the dialed units.
    pub spice: u32,
    pub weapon: Option<String>,
    pub defense: Option<String>,
    /// Claims the faction's loss-unlocked strength bonus.
    pub use_bonus: bool,
}

impl BattlePlan {
    /// A plan led by the named leader with nothing dialed.
    pub fn led_by(name: impl Into<String>) -> Self {
        BattlePlan { leader: Some(name.into()), ..Default::default() }
    }

    /// A plan fought by a leader-substitute card.
    pub fn substitute(card: impl Into<String>) -> Self {
        BattlePlan { substitute: Some(card.into()), ..Default::default() }
    }

    /// Dials regular units, each backed by one spice.
    pub fn dial(mut self, regular: u32) -> Self {
        self.regular_dialed = regular;
        self.spice = regular;
        self
    }

    pub fn with_special(mut self, special: u32) -> Self {
        self.special_dialed = special;
        self
    }

    pub fn with_spice(mut self, spice: u32) -> Self {
        self.spice = spice;
        self
    }

    pub fn with_weapon(mut self, card: impl Into<String>) -> Self {
        self.weapon = Some(card.into());
        self
    }

    pub fn with_defense(mut self, card: impl Into<String>) -> Self {
        self.defense = Some(card.into());
        self
    }

    pub fn with_bonus(mut self) -> Self {
        self.use_bonus = true;
        self
    }

    /// Total units committed to the wheel.
    pub fn dialed(&self) -> u32 {
        self.regular_dialed.saturating_add(self.special_dialed)
    }

    /// Cards this plan puts on the table.
    pub fn cards(&self) -> impl Iterator<Item = &str> {
        [&self.substitute, &self.weapon, &self.defense]
            .into_iter()
            .filter_map(|c| c.as_deref())
    }

    /// One-line description for revealed plans and logs.
    pub fn describe(&self) -> String {
        let lead = match (&self.leader, &self.substitute) {
            (Some(l), _) => l.clone(),
            (None, Some(s)) => s.clone(),
            (None, None) => "no leader".to_string(),
        };
        let mut parts = vec![lead, format!("dial {}", self.dialed()), format!("spice {}", self.spice)];
        if let Some(w) = &self.weapon {
            parts.push(format!("weapon {}", w));
        }
        if let Some(d) = &self.defense {
            parts.push(format!("defense {}", d));
        }
        if self.use_bonus {
            parts.push("bonus".to_string());
        }
        parts.join(", ")
    }
}

/// Reasons a plan is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("{0} is not fighting in this battle")]
    SideNotInBattle(String),

    #[error("{0} has already submitted a plan")]
    PlanAlreadySubmitted(String),

    #[error("{0} has no forces in this battle")]
    NoForcesPresent(String),

    #[error("{0} is not seated in this game")]
    UnknownFaction(Faction),

    #[error("a plan may name a leader or a substitute, not both")]
    LeaderAndSubstitute,

    #[error("a leader or substitute card is required")]
    LeaderRequired,

    #[error("no leader named '{0}'")]
    UnknownLeader(String),

    #[error("leader '{0}' cannot fight here this round")]
    LeaderUnavailable(String),

    #[error("'{0}' is not a leader substitute")]
    NotASubstitute(String),

    #[error("'{0}' may only be played without a living leader")]
    SubstituteNotAllowed(String),

    #[error("'{0}' is not in hand")]
    CardNotHeld(String),

    #[error("'{0}' cannot be played as a weapon")]
    NotAWeapon(String),

    #[error("'{0}' cannot be played as a defense")]
    NotADefense(String),

    #[error("dialed {dialed} regular units but only {present} are present")]
    RegularDialExceedsForces { dialed: u32, present: u32 },

    #[error("dialed {dialed} special units but only {present} are present")]
    SpecialDialExceedsForces { dialed: u32, present: u32 },

    #[error("committed {spice} spice but the balance is {balance}")]
    SpiceExceedsBalance { spice: u32, balance: u32 },

    #[error("committed {spice} spice for only {dialed} dialed units")]
    SpiceExceedsDial { spice: u32, dialed: u32 },

    #[error("{0} is not available")]
    BonusUnavailable(String),
}

/// What a plan is checked against: the battle's territory, the faction
/// speaking for the side, and the side's live fighting forces.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub side_label: &'a str,
    pub territory: Territory,
    pub lead: Faction,
    pub forces: ForcePool,
}

/// Checks a plan without touching the game state.
pub fn validate_plan(
    plan: &BattlePlan,
    ctx: &PlanContext<'_>,
    game: &GameState,
    config: &RulesConfig,
) -> Result<(), PlanError> {
    let fs = game.faction(ctx.lead).ok_or(PlanError::UnknownFaction(ctx.lead))?;

    if ctx.forces.total() == 0 && !ctx.forces.disguised {
        return Err(PlanError::NoForcesPresent(ctx.side_label.to_string()));
    }

    let holds_substitute = fs
        .hand
        .iter()
        .any(|c| card_kind(c) == Some(CardKind::LeaderSubstitute));
    let has_leader = fs.has_leader_for(ctx.territory);

    match (&plan.leader, &plan.substitute) {
        (Some(_), Some(_)) => return Err(PlanError::LeaderAndSubstitute),
        (Some(name), None) => {
            let leader = fs.leader(name).ok_or_else(|| PlanError::UnknownLeader(name.clone()))?;
            if !leader.can_fight_in(ctx.territory) {
                return Err(PlanError::LeaderUnavailable(name.clone()));
            }
        }
        (None, Some(card)) => {
            if card_kind(card) != Some(CardKind::LeaderSubstitute) {
                return Err(PlanError::NotASubstitute(card.clone()));
            }
            if config.substitute_rule == SubstituteRule::WhenLeaderless && has_leader {
                return Err(PlanError::SubstituteNotAllowed(card.clone()));
            }
        }
        (None, None) => {
            if has_leader || holds_substitute {
                return Err(PlanError::LeaderRequired);
            }
        }
    }

    if let Some(card) = &plan.weapon {
        match card_kind(card) {
            Some(CardKind::Weapon(_)) | Some(CardKind::Worthless) => {}
            _ => return Err(PlanError::NotAWeapon(card.clone())),
        }
    }
    if let Some(card) = &plan.defense {
        match card_kind(card) {
            Some(CardKind::Defense(_)) | Some(CardKind::Worthless) => {}
            _ => return Err(PlanError::NotADefense(card.clone())),
        }
    }
    let played: Vec<&str> = plan.cards().collect();
    for card in &played {
        let wanted = played.iter().filter(|c| *c == card).count();
        let held = fs.hand.iter().filter(|c| c.as_str() == *card).count();
        if held < wanted {
            return Err(PlanError::CardNotHeld(card.to_string()));
        }
    }

    let regular_present = ctx.forces.regular.saturating_add(u32::from(ctx.forces.disguised));
    if plan.regular_dialed > regular_present {
        return Err(PlanError::RegularDialExceedsForces {
            dialed: plan.regular_dialed,
            present: regular_present,
        });
    }
    if plan.special_dialed > ctx.forces.special {
        return Err(PlanError::SpecialDialExceedsForces {
            dialed: plan.special_dialed,
            present: ctx.forces.special,
        });
    }
    if plan.spice > fs.spice {
        return Err(PlanError::SpiceExceedsBalance { spice: plan.spice, balance: fs.spice });
    }
    if plan.spice > plan.dialed() {
        return Err(PlanError::SpiceExceedsDial { spice: plan.spice, dialed: plan.dialed() });
    }

    if plan.use_bonus {
        match ctx.lead.capabilities().bonus_strength {
            Some(rule) if fs.forces_lost >= rule.min_losses && plan.leader.is_some() => {}
            Some(rule) => return Err(PlanError::BonusUnavailable(rule.name.to_string())),
            None => return Err(PlanError::BonusUnavailable("strength bonus".to_string())),
        }
    }

    Ok(())
}
