//! Leaders and their per-round status.

use serde::{Deserialize, Serialize};

use super::faction::{Faction, FACTION_COUNT};
use super::territory::Territory;

/// A leader's combat value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderValue {
    Fixed(u32),
    /// Counts as zero unless an effect sets it.
    Variable,
}

impl LeaderValue {
    /// Base strength this value contributes in battle.
    pub const fn base(self) -> u32 {
        match self {
            LeaderValue::Fixed(v) => v,
            LeaderValue::Variable => 0,
        }
    }
}

impl std::fmt::Display for LeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaderValue::Fixed(v) => write!(f, "{}", v),
            LeaderValue::Variable => f.write_str("X"),
        }
    }
}

/// Where a leader stands this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderStatus {
    Available,
    /// Has fought this round; may only fight again in the same territory.
    Fought { territory: Territory },
    Tanks,
}

/// A leader held by a faction, possibly captured from another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    pub name: String,
    pub value: LeaderValue,
    pub status: LeaderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_owner: Option<Faction>,
}

impl Leader {
    /// Creates an available leader.
    pub fn new(name: impl Into<String>, value: LeaderValue) -> Self {
        Leader {
            name: name.into(),
            value,
            status: LeaderStatus::Available,
            original_owner: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status != LeaderStatus::Tanks
    }

    /// Returns true if the leader may fight a battle in `territory` this round.
    pub fn can_fight_in(&self, territory: Territory) -> bool {
        match self.status {
            LeaderStatus::Available => true,
            LeaderStatus::Fought { territory: t } => t == territory,
            LeaderStatus::Tanks => false,
        }
    }
}

/// Starting leaders, indexed by `Faction as usize`.
pub static LEADER_ROSTER: [&[(&str, LeaderValue)]; FACTION_COUNT] = [
    &[
        ("Thufir Hawat", LeaderValue::Fixed(5)),
        ("Lady Jessica", LeaderValue::Fixed(5)),
        ("Gurney Halleck", LeaderValue::Fixed(4)),
        ("Duncan Idaho", LeaderValue::Fixed(2)),
        ("Dr. Wellington Yueh", LeaderValue::Fixed(1)),
    ],
    &[
        ("Feyd-Rautha", LeaderValue::Fixed(6)),
        ("Beast Rabban", LeaderValue::Fixed(4)),
        ("Piter de Vries", LeaderValue::Fixed(3)),
        ("Captain Iakin Nefud", LeaderValue::Fixed(2)),
        ("Umman Kudu", LeaderValue::Fixed(1)),
    ],
    &[
        ("Hasimir Fenring", LeaderValue::Fixed(6)),
        ("Captain Aramsham", LeaderValue::Fixed(5)),
        ("Caid", LeaderValue::Fixed(3)),
        ("Burseg", LeaderValue::Fixed(3)),
        ("Bashar", LeaderValue::Fixed(2)),
    ],
    &[
        ("Stilgar", LeaderValue::Fixed(7)),
        ("Chani", LeaderValue::Fixed(6)),
        ("Otheym", LeaderValue::Fixed(5)),
        ("Shadout Mapes", LeaderValue::Fixed(3)),
        ("Jamis", LeaderValue::Fixed(2)),
    ],
    &[
        ("Alia", LeaderValue::Fixed(5)),
        ("Margot Lady Fenring", LeaderValue::Fixed(5)),
        ("Mother Ramallo", LeaderValue::Fixed(5)),
        ("Princess Irulan", LeaderValue::Fixed(5)),
        ("Wanna Yueh", LeaderValue::Fixed(5)),
    ],
    &[
        ("Staban Tuek", LeaderValue::Fixed(5)),
        ("Master Bewt", LeaderValue::Fixed(3)),
        ("Esmar Tuek", LeaderValue::Fixed(3)),
        ("Soo-Soo Sook", LeaderValue::Fixed(2)),
        ("Guild Rep", LeaderValue::Fixed(1)),
    ],
    &[
        ("Dominic Vernius", LeaderValue::Fixed(4)),
        ("Tessia Vernius", LeaderValue::Fixed(4)),
        ("C'Tair Pilru", LeaderValue::Fixed(2)),
        ("Kailea Vernius", LeaderValue::Fixed(2)),
        ("Cammar Pilru", LeaderValue::Fixed(1)),
    ],
    &[
        ("Zoal", LeaderValue::Variable),
        ("Hidar Fen Ajidica", LeaderValue::Fixed(4)),
        ("Master Zaaf", LeaderValue::Fixed(3)),
        ("Wykk", LeaderValue::Fixed(2)),
        ("Blin", LeaderValue::Fixed(1)),
    ],
    &[
        ("Frankos Aru", LeaderValue::Fixed(4)),
        ("Lady Jalma", LeaderValue::Fixed(3)),
        ("Duke Verdun", LeaderValue::Fixed(2)),
        ("Rajiv Londine", LeaderValue::Fixed(2)),
        ("Bhalla", LeaderValue::Fixed(1)),
    ],
    &[
        ("Lady Helena", LeaderValue::Fixed(5)),
        ("Ein Calimar", LeaderValue::Fixed(5)),
        ("Haloa Rund", LeaderValue::Fixed(3)),
        ("Talis Balt", LeaderValue::Fixed(2)),
        ("Flinto Kinnis", LeaderValue::Fixed(1)),
    ],
    &[
        ("Sanya Ecaz", LeaderValue::Fixed(6)),
        ("Bindikk Narvi", LeaderValue::Fixed(5)),
        ("Whitmore Bludd", LeaderValue::Fixed(4)),
        ("Rivvy Dinari", LeaderValue::Fixed(3)),
        ("Ilesa Ecaz", LeaderValue::Fixed(2)),
    ],
    &[
        ("Grand Duke Vidal", LeaderValue::Fixed(6)),
        ("Hiih Resser", LeaderValue::Fixed(4)),
        ("Trin Kronos", LeaderValue::Fixed(3)),
        ("Taeryn Alman", LeaderValue::Fixed(2)),
        ("Vando Terboli", LeaderValue::Fixed(2)),
    ],
];

/// Builds the starting leader pool for `faction`.
pub fn starting_leaders(faction: Faction) -> Vec<Leader> {
    LEADER_ROSTER[faction as usize]
        .iter()
        .map(|(name, value)| Leader::new(*name, *value))
        .collect()
}
