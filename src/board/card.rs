//! Treachery cards.
//!
//! Cards are referenced by name. The catalogue maps each name to the role it
//! plays on the battle wheel; weapons and defenses carry a class so the
//! resolver can tell whether a defense answers a weapon.

use serde::{Deserialize, Serialize};

/// Weapon classes that a defense may answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponClass {
    Projectile,
    Poison,
    /// Cannot be defended against.
    Lasgun,
}

/// Defense classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefenseClass {
    Projectile,
    Poison,
}

impl DefenseClass {
    /// Returns true if this defense stops `weapon`.
    pub const fn stops(self, weapon: WeaponClass) -> bool {
        matches!(
            (self, weapon),
            (DefenseClass::Projectile, WeaponClass::Projectile)
                | (DefenseClass::Poison, WeaponClass::Poison)
        )
    }

    /// Returns true if this defense detonates when it meets `weapon`.
    pub const fn explodes_with(self, weapon: WeaponClass) -> bool {
        matches!((self, weapon), (DefenseClass::Projectile, WeaponClass::Lasgun))
    }
}

/// The role a card plays in a battle plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardKind {
    Weapon(WeaponClass),
    Defense(DefenseClass),
    /// Fights in place of a leader at zero base value.
    LeaderSubstitute,
    /// May fill the weapon or defense slot with no effect.
    Worthless,
    /// Played outside the battle wheel.
    Special,
}

/// Static catalogue entry for a treachery card.
pub struct CardInfo {
    pub name: &'static str,
    pub kind: CardKind,
}

/// Every known treachery card.
pub static CARD_CATALOGUE: &[CardInfo] = &[
    CardInfo { name: "Crysknife", kind: CardKind::Weapon(WeaponClass::Projectile) },
    CardInfo { name: "Maula Pistol", kind: CardKind::Weapon(WeaponClass::Projectile) },
    CardInfo { name: "Slip Tip", kind: CardKind::Weapon(WeaponClass::Projectile) },
    CardInfo { name: "Stunner", kind: CardKind::Weapon(WeaponClass::Projectile) },
    CardInfo { name: "Chaumas", kind: CardKind::Weapon(WeaponClass::Poison) },
    CardInfo { name: "Chaumurky", kind: CardKind::Weapon(WeaponClass::Poison) },
    CardInfo { name: "Ellaca Drug", kind: CardKind::Weapon(WeaponClass::Poison) },
    CardInfo { name: "Gom Jabbar", kind: CardKind::Weapon(WeaponClass::Poison) },
    CardInfo { name: "Lasgun", kind: CardKind::Weapon(WeaponClass::Lasgun) },
    CardInfo { name: "Shield", kind: CardKind::Defense(DefenseClass::Projectile) },
    CardInfo { name: "Snooper", kind: CardKind::Defense(DefenseClass::Poison) },
    CardInfo { name: "Cheap Hero", kind: CardKind::LeaderSubstitute },
    CardInfo { name: "Cheap Heroine", kind: CardKind::LeaderSubstitute },
    CardInfo { name: "Baliset", kind: CardKind::Worthless },
    CardInfo { name: "Jubba Cloak", kind: CardKind::Worthless },
    CardInfo { name: "Kulon", kind: CardKind::Worthless },
    CardInfo { name: "La, La, La", kind: CardKind::Worthless },
    CardInfo { name: "Trip to Gamont", kind: CardKind::Worthless },
    CardInfo { name: "Family Atomics", kind: CardKind::Special },
    CardInfo { name: "Hajr", kind: CardKind::Special },
    CardInfo { name: "Karama", kind: CardKind::Special },
    CardInfo { name: "Tleilaxu Ghola", kind: CardKind::Special },
    CardInfo { name: "Truthtrance", kind: CardKind::Special },
    CardInfo { name: "Weather Control", kind: CardKind::Special },
];

/// Looks up the battle role of a card by name.
pub fn card_kind(name: &str) -> Option<CardKind> {
    CARD_CATALOGUE.iter().find(|c| c.name == name).map(|c| c.kind)
}
