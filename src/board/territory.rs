//! Territory definitions and storm-sector geometry.
//!
//! The board is a ring of 18 storm sectors. Each named territory spans one or
//! more consecutive sectors, listed in ascending (counterclockwise) order and
//! possibly wrapping from sector 18 to sector 1. Territory metadata is stored
//! in a compile-time lookup table indexed by the `Territory` enum discriminant.

use serde::{Deserialize, Serialize};

/// The number of storm sectors around the board.
pub const SECTOR_COUNT: u8 = 18;

/// The number of named territories.
pub const TERRITORY_COUNT: usize = 42;

/// A storm sector, numbered 1 through 18.
pub type Sector = u8;

/// A named territory on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Territory {
    Arrakeen = 0,
    Arsunt = 1,
    Basin = 2,
    BightOfTheCliff = 3,
    BrokenLand = 4,
    Carthag = 5,
    CielagoDepression = 6,
    CielagoEast = 7,
    CielagoNorth = 8,
    CielagoSouth = 9,
    CielagoWest = 10,
    FalseWallEast = 11,
    FalseWallSouth = 12,
    FalseWallWest = 13,
    FuneralPlain = 14,
    GaraKulon = 15,
    HabbanyaErg = 16,
    HabbanyaRidgeFlat = 17,
    HabbanyaSietch = 18,
    HaggaBasin = 19,
    HargPass = 20,
    HoleInTheRock = 21,
    ImperialBasin = 22,
    Meridian = 23,
    OldGap = 24,
    PastyMesa = 25,
    PlasticBasin = 26,
    PolarSink = 27,
    RedChasm = 28,
    RimWallWest = 29,
    RockOutcroppings = 30,
    ShieldWall = 31,
    SietchTabr = 32,
    SihayaRidge = 33,
    SouthMesa = 34,
    TheGreatFlat = 35,
    TheGreaterFlat = 36,
    TheMinorErg = 37,
    Tsimpo = 38,
    TueksSietch = 39,
    WindPass = 40,
    WindPassNorth = 41,
}

/// Classifies a territory for battle purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerritoryKind {
    Sand,
    Rock,
    Stronghold,
    /// Never hosts a battle.
    Refuge,
}

/// Static metadata for a territory.
pub struct TerritoryInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: TerritoryKind,
    pub sectors: &'static [Sector],
}

const fn info(id: &'static str, name: &'static str, kind: TerritoryKind, sectors: &'static [Sector]) -> TerritoryInfo {
    TerritoryInfo { id, name, kind, sectors }
}

use TerritoryKind::{Refuge, Rock, Sand, Stronghold};

/// Compile-time lookup table: index by `Territory as usize`.
pub static TERRITORY_INFO: [TerritoryInfo; TERRITORY_COUNT] = [
    info("arrakeen", "Arrakeen", Stronghold, &[10]),
    info("arsunt", "Arsunt", Sand, &[11, 12]),
    info("basin", "Basin", Sand, &[12]),
    info("bight_of_the_cliff", "Bight of the Cliff", Sand, &[14, 15]),
    info("broken_land", "Broken Land", Sand, &[12, 13]),
    info("carthag", "Carthag", Stronghold, &[11]),
    info("cielago_depression", "Cielago Depression", Sand, &[1, 2, 3]),
    info("cielago_east", "Cielago East", Sand, &[3, 4]),
    info("cielago_north", "Cielago North", Sand, &[1, 2, 3]),
    info("cielago_south", "Cielago South", Sand, &[2, 3]),
    info("cielago_west", "Cielago West", Sand, &[18, 1]),
    info("false_wall_east", "False Wall East", Rock, &[5, 6, 7, 8, 9]),
    info("false_wall_south", "False Wall South", Rock, &[4, 5]),
    info("false_wall_west", "False Wall West", Rock, &[16, 17, 18]),
    info("funeral_plain", "Funeral Plain", Sand, &[15]),
    info("gara_kulon", "Gara Kulon", Sand, &[8]),
    info("habbanya_erg", "Habbanya Erg", Sand, &[16, 17]),
    info("habbanya_ridge_flat", "Habbanya Ridge Flat", Sand, &[17, 18]),
    info("habbanya_sietch", "Habbanya Sietch", Stronghold, &[17]),
    info("hagga_basin", "Hagga Basin", Sand, &[12, 13]),
    info("harg_pass", "Harg Pass", Sand, &[4, 5]),
    info("hole_in_the_rock", "Hole in the Rock", Sand, &[9]),
    info("imperial_basin", "Imperial Basin", Sand, &[9, 10, 11]),
    info("meridian", "Meridian", Sand, &[1, 2]),
    info("old_gap", "Old Gap", Sand, &[10, 11, 12]),
    info("pasty_mesa", "Pasty Mesa", Rock, &[5, 6, 7, 8]),
    info("plastic_basin", "Plastic Basin", Rock, &[12, 13, 14]),
    info("polar_sink", "Polar Sink", Refuge, &[]),
    info("red_chasm", "Red Chasm", Sand, &[7]),
    info("rim_wall_west", "Rim Wall West", Rock, &[9]),
    info("rock_outcroppings", "Rock Outcroppings", Sand, &[13, 14]),
    info("shield_wall", "Shield Wall", Rock, &[8, 9]),
    info("sietch_tabr", "Sietch Tabr", Stronghold, &[14]),
    info("sihaya_ridge", "Sihaya Ridge", Sand, &[9]),
    info("south_mesa", "South Mesa", Sand, &[4, 5, 6]),
    info("the_great_flat", "The Great Flat", Sand, &[15]),
    info("the_greater_flat", "The Greater Flat", Sand, &[16]),
    info("the_minor_erg", "The Minor Erg", Sand, &[5, 6, 7, 8]),
    info("tsimpo", "Tsimpo", Sand, &[11, 12, 13]),
    info("tueks_sietch", "Tuek's Sietch", Stronghold, &[5]),
    info("wind_pass", "Wind Pass", Sand, &[14, 15, 16, 17]),
    info("wind_pass_north", "Wind Pass North", Sand, &[17, 18]),
];

/// All territory variants in index order.
pub const ALL_TERRITORIES: [Territory; TERRITORY_COUNT] = [
    Territory::Arrakeen, Territory::Arsunt, Territory::Basin,
    Territory::BightOfTheCliff, Territory::BrokenLand, Territory::Carthag,
    Territory::CielagoDepression, Territory::CielagoEast, Territory::CielagoNorth,
    Territory::CielagoSouth, Territory::CielagoWest, Territory::FalseWallEast,
    Territory::FalseWallSouth, Territory::FalseWallWest, Territory::FuneralPlain,
    Territory::GaraKulon, Territory::HabbanyaErg, Territory::HabbanyaRidgeFlat,
    Territory::HabbanyaSietch, Territory::HaggaBasin, Territory::HargPass,
    Territory::HoleInTheRock, Territory::ImperialBasin, Territory::Meridian,
    Territory::OldGap, Territory::PastyMesa, Territory::PlasticBasin,
    Territory::PolarSink, Territory::RedChasm, Territory::RimWallWest,
    Territory::RockOutcroppings, Territory::ShieldWall, Territory::SietchTabr,
    Territory::SihayaRidge, Territory::SouthMesa, Territory::TheGreatFlat,
    Territory::TheGreaterFlat, Territory::TheMinorErg, Territory::Tsimpo,
    Territory::TueksSietch, Territory::WindPass, Territory::WindPassNorth,
];

impl Territory {
    /// Returns the snake_case identifier used in commands and saved state.
    pub const fn id(self) -> &'static str {
        TERRITORY_INFO[self as usize].id
    }

    /// Returns the display name.
    pub const fn name(self) -> &'static str {
        TERRITORY_INFO[self as usize].name
    }

    pub const fn kind(self) -> TerritoryKind {
        TERRITORY_INFO[self as usize].kind
    }

    /// Returns the territory's sectors in ascending ring order.
    pub const fn sectors(self) -> &'static [Sector] {
        TERRITORY_INFO[self as usize].sectors
    }

    /// Returns true if no battle may ever take place here.
    pub const fn is_safe(self) -> bool {
        matches!(TERRITORY_INFO[self as usize].kind, TerritoryKind::Refuge)
    }

    /// Returns true if the territory includes `sector`.
    pub fn contains_sector(self, sector: Sector) -> bool {
        self.sectors().contains(&sector)
    }

    /// Looks up a territory by its identifier.
    pub fn from_id(id: &str) -> Option<Territory> {
        ALL_TERRITORIES.iter().copied().find(|t| t.id() == id)
    }
}

impl std::fmt::Display for Territory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Position of `sector` in storm order: 0 for the sector just past the storm,
/// `SECTOR_COUNT - 1` for the storm sector itself.
pub fn storm_order(sector: Sector, storm: Sector) -> u8 {
    let n = u16::from(SECTOR_COUNT);
    ((u16::from(sector) + 2 * n - u16::from(storm) - 1) % n) as u8
}

/// Returns true if `sector` is a valid storm sector number.
pub fn is_valid_sector(sector: Sector) -> bool {
    (1..=SECTOR_COUNT).contains(&sector)
}
