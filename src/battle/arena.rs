//! Arena aggregation.
//!
//! Groups the sectors of a named territory into the spaces where forces can
//! actually meet this round. A storm sector strictly inside a territory cuts
//! it in two; anywhere else the territory is a single arena.

use serde::{Deserialize, Serialize};

use crate::board::{storm_order, Sector, Territory, ALL_TERRITORIES};

/// A storm-respecting group of sectors within one territory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Arena {
    pub territory: Territory,
    /// Sectors in storm order.
    pub sectors: Vec<Sector>,
}

impl Arena {
    pub fn contains(&self, sector: Sector) -> bool {
        self.sectors.contains(&sector)
    }

    /// Human-readable name; split territories list their sectors.
    pub fn label(&self) -> String {
        if self.sectors.len() == self.territory.sectors().len() {
            return self.territory.name().to_string();
        }
        let sectors: Vec<String> = self.sectors.iter().map(|s| s.to_string()).collect();
        format!("{} (sector {})", self.territory.name(), sectors.join(", "))
    }

    /// Sort key placing arenas in board traversal order for a given storm.
    pub fn board_order(&self, storm: Sector) -> (u8, usize) {
        let first = self.sectors.first().map(|s| storm_order(*s, storm)).unwrap_or(u8::MAX);
        (first, self.territory as usize)
    }
}

impl std::fmt::Display for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Returns the arenas of `territory` with the storm at `storm`.
///
/// - The refuge territory yields no arena.
/// - A storm strictly inside the territory's sector range yields two arenas,
///   neither containing the storm sector.
/// - Otherwise the whole territory is one arena.
///
/// Sectors within an arena and the arenas themselves are in storm order.
pub fn arenas_for(territory: Territory, storm: Sector) -> Vec<Arena> {
    if territory.is_safe() {
        return Vec::new();
    }
    let sectors = territory.sectors();
    let by_storm = |group: &[Sector]| {
        let mut group = group.to_vec();
        group.sort_by_key(|s| storm_order(*s, storm));
        group
    };

    match sectors.iter().position(|s| *s == storm) {
        Some(idx) if idx > 0 && idx + 1 < sectors.len() => {
            let mut arenas = vec![
                Arena { territory, sectors: by_storm(&sectors[..idx]) },
                Arena { territory, sectors: by_storm(&sectors[idx + 1..]) },
            ];
            arenas.sort_by_key(|a| a.board_order(storm));
            arenas
        }
        _ => vec![Arena { territory, sectors: by_storm(sectors) }],
    }
}

/// Returns every arena on the board in traversal order.
pub fn all_arenas(storm: Sector) -> Vec<Arena> {
    let mut arenas: Vec<Arena> = ALL_TERRITORIES
        .iter()
        .flat_map(|t| arenas_for(*t, storm))
        .collect();
    arenas.sort_by_key(|a| a.board_order(storm));
    arenas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polar_sink_has_no_arena() {
        for storm in 1..=18 {
            assert!(arenas_for(Territory::PolarSink, storm).is_empty());
        }
    }

    #[test]
    fn storm_outside_gives_one_arena() {
        let arenas = arenas_for(Territory::ImperialBasin, 3);
        assert_eq!(arenas.len(), 1);
        assert_eq!(arenas[0].sectors, vec![9, 10, 11]);
        assert_eq!(arenas[0].label(), "Imperial Basin");
    }

    #[test]
    fn storm_inside_splits_in_two() {
        let arenas = arenas_for(Territory::ImperialBasin, 10);
        assert_eq!(arenas.len(), 2);
        assert_eq!(arenas[0].sectors, vec![11]);
        assert_eq!(arenas[1].sectors, vec![9]);
        assert!(!arenas.iter().any(|a| a.contains(10)));
        assert_eq!(arenas[0].label(), "Imperial Basin (sector 11)");
    }

    #[test]
    fn storm_on_edge_keeps_territory_whole() {
        let arenas = arenas_for(Territory::ImperialBasin, 9);
        assert_eq!(arenas.len(), 1);
        assert_eq!(arenas[0].sectors, vec![10, 11, 9]);
        let arenas = arenas_for(Territory::ImperialBasin, 11);
        assert_eq!(arenas.len(), 1);
        assert_eq!(arenas[0].sectors, vec![9, 10, 11]);
    }

    #[test]
    fn wrapping_territory_splits_correctly() {
        // False Wall West spans 16, 17, 18.
        let arenas = arenas_for(Territory::FalseWallWest, 17);
        assert_eq!(arenas.len(), 2);
        assert_eq!(arenas[0].sectors, vec![18]);
        assert_eq!(arenas[1].sectors, vec![16]);

        // Cielago West spans 18, 1; storm at either end leaves it whole.
        assert_eq!(arenas_for(Territory::CielagoWest, 18).len(), 1);
        assert_eq!(arenas_for(Territory::CielagoWest, 1)[0].sectors, vec![18, 1]);
    }

    #[test]
    fn grouping_is_deterministic() {
        for storm in 1..=18 {
            assert_eq!(all_arenas(storm), all_arenas(storm));
        }
    }

    #[test]
    fn all_arenas_in_board_order() {
        let arenas = all_arenas(18);
        let keys: Vec<_> = arenas.iter().map(|a| a.board_order(18)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(arenas[0].sectors[0], 1);
    }

    #[test]
    fn long_territory_split_keeps_sector_order() {
        // False Wall East spans 5..=9.
        let arenas = arenas_for(Territory::FalseWallEast, 7);
        assert_eq!(arenas[0].sectors, vec![8, 9]);
        assert_eq!(arenas[1].sectors, vec![5, 6]);
    }
}
