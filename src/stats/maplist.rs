//! Cross-version map summary for the map list overview.

use serde::{Deserialize, Serialize};

use crate::maps::MapRegistry;

use super::tree::StatsTree;

/// Top-level summary document aggregating each map across engine versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapList {
    pub date: String,
    pub maps: Vec<MapSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSummary {
    pub name: String,
    pub display_name: String,
    pub versions: Vec<String>,
    pub times_played: u64,
    pub wins_team1: u64,
    pub wins_team2: u64,
    pub draws: u64,
    pub average_duration: f64,
    pub average_tickets_team1: f64,
    pub average_tickets_team2: f64,
}

/// Fold every per-version map node into one summary entry per map.
///
/// Counts are summed; the average fields are combined as an unweighted
/// running mean of the per-version means. That underweights versions with
/// more rounds, but it is the established behavior of the exported
/// documents and consumers expect it, so it is kept deliberately.
pub fn build_map_list(tree: &StatsTree, registry: &MapRegistry) -> MapList {
    let mut maps: Vec<MapSummary> = Vec::new();

    for (version, version_maps) in &tree.versions {
        for (map_name, map) in version_maps {
            if let Some(entry) = maps.iter_mut().find(|m| &m.name == map_name) {
                entry.versions.push(version.clone());
                entry.times_played += map.stats.times_played;
                entry.wins_team1 += map.stats.wins_team1;
                entry.wins_team2 += map.stats.wins_team2;
                entry.draws += map.stats.draws;
                entry.average_duration = (entry.average_duration + map.stats.average_duration) / 2.0;
                entry.average_tickets_team1 =
                    (entry.average_tickets_team1 + map.stats.average_tickets_team1) / 2.0;
                entry.average_tickets_team2 =
                    (entry.average_tickets_team2 + map.stats.average_tickets_team2) / 2.0;
            } else {
                maps.push(MapSummary {
                    name: map_name.clone(),
                    display_name: registry.display_name(map_name).to_string(),
                    versions: vec![version.clone()],
                    times_played: map.stats.times_played,
                    wins_team1: map.stats.wins_team1,
                    wins_team2: map.stats.wins_team2,
                    draws: map.stats.draws,
                    average_duration: map.stats.average_duration,
                    average_tickets_team1: map.stats.average_tickets_team1,
                    average_tickets_team2: map.stats.average_tickets_team2,
                });
            }
        }
    }

    for entry in &mut maps {
        entry.versions.sort();
    }

    let date = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_default();

    MapList { date, maps }
}
