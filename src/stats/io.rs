//! Exported statistics documents and re-import.
//!
//! One document per engine version and map, mirroring the node hierarchy
//! with heatmap grids stripped (grids are persisted separately as sparse
//! point lists). Re-importing a document replays its rounds through the
//! normal insertion path so a batch run continues where the last one
//! stopped.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::RoundRecord;

use super::tree::{MapNode, NodeStats, Provenance, StatsTree};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDocument {
    pub name: String,
    #[serde(flatten)]
    pub stats: NodeStats,
    #[serde(default)]
    pub game_modes: Vec<GameModeDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameModeDocument {
    pub name: String,
    #[serde(flatten)]
    pub stats: NodeStats,
    #[serde(default)]
    pub layers: Vec<LayerDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDocument {
    pub name: String,
    #[serde(flatten)]
    pub stats: NodeStats,
    #[serde(default)]
    pub routes: Vec<RouteDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDocument {
    pub id: String,
    #[serde(flatten)]
    pub stats: NodeStats,
    #[serde(default)]
    pub rounds_played: Vec<RoundRecord>,
}

/// Snapshot one map node into its export document.
pub fn export_map(map: &MapNode) -> MapDocument {
    MapDocument {
        name: map.name.clone(),
        stats: map.stats.clone(),
        game_modes: map
            .game_modes
            .values()
            .map(|mode| GameModeDocument {
                name: mode.name.clone(),
                stats: mode.stats.clone(),
                layers: mode
                    .layers
                    .values()
                    .map(|layer| LayerDocument {
                        name: layer.name.clone(),
                        stats: layer.stats.clone(),
                        routes: layer
                            .routes
                            .values()
                            .map(|route| RouteDocument {
                                id: route.id.clone(),
                                stats: route.stats.clone(),
                                rounds_played: route.rounds.clone(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn parse_map_document(json: &str) -> Result<MapDocument> {
    serde_json::from_str(json).map_err(|e| Error::MalformedStats(e.to_string()))
}

/// Replay a document's rounds through the normal insertion path.
///
/// Rounds are marked completed and inserted as [`Provenance::Imported`],
/// so they seed statistics without flagging any route as changed. Returns
/// the number of rounds inserted.
pub fn import_document(tree: &mut StatsTree, doc: &MapDocument) -> usize {
    let mut inserted = 0;
    for mode in &doc.game_modes {
        for layer in &mode.layers {
            for route in &layer.routes {
                for round in &route.rounds_played {
                    let mut round = round.clone();
                    round.completed = true;
                    if tree.insert(round, Provenance::Imported) {
                        inserted += 1;
                    }
                }
            }
        }
    }
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Flag;
    use crate::state::heatmap::HeatmapGrid;

    fn round(cpids: &[u16], t1: u16, t2: u16) -> RoundRecord {
        RoundRecord {
            version: "1.0.0.0".into(),
            map: "Muttrah_City".into(),
            game_mode: "Advance & Secure".into(),
            layer: "Layer 1".into(),
            date: 5,
            duration: 25.0,
            player_count: 80,
            tickets_team1: t1,
            tickets_team2: t2,
            flags: cpids
                .iter()
                .map(|&cpid| Flag {
                    cpid,
                    team: 1,
                    x: 0,
                    y: 0,
                    z: 0,
                    radius: 10,
                })
                .collect(),
            heatmap: HeatmapGrid::new(),
            completed: true,
        }
    }

    #[test]
    fn test_export_strips_heatmaps() {
        let mut tree = StatsTree::new();
        let mut r = round(&[1, 2], 100, 50);
        r.heatmap.increment(0, 0);
        tree.insert(r, Provenance::Fresh);
        tree.rollup();

        let doc = export_map(tree.map_node("1.0.0.0", "Muttrah_City").unwrap());
        let json = serde_json::to_string_pretty(&doc).unwrap();
        assert!(!json.contains("heatmap"));
        assert!(json.contains("roundsPlayed"));
        assert!(json.contains("timesPlayed"));
    }

    #[test]
    fn test_import_round_trip() {
        let mut tree = StatsTree::new();
        tree.insert(round(&[1, 2], 100, 50), Provenance::Fresh);
        tree.insert(round(&[2, 1], 40, 60), Provenance::Fresh);
        tree.rollup();
        let doc = export_map(tree.map_node("1.0.0.0", "Muttrah_City").unwrap());
        let json = serde_json::to_string(&doc).unwrap();

        let mut reloaded = StatsTree::new();
        let parsed = parse_map_document(&json).unwrap();
        assert_eq!(import_document(&mut reloaded, &parsed), 2);
        reloaded.rollup();

        let map = reloaded.map_node("1.0.0.0", "Muttrah_City").unwrap();
        assert_eq!(map.stats.times_played, 2);
        let route = &map.game_modes["Advance & Secure"].layers["Layer 1"].routes["Route 1, 2"];
        assert_eq!(route.stats.times_played, 2);
        assert!(!route.changed);
        assert_eq!(route.rounds[0].flags.len(), 2);
    }

    #[test]
    fn test_malformed_document_rejected() {
        assert!(matches!(
            parse_map_document("{\"gameModes\": 3}"),
            Err(Error::MalformedStats(_))
        ));
    }
}
