//! The Version -> Map -> GameMode -> Layer -> Route statistics hierarchy.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::record::RoundRecord;
use crate::state::heatmap::HeatmapGrid;

/// Game mode with no symmetric two-team outcome; excluded from map-level
/// ticket, duration and win aggregates.
pub const COOP_MODE: &str = "Co-Operative";
pub const SKIRMISH_MODE: &str = "Skirmish";

/// Where a round came from. Re-imported rounds never mark a route changed,
/// so unchanged heatmaps are not regenerated run after run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Fresh,
    Imported,
}

/// Minimum-player thresholds for a round to count, strictly-greater
/// comparisons. Historical revisions of the recorder pipeline disagreed on
/// these numbers, so they are configuration with documented defaults
/// rather than constants.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityConfig {
    pub min_players_coop: u32,
    pub min_players_skirmish: u32,
    pub min_players_default: u32,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            min_players_coop: 2,
            min_players_skirmish: 8,
            min_players_default: 64,
        }
    }
}

impl EligibilityConfig {
    pub fn allows(&self, record: &RoundRecord) -> bool {
        if record.map.is_empty() {
            return false;
        }
        let threshold = match record.game_mode.as_str() {
            COOP_MODE => self.min_players_coop,
            SKIRMISH_MODE => self.min_players_skirmish,
            _ => self.min_players_default,
        };
        record.player_count > threshold
    }
}

/// Rolled-up statistics carried by every node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeStats {
    pub times_played: u64,
    pub average_duration: f64,
    pub average_tickets_team1: f64,
    pub average_tickets_team2: f64,
    pub wins_team1: u64,
    pub wins_team2: u64,
    pub draws: u64,
}

impl NodeStats {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Leaf node: one canonical flag route, its rounds and its retained grid.
#[derive(Debug, Clone)]
pub struct RouteNode {
    pub id: String,
    pub stats: NodeStats,
    pub rounds: Vec<RoundRecord>,
    /// Merged histogram of every round ever seen on this route, including
    /// grids seeded from a previous run.
    pub heatmap: HeatmapGrid,
    /// Set when a fresh (not re-imported) round landed here since the last
    /// heatmap merge.
    pub changed: bool,
}

impl RouteNode {
    fn new(id: String) -> Self {
        Self {
            id,
            stats: NodeStats::default(),
            rounds: Vec::new(),
            heatmap: HeatmapGrid::new(),
            changed: false,
        }
    }

    /// Seed the retained grid from persisted state before merging.
    pub fn seed_heatmap(&mut self, grid: &HeatmapGrid) {
        self.heatmap.merge(grid);
    }
}

#[derive(Debug, Clone)]
pub struct LayerNode {
    pub name: String,
    pub stats: NodeStats,
    pub routes: IndexMap<String, RouteNode>,
}

#[derive(Debug, Clone)]
pub struct GameModeNode {
    pub name: String,
    pub stats: NodeStats,
    pub layers: IndexMap<String, LayerNode>,
}

#[derive(Debug, Clone)]
pub struct MapNode {
    pub name: String,
    pub stats: NodeStats,
    pub game_modes: IndexMap<String, GameModeNode>,
}

/// The whole hierarchy. Nodes are created lazily on first insertion and
/// only ever mutated in place, so the tree is effectively append-only
/// across runs when seeded from prior exports.
#[derive(Debug, Default)]
pub struct StatsTree {
    pub eligibility: EligibilityConfig,
    pub versions: IndexMap<String, IndexMap<String, MapNode>>,
}

impl StatsTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_eligibility(eligibility: EligibilityConfig) -> Self {
        Self {
            eligibility,
            ..Self::default()
        }
    }

    /// Insert a completed round, creating the node chain on first use.
    /// Returns false when the round fails the eligibility gate.
    pub fn insert(&mut self, record: RoundRecord, provenance: Provenance) -> bool {
        if !record.completed || !self.eligibility.allows(&record) {
            tracing::debug!(map = %record.map, mode = %record.game_mode, "round not eligible");
            return false;
        }

        let route_id = record.route_key();
        let map = self
            .versions
            .entry(record.version.clone())
            .or_default()
            .entry(record.map.clone())
            .or_insert_with(|| MapNode {
                name: record.map.clone(),
                stats: NodeStats::default(),
                game_modes: IndexMap::new(),
            });
        let mode = map
            .game_modes
            .entry(record.game_mode.clone())
            .or_insert_with(|| GameModeNode {
                name: record.game_mode.clone(),
                stats: NodeStats::default(),
                layers: IndexMap::new(),
            });
        let layer = mode
            .layers
            .entry(record.layer.clone())
            .or_insert_with(|| LayerNode {
                name: record.layer.clone(),
                stats: NodeStats::default(),
                routes: IndexMap::new(),
            });
        let route = layer
            .routes
            .entry(route_id.clone())
            .or_insert_with(|| RouteNode::new(route_id));

        if provenance == Provenance::Fresh {
            route.changed = true;
        }
        route.rounds.push(record);
        true
    }

    pub fn map_node(&self, version: &str, map: &str) -> Option<&MapNode> {
        self.versions.get(version)?.get(map)
    }
}
