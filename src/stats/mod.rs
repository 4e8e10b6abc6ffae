pub mod io;
pub mod maplist;
pub mod rollup;
pub mod tree;

pub use io::{export_map, import_document, parse_map_document, MapDocument};
pub use maplist::{build_map_list, MapList, MapSummary};
pub use rollup::MergedGrid;
pub use tree::{
    EligibilityConfig, GameModeNode, LayerNode, MapNode, NodeStats, Provenance, RouteNode,
    StatsTree, COOP_MODE, SKIRMISH_MODE,
};
