//! PRDemo replay decoder and battle statistics aggregator.
//!
//! A recorded round ("demo") is a zlib-deflated stream of length-framed
//! binary messages. This crate decodes each file into a [`RoundRecord`]
//! with a 512x512 movement histogram, and folds many records into a
//! version/map/game-mode/layer/route statistics tree with win tallies,
//! incremental averages and merged heatmap grids.
//!
//! Decoding a file is pure and side-effect free, so a batch driver can
//! parallelize it freely; aggregation happens single-threaded through
//! [`StatsTree`].

pub mod codec;
pub mod error;
pub mod maps;
pub mod parser;
pub mod record;
pub mod state;
pub mod stats;

pub use error::{Error, Result};
pub use maps::{MapInfo, MapRegistry};
pub use parser::{parse_demo, MIN_DEMO_SIZE};
pub use record::{route_key, Flag, RoundRecord};
pub use state::{HeatPoint, HeatmapGrid, Player, RoundState};
pub use stats::{
    build_map_list, export_map, import_document, parse_map_document, EligibilityConfig, MapList,
    MergedGrid, Provenance, StatsTree,
};
