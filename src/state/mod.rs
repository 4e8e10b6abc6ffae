pub mod heatmap;
pub mod player;
pub mod round;

pub use heatmap::{HeatPoint, HeatmapGrid, GRID_DIM};
pub use player::{Player, PlayerField, UpdateFlags};
pub use round::RoundState;
