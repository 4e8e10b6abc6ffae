//! Immutable per-round output of the decoder.

use serde::{Deserialize, Serialize};

use crate::state::heatmap::HeatmapGrid;

/// A control point that was part of the round's active flag list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub cpid: u16,
    #[serde(default)]
    pub team: u8,
    pub x: u16,
    pub y: u16,
    pub z: u16,
    pub radius: u16,
}

/// A fully decoded round. Produced once per demo file and never mutated;
/// the heatmap grid is carried separately from the exported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    pub version: String,
    pub map: String,
    pub game_mode: String,
    pub layer: String,
    #[serde(default)]
    pub date: u32,
    /// Round length in minutes.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub player_count: u32,
    #[serde(default)]
    pub tickets_team1: u16,
    #[serde(default)]
    pub tickets_team2: u16,
    #[serde(default)]
    pub flags: Vec<Flag>,
    #[serde(skip)]
    pub heatmap: HeatmapGrid,
    #[serde(default = "completed_default")]
    pub completed: bool,
}

fn completed_default() -> bool {
    true
}

impl RoundRecord {
    pub fn route_key(&self) -> String {
        route_key(&self.flags)
    }
}

/// Canonical route identity of a flag list: the sorted control-point ids.
///
/// This stands in for the spawn-group id the recorder does not expose, so
/// two rounds on the same flag layout always share a route regardless of
/// the order the flag list arrived in.
pub fn route_key(flags: &[Flag]) -> String {
    let mut cpids: Vec<u16> = flags.iter().map(|f| f.cpid).collect();
    cpids.sort_unstable();
    let joined = cpids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("Route {joined}").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(cpid: u16) -> Flag {
        Flag {
            cpid,
            team: 0,
            x: 0,
            y: 0,
            z: 0,
            radius: 10,
        }
    }

    #[test]
    fn test_route_key_order_independent() {
        let a = route_key(&[flag(3), flag(1), flag(2)]);
        let b = route_key(&[flag(2), flag(3), flag(1)]);
        assert_eq!(a, b);
        assert_eq!(a, "Route 1, 2, 3");
    }

    #[test]
    fn test_route_key_empty() {
        assert_eq!(route_key(&[]), "Route");
    }

    #[test]
    fn test_serialization_strips_heatmap() {
        let mut record = RoundRecord {
            version: "1.0.0.0".into(),
            map: "Muttrah_City".into(),
            game_mode: "Advance & Secure".into(),
            layer: "Layer 2".into(),
            date: 0,
            duration: 30.0,
            player_count: 80,
            tickets_team1: 100,
            tickets_team2: 50,
            flags: vec![flag(1)],
            heatmap: HeatmapGrid::new(),
            completed: true,
        };
        record.heatmap.increment(10, 10);

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("heatmap"));

        let back: RoundRecord = serde_json::from_str(&json).unwrap();
        assert!(back.heatmap.is_empty());
        assert_eq!(back.map, record.map);
        assert_eq!(back.tickets_team1, 100);
    }
}
