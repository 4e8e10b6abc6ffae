//! Bottom-up statistic recomputation and heatmap grid propagation.

use std::cmp::Ordering;

use crate::state::heatmap::HeatmapGrid;

use super::tree::{StatsTree, COOP_MODE};

#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    tickets1: f64,
    tickets2: f64,
    duration: f64,
}

impl Totals {
    fn add(&mut self, other: Totals) {
        self.tickets1 += other.tickets1;
        self.tickets2 += other.tickets2;
        self.duration += other.duration;
    }
}

/// A grid regenerated by [`StatsTree::merge_heatmaps`], addressed by the
/// node it belongs to. The external renderer turns these into images.
#[derive(Debug, Clone)]
pub struct MergedGrid {
    pub version: String,
    pub map: String,
    /// Route id, layer name, game-mode name or map name depending on the
    /// level the grid was merged at.
    pub name: String,
    pub grid: HeatmapGrid,
}

impl StatsTree {
    /// Recompute every node's statistics from its round lists.
    ///
    /// Pure sums and counts, so the result is independent of insertion
    /// order. The cooperative mode is excluded from the map-level
    /// aggregates (it has no symmetric two-team outcome) but still counts
    /// at game-mode level and below; the parent/child times-played sum
    /// invariant holds everywhere else.
    pub fn rollup(&mut self) {
        for maps in self.versions.values_mut() {
            for map in maps.values_mut() {
                map.stats.reset();
                let mut map_totals = Totals::default();

                for mode in map.game_modes.values_mut() {
                    mode.stats.reset();
                    let mut mode_totals = Totals::default();

                    for layer in mode.layers.values_mut() {
                        layer.stats.reset();
                        let mut layer_totals = Totals::default();

                        for route in layer.routes.values_mut() {
                            route.stats.reset();
                            let mut totals = Totals::default();
                            let (mut wins1, mut wins2, mut draws) = (0u64, 0u64, 0u64);

                            for round in &route.rounds {
                                match round.tickets_team1.cmp(&round.tickets_team2) {
                                    Ordering::Greater => wins1 += 1,
                                    Ordering::Less => wins2 += 1,
                                    Ordering::Equal => draws += 1,
                                }
                                totals.tickets1 += round.tickets_team1 as f64;
                                totals.tickets2 += round.tickets_team2 as f64;
                                totals.duration += round.duration;
                            }

                            let times = route.rounds.len() as u64;
                            route.stats.times_played = times;
                            route.stats.wins_team1 = wins1;
                            route.stats.wins_team2 = wins2;
                            route.stats.draws = draws;
                            if times > 0 {
                                route.stats.average_tickets_team1 = totals.tickets1 / times as f64;
                                route.stats.average_tickets_team2 = totals.tickets2 / times as f64;
                                route.stats.average_duration = totals.duration / times as f64;
                            }

                            layer.stats.times_played += times;
                            layer.stats.wins_team1 += wins1;
                            layer.stats.wins_team2 += wins2;
                            layer.stats.draws += draws;
                            layer_totals.add(totals);
                        }

                        if layer.stats.times_played > 0 {
                            let n = layer.stats.times_played as f64;
                            layer.stats.average_tickets_team1 = layer_totals.tickets1 / n;
                            layer.stats.average_tickets_team2 = layer_totals.tickets2 / n;
                            layer.stats.average_duration = layer_totals.duration / n;
                        }

                        mode.stats.times_played += layer.stats.times_played;
                        mode.stats.wins_team1 += layer.stats.wins_team1;
                        mode.stats.wins_team2 += layer.stats.wins_team2;
                        mode.stats.draws += layer.stats.draws;
                        mode_totals.add(layer_totals);
                    }

                    if mode.stats.times_played > 0 {
                        let n = mode.stats.times_played as f64;
                        mode.stats.average_tickets_team1 = mode_totals.tickets1 / n;
                        mode.stats.average_tickets_team2 = mode_totals.tickets2 / n;
                        mode.stats.average_duration = mode_totals.duration / n;
                    }

                    if mode.name != COOP_MODE {
                        map.stats.times_played += mode.stats.times_played;
                        map.stats.wins_team1 += mode.stats.wins_team1;
                        map.stats.wins_team2 += mode.stats.wins_team2;
                        map.stats.draws += mode.stats.draws;
                        map_totals.add(mode_totals);
                    }
                }

                if map.stats.times_played > 0 {
                    let n = map.stats.times_played as f64;
                    map.stats.average_tickets_team1 = map_totals.tickets1 / n;
                    map.stats.average_tickets_team2 = map_totals.tickets2 / n;
                    map.stats.average_duration = map_totals.duration / n;
                }
            }
        }
    }

    /// Fold every round's grid into its route's retained grid, then
    /// propagate merged grids upward and return the regenerated entries.
    ///
    /// Only nodes with at least one changed child are regenerated; a node
    /// with a single child reuses that child's merged grid instead of
    /// re-summing. Round grids are drained as they are folded so a second
    /// merge never double-counts, and all changed flags are cleared.
    pub fn merge_heatmaps(&mut self) -> Vec<MergedGrid> {
        let mut out = Vec::new();

        for (version, maps) in &mut self.versions {
            for (map_name, map) in maps {
                let mut mode_grids: Vec<HeatmapGrid> = Vec::new();
                let mut map_changed = false;

                for mode in map.game_modes.values_mut() {
                    let mut layer_grids: Vec<HeatmapGrid> = Vec::new();
                    let mut mode_changed = false;

                    for layer in mode.layers.values_mut() {
                        let mut layer_changed = false;

                        for route in layer.routes.values_mut() {
                            for round in &mut route.rounds {
                                let grid = std::mem::take(&mut round.heatmap);
                                route.heatmap.merge(&grid);
                            }
                            if route.changed {
                                layer_changed = true;
                                out.push(MergedGrid {
                                    version: version.clone(),
                                    map: map_name.clone(),
                                    name: route.id.clone(),
                                    grid: route.heatmap.clone(),
                                });
                                route.changed = false;
                            }
                        }

                        let layer_grid = merge_children(
                            layer.routes.values().map(|r| &r.heatmap),
                        );
                        if layer_changed {
                            mode_changed = true;
                            out.push(MergedGrid {
                                version: version.clone(),
                                map: map_name.clone(),
                                name: layer.name.clone(),
                                grid: layer_grid.clone(),
                            });
                        }
                        layer_grids.push(layer_grid);
                    }

                    let mode_grid = merge_children(layer_grids.iter());
                    if mode_changed {
                        map_changed = true;
                        out.push(MergedGrid {
                            version: version.clone(),
                            map: map_name.clone(),
                            name: mode.name.clone(),
                            grid: mode_grid.clone(),
                        });
                    }
                    mode_grids.push(mode_grid);
                }

                if map_changed {
                    out.push(MergedGrid {
                        version: version.clone(),
                        map: map_name.clone(),
                        name: map.name.clone(),
                        grid: merge_children(mode_grids.iter()),
                    });
                }
            }
        }

        out
    }
}

/// Combine child grids; exactly one child is reused as-is.
fn merge_children<'a>(mut grids: impl Iterator<Item = &'a HeatmapGrid>) -> HeatmapGrid {
    let first = match grids.next() {
        Some(g) => g.clone(),
        None => return HeatmapGrid::new(),
    };
    let mut merged = first;
    for grid in grids {
        merged.merge(grid);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Flag, RoundRecord};
    use crate::stats::tree::Provenance;

    fn round(map: &str, mode: &str, layer: &str, cpids: &[u16], t1: u16, t2: u16) -> RoundRecord {
        RoundRecord {
            version: "1.0.0.0".into(),
            map: map.into(),
            game_mode: mode.into(),
            layer: layer.into(),
            date: 0,
            duration: 30.0,
            player_count: 80,
            tickets_team1: t1,
            tickets_team2: t2,
            flags: cpids
                .iter()
                .map(|&cpid| Flag {
                    cpid,
                    team: 0,
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
    fn test_route_aggregation() {
        let mut tree = StatsTree::new();
        tree.insert(round("m", "Advance & Secure", "Layer 1", &[1, 2], 100, 50), Provenance::Fresh);
        tree.insert(round("m", "Advance & Secure", "Layer 1", &[2, 1], 40, 60), Provenance::Fresh);
        tree.rollup();

        let map = tree.map_node("1.0.0.0", "m").unwrap();
        let route = &map.game_modes["Advance & Secure"].layers["Layer 1"].routes["Route 1, 2"];
        assert_eq!(route.stats.times_played, 2);
        assert_eq!(route.stats.wins_team1, 1);
        assert_eq!(route.stats.wins_team2, 1);
        assert_eq!(route.stats.average_tickets_team1, 70.0);
        assert_eq!(route.stats.average_tickets_team2, 55.0);
        assert_eq!(route.stats.average_duration, 30.0);
    }

    #[test]
    fn test_times_played_sums_up_each_level() {
        let mut tree = StatsTree::new();
        tree.insert(round("m", "Advance & Secure", "Layer 1", &[1], 10, 5), Provenance::Fresh);
        tree.insert(round("m", "Advance & Secure", "Layer 1", &[2], 10, 5), Provenance::Fresh);
        tree.insert(round("m", "Advance & Secure", "Layer 2", &[3], 5, 10), Provenance::Fresh);
        tree.insert(round("m", "Insurgency", "Layer 1", &[4], 1, 1), Provenance::Fresh);
        tree.rollup();

        let map = tree.map_node("1.0.0.0", "m").unwrap();
        let aas = &map.game_modes["Advance & Secure"];
        let layer1 = &aas.layers["Layer 1"];
        let route_sum: u64 = layer1.routes.values().map(|r| r.stats.times_played).sum();
        assert_eq!(route_sum, layer1.stats.times_played);

        let layer_sum: u64 = aas.layers.values().map(|l| l.stats.times_played).sum();
        assert_eq!(layer_sum, aas.stats.times_played);

        let mode_sum: u64 = map.game_modes.values().map(|m| m.stats.times_played).sum();
        assert_eq!(mode_sum, map.stats.times_played);
        assert_eq!(map.stats.times_played, 4);
        assert_eq!(map.stats.draws, 1);
    }

    #[test]
    fn test_coop_excluded_from_map_level() {
        let mut tree = StatsTree::new();
        tree.insert(round("m", "Advance & Secure", "Layer 1", &[1], 100, 0), Provenance::Fresh);
        let mut coop = round("m", COOP_MODE, "Layer 1", &[2], 500, 0);
        coop.player_count = 5;
        tree.insert(coop, Provenance::Fresh);
        tree.rollup();

        let map = tree.map_node("1.0.0.0", "m").unwrap();
        // coop counted at its own level
        assert_eq!(map.game_modes[COOP_MODE].stats.times_played, 1);
        assert_eq!(map.game_modes[COOP_MODE].stats.wins_team1, 1);
        // but not in the map aggregate
        assert_eq!(map.stats.times_played, 1);
        assert_eq!(map.stats.wins_team1, 1);
        assert_eq!(map.stats.average_tickets_team1, 100.0);
    }

    #[test]
    fn test_heatmap_merge_propagates_changes() {
        let mut tree = StatsTree::new();
        let mut r = round("m", "Advance & Secure", "Layer 1", &[1], 10, 5);
        r.heatmap.increment(3, 4);
        tree.insert(r, Provenance::Fresh);

        let merged = tree.merge_heatmaps();
        // route, layer, game mode, map
        assert_eq!(merged.len(), 4);
        assert!(merged.iter().all(|m| m.grid.get(3, 4) == 1));
        assert!(merged.iter().any(|m| m.name == "Route 1"));
        assert!(merged.iter().any(|m| m.name == "Layer 1"));
        assert!(merged.iter().any(|m| m.name == "m"));

        // nothing changed since the last merge
        assert!(tree.merge_heatmaps().is_empty());
    }

    #[test]
    fn test_heatmap_not_double_counted() {
        let mut tree = StatsTree::new();
        let mut r = round("m", "Advance & Secure", "Layer 1", &[1], 10, 5);
        r.heatmap.increment(3, 4);
        tree.insert(r, Provenance::Fresh);
        tree.merge_heatmaps();

        let mut r2 = round("m", "Advance & Secure", "Layer 1", &[1], 10, 5);
        r2.heatmap.increment(3, 4);
        tree.insert(r2, Provenance::Fresh);
        let merged = tree.merge_heatmaps();
        let route_grid = merged.iter().find(|m| m.name == "Route 1").unwrap();
        assert_eq!(route_grid.grid.get(3, 4), 2);
    }

    #[test]
    fn test_seeded_grid_included() {
        let mut tree = StatsTree::new();
        let mut r = round("m", "Advance & Secure", "Layer 1", &[1], 10, 5);
        r.heatmap.increment(1, 1);
        tree.insert(r, Provenance::Fresh);

        let mut seed = HeatmapGrid::new();
        seed.increment(1, 1);
        seed.increment(9, 9);
        let map = tree.versions.get_mut("1.0.0.0").unwrap().get_mut("m").unwrap();
        let route = map.game_modes.get_mut("Advance & Secure").unwrap()
            .layers.get_mut("Layer 1").unwrap()
            .routes.get_mut("Route 1").unwrap();
        route.seed_heatmap(&seed);

        let merged = tree.merge_heatmaps();
        let route_grid = merged.iter().find(|m| m.name == "Route 1").unwrap();
        assert_eq!(route_grid.grid.get(1, 1), 2);
        assert_eq!(route_grid.grid.get(9, 9), 1);
    }
}
