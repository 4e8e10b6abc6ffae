use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::record::{Flag, RoundRecord};
use crate::state::heatmap::HeatmapGrid;
use crate::state::player::Player;

/// Mutable decode-time state for a single demo file.
///
/// Message handlers fill this in as records arrive; once the stream ends it
/// is assembled into a [`RoundRecord`], which fails if any required detail
/// was never observed.
#[derive(Debug, Default)]
pub struct RoundState {
    pub version: Option<String>,
    pub map_name: Option<String>,
    pub game_mode: Option<String>,
    pub layer: Option<String>,
    pub date: Option<u32>,

    pub tickets_team1: Option<u16>,
    pub tickets_team2: Option<u16>,
    pub elapsed_seconds: f64,

    pub players: HashMap<u8, Player>,
    pub player_count: u32,
    pub flags: Vec<Flag>,
    pub heatmap: HeatmapGrid,

    /// Map scale resolved when the server details arrive; zero means the
    /// map is unknown and position data is not trusted.
    pub scale: f64,
}

impl RoundState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
        self.player_count += 1;
    }

    pub fn remove_player(&mut self, id: u8) -> Result<()> {
        self.players.remove(&id).ok_or(Error::UnknownPlayer(id))?;
        self.player_count = self.player_count.saturating_sub(1);
        Ok(())
    }

    /// Assemble the final record. Every server-details field and both
    /// ticket counters must have been observed.
    pub fn into_record(self) -> Result<RoundRecord> {
        fn require<T>(value: Option<T>, missing: &'static str) -> Result<T> {
            value.ok_or(Error::IncompleteRound { missing })
        }

        Ok(RoundRecord {
            version: require(self.version, "version")?,
            map: require(self.map_name, "map name")?,
            game_mode: require(self.game_mode, "game mode")?,
            layer: require(self.layer, "layer")?,
            date: require(self.date, "date")?,
            duration: self.elapsed_seconds / 60.0,
            player_count: self.player_count,
            tickets_team1: require(self.tickets_team1, "team 1 tickets")?,
            tickets_team2: require(self.tickets_team2, "team 2 tickets")?,
            flags: self.flags,
            heatmap: self.heatmap,
            completed: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_round_rejected() {
        let mut state = RoundState::new();
        state.version = Some("1.0.0.0".into());
        state.map_name = Some("Muttrah_City".into());
        // game mode, layer, date, tickets all missing
        assert!(matches!(
            state.into_record(),
            Err(Error::IncompleteRound { .. })
        ));
    }

    #[test]
    fn test_remove_unknown_player_is_fatal() {
        let mut state = RoundState::new();
        assert!(matches!(
            state.remove_player(9),
            Err(Error::UnknownPlayer(9))
        ));
    }

    #[test]
    fn test_player_count_tracks_adds_and_removes() {
        let mut state = RoundState::new();
        state.add_player(Player::new(1, "a".into(), String::new(), String::new()));
        state.add_player(Player::new(2, "b".into(), String::new(), String::new()));
        assert_eq!(state.player_count, 2);
        state.remove_player(1).unwrap();
        assert_eq!(state.player_count, 1);
        assert!(!state.players.contains_key(&1));
    }
}
