//! Decode-time player table entry.
//!
//! Player updates arrive as bit-flagged partial records: a 16-bit mask
//! selects which of the 14 updatable fields follow, in the fixed order of
//! [`UPDATE_ORDER`]. Players only exist while a round is being decoded;
//! their sole lasting contribution is position samples in the heatmap.

use bitflags::bitflags;

use crate::codec::fields::{decode_vehicle, VehicleRef};
use crate::codec::reader::ByteCursor;
use crate::error::Result;

bitflags! {
    /// Field-presence mask of a player update record. Bits 0x80 and 0x400
    /// are not assigned by the recorder.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct UpdateFlags: u16 {
        const TEAM = 0x0001;
        const SQUAD = 0x0002;
        const VEHICLE = 0x0004;
        const HEALTH = 0x0008;
        const SCORE = 0x0010;
        const TEAM_WEIGHTED_SCORE = 0x0020;
        const KILLS = 0x0040;
        const DEATHS = 0x0100;
        const PING = 0x0200;
        const ALIVE = 0x0800;
        const JOINING = 0x1000;
        const POSITION = 0x2000;
        const ROTATION = 0x4000;
        const KIT = 0x8000;
    }
}

/// One updatable player field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerField {
    Team,
    Squad,
    Vehicle,
    Health,
    Score,
    TeamWeightedScore,
    Kills,
    Deaths,
    Ping,
    Alive,
    Joining,
    Position,
    Rotation,
    Kit,
}

impl PlayerField {
    pub fn flag(self) -> UpdateFlags {
        match self {
            PlayerField::Team => UpdateFlags::TEAM,
            PlayerField::Squad => UpdateFlags::SQUAD,
            PlayerField::Vehicle => UpdateFlags::VEHICLE,
            PlayerField::Health => UpdateFlags::HEALTH,
            PlayerField::Score => UpdateFlags::SCORE,
            PlayerField::TeamWeightedScore => UpdateFlags::TEAM_WEIGHTED_SCORE,
            PlayerField::Kills => UpdateFlags::KILLS,
            PlayerField::Deaths => UpdateFlags::DEATHS,
            PlayerField::Ping => UpdateFlags::PING,
            PlayerField::Alive => UpdateFlags::ALIVE,
            PlayerField::Joining => UpdateFlags::JOINING,
            PlayerField::Position => UpdateFlags::POSITION,
            PlayerField::Rotation => UpdateFlags::ROTATION,
            PlayerField::Kit => UpdateFlags::KIT,
        }
    }
}

/// Wire order of the updatable fields, lowest mask bit first.
pub const UPDATE_ORDER: [PlayerField; 14] = [
    PlayerField::Team,
    PlayerField::Squad,
    PlayerField::Vehicle,
    PlayerField::Health,
    PlayerField::Score,
    PlayerField::TeamWeightedScore,
    PlayerField::Kills,
    PlayerField::Deaths,
    PlayerField::Ping,
    PlayerField::Alive,
    PlayerField::Joining,
    PlayerField::Position,
    PlayerField::Rotation,
    PlayerField::Kit,
];

/// Decode-time player state.
#[derive(Debug, Clone, Default)]
pub struct Player {
    pub id: u8,
    pub name: String,
    pub hash: String,
    pub ip: String,

    /// Which of the updatable fields have been observed at least once.
    pub seen: UpdateFlags,

    pub team: u8,
    pub squad: u8,
    pub vehicle: Option<VehicleRef>,
    pub health: i8,
    pub score: i16,
    pub team_weighted_score: i16,
    pub kills: i16,
    pub deaths: i16,
    pub ping: i16,
    pub alive: bool,
    pub joining: bool,
    pub position: [i16; 3],
    pub rotation: i16,
    pub kit: String,
}

impl Player {
    pub fn new(id: u8, name: String, hash: String, ip: String) -> Self {
        Self {
            id,
            name,
            hash,
            ip,
            ..Self::default()
        }
    }

    /// Decode one field's wire value and store it.
    pub fn apply(&mut self, field: PlayerField, cursor: &mut ByteCursor<'_>) -> Result<()> {
        match field {
            PlayerField::Team => self.team = cursor.read_u8()?,
            PlayerField::Squad => self.squad = cursor.read_u8()?,
            PlayerField::Vehicle => self.vehicle = decode_vehicle(cursor)?,
            PlayerField::Health => self.health = cursor.read_i8()?,
            PlayerField::Score => self.score = cursor.read_i16_le()?,
            PlayerField::TeamWeightedScore => self.team_weighted_score = cursor.read_i16_le()?,
            PlayerField::Kills => self.kills = cursor.read_i16_le()?,
            PlayerField::Deaths => self.deaths = cursor.read_i16_le()?,
            PlayerField::Ping => self.ping = cursor.read_i16_le()?,
            PlayerField::Alive => self.alive = cursor.read_u8()? != 0,
            PlayerField::Joining => self.joining = cursor.read_u8()? != 0,
            PlayerField::Position => {
                self.position = [
                    cursor.read_i16_le()?,
                    cursor.read_i16_le()?,
                    cursor.read_i16_le()?,
                ];
            }
            PlayerField::Rotation => self.rotation = cursor.read_i16_le()?,
            PlayerField::Kit => self.kit = cursor.read_cstring()?,
        }
        self.seen.insert(field.flag());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_update_sets_seen_bits() {
        let mut player = Player::new(7, "p".into(), "h".into(), "ip".into());
        let data = [0x02, 0x32, 0x00]; // team, score
        let mut cursor = ByteCursor::new(&data);

        player.apply(PlayerField::Team, &mut cursor).unwrap();
        player.apply(PlayerField::Score, &mut cursor).unwrap();

        assert_eq!(player.team, 2);
        assert_eq!(player.score, 50);
        assert_eq!(player.seen, UpdateFlags::TEAM | UpdateFlags::SCORE);
        assert!(!player.seen.contains(UpdateFlags::POSITION));
    }

    #[test]
    fn test_position_and_alive() {
        let mut player = Player::new(1, String::new(), String::new(), String::new());
        let data = [
            0x01, // alive
            0x10, 0x00, 0x20, 0x00, 0x30, 0x00, // position
        ];
        let mut cursor = ByteCursor::new(&data);
        player.apply(PlayerField::Alive, &mut cursor).unwrap();
        player.apply(PlayerField::Position, &mut cursor).unwrap();
        assert!(player.alive);
        assert_eq!(player.position, [0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_vehicle_update() {
        let mut player = Player::default();
        let mut data = vec![0x05, 0x00];
        data.extend_from_slice(b"apc\0");
        data.push(0x02);
        let mut cursor = ByteCursor::new(&data);
        player.apply(PlayerField::Vehicle, &mut cursor).unwrap();
        let vehicle = player.vehicle.as_ref().unwrap();
        assert_eq!(vehicle.id, 5);
        assert_eq!(vehicle.name, "apc");
        assert_eq!(vehicle.seat, 2);

        // leaving the vehicle clears it
        let data = [0xFF, 0xFF];
        let mut cursor = ByteCursor::new(&data);
        player.apply(PlayerField::Vehicle, &mut cursor).unwrap();
        assert!(player.vehicle.is_none());
    }
}
