//! Length-framed message decoding.
//!
//! A demo stream is a sequence of `[u16 length][u8 type][payload]` records
//! where `length` counts the type byte plus the payload. One [`step`] reads
//! a single record and applies it to the round state; handlers must consume
//! exactly the declared length. Any decode failure ends the stream, the
//! round keeps whatever was gathered so far and assembly decides whether
//! that amounts to a complete round.

use crate::codec::fields::{decode_fields, FieldKind, FieldValue};
use crate::codec::reader::ByteCursor;
use crate::error::{Error, Result};
use crate::maps::MapRegistry;
use crate::record::Flag;
use crate::state::player::{Player, PlayerField, UPDATE_ORDER};
use crate::state::round::RoundState;

pub const SERVER_DETAILS: u8 = 0x00;
pub const PLAYER_UPDATE: u8 = 0x10;
pub const PLAYER_ADD: u8 = 0x11;
pub const PLAYER_REMOVE: u8 = 0x12;
pub const FLAG_LIST: u8 = 0x41;
pub const TICKETS_TEAM1: u8 = 0x52;
pub const TICKETS_TEAM2: u8 = 0x53;
pub const ROUND_END: u8 = 0xF0;
pub const TICK: u8 = 0xF1;

/// Ticket values at or above this are recorder glitches; the stored count
/// resets to zero instead.
pub const CORRUPT_TICKET_CEILING: u16 = 9000;

/// Seconds represented by one tick unit.
pub const TICK_SECONDS: f64 = 0.04;

/// Payload layout of a server-details record. Only fields 3 (version
/// string), 7 (map), 8 (game-mode code), 9 (layer) and 12 (date) are kept.
const SERVER_DETAILS_FIELDS: [FieldKind; 15] = [
    FieldKind::U32,
    FieldKind::F32,
    FieldKind::CString,
    FieldKind::CString,
    FieldKind::U8,
    FieldKind::U16,
    FieldKind::U16,
    FieldKind::CString,
    FieldKind::CString,
    FieldKind::U8,
    FieldKind::CString,
    FieldKind::CString,
    FieldKind::U32,
    FieldKind::U16,
    FieldKind::U16,
];

/// Outcome of one framing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A record of this type was processed (or skipped as unknown).
    Message(u8),
    /// Stream exhausted or decoding failed; no further progress possible.
    End,
}

/// Stateful reader over one demo stream.
pub struct MessageDecoder<'a> {
    cursor: ByteCursor<'a>,
}

impl<'a> MessageDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(data),
        }
    }

    /// Decode one record and apply it to `state`.
    pub fn step(&mut self, state: &mut RoundState, maps: &MapRegistry) -> Step {
        if self.cursor.remaining() < 2 {
            return Step::End;
        }
        let length = match self.cursor.read_u16_le() {
            Ok(v) => v as usize,
            Err(_) => return Step::End,
        };
        let start = self.cursor.position();
        let kind = match self.cursor.read_u8() {
            Ok(v) => v,
            Err(_) => return Step::End,
        };

        match self.dispatch(kind, length, start, state, maps) {
            Ok(()) => Step::Message(kind),
            Err(error) => {
                tracing::debug!(kind, %error, "message decode aborted");
                Step::End
            }
        }
    }

    fn dispatch(
        &mut self,
        kind: u8,
        length: usize,
        start: usize,
        state: &mut RoundState,
        maps: &MapRegistry,
    ) -> Result<()> {
        if length == 0 {
            return Err(Error::InvalidMessage("zero-length record".into()));
        }
        let end = start + length;

        match kind {
            SERVER_DETAILS => self.server_details(state, maps)?,
            TICKETS_TEAM1 => {
                while self.cursor.position() < end {
                    let value = self.cursor.read_u16_le()?;
                    state.tickets_team1 = Some(sanitize_tickets(value));
                }
            }
            TICKETS_TEAM2 => {
                while self.cursor.position() < end {
                    let value = self.cursor.read_u16_le()?;
                    state.tickets_team2 = Some(sanitize_tickets(value));
                }
            }
            TICK => {
                while self.cursor.position() < end {
                    let units = self.cursor.read_u8()?;
                    state.elapsed_seconds += units as f64 * TICK_SECONDS;
                }
            }
            // Without a trusted scale the position data is useless and the
            // whole record is skipped like an unknown type.
            PLAYER_UPDATE if state.scale != 0.0 => self.player_update(end, state)?,
            PLAYER_ADD => {
                while self.cursor.position() < end {
                    let id = self.cursor.read_u8()?;
                    let name = self.cursor.read_cstring()?;
                    let hash = self.cursor.read_cstring()?;
                    let ip = self.cursor.read_cstring()?;
                    state.add_player(Player::new(id, name, hash, ip));
                }
            }
            PLAYER_REMOVE => {
                while self.cursor.position() < end {
                    let id = self.cursor.read_u8()?;
                    state.remove_player(id)?;
                }
            }
            FLAG_LIST => {
                while self.cursor.position() < end {
                    let cpid = self.cursor.read_u16_le()?;
                    let team = self.cursor.read_u8()?;
                    let x = self.cursor.read_u16_le()?;
                    let y = self.cursor.read_u16_le()?;
                    let z = self.cursor.read_u16_le()?;
                    let radius = self.cursor.read_u16_le()?;
                    state.flags.push(Flag {
                        cpid,
                        team,
                        x,
                        y,
                        z,
                        radius,
                    });
                }
            }
            _ => self.cursor.skip(length - 1)?,
        }

        let consumed = self.cursor.position() - start;
        if consumed != length {
            return Err(Error::LengthMismatch {
                declared: length,
                consumed,
            });
        }
        Ok(())
    }

    fn server_details(&mut self, state: &mut RoundState, maps: &MapRegistry) -> Result<()> {
        let values = decode_fields(&mut self.cursor, &SERVER_DETAILS_FIELDS)?;

        state.version = Some(extract_version(str_at(&values, 3)?));
        let map_name = str_at(&values, 7)?.to_string();
        state.scale = maps.scale(&map_name);
        state.map_name = Some(map_name);
        state.game_mode = Some(display_game_mode(str_at(&values, 8)?));
        let layer = values[9]
            .as_u8()
            .ok_or_else(|| Error::InvalidMessage("layer field".into()))?;
        state.layer = Some(format!("Layer {layer}"));
        state.date = Some(
            values[12]
                .as_u32()
                .ok_or_else(|| Error::InvalidMessage("date field".into()))?,
        );
        Ok(())
    }

    fn player_update(&mut self, end: usize, state: &mut RoundState) -> Result<()> {
        while self.cursor.position() < end {
            let mask = self.cursor.read_u16_le()?;
            let id = self.cursor.read_u8()?;
            let player = state.players.get_mut(&id).ok_or(Error::UnknownPlayer(id))?;

            for field in UPDATE_ORDER {
                if mask & field.flag().bits() == 0 {
                    continue;
                }
                player.apply(field, &mut self.cursor)?;
                if field == PlayerField::Position && player.alive {
                    state.heatmap.record_position(
                        player.position[0] as f64,
                        player.position[2] as f64,
                        state.scale,
                    );
                }
            }
        }
        Ok(())
    }
}

fn sanitize_tickets(value: u16) -> u16 {
    if value < CORRUPT_TICKET_CEILING {
        value
    } else {
        0
    }
}

fn str_at<'v>(values: &'v [FieldValue], index: usize) -> Result<&'v str> {
    values
        .get(index)
        .and_then(FieldValue::as_str)
        .ok_or_else(|| Error::InvalidMessage(format!("string field {index}")))
}

/// Pull the engine version out of the bracketed prefix of the raw server
/// version string: everything before the first `]`, whitespace-split, the
/// second token when there is one, otherwise the first with its leading
/// `[` stripped.
fn extract_version(raw: &str) -> String {
    let prefix = raw.split(']').next().unwrap_or(raw);
    let mut tokens = prefix.split_whitespace();
    let first = tokens.next().unwrap_or("");
    match tokens.next() {
        Some(second) => second.to_string(),
        None => first.trim_start_matches('[').to_string(),
    }
}

/// Map a recorder game-mode code to its display name; unknown codes pass
/// through verbatim.
fn display_game_mode(code: &str) -> String {
    match code {
        "gpm_cq" => "Advance & Secure".into(),
        "gpm_insurgency" => "Insurgency".into(),
        "gpm_vehicles" => "Vehicle Warfare".into(),
        "gpm_cnc" => "Command & Control".into(),
        "gpm_skirmish" => "Skirmish".into(),
        "gpm_coop" => "Co-Operative".into(),
        other => other.into(),
    }
}
