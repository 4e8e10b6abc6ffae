//! Whole-file round decoding.
//!
//! [`parse_demo`] is a pure function from a demo buffer to a
//! [`RoundRecord`]: it holds no shared state, so a batch driver can fan
//! files out across as many workers as it likes without synchronization.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::codec::message::{MessageDecoder, Step, ROUND_END, SERVER_DETAILS};
use crate::error::Result;
use crate::maps::MapRegistry;
use crate::record::RoundRecord;
use crate::state::round::RoundState;

/// Iteration cap while hunting for the initial server-details record, so a
/// malformed stream of skippable records cannot spin forever.
pub const MAX_HEADER_SEARCH: usize = 10_000;

/// Demos smaller than this never contain a playable round.
pub const MIN_DEMO_SIZE: u64 = 10_000;

/// Best-effort decompression: demos are normally zlib-deflated, but a raw
/// stream is accepted as-is when inflation fails.
pub fn decompress(raw: &[u8]) -> Vec<u8> {
    let mut decoder = ZlibDecoder::new(raw);
    let mut buffer = Vec::new();
    match decoder.read_to_end(&mut buffer) {
        Ok(_) => buffer,
        Err(_) => raw.to_vec(),
    }
}

/// Decode one demo buffer into a completed round.
///
/// Drives the message decoder until server details have been seen (bounded
/// by [`MAX_HEADER_SEARCH`]), then to the round-end marker or the end of
/// the stream, and assembles the record. A round missing any required
/// detail is reported as incomplete and should be skipped, not inserted.
pub fn parse_demo(raw: &[u8], maps: &MapRegistry) -> Result<RoundRecord> {
    let buffer = decompress(raw);
    let mut state = RoundState::new();
    let mut decoder = MessageDecoder::new(&buffer);

    let mut searched = 0;
    loop {
        match decoder.step(&mut state, maps) {
            Step::Message(SERVER_DETAILS) | Step::End => break,
            Step::Message(_) => {}
        }
        searched += 1;
        if searched == MAX_HEADER_SEARCH {
            tracing::debug!("no server details within iteration cap");
            break;
        }
    }

    loop {
        match decoder.step(&mut state, maps) {
            Step::Message(ROUND_END) | Step::End => break,
            Step::Message(_) => {}
        }
    }

    state.into_record()
}
