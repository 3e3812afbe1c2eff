//! Wire format.
//!
//! Every message is framed as one type byte, a 3-byte little-endian payload
//! length, then the payload. Two messages exist: controls (client to server)
//! and full state (server to client).
//!
//! Decoders work on an accumulating receive buffer. They return `Ok(false)` /
//! `Ok(None)` while a frame is incomplete or when the buffer starts with a
//! different message type, consume exactly one frame on success, and report
//! a `ProtocolError` only for frames that can never be valid.

use crate::entity::{Controls, PlayerType};
use crate::math::Vec2;
use crate::NUM_PUCKS;
use bincode::Options;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Frame header: type byte plus 24-bit payload length.
pub const HEADER_SIZE: usize = 4;
/// Largest payload the length field can describe.
pub const MAX_PAYLOAD_SIZE: usize = 0x00FF_FFFF;
/// One byte per button.
pub const CONTROLS_PAYLOAD_SIZE: usize = 5;
/// grace period + two player records + five puck records.
pub const STATE_PAYLOAD_SIZE: usize = 4 + 2 * PLAYER_RECORD_SIZE + NUM_PUCKS * PUCK_RECORD_SIZE;

const PLAYER_RECORD_SIZE: usize = 8 + 8 + 1 + 4;
const PUCK_RECORD_SIZE: usize = 8 + 8 + 1;

const PRESSED_BIT: u8 = 0x80;
const DOWNS_MASK: u8 = 0x7f;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Controls = 1,
    State = b's',
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("controls message with size {size} != {}", CONTROLS_PAYLOAD_SIZE)]
    ControlsSize { size: usize },

    #[error("state message with size {size} != {}", STATE_PAYLOAD_SIZE)]
    StateSize { size: usize },

    #[error("malformed state message: {0}")]
    Malformed(#[from] bincode::Error),

    #[error("payload of {0} bytes does not fit in a frame")]
    PayloadTooLarge(usize),

    #[error("expected {expected:?} message but stream starts with byte {found:#04x}")]
    Desync { expected: MessageType, found: u8 },
}

/// Appends a complete frame carrying `payload`.
pub fn write_frame(
    out: &mut Vec<u8>,
    kind: MessageType,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }
    write_header(out, kind, payload.len());
    out.extend_from_slice(payload);
    Ok(())
}

fn write_header(out: &mut Vec<u8>, kind: MessageType, size: usize) {
    let size = size as u32;
    out.push(kind as u8);
    out.extend_from_slice(&size.to_le_bytes()[..3]);
}

/// Declared payload size of a `kind` frame at the front of `buf`, or `None`
/// if the header is incomplete or the frame is of another type.
fn peek_frame(buf: &[u8], kind: MessageType) -> Option<usize> {
    if buf.len() < HEADER_SIZE || buf[0] != kind as u8 {
        return None;
    }
    Some(u32::from_le_bytes([buf[1], buf[2], buf[3], 0]) as usize)
}

/// Fails if `buf` starts with anything other than a `expected` frame.
///
/// Each direction carries a single message type, so after draining every
/// complete message, leftover bytes of another type mean the stream is out
/// of step.
pub fn check_stream(buf: &[u8], expected: MessageType) -> Result<(), ProtocolError> {
    match buf.first() {
        Some(&found) if found != expected as u8 => Err(ProtocolError::Desync { expected, found }),
        _ => Ok(()),
    }
}

/// Appends a controls frame.
///
/// Only the low 7 bits of each tap counter fit on the wire.
pub fn encode_controls(controls: &Controls, out: &mut Vec<u8>) {
    write_header(out, MessageType::Controls, CONTROLS_PAYLOAD_SIZE);
    for button in controls.buttons() {
        if button.downs & PRESSED_BIT != 0 {
            warn!(
                "Tap counter {} too large for the wire, sending {}",
                button.downs,
                button.downs & DOWNS_MASK
            );
        }
        let pressed = if button.pressed { PRESSED_BIT } else { 0 };
        out.push(pressed | (button.downs & DOWNS_MASK));
    }
}

/// Decodes one controls frame from the front of `buf` into `controls`.
///
/// Held state is replaced; tap counts are added to whatever has not been
/// consumed yet, since several messages can arrive between ticks.
pub fn decode_controls(controls: &mut Controls, buf: &mut Vec<u8>) -> Result<bool, ProtocolError> {
    let Some(size) = peek_frame(buf, MessageType::Controls) else {
        return Ok(false);
    };
    if size != CONTROLS_PAYLOAD_SIZE {
        return Err(ProtocolError::ControlsSize { size });
    }
    if buf.len() < HEADER_SIZE + size {
        return Ok(false);
    }

    let payload = &buf[HEADER_SIZE..HEADER_SIZE + size];
    for (button, &byte) in controls.buttons_mut().into_iter().zip(payload) {
        button.pressed = byte & PRESSED_BIT != 0;
        button.add_downs(byte & DOWNS_MASK);
    }

    buf.drain(..HEADER_SIZE + size);
    Ok(true)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub position: Vec2,
    pub velocity: Vec2,
    pub player_type: PlayerType,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PuckRecord {
    pub position: Vec2,
    pub velocity: Vec2,
    pub last_hit: PlayerType,
}

/// Complete authoritative state carried by one state message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub grace_period: f32,
    pub players: [PlayerRecord; 2],
    pub pucks: [PuckRecord; NUM_PUCKS],
}

/// Fixed-width little-endian fields, no length prefixes, nothing left over.
fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Appends a state frame.
pub fn encode_state(snapshot: &StateSnapshot, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
    let payload = wire_options().serialize(snapshot)?;
    write_frame(out, MessageType::State, &payload)
}

/// Decodes one state frame from the front of `buf`.
pub fn decode_state(buf: &mut Vec<u8>) -> Result<Option<StateSnapshot>, ProtocolError> {
    let Some(size) = peek_frame(buf, MessageType::State) else {
        return Ok(None);
    };
    if size != STATE_PAYLOAD_SIZE {
        return Err(ProtocolError::StateSize { size });
    }
    if buf.len() < HEADER_SIZE + size {
        return Ok(None);
    }

    let snapshot = wire_options().deserialize(&buf[HEADER_SIZE..HEADER_SIZE + size])?;
    buf.drain(..HEADER_SIZE + size);
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> StateSnapshot {
        let mut snapshot = StateSnapshot {
            grace_period: 1.25,
            ..StateSnapshot::default()
        };
        snapshot.players[0] = PlayerRecord {
            position: Vec2::new(-0.3, -1.4),
            velocity: Vec2::new(0.1, f32::MIN_POSITIVE),
            player_type: PlayerType::Player0,
            score: 7,
        };
        snapshot.players[1] = PlayerRecord {
            position: Vec2::new(0.25, 1.6),
            velocity: Vec2::new(-2.9, -0.0),
            player_type: PlayerType::Neutral,
            score: u32::MAX,
        };
        for (i, puck) in snapshot.pucks.iter_mut().enumerate() {
            puck.position = Vec2::new(0.1 * i as f32, -0.2 * i as f32);
            puck.velocity = Vec2::new(1.0 / (i as f32 + 3.0), 2.5);
            puck.last_hit = PlayerType::Player1;
        }
        snapshot
    }

    #[test]
    fn test_frame_header_layout() {
        let mut out = Vec::new();
        write_frame(&mut out, MessageType::State, &[9; 0x0102]).unwrap();

        assert_eq!(&out[..4], &[b's', 0x02, 0x01, 0x00]);
        assert_eq!(out.len(), 4 + 0x0102);
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let mut out = Vec::new();
        let payload = vec![0; MAX_PAYLOAD_SIZE + 1];
        let err = write_frame(&mut out, MessageType::State, &payload).unwrap_err();
        assert!(matches!(err, ProtocolError::PayloadTooLarge(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_controls_wire_bytes() {
        let mut controls = Controls::default();
        controls.left.pressed = true;
        controls.left.downs = 2;
        controls.up.downs = 1;
        controls.jump.pressed = true;

        let mut out = Vec::new();
        encode_controls(&controls, &mut out);

        assert_eq!(out, vec![1, 5, 0, 0, 0x82, 0x00, 0x01, 0x00, 0x80]);
    }

    #[test]
    fn test_controls_roundtrip() {
        let mut sent = Controls::default();
        sent.right.pressed = true;
        sent.right.downs = 127;
        sent.down.downs = 3;

        let mut buf = Vec::new();
        encode_controls(&sent, &mut buf);

        let mut received = Controls::default();
        assert!(decode_controls(&mut received, &mut buf).unwrap());
        assert_eq!(received, sent);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_controls_downs_accumulate() {
        let mut sent = Controls::default();
        sent.jump.downs = 100;
        sent.jump.pressed = true;

        let mut buf = Vec::new();
        encode_controls(&sent, &mut buf);
        encode_controls(&sent, &mut buf);
        encode_controls(&sent, &mut buf);

        let mut received = Controls::default();
        assert!(decode_controls(&mut received, &mut buf).unwrap());
        assert_eq!(received.jump.downs, 100);
        assert!(decode_controls(&mut received, &mut buf).unwrap());
        assert_eq!(received.jump.downs, 200);
        assert!(decode_controls(&mut received, &mut buf).unwrap());
        assert_eq!(received.jump.downs, 255);
        assert!(received.jump.pressed);
        assert!(!decode_controls(&mut received, &mut buf).unwrap());
    }

    #[test]
    fn test_controls_high_bit_dropped() {
        let mut sent = Controls::default();
        sent.left.downs = 0x85;

        let mut buf = Vec::new();
        encode_controls(&sent, &mut buf);
        assert_eq!(buf[4], 0x05);
    }

    #[test]
    fn test_partial_controls_left_in_buffer() {
        let mut full = Vec::new();
        encode_controls(&Controls::default(), &mut full);

        let mut controls = Controls::default();
        for cut in 0..full.len() {
            let mut buf = full[..cut].to_vec();
            assert!(!decode_controls(&mut controls, &mut buf).unwrap());
            assert_eq!(buf, full[..cut]);
        }
    }

    #[test]
    fn test_controls_wrong_size_is_fatal_even_when_incomplete() {
        // header only, claiming a six byte payload
        let mut buf = vec![1, 6, 0, 0];
        let mut controls = Controls::default();

        let err = decode_controls(&mut controls, &mut buf).unwrap_err();
        assert!(matches!(err, ProtocolError::ControlsSize { size: 6 }));

        let mut short = vec![1, 4, 0, 0, 0, 0, 0, 0];
        assert!(decode_controls(&mut controls, &mut short).is_err());
    }

    #[test]
    fn test_other_message_type_is_not_consumed() {
        let mut buf = Vec::new();
        encode_state(&sample_snapshot(), &mut buf).unwrap();
        let before = buf.clone();

        let mut controls = Controls::default();
        assert!(!decode_controls(&mut controls, &mut buf).unwrap());
        assert_eq!(buf, before);

        assert!(check_stream(&buf, MessageType::State).is_ok());
        let err = check_stream(&buf, MessageType::Controls).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Desync {
                expected: MessageType::Controls,
                found: b's'
            }
        ));
        assert!(check_stream(&[], MessageType::Controls).is_ok());
    }

    #[test]
    fn test_state_payload_size() {
        let mut buf = Vec::new();
        encode_state(&sample_snapshot(), &mut buf).unwrap();
        assert_eq!(STATE_PAYLOAD_SIZE, 131);
        assert_eq!(buf.len(), HEADER_SIZE + STATE_PAYLOAD_SIZE);
    }

    #[test]
    fn test_state_roundtrip_is_bit_exact() {
        let sent = sample_snapshot();
        let mut buf = Vec::new();
        encode_state(&sent, &mut buf).unwrap();

        let received = decode_state(&mut buf).unwrap().unwrap();
        assert!(buf.is_empty());

        assert_eq!(received, sent);
        assert_eq!(
            received.players[1].velocity.y.to_bits(),
            (-0.0f32).to_bits()
        );
        assert_eq!(received.players[1].score, u32::MAX);
    }

    #[test]
    fn test_state_frames_back_to_back() {
        let first = sample_snapshot();
        let mut second = sample_snapshot();
        second.grace_period = 0.0;

        let mut buf = Vec::new();
        encode_state(&first, &mut buf).unwrap();
        encode_state(&second, &mut buf).unwrap();
        let tail = buf.split_off(buf.len() - 10);

        assert_eq!(decode_state(&mut buf).unwrap(), Some(first));
        assert_eq!(decode_state(&mut buf).unwrap(), None);
        buf.extend_from_slice(&tail);
        assert_eq!(decode_state(&mut buf).unwrap(), Some(second));
    }

    #[test]
    fn test_state_wrong_size_is_fatal() {
        let mut buf = Vec::new();
        encode_state(&sample_snapshot(), &mut buf).unwrap();
        // one trailing byte inside the declared payload
        buf[1] = (STATE_PAYLOAD_SIZE + 1) as u8;
        buf.push(0);

        let err = decode_state(&mut buf).unwrap_err();
        assert!(matches!(err, ProtocolError::StateSize { size } if size == STATE_PAYLOAD_SIZE + 1));
    }

    #[test]
    fn test_state_invalid_player_type_is_fatal() {
        let mut buf = Vec::new();
        encode_state(&sample_snapshot(), &mut buf).unwrap();
        // player 0's type byte follows grace period, position and velocity
        buf[HEADER_SIZE + 4 + 16] = 7;

        let err = decode_state(&mut buf).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }
}
