//! Thingy:52 Protocol
//!
//! Payload formats for the gravity vector and speaker characteristics of the
//! Nordic Thingy:52 peripheral. Service identifiers live in
//! [`crate::domain::settings`] so they can be overridden.

use crate::domain::models::MotionSample;
use crate::domain::settings::{
    DEFAULT_TONE_DURATION_MS, DEFAULT_TONE_FREQUENCY_HZ, DEFAULT_TONE_VOLUME,
};
use thiserror::Error;
use tracing::trace;

pub const MOTION_PACKET_LEN: usize = 12;
pub const TONE_PACKET_LEN: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("motion packet too short: {0} bytes (expected at least 12)")]
    InvalidLength(usize),
}

/// Parse a gravity vector notification. Only the first 12 bytes are read.
///
/// ```text
/// [0-3]  : X (f32 little-endian)
/// [4-7]  : Y
/// [8-11] : Z
/// ```
pub fn parse_motion_packet(bytes: &[u8]) -> Result<MotionSample, ProtocolError> {
    if bytes.len() < MOTION_PACKET_LEN {
        return Err(ProtocolError::InvalidLength(bytes.len()));
    }

    trace!("Raw motion packet: {:02X?}", bytes);
    if bytes.len() > MOTION_PACKET_LEN {
        trace!("Ignoring {} trailing bytes", bytes.len() - MOTION_PACKET_LEN);
    }

    let axis = |i: usize| f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    Ok(MotionSample::new(axis(0), axis(4), axis(8)))
}

/// Encode a sample the way the device sends it
pub fn encode_motion_packet(sample: &MotionSample) -> [u8; MOTION_PACKET_LEN] {
    let mut bytes = [0u8; MOTION_PACKET_LEN];
    bytes[0..4].copy_from_slice(&sample.x.to_le_bytes());
    bytes[4..8].copy_from_slice(&sample.y.to_le_bytes());
    bytes[8..12].copy_from_slice(&sample.z.to_le_bytes());
    bytes
}

/// Speaker tone command (frequency mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneCommand {
    pub frequency_hz: u16,
    pub duration_ms: u16,
    pub volume: u8,
}

impl Default for ToneCommand {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_TONE_FREQUENCY_HZ,
            duration_ms: DEFAULT_TONE_DURATION_MS,
            volume: DEFAULT_TONE_VOLUME,
        }
    }
}

impl ToneCommand {
    /// `[freq lo, freq hi, duration lo, duration hi, volume]`
    pub fn to_bytes(&self) -> [u8; TONE_PACKET_LEN] {
        let [f0, f1] = self.frequency_hz.to_le_bytes();
        let [d0, d1] = self.duration_ms.to_le_bytes();
        [f0, f1, d0, d1, self.volume]
    }
}
