// UBX frame
//
// Format: sync(2) + class(1) + id(1) + len(2, LE) + payload(len) + checksum(2)

use std::fmt;

use super::checksum::ubx_checksum;
use super::error::FrameError;

/// First sync character
pub const SYNC_1: u8 = 0xB5;
/// Second sync character
pub const SYNC_2: u8 = 0x62;

/// Bytes added around the payload: sync(2) + class + id + len(2) + checksum(2)
pub const FRAME_OVERHEAD: usize = 8;

/// A single UBX message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub class: u8,
    pub id: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(class: u8, id: u8, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            class,
            id,
            payload: payload.into(),
        }
    }

    /// Poll request: same class/id as the message, empty payload
    pub fn poll(class: u8, id: u8) -> Self {
        Self::new(class, id, Vec::new())
    }

    pub fn is(&self, class: u8, id: u8) -> bool {
        self.class == class && self.id == id
    }

    /// Serialize to wire bytes, checksum included
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let len = u16::try_from(self.payload.len())
            .map_err(|_| FrameError::PayloadTooLong(self.payload.len()))?;

        let mut out = Vec::with_capacity(FRAME_OVERHEAD + self.payload.len());
        out.push(SYNC_1);
        out.push(SYNC_2);
        out.push(self.class);
        out.push(self.id);
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&self.payload);

        let (ck_a, ck_b) = ubx_checksum(&out[2..]);
        out.push(ck_a);
        out.push(ck_b);

        Ok(out)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UBX {:#04x}/{:#04x} ({} bytes)",
            self.class,
            self.id,
            self.payload.len()
        )
    }
}
