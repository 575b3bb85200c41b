// Streaming UBX decoder
//
// Receivers interleave NMEA text with UBX frames on the same port, so the
// decoder hunts for the sync pair and silently skips everything else.

use super::checksum::ubx_checksum;
use super::error::DecodeError;
use super::frame::{Frame, SYNC_1, SYNC_2};

/// Largest payload accepted before the decoder gives up on a frame
pub const MAX_PAYLOAD_LEN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Sync1,
    Sync2,
    Class,
    Id,
    LenLo,
    LenHi,
    Payload,
    CkA,
    CkB,
}

/// Byte-at-a-time UBX frame decoder
#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
    class: u8,
    id: u8,
    len: usize,
    payload: Vec<u8>,
    ck_a: u8,
    skipped: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: State::Sync1,
            class: 0,
            id: 0,
            len: 0,
            payload: Vec::new(),
            ck_a: 0,
            skipped: 0,
        }
    }

    /// Number of bytes discarded outside of UBX frames
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Drop any partially decoded frame
    pub fn reset(&mut self) {
        self.state = State::Sync1;
        self.payload.clear();
        self.len = 0;
    }

    /// Feed one byte
    ///
    /// Returns `Some` when the byte completes a frame (or proves the current
    /// one corrupt), `None` otherwise.
    pub fn feed(&mut self, byte: u8) -> Option<Result<Frame, DecodeError>> {
        match self.state {
            State::Sync1 => {
                if byte == SYNC_1 {
                    self.state = State::Sync2;
                } else {
                    self.skipped += 1;
                }
            }
            State::Sync2 => {
                if byte == SYNC_2 {
                    self.state = State::Class;
                } else if byte == SYNC_1 {
                    // Previous 0xB5 was noise; this one may start a frame
                    self.skipped += 1;
                } else {
                    self.skipped += 2;
                    self.state = State::Sync1;
                }
            }
            State::Class => {
                self.class = byte;
                self.state = State::Id;
            }
            State::Id => {
                self.id = byte;
                self.state = State::LenLo;
            }
            State::LenLo => {
                self.len = usize::from(byte);
                self.state = State::LenHi;
            }
            State::LenHi => {
                self.len |= usize::from(byte) << 8;
                if self.len > MAX_PAYLOAD_LEN {
                    let len = self.len;
                    self.reset();
                    return Some(Err(DecodeError::PayloadTooLong(len)));
                }
                self.payload.clear();
                self.payload.reserve(self.len);
                self.state = if self.len == 0 {
                    State::CkA
                } else {
                    State::Payload
                };
            }
            State::Payload => {
                self.payload.push(byte);
                if self.payload.len() == self.len {
                    self.state = State::CkA;
                }
            }
            State::CkA => {
                self.ck_a = byte;
                self.state = State::CkB;
            }
            State::CkB => {
                let expected = self.checksum();
                let actual = (self.ck_a, byte);
                let payload = std::mem::take(&mut self.payload);
                self.reset();

                if expected != actual {
                    return Some(Err(DecodeError::ChecksumMismatch {
                        class: self.class,
                        id: self.id,
                        expected,
                        actual,
                    }));
                }
                return Some(Ok(Frame::new(self.class, self.id, payload)));
            }
        }

        None
    }

    /// Feed a buffer, collecting every completed result in order
    pub fn feed_all(&mut self, bytes: &[u8]) -> Vec<Result<Frame, DecodeError>> {
        bytes.iter().filter_map(|&b| self.feed(b)).collect()
    }

    fn checksum(&self) -> (u8, u8) {
        let len = self.len as u16;
        let mut header = [self.class, self.id, 0, 0];
        header[2..].copy_from_slice(&len.to_le_bytes());

        let (a, b) = ubx_checksum(&header);
        // Continue the running sums across the payload
        let mut ck_a = a;
        let mut ck_b = b;
        for &byte in &self.payload {
            ck_a = ck_a.wrapping_add(byte);
            ck_b = ck_b.wrapping_add(ck_a);
        }
        (ck_a, ck_b)
    }
}
