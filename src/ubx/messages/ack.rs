// UBX-ACK-ACK / UBX-ACK-NAK

use super::{CLASS_ACK, ID_ACK_ACK, ID_ACK_NAK};
use crate::ubx::Frame;

/// Acknowledgement of a CFG message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// `true` for ACK-ACK, `false` for ACK-NAK
    pub acknowledged: bool,
    /// Class of the acknowledged message
    pub class: u8,
    /// ID of the acknowledged message
    pub id: u8,
}

impl Ack {
    /// Interpret a frame as ACK-ACK or ACK-NAK, if it is one
    pub fn decode(frame: &Frame) -> Option<Self> {
        if frame.class != CLASS_ACK || frame.payload.len() != 2 {
            return None;
        }

        let acknowledged = match frame.id {
            ID_ACK_ACK => true,
            ID_ACK_NAK => false,
            _ => return None,
        };

        Some(Self {
            acknowledged,
            class: frame.payload[0],
            id: frame.payload[1],
        })
    }

    pub fn matches(&self, class: u8, id: u8) -> bool {
        self.class == class && self.id == id
    }

    #[cfg(test)]
    pub fn to_frame(self) -> Frame {
        let id = if self.acknowledged {
            ID_ACK_ACK
        } else {
            ID_ACK_NAK
        };
        Frame::new(CLASS_ACK, id, vec![self.class, self.id])
    }
}
