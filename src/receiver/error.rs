// Error types for receiver sessions

use thiserror::Error;

use super::DynamicModel;
use crate::ubx::messages::{message_name, ProtocolVersion};
use crate::ubx::{FrameError, MessageError};

fn name(class: &u8, id: &u8) -> String {
    message_name(*class, *id)
}

pub type Result<T> = std::result::Result<T, ReceiverError>;

#[derive(Error, Debug)]
pub enum ReceiverError {
    #[error("serial I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("receiver closed the connection")]
    Closed,

    #[error("no response to {} after {attempts} attempt(s)", name(.class, .id))]
    Timeout { class: u8, id: u8, attempts: u32 },

    #[error("receiver rejected {} (ACK-NAK)", name(.class, .id))]
    Nak { class: u8, id: u8 },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("malformed response: {0}")]
    Message(#[from] MessageError),

    #[error("receiver reports unknown dynamic model code {0}")]
    UnknownModel(u8),

    #[error("{model} requires protocol version {required} or newer, receiver has {actual}")]
    UnsupportedModel {
        model: DynamicModel,
        required: ProtocolVersion,
        actual: ProtocolVersion,
    },

    #[error("receiver reports {actual} after setting {expected}")]
    VerifyFailed {
        expected: DynamicModel,
        actual: DynamicModel,
    },
}
