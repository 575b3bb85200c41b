// UBX protocol codec
//
// Framing, checksum and the handful of messages needed to read and change the
// dynamic platform model of u-blox 8 / M8 receivers.
//
// Reference: u-blox 8 / u-blox M8 Receiver Description (UBX-13003221)

mod checksum;
mod decoder;
mod error;
mod frame;
pub mod messages;

pub use decoder::FrameDecoder;
pub use error::{FrameError, MessageError};
pub use frame::Frame;
