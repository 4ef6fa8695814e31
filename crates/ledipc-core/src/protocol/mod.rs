//! Protocol module containing the frame codec and the message records.

pub mod codec;
pub mod messages;

pub use codec::{decode_frame, encode_frame, ProtocolError};
pub use messages::*;
