//! Error types for frame decoding.
//!
//! None of these are fatal. The public decoders log them and turn them into
//! `ProtocolVariant::Unrecognized` or `None`, since garbled frames from the
//! device are expected during normal operation.

use crate::frame::MAX_FRAME_LEN;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("frame too short ({0} bytes)")]
    TooShort(usize),

    #[error("frame longer than {MAX_FRAME_LEN} bytes ({0} bytes)")]
    TooLong(usize),

    #[error("SysEx frame is missing its 0xF7 terminator")]
    MissingTerminator,

    #[error("SysEx frame does not carry the vendor header")]
    NotVendor,

    #[error("unrecognized status byte {0:#04x}")]
    UnknownStatus(u8),

    #[error("MIDI parse error: {0}")]
    Midi(#[from] midly::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
