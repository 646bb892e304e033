//! Frame classification
//!
//! Tags a raw transfer buffer as standard MIDI, vendor SysEx, or garbage
//! before any decoding happens.

use crate::error::{FrameError, Result};
use crate::sysex::{SYSEX_END, SYSEX_START, VENDOR_ID};
use tracing::debug;

/// Largest buffer a single USB transfer delivers.
pub const MAX_FRAME_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVariant {
    StandardMidi,
    VendorSysEx,
    Unrecognized,
}

/// Classify a raw frame. Never fails: malformed frames come back as `Unrecognized`.
pub fn classify(bytes: &[u8]) -> ProtocolVariant {
    match try_classify(bytes) {
        Ok(variant) => variant,
        Err(err) => {
            debug!("Dropping frame [{}]: {}", format_hex(bytes), err);
            ProtocolVariant::Unrecognized
        }
    }
}

pub(crate) fn try_classify(bytes: &[u8]) -> Result<ProtocolVariant> {
    if bytes.len() < 2 {
        return Err(FrameError::TooShort(bytes.len()));
    }
    if bytes.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLong(bytes.len()));
    }

    let status = bytes[0];
    if status == SYSEX_START {
        if bytes[bytes.len() - 1] != SYSEX_END {
            return Err(FrameError::MissingTerminator);
        }
        // Vendor id sits right after the 0xF0 start byte
        return Ok(if bytes[1..].starts_with(&VENDOR_ID) {
            ProtocolVariant::VendorSysEx
        } else {
            ProtocolVariant::StandardMidi
        });
    }

    match status & 0xf0 {
        0x80..=0xe0 => Ok(ProtocolVariant::StandardMidi),
        _ => Err(FrameError::UnknownStatus(status)),
    }
}

/// Format bytes as hex for log output
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_frames_are_unrecognized() {
        assert_eq!(classify(&[]), ProtocolVariant::Unrecognized);
        assert_eq!(classify(&[0x90]), ProtocolVariant::Unrecognized);
        assert_eq!(classify(&[0xf0]), ProtocolVariant::Unrecognized);
    }

    #[test]
    fn test_channel_messages() {
        assert_eq!(classify(&[0x90, 0x30, 0x64]), ProtocolVariant::StandardMidi);
        assert_eq!(classify(&[0x8f, 0x30, 0x00]), ProtocolVariant::StandardMidi);
        assert_eq!(classify(&[0xb0, 16, 127]), ProtocolVariant::StandardMidi);
        assert_eq!(classify(&[0xc3, 5]), ProtocolVariant::StandardMidi);
        assert_eq!(classify(&[0xe0, 0x00, 0x40]), ProtocolVariant::StandardMidi);
    }

    #[test]
    fn test_data_and_system_bytes_are_unrecognized() {
        assert_eq!(classify(&[0x30, 0x64]), ProtocolVariant::Unrecognized);
        assert_eq!(classify(&[0xf8, 0xf8]), ProtocolVariant::Unrecognized);
        assert_eq!(classify(&[0x74, 0x10, 0x00]), ProtocolVariant::Unrecognized);
    }

    #[test]
    fn test_vendor_sysex() {
        let frame = [0xf0, 0x00, 0x20, 0x3c, 0x02, 0x01, 0x10, 0x00, 0xf7];
        assert_eq!(classify(&frame), ProtocolVariant::VendorSysEx);
    }

    #[test]
    fn test_foreign_sysex_is_standard_midi() {
        let frame = [0xf0, 0x7e, 0x7f, 0x06, 0x01, 0xf7];
        assert_eq!(classify(&frame), ProtocolVariant::StandardMidi);
    }

    #[test]
    fn test_unterminated_sysex_is_dropped() {
        let frame = [0xf0, 0x00, 0x20, 0x3c, 0x02, 0x01, 0x10, 0x00];
        assert_eq!(classify(&frame), ProtocolVariant::Unrecognized);
        assert!(matches!(
            try_classify(&frame),
            Err(FrameError::MissingTerminator)
        ));
    }

    #[test]
    fn test_oversized_frame() {
        let mut frame = vec![0x90; MAX_FRAME_LEN + 1];
        assert_eq!(classify(&frame), ProtocolVariant::Unrecognized);
        frame.truncate(MAX_FRAME_LEN);
        assert_eq!(classify(&frame), ProtocolVariant::StandardMidi);
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0xf0, 0x00, 0x7f]), "F0 00 7F");
    }
}
