//! Vendor SysEx decoding
//!
//! Frames look like `F0 00 20 3C 02 <command> <payload...> F7`. The command
//! byte selects LED control (outgoing) or one of the input reports the
//! device sends: status, config, pad, button and encoder.

use crate::error::{FrameError, Result};
use crate::frame::{MAX_FRAME_LEN, format_hex};
use crate::midi::DecodedMessage;
use num_derive::FromPrimitive;
use tracing::debug;

pub const SYSEX_START: u8 = 0xf0;
pub const SYSEX_END: u8 = 0xf7;
/// Manufacturer id
pub const VENDOR_ID: [u8; 3] = [0x00, 0x20, 0x3c];
/// Device id of the Maschine Mikro
pub const DEVICE_ID: u8 = 0x02;
pub const VENDOR_HEADER: [u8; 5] = [SYSEX_START, 0x00, 0x20, 0x3c, DEVICE_ID];
/// Bytes required after the header, terminator included.
const MIN_BODY_LEN: usize = 4;

#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    LedControl = 0x00,
    DeviceStatus = 0x01,
    DeviceConfig = 0x02,
    PadInput = 0x03,
    ButtonInput = 0x04,
    EncoderInput = 0x05,
}

impl CommandCode {
    pub fn from_code(code: u8) -> Option<Self> {
        num::FromPrimitive::from_u8(code)
    }
}

/// Decode a vendor frame into `DecodedMessage::SysExCommand`.
///
/// Unknown command codes still decode; only malformed frames yield `None`.
pub fn decode_sysex(bytes: &[u8]) -> Option<DecodedMessage> {
    match split_frame(bytes) {
        Ok((command, payload)) => Some(DecodedMessage::SysExCommand {
            command,
            payload: payload.to_vec(),
        }),
        Err(err) => {
            debug!("Dropping SysEx [{}]: {}", format_hex(bytes), err);
            None
        }
    }
}

fn split_frame(bytes: &[u8]) -> Result<(u8, &[u8])> {
    if bytes.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLong(bytes.len()));
    }
    if bytes.len() < VENDOR_HEADER.len() + MIN_BODY_LEN {
        return Err(FrameError::TooShort(bytes.len()));
    }
    if !bytes.starts_with(&VENDOR_HEADER) {
        return Err(FrameError::NotVendor);
    }
    let Some((&SYSEX_END, framed)) = bytes.split_last() else {
        return Err(FrameError::MissingTerminator);
    };
    let body = &framed[VENDOR_HEADER.len()..];
    match body.split_first() {
        Some((&command, payload)) => Ok((command, payload)),
        None => Err(FrameError::TooShort(bytes.len())),
    }
}

/// Index and optional value carried by pad, button and encoder reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlReport {
    pub index: u8,
    pub value: Option<u8>,
}

impl ControlReport {
    fn parse(payload: &[u8]) -> Option<Self> {
        let (&index, rest) = payload.split_first()?;
        Some(Self {
            index,
            value: rest.first().copied(),
        })
    }

    /// The reported value, or `default` when the device left it out.
    pub fn value_or(&self, default: u8) -> u8 {
        self.value.unwrap_or(default).min(0x7f)
    }
}

/// The inner meaning of a vendor command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorCommand<'a> {
    LedControl(&'a [u8]),
    DeviceStatus(&'a [u8]),
    DeviceConfig(&'a [u8]),
    PadInput(ControlReport),
    ButtonInput(ControlReport),
    EncoderInput(ControlReport),
    /// An input report without its index byte.
    Truncated(CommandCode),
    Unknown { command: u8, payload: &'a [u8] },
}

impl<'a> VendorCommand<'a> {
    pub fn parse(command: u8, payload: &'a [u8]) -> Self {
        let Some(code) = CommandCode::from_code(command) else {
            return VendorCommand::Unknown { command, payload };
        };
        let report = || ControlReport::parse(payload).ok_or(VendorCommand::Truncated(code));
        let parsed = match code {
            CommandCode::LedControl => Ok(VendorCommand::LedControl(payload)),
            CommandCode::DeviceStatus => Ok(VendorCommand::DeviceStatus(payload)),
            CommandCode::DeviceConfig => Ok(VendorCommand::DeviceConfig(payload)),
            CommandCode::PadInput => report().map(VendorCommand::PadInput),
            CommandCode::ButtonInput => report().map(VendorCommand::ButtonInput),
            CommandCode::EncoderInput => report().map(VendorCommand::EncoderInput),
        };
        parsed.unwrap_or_else(|truncated| truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_status_frame() {
        let frame = [0xf0, 0x00, 0x20, 0x3c, 0x02, 0x01, 0x10, 0x00, 0xf7];
        assert_eq!(
            decode_sysex(&frame),
            Some(DecodedMessage::SysExCommand {
                command: 0x01,
                payload: vec![0x10, 0x00],
            })
        );
    }

    #[test]
    fn test_unknown_command_is_surfaced() {
        let frame = [0xf0, 0x00, 0x20, 0x3c, 0x02, 0x42, 0x01, 0x02, 0xf7];
        let Some(DecodedMessage::SysExCommand { command, payload }) = decode_sysex(&frame) else {
            panic!("expected a SysEx command");
        };
        assert_eq!(command, 0x42);
        assert_eq!(
            VendorCommand::parse(command, &payload),
            VendorCommand::Unknown {
                command: 0x42,
                payload: &[0x01, 0x02]
            }
        );
    }

    #[test]
    fn test_malformed_frames() {
        // too short: header plus three bytes
        assert!(decode_sysex(&[0xf0, 0x00, 0x20, 0x3c, 0x02, 0x03, 0x01, 0xf7]).is_none());
        // missing terminator
        assert!(decode_sysex(&[0xf0, 0x00, 0x20, 0x3c, 0x02, 0x03, 0x01, 0x10, 0x7f]).is_none());
        // wrong device id
        assert!(decode_sysex(&[0xf0, 0x00, 0x20, 0x3c, 0x05, 0x03, 0x01, 0x10, 0xf7]).is_none());
    }

    #[test]
    fn test_control_reports() {
        assert_eq!(
            VendorCommand::parse(0x03, &[5, 90]),
            VendorCommand::PadInput(ControlReport {
                index: 5,
                value: Some(90)
            })
        );
        let VendorCommand::EncoderInput(report) = VendorCommand::parse(0x05, &[1]) else {
            panic!("expected an encoder report");
        };
        assert_eq!(report.value_or(64), 64);
        assert_eq!(
            VendorCommand::parse(0x04, &[]),
            VendorCommand::Truncated(CommandCode::ButtonInput)
        );
    }
}
