//! Standard MIDI decoding
//!
//! Splits a frame into channel messages. Each message must carry its own
//! status byte; running status is not used by the device.

use crate::error::Result;
use crate::frame::format_hex;
use crate::sysex::{SYSEX_END, SYSEX_START};
use midly::MidiMessage;
use midly::live::LiveEvent;
use std::fmt;
use tracing::{debug, trace};

/// A decoded message, from either protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedMessage {
    NoteOn { note: u8, velocity: u8, channel: u8 },
    NoteOff { note: u8, velocity: u8, channel: u8 },
    ControlChange { controller: u8, value: u8, channel: u8 },
    ProgramChange { program: u8, channel: u8 },
    /// 14-bit value, 8192 is centre.
    PitchBend { value14: u16, channel: u8 },
    /// Vendor SysEx with the header and terminator stripped.
    SysExCommand { command: u8, payload: Vec<u8> },
}

impl fmt::Display for DecodedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DecodedMessage::NoteOn { note, velocity, channel } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            DecodedMessage::NoteOff { note, velocity, channel } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            DecodedMessage::ControlChange { controller, value, channel } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, controller, value)
            }
            DecodedMessage::ProgramChange { program, channel } => {
                write!(f, "ProgramChange ch:{} p:{}", channel + 1, program)
            }
            DecodedMessage::PitchBend { value14, channel } => {
                write!(f, "PitchBend ch:{} v:{}", channel + 1, value14)
            }
            DecodedMessage::SysExCommand { command, ref payload } => {
                write!(f, "SysEx cmd:{:02X} [{}]", command, format_hex(payload))
            }
        }
    }
}

/// Number of data bytes following a channel status byte.
fn data_len(status: u8) -> Option<usize> {
    match status & 0xf0 {
        0x80 | 0x90 | 0xa0 | 0xb0 | 0xe0 => Some(2),
        0xc0 | 0xd0 => Some(1),
        _ => None,
    }
}

/// Decode every complete channel message in `bytes`, left to right.
///
/// A message is complete when its last data byte lies inside the buffer
/// (`end <= bytes.len()`); a trailing partial message is discarded. Stray
/// data bytes are skipped, and a status byte found where a data byte was
/// expected starts a new message.
pub fn decode_midi(bytes: &[u8]) -> Vec<DecodedMessage> {
    let mut messages = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let status = bytes[i];

        if status & 0x80 == 0 {
            trace!("Skipping stray data byte {:#04x}", status);
            i += 1;
            continue;
        }

        if status == SYSEX_START {
            // Foreign SysEx carries nothing the controller understands
            i = match bytes[i..].iter().position(|&b| b == SYSEX_END) {
                Some(end) => i + end + 1,
                None => bytes.len(),
            };
            continue;
        }

        let Some(len) = data_len(status) else {
            i += 1;
            continue;
        };

        let end = i + 1 + len;
        if end > bytes.len() {
            debug!("Discarding truncated message [{}]", format_hex(&bytes[i..]));
            break;
        }

        if let Some(offset) = bytes[i + 1..end].iter().position(|b| b & 0x80 != 0) {
            debug!("Discarding interrupted message [{}]", format_hex(&bytes[i..end]));
            i += 1 + offset;
            continue;
        }

        match parse_channel_message(&bytes[i..end]) {
            Ok(Some(message)) => messages.push(message),
            Ok(None) => {}
            Err(err) => debug!("Dropping [{}]: {}", format_hex(&bytes[i..end]), err),
        }
        i = end;
    }

    messages
}

fn parse_channel_message(raw: &[u8]) -> Result<Option<DecodedMessage>> {
    let LiveEvent::Midi { channel, message } = LiveEvent::parse(raw)? else {
        return Ok(None);
    };
    let channel = channel.as_int();

    let decoded = match message {
        MidiMessage::NoteOn { key, vel } => DecodedMessage::NoteOn {
            note: key.as_int(),
            velocity: vel.as_int(),
            channel,
        },
        MidiMessage::NoteOff { key, vel } => DecodedMessage::NoteOff {
            note: key.as_int(),
            velocity: vel.as_int(),
            channel,
        },
        MidiMessage::Controller { controller, value } => DecodedMessage::ControlChange {
            controller: controller.as_int(),
            value: value.as_int(),
            channel,
        },
        MidiMessage::ProgramChange { program } => DecodedMessage::ProgramChange {
            program: program.as_int(),
            channel,
        },
        MidiMessage::PitchBend { bend } => DecodedMessage::PitchBend {
            value14: bend.0.as_int(),
            channel,
        },
        // Pressure messages have no controller meaning
        MidiMessage::Aftertouch { .. } | MidiMessage::ChannelAftertouch { .. } => return Ok(None),
    };

    Ok(Some(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on() {
        assert_eq!(
            decode_midi(&[0x90, 0x30, 0x64]),
            vec![DecodedMessage::NoteOn {
                note: 48,
                velocity: 100,
                channel: 0
            }]
        );
    }

    #[test]
    fn test_note_on_velocity_zero_is_kept() {
        assert_eq!(
            decode_midi(&[0x92, 36, 0]),
            vec![DecodedMessage::NoteOn {
                note: 36,
                velocity: 0,
                channel: 2
            }]
        );
    }

    #[test]
    fn test_program_change_and_pitch_bend() {
        assert_eq!(
            decode_midi(&[0xc1, 5, 0xe0, 0x00, 0x40]),
            vec![
                DecodedMessage::ProgramChange {
                    program: 5,
                    channel: 1
                },
                DecodedMessage::PitchBend {
                    value14: 8192,
                    channel: 0
                },
            ]
        );
    }

    #[test]
    fn test_final_message_is_not_dropped() {
        let frame = [0xb0, 16, 127, 0xb0, 17, 0];
        assert_eq!(decode_midi(&frame).len(), 2);
    }

    #[test]
    fn test_truncated_tail_is_discarded() {
        let frame = [0x90, 36, 100, 0x80, 36];
        assert_eq!(
            decode_midi(&frame),
            vec![DecodedMessage::NoteOn {
                note: 36,
                velocity: 100,
                channel: 0
            }]
        );
    }

    #[test]
    fn test_running_status_is_not_supported() {
        // The second pair has no status byte of its own
        let frame = [0x90, 36, 100, 37, 90];
        assert_eq!(decode_midi(&frame).len(), 1);
    }

    #[test]
    fn test_status_inside_data_restarts() {
        let frame = [0x90, 36, 0xb0, 16, 127];
        assert_eq!(
            decode_midi(&frame),
            vec![DecodedMessage::ControlChange {
                controller: 16,
                value: 127,
                channel: 0
            }]
        );
    }

    #[test]
    fn test_pressure_and_foreign_sysex_are_skipped() {
        let frame = [0xa0, 36, 10, 0xf0, 0x7e, 0x01, 0xf7, 0xd0, 20, 0xb0, 24, 65];
        assert_eq!(
            decode_midi(&frame),
            vec![DecodedMessage::ControlChange {
                controller: 24,
                value: 65,
                channel: 0
            }]
        );
    }

    #[test]
    fn test_display() {
        let msg = DecodedMessage::ControlChange {
            controller: 16,
            value: 127,
            channel: 0,
        };
        assert_eq!(msg.to_string(), "CC ch:1 cc:16 v:127");
    }
}
