//! Outgoing frame encoding
//!
//! Every function here is pure. Data bytes are clamped to 7 bits and
//! channels to 0-15; nothing is ever rejected.

use crate::controls::ControllerEvent;
use crate::engine::Feedback;
use crate::lights::{LedCommand, LedTarget, PadColors};
use crate::mapper::{BUTTON_CC_BASE, ENCODER_CC_BASE, ENCODER_CC_COUNT, PAD_NOTE_BASE};
use crate::state::Mode;
use crate::sysex::{CommandCode, SYSEX_END, VENDOR_HEADER};

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xb0;
const PROGRAM_CHANGE: u8 = 0xc0;
const PITCH_BEND: u8 = 0xe0;

fn data(value: u8) -> u8 {
    value.min(0x7f)
}

fn status(kind: u8, channel: u8) -> u8 {
    kind | channel.min(0x0f)
}

/// Note On, or Note Off when `velocity` is 0.
pub fn encode_note(note: u8, velocity: u8, channel: u8) -> Vec<u8> {
    let kind = if velocity > 0 { NOTE_ON } else { NOTE_OFF };
    vec![status(kind, channel), data(note), data(velocity)]
}

pub fn encode_cc(controller: u8, value: u8, channel: u8) -> Vec<u8> {
    vec![status(CONTROL_CHANGE, channel), data(controller), data(value)]
}

pub fn encode_program_change(program: u8, channel: u8) -> Vec<u8> {
    vec![status(PROGRAM_CHANGE, channel), data(program)]
}

/// `value14` is clamped to 14 bits, 8192 is centre.
pub fn encode_pitch_bend(value14: u16, channel: u8) -> Vec<u8> {
    let value = value14.min(0x3fff);
    vec![
        status(PITCH_BEND, channel),
        (value & 0x7f) as u8,
        (value >> 7) as u8,
    ]
}

/// Wrap `payload` in the vendor header and terminator.
pub fn encode_sysex(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(VENDOR_HEADER.len() + payload.len() + 1);
    frame.extend_from_slice(&VENDOR_HEADER);
    frame.extend(payload.iter().copied().map(data));
    frame.push(SYSEX_END);
    frame
}

/// `F0 00 20 3C 02 00 <target> <index> <color> <intensity> F7`
pub fn encode_led(cmd: &LedCommand) -> Vec<u8> {
    let cmd = cmd.clamped();
    encode_sysex(&[
        CommandCode::LedControl as u8,
        cmd.target as u8,
        cmd.index,
        cmd.color as u8,
        cmd.intensity,
    ])
}

/// LED feedback in the selected protocol.
///
/// Over standard MIDI a pad LED becomes a note whose velocity picks the
/// colour band, and a button LED becomes a CC carrying its intensity.
pub fn encode_led_for(feedback: Feedback, cmd: &LedCommand) -> Vec<u8> {
    let cmd = cmd.clamped();
    match feedback {
        Feedback::SysEx => encode_led(&cmd),
        Feedback::Midi => match cmd.target {
            LedTarget::Pad => encode_note(PAD_NOTE_BASE + cmd.index, lit_velocity(&cmd), 0),
            LedTarget::Button => {
                let value = if cmd.color == PadColors::Off { 0 } else { cmd.intensity };
                encode_cc(BUTTON_CC_BASE + cmd.index, value, 0)
            }
        },
    }
}

fn lit_velocity(cmd: &LedCommand) -> u8 {
    if cmd.intensity == 0 {
        0
    } else {
        cmd.color.velocity()
    }
}

/// Device-config SysEx switching the controller's operating mode.
///
/// `F0 00 20 3C 02 02 <mode> 00 F7`; the trailing zero keeps the frame at the
/// vendor minimum so it decodes like any device report.
pub fn encode_mode(mode: Mode) -> Vec<u8> {
    encode_sysex(&[CommandCode::DeviceConfig as u8, mode as u8, 0x00])
}

/// The frame a device would send for `event`; the inverse of the mapper.
///
/// Encoders beyond the standard CC window have no MIDI form and yield `None`.
pub fn encode_event(feedback: Feedback, event: &ControllerEvent) -> Option<Vec<u8>> {
    match feedback {
        Feedback::Midi => encode_event_midi(event),
        Feedback::SysEx => Some(encode_event_sysex(event)),
    }
}

fn encode_event_midi(event: &ControllerEvent) -> Option<Vec<u8>> {
    Some(match *event {
        ControllerEvent::PadPressed { index, velocity } => {
            encode_note(PAD_NOTE_BASE.saturating_add(index), velocity.max(1), 0)
        }
        ControllerEvent::PadReleased { index } => {
            encode_note(PAD_NOTE_BASE.saturating_add(index), 0, 0)
        }
        ControllerEvent::ButtonPressed { id, value } => {
            encode_cc(BUTTON_CC_BASE + id.id(), value.max(1), 0)
        }
        ControllerEvent::ButtonReleased { id } => encode_cc(BUTTON_CC_BASE + id.id(), 0, 0),
        ControllerEvent::EncoderTurned { id, value } => {
            if id.id() >= ENCODER_CC_COUNT {
                return None;
            }
            encode_cc(ENCODER_CC_BASE + id.id(), value, 0)
        }
    })
}

fn encode_event_sysex(event: &ControllerEvent) -> Vec<u8> {
    let (command, index, value) = match *event {
        ControllerEvent::PadPressed { index, velocity } => {
            (CommandCode::PadInput, index, velocity.max(1))
        }
        ControllerEvent::PadReleased { index } => (CommandCode::PadInput, index, 0),
        ControllerEvent::ButtonPressed { id, value } => {
            (CommandCode::ButtonInput, id.id(), value.max(1))
        }
        ControllerEvent::ButtonReleased { id } => (CommandCode::ButtonInput, id.id(), 0),
        ControllerEvent::EncoderTurned { id, value } => (CommandCode::EncoderInput, id.id(), value),
    };
    encode_sysex(&[command as u8, index, value])
}

/// Relative encoder value for `steps` detents, centred on 64.
pub fn encoder_value(steps: i8) -> u8 {
    (64i16 + steps as i16).clamp(0, 127) as u8
}
