//! Decoded message to controller event mapping
//!
//! Both protocols converge here: a pad hit reported as a Note On and one
//! reported as a vendor pad-input SysEx produce the same `ControllerEvent`.

use crate::controls::{ControllerEvent, Layout};
use crate::midi::DecodedMessage;
use crate::sysex::{ControlReport, VendorCommand};
use tracing::debug;

/// First pad note (C2); notes 36-51 are pads 0-15.
pub const PAD_NOTE_BASE: u8 = 36;
/// CC 16-23 are buttons 0-7.
pub const BUTTON_CC_BASE: u8 = 16;
/// CC 24-25 are encoders 0-1.
pub const ENCODER_CC_BASE: u8 = 24;
pub const ENCODER_CC_COUNT: u8 = 2;

const DEFAULT_PRESS_VALUE: u8 = 127;
const DEFAULT_ENCODER_VALUE: u8 = 64;

/// Map a message using the standard two-encoder layout.
pub fn map(message: &DecodedMessage) -> Option<ControllerEvent> {
    map_with(message, &Layout::default())
}

/// Map a message, dropping anything outside the note/CC windows or the layout.
pub fn map_with(message: &DecodedMessage, layout: &Layout) -> Option<ControllerEvent> {
    match *message {
        DecodedMessage::NoteOn { note, velocity, .. } => {
            let index = note.checked_sub(PAD_NOTE_BASE)?;
            pad_event(layout, index, velocity)
        }
        DecodedMessage::NoteOff { note, .. } => {
            let index = note.checked_sub(PAD_NOTE_BASE)?;
            pad_event(layout, index, 0)
        }
        DecodedMessage::ControlChange { controller, value, .. } => {
            match controller.checked_sub(BUTTON_CC_BASE)? {
                id @ 0..=7 => button_event(layout, id, value),
                offset => {
                    let id = offset - (ENCODER_CC_BASE - BUTTON_CC_BASE);
                    if id < ENCODER_CC_COUNT {
                        encoder_event(layout, id, value)
                    } else {
                        None
                    }
                }
            }
        }
        DecodedMessage::SysExCommand { command, ref payload } => {
            match VendorCommand::parse(command, payload) {
                VendorCommand::PadInput(ControlReport { index, value }) => {
                    pad_event(layout, index, value.unwrap_or(DEFAULT_PRESS_VALUE))
                }
                VendorCommand::ButtonInput(report) => {
                    button_event(layout, report.index, report.value_or(DEFAULT_PRESS_VALUE))
                }
                VendorCommand::EncoderInput(report) => {
                    encoder_event(layout, report.index, report.value_or(DEFAULT_ENCODER_VALUE))
                }
                _ => None,
            }
        }
        DecodedMessage::ProgramChange { .. } | DecodedMessage::PitchBend { .. } => None,
    }
}

fn pad_event(layout: &Layout, index: u8, velocity: u8) -> Option<ControllerEvent> {
    let Some(index) = layout.pad(index) else {
        debug!("Dropping event for pad {} outside the layout", index);
        return None;
    };
    Some(match velocity.min(0x7f) {
        0 => ControllerEvent::PadReleased { index },
        velocity => ControllerEvent::PadPressed { index, velocity },
    })
}

fn button_event(layout: &Layout, id: u8, value: u8) -> Option<ControllerEvent> {
    let Some(id) = layout.button(id) else {
        debug!("Dropping event for button {} outside the layout", id);
        return None;
    };
    Some(match value.min(0x7f) {
        0 => ControllerEvent::ButtonReleased { id },
        value => ControllerEvent::ButtonPressed { id, value },
    })
}

fn encoder_event(layout: &Layout, id: u8, value: u8) -> Option<ControllerEvent> {
    let Some(id) = layout.encoder(id) else {
        debug!("Dropping event for encoder {} outside the layout", id);
        return None;
    };
    Some(ControllerEvent::EncoderTurned {
        id,
        value: value.min(0x7f),
    })
}
