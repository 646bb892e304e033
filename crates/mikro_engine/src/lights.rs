use crate::controls::{BUTTON_COUNT, Buttons, Encoders, MAX_ENCODERS, PAD_COUNT};
use crate::sysex::CommandCode;
use num_derive::FromPrimitive;

/// LED colours understood by the device; 0 switches the LED off.
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PadColors {
    #[default]
    Off = 0,
    Red = 1,
    Orange = 2,
    LightOrange = 3,
    WarmYellow = 4,
    Yellow = 5,
    Lime = 6,
    Green = 7,
    Mint = 8,
    Cyan = 9,
    Turquoise = 10,
    Blue = 11,
    Plum = 12,
    Violet = 13,
    Purple = 14,
    Magenta = 15,
    Fuchsia = 16,
    White = 17,
}

impl PadColors {
    /// Codes above 17 clamp to white.
    pub fn from_code(code: u8) -> Self {
        num::FromPrimitive::from_u8(code.min(PadColors::White as u8)).unwrap_or_default()
    }

    /// Maps a MIDI velocity (0-127) to a colour in bands of 7.
    pub fn from_velocity(velocity: u8) -> Self {
        match velocity {
            0 => PadColors::Off,
            v => Self::from_code((v - 1) / 7 + 1),
        }
    }

    /// Lowest velocity that [`PadColors::from_velocity`] maps back to this colour.
    pub fn velocity(self) -> u8 {
        match self {
            PadColors::Off => 0,
            c => (c as u8 - 1) * 7 + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedTarget {
    Pad = 0,
    Button = 1,
}

impl LedTarget {
    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(LedTarget::Pad),
            1 => Some(LedTarget::Button),
            _ => None,
        }
    }

    fn max_index(self) -> u8 {
        match self {
            LedTarget::Pad => PAD_COUNT as u8 - 1,
            LedTarget::Button => BUTTON_COUNT as u8 - 1,
        }
    }
}

/// An outgoing LED instruction, consumed by the command encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedCommand {
    pub target: LedTarget,
    pub index: u8,
    pub color: PadColors,
    pub intensity: u8,
}

impl LedCommand {
    pub fn pad(index: u8, color: PadColors, intensity: u8) -> Self {
        Self {
            target: LedTarget::Pad,
            index,
            color,
            intensity,
        }
    }

    pub fn button(button: Buttons, color: PadColors, intensity: u8) -> Self {
        Self {
            target: LedTarget::Button,
            index: button.id(),
            color,
            intensity,
        }
    }

    /// Index and intensity clamped to what the wire format can carry.
    pub fn clamped(self) -> Self {
        Self {
            index: self.index.min(self.target.max_index()),
            intensity: self.intensity.min(0x7f),
            ..self
        }
    }

    /// Parses the payload of a decoded LED SysEx (`<target> <index> <color> <intensity>`).
    pub fn from_sysex(command: u8, payload: &[u8]) -> Option<Self> {
        if command != CommandCode::LedControl as u8 {
            return None;
        }
        match *payload {
            [target, index, color, intensity, ..] => Some(Self {
                target: LedTarget::from_code(target)?,
                index,
                color: PadColors::from_code(color),
                intensity,
            }),
            _ => None,
        }
    }
}

/// Last commanded state of one pad or button LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedState {
    pub color: PadColors,
    pub intensity: u8,
}

impl LedState {
    pub const OFF: LedState = LedState {
        color: PadColors::Off,
        intensity: 0,
    };

    pub fn new(color: PadColors, intensity: u8) -> Self {
        Self {
            color,
            intensity: intensity.min(0x7f),
        }
    }

    pub fn is_lit(&self) -> bool {
        self.color != PadColors::Off && self.intensity > 0
    }
}

/// In-memory mirror of every LED on the device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lights {
    pads: [LedState; PAD_COUNT],
    buttons: [LedState; BUTTON_COUNT],
    encoders: [u8; MAX_ENCODERS],
}

impl Lights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when `idx` is not a pad.
    pub fn set_pad(&mut self, idx: usize, state: LedState) -> bool {
        match self.pads.get_mut(idx) {
            Some(slot) => {
                *slot = state;
                true
            }
            None => false,
        }
    }

    pub fn get_pad(&self, idx: usize) -> Option<LedState> {
        self.pads.get(idx).copied()
    }

    pub fn set_all_pads(&mut self, state: LedState) {
        self.pads.fill(state);
    }

    pub fn set_button(&mut self, button: Buttons, state: LedState) {
        self.buttons[button as usize] = state;
    }

    pub fn get_button(&self, button: Buttons) -> LedState {
        self.buttons[button as usize]
    }

    pub fn set_encoder(&mut self, encoder: Encoders, value: u8) {
        self.encoders[encoder as usize] = value.min(0x7f);
    }

    pub fn get_encoder(&self, encoder: Encoders) -> u8 {
        self.encoders[encoder as usize]
    }

    pub fn pads(&self) -> &[LedState; PAD_COUNT] {
        &self.pads
    }

    pub fn buttons(&self) -> &[LedState; BUTTON_COUNT] {
        &self.buttons
    }

    pub fn encoders(&self) -> &[u8; MAX_ENCODERS] {
        &self.encoders
    }

    /// LED commands for every pad and button whose state differs from `previous`.
    ///
    /// Encoder LEDs have no wire representation and are not included.
    pub fn changes_since(&self, previous: &Lights) -> Vec<LedCommand> {
        let pads = self
            .pads
            .iter()
            .zip(previous.pads.iter())
            .enumerate()
            .filter(|(_, (now, before))| now != before)
            .map(|(i, (now, _))| LedCommand::pad(i as u8, now.color, now.intensity));
        let buttons = self
            .buttons
            .iter()
            .zip(previous.buttons.iter())
            .enumerate()
            .filter(|(_, (now, before))| now != before)
            .map(|(i, (now, _))| LedCommand {
                target: LedTarget::Button,
                index: i as u8,
                color: now.color,
                intensity: now.intensity,
            });
        pads.chain(buttons).collect()
    }
}
