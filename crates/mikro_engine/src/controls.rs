use num_derive::FromPrimitive;

pub const PAD_COUNT: usize = 16;
pub const BUTTON_COUNT: usize = 8;
pub const MIN_ENCODERS: u8 = 2;
pub const MAX_ENCODERS: usize = 4;

/// Physical buttons, numbered the way the device reports them.
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Buttons {
    Shift = 0,
    Select = 1,
    Solo = 2,
    Mute = 3,
    Play = 4,
    Record = 5,
    Erase = 6,
    Automation = 7,
}

impl Buttons {
    pub fn from_id(id: u8) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// Rotary encoders. Only the first two exist on the standard layout.
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoders {
    Tempo = 0,
    Swing = 1,
    Aux2 = 2,
    Aux3 = 3,
}

impl Encoders {
    pub fn from_id(id: u8) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// Direction of one relative encoder detent: values above 64 turn clockwise.
pub fn relative_direction(value: u8) -> i8 {
    if value > 64 { 1 } else { -1 }
}

/// The fixed control layout of a device variant.
///
/// Every pad, button and encoder id is checked against it before an event
/// leaves the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    encoders: u8,
}

impl Layout {
    /// Encoder counts outside 2..=4 are clamped.
    pub fn new(encoders: u8) -> Self {
        Self {
            encoders: encoders.clamp(MIN_ENCODERS, MAX_ENCODERS as u8),
        }
    }

    pub fn encoder_count(&self) -> usize {
        self.encoders as usize
    }

    pub fn pad(&self, index: u8) -> Option<u8> {
        ((index as usize) < PAD_COUNT).then_some(index)
    }

    pub fn button(&self, id: u8) -> Option<Buttons> {
        Buttons::from_id(id)
    }

    pub fn encoder(&self, id: u8) -> Option<Encoders> {
        if id >= self.encoders {
            return None;
        }
        Encoders::from_id(id)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(MIN_ENCODERS)
    }
}

/// A normalized controller event, identical for both wire protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    PadPressed { index: u8, velocity: u8 },
    PadReleased { index: u8 },
    ButtonPressed { id: Buttons, value: u8 },
    ButtonReleased { id: Buttons },
    /// `value` is the raw relative value; see [`relative_direction`].
    EncoderTurned { id: Encoders, value: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_clamps_encoder_count() {
        assert_eq!(Layout::new(0).encoder_count(), 2);
        assert_eq!(Layout::new(3).encoder_count(), 3);
        assert_eq!(Layout::new(9).encoder_count(), 4);
    }

    #[test]
    fn test_layout_rejects_out_of_range_ids() {
        let layout = Layout::default();
        assert_eq!(layout.pad(15), Some(15));
        assert_eq!(layout.pad(16), None);
        assert_eq!(layout.button(7), Some(Buttons::Automation));
        assert_eq!(layout.button(8), None);
        assert_eq!(layout.encoder(1), Some(Encoders::Swing));
        assert_eq!(layout.encoder(2), None);
        assert_eq!(Layout::new(4).encoder(3), Some(Encoders::Aux3));
    }

    #[test]
    fn test_relative_direction() {
        assert_eq!(relative_direction(65), 1);
        assert_eq!(relative_direction(127), 1);
        assert_eq!(relative_direction(64), -1);
        assert_eq!(relative_direction(0), -1);
    }
}
