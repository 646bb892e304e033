//! Protocol translation core for the Maschine Mikro controller.
//!
//! Raw frames from the device go through [`frame::classify`], the MIDI or
//! vendor SysEx decoder and the [`mapper`] before landing in a
//! [`state::ControllerState`]. [`command`] turns logical commands back into
//! frames. [`engine::Engine`] wires all of it into one session.

pub mod command;
pub mod controls;
pub mod engine;
pub mod error;
pub mod frame;
pub mod lights;
pub mod mapper;
pub mod midi;
pub mod state;
pub mod sysex;

pub use controls::{Buttons, ControllerEvent, Encoders, Layout};
pub use engine::{Engine, EngineOptions, Feedback, Notification};
pub use error::FrameError;
pub use frame::{ProtocolVariant, classify};
pub use lights::{LedCommand, LedState, LedTarget, Lights, PadColors};
pub use mapper::map;
pub use midi::{DecodedMessage, decode_midi};
pub use state::{ControllerState, Mode, SwingResolution};
pub use sysex::decode_sysex;
