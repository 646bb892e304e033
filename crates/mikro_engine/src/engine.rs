//! Session pipeline
//!
//! Ties the classifier, decoders, mapper and state store together for one
//! connected controller. The host feeds raw frames into [`Engine::process`]
//! and drains [`Engine::encode_feedback`] to keep the device LEDs in sync.

use crate::command::encode_led_for;
use crate::controls::{ControllerEvent, Layout, MIN_ENCODERS};
use crate::frame::{ProtocolVariant, classify, format_hex};
use crate::lights::{LedCommand, Lights};
use crate::mapper::map_with;
use crate::midi::{DecodedMessage, decode_midi};
use crate::state::{ControllerState, Mode, SwingResolution};
use crate::sysex::{VendorCommand, decode_sysex};
use serde::Deserialize;
use tracing::{debug, info, trace};

/// Protocol used for LED feedback sent back to the device.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Midi,
    #[default]
    SysEx,
}

impl From<Feedback> for ProtocolVariant {
    fn from(feedback: Feedback) -> Self {
        match feedback {
            Feedback::Midi => ProtocolVariant::StandardMidi,
            Feedback::SysEx => ProtocolVariant::VendorSysEx,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EngineOptions {
    pub encoder_count: u8,
    pub swing_resolution: SwingResolution,
    pub mode: Mode,
    pub feedback: Feedback,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            encoder_count: MIN_ENCODERS,
            swing_resolution: SwingResolution::default(),
            mode: Mode::default(),
            feedback: Feedback::default(),
        }
    }
}

/// What a processed frame meant to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Event(ControllerEvent),
    DeviceStatus(Vec<u8>),
    DeviceConfig(Vec<u8>),
    /// Decoded but without controller meaning (unknown SysEx, program change, ...).
    Unhandled(DecodedMessage),
}

pub struct Engine {
    options: EngineOptions,
    layout: Layout,
    session: Option<ControllerState>,
    /// LED state as last handed out by [`Engine::feedback`].
    sent: Lights,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        let layout = Layout::new(options.encoder_count);
        if layout.encoder_count() != options.encoder_count as usize {
            debug!(
                "Encoder count {} clamped to {}",
                options.encoder_count,
                layout.encoder_count()
            );
        }
        Self {
            options,
            layout,
            session: None,
            sent: Lights::new(),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Start a fresh session, replacing any existing one.
    ///
    /// The LEDs last handed out are kept, so the first [`Engine::feedback`]
    /// of the new session switches off whatever the old one left lit.
    pub fn begin_session(&mut self) {
        info!("Session started ({:?} mode)", self.options.mode);
        self.session = Some(ControllerState::new(
            self.layout,
            self.options.swing_resolution,
            self.options.mode,
        ));
    }

    pub fn end_session(&mut self) {
        if self.session.take().is_some() {
            info!("Session ended");
        }
    }

    pub fn state(&self) -> Option<&ControllerState> {
        self.session.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut ControllerState> {
        self.session.as_mut()
    }

    /// Classify, decode and map one raw frame, applying every event to the session.
    pub fn process(&mut self, frame: &[u8]) -> Vec<Notification> {
        let messages = match classify(frame) {
            ProtocolVariant::StandardMidi => decode_midi(frame),
            ProtocolVariant::VendorSysEx => decode_sysex(frame).into_iter().collect(),
            ProtocolVariant::Unrecognized => return Vec::new(),
        };

        messages
            .into_iter()
            .map(|message| self.dispatch(message))
            .collect()
    }

    fn dispatch(&mut self, message: DecodedMessage) -> Notification {
        if let Some(event) = map_with(&message, &self.layout) {
            self.apply(&event);
            return Notification::Event(event);
        }

        if let DecodedMessage::SysExCommand { command, ref payload } = message {
            match VendorCommand::parse(command, payload) {
                VendorCommand::DeviceStatus(payload) => {
                    if let Some(state) = self.session.as_mut() {
                        if !state.device_online() {
                            info!("Device online [{}]", format_hex(payload));
                        }
                        state.set_device_online(true);
                    }
                    return Notification::DeviceStatus(payload.to_vec());
                }
                VendorCommand::DeviceConfig(payload) => {
                    return Notification::DeviceConfig(payload.to_vec());
                }
                _ => {}
            }
        }

        trace!("Unhandled {}", message);
        Notification::Unhandled(message)
    }

    /// Apply an event to the session. Returns false without a session or
    /// when the event changed nothing.
    pub fn apply(&mut self, event: &ControllerEvent) -> bool {
        match self.session.as_mut() {
            Some(state) => state.apply(event),
            None => {
                trace!("No session, ignoring {:?}", event);
                false
            }
        }
    }

    /// LED commands for everything that changed since the previous call.
    pub fn feedback(&mut self) -> Vec<LedCommand> {
        let Some(state) = self.session.as_ref() else {
            return Vec::new();
        };
        let changes = state.lights().changes_since(&self.sent);
        self.sent = state.lights().clone();
        changes
    }

    /// [`Engine::feedback`], encoded in the configured protocol.
    pub fn encode_feedback(&mut self) -> Vec<Vec<u8>> {
        let feedback = self.options.feedback;
        self.feedback()
            .iter()
            .map(|cmd| encode_led_for(feedback, cmd))
            .collect()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}
