//! Controller session state
//!
//! `ControllerState` is the single writer for the session: selection,
//! transport, tempo/swing and the LED mirrors only change through
//! [`ControllerState::apply`] or the explicit setters below. It is not
//! internally synchronized; callers that receive frames on several threads
//! must serialize access themselves.

use crate::controls::{
    BUTTON_COUNT, Buttons, ControllerEvent, Encoders, Layout, MAX_ENCODERS, PAD_COUNT,
    relative_direction,
};
use crate::lights::{LedState, Lights, PadColors};
use serde::Deserialize;
use tracing::{debug, trace};

pub const TEMPO_MIN: u16 = 60;
pub const TEMPO_MAX: u16 = 200;
pub const DEFAULT_TEMPO: u16 = 120;
pub const SWING_MAX_PERCENT: f32 = 100.0;
/// Highest selectable group, sound, pattern and scene.
pub const SLOT_MAX: u8 = 15;
/// Pads from this index on select sound `pad - SOUND_PAD_OFFSET`.
pub const SOUND_PAD_OFFSET: u8 = 4;

const SWING_MAX_TENTHS: u16 = 1000;
const SLOTS: usize = SLOT_MAX as usize + 1;

fn set_slot(table: &mut [bool; SLOTS], slot: u8, active: bool) -> bool {
    match table.get_mut(slot as usize) {
        Some(entry) => {
            *entry = active;
            true
        }
        None => {
            debug!("Slot {} out of range", slot);
            false
        }
    }
}

fn set_nested_slot(
    table: &mut [[bool; SLOTS]; SLOTS],
    group: u8,
    slot: u8,
    active: bool,
) -> bool {
    match table.get_mut(group as usize) {
        Some(row) => set_slot(row, slot, active),
        None => {
            debug!("Group {} out of range", group);
            false
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Native = 0,
    Midi = 1,
}

/// Swing change per encoder detent.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SwingResolution {
    /// 1 %
    #[default]
    Coarse,
    /// 0.1 %
    Fine,
}

impl SwingResolution {
    fn step_tenths(self) -> i32 {
        match self {
            SwingResolution::Coarse => 10,
            SwingResolution::Fine => 1,
        }
    }
}

fn pad_lit(velocity: u8) -> LedState {
    LedState::new(PadColors::Green, velocity)
}

fn group_lit() -> LedState {
    LedState::new(PadColors::White, 0x7f)
}

fn button_lit(on: bool) -> LedState {
    if on {
        LedState::new(PadColors::Red, 0x7f)
    } else {
        LedState::OFF
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    layout: Layout,
    swing_resolution: SwingResolution,
    mode: Mode,

    group: u8,
    sound: u8,
    pattern: u8,
    scene: u8,
    tempo: u16,
    swing_tenths: u16,

    playing: bool,
    recording: bool,
    shift: bool,
    solo: bool,
    mute: bool,
    automation: bool,
    device_online: bool,

    pad_pressed: [bool; PAD_COUNT],
    pad_velocity: [u8; PAD_COUNT],
    button_pressed: [bool; BUTTON_COUNT],
    last_encoder_value: [Option<u8>; MAX_ENCODERS],

    group_active: [bool; SLOTS],
    sound_active: [[bool; SLOTS]; SLOTS],
    pattern_active: [[bool; SLOTS]; SLOTS],
    scene_active: [bool; SLOTS],

    lights: Lights,
}

impl ControllerState {
    pub fn new(layout: Layout, swing_resolution: SwingResolution, mode: Mode) -> Self {
        Self {
            layout,
            swing_resolution,
            mode,
            group: 0,
            sound: 0,
            pattern: 0,
            scene: 0,
            tempo: DEFAULT_TEMPO,
            swing_tenths: 0,
            playing: false,
            recording: false,
            shift: false,
            solo: false,
            mute: false,
            automation: false,
            device_online: false,
            pad_pressed: [false; PAD_COUNT],
            pad_velocity: [0; PAD_COUNT],
            button_pressed: [false; BUTTON_COUNT],
            last_encoder_value: [None; MAX_ENCODERS],
            group_active: [false; SLOTS],
            sound_active: [[false; SLOTS]; SLOTS],
            pattern_active: [[false; SLOTS]; SLOTS],
            scene_active: [false; SLOTS],
            lights: Lights::new(),
        }
    }

    /// Apply one controller event. Returns whether anything changed.
    pub fn apply(&mut self, event: &ControllerEvent) -> bool {
        let before = self.clone();
        match *event {
            ControllerEvent::PadPressed { index, velocity } => self.pad_pressed(index, velocity),
            ControllerEvent::PadReleased { index } => self.pad_released(index),
            ControllerEvent::ButtonPressed { id, value } => self.button_pressed(id, value),
            ControllerEvent::ButtonReleased { id } => self.button_released(id),
            ControllerEvent::EncoderTurned { id, value } => self.encoder_turned(id, value),
        }
        *self != before
    }

    fn pad_pressed(&mut self, index: u8, velocity: u8) {
        let Some(pad) = self.layout.pad(index) else {
            return;
        };
        let i = pad as usize;
        self.pad_pressed[i] = true;
        self.pad_velocity[i] = velocity.min(0x7f);

        if self.shift {
            if self.mode == Mode::Native {
                self.select_group(pad);
                return;
            }
        } else {
            self.select_sound(pad);
            if pad >= SOUND_PAD_OFFSET {
                self.sound = pad - SOUND_PAD_OFFSET;
            }
            trace!("Pad {} triggers sound {}", pad, self.sound);
        }
        self.lights.set_pad(i, pad_lit(velocity));
    }

    fn pad_released(&mut self, index: u8) {
        let Some(pad) = self.layout.pad(index) else {
            return;
        };
        let i = pad as usize;
        self.pad_pressed[i] = false;
        self.pad_velocity[i] = 0;
        self.lights.set_pad(i, LedState::OFF);
    }

    fn button_pressed(&mut self, button: Buttons, _value: u8) {
        self.button_pressed[button as usize] = true;
        match button {
            Buttons::Shift => {
                self.shift = true;
                self.lights.set_button(Buttons::Shift, button_lit(true));
            }
            Buttons::Solo => self.toggle_solo(),
            Buttons::Mute => self.toggle_mute(),
            Buttons::Play => self.toggle_playback(),
            Buttons::Record => self.toggle_recording(),
            Buttons::Automation => self.toggle_automation(),
            // Select-all and erase act on project data held elsewhere
            Buttons::Select | Buttons::Erase => {}
        }
    }

    fn button_released(&mut self, button: Buttons) {
        self.button_pressed[button as usize] = false;
        if button == Buttons::Shift {
            self.shift = false;
            self.lights.set_button(Buttons::Shift, button_lit(false));
        }
    }

    fn encoder_turned(&mut self, encoder: Encoders, value: u8) {
        if self.layout.encoder(encoder.id()).is_none() {
            return;
        }
        self.last_encoder_value[encoder as usize] = Some(value);
        let direction = relative_direction(value) as i32;
        match encoder {
            Encoders::Tempo => self.set_tempo(self.tempo as i32 + direction),
            Encoders::Swing => {
                let step = direction * self.swing_resolution.step_tenths();
                self.set_swing_tenths(self.swing_tenths as i32 + step);
            }
            Encoders::Aux2 | Encoders::Aux3 => {}
        }
    }

    /// Clamped to 60-200 BPM.
    pub fn set_tempo(&mut self, bpm: i32) {
        let clamped = bpm.clamp(TEMPO_MIN as i32, TEMPO_MAX as i32) as u16;
        if clamped as i32 != bpm {
            debug!("Tempo {} clamped to {}", bpm, clamped);
        }
        self.tempo = clamped;
    }

    /// Clamped to 0-100 %, kept at 0.1 % resolution.
    pub fn set_swing(&mut self, percent: f32) {
        let clamped = percent.clamp(0.0, SWING_MAX_PERCENT);
        self.swing_tenths = (clamped * 10.0).round() as u16;
    }

    fn set_swing_tenths(&mut self, tenths: i32) {
        self.swing_tenths = tenths.clamp(0, SWING_MAX_TENTHS as i32) as u16;
    }

    /// Selects a group and lights only its pad.
    pub fn select_group(&mut self, group: u8) {
        self.group = group.min(SLOT_MAX);
        self.lights.set_all_pads(LedState::OFF);
        self.lights.set_pad(self.group as usize, group_lit());
    }

    pub fn select_sound(&mut self, sound: u8) {
        self.sound = sound.min(SLOT_MAX);
    }

    pub fn select_pattern(&mut self, pattern: u8) {
        self.pattern = pattern.min(SLOT_MAX);
    }

    pub fn select_scene(&mut self, scene: u8) {
        self.scene = scene.min(SLOT_MAX);
    }

    /// The create/delete calls return false when an id is out of range.
    pub fn create_group(&mut self, group: u8) -> bool {
        set_slot(&mut self.group_active, group, true)
    }

    pub fn delete_group(&mut self, group: u8) -> bool {
        set_slot(&mut self.group_active, group, false)
    }

    pub fn create_sound(&mut self, group: u8, sound: u8) -> bool {
        set_nested_slot(&mut self.sound_active, group, sound, true)
    }

    pub fn delete_sound(&mut self, group: u8, sound: u8) -> bool {
        set_nested_slot(&mut self.sound_active, group, sound, false)
    }

    pub fn create_pattern(&mut self, group: u8, pattern: u8) -> bool {
        set_nested_slot(&mut self.pattern_active, group, pattern, true)
    }

    pub fn delete_pattern(&mut self, group: u8, pattern: u8) -> bool {
        set_nested_slot(&mut self.pattern_active, group, pattern, false)
    }

    pub fn create_scene(&mut self, scene: u8) -> bool {
        set_slot(&mut self.scene_active, scene, true)
    }

    pub fn delete_scene(&mut self, scene: u8) -> bool {
        set_slot(&mut self.scene_active, scene, false)
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn set_device_online(&mut self, online: bool) {
        self.device_online = online;
    }

    pub fn play(&mut self) {
        self.set_playing(true);
    }

    pub fn stop(&mut self) {
        self.set_playing(false);
    }

    pub fn record(&mut self) {
        self.set_recording(true);
    }

    pub fn stop_recording(&mut self) {
        self.set_recording(false);
    }

    pub fn toggle_playback(&mut self) {
        self.set_playing(!self.playing);
    }

    pub fn toggle_recording(&mut self) {
        self.set_recording(!self.recording);
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        self.lights.set_button(Buttons::Play, button_lit(playing));
    }

    fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
        self.lights.set_button(Buttons::Record, button_lit(recording));
    }

    pub fn toggle_solo(&mut self) {
        self.solo = !self.solo;
        self.lights.set_button(Buttons::Solo, button_lit(self.solo));
    }

    pub fn toggle_mute(&mut self) {
        self.mute = !self.mute;
        self.lights.set_button(Buttons::Mute, button_lit(self.mute));
    }

    pub fn toggle_automation(&mut self) {
        self.automation = !self.automation;
        self.lights
            .set_button(Buttons::Automation, button_lit(self.automation));
    }

    /// Returns false when `pad` is not on the device.
    pub fn set_pad_led(&mut self, pad: u8, state: LedState) -> bool {
        self.lights.set_pad(pad as usize, state)
    }

    pub fn set_all_pad_leds(&mut self, state: LedState) {
        self.lights.set_all_pads(state);
    }

    /// Returns false when `id` is not a button.
    pub fn set_button_led(&mut self, id: u8, state: LedState) -> bool {
        match Buttons::from_id(id) {
            Some(button) => {
                self.lights.set_button(button, state);
                true
            }
            None => false,
        }
    }

    /// Returns false when `id` is not an encoder of this layout.
    pub fn set_encoder_led(&mut self, id: u8, value: u8) -> bool {
        match self.layout.encoder(id) {
            Some(encoder) => {
                self.lights.set_encoder(encoder, value);
                true
            }
            None => false,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn group(&self) -> u8 {
        self.group
    }

    pub fn sound(&self) -> u8 {
        self.sound
    }

    pub fn pattern(&self) -> u8 {
        self.pattern
    }

    pub fn scene(&self) -> u8 {
        self.scene
    }

    pub fn tempo(&self) -> u16 {
        self.tempo
    }

    /// Swing in percent.
    pub fn swing(&self) -> f32 {
        self.swing_tenths as f32 / 10.0
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn shift_pressed(&self) -> bool {
        self.shift
    }

    pub fn solo_mode(&self) -> bool {
        self.solo
    }

    pub fn mute_mode(&self) -> bool {
        self.mute
    }

    pub fn automation_mode(&self) -> bool {
        self.automation
    }

    pub fn device_online(&self) -> bool {
        self.device_online
    }

    pub fn is_pad_pressed(&self, pad: u8) -> bool {
        self.pad_pressed.get(pad as usize).copied().unwrap_or(false)
    }

    pub fn pad_velocity(&self, pad: u8) -> u8 {
        self.pad_velocity.get(pad as usize).copied().unwrap_or(0)
    }

    pub fn is_button_pressed(&self, button: Buttons) -> bool {
        self.button_pressed[button as usize]
    }

    pub fn last_encoder_value(&self, encoder: Encoders) -> Option<u8> {
        self.last_encoder_value[encoder as usize]
    }

    pub fn is_group_active(&self, group: u8) -> bool {
        self.group_active.get(group as usize).copied().unwrap_or(false)
    }

    pub fn is_sound_active(&self, group: u8, sound: u8) -> bool {
        self.sound_active
            .get(group as usize)
            .and_then(|row| row.get(sound as usize))
            .copied()
            .unwrap_or(false)
    }

    pub fn is_pattern_active(&self, group: u8, pattern: u8) -> bool {
        self.pattern_active
            .get(group as usize)
            .and_then(|row| row.get(pattern as usize))
            .copied()
            .unwrap_or(false)
    }

    pub fn is_scene_active(&self, scene: u8) -> bool {
        self.scene_active.get(scene as usize).copied().unwrap_or(false)
    }

    pub fn lights(&self) -> &Lights {
        &self.lights
    }

    pub fn pad_leds(&self) -> &[LedState] {
        self.lights.pads()
    }

    pub fn button_leds(&self) -> &[LedState] {
        self.lights.buttons()
    }

    pub fn encoder_leds(&self) -> &[u8] {
        &self.lights.encoders()[..self.layout.encoder_count()]
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new(Layout::default(), SwingResolution::default(), Mode::default())
    }
}
