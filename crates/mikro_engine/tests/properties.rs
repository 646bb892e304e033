use mikro_engine::command::{encode_event, encode_led};
use mikro_engine::controls::BUTTON_COUNT;
use mikro_engine::state::{TEMPO_MAX, TEMPO_MIN};
use mikro_engine::{
    Buttons, ControllerEvent, ControllerState, DecodedMessage, Engine, Feedback, LedCommand,
    LedTarget, Notification, PadColors, ProtocolVariant, classify, decode_midi, decode_sysex, map,
};
use proptest::prelude::*;

fn note_on(note: u8, velocity: u8) -> DecodedMessage {
    DecodedMessage::NoteOn {
        note,
        velocity,
        channel: 0,
    }
}

fn any_event() -> impl Strategy<Value = ControllerEvent> {
    let button = (0..BUTTON_COUNT as u8).prop_map(|id| Buttons::from_id(id).unwrap());
    prop_oneof![
        (0u8..16, 1u8..=127).prop_map(|(index, velocity)| ControllerEvent::PadPressed {
            index,
            velocity
        }),
        (0u8..16).prop_map(|index| ControllerEvent::PadReleased { index }),
        (button.clone(), 1u8..=127)
            .prop_map(|(id, value)| ControllerEvent::ButtonPressed { id, value }),
        button.prop_map(|id| ControllerEvent::ButtonReleased { id }),
        (0u8..2, 0u8..=127).prop_map(|(id, value)| ControllerEvent::EncoderTurned {
            id: mikro_engine::Encoders::from_id(id).unwrap(),
            value
        }),
    ]
}

proptest! {
    #[test]
    fn note_on_in_pad_window_maps_to_pad(note in 36u8..=51, velocity in 0u8..=127) {
        let expected = if velocity == 0 {
            ControllerEvent::PadReleased { index: note - 36 }
        } else {
            ControllerEvent::PadPressed { index: note - 36, velocity }
        };
        prop_assert_eq!(map(&note_on(note, velocity)), Some(expected));
    }

    #[test]
    fn notes_outside_pad_window_are_dropped(note in prop_oneof![0u8..36, 52u8..=127], velocity in 0u8..=127) {
        prop_assert_eq!(map(&note_on(note, velocity)), None);
    }

    #[test]
    fn cc_in_button_window_maps_to_button(controller in 16u8..=23, value in 0u8..=127) {
        let id = Buttons::from_id(controller - 16).unwrap();
        let expected = if value == 0 {
            ControllerEvent::ButtonReleased { id }
        } else {
            ControllerEvent::ButtonPressed { id, value }
        };
        let message = DecodedMessage::ControlChange { controller, value, channel: 0 };
        prop_assert_eq!(map(&message), Some(expected));
    }

    #[test]
    fn both_protocols_converge(event in any_event()) {
        let midi = encode_event(Feedback::Midi, &event).unwrap();
        let sysex = encode_event(Feedback::SysEx, &event).unwrap();
        prop_assert_eq!(classify(&midi), ProtocolVariant::StandardMidi);
        prop_assert_eq!(classify(&sysex), ProtocolVariant::VendorSysEx);

        let from_midi = decode_midi(&midi).first().and_then(map);
        let from_sysex = decode_sysex(&sysex).as_ref().and_then(map);
        prop_assert_eq!(from_midi, Some(event));
        prop_assert_eq!(from_sysex, Some(event));
    }

    #[test]
    fn led_frames_decode_back(pad in any::<bool>(), index in 0u8..8, color in 0u8..=17, intensity in 0u8..=127) {
        let cmd = LedCommand {
            target: if pad { LedTarget::Pad } else { LedTarget::Button },
            index,
            color: PadColors::from_code(color),
            intensity,
        };
        let frame = encode_led(&cmd);
        prop_assert_eq!(frame.len(), 11);
        let Some(DecodedMessage::SysExCommand { command, payload }) = decode_sysex(&frame) else {
            return Err(TestCaseError::fail("LED frame did not decode"));
        };
        prop_assert_eq!(command, 0x00);
        prop_assert_eq!(LedCommand::from_sysex(command, &payload), Some(cmd));
    }

    #[test]
    fn tempo_is_always_clamped(bpm in any::<i32>()) {
        let mut state = ControllerState::default();
        state.set_tempo(bpm);
        prop_assert!((TEMPO_MIN..=TEMPO_MAX).contains(&state.tempo()));
    }

    #[test]
    fn swing_is_always_clamped(percent in -1000.0f32..1000.0) {
        let mut state = ControllerState::default();
        state.set_swing(percent);
        prop_assert!((0.0..=100.0).contains(&state.swing()));
    }

    #[test]
    fn state_stays_in_bounds(events in prop::collection::vec(any_event(), 0..64)) {
        let mut state = ControllerState::default();
        for event in &events {
            state.apply(event);
        }
        prop_assert!(state.group() <= 15);
        prop_assert!(state.sound() <= 15);
        prop_assert!((TEMPO_MIN..=TEMPO_MAX).contains(&state.tempo()));
        prop_assert!((0.0..=100.0).contains(&state.swing()));
    }

    #[test]
    fn garbage_never_panics(frame in prop::collection::vec(any::<u8>(), 0..80)) {
        let mut engine = Engine::default();
        engine.begin_session();
        let _ = engine.process(&frame);
        let _ = engine.encode_feedback();
    }

    #[test]
    fn shift_release_without_shift_is_a_no_op(events in prop::collection::vec(any_event(), 0..16)) {
        let mut state = ControllerState::default();
        for event in &events {
            state.apply(event);
        }
        state.apply(&ControllerEvent::ButtonReleased { id: Buttons::Shift });
        let before = state.clone();
        let changed = state.apply(&ControllerEvent::ButtonReleased { id: Buttons::Shift });
        prop_assert!(!changed);
        prop_assert_eq!(state, before);
    }
}

#[test]
fn short_frames_are_unrecognized() {
    assert_eq!(classify(&[0x90]), ProtocolVariant::Unrecognized);
    assert_eq!(classify(&[]), ProtocolVariant::Unrecognized);
}

#[test]
fn device_status_is_not_a_control() {
    let frame = [0xf0, 0x00, 0x20, 0x3c, 0x02, 0x01, 0x10, 0x00, 0xf7];
    let decoded = decode_sysex(&frame).unwrap();
    assert_eq!(
        decoded,
        DecodedMessage::SysExCommand {
            command: 0x01,
            payload: vec![0x10, 0x00]
        }
    );
    assert_eq!(map(&decoded), None);

    let mut engine = Engine::default();
    engine.begin_session();
    assert_eq!(
        engine.process(&frame),
        vec![Notification::DeviceStatus(vec![0x10, 0x00])]
    );
}

#[test]
fn pad_twelve_selects_sound_eight() {
    let mut engine = Engine::default();
    engine.begin_session();
    engine.process(&[0x90, 0x30, 0x64]);
    let state = engine.state().unwrap();
    assert_eq!(state.sound(), 8);
    assert!(!state.shift_pressed());
}
