mod settings;

use crate::settings::Settings;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use config::Config;
use mikro_engine::command::encode_mode;
use mikro_engine::frame::format_hex;
use mikro_engine::sysex::SYSEX_START;
use mikro_engine::{DecodedMessage, Engine, LedCommand, Notification, decode_sysex};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[clap(
    name = "Maschine Mikro MIDI driver",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
)]
struct Args {
    #[clap(short, long, help = "Config file (see config.example.toml)")]
    config: Option<String>,

    #[clap(long, help = "Skip the start-up self test")]
    skip_self_test: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = Config::builder();

    if let Some(config_fn) = args.config.as_deref() {
        cfg = cfg.add_source(config::File::with_name(config_fn));
    }

    let settings: Settings = cfg
        .build()
        .context("Can't create settings")?
        .try_deserialize()
        .context("Can't parse settings")?;

    settings.validate().map_err(|e| anyhow!(e))?;

    init_logging(&settings.log_level);
    debug!("Running with settings: {settings:?}");

    if settings.self_test && !args.skip_self_test {
        self_test::loopback(&settings.engine)?;
    }

    let engine = Arc::new(Mutex::new(Engine::new(settings.engine.clone())));
    let dirty = Arc::new(AtomicBool::new(false));

    let mut output = connect_output(&settings)?;

    // Start the session before the first frame can arrive
    lock(&engine)?.begin_session();

    let _input = connect_input(&settings, Arc::clone(&engine), Arc::clone(&dirty))?;

    send(&mut output, &encode_mode(settings.engine.mode))?;

    if settings.self_test && !args.skip_self_test {
        self_test::led_sweep(settings.engine.feedback, |frame| send(&mut output, frame))?;
    }

    main_loop(&engine, &dirty, &mut output)
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn lock(engine: &Mutex<Engine>) -> Result<std::sync::MutexGuard<'_, Engine>> {
    engine
        .lock()
        .map_err(|_| anyhow!("Engine lock poisoned"))
}

fn port_matches(name: &str, pattern: &str) -> bool {
    name.to_lowercase().contains(&pattern.to_lowercase())
}

fn connect_output(settings: &Settings) -> Result<MidiOutputConnection> {
    let midi_out = MidiOutput::new(&format!("{} Out", settings.client_name))
        .context("Couldn't open MIDI output")?;

    let (port, name) = midi_out
        .ports()
        .into_iter()
        .find_map(|port| {
            let name = midi_out.port_name(&port).ok()?;
            port_matches(&name, &settings.output_port).then_some((port, name))
        })
        .ok_or_else(|| anyhow!("Output port '{}' not found", settings.output_port))?;

    info!("Connecting to output port: {}", name);
    midi_out
        .connect(&port, "mikro-out")
        .map_err(|e| anyhow!("Couldn't connect to output port '{}': {}", name, e))
}

fn connect_input(
    settings: &Settings,
    engine: Arc<Mutex<Engine>>,
    dirty: Arc<AtomicBool>,
) -> Result<MidiInputConnection<()>> {
    let mut midi_in = MidiInput::new(&format!("{} In", settings.client_name))
        .context("Couldn't open MIDI input")?;
    // Vendor reports arrive as SysEx
    midi_in.ignore(Ignore::None);

    let (port, name) = midi_in
        .ports()
        .into_iter()
        .find_map(|port| {
            let name = midi_in.port_name(&port).ok()?;
            port_matches(&name, &settings.input_port).then_some((port, name))
        })
        .ok_or_else(|| anyhow!("Input port '{}' not found", settings.input_port))?;

    info!("Connecting to input port: {}", name);
    midi_in
        .connect(
            &port,
            "mikro-in",
            move |_timestamp, frame, _| {
                let Ok(mut engine) = engine.lock() else {
                    error!("Engine lock poisoned, dropping [{}]", format_hex(frame));
                    return;
                };
                for note in engine.process(frame) {
                    match note {
                        Notification::Event(event) => debug!("{:?}", event),
                        Notification::DeviceStatus(payload) => {
                            debug!("Device status [{}]", format_hex(&payload))
                        }
                        Notification::DeviceConfig(payload) => {
                            debug!("Device config [{}]", format_hex(&payload))
                        }
                        Notification::Unhandled(message) => trace!("Ignoring {}", message),
                    }
                }
                dirty.store(true, Ordering::SeqCst);
            },
            (),
        )
        .map_err(|e| anyhow!("Couldn't connect to input port '{}': {}", name, e))
}

/// The LED command carried by an outgoing vendor frame, if any.
fn sniff_led(frame: &[u8]) -> Option<LedCommand> {
    if frame.first() != Some(&SYSEX_START) {
        return None;
    }
    match decode_sysex(frame)? {
        DecodedMessage::SysExCommand { command, payload } => {
            LedCommand::from_sysex(command, &payload)
        }
        _ => None,
    }
}

fn send(output: &mut MidiOutputConnection, frame: &[u8]) -> Result<()> {
    if let Some(led) = sniff_led(frame) {
        trace!("LED {:?} {} -> {:?} @ {}", led.target, led.index, led.color, led.intensity);
    }
    output
        .send(frame)
        .with_context(|| format!("Couldn't send [{}]", format_hex(frame)))
}

fn main_loop(
    engine: &Mutex<Engine>,
    dirty: &AtomicBool,
    output: &mut MidiOutputConnection,
) -> Result<()> {
    info!("Running");
    loop {
        if dirty.swap(false, Ordering::SeqCst) {
            let frames = lock(engine)?.encode_feedback();
            for frame in frames {
                send(output, &frame)?;
            }
        }
        thread::sleep(Duration::from_millis(1));
    }
}
