use mikro_engine::EngineOptions;
use serde::Deserialize;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Deserialize, Debug)]
#[serde(default)]
pub(crate) struct Settings {
    /// Client name the driver registers with the MIDI system.
    pub client_name: String,
    /// Case-insensitive substring of the controller's input port name.
    pub input_port: String,
    /// Case-insensitive substring of the controller's output port name.
    pub output_port: String,
    /// Used when RUST_LOG is not set.
    pub log_level: String,
    /// Run the start-up LED sweep.
    pub self_test: bool,
    pub engine: EngineOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_name: "Maschine Mikro Driver".to_string(),
            input_port: "Maschine Mikro".to_string(),
            output_port: "Maschine Mikro".to_string(),
            log_level: "info".to_string(),
            self_test: true,
            engine: EngineOptions::default(),
        }
    }
}

impl Settings {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.client_name.is_empty() {
            return Err("Client name must not be empty".to_string());
        }

        if self.input_port.trim().is_empty() {
            return Err("Input port must not be empty".to_string());
        }

        if self.output_port.trim().is_empty() {
            return Err("Output port must not be empty".to_string());
        }

        let level = self.log_level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(format!(
                "log_level must be one of {LOG_LEVELS:?} (found {:?})",
                self.log_level
            ));
        }

        let encoders = self.engine.encoder_count;
        if !(2..=4).contains(&encoders) {
            return Err(format!("engine.encoder_count must be 2 to 4 (found {encoders})"));
        }

        Ok(())
    }
}
