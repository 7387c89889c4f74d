use crate::domain::color::DEFAULT_MATCH_THRESHOLD;
use crate::domain::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_true(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_true(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "color_match_party".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

/// Thingy configuration service, advertised by every device
pub const CONFIGURATION_SERVICE_UUID: &str = "ef680100-9b35-4933-9b10-52ffa9740042";
pub const MOTION_SERVICE_UUID: &str = "ef680400-9b35-4933-9b10-52ffa9740042";
/// Gravity vector characteristic: three little-endian `f32` axes per notification
pub const GRAVITY_VECTOR_CHAR_UUID: &str = "ef68040a-9b35-4933-9b10-52ffa9740042";
pub const SOUND_SERVICE_UUID: &str = "ef680500-9b35-4933-9b10-52ffa9740042";
/// Speaker data characteristic, where tone commands are written
pub const SPEAKER_DATA_CHAR_UUID: &str = "ef680502-9b35-4933-9b10-52ffa9740042";

pub const DEFAULT_TONE_FREQUENCY_HZ: u16 = 600;
pub const DEFAULT_TONE_DURATION_MS: u16 = 500;
/// 300 truncated to a byte
pub const DEFAULT_TONE_VOLUME: u8 = 0x2C;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub round_duration_secs: u32,
    pub match_threshold: f64,
    /// How long "Congrats!"/"Boooo!" stays on a player card.
    pub status_reset_secs: u64,
    pub tone_frequency_hz: u16,
    pub tone_duration_ms: u16,
    pub tone_volume: u8,
    /// Player cards created at startup.
    pub initial_players: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            round_duration_secs: 30,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            status_reset_secs: 3,
            tone_frequency_hz: DEFAULT_TONE_FREQUENCY_HZ,
            tone_duration_ms: DEFAULT_TONE_DURATION_MS,
            tone_volume: DEFAULT_TONE_VOLUME,
            initial_players: 2,
        }
    }
}

impl GameSettings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            round_duration_secs: self.round_duration_secs.max(1),
            match_threshold: self.match_threshold,
        }
    }

    pub fn status_reset(&self) -> Duration {
        Duration::from_secs(self.status_reset_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BleSettings {
    /// Advertised service used to filter discovery.
    pub filter_service_uuid: String,
    pub motion_service_uuid: String,
    pub motion_char_uuid: String,
    pub sound_service_uuid: String,
    pub speaker_char_uuid: String,
    pub discovery_timeout_secs: u64,
    pub use_simulated_devices: bool,
}

impl Default for BleSettings {
    fn default() -> Self {
        Self {
            filter_service_uuid: CONFIGURATION_SERVICE_UUID.to_string(),
            motion_service_uuid: MOTION_SERVICE_UUID.to_string(),
            motion_char_uuid: GRAVITY_VECTOR_CHAR_UUID.to_string(),
            sound_service_uuid: SOUND_SERVICE_UUID.to_string(),
            speaker_char_uuid: SPEAKER_DATA_CHAR_UUID.to_string(),
            discovery_timeout_secs: 30,
            use_simulated_devices: !cfg!(windows),
        }
    }
}

/// Parsed form of [`BleSettings`] identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeripheralProfile {
    pub filter_service: Uuid,
    pub motion_service: Uuid,
    pub motion_char: Uuid,
    pub sound_service: Uuid,
    pub speaker_char: Uuid,
}

impl BleSettings {
    pub fn profile(&self) -> anyhow::Result<PeripheralProfile> {
        let parse = |field: &str, value: &str| {
            Uuid::parse_str(value).map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", field, value, e))
        };
        Ok(PeripheralProfile {
            filter_service: parse("filter_service_uuid", &self.filter_service_uuid)?,
            motion_service: parse("motion_service_uuid", &self.motion_service_uuid)?,
            motion_char: parse("motion_char_uuid", &self.motion_char_uuid)?,
            sound_service: parse("sound_service_uuid", &self.sound_service_uuid)?,
            speaker_char: parse("speaker_char_uuid", &self.speaker_char_uuid)?,
        })
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub sample_interval_ms: u64,
    /// Largest change per axis between two simulated samples, in g.
    pub drift_step: f32,
    pub connect_delay_ms: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            sample_interval_ms: 100,
            drift_step: 0.4,
            connect_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub game: GameSettings,
    #[serde(default)]
    pub ble: BleSettings,
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub log_settings: LogSettings,
}

pub struct SettingsService {
    settings: Settings,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        let settings = match Self::load_from_file(&settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!("Using default settings ({})", e);
                Settings::default()
            }
        };

        Ok(Self { settings })
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("ColorMatchParty");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "game": { "round_duration_secs": 10 } }"#).unwrap();
        assert_eq!(settings.game.round_duration_secs, 10);
        assert_eq!(settings.game.match_threshold, 20.0);
        assert_eq!(settings.game.status_reset_secs, 3);
        assert_eq!(settings.log_settings.rotation, "daily");
    }

    #[test]
    fn default_profile_parses() {
        let profile = BleSettings::default().profile().unwrap();
        assert_eq!(
            profile.motion_char,
            Uuid::parse_str("ef68040a-9b35-4933-9b10-52ffa9740042").unwrap()
        );
    }

    #[test]
    fn invalid_uuid_is_reported() {
        let ble = BleSettings {
            speaker_char_uuid: "not-a-uuid".to_string(),
            ..Default::default()
        };
        let err = ble.profile().unwrap_err().to_string();
        assert!(err.contains("speaker_char_uuid"));
    }

    #[test]
    fn zero_duration_is_bumped() {
        let game = GameSettings {
            round_duration_secs: 0,
            ..Default::default()
        };
        assert_eq!(game.session_config().round_duration_secs, 1);
    }
}
