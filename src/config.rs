use configparser::ini::Ini;
use log::{info, warn};
use std::fmt;
use std::path::Path;

// Simulation
pub const TICKS_PER_SECOND: u32 = 120;
pub const STATUS_LOG_INTERVAL_MS: f64 = 1000.0;

// Track Geometry (position units, positive is down the lane)
pub const SPAWN_OFFSET: f64 = -50.0;
pub const JUDGMENT_LINE_OFFSET: f64 = 500.0;

// Judgment Windows
pub const JUDGMENT_WINDOW_SIZE: f64 = 100.0;
pub const PERFECT_RATIO: f64 = 0.4;

// Scoring
pub const SCORE_PERFECT: u32 = 10;
pub const SCORE_GREAT: u32 = 5;
pub const SCORE_MISS: u32 = 0;

// Combo display tiers
pub const COMBO_TIER_LOW_MAX: u32 = 20;
pub const COMBO_TIER_MID_MAX: u32 = 100;

// Built-in chart
pub const METRONOME_NOTE_COUNT: usize = 180;
pub const METRONOME_INTERVAL_MS: f64 = 200.0;
pub const METRONOME_SPEED: f64 = 5.0;

// Autoplay
pub const AUTOPLAY_DEFAULT_SEED: u64 = 0x5EED;

pub const DEFAULT_CONFIG_PATH: &str = "save/engine.ini";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {}", e),
            ConfigError::Parse(msg) => write!(f, "config parse error: {}", msg),
            ConfigError::Invalid { key, reason } => write!(f, "invalid config value '{}': {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

/// Load-time engine configuration. Nothing in here changes while a chart plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub window_size: f64,
    pub perfect_ratio: f64,
    pub spawn_offset: f64,
    pub judgment_line_offset: f64,
    pub tick_interval_ms: f64,
    pub score_perfect: u32,
    pub score_great: u32,
    pub score_miss: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: JUDGMENT_WINDOW_SIZE,
            perfect_ratio: PERFECT_RATIO,
            spawn_offset: SPAWN_OFFSET,
            judgment_line_offset: JUDGMENT_LINE_OFFSET,
            tick_interval_ms: 1000.0 / TICKS_PER_SECOND as f64,
            score_perfect: SCORE_PERFECT,
            score_great: SCORE_GREAT,
            score_miss: SCORE_MISS,
        }
    }
}

impl EngineConfig {
    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.window_size.is_finite() || self.window_size <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "WindowSize",
                reason: format!("must be a positive number, got {}", self.window_size),
            });
        }
        if !self.perfect_ratio.is_finite() || !(0.0..=1.0).contains(&self.perfect_ratio) {
            return Err(ConfigError::Invalid {
                key: "PerfectRatio",
                reason: format!("must be within 0..=1, got {}", self.perfect_ratio),
            });
        }
        if !self.tick_interval_ms.is_finite() || self.tick_interval_ms <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "TickIntervalMs",
                reason: format!("must be a positive number, got {}", self.tick_interval_ms),
            });
        }
        if !self.spawn_offset.is_finite() || !self.judgment_line_offset.is_finite() {
            return Err(ConfigError::Invalid {
                key: "SpawnOffset",
                reason: "track offsets must be finite".to_string(),
            });
        }
        if self.spawn_offset >= self.judgment_line_offset {
            return Err(ConfigError::Invalid {
                key: "SpawnOffset",
                reason: format!(
                    "spawn offset {} must be above the judgment line {}",
                    self.spawn_offset, self.judgment_line_offset
                ),
            });
        }
        Ok(())
    }

    /// Replaces every field that fails `validate` with its default, warning
    /// once per field. The result always validates.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut config = self;
        if !config.window_size.is_finite() || config.window_size <= 0.0 {
            warn!("WindowSize {} is invalid, using {}.", config.window_size, defaults.window_size);
            config.window_size = defaults.window_size;
        }
        if !config.perfect_ratio.is_finite() || !(0.0..=1.0).contains(&config.perfect_ratio) {
            warn!("PerfectRatio {} is invalid, using {}.", config.perfect_ratio, defaults.perfect_ratio);
            config.perfect_ratio = defaults.perfect_ratio;
        }
        if !config.tick_interval_ms.is_finite() || config.tick_interval_ms <= 0.0 {
            warn!(
                "TickIntervalMs {} is invalid, using {}.",
                config.tick_interval_ms, defaults.tick_interval_ms
            );
            config.tick_interval_ms = defaults.tick_interval_ms;
        }
        if !config.spawn_offset.is_finite()
            || !config.judgment_line_offset.is_finite()
            || config.spawn_offset >= config.judgment_line_offset
        {
            warn!(
                "Track offsets (spawn {}, line {}) are invalid, using spawn {} and line {}.",
                config.spawn_offset, config.judgment_line_offset, defaults.spawn_offset, defaults.judgment_line_offset
            );
            config.spawn_offset = defaults.spawn_offset;
            config.judgment_line_offset = defaults.judgment_line_offset;
        }
        config
    }

    pub fn from_ini_str(contents: &str) -> Result<Self, ConfigError> {
        let mut conf = Ini::new();
        conf.read(contents.to_string()).map_err(ConfigError::Parse)?;
        Self::from_ini(&conf)
    }

    /// Reads the INI file at `path`. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut conf = Ini::new();
        conf.load(path).map_err(ConfigError::Parse)?;
        let config = Self::from_ini(&conf)?;
        info!("Loaded engine config from '{}'.", path.display());
        Ok(config)
    }

    /// Like `load`, but any failure falls back to the built-in defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("Engine config '{}' not found, using defaults.", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load '{}' ({}), using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.to_ini().write(path)?;
        info!("Wrote engine config to '{}'.", path.display());
        Ok(())
    }

    fn from_ini(conf: &Ini) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut config = Self {
            window_size: get_f64(conf, "judgment", "WindowSize")?.unwrap_or(defaults.window_size),
            perfect_ratio: get_f64(conf, "judgment", "PerfectRatio")?.unwrap_or(defaults.perfect_ratio),
            spawn_offset: get_f64(conf, "track", "SpawnOffset")?.unwrap_or(defaults.spawn_offset),
            judgment_line_offset: get_f64(conf, "track", "JudgmentLineOffset")?
                .unwrap_or(defaults.judgment_line_offset),
            tick_interval_ms: defaults.tick_interval_ms,
            score_perfect: get_u32(conf, "scoring", "Perfect")?.unwrap_or(defaults.score_perfect),
            score_great: get_u32(conf, "scoring", "Great")?.unwrap_or(defaults.score_great),
            score_miss: get_u32(conf, "scoring", "Miss")?.unwrap_or(defaults.score_miss),
        };

        // TicksPerSecond is the friendlier knob; TickIntervalMs wins if both are set.
        if let Some(rate) = get_u32(conf, "timing", "TicksPerSecond")? {
            if rate == 0 {
                return Err(ConfigError::Invalid {
                    key: "TicksPerSecond",
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.tick_interval_ms = 1000.0 / rate as f64;
        }
        if let Some(interval) = get_f64(conf, "timing", "TickIntervalMs")? {
            config.tick_interval_ms = interval;
        }

        config.validate()?;
        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut conf = Ini::new_cs();
        conf.set("judgment", "WindowSize", Some(self.window_size.to_string()));
        conf.set("judgment", "PerfectRatio", Some(self.perfect_ratio.to_string()));
        conf.set("track", "SpawnOffset", Some(self.spawn_offset.to_string()));
        conf.set("track", "JudgmentLineOffset", Some(self.judgment_line_offset.to_string()));
        conf.set("timing", "TickIntervalMs", Some(self.tick_interval_ms.to_string()));
        conf.set("scoring", "Perfect", Some(self.score_perfect.to_string()));
        conf.set("scoring", "Great", Some(self.score_great.to_string()));
        conf.set("scoring", "Miss", Some(self.score_miss.to_string()));
        conf
    }
}

fn get_f64(conf: &Ini, section: &str, key: &'static str) -> Result<Option<f64>, ConfigError> {
    match conf.get(section, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| ConfigError::Invalid {
            key,
            reason: format!("'{}' is not a number", raw),
        }),
    }
}

fn get_u32(conf: &Ini, section: &str, key: &'static str) -> Result<Option<u32>, ConfigError> {
    match conf.get(section, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<u32>().map(Some).map_err(|_| ConfigError::Invalid {
            key,
            reason: format!("'{}' is not a non-negative integer", raw),
        }),
    }
}
