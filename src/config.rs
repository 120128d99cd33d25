use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::clock::{MAX_RESYNC_INTERVAL, TickPeriod};
use crate::error::ConfigError;
use crate::sink::WidgetId;
use crate::ui::theme::{ColorTheme, Palette, ThemeCycle};
use crate::ui::widgets::dot_grid::{DEFAULT_CANVAS_SIZE, DEFAULT_DOT_SIZE, farthest_center};

pub const CONFIG_ENV: &str = "BITCLOCK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "bitclock.yml";

/// Widget settings, read from YAML.
///
/// Example:
///
/// ```yaml
/// canvas_size: 384
/// dot_size: 12
/// tick_period: 65536
/// resync_interval: 64
/// palette: light_dark
/// widget_ids: [1, 2]
/// output_dir: frames
/// command_addr: 127.0.0.1:7878
/// ```
///
/// Every field is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub canvas_size: u32,
    pub dot_size: u32,
    pub tick_period: TickPeriod,
    pub resync_interval: u32,
    pub palette: Palette,
    /// Replaces the palette when present.
    pub themes: Option<Vec<ColorTheme>>,
    pub widget_ids: Vec<WidgetId>,
    pub output_dir: PathBuf,
    pub command_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_size: DEFAULT_CANVAS_SIZE,
            dot_size: DEFAULT_DOT_SIZE,
            tick_period: TickPeriod::Full,
            resync_interval: MAX_RESYNC_INTERVAL,
            palette: Palette::Full,
            themes: None,
            widget_ids: vec![1],
            output_dir: PathBuf::from("frames"),
            command_addr: "127.0.0.1:7878".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// `$BITCLOCK_CONFIG`, else `./bitclock.yml` if it exists, else defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_yaml_file(path);
        }
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_yaml_file(DEFAULT_CONFIG_FILE);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_size == 0 {
            return Err(ConfigError::Invalid("canvas_size must be positive".to_string()));
        }
        if farthest_center(self.dot_size).is_none() {
            return Err(ConfigError::Invalid(format!(
                "dot_size must be positive and small enough to lay out, got {}",
                self.dot_size
            )));
        }
        if !(1..=MAX_RESYNC_INTERVAL).contains(&self.resync_interval) {
            return Err(ConfigError::Invalid(format!(
                "resync_interval must be between 1 and {}, got {}",
                MAX_RESYNC_INTERVAL, self.resync_interval
            )));
        }
        if matches!(&self.themes, Some(themes) if themes.is_empty()) {
            return Err(ConfigError::Invalid("themes must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn theme_cycle(&self) -> Result<ThemeCycle, ConfigError> {
        match &self.themes {
            Some(themes) => ThemeCycle::new(themes.clone()),
            None => Ok(ThemeCycle::from_palette(self.palette)),
        }
    }
}
