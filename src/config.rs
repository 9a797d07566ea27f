use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::data::DEFAULT_LAND_URL;
use crate::interaction::InteractionConfig;
use crate::map::{DEFAULT_DOT_SPACING, DEFAULT_HIT_RADIUS};

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub land: LandSettings,
    #[serde(default)]
    pub globe: GlobeSettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Backend base URL; `/node-locations` is appended
    pub api_url: String,
    pub poll_secs: u64,
    pub timeout_secs: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001".to_string(),
            poll_secs: 30,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LandSettings {
    /// GeoJSON URL or local path
    pub source: String,
    pub dot_spacing: f64,
    pub timeout_secs: u64,
}

impl Default for LandSettings {
    fn default() -> Self {
        Self {
            source: DEFAULT_LAND_URL.to_string(),
            dot_spacing: DEFAULT_DOT_SPACING,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GlobeSettings {
    pub rotation_speed: f64,
    pub drag_sensitivity: f64,
    pub resume_delay_ms: u64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub wheel_factor: f64,
    /// Wheel delta reported for one scroll notch
    pub wheel_step: f64,
    pub hit_radius: f64,
    pub frame_ms: u64,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        let interaction = InteractionConfig::default();
        Self {
            rotation_speed: interaction.rotation_speed,
            drag_sensitivity: interaction.drag_sensitivity,
            resume_delay_ms: interaction.resume_delay.as_millis() as u64,
            min_scale: interaction.min_scale,
            max_scale: interaction.max_scale,
            wheel_factor: interaction.wheel_factor,
            wheel_step: 40.0,
            hit_radius: DEFAULT_HIT_RADIUS,
            frame_ms: 16,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub file: Option<PathBuf>,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: None,
            filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file yields defaults; an
    /// unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("node-globe")
            .join("config.toml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.log.file.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("node-globe")
                .join("node-globe.log")
        })
    }

    pub fn interaction(&self) -> InteractionConfig {
        let g = &self.globe;
        let (min_scale, max_scale) = if g.min_scale <= g.max_scale {
            (g.min_scale, g.max_scale)
        } else {
            (g.max_scale, g.min_scale)
        };
        InteractionConfig {
            rotation_speed: g.rotation_speed,
            drag_sensitivity: g.drag_sensitivity,
            resume_delay: Duration::from_millis(g.resume_delay_ms),
            min_scale,
            max_scale,
            wheel_factor: g.wheel_factor,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.feed.poll_secs.max(1))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.globe.frame_ms.max(1))
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed.timeout_secs.max(1))
    }

    pub fn land_timeout(&self) -> Duration {
        Duration::from_secs(self.land.timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings.feed.api_url, "http://localhost:3001");
        assert_eq!(settings.poll_interval(), Duration::from_secs(30));
        assert_eq!(settings.land.source, DEFAULT_LAND_URL);
        assert_eq!(settings.land.dot_spacing, 24.0);
        assert_eq!(settings.interaction(), InteractionConfig::default());
        assert_eq!(settings.frame_interval(), Duration::from_millis(16));
    }

    #[test]
    fn test_partial_sections() {
        let settings = Settings::parse(
            r#"
            [feed]
            api_url = "https://nodes.example.net"

            [globe]
            rotation_speed = 0.5
            resume_delay_ms = 1200
            "#,
        )
        .unwrap();
        assert_eq!(settings.feed.api_url, "https://nodes.example.net");
        assert_eq!(settings.feed.poll_secs, 30);

        let interaction = settings.interaction();
        assert_eq!(interaction.rotation_speed, 0.5);
        assert_eq!(interaction.resume_delay, Duration::from_millis(1200));
        assert_eq!(interaction.drag_sensitivity, 0.25);
    }

    #[test]
    fn test_swapped_zoom_bounds_are_ordered() {
        let settings = Settings::parse("[globe]\nmin_scale = 900.0\nmax_scale = 100.0\n").unwrap();
        let interaction = settings.interaction();
        assert_eq!((interaction.min_scale, interaction.max_scale), (100.0, 900.0));
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(Settings::parse("[feed\napi_url = 3").is_err());
        assert!(Settings::parse("[feed]\npoll_secs = \"soon\"").is_err());
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let settings = Settings::load(Path::new("/definitely/not/here/config.toml")).unwrap();
        assert_eq!(settings.log.filter, "info");
    }

    #[test]
    fn test_zero_intervals_are_floored() {
        let settings = Settings::parse("[feed]\npoll_secs = 0\n[globe]\nframe_ms = 0\n").unwrap();
        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
        assert_eq!(settings.frame_interval(), Duration::from_millis(1));
    }
}
