use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, ShowcaseError};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rotation: RotationTiming,
    pub pointer: PointerConfig,
    pub viewport: ViewportConfig,
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.rotation.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Interval and animation timings for the tier rotation, in milliseconds of
/// timeline time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationTiming {
    pub wide_interval_ms: u64,
    pub narrow_interval_ms: u64,
    pub exit_duration_ms: u64,
    pub entry_duration_ms: u64,
    /// Extra delay per card during the entry animation.
    pub entry_stagger_ms: u64,
}

impl Default for RotationTiming {
    fn default() -> Self {
        Self {
            wide_interval_ms: 5_000,
            narrow_interval_ms: 8_000,
            exit_duration_ms: 400,
            entry_duration_ms: 800,
            entry_stagger_ms: 150,
        }
    }
}

impl RotationTiming {
    pub fn validate(&self) -> Result<()> {
        if self.wide_interval_ms == 0 {
            return Err(ShowcaseError::ZeroInterval("wide_interval_ms"));
        }
        if self.narrow_interval_ms == 0 {
            return Err(ShowcaseError::ZeroInterval("narrow_interval_ms"));
        }
        Ok(())
    }

    /// Narrow viewports rotate more slowly.
    pub fn interval_ms(&self, viewport_is_narrow: bool) -> u64 {
        if viewport_is_narrow {
            self.narrow_interval_ms
        } else {
            self.wide_interval_ms
        }
    }
}

/// Hover and tilt feedback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Pointer offset from the card centre is divided by this to get degrees.
    pub tilt_divisor: f32,
    pub hover_duration_ms: u64,
    pub tilt_duration_ms: u64,
    pub hover_lift: f32,
    /// Permanent lift of popular cards while not hovered.
    pub popular_lift: f32,
    pub popular_scale: f32,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            tilt_divisor: 10.0,
            hover_duration_ms: 300,
            tilt_duration_ms: 200,
            hover_lift: -8.0,
            popular_lift: -4.0,
            popular_scale: 1.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Widths strictly below this count as narrow.
    pub narrow_breakpoint_px: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            narrow_breakpoint_px: 768,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_interval_from_viewport() {
        let timing = RotationTiming::default();
        assert_eq!(timing.interval_ms(true), 8_000);
        assert_eq!(timing.interval_ms(false), 5_000);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json_str(r#"{"rotation": {"wide_interval_ms": 3000}}"#).unwrap();
        assert_eq!(config.rotation.wide_interval_ms, 3_000);
        assert_eq!(config.rotation.narrow_interval_ms, 8_000);
        assert_eq!(config.pointer, PointerConfig::default());
    }

    #[test]
    fn rejects_zero_intervals() {
        let err = AppConfig::from_json_str(r#"{"rotation": {"wide_interval_ms": 0}}"#).unwrap_err();
        assert!(matches!(err, ShowcaseError::ZeroInterval("wide_interval_ms")));

        let timing = RotationTiming {
            narrow_interval_ms: 0,
            ..RotationTiming::default()
        };
        assert!(matches!(
            timing.validate(),
            Err(ShowcaseError::ZeroInterval("narrow_interval_ms"))
        ));
    }

    #[test]
    fn accepts_huge_durations() {
        let config =
            AppConfig::from_json_str(r#"{"rotation": {"exit_duration_ms": 18446744073709551615}}"#)
                .unwrap();
        assert_eq!(config.rotation.exit_duration_ms, u64::MAX);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(AppConfig::from_json_str("{ rotation: ").is_err());
    }
}
