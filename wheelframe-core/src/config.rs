/// Widget configuration, supplied by the embedder as JSON
use serde::Deserialize;

use crate::error::{Result, WidgetError};
use crate::input::{Normalizer, DEFAULT_SWEEP_DEGREES};
use crate::rotation::{Axis, AxisMapping, Smoother, DEFAULT_BLEND_FACTOR};

pub const DEFAULT_OBJECT_NAME: &str = "Group";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct WidgetConfig {
    /// Object looked up in every loaded scene
    pub object_name: String,
    /// Scene loaded at mount, before any `CHANGE_SCENE`
    pub scene_url: Option<String>,
    pub blend_factor: f64,
    pub sweep_degrees: f64,
    pub pitch_axis: Axis,
    pub yaw_axis: Axis,
    /// Horizontal pointer movement rotates against the pointer
    pub invert_yaw: bool,
    /// Send `APP_INITIALIZED` alongside `WHEEL_IFRAME_READY`
    pub announce_app_initialized: bool,
    pub target_origin: String,
    pub log_level: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            object_name: DEFAULT_OBJECT_NAME.to_string(),
            scene_url: None,
            blend_factor: DEFAULT_BLEND_FACTOR,
            sweep_degrees: DEFAULT_SWEEP_DEGREES,
            pitch_axis: Axis::X,
            yaw_axis: Axis::Z,
            invert_yaw: true,
            announce_app_initialized: true,
            target_origin: "*".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Parse and validate. An empty or blank string yields the defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_json::from_str(text).map_err(|e| WidgetError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.blend_factor > 0.0 && self.blend_factor <= 1.0) {
            return Err(WidgetError::InvalidConfig(format!(
                "blendFactor must be in (0, 1], got {}",
                self.blend_factor
            )));
        }
        if !self.sweep_degrees.is_finite() || self.sweep_degrees <= 0.0 {
            return Err(WidgetError::InvalidConfig(format!(
                "sweepDegrees must be positive, got {}",
                self.sweep_degrees
            )));
        }
        if self.pitch_axis == self.yaw_axis {
            return Err(WidgetError::InvalidConfig(
                "pitchAxis and yawAxis must differ".to_string(),
            ));
        }
        if self.object_name.trim().is_empty() {
            return Err(WidgetError::InvalidConfig("objectName is empty".to_string()));
        }
        Ok(())
    }

    pub fn mapping(&self) -> AxisMapping {
        AxisMapping {
            pitch: self.pitch_axis,
            yaw: self.yaw_axis,
        }
    }

    pub fn smoother(&self) -> Smoother {
        Smoother::new(self.blend_factor, self.mapping())
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.sweep_degrees, self.invert_yaw)
    }

    /// `log_level` as a filter, falling back to `Info` for unknown names
    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}
