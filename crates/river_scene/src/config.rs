//! River configuration file handling
//!
//! `river.toml` has three sections:
//! - `[ring]` - slot bounds and flow timing
//! - `[camera]` - home pose, distance bounds and the authored tour
//! - `[clock]` - frame rate used by simulated runs
//!
//! Every field has a default, so an empty file is a valid configuration.

use crate::camera::{CameraPath, CameraPose, Waypoint};
use crate::error::{Result, SceneError};
use river_animation::Easing;
use river_core::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete scene configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RiverConfig {
    #[serde(default)]
    pub ring: RingConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub clock: ClockConfig,
}

/// Segment ring layout and flow timing
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RingConfig {
    /// First slot (at or before the seam)
    #[serde(default = "default_lo")]
    pub lo: i32,
    /// Last slot (the far end)
    #[serde(default = "default_hi")]
    pub hi: i32,
    /// Duration of one footprint of flow
    #[serde(default = "default_flow_duration")]
    pub flow_duration_ms: u32,
    /// Extra play-throughs of the base flow per cycle
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,
}

fn default_lo() -> i32 {
    -2
}

fn default_hi() -> i32 {
    7
}

fn default_flow_duration() -> u32 {
    7500
}

fn default_repeat_count() -> u32 {
    1
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            lo: default_lo(),
            hi: default_hi(),
            flow_duration_ms: default_flow_duration(),
            repeat_count: default_repeat_count(),
        }
    }
}

/// Camera home pose, distance bounds and scripted tour
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CameraConfig {
    #[serde(default = "default_direction")]
    pub home_direction: Vec3,
    #[serde(default = "default_distance")]
    pub home_distance: f32,
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    /// Convergence time for zoom input outside of a path leg
    #[serde(default = "default_zoom_duration")]
    pub zoom_duration_ms: u32,
    #[serde(default = "default_zoom_easing")]
    pub zoom_easing: Easing,
    /// Easing of every path leg
    #[serde(default = "default_path_easing")]
    pub path_easing: Easing,
    /// Pause before the final leg back home
    #[serde(default = "default_return_delay")]
    pub return_delay_ms: u32,
    #[serde(default = "default_return_duration")]
    pub return_duration_ms: u32,
    /// Tour played before returning home; the first delay is the initial delay
    #[serde(default = "default_waypoints")]
    pub waypoints: Vec<Waypoint>,
}

fn default_direction() -> Vec3 {
    Vec3::BACK
}

fn default_distance() -> f32 {
    30.0
}

fn default_min_distance() -> f32 {
    1.0
}

fn default_max_distance() -> f32 {
    100.0
}

fn default_zoom_duration() -> u32 {
    1000
}

fn default_zoom_easing() -> Easing {
    Easing::EaseOut
}

fn default_path_easing() -> Easing {
    Easing::EaseInOutSine
}

fn default_return_delay() -> u32 {
    1500
}

fn default_return_duration() -> u32 {
    4000
}

fn default_waypoints() -> Vec<Waypoint> {
    vec![
        Waypoint::new(Vec3::new(0.5, 0.5, 0.7), 25.0, 4000, 2000),
        Waypoint::new(Vec3::new(-0.6, 0.3, 0.75), 40.0, 4000, 1500),
        Waypoint::new(Vec3::new(0.0, 0.9, 0.45), 55.0, 4000, 1500),
    ]
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            home_direction: default_direction(),
            home_distance: default_distance(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
            zoom_duration_ms: default_zoom_duration(),
            zoom_easing: default_zoom_easing(),
            path_easing: default_path_easing(),
            return_delay_ms: default_return_delay(),
            return_duration_ms: default_return_duration(),
            waypoints: default_waypoints(),
        }
    }
}

impl CameraConfig {
    pub fn home(&self) -> CameraPose {
        CameraPose::new(self.home_direction.normalize(), self.home_distance)
    }

    /// Build the per-cycle camera path
    pub fn path(&self) -> Result<CameraPath> {
        let home = Waypoint::new(
            self.home_direction,
            self.home_distance,
            self.return_duration_ms,
            self.return_delay_ms,
        );
        CameraPath::new(self.waypoints.clone(), home, self.path_easing).ok_or_else(|| {
            SceneError::Config("camera waypoints need finite, non-zero directions".to_string())
        })
    }
}

/// Frame pacing for simulated runs
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ClockConfig {
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
}

fn default_target_fps() -> u32 {
    60
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
        }
    }
}

impl ClockConfig {
    /// Interval between frames
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.target_fps.max(1) as f64
    }
}

impl RiverConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SceneError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RiverConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check values that would produce a malformed ring or camera
    pub fn validate(&self) -> Result<()> {
        let ring = &self.ring;
        if ring.lo > 0 || ring.hi < 1 {
            return Err(SceneError::Config(format!(
                "ring slots {}..={} must satisfy lo <= 0 < hi",
                ring.lo, ring.hi
            )));
        }
        if ring.flow_duration_ms == 0 {
            return Err(SceneError::Config(
                "ring.flow_duration_ms must be positive".to_string(),
            ));
        }

        let camera = &self.camera;
        if !(camera.min_distance.is_finite()
            && camera.max_distance.is_finite()
            && camera.min_distance <= camera.max_distance)
        {
            return Err(SceneError::Config(format!(
                "camera distance bounds [{}, {}] are invalid",
                camera.min_distance, camera.max_distance
            )));
        }
        if !(camera.home_distance >= camera.min_distance
            && camera.home_distance <= camera.max_distance)
        {
            return Err(SceneError::Config(format!(
                "camera.home_distance {} is outside [{}, {}]",
                camera.home_distance, camera.min_distance, camera.max_distance
            )));
        }
        camera.path()?;

        if self.clock.target_fps == 0 {
            return Err(SceneError::Config(
                "clock.target_fps must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = RiverConfig::from_toml_str("").unwrap();
        assert_eq!(config, RiverConfig::default());
        assert_eq!(config.ring.lo, -2);
        assert_eq!(config.ring.hi, 7);
        assert_eq!(config.camera.home(), CameraPose::new(Vec3::BACK, 30.0));
    }

    #[test]
    fn test_partial_section() {
        let config = RiverConfig::from_toml_str(
            r#"
            [ring]
            flow_duration_ms = 8000
            repeat_count = 50

            [camera]
            zoom_easing = "linear"
            "#,
        )
        .unwrap();
        assert_eq!(config.ring.flow_duration_ms, 8000);
        assert_eq!(config.ring.repeat_count, 50);
        assert_eq!(config.ring.lo, -2);
        assert_eq!(config.camera.zoom_easing, Easing::Linear);
        assert_eq!(config.camera.waypoints.len(), 3);
    }

    #[test]
    fn test_waypoints_from_toml() {
        let config = RiverConfig::from_toml_str(
            r#"
            [[camera.waypoints]]
            direction = { x = 0.0, y = 2.0, z = 0.0 }
            distance = 12.0
            duration_ms = 500
            "#,
        )
        .unwrap();
        let path = config.camera.path().unwrap();
        assert_eq!(path.waypoints().len(), 2);
        assert_eq!(path.waypoints()[0].direction, Vec3::UP);
        assert_eq!(path.waypoints()[0].delay_ms, 0);
        assert_eq!(path.home(), Some(config.camera.home()));
    }

    #[test]
    fn test_round_trip() {
        let config = RiverConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = RiverConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.ring, config.ring);
        assert_eq!(parsed.clock, config.clock);
        assert_eq!(parsed.camera.waypoints.len(), config.camera.waypoints.len());
    }

    #[test]
    fn test_rejects_ring_without_seam() {
        let err = RiverConfig::from_toml_str("[ring]\nlo = 1\nhi = 5\n").unwrap_err();
        assert!(matches!(err, SceneError::Config(_)));
    }

    #[test]
    fn test_rejects_bad_distance_bounds() {
        let err =
            RiverConfig::from_toml_str("[camera]\nmin_distance = 50.0\nmax_distance = 10.0\n")
                .unwrap_err();
        assert!(matches!(err, SceneError::Config(_)));

        let err = RiverConfig::from_toml_str("[camera]\nhome_distance = 500.0\n").unwrap_err();
        assert!(matches!(err, SceneError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_direction_waypoint() {
        let err = RiverConfig::from_toml_str(
            r#"
            [[camera.waypoints]]
            direction = { x = 0.0, y = 0.0, z = 0.0 }
            distance = 12.0
            duration_ms = 500
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::Config(_)));
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let err = RiverConfig::from_toml_str("[ring]\nlo = \"far\"\n").unwrap_err();
        assert!(matches!(err, SceneError::Config(_)));
    }

    #[test]
    fn test_frame_interval() {
        assert!((ClockConfig::default().frame_interval_ms() - 16.6667).abs() < 1e-3);
    }
}
