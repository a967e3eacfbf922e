//! Simulation configuration.
//!
//! Everything except `aspect` is fixed once a simulation is constructed.
//! Values are validated up front so an unstable configuration never reaches
//! the solver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const DEFAULT_RESOLUTION: u32 = 512;
pub const DEFAULT_VISCOSITY: f32 = 0.985;
pub const DEFAULT_STRENGTH: f32 = 0.5;
pub const DEFAULT_IMPULSE_RADIUS: f32 = 0.02;
/// Largest accepted grid edge. Two grids of this size take 4 GiB.
pub const MAX_RESOLUTION: u32 = 16384;

/// Rejected configuration values.
#[derive(Debug)]
pub enum ConfigError {
    Resolution(u32),
    Viscosity(f32),
    Strength(f32),
    ImpulseRadius(f32),
    Aspect(f32),
    Depth(f32),
    Shininess(f32),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Resolution(r) => write!(
                f,
                "resolution must lie between 1 and {MAX_RESOLUTION}, got {r}"
            ),
            ConfigError::Viscosity(v) => {
                write!(f, "viscosity must lie strictly between 0 and 1, got {v}")
            }
            ConfigError::Strength(s) => {
                write!(f, "strength must be positive and finite, got {s}")
            }
            ConfigError::ImpulseRadius(r) => {
                write!(f, "impulse radius must be positive and finite, got {r}")
            }
            ConfigError::Aspect(a) => {
                write!(f, "aspect ratio must be positive and finite, got {a}")
            }
            ConfigError::Depth(d) => {
                write!(f, "shading depth must be positive and finite, got {d}")
            }
            ConfigError::Shininess(s) => {
                write!(f, "specular exponent must be positive and finite, got {s}")
            }
            ConfigError::Io(e) => write!(f, "config io error: {e}"),
            ConfigError::Json(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

/// Lighting constants for the shading step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingConfig {
    /// Z component of the reconstructed normal. Smaller reads as steeper ripples.
    pub depth: f32,
    /// Directional light, normalized before use.
    pub light_dir: [f32; 3],
    pub shininess: f32,
    pub base_color: [f32; 3],
    pub ripple_color: [f32; 3],
    /// Brightness gain applied to the ripple tint per unit of height.
    pub ripple_gain: f32,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            depth: 0.15,
            light_dir: [0.5, 0.5, 1.0],
            shininess: 30.0,
            base_color: [0.0, 0.0, 0.01],
            ripple_color: [0.3, 0.3, 0.3],
            ripple_gain: 8.0,
        }
    }
}

/// Solver and display configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Side length of the square height grid, in cells.
    pub resolution: u32,
    /// Damping factor applied every step, in (0, 1).
    pub viscosity: f32,
    /// Amplitude added to cells inside the impulse disk.
    pub strength: f32,
    /// Radius of the impulse disk in normalized surface units.
    pub impulse_radius: f32,
    /// Viewport width / height. Updated on resize.
    pub aspect: f32,
    pub shading: ShadingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            viscosity: DEFAULT_VISCOSITY,
            strength: DEFAULT_STRENGTH,
            impulse_radius: DEFAULT_IMPULSE_RADIUS,
            aspect: 1.0,
            shading: ShadingConfig::default(),
        }
    }
}

fn positive_finite(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

impl SimulationConfig {
    /// Build and validate a config with default tunables.
    pub fn new(resolution: u32, viscosity: f32, strength: f32) -> Result<Self, ConfigError> {
        let config = Self {
            resolution,
            viscosity,
            strength,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Builder-style aspect override.
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution == 0 || self.resolution > MAX_RESOLUTION {
            return Err(ConfigError::Resolution(self.resolution));
        }
        // NaN fails both comparisons.
        if !(self.viscosity > 0.0 && self.viscosity < 1.0) {
            return Err(ConfigError::Viscosity(self.viscosity));
        }
        if !positive_finite(self.strength) {
            return Err(ConfigError::Strength(self.strength));
        }
        if !positive_finite(self.impulse_radius) {
            return Err(ConfigError::ImpulseRadius(self.impulse_radius));
        }
        if !positive_finite(self.aspect) {
            return Err(ConfigError::Aspect(self.aspect));
        }
        if !positive_finite(self.shading.depth) {
            return Err(ConfigError::Depth(self.shading.depth));
        }
        if !positive_finite(self.shading.shininess) {
            return Err(ConfigError::Shininess(self.shading.shininess));
        }
        if !self.resolution.is_power_of_two() {
            log::warn!(
                "resolution {} is not a power of two; GPU dispatch will pad the last workgroups",
                self.resolution
            );
        }
        Ok(())
    }

    /// Number of cells in one height grid.
    pub fn cell_count(&self) -> usize {
        self.resolution as usize * self.resolution as usize
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load_json(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_json(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolution, 512);
        assert_eq!(config.viscosity, 0.985);
        assert_eq!(config.strength, 0.5);
        assert_eq!(config.impulse_radius, 0.02);
        assert_eq!(config.shading.depth, 0.15);
    }

    #[test]
    fn test_rejects_unstable_viscosity() {
        assert!(matches!(
            SimulationConfig::new(512, 1.0, 0.5),
            Err(ConfigError::Viscosity(_))
        ));
        assert!(matches!(
            SimulationConfig::new(512, 0.0, 0.5),
            Err(ConfigError::Viscosity(_))
        ));
        assert!(matches!(
            SimulationConfig::new(512, f32::NAN, 0.5),
            Err(ConfigError::Viscosity(_))
        ));
    }

    #[test]
    fn test_rejects_bad_strength_and_resolution() {
        assert!(matches!(
            SimulationConfig::new(512, 0.9, 0.0),
            Err(ConfigError::Strength(_))
        ));
        assert!(matches!(
            SimulationConfig::new(512, 0.9, f32::INFINITY),
            Err(ConfigError::Strength(_))
        ));
        assert!(matches!(
            SimulationConfig::new(0, 0.9, 0.5),
            Err(ConfigError::Resolution(0))
        ));
        assert!(matches!(
            SimulationConfig::new(MAX_RESOLUTION + 1, 0.9, 0.5),
            Err(ConfigError::Resolution(_))
        ));
        assert!(matches!(
            SimulationConfig::new(u32::MAX, 0.9, 0.5),
            Err(ConfigError::Resolution(u32::MAX))
        ));
        assert!(SimulationConfig::new(MAX_RESOLUTION, 0.9, 0.5).is_ok());
    }

    #[test]
    fn test_non_power_of_two_is_accepted() {
        assert!(SimulationConfig::new(300, 0.9, 0.5).is_ok());
    }

    #[test]
    fn test_error_messages_name_the_field() {
        let err = SimulationConfig::new(512, 1.5, 0.5).unwrap_err();
        assert!(err.to_string().contains("viscosity"));
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "resolution": 256 }"#).unwrap();
        assert_eq!(config.resolution, 256);
        assert_eq!(config.viscosity, DEFAULT_VISCOSITY);
        assert_eq!(config.shading, ShadingConfig::default());
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("ripple_config_{}.json", std::process::id()));
        let config = SimulationConfig::new(128, 0.97, 0.25).unwrap().with_aspect(1.5);
        config.save_json(&path).unwrap();
        let loaded = SimulationConfig::load_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_json_validates() {
        let path = std::env::temp_dir()
            .join(format!("ripple_bad_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "viscosity": 1.2 }"#).unwrap();
        let result = SimulationConfig::load_json(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Viscosity(_))));
    }
}
