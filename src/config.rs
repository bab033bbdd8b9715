//! Run configuration loaded from YAML.
//!
//! A scenario names the simulated-time limit, an optional redraw rate and exactly
//! one particle source:
//!
//! ```yaml
//! limit: 100.0          # simulated time units
//! redraw_hz: 0.5        # optional; redraw markers per time unit
//! random:               # either generate particles ...
//!   count: 200
//!   radius: 0.01
//!   mass: 0.5
//!   max_speed: 0.005
//!   seed: 42
//! # particle_file: particles.txt   # ... or load them from a text file
//! ```

use crate::core::CollisionSystem;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Parameters for generating a random population of identical disks.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RandomConfig {
    pub count: usize,
    pub radius: f64,
    pub mass: f64,
    /// Velocity components are drawn from `[-max_speed, max_speed]`.
    pub max_speed: f64,
    /// RNG seed for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            count: 100,
            radius: 0.02,
            mass: 0.5,
            max_speed: 0.005,
            seed: None,
        }
    }
}

impl RandomConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 || self.radius >= 0.5 {
            return Err(Error::InvalidParam(
                "radius must be finite and in (0, 0.5)".into(),
            ));
        }
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be finite and > 0".into()));
        }
        if !self.max_speed.is_finite() || self.max_speed < 0.0 {
            return Err(Error::InvalidParam(
                "max_speed must be finite and >= 0".into(),
            ));
        }
        Ok(())
    }
}

/// Top-level scenario description.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulated-time limit passed to `simulate`.
    pub limit: f64,
    #[serde(default)]
    pub redraw_hz: Option<f64>,
    #[serde(default)]
    pub random: Option<RandomConfig>,
    #[serde(default)]
    pub particle_file: Option<PathBuf>,
}

impl ScenarioConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: ScenarioConfig = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a scenario file. A relative `particle_file` is resolved
    /// against the scenario file's directory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut cfg = Self::from_yaml_str(&fs::read_to_string(path)?)?;
        if let (Some(file), Some(dir)) = (cfg.particle_file.as_mut(), path.parent()) {
            if file.is_relative() {
                *file = dir.join(&*file);
            }
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.limit.is_finite() || self.limit <= 0.0 {
            return Err(Error::InvalidParam("limit must be finite and > 0".into()));
        }
        if let Some(hz) = self.redraw_hz {
            if !hz.is_finite() || hz <= 0.0 {
                return Err(Error::InvalidParam(
                    "redraw_hz must be finite and > 0".into(),
                ));
            }
        }
        match (&self.random, &self.particle_file) {
            (Some(r), None) => r.validate(),
            (None, Some(_)) => Ok(()),
            _ => Err(Error::Config(
                "exactly one of `random` or `particle_file` must be given".into(),
            )),
        }
    }

    /// Build the collision system this scenario describes.
    pub fn build_system(&self) -> Result<CollisionSystem> {
        self.validate()?;
        let sys = match (&self.random, &self.particle_file) {
            (Some(r), None) => CollisionSystem::random(r)?,
            (None, Some(path)) => CollisionSystem::from_path(path)?,
            _ => return Err(Error::Config("no unique particle source".into())),
        };
        Ok(match self.redraw_hz {
            Some(hz) => sys.with_redraw_hz(hz)?,
            None => sys,
        })
    }
}
