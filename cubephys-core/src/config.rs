//! World configuration
//!
//! Defaults reproduce the constants the simulation was tuned with. Every
//! field may be omitted from JSON and falls back to its default.

use crate::contact::ContactSettings;
use crate::error::{Result, SimError};
use crate::integrator::MAX_SUBSTEPS;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Quadratic drag constants, k1*|v| + k2*|v|^2
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub k1: f32,
    pub k2: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self { k1: 0.9, k2: 0.1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBodyConfig {
    pub start_position: Vec3,
    /// Where a reset input moves the cube
    pub reset_position: Vec3,
    pub half_diagonal: f32,
}

impl Default for RigidBodyConfig {
    fn default() -> Self {
        Self {
            start_position: Vec3::new(12.0, 20.0, 0.0),
            reset_position: Vec3::new(12.0, 20.0, 0.0),
            half_diagonal: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Upper bound of one physics sub-step (seconds)
    pub timestep: f32,
    /// Frames longer than this are treated as a stall...
    pub max_frame_time: f32,
    /// ...and replaced by this duration
    pub clamped_frame_time: f32,
    /// Number of projectile slots
    pub pool_size: usize,
    /// Where fired projectiles appear
    pub spawn_position: Vec3,
    pub drag: DragConfig,
    pub torque_drag: DragConfig,
    pub rigid_body: RigidBodyConfig,
    pub contact: ContactSettings,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 60.0,
            max_frame_time: 2.0,
            clamped_frame_time: 0.2,
            pool_size: 8,
            spawn_position: Vec3::ZERO,
            drag: DragConfig::default(),
            torque_drag: DragConfig::default(),
            rigid_body: RigidBodyConfig::default(),
            contact: ContactSettings::default(),
        }
    }
}

impl WorldConfig {
    /// Parse from JSON and validate
    pub fn from_json(source: &str) -> Result<Self> {
        let config: WorldConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.timestep > 0.0) {
            return Err(SimError::invalid("timestep", "must be positive"));
        }
        if !(self.max_frame_time > 0.0) {
            return Err(SimError::invalid("max_frame_time", "must be positive"));
        }
        if !(self.clamped_frame_time > 0.0) || self.clamped_frame_time > self.max_frame_time {
            return Err(SimError::invalid(
                "clamped_frame_time",
                format!("must be in (0, {}]", self.max_frame_time),
            ));
        }
        if self.max_frame_time / self.timestep > MAX_SUBSTEPS as f32 {
            return Err(SimError::invalid(
                "timestep",
                format!(
                    "a {} s frame would need more than {} sub-steps",
                    self.max_frame_time, MAX_SUBSTEPS
                ),
            ));
        }
        if self.pool_size == 0 {
            return Err(SimError::invalid("pool_size", "need at least one projectile slot"));
        }
        if !(self.rigid_body.half_diagonal > 0.0) {
            return Err(SimError::invalid("rigid_body.half_diagonal", "must be positive"));
        }
        for (field, drag) in [("drag", &self.drag), ("torque_drag", &self.torque_drag)] {
            if drag.k1 < 0.0 || drag.k2 < 0.0 {
                return Err(SimError::invalid(field, "drag constants can't be negative"));
            }
        }
        if self.contact.projectile_radius_scale < 0.0 {
            return Err(SimError::invalid(
                "contact.projectile_radius_scale",
                "can't be negative",
            ));
        }
        Ok(())
    }
}
