//! Projectile vs rigid body contacts
//!
//! A `Contact` lives for one `resolve` call. Detection treats the cube as a
//! sphere around its center; the corner particles do not take part.

use crate::particle::Particle;
use crate::rigid_body::RigidBody;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Tunables shared by every contact the world resolves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSettings {
    /// Bounciness `k` in the (1 + k) impulse factor
    pub restitution: f32,
    /// Extra multiplier on the projectile's velocity change
    pub elasticity: f32,
    /// Projectile radius multiplier used for detection
    pub projectile_radius_scale: f32,
    /// Approach-speed bias subtracted from the separating velocity.
    /// `None` uses the rigid body's half-diagonal.
    pub separating_bias: Option<f32>,
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self {
            restitution: 1.0,
            elasticity: 1.2,
            projectile_radius_scale: 3.0,
            separating_bias: None,
        }
    }
}

/// What a call to `Contact::resolve` did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactOutcome {
    /// No overlap this step
    Clear,
    /// Overlap was found and the projectile was consumed
    Collided {
        penetration_depth: f32,
        impulse: f32,
    },
}

impl ContactOutcome {
    pub fn collided(&self) -> bool {
        matches!(self, ContactOutcome::Collided { .. })
    }
}

/// One potential collision between the rigid body and a projectile
pub struct Contact<'a> {
    pub rigid_body: &'a mut RigidBody,
    pub projectile: &'a mut Particle,
    /// Points from the projectile toward the rigid body
    pub normal: Vec3,
    pub penetration_depth: f32,
    pub settings: ContactSettings,
}

impl<'a> Contact<'a> {
    pub fn new(
        rigid_body: &'a mut RigidBody,
        projectile: &'a mut Particle,
        settings: ContactSettings,
    ) -> Self {
        Self {
            rigid_body,
            projectile,
            normal: Vec3::ZERO,
            penetration_depth: 0.0,
            settings,
        }
    }

    /// Detect, respond, separate, then consume the projectile
    pub fn resolve(mut self) -> ContactOutcome {
        if !self.check_collision() {
            return ContactOutcome::Clear;
        }

        // Coincident centers: fall back to the projectile's heading
        let offset = self.rigid_body.position() - self.projectile.position;
        self.normal = offset
            .try_normalize()
            .unwrap_or_else(|| self.projectile.velocity.normalize_or_zero());

        let impulse = self.resolve_velocity();
        self.resolve_interpenetration();
        self.projectile.deactivate();

        tracing::debug!(
            depth = self.penetration_depth,
            impulse,
            "projectile hit rigid body"
        );

        ContactOutcome::Collided {
            penetration_depth: self.penetration_depth,
            impulse,
        }
    }

    /// Update the penetration depth; true when the bodies overlap
    pub fn check_collision(&mut self) -> bool {
        self.penetration_depth = self.compute_penetration_depth();
        self.penetration_depth <= 0.0
    }

    /// Center distance minus the sum of effective radii
    pub fn compute_penetration_depth(&self) -> f32 {
        let distance = self.rigid_body.position().distance(self.projectile.position);
        let radius_sum = self.rigid_body.contact_radius()
            + self.projectile.radius * self.settings.projectile_radius_scale;
        distance - radius_sum
    }

    /// Relative normal velocity, biased toward approaching
    pub fn separating_velocity(&self) -> f32 {
        let relative = self.rigid_body.velocity() - self.projectile.velocity;
        relative.dot(self.normal) - self.bias()
    }

    fn bias(&self) -> f32 {
        self.settings
            .separating_bias
            .unwrap_or(self.rigid_body.half_diagonal)
    }

    /// Apply the collision impulse; returns its magnitude (0 when skipped)
    pub fn resolve_velocity(&mut self) -> f32 {
        if self.normal == Vec3::ZERO {
            return 0.0;
        }
        let separating = self.separating_velocity();
        if separating > 0.0 {
            return 0.0;
        }

        let inv_rb = self.rigid_body.inverse_effective_mass();
        let inv_projectile = self.projectile.inverse_mass();
        let total_inverse_mass = inv_rb + inv_projectile;
        if total_inverse_mass <= 0.0 {
            return 0.0;
        }

        let impulse = (1.0 + self.settings.restitution) * -separating / total_inverse_mass;

        self.rigid_body.body.velocity -= self.normal * impulse * inv_rb;
        // Simplified spin coupling; no inertia tensor involved
        let spin = impulse * self.rigid_body.body.inverse_mass();
        self.rigid_body.angular_vel -= Vec3::splat(spin);
        self.projectile.velocity -=
            self.normal * impulse * self.settings.elasticity * inv_projectile;

        impulse
    }

    /// Push the bodies apart along the normal by their inverse-mass share
    pub fn resolve_interpenetration(&mut self) {
        if self.penetration_depth > 0.0 || self.normal == Vec3::ZERO {
            return;
        }
        let inv_rb = self.rigid_body.inverse_effective_mass();
        let inv_projectile = self.projectile.inverse_mass();
        let total_inverse_mass = inv_rb + inv_projectile;
        if total_inverse_mass <= 0.0 {
            return;
        }

        let move_per_inverse_mass = self.normal * (-self.penetration_depth / total_inverse_mass);
        self.rigid_body.body.position += move_per_inverse_mass * inv_rb;
        self.projectile.position -= move_per_inverse_mass * inv_projectile;
    }
}
