//! The rotating cube
//!
//! `RigidBody` embeds a `Particle` for its linear state and adds rotation.
//! Its eight corner particles are owned by the caller and only ever written
//! by `calc_rb_particles`; they are never force-integrated themselves.

use crate::particle::{rotation_matrix, Particle, ParticleKind};
use glam::{Mat3, Mat4, Vec3};

pub const CORNER_COUNT: usize = 8;

/// Unit offsets of the cube corners, scaled by the half-diagonal
const CORNER_SIGNS: [Vec3; CORNER_COUNT] = [
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
];

#[derive(Debug, Clone)]
pub struct RigidBody {
    /// Linear state, integrated like any other particle
    pub body: Particle,
    pub half_diagonal: f32,
    /// Degrees per second about each axis
    pub angular_vel: Vec3,
    pub torque_accum: Vec3,
    pub inertia_tensor: Mat3,
}

impl RigidBody {
    /// Build a cube at `origin` and place `corners` around it
    pub fn new(origin: Vec3, half_diagonal: f32, corners: &mut [Particle; CORNER_COUNT]) -> Self {
        let body = Particle::stationary(origin);
        let inertia_tensor = Mat3::from_diagonal(Vec3::splat(body.mass));
        let mut rigid_body = Self {
            body,
            half_diagonal,
            angular_vel: Vec3::ZERO,
            torque_accum: Vec3::ZERO,
            inertia_tensor,
        };
        for corner in corners.iter_mut() {
            corner.init_particle(ParticleKind::Stationary, origin);
        }
        rigid_body.calc_rb_particles(corners);
        rigid_body
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.body.velocity
    }

    pub fn orientation(&self) -> Vec3 {
        self.body.orientation
    }

    /// Mass seen by contacts: every corner carries the body's mass
    pub fn effective_mass(&self) -> f32 {
        self.body.mass * CORNER_COUNT as f32
    }

    pub fn inverse_effective_mass(&self) -> f32 {
        let mass = self.effective_mass();
        if mass > 0.0 {
            1.0 / mass
        } else {
            0.0
        }
    }

    /// Radius used for sphere-vs-cube contact detection
    pub fn contact_radius(&self) -> f32 {
        self.half_diagonal * std::f32::consts::FRAC_1_SQRT_2
    }

    /// Local offset of corner `index`
    pub fn corner_offset(&self, index: usize) -> Vec3 {
        CORNER_SIGNS[index] * self.half_diagonal
    }

    pub fn add_force_accum(&mut self, force: Vec3) {
        self.body.add_force_accum(force);
    }

    pub fn clear_force_accum(&mut self) {
        self.body.clear_force_accum();
    }

    pub fn add_torque_accum(&mut self, torque: Vec3) {
        self.torque_accum += torque;
    }

    pub fn clear_torque_accum(&mut self) {
        self.torque_accum = Vec3::ZERO;
    }

    /// Move to `position` with zeroed orientation; motion state is kept
    pub fn reset_pose(&mut self, position: Vec3) {
        self.body.position = position;
        self.body.orientation = Vec3::ZERO;
    }

    /// Integrate linear and angular motion. Rigid bodies never despawn.
    pub fn update_motion(&mut self, dt: f32) {
        self.body.integrate_linear(dt);

        // Damping comes solely from the drag torque generator
        let angular_acc = self.inertia_tensor.inverse() * self.torque_accum;
        self.angular_vel += angular_acc * dt;
        self.body.orientation += self.angular_vel * dt * self.body.scale;
        self.body.calculate_derived_data();
    }

    /// Slave the corners to the body's current pose.
    ///
    /// Each corner first takes the body's full pose, derives its rotated
    /// transform, then has its position replaced by the local offset and
    /// that offset composed onto the rotated transform.
    pub fn calc_rb_particles(&self, corners: &mut [Particle; CORNER_COUNT]) {
        for (index, corner) in corners.iter_mut().enumerate() {
            corner.position = self.body.position;
            corner.orientation = self.body.orientation;
            corner.calculate_derived_data();

            corner.position = self.corner_offset(index);
            corner.transform *= Mat4::from_translation(corner.position);
        }
    }

    /// World-space location of a corner computed by `calc_rb_particles`
    pub fn corner_world_position(corner: &Particle) -> Vec3 {
        corner.transform.transform_point3(Vec3::ZERO)
    }

    /// Rotation part of the current pose
    pub fn rotation(&self) -> Mat4 {
        rotation_matrix(self.body.orientation)
    }
}
