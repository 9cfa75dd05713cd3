//! Point-mass particles and their per-kind presets
//!
//! A particle accumulates forces during a step and integrates them with
//! semi-implicit Euler in `update_motion`. Its behavior on spawn is driven
//! entirely by its `ParticleKind` through a static settings table.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Gravitational acceleration along Y
pub const GRAVITY: f32 = -10.0;

/// Default per-particle visual scale, doubling as a motion-speed multiplier
pub const DEFAULT_SCALE: f32 = 10.0;

/// Default spring stiffness for spring presets
pub const SPRING_CONSTANT: f32 = 0.5;

/// Default spring rest length for spring presets
pub const SPRING_REST_LENGTH: f32 = 5.0;

/// Behavioral preset of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    #[default]
    Inactive,
    Stationary,
    Bullet,
    Artillery,
    Fireball,
    Laser,
    BasicSpring,
    AnchoredSpring,
    ElasticBungee,
}

impl ParticleKind {
    /// Kinds that can be fired into the world
    pub const PROJECTILES: [ParticleKind; 4] = [
        ParticleKind::Bullet,
        ParticleKind::Artillery,
        ParticleKind::Fireball,
        ParticleKind::Laser,
    ];

    pub fn is_active(self) -> bool {
        self != ParticleKind::Inactive
    }

    /// Start positions of the two ends of a spring pair, the anchor end
    /// first. `None` for kinds that are not springs.
    pub fn spring_pair_positions(self) -> Option<[Vec3; 2]> {
        match self {
            ParticleKind::BasicSpring => Some([
                Vec3::new(SPRING_REST_LENGTH + 3.0, 0.0, 0.0),
                Vec3::new(SPRING_REST_LENGTH, 0.0, 0.0),
            ]),
            ParticleKind::AnchoredSpring => {
                Some([Vec3::ZERO, Vec3::new(0.0, -SPRING_REST_LENGTH, 0.0)])
            }
            ParticleKind::ElasticBungee => Some([Vec3::new(-3.0, 1.0, 0.0), Vec3::ZERO]),
            _ => None,
        }
    }

    /// Spawn settings for this kind, `None` for `Inactive`
    pub fn settings(self) -> Option<&'static KindSettings> {
        let idx = match self {
            ParticleKind::Inactive => return None,
            ParticleKind::Stationary => 0,
            ParticleKind::Bullet => 1,
            ParticleKind::Artillery => 2,
            ParticleKind::Fireball => 3,
            ParticleKind::Laser => 4,
            ParticleKind::BasicSpring => 5,
            ParticleKind::AnchoredSpring => 6,
            ParticleKind::ElasticBungee => 7,
        };
        Some(&KIND_SETTINGS[idx])
    }
}

/// Initial state applied by `Particle::init_particle`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindSettings {
    pub lifetime: f32,
    pub velocity: Vec3,
    pub const_acc: Vec3,
    pub gravity: bool,
    pub drag: bool,
}

const fn preset(lifetime: f32, velocity: Vec3, const_acc: Vec3, gravity: bool, drag: bool) -> KindSettings {
    KindSettings {
        lifetime,
        velocity,
        const_acc,
        gravity,
        drag,
    }
}

// Indexed by `ParticleKind::settings`
static KIND_SETTINGS: [KindSettings; 8] = [
    // stationary
    preset(10000.0, Vec3::ZERO, Vec3::ZERO, false, true),
    // bullet
    preset(5.0, Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 9.0, 0.0), true, true),
    // artillery
    preset(5.0, Vec3::new(10.0, 20.0, 0.0), Vec3::new(5.0, 3.0, 0.0), true, true),
    // fireball
    preset(5.0, Vec3::new(5.0, 0.0, 0.0), Vec3::new(2.0, 10.0, 0.0), false, true),
    // laser
    preset(5.0, Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, false, false),
    // basic spring
    preset(100.0, Vec3::new(0.0, 0.1, 0.0), Vec3::new(-10.0, 5.0, 0.0), false, true),
    // anchored spring
    preset(100.0, Vec3::new(0.1, 0.0, 0.0), Vec3::new(100.0, 0.0, 0.0), true, true),
    // elastic bungee
    preset(100.0, Vec3::new(0.1, 0.0, 0.0), Vec3::new(100.0, 0.0, 0.0), false, true),
];

/// A point mass in the simulation
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    /// Acceleration applied by the constant-force generator
    pub const_acc: Vec3,
    pub force_accum: Vec3,
    pub mass: f32,
    pub scale: f32,
    pub radius: f32,
    /// Remaining lifetime in seconds
    pub lifetime: f32,
    pub kind: ParticleKind,
    pub gravity_active: bool,
    pub constant_force_active: bool,
    pub drag_active: bool,
    /// Rotation in degrees about X, Y and Z
    pub orientation: Vec3,
    pub transform: Mat4,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            const_acc: Vec3::ZERO,
            force_accum: Vec3::ZERO,
            mass: 1.0,
            scale: DEFAULT_SCALE,
            radius: 1.0,
            lifetime: 0.0,
            kind: ParticleKind::Inactive,
            gravity_active: true,
            constant_force_active: true,
            drag_active: true,
            orientation: Vec3::ZERO,
            transform: Mat4::IDENTITY,
        }
    }
}

impl Particle {
    /// An inactive particle waiting in a pool
    pub fn new() -> Self {
        Self::default()
    }

    /// A stationary particle at `start`
    pub fn stationary(start: Vec3) -> Self {
        let mut particle = Self::default();
        particle.init_particle(ParticleKind::Stationary, start);
        particle
    }

    pub fn is_active(&self) -> bool {
        self.kind.is_active()
    }

    /// Zero for immovable (non-positive mass) particles
    pub fn inverse_mass(&self) -> f32 {
        if self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Activate the particle as `kind` at `start`
    pub fn init_particle(&mut self, kind: ParticleKind, start: Vec3) {
        self.mass = 1.0;
        self.kind = kind;
        self.position = start;
        self.acceleration = Vec3::ZERO;
        self.force_accum = Vec3::ZERO;
        self.constant_force_active = true;

        let Some(settings) = kind.settings() else {
            tracing::warn!(?kind, "particle initialized with a kind that has no spawn settings");
            return;
        };

        self.lifetime = settings.lifetime;
        self.velocity = settings.velocity;
        self.const_acc = settings.const_acc;
        self.gravity_active = settings.gravity;
        self.drag_active = settings.drag;
    }

    /// Age the particle, deactivating it once its lifetime runs out
    pub fn despawn_particle(&mut self, dt: f32) {
        self.lifetime -= dt;

        if self.is_active() && self.lifetime <= 0.0 {
            tracing::debug!(kind = ?self.kind, "particle despawned");
            self.kind = ParticleKind::Inactive;
        }
    }

    /// Deactivate immediately regardless of remaining lifetime
    pub fn deactivate(&mut self) {
        self.kind = ParticleKind::Inactive;
        self.lifetime = 0.0;
    }

    pub fn add_force_accum(&mut self, force: Vec3) {
        self.force_accum += force;
    }

    pub fn clear_force_accum(&mut self) {
        self.force_accum = Vec3::ZERO;
    }

    /// Age, then integrate with semi-implicit Euler
    pub fn update_motion(&mut self, dt: f32) {
        self.despawn_particle(dt);
        if !self.is_active() || self.mass <= 0.0 {
            return;
        }
        self.integrate_linear(dt);
    }

    /// v += a*dt, then x += v*dt*scale
    pub(crate) fn integrate_linear(&mut self, dt: f32) {
        if self.mass <= 0.0 {
            return;
        }
        self.acceleration = self.force_accum / self.mass;
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt * self.scale;
    }

    /// Rebuild `transform` as translate * rotX * rotY * rotZ
    pub fn calculate_derived_data(&mut self) {
        self.transform = Mat4::from_translation(self.position) * rotation_matrix(self.orientation);
    }
}

/// Independent rotations about X, then Y, then Z (degrees)
pub fn rotation_matrix(orientation_deg: Vec3) -> Mat4 {
    Mat4::from_rotation_x(orientation_deg.x.to_radians())
        * Mat4::from_rotation_y(orientation_deg.y.to_radians())
        * Mat4::from_rotation_z(orientation_deg.z.to_radians())
}
