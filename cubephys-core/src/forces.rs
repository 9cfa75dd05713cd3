//! Force and torque generators
//!
//! Generators are pure functions of the target's current state plus their
//! own configuration. They return the contribution; the caller (usually
//! `ForceRegistry`) adds it to the target's accumulator.

use crate::particle::{Particle, GRAVITY, SPRING_CONSTANT, SPRING_REST_LENGTH};
use crate::rigid_body::RigidBody;
use crate::world::{ParticlePool, SlotHandle};
use glam::Vec3;

/// Default minimum radius before the centripetal generator pushes outward
pub const CENTRIPETAL_RADIUS_MIN: f32 = 5.0;

/// A force contribution acting on a single particle
#[derive(Debug, Clone, PartialEq)]
pub enum ForceGenerator {
    /// f = (0, G, 0) * m
    Gravity,
    /// f = const_acc * m
    ConstantForce,
    /// f = -v^ * (k1|v| + k2|v|^2)
    Drag { k1: f32, k2: f32 },
    /// Spring whose other end is relinked every step
    BasicSpring { k: f32, rest_length: f32, other_end: Vec3 },
    /// Spring whose other end is fixed in world space
    AnchoredSpring { k: f32, rest_length: f32, anchor: Vec3 },
    /// Spring that only pulls, once stretched past its rest length
    ElasticBungee { k: f32, rest_length: f32, other_end: Vec3 },
    /// Attracts toward `center`, repels inside `radius_min`
    Centripetal { center: Vec3, radius_min: f32 },
}

impl ForceGenerator {
    pub fn drag(k1: f32, k2: f32) -> Self {
        Self::Drag { k1, k2 }
    }

    pub fn basic_spring() -> Self {
        Self::BasicSpring {
            k: SPRING_CONSTANT,
            rest_length: SPRING_REST_LENGTH,
            other_end: Vec3::ZERO,
        }
    }

    pub fn anchored_spring(anchor: Vec3) -> Self {
        Self::AnchoredSpring {
            k: SPRING_CONSTANT,
            rest_length: SPRING_REST_LENGTH,
            anchor,
        }
    }

    pub fn elastic_bungee() -> Self {
        Self::ElasticBungee {
            k: SPRING_CONSTANT,
            rest_length: SPRING_REST_LENGTH,
            other_end: Vec3::ZERO,
        }
    }

    pub fn centripetal(center: Vec3) -> Self {
        Self::Centripetal {
            center,
            radius_min: CENTRIPETAL_RADIUS_MIN,
        }
    }

    /// Point the free end of a two-ended spring at `end`.
    /// Returns false for generators without a relinkable end.
    pub fn link_other_end(&mut self, end: Vec3) -> bool {
        match self {
            Self::BasicSpring { other_end, .. } | Self::ElasticBungee { other_end, .. } => {
                *other_end = end;
                true
            }
            _ => false,
        }
    }

    /// Force this generator exerts on `particle` right now
    pub fn force_on(&self, particle: &Particle) -> Vec3 {
        match self {
            Self::Gravity => {
                if particle.gravity_active {
                    Vec3::new(0.0, GRAVITY, 0.0) * particle.mass
                } else {
                    Vec3::ZERO
                }
            }
            Self::ConstantForce => {
                if particle.constant_force_active {
                    particle.const_acc * particle.mass
                } else {
                    Vec3::ZERO
                }
            }
            Self::Drag { k1, k2 } => {
                if particle.drag_active {
                    quadratic_drag(particle.velocity, *k1, *k2)
                } else {
                    Vec3::ZERO
                }
            }
            Self::BasicSpring {
                k,
                rest_length,
                other_end,
            } => spring_force(particle.position - *other_end, *k, *rest_length),
            Self::AnchoredSpring {
                k,
                rest_length,
                anchor,
            } => spring_force(particle.position - *anchor, *k, *rest_length),
            Self::ElasticBungee {
                k,
                rest_length,
                other_end,
            } => {
                let d = particle.position - *other_end;
                if d.length() > *rest_length {
                    spring_force(d, *k, *rest_length)
                } else {
                    Vec3::ZERO
                }
            }
            Self::Centripetal { center, radius_min } => {
                let v = *center - particle.position;
                let radius = v.length();
                if radius == 0.0 {
                    return Vec3::ZERO;
                }
                // Flip to a push inside the minimum radius so the orbit can't collapse
                let sign = if radius < *radius_min { -1.0 } else { 1.0 };
                let magnitude = v.length_squared() / radius;
                v / radius * magnitude * sign
            }
        }
    }
}

/// d^ * (|d| - rest) * -k, zero for a degenerate displacement
fn spring_force(displacement: Vec3, k: f32, rest_length: f32) -> Vec3 {
    let length = displacement.length();
    if length == 0.0 {
        return Vec3::ZERO;
    }
    displacement / length * (length - rest_length) * -k
}

/// -v^ * (k1|v| + k2|v|^2), zero when v is zero
fn quadratic_drag(velocity: Vec3, k1: f32, k2: f32) -> Vec3 {
    let speed = velocity.length();
    if speed == 0.0 {
        return Vec3::ZERO;
    }
    let drag = k1 * speed + k2 * speed * speed;
    velocity / speed * -drag
}

/// Quadratic drag acting on a rigid body's angular velocity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTorque {
    pub k1: f32,
    pub k2: f32,
}

impl DragTorque {
    pub fn new(k1: f32, k2: f32) -> Self {
        Self { k1, k2 }
    }

    pub fn torque_on(&self, rigid_body: &RigidBody) -> Vec3 {
        if !rigid_body.body.drag_active {
            return Vec3::ZERO;
        }
        quadratic_drag(rigid_body.angular_vel, self.k1, self.k2)
    }

    /// Compute and accumulate in one call
    pub fn update_torque(&self, rigid_body: &mut RigidBody) {
        let torque = self.torque_on(rigid_body);
        rigid_body.add_torque_accum(torque);
    }
}

/// A generator bound to one spawn in the pool, optionally relinked to another
#[derive(Debug, Clone, PartialEq)]
pub struct ForceRegistration {
    pub target: SlotHandle,
    pub generator: ForceGenerator,
    pub linked: Option<SlotHandle>,
}

/// Links particles to the generators acting on them
#[derive(Debug, Default, Clone)]
pub struct ForceRegistry {
    registrations: Vec<ForceRegistration>,
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `generator` to `particle` for this step
    pub fn add(particle: &mut Particle, generator: &ForceGenerator) {
        let force = generator.force_on(particle);
        particle.add_force_accum(force);
    }

    /// Keep `generator` acting on `target` every step
    pub fn register(&mut self, target: SlotHandle, generator: ForceGenerator) {
        self.registrations.push(ForceRegistration {
            target,
            generator,
            linked: None,
        });
    }

    /// Like `register`, but the generator's free end follows `other`
    pub fn register_linked(&mut self, target: SlotHandle, other: SlotHandle, generator: ForceGenerator) {
        self.registrations.push(ForceRegistration {
            target,
            generator,
            linked: Some(other),
        });
    }

    /// Drop every registration touching pool slot `slot`
    pub fn unregister(&mut self, slot: usize) {
        self.registrations
            .retain(|reg| reg.target.index != slot && reg.linked.map(|l| l.index) != Some(slot));
    }

    pub fn clear(&mut self) {
        self.registrations.clear();
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn registrations(&self) -> &[ForceRegistration] {
        &self.registrations
    }

    /// Drop registrations whose target or linked end has despawned, then
    /// accumulate the rest
    pub fn apply_all(&mut self, pool: &mut ParticlePool) {
        let before = self.registrations.len();
        self.registrations.retain(|reg| {
            pool.is_current(reg.target) && reg.linked.map_or(true, |other| pool.is_current(other))
        });
        if self.registrations.len() < before {
            tracing::debug!(dropped = before - self.registrations.len(), "stale force registrations dropped");
        }

        for reg in &mut self.registrations {
            if let Some(end) = reg.linked.and_then(|other| pool.get(other.index)).map(|p| p.position) {
                reg.generator.link_other_end(end);
            }
            if let Some(target) = pool.get_mut(reg.target.index) {
                Self::add(target, &reg.generator);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleKind;

    fn particle_at(position: Vec3) -> Particle {
        let mut p = Particle::new();
        p.init_particle(ParticleKind::Laser, position);
        p.velocity = Vec3::ZERO;
        p
    }

    #[test]
    fn test_gravity_respects_toggle() {
        let mut p = particle_at(Vec3::ZERO);
        p.mass = 2.0;
        p.gravity_active = true;
        assert_eq!(ForceGenerator::Gravity.force_on(&p), Vec3::new(0.0, -20.0, 0.0));

        p.gravity_active = false;
        assert_eq!(ForceGenerator::Gravity.force_on(&p), Vec3::ZERO);
    }

    #[test]
    fn test_constant_force_scales_with_mass() {
        let mut p = particle_at(Vec3::ZERO);
        p.mass = 3.0;
        p.const_acc = Vec3::new(1.0, 2.0, 0.0);
        assert_eq!(
            ForceGenerator::ConstantForce.force_on(&p),
            Vec3::new(3.0, 6.0, 0.0)
        );
    }

    #[test]
    fn test_drag_on_resting_particle_is_zero() {
        let mut p = particle_at(Vec3::ZERO);
        p.drag_active = true;
        let f = ForceGenerator::drag(0.9, 0.1).force_on(&p);
        assert_eq!(f, Vec3::ZERO);
        assert!(!f.x.is_nan());
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let mut p = particle_at(Vec3::ZERO);
        p.drag_active = true;
        p.velocity = Vec3::new(2.0, 0.0, 0.0);
        // 0.9 * 2 + 0.1 * 4 = 2.2
        let f = ForceGenerator::drag(0.9, 0.1).force_on(&p);
        assert!((f - Vec3::new(-2.2, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_spring_at_anchor_is_zero() {
        let p = particle_at(Vec3::ZERO);
        let f = ForceGenerator::anchored_spring(Vec3::ZERO).force_on(&p);
        assert_eq!(f, Vec3::ZERO);
    }

    #[test]
    fn test_centripetal_pulls_outside_min_radius() {
        let p = particle_at(Vec3::new(10.0, 0.0, 0.0));
        let f = ForceGenerator::centripetal(Vec3::ZERO).force_on(&p);
        assert!(f.x < 0.0);
    }

    #[test]
    fn test_centripetal_pushes_inside_min_radius() {
        let p = particle_at(Vec3::new(2.0, 0.0, 0.0));
        let f = ForceGenerator::centripetal(Vec3::ZERO).force_on(&p);
        assert!(f.x > 0.0);
    }

    #[test]
    fn test_link_other_end_only_for_two_ended_springs() {
        let mut spring = ForceGenerator::basic_spring();
        assert!(spring.link_other_end(Vec3::ONE));
        let mut anchored = ForceGenerator::anchored_spring(Vec3::ZERO);
        assert!(!anchored.link_other_end(Vec3::ONE));
    }

    fn pool_with(positions: &[Vec3]) -> (ParticlePool, Vec<SlotHandle>) {
        let mut pool = ParticlePool::new(positions.len() + 1);
        let handles = positions
            .iter()
            .map(|position| {
                let slot = pool.spawn(ParticleKind::Laser, *position).unwrap();
                pool.get_mut(slot).unwrap().velocity = Vec3::ZERO;
                pool.handle(slot).unwrap()
            })
            .collect();
        (pool, handles)
    }

    #[test]
    fn test_registry_follows_linked_slot() {
        let (mut pool, handles) = pool_with(&[Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO]);
        let mut registry = ForceRegistry::new();
        registry.register_linked(handles[0], handles[1], ForceGenerator::basic_spring());

        registry.apply_all(&mut pool);
        // Stretched 10 against rest 5: pulled back toward slot 1
        assert!((pool.get(0).unwrap().force_accum.x - (-2.5)).abs() < 1e-5);
        assert_eq!(pool.get(1).unwrap().force_accum, Vec3::ZERO);
    }

    #[test]
    fn test_registry_drops_inactive_targets() {
        let mut pool = ParticlePool::new(1);
        let mut registry = ForceRegistry::new();
        registry.register(pool.handle(0).unwrap(), ForceGenerator::Gravity);
        registry.apply_all(&mut pool);
        assert_eq!(pool.get(0).unwrap().force_accum, Vec3::ZERO);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_respawned_slot_sheds_old_generator() {
        let (mut pool, handles) = pool_with(&[Vec3::new(0.0, 10.0, 0.0)]);
        let mut registry = ForceRegistry::new();
        registry.register(handles[0], ForceGenerator::anchored_spring(Vec3::ZERO));

        pool.get_mut(0).unwrap().deactivate();
        assert_eq!(pool.spawn(ParticleKind::Laser, Vec3::new(0.0, 10.0, 0.0)), Some(0));
        assert!(!pool.is_current(handles[0]));

        registry.apply_all(&mut pool);
        assert_eq!(pool.get(0).unwrap().force_accum, Vec3::ZERO);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_spring_dropped_when_other_end_despawns() {
        let (mut pool, handles) = pool_with(&[Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO]);
        let mut registry = ForceRegistry::new();
        registry.register_linked(handles[0], handles[1], ForceGenerator::basic_spring());

        pool.get_mut(1).unwrap().deactivate();
        registry.apply_all(&mut pool);
        assert_eq!(pool.get(0).unwrap().force_accum, Vec3::ZERO);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_removes_links_both_ways() {
        let (_pool, handles) = pool_with(&[Vec3::ZERO, Vec3::X, Vec3::Y]);
        let mut registry = ForceRegistry::new();
        registry.register_linked(handles[0], handles[1], ForceGenerator::basic_spring());
        registry.register_linked(handles[1], handles[0], ForceGenerator::basic_spring());
        registry.register(handles[2], ForceGenerator::Gravity);
        registry.unregister(1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.registrations()[0].target.index, 2);
    }
}
