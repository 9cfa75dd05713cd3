//! The particle world: projectile pool, rigid cube and the per-step loop
//!
//! One call to `World::step` runs
//! `start_frame -> check_input -> run_physics`. Inside `run_physics`, forces
//! are fully accumulated for a body before it integrates, and every body
//! integrates before contacts are checked.

use crate::config::WorldConfig;
use crate::contact::{Contact, ContactOutcome};
use crate::error::Result;
use crate::forces::{DragTorque, ForceGenerator, ForceRegistry};
use crate::particle::{Particle, ParticleKind};
use crate::rigid_body::{RigidBody, CORNER_COUNT};
use glam::Vec3;

/// Input flags for one frame. Flags are consumed by the first step that
/// sees them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    pub fire: bool,
    /// Kind spawned on `fire`
    pub kind: ParticleKind,
    pub reset: bool,
    /// Spring kind to spawn as a linked pair
    pub spring_pair: Option<ParticleKind>,
}

impl FrameInput {
    pub fn fire(kind: ParticleKind) -> Self {
        Self {
            fire: true,
            kind,
            ..Self::default()
        }
    }

    pub fn spring_pair(kind: ParticleKind) -> Self {
        Self {
            spring_pair: Some(kind),
            ..Self::default()
        }
    }

    pub fn reset() -> Self {
        Self {
            reset: true,
            ..Self::default()
        }
    }
}

/// A pool slot together with the spawn that filled it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    pub index: usize,
    pub generation: u32,
}

/// Fixed-size projectile storage; slots are reused once inactive.
/// Every spawn bumps the slot's generation so old handles go stale.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    slots: Vec<Particle>,
    generations: Vec<u32>,
}

impl ParticlePool {
    pub fn new(size: usize) -> Self {
        Self {
            slots: (0..size).map(|_| Particle::new()).collect(),
            generations: vec![0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Particle> {
        self.slots.get(slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Particle> {
        self.slots.get_mut(slot)
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.slots
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.slots.iter()
    }

    /// Handle to whatever currently occupies `slot`
    pub fn handle(&self, slot: usize) -> Option<SlotHandle> {
        let generation = *self.generations.get(slot)?;
        Some(SlotHandle {
            index: slot,
            generation,
        })
    }

    /// True while the spawn `handle` refers to is still alive
    pub fn is_current(&self, handle: SlotHandle) -> bool {
        self.generations.get(handle.index) == Some(&handle.generation)
            && self.slots[handle.index].is_active()
    }

    pub fn first_inactive(&self) -> Option<usize> {
        self.slots.iter().position(|p| !p.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|p| p.is_active()).count()
    }

    pub fn free_count(&self) -> usize {
        self.slots.len() - self.active_count()
    }

    /// Initialize the first free slot; `None` when the pool is exhausted
    pub fn spawn(&mut self, kind: ParticleKind, position: Vec3) -> Option<usize> {
        let slot = self.first_inactive()?;
        self.slots[slot].init_particle(kind, position);
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        Some(slot)
    }
}

/// What happened during one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub spawned: Option<usize>,
    /// Anchor and free slots of a spawned spring pair
    pub spring_pair: Option<(usize, usize)>,
    pub reset: bool,
    /// Slots of projectiles consumed by the rigid body
    pub collisions: Vec<usize>,
}

#[derive(Debug)]
pub struct World {
    pub config: WorldConfig,
    pub rigid_body: RigidBody,
    pub corners: [Particle; CORNER_COUNT],
    pub projectiles: ParticlePool,
    pub registry: ForceRegistry,
    gravity: ForceGenerator,
    constant: ForceGenerator,
    drag: ForceGenerator,
    drag_torque: DragTorque,
    /// Simulated seconds so far
    pub elapsed: f32,
    pub steps: u64,
}

impl World {
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;

        let mut corners: [Particle; CORNER_COUNT] = std::array::from_fn(|_| Particle::new());
        let rigid_body = RigidBody::new(
            config.rigid_body.start_position,
            config.rigid_body.half_diagonal,
            &mut corners,
        );

        Ok(Self {
            rigid_body,
            corners,
            projectiles: ParticlePool::new(config.pool_size),
            registry: ForceRegistry::new(),
            gravity: ForceGenerator::Gravity,
            constant: ForceGenerator::ConstantForce,
            drag: ForceGenerator::drag(config.drag.k1, config.drag.k2),
            drag_torque: DragTorque::new(config.torque_drag.k1, config.torque_drag.k2),
            elapsed: 0.0,
            steps: 0,
            config,
        })
    }

    /// One full fixed step
    pub fn step(&mut self, dt: f32, input: &mut FrameInput) -> StepReport {
        self.start_frame();
        let mut report = self.check_input(input);
        report.collisions = self.run_physics(dt);
        self.elapsed += dt;
        self.steps += 1;
        tracing::trace!(step = self.steps, dt, "step complete");
        report
    }

    /// Clear every force and torque accumulator
    pub fn start_frame(&mut self) {
        self.rigid_body.clear_force_accum();
        self.rigid_body.clear_torque_accum();
        for particle in self.projectiles.as_mut_slice() {
            particle.clear_force_accum();
        }
    }

    /// Handle fire/reset flags, clearing them afterwards
    pub fn check_input(&mut self, input: &mut FrameInput) -> StepReport {
        let mut report = StepReport::default();

        if input.fire {
            report.spawned = self.fire(input.kind);
        }

        if let Some(kind) = input.spring_pair {
            report.spring_pair = self.spawn_spring_pair(kind);
        }

        if input.reset {
            self.rigid_body
                .reset_pose(self.config.rigid_body.reset_position);
            self.rigid_body.calc_rb_particles(&mut self.corners);
            tracing::debug!(position = ?self.config.rigid_body.reset_position, "rigid body reset");
            report.reset = true;
        }

        input.fire = false;
        input.reset = false;
        input.spring_pair = None;
        report
    }

    /// Spawn `kind` at the configured spawn position
    pub fn fire(&mut self, kind: ParticleKind) -> Option<usize> {
        let slot = self.projectiles.spawn(kind, self.config.spawn_position);
        match slot {
            Some(slot) => tracing::debug!(slot, ?kind, "projectile fired"),
            None => tracing::debug!(?kind, "no free projectile slot"),
        }
        slot
    }

    /// Spawn two particles of a spring `kind` joined by registered springs.
    ///
    /// Basic springs and bungees act on both ends, each following the other.
    /// An anchored spring holds the free end to the first particle, which is
    /// made immovable. Returns `(anchor, free)` slots, or `None` when `kind`
    /// is not a spring or fewer than two slots are free.
    pub fn spawn_spring_pair(&mut self, kind: ParticleKind) -> Option<(usize, usize)> {
        let Some([anchor_position, free_position]) = kind.spring_pair_positions() else {
            tracing::warn!(?kind, "spring pair requested for a non-spring kind");
            return None;
        };
        if self.projectiles.free_count() < 2 {
            tracing::debug!(?kind, "not enough free slots for a spring pair");
            return None;
        }

        let anchor = self.projectiles.spawn(kind, anchor_position)?;
        let free = self.projectiles.spawn(kind, free_position)?;
        let anchor_handle = self.projectiles.handle(anchor)?;
        let free_handle = self.projectiles.handle(free)?;

        for slot in [anchor, free] {
            if let Some(particle) = self.projectiles.get_mut(slot) {
                // Pairs only feel their springs, gravity and drag
                particle.constant_force_active = false;
            }
        }
        if let Some(particle) = self.projectiles.get_mut(anchor) {
            particle.velocity = Vec3::ZERO;
            if kind == ParticleKind::AnchoredSpring {
                particle.mass = 0.0;
            }
        }

        match kind {
            ParticleKind::AnchoredSpring => self
                .registry
                .register(free_handle, ForceGenerator::anchored_spring(anchor_position)),
            _ => {
                let spring = if kind == ParticleKind::ElasticBungee {
                    ForceGenerator::elastic_bungee()
                } else {
                    ForceGenerator::basic_spring()
                };
                self.registry
                    .register_linked(free_handle, anchor_handle, spring.clone());
                self.registry.register_linked(anchor_handle, free_handle, spring);
            }
        }

        tracing::debug!(anchor, free, ?kind, "spring pair spawned");
        Some((anchor, free))
    }

    /// Integrate everything and resolve contacts; returns consumed slots
    pub fn run_physics(&mut self, dt: f32) -> Vec<usize> {
        self.registry.apply_all(&mut self.projectiles);

        for particle in self.projectiles.as_mut_slice() {
            if !particle.is_active() {
                continue;
            }
            accum_all_forces(particle, &self.gravity, &self.constant, &self.drag);
            particle.update_motion(dt);
            particle.calculate_derived_data();
        }

        accum_all_forces(
            &mut self.rigid_body.body,
            &self.gravity,
            &self.constant,
            &self.drag,
        );
        self.drag_torque.update_torque(&mut self.rigid_body);
        self.rigid_body.update_motion(dt);
        self.rigid_body.calc_rb_particles(&mut self.corners);

        self.resolve_contacts()
    }

    /// Check every active projectile against the rigid body
    pub fn resolve_contacts(&mut self) -> Vec<usize> {
        let settings = self.config.contact;
        let mut consumed = Vec::new();

        for (slot, projectile) in self.projectiles.as_mut_slice().iter_mut().enumerate() {
            if !projectile.is_active() {
                continue;
            }
            let outcome = Contact::new(&mut self.rigid_body, projectile, settings).resolve();
            if let ContactOutcome::Collided { .. } = outcome {
                consumed.push(slot);
            }
        }

        if !consumed.is_empty() {
            self.rigid_body.calc_rb_particles(&mut self.corners);
        }
        consumed
    }
}

/// Gravity, constant force and drag; registered generators run separately
fn accum_all_forces(
    particle: &mut Particle,
    gravity: &ForceGenerator,
    constant: &ForceGenerator,
    drag: &ForceGenerator,
) {
    ForceRegistry::add(particle, drag);
    ForceRegistry::add(particle, gravity);
    ForceRegistry::add(particle, constant);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(WorldConfig::default()).unwrap()
    }

    #[test]
    fn test_fire_uses_first_inactive_slot() {
        let mut world = world();
        let mut input = FrameInput::fire(ParticleKind::Bullet);
        let report = world.check_input(&mut input);
        assert_eq!(report.spawned, Some(0));
        assert!(!input.fire, "fire flag is consumed");

        world.projectiles.get_mut(0).unwrap().deactivate();
        world.projectiles.get_mut(1).unwrap().init_particle(ParticleKind::Laser, Vec3::ZERO);
        assert_eq!(world.fire(ParticleKind::Bullet), Some(0));
        assert_eq!(world.fire(ParticleKind::Bullet), Some(2));
    }

    #[test]
    fn test_fire_with_full_pool_spawns_nothing() {
        let config = WorldConfig {
            pool_size: 1,
            ..WorldConfig::default()
        };
        let mut world = World::new(config).unwrap();
        assert_eq!(world.fire(ParticleKind::Laser), Some(0));
        assert_eq!(world.fire(ParticleKind::Laser), None);
    }

    #[test]
    fn test_reset_moves_rigid_body_and_clears_orientation() {
        let mut world = world();
        world.rigid_body.body.position = Vec3::new(-50.0, 0.0, 0.0);
        world.rigid_body.body.orientation = Vec3::splat(30.0);

        let mut input = FrameInput::reset();
        let report = world.check_input(&mut input);
        assert!(report.reset);
        assert!(!input.reset);
        assert_eq!(world.rigid_body.position(), Vec3::new(12.0, 20.0, 0.0));
        assert_eq!(world.rigid_body.orientation(), Vec3::ZERO);
    }

    #[test]
    fn test_start_frame_clears_all_accumulators() {
        let mut world = world();
        world.fire(ParticleKind::Bullet);
        world.projectiles.get_mut(0).unwrap().add_force_accum(Vec3::ONE);
        world.rigid_body.add_force_accum(Vec3::ONE);
        world.rigid_body.add_torque_accum(Vec3::ONE);

        world.start_frame();
        assert_eq!(world.projectiles.get(0).unwrap().force_accum, Vec3::ZERO);
        assert_eq!(world.rigid_body.body.force_accum, Vec3::ZERO);
        assert_eq!(world.rigid_body.torque_accum, Vec3::ZERO);
    }

    #[test]
    fn test_inactive_slots_are_not_integrated() {
        let mut world = world();
        world.step(0.1, &mut FrameInput::default());
        let slot = world.projectiles.get(0).unwrap();
        assert_eq!(slot.position, Vec3::ZERO);
        assert_eq!(slot.force_accum, Vec3::ZERO);
    }

    #[test]
    fn test_spring_pair_registers_linked_springs() {
        let mut world = world();
        let mut input = FrameInput::spring_pair(ParticleKind::BasicSpring);
        let report = world.check_input(&mut input);

        assert_eq!(report.spring_pair, Some((0, 1)));
        assert_eq!(input.spring_pair, None);
        assert_eq!(world.registry.len(), 2);
        assert_eq!(world.projectiles.get(0).unwrap().velocity, Vec3::ZERO);
    }

    #[test]
    fn test_anchored_pair_has_immovable_anchor() {
        let mut world = world();
        let (anchor, free) = world.spawn_spring_pair(ParticleKind::AnchoredSpring).unwrap();
        assert_eq!(world.projectiles.get(anchor).unwrap().mass, 0.0);
        assert_eq!(world.registry.len(), 1);
        assert_eq!(world.registry.registrations()[0].target.index, free);

        for _ in 0..30 {
            world.step(1.0 / 60.0, &mut FrameInput::default());
        }
        assert_eq!(world.projectiles.get(anchor).unwrap().position, Vec3::ZERO);
        assert_ne!(world.projectiles.get(free).unwrap().position, Vec3::new(0.0, -5.0, 0.0));
    }

    #[test]
    fn test_spring_pair_rejected_without_room() {
        let config = WorldConfig {
            pool_size: 1,
            ..WorldConfig::default()
        };
        let mut world = World::new(config).unwrap();
        assert_eq!(world.spawn_spring_pair(ParticleKind::BasicSpring), None);
        assert_eq!(world.spawn_spring_pair(ParticleKind::Laser), None);
        assert_eq!(world.projectiles.active_count(), 0);
        assert!(world.registry.is_empty());
    }

    #[test]
    fn test_drag_torque_damps_spin() {
        let mut world = world();
        world.rigid_body.angular_vel = Vec3::new(0.0, 5.0, 0.0);
        let mut previous = world.rigid_body.angular_vel.length();
        for _ in 0..20 {
            world.step(1.0 / 60.0, &mut FrameInput::default());
            let current = world.rigid_body.angular_vel.length();
            assert!(current <= previous);
            previous = current;
        }
        assert!(previous < 5.0);
    }
}
