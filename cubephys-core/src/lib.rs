pub mod config;
pub mod contact;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod particle;
pub mod rigid_body;
pub mod runtime;
pub mod world;

pub use config::{DragConfig, RigidBodyConfig, WorldConfig};
pub use contact::{Contact, ContactOutcome, ContactSettings};
pub use error::SimError;
pub use forces::{DragTorque, ForceGenerator, ForceRegistry};
pub use integrator::{FixedTimestep, FrameReport};
pub use particle::{Particle, ParticleKind, GRAVITY};
pub use rigid_body::{RigidBody, CORNER_COUNT};
pub use runtime::{
    build_simulation_context, build_simulation_context_from_source, get_body_states,
    run_scenario, run_scenario_source, step_simulation, BodyState, Scenario, ScenarioAction,
    ScenarioEvent, SimulationContext, SimulationResult,
};
pub use world::{FrameInput, ParticlePool, SlotHandle, StepReport, World};
