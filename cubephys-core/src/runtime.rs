use crate::config::WorldConfig;
use crate::error::Result;
use crate::integrator::FixedTimestep;
use crate::particle::ParticleKind;
use crate::world::{FrameInput, World};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// An input fired at a given frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEvent {
    pub frame: usize,
    pub action: ScenarioAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioAction {
    Fire { kind: ParticleKind },
    /// Two particles of a spring kind joined by springs
    SpringPair { kind: ParticleKind },
    Reset,
}

/// A scripted run: a world, a frame clock and timed inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: WorldConfig,
    /// Wall-clock duration of every frame (seconds)
    pub frame_time: f32,
    pub frames: usize,
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

impl Scenario {
    pub fn from_json(source: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(source)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// One laser fired from the origin at a cube sitting on the X axis
    pub fn demo(frames: usize) -> Self {
        let mut config = WorldConfig::default();
        config.rigid_body.start_position = Vec3::new(40.0, 0.0, 0.0);
        config.rigid_body.reset_position = Vec3::new(40.0, 0.0, 0.0);
        Self {
            config,
            frame_time: 1.0 / 60.0,
            frames,
            events: vec![ScenarioEvent {
                frame: 0,
                action: ScenarioAction::Fire {
                    kind: ParticleKind::Laser,
                },
            }],
        }
    }

    /// Merge every event scheduled for `frame` into one input
    fn input_for(&self, frame: usize) -> FrameInput {
        let mut input = FrameInput::default();
        for event in self.events.iter().filter(|e| e.frame == frame) {
            match event.action {
                ScenarioAction::Fire { kind } => {
                    input.fire = true;
                    input.kind = kind;
                }
                ScenarioAction::SpringPair { kind } => input.spring_pair = Some(kind),
                ScenarioAction::Reset => input.reset = true,
            }
        }
        input
    }
}

/// Renderer-facing pose of one body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyState {
    pub label: String,
    pub kind: ParticleKind,
    pub active: bool,
    pub position: Vec3,
    pub orientation: Vec3,
    pub transform: Mat4,
}

/// Final result of running a scenario
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub frames: usize,
    pub substeps: usize,
    pub collisions: usize,
    pub elapsed: f32,
    pub bodies: Vec<BodyState>,
}

/// Stepping state for a scenario in progress
#[derive(Debug)]
pub struct SimulationContext {
    pub world: World,
    pub scenario: Scenario,
    pub stepper: FixedTimestep,
    pub current_frame: usize,
    pub substeps: usize,
    pub collisions: usize,
}

pub fn build_simulation_context(scenario: &Scenario) -> Result<SimulationContext> {
    let world = World::new(scenario.config.clone())?;
    let stepper = FixedTimestep::from_config(&world.config);
    Ok(SimulationContext {
        world,
        scenario: scenario.clone(),
        stepper,
        current_frame: 0,
        substeps: 0,
        collisions: 0,
    })
}

pub fn build_simulation_context_from_source(source: &str) -> Result<SimulationContext> {
    let scenario = Scenario::from_json(source)?;
    build_simulation_context(&scenario)
}

/// Advance one frame. Returns true once every frame has run.
pub fn step_simulation(ctx: &mut SimulationContext) -> bool {
    if ctx.current_frame >= ctx.scenario.frames {
        return true;
    }

    let mut input = ctx.scenario.input_for(ctx.current_frame);
    let report = ctx
        .stepper
        .advance(&mut ctx.world, ctx.scenario.frame_time, &mut input);
    ctx.substeps += report.substeps;
    ctx.collisions += report.collisions.len();
    ctx.current_frame += 1;

    ctx.current_frame >= ctx.scenario.frames
}

/// Run a scenario to completion
pub fn run_scenario(scenario: &Scenario) -> Result<SimulationResult> {
    let mut ctx = build_simulation_context(scenario)?;
    while !step_simulation(&mut ctx) {}
    Ok(finish(&ctx))
}

/// Parse and run a JSON scenario
pub fn run_scenario_source(source: &str) -> Result<SimulationResult> {
    let scenario = Scenario::from_json(source)?;
    run_scenario(&scenario)
}

fn finish(ctx: &SimulationContext) -> SimulationResult {
    SimulationResult {
        frames: ctx.current_frame,
        substeps: ctx.substeps,
        collisions: ctx.collisions,
        elapsed: ctx.world.elapsed,
        bodies: get_body_states(&ctx.world),
    }
}

/// Pose of the cube, its corners and every projectile slot
pub fn get_body_states(world: &World) -> Vec<BodyState> {
    let rb = &world.rigid_body.body;
    let mut states = vec![BodyState {
        label: "cube".to_string(),
        kind: rb.kind,
        active: true,
        position: rb.position,
        orientation: rb.orientation,
        transform: rb.transform,
    }];

    for (i, corner) in world.corners.iter().enumerate() {
        states.push(BodyState {
            label: format!("corner{}", i),
            kind: corner.kind,
            active: true,
            position: corner.position,
            orientation: corner.orientation,
            transform: corner.transform,
        });
    }

    for (i, particle) in world.projectiles.iter().enumerate() {
        states.push(BodyState {
            label: format!("projectile{}", i),
            kind: particle.kind,
            active: particle.is_active(),
            position: particle.position,
            orientation: particle.orientation,
            transform: particle.transform,
        });
    }

    states
}
