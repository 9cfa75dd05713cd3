//! Same scenario, same result

use cubephys_core::particle::ParticleKind;
use cubephys_core::{run_scenario, Scenario, ScenarioAction, ScenarioEvent};

fn busy_scenario() -> Scenario {
    let mut scenario = Scenario::demo(90);
    scenario.frame_time = 0.03;
    let fire = |frame, kind| ScenarioEvent {
        frame,
        action: ScenarioAction::Fire { kind },
    };
    scenario.events.extend([
        fire(5, ParticleKind::Bullet),
        fire(10, ParticleKind::Artillery),
        fire(15, ParticleKind::Fireball),
        ScenarioEvent {
            frame: 40,
            action: ScenarioAction::Reset,
        },
        fire(41, ParticleKind::Laser),
    ]);
    scenario
}

#[test]
fn test_determinism() {
    let scenario = busy_scenario();
    let first = run_scenario(&scenario).unwrap();
    let second = run_scenario(&scenario).unwrap();

    assert_eq!(first.frames, second.frames);
    assert_eq!(first.substeps, second.substeps);
    assert_eq!(first.collisions, second.collisions);
    assert_eq!(first.elapsed, second.elapsed);
    assert_eq!(first.bodies, second.bodies);
}

#[test]
fn test_substep_count_tracks_frame_time() {
    let result = run_scenario(&busy_scenario()).unwrap();
    // 0.03s frames at a 1/60s timestep need two sub-steps each
    assert_eq!(result.frames, 90);
    assert_eq!(result.substeps, 180);
    assert!((result.elapsed - 2.7).abs() < 1e-3);
}
