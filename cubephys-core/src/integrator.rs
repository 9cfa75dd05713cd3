use crate::config::WorldConfig;
use crate::world::{FrameInput, StepReport, World};

/// Most sub-steps a single frame may be split into
pub const MAX_SUBSTEPS: usize = 4096;

/// Splits variable frame times into bounded physics steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimestep {
    pub timestep: f32,
    pub max_frame_time: f32,
    pub clamped_frame_time: f32,
}

impl FixedTimestep {
    pub fn from_config(config: &WorldConfig) -> Self {
        Self {
            timestep: config.timestep,
            max_frame_time: config.max_frame_time,
            clamped_frame_time: config.clamped_frame_time,
        }
    }

    /// Frame time after stall protection
    pub fn clamp(&self, frame_time: f32) -> f32 {
        if frame_time > self.max_frame_time {
            self.clamped_frame_time
        } else {
            frame_time.max(0.0)
        }
    }

    /// Sub-step durations covering `frame_time`; the last one may be short.
    /// Never more than `MAX_SUBSTEPS` entries.
    pub fn substeps(&self, frame_time: f32) -> Vec<f32> {
        let mut steps = Vec::new();
        if !(self.timestep > 0.0) {
            return steps;
        }

        let mut remaining = self.clamp(frame_time);
        while remaining > 0.0 {
            if steps.len() == MAX_SUBSTEPS {
                tracing::warn!(remaining, timestep = self.timestep, "frame truncated at sub-step cap");
                break;
            }
            let dt = remaining.min(self.timestep);
            remaining -= dt;
            steps.push(dt);
        }
        steps
    }

    /// Advance `world` by one rendered frame, merging every step's report
    pub fn advance(&self, world: &mut World, frame_time: f32, input: &mut FrameInput) -> FrameReport {
        let mut frame = FrameReport::default();
        for dt in self.substeps(frame_time) {
            let report = world.step(dt, input);
            frame.absorb(report);
        }
        frame
    }
}

/// Summary of every sub-step run for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub substeps: usize,
    pub spawned: Vec<usize>,
    pub spring_pairs: Vec<(usize, usize)>,
    pub resets: usize,
    pub collisions: Vec<usize>,
}

impl FrameReport {
    fn absorb(&mut self, report: StepReport) {
        self.substeps += 1;
        self.spawned.extend(report.spawned);
        self.spring_pairs.extend(report.spring_pair);
        if report.reset {
            self.resets += 1;
        }
        self.collisions.extend(report.collisions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleKind;

    fn stepper() -> FixedTimestep {
        FixedTimestep {
            timestep: 0.25,
            max_frame_time: 2.0,
            clamped_frame_time: 0.2,
        }
    }

    #[test]
    fn test_frame_split_into_bounded_steps() {
        let steps = stepper().substeps(0.6);
        assert_eq!(steps.len(), 3);
        assert!(steps.iter().all(|dt| *dt <= 0.25));
        let total: f32 = steps.iter().sum();
        assert!((total - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_stalled_frame_is_clamped() {
        let steps = stepper().substeps(5.0);
        let total: f32 = steps.iter().sum();
        assert!((total - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_zero_frame_runs_nothing() {
        assert!(stepper().substeps(0.0).is_empty());
        assert!(stepper().substeps(-1.0).is_empty());
    }

    #[test]
    fn test_tiny_timestep_stops_at_cap() {
        let stepper = FixedTimestep {
            timestep: 1e-9,
            ..stepper()
        };
        // remaining -= 1e-9 no longer changes an f32 near 0.1
        let steps = stepper.substeps(0.1);
        assert_eq!(steps.len(), MAX_SUBSTEPS);
    }

    #[test]
    fn test_non_positive_timestep_runs_nothing() {
        let zero = FixedTimestep {
            timestep: 0.0,
            ..stepper()
        };
        assert!(zero.substeps(0.1).is_empty());
        let nan = FixedTimestep {
            timestep: f32::NAN,
            ..stepper()
        };
        assert!(nan.substeps(0.1).is_empty());
    }

    #[test]
    fn test_input_consumed_by_first_substep() {
        let mut world = World::new(WorldConfig::default()).unwrap();
        let stepper = FixedTimestep::from_config(&world.config);
        let mut input = FrameInput::fire(ParticleKind::Laser);

        let report = stepper.advance(&mut world, 0.1, &mut input);
        assert!(report.substeps > 1);
        assert_eq!(report.spawned, vec![0]);
        assert_eq!(world.projectiles.active_count(), 1);
    }
}
