//! # Motion Command Visualization
//!
//! Draws where a planar velocity command would carry the body over a short
//! horizon, integrating a unicycle model from the body origin:
//!
//! ```text
//! x' = v cos(theta)    y' = v sin(theta)    theta' = omega
//! ```
//!
//! The path ends in a two-stroke arrow head.

use serde::{Deserialize, Serialize};
use vizsync_core::config::{decode, encode};
use vizsync_core::{ConfigError, ConfigResult, Inputs, Merge, PluginCore};

use crate::artifact::LineStrip;
use crate::types::{MotionCommand2D, Rgba, Vector3};

/// Upper bound on integration steps over the horizon.
pub const MAX_MOTION_SAMPLES: usize = 1000;

/// Persisted settings of a [`MotionCommandVisualization`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionCommandSettings {
    /// Seconds of motion to draw.
    pub horizon_s: f64,
    /// Integration steps over the horizon.
    pub samples: usize,
    /// Arrow color (RGBA).
    pub color: [f32; 4],
}

impl Default for MotionCommandSettings {
    fn default() -> Self {
        Self {
            horizon_s: 1.0,
            samples: 20,
            color: Rgba::GREEN.0,
        }
    }
}

/// Geometry of the predicted motion.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionArrow {
    /// Predicted path from the origin.
    pub path: LineStrip,
    /// Left barb, tip, right barb.
    pub head: LineStrip,
}

/// Draws the latest velocity command as a curved arrow.
#[derive(Debug, Default)]
pub struct MotionCommandVisualization {
    settings: MotionCommandSettings,
    command: MotionCommand2D,
}

impl MotionCommandVisualization {
    /// Creates a visualization with the given settings.
    #[must_use]
    pub fn new(settings: MotionCommandSettings) -> Self {
        Self {
            settings,
            command: MotionCommand2D::default(),
        }
    }

    /// The command on display.
    #[must_use]
    pub fn command(&self) -> MotionCommand2D {
        self.command
    }

    /// Integrated positions over the horizon, origin first, and the final
    /// heading.
    fn predict(&self) -> (Vec<Vector3>, f64) {
        let MotionCommand2D { translation, rotation } = self.command;
        let steps = self.settings.samples.clamp(1, MAX_MOTION_SAMPLES);
        #[allow(clippy::cast_precision_loss)]
        let dt = self.settings.horizon_s / steps as f64;

        // Chord of the arc driven in one step; exact for a constant command.
        let chord = if rotation.abs() < 1e-9 {
            translation * dt
        } else {
            2.0 * translation / rotation * (rotation * dt * 0.5).sin()
        };

        let mut pose = Vector3::ZERO;
        let mut theta = 0.0_f64;
        let mut path = Vec::with_capacity(steps + 1);
        path.push(pose);
        for _ in 0..steps {
            let mid = theta + rotation * dt * 0.5;
            pose = pose + Vector3::new(mid.cos(), mid.sin(), 0.0) * chord;
            theta += rotation * dt;
            path.push(pose);
        }
        (path, theta)
    }
}

impl PluginCore for MotionCommandVisualization {
    type Artifact = MotionArrow;

    fn plugin_name(&self) -> &str {
        "MotionCommandVisualization"
    }

    fn register_inputs(inputs: &mut Inputs<Self>) {
        inputs
            .adapter::<MotionCommand2D>("updateMotionCommand")
            .adapter::<MotionCommand2D>("updateData");
    }

    fn create_artifact(&mut self) -> MotionArrow {
        MotionArrow {
            path: LineStrip::new(self.settings.color),
            head: LineStrip::new(self.settings.color),
        }
    }

    fn finalize(&mut self, arrow: &mut MotionArrow) {
        let color = self.settings.color;
        let (path, theta) = self.predict();
        let tip = path.last().copied().unwrap_or(Vector3::ZERO);

        let travel = (self.command.translation * self.settings.horizon_s).abs();
        if travel < f64::EPSILON {
            arrow.path.rebuild(std::iter::empty(), color);
            arrow.head.rebuild(std::iter::empty(), color);
            return;
        }

        let barb = travel * 0.15;
        let back = if self.command.translation < 0.0 { 0.0 } else { std::f64::consts::PI };
        let barb_at = |offset: f64| {
            let a = theta + back + offset;
            tip + Vector3::new(a.cos(), a.sin(), 0.0) * barb
        };

        arrow.path.rebuild(path.iter().map(Vector3::to_f32), color);
        arrow
            .head
            .rebuild([barb_at(0.4), tip, barb_at(-0.4)].map(|p| p.to_f32()), color);
    }

    fn save_config(&self) -> ConfigResult<toml::Table> {
        encode(&self.settings)
    }

    fn load_config(&mut self, config: &toml::Table) -> ConfigResult<()> {
        let settings: MotionCommandSettings = decode(config)?;
        if !(settings.horizon_s.is_finite() && settings.horizon_s > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "horizon_s".into(),
                reason: "must be positive".into(),
            });
        }
        if !(1..=MAX_MOTION_SAMPLES).contains(&settings.samples) {
            return Err(ConfigError::InvalidValue {
                key: "samples".into(),
                reason: format!("must be in 1..={MAX_MOTION_SAMPLES}, got {}", settings.samples),
            });
        }
        self.settings = settings;
        Ok(())
    }
}

impl Merge<MotionCommand2D> for MotionCommandVisualization {
    fn apply_update(&mut self, _arrow: &mut MotionArrow, command: MotionCommand2D) {
        if !(command.translation.is_finite() && command.rotation.is_finite()) {
            tracing::warn!(?command, "non-finite motion command dropped");
            return;
        }
        self.command = command;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use vizsync_core::{ConfigSnapshot, PluginInstance};

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn test_straight_command() {
        let mut viz = PluginInstance::new(MotionCommandVisualization::default());
        viz.update(MotionCommand2D {
            translation: 2.0,
            rotation: 0.0,
        })
        .unwrap();
        viz.tick();

        let arrow = viz.artifact();
        assert_eq!(arrow.path.len(), 21);
        assert!(approx(arrow.path.vertices()[20].position, [2.0, 0.0, 0.0]));
        assert!(approx(arrow.head.vertices()[1].position, [2.0, 0.0, 0.0]));
        assert!(arrow.head.vertices()[0].position[0] < 2.0, "barbs point backwards");
    }

    #[test]
    fn test_half_turn_ends_on_circle() {
        let mut viz = PluginInstance::new(MotionCommandVisualization::default());
        viz.adapters()
            .dispatch(
                "updateMotionCommand",
                &MotionCommand2D {
                    translation: 1.0,
                    rotation: PI,
                },
            )
            .unwrap();
        viz.tick();

        let end = viz.artifact().path.vertices()[20].position;
        let diameter = 2.0 / PI;
        #[allow(clippy::cast_possible_truncation)]
        let expected = [0.0, diameter as f32, 0.0];
        assert!(approx(end, expected), "end {end:?}");
    }

    #[test]
    fn test_zero_command_draws_nothing() {
        let mut viz = PluginInstance::new(MotionCommandVisualization::default());
        viz.update(MotionCommand2D::default()).unwrap();
        viz.tick();
        assert!(viz.artifact().path.is_empty());
        assert!(viz.artifact().head.is_empty());
    }

    #[test]
    fn test_non_finite_command_ignored() {
        let mut viz = PluginInstance::new(MotionCommandVisualization::default());
        viz.update(MotionCommand2D {
            translation: f64::NAN,
            rotation: 0.0,
        })
        .unwrap();
        viz.tick();
        assert_eq!(viz.plugin().command(), MotionCommand2D::default());
    }

    #[test]
    fn test_sample_count_bounded() {
        let mut viz = PluginInstance::new(MotionCommandVisualization::default());
        for samples in [0, i64::MAX] {
            let mut table = toml::Table::new();
            table.insert("samples".into(), toml::Value::Integer(samples));
            let mut snapshot = ConfigSnapshot::new();
            snapshot.insert("MotionCommandVisualization", table);

            let err = viz.load_config(&snapshot).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "samples"), "samples = {samples}");
        }

        let mut wide = PluginInstance::new(MotionCommandVisualization::new(MotionCommandSettings {
            samples: usize::MAX,
            ..MotionCommandSettings::default()
        }));
        wide.update(MotionCommand2D {
            translation: 1.0,
            rotation: 0.0,
        })
        .unwrap();
        wide.tick();
        assert_eq!(wide.artifact().path.len(), MAX_MOTION_SAMPLES + 1);
    }
}
