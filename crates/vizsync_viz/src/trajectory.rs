//! # Trajectory Visualization
//!
//! A trail of positions drawn as one line strip.
//!
//! ```text
//! ClearTrajectory ──► drop all points
//! Vector3         ──► append, drop oldest past max_points
//! Spline3         ──► replace trail with sampled curve
//! MaxPoints       ──► new limit, trims immediately
//! Rgba            ──► new strip color
//!                        │
//!                   finalize: rebuild LineStrip (vertices, bounds, revision)
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use vizsync_core::config::{decode, encode};
use vizsync_core::{ConfigError, ConfigResult, Inputs, Merge, PluginCore};

use crate::artifact::LineStrip;
use crate::types::{ClearTrajectory, MaxPoints, Rgba, Spline3, Vector3, MAX_SPLINE_SAMPLES};

/// Default trail length.
pub const DEFAULT_MAX_POINTS: usize = 1800;
/// Default samples between two spline control points.
pub const DEFAULT_SPLINE_SAMPLES: usize = 16;

/// Persisted settings of a [`TrajectoryVisualization`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectorySettings {
    /// Trail length limit, `0` for unbounded.
    pub max_points: usize,
    /// Strip color (RGBA).
    pub color: [f32; 4],
    /// Samples between two spline control points.
    pub spline_samples: usize,
}

impl Default for TrajectorySettings {
    fn default() -> Self {
        Self {
            max_points: DEFAULT_MAX_POINTS,
            color: Rgba::RED.0,
            spline_samples: DEFAULT_SPLINE_SAMPLES,
        }
    }
}

/// Draws the recent positions of a moving body, or a planned curve.
#[derive(Debug, Default)]
pub struct TrajectoryVisualization {
    settings: TrajectorySettings,
    points: VecDeque<Vector3>,
    rejected: u64,
}

impl TrajectoryVisualization {
    /// Creates a visualization with the given settings.
    #[must_use]
    pub fn new(settings: TrajectorySettings) -> Self {
        Self {
            settings,
            points: VecDeque::new(),
            rejected: 0,
        }
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &TrajectorySettings {
        &self.settings
    }

    /// Points currently in the trail, oldest first.
    pub fn points(&self) -> impl ExactSizeIterator<Item = &Vector3> + '_ {
        self.points.iter()
    }

    /// Non-finite points dropped so far.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn trim(&mut self) {
        let max = self.settings.max_points;
        if max > 0 && self.points.len() > max {
            let excess = self.points.len() - max;
            self.points.drain(..excess);
        }
    }
}

impl PluginCore for TrajectoryVisualization {
    type Artifact = LineStrip;

    fn plugin_name(&self) -> &str {
        "TrajectoryVisualization"
    }

    fn register_inputs(inputs: &mut Inputs<Self>) {
        inputs
            .adapter::<ClearTrajectory>("clear")
            .adapter::<Vector3>("updateTrajectory")
            .adapter::<Vector3>("updateData")
            .adapter::<Spline3>("updateSpline")
            .adapter::<MaxPoints>("setMaxNumberOfPoints")
            .adapter::<Rgba>("setColor");
    }

    fn create_artifact(&mut self) -> LineStrip {
        LineStrip::new(self.settings.color)
    }

    fn finalize(&mut self, strip: &mut LineStrip) {
        strip.rebuild(self.points.iter().map(Vector3::to_f32), self.settings.color);
    }

    fn save_config(&self) -> ConfigResult<toml::Table> {
        encode(&self.settings)
    }

    fn load_config(&mut self, config: &toml::Table) -> ConfigResult<()> {
        let settings: TrajectorySettings = decode(config)?;
        if !(1..=MAX_SPLINE_SAMPLES).contains(&settings.spline_samples) {
            return Err(ConfigError::InvalidValue {
                key: "spline_samples".into(),
                reason: format!("must be in 1..={MAX_SPLINE_SAMPLES}, got {}", settings.spline_samples),
            });
        }
        self.settings = TrajectorySettings {
            color: Rgba(settings.color).clamped().0,
            ..settings
        };
        self.trim();
        Ok(())
    }
}

impl Merge<ClearTrajectory> for TrajectoryVisualization {
    fn apply_update(&mut self, _strip: &mut LineStrip, _value: ClearTrajectory) {
        self.points.clear();
    }
}

impl Merge<Vector3> for TrajectoryVisualization {
    fn apply_update(&mut self, _strip: &mut LineStrip, point: Vector3) {
        if !point.is_finite() {
            self.rejected += 1;
            tracing::warn!(?point, "non-finite trajectory point dropped");
            return;
        }
        self.points.push_back(point);
        self.trim();
    }
}

impl Merge<Spline3> for TrajectoryVisualization {
    fn apply_update(&mut self, _strip: &mut LineStrip, spline: Spline3) {
        self.points.clear();
        self.points.extend(
            spline
                .sample(self.settings.spline_samples)
                .into_iter()
                .filter(Vector3::is_finite),
        );
        self.trim();
    }
}

impl Merge<MaxPoints> for TrajectoryVisualization {
    fn apply_update(&mut self, _strip: &mut LineStrip, MaxPoints(max): MaxPoints) {
        self.settings.max_points = max;
        self.trim();
    }
}

impl Merge<Rgba> for TrajectoryVisualization {
    fn apply_update(&mut self, _strip: &mut LineStrip, color: Rgba) {
        self.settings.color = color.clamped().0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vizsync_core::{ConfigSnapshot, PluginInstance, TickOutcome};

    fn instance() -> PluginInstance<TrajectoryVisualization> {
        PluginInstance::new(TrajectoryVisualization::default())
    }

    #[test]
    fn test_adapters_registered() {
        let viz = instance();
        let names: Vec<_> = viz.adapters().available().collect();
        assert_eq!(
            names,
            vec!["clear", "updateTrajectory", "updateData", "updateSpline", "setMaxNumberOfPoints", "setColor"]
        );
        assert_eq!(viz.gate().slot_count(), 5);
    }

    #[test]
    fn test_points_reach_strip_after_tick() {
        let mut viz = instance();
        let points = viz.updater::<Vector3>().unwrap();

        points.update(Vector3::new(1.0, 2.0, 3.0));
        assert!(viz.artifact().is_empty(), "nothing visible before the tick");

        assert_eq!(viz.tick(), TickOutcome::Updated { merged: 1 });
        assert_eq!(viz.artifact().vertices()[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(viz.artifact().revision(), 1);
    }

    #[test]
    fn test_only_latest_point_per_tick() {
        let mut viz = instance();
        let points = viz.updater::<Vector3>().unwrap();

        points.update(Vector3::new(1.0, 0.0, 0.0));
        points.update(Vector3::new(2.0, 0.0, 0.0));
        viz.tick();

        assert_eq!(viz.plugin().points().len(), 1);
        assert_eq!(viz.artifact().vertices()[0].position, [2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_max_points_drops_oldest() {
        let mut viz = instance();
        viz.update(MaxPoints(3)).unwrap();
        viz.tick();

        let points = viz.updater::<Vector3>().unwrap();
        for i in 0..5 {
            points.update(Vector3::new(f64::from(i), 0.0, 0.0));
            viz.tick();
        }

        let xs: Vec<f32> = viz.artifact().vertices().iter().map(|v| v.position[0]).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_clear_runs_before_new_point() {
        let mut viz = instance();
        viz.update(Vector3::new(1.0, 0.0, 0.0)).unwrap();
        viz.tick();

        viz.update(Vector3::new(5.0, 0.0, 0.0)).unwrap();
        viz.adapters().dispatch("clear", &ClearTrajectory).unwrap();
        viz.tick();

        assert_eq!(viz.artifact().len(), 1);
        assert_eq!(viz.artifact().vertices()[0].position, [5.0, 0.0, 0.0]);
    }

    #[test]
    fn test_spline_replaces_trail() {
        let mut viz = instance();
        viz.update(Vector3::new(9.0, 9.0, 9.0)).unwrap();
        viz.tick();

        let spline = Spline3::new(vec![Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0)]);
        viz.adapters().dispatch("updateSpline", &spline).unwrap();
        viz.tick();

        assert_eq!(viz.artifact().len(), DEFAULT_SPLINE_SAMPLES + 1);
        let bounds = viz.artifact().bounds().unwrap();
        assert_eq!(bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(bounds.max, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_non_finite_point_rejected() {
        let mut viz = instance();
        viz.update(Vector3::new(f64::INFINITY, 0.0, 0.0)).unwrap();
        viz.tick();
        assert!(viz.artifact().is_empty());
        assert_eq!(viz.plugin().rejected(), 1);
    }

    #[test]
    fn test_color_adapter() {
        let mut viz = instance();
        viz.adapters().dispatch("setColor", &Rgba::GREEN).unwrap();
        viz.tick();
        assert_eq!(viz.artifact().color(), Rgba::GREEN.0);
    }

    #[test]
    fn test_config_round_trip() {
        let mut source = instance();
        source.update(MaxPoints(42)).unwrap();
        source.update(Rgba::YELLOW).unwrap();
        source.tick();

        let mut snapshot = ConfigSnapshot::new();
        source.save_config(&mut snapshot).unwrap();
        let text = snapshot.to_toml_string().unwrap();

        let mut restored = instance();
        restored.load_config(&ConfigSnapshot::from_toml_str(&text).unwrap()).unwrap();
        assert_eq!(restored.plugin().settings().max_points, 42);

        assert_eq!(restored.tick(), TickOutcome::Updated { merged: 0 });
        assert_eq!(restored.artifact().color(), Rgba::YELLOW.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut viz = instance();
        let mut table = toml::Table::new();
        table.insert("spline_samples".into(), toml::Value::Integer(0));
        let mut snapshot = ConfigSnapshot::new();
        snapshot.insert("TrajectoryVisualization", table);

        let err = viz.load_config(&snapshot).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "spline_samples"));
        assert_eq!(viz.plugin().settings(), &TrajectorySettings::default());
    }

    #[test]
    fn test_huge_spline_samples_rejected() {
        let mut viz = instance();
        let mut table = toml::Table::new();
        table.insert("spline_samples".into(), toml::Value::Integer(i64::MAX));
        let mut snapshot = ConfigSnapshot::new();
        snapshot.insert("TrajectoryVisualization", table);

        let err = viz.load_config(&snapshot).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "spline_samples"));

        let spline = Spline3::new(vec![Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0)]);
        viz.update(spline).unwrap();
        assert_eq!(viz.tick(), TickOutcome::Updated { merged: 1 });
        assert_eq!(viz.artifact().len(), 2 * DEFAULT_SPLINE_SAMPLES + 1);
    }

    #[test]
    fn test_oversized_settings_still_tick() {
        let mut viz = PluginInstance::new(TrajectoryVisualization::new(TrajectorySettings {
            spline_samples: usize::MAX,
            max_points: 0,
            ..TrajectorySettings::default()
        }));
        let spline = Spline3::new(vec![Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0)]);
        viz.update(spline).unwrap();
        viz.tick();
        assert_eq!(viz.artifact().len(), MAX_SPLINE_SAMPLES + 1);
    }
}
