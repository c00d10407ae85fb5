//! # Waypoint Visualization
//!
//! Shows a navigation target: a heading arrow from the target position and a
//! ring marking the position tolerance. A wedge spans the heading tolerance.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use vizsync_core::config::{decode, encode};
use vizsync_core::{ConfigError, ConfigResult, Inputs, Merge, PluginCore};

use crate::artifact::{LineStrip, Vertex};
use crate::types::{Rgba, Vector3, Waypoint};

/// Upper bound on tolerance ring segments.
pub const MAX_RING_SEGMENTS: usize = 1024;

/// Persisted settings of a [`WaypointVisualization`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointSettings {
    /// Segments of the tolerance ring.
    pub ring_segments: usize,
    /// Length of the heading arrow, meters.
    pub arrow_length: f64,
    /// Marker color (RGBA).
    pub color: [f32; 4],
}

impl Default for WaypointSettings {
    fn default() -> Self {
        Self {
            ring_segments: 32,
            arrow_length: 1.0,
            color: Rgba::YELLOW.0,
        }
    }
}

/// Geometry of one waypoint marker.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointMarker {
    /// Target position, `None` until the first waypoint arrives.
    pub position: Option<Vertex>,
    /// Position to arrow tip.
    pub arrow: LineStrip,
    /// Closed circle of radius `tol_position`.
    pub tolerance_ring: LineStrip,
    /// Left bound, position, right bound of the heading tolerance.
    pub heading_wedge: LineStrip,
}

/// Draws the most recent navigation target.
#[derive(Debug, Default)]
pub struct WaypointVisualization {
    settings: WaypointSettings,
    waypoint: Option<Waypoint>,
}

impl WaypointVisualization {
    /// Creates a visualization with the given settings.
    #[must_use]
    pub fn new(settings: WaypointSettings) -> Self {
        Self {
            settings,
            waypoint: None,
        }
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &WaypointSettings {
        &self.settings
    }

    /// The waypoint on display.
    #[must_use]
    pub fn waypoint(&self) -> Option<&Waypoint> {
        self.waypoint.as_ref()
    }
}

impl PluginCore for WaypointVisualization {
    type Artifact = WaypointMarker;

    fn plugin_name(&self) -> &str {
        "WaypointVisualization"
    }

    fn register_inputs(inputs: &mut Inputs<Self>) {
        inputs.adapter::<Waypoint>("updateWaypoint").adapter::<Waypoint>("updateData");
    }

    fn create_artifact(&mut self) -> WaypointMarker {
        let color = self.settings.color;
        WaypointMarker {
            position: None,
            arrow: LineStrip::new(color),
            tolerance_ring: LineStrip::new(color),
            heading_wedge: LineStrip::new(color),
        }
    }

    fn finalize(&mut self, marker: &mut WaypointMarker) {
        let color = self.settings.color;
        let Some(wp) = self.waypoint else {
            marker.position = None;
            marker.arrow.rebuild(std::iter::empty(), color);
            marker.tolerance_ring.rebuild(std::iter::empty(), color);
            marker.heading_wedge.rebuild(std::iter::empty(), color);
            return;
        };

        let length = self.settings.arrow_length;
        let along = |angle: f64, dist: f64| wp.position + Vector3::new(angle.cos(), angle.sin(), 0.0) * dist;

        marker.position = Some(Vertex::from(wp.position.to_f32()));
        marker
            .arrow
            .rebuild([wp.position, along(wp.heading, length)].map(|p| p.to_f32()), color);

        let segments = self.settings.ring_segments.clamp(3, MAX_RING_SEGMENTS);
        marker.tolerance_ring.rebuild(
            (0..=segments).map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let angle = TAU * i as f64 / segments as f64;
                along(angle, wp.tol_position).to_f32()
            }),
            color,
        );

        marker.heading_wedge.rebuild(
            [
                along(wp.heading + wp.tol_heading, length),
                wp.position,
                along(wp.heading - wp.tol_heading, length),
            ]
            .map(|p| p.to_f32()),
            color,
        );
    }

    fn save_config(&self) -> ConfigResult<toml::Table> {
        encode(&self.settings)
    }

    fn load_config(&mut self, config: &toml::Table) -> ConfigResult<()> {
        let settings: WaypointSettings = decode(config)?;
        if !(3..=MAX_RING_SEGMENTS).contains(&settings.ring_segments) {
            return Err(ConfigError::InvalidValue {
                key: "ring_segments".into(),
                reason: format!("must be in 3..={MAX_RING_SEGMENTS}, got {}", settings.ring_segments),
            });
        }
        if !(settings.arrow_length.is_finite() && settings.arrow_length > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "arrow_length".into(),
                reason: "must be positive".into(),
            });
        }
        self.settings = settings;
        Ok(())
    }
}

impl Merge<Waypoint> for WaypointVisualization {
    fn apply_update(&mut self, _marker: &mut WaypointMarker, waypoint: Waypoint) {
        if !waypoint.position.is_finite() || !waypoint.heading.is_finite() {
            tracing::warn!(?waypoint, "non-finite waypoint dropped");
            return;
        }
        self.waypoint = Some(Waypoint {
            tol_position: waypoint.tol_position.abs(),
            tol_heading: waypoint.tol_heading.abs(),
            ..waypoint
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;
    use vizsync_core::{ConfigSnapshot, PluginInstance};

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_empty_before_first_waypoint() {
        let mut viz = PluginInstance::new(WaypointVisualization::default());
        viz.mark_dirty();
        viz.tick();
        assert!(viz.artifact().position.is_none());
        assert!(viz.artifact().arrow.is_empty());
    }

    #[test]
    fn test_marker_geometry() {
        let mut viz = PluginInstance::new(WaypointVisualization::default());
        let waypoints = viz.updater::<Waypoint>().unwrap();
        waypoints.update(Waypoint {
            position: Vector3::new(1.0, 1.0, 0.0),
            heading: FRAC_PI_2,
            tol_position: 0.5,
            tol_heading: 0.1,
        });
        viz.tick();

        let marker = viz.artifact();
        assert_eq!(marker.position, Some(Vertex::new(1.0, 1.0, 0.0)));
        assert!(approx(marker.arrow.vertices()[1].position, [1.0, 2.0, 0.0]));
        assert_eq!(marker.tolerance_ring.len(), 33);
        assert!(approx(marker.tolerance_ring.vertices()[0].position, [1.5, 1.0, 0.0]));
        assert!(approx(
            marker.tolerance_ring.vertices()[0].position,
            marker.tolerance_ring.vertices()[32].position
        ));
        assert_eq!(marker.heading_wedge.vertices()[1].position, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_dynamic_caller_copies_waypoint() {
        let mut viz = PluginInstance::new(WaypointVisualization::default());
        let wp = Waypoint {
            position: Vector3::new(3.0, 0.0, 0.0),
            tol_position: -1.0,
            ..Waypoint::default()
        };
        viz.adapters().dispatch("updateWaypoint", &wp).unwrap();
        viz.tick();

        assert_eq!(wp.tol_position, -1.0);
        assert_eq!(viz.plugin().waypoint().unwrap().tol_position, 1.0);
    }

    #[test]
    fn test_ring_segments_validated() {
        let mut viz = PluginInstance::new(WaypointVisualization::default());
        let mut table = toml::Table::new();
        table.insert("ring_segments".into(), toml::Value::Integer(2));
        let mut snapshot = ConfigSnapshot::new();
        snapshot.insert("WaypointVisualization", table);

        assert!(matches!(viz.load_config(&snapshot), Err(ConfigError::InvalidValue { .. })));
        assert_eq!(viz.plugin().settings().ring_segments, 32);
    }

    #[test]
    fn test_huge_ring_segments_rejected() {
        let mut viz = PluginInstance::new(WaypointVisualization::default());
        let mut table = toml::Table::new();
        table.insert("ring_segments".into(), toml::Value::Integer(i64::MAX));
        let mut snapshot = ConfigSnapshot::new();
        snapshot.insert("WaypointVisualization", table);

        let err = viz.load_config(&snapshot).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "ring_segments"));
        assert_eq!(viz.plugin().settings().ring_segments, 32);
    }

    #[test]
    fn test_oversized_ring_is_capped() {
        let mut viz = PluginInstance::new(WaypointVisualization::new(WaypointSettings {
            ring_segments: usize::MAX,
            ..WaypointSettings::default()
        }));
        viz.update(Waypoint {
            tol_position: 1.0,
            ..Waypoint::default()
        })
        .unwrap();
        viz.tick();
        assert_eq!(viz.artifact().tolerance_ring.len(), MAX_RING_SEGMENTS + 1);
    }
}
