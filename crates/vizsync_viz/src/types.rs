//! Input types producers hand to the visualizations.

use serde::{Deserialize, Serialize};

/// A point or direction in 3D space, double precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Vector3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Returns true if every component is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Single-precision copy for vertex buffers.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_f32(&self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }
}

impl std::ops::Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Upper bound on samples between two spline control points.
pub const MAX_SPLINE_SAMPLES: usize = 1024;

/// A uniform Catmull-Rom curve through control points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spline3 {
    /// Points the curve passes through, in order.
    pub control_points: Vec<Vector3>,
}

impl Spline3 {
    /// Creates a spline through `control_points`.
    #[must_use]
    pub fn new(control_points: Vec<Vector3>) -> Self {
        Self { control_points }
    }

    /// Returns true if the spline has no control point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.control_points.is_empty()
    }

    /// Samples the curve with `samples_per_segment` points between each pair
    /// of control points, capped at [`MAX_SPLINE_SAMPLES`]. The result starts
    /// at the first control point and ends at the last one.
    #[must_use]
    pub fn sample(&self, samples_per_segment: usize) -> Vec<Vector3> {
        let cps = &self.control_points;
        if cps.len() < 2 || samples_per_segment == 0 {
            return cps.clone();
        }

        let samples_per_segment = samples_per_segment.min(MAX_SPLINE_SAMPLES);
        let segments = cps.len() - 1;
        let capacity = segments
            .checked_mul(samples_per_segment)
            .and_then(|n| n.checked_add(1))
            .unwrap_or(0);
        let mut out = Vec::with_capacity(capacity);
        for seg in 0..segments {
            let p0 = cps[seg.saturating_sub(1)];
            let p1 = cps[seg];
            let p2 = cps[seg + 1];
            let p3 = cps[(seg + 2).min(segments)];
            for step in 0..samples_per_segment {
                #[allow(clippy::cast_precision_loss)]
                let t = step as f64 / samples_per_segment as f64;
                out.push(catmull_rom(p0, p1, p2, p3, t));
            }
        }
        out.push(cps[segments]);
        out
    }
}

fn catmull_rom(p0: Vector3, p1: Vector3, p2: Vector3, p3: Vector3, t: f64) -> Vector3 {
    let t2 = t * t;
    let t3 = t2 * t;
    (p1 * 2.0 + (p2 - p0) * t + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
        + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3)
        * 0.5
}

/// New point limit for a trail. `0` removes the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxPoints(pub usize);

/// Straight RGBA color, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    /// Opaque red.
    pub const RED: Self = Self([1.0, 0.0, 0.0, 1.0]);
    /// Opaque green.
    pub const GREEN: Self = Self([0.0, 1.0, 0.0, 1.0]);
    /// Opaque yellow.
    pub const YELLOW: Self = Self([1.0, 1.0, 0.0, 1.0]);

    /// Opaque color from RGB.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b, 1.0])
    }

    /// Copy with every component clamped to `0.0..=1.0`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self(self.0.map(|c| if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) }))
    }
}

/// Request to drop every point of a trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearTrajectory;

/// A navigation target with tolerances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Target position.
    pub position: Vector3,
    /// Target heading around Z, radians.
    pub heading: f64,
    /// Accepted distance to `position`, meters.
    pub tol_position: f64,
    /// Accepted deviation from `heading`, radians.
    pub tol_heading: f64,
}

/// A planar velocity command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionCommand2D {
    /// Forward speed, m/s.
    pub translation: f64,
    /// Yaw rate, rad/s.
    pub rotation: f64,
}
