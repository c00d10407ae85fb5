//! Visual artifacts: CPU-side vertex data the renderer uploads between ticks.

use bytemuck::{Pod, Zeroable};

/// One vertex of a line primitive.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position (xyz)
    pub position: [f32; 3],
}

impl Vertex {
    /// Size of a vertex in bytes
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a vertex.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { position: [x, y, z] }
    }
}

impl From<[f32; 3]> for Vertex {
    fn from(position: [f32; 3]) -> Self {
        Self { position }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner
    pub min: [f32; 3],
    /// Maximum corner
    pub max: [f32; 3],
}

impl Bounds {
    /// Smallest box around `vertices`, `None` if there are none.
    #[must_use]
    pub fn from_vertices(vertices: &[Vertex]) -> Option<Self> {
        let first = vertices.first()?.position;
        let mut bounds = Self { min: first, max: first };
        for v in &vertices[1..] {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(v.position[axis]);
                bounds.max[axis] = bounds.max[axis].max(v.position[axis]);
            }
        }
        Some(bounds)
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> [f32; 3] {
        [0, 1, 2].map(|a| (self.min[a] + self.max[a]) * 0.5)
    }

    /// Edge lengths of the box.
    #[must_use]
    pub fn extent(&self) -> [f32; 3] {
        [0, 1, 2].map(|a| self.max[a] - self.min[a])
    }

    /// Returns true if `point` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: [f32; 3]) -> bool {
        (0..3).all(|a| point[a] >= self.min[a] && point[a] <= self.max[a])
    }
}

/// A connected polyline with one color.
///
/// `revision` increases on every rebuild so the renderer can skip uploads of
/// unchanged strips.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStrip {
    vertices: Vec<Vertex>,
    color: [f32; 4],
    bounds: Option<Bounds>,
    revision: u64,
}

impl LineStrip {
    /// Creates an empty strip.
    #[must_use]
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            vertices: Vec::new(),
            color,
            bounds: None,
            revision: 0,
        }
    }

    /// Replaces the vertices and color, recomputes bounds, bumps the revision.
    pub fn rebuild<I>(&mut self, points: I, color: [f32; 4])
    where
        I: IntoIterator<Item = [f32; 3]>,
    {
        self.vertices.clear();
        self.vertices.extend(points.into_iter().map(Vertex::from));
        self.color = color;
        self.bounds = Bounds::from_vertices(&self.vertices);
        self.revision += 1;
    }

    /// The vertices, in drawing order.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Vertex data as raw bytes for buffer upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Strip color (RGBA).
    #[must_use]
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Bounding box, `None` while empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Number of rebuilds so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the strip has no vertex.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(Vertex::SIZE, 12);
        assert_eq!(std::mem::align_of::<Vertex>(), 4);
    }

    #[test]
    fn test_bounds() {
        let verts = [Vertex::new(1.0, -2.0, 0.0), Vertex::new(-1.0, 4.0, 2.0)];
        let bounds = Bounds::from_vertices(&verts).unwrap();
        assert_eq!(bounds.min, [-1.0, -2.0, 0.0]);
        assert_eq!(bounds.max, [1.0, 4.0, 2.0]);
        assert_eq!(bounds.center(), [0.0, 1.0, 1.0]);
        assert_eq!(bounds.extent(), [2.0, 6.0, 2.0]);
        assert!(bounds.contains([0.0, 0.0, 1.0]));
        assert!(!bounds.contains([0.0, 5.0, 1.0]));
        assert!(Bounds::from_vertices(&[]).is_none());
    }

    #[test]
    fn test_rebuild_bumps_revision() {
        let mut strip = LineStrip::new([1.0; 4]);
        assert!(strip.is_empty());
        assert_eq!(strip.revision(), 0);

        strip.rebuild([[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]], [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(strip.len(), 2);
        assert_eq!(strip.revision(), 1);
        assert_eq!(strip.color(), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(strip.bounds().unwrap().max, [1.0, 1.0, 1.0]);
        assert_eq!(strip.as_bytes().len(), 2 * Vertex::SIZE);

        strip.rebuild(std::iter::empty(), [1.0; 4]);
        assert!(strip.bounds().is_none());
        assert_eq!(strip.revision(), 2);
    }
}
