//! Indexed triangle mesh.

use nalgebra::Point3;

use crate::bounds::Aabb;

/// An indexed triangle mesh in world coordinates.
///
/// Positions and triangles are stored separately, with triangles referencing
/// positions by index. Faces use counter-clockwise winding when viewed from
/// outside, so normals point outward by the right-hand rule; the sign of a
/// distance field computed from the mesh depends on this orientation.
///
/// # Example
///
/// ```
/// use levelset_types::TriMesh;
/// use nalgebra::Point3;
///
/// let mut mesh = TriMesh::new();
/// mesh.positions.push(Point3::new(0.0, 0.0, 0.0));
/// mesh.positions.push(Point3::new(1.0, 0.0, 0.0));
/// mesh.positions.push(Point3::new(0.0, 1.0, 0.0));
/// mesh.triangles.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.triangle_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    /// Vertex positions in world coordinates.
    pub positions: Vec<Point3<f32>>,

    /// Triangles as indices into `positions`.
    /// Each triangle is `[v0, v1, v2]` with counter-clockwise winding.
    pub triangles: Vec<[u32; 3]>,
}

impl TriMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            triangles: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    ///
    /// # Example
    ///
    /// ```
    /// use levelset_types::TriMesh;
    ///
    /// let mesh = TriMesh::with_capacity(300, 100);
    /// assert!(mesh.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Create a mesh from positions and triangle indices.
    #[inline]
    #[must_use]
    pub const fn from_parts(positions: Vec<Point3<f32>>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
        }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Check whether the mesh has no vertices and no triangles.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.triangles.is_empty()
    }

    /// Compute the axis-aligned bounding box of the vertex positions.
    ///
    /// Returns `None` for a mesh with no vertices.
    ///
    /// # Example
    ///
    /// ```
    /// use levelset_types::TriMesh;
    /// use nalgebra::Point3;
    ///
    /// let mut mesh = TriMesh::new();
    /// mesh.positions.push(Point3::new(-1.0, 0.0, 2.0));
    /// mesh.positions.push(Point3::new(3.0, -2.0, 0.5));
    ///
    /// let bounds = mesh.bounds().unwrap();
    /// assert_eq!(bounds.min.x, -1.0);
    /// assert_eq!(bounds.max.x, 3.0);
    /// ```
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }
}
