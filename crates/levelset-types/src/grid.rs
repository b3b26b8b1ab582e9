//! Uniform grid descriptor and dense 3D scalar storage.

use nalgebra::Point3;

use crate::bounds::Aabb;

/// Descriptor of a uniform axis-aligned sample grid.
///
/// The sample at integer coordinates `(i, j, k)` lies at
/// `origin + dx * (i, j, k)` in world space.
///
/// # Example
///
/// ```
/// use levelset_types::GridSpec;
/// use nalgebra::Point3;
///
/// let spec = GridSpec::new((10, 20, 30), Point3::new(-1.0, -2.0, -3.0), 0.5);
/// assert_eq!(spec.cell_count(), 6000);
///
/// let p = spec.position(2, 0, 0);
/// assert_eq!(p.x, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// Grid dimensions `(ni, nj, nk)`.
    pub dims: (usize, usize, usize),
    /// World-space position of sample `(0, 0, 0)`.
    pub origin: Point3<f32>,
    /// Uniform cell spacing in world units.
    pub dx: f32,
}

impl GridSpec {
    /// Create a new grid descriptor.
    #[inline]
    #[must_use]
    pub const fn new(dims: (usize, usize, usize), origin: Point3<f32>, dx: f32) -> Self {
        Self { dims, origin, dx }
    }

    /// Total number of samples in the grid.
    #[inline]
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.dims.0 * self.dims.1 * self.dims.2
    }

    /// World-space position of the sample at `(i, j, k)`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    // Precision loss: grid indices are far below 2^24
    pub fn position(&self, i: usize, j: usize, k: usize) -> Point3<f32> {
        Point3::new(
            self.origin.x + self.dx * i as f32,
            self.origin.y + self.dx * j as f32,
            self.origin.z + self.dx * k as f32,
        )
    }

    /// Linear index of `(i, j, k)` in row-major order, `i` fastest.
    #[inline]
    #[must_use]
    pub const fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.dims.0 * (j + self.dims.1 * k)
    }

    /// Maximum corner of the grid, `origin + dx * dims`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    // Precision loss: grid indices are far below 2^24
    pub fn max_corner(&self) -> Point3<f32> {
        Point3::new(
            self.origin.x + self.dx * self.dims.0 as f32,
            self.origin.y + self.dx * self.dims.1 as f32,
            self.origin.z + self.dx * self.dims.2 as f32,
        )
    }

    /// Bounding box covered by the grid.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.origin, self.max_corner())
    }
}

/// A dense 3D grid of `f32` samples.
///
/// Values are stored in row-major order with `i` varying fastest and `k`
/// slowest: `values[i + ni * (j + nj * k)]`. Element access is bounds-checked
/// through the backing slice.
///
/// # Example
///
/// ```
/// use levelset_types::{GridSpec, ScalarGrid};
/// use nalgebra::Point3;
///
/// let spec = GridSpec::new((4, 4, 4), Point3::origin(), 1.0);
/// let mut grid = ScalarGrid::from_spec(&spec, 0.0);
/// grid.set(1, 2, 3, 42.0);
/// assert_eq!(grid.get(1, 2, 3), 42.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid {
    spec: GridSpec,
    values: Vec<f32>,
}

impl ScalarGrid {
    /// Create a grid matching `spec`, filled with `value`.
    #[must_use]
    pub fn from_spec(spec: &GridSpec, value: f32) -> Self {
        Self {
            spec: *spec,
            values: vec![value; spec.cell_count()],
        }
    }

    /// Create a grid from a spec and existing values.
    ///
    /// Returns `None` if the value count does not match the spec.
    #[must_use]
    pub fn from_values(spec: &GridSpec, values: Vec<f32>) -> Option<Self> {
        (values.len() == spec.cell_count()).then_some(Self { spec: *spec, values })
    }

    /// The grid descriptor.
    #[inline]
    #[must_use]
    pub const fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Grid dimensions `(ni, nj, nk)`.
    #[inline]
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize, usize) {
        self.spec.dims
    }

    /// The value at `(i, j, k)`.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f32 {
        self.values[self.spec.index(i, j, k)]
    }

    /// Set the value at `(i, j, k)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f32) {
        let idx = self.spec.index(i, j, k);
        self.values[idx] = value;
    }

    /// World-space position of the sample at `(i, j, k)`.
    #[inline]
    #[must_use]
    pub fn position(&self, i: usize, j: usize, k: usize) -> Point3<f32> {
        self.spec.position(i, j, k)
    }

    /// Reallocate the grid for a new descriptor, filling with `value`.
    ///
    /// All previous contents are discarded.
    pub fn resize(&mut self, spec: &GridSpec, value: f32) {
        self.spec = *spec;
        self.values.clear();
        self.values.resize(spec.cell_count(), value);
    }

    /// The backing values, `i` fastest.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Mutable access to the backing values, `i` fastest.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Total number of samples.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the grid holds no samples.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn spec_position() {
        let spec = GridSpec::new((10, 10, 10), Point3::new(-5.0, -5.0, -5.0), 1.0);
        let p = spec.position(5, 5, 5);
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 0.0);
        assert_relative_eq!(p.z, 0.0);
    }

    #[test]
    fn spec_index_i_fastest() {
        let spec = GridSpec::new((3, 4, 5), Point3::origin(), 1.0);
        assert_eq!(spec.index(0, 0, 0), 0);
        assert_eq!(spec.index(1, 0, 0), 1);
        assert_eq!(spec.index(0, 1, 0), 3);
        assert_eq!(spec.index(0, 0, 1), 12);
        assert_eq!(spec.index(2, 3, 4), 2 + 3 * 3 + 12 * 4);
    }

    #[test]
    fn spec_max_corner() {
        let spec = GridSpec::new((4, 4, 4), Point3::new(-1.0, -1.0, -1.0), 0.5);
        let max = spec.max_corner();
        assert_relative_eq!(max.x, 1.0);
        assert_relative_eq!(max.y, 1.0);
        assert_relative_eq!(max.z, 1.0);
    }

    #[test]
    fn grid_get_set() {
        let spec = GridSpec::new((5, 5, 5), Point3::origin(), 1.0);
        let mut grid = ScalarGrid::from_spec(&spec, 0.0);
        grid.set(2, 3, 4, 7.5);
        assert_relative_eq!(grid.get(2, 3, 4), 7.5);
        assert_relative_eq!(grid.get(0, 0, 0), 0.0);
    }

    #[test]
    fn grid_resize_discards() {
        let spec = GridSpec::new((2, 2, 2), Point3::origin(), 1.0);
        let mut grid = ScalarGrid::from_spec(&spec, 1.0);
        grid.set(0, 0, 0, 9.0);

        let bigger = GridSpec::new((3, 3, 3), Point3::origin(), 1.0);
        grid.resize(&bigger, -1.0);
        assert_eq!(grid.len(), 27);
        assert_relative_eq!(grid.get(0, 0, 0), -1.0);
    }

    #[test]
    fn grid_from_values_len_mismatch() {
        let spec = GridSpec::new((2, 2, 2), Point3::origin(), 1.0);
        assert!(ScalarGrid::from_values(&spec, vec![0.0; 7]).is_none());
        assert!(ScalarGrid::from_values(&spec, vec![0.0; 8]).is_some());
    }
}
