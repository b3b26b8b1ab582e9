//! Axis-aligned bounding box.

use nalgebra::{Point3, Vector3};

/// An axis-aligned bounding box with `min <= max` componentwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f32>,
    /// Maximum corner.
    pub max: Point3<f32>,
}

impl Aabb {
    /// Create a box from explicit corners.
    #[inline]
    #[must_use]
    pub const fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Compute the bounding box of a set of points.
    ///
    /// Returns `None` if the iterator is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use levelset_types::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let points = [Point3::new(1.0, 5.0, -2.0), Point3::new(-3.0, 0.0, 4.0)];
    /// let bounds = Aabb::from_points(points).unwrap();
    /// assert_eq!(bounds.min, Point3::new(-3.0, 0.0, -2.0));
    /// assert_eq!(bounds.max, Point3::new(1.0, 5.0, 4.0));
    /// ```
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first, first);
        for p in iter {
            bounds.expand(p);
        }
        Some(bounds)
    }

    /// Grow the box to contain a point.
    #[inline]
    pub fn expand(&mut self, p: Point3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Size of the box along each axis.
    #[inline]
    #[must_use]
    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Center point of the box.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Return the box grown by `margin` on every side.
    ///
    /// # Example
    ///
    /// ```
    /// use levelset_types::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let bounds = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
    /// let padded = bounds.padded(0.5);
    /// assert_eq!(padded.min.x, -0.5);
    /// assert_eq!(padded.max.x, 1.5);
    /// ```
    #[inline]
    #[must_use]
    pub fn padded(&self, margin: f32) -> Self {
        let m = Vector3::repeat(margin);
        Self::new(self.min - m, self.max + m)
    }
}
