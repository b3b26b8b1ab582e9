//! Geometric queries for distance computation and ray parity.
//!
//! Provides the closest-point-on-triangle primitive used by both the
//! narrow-band pass and the sweeping pass, and the 2D containment
//! predicate behind inside/outside parity counting.

use nalgebra::Point3;

/// Compute the closest point on a triangle to a query point.
///
/// Classifies the query against the triangle plane by barycentric
/// coordinates; when a coordinate is negative the closest point lies on
/// one of the two candidate edges, which are resolved as segments.
/// Collapsed triangles (coincident or collinear vertices) reduce to
/// segment or point queries and never produce NaN.
///
/// # Arguments
///
/// * `point` - The query point
/// * `v0`, `v1`, `v2` - The triangle vertices
///
/// # Example
///
/// ```
/// use levelset_core::geometry::closest_point_on_triangle;
/// use nalgebra::Point3;
///
/// let closest = closest_point_on_triangle(
///     Point3::new(5.0, 3.0, 5.0),
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(10.0, 0.0, 0.0),
///     Point3::new(5.0, 10.0, 0.0),
/// );
/// assert_eq!(closest.z, 0.0);
/// ```
#[must_use]
pub fn closest_point_on_triangle(
    point: Point3<f32>,
    v0: Point3<f32>,
    v1: Point3<f32>,
    v2: Point3<f32>,
) -> Point3<f32> {
    let e02 = v0 - v2;
    let e12 = v1 - v2;

    // Collapsed triangles are resolved against the edges directly.
    if e02.cross(&e12).norm_squared() < 1e-30 {
        let on_01 = closest_point_on_segment(point, v0, v1);
        let on_12 = closest_point_on_segment(point, v1, v2);
        let on_02 = closest_point_on_segment(point, v0, v2);
        return nearer(point, nearer(point, on_01, on_12), on_02);
    }

    let to_point = point - v2;
    let m02 = e02.norm_squared();
    let m12 = e12.norm_squared();
    let d = e02.dot(&e12);
    let invdet = 1.0 / (m02 * m12 - d * d).max(1e-30);
    let a = e02.dot(&to_point);
    let b = e12.dot(&to_point);

    // Barycentric weights of the plane projection: w0 on v0, w1 on v1.
    let w0 = invdet * (m12 * a - d * b);
    let w1 = invdet * (m02 * b - d * a);
    let w2 = 1.0 - w0 - w1;

    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
        return v2 + (e02 * w0 + e12 * w1);
    }

    // Outside the face region: the two edges adjacent to the positive
    // weight are the only candidates.
    let (first, second) = if w0 > 0.0 {
        (
            closest_point_on_segment(point, v0, v1),
            closest_point_on_segment(point, v0, v2),
        )
    } else if w1 > 0.0 {
        (
            closest_point_on_segment(point, v0, v1),
            closest_point_on_segment(point, v1, v2),
        )
    } else {
        (
            closest_point_on_segment(point, v0, v2),
            closest_point_on_segment(point, v1, v2),
        )
    };
    nearer(point, first, second)
}

/// Compute the distance from a point to a triangle.
///
/// Returned distance is non-negative. See [`closest_point_on_triangle`]
/// for the classification and degeneracy behavior.
#[inline]
#[must_use]
pub fn point_triangle_distance(
    point: Point3<f32>,
    v0: Point3<f32>,
    v1: Point3<f32>,
    v2: Point3<f32>,
) -> f32 {
    (point - closest_point_on_triangle(point, v0, v1, v2)).norm()
}

/// Compute the closest point on a line segment to a query point.
///
/// Zero-length segments return the endpoint.
#[must_use]
pub fn closest_point_on_segment(point: Point3<f32>, a: Point3<f32>, b: Point3<f32>) -> Point3<f32> {
    let ab = b - a;
    let t = (point - a).dot(&ab) / ab.norm_squared().max(f32::EPSILON);
    a + ab * t.clamp(0.0, 1.0)
}

/// The candidate nearer to the query point.
fn nearer(query: Point3<f32>, a: Point3<f32>, b: Point3<f32>) -> Point3<f32> {
    if (b - query).norm_squared() < (a - query).norm_squared() {
        b
    } else {
        a
    }
}

/// Orientation of the origin-anchored 2D parallelogram `(p1, p2)`.
///
/// Returns the sign of twice the signed area together with the area
/// itself. Exactly degenerate configurations are broken lexicographically
/// (simulation of simplicity), so the sign is zero only when the two
/// points coincide.
pub(crate) fn orientation(x1: f64, y1: f64, x2: f64, y2: f64) -> (i32, f64) {
    let twice_signed_area = y1 * x2 - x1 * y2;
    let sign = if twice_signed_area > 0.0 {
        1
    } else if twice_signed_area < 0.0 {
        -1
    } else if y2 > y1 {
        1
    } else if y2 < y1 {
        -1
    } else if x1 > x2 {
        1
    } else if x1 < x2 {
        -1
    } else {
        0
    };
    (sign, twice_signed_area)
}

/// Test whether 2D point `(x0, y0)` lies in the triangle `(p1, p2, p3)`,
/// returning barycentric coordinates on containment.
///
/// The boundary rule inherited from [`orientation`] assigns every lattice
/// point on an edge shared by two triangles to exactly one of them, which
/// the crossing-parity count relies on.
pub(crate) fn point_in_triangle_2d(
    x0: f64,
    y0: f64,
    mut x1: f64,
    mut y1: f64,
    mut x2: f64,
    mut y2: f64,
    mut x3: f64,
    mut y3: f64,
) -> Option<(f64, f64, f64)> {
    x1 -= x0;
    x2 -= x0;
    x3 -= x0;
    y1 -= y0;
    y2 -= y0;
    y3 -= y0;

    let (sign_a, mut a) = orientation(x2, y2, x3, y3);
    if sign_a == 0 {
        return None;
    }
    let (sign_b, mut b) = orientation(x3, y3, x1, y1);
    if sign_b != sign_a {
        return None;
    }
    let (sign_c, mut c) = orientation(x1, y1, x2, y2);
    if sign_c != sign_a {
        return None;
    }

    let sum = a + b + c;
    if sum == 0.0 {
        return None;
    }
    a /= sum;
    b /= sum;
    c /= sum;
    Some((a, b, c))
}
