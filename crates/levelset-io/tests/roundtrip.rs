//! Container round-trip over a computed distance field.

use levelset_core::{make_level_set3, Backend, LevelSetParams};
use levelset_io::{load_obj, load_stl, read_sdf, write_sdf};
use levelset_types::{GridSpec, ScalarGrid};
use nalgebra::Point3;
use std::io::Write;

fn unit_cube() -> (Vec<[u32; 3]>, Vec<Point3<f32>>) {
    let coords = [
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
        [-0.5, 0.5, -0.5],
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
    ];
    let vertices = coords
        .iter()
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect();
    let triangles = vec![
        [0, 1, 2],
        [0, 2, 3],
        [4, 6, 5],
        [4, 7, 6],
        [0, 5, 1],
        [0, 4, 5],
        [2, 7, 3],
        [2, 6, 7],
        [0, 3, 7],
        [0, 7, 4],
        [1, 5, 6],
        [1, 6, 2],
    ];
    (triangles, vertices)
}

#[test]
fn computed_field_round_trips_bit_exactly() {
    let (triangles, vertices) = unit_cube();
    let spec = GridSpec::new((14, 14, 14), Point3::new(-0.7, -0.7, -0.7), 0.1);
    let mut phi = ScalarGrid::from_spec(&spec, 0.0);
    make_level_set3(
        &triangles,
        &vertices,
        &spec,
        &mut phi,
        &LevelSetParams {
            backend: Backend::Cpu,
            ..LevelSetParams::default()
        },
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.sdf");
    write_sdf(&path, &phi).unwrap();
    let (restored, bounds) = read_sdf(&path).unwrap();

    assert_eq!(restored.dimensions(), spec.dims);
    assert_eq!(bounds.min.x.to_bits(), spec.origin.x.to_bits());
    assert_eq!(bounds.min.y.to_bits(), spec.origin.y.to_bits());
    assert_eq!(bounds.min.z.to_bits(), spec.origin.z.to_bits());
    assert_eq!(bounds.max.x.to_bits(), spec.max_corner().x.to_bits());
    assert_eq!(bounds.max.y.to_bits(), spec.max_corner().y.to_bits());
    assert_eq!(bounds.max.z.to_bits(), spec.max_corner().z.to_bits());

    for (a, b) in restored.as_slice().iter().zip(phi.as_slice()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn obj_mesh_feeds_the_kernel() {
    // A tetrahedron authored as OBJ text, loaded, and run end to end
    let obj = "\
v 0 0 0\n\
v 1 0 0\n\
v 0 1 0\n\
v 0 0 1\n\
f 1 3 2\n\
f 1 2 4\n\
f 1 4 3\n\
f 2 3 4\n";
    let mut file = tempfile::NamedTempFile::with_suffix(".obj").unwrap();
    file.write_all(obj.as_bytes()).unwrap();
    let mesh = load_obj(file.path()).unwrap();
    assert_eq!(mesh.triangle_count(), 4);

    let spec = GridSpec::new((17, 17, 17), Point3::new(-0.3, -0.3, -0.3), 0.1);
    let mut phi = ScalarGrid::from_spec(&spec, 0.0);
    make_level_set3(
        &mesh.triangles,
        &mesh.positions,
        &spec,
        &mut phi,
        &LevelSetParams {
            backend: Backend::Cpu,
            ..LevelSetParams::default()
        },
    )
    .unwrap();

    // Interior sample is negative, far corner positive
    assert!(phi.get(5, 5, 5) < 0.0);
    assert!(phi.get(15, 15, 15) > 0.0);
}

#[test]
fn ascii_stl_mesh_feeds_the_kernel() {
    // The same plane triangle twice with opposite windings closes no
    // volume; magnitudes still come out right
    let stl = "\
solid sheet\n\
facet normal 0 0 1\n\
 outer loop\n\
  vertex 0 0 0\n\
  vertex 1 0 0\n\
  vertex 0 1 0\n\
 endloop\n\
endfacet\n\
facet normal 0 0 -1\n\
 outer loop\n\
  vertex 0 0 0\n\
  vertex 0 1 0\n\
  vertex 1 0 0\n\
 endloop\n\
endfacet\n\
endsolid sheet\n";
    let mut file = tempfile::NamedTempFile::with_suffix(".stl").unwrap();
    file.write_all(stl.as_bytes()).unwrap();
    let mesh = load_stl(file.path()).unwrap();
    assert_eq!(mesh.triangle_count(), 2);
    // STL shares no vertices between facets
    assert_eq!(mesh.vertex_count(), 6);

    let spec = GridSpec::new((8, 8, 8), Point3::new(-0.5, -0.5, -0.5), 0.25);
    let mut phi = ScalarGrid::from_spec(&spec, 0.0);
    make_level_set3(
        &mesh.triangles,
        &mesh.positions,
        &spec,
        &mut phi,
        &LevelSetParams {
            backend: Backend::Cpu,
            ..LevelSetParams::default()
        },
    )
    .unwrap();

    for &value in phi.as_slice() {
        assert!(value.is_finite());
    }
}
