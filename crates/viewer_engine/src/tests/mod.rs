//! Cross-module tests: scene graph, buffers, rasterizer and picking together


use crate::foundation::math::Point3;
use crate::render::PolyMesh;
use crate::scene::{NodeId, SceneGraph};

/// Square in the XY plane, `size` wide, centred on the origin
pub(crate) fn quad(size: f32) -> PolyMesh {
    let h = size * 0.5;
    PolyMesh::new(
        vec![
            Point3::new(-h, -h, 0.0),
            Point3::new(h, -h, 0.0),
            Point3::new(h, h, 0.0),
            Point3::new(-h, h, 0.0),
        ],
        vec![vec![0, 1, 2, 3]],
    )
    .unwrap()
}

/// Three quads seen through the identity camera on an 80×80 target
///
/// ```text
///   A (20, 20)    B (60, 20)
///   C (20, 60)
/// ```
pub(crate) fn three_quads() -> (SceneGraph, [NodeId; 3]) {
    let mut scene = SceneGraph::new();
    let mut ids = Vec::new();
    for (name, x, y) in [("A", -0.5, 0.5), ("B", 0.5, 0.5), ("C", -0.5, -0.5)] {
        let id = scene.insert_root(name);
        scene.attach_geometry(id, quad(0.4)).unwrap();
        scene.set_translation(id, &[x, y, 0.0]).unwrap();
        ids.push(id);
    }
    (scene, [ids[0], ids[1], ids[2]])
}

/// Target size used with [`three_quads`]
pub(crate) const TARGET: u32 = 80;
