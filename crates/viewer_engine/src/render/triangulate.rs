//! Polygon triangulation and edge extraction for polygon meshes

use crate::foundation::math::{Point3, Vec3};
use std::collections::HashMap;

/// Distance below which four points count as coplanar
pub const COPLANAR_TOLERANCE: f32 = 1e-5;

/// Undirected edge between two vertex indices, stored low index first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(pub u32, pub u32);

impl EdgeKey {
    /// Normalised edge key, independent of direction
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

/// Triangles generated for a set of polygon faces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulation {
    /// Synthesised centroid vertices, appended after the mesh positions
    pub extra_positions: Vec<Point3>,
    /// Front-facing triangles as vertex index triples
    pub triangles: Vec<[u32; 3]>,
    /// Source face index of each triangle
    pub face_of_triangle: Vec<usize>,
}

impl Triangulation {
    /// Same triangles with reversed winding, for back faces
    pub fn reversed(&self) -> Vec<[u32; 3]> {
        self.triangles.iter().map(|&[a, b, c]| [a, c, b]).collect()
    }
}

/// Triangulate every face
///
/// Triangles keep their face's winding. Quads split along `v0-v2`; larger
/// faces fan around a new centroid vertex so every input edge appears in
/// exactly one triangle.
pub fn triangulate_faces(positions: &[Point3], faces: &[Vec<u32>]) -> Triangulation {
    let mut out = Triangulation::default();
    let mut next_index = positions.len() as u32;

    for (face_index, face) in faces.iter().enumerate() {
        match face.as_slice() {
            [a, b, c] => {
                out.triangles.push([*a, *b, *c]);
                out.face_of_triangle.push(face_index);
            }
            [a, b, c, d] => {
                out.triangles.push([*a, *b, *c]);
                out.triangles.push([*a, *c, *d]);
                out.face_of_triangle.extend([face_index, face_index]);
            }
            _ if face.len() > 4 => {
                let centroid = next_index;
                next_index += 1;
                out.extra_positions.push(face_centroid(positions, face));
                for (i, vertex) in face.iter().enumerate() {
                    let next = face[(i + 1) % face.len()];
                    out.triangles.push([*vertex, next, centroid]);
                    out.face_of_triangle.push(face_index);
                }
            }
            _ => {}
        }
    }

    out
}

/// Arithmetic mean of a face's vertices
pub fn face_centroid(positions: &[Point3], face: &[u32]) -> Point3 {
    let sum = face
        .iter()
        .fold(Vec3::zeros(), |acc, i| acc + positions[*i as usize].coords);
    Point3::from(sum / face.len().max(1) as f32)
}

/// Whether `d` lies on the plane through `a`, `b`, `c`
///
/// Collinear `a`, `b`, `c` span no plane; they are reported as coplanar.
pub fn are_coplanar(a: &Point3, b: &Point3, c: &Point3, d: &Point3) -> bool {
    let normal = (b - a).cross(&(c - a));
    let length = normal.norm();
    if length <= f32::EPSILON {
        return true;
    }
    (normal / length).dot(&(d - a)).abs() <= COPLANAR_TOLERANCE
}

/// Unique edges of the faces in first-appearance order
///
/// With `suppress_coplanar` set, an edge shared by exactly two faces is left
/// out when its endpoints and both face centroids are coplanar. Boundary
/// edges and edges shared by more than two faces are always kept.
pub fn visible_edges(positions: &[Point3], faces: &[Vec<u32>], suppress_coplanar: bool) -> Vec<EdgeKey> {
    let mut order = Vec::new();
    let mut owners: HashMap<EdgeKey, Vec<usize>> = HashMap::new();

    for (face_index, face) in faces.iter().enumerate() {
        for (i, vertex) in face.iter().enumerate() {
            let edge = EdgeKey::new(*vertex, face[(i + 1) % face.len()]);
            let entry = owners.entry(edge).or_default();
            if entry.is_empty() {
                order.push(edge);
            }
            entry.push(face_index);
        }
    }

    if !suppress_coplanar {
        return order;
    }

    order
        .into_iter()
        .filter(|edge| match owners[edge].as_slice() {
            [f0, f1] => {
                let a = &positions[edge.0 as usize];
                let b = &positions[edge.1 as usize];
                let c0 = face_centroid(positions, &faces[*f0]);
                let c1 = face_centroid(positions, &faces[*f1]);
                !are_coplanar(a, b, &c0, &c1)
            }
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_triangle_and_quad() {
        let positions = square();
        let result = triangulate_faces(&positions, &[vec![0, 1, 2], vec![0, 1, 2, 3]]);

        assert_eq!(result.triangles, vec![[0, 1, 2], [0, 1, 2], [0, 2, 3]]);
        assert_eq!(result.face_of_triangle, vec![0, 1, 1]);
        assert!(result.extra_positions.is_empty());
    }

    #[test]
    fn test_pentagon_fans_around_centroid() {
        let mut positions = square();
        positions.push(Point3::new(0.5, 1.5, 0.0));
        let face = vec![0, 1, 2, 4, 3];
        let result = triangulate_faces(&positions, &[face]);

        assert_eq!(result.triangles.len(), 5);
        assert_eq!(result.extra_positions.len(), 1);
        assert_eq!(result.triangles[0], [0, 1, 5]);
        assert_eq!(result.triangles[4], [3, 0, 5]);
        assert_relative_eq!(result.extra_positions[0], Point3::new(0.5, 0.7, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_back_faces_reverse_winding() {
        let result = triangulate_faces(&square(), &[vec![0, 1, 2, 3]]);
        assert_eq!(result.reversed(), vec![[0, 2, 1], [0, 3, 2]]);
    }

    #[test]
    fn test_edges_are_unique_in_first_appearance_order() {
        let edges = visible_edges(&square(), &[vec![0, 1, 2], vec![0, 2, 3]], false);
        assert_eq!(
            edges,
            vec![EdgeKey(0, 1), EdgeKey(1, 2), EdgeKey(0, 2), EdgeKey(2, 3), EdgeKey(0, 3)]
        );
    }

    #[test]
    fn test_coplanar_shared_edge_is_suppressed() {
        // Unit square split into two triangles on z = 0
        let edges = visible_edges(&square(), &[vec![0, 1, 2], vec![0, 2, 3]], true);
        assert_eq!(edges.len(), 4);
        assert!(!edges.contains(&EdgeKey(0, 2)));
    }

    #[test]
    fn test_folded_shared_edge_is_kept() {
        let mut positions = square();
        positions[3].z = 1.0;
        let edges = visible_edges(&positions, &[vec![0, 1, 2], vec![0, 2, 3]], true);
        assert_eq!(edges.len(), 5);
        assert!(edges.contains(&EdgeKey(0, 2)));
    }

    #[test]
    fn test_collinear_reference_counts_as_coplanar() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        assert!(are_coplanar(&a, &b, &c, &Point3::new(0.0, 5.0, 5.0)));
    }
}
