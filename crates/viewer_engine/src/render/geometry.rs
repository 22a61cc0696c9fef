//! Geometry types that can be turned into draw buckets
//!
//! Every geometry implements [`ToRenderable`], providing only the generators
//! that make sense for it: a point cloud has no faces, a line set has no
//! faces, a polygon mesh has all four buckets.

use crate::foundation::math::Point3;
use crate::render::triangulate::{triangulate_faces, visible_edges, EdgeKey};
use crate::render::{Bucket, BucketData, BufferOptions, ColorOverrides, RenderError};
use serde::{Deserialize, Serialize};

/// Broad category of a geometry, used to filter interactive selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    /// Point cloud
    Points,
    /// Line segments
    Lines,
    /// Polygon mesh
    Mesh,
}

/// Conversion of a geometry into draw buckets
///
/// Generators return `None` when the geometry has no such bucket.
pub trait ToRenderable {
    /// Category used by the selection filter
    fn kind(&self) -> GeometryKind;

    /// Point bucket
    fn points(&self, _options: &BufferOptions<'_>) -> Option<BucketData> {
        None
    }

    /// Line bucket
    fn lines(&self, _options: &BufferOptions<'_>) -> Option<BucketData> {
        None
    }

    /// Front-facing triangle bucket
    fn front_faces(&self, _options: &BufferOptions<'_>) -> Option<BucketData> {
        None
    }

    /// Back-facing triangle bucket (reversed winding)
    fn back_faces(&self, _options: &BufferOptions<'_>) -> Option<BucketData> {
        None
    }
}

fn point_bucket(positions: &[Point3], colors: &ColorOverrides<usize>, options: &BufferOptions<'_>) -> BucketData {
    let mut data = BucketData::with_positions(Bucket::Points, positions);
    for i in 0..positions.len() {
        data.push_element(&[i as u32], colors.resolve(&i, options.style.point_color));
    }
    data
}

fn check_index(index: u32, vertex_count: usize) -> Result<(), RenderError> {
    if (index as usize) < vertex_count {
        Ok(())
    } else {
        Err(RenderError::InvalidGeometry(format!(
            "vertex index {index} out of range for {vertex_count} vertices"
        )))
    }
}

/// Unconnected points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    positions: Vec<Point3>,
    colors: ColorOverrides<usize>,
}

impl PointCloud {
    /// Create from positions
    pub fn new(positions: Vec<Point3>) -> Self {
        Self {
            positions,
            colors: ColorOverrides::new(),
        }
    }

    /// Vertex positions
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Move existing points; the count cannot change through this slice
    pub fn positions_mut(&mut self) -> &mut [Point3] {
        &mut self.positions
    }

    /// Add a point (topology change)
    pub fn push(&mut self, position: Point3) {
        self.positions.push(position);
    }

    /// Per-point colour overrides
    pub fn colors_mut(&mut self) -> &mut ColorOverrides<usize> {
        &mut self.colors
    }
}

impl ToRenderable for PointCloud {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Points
    }

    fn points(&self, options: &BufferOptions<'_>) -> Option<BucketData> {
        Some(point_bucket(&self.positions, &self.colors, options))
    }
}

/// Points joined by independent segments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSet {
    positions: Vec<Point3>,
    segments: Vec<[u32; 2]>,
    vertex_colors: ColorOverrides<usize>,
    segment_colors: ColorOverrides<usize>,
}

impl LineSet {
    /// Create from positions and index pairs
    pub fn new(positions: Vec<Point3>, segments: Vec<[u32; 2]>) -> Result<Self, RenderError> {
        for index in segments.iter().flatten() {
            check_index(*index, positions.len())?;
        }
        Ok(Self {
            positions,
            segments,
            vertex_colors: ColorOverrides::new(),
            segment_colors: ColorOverrides::new(),
        })
    }

    /// Open polyline through every position in order
    pub fn polyline(positions: Vec<Point3>) -> Self {
        let segments = (1..positions.len() as u32).map(|i| [i - 1, i]).collect();
        Self {
            positions,
            segments,
            vertex_colors: ColorOverrides::new(),
            segment_colors: ColorOverrides::new(),
        }
    }

    /// Vertex positions
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Move existing vertices
    pub fn positions_mut(&mut self) -> &mut [Point3] {
        &mut self.positions
    }

    /// Segment index pairs
    pub fn segments(&self) -> &[[u32; 2]] {
        &self.segments
    }

    /// Per-vertex colour overrides (point bucket)
    pub fn vertex_colors_mut(&mut self) -> &mut ColorOverrides<usize> {
        &mut self.vertex_colors
    }

    /// Per-segment colour overrides (line bucket)
    pub fn segment_colors_mut(&mut self) -> &mut ColorOverrides<usize> {
        &mut self.segment_colors
    }
}

impl ToRenderable for LineSet {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Lines
    }

    fn points(&self, options: &BufferOptions<'_>) -> Option<BucketData> {
        Some(point_bucket(&self.positions, &self.vertex_colors, options))
    }

    fn lines(&self, options: &BufferOptions<'_>) -> Option<BucketData> {
        let mut data = BucketData::with_positions(Bucket::Lines, &self.positions);
        for (i, segment) in self.segments.iter().enumerate() {
            data.push_element(segment, self.segment_colors.resolve(&i, options.style.line_color));
        }
        Some(data)
    }
}

/// Polygon mesh with faces of three or more vertices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyMesh {
    positions: Vec<Point3>,
    faces: Vec<Vec<u32>>,
    vertex_colors: ColorOverrides<usize>,
    edge_colors: ColorOverrides<EdgeKey>,
    face_colors: ColorOverrides<usize>,
}

impl PolyMesh {
    /// Create from positions and faces given as vertex index loops
    pub fn new(positions: Vec<Point3>, faces: Vec<Vec<u32>>) -> Result<Self, RenderError> {
        for face in &faces {
            Self::check_face(face, positions.len())?;
        }
        Ok(Self {
            positions,
            faces,
            ..Self::default()
        })
    }

    /// Axis-aligned box centred on the origin
    pub fn cuboid(half_extents: [f32; 3]) -> Self {
        let [x, y, z] = half_extents;
        let positions = vec![
            Point3::new(-x, -y, -z),
            Point3::new(x, -y, -z),
            Point3::new(x, y, -z),
            Point3::new(-x, y, -z),
            Point3::new(-x, -y, z),
            Point3::new(x, -y, z),
            Point3::new(x, y, z),
            Point3::new(-x, y, z),
        ];
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![2, 3, 7, 6],
            vec![1, 2, 6, 5],
            vec![0, 4, 7, 3],
        ];
        Self {
            positions,
            faces,
            ..Self::default()
        }
    }

    fn check_face(face: &[u32], vertex_count: usize) -> Result<(), RenderError> {
        if face.len() < 3 {
            return Err(RenderError::InvalidGeometry(format!(
                "face needs at least 3 vertices, got {}",
                face.len()
            )));
        }
        face.iter().try_for_each(|index| check_index(*index, vertex_count))
    }

    /// Vertex positions
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Move existing vertices
    pub fn positions_mut(&mut self) -> &mut [Point3] {
        &mut self.positions
    }

    /// Faces as vertex index loops
    pub fn faces(&self) -> &[Vec<u32>] {
        &self.faces
    }

    /// Append a face (topology change)
    pub fn add_face(&mut self, face: Vec<u32>) -> Result<(), RenderError> {
        Self::check_face(&face, self.positions.len())?;
        self.faces.push(face);
        Ok(())
    }

    /// Per-vertex colour overrides (point bucket)
    pub fn vertex_colors_mut(&mut self) -> &mut ColorOverrides<usize> {
        &mut self.vertex_colors
    }

    /// Per-edge colour overrides (line bucket)
    pub fn edge_colors_mut(&mut self) -> &mut ColorOverrides<EdgeKey> {
        &mut self.edge_colors
    }

    /// Per-face colour overrides (both face buckets)
    pub fn face_colors_mut(&mut self) -> &mut ColorOverrides<usize> {
        &mut self.face_colors
    }

    fn face_bucket(&self, bucket: Bucket, options: &BufferOptions<'_>) -> BucketData {
        let triangulation = triangulate_faces(&self.positions, &self.faces);
        let mut data = BucketData::with_positions(bucket, &self.positions);
        data.positions
            .extend(triangulation.extra_positions.iter().map(|p| [p.x, p.y, p.z]));

        let triangles = match bucket {
            Bucket::BackFaces => triangulation.reversed(),
            _ => triangulation.triangles,
        };
        for (triangle, face) in triangles.iter().zip(&triangulation.face_of_triangle) {
            data.push_element(triangle, self.face_colors.resolve(face, options.style.face_color));
        }
        data
    }
}

impl ToRenderable for PolyMesh {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Mesh
    }

    fn points(&self, options: &BufferOptions<'_>) -> Option<BucketData> {
        Some(point_bucket(&self.positions, &self.vertex_colors, options))
    }

    fn lines(&self, options: &BufferOptions<'_>) -> Option<BucketData> {
        let mut data = BucketData::with_positions(Bucket::Lines, &self.positions);
        for edge in visible_edges(&self.positions, &self.faces, options.suppress_coplanar_edges) {
            data.push_element(&[edge.0, edge.1], self.edge_colors.resolve(&edge, options.style.line_color));
        }
        Some(data)
    }

    fn front_faces(&self, options: &BufferOptions<'_>) -> Option<BucketData> {
        Some(self.face_bucket(Bucket::FrontFaces, options))
    }

    fn back_faces(&self, options: &BufferOptions<'_>) -> Option<BucketData> {
        Some(self.face_bucket(Bucket::BackFaces, options))
    }
}

/// Any geometry a scene node can carry
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Point cloud
    Points(PointCloud),
    /// Line segments
    Lines(LineSet),
    /// Polygon mesh
    Mesh(PolyMesh),
}

impl Geometry {
    fn inner(&self) -> &dyn ToRenderable {
        match self {
            Self::Points(g) => g,
            Self::Lines(g) => g,
            Self::Mesh(g) => g,
        }
    }
}

impl ToRenderable for Geometry {
    fn kind(&self) -> GeometryKind {
        self.inner().kind()
    }

    fn points(&self, options: &BufferOptions<'_>) -> Option<BucketData> {
        self.inner().points(options)
    }

    fn lines(&self, options: &BufferOptions<'_>) -> Option<BucketData> {
        self.inner().lines(options)
    }

    fn front_faces(&self, options: &BufferOptions<'_>) -> Option<BucketData> {
        self.inner().front_faces(options)
    }

    fn back_faces(&self, options: &BufferOptions<'_>) -> Option<BucketData> {
        self.inner().back_faces(options)
    }
}

impl From<PointCloud> for Geometry {
    fn from(geometry: PointCloud) -> Self {
        Self::Points(geometry)
    }
}

impl From<LineSet> for Geometry {
    fn from(geometry: LineSet) -> Self {
        Self::Lines(geometry)
    }
}

impl From<PolyMesh> for Geometry {
    fn from(geometry: PolyMesh) -> Self {
        Self::Mesh(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Color, Style};

    #[test]
    fn test_mesh_validation() {
        let positions = vec![Point3::origin(); 3];
        assert!(PolyMesh::new(positions.clone(), vec![vec![0, 1]]).is_err());
        assert!(PolyMesh::new(positions.clone(), vec![vec![0, 1, 3]]).is_err());
        assert!(PolyMesh::new(positions, vec![vec![0, 1, 2]]).is_ok());
        assert!(LineSet::new(vec![Point3::origin()], vec![[0, 1]]).is_err());
    }

    #[test]
    fn test_edge_colour_override_falls_back() {
        let style = Style::default();
        let options = BufferOptions::new(&style, false);
        let mut mesh = PolyMesh::new(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![vec![0, 1, 2]],
        )
        .unwrap();
        let blue = Color::rgb(0.0, 0.0, 1.0);
        mesh.edge_colors_mut().set(EdgeKey::new(1, 0), blue);

        let lines = mesh.lines(&options).unwrap();
        let colors: Vec<Color> = lines.elements().map(|(_, c)| c).collect();
        assert_eq!(colors, vec![blue, style.line_color, style.line_color]);
    }

    #[test]
    fn test_cube_with_suppression_keeps_all_edges() {
        // Every cube edge borders two perpendicular faces
        let style = Style::default();
        let cube = PolyMesh::cuboid([1.0, 1.0, 1.0]);
        assert_eq!(cube.lines(&BufferOptions::new(&style, true)).unwrap().element_count(), 12);
        assert_eq!(cube.front_faces(&BufferOptions::new(&style, true)).unwrap().element_count(), 12);
    }

    #[test]
    fn test_polyline_and_kinds() {
        let line = LineSet::polyline(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)]);
        assert_eq!(line.segments(), &[[0, 1], [1, 2]]);

        let geometry: Geometry = line.into();
        assert_eq!(geometry.kind(), GeometryKind::Lines);
        assert!(geometry.front_faces(&BufferOptions::new(&Style::default(), false)).is_none());
        assert_eq!(Geometry::from(PolyMesh::cuboid([1.0; 3])).kind(), GeometryKind::Mesh);
    }
}
