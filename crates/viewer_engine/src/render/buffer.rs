//! Draw buckets generated from node geometry
//!
//! A [`RenderableBuffer`] holds up to four buckets (points, lines, front
//! faces, back faces). `init` sizes them to the current topology; `update`
//! rewrites their contents in place and refuses to run if any count changed.

use crate::foundation::math::Point3;
use crate::render::{Color, RenderError, Style, ToRenderable};

/// One of the four draw buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// One index per point
    Points,
    /// Two indices per segment
    Lines,
    /// Three indices per triangle, mesh winding
    FrontFaces,
    /// Three indices per triangle, reversed winding
    BackFaces,
}

impl Bucket {
    /// All buckets in draw order
    pub const ALL: [Self; 4] = [Self::FrontFaces, Self::BackFaces, Self::Lines, Self::Points];

    /// Indices making up one element
    pub const fn vertices_per_element(self) -> usize {
        match self {
            Self::Points => 1,
            Self::Lines => 2,
            Self::FrontFaces | Self::BackFaces => 3,
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Points => 0,
            Self::Lines => 1,
            Self::FrontFaces => 2,
            Self::BackFaces => 3,
        }
    }
}

/// Positions, per-element colours and element indices of one bucket
#[derive(Debug, Clone, PartialEq)]
pub struct BucketData {
    bucket: Bucket,
    /// Vertex positions in node-local space
    pub positions: Vec<[f32; 3]>,
    /// One colour per element
    pub colors: Vec<Color>,
    /// Flat index list, `vertices_per_element` indices per element
    pub elements: Vec<u32>,
}

impl BucketData {
    /// Empty bucket
    pub fn new(bucket: Bucket) -> Self {
        Self {
            bucket,
            positions: Vec::new(),
            colors: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Bucket with positions copied from `points`
    pub fn with_positions(bucket: Bucket, points: &[Point3]) -> Self {
        Self {
            positions: points.iter().map(|p| [p.x, p.y, p.z]).collect(),
            ..Self::new(bucket)
        }
    }

    /// Append one element and its colour
    pub fn push_element(&mut self, indices: &[u32], color: Color) {
        debug_assert_eq!(indices.len(), self.bucket.vertices_per_element());
        self.elements.extend_from_slice(indices);
        self.colors.push(color);
    }

    /// Which bucket this is
    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    /// Number of points, segments or triangles
    pub fn element_count(&self) -> usize {
        self.elements.len() / self.bucket.vertices_per_element()
    }

    /// Iterate elements as index slices with their colour
    pub fn elements(&self) -> impl Iterator<Item = (&[u32], Color)> + '_ {
        self.elements
            .chunks_exact(self.bucket.vertices_per_element())
            .zip(self.colors.iter().copied())
    }

    /// Position of vertex `index`
    pub fn position(&self, index: u32) -> Point3 {
        let [x, y, z] = self.positions[index as usize];
        Point3::new(x, y, z)
    }

    /// Raw position bytes for upload
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw colour bytes for upload
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Raw index bytes for upload
    pub fn element_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.elements)
    }

    fn same_shape(&self, other: &Self) -> bool {
        self.positions.len() == other.positions.len() && self.elements.len() == other.elements.len()
    }

    fn overwrite(&mut self, other: &Self) {
        self.positions.copy_from_slice(&other.positions);
        self.colors.copy_from_slice(&other.colors);
        self.elements.copy_from_slice(&other.elements);
    }
}

/// Inputs to the bucket generators besides the geometry itself
#[derive(Debug, Clone, Copy)]
pub struct BufferOptions<'a> {
    /// Default colours per bucket
    pub style: &'a Style,
    /// Drop interior edges between coplanar faces
    pub suppress_coplanar_edges: bool,
}

impl<'a> BufferOptions<'a> {
    /// Bundle style and edge options
    pub fn new(style: &'a Style, suppress_coplanar_edges: bool) -> Self {
        Self {
            style,
            suppress_coplanar_edges,
        }
    }
}

/// Draw buckets derived from one node's geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderableBuffer {
    buckets: [Option<BucketData>; 4],
    initialised: bool,
}

impl RenderableBuffer {
    /// Empty, uninitialised buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `init` has run
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Generated bucket, if the geometry provides it
    pub fn bucket(&self, bucket: Bucket) -> Option<&BucketData> {
        self.buckets[bucket.slot()].as_ref()
    }

    /// Regenerate every bucket sized to the current topology
    pub fn init<G: ToRenderable + ?Sized>(&mut self, geometry: &G, options: &BufferOptions<'_>) {
        self.buckets = generate(geometry, options);
        self.initialised = true;
        log::trace!(
            "initialised buffers: {} triangles, {} segments, {} points",
            self.count(Bucket::FrontFaces),
            self.count(Bucket::Lines),
            self.count(Bucket::Points)
        );
    }

    /// Overwrite bucket contents in place
    ///
    /// Nothing is written unless every bucket keeps its position and element
    /// count from the last `init`.
    pub fn update<G: ToRenderable + ?Sized>(&mut self, geometry: &G, options: &BufferOptions<'_>) -> Result<(), RenderError> {
        if !self.initialised {
            return Err(RenderError::NotInitialised);
        }

        let fresh = generate(geometry, options);
        for bucket in Bucket::ALL {
            let matches = match (&self.buckets[bucket.slot()], &fresh[bucket.slot()]) {
                (Some(current), Some(next)) => current.same_shape(next),
                (None, None) => true,
                _ => false,
            };
            if !matches {
                return Err(RenderError::TopologyMismatch { bucket });
            }
        }

        for (current, next) in self.buckets.iter_mut().zip(fresh.iter()) {
            if let (Some(current), Some(next)) = (current, next) {
                current.overwrite(next);
            }
        }
        Ok(())
    }

    fn count(&self, bucket: Bucket) -> usize {
        self.bucket(bucket).map_or(0, BucketData::element_count)
    }
}

fn generate<G: ToRenderable + ?Sized>(geometry: &G, options: &BufferOptions<'_>) -> [Option<BucketData>; 4] {
    [
        geometry.points(options),
        geometry.lines(options),
        geometry.front_faces(options),
        geometry.back_faces(options),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{PointCloud, PolyMesh};

    fn quad_mesh() -> PolyMesh {
        PolyMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_update_before_init_fails() {
        let style = Style::default();
        let mut buffer = RenderableBuffer::new();
        let result = buffer.update(&quad_mesh(), &BufferOptions::new(&style, false));
        assert!(matches!(result, Err(RenderError::NotInitialised)));
    }

    #[test]
    fn test_init_sizes_buckets() {
        let style = Style::default();
        let mut buffer = RenderableBuffer::new();
        buffer.init(&quad_mesh(), &BufferOptions::new(&style, false));

        assert_eq!(buffer.bucket(Bucket::FrontFaces).unwrap().element_count(), 2);
        assert_eq!(buffer.bucket(Bucket::BackFaces).unwrap().element_count(), 2);
        assert_eq!(buffer.bucket(Bucket::Lines).unwrap().element_count(), 4);
        assert_eq!(buffer.bucket(Bucket::Points).unwrap().element_count(), 4);

        let faces = buffer.bucket(Bucket::FrontFaces).unwrap();
        assert!(faces.colors.iter().all(|c| *c == style.face_color));
    }

    #[test]
    fn test_update_is_idempotent() {
        let style = Style::default();
        let options = BufferOptions::new(&style, false);
        let mesh = quad_mesh();
        let mut buffer = RenderableBuffer::new();
        buffer.init(&mesh, &options);

        buffer.update(&mesh, &options).unwrap();
        let first: Vec<Vec<u8>> = Bucket::ALL
            .iter()
            .map(|b| buffer.bucket(*b).unwrap().color_bytes().to_vec())
            .collect();
        let first_positions = buffer.bucket(Bucket::FrontFaces).unwrap().position_bytes().to_vec();

        buffer.update(&mesh, &options).unwrap();
        for (bucket, bytes) in Bucket::ALL.iter().zip(&first) {
            assert_eq!(buffer.bucket(*bucket).unwrap().color_bytes(), bytes.as_slice());
        }
        assert_eq!(buffer.bucket(Bucket::FrontFaces).unwrap().position_bytes(), first_positions.as_slice());
    }

    #[test]
    fn test_update_applies_attribute_changes() {
        let style = Style::default();
        let options = BufferOptions::new(&style, false);
        let mut mesh = quad_mesh();
        let mut buffer = RenderableBuffer::new();
        buffer.init(&mesh, &options);

        let red = Color::rgb(1.0, 0.0, 0.0);
        mesh.face_colors_mut().set(0, red);
        mesh.positions_mut()[2].z = 0.5;
        buffer.update(&mesh, &options).unwrap();

        let faces = buffer.bucket(Bucket::FrontFaces).unwrap();
        assert!(faces.colors.iter().all(|c| *c == red));
        assert_eq!(faces.positions[2], [1.0, 1.0, 0.5]);
    }

    #[test]
    fn test_update_after_topology_change_is_rejected() {
        let style = Style::default();
        let options = BufferOptions::new(&style, false);
        let mut cloud = PointCloud::new(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]);
        let mut buffer = RenderableBuffer::new();
        buffer.init(&cloud, &options);
        let before = buffer.clone();

        cloud.push(Point3::new(2.0, 0.0, 0.0));
        let result = buffer.update(&cloud, &options);
        assert!(matches!(result, Err(RenderError::TopologyMismatch { bucket: Bucket::Points })));
        assert_eq!(buffer, before);

        buffer.init(&cloud, &options);
        assert_eq!(buffer.bucket(Bucket::Points).unwrap().element_count(), 3);
    }

    #[test]
    fn test_point_cloud_has_no_face_buckets() {
        let style = Style::default();
        let mut buffer = RenderableBuffer::new();
        buffer.init(&PointCloud::new(vec![Point3::origin()]), &BufferOptions::new(&style, false));

        assert!(buffer.bucket(Bucket::Points).is_some());
        assert!(buffer.bucket(Bucket::Lines).is_none());
        assert!(buffer.bucket(Bucket::FrontFaces).is_none());
    }
}
