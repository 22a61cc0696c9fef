//! Software rasterizer
//!
//! A small CPU backend producing RGB8 colour and a depth buffer. It is what
//! the headless viewer and the tests use for the identifier and plane
//! passes, standing in for a GPU read-back.
//!
//! Conventions: pixel (0, 0) is the top-left corner, pixel centres sit at
//! `+0.5`, NDC `y` points up, depth test is `<=` on NDC `z`.

use crate::foundation::math::{Mat4, Mat4Ext, Point3};
use crate::picking::{GroundPlane, InstanceMap, PickRenderer, PixelRect};
use crate::render::{BackendResult, Bucket, BucketData, Color, DrawUniforms, PassKind, RenderBackend, RenderError, SceneRenderer};
use crate::scene::SceneGraph;

/// Vertex after projection to window coordinates
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
    inv_w: f32,
}

/// CPU implementation of [`RenderBackend`] and [`PickRenderer`]
#[derive(Debug, Clone)]
pub struct Rasterizer {
    width: u32,
    height: u32,
    view_projection: Mat4,
    model_view_projection: Mat4,
    scissor: Option<PixelRect>,
    pass: Option<PassKind>,
    color: Vec<u8>,
    depth: Vec<f32>,
}

impl Rasterizer {
    /// Create a `width × height` target with an identity camera
    pub fn new(width: u32, height: u32) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            width,
            height,
            view_projection: Mat4::identity(),
            model_view_projection: Mat4::identity(),
            scissor: None,
            pass: None,
            color: vec![0; pixels * 3],
            depth: vec![f32::INFINITY; pixels],
        }
    }

    /// Builder pattern: set the camera's view-projection matrix
    pub fn with_view_projection(mut self, view_projection: Mat4) -> Self {
        self.view_projection = view_projection;
        self
    }

    /// Replace the camera's view-projection matrix
    pub fn set_view_projection(&mut self, view_projection: Mat4) {
        self.view_projection = view_projection;
    }

    /// Resize the target, clearing it
    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height).with_view_projection(self.view_projection);
    }

    /// Target size
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Restrict writes to `rect` (inclusive) until cleared
    pub fn set_scissor(&mut self, rect: Option<PixelRect>) {
        self.scissor = rect;
    }

    /// Colour of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.color[offset], self.color[offset + 1], self.color[offset + 2]])
    }

    /// Raw RGB8 colour buffer
    pub fn color_bytes(&self) -> &[u8] {
        &self.color
    }

    /// Copy the colour buffer into an instance map
    pub fn instance_map(&self) -> InstanceMap {
        let mut map = InstanceMap::new(self.width, self.height);
        map.as_bytes_mut().copy_from_slice(&self.color);
        map
    }

    /// Record the shaded pass of `scene`
    pub fn render_scene(&mut self, scene: &SceneGraph, renderer: &SceneRenderer) -> BackendResult<usize> {
        renderer.render(scene, self)
    }

    /// Draw the barycentric colour triangle of `plane`
    pub fn render_plane_pass(&mut self, plane: &GroundPlane) -> BackendResult<()> {
        self.begin_pass(PassKind::Identifier)?;
        self.bind_world_matrix(&Mat4::identity());

        let corners = plane.tag_triangle();
        let projected = [
            self.project(&corners[0]),
            self.project(&corners[1]),
            self.project(&corners[2]),
        ];
        if let [Some(a), Some(b), Some(c)] = projected {
            let inv_w = [a.inv_w, b.inv_w, c.inv_w];
            self.fill_triangle([a, b, c], |weights| {
                // Perspective-correct barycentrics
                let corrected = [weights[0] * inv_w[0], weights[1] * inv_w[1], weights[2] * inv_w[2]];
                let sum: f32 = corrected.iter().sum();
                corrected.map(|w| (w / sum * 255.0).round().clamp(0.0, 255.0) as u8)
            });
        }

        self.end_pass()
    }

    fn project(&self, point: &Point3) -> Option<ScreenVertex> {
        let clip = self.model_view_projection.transform_homogeneous(point);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let inv_w = 1.0 / clip.w;
        let (ndc_x, ndc_y, ndc_z) = (clip.x * inv_w, clip.y * inv_w, clip.z * inv_w);
        Some(ScreenVertex {
            x: (ndc_x + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - ndc_y) * 0.5 * self.height as f32,
            z: ndc_z,
            inv_w,
        })
    }

    fn plot(&mut self, x: i64, y: i64, z: f32, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if self.scissor.is_some_and(|rect| !rect.contains(x, y)) {
            return;
        }
        let index = y as usize * self.width as usize + x as usize;
        if z <= self.depth[index] {
            self.depth[index] = z;
            self.color[index * 3..index * 3 + 3].copy_from_slice(&rgb);
        }
    }

    /// Square splat of `size` pixels centred on (`x`, `y`)
    fn splat(&mut self, x: f32, y: f32, z: f32, size: f32, rgb: [u8; 3]) {
        let n = size.max(1.0).round() as i64;
        let x0 = (x - n as f32 * 0.5).floor() as i64;
        let y0 = (y - n as f32 * 0.5).floor() as i64;
        for dy in 0..n {
            for dx in 0..n {
                self.plot(x0 + dx, y0 + dy, z, rgb);
            }
        }
    }

    fn draw_segment(&mut self, a: ScreenVertex, b: ScreenVertex, width: f32, rgb: [u8; 3]) {
        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.splat(
                a.x + (b.x - a.x) * t,
                a.y + (b.y - a.y) * t,
                a.z + (b.z - a.z) * t,
                width,
                rgb,
            );
        }
    }

    /// Fill a triangle of either winding; `shade` maps barycentrics to a colour
    fn fill_triangle(&mut self, v: [ScreenVertex; 3], shade: impl Fn([f32; 3]) -> [u8; 3]) {
        let edge = |a: &ScreenVertex, b: &ScreenVertex, x: f32, y: f32| (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x);
        let area = edge(&v[0], &v[1], v[2].x, v[2].y);
        if area.abs() <= f32::EPSILON {
            return;
        }

        let max_x = i64::from(self.width) - 1;
        let max_y = i64::from(self.height) - 1;
        let x0 = (v.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor() as i64).max(0);
        let x1 = (v.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil() as i64).min(max_x);
        let y0 = (v.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor() as i64).max(0);
        let y1 = (v.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil() as i64).min(max_y);

        for py in y0..=y1 {
            for px in x0..=x1 {
                let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
                let weights = [
                    edge(&v[1], &v[2], cx, cy) / area,
                    edge(&v[2], &v[0], cx, cy) / area,
                    edge(&v[0], &v[1], cx, cy) / area,
                ];
                if weights.iter().any(|w| *w < 0.0) {
                    continue;
                }
                let z = weights[0] * v[0].z + weights[1] * v[1].z + weights[2] * v[2].z;
                self.plot(px, py, z, shade(weights));
            }
        }
    }
}

impl RenderBackend for Rasterizer {
    fn begin_pass(&mut self, pass: PassKind) -> BackendResult<()> {
        self.color.fill(0);
        self.depth.fill(f32::INFINITY);
        self.model_view_projection = self.view_projection;
        self.pass = Some(pass);
        Ok(())
    }

    fn bind_world_matrix(&mut self, world: &Mat4) {
        self.model_view_projection = self.view_projection * world;
    }

    fn draw(&mut self, bucket: &BucketData, uniforms: &DrawUniforms) -> BackendResult<()> {
        if self.pass.is_none() {
            return Err(RenderError::Backend("draw issued outside a pass".to_string()));
        }

        let projected: Vec<Option<ScreenVertex>> = (0..bucket.positions.len() as u32)
            .map(|i| self.project(&bucket.position(i)))
            .collect();

        for (indices, element_color) in bucket.elements() {
            let rgb = uniforms.resolve(element_color).to_rgb8();
            let vertices: Option<Vec<ScreenVertex>> = indices.iter().map(|i| projected[*i as usize]).collect();
            // Elements crossing the camera plane are dropped, not clipped
            let Some(vertices) = vertices else {
                continue;
            };
            match bucket.bucket() {
                Bucket::Points => {
                    let p = vertices[0];
                    self.splat(p.x, p.y, p.z, uniforms.point_size, rgb);
                }
                Bucket::Lines => self.draw_segment(vertices[0], vertices[1], uniforms.line_width, rgb),
                Bucket::FrontFaces | Bucket::BackFaces => {
                    self.fill_triangle([vertices[0], vertices[1], vertices[2]], |_| rgb);
                }
            }
        }
        Ok(())
    }

    fn end_pass(&mut self) -> BackendResult<()> {
        self.pass = None;
        Ok(())
    }
}

impl PickRenderer for Rasterizer {
    fn render_identifiers(&mut self, scene: &SceneGraph, region: Option<PixelRect>) -> Result<InstanceMap, RenderError> {
        self.scissor = region;
        let result = SceneRenderer::default().render_identifiers(scene, self);
        self.scissor = None;
        result?;
        Ok(self.instance_map())
    }

    fn render_plane(&mut self, plane: &GroundPlane) -> Result<InstanceMap, RenderError> {
        self.render_plane_pass(plane)?;
        Ok(self.instance_map())
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Pixel whose centre sits closest to the NDC position (`x`, `y`)
pub fn ndc_to_pixel(x: f32, y: f32, width: u32, height: u32) -> (u32, u32) {
    let px = ((x + 1.0) * 0.5 * width as f32).floor().clamp(0.0, (width.max(1) - 1) as f32);
    let py = ((1.0 - y) * 0.5 * height as f32).floor().clamp(0.0, (height.max(1) - 1) as f32);
    (px as u32, py as u32)
}
