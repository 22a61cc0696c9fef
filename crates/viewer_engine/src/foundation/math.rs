//! Math utilities and types
//!
//! Provides the fundamental nalgebra aliases shared by the scene graph,
//! the buffer generators and the picking code.

/// 3D vector
pub type Vec3 = nalgebra::Vector3<f32>;

/// Homogeneous vector
pub type Vec4 = nalgebra::Vector4<f32>;

/// Rotation/scale block of a transform
pub type Mat3 = nalgebra::Matrix3<f32>;

/// Affine or projective transform
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Position in model or world space
pub type Point3 = nalgebra::Point3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Translation stored in the last column
    fn translation_part(&self) -> Vec3;

    /// Transform a point, returning the clip-space vector before the divide
    fn transform_homogeneous(&self, point: &Point3) -> Vec4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self[(0, 3)], self[(1, 3)], self[(2, 3)])
    }

    fn transform_homogeneous(&self, point: &Point3) -> Vec4 {
        self * point.to_homogeneous()
    }
}
