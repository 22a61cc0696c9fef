//! Node-local transform
//!
//! Translation, XYZ Euler rotation and non-uniform scale, composed as
//! `Translate · Rx · Ry · Rz · Scale`. Shear is not representable.

use crate::foundation::math::{Mat3, Mat4, Mat4Ext, Vec3};
use crate::scene::SceneError;

const SCALE_EPSILON: f32 = 1e-8;
const GIMBAL_EPSILON: f32 = 1e-6;

/// Local transform of a scene node
///
/// Rotation is stored as intrinsic Euler angles in radians about X, then Y,
/// then Z, so the rotation matrix is `Rx(x) · Ry(y) · Rz(z)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    translation: Vec3,
    rotation: Vec3,
    scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from translation, rotation and scale
    pub fn new(translation: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Create from translation only
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Create by decomposing a matrix (see [`Transform::set_matrix`])
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let mut transform = Self::default();
        transform.set_matrix(matrix);
        transform
    }

    /// Builder pattern: Set translation
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Builder pattern: Set Euler rotation (radians)
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder pattern: Set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Translation component
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Euler rotation in radians
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Scale component
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Set translation from exactly three components
    pub fn set_translation(&mut self, values: &[f32]) -> Result<(), SceneError> {
        self.translation = vec3_from_slice("translation", values)?;
        Ok(())
    }

    /// Set Euler rotation (radians) from exactly three components
    pub fn set_rotation(&mut self, values: &[f32]) -> Result<(), SceneError> {
        self.rotation = vec3_from_slice("rotation", values)?;
        Ok(())
    }

    /// Set scale from exactly three components
    pub fn set_scale(&mut self, values: &[f32]) -> Result<(), SceneError> {
        self.scale = vec3_from_slice("scale", values)?;
        Ok(())
    }

    /// Rotation part as a homogeneous matrix
    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::rotation_x(self.rotation.x)
            * Mat4::rotation_y(self.rotation.y)
            * Mat4::rotation_z(self.rotation.z)
    }

    /// Compose `Translate · Rotate · Scale`
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation_matrix()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose an arbitrary affine matrix into translation, rotation, scale
    ///
    /// Translation comes from the last column and scale from the lengths of
    /// the three basis columns; the renormalised columns give the rotation.
    /// Any shear in `matrix` is dropped: the result is the closest TRS this
    /// type can hold, not an exact reconstruction. A reflection (negative
    /// determinant) is carried as a negative X scale.
    pub fn set_matrix(&mut self, matrix: &Mat4) {
        self.translation = matrix.translation_part();

        let mut columns = [Vec3::zeros(); 3];
        let mut scale = Vec3::zeros();
        for (i, column) in columns.iter_mut().enumerate() {
            let basis = Vec3::new(matrix[(0, i)], matrix[(1, i)], matrix[(2, i)]);
            let length = basis.norm();
            scale[i] = length;
            *column = if length > SCALE_EPSILON {
                basis / length
            } else {
                let mut unit = Vec3::zeros();
                unit[i] = 1.0;
                unit
            };
        }

        if Mat3::from_columns(&columns).determinant() < 0.0 {
            scale.x = -scale.x;
            columns[0] = -columns[0];
        }

        self.scale = scale;
        self.rotation = euler_from_rotation(&Mat3::from_columns(&columns));
    }
}

/// Extract XYZ intrinsic Euler angles from `R = Rx(a) · Ry(b) · Rz(c)`
fn euler_from_rotation(r: &Mat3) -> Vec3 {
    let sin_b = r[(0, 2)].clamp(-1.0, 1.0);
    let cos_b = r[(0, 0)].hypot(r[(0, 1)]);
    let b = sin_b.atan2(cos_b);

    if cos_b > GIMBAL_EPSILON {
        let a = (-r[(1, 2)]).atan2(r[(2, 2)]);
        let c = (-r[(0, 1)]).atan2(r[(0, 0)]);
        Vec3::new(a, b, c)
    } else {
        // Gimbal lock: X and Z rotate about the same axis, fold it all into X
        let a = r[(2, 1)].atan2(r[(1, 1)]);
        Vec3::new(a, b, 0.0)
    }
}

fn vec3_from_slice(component: &'static str, values: &[f32]) -> Result<Vec3, SceneError> {
    match values {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(SceneError::InvalidTransform {
            component,
            expected: 3,
            actual: values.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::{HALF_PI, PI};
    use crate::foundation::math::Point3;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_transform_identity() {
        let transform = Transform::identity();
        assert_eq!(transform.local_matrix(), Mat4::identity());
    }

    #[test]
    fn test_setters_reject_wrong_length() {
        let mut transform = Transform::identity();

        let err = transform.set_translation(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            SceneError::InvalidTransform { component: "translation", expected: 3, actual: 2 }
        ));
        assert!(transform.set_rotation(&[0.0; 4]).is_err());
        assert!(transform.set_scale(&[]).is_err());

        // Failed setters leave the transform untouched
        assert_eq!(transform, Transform::identity());
    }

    #[test]
    fn test_composition_order_is_translate_rotate_scale() {
        let transform = Transform::new(
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, HALF_PI),
            Vec3::new(2.0, 1.0, 1.0),
        );

        // Scale first (x2), then rotate 90 degrees about Z, then translate
        let p = transform.local_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(5.0, 2.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_rotation_is_x_then_y_then_z() {
        let rotation = Vec3::new(0.3, -0.7, 1.1);
        let transform = Transform::identity().with_rotation(rotation);

        let expected = Mat4::rotation_x(0.3) * Mat4::rotation_y(-0.7) * Mat4::rotation_z(1.1);
        assert_relative_eq!(transform.rotation_matrix(), expected, epsilon = EPSILON);
    }

    #[test]
    fn test_matrix_roundtrip_for_shear_free_input() {
        let cases = [
            Transform::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.4, -0.2, 1.3), Vec3::new(2.0, 1.5, 0.8)),
            Transform::new(Vec3::new(-4.0, 0.5, 0.0), Vec3::new(-1.2, 0.9, -2.5), Vec3::new(0.3, 0.3, 3.0)),
            Transform::new(Vec3::zeros(), Vec3::new(PI * 0.75, 0.1, 0.0), Vec3::new(1.0, 1.0, 1.0)),
        ];

        for original in cases {
            let matrix = original.local_matrix();
            let decomposed = Transform::from_matrix(&matrix);

            assert_relative_eq!(decomposed.translation(), original.translation(), epsilon = EPSILON);
            assert_relative_eq!(decomposed.scale(), original.scale(), epsilon = EPSILON);
            // Euler angles are not unique, so compare the recomposed matrix
            assert_relative_eq!(decomposed.local_matrix(), matrix, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_gimbal_lock_roundtrip() {
        let original = Transform::identity().with_rotation(Vec3::new(0.5, HALF_PI, 0.25));
        let decomposed = Transform::from_matrix(&original.local_matrix());

        assert_relative_eq!(decomposed.rotation().z, 0.0);
        assert_relative_eq!(decomposed.local_matrix(), original.local_matrix(), epsilon = 1e-4);
    }

    #[test]
    fn test_shear_is_dropped() {
        let mut sheared = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        // x' = x + 0.5 * y
        sheared[(0, 1)] = 0.5;

        let decomposed = Transform::from_matrix(&sheared);
        assert_relative_eq!(decomposed.translation(), Vec3::new(1.0, 2.0, 3.0), epsilon = EPSILON);

        // Second basis column (0.5, 1, 0) keeps its length as scale
        assert_relative_eq!(decomposed.scale().y, 1.25_f32.sqrt(), epsilon = EPSILON);

        // The recomposed matrix has orthogonal basis columns, so it cannot match
        let recomposed = decomposed.local_matrix();
        let col0 = recomposed.fixed_view::<3, 1>(0, 0).into_owned();
        let col1 = recomposed.fixed_view::<3, 1>(0, 1).into_owned();
        assert_relative_eq!(col0.dot(&col1), 0.0, epsilon = EPSILON);
        assert!((recomposed - sheared).abs().max() > 0.1);
    }

    #[test]
    fn test_reflection_becomes_negative_x_scale() {
        let mirrored = Mat4::new_nonuniform_scaling(&Vec3::new(-2.0, 1.0, 1.0));
        let decomposed = Transform::from_matrix(&mirrored);

        assert_relative_eq!(decomposed.scale(), Vec3::new(-2.0, 1.0, 1.0), epsilon = EPSILON);
        assert_relative_eq!(decomposed.local_matrix(), mirrored, epsilon = EPSILON);
    }
}
