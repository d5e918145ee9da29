//! Per-draw model transforms.

use cgmath::{Deg, Matrix4, Vector3};

/// Scale, Euler rotation (degrees about X, Y, Z) and position of one draw.
///
/// Never stored; every draw builds one and turns it into a model matrix right
/// away via [`TransformSpec::to_matrix`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformSpec {
    pub scale: Vector3<f32>,
    pub rotation_degrees: Vector3<f32>,
    pub position: Vector3<f32>,
}

impl TransformSpec {
    pub fn new(
        scale: impl Into<Vector3<f32>>,
        rotation_degrees: impl Into<Vector3<f32>>,
        position: impl Into<Vector3<f32>>,
    ) -> Self {
        Self {
            scale: scale.into(),
            rotation_degrees: rotation_degrees.into(),
            position: position.into(),
        }
    }

    /// Unrotated transform, the common case for the room's furniture.
    pub fn scaled_at(scale: impl Into<Vector3<f32>>, position: impl Into<Vector3<f32>>) -> Self {
        Self::new(scale, [0.0; 3], position)
    }

    /// `T · Rz · Ry · Rx · S`: scale first, then X, Y and Z rotation, then
    /// translation. Changing the order changes the rendered scene.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let scale = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        let rotation_x = Matrix4::from_angle_x(Deg(self.rotation_degrees.x));
        let rotation_y = Matrix4::from_angle_y(Deg(self.rotation_degrees.y));
        let rotation_z = Matrix4::from_angle_z(Deg(self.rotation_degrees.z));
        let translation = Matrix4::from_translation(self.position);

        translation * rotation_z * rotation_y * rotation_x * scale
    }
}

impl Default for TransformSpec {
    fn default() -> Self {
        Self::new([1.0; 3], [0.0; 3], [0.0; 3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Vector4};

    const EPS: f32 = 1e-5;

    fn assert_close(actual: Vector4<f32>, expected: [f32; 4]) {
        let actual: [f32; 4] = actual.into();
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < EPS, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(TransformSpec::default().to_matrix(), Matrix4::identity());
    }

    #[test]
    fn scale_then_yaw_then_translate() {
        let spec = TransformSpec::new([2.0, 1.0, 1.0], [0.0, 90.0, 0.0], [5.0, 0.0, 0.0]);
        let m = spec.to_matrix();

        // directions (w = 0) ignore the translation
        assert_close(m * Vector4::unit_x(), [0.0, 0.0, -2.0, 0.0]);
        assert_close(m * Vector4::unit_y(), [0.0, 1.0, 0.0, 0.0]);
        assert_close(m * Vector4::unit_z(), [1.0, 0.0, 0.0, 0.0]);
        // the local +X face centre of a unit cube
        assert_close(m * Vector4::new(0.5, 0.0, 0.0, 1.0), [5.0, 0.0, -1.0, 1.0]);
        assert_close(m * Vector4::unit_w(), [5.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn x_rotation_is_applied_before_z_rotation() {
        let spec = TransformSpec::new([1.0; 3], [90.0, 0.0, 90.0], [0.0; 3]);
        let m = spec.to_matrix();

        // Rx maps +Y to +Z, Rz leaves +Z alone
        assert_close(m * Vector4::unit_y(), [0.0, 0.0, 1.0, 0.0]);
        // Rx leaves +X alone, Rz maps it to +Y
        assert_close(m * Vector4::unit_x(), [0.0, 1.0, 0.0, 0.0]);
    }
}
