/// Orientation state and model matrix composition
use nalgebra::{Matrix4, Vector3};
use std::f32::consts::{PI, TAU};

/// Euler orientation of a scene model (in radians)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Orientation {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dpitch: f32, dyaw: f32, droll: f32) {
        self.pitch += dpitch;
        self.yaw += dyaw;
        self.roll += droll;
    }
}

/// Wrap an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Model matrix builder
pub struct Transform;

impl Transform {
    /// Rotation matrix from an orientation, applied roll, yaw, then pitch
    pub fn rotation_matrix(orientation: &Orientation) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(orientation.pitch, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, orientation.yaw, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, orientation.roll));
        rz * ry * rx
    }

    pub fn translation_matrix(offset: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(offset)
    }

    /// Full model matrix: the asset is recentered on the origin, scaled
    /// uniformly, rotated, then lifted by the float offset.
    pub fn model_matrix(
        recenter: &Vector3<f32>,
        scale: f32,
        orientation: &Orientation,
        offset: &Vector3<f32>,
    ) -> Matrix4<f32> {
        Self::translation_matrix(offset)
            * Self::rotation_matrix(orientation)
            * Matrix4::new_scaling(scale)
            * Self::translation_matrix(recenter)
    }
}
