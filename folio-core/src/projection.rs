/// Camera and screen projection shared by the canvas and terminal painters
use nalgebra::{Matrix4, Point3, Vector3};

/// A projected vertex in screen space; `depth` is NDC z (smaller is nearer)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

/// Fixed perspective camera looking down -Z at the origin
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// `aspect` is the width/height ratio of the surface in world terms;
    /// terminal callers correct for non-square character cells themselves.
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: std::f32::consts::FRAC_PI_4,
            aspect,
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a point through a precomputed model-view-projection matrix.
    /// Returns `None` outside the near/far range; x/y may fall off screen.
    pub fn project(mvp: &Matrix4<f32>, point: &Point3<f32>, width: f32, height: f32) -> Option<ScreenPoint> {
        let clip = mvp * point.to_homogeneous();
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }
        Some(ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * width,
            y: (1.0 - ndc.y) * 0.5 * height,
            depth: ndc.z,
        })
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_center() {
        let camera = Camera::new(1.0);
        let mvp = camera.view_projection();
        let p = Camera::project(&mvp, &Point3::origin(), 200.0, 100.0).unwrap();
        assert!((p.x - 100.0).abs() < 1e-3);
        assert!((p.y - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_nearer_points_have_smaller_depth() {
        let camera = Camera::default();
        let mvp = camera.view_projection();
        let near = Camera::project(&mvp, &Point3::new(0.0, 0.0, 1.0), 100.0, 100.0).unwrap();
        let far = Camera::project(&mvp, &Point3::new(0.0, 0.0, -1.0), 100.0, 100.0).unwrap();
        assert!(near.depth < far.depth);
    }

    #[test]
    fn test_points_behind_camera_are_rejected() {
        let camera = Camera::default();
        let mvp = camera.view_projection();
        assert!(Camera::project(&mvp, &Point3::new(0.0, 0.0, 10.0), 100.0, 100.0).is_none());
    }

    #[test]
    fn test_up_is_screen_up() {
        let camera = Camera::new(1.0);
        let mvp = camera.view_projection();
        let p = Camera::project(&mvp, &Point3::new(0.0, 1.0, 0.0), 100.0, 100.0).unwrap();
        assert!(p.y < 50.0);
    }

    #[test]
    fn test_invalid_aspect_is_ignored() {
        let mut camera = Camera::new(2.0);
        camera.set_aspect(0.0);
        assert_eq!(camera.aspect, 2.0);
    }
}
