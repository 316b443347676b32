//! Scene renderer state: which asset is loaded, how it is normalized, and
//! the per-frame model matrix.
//!
//! Loading is split in two so the platform layer owns all I/O:
//! [`SceneRenderer::request`] hands out a [`LoadTicket`] when a fetch is
//! needed and [`SceneRenderer::complete`] accepts the decoded result. Each
//! ticket carries a generation; only the newest one can be applied, so a
//! slow load that finishes after the section changed is dropped.

use nalgebra::{Matrix4, Vector3};

use crate::animation::{FrameInput, MotionProfile, Pose, SceneAnimator};
use crate::error::AssetError;
use crate::geometry::{Bounds, Mesh};
use crate::scene_map::SceneAssetRef;
use crate::transform::Transform;

/// Largest dimension of every normalized asset, in world units
pub const TARGET_SIZE: f32 = 2.0;

/// Recentering and uniform scale applied to an asset before animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub recenter: Vector3<f32>,
    pub scale: f32,
}

impl Normalization {
    pub fn fit(bounds: &Bounds, target_size: f32, multiplier: f32) -> Self {
        let extent = bounds.max_extent();
        let extent = if extent > f32::EPSILON { extent } else { 1.0 };
        Self {
            recenter: -bounds.center().coords,
            scale: target_size / extent * multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    asset: SceneAssetRef,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn asset(&self) -> &SceneAssetRef {
        &self.asset
    }

    /// Location to fetch; tickets are only issued for real assets.
    pub fn uri(&self) -> &str {
        self.asset.uri().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer request superseded this one; the result was dropped
    Stale,
    /// Decoding failed; the previous asset (if any) is still shown
    Failed,
}

#[derive(Debug)]
struct LoadedScene {
    asset: SceneAssetRef,
    mesh: Mesh,
    normalization: Normalization,
}

/// A model matrix and the mesh to draw with it
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub mesh: &'a Mesh,
    pub model: Matrix4<f32>,
    pub pose: Pose,
}

#[derive(Debug)]
pub struct SceneRenderer {
    scale: f32,
    animator: SceneAnimator,
    requested: SceneAssetRef,
    generation: u64,
    /// Set while the newest ticket has not been completed
    pending: bool,
    loaded: Option<LoadedScene>,
    placeholder: Option<LoadedScene>,
}

impl SceneRenderer {
    /// `scale` multiplies the normalized size of every asset.
    pub fn new(scale: f32, profile: MotionProfile) -> Self {
        Self {
            scale,
            animator: SceneAnimator::new(profile),
            requested: SceneAssetRef::none(),
            generation: 0,
            pending: false,
            loaded: None,
            placeholder: None,
        }
    }

    /// Mesh drawn until the first real asset arrives.
    pub fn with_placeholder(mut self, mesh: Mesh) -> Self {
        self.placeholder = mesh.bounds().map(|bounds| LoadedScene {
            asset: SceneAssetRef::none(),
            normalization: Normalization::fit(&bounds, TARGET_SIZE, 0.5),
            mesh,
        });
        self
    }

    pub fn requested(&self) -> &SceneAssetRef {
        &self.requested
    }

    /// The asset currently on screen
    pub fn loaded_asset(&self) -> Option<&SceneAssetRef> {
        self.loaded.as_ref().map(|l| &l.asset)
    }

    pub fn is_loading(&self) -> bool {
        self.pending
    }

    /// Ask for `asset` to be shown.
    ///
    /// Returns a ticket when the caller must fetch and decode it. The none
    /// asset releases whatever is loaded right away; re-requesting the
    /// current asset does nothing.
    pub fn request(&mut self, asset: SceneAssetRef) -> Option<LoadTicket> {
        if asset == self.requested {
            return None;
        }
        self.generation += 1;
        self.requested = asset.clone();
        self.pending = false;

        if asset.is_none() {
            if let Some(previous) = self.loaded.take() {
                log::info!("released scene asset {}", previous.asset);
            }
            return None;
        }
        // Switching back to what is already on screen cancels the pending load.
        if self.loaded_asset() == Some(&asset) {
            return None;
        }

        log::info!("loading scene asset {asset}");
        self.pending = true;
        Some(LoadTicket {
            generation: self.generation,
            asset,
        })
    }

    pub fn complete(&mut self, ticket: LoadTicket, result: Result<Mesh, AssetError>) -> LoadOutcome {
        if ticket.generation != self.generation {
            log::warn!("discarding stale load of {}", ticket.asset);
            return LoadOutcome::Stale;
        }
        self.pending = false;
        let mesh = match result {
            Ok(mesh) => mesh,
            Err(e) => {
                log::error!("failed to load scene asset {}: {e}", ticket.asset);
                return LoadOutcome::Failed;
            }
        };
        let Some(bounds) = mesh.bounds() else {
            log::error!("scene asset {} has no geometry", ticket.asset);
            return LoadOutcome::Failed;
        };

        let normalization = Normalization::fit(&bounds, TARGET_SIZE, self.scale);
        log::info!(
            "scene asset {} loaded: {} triangles, size {:?}, scale {:.3}",
            ticket.asset,
            mesh.triangles.len(),
            bounds.size(),
            normalization.scale
        );
        // The previous mesh is dropped here
        self.loaded = Some(LoadedScene {
            asset: ticket.asset,
            mesh,
            normalization,
        });
        LoadOutcome::Applied
    }

    /// Advance the animation by `dt` seconds and return what to draw.
    ///
    /// The animator keeps running while nothing is loaded so an asset that
    /// arrives mid-transition picks up the current pose.
    pub fn frame(&mut self, dt: f32, input: &FrameInput) -> Option<Frame<'_>> {
        let pose = self.animator.update(dt, input);
        let scene = match &self.loaded {
            Some(scene) => scene,
            None if !self.requested.is_none() => self.placeholder.as_ref()?,
            None => return None,
        };
        let model = Transform::model_matrix(
            &scene.normalization.recenter,
            scene.normalization.scale,
            &pose.orientation,
            &Vector3::new(0.0, pose.lift, 0.0),
        );
        Some(Frame {
            mesh: &scene.mesh,
            model,
            pose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationMode;
    use nalgebra::Point3;

    const DT: f32 = 1.0 / 60.0;

    fn input() -> FrameInput {
        FrameInput {
            scroll_offset: 0.0,
            mode: AnimationMode::ScrollFollow,
        }
    }

    fn renderer() -> SceneRenderer {
        SceneRenderer::new(1.5, MotionProfile::BACKDROP)
    }

    fn asset(uri: &str) -> SceneAssetRef {
        SceneAssetRef::new(uri)
    }

    fn offset_cube(size: f32, at: Vector3<f32>) -> Mesh {
        let mut mesh = Mesh::cube(size);
        mesh.transform(&Matrix4::new_translation(&at));
        mesh
    }

    #[test]
    fn test_normalization_centers_and_fits() {
        let mesh = offset_cube(40.0, Vector3::new(100.0, -20.0, 5.0));
        let n = Normalization::fit(&mesh.bounds().unwrap(), TARGET_SIZE, 1.5);
        assert!((n.scale - 2.0 / 40.0 * 1.5).abs() < 1e-6);
        assert!((n.recenter - Vector3::new(-100.0, 20.0, -5.0)).norm() < 1e-4);
    }

    #[test]
    fn test_flat_asset_does_not_divide_by_zero() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let n = Normalization::fit(&Bounds::from_point(p), TARGET_SIZE, 1.0);
        assert_eq!(n.scale, 2.0);
    }

    #[test]
    fn test_loaded_asset_is_uniformly_sized() {
        for size in [0.01, 1.0, 500.0] {
            let mut r = renderer();
            let ticket = r.request(asset("/models/a.glb")).unwrap();
            r.complete(ticket, Ok(offset_cube(size, Vector3::new(size * 3.0, 0.0, 0.0))));
            let frame = r.frame(0.0, &input()).unwrap();
            let corner = frame.model.transform_point(&Point3::new(size * 3.5, size / 2.0, size / 2.0));
            // Half of TARGET_SIZE * 1.5 along each axis, no rotation at t = 0
            assert!((corner.x - 1.5).abs() < 1e-3, "size {size}: {corner:?}");
        }
    }

    #[test]
    fn test_nothing_drawn_before_first_load() {
        let mut r = renderer();
        assert!(r.frame(DT, &input()).is_none());
        let _ticket = r.request(asset("/models/a.glb")).unwrap();
        assert!(r.is_loading());
        assert!(r.frame(DT, &input()).is_none());
    }

    #[test]
    fn test_placeholder_shown_while_loading() {
        let mut r = renderer().with_placeholder(Mesh::cube(1.0));
        assert!(r.frame(DT, &input()).is_none());
        let ticket = r.request(asset("/models/vinyl.glb")).unwrap();
        assert_eq!(r.frame(DT, &input()).unwrap().mesh.triangles.len(), 12);
        r.complete(ticket, Ok(offset_cube(1.0, Vector3::zeros())));
        assert!(!r.is_loading());
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut r = renderer();
        let first = r.request(asset("/models/a.glb")).unwrap();
        let second = r.request(asset("/models/b.glb")).unwrap();
        assert!(second.generation() > first.generation());

        assert_eq!(r.complete(second.clone(), Ok(Mesh::cube(1.0))), LoadOutcome::Applied);
        assert_eq!(r.complete(first, Ok(Mesh::cube(9.0))), LoadOutcome::Stale);
        assert_eq!(r.loaded_asset(), Some(&asset("/models/b.glb")));
    }

    #[test]
    fn test_late_result_for_superseded_request_is_discarded_before_newer_arrives() {
        let mut r = renderer();
        let first = r.request(asset("/models/a.glb")).unwrap();
        let _second = r.request(asset("/models/b.glb")).unwrap();
        assert_eq!(r.complete(first, Ok(Mesh::cube(1.0))), LoadOutcome::Stale);
        assert!(r.loaded_asset().is_none());
    }

    #[test]
    fn test_failure_keeps_previous_asset() {
        let mut r = renderer();
        let ticket = r.request(asset("/models/a.glb")).unwrap();
        r.complete(ticket, Ok(Mesh::cube(1.0)));

        let ticket = r.request(asset("/models/broken.glb")).unwrap();
        let outcome = r.complete(ticket, Err(AssetError::EmptyGeometry));
        assert_eq!(outcome, LoadOutcome::Failed);
        assert_eq!(r.loaded_asset(), Some(&asset("/models/a.glb")));
        assert!(r.frame(DT, &input()).is_some());
    }

    #[test]
    fn test_failed_load_is_not_retried_or_left_pending() {
        let mut r = renderer();
        let ticket = r.request(asset("/models/broken.glb")).unwrap();
        assert!(r.is_loading());
        assert_eq!(r.complete(ticket, Err(AssetError::EmptyGeometry)), LoadOutcome::Failed);
        assert!(!r.is_loading());
        assert!(r.request(asset("/models/broken.glb")).is_none());
        assert!(!r.is_loading());
    }

    #[test]
    fn test_none_releases_asset_and_same_asset_is_noop() {
        let mut r = renderer();
        let ticket = r.request(asset("/models/a.glb")).unwrap();
        r.complete(ticket, Ok(Mesh::cube(1.0)));
        assert!(r.request(asset("/models/a.glb")).is_none());

        assert!(r.request(SceneAssetRef::none()).is_none());
        assert!(r.loaded_asset().is_none());
        assert!(r.frame(DT, &input()).is_none());

        // Coming back needs a fresh load
        assert!(r.request(asset("/models/a.glb")).is_some());
    }

    #[test]
    fn test_returning_to_shown_asset_cancels_pending_load() {
        let mut r = renderer();
        let ticket = r.request(asset("/models/a.glb")).unwrap();
        r.complete(ticket, Ok(Mesh::cube(1.0)));

        let pending = r.request(asset("/models/b.glb")).unwrap();
        assert!(r.request(asset("/models/a.glb")).is_none());
        assert!(!r.is_loading());
        assert_eq!(r.complete(pending, Ok(Mesh::cube(2.0))), LoadOutcome::Stale);
        assert_eq!(r.loaded_asset(), Some(&asset("/models/a.glb")));
    }
}
