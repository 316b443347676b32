//! Folio core: platform-independent logic for the portfolio page.
//!
//! Scroll tracking, scene selection and animation, asset decoding, the
//! gallery state machine and the audio embed lifecycle all live here. The
//! web and terminal front ends only supply I/O and drawing.

pub mod animation;
pub mod asset;
pub mod config;
pub mod embed;
pub mod error;
pub mod gallery;
pub mod geometry;
pub mod page;
pub mod playlist;
pub mod projection;
pub mod scene;
pub mod scene_map;
pub mod section;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use animation::{AnimationMode, FrameInput, MotionProfile, Pose};
pub use config::SiteConfig;
pub use embed::{AudioEmbedBridge, EmbedController, EmbedEvent, EmbedHost, MountToken};
pub use error::{AssetError, ConfigError, EmbedError, GalleryError};
pub use gallery::GalleryCoordinator;
pub use geometry::{Bounds, Mesh, Triangle, Vertex};
pub use page::{LoadRequest, PageShell, ShellFrame, Stage};
pub use projection::{Camera, ScreenPoint};
pub use scene::{LoadOutcome, LoadTicket, SceneRenderer};
pub use scene_map::{SceneAssetRef, SceneCatalog};
pub use section::{ScrollTracker, Section, SectionLayout};
pub use transform::{Orientation, Transform};
