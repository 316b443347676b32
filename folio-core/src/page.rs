//! The page shell: scroll position, active section and play state are
//! threaded explicitly into the two scene renderers (the backdrop behind
//! the whole page and the music section's turntable).

use crate::animation::{AnimationMode, FrameInput, MotionProfile};
use crate::config::SiteConfig;
use crate::error::AssetError;
use crate::geometry::Mesh;
use crate::scene::{Frame, LoadOutcome, LoadTicket, SceneRenderer};
use crate::scene_map::{scene_for, SceneCatalog};
use crate::section::{ScrollTracker, Section, SectionLayout};

/// Which renderer a load belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Backdrop,
    Turntable,
}

/// A fetch the platform layer has to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub stage: Stage,
    pub ticket: LoadTicket,
}

/// Both renderers' output for one display frame
#[derive(Debug)]
pub struct ShellFrame<'a> {
    pub backdrop: Option<Frame<'a>>,
    pub turntable: Option<Frame<'a>>,
}

#[derive(Debug)]
pub struct PageShell {
    tracker: ScrollTracker,
    catalog: SceneCatalog,
    backdrop: SceneRenderer,
    turntable: SceneRenderer,
    is_playing: bool,
    turntable_loaded: bool,
    initial: Vec<LoadRequest>,
}

impl PageShell {
    pub fn new(config: &SiteConfig) -> Self {
        let mut backdrop = SceneRenderer::new(config.backdrop.scale, MotionProfile::BACKDROP);
        let mut turntable = SceneRenderer::new(config.turntable.scale, MotionProfile::TURNTABLE)
            .with_placeholder(Mesh::cube(1.0));

        let tracker = ScrollTracker::new(config.scroll.lookahead);
        let mut initial = Vec::new();
        if let Some(ticket) = turntable.request(config.turntable.asset.clone()) {
            initial.push(LoadRequest {
                stage: Stage::Turntable,
                ticket,
            });
        }
        if let Some(ticket) = backdrop.request(scene_for(tracker.active(), &config.scenes)) {
            initial.push(LoadRequest {
                stage: Stage::Backdrop,
                ticket,
            });
        }

        Self {
            tracker,
            catalog: config.scenes.clone(),
            backdrop,
            turntable,
            is_playing: false,
            turntable_loaded: false,
            initial,
        }
    }

    /// Loads requested at construction; handed out once.
    pub fn take_initial_loads(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.initial)
    }

    pub fn active_section(&self) -> Section {
        self.tracker.active()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.tracker.offset()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn backdrop(&self) -> &SceneRenderer {
        &self.backdrop
    }

    pub fn turntable_loaded(&self) -> bool {
        self.turntable_loaded
    }

    pub fn backdrop_mode(&self) -> AnimationMode {
        AnimationMode::for_section(self.tracker.active(), self.is_playing)
    }

    /// Feed a scroll event. Returns the backdrop load to start, if the
    /// active section now maps to an asset that is not on screen.
    pub fn on_scroll(&mut self, offset: f64, layout: &SectionLayout) -> Option<LoadRequest> {
        let section = self.tracker.evaluate(offset, layout);
        self.backdrop
            .request(scene_for(section, &self.catalog))
            .map(|ticket| LoadRequest {
                stage: Stage::Backdrop,
                ticket,
            })
    }

    pub fn set_playing(&mut self, is_playing: bool) {
        self.is_playing = is_playing;
    }

    pub fn complete(&mut self, request: LoadRequest, result: Result<Mesh, AssetError>) -> LoadOutcome {
        match request.stage {
            Stage::Backdrop => self.backdrop.complete(request.ticket, result),
            Stage::Turntable => {
                let outcome = self.turntable.complete(request.ticket, result);
                self.turntable_loaded |= outcome == LoadOutcome::Applied;
                outcome
            }
        }
    }

    pub fn frame(&mut self, dt: f32) -> ShellFrame<'_> {
        let offset = self.tracker.offset();
        let backdrop_input = FrameInput {
            scroll_offset: offset,
            mode: self.backdrop_mode(),
        };
        let turntable_input = FrameInput {
            scroll_offset: offset,
            mode: AnimationMode::SpinLinked {
                is_playing: self.is_playing,
            },
        };
        ShellFrame {
            backdrop: self.backdrop.frame(dt, &backdrop_input),
            turntable: self.turntable.frame(dt, &turntable_input),
        }
    }
}
