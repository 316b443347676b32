//! Ownership boundary around the third-party audio embed.
//!
//! The embed cannot be redirected to a new resource in place, so every
//! mount gets a fresh child element and a fresh controller, and the old
//! pair is destroyed first. The platform side implements [`EmbedHost`]
//! and feeds the embed's asynchronous notifications back through
//! [`AudioEmbedBridge::handle`], tagged with the [`MountToken`] they
//! belong to; notifications from a torn-down mount are ignored.

use serde::{Deserialize, Serialize};

use crate::error::EmbedError;

/// Identifies one mount; tokens are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MountToken(u64);

impl MountToken {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedTheme {
    Dark,
    Light,
}

/// Presentation of the embed, shared by every mount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedStyle {
    pub width: String,
    pub height: u32,
    pub theme: EmbedTheme,
}

impl Default for EmbedStyle {
    fn default() -> Self {
        Self {
            width: "100%".into(),
            height: 152,
            theme: EmbedTheme::Dark,
        }
    }
}

/// Arguments for creating one controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedOptions {
    pub uri: String,
    pub width: String,
    pub height: u32,
    pub theme: EmbedTheme,
}

pub trait EmbedController {
    fn play(&self) -> Result<(), EmbedError>;
    fn pause(&self) -> Result<(), EmbedError>;
    fn destroy(&self);
}

/// The page-owned container the embed lives in
pub trait EmbedHost {
    type Controller: EmbedController;

    /// Create a fresh child element for `token` and start creating a
    /// controller in it. The controller arrives later as
    /// [`EmbedEvent::ControllerCreated`].
    fn attach(&mut self, token: MountToken, options: &EmbedOptions) -> Result<(), EmbedError>;

    /// Remove the child element created for `token`.
    fn detach(&mut self, token: MountToken);
}

#[derive(Debug)]
pub enum EmbedEvent<C> {
    ControllerCreated(C),
    Ready,
    PlaybackUpdate { is_paused: bool },
    InitializationError(String),
    ScriptLoadFailed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AudioEmbedState {
    pub mounted_uri: Option<String>,
    pub is_playing: bool,
    pub is_loading: bool,
    pub last_error: Option<EmbedError>,
}

#[derive(Debug)]
struct Mount<C> {
    token: MountToken,
    controller: Option<C>,
    ready: bool,
}

pub struct AudioEmbedBridge<H: EmbedHost> {
    host: H,
    style: EmbedStyle,
    next_token: u64,
    mount: Option<Mount<H::Controller>>,
    state: AudioEmbedState,
}

impl<H: EmbedHost> AudioEmbedBridge<H> {
    pub fn new(host: H, style: EmbedStyle) -> Self {
        Self {
            host,
            style,
            next_token: 0,
            mount: None,
            state: AudioEmbedState::default(),
        }
    }

    pub fn state(&self) -> &AudioEmbedState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// True once the current controller has reported ready
    pub fn is_ready(&self) -> bool {
        self.mount.as_ref().is_some_and(|m| m.ready)
    }

    /// Tear down any current embed and mount a new one for `uri`.
    pub fn mount(&mut self, uri: &str) -> Result<MountToken, EmbedError> {
        self.unmount();

        self.next_token += 1;
        let token = MountToken(self.next_token);
        let options = EmbedOptions {
            uri: uri.to_string(),
            width: self.style.width.clone(),
            height: self.style.height,
            theme: self.style.theme,
        };
        self.state.last_error = None;

        match self.host.attach(token, &options) {
            Ok(()) => {
                log::info!("mounting audio embed {uri}");
                self.state.is_loading = true;
                self.state.mounted_uri = Some(uri.to_string());
                self.mount = Some(Mount {
                    token,
                    controller: None,
                    ready: false,
                });
                Ok(token)
            }
            Err(e) => {
                log::error!("failed to mount audio embed {uri}: {e}");
                self.state.is_loading = false;
                self.state.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Destroy the current controller and its child element, if any.
    pub fn unmount(&mut self) {
        let Some(mount) = self.mount.take() else {
            return;
        };
        if let Some(controller) = mount.controller {
            controller.destroy();
        }
        self.host.detach(mount.token);
        log::debug!("unmounted audio embed {}", mount.token.id());
        self.state.mounted_uri = None;
        self.state.is_loading = false;
    }

    /// Apply a notification from the embed. Returns false when it belonged
    /// to a mount that no longer exists.
    pub fn handle(&mut self, token: MountToken, event: EmbedEvent<H::Controller>) -> bool {
        let Some(mount) = self.mount.as_mut().filter(|m| m.token == token) else {
            log::warn!("ignoring embed event for stale mount {}", token.id());
            // A controller created for a torn-down mount still has to go
            if let EmbedEvent::ControllerCreated(controller) = event {
                controller.destroy();
            }
            return false;
        };

        match event {
            EmbedEvent::ControllerCreated(controller) => {
                if let Some(previous) = mount.controller.replace(controller) {
                    previous.destroy();
                }
                mount.ready = false;
            }
            EmbedEvent::Ready => {
                let Some(controller) = mount.controller.as_ref() else {
                    log::warn!("embed reported ready before its controller was created");
                    return true;
                };
                mount.ready = true;
                self.state.is_loading = false;
                // Honour play intent expressed while the embed was starting up
                let result = if self.state.is_playing {
                    controller.play()
                } else {
                    controller.pause()
                };
                Self::record_control(&mut self.state, result);
            }
            EmbedEvent::PlaybackUpdate { is_paused } => {
                self.state.is_playing = !is_paused;
                self.state.is_loading = false;
            }
            EmbedEvent::InitializationError(message) => {
                log::error!("audio embed failed to initialize: {message}");
                mount.ready = false;
                self.state.is_loading = false;
                self.state.last_error = Some(EmbedError::Initialization(message));
            }
            EmbedEvent::ScriptLoadFailed(message) => {
                log::error!("audio embed script failed to load: {message}");
                mount.ready = false;
                self.state.is_loading = false;
                self.state.last_error = Some(EmbedError::ScriptLoad(message));
            }
        }
        true
    }

    /// Record the user's play/pause intent.
    ///
    /// The local flag changes immediately. The intent is forwarded only to
    /// a ready controller; before that, the ready notification reconciles.
    pub fn set_desired_playing(&mut self, playing: bool) {
        self.state.is_playing = playing;
        let Some(controller) = self
            .mount
            .as_ref()
            .filter(|m| m.ready)
            .and_then(|m| m.controller.as_ref())
        else {
            return;
        };
        let result = if playing {
            controller.play()
        } else {
            controller.pause()
        };
        Self::record_control(&mut self.state, result);
    }

    fn record_control(state: &mut AudioEmbedState, result: Result<(), EmbedError>) {
        match result {
            Ok(()) => {
                if state.last_error.as_ref().is_some_and(EmbedError::is_transient) {
                    state.last_error = None;
                }
            }
            Err(e) => {
                log::warn!("audio control failed: {e}");
                state.last_error = Some(e);
            }
        }
    }
}

impl<H: EmbedHost> Drop for AudioEmbedBridge<H> {
    fn drop(&mut self) {
        self.unmount();
    }
}
