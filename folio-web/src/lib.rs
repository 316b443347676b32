//! Folio web front end.
//!
//! Wires the core page shell to the browser: scroll events drive section
//! tracking, scene assets are fetched with `gloo::net`, both scene models
//! are painted on 2D canvases every animation frame, and the music
//! section's audio embed runs through the Spotify iFrame API.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use folio_core::embed::AudioEmbedState;
use folio_core::{AudioEmbedBridge, GalleryCoordinator, LoadRequest, PageShell, Section, SiteConfig};
use gloo::render::{request_animation_frame, AnimationFrame};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlCanvasElement, Window};

pub mod canvas;
pub mod loader;
pub mod scroll;
pub mod spotify;

use canvas::{CanvasPainter, Tint};
use scroll::ScrollSpy;
use spotify::{EventSink, SpotifyHost};

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("folio-web starting");
    Ok(())
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_error)
}

fn canvas_by_id(document: &Document, id: &str) -> Result<HtmlCanvasElement, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not a canvas")))
}

struct App {
    window: Window,
    document: Document,
    shell: RefCell<PageShell>,
    gallery: RefCell<GalleryCoordinator>,
    bridge: RefCell<AudioEmbedBridge<SpotifyHost>>,
    playlists: Vec<folio_core::playlist::Playlist>,
    backdrop: RefCell<CanvasPainter>,
    turntable: RefCell<Option<CanvasPainter>>,
    scroll: RefCell<Option<ScrollSpy>>,
    frame: RefCell<Option<AnimationFrame>>,
    last_timestamp: Cell<Option<f64>>,
}

impl App {
    fn start_load(self: &Rc<Self>, request: LoadRequest) {
        let app = Rc::downgrade(self);
        spawn_local(async move {
            let result = loader::load_mesh(request.ticket.uri()).await;
            if let Some(app) = app.upgrade() {
                app.shell.borrow_mut().complete(request, result);
            }
        });
    }

    /// Anchors are re-measured on every event; content above them can
    /// grow after mount as images and fonts load.
    fn on_scroll(self: &Rc<Self>, offset: f64) {
        let layout = scroll::measure(&self.document);
        let request = self.shell.borrow_mut().on_scroll(offset, &layout);
        if let Some(request) = request {
            self.start_load(request);
        }
    }

    fn schedule_frame(self: &Rc<Self>) {
        let app = Rc::downgrade(self);
        let handle = request_animation_frame(move |timestamp| {
            if let Some(app) = app.upgrade() {
                app.render(timestamp);
                app.schedule_frame();
            }
        });
        *self.frame.borrow_mut() = Some(handle);
    }

    fn render(&self, timestamp: f64) {
        let dt = self
            .last_timestamp
            .replace(Some(timestamp))
            .map_or(0.0, |last| ((timestamp - last) / 1000.0) as f32);

        let is_playing = self.bridge.borrow().state().is_playing;
        let mut shell = self.shell.borrow_mut();
        shell.set_playing(is_playing);
        let frame = shell.frame(dt);

        let mut backdrop = self.backdrop.borrow_mut();
        match &frame.backdrop {
            Some(f) => backdrop.paint(f),
            None => backdrop.clear(),
        }
        if let Some(painter) = self.turntable.borrow_mut().as_mut() {
            match &frame.turntable {
                Some(f) => painter.paint(f),
                None => painter.clear(),
            }
        }
    }
}

fn event_sink(app: Weak<App>) -> EventSink {
    Rc::new(move |token, event| {
        // Embed callbacks can fire while the bridge is borrowed for a mount,
        // so handling is deferred to a fresh task.
        let app = app.clone();
        spawn_local(async move {
            if let Some(app) = app.upgrade() {
                app.bridge.borrow_mut().handle(token, event);
            }
        });
    })
}

/// The page controller exposed to JavaScript
#[wasm_bindgen]
pub struct FolioApp {
    inner: Rc<App>,
}

#[wasm_bindgen]
impl FolioApp {
    /// `config_toml` overrides the built-in site configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        turntable_canvas_id: Option<String>,
        embed_container_id: &str,
        config_toml: Option<String>,
    ) -> Result<FolioApp, JsValue> {
        let config = match config_toml {
            Some(text) => SiteConfig::from_toml_str(&text).map_err(js_error)?,
            None => SiteConfig::default(),
        };

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let backdrop = CanvasPainter::new(canvas_by_id(&document, canvas_id)?, Tint(0xd9, 0xd4, 0xcc))?;
        let turntable = match turntable_canvas_id {
            Some(id) => Some(CanvasPainter::new(canvas_by_id(&document, &id)?, Tint(0x2a, 0x2a, 0x2e))?),
            None => None,
        };
        let container = document
            .get_element_by_id(embed_container_id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{embed_container_id}")))?;

        let inner = Rc::new_cyclic(|weak: &Weak<App>| {
            let host = SpotifyHost::new(document.clone(), container, event_sink(weak.clone()));
            App {
                shell: RefCell::new(PageShell::new(&config)),
                gallery: RefCell::new(GalleryCoordinator::new(config.gallery.clone())),
                bridge: RefCell::new(AudioEmbedBridge::new(host, config.audio.embed.clone())),
                playlists: config.audio.playlists.clone(),
                backdrop: RefCell::new(backdrop),
                turntable: RefCell::new(turntable),
                scroll: RefCell::new(None),
                frame: RefCell::new(None),
                last_timestamp: Cell::new(None),
                window,
                document,
            }
        });
        Ok(FolioApp { inner })
    }

    /// Subscribe to scroll, kick off the initial loads and start drawing.
    pub fn start(&self) {
        let app = &self.inner;
        let initial = app.shell.borrow_mut().take_initial_loads();
        for request in initial {
            app.start_load(request);
        }

        let weak = Rc::downgrade(app);
        let spy = ScrollSpy::mount(&app.window, move |offset| {
            if let Some(app) = weak.upgrade() {
                app.on_scroll(offset);
            }
        });
        *app.scroll.borrow_mut() = Some(spy);
        app.schedule_frame();
    }

    #[wasm_bindgen(js_name = activeSection)]
    pub fn active_section(&self) -> String {
        self.inner.shell.borrow().active_section().to_string()
    }

    /// Smooth-scroll to a section by anchor id (`"music"` or `"#music"`).
    pub fn navigate(&self, id: &str) -> Result<bool, JsValue> {
        let section: Section = id.parse().map_err(js_error)?;
        Ok(scroll::navigate(&self.inner.document, section))
    }

    #[wasm_bindgen(js_name = openCollection)]
    pub fn open_collection(&self, collection_id: &str) -> Result<(), JsValue> {
        self.inner
            .gallery
            .borrow_mut()
            .open_collection(collection_id)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = revealMore)]
    pub fn reveal_more(&self) {
        self.inner.gallery.borrow_mut().reveal_more();
    }

    /// Returns true when the item opened the player view.
    #[wasm_bindgen(js_name = selectItem)]
    pub fn select_item(&self, item_id: &str) -> Result<bool, JsValue> {
        let mut gallery = self.inner.gallery.borrow_mut();
        let focus = gallery.select_item(item_id).map_err(js_error)?;
        Ok(matches!(focus, folio_core::gallery::Focus::Player(_)))
    }

    #[wasm_bindgen(js_name = closeFocused)]
    pub fn close_focused(&self) {
        self.inner.gallery.borrow_mut().close_focused();
    }

    #[wasm_bindgen(js_name = closeCollection)]
    pub fn close_collection(&self) {
        self.inner.gallery.borrow_mut().close_collection();
    }

    /// The open gallery as JSON, for the page to render.
    #[wasm_bindgen(js_name = galleryView)]
    pub fn gallery_view(&self) -> Result<String, JsValue> {
        to_json(&self.inner.gallery.borrow().snapshot())
    }

    /// Collection previews as JSON
    #[wasm_bindgen(js_name = collections)]
    pub fn collections(&self) -> Result<String, JsValue> {
        let gallery = self.inner.gallery.borrow();
        let previews: Vec<_> = gallery
            .collections()
            .iter()
            .map(|c| {
                serde_json::json!({
                    "id": c.id,
                    "name": c.name,
                    "preview_uri": c.preview_uri,
                    "count": c.items.len(),
                })
            })
            .collect();
        to_json(&previews)
    }

    /// Advance an item's image through its fallback chain. Returns the next
    /// source to try, or `None` once the placeholder is already showing.
    #[wasm_bindgen(js_name = reportImageError)]
    pub fn report_image_error(&self, item_id: &str) -> Result<Option<String>, JsValue> {
        use folio_core::gallery::ImageStatus;
        let status = self
            .inner
            .gallery
            .borrow_mut()
            .report_image_error(item_id)
            .map_err(js_error)?;
        Ok(match status {
            ImageStatus::Retry(uri) | ImageStatus::Placeholder(uri) => Some(uri),
            ImageStatus::Exhausted => None,
        })
    }

    /// Featured playlists as JSON
    pub fn playlists(&self) -> Result<String, JsValue> {
        to_json(&self.inner.playlists)
    }

    /// Mount the embed for a featured playlist and ask it to play.
    #[wasm_bindgen(js_name = playPlaylist)]
    pub fn play_playlist(&self, index: usize) -> Result<(), JsValue> {
        let playlist = self
            .inner
            .playlists
            .get(index)
            .ok_or_else(|| JsValue::from_str(&format!("no playlist {index}")))?;
        let uri = playlist
            .embed_uri()
            .ok_or_else(|| JsValue::from_str(&format!("unusable link {}", playlist.share_url)))?;
        let mut bridge = self.inner.bridge.borrow_mut();
        bridge.mount(&uri).map_err(js_error)?;
        bridge.set_desired_playing(true);
        Ok(())
    }

    #[wasm_bindgen(js_name = setPlaying)]
    pub fn set_playing(&self, playing: bool) {
        self.inner.bridge.borrow_mut().set_desired_playing(playing);
    }

    #[wasm_bindgen(js_name = audioState)]
    pub fn audio_state(&self) -> Result<String, JsValue> {
        let state: AudioEmbedState = self.inner.bridge.borrow().state().clone();
        to_json(&state)
    }
}
