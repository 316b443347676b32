//! Spotify iFrame API host for the audio embed bridge.
//!
//! The API script is injected on first mount and announces itself through
//! `window.onSpotifyIframeApiReady`. Mounts requested before that are
//! queued and created once the API object arrives.

use std::cell::RefCell;
use std::rc::Rc;

use folio_core::embed::{EmbedOptions, EmbedTheme};
use folio_core::{EmbedController, EmbedError, EmbedEvent, EmbedHost, MountToken};
use gloo::events::EventListener;
use js_sys::{Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlScriptElement};

const API_SCRIPT: &str = "https://open.spotify.com/embed/iframe-api/v1";

/// Embed builds differ in which of these they emit; both carry `data.isPaused`
const PLAYBACK_EVENTS: [&str; 2] = ["playback_update", "playback_state_changed"];

/// Receives every notification from the embed, tagged with its mount.
pub type EventSink = Rc<dyn Fn(MountToken, EmbedEvent<SpotifyController>)>;

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{value:?}"))
}

fn paused_flag(event: &JsValue) -> Option<bool> {
    Reflect::get(event, &"data".into())
        .and_then(|data| Reflect::get(&data, &"isPaused".into()))
        .ok()
        .and_then(|v| v.as_bool())
}

pub struct SpotifyController {
    raw: JsValue,
    _listeners: Vec<Closure<dyn FnMut(JsValue)>>,
}

impl SpotifyController {
    fn new(raw: JsValue, token: MountToken, sink: &EventSink) -> Self {
        let mut controller = Self {
            raw,
            _listeners: Vec::new(),
        };

        let ready_sink = sink.clone();
        controller.listen("ready", move |_| ready_sink(token, EmbedEvent::Ready));

        for name in PLAYBACK_EVENTS {
            let update_sink = sink.clone();
            controller.listen(name, move |event| {
                if let Some(is_paused) = paused_flag(&event) {
                    update_sink(token, EmbedEvent::PlaybackUpdate { is_paused });
                }
            });
        }

        let error_sink = sink.clone();
        controller.listen("initialization_error", move |event| {
            let message = Reflect::get(&event, &"data".into())
                .map(|data| describe(&data))
                .unwrap_or_else(|_| "initialization failed".into());
            error_sink(token, EmbedEvent::InitializationError(message));
        });

        controller
    }

    fn listen(&mut self, event: &str, handler: impl FnMut(JsValue) + 'static) {
        let closure = Closure::<dyn FnMut(JsValue)>::new(handler);
        if let Err(e) = self.call("addListener", &[event.into(), closure.as_ref().clone()]) {
            log::warn!("could not subscribe to embed {event}: {e}");
        }
        self._listeners.push(closure);
    }

    fn call(&self, method: &str, args: &[JsValue]) -> Result<JsValue, EmbedError> {
        let function = Reflect::get(&self.raw, &method.into())
            .and_then(|f| f.dyn_into::<Function>())
            .map_err(|e| EmbedError::Control(format!("{method} unavailable: {}", describe(&e))))?;
        let args: js_sys::Array = args.iter().collect();
        function
            .apply(&self.raw, &args)
            .map_err(|e| EmbedError::Control(format!("{method} failed: {}", describe(&e))))
    }
}

impl EmbedController for SpotifyController {
    fn play(&self) -> Result<(), EmbedError> {
        self.call("play", &[]).map(|_| ())
    }

    fn pause(&self) -> Result<(), EmbedError> {
        self.call("pause", &[]).map(|_| ())
    }

    fn destroy(&self) {
        if let Err(e) = self.call("destroy", &[]) {
            log::warn!("embed destroy: {e}");
        }
    }
}

struct Pending {
    token: MountToken,
    element: Element,
    options: EmbedOptions,
}

enum Api {
    NotLoaded,
    Loading(Vec<Pending>),
    Ready(JsValue),
    Failed(String),
}

struct Shared {
    api: Api,
    script_error: Option<EventListener>,
}

pub struct SpotifyHost {
    document: Document,
    container: Element,
    sink: EventSink,
    shared: Rc<RefCell<Shared>>,
    children: Vec<(MountToken, Element)>,
}

impl SpotifyHost {
    pub fn new(document: Document, container: Element, sink: EventSink) -> Self {
        Self {
            document,
            container,
            sink,
            shared: Rc::new(RefCell::new(Shared {
                api: Api::NotLoaded,
                script_error: None,
            })),
            children: Vec::new(),
        }
    }

    fn load_script(&self) -> Result<(), EmbedError> {
        let window = web_sys::window().ok_or_else(|| EmbedError::Host("no window".into()))?;

        let shared = self.shared.clone();
        let sink = self.sink.clone();
        let on_ready = Closure::once_into_js(move |api: JsValue| {
            let queued = match std::mem::replace(&mut shared.borrow_mut().api, Api::Ready(api.clone())) {
                Api::Loading(queued) => queued,
                _ => Vec::new(),
            };
            log::info!("spotify iframe api ready, {} mount(s) queued", queued.len());
            for pending in queued {
                if let Err(e) = create_controller(&api, &pending, &sink) {
                    sink(pending.token, EmbedEvent::InitializationError(e.to_string()));
                }
            }
        });
        Reflect::set(&window, &"onSpotifyIframeApiReady".into(), &on_ready)
            .map_err(|e| EmbedError::ScriptLoad(describe(&e)))?;

        let script = self
            .document
            .create_element("script")
            .and_then(|e| e.dyn_into::<HtmlScriptElement>().map_err(JsValue::from))
            .map_err(|e| EmbedError::Host(describe(&e)))?;
        script.set_src(API_SCRIPT);
        script.set_async(true);

        let shared = self.shared.clone();
        let sink = self.sink.clone();
        let listener = EventListener::once(&script, "error", move |_| {
            let message = format!("could not load {API_SCRIPT}");
            let queued = match std::mem::replace(&mut shared.borrow_mut().api, Api::Failed(message.clone())) {
                Api::Loading(queued) => queued,
                _ => Vec::new(),
            };
            for pending in queued {
                sink(pending.token, EmbedEvent::ScriptLoadFailed(message.clone()));
            }
        });
        self.shared.borrow_mut().script_error = Some(listener);

        let head = self
            .document
            .head()
            .ok_or_else(|| EmbedError::Host("document has no head".into()))?;
        head.append_child(&script)
            .map_err(|e| EmbedError::ScriptLoad(describe(&e)))?;
        log::info!("loading {API_SCRIPT}");
        Ok(())
    }
}

fn create_controller(api: &JsValue, pending: &Pending, sink: &EventSink) -> Result<(), EmbedError> {
    let init_error = |e: JsValue| EmbedError::Initialization(describe(&e));

    let options = Object::new();
    let theme = match pending.options.theme {
        EmbedTheme::Dark => "dark",
        EmbedTheme::Light => "light",
    };
    for (key, value) in [
        ("uri", JsValue::from_str(&pending.options.uri)),
        ("width", JsValue::from_str(&pending.options.width)),
        ("height", JsValue::from(pending.options.height)),
        ("theme", JsValue::from_str(theme)),
    ] {
        Reflect::set(&options, &key.into(), &value).map_err(init_error)?;
    }

    let token = pending.token;
    let sink = sink.clone();
    let on_created = Closure::once_into_js(move |raw: JsValue| {
        let controller = SpotifyController::new(raw, token, &sink);
        sink(token, EmbedEvent::ControllerCreated(controller));
    });

    let create = Reflect::get(api, &"createController".into())
        .and_then(|f| f.dyn_into::<Function>())
        .map_err(init_error)?;
    create
        .call3(api, &pending.element, &options, &on_created)
        .map_err(init_error)?;
    Ok(())
}

impl EmbedHost for SpotifyHost {
    type Controller = SpotifyController;

    fn attach(&mut self, token: MountToken, options: &EmbedOptions) -> Result<(), EmbedError> {
        let element = self
            .document
            .create_element("div")
            .map_err(|e| EmbedError::Host(describe(&e)))?;
        self.container
            .append_child(&element)
            .map_err(|e| EmbedError::Host(describe(&e)))?;
        self.children.push((token, element.clone()));

        let pending = Pending {
            token,
            element,
            options: options.clone(),
        };

        let state = {
            let mut shared = self.shared.borrow_mut();
            match &mut shared.api {
                Api::Ready(api) => Ok(Some(api.clone())),
                Api::Loading(queued) => {
                    queued.push(pending);
                    return Ok(());
                }
                Api::Failed(message) => Err(EmbedError::ScriptLoad(message.clone())),
                Api::NotLoaded => Ok(None),
            }
        };
        let result = match state {
            Ok(Some(api)) => create_controller(&api, &pending, &self.sink),
            Ok(None) => {
                self.shared.borrow_mut().api = Api::Loading(vec![pending]);
                let loaded = self.load_script();
                if loaded.is_err() {
                    self.shared.borrow_mut().api = Api::NotLoaded;
                }
                loaded
            }
            Err(e) => Err(e),
        };

        if result.is_err() {
            self.detach(token);
        }
        result
    }

    fn detach(&mut self, token: MountToken) {
        if let Api::Loading(queued) = &mut self.shared.borrow_mut().api {
            queued.retain(|p| p.token != token);
        }
        self.children.retain(|(t, element)| {
            if *t == token {
                element.remove();
                false
            } else {
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_playback_events_are_subscribed() {
        assert!(PLAYBACK_EVENTS.contains(&"playback_update"));
        assert!(PLAYBACK_EVENTS.contains(&"playback_state_changed"));
    }
}
