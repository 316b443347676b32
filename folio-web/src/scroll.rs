//! Measures the page anchors and reports scroll offsets.

use folio_core::section::SectionExtent;
use folio_core::{Section, SectionLayout};
use gloo::events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, ScrollBehavior, ScrollIntoViewOptions, Window};

/// Read the extents of every section anchor present in the document.
pub fn measure(document: &Document) -> SectionLayout {
    let mut layout = SectionLayout::new();
    for section in Section::ALL {
        let Some(element) = document
            .get_element_by_id(section.anchor_id())
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        else {
            log::debug!("section anchor #{section} not found");
            continue;
        };
        layout.set(
            section,
            SectionExtent::new(element.offset_top() as f64, element.offset_height() as f64),
        );
    }
    layout
}

pub fn scroll_offset(window: &Window) -> f64 {
    window.scroll_y().unwrap_or(0.0)
}

/// Smooth-scroll the anchor for `section` into view.
pub fn navigate(document: &Document, section: Section) -> bool {
    let Some(element) = document.get_element_by_id(section.anchor_id()) else {
        log::warn!("cannot navigate to #{section}: anchor missing");
        return false;
    };
    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    element.scroll_into_view_with_scroll_into_view_options(&options);
    true
}

/// Scroll and resize subscriptions; dropping it unsubscribes.
pub struct ScrollSpy {
    _listeners: Vec<EventListener>,
}

impl ScrollSpy {
    /// Subscribe `on_change` to scroll and resize events. The callback also
    /// runs once immediately so the initial section is known at mount.
    pub fn mount<F>(window: &Window, on_change: F) -> Self
    where
        F: Fn(f64) + Clone + 'static,
    {
        on_change(scroll_offset(window));

        let listeners = ["scroll", "resize"]
            .into_iter()
            .map(|event| {
                let source = window.clone();
                let on_change = on_change.clone();
                EventListener::new(window, event, move |_| on_change(scroll_offset(&source)))
            })
            .collect();

        Self { _listeners: listeners }
    }
}
