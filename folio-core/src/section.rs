//! Page sections and scroll tracking.
//!
//! The tracker is a pure evaluator: the platform layer measures where each
//! anchor sits on the page and hands the tracker a [`SectionLayout`] with
//! the current scroll offset. Which section is active never depends on
//! anything else, so repeated evaluation at the same offset is idempotent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named page regions, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Home,
    Portfolio,
    Music,
    About,
    Contact,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Home,
        Section::Portfolio,
        Section::Music,
        Section::About,
        Section::Contact,
    ];

    /// The in-page anchor id (`#home`, `#portfolio`, ...)
    pub fn anchor_id(self) -> &'static str {
        match self {
            Section::Home => "home",
            Section::Portfolio => "portfolio",
            Section::Music => "music",
            Section::About => "about",
            Section::Contact => "contact",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.anchor_id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSection(pub String);

impl fmt::Display for UnknownSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown section: {}", self.0)
    }
}

impl std::error::Error for UnknownSection {}

impl FromStr for Section {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim_start_matches('#');
        Section::ALL
            .into_iter()
            .find(|section| section.anchor_id().eq_ignore_ascii_case(id))
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

/// Vertical extent of a section on the page, `[top, top + height)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionExtent {
    pub top: f64,
    pub height: f64,
}

impl SectionExtent {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn contains(&self, position: f64) -> bool {
        position >= self.top && position < self.top + self.height
    }
}

/// Measured extents of the page sections; unmeasured sections are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionLayout {
    extents: [Option<SectionExtent>; 5],
}

impl SectionLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sections stacked back to back from the top of the page
    pub fn stacked(heights: [f64; 5]) -> Self {
        let mut layout = Self::new();
        let mut top = 0.0;
        for (section, height) in Section::ALL.into_iter().zip(heights) {
            layout.set(section, SectionExtent::new(top, height));
            top += height;
        }
        layout
    }

    pub fn set(&mut self, section: Section, extent: SectionExtent) {
        self.extents[section.index()] = Some(extent);
    }

    pub fn get(&self, section: Section) -> Option<SectionExtent> {
        self.extents[section.index()]
    }

    /// Total page height covered by measured sections
    pub fn page_height(&self) -> f64 {
        self.extents
            .iter()
            .flatten()
            .map(|e| e.top + e.height)
            .fold(0.0, f64::max)
    }

    /// Offset a "navigate to section" scroll should land on
    pub fn scroll_target(&self, section: Section) -> Option<f64> {
        self.get(section).map(|e| e.top.max(0.0))
    }
}

/// First section, in declaration order, whose extent contains `position`.
pub fn locate(position: f64, layout: &SectionLayout) -> Option<Section> {
    Section::ALL
        .into_iter()
        .find(|&section| layout.get(section).is_some_and(|e| e.contains(position)))
}

/// Default distance below the scroll offset at which sections are probed
pub const DEFAULT_LOOKAHEAD: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct ScrollTracker {
    lookahead: f64,
    offset: f64,
    active: Section,
}

impl ScrollTracker {
    pub fn new(lookahead: f64) -> Self {
        Self {
            lookahead,
            offset: 0.0,
            active: Section::Home,
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn active(&self) -> Section {
        self.active
    }

    /// Record a scroll offset and recompute the active section.
    ///
    /// When no section contains the probe point the previous section is
    /// kept, so the result is defined even above the first anchor.
    pub fn evaluate(&mut self, offset: f64, layout: &SectionLayout) -> Section {
        self.offset = offset;
        if let Some(section) = locate(offset + self.lookahead, layout) {
            if section != self.active {
                log::debug!("active section {} -> {}", self.active, section);
                self.active = section;
            }
        }
        self.active
    }
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD)
    }
}
