//! Portfolio gallery: predefined media collections, incremental reveal,
//! focused item, and the per-item image fallback chain.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::GalleryError;

/// Items revealed on open and per `reveal_more`
pub const PAGE_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub source_uri: String,
    pub kind: MediaKind,
    pub display_title: String,
}

/// Folder label of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Photo,
    Video,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub preview_uri: String,
    /// Display order
    pub items: Vec<MediaItem>,
}

impl Collection {
    /// A numbered collection: item `n` lives at `{base_uri}/{id}-{n:02}.{jpg|mp4}`.
    /// `kind_of(i)` picks the kind of the zero-based `i`th item.
    pub fn numbered(
        id: &str,
        name: &str,
        preview_uri: &str,
        count: usize,
        base_uri: &str,
        kind_of: impl Fn(usize) -> MediaKind,
    ) -> Self {
        let items = (0..count)
            .map(|i| {
                let kind = kind_of(i);
                let ext = match kind {
                    MediaKind::Photo => "jpg",
                    MediaKind::Video => "mp4",
                };
                MediaItem {
                    id: format!("{id}-{i}"),
                    source_uri: format!("{base_uri}/{id}-{:02}.{ext}", i + 1),
                    kind,
                    display_title: format!("{name} {}", i + 1),
                }
            })
            .collect();
        Self {
            id: id.to_string(),
            name: name.to_string(),
            preview_uri: preview_uri.to_string(),
            items,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        let photos = self.items.iter().any(|i| i.kind == MediaKind::Photo);
        let videos = self.items.iter().any(|i| i.kind == MediaKind::Video);
        match (photos, videos) {
            (true, true) => CollectionKind::Mixed,
            (false, true) => CollectionKind::Video,
            _ => CollectionKind::Photo,
        }
    }

    pub fn item(&self, id: &str) -> Option<&MediaItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// Prefix substitution producing the one alternate location tried after
/// a primary image fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRule {
    pub from: String,
    pub to: String,
}

impl FallbackRule {
    /// `None` when the rule does not apply or would yield the same location.
    pub fn alternate(&self, primary: &str) -> Option<String> {
        let rest = primary.strip_prefix(self.from.as_str())?;
        let alternate = format!("{}{rest}", self.to);
        (alternate != primary).then_some(alternate)
    }
}

impl Default for FallbackRule {
    fn default() -> Self {
        Self {
            from: "/assets/".into(),
            to: "/public/assets/".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub collections: Vec<Collection>,
    pub fallback: FallbackRule,
    pub placeholder_uri: String,
    /// Shown in place of "reveal more" once a collection is exhausted
    pub see_more_url: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        let base = "/assets/portfolio";
        Self {
            collections: vec![
                Collection::numbered("photos", "Photos", "/assets/sample-portrait.jpg", 42, base, |_| {
                    MediaKind::Photo
                }),
                Collection::numbered("videos", "Videos", "/assets/sample-landscape.jpg", 28, base, |_| {
                    MediaKind::Video
                }),
                Collection::numbered("landscapes", "Landscapes", "/assets/sample-landscape.jpg", 18, base, |_| {
                    MediaKind::Photo
                }),
                Collection::numbered("films", "Short Films", "/assets/sample-landscape.jpg", 12, base, |_| {
                    MediaKind::Video
                }),
                Collection::numbered("experimental", "Experimental", "/assets/portfolio-hero.jpg", 16, base, |i| {
                    if i % 3 == 2 {
                        MediaKind::Video
                    } else {
                        MediaKind::Photo
                    }
                }),
            ],
            fallback: FallbackRule::default(),
            placeholder_uri: "/placeholder.svg".into(),
            see_more_url: "https://www.instagram.com/".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryViewState {
    pub selected_collection_id: Option<String>,
    pub visible_count: usize,
    pub focused_item_id: Option<String>,
}

impl Default for GalleryViewState {
    fn default() -> Self {
        Self {
            selected_collection_id: None,
            visible_count: PAGE_SIZE,
            focused_item_id: None,
        }
    }
}

/// Result of selecting an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus<'a> {
    /// Videos open the single-item player view
    Player(&'a MediaItem),
    /// Photos are viewed in the grid; no modal
    InGrid(&'a MediaItem),
}

/// The last cell of the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminalCell {
    RevealMore { remaining: usize },
    SeeMore { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum FallbackStage {
    #[default]
    Primary,
    Alternate,
    Placeholder,
}

/// What a grid cell should do after its image failed to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    Retry(String),
    Placeholder(String),
    /// Already showing the placeholder; nothing further is attempted
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub id: String,
    pub title: String,
    pub kind: MediaKind,
    pub source: String,
}

/// Serializable snapshot of the open gallery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryView {
    pub state: GalleryViewState,
    pub name: Option<String>,
    pub total: usize,
    pub cells: Vec<GridCell>,
    pub terminal: Option<TerminalCell>,
    pub player: Option<MediaItem>,
}

#[derive(Debug, Clone)]
pub struct GalleryCoordinator {
    config: GalleryConfig,
    view: GalleryViewState,
    fallbacks: HashMap<String, FallbackStage>,
}

impl GalleryCoordinator {
    pub fn new(config: GalleryConfig) -> Self {
        Self {
            config,
            view: GalleryViewState::default(),
            fallbacks: HashMap::new(),
        }
    }

    pub fn collections(&self) -> &[Collection] {
        &self.config.collections
    }

    pub fn view_state(&self) -> &GalleryViewState {
        &self.view
    }

    pub fn selected(&self) -> Option<&Collection> {
        let id = self.view.selected_collection_id.as_deref()?;
        self.config.collections.iter().find(|c| c.id == id)
    }

    pub fn open_collection(&mut self, collection_id: &str) -> Result<(), GalleryError> {
        let total = self
            .config
            .collections
            .iter()
            .find(|c| c.id == collection_id)
            .map(|c| c.items.len())
            .ok_or_else(|| GalleryError::UnknownCollection(collection_id.to_string()))?;

        self.view = GalleryViewState {
            selected_collection_id: Some(collection_id.to_string()),
            visible_count: PAGE_SIZE.min(total),
            focused_item_id: None,
        };
        self.fallbacks.clear();
        log::debug!("opened collection {collection_id} ({total} items)");
        Ok(())
    }

    pub fn reveal_more(&mut self) {
        let Some(total) = self.selected().map(|c| c.items.len()) else {
            return;
        };
        self.view.visible_count = (self.view.visible_count + PAGE_SIZE).min(total);
    }

    pub fn visible_items(&self) -> &[MediaItem] {
        match self.selected() {
            Some(c) => &c.items[..self.view.visible_count.min(c.items.len())],
            None => &[],
        }
    }

    pub fn select_item(&mut self, item_id: &str) -> Result<Focus<'_>, GalleryError> {
        let index = self
            .visible_items()
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| GalleryError::UnknownItem(item_id.to_string()))?;
        self.view.focused_item_id = Some(item_id.to_string());
        let item = &self.visible_items()[index];
        Ok(match item.kind {
            MediaKind::Video => Focus::Player(item),
            MediaKind::Photo => Focus::InGrid(item),
        })
    }

    pub fn focused(&self) -> Option<&MediaItem> {
        let id = self.view.focused_item_id.as_deref()?;
        self.selected()?.item(id)
    }

    /// The video shown in the single-item player, if one is focused
    pub fn player(&self) -> Option<&MediaItem> {
        self.focused().filter(|i| i.kind == MediaKind::Video)
    }

    pub fn close_focused(&mut self) {
        self.view.focused_item_id = None;
    }

    pub fn close_collection(&mut self) {
        self.view = GalleryViewState::default();
        self.fallbacks.clear();
    }

    pub fn terminal_cell(&self) -> Option<TerminalCell> {
        let total = self.selected()?.items.len();
        let remaining = total.saturating_sub(self.view.visible_count);
        Some(if remaining == 0 {
            TerminalCell::SeeMore {
                url: self.config.see_more_url.clone(),
            }
        } else {
            TerminalCell::RevealMore { remaining }
        })
    }

    fn item(&self, item_id: &str) -> Result<&MediaItem, GalleryError> {
        self.selected()
            .and_then(|c| c.item(item_id))
            .ok_or_else(|| GalleryError::UnknownItem(item_id.to_string()))
    }

    fn source_for(&self, item: &MediaItem, stage: FallbackStage) -> String {
        match stage {
            FallbackStage::Primary => item.source_uri.clone(),
            FallbackStage::Alternate => self
                .config
                .fallback
                .alternate(&item.source_uri)
                .unwrap_or_else(|| self.config.placeholder_uri.clone()),
            FallbackStage::Placeholder => self.config.placeholder_uri.clone(),
        }
    }

    /// Where a grid cell should currently load its image from
    pub fn image_source(&self, item_id: &str) -> Result<String, GalleryError> {
        let item = self.item(item_id)?;
        let stage = self.fallbacks.get(item_id).copied().unwrap_or_default();
        Ok(self.source_for(item, stage))
    }

    /// Advance the fallback chain of one item after its image failed.
    pub fn report_image_error(&mut self, item_id: &str) -> Result<ImageStatus, GalleryError> {
        let item = self.item(item_id)?;
        let stage = self.fallbacks.get(item_id).copied().unwrap_or_default();
        let (next, status) = match stage {
            FallbackStage::Primary => match self.config.fallback.alternate(&item.source_uri) {
                Some(alternate) => (FallbackStage::Alternate, ImageStatus::Retry(alternate)),
                None => (
                    FallbackStage::Placeholder,
                    ImageStatus::Placeholder(self.config.placeholder_uri.clone()),
                ),
            },
            FallbackStage::Alternate => (
                FallbackStage::Placeholder,
                ImageStatus::Placeholder(self.config.placeholder_uri.clone()),
            ),
            FallbackStage::Placeholder => return Ok(ImageStatus::Exhausted),
        };
        log::warn!("image for {item_id} failed at {stage:?}, now {next:?}");
        self.fallbacks.insert(item_id.to_string(), next);
        Ok(status)
    }

    pub fn snapshot(&self) -> GalleryView {
        let cells = self
            .visible_items()
            .iter()
            .map(|item| {
                let stage = self.fallbacks.get(&item.id).copied().unwrap_or_default();
                GridCell {
                    id: item.id.clone(),
                    title: item.display_title.clone(),
                    kind: item.kind,
                    source: self.source_for(item, stage),
                }
            })
            .collect();
        let selected = self.selected();
        GalleryView {
            state: self.view.clone(),
            name: selected.map(|c| c.name.clone()),
            total: selected.map_or(0, |c| c.items.len()),
            cells,
            terminal: self.terminal_cell(),
            player: self.player().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gallery_with(count: usize) -> GalleryCoordinator {
        let mut config = GalleryConfig::default();
        config.collections.push(Collection::numbered(
            "sample",
            "Sample",
            "/assets/sample.jpg",
            count,
            "/assets/portfolio",
            |i| if i == 0 { MediaKind::Video } else { MediaKind::Photo },
        ));
        GalleryCoordinator::new(config)
    }

    fn photos_23() -> GalleryCoordinator {
        let mut config = GalleryConfig::default();
        config.collections = vec![Collection::numbered(
            "photos",
            "Photos",
            "/assets/sample-portrait.jpg",
            23,
            "/assets/portfolio",
            |_| MediaKind::Photo,
        )];
        GalleryCoordinator::new(config)
    }

    #[test]
    fn test_twenty_three_photo_scenario() {
        let mut gallery = photos_23();
        gallery.open_collection("photos").unwrap();
        assert_eq!(gallery.view_state().visible_count, 12);
        assert_eq!(gallery.terminal_cell(), Some(TerminalCell::RevealMore { remaining: 11 }));

        gallery.reveal_more();
        assert_eq!(gallery.view_state().visible_count, 23);
        assert!(matches!(gallery.terminal_cell(), Some(TerminalCell::SeeMore { .. })));
    }

    #[test]
    fn test_reveal_more_is_bounded_and_monotone() {
        for total in [0, 1, 11, 12, 13, 24, 42] {
            let mut gallery = gallery_with(total);
            gallery.open_collection("sample").unwrap();
            let mut previous = gallery.view_state().visible_count;
            assert!(previous <= total);
            for _ in 0..6 {
                gallery.reveal_more();
                let count = gallery.view_state().visible_count;
                assert!(count >= previous && count <= total);
                previous = count;
            }
            assert_eq!(gallery.visible_items().len(), total);
        }
    }

    #[test]
    fn test_reopen_resets_view() {
        let mut gallery = GalleryCoordinator::new(GalleryConfig::default());
        gallery.open_collection("photos").unwrap();
        gallery.reveal_more();
        gallery.select_item("photos-3").unwrap();

        gallery.open_collection("videos").unwrap();
        let state = gallery.view_state();
        assert_eq!(state.visible_count, 12);
        assert_eq!(state.focused_item_id, None);
        assert_eq!(state.selected_collection_id.as_deref(), Some("videos"));
    }

    #[test]
    fn test_unknown_collection_leaves_state_untouched() {
        let mut gallery = GalleryCoordinator::new(GalleryConfig::default());
        gallery.open_collection("films").unwrap();
        let before = gallery.view_state().clone();
        assert_eq!(
            gallery.open_collection("nope"),
            Err(GalleryError::UnknownCollection("nope".into()))
        );
        assert_eq!(gallery.view_state(), &before);
    }

    #[test]
    fn test_select_video_opens_player_and_photo_stays_in_grid() {
        let mut gallery = gallery_with(5);
        gallery.open_collection("sample").unwrap();

        assert!(matches!(gallery.select_item("sample-0"), Ok(Focus::Player(_))));
        assert_eq!(gallery.player().map(|i| i.id.as_str()), Some("sample-0"));

        assert!(matches!(gallery.select_item("sample-1"), Ok(Focus::InGrid(_))));
        assert!(gallery.player().is_none());
        assert_eq!(gallery.focused().map(|i| i.id.as_str()), Some("sample-1"));

        gallery.close_focused();
        assert!(gallery.focused().is_none());
    }

    #[test]
    fn test_hidden_items_cannot_be_selected() {
        let mut gallery = gallery_with(20);
        gallery.open_collection("sample").unwrap();
        assert!(gallery.select_item("sample-15").is_err());
        gallery.reveal_more();
        assert!(gallery.select_item("sample-15").is_ok());
    }

    #[test]
    fn test_close_collection_resets_defaults() {
        let mut gallery = GalleryCoordinator::new(GalleryConfig::default());
        gallery.open_collection("photos").unwrap();
        gallery.reveal_more();
        gallery.close_collection();
        assert_eq!(gallery.view_state(), &GalleryViewState::default());
        assert!(gallery.visible_items().is_empty());
        assert!(gallery.terminal_cell().is_none());
        gallery.reveal_more();
        assert_eq!(gallery.view_state().visible_count, PAGE_SIZE);
    }

    #[test]
    fn test_fallback_chain_ends_at_placeholder() {
        let mut gallery = GalleryCoordinator::new(GalleryConfig::default());
        gallery.open_collection("photos").unwrap();
        assert_eq!(
            gallery.image_source("photos-0").unwrap(),
            "/assets/portfolio/photos-01.jpg"
        );

        assert_eq!(
            gallery.report_image_error("photos-0").unwrap(),
            ImageStatus::Retry("/public/assets/portfolio/photos-01.jpg".into())
        );
        assert_eq!(
            gallery.report_image_error("photos-0").unwrap(),
            ImageStatus::Placeholder("/placeholder.svg".into())
        );
        assert_eq!(gallery.report_image_error("photos-0").unwrap(), ImageStatus::Exhausted);
        assert_eq!(gallery.image_source("photos-0").unwrap(), "/placeholder.svg");

        // Neighbours are unaffected
        assert_eq!(
            gallery.image_source("photos-1").unwrap(),
            "/assets/portfolio/photos-02.jpg"
        );
    }

    #[test]
    fn test_fallback_without_applicable_rule_goes_straight_to_placeholder() {
        let mut config = GalleryConfig::default();
        config.collections = vec![Collection::numbered("cdn", "CDN", "", 2, "https://cdn.example", |_| {
            MediaKind::Photo
        })];
        let mut gallery = GalleryCoordinator::new(config);
        gallery.open_collection("cdn").unwrap();
        assert!(matches!(
            gallery.report_image_error("cdn-1").unwrap(),
            ImageStatus::Placeholder(_)
        ));
        assert_eq!(gallery.report_image_error("cdn-1").unwrap(), ImageStatus::Exhausted);
    }

    #[test]
    fn test_fallback_state_resets_with_collection() {
        let mut gallery = GalleryCoordinator::new(GalleryConfig::default());
        gallery.open_collection("photos").unwrap();
        gallery.report_image_error("photos-0").unwrap();
        gallery.open_collection("photos").unwrap();
        assert_eq!(
            gallery.image_source("photos-0").unwrap(),
            "/assets/portfolio/photos-01.jpg"
        );
    }

    #[test]
    fn test_collection_kinds() {
        let gallery = GalleryCoordinator::new(GalleryConfig::default());
        let kinds: Vec<_> = gallery.collections().iter().map(Collection::kind).collect();
        assert_eq!(
            kinds,
            vec![
                CollectionKind::Photo,
                CollectionKind::Video,
                CollectionKind::Photo,
                CollectionKind::Video,
                CollectionKind::Mixed
            ]
        );
    }

    #[test]
    fn test_snapshot_reflects_fallbacks_and_terminal() {
        let mut gallery = GalleryCoordinator::new(GalleryConfig::default());
        gallery.open_collection("films").unwrap();
        gallery.report_image_error("films-2").unwrap();
        let view = gallery.snapshot();
        assert_eq!(view.cells.len(), 12);
        assert_eq!(view.total, 12);
        assert_eq!(view.cells[2].source, "/public/assets/portfolio/films-03.mp4");
        assert!(matches!(view.terminal, Some(TerminalCell::SeeMore { .. })));
    }
}
