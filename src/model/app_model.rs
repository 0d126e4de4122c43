//! Main application model with state management

use std::sync::Arc;
use tokio::sync::Mutex;

use super::cache::ContentStore;
use super::content::{ContentSnapshot, ContentViews};
use super::gallery::{Gallery, GalleryView};
use super::lazy_image::{Bounds, ImageId, ImageLoadState, ImageRegistry, LoadRequest, Visual};
use super::media::ImageUrlBuilder;
use super::surface::PageSurface;
use super::types::{Page, SocialLink, UiState};

/// Rows one card occupies in the page body
pub const CARD_ROWS: u16 = 6;
/// Pixel height of a terminal row when mapping cards to viewport geometry
pub const ROW_PX: f32 = 16.0;
/// Pixel width of a terminal column
pub const COL_PX: f32 = 8.0;

/// First body row of the card at `index`, saturating on very long pages
pub fn card_top(index: usize) -> u16 {
    u16::try_from(index).unwrap_or(u16::MAX).saturating_mul(CARD_ROWS)
}

/// An image a page wants mounted, in card order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSpec {
    pub src: Option<String>,
    pub alt: String,
    pub size: (u16, u16),
    pub priority: bool,
}

/// Images mounted for the active page, one per card
#[derive(Clone, Debug, Default)]
pub struct PageImages {
    pub page: Option<Page>,
    pub specs: Vec<ImageSpec>,
    pub ids: Vec<ImageId>,
}

/// Main application model containing all state
pub struct AppModel {
    pub store: ContentStore,
    pub builder: ImageUrlBuilder,
    pub social: Vec<SocialLink>,
    pub surface: PageSurface,
    pub ui_state: Arc<Mutex<UiState>>,
    pub gallery: Arc<Mutex<Gallery>>,
    pub images: Arc<Mutex<ImageRegistry>>,
    pub page_images: Arc<Mutex<PageImages>>,
    pub should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    pub fn new(store: ContentStore, builder: ImageUrlBuilder, social: Vec<SocialLink>) -> Self {
        let surface = PageSurface::new();
        Self {
            store,
            gallery: Arc::new(Mutex::new(Gallery::new(surface.clone(), builder.clone()))),
            builder,
            social,
            surface,
            ui_state: Arc::new(Mutex::new(UiState::default())),
            images: Arc::new(Mutex::new(ImageRegistry::new())),
            page_images: Arc::new(Mutex::new(PageImages::default())),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    // ========================================================================
    // Content
    // ========================================================================

    pub fn snapshot(&self) -> Arc<ContentSnapshot> {
        self.store.snapshot()
    }

    pub fn views(&self) -> ContentViews {
        ContentViews::build(&self.store.snapshot(), &self.builder)
    }

    /// Cards on a page, each with an optional image
    pub fn image_specs(&self, views: &ContentViews, page: Page) -> Vec<ImageSpec> {
        match page {
            Page::Home => views
                .settings
                .background
                .iter()
                .map(|src| ImageSpec {
                    src: Some(src.clone()),
                    alt: "Stage backdrop".to_string(),
                    size: (1920, 1080),
                    priority: true,
                })
                .collect(),
            Page::About => {
                let mut specs: Vec<ImageSpec> = views
                    .settings
                    .main_picture
                    .iter()
                    .map(|slot| ImageSpec {
                        src: slot.src.clone(),
                        alt: slot.alt.clone(),
                        size: (600, 600),
                        priority: true,
                    })
                    .collect();
                specs.extend(views.settings.gallery.iter().enumerate().map(|(i, reference)| {
                    let thumb = reference.clone().width(400).height(Some(400));
                    ImageSpec {
                        src: self.builder.url(&thumb).ok(),
                        alt: reference
                            .alt
                            .clone()
                            .unwrap_or_else(|| format!("Gallery image {}", i + 1)),
                        size: (400, 400),
                        priority: false,
                    }
                }));
                specs
            }
            Page::Music => views
                .releases
                .iter()
                .map(|release| ImageSpec {
                    src: release.cover.as_ref().and_then(|c| c.src.clone()),
                    alt: release.title.clone(),
                    size: (400, 400),
                    priority: false,
                })
                .collect(),
            Page::Shows => views
                .shows
                .iter()
                .map(|show| ImageSpec {
                    src: show.venue_image.as_ref().and_then(|i| i.src.clone()),
                    alt: show.venue.clone(),
                    size: (600, 400),
                    priority: false,
                })
                .collect(),
            Page::Contact => Vec::new(),
        }
    }

    // ========================================================================
    // Page images
    // ========================================================================

    /// Remount the active page's images if the page or its sources changed.
    /// Returns the loads that mounting started.
    pub async fn mount_page_images(&self, page: Page, specs: Vec<ImageSpec>) -> Vec<LoadRequest> {
        let mut page_images = self.page_images.lock().await;
        if page_images.page == Some(page) && page_images.specs == specs {
            return Vec::new();
        }

        let mut images = self.images.lock().await;
        for id in page_images.ids.drain(..) {
            images.unmount(id);
        }

        let mut requests = Vec::new();
        for spec in &specs {
            let (id, request) =
                images.mount(spec.src.clone(), spec.alt.clone(), spec.size, spec.priority);
            page_images.ids.push(id);
            requests.extend(request);
        }
        tracing::debug!(page = page.label(), count = specs.len(), "Page images mounted");
        page_images.page = Some(page);
        page_images.specs = specs;
        requests
    }

    /// Feed the current scroll position to every mounted lazy image
    pub async fn observe_viewport(&self) -> Vec<LoadRequest> {
        let ui_state = self.ui_state.lock().await.clone();
        let page_images = self.page_images.lock().await;
        let width = ui_state.screen.0 as f32 * COL_PX;
        let viewport = Bounds::new(
            ui_state.scroll_row as f32 * ROW_PX,
            0.0,
            width,
            ui_state.body_rows as f32 * ROW_PX,
        );
        let layout: Vec<(ImageId, Bounds)> = page_images
            .ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let top = (i * CARD_ROWS as usize) as f32 * ROW_PX;
                (*id, Bounds::new(top, 0.0, width / 3.0, CARD_ROWS as f32 * ROW_PX))
            })
            .collect();
        drop(page_images);

        self.images.lock().await.observe(&layout, viewport)
    }

    /// Re-arm this page's failed images; returns how many were reset
    pub async fn reset_failed_images(&self) -> usize {
        let page_images = self.page_images.lock().await;
        let mut images = self.images.lock().await;
        let mut count = 0;
        for id in &page_images.ids {
            if images.get(*id).map(|image| image.state()) == Some(ImageLoadState::Error) {
                images.reset(*id);
                count += 1;
            }
        }
        count
    }

    /// What each card of the active page shows right now
    pub async fn card_visuals(&self) -> Vec<Visual> {
        let page_images = self.page_images.lock().await;
        let images = self.images.lock().await;
        page_images
            .ids
            .iter()
            .zip(&page_images.specs)
            .map(|(id, spec)| match images.get(*id) {
                Some(image) => image.visual(),
                None => Visual::Placeholder {
                    width: spec.size.0,
                    height: spec.size.1,
                },
            })
            .collect()
    }

    pub async fn gallery_view(&self) -> Option<GalleryView> {
        self.gallery.lock().await.view()
    }

    pub async fn card_count(&self) -> usize {
        let page = self.ui_state.lock().await.active_page;
        let views = self.views();
        match page {
            Page::Contact => 0,
            _ => self.image_specs(&views, page).len(),
        }
    }

    // ========================================================================
    // UI State
    // ========================================================================

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn set_screen(&self, width: u16, height: u16, body_rows: u16) {
        let mut ui_state = self.ui_state.lock().await;
        ui_state.screen = (width, height);
        ui_state.body_rows = body_rows;
    }

    /// Switch page; returns true when this page is visited for the first time
    pub async fn set_active_page(&self, page: Page) -> bool {
        let mut ui_state = self.ui_state.lock().await;
        if ui_state.active_page != page {
            ui_state.active_page = page;
            ui_state.selected = 0;
            ui_state.scroll_row = 0;
        }
        ui_state.visited_pages.insert(page)
    }

    pub async fn move_selection(&self, delta: isize) {
        if self.surface.is_scroll_locked() {
            return;
        }
        let count = self.card_count().await;
        let mut ui_state = self.ui_state.lock().await;
        if count == 0 {
            ui_state.selected = 0;
            ui_state.scroll_row = 0;
            return;
        }
        let selected = (ui_state.selected as isize + delta).clamp(0, count as isize - 1) as usize;
        ui_state.selected = selected;

        // Keep the selected card inside the body
        let top = card_top(selected);
        let bottom = top.saturating_add(CARD_ROWS);
        if top < ui_state.scroll_row {
            ui_state.scroll_row = top;
        } else if bottom > ui_state.scroll_row.saturating_add(ui_state.body_rows) {
            ui_state.scroll_row = bottom.saturating_sub(ui_state.body_rows);
        }
    }

    /// Free scrolling (mouse wheel); ignored while an overlay holds the page
    pub async fn scroll_by(&self, rows: i32) {
        if self.surface.is_scroll_locked() {
            return;
        }
        let count = self.card_count().await;
        let mut ui_state = self.ui_state.lock().await;
        let max = card_top(count).saturating_sub(ui_state.body_rows);
        let target = (ui_state.scroll_row as i32 + rows).clamp(0, max as i32);
        ui_state.scroll_row = target as u16;
    }

    /// Error text to show, unless the user already dismissed this failure
    pub async fn visible_error(&self) -> Option<String> {
        let snapshot = self.store.snapshot();
        let error = snapshot.error.clone()?;
        let ui_state = self.ui_state.lock().await;
        (ui_state.dismissed_error != Some(snapshot.failures)).then_some(error)
    }

    pub async fn dismiss_error(&self) {
        let snapshot = self.store.snapshot();
        if snapshot.error.is_some() {
            self.ui_state.lock().await.dismissed_error = Some(snapshot.failures);
        }
    }

    pub async fn toggle_help_popup(&self) {
        let mut ui_state = self.ui_state.lock().await;
        ui_state.show_help_popup = !ui_state.show_help_popup;
    }

    pub async fn hide_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = false;
    }

    pub async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::content::LOAD_ERROR;
    use crate::model::sanity_client::FetchError;
    use crate::model::testing::{builder, loaded_store, StaticSource};
    use crate::model::types::Category;
    use serde_json::json;

    async fn loaded_model() -> AppModel {
        let store = loaded_store(StaticSource {
            settings: json!({
                "mainPicture": { "asset": { "_ref": "image-main-600x600-jpg" } },
                "gallery": [
                    { "asset": { "_ref": "image-g1-800x600-jpg" } },
                    { "asset": { "_ref": "image-g2-800x600-jpg" } },
                    { "asset": { "_ref": "image-g3-800x600-jpg" } }
                ]
            }),
            releases: json!([
                { "_id": "r1", "title": "One" },
                { "_id": "r2", "title": "Two" }
            ]),
            ..StaticSource::default()
        })
        .await;
        AppModel::new(store, builder(), Vec::new())
    }

    #[tokio::test]
    async fn first_visit_is_reported_once() {
        let model = loaded_model().await;
        assert!(model.set_active_page(Page::About).await);
        assert!(!model.set_active_page(Page::About).await);
        assert!(model.set_active_page(Page::Music).await);
    }

    #[tokio::test]
    async fn about_page_mounts_portrait_eagerly_and_gallery_lazily() {
        let model = loaded_model().await;
        let views = model.views();
        let specs = model.image_specs(&views, Page::About);
        assert_eq!(specs.len(), 4);

        let requests = model.mount_page_images(Page::About, specs.clone()).await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.contains("/main-600x600.jpg"));

        // Same page and sources: nothing is remounted
        assert!(model.mount_page_images(Page::About, specs).await.is_empty());
        let ids = model.page_images.lock().await.ids.clone();
        let images = model.images.lock().await;
        assert_eq!(images.get(ids[1]).unwrap().state(), ImageLoadState::Pending);
    }

    #[tokio::test]
    async fn viewport_observation_requests_visible_cards_only() {
        let model = loaded_model().await;
        model.set_active_page(Page::About).await;
        model.set_screen(120, 40, 2 * CARD_ROWS).await;
        let views = model.views();
        let specs = model.image_specs(&views, Page::About);
        model.mount_page_images(Page::About, specs).await;

        // Card 0 loaded eagerly on mount; card 1 is on screen and card 2 reaches
        // 50px into the trigger margin. Card 3 stays pending.
        let requests = model.observe_viewport().await;
        assert_eq!(requests.len(), 2);
        assert!(model.observe_viewport().await.is_empty());
    }

    #[tokio::test]
    async fn selection_is_frozen_while_scroll_is_locked() {
        let model = loaded_model().await;
        model.set_active_page(Page::Music).await;
        model.set_screen(120, 40, CARD_ROWS).await;
        model.move_selection(1).await;
        assert_eq!(model.get_ui_state().await.selected, 1);
        assert_eq!(model.get_ui_state().await.scroll_row, CARD_ROWS);

        let lock = model.surface.lock_scroll();
        model.move_selection(-1).await;
        model.scroll_by(-3).await;
        assert_eq!(model.get_ui_state().await.selected, 1);
        assert_eq!(model.get_ui_state().await.scroll_row, CARD_ROWS);
        drop(lock);

        model.move_selection(5).await;
        assert_eq!(model.get_ui_state().await.selected, 1);
    }

    #[tokio::test]
    async fn failed_images_are_reset_only_on_request() {
        let model = loaded_model().await;
        let views = model.views();
        let specs = model.image_specs(&views, Page::About);
        let requests = model.mount_page_images(Page::About, specs).await;
        let portrait = requests[0].id;

        model
            .images
            .lock()
            .await
            .complete(portrait, Err(FetchError::Status { status: 404, body: String::new() }));
        assert_eq!(model.images.lock().await.get(portrait).unwrap().state(), ImageLoadState::Error);

        assert_eq!(model.reset_failed_images().await, 1);
        assert_eq!(
            model.images.lock().await.get(portrait).unwrap().state(),
            ImageLoadState::Pending
        );
        assert_eq!(model.reset_failed_images().await, 0);
    }

    #[tokio::test]
    async fn repeated_failure_shows_again_after_dismissal() {
        let store = loaded_store(StaticSource {
            failing: Some(Category::Shows),
            ..StaticSource::default()
        })
        .await;
        let model = AppModel::new(store, builder(), Vec::new());
        assert_eq!(model.visible_error().await.as_deref(), Some(LOAD_ERROR));

        model.dismiss_error().await;
        assert_eq!(model.visible_error().await, None);

        model.store.refresh().await;
        assert_eq!(model.visible_error().await.as_deref(), Some(LOAD_ERROR));
    }

    #[test]
    fn card_top_saturates_on_long_pages() {
        assert_eq!(card_top(2), 2 * CARD_ROWS);
        assert_eq!(card_top(20_000), u16::MAX);
        assert_eq!(card_top(usize::MAX), u16::MAX);
    }

    #[tokio::test]
    async fn selection_on_a_very_long_page_does_not_overflow() {
        let releases: Vec<_> = (0..11_000)
            .map(|i| json!({ "_id": format!("r{}", i), "title": format!("Release {}", i) }))
            .collect();
        let store = loaded_store(StaticSource {
            releases: json!(releases),
            ..StaticSource::default()
        })
        .await;
        let model = AppModel::new(store, builder(), Vec::new());
        model.set_active_page(Page::Music).await;
        model.set_screen(120, 40, CARD_ROWS).await;

        model.move_selection(11_000).await;
        model.scroll_by(3).await;
        let ui_state = model.get_ui_state().await;
        assert_eq!(ui_state.selected, 10_999);
        assert_eq!(ui_state.scroll_row, u16::MAX - CARD_ROWS);
    }
}
