//! Navigation-related controller methods (pages, refreshes, images, gallery)

use crate::model::{Page, RefreshOutcome};
use super::AppController;

impl AppController {
    /// Show a page; its first visit asks the store for fresh content
    pub async fn activate_page(&self, page: Page) {
        let first_visit = self.model.set_active_page(page).await;
        tracing::debug!(page = page.label(), first_visit, "Page activated");

        if first_visit {
            let controller = self.clone();
            tokio::spawn(async move {
                match controller.model.store.ensure_fresh().await {
                    Some(RefreshOutcome::Updated) => controller.reconcile_page_images().await,
                    Some(RefreshOutcome::Failed(message)) => {
                        tracing::warn!(
                            page = page.label(),
                            error = %message,
                            "Page content unavailable"
                        )
                    }
                    None => {}
                }
            });
        }

        self.reconcile_page_images().await;
    }

    /// Remount images after a page switch or a snapshot commit
    pub async fn reconcile_page_images(&self) {
        let page = self.model.get_ui_state().await.active_page;
        let views = self.model.views();
        let specs = self.model.image_specs(&views, page);
        let requests = self.model.mount_page_images(page, specs).await;
        self.start_loads(requests);
        self.sync_viewport().await;
    }

    /// Run the lazy images' viewport check against the current scroll position
    pub async fn sync_viewport(&self) {
        let requests = self.model.observe_viewport().await;
        if !requests.is_empty() {
            tracing::debug!(count = requests.len(), "Images entered the viewport");
        }
        self.start_loads(requests);
    }

    /// Give this page's failed images another load attempt
    pub async fn retry_failed_images(&self) {
        let count = self.model.reset_failed_images().await;
        if count > 0 {
            tracing::info!(count, "Retrying failed images");
            self.sync_viewport().await;
        }
    }

    pub fn refresh_all(&self) {
        let store = self.model.store.clone();
        tokio::spawn(async move {
            if let RefreshOutcome::Failed(message) = store.refresh().await {
                tracing::warn!(error = %message, "Manual refresh failed");
            }
        });
    }

    pub async fn refresh_current_category(&self) {
        let category = self.model.get_ui_state().await.active_page.category();
        let store = self.model.store.clone();
        tokio::spawn(async move {
            store.refresh_category(category).await;
        });
    }

    /// Open the gallery at the selected thumbnail of the About page
    pub async fn open_gallery(&self) {
        let ui_state = self.model.get_ui_state().await;
        if ui_state.active_page != Page::About {
            return;
        }
        let views = self.model.views();
        // The portrait card sits above the thumbnails
        let offset = views.settings.main_picture.is_some() as i64;
        let start_index = ui_state.selected as i64 - offset;

        let urls = self
            .model
            .gallery
            .lock()
            .await
            .open(views.settings.gallery, start_index);
        self.preload(urls).await;
    }

    /// Fire-and-forget loads for gallery neighbors, owned by the open session
    pub async fn preload(&self, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }
        let mut gallery = self.model.gallery.lock().await;
        for url in urls {
            let loader = self.media_loader.clone();
            let task = tokio::spawn(async move {
                if let Err(e) = loader.load(url.clone()).await {
                    tracing::debug!(url = %url, error = %e, "Preload failed");
                }
            });
            gallery.track_preload(task);
        }
    }
}
